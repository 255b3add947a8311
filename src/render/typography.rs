//! Slovak/Czech typography normalization.

use std::sync::OnceLock;

use regex::Regex;

/// Quote and space characters replaced one-for-one.
const CHAR_MAP: &[(char, &str)] = &[
    ('\u{201E}', "\""), // „ low double quote
    ('\u{201C}', "\""), // “
    ('\u{201D}', "\""), // ”
    ('\u{201A}', "'"),  // ‚ low single quote
    ('\u{2018}', "'"),  // ‘
    ('\u{2019}', "'"),  // ’
    ('\u{2026}', "..."),
];

fn em_dash_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\u{2014}\s*").unwrap())
}

fn en_dash_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\u{2013}\s*").unwrap())
}

/// Replace locale-specific punctuation with ASCII-safe Markdown equivalents.
///
/// Curly and low quotes become straight quotes, em and en dashes (with any
/// surrounding whitespace) become ` -- `, the ellipsis glyph becomes `...`,
/// and no-break spaces become regular spaces. Idempotent.
pub fn normalize_typography(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match CHAR_MAP.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => result.push_str(to),
            None => result.push(c),
        }
    }

    let result = em_dash_regex().replace_all(&result, " -- ");
    let result = en_dash_regex().replace_all(&result, " -- ");

    result.replace(['\u{00A0}', '\u{202F}'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotes() {
        assert_eq!(
            normalize_typography("\u{201E}Dobrý deň\u{201C} a \u{2018}ahoj\u{2019}"),
            "\"Dobrý deň\" a 'ahoj'"
        );
    }

    #[test]
    fn test_dashes() {
        assert_eq!(normalize_typography("2020\u{2013}2024"), "2020 -- 2024");
        assert_eq!(normalize_typography("rast \u{2014} pokles"), "rast -- pokles");
        assert_eq!(normalize_typography("a\u{00A0}\u{2014}\u{00A0}b"), "a -- b");
    }

    #[test]
    fn test_ellipsis_and_spaces() {
        assert_eq!(
            normalize_typography("a tak\u{2026} 58\u{202F}% a\u{00A0}b"),
            "a tak... 58 % a b"
        );
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "\u{201E}Citát\u{201C} \u{2014} autor\u{2026}",
            "plain ascii -- text...",
            "  \u{2013}  \u{2013}  ",
            "x\u{00A0}\u{2014}\n\u{2013}y",
        ];
        for sample in samples {
            let once = normalize_typography(sample);
            assert_eq!(normalize_typography(&once), once);
        }
    }
}
