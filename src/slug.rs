//! Slovak/Czech-aware slug generation for post file names and image folders.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Explicit transliterations for Slovak and Czech letters (already lower-cased).
const SK_CZ_MAP: &[(char, char)] = &[
    ('á', 'a'),
    ('ä', 'a'),
    ('č', 'c'),
    ('ď', 'd'),
    ('é', 'e'),
    ('ě', 'e'),
    ('í', 'i'),
    ('ĺ', 'l'),
    ('ľ', 'l'),
    ('ň', 'n'),
    ('ó', 'o'),
    ('ô', 'o'),
    ('ŕ', 'r'),
    ('ř', 'r'),
    ('š', 's'),
    ('ť', 't'),
    ('ú', 'u'),
    ('ů', 'u'),
    ('ý', 'y'),
    ('ž', 'z'),
];

/// Letters that do not decompose under NFKD.
const EXTRA_MAP: &[(char, &str)] = &[
    ('ß', "ss"),
    ('æ', "ae"),
    ('œ', "oe"),
    ('ø', "o"),
    ('ł', "l"),
    ('đ', "d"),
    ('ð', "d"),
    ('þ', "th"),
    ('ı', "i"),
];

/// Slug generation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlugOptions {
    /// Maximum slug length in characters
    pub max_len: usize,
}

impl SlugOptions {
    /// Set the maximum length.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }
}

impl Default for SlugOptions {
    fn default() -> Self {
        Self { max_len: 60 }
    }
}

/// Transliterate to ASCII: Slovak/Czech table first, then NFKD with
/// combining marks dropped, then a few letters NFKD leaves alone.
/// Anything still non-ASCII is dropped.
pub fn transliterate(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| {
            SK_CZ_MAP
                .iter()
                .find(|(from, _)| *from == c)
                .map_or(c, |(_, to)| *to)
        })
        .collect();

    let mut out = String::with_capacity(mapped.len());
    for c in mapped.nfkd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii() {
            out.push(c);
        } else if let Some((_, to)) = EXTRA_MAP.iter().find(|(from, _)| *from == c) {
            out.push_str(to);
        }
    }
    out
}

/// Convert a title into a URL-safe slug.
///
/// Lower-cases, transliterates, collapses every run of characters outside
/// `[a-z0-9]` into one hyphen, trims hyphens, and cuts overlong slugs at the
/// last hyphen within the limit.
pub fn generate_slug(title: &str, options: &SlugOptions) -> String {
    let ascii = transliterate(&title.to_lowercase()).to_lowercase();

    let mut slug = String::with_capacity(ascii.len());
    let mut pending_hyphen = false;
    for c in ascii.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    if slug.len() > options.max_len {
        let cut = &slug[..options.max_len];
        slug = match cut.rfind('-') {
            Some(pos) => cut[..pos].to_string(),
            None => cut.to_string(),
        };
    }
    slug
}

/// Slug used when neither the title nor the file name has any Latin letters
/// or digits.
pub const FALLBACK_SLUG: &str = "post";

/// Slug for a title, falling back to the slug of `fallback` (usually the
/// input file stem) and then to [`FALLBACK_SLUG`] when the result is empty.
pub fn slug_with_fallback(title: &str, fallback: &str, options: &SlugOptions) -> String {
    [title, fallback]
        .iter()
        .map(|text| generate_slug(text, options))
        .find(|slug| !slug.is_empty())
        .unwrap_or_else(|| FALLBACK_SLUG.to_string())
}

/// Make a slug unique against existing file names.
///
/// A `.md` suffix is ignored on existing names. Collisions get the smallest
/// free `-N` suffix with `N >= 2`.
pub fn unique_slug<S: AsRef<str>>(slug: &str, existing_files: &[S]) -> String {
    let existing: std::collections::HashSet<&str> = existing_files
        .iter()
        .map(|f| {
            let f = f.as_ref();
            f.strip_suffix(".md").unwrap_or(f)
        })
        .collect();

    if !existing.contains(slug) {
        return slug.to_string();
    }

    let mut counter = 2;
    loop {
        let candidate = format!("{}-{}", slug, counter);
        if !existing.contains(candidate.as_str()) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slovak_title() {
        let options = SlugOptions::default();
        assert_eq!(
            generate_slug("AI Overviews drasticky znižujú CTR o 58 %", &options),
            "ai-overviews-drasticky-znizuju-ctr-o-58"
        );
        assert_eq!(
            generate_slug("Budúcnosť medicíny v zajatí algoritmov", &options),
            "buducnost-mediciny-v-zajati-algoritmov"
        );
    }

    #[test]
    fn test_czech_and_other_letters() {
        let options = SlugOptions::default();
        assert_eq!(generate_slug("Řízení ŮČETNICTVÍ", &options), "rizeni-ucetnictvi");
        assert_eq!(generate_slug("Straße & Café", &options), "strasse-cafe");
    }

    #[test]
    fn test_truncate_at_word_boundary() {
        let options = SlugOptions::default().with_max_len(20);
        assert_eq!(
            generate_slug("Pharmaceutical marketing strategies", &options),
            "pharmaceutical"
        );
        let options = SlugOptions::default().with_max_len(5);
        assert_eq!(generate_slug("Abcdefghij", &options), "abcde");
    }

    #[test]
    fn test_no_edge_hyphens() {
        let options = SlugOptions::default();
        assert_eq!(generate_slug("  --Hello, World!--  ", &options), "hello-world");
        assert_eq!(generate_slug("!!!", &options), "");
    }

    #[test]
    fn test_slug_fallbacks() {
        let options = SlugOptions::default();
        assert_eq!(generate_slug("Ελληνικά νέα", &options), "");
        assert_eq!(
            slug_with_fallback("Отчет о продажах", "sales_2024", &options),
            "sales-2024"
        );
        assert_eq!(
            slug_with_fallback("Отчет о продажах", "отчет", &options),
            FALLBACK_SLUG
        );
        assert_eq!(
            slug_with_fallback("Quarterly Update", "ignored", &options),
            "quarterly-update"
        );
    }

    #[test]
    fn test_unique_slug() {
        let existing = ["post.md", "post-2.md", "other.md", "readme"];
        assert_eq!(unique_slug("post", &existing), "post-3");
        assert_eq!(unique_slug("other", &existing), "other-2");
        assert_eq!(unique_slug("fresh", &existing), "fresh");
        assert_eq!(unique_slug("readme", &existing), "readme-2");
    }

    #[test]
    fn test_unique_slug_is_deterministic() {
        let existing = vec!["a.md".to_string(), "a-3.md".to_string()];
        assert_eq!(unique_slug("a", &existing), "a-2");
        assert_eq!(unique_slug("a", &existing), "a-2");
    }
}
