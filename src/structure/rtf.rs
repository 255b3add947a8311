//! Heuristic structurer for plain text without font metadata (RTF).

use super::lists::ListDetector;
use super::rules::LineClass;

/// Sentence-terminal characters that disqualify a short line from being a heading.
const TERMINAL_PUNCTUATION: &[char] = &['.', ',', ':', ';', '!', '?', ')'];

/// Heading heuristics for plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructurerConfig {
    /// Short lines must be under this many characters to be heading candidates;
    /// longer lines never are, upper-case or not
    pub heading_max_len: usize,
    /// Upper-case lines must be longer than this to be heading candidates
    pub uppercase_min_len: usize,
}

impl StructurerConfig {
    /// Set the short-line limit.
    pub fn with_heading_max_len(mut self, len: usize) -> Self {
        self.heading_max_len = len;
        self
    }

    /// Set the minimum upper-case heading length.
    pub fn with_uppercase_min_len(mut self, len: usize) -> Self {
        self.uppercase_min_len = len;
        self
    }
}

impl Default for StructurerConfig {
    fn default() -> Self {
        Self {
            heading_max_len: 80,
            uppercase_min_len: 3,
        }
    }
}

/// Classifies plain-text lines by length, capitalization and blank-line adjacency.
#[derive(Debug, Clone)]
pub struct TextStructurer {
    config: StructurerConfig,
    lists: ListDetector,
}

impl TextStructurer {
    /// Create a structurer from a configuration.
    pub fn new(config: StructurerConfig) -> Self {
        Self {
            config,
            lists: ListDetector::plain_bullets(),
        }
    }

    /// Whether a trimmed line looks like a heading.
    ///
    /// `next` is the following raw line, `None` at the end of the text.
    pub fn is_heading_candidate(&self, text: &str, next: Option<&str>) -> bool {
        let len = text.chars().count();
        if len > self.config.heading_max_len {
            return false;
        }
        if is_all_uppercase(text) && len > self.config.uppercase_min_len {
            return true;
        }

        let followed_by_blank = next.map_or(true, |n| n.trim().is_empty());
        len < self.config.heading_max_len
            && followed_by_blank
            && !text.ends_with(TERMINAL_PUNCTUATION)
    }

    /// Classify a trimmed, non-blank line.
    pub fn classify(&self, text: &str, next: Option<&str>) -> LineClass {
        if let Some(item) = self.lists.detect(text) {
            return LineClass::ListItem(item);
        }
        if self.is_heading_candidate(text, next) {
            return LineClass::Heading(2);
        }
        LineClass::Paragraph
    }

    /// Convert plain text into first-pass Markdown.
    ///
    /// The first line exactly equal to `title` is dropped. Blank-line runs
    /// collapse into one, and short all-uppercase headings are title-cased.
    pub fn structure(&self, text: &str, title: &str) -> String {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut out: Vec<String> = Vec::new();
        let mut title_removed = false;

        for (i, raw) in lines.iter().enumerate() {
            let stripped = raw.trim();

            if stripped.is_empty() {
                if out.last().map_or(false, |l| !l.is_empty()) {
                    out.push(String::new());
                }
                continue;
            }

            if !title_removed && stripped == title {
                title_removed = true;
                continue;
            }

            let class = self.classify(stripped, lines.get(i + 1).copied());
            match class {
                LineClass::Heading(_) => {
                    let shown = if is_all_uppercase(stripped)
                        && stripped.chars().count() < self.config.heading_max_len
                    {
                        title_case(stripped)
                    } else {
                        stripped.to_string()
                    };
                    out.push(class.render(&shown));
                    out.push(String::new());
                }
                _ => out.push(class.render(stripped)),
            }
        }

        out.join("\n")
    }
}

impl Default for TextStructurer {
    fn default() -> Self {
        Self::new(StructurerConfig::default())
    }
}

/// True when the text has at least one cased letter and no lower-case letters.
pub fn is_all_uppercase(text: &str) -> bool {
    text.chars().any(|c| c.is_uppercase()) && !text.chars().any(|c| c.is_lowercase())
}

/// Title-case: upper-case a letter that follows a non-letter, lower-case the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uppercase_heading_is_title_cased() {
        let structurer = TextStructurer::default();
        let md = structurer.structure("Intro paragraph text here.\nZÁVER\nFinal words.", "");
        assert!(md.contains("## Záver\n"));
    }

    #[test]
    fn test_short_line_before_blank_is_heading() {
        let structurer = TextStructurer::default();
        let md = structurer.structure("Market Outlook\n\nSales grew strongly this year.", "");
        assert_eq!(md, "## Market Outlook\n\nSales grew strongly this year.");
    }

    #[test]
    fn test_terminal_punctuation_blocks_heading() {
        let structurer = TextStructurer::default();
        assert!(!structurer.is_heading_candidate("This is a sentence.", Some("")));
        assert!(!structurer.is_heading_candidate("As follows:", None));
        assert!(structurer.is_heading_candidate("Outlook", None));
        assert!(!structurer.is_heading_candidate("Outlook", Some("more text")));
    }

    #[test]
    fn test_long_uppercase_line_is_paragraph() {
        let structurer = TextStructurer::default();
        let disclaimer = "THIS AGREEMENT IS PROVIDED AS IS WITHOUT WARRANTY OF ANY KIND, \
                          INCLUDING THE IMPLIED WARRANTIES OF MERCHANTABILITY.";
        assert!(disclaimer.chars().count() > 80);
        assert!(!structurer.is_heading_candidate(disclaimer, None));

        let md = structurer.structure(
            &format!("Intro paragraph text here.\n{}\nMore text follows here.", disclaimer),
            "",
        );
        assert!(!md.contains("## "));
        assert!(md.contains(disclaimer));

        let exactly_80 = "B".repeat(80);
        assert!(structurer.is_heading_candidate(&exactly_80, Some("next")));
    }

    #[test]
    fn test_title_removed_once() {
        let structurer = TextStructurer::default();
        let text = "Annual Report\n\nAnnual Report\n\nBody text goes here and is long enough.";
        let md = structurer.structure(text, "Annual Report");
        assert_eq!(
            md,
            "## Annual Report\n\nBody text goes here and is long enough."
        );
    }

    #[test]
    fn test_lists() {
        let structurer = TextStructurer::default();
        let md = structurer.structure("Items follow, as listed:\n* one\n2) two", "");
        assert_eq!(md, "Items follow, as listed:\n- one\n2. two");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("ANNUAL REPORT"), "Annual Report");
        assert_eq!(title_case("ZÁVER"), "Záver");
        assert_eq!(title_case("COVID-19 UPDATE"), "Covid-19 Update");
    }

    #[test]
    fn test_is_all_uppercase() {
        assert!(is_all_uppercase("ZÁVER 2024"));
        assert!(!is_all_uppercase("Záver"));
        assert!(!is_all_uppercase("2024"));
    }
}
