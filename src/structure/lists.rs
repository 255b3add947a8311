//! Bullet and numbered list detection.

use regex::Regex;

/// Marker of a detected list item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListMarker {
    /// Unordered item, rendered as `- `
    Bullet,
    /// Ordered item with its original number text
    Numbered(String),
}

/// A detected list item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Item marker
    pub marker: ListMarker,
    /// Item text without the marker
    pub text: String,
}

impl ListItem {
    /// Render as a Markdown list line.
    pub fn to_markdown(&self) -> String {
        match &self.marker {
            ListMarker::Bullet => format!("- {}", self.text),
            ListMarker::Numbered(n) => format!("{}. {}", n, self.text),
        }
    }
}

/// Detects list markers at the start of a trimmed line.
#[derive(Debug, Clone)]
pub struct ListDetector {
    bullet: Regex,
    numbered: Regex,
}

impl ListDetector {
    /// Detector for PDF text: the wider bullet glyph set (including the
    /// Symbol-font private-use bullet), whitespace after the marker optional.
    pub fn glyph_bullets() -> Self {
        Self::with_bullet_pattern(r"^[\u{2022}\u{2023}\u{25E6}\u{25AA}\u{25AB}\u{2043}\u{F0B7}\-]\s*(.+)")
    }

    /// Detector for plain text: a smaller bullet set that also accepts `*`,
    /// whitespace after the marker required.
    pub fn plain_bullets() -> Self {
        Self::with_bullet_pattern(r"^[\u{2022}\u{2023}\u{25E6}\-*]\s+(.+)")
    }

    fn with_bullet_pattern(pattern: &str) -> Self {
        Self {
            bullet: Regex::new(pattern).unwrap(),
            numbered: Regex::new(r"^(\d+)[.)]\s+(.+)").unwrap(),
        }
    }

    /// Detect a list item. Bullets take precedence over numbers.
    pub fn detect(&self, line: &str) -> Option<ListItem> {
        if let Some(caps) = self.bullet.captures(line) {
            return Some(ListItem {
                marker: ListMarker::Bullet,
                text: caps[1].to_string(),
            });
        }
        self.numbered.captures(line).map(|caps| ListItem {
            marker: ListMarker::Numbered(caps[1].to_string()),
            text: caps[2].to_string(),
        })
    }
}
