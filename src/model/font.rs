//! Per-document font metadata used by the PDF structure classifier.

use std::collections::HashMap;

/// Default body size when a document has no measurable text.
pub const DEFAULT_BODY_SIZE: f32 = 12.0;

/// Font information recorded for a visual line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontInfo {
    /// Average font size of the line's spans
    pub size: f32,
    /// Whether any span of the line uses a bold face
    pub bold: bool,
}

impl FontInfo {
    /// Create font info.
    pub fn new(size: f32, bold: bool) -> Self {
        Self { size, bold }
    }
}

/// Normalize text into a lookup key: whitespace runs collapsed to one space,
/// trimmed, lower-cased and cut to `max_chars` characters.
pub fn normalize_for_lookup(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase().chars().take(max_chars).collect()
}

/// Ordered mapping from normalized line text to font information.
///
/// Entries keep the position of their first insertion. Inserting an existing
/// key replaces its value (last writer wins) without moving it, so fuzzy
/// lookups always scan in first-seen order.
#[derive(Debug, Clone)]
pub struct FontProfile {
    entries: Vec<(String, FontInfo)>,
    index: HashMap<String, usize>,
    key_len: usize,
}

impl FontProfile {
    /// Create an empty profile with the given lookup key length.
    pub fn new(key_len: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            key_len,
        }
    }

    /// Record font information for a line of text.
    pub fn insert(&mut self, text: &str, info: FontInfo) {
        let key = normalize_for_lookup(text, self.key_len);
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = info,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, info));
            }
        }
    }

    /// Exact lookup by normalized key.
    pub fn get(&self, text: &str) -> Option<FontInfo> {
        let key = normalize_for_lookup(text, self.key_len);
        self.index.get(&key).map(|&pos| self.entries[pos].1)
    }

    /// Two-tier lookup: exact key first, then prefix-fuzzy match.
    ///
    /// The fuzzy tier is skipped for keys shorter than `min_fuzzy_len`
    /// characters. Otherwise the key is cut to `prefix_len` characters and the
    /// first stored entry (in insertion order) is returned whose key starts
    /// with that prefix, or whose own `prefix_len`-character prefix the short
    /// key starts with.
    pub fn lookup(&self, text: &str, prefix_len: usize, min_fuzzy_len: usize) -> Option<FontInfo> {
        let key = normalize_for_lookup(text, self.key_len);
        if let Some(&pos) = self.index.get(&key) {
            return Some(self.entries[pos].1);
        }

        if key.chars().count() < min_fuzzy_len {
            return None;
        }

        let short: String = key.chars().take(prefix_len).collect();
        self.entries
            .iter()
            .find(|(stored, _)| {
                let stored_short: String = stored.chars().take(prefix_len).collect();
                stored.starts_with(&short) || short.starts_with(&stored_short)
            })
            .map(|(_, info)| *info)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the profile has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FontInfo)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Default for FontProfile {
    fn default() -> Self {
        Self::new(60)
    }
}

/// Modal font size of a document, rounded to 0.1pt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySize(f32);

impl BodySize {
    /// Wrap a known body size.
    pub fn new(size: f32) -> Self {
        Self(size)
    }

    /// Compute the mode of the given sizes.
    ///
    /// Sizes are bucketed at 0.1pt precision. Ties go to the bucket seen
    /// first. An empty input yields `default`.
    pub fn from_sizes<I>(sizes: I, default: f32) -> Self
    where
        I: IntoIterator<Item = f32>,
    {
        let mut histogram: Vec<(i32, usize)> = Vec::new();
        for size in sizes {
            let key = (size * 10.0).round() as i32;
            match histogram.iter_mut().find(|(k, _)| *k == key) {
                Some((_, count)) => *count += 1,
                None => histogram.push((key, 1)),
            }
        }

        let mut best: Option<(i32, usize)> = None;
        for &(key, count) in &histogram {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((key, count));
            }
        }

        match best {
            Some((key, _)) => Self(key as f32 / 10.0),
            None => Self(default),
        }
    }

    /// The body size in points.
    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for BodySize {
    fn default() -> Self {
        Self(DEFAULT_BODY_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_for_lookup() {
        assert_eq!(normalize_for_lookup("  Hello \t  World\n", 60), "hello world");
        let long = "a".repeat(100);
        assert_eq!(normalize_for_lookup(&long, 60).len(), 60);
        assert_eq!(normalize_for_lookup("ŽLTÝ kôň", 3), "žlt");
    }

    #[test]
    fn test_last_writer_wins_keeps_position() {
        let mut profile = FontProfile::default();
        profile.insert("Introduction", FontInfo::new(18.0, false));
        profile.insert("Body text", FontInfo::new(12.0, false));
        profile.insert("introduction", FontInfo::new(12.0, true));

        assert_eq!(profile.len(), 2);
        assert_eq!(profile.get("Introduction"), Some(FontInfo::new(12.0, true)));
        let keys: Vec<&str> = profile.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["introduction", "body text"]);
    }

    #[test]
    fn test_fuzzy_lookup_both_directions() {
        let mut profile = FontProfile::default();
        profile.insert(
            "Market access strategies for generic medicines in Europe",
            FontInfo::new(18.0, true),
        );

        // Query is longer than the stored line
        let found = profile.lookup(
            "Market access strategies for generic medicines in Europe and beyond",
            30,
            5,
        );
        assert_eq!(found, Some(FontInfo::new(18.0, true)));

        // Query is a prefix of the stored line
        let mut profile = FontProfile::default();
        profile.insert("Short heading", FontInfo::new(16.0, false));
        assert_eq!(
            profile.lookup("Short head", 30, 5),
            Some(FontInfo::new(16.0, false))
        );
        assert_eq!(
            profile.lookup("Short heading continued here", 30, 5),
            Some(FontInfo::new(16.0, false))
        );
        assert!(profile.lookup("Something else", 30, 5).is_none());
    }

    #[test]
    fn test_fuzzy_lookup_short_key() {
        let mut profile = FontProfile::default();
        profile.insert("abcd", FontInfo::new(20.0, false));
        assert!(profile.lookup("abc", 30, 5).is_none());
        assert_eq!(profile.lookup("abcd", 30, 5), Some(FontInfo::new(20.0, false)));
    }

    #[test]
    fn test_fuzzy_lookup_first_match_wins() {
        let mut profile = FontProfile::default();
        profile.insert("chapter one begins", FontInfo::new(20.0, false));
        profile.insert("chapter one begins again", FontInfo::new(14.0, false));
        assert_eq!(
            profile.lookup("chapter one", 30, 5),
            Some(FontInfo::new(20.0, false))
        );
    }

    #[test]
    fn test_body_size_mode() {
        let sizes = vec![12.0, 12.04, 18.0, 11.96, 18.0, 24.0];
        assert!((BodySize::from_sizes(sizes, 12.0).value() - 12.0).abs() < 1e-6);
    }

    #[test]
    fn test_body_size_tie_goes_to_first_seen() {
        let sizes = vec![10.0, 11.0, 11.0, 10.0];
        assert!((BodySize::from_sizes(sizes, 12.0).value() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_body_size_default() {
        let body = BodySize::from_sizes(Vec::new(), 12.0);
        assert!((body.value() - 12.0).abs() < 1e-6);
    }
}
