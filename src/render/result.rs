//! Conversion result with statistics.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::headings::parse_heading;

/// Front-matter lines shown in a dry-run preview.
pub const PREVIEW_FRONT_MATTER_LINES: usize = 15;

/// Body characters shown in a dry-run preview.
pub const PREVIEW_BODY_CHARS: usize = 300;

/// A finished post: front matter, body and where it was written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Post title
    pub title: String,

    /// URL slug, also the output file stem
    pub slug: String,

    /// Rendered YAML front matter, `---` delimited
    pub front_matter: String,

    /// Cleaned Markdown body
    pub body: String,

    /// Statistics about the body
    pub stats: ConversionStats,

    /// Images found by the extractor
    pub images_found: usize,

    /// Written file; `None` on a dry run
    pub output_path: Option<PathBuf>,

    /// Non-fatal problems met during extraction
    pub warnings: Vec<String>,
}

impl ConversionResult {
    /// Output file name for this post.
    pub fn file_name(&self) -> String {
        format!("{}.md", self.slug)
    }

    /// Full file contents: front matter, a blank line, then the body.
    pub fn content(&self) -> String {
        format!("{}\n{}", self.front_matter, self.body)
    }

    /// Get the content length in bytes.
    pub fn content_len(&self) -> usize {
        self.front_matter.len() + 1 + self.body.len()
    }

    /// Dry-run preview: slug, the start of the front matter and the body.
    pub fn preview(&self) -> String {
        let mut out = vec![format!("Slug: {}", self.slug), "---".to_string()];
        out.extend(
            self.front_matter
                .split('\n')
                .take(PREVIEW_FRONT_MATTER_LINES)
                .map(str::to_string),
        );
        out.push("---".to_string());
        let body: String = self.body.chars().take(PREVIEW_BODY_CHARS).collect();
        out.push(format!("{}...", body));
        out.join("\n")
    }
}

/// Statistics collected from a converted body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Number of headings
    pub heading_count: u32,

    /// Number of list items
    pub list_item_count: u32,

    /// Number of images referenced
    pub image_count: u32,

    /// Number of image files written
    pub images_saved: u32,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: u32,

    /// Character count (excluding whitespace)
    pub char_count: u32,
}

impl ConversionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count headings, list items, images and words in a Markdown body.
    pub fn from_markdown(markdown: &str) -> Self {
        let mut stats = Self::new();
        for line in markdown.lines() {
            let trimmed = line.trim_start();
            if parse_heading(line).is_some() {
                stats.heading_count += 1;
            } else if trimmed.starts_with("- ") || is_numbered_item(trimmed) {
                stats.list_item_count += 1;
            }
            stats.image_count += line.matches("![").count() as u32;
            stats.count_text(line);
        }
        stats
    }

    /// Add word and character counts from text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
        self.char_count += text.chars().filter(|c| !c.is_whitespace()).count() as u32;
    }

    /// Record the number of image files written.
    pub fn with_images_saved(mut self, count: usize) -> Self {
        self.images_saved = count as u32;
        self
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &ConversionStats) {
        self.heading_count += other.heading_count;
        self.list_item_count += other.list_item_count;
        self.image_count += other.image_count;
        self.images_saved += other.images_saved;
        self.word_count += other.word_count;
        self.char_count += other.char_count;
    }
}

fn is_numbered_item(line: &str) -> bool {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && line[digits..].starts_with(". ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_from_markdown() {
        let md = "## Intro\n\nHello, world!\n\n- one\n- two\n1. first\n\n![image](/_images/a/image-001.jpg)\n";
        let stats = ConversionStats::from_markdown(md);
        assert_eq!(stats.heading_count, 1);
        assert_eq!(stats.list_item_count, 3);
        assert_eq!(stats.image_count, 1);
        assert_eq!(stats.word_count, 11);
    }

    #[test]
    fn test_count_text() {
        let mut stats = ConversionStats::new();
        stats.count_text("Hello, world! This is a test.");
        assert_eq!(stats.word_count, 6);
        assert_eq!(stats.char_count, 24);
    }

    #[test]
    fn test_content_and_preview() {
        let result = ConversionResult {
            title: "Report".to_string(),
            slug: "report".to_string(),
            front_matter: "---\ntitle: Report\n---\n".to_string(),
            body: "x".repeat(400),
            ..Default::default()
        };
        assert_eq!(result.file_name(), "report.md");
        assert!(result.content().starts_with("---\ntitle: Report\n---\n\nxxx"));
        assert_eq!(result.content_len(), result.content().len());

        let preview = result.preview();
        assert!(preview.starts_with("Slug: report\n---\n---\ntitle: Report"));
        assert!(preview.ends_with(&format!("{}...", "x".repeat(300))));
    }

    #[test]
    fn test_merge() {
        let mut a = ConversionStats {
            heading_count: 2,
            ..Default::default()
        };
        let b = ConversionStats {
            heading_count: 1,
            images_saved: 4,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.heading_count, 3);
        assert_eq!(a.images_saved, 4);
    }
}
