//! First-pass Markdown produced by an extractor and the line buffer the
//! cleanup passes work on.

use super::ImageRecord;

/// Output of a format extractor: title, first-pass Markdown and images.
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    /// Document title, destined for front matter
    pub title: String,
    /// First-pass Markdown body (title already removed)
    pub markdown: String,
    /// Embedded images in extraction order
    pub images: Vec<ImageRecord>,
    /// Non-fatal problems met during extraction
    pub warnings: Vec<String>,
}

impl Extracted {
    /// Create an extraction result.
    pub fn new(title: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            markdown: markdown.into(),
            images: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Attach extracted images.
    pub fn with_images(mut self, images: Vec<ImageRecord>) -> Self {
        self.images = images;
        self
    }

    /// Record a warning and log it.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.warnings.push(message);
    }
}

/// An ordered sequence of Markdown lines, mutated in place by each cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkdownDocument {
    lines: Vec<String>,
}

impl MarkdownDocument {
    /// Split text into lines. A trailing newline yields a final empty line.
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
        }
    }

    /// Build from owned lines.
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Borrow the lines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Mutably borrow the lines.
    pub fn lines_mut(&mut self) -> &mut Vec<String> {
        &mut self.lines
    }

    /// Replace the lines wholesale.
    pub fn set_lines(&mut self, lines: Vec<String>) {
        self.lines = lines;
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether there are no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Join the lines back with `\n`.
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

impl std::fmt::Display for MarkdownDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_document_round_trip() {
        let text = "## Title\n\nBody\n";
        let doc = MarkdownDocument::parse(text);
        assert_eq!(doc.len(), 4);
        assert_eq!(doc.to_text(), text);
    }

    #[test]
    fn test_extracted_warn() {
        let mut extracted = Extracted::new("T", "body");
        extracted.warn("picture skipped");
        assert_eq!(extracted.warnings, vec!["picture skipped".to_string()]);
    }
}
