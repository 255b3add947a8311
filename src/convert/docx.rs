//! Word document extractor.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;
use crate::model::Extracted;
use crate::parser::DocxReader;
use crate::structure::title::remove_first_heading;

use super::DocumentExtractor;

fn setext_underline_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(=+|-+)\s*$").unwrap())
}

/// Word extractor.
///
/// The document body is translated to semantic HTML through the paragraph
/// style map, then converted to Markdown with `html2md`. Structure comes
/// entirely from the styles, so no classifier runs on this path.
#[derive(Debug, Clone)]
pub struct DocxExtractor {
    extract_images: bool,
}

impl DocxExtractor {
    /// Create a new Word extractor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self {
            extract_images: true,
        }
    }
}

impl DocumentExtractor for DocxExtractor {
    fn supported_extensions(&self) -> &[&str] {
        &["docx", "doc"]
    }

    fn name(&self) -> &str {
        "docx"
    }

    fn extract_with_fallback(&self, bytes: &[u8], fallback_title: &str) -> Result<Extracted> {
        let mut reader = DocxReader::from_bytes(bytes.to_vec())?;
        let content = reader.read(self.extract_images)?;
        log::debug!(
            "DOCX translated: {} bytes of HTML, {} images",
            content.html.len(),
            content.images.len()
        );

        let markdown = atx_headings(&html2md::parse_html(&content.html));
        let title = content
            .title()
            .unwrap_or_else(|| fallback_title.to_string());
        let markdown = remove_first_heading(&markdown, &title);

        let mut extracted = Extracted::new(title, markdown).with_images(content.images);
        extracted.warnings = content.warnings;
        Ok(extracted)
    }
}

/// Rewrite setext headings (`Title` over `===` or `---`) as `#` / `##` headings.
fn atx_headings(markdown: &str) -> String {
    let lines: Vec<&str> = markdown.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let underline = lines
            .get(i + 1)
            .filter(|next| setext_underline_regex().is_match(next.trim()));

        match underline {
            Some(next) if is_setext_text(line) => {
                let marker = if next.trim().starts_with('=') { "#" } else { "##" };
                out.push(format!("{} {}", marker, line.trim()));
                i += 2;
            }
            _ => {
                out.push(line.to_string());
                i += 1;
            }
        }
    }

    out.join("\n")
}

fn is_setext_text(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && !trimmed.starts_with('#')
        && !trimmed.starts_with("- ")
        && !trimmed.starts_with("* ")
        && !setext_underline_regex().is_match(trimmed)
}
