//! PDF extractor.

use crate::error::Result;
use crate::model::Extracted;
use crate::parser::{ParseOptions, PdfReader};
use crate::structure::title::{
    first_heading, first_meaningful_line, remove_title_line, usable_metadata_title,
};
use crate::structure::{ClassifierConfig, FontClassifier};

use super::DocumentExtractor;

/// PDF extractor.
///
/// Reading-order text comes from `pdf-extract`, font sizes from a separate
/// content-stream scan, and the [`FontClassifier`] joins the two into
/// first-pass Markdown.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor {
    options: ParseOptions,
    classifier: FontClassifier,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new(options: ParseOptions, config: ClassifierConfig) -> Self {
        let options = options
            .with_key_len(config.key_len)
            .with_default_body_size(config.default_body_size);
        Self {
            options,
            classifier: FontClassifier::new(config),
        }
    }

    /// Skip image extraction.
    pub fn text_only(mut self) -> Self {
        self.options = self.options.text_only();
        self
    }
}

impl DocumentExtractor for PdfExtractor {
    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn name(&self) -> &str {
        "pdf"
    }

    fn extract_with_fallback(&self, bytes: &[u8], fallback_title: &str) -> Result<Extracted> {
        let reader = PdfReader::from_bytes_with_options(bytes.to_vec(), self.options.clone())?;
        log::debug!("PDF has {} pages", reader.page_count());

        let metadata_title = usable_metadata_title(reader.metadata_title().as_deref());
        let scan = reader.font_scan();

        let raw = reader.text()?;
        let markdown = self
            .classifier
            .to_markdown(&raw, &scan.profile, scan.body_size);

        let title = metadata_title
            .or_else(|| first_heading(&markdown))
            .or_else(|| first_meaningful_line(&raw, 3))
            .unwrap_or_else(|| fallback_title.to_string());
        let markdown = remove_title_line(&markdown, &title);

        let mut extracted = Extracted::new(title, markdown);
        if self.options.extract_images {
            extracted.images = reader.images();
        }
        Ok(extracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extractor_extensions() {
        let extractor = PdfExtractor::default();
        assert_eq!(extractor.supported_extensions(), &["pdf"]);
        assert!(extractor.supports_extension("pdf"));
        assert!(extractor.supports_extension("PDF"));
        assert!(!extractor.supports_extension("docx"));
    }

    #[test]
    fn test_pdf_extractor_name() {
        assert_eq!(PdfExtractor::default().name(), "pdf");
    }

    #[test]
    fn test_config_flows_into_options() {
        let config = ClassifierConfig {
            key_len: 40,
            ..ClassifierConfig::default()
        };
        let extractor = PdfExtractor::new(ParseOptions::default(), config).text_only();
        assert_eq!(extractor.options.key_len, 40);
        assert!(!extractor.options.extract_images);
    }

    #[test]
    fn test_corrupt_pdf() {
        let extractor = PdfExtractor::default();
        assert!(extractor.extract_bytes(b"%PDF-1.4 garbage").is_err());
    }
}
