//! RTF extractor.

use crate::error::Result;
use crate::model::Extracted;
use crate::parser::{decode_rtf_bytes, parse_rtf};
use crate::structure::title::first_meaningful_line;
use crate::structure::{StructurerConfig, TextStructurer};

use super::DocumentExtractor;

/// Warning recorded when an RTF file embeds pictures.
pub const PICTURES_SKIPPED: &str = "RTF contains embedded images that were not extracted";

/// RTF extractor.
///
/// RTF carries no usable structure once control words are stripped, so the
/// plain text goes through the line-shape [`TextStructurer`].
#[derive(Debug, Clone, Default)]
pub struct RtfExtractor {
    structurer: TextStructurer,
}

impl RtfExtractor {
    /// Create an RTF extractor with custom heading heuristics.
    pub fn new(config: StructurerConfig) -> Self {
        Self {
            structurer: TextStructurer::new(config),
        }
    }
}

impl DocumentExtractor for RtfExtractor {
    fn supported_extensions(&self) -> &[&str] {
        &["rtf"]
    }

    fn name(&self) -> &str {
        "rtf"
    }

    fn extract_with_fallback(&self, bytes: &[u8], fallback_title: &str) -> Result<Extracted> {
        let content = parse_rtf(&decode_rtf_bytes(bytes))?;
        if let Some(cp) = content.code_page {
            log::debug!("RTF code page {}", cp);
        }

        let title = first_meaningful_line(&content.text, 3)
            .unwrap_or_else(|| fallback_title.to_string());
        let markdown = self.structurer.structure(&content.text, &title);

        let mut extracted = Extracted::new(title, markdown);
        if content.has_pictures {
            extracted.warn(PICTURES_SKIPPED);
        }
        Ok(extracted)
    }
}
