//! Parsing options and configuration.

use crate::model::DEFAULT_BODY_SIZE;

/// Options for reading source documents.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// Whether to extract embedded images
    pub extract_images: bool,

    /// Images narrower or shorter than this (in pixels) are ignored
    pub min_image_size: u32,

    /// Characters of normalized line text used as a font-profile key
    pub key_len: usize,

    /// Body size used when a document has no measurable text
    pub default_body_size: f32,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Extract text only.
    pub fn text_only(mut self) -> Self {
        self.extract_images = false;
        self
    }

    /// Set the minimum image dimension.
    pub fn with_min_image_size(mut self, pixels: u32) -> Self {
        self.min_image_size = pixels;
        self
    }

    /// Set the font-profile key length.
    pub fn with_key_len(mut self, key_len: usize) -> Self {
        self.key_len = key_len;
        self
    }

    /// Set the fallback body size.
    pub fn with_default_body_size(mut self, size: f32) -> Self {
        self.default_body_size = size;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            extract_images: true,
            min_image_size: 50,
            key_len: 60,
            default_body_size: DEFAULT_BODY_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .text_only()
            .with_min_image_size(10)
            .with_key_len(40);

        assert!(!options.extract_images);
        assert_eq!(options.min_image_size, 10);
        assert_eq!(options.key_len, 40);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert!(options.extract_images);
        assert_eq!(options.min_image_size, 50);
        assert_eq!(options.key_len, 60);
        assert_eq!(options.default_body_size, 12.0);
    }
}
