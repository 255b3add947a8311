//! Embedded images pulled out of source documents.

/// An image extracted from a source document.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    /// Raw encoded bytes as stored in the source
    pub data: Vec<u8>,
    /// Source extension without the dot (e.g. "jpg", "png")
    pub ext: String,
    /// Zero-based ordinal in extraction order
    pub index: usize,
    /// Width in pixels, when the source declares it
    pub width: Option<u32>,
    /// Height in pixels, when the source declares it
    pub height: Option<u32>,
}

impl ImageRecord {
    /// Create a new image record.
    ///
    /// `jpeg` is normalized to `jpg` and the extension is lower-cased.
    pub fn new(data: Vec<u8>, ext: impl Into<String>, index: usize) -> Self {
        let ext = ext.into().trim_start_matches('.').to_lowercase();
        let ext = if ext == "jpeg" { "jpg".to_string() } else { ext };
        Self {
            data,
            ext,
            index,
            width: None,
            height: None,
        }
    }

    /// Set image dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Get the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Legacy Windows metafiles cannot be re-encoded for the web.
    pub fn is_metafile(&self) -> bool {
        matches!(self.ext.as_str(), "wmf" | "emf" | "x-wmf" | "x-emf")
    }

    /// Map a MIME type to a file extension.
    pub fn extension_for_mime(mime_type: &str) -> &'static str {
        match mime_type {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/tiff" => "tiff",
            "image/bmp" => "bmp",
            "image/webp" => "webp",
            "image/jp2" | "image/jpeg2000" => "jp2",
            "image/x-wmf" | "image/wmf" => "wmf",
            "image/x-emf" | "image/emf" => "emf",
            _ => "png",
        }
    }

    /// Detect an image extension from data magic bytes.
    pub fn detect_extension(data: &[u8]) -> Option<&'static str> {
        if data.len() < 8 {
            return None;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some("jpg");
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some("png");
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some("gif");
        }

        // TIFF: little-endian or big-endian
        if data.starts_with(&[0x49, 0x49, 0x2A, 0x00])
            || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some("tiff");
        }

        if data.starts_with(b"BM") {
            return Some("bmp");
        }

        // WEBP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some("webp");
        }

        // JPEG 2000
        if data.starts_with(&[0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20]) {
            return Some("jp2");
        }

        // Placeable WMF
        if data.starts_with(&[0xD7, 0xCD, 0xC6, 0x9A]) {
            return Some("wmf");
        }

        // EMF: record type 1 followed by " EMF" signature at offset 40
        if data.len() >= 44 && data.starts_with(&[0x01, 0x00, 0x00, 0x00]) && &data[40..44] == b" EMF"
        {
            return Some("emf");
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_record_new() {
        let img = ImageRecord::new(vec![0xFF, 0xD8, 0xFF], "JPEG", 0);
        assert_eq!(img.ext, "jpg");
        assert_eq!(img.size(), 3);
        assert!(!img.is_metafile());
        assert!(ImageRecord::new(vec![], ".wmf", 1).is_metafile());
    }

    #[test]
    fn test_detect_extension() {
        let jpeg_data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert_eq!(ImageRecord::detect_extension(&jpeg_data), Some("jpg"));

        let png_data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(ImageRecord::detect_extension(&png_data), Some("png"));

        let unknown = vec![0x00, 0x00, 0x00, 0x00];
        assert_eq!(ImageRecord::detect_extension(&unknown), None);
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(ImageRecord::extension_for_mime("image/jpeg"), "jpg");
        assert_eq!(ImageRecord::extension_for_mime("image/x-emf"), "emf");
        assert_eq!(ImageRecord::extension_for_mime("application/unknown"), "png");
    }
}
