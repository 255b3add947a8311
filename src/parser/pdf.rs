//! PDF reader: reading-order text, metadata, font scan and images.

use std::collections::HashSet;
use std::any::Any;
use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::model::ImageRecord;

use super::layout::{decode_text_simple, FontScan, LayoutAnalyzer};
use super::options::ParseOptions;

/// A loaded PDF.
pub struct PdfReader {
    doc: LopdfDocument,
    data: Vec<u8>,
    options: ParseOptions,
}

impl PdfReader {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a PDF file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes_with_options(data, options)
    }

    /// Load a PDF from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Load a PDF from bytes with custom options.
    pub fn from_bytes_with_options(data: Vec<u8>, options: ParseOptions) -> Result<Self> {
        let doc = LopdfDocument::load_mem(&data)?;
        if doc.is_encrypted() {
            log::warn!("PDF is encrypted; text extraction may fail");
        }
        Ok(Self { doc, data, options })
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// The `/Title` entry of the document info dictionary, if any.
    pub fn metadata_title(&self) -> Option<String> {
        let info = match self.doc.trailer.get(b"Info").ok()? {
            Object::Reference(r) => self.doc.get_dictionary(*r).ok()?,
            Object::Dictionary(d) => d,
            _ => return None,
        };
        get_string_from_dict(info, b"Title")
    }

    /// Reading-order text, one visual line per line.
    pub fn text(&self) -> Result<String> {
        let text = catch_extract_panic(|| Ok(pdf_extract::extract_text_from_mem(&self.data)?))?;
        Ok(text.replace('\u{0C}', "\n\n"))
    }

    /// Scan fonts across all pages.
    pub fn font_scan(&self) -> FontScan {
        LayoutAnalyzer::new(&self.doc).scan(self.options.key_len, self.options.default_body_size)
    }

    /// Extract embedded raster images in page order.
    ///
    /// Each image object is returned once even when several pages use it.
    /// Images smaller than the configured minimum in either dimension are
    /// dropped, as are images that cannot be read.
    pub fn images(&self) -> Vec<ImageRecord> {
        let mut images = Vec::new();
        let mut seen: HashSet<ObjectId> = HashSet::new();

        for (page_num, page_id) in self.doc.get_pages() {
            for obj_ref in self.page_image_refs(page_id) {
                if !seen.insert(obj_ref) {
                    continue;
                }
                match self.extract_xobject(obj_ref, images.len()) {
                    Ok(Some(image)) => images.push(image),
                    Ok(None) => {}
                    Err(e) => log::warn!(
                        "Could not extract image {} {} on page {}: {}",
                        obj_ref.0,
                        obj_ref.1,
                        page_num,
                        e
                    ),
                }
            }
        }

        log::debug!("extracted {} images", images.len());
        images
    }

    fn page_image_refs(&self, page_id: ObjectId) -> Vec<ObjectId> {
        let Some(resources) = self
            .doc
            .get_dictionary(page_id)
            .ok()
            .and_then(|page| page.get(b"Resources").ok())
            .and_then(|res| self.resolve_dict(res))
        else {
            return Vec::new();
        };

        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|x| self.resolve_dict(x))
        else {
            return Vec::new();
        };

        xobjects
            .iter()
            .filter_map(|(_, obj)| obj.as_reference().ok())
            .collect()
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match obj {
            Object::Reference(r) => self.doc.get_dictionary(*r).ok(),
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Read an image XObject. Form XObjects and small images yield `None`.
    fn extract_xobject(&self, obj_ref: ObjectId, index: usize) -> Result<Option<ImageRecord>> {
        let stream = match self.doc.get_object(obj_ref)? {
            Object::Stream(stream) => stream,
            _ => return Ok(None),
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").and_then(|s| s.as_name_str()).ok() != Some("Image") {
            return Ok(None);
        }

        let dimension = |key: &[u8]| {
            dict.get(key)
                .ok()
                .and_then(|v| v.as_i64().ok())
                .map_or(0, |v| v.max(0) as u32)
        };
        let width = dimension(b"Width");
        let height = dimension(b"Height");

        if width < self.options.min_image_size || height < self.options.min_image_size {
            log::debug!("skipping {}x{} image", width, height);
            return Ok(None);
        }

        let filter = match dict.get(b"Filter") {
            Ok(Object::Name(n)) => String::from_utf8_lossy(n).to_string(),
            Ok(Object::Array(arr)) => arr
                .last()
                .and_then(|o| o.as_name_str().ok())
                .unwrap_or("")
                .to_string(),
            _ => String::new(),
        };

        let (data, ext) = match filter.as_str() {
            "DCTDecode" => (stream.content.clone(), "jpg"),
            "JPXDecode" => (stream.content.clone(), "jp2"),
            _ => {
                let raw = stream
                    .decompressed_content()
                    .map_err(|e| Error::ImageExtract(e.to_string()))?;
                let bits = dict
                    .get(b"BitsPerComponent")
                    .ok()
                    .and_then(|b| b.as_i64().ok())
                    .unwrap_or(8);
                let components = self.color_components(dict);
                let png = raw_to_png(raw, width, height, components, bits)?;
                (png, "png")
            }
        };

        Ok(Some(
            ImageRecord::new(data, ext, index).with_dimensions(width, height),
        ))
    }

    fn color_components(&self, dict: &Dictionary) -> Option<u8> {
        let name = match dict.get(b"ColorSpace").ok()? {
            Object::Name(n) => String::from_utf8_lossy(n).to_string(),
            Object::Reference(r) => match self.doc.get_object(*r).ok()? {
                Object::Name(n) => String::from_utf8_lossy(n).to_string(),
                _ => return None,
            },
            _ => return None,
        };
        match name.as_str() {
            "DeviceGray" | "CalGray" => Some(1),
            "DeviceRGB" | "CalRGB" => Some(3),
            _ => None,
        }
    }
}

/// Wrap raw 8-bit gray or RGB samples in a PNG.
fn raw_to_png(
    raw: Vec<u8>,
    width: u32,
    height: u32,
    components: Option<u8>,
    bits: i64,
) -> Result<Vec<u8>> {
    if bits != 8 {
        return Err(Error::ImageExtract(format!(
            "unsupported bits per component: {}",
            bits
        )));
    }

    let image = match components {
        Some(1) => GrayImage::from_raw(width, height, raw).map(DynamicImage::ImageLuma8),
        Some(3) => RgbImage::from_raw(width, height, raw).map(DynamicImage::ImageRgb8),
        _ => None,
    }
    .ok_or_else(|| Error::ImageExtract("unsupported color space or sample count".to_string()))?;

    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, ImageFormat::Png)?;
    Ok(png.into_inner())
}

/// Helper to get a string from a PDF dictionary.
/// Run a text extraction step, turning a panic inside the extractor into a
/// `PdfParse` error for this document.
fn catch_extract_panic<T, F>(extract: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(extract)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::warn!("PDF text extractor panicked: {}", message);
            Err(Error::PdfParse(format!("text extraction panicked: {}", message)))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_text_simple(bytes)),
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::StringFormat;

    #[test]
    fn test_get_string_from_dict() {
        let mut dict = Dictionary::new();
        dict.set(
            "Title",
            Object::String(b"Quarterly Report".to_vec(), StringFormat::Literal),
        );
        dict.set(
            "Author",
            Object::String(vec![0xFE, 0xFF, 0x00, 0x5A, 0x00, 0xE1], StringFormat::Hexadecimal),
        );
        assert_eq!(
            get_string_from_dict(&dict, b"Title").as_deref(),
            Some("Quarterly Report")
        );
        assert_eq!(get_string_from_dict(&dict, b"Author").as_deref(), Some("Zá"));
        assert_eq!(get_string_from_dict(&dict, b"Subject"), None);
    }

    #[test]
    fn test_raw_to_png() {
        let raw = vec![128u8; 4 * 3 * 3];
        let png = raw_to_png(raw, 4, 3, Some(3), 8).unwrap();
        assert_eq!(ImageRecord::detect_extension(&png), Some("png"));

        assert!(raw_to_png(vec![0u8; 5], 4, 3, Some(3), 8).is_err());
        assert!(raw_to_png(vec![0u8; 12], 4, 3, Some(1), 1).is_err());
        assert!(raw_to_png(vec![0u8; 12], 4, 3, None, 8).is_err());
    }

    #[test]
    fn test_extractor_panic_becomes_error() {
        let err = catch_extract_panic::<String, _>(|| panic!("unknown glyph 0x41"))
            .unwrap_err();
        match err {
            Error::PdfParse(message) => assert!(message.contains("unknown glyph 0x41")),
            other => panic!("unexpected error: {:?}", other),
        }

        let ok = catch_extract_panic(|| Ok("text".to_string())).unwrap();
        assert_eq!(ok, "text");
    }

    #[test]
    fn test_invalid_pdf() {
        assert!(PdfReader::from_bytes(b"not a pdf".to_vec()).is_err());
    }
}
