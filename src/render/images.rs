//! Image sidecar handling: re-encoding, de-duplication and placeholder
//! substitution.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use md5::{Digest, Md5};
use regex::{Captures, Regex};

use crate::error::Result;
use crate::model::ImageRecord;

/// Options for saving images next to converted posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOptions {
    /// Images wider than this are scaled down, keeping the aspect ratio
    pub max_width: u32,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Site-root URL prefix of the images directory
    pub url_prefix: String,
}

impl ImageOptions {
    /// Set the maximum width.
    pub fn with_max_width(mut self, width: u32) -> Self {
        self.max_width = width;
        self
    }

    /// Set the JPEG quality.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Set the URL prefix.
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self
    }

    /// Site-root path of a saved image.
    pub fn url_for(&self, slug: &str, filename: &str) -> String {
        format!("{}/{}/{}", self.url_prefix.trim_end_matches('/'), slug, filename)
    }
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            max_width: 1600,
            jpeg_quality: 85,
            url_prefix: "/_images".to_string(),
        }
    }
}

/// Output encoding chosen for a processed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Opaque images
    Jpeg,
    /// Images with an alpha channel
    Png,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

/// A decoded, resized image ready to be written.
pub struct ProcessedImage {
    image: DynamicImage,
    format: OutputFormat,
}

impl ProcessedImage {
    /// Decode image bytes, pick PNG for transparent images and JPEG otherwise,
    /// and scale down to the configured maximum width.
    pub fn decode(data: &[u8], options: &ImageOptions) -> Result<Self> {
        let mut image = image::load_from_memory(data)?;

        let format = if image.color().has_alpha() {
            OutputFormat::Png
        } else {
            OutputFormat::Jpeg
        };

        if image.width() > options.max_width {
            let ratio = options.max_width as f64 / image.width() as f64;
            let height = ((image.height() as f64 * ratio) as u32).max(1);
            image = image.resize_exact(options.max_width, height, FilterType::Lanczos3);
        }

        Ok(Self { image, format })
    }

    /// Chosen output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Current dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Write to `path` in the chosen format.
    pub fn save(&self, path: &Path, options: &ImageOptions) -> Result<()> {
        match self.format {
            OutputFormat::Png => {
                DynamicImage::ImageRgba8(self.image.to_rgba8())
                    .save_with_format(path, ImageFormat::Png)?;
            }
            OutputFormat::Jpeg => {
                let writer = BufWriter::new(File::create(path)?);
                let encoder = JpegEncoder::new_with_quality(writer, options.jpeg_quality);
                DynamicImage::ImageRgb8(self.image.to_rgb8()).write_with_encoder(encoder)?;
            }
        }
        Ok(())
    }
}

/// Placeholder text for the image with the given index.
pub fn placeholder(index: usize) -> String {
    format!("__IMAGE_{}__", index)
}

/// Saved images: source index to site-root path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMapping {
    paths: BTreeMap<usize, String>,
}

impl ImageMapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map an image index to a path.
    pub fn insert(&mut self, index: usize, path: impl Into<String>) {
        self.paths.insert(index, path.into());
    }

    /// Path for an image index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.paths.get(&index).map(String::as_str)
    }

    /// Number of mapped placeholders.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether nothing was mapped.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Number of distinct files behind the mapping.
    pub fn file_count(&self) -> usize {
        let mut unique: Vec<&String> = self.paths.values().collect();
        unique.sort();
        unique.dedup();
        unique.len()
    }

    /// Path of the lowest-index image, without the leading slash.
    pub fn featured_image(&self) -> Option<String> {
        self.paths
            .values()
            .next()
            .map(|p| p.trim_start_matches('/').to_string())
    }
}

/// Save extracted images to `<images_dir>/<slug>/image-NNN.<ext>`.
///
/// Identical images (by MD5) are written once and share a path. Images that
/// fail to decode or write are skipped with a warning. Windows metafiles are
/// skipped.
pub fn save_images(
    images: &[ImageRecord],
    slug: &str,
    images_dir: &Path,
    options: &ImageOptions,
) -> Result<ImageMapping> {
    let mut mapping = ImageMapping::new();
    if images.is_empty() {
        return Ok(mapping);
    }

    let output_dir = images_dir.join(slug);
    fs::create_dir_all(&output_dir)?;

    let mut seen: HashMap<Vec<u8>, String> = HashMap::new();

    for record in images {
        if record.is_metafile() {
            log::warn!("Skipping Windows metafile image ({})", record.ext);
            continue;
        }

        let digest = Md5::digest(&record.data).to_vec();
        if let Some(path) = seen.get(&digest) {
            log::debug!("image {} duplicates {}", record.index + 1, path);
            mapping.insert(record.index, path.clone());
            continue;
        }

        match save_one(record, slug, &output_dir, options) {
            Ok(path) => {
                seen.insert(digest, path.clone());
                mapping.insert(record.index, path);
            }
            Err(e) => log::warn!("Could not save image {}: {}", record.index + 1, e),
        }
    }

    Ok(mapping)
}

fn save_one(
    record: &ImageRecord,
    slug: &str,
    output_dir: &Path,
    options: &ImageOptions,
) -> Result<String> {
    let processed = ProcessedImage::decode(&record.data, options)?;
    let filename = format!(
        "image-{:03}.{}",
        record.index + 1,
        processed.format().extension()
    );
    let path: PathBuf = output_dir.join(&filename);
    processed.save(&path, options)?;
    Ok(options.url_for(slug, &filename))
}

fn markdown_image_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"!\[([^\]]*)\]\((?:\\?_){2}IMAGE\\?_(\d+)(?:\\?_){2}\)").unwrap()
    })
}

fn bare_placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:\\?_){2}IMAGE\\?_(\d+)(?:\\?_){2}").unwrap())
}

fn img_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<img[^>]*src="([^"]+)"[^>]*/?>"#).unwrap())
}

/// Replace `__IMAGE_n__` placeholders with Markdown image references.
///
/// Handles `src="__IMAGE_n__"` attributes, Markdown images targeting a
/// placeholder, and bare placeholders (Markdown-escaped underscores
/// included). Remaining `<img>` tags become Markdown images. Placeholders
/// without a mapping are left untouched.
pub fn replace_image_placeholders(markdown: &str, mapping: &ImageMapping) -> String {
    let mut result = markdown.to_string();

    for (index, path) in &mapping.paths {
        result = result.replace(
            &format!("src=\"{}\"", placeholder(*index)),
            &format!("src=\"{}\"", path),
        );
    }

    let lookup = |caps: &Captures, group: usize| -> Option<&str> {
        caps[group].parse::<usize>().ok().and_then(|i| mapping.get(i))
    };

    let result = markdown_image_regex().replace_all(&result, |caps: &Captures| {
        match lookup(caps, 2) {
            Some(path) => {
                let alt = if caps[1].trim().is_empty() { "image" } else { &caps[1] };
                format!("![{}]({})", alt, path)
            }
            None => caps[0].to_string(),
        }
    });

    let result = bare_placeholder_regex().replace_all(&result, |caps: &Captures| {
        match lookup(caps, 1) {
            Some(path) => format!("![image]({})", path),
            None => caps[0].to_string(),
        }
    });

    img_tag_regex()
        .replace_all(&result, "![image]($1)")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(image: DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn opaque(width: u32, height: u32, shade: u8) -> Vec<u8> {
        png_bytes(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb([shade, 10, 10]),
        )))
    }

    #[test]
    fn test_save_dedupes_and_picks_format() {
        let dir = tempfile::tempdir().unwrap();
        let transparent = png_bytes(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            60,
            60,
            Rgba([0, 0, 0, 0]),
        )));
        let images = vec![
            ImageRecord::new(opaque(80, 60, 200), "png", 0),
            ImageRecord::new(transparent, "png", 1),
            ImageRecord::new(opaque(80, 60, 200), "png", 2),
        ];

        let mapping = save_images(&images, "post", dir.path(), &ImageOptions::default()).unwrap();

        assert_eq!(mapping.get(0), Some("/_images/post/image-001.jpg"));
        assert_eq!(mapping.get(1), Some("/_images/post/image-002.png"));
        assert_eq!(mapping.get(2), Some("/_images/post/image-001.jpg"));
        assert_eq!(mapping.file_count(), 2);
        assert!(dir.path().join("post/image-001.jpg").exists());
        assert!(!dir.path().join("post/image-003.jpg").exists());
        assert_eq!(
            mapping.featured_image(),
            Some("_images/post/image-001.jpg".to_string())
        );
    }

    #[test]
    fn test_resize_to_max_width() {
        let options = ImageOptions::default().with_max_width(100);
        let processed = ProcessedImage::decode(&opaque(400, 200, 50), &options).unwrap();
        assert_eq!(processed.dimensions(), (100, 50));
        assert_eq!(processed.format(), OutputFormat::Jpeg);
    }

    #[test]
    fn test_broken_image_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let images = vec![ImageRecord::new(vec![1, 2, 3, 4, 5, 6, 7, 8, 9], "png", 0)];
        let mapping = save_images(&images, "post", dir.path(), &ImageOptions::default()).unwrap();
        assert!(mapping.is_empty());
        assert_eq!(mapping.featured_image(), None);
    }

    #[test]
    fn test_replace_placeholders() {
        let mut mapping = ImageMapping::new();
        mapping.insert(0, "/_images/p/image-001.jpg");
        mapping.insert(1, "/_images/p/image-002.png");

        let md = "Intro\n\n![](__IMAGE_0__)\n\n\\_\\_IMAGE\\_1\\_\\_\n\n__IMAGE_7__\n\n<img alt=\"x\" src=\"__IMAGE_1__\" />";
        let out = replace_image_placeholders(md, &mapping);
        assert_eq!(
            out,
            "Intro\n\n![image](/_images/p/image-001.jpg)\n\n![image](/_images/p/image-002.png)\n\n__IMAGE_7__\n\n![image](/_images/p/image-002.png)"
        );
    }

    #[test]
    fn test_markdown_image_keeps_alt() {
        let mut mapping = ImageMapping::new();
        mapping.insert(3, "/_images/p/image-004.jpg");
        let out = replace_image_placeholders("![Chart](__IMAGE_3__)", &mapping);
        assert_eq!(out, "![Chart](/_images/p/image-004.jpg)");
    }
}
