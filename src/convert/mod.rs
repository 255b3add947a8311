//! Document extractors and the conversion pipeline.
//!
//! Each supported format has a [`DocumentExtractor`] that turns a file into
//! an [`Extracted`] first-pass Markdown document. The [`ExtractorRegistry`]
//! dispatches on file extension, and [`PostConverter`] runs the shared
//! cleanup, slug, image and front-matter steps on top.
//!
//! # Example
//!
//! ```no_run
//! use doc2post::convert::{ConvertOptions, PostConverter};
//! use std::path::Path;
//!
//! fn main() -> doc2post::Result<()> {
//!     let converter = PostConverter::default();
//!     let options = ConvertOptions::default().with_output_dir("blog");
//!     let post = converter.convert_file(Path::new("input/report.pdf"), &options)?;
//!     println!("{}", post.content());
//!     Ok(())
//! }
//! ```

mod docx;
mod pdf;
mod pipeline;
mod rtf;

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;
pub use pipeline::{
    collect_inputs, BatchReport, ConvertOptions, FileOutcome, InputSelection, PostConverter,
    EXIT_FAILURES, EXIT_NO_INPUT, EXIT_OK,
};
pub use rtf::RtfExtractor;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::Extracted;
use crate::structure::title_from_path;

/// Title used when neither the content nor a file name yields one.
pub const UNTITLED: &str = "Untitled";

/// Trait for format extractors.
///
/// Implement this trait to add support for a new document format.
pub trait DocumentExtractor: Send + Sync {
    /// Supported file extensions, lowercase without the leading dot.
    fn supported_extensions(&self) -> &[&str];

    /// Get the name of this extractor.
    fn name(&self) -> &str;

    /// Extract from bytes, using `fallback_title` when the content has no title.
    fn extract_with_fallback(&self, bytes: &[u8], fallback_title: &str) -> Result<Extracted>;

    /// Extract from bytes.
    fn extract_bytes(&self, bytes: &[u8]) -> Result<Extracted> {
        self.extract_with_fallback(bytes, UNTITLED)
    }

    /// Extract a file; the title falls back to the file name.
    fn extract(&self, path: &Path) -> Result<Extracted> {
        let bytes = std::fs::read(path)?;
        self.extract_with_fallback(&bytes, &title_from_path(path))
    }

    /// Check if this extractor supports the given extension.
    fn supports_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.trim_start_matches('.').to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext_lower)
    }
}

/// Registry mapping file extensions to extractors.
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn DocumentExtractor>>,
    by_name: HashMap<String, Arc<dyn DocumentExtractor>>,
}

impl ExtractorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with the PDF, Word and RTF extractors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfExtractor::default()));
        registry.register(Arc::new(DocxExtractor::default()));
        registry.register(Arc::new(RtfExtractor::default()));
        registry
    }

    /// Register an extractor for all of its extensions.
    pub fn register(&mut self, extractor: Arc<dyn DocumentExtractor>) {
        for ext in extractor.supported_extensions() {
            self.extractors
                .insert(ext.to_lowercase(), extractor.clone());
        }
        self.by_name
            .insert(extractor.name().to_lowercase(), extractor);
    }

    /// Get an extractor by file extension (with or without the dot).
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn DocumentExtractor>> {
        self.extractors
            .get(&ext.trim_start_matches('.').to_lowercase())
            .cloned()
    }

    /// Get an extractor by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn DocumentExtractor>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.get_by_extension(ext).is_some()
    }

    /// Check if a path has a supported extension.
    pub fn supports_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(false, |ext| self.supports(ext))
    }

    /// All supported extensions, sorted.
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.extractors.keys().map(|s| s.as_str()).collect();
        exts.sort_unstable();
        exts
    }

    /// Extract a file with the extractor registered for its extension.
    pub fn extract(&self, path: &Path) -> Result<Extracted> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();

        let extractor = self
            .get_by_extension(&ext)
            .ok_or_else(|| Error::UnsupportedFormat(unsupported_label(path, &ext)))?;

        log::debug!("extracting {} with {}", path.display(), extractor.name());
        extractor.extract(path)
    }

    /// Extract bytes, choosing the extractor by extension.
    pub fn extract_bytes(&self, bytes: &[u8], ext: &str) -> Result<Extracted> {
        let extractor = self
            .get_by_extension(ext)
            .ok_or_else(|| Error::UnsupportedFormat(ext.to_string()))?;
        extractor.extract_bytes(bytes)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn unsupported_label(path: &Path, ext: &str) -> String {
    if ext.is_empty() {
        path.display().to_string()
    } else {
        ext.to_string()
    }
}
