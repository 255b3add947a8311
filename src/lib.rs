//! # doc2post
//!
//! Turn office documents into blog posts.
//!
//! PDF, DOCX and RTF files are converted into clean Markdown with a YAML
//! front matter block, ready for a static-site or WordPress-from-Git
//! workflow. Structure that the source format does not state explicitly is
//! recovered heuristically: PDF headings from font sizes relative to the
//! body text, RTF headings from line shape and capitalization.
//!
//! ## Quick Start
//!
//! ```no_run
//! use doc2post::{ConvertOptions, PostConverter, PostStatus};
//!
//! fn main() -> doc2post::Result<()> {
//!     let options = ConvertOptions::default()
//!         .with_output_dir("blog")
//!         .with_status(PostStatus::Publish);
//!
//!     let post = PostConverter::default().convert_file("input/report.pdf".as_ref(), &options)?;
//!     println!("wrote {} ({} words)", post.file_name(), post.stats.word_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Structure recovery**: font-ratio heading classification for PDF,
//!   heuristic headings and lists for RTF, style-mapped headings for DOCX
//! - **Cleanup pipeline**: heading demotion, Slovak/Czech typography,
//!   split-heading merging, list and whitespace normalization
//! - **Publishing metadata**: slugs, excerpts and front matter
//! - **Images**: extraction, de-duplication, resizing and placeholder
//!   substitution
//! - **Illustration**: AI-generated images inserted into existing posts

pub mod convert;
pub mod detect;
pub mod error;
pub mod imagegen;
pub mod model;
pub mod parser;
pub mod render;
pub mod slug;
pub mod structure;

// Re-export commonly used types
pub use convert::{
    collect_inputs, BatchReport, ConvertOptions, DocumentExtractor, ExtractorRegistry,
    FileOutcome, InputSelection, PostConverter,
};
pub use detect::{detect_format_from_path, sniff_format, DocumentFormat};
pub use error::{Error, Result};
pub use model::{Extracted, ImageRecord};
pub use render::{
    CleanupOptions, CleanupPipeline, ConversionResult, ConversionStats, FrontMatter, PostStatus,
};
pub use slug::{generate_slug, slug_with_fallback, unique_slug, SlugOptions};

use std::path::Path;

/// Extract a document into a title and first-pass Markdown.
///
/// # Example
///
/// ```no_run
/// let extracted = doc2post::extract_file("input/notes.rtf").unwrap();
/// println!("{}", extracted.title);
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<Extracted> {
    ExtractorRegistry::with_defaults().extract(path.as_ref())
}

/// Run the cleanup pipeline with all stages enabled.
///
/// # Example
///
/// ```
/// let md = doc2post::clean_markdown("# Title\n\n\n\n\nText \u{201E}quoted\u{201C}   \n");
/// assert_eq!(md, "## Title\n\n\nText \"quoted\"\n");
/// ```
pub fn clean_markdown(markdown: &str) -> String {
    CleanupPipeline::default().process(markdown)
}

/// Convert a document and write the post with default options.
pub fn convert_file<P: AsRef<Path>>(path: P, options: &ConvertOptions) -> Result<ConversionResult> {
    PostConverter::for_options(options).convert_file(path.as_ref(), options)
}
