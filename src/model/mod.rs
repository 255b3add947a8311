//! Document model types shared by the extractors and the structure classifiers.
//!
//! Extraction produces [`Line`]s and [`ImageRecord`]s, the PDF path
//! additionally builds a [`FontProfile`] and a [`BodySize`], and every
//! format ends up as an [`Extracted`] first-pass Markdown document.

mod document;
mod font;
mod line;
mod resource;

pub use document::{Extracted, MarkdownDocument};
pub use font::{normalize_for_lookup, BodySize, FontInfo, FontProfile, DEFAULT_BODY_SIZE};
pub use line::{Line, SourceSpan};
pub use resource::ImageRecord;
