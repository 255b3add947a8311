//! Source document readers.
//!
//! Each reader turns one input format into the raw material the structure
//! classifiers work on: reading-order text plus a font profile for PDF,
//! semantic HTML for Word documents, plain text for RTF.

mod docx;
mod layout;
mod options;
mod pdf;
mod rtf;

pub use docx::{style_to_tag, DocxContent, DocxReader};
pub use layout::{group_spans_into_lines, FontScan, FontSpan, LayoutAnalyzer, SpanLine};
pub use options::ParseOptions;
pub use pdf::PdfReader;
pub use rtf::{decode_rtf_bytes, parse_rtf, read_rtf, RtfContent};
