//! Error types for doc2post.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for doc2post operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting documents or illustrating posts.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file extension is not one of the supported input formats.
    #[error("Unsupported format: {0} (supported: .pdf, .docx, .doc, .rtf)")]
    UnsupportedFormat(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// Error reading a Word document package.
    #[error("DOCX error: {0}")]
    Docx(String),

    /// Error reading an RTF document.
    #[error("RTF error: {0}")]
    Rtf(String),

    /// Text could not be decoded.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Error extracting an embedded image.
    #[error("Image extraction error: {0}")]
    ImageExtract(String),

    /// Error decoding, resizing or re-encoding an image.
    #[error("Image processing error: {0}")]
    ImageProcess(String),

    /// The target post has no YAML front matter block.
    #[error("No valid YAML front matter found in {}", .0.display())]
    MissingFrontMatter(PathBuf),

    /// Image generation failed after all retry attempts.
    #[error("Image generation failed after {attempts} attempts: {detail}")]
    Generation {
        /// Number of attempts made
        attempts: u32,
        /// Last error seen
        detail: String,
    },

    /// No API key was configured for the image generation service.
    #[error("No API key found. Set GEMINI_API_KEY or GOOGLE_API_KEY, or pass --api-key.")]
    MissingApiKey,

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A post date could not be parsed.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<pdf_extract::OutputError> for Error {
    fn from(err: pdf_extract::OutputError) -> Self {
        Error::PdfParse(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::Docx(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Docx(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageProcess(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Other(format!("JSON error: {}", err))
    }
}
