//! Input format detection by extension and by content.

use crate::error::{Error, Result};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// Portable Document Format
    Pdf,
    /// Word package (`.docx`, also tried for `.doc`)
    Docx,
    /// Rich Text Format
    Rtf,
}

impl DocumentFormat {
    /// Format name as shown to users.
    pub fn name(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Docx => "DOCX",
            DocumentFormat::Rtf => "RTF",
        }
    }

    /// Format for a file extension (with or without the dot, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" | "doc" => Some(DocumentFormat::Docx),
            "rtf" => Some(DocumentFormat::Rtf),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const RTF_MAGIC: &[u8] = b"{\\rtf";
const HEADER_LEN: usize = 16;

/// Format implied by a path's extension.
///
/// # Example
/// ```
/// use doc2post::detect::{detect_format_from_path, DocumentFormat};
///
/// let format = detect_format_from_path("input/Report.PDF").unwrap();
/// assert_eq!(format, DocumentFormat::Pdf);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<DocumentFormat> {
    let path = path.as_ref();
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(DocumentFormat::from_extension)
        .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))
}

/// Format implied by the leading bytes, if recognizable.
///
/// A UTF-8 byte order mark before `{\rtf` is tolerated.
pub fn sniff_format(data: &[u8]) -> Option<DocumentFormat> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    if data.starts_with(PDF_MAGIC) {
        Some(DocumentFormat::Pdf)
    } else if data.starts_with(ZIP_MAGIC) {
        Some(DocumentFormat::Docx)
    } else if data.starts_with(RTF_MAGIC) {
        Some(DocumentFormat::Rtf)
    } else {
        None
    }
}

/// Read a file's header and sniff its format.
pub fn sniff_file<P: AsRef<Path>>(path: P) -> Result<Option<DocumentFormat>> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    File::open(path)?
        .take(HEADER_LEN as u64)
        .read_to_end(&mut header)?;
    Ok(sniff_format(&header))
}

/// Describe a disagreement between a file's extension and its content.
///
/// Returns `None` when they agree or when either cannot be determined.
pub fn extension_mismatch<P: AsRef<Path>>(path: P) -> Option<String> {
    let path = path.as_ref();
    let by_name = detect_format_from_path(path).ok()?;
    let by_content = sniff_file(path).ok()??;
    (by_name != by_content).then(|| {
        format!(
            "{} has a {} extension but looks like {}",
            path.display(),
            by_name,
            by_content
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(DocumentFormat::from_extension("pdf"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension(".DOC"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_extension("Rtf"), Some(DocumentFormat::Rtf));
        assert_eq!(DocumentFormat::from_extension("odt"), None);
    }

    #[test]
    fn test_detect_from_path() {
        assert_eq!(
            detect_format_from_path("a/b.docx").unwrap(),
            DocumentFormat::Docx
        );
        assert!(matches!(
            detect_format_from_path("notes.txt"),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(detect_format_from_path("README").is_err());
    }

    #[test]
    fn test_sniff_format() {
        assert_eq!(sniff_format(b"%PDF-1.7\n"), Some(DocumentFormat::Pdf));
        assert_eq!(sniff_format(b"PK\x03\x04\x14\x00"), Some(DocumentFormat::Docx));
        assert_eq!(sniff_format(b"{\\rtf1\\ansi"), Some(DocumentFormat::Rtf));
        assert_eq!(sniff_format(b"\xEF\xBB\xBF{\\rtf1"), Some(DocumentFormat::Rtf));
        assert_eq!(sniff_format(b"Hello"), None);
        assert_eq!(sniff_format(b""), None);
    }

    #[test]
    fn test_extension_mismatch() {
        let dir = tempfile::TempDir::new().unwrap();
        let fake = dir.path().join("report.pdf");
        std::fs::write(&fake, b"{\\rtf1 text}").unwrap();
        let message = extension_mismatch(&fake).unwrap();
        assert!(message.ends_with("has a PDF extension but looks like RTF"));

        let real = dir.path().join("notes.rtf");
        std::fs::write(&real, b"{\\rtf1 text}").unwrap();
        assert_eq!(extension_mismatch(&real), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(DocumentFormat::Docx.to_string(), "DOCX");
    }
}
