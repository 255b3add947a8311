//! A single unit of extracted text.

use serde::{Deserialize, Serialize};

/// Where a line came from in the source document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceSpan {
    /// 1-based page number
    pub page: u32,
    /// Baseline Y position in page space
    pub y: f32,
}

/// A single line of extracted text with optional font metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Raw text
    pub text: String,
    /// Average font size in points
    pub font_size: Option<f32>,
    /// Whether the line is predominantly bold
    pub bold: Option<bool>,
    /// Source location
    pub span: Option<SourceSpan>,
}

impl Line {
    /// Create a plain line without font metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: None,
            bold: None,
            span: None,
        }
    }

    /// Set font metadata.
    pub fn with_font(mut self, size: f32, bold: bool) -> Self {
        self.font_size = Some(size);
        self.bold = Some(bold);
        self
    }

    /// Set source location.
    pub fn with_span(mut self, page: u32, y: f32) -> Self {
        self.span = Some(SourceSpan { page, y });
        self
    }

    /// Whether the line contains only whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Split text into lines, keeping blank lines.
    pub fn split(text: &str) -> Vec<Line> {
        text.split('\n')
            .map(|l| Line::new(l.trim_end_matches('\r')))
            .collect()
    }
}
