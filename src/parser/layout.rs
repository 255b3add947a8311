//! Font layout pass over PDF content streams.
//!
//! Walks each page's text operators to recover spans with their font size
//! and weight, groups spans sharing a baseline into visual lines, and turns
//! those lines into a [`FontProfile`] plus the document's [`BodySize`].

use std::collections::{BTreeMap, HashMap};

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::model::{BodySize, FontInfo, FontProfile};

/// Adjustment in a `TJ` array (thousandths of text space) treated as a word gap.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A run of text drawn with one font.
#[derive(Debug, Clone)]
pub struct FontSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Effective font size in points
    pub font_size: f32,
    /// Font name (e.g., "Helvetica-Bold")
    pub font_name: String,
    /// Whether the font name marks a bold face
    pub is_bold: bool,
}

impl FontSpan {
    /// Create a new span; boldness is read from the font name.
    pub fn new(text: String, x: f32, y: f32, font_size: f32, font_name: String) -> Self {
        let lower = font_name.to_lowercase();
        let is_bold = lower.contains("bold") || lower.contains("heavy") || lower.contains("black");
        Self {
            text,
            x,
            y,
            font_size,
            font_name,
            is_bold,
        }
    }
}

/// Spans sharing a baseline.
#[derive(Debug, Clone)]
pub struct SpanLine {
    /// Spans sorted by X position
    pub spans: Vec<FontSpan>,
    /// Baseline of the first span
    pub y: f32,
}

impl SpanLine {
    /// Create a line from spans, ordering them left to right.
    pub fn from_spans(mut spans: Vec<FontSpan>) -> Self {
        spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        let y = spans.first().map_or(0.0, |s| s.y);
        Self { spans, y }
    }

    /// Trimmed span texts joined by single spaces.
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Mean font size over non-blank spans.
    pub fn average_size(&self) -> Option<f32> {
        let sizes: Vec<f32> = self
            .spans
            .iter()
            .filter(|s| !s.text.trim().is_empty())
            .map(|s| s.font_size)
            .collect();
        if sizes.is_empty() {
            None
        } else {
            Some(sizes.iter().sum::<f32>() / sizes.len() as f32)
        }
    }

    /// Whether any non-blank span uses a bold face.
    pub fn is_bold(&self) -> bool {
        self.spans
            .iter()
            .any(|s| s.is_bold && !s.text.trim().is_empty())
    }
}

/// Group spans into lines by baseline, top to bottom.
pub fn group_spans_into_lines(mut spans: Vec<FontSpan>) -> Vec<SpanLine> {
    if spans.is_empty() {
        return vec![];
    }

    // PDF Y grows upwards
    spans.sort_by(|a, b| {
        let y_cmp = b.y.partial_cmp(&a.y).unwrap_or(std::cmp::Ordering::Equal);
        if y_cmp == std::cmp::Ordering::Equal {
            a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal)
        } else {
            y_cmp
        }
    });

    let mut lines = Vec::new();
    let mut current: Vec<FontSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let tolerance = span.font_size * 0.3;
        match current_y {
            Some(y) if (span.y - y).abs() <= tolerance => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(SpanLine::from_spans(std::mem::take(&mut current)));
                }
                current_y = Some(span.y);
                current.push(span);
            }
        }
    }
    if !current.is_empty() {
        lines.push(SpanLine::from_spans(current));
    }

    lines
}

/// Per-document font scan result.
#[derive(Debug, Clone, Default)]
pub struct FontScan {
    /// Normalized line text to size and weight
    pub profile: FontProfile,
    /// Modal line size
    pub body_size: BodySize,
    /// Number of visual lines seen
    pub line_count: usize,
}

impl FontScan {
    /// Build a profile from visual lines.
    pub fn from_lines(lines: &[SpanLine], key_len: usize, default_body: f32) -> Self {
        let mut profile = FontProfile::new(key_len);
        let mut sizes = Vec::with_capacity(lines.len());

        for line in lines {
            let text = line.text();
            let Some(size) = line.average_size() else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            sizes.push(size);
            profile.insert(&text, FontInfo::new(size, line.is_bold()));
        }

        Self {
            body_size: BodySize::from_sizes(sizes.iter().copied(), default_body),
            line_count: sizes.len(),
            profile,
        }
    }
}

/// Font-aware text walker over a loaded PDF.
pub struct LayoutAnalyzer<'a> {
    doc: &'a LopdfDocument,
}

impl<'a> LayoutAnalyzer<'a> {
    /// Create a new analyzer for the document.
    pub fn new(doc: &'a LopdfDocument) -> Self {
        Self { doc }
    }

    /// Scan every page and build the document's font profile.
    ///
    /// Pages whose content cannot be read are skipped with a warning.
    pub fn scan(&self, key_len: usize, default_body: f32) -> FontScan {
        let mut lines = Vec::new();
        for (page_num, page_id) in self.doc.get_pages() {
            match self.extract_page_spans(page_id) {
                Ok(spans) => lines.extend(group_spans_into_lines(spans)),
                Err(e) => log::warn!("Skipping fonts on page {}: {}", page_num, e),
            }
        }
        let scan = FontScan::from_lines(&lines, key_len, default_body);
        log::debug!(
            "font scan: {} lines, body size {:.1}",
            scan.line_count,
            scan.body_size.value()
        );
        scan
    }

    /// Extract text spans from a page with position and font information.
    pub fn extract_page_spans(&self, page_id: ObjectId) -> Result<Vec<FontSpan>> {
        let lopdf_fonts = self
            .doc
            .get_page_fonts(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let mut fonts = HashMap::new();
        for (name, font) in &lopdf_fonts {
            let base_font = font
                .get(b"BaseFont")
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).to_string())
                .unwrap_or_else(|| String::from_utf8_lossy(name).to_string());
            fonts.insert(name.clone(), base_font);
        }

        let content = self.page_content(page_id)?;
        self.walk_content(&content, &fonts, &lopdf_fonts)
    }

    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            // Blank page
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r) {
                Ok(Object::Stream(s)) => Ok(s
                    .decompressed_content()
                    .unwrap_or_else(|_| s.content.clone())),
                _ => Err(Error::PdfParse("Invalid content stream".to_string())),
            },
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Object::Reference(r) = obj {
                        if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                            if let Ok(data) = s.decompressed_content() {
                                content.extend_from_slice(&data);
                                content.push(b' ');
                            }
                        }
                    }
                }
                Ok(content)
            }
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    fn walk_content(
        &self,
        content: &[u8],
        fonts: &HashMap<Vec<u8>, String>,
        lopdf_fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
    ) -> Result<Vec<FontSpan>> {
        let content =
            lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

        let mut spans = Vec::new();
        let mut font_key: Vec<u8> = Vec::new();
        let mut font_name = String::new();
        let mut font_size: f32 = 12.0;
        let mut matrix = TextMatrix::default();
        let mut in_text = false;

        for op in content.operations {
            let font = lopdf_fonts.get(&font_key).copied();

            let text = match op.operator.as_str() {
                "BT" => {
                    in_text = true;
                    matrix = TextMatrix::default();
                    None
                }
                "ET" => {
                    in_text = false;
                    None
                }
                "Tf" => {
                    if let (Some(Object::Name(name)), Some(size)) =
                        (op.operands.first(), op.operands.get(1))
                    {
                        font_key = name.clone();
                        font_name = fonts
                            .get(name.as_slice())
                            .cloned()
                            .unwrap_or_else(|| String::from_utf8_lossy(name).to_string());
                        font_size = get_number(size).unwrap_or(12.0);
                    }
                    None
                }
                "TL" => {
                    if let Some(leading) = op.operands.first().and_then(get_number) {
                        matrix.leading = leading;
                    }
                    None
                }
                "Td" | "TD" => {
                    if op.operands.len() >= 2 {
                        let tx = get_number(&op.operands[0]).unwrap_or(0.0);
                        let ty = get_number(&op.operands[1]).unwrap_or(0.0);
                        if op.operator == "TD" {
                            matrix.leading = -ty;
                        }
                        matrix.translate(tx, ty);
                    }
                    None
                }
                "Tm" => {
                    if op.operands.len() >= 6 {
                        let n: Vec<f32> = op
                            .operands
                            .iter()
                            .take(6)
                            .map(|o| get_number(o).unwrap_or(0.0))
                            .collect();
                        matrix.set(n[0], n[1], n[2], n[3], n[4], n[5]);
                    }
                    None
                }
                "T*" => {
                    matrix.next_line();
                    None
                }
                "Tj" if in_text => match op.operands.first() {
                    Some(Object::String(bytes, _)) => Some(self.decode(font, bytes)),
                    _ => None,
                },
                "TJ" if in_text => match op.operands.first() {
                    Some(Object::Array(items)) => {
                        let mut combined = String::new();
                        for item in items {
                            match item {
                                Object::String(bytes, _) => {
                                    combined.push_str(&self.decode(font, bytes))
                                }
                                other => {
                                    let adjustment = -get_number(other).unwrap_or(0.0);
                                    if adjustment > TJ_SPACE_THRESHOLD
                                        && !combined.is_empty()
                                        && !combined.ends_with(char::is_whitespace)
                                    {
                                        combined.push(' ');
                                    }
                                }
                            }
                        }
                        Some(combined)
                    }
                    _ => None,
                },
                "'" | "\"" => {
                    matrix.next_line();
                    let index = if op.operator == "\"" { 2 } else { 0 };
                    match op.operands.get(index) {
                        Some(Object::String(bytes, _)) if in_text => Some(self.decode(font, bytes)),
                        _ => None,
                    }
                }
                _ => None,
            };

            if let Some(text) = text {
                if !text.trim().is_empty() {
                    let (x, y) = matrix.position();
                    spans.push(FontSpan::new(
                        text,
                        x,
                        y,
                        font_size * matrix.scale(),
                        font_name.clone(),
                    ));
                }
            }
        }

        Ok(spans)
    }

    fn decode(&self, font: Option<&lopdf::Dictionary>, bytes: &[u8]) -> String {
        match font.and_then(|f| f.get_font_encoding(self.doc).ok()) {
            Some(encoding) => LopdfDocument::decode_text(&encoding, bytes).unwrap_or_default(),
            None => decode_text_simple(bytes),
        }
    }
}

/// Text matrix for tracking position in a content stream.
#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
    leading: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            leading: 12.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.e += tx * self.a + ty * self.c;
        self.f += tx * self.b + ty * self.d;
    }

    fn next_line(&mut self) {
        self.translate(0.0, -self.leading);
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        let scale = (self.a * self.a + self.c * self.c).sqrt();
        if scale > 0.0 {
            scale
        } else {
            1.0
        }
    }
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Decode a PDF string when the font has no usable encoding.
pub(crate) fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // Latin-1
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x: f32, y: f32, size: f32, font: &str) -> FontSpan {
        FontSpan::new(text.to_string(), x, y, size, font.to_string())
    }

    #[test]
    fn test_span_bold_detection() {
        assert!(span("A", 0.0, 0.0, 12.0, "Helvetica-Bold").is_bold);
        assert!(span("A", 0.0, 0.0, 12.0, "Arial-Black").is_bold);
        assert!(span("A", 0.0, 0.0, 12.0, "Inter-Heavy").is_bold);
        assert!(!span("A", 0.0, 0.0, 12.0, "Helvetica-Oblique").is_bold);
    }

    #[test]
    fn test_group_spans_into_lines() {
        let spans = vec![
            span("world", 60.0, 700.0, 12.0, "Helvetica"),
            span("Second", 10.0, 680.0, 12.0, "Helvetica"),
            span("Hello", 10.0, 701.0, 12.0, "Helvetica-Bold"),
        ];
        let lines = group_spans_into_lines(spans);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "Hello world");
        assert!(lines[0].is_bold());
        assert_eq!(lines[1].text(), "Second");
        assert!(!lines[1].is_bold());
    }

    #[test]
    fn test_font_scan() {
        let mut spans = vec![span("Big Title", 10.0, 800.0, 18.0, "Helvetica")];
        for i in 0..5 {
            spans.push(span(
                &format!("Body line {}", i),
                10.0,
                700.0 - i as f32 * 20.0,
                12.0,
                "Helvetica",
            ));
        }
        let lines = group_spans_into_lines(spans);
        let scan = FontScan::from_lines(&lines, 60, 12.0);

        assert_eq!(scan.line_count, 6);
        assert!((scan.body_size.value() - 12.0).abs() < 1e-6);
        let info = scan.profile.get("big   TITLE").unwrap();
        assert!((info.size - 18.0).abs() < 1e-6);
        assert!(!info.bold);
    }

    #[test]
    fn test_average_size() {
        let line = SpanLine::from_spans(vec![
            span("a", 0.0, 0.0, 10.0, "F"),
            span("b", 5.0, 0.0, 14.0, "F"),
        ]);
        assert_eq!(line.average_size(), Some(12.0));
        assert_eq!(SpanLine::from_spans(vec![]).average_size(), None);
    }

    #[test]
    fn test_decode_text_simple() {
        assert_eq!(decode_text_simple(b"Hello"), "Hello");
        assert_eq!(decode_text_simple(&[0xFE, 0xFF, 0x00, 0x41]), "A");
        assert_eq!(decode_text_simple(&[0xE9]), "\u{e9}");
    }
}
