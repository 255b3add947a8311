//! Word document reader.
//!
//! Translates `word/document.xml` into semantic HTML through a paragraph
//! style map, the way a Word-to-HTML converter would: heading styles become
//! `h1`..`h5`, bold runs become `strong`, italic and underlined runs become
//! `em`, numbered paragraphs become list items and embedded pictures become
//! `<img>` tags pointing at `__IMAGE_<n>__` placeholders.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader as XmlReader;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::model::ImageRecord;
use crate::render::placeholder;

const DOCUMENT_PART: &str = "word/document.xml";
const RELS_PART: &str = "word/_rels/document.xml.rels";
const STYLES_PART: &str = "word/styles.xml";

/// HTML rendition of a Word document plus what was found along the way.
#[derive(Debug, Clone, Default)]
pub struct DocxContent {
    /// Semantic HTML body
    pub html: String,
    /// Embedded images, indexed by their placeholder number
    pub images: Vec<ImageRecord>,
    /// Non-fatal problems
    pub warnings: Vec<String>,
    headings: Vec<(u8, String)>,
    bold_texts: Vec<String>,
}

impl DocxContent {
    /// Title candidate: the first `h1`, else `h2`, else `h3` text, else the
    /// first bold text longer than 5 characters.
    pub fn title(&self) -> Option<String> {
        for level in 1..=3 {
            if let Some((_, text)) = self.headings.iter().find(|(l, _)| *l == level) {
                return Some(text.clone());
            }
        }
        self.bold_texts
            .iter()
            .find(|t| t.chars().count() > 5)
            .cloned()
    }
}

/// Reads a `.docx` package.
pub struct DocxReader {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl DocxReader {
    /// Open a Word document.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_bytes(std::fs::read(path.as_ref())?)
    }

    /// Load a Word document from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))?;
        Ok(Self { archive })
    }

    /// Translate the document body into HTML and collect its images.
    pub fn read(&mut self, extract_images: bool) -> Result<DocxContent> {
        let document = self
            .read_part(DOCUMENT_PART)?
            .ok_or_else(|| Error::Docx(format!("missing {}", DOCUMENT_PART)))?;
        let relationships = match self.read_part(RELS_PART)? {
            Some(xml) => parse_relationships(&xml)?,
            None => HashMap::new(),
        };
        let styles = match self.read_part(STYLES_PART)? {
            Some(xml) => parse_style_names(&xml)?,
            None => HashMap::new(),
        };

        let translator = HtmlTranslator::new(&styles);
        translator.run(&document, |rel_id| {
            if !extract_images {
                return Ok(None);
            }
            let Some(target) = relationships.get(rel_id) else {
                return Ok(None);
            };
            let part = resolve_target(target);
            Ok(self.read_bytes(&part)?.map(|data| (data, extension_of(&part))))
        })
    }

    fn read_bytes(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut buffer = Vec::new();
        entry.read_to_end(&mut buffer)?;
        Ok(Some(buffer))
    }

    fn read_part(&mut self, name: &str) -> Result<Option<String>> {
        Ok(self
            .read_bytes(name)?
            .map(|b| String::from_utf8_lossy(&b).into_owned()))
    }
}

/// Paragraph style name to HTML block tag.
pub fn style_to_tag(style_name: &str) -> Option<&'static str> {
    let normalized = style_name.trim().to_lowercase().replace(' ', "");
    match normalized.as_str() {
        "heading1" | "title" => Some("h1"),
        "heading2" | "subtitle" => Some("h2"),
        "heading3" => Some("h3"),
        "heading4" => Some("h4"),
        "heading5" => Some("h5"),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RunFormat {
    bold: bool,
    italic: bool,
}

/// Which property block the reader is inside.
#[derive(Debug, Clone, Copy, Default)]
struct Scope {
    run_props: bool,
    para_props: bool,
}

#[derive(Debug)]
enum Segment {
    Text(RunFormat, String),
    Markup(String),
}

#[derive(Debug, Default)]
struct Paragraph {
    style: Option<String>,
    list: bool,
    segments: Vec<Segment>,
    has_image: bool,
}

impl Paragraph {
    fn push_text(&mut self, format: RunFormat, text: &str) {
        match self.segments.last_mut() {
            Some(Segment::Text(last, buf)) if *last == format => buf.push_str(text),
            _ => self.segments.push(Segment::Text(format, text.to_string())),
        }
    }

    fn push_markup(&mut self, html: String) {
        self.segments.push(Segment::Markup(html));
    }

    fn plain_text(&self) -> String {
        let mut text = String::new();
        for segment in &self.segments {
            if let Segment::Text(_, s) = segment {
                text.push_str(s);
            }
        }
        text.trim().to_string()
    }

    fn bold_texts(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Text(format, s) if format.bold && !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        })
    }

    fn inner_html(&self) -> String {
        let mut html = String::new();
        for segment in &self.segments {
            let (format, text) = match segment {
                Segment::Markup(markup) => {
                    html.push_str(markup);
                    continue;
                }
                Segment::Text(format, text) => (format, text),
            };
            let escaped = escape_html(text);
            if !format.bold && !format.italic || escaped.trim().is_empty() {
                html.push_str(&escaped);
                continue;
            }
            // Keep edge whitespace outside the inline tags
            let core = escaped.trim();
            let start = escaped.len() - escaped.trim_start().len();
            let end = start + core.len();
            html.push_str(&escaped[..start]);
            let mut wrapped = core.to_string();
            if format.italic {
                wrapped = format!("<em>{}</em>", wrapped);
            }
            if format.bold {
                wrapped = format!("<strong>{}</strong>", wrapped);
            }
            html.push_str(&wrapped);
            html.push_str(&escaped[end..]);
        }
        html.trim().to_string()
    }
}

struct HtmlTranslator<'s> {
    styles: &'s HashMap<String, String>,
    content: DocxContent,
    blocks: Vec<String>,
    list_items: Vec<String>,
}

impl<'s> HtmlTranslator<'s> {
    fn new(styles: &'s HashMap<String, String>) -> Self {
        Self {
            styles,
            content: DocxContent::default(),
            blocks: Vec::new(),
            list_items: Vec::new(),
        }
    }

    fn run<F>(mut self, xml: &str, mut load_image: F) -> Result<DocxContent>
    where
        F: FnMut(&str) -> Result<Option<(Vec<u8>, String)>>,
    {
        let mut reader = XmlReader::from_str(xml);
        let mut buf = Vec::new();

        let mut paragraph: Option<Paragraph> = None;
        let mut format = RunFormat::default();
        let mut scope = Scope::default();
        let mut in_text = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"p" => paragraph = Some(Paragraph::default()),
                        b"r" => format = RunFormat::default(),
                        b"rPr" => scope.run_props = true,
                        b"pPr" => scope.para_props = true,
                        b"t" => in_text = true,
                        _ => self.handle_element(
                            &reader,
                            e,
                            paragraph.as_mut(),
                            &mut format,
                            scope,
                            &mut load_image,
                        )?,
                    }
                }
                Ok(Event::Empty(ref e)) => self.handle_element(
                    &reader,
                    e,
                    paragraph.as_mut(),
                    &mut format,
                    scope,
                    &mut load_image,
                )?,
                Ok(Event::Text(e)) => {
                    if in_text {
                        if let (Some(p), Ok(text)) = (paragraph.as_mut(), e.unescape()) {
                            p.push_text(format, text.as_ref());
                        }
                    }
                }
                Ok(Event::End(ref e)) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"t" => in_text = false,
                        b"rPr" => scope.run_props = false,
                        b"pPr" => scope.para_props = false,
                        b"p" => {
                            if let Some(p) = paragraph.take() {
                                self.finish_paragraph(p);
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(err) => return Err(err.into()),
                _ => {}
            }
            buf.clear();
        }

        self.flush_list();
        self.content.html = self.blocks.join("\n");
        Ok(self.content)
    }

    fn handle_element<F>(
        &mut self,
        reader: &XmlReader<&[u8]>,
        e: &BytesStart,
        paragraph: Option<&mut Paragraph>,
        format: &mut RunFormat,
        scope: Scope,
        load_image: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&str) -> Result<Option<(Vec<u8>, String)>>,
    {
        let Some(p) = paragraph else {
            return Ok(());
        };
        let name = e.name();
        match local_name(name.as_ref()) {
            b"pStyle" => {
                if let Some(id) = attr_value(reader, e, b"val") {
                    p.style = Some(self.styles.get(&id).cloned().unwrap_or(id));
                }
            }
            b"numPr" => p.list = true,
            b"b" if scope.run_props => format.bold = is_on(reader, e),
            b"i" if scope.run_props => format.italic = is_on(reader, e),
            b"u" if scope.run_props => {
                let underlined = attr_value(reader, e, b"val").map_or(true, |v| v != "none");
                format.italic = format.italic || underlined;
            }
            b"tab" if !scope.para_props => p.push_text(*format, " "),
            b"br" => p.push_markup("<br />".to_string()),
            b"blip" => {
                if let Some(rel_id) = attr_value(reader, e, b"embed") {
                    self.add_image(p, &rel_id, load_image)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn add_image<F>(&mut self, p: &mut Paragraph, rel_id: &str, load_image: &mut F) -> Result<()>
    where
        F: FnMut(&str) -> Result<Option<(Vec<u8>, String)>>,
    {
        let Some((data, ext)) = load_image(rel_id)? else {
            return Ok(());
        };
        let index = self.content.images.len();
        let record = ImageRecord::new(data, ext, index);
        if record.is_metafile() {
            let message = format!("Skipping Windows metafile image ({})", record.ext);
            log::warn!("{}", message);
            self.content.warnings.push(message);
            return Ok(());
        }
        self.content.images.push(record);
        p.has_image = true;
        p.push_markup(format!("<img src=\"{}\" />", placeholder(index)));
        Ok(())
    }

    fn finish_paragraph(&mut self, p: Paragraph) {
        let text = p.plain_text();
        if text.is_empty() && !p.has_image {
            return;
        }

        self.content
            .bold_texts
            .extend(p.bold_texts().map(str::to_string));

        let inner = p.inner_html();
        let tag = p.style.as_deref().and_then(style_to_tag);

        if p.list && tag.is_none() {
            self.list_items.push(format!("<li>{}</li>", inner));
            return;
        }
        self.flush_list();

        match tag {
            Some(tag) => {
                let level = tag[1..].parse::<u8>().unwrap_or(2);
                self.content.headings.push((level, text));
                self.blocks.push(format!("<{tag}>{inner}</{tag}>"));
            }
            None => self.blocks.push(format!("<p>{}</p>", inner)),
        }
    }

    fn flush_list(&mut self) {
        if !self.list_items.is_empty() {
            let items = std::mem::take(&mut self.list_items).join("");
            self.blocks.push(format!("<ul>{}</ul>", items));
        }
    }
}

/// Relationship id to target path.
fn parse_relationships(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = XmlReader::from_str(xml);
    let mut buf = Vec::new();
    let mut map = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if local_name(e.name().as_ref()) == b"Relationship" {
                    if let (Some(id), Some(target)) = (
                        attr_value(&reader, e, b"Id"),
                        attr_value(&reader, e, b"Target"),
                    ) {
                        map.insert(id, target);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(map)
}

/// Style id to display name, e.g. `Heading1` to `heading 1`.
fn parse_style_names(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = XmlReader::from_str(xml);
    let mut buf = Vec::new();
    let mut map = HashMap::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"style" => current = attr_value(&reader, e, b"styleId"),
                    b"name" => {
                        if let (Some(id), Some(display)) =
                            (current.as_ref(), attr_value(&reader, e, b"val"))
                        {
                            map.insert(id.clone(), display);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                if local_name(e.name().as_ref()) == b"style" {
                    current = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(map)
}

fn resolve_target(target: &str) -> String {
    let target = target.trim_start_matches('/');
    if let Some(rest) = target.strip_prefix("word/") {
        format!("word/{}", rest)
    } else {
        format!("word/{}", target.trim_start_matches("./"))
    }
}

fn extension_of(part: &str) -> String {
    part.rsplit_once('.')
        .map(|(_, ext)| ext.to_string())
        .unwrap_or_else(|| "png".to_string())
}

fn is_on(reader: &XmlReader<&[u8]>, e: &BytesStart) -> bool {
    !matches!(
        attr_value(reader, e, b"val").as_deref(),
        Some("0") | Some("false") | Some("none")
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

fn attr_value<B: std::io::BufRead>(
    reader: &XmlReader<B>,
    element: &BytesStart,
    key: &[u8],
) -> Option<String> {
    for attr in element.attributes().with_checks(false) {
        let attr = attr.ok()?;
        if local_name(attr.key.as_ref()) == key {
            if let Ok(value) = attr.decode_and_unescape_value(reader) {
                return Some(value.into_owned());
            }
        }
    }
    None
}
