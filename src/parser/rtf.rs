//! RTF reader producing plain text.
//!
//! Control words are stripped, formatting is discarded, and destinations that
//! carry no body text (font and color tables, stylesheets, document info,
//! pictures, ignorable `\*` groups) are skipped.

use std::path::Path;

use encoding_rs::{Encoding, WINDOWS_1250, WINDOWS_1252};

use crate::error::{Error, Result};

/// Destinations whose content never reaches the body text.
const SKIPPED_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "object",
    "header",
    "headerl",
    "headerr",
    "headerf",
    "footer",
    "footerl",
    "footerr",
    "footerf",
    "footnote",
    "listtable",
    "listoverridetable",
    "revtbl",
    "rsidtbl",
    "generator",
    "xmlnstbl",
    "themedata",
    "colorschememapping",
    "latentstyles",
    "datastore",
    "fldinst",
    "filetbl",
];

/// Plain text recovered from an RTF document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RtfContent {
    /// Body text, paragraphs separated by newlines
    pub text: String,
    /// Whether the document embeds pictures
    pub has_pictures: bool,
    /// Code page from `\ansicpg`, if declared
    pub code_page: Option<u16>,
}

/// Decode RTF file bytes: UTF-8 first, then windows-1250, then Latin-1.
pub fn decode_rtf_bytes(data: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(data) {
        return text.to_string();
    }
    if let Some(text) = WINDOWS_1250.decode_without_bom_handling_and_without_replacement(data) {
        return text.into_owned();
    }
    data.iter().map(|&b| b as char).collect()
}

/// Read an RTF file.
pub fn read_rtf<P: AsRef<Path>>(path: P) -> Result<RtfContent> {
    let data = std::fs::read(path.as_ref())?;
    parse_rtf(&decode_rtf_bytes(&data))
}

#[derive(Debug, Clone, Copy)]
struct GroupState {
    skip: bool,
    unicode_skip: usize,
}

impl Default for GroupState {
    fn default() -> Self {
        Self {
            skip: false,
            unicode_skip: 1,
        }
    }
}

/// Convert RTF source to plain text.
pub fn parse_rtf(source: &str) -> Result<RtfContent> {
    if !source.trim_start().starts_with("{\\rtf") {
        return Err(Error::Rtf("missing {\\rtf header".to_string()));
    }

    let mut parser = RtfParser::new(source);
    parser.run();

    Ok(RtfContent {
        text: parser.out,
        has_pictures: source.contains("\\pict"),
        code_page: parser.code_page,
    })
}

struct RtfParser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    stack: Vec<GroupState>,
    state: GroupState,
    out: String,
    pending_bytes: Vec<u8>,
    code_page: Option<u16>,
    encoding: &'static Encoding,
    // Fallback characters still to drop after a \u escape
    skip_chars: usize,
}

impl<'a> RtfParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            stack: Vec::new(),
            state: GroupState::default(),
            out: String::new(),
            pending_bytes: Vec::new(),
            code_page: None,
            encoding: WINDOWS_1252,
            skip_chars: 0,
        }
    }

    fn run(&mut self) {
        while let Some(c) = self.chars.next() {
            match c {
                '{' => {
                    self.flush_bytes();
                    self.skip_chars = 0;
                    self.stack.push(self.state);
                }
                '}' => {
                    self.flush_bytes();
                    self.skip_chars = 0;
                    self.state = self.stack.pop().unwrap_or_default();
                }
                '\\' => self.control(),
                '\r' | '\n' => {}
                _ => {
                    self.flush_bytes();
                    if self.consume_skip() {
                        continue;
                    }
                    self.emit_char(c);
                }
            }
        }
        self.flush_bytes();
    }

    fn control(&mut self) {
        let Some(&next) = self.chars.peek() else {
            return;
        };

        if next.is_ascii_alphabetic() {
            let (word, param) = self.read_control_word();
            self.flush_bytes();
            self.apply_word(&word, param);
            return;
        }

        self.chars.next();
        match next {
            '\'' => {
                let hex: String = (0..2).filter_map(|_| self.chars.next()).collect();
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    if self.consume_skip() {
                        return;
                    }
                    if !self.state.skip {
                        self.pending_bytes.push(byte);
                    }
                }
            }
            '*' => self.state.skip = true,
            '\\' | '{' | '}' => {
                self.flush_bytes();
                if !self.consume_skip() {
                    self.emit_char(next);
                }
            }
            '~' => {
                self.flush_bytes();
                self.emit_char('\u{00A0}');
            }
            '_' => {
                self.flush_bytes();
                self.emit_char('-');
            }
            '\r' | '\n' => {
                self.flush_bytes();
                self.emit_str("\n");
            }
            // Optional hyphen and other symbols carry no text
            _ => {}
        }
    }

    fn read_control_word(&mut self) -> (String, Option<i32>) {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphabetic() {
                word.push(c);
                self.chars.next();
            } else {
                break;
            }
        }

        let mut digits = String::new();
        if self.chars.peek() == Some(&'-') {
            digits.push('-');
            self.chars.next();
        }
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.chars.next();
            } else {
                break;
            }
        }

        // A single space delimits the control word
        if self.chars.peek() == Some(&' ') {
            self.chars.next();
        }

        (word, digits.parse().ok())
    }

    fn apply_word(&mut self, word: &str, param: Option<i32>) {
        if SKIPPED_DESTINATIONS.contains(&word) {
            self.state.skip = true;
            return;
        }

        match word {
            "ansicpg" => {
                if let Some(cp) = param.and_then(|p| u16::try_from(p).ok()) {
                    self.code_page = Some(cp);
                    self.encoding = encoding_for_code_page(cp);
                }
            }
            "uc" => self.state.unicode_skip = param.unwrap_or(1).max(0) as usize,
            "u" => {
                if let Some(value) = param {
                    let code = (if value < 0 { value + 65536 } else { value }) as u32;
                    if let Some(c) = char::from_u32(code) {
                        self.emit_char(c);
                    }
                    self.skip_chars = self.state.unicode_skip;
                }
            }
            "par" | "line" | "row" => self.emit_str("\n"),
            "sect" | "page" => self.emit_str("\n\n"),
            "tab" | "cell" => self.emit_str("\t"),
            "emdash" => self.emit_char('\u{2014}'),
            "endash" => self.emit_char('\u{2013}'),
            "emspace" | "enspace" | "qmspace" => self.emit_char(' '),
            "bullet" => self.emit_char('\u{2022}'),
            "lquote" => self.emit_char('\u{2018}'),
            "rquote" => self.emit_char('\u{2019}'),
            "ldblquote" => self.emit_char('\u{201C}'),
            "rdblquote" => self.emit_char('\u{201D}'),
            _ => {}
        }
    }

    /// Drop one fallback character after `\u`; true if it was dropped.
    fn consume_skip(&mut self) -> bool {
        if self.skip_chars > 0 {
            self.skip_chars -= 1;
            true
        } else {
            false
        }
    }

    fn flush_bytes(&mut self) {
        if self.pending_bytes.is_empty() {
            return;
        }
        let (text, _, _) = self.encoding.decode(&self.pending_bytes);
        let text = text.into_owned();
        self.pending_bytes.clear();
        self.emit_str(&text);
    }

    fn emit_char(&mut self, c: char) {
        if !self.state.skip {
            self.out.push(c);
        }
    }

    fn emit_str(&mut self, s: &str) {
        if !self.state.skip {
            self.out.push_str(s);
        }
    }
}

fn encoding_for_code_page(code_page: u16) -> &'static Encoding {
    let label = match code_page {
        932 => "shift_jis".to_string(),
        936 => "gbk".to_string(),
        949 => "euc-kr".to_string(),
        950 => "big5".to_string(),
        65001 => "utf-8".to_string(),
        cp => format!("windows-{}", cp),
    };
    Encoding::for_label(label.as_bytes()).unwrap_or(WINDOWS_1252)
}
