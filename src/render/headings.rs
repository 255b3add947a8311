//! Heading hierarchy normalization and split-heading repair.

use crate::model::MarkdownDocument;

/// Characters that mark a heading as the tail of the previous one.
const CONTINUATION_STARTERS: &[char] = &[',', ':', ';', '%', ')', '-'];

/// Split an ATX heading line into `(level, text)`.
///
/// Requires 1-6 `#`, one space and non-empty text after it.
pub fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let level = line.bytes().take_while(|&b| b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let text = line[level..].strip_prefix(' ')?;
    if text.is_empty() {
        return None;
    }
    Some((level, text))
}

/// Whether the document has a level-1 heading (`# ` followed by a non-`#`).
pub fn has_level_one_heading(doc: &MarkdownDocument) -> bool {
    doc.lines().iter().any(|line| {
        matches!(parse_heading(line), Some((1, text)) if !text.starts_with('#'))
    })
}

/// Demote every heading by one level when a level-1 heading exists.
///
/// Level-6 headings have nowhere to go and stay at level 6.
/// Returns whether anything changed.
pub fn demote_headings(doc: &mut MarkdownDocument) -> bool {
    if !has_level_one_heading(doc) {
        return false;
    }

    for line in doc.lines_mut().iter_mut() {
        if let Some((level, _)) = parse_heading(line) {
            if level < 6 {
                line.insert(0, '#');
            }
        }
    }
    true
}

/// Whether `second` reads as the continuation of heading `first`.
///
/// True when `second` starts with a lower-case letter or one of `, : ; % ) -`,
/// or when `first` ends with a numeric character (a number split from its unit).
pub fn looks_like_continuation(first: &str, second: &str) -> bool {
    let Some(head) = second.chars().next() else {
        return false;
    };
    if head.is_lowercase() || CONTINUATION_STARTERS.contains(&head) {
        return true;
    }
    first.chars().last().map_or(false, char::is_numeric)
}

/// Merge same-level headings (levels 2 to 6) split across a line or page break.
///
/// Single left-to-right pass: a merged heading is emitted as-is and never
/// considered for a further merge. Returns the number of merges.
pub fn merge_heading_continuations(doc: &mut MarkdownDocument) -> usize {
    let lines = std::mem::take(doc.lines_mut());
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut merges = 0;
    let mut i = 0;

    while i < lines.len() {
        let line = &lines[i];
        if let Some((level, text)) = parse_heading(line).filter(|(level, _)| *level >= 2) {
            let mut j = i + 1;
            while j < lines.len() && lines[j].trim().is_empty() {
                j += 1;
            }
            if let Some((next_level, next_text)) = lines.get(j).and_then(|l| parse_heading(l)) {
                if next_level == level && looks_like_continuation(text, next_text) {
                    out.push(format!("{} {}{}", "#".repeat(level), text, next_text));
                    merges += 1;
                    i = j + 1;
                    continue;
                }
            }
        }
        out.push(line.clone());
        i += 1;
    }

    doc.set_lines(out);
    merges
}
