//! Title discovery and removal shared by the extractors.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use super::rtf::title_case;

fn heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#{1,6}\s+(.+)$").unwrap())
}

fn sub_heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^#{2,6}\s+(.+)$").unwrap())
}

/// Metadata title, unless it is empty or a known authoring-tool placeholder.
pub fn usable_metadata_title(title: Option<&str>) -> Option<String> {
    let title = title?.trim();
    if title.is_empty() {
        return None;
    }
    match title.to_lowercase().as_str() {
        "untitled" | "microsoft word" => None,
        _ => Some(title.to_string()),
    }
}

/// Text of the first level 2-6 heading.
pub fn first_heading(markdown: &str) -> Option<String> {
    sub_heading_regex()
        .captures(markdown)
        .map(|caps| caps[1].trim().to_string())
}

/// First trimmed line longer than `min_len` characters.
pub fn first_meaningful_line(text: &str, min_len: usize) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|l| l.chars().count() > min_len)
        .map(str::to_string)
}

/// Title derived from a file name: stem with `-` and `_` turned into spaces, title-cased.
pub fn title_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    title_case(&stem.replace(['-', '_'], " "))
}

/// Blank out the title line and the blank line after it.
///
/// Matches the first heading whose text equals the title case-insensitively,
/// or a plain line equal to it within the first five lines.
pub fn remove_title_line(markdown: &str, title: &str) -> String {
    let wanted = title.trim().to_lowercase();
    let mut lines: Vec<String> = markdown.split('\n').map(str::to_string).collect();

    for i in 0..lines.len() {
        let stripped = lines[i].trim();
        let heading_match = heading_regex()
            .captures(stripped)
            .map(|caps| caps[1].trim().to_lowercase() == wanted)
            .unwrap_or(false);
        let plain_match = i < 5 && stripped.to_lowercase() == wanted;

        if heading_match || plain_match {
            blank_with_follower(&mut lines, i);
            break;
        }
    }

    lines.join("\n")
}

/// Blank out the first heading whose text equals the title exactly, and the
/// blank line after it.
pub fn remove_first_heading(markdown: &str, title: &str) -> String {
    let mut lines: Vec<String> = markdown.split('\n').map(str::to_string).collect();

    for i in 0..lines.len() {
        let stripped = lines[i].trim();
        if stripped.starts_with('#') && stripped.trim_start_matches('#').trim() == title {
            blank_with_follower(&mut lines, i);
            break;
        }
    }

    lines.join("\n")
}

fn blank_with_follower(lines: &mut [String], i: usize) {
    lines[i].clear();
    if let Some(next) = lines.get_mut(i + 1) {
        if next.trim().is_empty() {
            next.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_metadata_title() {
        assert_eq!(usable_metadata_title(Some("  Untitled ")), None);
        assert_eq!(usable_metadata_title(Some("Microsoft Word")), None);
        assert_eq!(usable_metadata_title(Some("")), None);
        assert_eq!(usable_metadata_title(None), None);
        assert_eq!(
            usable_metadata_title(Some(" Market Report ")),
            Some("Market Report".to_string())
        );
    }

    #[test]
    fn test_first_heading_skips_level_one() {
        let md = "# Doc\n\nText\n\n### Section\n";
        assert_eq!(first_heading(md), Some("Section".to_string()));
        assert_eq!(first_heading("plain"), None);
    }

    #[test]
    fn test_title_from_path() {
        assert_eq!(
            title_from_path(Path::new("/tmp/market_report-2024.pdf")),
            "Market Report 2024"
        );
    }

    #[test]
    fn test_remove_title_heading() {
        let md = "## Market Report\n\nBody\n";
        assert_eq!(remove_title_line(md, "market report"), "\n\nBody\n");
    }

    #[test]
    fn test_remove_title_plain_line_only_near_top() {
        let md = "a\nb\nc\nd\ne\nTitle\n\nBody";
        assert_eq!(remove_title_line(md, "Title"), md);
        let md = "Title\n\nBody";
        assert_eq!(remove_title_line(md, "Title"), "\n\nBody");
    }

    #[test]
    fn test_remove_first_heading_exact() {
        let md = "# Other\n\n## Report\n\nBody";
        assert_eq!(remove_first_heading(md, "Report"), "# Other\n\n\n\nBody");
        assert_eq!(remove_first_heading(md, "report"), md);
    }
}
