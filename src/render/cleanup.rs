//! Markdown cleanup pipeline for converted documents.

use regex::Regex;

use crate::model::MarkdownDocument;

use super::headings::{demote_headings, merge_heading_continuations};
use super::typography::normalize_typography;

/// Maximum number of consecutive blank lines kept.
const MAX_BLANK_LINES: usize = 2;

/// Options for Markdown cleanup. Each flag toggles one stage; the stage
/// order itself is fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Demote all headings when a level-1 heading is present
    pub demote_headings: bool,

    /// Replace locale punctuation with ASCII equivalents
    pub normalize_typography: bool,

    /// Rejoin same-level headings split across a break
    pub merge_heading_continuations: bool,

    /// Rewrite `*` and `+` bullets as `-`
    pub normalize_list_markers: bool,

    /// Collapse runs of blank lines to at most two
    pub collapse_blank_lines: bool,

    /// Strip trailing whitespace from each line
    pub strip_trailing_whitespace: bool,

    /// End the document with exactly one newline
    pub ensure_final_newline: bool,
}

impl CleanupOptions {
    /// Every stage enabled.
    pub fn full() -> Self {
        Self {
            demote_headings: true,
            normalize_typography: true,
            merge_heading_continuations: true,
            normalize_list_markers: true,
            collapse_blank_lines: true,
            strip_trailing_whitespace: true,
            ensure_final_newline: true,
        }
    }

    /// Whitespace stages only; text and headings are left alone.
    pub fn minimal() -> Self {
        Self {
            demote_headings: false,
            normalize_typography: false,
            merge_heading_continuations: false,
            normalize_list_markers: false,
            ..Self::full()
        }
    }

    /// Enable or disable typography normalization.
    pub fn with_typography(mut self, enabled: bool) -> Self {
        self.normalize_typography = enabled;
        self
    }

    /// Enable or disable heading demotion.
    pub fn with_heading_demotion(mut self, enabled: bool) -> Self {
        self.demote_headings = enabled;
        self
    }

    /// Enable or disable split-heading repair.
    pub fn with_heading_merge(mut self, enabled: bool) -> Self {
        self.merge_heading_continuations = enabled;
        self
    }
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self::full()
    }
}

/// Markdown cleanup pipeline.
///
/// Stages run in this order: heading demotion, typography, split-heading
/// merge, list markers, blank-line collapse, trailing whitespace, final
/// newline.
#[derive(Debug, Clone)]
pub struct CleanupPipeline {
    options: CleanupOptions,
    list_marker_regex: Regex,
}

impl CleanupPipeline {
    /// Create a new cleanup pipeline with the given options.
    pub fn new(options: CleanupOptions) -> Self {
        Self {
            options,
            list_marker_regex: Regex::new(r"^([ \t]*)[*+] ").unwrap(),
        }
    }

    /// The active options.
    pub fn options(&self) -> &CleanupOptions {
        &self.options
    }

    /// Process Markdown through the pipeline.
    pub fn process(&self, text: &str) -> String {
        let mut doc = MarkdownDocument::parse(text);

        if self.options.demote_headings && demote_headings(&mut doc) {
            log::debug!("demoted headings: level-1 heading found in body");
        }

        if self.options.normalize_typography {
            doc = MarkdownDocument::parse(&normalize_typography(&doc.to_text()));
        }

        if self.options.merge_heading_continuations {
            let merges = merge_heading_continuations(&mut doc);
            if merges > 0 {
                log::debug!("merged {} split headings", merges);
            }
        }

        if self.options.normalize_list_markers {
            self.normalize_list_markers(&mut doc);
        }

        if self.options.collapse_blank_lines {
            collapse_blank_lines(&mut doc);
        }

        if self.options.strip_trailing_whitespace {
            for line in doc.lines_mut().iter_mut() {
                let trimmed = line.trim_end().len();
                line.truncate(trimmed);
            }
        }

        if self.options.ensure_final_newline {
            ensure_final_newline(&mut doc);
        }

        doc.to_text()
    }

    fn normalize_list_markers(&self, doc: &mut MarkdownDocument) {
        for line in doc.lines_mut().iter_mut() {
            if self.list_marker_regex.is_match(line) {
                *line = self.list_marker_regex.replace(line, "${1}- ").into_owned();
            }
        }
    }
}

impl Default for CleanupPipeline {
    fn default() -> Self {
        Self::new(CleanupOptions::default())
    }
}

/// Keep at most two consecutive blank (whitespace-only) lines.
fn collapse_blank_lines(doc: &mut MarkdownDocument) {
    let mut run = 0;
    doc.lines_mut().retain(|line| {
        if line.trim().is_empty() {
            run += 1;
            run <= MAX_BLANK_LINES
        } else {
            run = 0;
            true
        }
    });
}

/// Drop trailing empty lines, then end with a single newline.
fn ensure_final_newline(doc: &mut MarkdownDocument) {
    let lines = doc.lines_mut();
    while lines.last().map_or(false, |l| l.is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(String::new());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_pipeline() {
        let pipeline = CleanupPipeline::default();
        let input = "# Názov\n\n## Rast o 58\n\n## %: analýza   \n\n\n\n\n* bod \u{2014} jeden\n+ bod dva\n\n\n";
        let expected = "## Názov\n\n### Rast o 58%: analýza\n\n\n- bod -- jeden\n- bod dva\n";
        assert_eq!(pipeline.process(input), expected);
    }

    #[test]
    fn test_hierarchy_runs_before_merge() {
        let pipeline = CleanupPipeline::default();
        let out = pipeline.process("# Obrat 2024\n# v číslach");
        assert_eq!(out, "## Obrat 2024v číslach\n");
    }

    #[test]
    fn test_output_invariants() {
        let pipeline = CleanupPipeline::default();
        let samples = [
            "",
            "\n\n\n\n",
            "  \n \n\t\n \ntext  \t\n\n\n\n\nmore\t",
            "a\n\n\n\n\n\n\nb\n\n\n\n",
            "\n\n\n\nleading",
        ];
        for sample in samples {
            let out = pipeline.process(sample);
            assert!(out.ends_with('\n'), "{:?}", out);
            assert!(!out.ends_with("\n\n"), "{:?}", out);
            assert!(!out.contains("\n\n\n\n"), "{:?}", out);
            assert!(!out.starts_with("\n\n\n"), "{:?}", out);
            for line in out.lines() {
                assert_eq!(line, line.trim_end(), "{:?}", out);
            }
        }
    }

    #[test]
    fn test_list_markers() {
        let pipeline = CleanupPipeline::default();
        let out = pipeline.process("* one\n  + nested\n**bold** text\n*emphasis*");
        assert_eq!(out, "- one\n  - nested\n**bold** text\n*emphasis*\n");
    }

    #[test]
    fn test_minimal_leaves_text_alone() {
        let pipeline = CleanupPipeline::new(CleanupOptions::minimal());
        let out = pipeline.process("# Title\n* item \u{2014} x   \n\n\n\n");
        assert_eq!(out, "# Title\n* item \u{2014} x\n");
    }

    #[test]
    fn test_toggle_typography() {
        let options = CleanupOptions::full().with_typography(false);
        let pipeline = CleanupPipeline::new(options);
        assert_eq!(pipeline.process("\u{201E}x\u{201C}"), "\u{201E}x\u{201C}\n");
    }
}
