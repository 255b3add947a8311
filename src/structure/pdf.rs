//! Font-based structure classifier for PDF text.

use crate::model::{BodySize, FontProfile, Line};

use super::lists::ListDetector;
use super::rules::{ClassifierConfig, LineClass, RuleSet};

/// Classifies reading-order PDF lines into headings, bold text, list items
/// and paragraphs by comparing each line's font size to the body size.
#[derive(Debug, Clone)]
pub struct FontClassifier {
    config: ClassifierConfig,
    rules: RuleSet,
    lists: ListDetector,
}

impl FontClassifier {
    /// Create a classifier from a configuration.
    pub fn new(config: ClassifierConfig) -> Self {
        let rules = RuleSet::from_config(&config);
        Self {
            config,
            rules,
            lists: ListDetector::glyph_bullets(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Attach font metadata from the profile to each line of raw text.
    ///
    /// Lines are trimmed. Lines with no exact or fuzzy profile match keep
    /// `font_size` and `bold` unset.
    pub fn annotate(&self, raw_text: &str, profile: &FontProfile) -> Vec<Line> {
        raw_text
            .split('\n')
            .map(|raw| {
                let text = raw.trim();
                let line = Line::new(text);
                if text.is_empty() {
                    return line;
                }
                match profile.lookup(
                    text,
                    self.config.fuzzy_prefix_len,
                    self.config.min_fuzzy_key_len,
                ) {
                    Some(info) => line.with_font(info.size, info.bold),
                    None => line,
                }
            })
            .collect()
    }

    /// Classify one non-blank line.
    ///
    /// Font rules are tried first; lines they do not claim fall through to
    /// list detection and otherwise stay paragraph text.
    pub fn classify(&self, line: &Line, body: BodySize) -> LineClass {
        let text = line.text.trim();
        if let Some(size) = line.font_size {
            let bold = line.bold.unwrap_or(false);
            if let Some(class) =
                self.rules
                    .classify(size, body.value(), bold, text.chars().count())
            {
                return class;
            }
        }

        match self.lists.detect(text) {
            Some(item) => LineClass::ListItem(item),
            None => LineClass::Paragraph,
        }
    }

    /// Render annotated lines as first-pass Markdown.
    ///
    /// Blank-line runs collapse into one blank line, headings and bold lines
    /// are followed by a blank line, and leading blank lines are dropped.
    pub fn render(&self, lines: &[Line], body: BodySize) -> String {
        let mut out: Vec<String> = Vec::new();

        for line in lines {
            let text = line.text.trim();
            if text.is_empty() {
                if out.last().map_or(false, |l| !l.is_empty()) {
                    out.push(String::new());
                }
                continue;
            }

            let class = self.classify(line, body);
            out.push(class.render(text));
            if class.is_block() {
                out.push(String::new());
            }
        }

        out.join("\n")
    }

    /// Annotate and render raw reading-order text in one step.
    pub fn to_markdown(&self, raw_text: &str, profile: &FontProfile, body: BodySize) -> String {
        let lines = self.annotate(raw_text, profile);
        log::debug!(
            "classifying {} lines against body size {:.1}",
            lines.len(),
            body.value()
        );
        self.render(&lines, body)
    }
}

impl Default for FontClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}
