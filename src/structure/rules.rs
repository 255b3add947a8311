//! Font-ratio classification as an ordered rule list.

use crate::model::DEFAULT_BODY_SIZE;

use super::lists::ListItem;

/// Ratio comparisons treat values within this distance of a threshold as
/// reaching it, so exact boundaries land in the higher tier.
const RATIO_EPSILON: f32 = 1e-6;

/// Thresholds and lookup parameters for the PDF font classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Minimum size/body ratio for a level-2 heading
    pub h2_ratio: f32,
    /// Minimum size/body ratio for a level-3 heading
    pub h3_ratio: f32,
    /// Minimum size/body ratio for a bold level-4 heading
    pub h4_ratio: f32,
    /// Bold lines shorter than this (in characters) become emphasized text
    pub bold_max_len: usize,
    /// Length of the normalized font lookup key
    pub key_len: usize,
    /// Prefix length compared by the fuzzy lookup
    pub fuzzy_prefix_len: usize,
    /// Keys shorter than this never fuzzy-match
    pub min_fuzzy_key_len: usize,
    /// Body size used when a document has no measurable text
    pub default_body_size: f32,
}

impl ClassifierConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the three heading ratio thresholds.
    pub fn with_ratios(mut self, h2: f32, h3: f32, h4: f32) -> Self {
        self.h2_ratio = h2;
        self.h3_ratio = h3;
        self.h4_ratio = h4;
        self
    }

    /// Set the bold emphasis length limit.
    pub fn with_bold_max_len(mut self, len: usize) -> Self {
        self.bold_max_len = len;
        self
    }

    /// Set the fuzzy lookup parameters.
    pub fn with_fuzzy(mut self, prefix_len: usize, min_key_len: usize) -> Self {
        self.fuzzy_prefix_len = prefix_len;
        self.min_fuzzy_key_len = min_key_len;
        self
    }

    /// Set the fallback body size.
    pub fn with_default_body_size(mut self, size: f32) -> Self {
        self.default_body_size = size;
        self
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            h2_ratio: 1.5,
            h3_ratio: 1.25,
            h4_ratio: 1.1,
            bold_max_len: 80,
            key_len: 60,
            fuzzy_prefix_len: 30,
            min_fuzzy_key_len: 5,
            default_body_size: DEFAULT_BODY_SIZE,
        }
    }
}

/// Structural class of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// Heading at the given level
    Heading(u8),
    /// Emphasized (bold) text, not a heading
    Bold,
    /// List item
    ListItem(ListItem),
    /// Plain paragraph text
    Paragraph,
}

impl LineClass {
    /// Render a line of text in this class.
    pub fn render(&self, text: &str) -> String {
        match self {
            LineClass::Heading(level) => format!("{} {}", "#".repeat(*level as usize), text),
            LineClass::Bold => format!("**{}**", text),
            LineClass::ListItem(item) => item.to_markdown(),
            LineClass::Paragraph => text.to_string(),
        }
    }

    /// Headings and bold lines are followed by a blank line.
    pub fn is_block(&self) -> bool {
        matches!(self, LineClass::Heading(_) | LineClass::Bold)
    }
}

/// One entry of the ordered rule list.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    /// Minimum size/body ratio, if the rule depends on size
    pub min_ratio: Option<f32>,
    /// Whether the line must be bold
    pub requires_bold: bool,
    /// Maximum text length (exclusive), if limited
    pub max_len: Option<usize>,
    /// Class assigned when the rule matches
    pub class: LineClass,
}

impl StyleRule {
    /// Whether the rule matches the given line features.
    pub fn matches(&self, ratio: f32, bold: bool, len: usize) -> bool {
        if let Some(min) = self.min_ratio {
            if ratio + RATIO_EPSILON < min {
                return false;
            }
        }
        if self.requires_bold && !bold {
            return false;
        }
        if let Some(max) = self.max_len {
            if len >= max {
                return false;
            }
        }
        true
    }
}

/// Ordered rule evaluator; the first matching rule decides.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<StyleRule>,
}

impl RuleSet {
    /// Build the heading/bold rules from a classifier configuration.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self {
            rules: vec![
                StyleRule {
                    min_ratio: Some(config.h2_ratio),
                    requires_bold: false,
                    max_len: None,
                    class: LineClass::Heading(2),
                },
                StyleRule {
                    min_ratio: Some(config.h3_ratio),
                    requires_bold: false,
                    max_len: None,
                    class: LineClass::Heading(3),
                },
                StyleRule {
                    min_ratio: Some(config.h4_ratio),
                    requires_bold: true,
                    max_len: None,
                    class: LineClass::Heading(4),
                },
                StyleRule {
                    min_ratio: None,
                    requires_bold: true,
                    max_len: Some(config.bold_max_len),
                    class: LineClass::Bold,
                },
            ],
        }
    }

    /// The rules in evaluation order.
    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    /// Classify from font features. Returns `None` when no rule matches.
    ///
    /// A non-positive body size yields a ratio of 1.
    pub fn classify(&self, size: f32, body_size: f32, bold: bool, len: usize) -> Option<LineClass> {
        let ratio = if body_size > 0.0 { size / body_size } else { 1.0 };
        self.rules
            .iter()
            .find(|rule| rule.matches(ratio, bold, len))
            .map(|rule| rule.class.clone())
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_go_to_higher_tier() {
        let rules = RuleSet::default();
        assert_eq!(rules.classify(18.0, 12.0, false, 10), Some(LineClass::Heading(2)));
        assert_eq!(rules.classify(15.0, 12.0, false, 10), Some(LineClass::Heading(3)));
        assert_eq!(rules.classify(13.2, 12.0, true, 10), Some(LineClass::Heading(4)));
        assert_eq!(rules.classify(11.0, 10.0, true, 10), Some(LineClass::Heading(4)));
    }

    #[test]
    fn test_just_below_boundaries() {
        let rules = RuleSet::default();
        assert_eq!(rules.classify(17.9, 12.0, false, 10), Some(LineClass::Heading(3)));
        assert_eq!(rules.classify(14.9, 12.0, false, 10), None);
        assert_eq!(rules.classify(13.1, 12.0, true, 10), Some(LineClass::Bold));
    }

    #[test]
    fn test_h4_requires_bold() {
        let rules = RuleSet::default();
        assert_eq!(rules.classify(13.5, 12.0, false, 10), None);
    }

    #[test]
    fn test_bold_length_limit() {
        let rules = RuleSet::default();
        assert_eq!(rules.classify(12.0, 12.0, true, 79), Some(LineClass::Bold));
        assert_eq!(rules.classify(12.0, 12.0, true, 80), None);
        // Bold wins regardless of a small ratio
        assert_eq!(rules.classify(8.0, 12.0, true, 20), Some(LineClass::Bold));
    }

    #[test]
    fn test_zero_body_size() {
        let rules = RuleSet::default();
        assert_eq!(rules.classify(30.0, 0.0, false, 5), None);
    }

    #[test]
    fn test_custom_ratios() {
        let config = ClassifierConfig::new().with_ratios(2.0, 1.5, 1.2);
        let rules = RuleSet::from_config(&config);
        assert_eq!(rules.classify(18.0, 12.0, false, 10), Some(LineClass::Heading(3)));
        assert_eq!(rules.rules().len(), 4);
    }

    #[test]
    fn test_render() {
        assert_eq!(LineClass::Heading(3).render("Intro"), "### Intro");
        assert_eq!(LineClass::Bold.render("Note"), "**Note**");
        assert_eq!(LineClass::Paragraph.render("Text"), "Text");
        assert!(LineClass::Bold.is_block());
        assert!(!LineClass::Paragraph.is_block());
    }
}
