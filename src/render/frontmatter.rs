//! YAML front matter and excerpt generation for blog posts.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};

/// Output format of `post_date`.
pub const POST_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default excerpt length in characters.
pub const DEFAULT_EXCERPT_LEN: usize = 200;

/// Publication status of a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostStatus {
    /// Not published
    #[default]
    Draft,
    /// Published
    Publish,
    /// Awaiting review
    Pending,
    /// Scheduled
    Future,
}

impl PostStatus {
    /// All statuses, in CLI order.
    pub const ALL: [PostStatus; 4] = [
        PostStatus::Draft,
        PostStatus::Publish,
        PostStatus::Pending,
        PostStatus::Future,
    ];

    /// The front matter value.
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Publish => "publish",
            PostStatus::Pending => "pending",
            PostStatus::Future => "future",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PostStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Other(format!("Unknown post status: {}", s)))
    }
}

/// Post metadata written as a YAML block before the body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    /// Post title
    pub title: String,
    /// Publication status
    pub status: PostStatus,
    /// `YYYY-MM-DD HH:MM:SS`; the current local time when unset
    pub date: Option<String>,
    /// Short summary
    pub excerpt: Option<String>,
    /// Featured image path without a leading slash
    pub featured_image: Option<String>,
    /// Category slugs
    pub categories: Vec<String>,
    /// Tag slugs
    pub tags: Vec<String>,
}

impl FrontMatter {
    /// Create front matter with a title and default draft status.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the status.
    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the post date (already formatted).
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Set the excerpt. Empty excerpts are ignored.
    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        let excerpt = excerpt.into();
        self.excerpt = (!excerpt.is_empty()).then_some(excerpt);
        self
    }

    /// Set the featured image; a leading slash is removed.
    pub fn with_featured_image(mut self, path: impl Into<String>) -> Self {
        self.featured_image = Some(path.into().trim_start_matches('/').to_string());
        self
    }

    /// Set the categories.
    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    /// Set the tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Render the block, `---` delimited and ending with a newline.
    pub fn render(&self) -> String {
        let mut lines = vec!["---".to_string()];

        lines.push(format!("title: {}", quote_if_colon(&self.title)));
        lines.push(format!("post_status: {}", self.status));

        let date = self
            .date
            .clone()
            .unwrap_or_else(|| Local::now().format(POST_DATE_FORMAT).to_string());
        lines.push(format!("post_date: {}", date));

        if let Some(excerpt) = self.excerpt.as_deref().filter(|e| !e.is_empty()) {
            lines.push(format!("post_excerpt: {}", quote_if_colon(excerpt)));
        }

        if let Some(image) = self.featured_image.as_deref().filter(|i| !i.is_empty()) {
            lines.push(format!("featured_image: {}", image));
        }

        if !self.categories.is_empty() || !self.tags.is_empty() {
            lines.push("taxonomy:".to_string());
            if !self.categories.is_empty() {
                lines.push("    category:".to_string());
                lines.extend(self.categories.iter().map(|c| format!("        - {}", c)));
            }
            if !self.tags.is_empty() {
                lines.push("    post_tag:".to_string());
                lines.extend(self.tags.iter().map(|t| format!("        - {}", t)));
            }
        }

        lines.push("---".to_string());
        lines.join("\n") + "\n"
    }
}

fn quote_if_colon(value: &str) -> String {
    if value.contains(':') {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

/// Split a comma-separated list, trimming items and dropping empty ones.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build an excerpt from the first non-heading lines of the body.
///
/// Lines are joined with spaces until `max_len` characters are reached.
/// Longer text is cut at the last period past the midpoint, or else at the
/// last space with `...` appended.
pub fn extract_excerpt(content: &str, max_len: usize) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let mut joined_len = 0;
    for line in content.split('\n') {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }
        if !parts.is_empty() {
            joined_len += 1;
        }
        joined_len += stripped.chars().count();
        parts.push(stripped);
        if joined_len >= max_len {
            break;
        }
    }

    let text = parts.join(" ");
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_len {
        return text;
    }

    let truncated = &chars[..max_len];
    if let Some(period) = truncated.iter().rposition(|&c| c == '.') {
        if period > max_len / 2 {
            return truncated[..=period].iter().collect();
        }
    }

    let cut = truncated
        .iter()
        .rposition(|&c| c == ' ')
        .unwrap_or(truncated.len());
    let mut excerpt: String = truncated[..cut].iter().collect();
    excerpt.push_str("...");
    excerpt
}

/// Parse a user-supplied post date into `YYYY-MM-DD HH:MM:SS`.
///
/// Accepts ISO (`2024-03-01`, `2024-03-01 09:30`, `2024-03-01 09:30:00`) and
/// day-first dotted forms (`01.03.2024`, `01.03.2024 09:30`,
/// `01.03.2024 09:30:00`). Missing times default to midnight.
pub fn parse_post_date(value: &str) -> Result<String> {
    let value = value.trim();

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%d.%m.%Y %H:%M:%S",
        "%d.%m.%Y %H:%M",
    ];
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y"];

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.format(POST_DATE_FORMAT).to_string());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(dt.format(POST_DATE_FORMAT).to_string());
            }
        }
    }

    Err(Error::InvalidDate(value.to_string()))
}
