//! Reading, annotating and rewriting an existing post.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

const FILENAME_MAX_LEN: usize = 60;
const ALT_MAX_LEN: usize = 125;
const TITLE_MAX_LEN: usize = 200;

fn front_matter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\A(---\n.*?\n---)\n?(.*)\z").unwrap())
}

fn featured_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^featured_image:[ \t]*\S.*$").unwrap())
}

fn non_alnum_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap())
}

/// Where generated images go in the body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Placement {
    /// First image on top, the rest before evenly spaced `## ` sections
    #[default]
    BeforeSections,
    /// All images between the intro and the first `## ` heading
    AfterIntro,
    /// Leave the body alone
    Manual,
}

impl Placement {
    /// All placements, in CLI order.
    pub const ALL: [Placement; 3] = [
        Placement::BeforeSections,
        Placement::AfterIntro,
        Placement::Manual,
    ];

    /// The CLI value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::BeforeSections => "before-sections",
            Placement::AfterIntro => "after-intro",
            Placement::Manual => "manual",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Placement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Placement::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| Error::Other(format!("Unknown placement: {}", s)))
    }
}

/// A saved image and how the post refers to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedImage {
    /// Site-root path, `/_images/<slug>/<file>`
    pub path: String,
    /// Alt text
    pub alt: String,
    /// Title shown on hover
    pub title: String,
}

impl PlacedImage {
    /// Describe an image with alt text and title derived from its prompt.
    pub fn from_prompt(path: impl Into<String>, prompt: &str) -> Self {
        Self {
            path: path.into(),
            alt: prompt_to_alt(prompt),
            title: prompt_to_title(prompt),
        }
    }
}

/// Split a post into its front matter block (without the trailing newline)
/// and the body.
pub fn split_front_matter(content: &str, path: &Path) -> Result<(String, String)> {
    let caps = front_matter_regex()
        .captures(content)
        .ok_or_else(|| Error::MissingFrontMatter(path.to_path_buf()))?;
    Ok((caps[1].to_string(), caps[2].to_string()))
}

/// Post slug: the file stem.
pub fn slug_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File stem for a prompt: lower-case ASCII words joined by hyphens, cut at
/// a hyphen to 60 characters, or `gen-NNN` when nothing is left.
pub fn prompt_to_filename(prompt: &str, index: usize) -> String {
    let lowered = prompt.trim().to_lowercase();
    let mut slug = non_alnum_regex()
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string();

    if slug.len() > FILENAME_MAX_LEN {
        // Only ASCII remains, so byte slicing is safe
        let cut = &slug[..FILENAME_MAX_LEN];
        slug = match cut.rfind('-') {
            Some(pos) => cut[..pos].to_string(),
            None => cut.to_string(),
        };
    }

    if slug.is_empty() {
        format!("gen-{:03}", index + 1)
    } else {
        slug
    }
}

/// Alt text for a prompt, at most 125 characters.
pub fn prompt_to_alt(prompt: &str) -> String {
    caption(prompt, ALT_MAX_LEN)
}

/// Title for a prompt, at most 200 characters.
pub fn prompt_to_title(prompt: &str) -> String {
    caption(prompt, TITLE_MAX_LEN)
}

/// Trailing periods stripped, first letter capitalized, long text cut at a
/// word and ended with `...`.
fn caption(prompt: &str, max_len: usize) -> String {
    let text = prompt.trim().trim_end_matches('.');
    let mut chars = text.chars();
    let mut caption: String = match chars.next() {
        Some(first) if first.is_lowercase() => first.to_uppercase().chain(chars).collect(),
        _ => text.to_string(),
    };

    if caption.chars().count() > max_len {
        let cut: String = caption.chars().take(max_len - 3).collect();
        let cut = match cut.rfind(' ') {
            Some(pos) => &cut[..pos],
            None => cut.as_str(),
        };
        caption = format!("{}...", cut);
    }
    caption
}

/// `![alt](path "title")`
pub fn image_markdown(image: &PlacedImage) -> String {
    format!("![{}]({} \"{}\")", image.alt, image.path, image.title)
}

/// Insert image references into a post body.
pub fn insert_images(body: &str, images: &[PlacedImage], placement: Placement) -> String {
    if images.is_empty() {
        return body.to_string();
    }
    match placement {
        Placement::BeforeSections => place_before_sections(body, images),
        Placement::AfterIntro => place_after_intro(body, images),
        Placement::Manual => body.to_string(),
    }
}

fn place_before_sections(body: &str, images: &[PlacedImage]) -> String {
    let mut lines: Vec<String> = body.split('\n').map(str::to_string).collect();
    let headings: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.starts_with("## "))
        .map(|(i, _)| i)
        .collect();

    // Line number -> image; a later image for the same line wins
    let mut insertions: BTreeMap<usize, &PlacedImage> = BTreeMap::new();
    insertions.insert(0, &images[0]);

    let remaining = &images[1..];
    if !remaining.is_empty() && !headings.is_empty() {
        // The hero image already sits before the first heading
        let available = if headings.len() > 1 {
            &headings[1..]
        } else {
            &headings[..]
        };
        let step = (available.len() / (remaining.len() + 1)).max(1);
        for (j, image) in remaining.iter().enumerate() {
            let idx = ((j + 1) * step).min(available.len() - 1);
            insertions.insert(available[idx], image);
        }
    }

    for (line, image) in insertions.into_iter().rev() {
        lines.insert(line, format!("\n{}\n", image_markdown(image)));
    }
    lines.join("\n")
}

fn place_after_intro(body: &str, images: &[PlacedImage]) -> String {
    let block = images
        .iter()
        .map(image_markdown)
        .collect::<Vec<_>>()
        .join("\n\n");

    let first_section = if body.starts_with("## ") {
        Some(0)
    } else {
        body.find("\n## ").map(|pos| pos + 1)
    };

    match first_section {
        Some(pos) => format!("{}{}\n\n{}", &body[..pos], block, &body[pos..]),
        None => format!("{}\n\n{}", body, block),
    }
}

/// Add or replace `featured_image` in a front matter block.
///
/// The path is stored without its leading slash. An existing value is kept
/// unless `force` is set.
pub fn update_featured_image(front_matter: &str, image_path: &str, force: bool) -> String {
    let featured = image_path.trim_start_matches('/');
    let line = format!("featured_image: {}", featured);

    if featured_regex().is_match(front_matter) {
        if !force {
            log::info!("featured_image already set, skipping (use --force-featured to override)");
            return front_matter.to_string();
        }
        return featured_regex()
            .replace_all(front_matter, regex::NoExpand(&line))
            .into_owned();
    }

    front_matter.replacen("\n---", &format!("\n{}\n---", line), 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn image(n: usize) -> PlacedImage {
        PlacedImage {
            path: format!("/_images/post/img-{}.jpg", n),
            alt: format!("Alt {}", n),
            title: format!("Title {}", n),
        }
    }

    #[test]
    fn test_split_front_matter() {
        let path = Path::new("blog/post.md");
        let (fm, body) =
            split_front_matter("---\ntitle: A\n---\n\n## Intro\n\nText.\n", path).unwrap();
        assert_eq!(fm, "---\ntitle: A\n---");
        assert_eq!(body, "\n## Intro\n\nText.\n");

        let err = split_front_matter("# Title\n", path).unwrap_err();
        assert!(matches!(err, Error::MissingFrontMatter(p) if p == PathBuf::from("blog/post.md")));
    }

    #[test]
    fn test_slug_from_path() {
        assert_eq!(slug_from_path(Path::new("blog/seo/ai-overviews.md")), "ai-overviews");
    }

    #[test]
    fn test_placement_parse() {
        assert_eq!(
            "after-intro".parse::<Placement>().unwrap(),
            Placement::AfterIntro
        );
        assert_eq!(Placement::BeforeSections.to_string(), "before-sections");
        assert!("sideways".parse::<Placement>().is_err());
    }

    #[test]
    fn test_prompt_to_filename() {
        assert_eq!(
            prompt_to_filename("Modern pharmacy with digital analytics", 0),
            "modern-pharmacy-with-digital-analytics"
        );
        assert_eq!(prompt_to_filename("  ¿¡!  ", 4), "gen-005");

        let long = "word ".repeat(30);
        let name = prompt_to_filename(&long, 0);
        assert!(name.len() <= 60);
        assert!(name.ends_with("word"));
    }

    #[test]
    fn test_prompt_to_alt_and_title() {
        assert_eq!(
            prompt_to_alt("doctor reviewing data on a tablet..."),
            "Doctor reviewing data on a tablet"
        );

        let long = "abstract visualization of molecules ".repeat(8);
        let alt = prompt_to_alt(&long);
        assert!(alt.chars().count() <= 125);
        assert!(alt.starts_with("Abstract"));
        assert!(alt.ends_with("..."));

        let title = prompt_to_title(&long);
        assert!(title.chars().count() <= 200);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_image_markdown() {
        assert_eq!(
            image_markdown(&image(1)),
            "![Alt 1](/_images/post/img-1.jpg \"Title 1\")"
        );
    }

    #[test]
    fn test_before_sections() {
        let body = "Intro.\n\n## A\n\nx\n\n## B\n\ny\n\n## C\n\nz";
        let result = insert_images(body, &[image(1), image(2)], Placement::BeforeSections);
        let expected = format!(
            "\n{}\n\nIntro.\n\n## A\n\nx\n\n## B\n\ny\n\n\n{}\n\n## C\n\nz",
            image_markdown(&image(1)),
            image_markdown(&image(2))
        );
        assert_eq!(result, expected);
    }

    #[test]
    fn test_before_sections_without_headings() {
        let result = insert_images("Only text.", &[image(1), image(2)], Placement::BeforeSections);
        assert_eq!(result, format!("\n{}\n\nOnly text.", image_markdown(&image(1))));
    }

    #[test]
    fn test_after_intro() {
        let body = "Intro.\n\n## A\n\nx";
        let result = insert_images(body, &[image(1), image(2)], Placement::AfterIntro);
        assert_eq!(
            result,
            format!(
                "Intro.\n\n{}\n\n{}\n\n## A\n\nx",
                image_markdown(&image(1)),
                image_markdown(&image(2))
            )
        );

        let appended = insert_images("No sections.", &[image(1)], Placement::AfterIntro);
        assert_eq!(
            appended,
            format!("No sections.\n\n{}", image_markdown(&image(1)))
        );
    }

    #[test]
    fn test_manual_leaves_body() {
        assert_eq!(insert_images("Body", &[image(1)], Placement::Manual), "Body");
    }

    #[test]
    fn test_update_featured_image() {
        let fm = "---\ntitle: A\npost_status: draft\n---";
        assert_eq!(
            update_featured_image(fm, "/_images/a/hero.jpg", false),
            "---\ntitle: A\npost_status: draft\nfeatured_image: _images/a/hero.jpg\n---"
        );

        let existing = "---\ntitle: A\nfeatured_image: _images/a/old.jpg\n---";
        assert_eq!(update_featured_image(existing, "/_images/a/new.jpg", false), existing);
        assert_eq!(
            update_featured_image(existing, "/_images/a/new.jpg", true),
            "---\ntitle: A\nfeatured_image: _images/a/new.jpg\n---"
        );
    }
}
