//! Rendering module: Markdown cleanup, front matter and image references.

mod cleanup;
mod frontmatter;
mod headings;
pub mod images;
mod result;
mod typography;

pub use cleanup::{CleanupOptions, CleanupPipeline};
pub use frontmatter::{
    extract_excerpt, parse_post_date, split_list, FrontMatter, PostStatus, DEFAULT_EXCERPT_LEN,
    POST_DATE_FORMAT,
};
pub use headings::{
    demote_headings, has_level_one_heading, looks_like_continuation, merge_heading_continuations,
    parse_heading,
};
pub use images::{
    placeholder, replace_image_placeholders, save_images, ImageMapping, ImageOptions,
    OutputFormat, ProcessedImage,
};
pub use result::{ConversionResult, ConversionStats};
pub use typography::normalize_typography;
