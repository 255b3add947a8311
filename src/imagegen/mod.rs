//! AI illustration of existing posts.
//!
//! Prompts go to an [`ImageGenerator`] one at a time with a bounded retry
//! loop. Images that come back are saved under `<images_dir>/<slug>/`,
//! referenced from the post body and optionally set as its featured image.
//! A prompt that keeps failing is skipped; only a batch where every prompt
//! fails is an error.

mod gemini;
mod post;

pub use gemini::{resolve_api_key, GeminiClient, GEMINI_ENDPOINT};
pub use post::{
    image_markdown, insert_images, prompt_to_alt, prompt_to_filename, prompt_to_title,
    slug_from_path, split_front_matter, update_featured_image, Placement, PlacedImage,
};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::render::{ImageOptions, ProcessedImage};

/// Default image model.
pub const DEFAULT_MODEL: &str = "gemini-3-pro-image-preview";

/// Style prefix prepended to prompts unless disabled or overridden.
pub const DEFAULT_STYLE_PREFIX: &str = "Professional editorial illustration for a healthcare and \
pharmaceutical marketing blog. Clean, modern aesthetic with subtle corporate colors. \
High quality, suitable as a blog header or section image. ";

/// Supported output resolutions.
pub const RESOLUTIONS: [&str; 3] = ["1K", "2K", "4K"];

/// Retry schedule for a single prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per prompt, including the first
    pub max_attempts: u32,
    /// Wait after failed attempt N (0-based); the last entry repeats
    pub delays: Vec<Duration>,
}

impl RetryPolicy {
    /// A policy with the given attempt count and delays.
    pub fn new(max_attempts: u32, delays: Vec<Duration>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delays,
        }
    }

    /// Wait before the attempt following failed attempt `attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.delays
            .get(attempt as usize)
            .or_else(|| self.delays.last())
            .copied()
            .unwrap_or_default()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            3,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ],
        )
    }
}

/// Model and rendering parameters for generation requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Model name
    pub model: String,
    /// Text prepended to every prompt; empty for none
    pub style_prefix: String,
    /// Aspect ratio such as `16:9`
    pub aspect_ratio: String,
    /// `1K`, `2K` or `4K`
    pub resolution: String,
    /// Retry schedule per prompt
    pub retry: RetryPolicy,
}

impl GenerationOptions {
    /// Create generation options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the style prefix (see [`resolve_style`]).
    pub fn with_style_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.style_prefix = prefix.into();
        self
    }

    /// Set the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.aspect_ratio = ratio.into();
        self
    }

    /// Set the resolution.
    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = resolution.into();
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Prompt as sent to the model.
    pub fn full_prompt(&self, prompt: &str) -> String {
        format!("{}{}", self.style_prefix, prompt)
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            style_prefix: DEFAULT_STYLE_PREFIX.to_string(),
            aspect_ratio: "16:9".to_string(),
            resolution: "1K".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Style prefix: none, a custom one followed by a space, or the default.
pub fn resolve_style(no_style: bool, custom: Option<&str>) -> String {
    if no_style {
        return String::new();
    }
    match custom {
        Some(style) if !style.is_empty() => format!("{} ", style),
        _ => DEFAULT_STYLE_PREFIX.to_string(),
    }
}

/// A text-to-image backend.
pub trait ImageGenerator {
    /// Generate one image for the full prompt and return its encoded bytes.
    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<Vec<u8>>;
}

/// An image returned for a prompt.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    /// Prompt as given, without the style prefix
    pub prompt: String,
    /// Position of the prompt in the request
    pub index: usize,
    /// Encoded image bytes
    pub data: Vec<u8>,
}

/// Generate one image, retrying per the policy.
///
/// `sleep` is called between attempts.
pub fn generate_with_retry<G, S>(
    generator: &G,
    prompt: &str,
    options: &GenerationOptions,
    sleep: &mut S,
) -> Result<Vec<u8>>
where
    G: ImageGenerator + ?Sized,
    S: FnMut(Duration),
{
    let full_prompt = options.full_prompt(prompt);
    let attempts = options.retry.max_attempts;
    let mut last_err: Option<String> = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            let delay = options.retry.delay_after(attempt - 1);
            log::warn!(
                "Retry {}/{} after {:?}: {}",
                attempt,
                attempts,
                delay,
                last_err.as_deref().unwrap_or("unknown error")
            );
            sleep(delay);
        }

        match generator.generate(&full_prompt, options) {
            Ok(data) => return Ok(data),
            Err(e) => {
                log::debug!("attempt {} failed: {}", attempt + 1, e);
                last_err = Some(e.to_string());
            }
        }
    }

    Err(Error::Generation {
        attempts,
        detail: last_err.unwrap_or_else(|| "unknown error".to_string()),
    })
}

/// Generate an image per prompt, skipping prompts that fail.
///
/// Returns an error only when no prompt produced an image.
pub fn generate_all<G, S>(
    generator: &G,
    prompts: &[String],
    options: &GenerationOptions,
    mut sleep: S,
) -> Result<Vec<GeneratedImage>>
where
    G: ImageGenerator + ?Sized,
    S: FnMut(Duration),
{
    let mut results = Vec::new();
    let mut last_err = None;

    for (index, prompt) in prompts.iter().enumerate() {
        log::info!("Generating image {}/{}...", index + 1, prompts.len());
        match generate_with_retry(generator, prompt, options, &mut sleep) {
            Ok(data) => results.push(GeneratedImage {
                prompt: prompt.clone(),
                index,
                data,
            }),
            Err(e) => {
                log::warn!("Image {} failed: {}", index + 1, e);
                last_err = Some(e);
            }
        }
    }

    if results.is_empty() {
        if let Some(err) = last_err {
            return Err(err);
        }
    }
    log::info!("{}/{} image(s) generated", results.len(), prompts.len());
    Ok(results)
}

/// File stem for the image at `index`: an explicit name when given, else
/// derived from the prompt.
pub fn image_stem(prompt: &str, index: usize, names: &[String]) -> String {
    names
        .get(index)
        .cloned()
        .unwrap_or_else(|| prompt_to_filename(prompt, index))
}

/// Save generated images to `<images_dir>/<slug>/` and describe them for the post.
pub fn save_generated(
    images: &[GeneratedImage],
    slug: &str,
    images_dir: &Path,
    names: &[String],
    options: &ImageOptions,
) -> Result<Vec<PlacedImage>> {
    let output_dir = images_dir.join(slug);
    fs::create_dir_all(&output_dir)?;

    let mut placed = Vec::with_capacity(images.len());
    for image in images {
        let processed = ProcessedImage::decode(&image.data, options)?;
        let filename = format!(
            "{}.{}",
            image_stem(&image.prompt, image.index, names),
            processed.format().extension()
        );
        processed.save(&output_dir.join(&filename), options)?;

        let path = options.url_for(slug, &filename);
        log::info!("Saved: {}", path);
        placed.push(PlacedImage::from_prompt(path, &image.prompt));
    }
    Ok(placed)
}

/// How to illustrate a post.
#[derive(Debug, Clone)]
pub struct IllustrateOptions {
    /// Where references go in the body
    pub placement: Placement,
    /// Set the first image as featured image
    pub featured: bool,
    /// Replace an existing featured image
    pub force_featured: bool,
    /// File stems, one per prompt
    pub image_names: Vec<String>,
    /// Root directory for per-post image folders
    pub images_dir: PathBuf,
    /// Resize and encoding settings
    pub image_options: ImageOptions,
    /// Model settings
    pub generation: GenerationOptions,
}

impl Default for IllustrateOptions {
    fn default() -> Self {
        Self {
            placement: Placement::BeforeSections,
            featured: true,
            force_featured: false,
            image_names: Vec::new(),
            images_dir: PathBuf::from("_images"),
            image_options: ImageOptions::default(),
            generation: GenerationOptions::default(),
        }
    }
}

/// Outcome of illustrating a post.
#[derive(Debug, Clone, Default)]
pub struct IllustrateReport {
    /// Post slug (file stem)
    pub slug: String,
    /// Saved images in prompt order
    pub images: Vec<PlacedImage>,
    /// Prompts that produced no image
    pub failed_prompts: usize,
    /// Whether the post file was rewritten
    pub updated: bool,
}

/// Paths a dry run would write, `_images/<slug>/<stem>.jpg` per prompt.
pub fn planned_paths(slug: &str, prompts: &[String], names: &[String]) -> Vec<String> {
    prompts
        .iter()
        .enumerate()
        .map(|(i, p)| format!("_images/{}/{}.jpg", slug, image_stem(p, i, names)))
        .collect()
}

/// Generate images for `post_path`, save them and update the post.
///
/// The post is rewritten when images were placed in the body or a featured
/// image was set. With [`Placement::Manual`] and no featured image the file
/// is left alone and the caller prints the references.
pub fn illustrate_post<G, S>(
    post_path: &Path,
    prompts: &[String],
    generator: &G,
    options: &IllustrateOptions,
    sleep: S,
) -> Result<IllustrateReport>
where
    G: ImageGenerator + ?Sized,
    S: FnMut(Duration),
{
    let content = fs::read_to_string(post_path)?;
    let (mut front_matter, mut body) = split_front_matter(&content, post_path)?;
    let slug = slug_from_path(post_path);

    let generated = generate_all(generator, prompts, &options.generation, sleep)?;
    let images = save_generated(
        &generated,
        &slug,
        &options.images_dir,
        &options.image_names,
        &options.image_options,
    )?;

    if options.placement != Placement::Manual {
        body = insert_images(&body, &images, options.placement);
        log::info!(
            "Inserted {} image reference(s) ({})",
            images.len(),
            options.placement
        );
    }

    let set_featured = options.featured && !images.is_empty();
    if let Some(first) = images.first().filter(|_| set_featured) {
        front_matter = update_featured_image(&front_matter, &first.path, options.force_featured);
    }

    let updated = options.placement != Placement::Manual || set_featured;
    if updated {
        fs::write(post_path, format!("{}\n{}", front_matter, body))?;
        log::info!("Updated: {}", post_path.display());
    }

    Ok(IllustrateReport {
        slug,
        failed_prompts: prompts.len() - generated.len(),
        images,
        updated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Cursor;

    /// Fails the first `failures` calls, then returns a small PNG.
    struct FlakyGenerator {
        failures: u32,
        calls: Cell<u32>,
    }

    impl FlakyGenerator {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: Cell::new(0),
            }
        }
    }

    impl ImageGenerator for FlakyGenerator {
        fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> Result<Vec<u8>> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            if call <= self.failures {
                return Err(Error::Http(format!("503 on call {}", call)));
            }
            Ok(png_bytes())
        }
    }

    fn png_bytes() -> Vec<u8> {
        let image = image::RgbImage::from_pixel(8, 4, image::Rgb([200, 30, 30]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_resolve_style() {
        assert_eq!(resolve_style(true, Some("Watercolor")), "");
        assert_eq!(resolve_style(false, Some("Watercolor")), "Watercolor ");
        assert_eq!(resolve_style(false, None), DEFAULT_STYLE_PREFIX);
    }

    #[test]
    fn test_retry_policy_delays() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_after(0), Duration::from_secs(1));
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(7), Duration::from_secs(4));
    }

    #[test]
    fn test_retry_then_success() {
        let generator = FlakyGenerator::new(2);
        let mut waits = Vec::new();
        let data = generate_with_retry(
            &generator,
            "a harbor at dawn",
            &GenerationOptions::default(),
            &mut |d: Duration| waits.push(d),
        )
        .unwrap();

        assert!(!data.is_empty());
        assert_eq!(generator.calls.get(), 3);
        assert_eq!(waits, vec![Duration::from_secs(1), Duration::from_secs(2)]);
    }

    #[test]
    fn test_retry_exhausted() {
        let generator = FlakyGenerator::new(10);
        let err = generate_with_retry(
            &generator,
            "prompt",
            &GenerationOptions::default(),
            &mut |_: Duration| {},
        )
        .unwrap_err();
        assert_eq!(generator.calls.get(), 3);
        assert!(matches!(err, Error::Generation { attempts: 3, .. }));
    }

    #[test]
    fn test_generate_all_skips_failed_prompt() {
        // First prompt uses up three failures, second succeeds at once
        let generator = FlakyGenerator::new(3);
        let prompts = vec!["first".to_string(), "second".to_string()];
        let results =
            generate_all(&generator, &prompts, &GenerationOptions::default(), |_| {}).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].prompt, "second");
        assert_eq!(results[0].index, 1);
    }

    #[test]
    fn test_generate_all_fails_when_nothing_generated() {
        let generator = FlakyGenerator::new(100);
        let prompts = vec!["a".to_string(), "b".to_string()];
        let result = generate_all(&generator, &prompts, &GenerationOptions::default(), |_| {});
        assert!(matches!(result, Err(Error::Generation { .. })));
    }

    #[test]
    fn test_full_prompt() {
        let options = GenerationOptions::new().with_style_prefix("Ink sketch. ");
        assert_eq!(options.full_prompt("A lighthouse"), "Ink sketch. A lighthouse");
    }

    #[test]
    fn test_planned_paths() {
        let prompts = vec!["Doctor with tablet".to_string(), "!!!".to_string()];
        let names = vec!["hero-shot".to_string()];
        assert_eq!(
            planned_paths("pharma", &prompts, &names),
            vec!["_images/pharma/hero-shot.jpg", "_images/pharma/gen-002.jpg"]
        );
    }

    #[test]
    fn test_illustrate_post() {
        let dir = tempfile::TempDir::new().unwrap();
        let post = dir.path().join("pharma-news.md");
        fs::write(
            &post,
            "---\ntitle: Pharma News\npost_status: draft\n---\n\nIntro.\n\n## One\n\nText.\n",
        )
        .unwrap();

        let options = IllustrateOptions {
            images_dir: dir.path().join("_images"),
            ..Default::default()
        };
        let prompts = vec!["modern pharmacy interior.".to_string()];
        let report =
            illustrate_post(&post, &prompts, &FlakyGenerator::new(0), &options, |_| {}).unwrap();

        assert_eq!(report.slug, "pharma-news");
        assert!(report.updated);
        assert_eq!(report.failed_prompts, 0);
        assert_eq!(
            report.images[0].path,
            "/_images/pharma-news/modern-pharmacy-interior.jpg"
        );
        assert!(dir
            .path()
            .join("_images/pharma-news/modern-pharmacy-interior.jpg")
            .is_file());

        let written = fs::read_to_string(&post).unwrap();
        assert!(written.starts_with(
            "---\ntitle: Pharma News\npost_status: draft\n\
             featured_image: _images/pharma-news/modern-pharmacy-interior.jpg\n---\n"
        ));
        assert!(written.contains(
            "![Modern pharmacy interior](/_images/pharma-news/modern-pharmacy-interior.jpg \"Modern pharmacy interior\")"
        ));
    }

    #[test]
    fn test_illustrate_requires_front_matter() {
        let dir = tempfile::TempDir::new().unwrap();
        let post = dir.path().join("plain.md");
        fs::write(&post, "# No front matter\n").unwrap();
        let err = illustrate_post(
            &post,
            &["x".to_string()],
            &FlakyGenerator::new(0),
            &IllustrateOptions::default(),
            |_| {},
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingFrontMatter(_)));
    }
}
