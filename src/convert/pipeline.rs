//! From an input file to a written post.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::detect::extension_mismatch;
use crate::error::{Error, Result};
use crate::render::{
    extract_excerpt, replace_image_placeholders, save_images, CleanupPipeline, ConversionResult,
    ConversionStats, FrontMatter, ImageMapping, ImageOptions, PostStatus, DEFAULT_EXCERPT_LEN,
};
use crate::slug::{slug_with_fallback, unique_slug, SlugOptions};

use super::{DocxExtractor, ExtractorRegistry, PdfExtractor, RtfExtractor};

/// Exit status when every file converted.
pub const EXIT_OK: i32 = 0;
/// Exit status when at least one file failed.
pub const EXIT_FAILURES: i32 = 1;
/// Exit status when there was nothing to convert.
pub const EXIT_NO_INPUT: i32 = 2;

/// Options for converting documents into posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Directory the `.md` posts are written to
    pub output_dir: PathBuf,
    /// Root directory for per-post image folders
    pub images_dir: PathBuf,
    /// Post status written to front matter
    pub status: PostStatus,
    /// Post date (`YYYY-MM-DD HH:MM:SS`); the current time when unset
    pub date: Option<String>,
    /// Category slugs
    pub categories: Vec<String>,
    /// Tag slugs
    pub tags: Vec<String>,
    /// Whether to extract and save embedded images
    pub extract_images: bool,
    /// Report what would be written without touching the filesystem
    pub dry_run: bool,
}

impl ConvertOptions {
    /// Create new convert options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the images directory.
    pub fn with_images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.images_dir = dir.into();
        self
    }

    /// Set the post status.
    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the post date.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
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

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Enable or disable dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            images_dir: PathBuf::from("_images"),
            status: PostStatus::default(),
            date: None,
            categories: Vec::new(),
            tags: Vec::new(),
            extract_images: true,
            dry_run: false,
        }
    }
}

/// Which inputs a batch covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSelection {
    /// Files named on the command line
    Files(Vec<PathBuf>),
    /// Every supported file in a directory
    Directory(PathBuf),
}

/// Resolve an input selection into the files to convert.
///
/// Named files that are missing or have an unsupported extension are skipped
/// with a warning. A missing input directory is created and yields nothing.
/// Directory entries are returned sorted by name.
pub fn collect_inputs(
    selection: &InputSelection,
    registry: &ExtractorRegistry,
) -> Result<(Vec<PathBuf>, Vec<String>)> {
    let mut files = Vec::new();
    let mut warnings = Vec::new();

    match selection {
        InputSelection::Files(paths) => {
            for path in paths {
                if !registry.supports_path(path) {
                    let err = Error::UnsupportedFormat(path.display().to_string());
                    warnings.push(err.to_string());
                } else if !path.is_file() {
                    warnings.push(format!("File not found: {}", path.display()));
                } else {
                    files.push(path.clone());
                }
            }
        }
        InputSelection::Directory(dir) => {
            if !dir.is_dir() {
                fs::create_dir_all(dir)?;
                return Ok((files, warnings));
            }
            let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && registry.supports_path(path))
                .collect();
            entries.sort();
            files = entries;
        }
    }

    for warning in &warnings {
        log::warn!("{}", warning);
    }
    Ok((files, warnings))
}

/// What happened to one file of a batch.
#[derive(Debug)]
pub enum FileOutcome {
    /// The post was produced
    Converted(Box<ConversionResult>),
    /// Conversion failed; the batch went on
    Failed {
        /// Input file
        path: PathBuf,
        /// Error message
        error: String,
    },
}

/// Counts for a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Files converted
    pub converted: usize,
    /// Files that failed
    pub failed: usize,
    /// Combined statistics of the converted posts
    pub stats: ConversionStats,
}

impl BatchReport {
    /// Count one outcome.
    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Converted(result) => {
                self.converted += 1;
                self.stats.merge(&result.stats);
            }
            FileOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Files seen.
    pub fn total(&self) -> usize {
        self.converted + self.failed
    }

    /// Process exit status: nothing to do, some failures, or success.
    pub fn exit_code(&self) -> i32 {
        if self.total() == 0 {
            EXIT_NO_INPUT
        } else if self.failed > 0 {
            EXIT_FAILURES
        } else {
            EXIT_OK
        }
    }

    /// One-line summary.
    pub fn summary(&self) -> String {
        format!("{} converted, {} failed", self.converted, self.failed)
    }
}

/// Turns documents into posts: extract, clean, slug, images, front matter, write.
#[derive(Clone)]
pub struct PostConverter {
    registry: ExtractorRegistry,
    cleanup: CleanupPipeline,
    slug_options: SlugOptions,
    image_options: ImageOptions,
}

impl PostConverter {
    /// Create a converter around an extractor registry.
    pub fn new(registry: ExtractorRegistry) -> Self {
        Self {
            registry,
            cleanup: CleanupPipeline::default(),
            slug_options: SlugOptions::default(),
            image_options: ImageOptions::default(),
        }
    }

    /// Create a converter whose extractors honor the image setting of `options`.
    pub fn for_options(options: &ConvertOptions) -> Self {
        if options.extract_images {
            return Self::default();
        }
        let mut registry = ExtractorRegistry::new();
        registry.register(Arc::new(PdfExtractor::default().text_only()));
        registry.register(Arc::new(DocxExtractor::new().with_images(false)));
        registry.register(Arc::new(RtfExtractor::default()));
        Self::new(registry)
    }

    /// Use a custom cleanup pipeline.
    pub fn with_cleanup(mut self, cleanup: CleanupPipeline) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Use custom slug options.
    pub fn with_slug_options(mut self, options: SlugOptions) -> Self {
        self.slug_options = options;
        self
    }

    /// Use custom image options.
    pub fn with_image_options(mut self, options: ImageOptions) -> Self {
        self.image_options = options;
        self
    }

    /// The extractor registry.
    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Convert one file into a post.
    ///
    /// The post is written to `<output_dir>/<slug>.md` unless this is a dry
    /// run, in which case nothing is written and images are not saved.
    pub fn convert_file(&self, path: &Path, options: &ConvertOptions) -> Result<ConversionResult> {
        log::info!("Converting: {}", path.display());

        let mismatch = extension_mismatch(path);
        if let Some(note) = &mismatch {
            log::warn!("{}", note);
        }

        let mut extracted = self.registry.extract(path)?;
        extracted.warnings.extend(mismatch);
        log::debug!(
            "extracted \"{}\": {} chars, {} images",
            extracted.title,
            extracted.markdown.len(),
            extracted.images.len()
        );

        let mut body = self.cleanup.process(&extracted.markdown);

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let slug = slug_with_fallback(&extracted.title, &stem, &self.slug_options);
        let slug = unique_slug(&slug, &existing_file_names(&options.output_dir));

        let mut mapping = ImageMapping::new();
        if options.extract_images && !extracted.images.is_empty() {
            if options.dry_run {
                log::info!(
                    "Would extract {} image(s) to {}",
                    extracted.images.len(),
                    options.images_dir.join(&slug).display()
                );
            } else {
                mapping = save_images(
                    &extracted.images,
                    &slug,
                    &options.images_dir,
                    &self.image_options,
                )?;
                body = replace_image_placeholders(&body, &mapping);
                log::info!(
                    "Saved {} image(s) to {}",
                    mapping.file_count(),
                    options.images_dir.join(&slug).display()
                );
            }
        }

        let mut front_matter = FrontMatter::new(extracted.title.clone())
            .with_status(options.status)
            .with_excerpt(extract_excerpt(&body, DEFAULT_EXCERPT_LEN))
            .with_categories(options.categories.clone())
            .with_tags(options.tags.clone());
        if let Some(date) = &options.date {
            front_matter = front_matter.with_date(date.clone());
        }
        if let Some(featured) = mapping.featured_image() {
            front_matter = front_matter.with_featured_image(featured);
        }

        let stats = ConversionStats::from_markdown(&body).with_images_saved(mapping.file_count());
        let mut result = ConversionResult {
            title: extracted.title,
            slug,
            front_matter: front_matter.render(),
            body,
            stats,
            images_found: extracted.images.len(),
            output_path: None,
            warnings: extracted.warnings,
        };

        if !options.dry_run {
            fs::create_dir_all(&options.output_dir)?;
            let output_path = options.output_dir.join(result.file_name());
            fs::write(&output_path, result.content())?;
            log::info!("Created: {}", output_path.display());
            result.output_path = Some(output_path);
        }

        Ok(result)
    }

    /// Convert files one after another.
    ///
    /// A failing file is reported through `on_file` and counted; the batch
    /// continues with the next file.
    pub fn convert_batch<F>(
        &self,
        files: &[PathBuf],
        options: &ConvertOptions,
        mut on_file: F,
    ) -> BatchReport
    where
        F: FnMut(&Path, &FileOutcome),
    {
        let mut report = BatchReport::default();

        for path in files {
            let outcome = match self.convert_file(path, options) {
                Ok(result) => FileOutcome::Converted(Box::new(result)),
                Err(e) => {
                    log::error!("Failed to convert {}: {}", path.display(), e);
                    FileOutcome::Failed {
                        path: path.clone(),
                        error: e.to_string(),
                    }
                }
            };
            report.record(&outcome);
            on_file(path, &outcome);
        }

        log::info!("Done. {}", report.summary());
        report
    }
}

impl Default for PostConverter {
    fn default() -> Self {
        Self::new(ExtractorRegistry::with_defaults())
    }
}

fn existing_file_names(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RTF: &str = r"{\rtf1\ansi
Quarterly Update: Results\par
\par
OVERVIEW\par
\par
Sales rose in every region this quarter. The team shipped two products.\par
}";

    fn write_input(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_convert_options_builder() {
        let options = ConvertOptions::new()
            .with_output_dir("blog/seo")
            .with_status(PostStatus::Publish)
            .with_tags(vec!["ai".to_string()])
            .with_images(false)
            .with_dry_run(true);

        assert_eq!(options.output_dir, PathBuf::from("blog/seo"));
        assert_eq!(options.status, PostStatus::Publish);
        assert_eq!(options.tags, vec!["ai"]);
        assert!(!options.extract_images);
        assert!(options.dry_run);
    }

    #[test]
    fn test_batch_report_exit_codes() {
        let mut report = BatchReport::default();
        assert_eq!(report.exit_code(), EXIT_NO_INPUT);

        report.record(&FileOutcome::Converted(Box::default()));
        assert_eq!(report.exit_code(), EXIT_OK);

        report.record(&FileOutcome::Failed {
            path: PathBuf::from("broken.pdf"),
            error: "bad".to_string(),
        });
        assert_eq!(report.exit_code(), EXIT_FAILURES);
        assert_eq!(report.summary(), "1 converted, 1 failed");
    }

    #[test]
    fn test_collect_files_skips_unsupported_and_missing() {
        let dir = TempDir::new().unwrap();
        let rtf = write_input(dir.path(), "a.rtf", RTF);
        let txt = write_input(dir.path(), "notes.txt", "text");
        let missing = dir.path().join("gone.pdf");

        let selection = InputSelection::Files(vec![rtf.clone(), txt, missing]);
        let (files, warnings) =
            collect_inputs(&selection, &ExtractorRegistry::with_defaults()).unwrap();

        assert_eq!(files, vec![rtf]);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].starts_with("Unsupported format"));
        assert!(warnings[1].starts_with("File not found"));
    }

    #[test]
    fn test_collect_directory_sorted() {
        let dir = TempDir::new().unwrap();
        write_input(dir.path(), "b.rtf", RTF);
        write_input(dir.path(), "a.rtf", RTF);
        write_input(dir.path(), "c.txt", "ignored");

        let selection = InputSelection::Directory(dir.path().to_path_buf());
        let (files, _) = collect_inputs(&selection, &ExtractorRegistry::with_defaults()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.rtf", "b.rtf"]);
    }

    #[test]
    fn test_collect_missing_directory_is_created() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input");
        let selection = InputSelection::Directory(input.clone());
        let (files, _) = collect_inputs(&selection, &ExtractorRegistry::with_defaults()).unwrap();
        assert!(files.is_empty());
        assert!(input.is_dir());
    }

    #[test]
    fn test_convert_rtf_writes_post() {
        let dir = TempDir::new().unwrap();
        let input = write_input(dir.path(), "update.rtf", RTF);
        let options = ConvertOptions::new()
            .with_output_dir(dir.path().join("blog"))
            .with_images_dir(dir.path().join("_images"))
            .with_date("2025-03-01 09:00:00")
            .with_categories(vec!["news".to_string()]);

        let result = PostConverter::default()
            .convert_file(&input, &options)
            .unwrap();

        assert_eq!(result.title, "Quarterly Update: Results");
        assert_eq!(result.slug, "quarterly-update-results");
        let path = result.output_path.clone().unwrap();
        assert_eq!(path, dir.path().join("blog/quarterly-update-results.md"));

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, result.content());
        assert!(written.starts_with("---\ntitle: \"Quarterly Update: Results\"\n"));
        assert!(written.contains("post_status: draft\n"));
        assert!(written.contains("post_date: 2025-03-01 09:00:00\n"));
        assert!(written.contains("taxonomy:\n    category:\n        - news\n"));
        assert!(written.contains("## Overview"));
        assert!(written.ends_with("two products.\n"));
    }

    #[test]
    fn test_slug_collision_and_dry_run() {
        let dir = TempDir::new().unwrap();
        let input = write_input(dir.path(), "update.rtf", RTF);
        let blog = dir.path().join("blog");
        fs::create_dir_all(&blog).unwrap();
        fs::write(blog.join("quarterly-update-results.md"), "old").unwrap();

        let options = ConvertOptions::new()
            .with_output_dir(&blog)
            .with_dry_run(true);
        let result = PostConverter::default()
            .convert_file(&input, &options)
            .unwrap();

        assert_eq!(result.slug, "quarterly-update-results-2");
        assert!(result.output_path.is_none());
        assert!(!blog.join("quarterly-update-results-2.md").exists());
    }

    #[test]
    fn test_non_latin_title_uses_file_name_slug() {
        let dir = TempDir::new().unwrap();
        let rtf = r"{\rtf1\ansi
\u1054?\u1090?\u1095?\u1077?\u1090? \u1086? \u1087?\u1088?\u1086?\u1076?\u1072?\u1078?\u1072?\u1093?\par
\par
Sales rose in every region this quarter.\par
}";
        let first = write_input(dir.path(), "sales-report.rtf", rtf);
        let blog = dir.path().join("blog");
        let options = ConvertOptions::new()
            .with_output_dir(&blog)
            .with_images_dir(dir.path().join("_images"));

        let converter = PostConverter::default();
        let result = converter.convert_file(&first, &options).unwrap();
        assert_eq!(result.title, "Отчет о продажах");
        assert_eq!(result.slug, "sales-report");
        assert_eq!(result.output_path, Some(blog.join("sales-report.md")));

        let second = write_input(dir.path(), "\u{43e}\u{442}\u{447}\u{435}\u{442}.rtf", rtf);
        let again = converter.convert_file(&second, &options).unwrap();
        assert_eq!(again.slug, "post");
        let third = converter.convert_file(&second, &options).unwrap();
        assert_eq!(third.slug, "post-2");
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let dir = TempDir::new().unwrap();
        let good = write_input(dir.path(), "good.rtf", RTF);
        let bad = write_input(dir.path(), "bad.rtf", "not rtf at all");
        let options = ConvertOptions::new().with_output_dir(dir.path().join("out"));

        let mut seen = Vec::new();
        let report = PostConverter::default().convert_batch(
            &[bad, good],
            &options,
            |path, outcome| {
                seen.push((
                    path.file_name().unwrap().to_string_lossy().into_owned(),
                    matches!(outcome, FileOutcome::Converted(_)),
                ));
            },
        );

        assert_eq!(report.converted, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.exit_code(), EXIT_FAILURES);
        assert_eq!(
            seen,
            vec![("bad.rtf".to_string(), false), ("good.rtf".to_string(), true)]
        );
    }
}
