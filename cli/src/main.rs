//! doc2post CLI - convert documents into blog posts and illustrate them

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use doc2post::convert::{EXIT_FAILURES, EXIT_NO_INPUT};
use doc2post::imagegen::{
    illustrate_post, image_markdown, planned_paths, resolve_style, slug_from_path,
    split_front_matter, GeminiClient, GenerationOptions, IllustrateOptions, Placement,
};
use doc2post::render::{parse_post_date, split_list};
use doc2post::{
    collect_inputs, ConvertOptions, Error, FileOutcome, InputSelection, PostConverter, PostStatus,
};

#[derive(Parser)]
#[command(name = "doc2post")]
#[command(version)]
#[command(about = "Convert PDF, DOCX and RTF files into Markdown blog posts", long_about = None)]
struct Cli {
    /// Show detailed processing info
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert documents to Markdown posts with front matter
    Convert(ConvertArgs),

    /// Generate AI images for an existing post
    Images(ImagesArgs),
}

#[derive(Args)]
struct ConvertArgs {
    /// Input files (default: every supported file in the input directory)
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Directory scanned when no files are given
    #[arg(long, value_name = "DIR", default_value = "input")]
    input_dir: PathBuf,

    /// Output directory for .md files
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Root directory for extracted images
    #[arg(long, value_name = "DIR", default_value = "_images")]
    images_dir: PathBuf,

    /// Category slug(s), comma-separated (e.g. "seo,marketing")
    #[arg(short, long)]
    category: Option<String>,

    /// Tag slug(s), comma-separated (e.g. "ai-overviews,ahrefs")
    #[arg(short, long)]
    tag: Option<String>,

    /// Post status
    #[arg(short, long, value_enum, default_value = "draft")]
    status: StatusArg,

    /// Post date (YYYY-MM-DD HH:MM:SS, YYYY-MM-DD or DD.MM.YYYY)
    #[arg(short, long)]
    date: Option<String>,

    /// Skip image extraction
    #[arg(long)]
    no_images: bool,

    /// Preview output without writing files
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct ImagesArgs {
    /// The .md post to add images to
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Image generation prompts
    #[arg(short, long, num_args = 1.., required = true)]
    prompts: Vec<String>,

    /// Where to insert images
    #[arg(long, value_enum, default_value = "before-sections")]
    placement: PlacementArg,

    /// Custom style prefix prepended to each prompt
    #[arg(long)]
    style: Option<String>,

    /// Disable the default style prefix
    #[arg(long)]
    no_style: bool,

    /// Image aspect ratio
    #[arg(long, default_value = "16:9")]
    aspect_ratio: String,

    /// Image resolution
    #[arg(long, value_enum, default_value = "1K")]
    resolution: ResolutionArg,

    /// Do not set featured_image
    #[arg(long)]
    no_featured: bool,

    /// Overwrite an existing featured_image
    #[arg(long)]
    force_featured: bool,

    /// File names without extension, one per prompt
    #[arg(short = 'n', long, num_args = 1..)]
    image_names: Vec<String>,

    /// Root directory for generated images
    #[arg(long, value_name = "DIR", default_value = "_images")]
    images_dir: PathBuf,

    /// Gemini API key (GOOGLE_API_KEY is also read)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Preview without API calls or file changes
    #[arg(long)]
    dry_run: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum StatusArg {
    Draft,
    Publish,
    Pending,
    Future,
}

impl From<StatusArg> for PostStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Draft => PostStatus::Draft,
            StatusArg::Publish => PostStatus::Publish,
            StatusArg::Pending => PostStatus::Pending,
            StatusArg::Future => PostStatus::Future,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PlacementArg {
    /// First image on top, the rest before evenly spaced sections
    BeforeSections,
    /// All images before the first section
    AfterIntro,
    /// Only print the references
    Manual,
}

impl From<PlacementArg> for Placement {
    fn from(placement: PlacementArg) -> Self {
        match placement {
            PlacementArg::BeforeSections => Placement::BeforeSections,
            PlacementArg::AfterIntro => Placement::AfterIntro,
            PlacementArg::Manual => Placement::Manual,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ResolutionArg {
    #[value(name = "1K")]
    OneK,
    #[value(name = "2K")]
    TwoK,
    #[value(name = "4K")]
    FourK,
}

impl ResolutionArg {
    fn as_str(&self) -> &'static str {
        match self {
            ResolutionArg::OneK => "1K",
            ResolutionArg::TwoK => "2K",
            ResolutionArg::FourK => "4K",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let code = match cli.command {
        Commands::Convert(args) => cmd_convert(args, cli.verbose),
        Commands::Images(args) => cmd_images(args, cli.verbose),
    };
    ExitCode::from(code as u8)
}

fn cmd_convert(args: ConvertArgs, verbose: bool) -> i32 {
    let mut options = ConvertOptions::new()
        .with_output_dir(&args.output_dir)
        .with_images_dir(&args.images_dir)
        .with_status(args.status.into())
        .with_images(!args.no_images)
        .with_dry_run(args.dry_run);

    if let Some(categories) = args.category.as_deref() {
        options = options.with_categories(split_list(categories));
    }
    if let Some(tags) = args.tag.as_deref() {
        options = options.with_tags(split_list(tags));
    }
    if let Some(date) = args.date.as_deref() {
        match parse_post_date(date) {
            Ok(parsed) => options = options.with_date(parsed),
            Err(e) => eprintln!("{}: {}, using current time", "Warning".yellow(), e),
        }
    }

    let converter = PostConverter::for_options(&options);

    let selection = if args.files.is_empty() {
        InputSelection::Directory(args.input_dir.clone())
    } else {
        InputSelection::Files(args.files)
    };
    let files = match collect_inputs(&selection, converter.registry()) {
        Ok((files, warnings)) => {
            for warning in warnings {
                eprintln!("{}: {}", "Warning".yellow(), warning);
            }
            files
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            return EXIT_FAILURES;
        }
    };

    if files.is_empty() {
        println!(
            "{}",
            format!(
                "No supported files found. Drop PDF/DOCX/RTF files into {}/ or specify paths.",
                args.input_dir.display()
            )
            .yellow()
        );
        return EXIT_NO_INPUT;
    }

    println!("Found {} file(s) to convert.\n", files.len());

    let pb = ProgressBar::new(files.len() as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let report = converter.convert_batch(&files, &options, |path, outcome| {
        pb.set_message(file_name(path));
        print_outcome(&pb, path, outcome, &options, verbose);
        pb.inc(1);
    });
    pb.finish_and_clear();

    println!("{}", "=".repeat(50));
    let summary = format!("Done. {}.", report.summary());
    if report.failed > 0 {
        println!("{}", summary.red().bold());
    } else {
        println!("{}", summary.green().bold());
    }

    report.exit_code()
}

fn print_outcome(
    pb: &ProgressBar,
    path: &Path,
    outcome: &FileOutcome,
    options: &ConvertOptions,
    verbose: bool,
) {
    match outcome {
        FileOutcome::Converted(post) => {
            let format = doc2post::detect_format_from_path(path)
                .map(|f| f.to_string())
                .unwrap_or_default();
            pb.println(format!("Converting: {} ({})", file_name(path), format));
            if verbose {
                pb.println(format!("  Title: {}", post.title));
                pb.println(format!("  Content length: {} chars", post.body.chars().count()));
                pb.println(format!("  Images found: {}", post.images_found));
            }
            for warning in &post.warnings {
                pb.println(format!("  {}: {}", "Warning".yellow(), warning));
            }

            if options.dry_run {
                if post.images_found > 0 && options.extract_images {
                    pb.println(format!(
                        "  [DRY RUN] Would extract {} image(s) to {}/{}/",
                        post.images_found,
                        options.images_dir.display(),
                        post.slug
                    ));
                }
                pb.println(format!(
                    "  [DRY RUN] Would create: {}",
                    options.output_dir.join(post.file_name()).display()
                ));
                for line in post.preview().lines() {
                    pb.println(format!("  {}", line));
                }
            } else {
                if post.stats.images_saved > 0 {
                    pb.println(format!(
                        "  Saved {} image(s) to {}/{}/",
                        post.stats.images_saved,
                        options.images_dir.display(),
                        post.slug
                    ));
                }
                if let Some(out) = &post.output_path {
                    pb.println(format!("  {} {}", "Created:".green(), out.display()));
                }
                pb.println(format!("  Status: {}", options.status));
            }
        }
        FileOutcome::Failed { path, error } => {
            pb.println(format!("Converting: {}", file_name(path)));
            pb.println(format!("  {}: {}", "ERROR".red().bold(), error));
        }
    }
    pb.println("");
}

fn cmd_images(args: ImagesArgs, verbose: bool) -> i32 {
    if !args.file.is_file() {
        eprintln!("{}: File not found: {}", "Error".red().bold(), args.file.display());
        return EXIT_NO_INPUT;
    }

    // Fail early on a post without front matter, dry run included
    let content = match std::fs::read_to_string(&args.file) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            return EXIT_FAILURES;
        }
    };
    if let Err(e) = split_front_matter(&content, &args.file) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        return EXIT_NO_INPUT;
    }

    let slug = slug_from_path(&args.file);
    let style = resolve_style(args.no_style, args.style.as_deref());
    let placement: Placement = args.placement.into();
    let featured = !args.no_featured;

    if verbose {
        println!("File: {}", args.file.display());
        println!("Slug: {}", slug);
        println!("Prompts ({}):", args.prompts.len());
        for (i, prompt) in args.prompts.iter().enumerate() {
            println!("  {}. {}", i + 1, prompt);
        }
        println!("Placement: {}", placement);
        println!("Aspect ratio: {}", args.aspect_ratio);
        println!("Resolution: {}", args.resolution.as_str());
        println!();
    }

    if args.dry_run {
        println!("{}", "=== DRY RUN ===".bold());
        println!("Would generate {} image(s) for '{}'", args.prompts.len(), slug);
        if style.is_empty() {
            println!("Style prefix: (none)");
        } else {
            let shown: String = style.chars().take(60).collect();
            println!("Style prefix: {}...", shown);
        }
        let planned = planned_paths(&slug, &args.prompts, &args.image_names);
        for (i, path) in planned.iter().enumerate() {
            println!("  {}. {}", i + 1, path);
        }
        println!("Placement: {}", placement);
        if let Some(first) = planned.first().filter(|_| featured) {
            println!("Featured image: {}", first);
        }
        return 0;
    }

    let client = match GeminiClient::from_env(args.api_key.as_deref()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            return EXIT_FAILURES;
        }
    };

    let options = IllustrateOptions {
        placement,
        featured,
        force_featured: args.force_featured,
        image_names: args.image_names,
        images_dir: args.images_dir,
        generation: GenerationOptions::new()
            .with_style_prefix(style)
            .with_aspect_ratio(args.aspect_ratio)
            .with_resolution(args.resolution.as_str()),
        ..Default::default()
    };

    log::debug!(
        "model {}, {} {}",
        options.generation.model,
        options.generation.aspect_ratio,
        options.generation.resolution
    );
    println!("Generating {} image(s) for '{}'...", args.prompts.len(), slug);
    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));
    spinner.set_message("waiting for the image model");

    let result = illustrate_post(
        &args.file,
        &args.prompts,
        &client,
        &options,
        std::thread::sleep,
    );
    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e @ Error::MissingFrontMatter(_)) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            return EXIT_NO_INPUT;
        }
        Err(e @ Error::Generation { .. }) => {
            eprintln!("{}: All image generations failed. {}", "ERROR".red().bold(), e);
            return EXIT_FAILURES;
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            return EXIT_FAILURES;
        }
    };

    println!(
        "\n{}/{} image(s) generated successfully.",
        report.images.len(),
        args.prompts.len()
    );
    for image in &report.images {
        println!("  Saved: {}", image.path);
    }

    if placement != Placement::Manual {
        println!(
            "Inserted {} image reference(s) ({}).",
            report.images.len(),
            placement
        );
    }

    if report.updated {
        println!("{} {}", "Updated:".green(), args.file.display());
    } else {
        println!("\nImage references for manual insertion:");
        for image in &report.images {
            println!("  {}", image_markdown(image));
        }
    }

    println!("\n{}", "Done.".green().bold());
    0
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
