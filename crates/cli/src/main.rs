//! CLI tool for annotating rendered slide decks with inner reveal steps.

mod watch;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use reveal_core::{AnnotationReport, AssetKind, ProjectConfig, StepRevealAnnotator};
use reveal_html::{HtmlParser, HtmlSerializer};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;
use watch::{PathFilter, Watcher};

/// Mark list items in data-reveal steps so they are revealed one by one.
#[derive(Parser, Debug)]
#[command(name = "step-reveal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Annotate HTML files or directories of HTML files
    Annotate(AnnotateArgs),
    /// Re-annotate HTML files whenever they change
    Watch(WatchArgs),
    /// Print the project's asset directory layout
    Layout(LayoutArgs),
}

#[derive(Args, Debug)]
struct AnnotateArgs {
    /// Input HTML file(s) or directories
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output directory (default: rewrite inputs in place)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print annotated HTML to stdout instead of writing files
    #[arg(short, long, conflicts_with_all = ["output", "json"])]
    print: bool,

    /// Print a JSON report of what was annotated
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct WatchArgs {
    /// Paths to watch (default: [watch] paths, then the slides output directory)
    paths: Vec<PathBuf>,

    /// Only files whose path matches this regular expression trigger
    #[arg(short, long, conflicts_with = "pattern")]
    regex: Option<String>,

    /// Only files whose path matches this shell pattern trigger
    #[arg(short, long)]
    pattern: Option<String>,

    /// Polling interval in milliseconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Project configuration file (default: ./step-reveal.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct LayoutArgs {
    /// Project configuration file (default: ./step-reveal.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Project root the directories are relative to
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Print the layout as JSON
    #[arg(long)]
    json: bool,
}

/// Outcome of annotating one file.
#[derive(Debug, Serialize)]
struct FileReport {
    path: PathBuf,
    #[serde(flatten)]
    annotation: AnnotationReport,
    written: bool,
}

/// An input file and the path it maps to under an output directory.
#[derive(Debug, PartialEq)]
struct Input {
    path: PathBuf,
    relative: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match cli.command {
        Command::Annotate(args) => run_annotate(&args),
        Command::Watch(args) => run_watch(&args),
        Command::Layout(args) => run_layout(&args),
    }
}

fn run_annotate(args: &AnnotateArgs) -> Result<()> {
    let inputs = collect_inputs(&args.input)?;
    if let Some(dir) = &args.output {
        check_distinct_targets(&inputs, dir)?;
    }

    let mut reports = Vec::new();
    let mut failures = 0;

    for input in &inputs {
        log::info!("Processing: {}", input.path.display());

        match process_input(input, args) {
            Ok(report) => {
                log::info!(
                    "  {} steps, {} items matched, {} labeled{}",
                    report.annotation.steps,
                    report.annotation.matched,
                    report.annotation.added,
                    if report.written { "" } else { " (unchanged)" }
                );
                reports.push(report);
            }
            Err(e) => {
                eprintln!("Error processing {}: {:#}", input.path.display(), e);
                failures += 1;
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    if failures > 0 {
        anyhow::bail!("{} of {} files failed", failures, inputs.len());
    }
    Ok(())
}

/// Annotate one input and deliver the result where the arguments say.
fn process_input(input: &Input, args: &AnnotateArgs) -> Result<FileReport> {
    let (html, annotation) = annotate_file(&input.path)?;

    let written = if args.print {
        print!("{}", html);
        false
    } else {
        let target = match &args.output {
            Some(dir) => dir.join(&input.relative),
            None => input.path.clone(),
        };
        write_if_changed(&target, &html)?
    };

    Ok(FileReport {
        path: input.path.clone(),
        annotation,
        written,
    })
}

/// Refuse to run when two inputs would be written to the same output file.
fn check_distinct_targets(inputs: &[Input], output: &Path) -> Result<()> {
    let mut seen: HashMap<&Path, &Path> = HashMap::new();
    for input in inputs {
        if let Some(first) = seen.insert(&input.relative, &input.path) {
            anyhow::bail!(
                "{} and {} would both be written to {}",
                first.display(),
                input.path.display(),
                output.join(&input.relative).display()
            );
        }
    }
    Ok(())
}

fn run_watch(args: &WatchArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let paths = if !args.paths.is_empty() {
        args.paths.clone()
    } else if !config.watch.paths.is_empty() {
        config.watch.paths.clone()
    } else {
        vec![config.slides.output_dir.clone()]
    };

    let filter = match (&args.regex, &args.pattern) {
        (Some(expr), _) => PathFilter::from_regex(expr)?,
        (None, Some(pattern)) => PathFilter::from_pattern(pattern)?,
        (None, None) => match (&config.watch.regex, &config.watch.pattern) {
            (Some(expr), _) => PathFilter::from_regex(expr)?,
            (None, Some(pattern)) => PathFilter::from_pattern(pattern)?,
            (None, None) => PathFilter::any(),
        },
    };

    let interval = Duration::from_millis(args.interval.unwrap_or(config.watch.interval_ms).max(1));

    for path in &paths {
        if !path.exists() {
            log::warn!("Watch path does not exist yet: {}", path.display());
        }
    }
    eprintln!(
        "Watching {} for changes",
        paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut watcher = Watcher::new(paths, filter, interval);
    watcher.run(reannotate)
}

/// React to a changed file by re-annotating it in place.
fn reannotate(path: &Path) -> Result<bool> {
    if !is_html(path) {
        log::debug!("Skipping non-HTML file: {}", path.display());
        return Ok(false);
    }

    let (html, report) = annotate_file(path)?;
    let written = write_if_changed(path, &html)?;
    if written {
        eprintln!(
            "Annotated {}: {} items labeled",
            path.display(),
            report.added
        );
    }
    Ok(written)
}

fn run_layout(args: &LayoutArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let resolved = config.assets.resolve(&args.root);

    if args.json {
        #[derive(Serialize)]
        struct Layout<'a> {
            config: &'a ProjectConfig,
            resolved: Vec<(AssetKind, &'a Path)>,
        }

        let layout = Layout {
            config: &config,
            resolved: resolved.iter().map(|(k, p)| (*k, p.as_path())).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&layout)?);
        return Ok(());
    }

    for (kind, path) in &resolved {
        println!("{:<16} {}", kind.key(), path.display());
    }
    println!("{:<16} {}", "output_dir", args.root.join(&config.slides.output_dir).display());
    println!("{:<16} {}", "http_path", config.http_path);
    println!(
        "{:<16} {}",
        "image urls",
        config.asset_url(AssetKind::Images, "<file>")
    );

    Ok(())
}

/// Load the configuration named on the command line, or discover it in the
/// working directory.
fn load_config(path: Option<&Path>) -> Result<ProjectConfig> {
    match path {
        Some(path) => ProjectConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => ProjectConfig::discover(Path::new("."))
            .with_context(|| "Failed to load configuration from the working directory"),
    }
}

/// Expand the command line inputs into files. Directories contribute every
/// HTML file below them.
fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<Input>> {
    let mut inputs = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let file = entry.path();
                if !entry.file_type().is_file() || !is_html(file) {
                    continue;
                }
                let relative = file.strip_prefix(path).unwrap_or(file).to_path_buf();
                inputs.push(Input {
                    path: file.to_path_buf(),
                    relative,
                });
            }
        } else {
            let relative = path
                .file_name()
                .map(PathBuf::from)
                .with_context(|| format!("Not a file: {}", path.display()))?;
            inputs.push(Input {
                path: path.clone(),
                relative,
            });
        }
    }

    Ok(inputs)
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
        .unwrap_or(false)
}

/// Parse, annotate, and re-serialize a single HTML file.
fn annotate_file(path: &Path) -> Result<(String, AnnotationReport)> {
    let mut document = HtmlParser::new()
        .parse_file(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let report = StepRevealAnnotator::new().annotate_with_report(&mut document);
    Ok((HtmlSerializer::new().serialize(&document), report))
}

/// Write `content` to `path` unless the file already holds exactly that.
/// Returns whether the file was written.
fn write_if_changed(path: &Path, content: &str) -> Result<bool> {
    if let Ok(existing) = std::fs::read(path) {
        if existing == content.as_bytes() {
            return Ok(false);
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}
