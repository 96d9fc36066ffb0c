//! # CLI Module
//!
//! Command-line interface for the near-duplicate photo resolver.
//!
//! ## Usage
//! ```bash
//! # Report copies of the iCloud library found in an import folder
//! ssim-dedup scan --keep ~/Pictures/iCloud --delete ~/Pictures/Imports
//!
//! # Move duplicates aside instead of only reporting them
//! ssim-dedup scan --keep ~/Pictures/iCloud --delete ~/Pictures/Imports --action rename
//!
//! # Settings from a file, machine-readable output
//! ssim-dedup scan --config dedup.json --output tsv
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use ssim_dedup::core::pipeline::{Pipeline, PipelineResult};
use ssim_dedup::core::reporter::{write_report, ExportFormat, Report};
use ssim_dedup::core::resolver::DuplicateAction;
use ssim_dedup::error::{DedupError, Result};
use ssim_dedup::events::{
    CompareEvent, Event, EventChannel, ExtractEvent, PipelineEvent, ScanEvent,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;

/// Threshold used when neither the command line nor the config file sets one
const DEFAULT_THRESHOLD: f64 = 0.94;

/// ssim-dedup - Find near-duplicate photos and keep the best copy
#[derive(Parser, Debug)]
#[command(name = "ssim-dedup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare photos and resolve duplicates
    Scan(ScanArgs),
}

#[derive(clap::Args, Debug)]
struct ScanArgs {
    /// Folders whose photos are always kept
    #[arg(short, long = "keep", value_name = "DIR")]
    keep: Vec<PathBuf>,

    /// Folders whose photos may be removed
    #[arg(short, long = "delete", value_name = "DIR")]
    delete: Vec<PathBuf>,

    /// Minimum similarity score (0.0-1.0, 1.0 = identical) [default: 0.94]
    #[arg(short, long)]
    threshold: Option<f64>,

    /// What to do with the losing file of each pair [default: noop]
    #[arg(short, long)]
    action: Option<Action>,

    /// File extension to include; repeat for several [default: jpg, jpeg]
    #[arg(short, long = "extension", value_name = "EXT")]
    extensions: Vec<String>,

    /// Include hidden files
    #[arg(long)]
    include_hidden: bool,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,

    /// JSON file with default settings; flags override it
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Action {
    /// Only report what would happen
    Noop,
    /// Delete the losing file
    Delete,
    /// Move the losing file next to the kept one as "<name> delete (<n>)<ext>"
    Rename,
}

impl From<Action> for DuplicateAction {
    fn from(action: Action) -> Self {
        match action {
            Action::Noop => DuplicateAction::Noop,
            Action::Delete => DuplicateAction::Delete,
            Action::Rename => DuplicateAction::Rename,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// keep/delete/ssim/rule rows for scripting
    Tsv,
    /// Full JSON report
    Json,
}

impl OutputFormat {
    /// Machine-readable format written to stdout, if any
    fn export_format(self) -> Option<ExportFormat> {
        match self {
            OutputFormat::Pretty => None,
            OutputFormat::Tsv => Some(ExportFormat::Tsv),
            OutputFormat::Json => Some(ExportFormat::Json),
        }
    }
}

/// Settings read from `--config`
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    keep: Vec<PathBuf>,
    delete: Vec<PathBuf>,
    threshold: Option<f64>,
    action: Option<DuplicateAction>,
    extensions: Vec<String>,
    include_hidden: Option<bool>,
    rgb_tolerance: Option<f64>,
}

impl ConfigFile {
    fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            DedupError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| DedupError::Config(format!("invalid config {}: {}", path.display(), e)))
    }
}

/// Command-line flags merged over the config file
#[derive(Debug)]
struct Settings {
    keep: Vec<PathBuf>,
    delete: Vec<PathBuf>,
    threshold: f64,
    action: DuplicateAction,
    extensions: Vec<String>,
    include_hidden: bool,
    rgb_tolerance: Option<f64>,
}

impl Settings {
    fn merge(args: &ScanArgs, file: ConfigFile) -> Result<Self> {
        let pick = |flag: &Vec<PathBuf>, file: Vec<PathBuf>| {
            if flag.is_empty() {
                file
            } else {
                flag.clone()
            }
        };

        let settings = Self {
            keep: pick(&args.keep, file.keep),
            delete: pick(&args.delete, file.delete),
            threshold: args.threshold.or(file.threshold).unwrap_or(DEFAULT_THRESHOLD),
            action: args.action.map(Into::into).or(file.action).unwrap_or_default(),
            extensions: if args.extensions.is_empty() {
                file.extensions
            } else {
                args.extensions.clone()
            },
            include_hidden: args.include_hidden || file.include_hidden.unwrap_or(false),
            rgb_tolerance: file.rgb_tolerance,
        };

        if settings.delete.is_empty() {
            return Err(DedupError::Config(
                "at least one --delete folder is required".to_string(),
            ));
        }

        Ok(settings)
    }
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => run_scan(args),
    }
}

fn run_scan(args: ScanArgs) -> Result<()> {
    let default_level = match (args.verbose, args.output) {
        (true, _) => "debug",
        (false, OutputFormat::Pretty) => "warn",
        (false, _) => "info",
    };
    ssim_dedup::init_tracing(default_level);

    let file = match &args.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    let settings = Settings::merge(&args, file)?;

    let term = Term::stderr();
    let pretty = matches!(args.output, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("ssim-dedup").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let mut builder = Pipeline::builder()
        .keep_paths(settings.keep.clone())
        .delete_paths(settings.delete.clone())
        .threshold(settings.threshold)
        .action(settings.action)
        .include_hidden(settings.include_hidden);
    if !settings.extensions.is_empty() {
        builder = builder.extensions(settings.extensions.clone());
    }
    if let Some(tolerance) = settings.rgb_tolerance {
        builder = builder.rgb_tolerance(tolerance);
    }
    let pipeline = builder.build();

    // Set up event handling
    let (sender, receiver) = EventChannel::new();

    let progress = if pretty {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .map(|s| s.progress_chars("█▓░"))
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let verbose = args.verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        let Some(pb) = progress_clone else {
            // Drain so senders never block
            for _ in receiver.iter() {}
            return;
        };

        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(format!("{}", phase));
                }
                Event::Scan(ScanEvent::Progress(p)) => {
                    pb.set_message(format!("Scanning ({} photos)", p.photos_found));
                }
                Event::Extract(ExtractEvent::Started { total_photos }) => {
                    pb.set_length(total_photos as u64);
                    pb.set_position(0);
                }
                Event::Extract(ExtractEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(
                            p.current_path
                                .file_name()
                                .unwrap_or_default()
                                .to_string_lossy()
                                .into_owned(),
                        );
                    }
                }
                Event::Compare(CompareEvent::Started { total_comparisons }) => {
                    pb.set_length(total_comparisons as u64);
                    pb.set_position(0);
                }
                Event::Compare(CompareEvent::Progress(p)) => {
                    pb.set_position(p.comparisons_completed as u64);
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Pipeline(PipelineEvent::Error { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    // Run the pipeline
    let result = pipeline.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let result = result?;
    let report = Report::new(&result, settings.threshold, settings.action);

    match args.output.export_format() {
        None => print_pretty_results(&term, &result, &report, verbose),
        Some(format) => {
            write_report(&report, format, io::stdout().lock())?;
            // TSV has no room for the folder summary
            if format == ExportFormat::Tsv {
                print_folder_summary(&term, &report);
            }
        }
    }

    Ok(())
}

fn print_pretty_results(term: &Term, result: &PipelineResult, report: &Report, verbose: bool) {
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    // Summary
    term.write_line(&format!(
        "  {} photos kept as reference, {} candidates, scanned in {:.1}s",
        style(result.authoritative_photos).cyan(),
        style(result.disposable_photos).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();

    term.write_line(&format!(
        "  {} pairs compared, {} at or above {}",
        style(result.total_comparisons).cyan(),
        style(result.matched_pairs).cyan(),
        report.threshold
    ))
    .ok();

    let skipped = result.skipped;
    if skipped.total() > 0 {
        term.write_line(&format!(
            "  {} pairs skipped ({} color, {} missing, {} already resolved, {} both kept)",
            style(skipped.total()).dim(),
            skipped.color_mismatch,
            skipped.missing,
            skipped.already_resolved,
            skipped.both_authoritative
        ))
        .ok();
    }

    if !result.errors.is_empty() {
        term.write_line(&format!(
            "  {} files or folders could not be read",
            style(result.errors.len()).yellow()
        ))
        .ok();
        if verbose {
            for error in &result.errors {
                term.write_line(&format!("    {}", style(error).dim())).ok();
            }
        }
    }

    term.write_line("").ok();

    if report.resolutions.is_empty() {
        term.write_line(&format!("  {}", report.summary())).ok();
    } else {
        term.write_line(&format!("{}", style(report.summary()).bold().underlined()))
            .ok();
        term.write_line("").ok();

        for resolution in &report.resolutions {
            term.write_line(&format!(
                "  {} {}",
                style(format!("{:.4}", resolution.score)).yellow(),
                style(format!("[{}]", resolution.rule)).dim()
            ))
            .ok();
            term.write_line(&format!(
                "    {} {}",
                style("★").green(),
                display_path(&resolution.keep)
            ))
            .ok();
            term.write_line(&format!(
                "    {} {}",
                style("○").dim(),
                display_path(&resolution.delete)
            ))
            .ok();
        }
        term.write_line("").ok();
    }

    print_folder_summary(term, report);

    // Footer
    let footer = match report.action {
        DuplicateAction::Noop => {
            "No files were changed. Re-run with --action delete or --action rename to act."
        }
        DuplicateAction::Delete => "Duplicates marked ○ were deleted.",
        DuplicateAction::Rename => "Duplicates marked ○ were moved next to the kept photo.",
    };
    term.write_line(&format!("{}", style(footer).dim())).ok();
}

fn print_folder_summary(term: &Term, report: &Report) {
    if report.folders.is_empty() {
        return;
    }

    term.write_line(&format!("{}", style("Kept per folder:").bold()))
        .ok();
    for summary in &report.folders {
        term.write_line(&format!(
            "  {:>6}  {}",
            style(summary.kept).cyan(),
            display_path(&summary.folder)
        ))
        .ok();
    }
    term.write_line("").ok();
}

/// Path with the home directory shortened to `~`
fn display_path(path: &Path) -> String {
    dirs::home_dir()
        .and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf))
        .map(|relative| format!("~/{}", relative.display()))
        .unwrap_or_else(|| path.display().to_string())
}
