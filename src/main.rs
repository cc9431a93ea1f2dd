//! Batch formatter for downloaded MP3 files.
//! Renames each file to `Artist1, Artist2_-_Title.mp3` and writes matching tags.
//! Usage: mp3-normalize ~/Downloads/music [--target-dir ~/Music] [--dry-run]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

use mp3_normalize::batch::{self, BatchOptions, BatchReport};
use mp3_normalize::error::ErrorKind;
use mp3_normalize::pipeline::Formatter;
use mp3_normalize::progress::{format_duration, set_log_only};
use mp3_normalize::rules::{RuleSet, BUILTIN_RULES};
use mp3_normalize::tags::Id3TagWriter;

#[derive(Parser)]
#[command(name = "mp3-normalize")]
#[command(about = "Rename downloaded MP3 files to `Artist1, Artist2_-_Title.mp3` and sync their artist/title tags")]
struct Args {
    /// Files or directories (directories are scanned one level deep)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Move formatted files into this directory
    #[arg(long)]
    target_dir: Option<PathBuf>,

    /// JSON rules file; omitted tables use the built-in rules
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Show what would change without touching any file
    #[arg(long)]
    dry_run: bool,

    #[arg(long, default_value = "0")]
    workers: usize,

    /// Hide progress bars and print periodic log lines instead
    #[arg(long)]
    log_only: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let mut builder = colog::default_builder();
    builder.filter(
        None,
        if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        },
    );
    builder.init();
}

fn print_report(report: &BatchReport, dry_run: bool) {
    if dry_run {
        println!("\nPlanned changes:");
        for plan in report.planned() {
            println!("  {} -> {}", plan.source.display(), plan.destination.display());
            println!("      artist: {}", plan.tags.artist);
            println!("      title:  {}", plan.tags.title);
        }
    } else {
        println!("\nModified tracks:");
        for plan in report.renamed() {
            println!("  {} -> {}", plan.source.display(), plan.destination.display());
        }
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!("\nFailed files:");
        for err in &failures {
            println!("  [{}] {}", err.kind(), err);
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    set_log_only(args.log_only);

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    if let Some(dir) = args.target_dir.as_ref().filter(|_| !args.dry_run) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create target directory {}", dir.display()))?;
    }

    let custom_rules = match &args.rules {
        Some(path) => Some(
            RuleSet::load(path).with_context(|| format!("Failed to load rules from {}", path.display()))?,
        ),
        None => None,
    };
    let rules: &RuleSet = custom_rules.as_ref().unwrap_or(&*BUILTIN_RULES);

    let start = Instant::now();
    let options = BatchOptions {
        target_dir: args.target_dir.clone(),
        dry_run: args.dry_run,
    };
    let report = batch::run(Formatter::new(rules), &args.inputs, &options, &Id3TagWriter);

    print_report(&report, args.dry_run);

    let counts = report.failure_counts();
    let count = |kind: ErrorKind| counts.get(&kind).copied().unwrap_or(0);

    println!("\n{:=<60}", "");
    println!("{}", if args.dry_run { "Dry run complete!" } else { "Formatting complete!" });
    if args.dry_run {
        println!("  Would rename: {}", report.planned().filter(|p| p.is_rename()).count());
    } else {
        println!("  Renamed: {}", report.renamed().count());
        println!("  Already canonical: {}", report.unchanged_count());
    }
    println!("  Format inconsistencies: {}", count(ErrorKind::FormatInconsistency));
    println!("  Corrupt files: {}", count(ErrorKind::CorruptFile));
    println!("  I/O failures: {}", count(ErrorKind::IoFailure));
    println!("  Unknown failures: {}", count(ErrorKind::UnknownFormattingFailure));
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");

    Ok(())
}
