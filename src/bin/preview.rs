//! Preview the canonical name and tag values for raw file names.
//! No file is read or written.
//! Usage: mp3-preview "swerve x amon - My Song.mp3" ...

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use mp3_normalize::pipeline::Formatter;
use mp3_normalize::rules::{RuleSet, RuleTables};

#[derive(Parser)]
#[command(name = "mp3-preview")]
#[command(about = "Show how file names would be formatted, without touching files")]
struct Args {
    /// Bare file names (not paths)
    names: Vec<String>,

    /// JSON rules file; omitted tables use the built-in rules
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Print the effective rule tables as JSON and exit
    #[arg(long)]
    dump_rules: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    colog::init();

    let tables = match &args.rules {
        Some(path) => RuleTables::from_path(path)
            .with_context(|| format!("Failed to load rules from {}", path.display()))?,
        None => RuleTables::builtin(),
    };

    if args.dump_rules {
        println!("{}", tables.to_json_pretty()?);
        return Ok(());
    }

    let rules = RuleSet::compile(&tables).context("Invalid rule tables")?;
    let formatter = Formatter::new(&rules);

    for name in &args.names {
        println!("{}", name);
        match formatter
            .format_filename(name)
            .and_then(|canonical| formatter.tags_for(&canonical).map(|tags| (canonical, tags)))
        {
            Ok((canonical, tags)) => {
                println!("  -> {}", canonical);
                println!("     artist: {}", tags.artist);
                println!("     title:  {}", tags.title);
            }
            Err(err) => println!("  !! {}", err),
        }
    }

    Ok(())
}
