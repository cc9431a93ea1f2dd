//! Batch driver: gathers input files, plans them in parallel, commits the
//! plans and collects a per-file report. One bad file never stops the batch.

use log::{debug, warn};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use crate::commit;
use crate::error::{ErrorKind, FormatError};
use crate::grammar::TARGET_EXTENSION;
use crate::pipeline::{Formatter, Plan};
use crate::progress::{create_spinner, PhaseProgress};
use crate::tags::TagWriter;

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Move formatted files here instead of renaming in place.
    pub target_dir: Option<PathBuf>,
    /// Plan only; touch nothing.
    pub dry_run: bool,
}

/// What happened to one input file.
#[derive(Debug)]
pub enum Outcome {
    /// Tags written and file renamed or moved.
    Renamed(Plan),
    /// Name was already canonical; tags written.
    Unchanged(Plan),
    /// Dry run: what would have been done.
    Planned(Plan),
    Failed(FormatError),
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<Outcome>,
}

impl BatchReport {
    pub fn renamed(&self) -> impl Iterator<Item = &Plan> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Renamed(plan) => Some(plan),
            _ => None,
        })
    }

    pub fn planned(&self) -> impl Iterator<Item = &Plan> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Planned(plan) => Some(plan),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &FormatError> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Failed(err) => Some(err),
            _ => None,
        })
    }

    pub fn unchanged_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Unchanged(_)))
            .count()
    }

    pub fn failure_counts(&self) -> FxHashMap<ErrorKind, usize> {
        let mut counts = FxHashMap::default();
        for err in self.failures() {
            *counts.entry(err.kind()).or_insert(0) += 1;
        }
        counts
    }
}

fn is_target_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(TARGET_EXTENSION))
}

/// Expands inputs into a list of files. Directories are listed one level
/// deep and only `.mp3` files are kept; plain file arguments are taken as-is.
pub fn collect_inputs(inputs: &[PathBuf]) -> (Vec<PathBuf>, Vec<FormatError>) {
    let spinner = create_spinner("Scanning inputs");
    let mut files = Vec::new();
    let mut errors = Vec::new();

    for input in inputs {
        if input.is_dir() {
            match std::fs::read_dir(input) {
                Ok(entries) => {
                    let mut found: Vec<PathBuf> = entries
                        .filter_map(|entry| entry.ok().map(|e| e.path()))
                        .filter(|path| is_target_file(path))
                        .collect();
                    found.sort();
                    debug!("{}: {} files", input.display(), found.len());
                    files.extend(found);
                }
                Err(source) => errors.push(FormatError::Io {
                    path: input.clone(),
                    source,
                }),
            }
        } else if input.exists() {
            files.push(input.clone());
        } else {
            errors.push(FormatError::Io {
                path: input.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
            });
        }
    }

    spinner.finish_with_message(format!("Found {} files", files.len()));
    (files, errors)
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "formatting panicked".to_string()
    }
}

/// Plans every file in parallel. Output order matches input order.
pub fn plan_all(
    formatter: Formatter<'_>,
    files: &[PathBuf],
    target_dir: Option<&Path>,
) -> Vec<Result<Plan, FormatError>> {
    plan_each(files, |path| formatter.plan(path, target_dir))
}

/// Runs `planner` over every file on the rayon pool. A panic while planning
/// one file becomes that file's `Unknown` error.
fn plan_each<F>(files: &[PathBuf], planner: F) -> Vec<Result<Plan, FormatError>>
where
    F: Fn(&Path) -> Result<Plan, FormatError> + Sync,
{
    let progress = PhaseProgress::new("Planning", files.len() as u64);

    let plans: Vec<Result<Plan, FormatError>> = files
        .par_iter()
        .map(|path| {
            let result = panic::catch_unwind(AssertUnwindSafe(|| planner(path)))
                .unwrap_or_else(|payload| {
                    Err(FormatError::Unknown {
                        path: path.clone(),
                        message: panic_message(payload),
                    })
                });
            progress.tick();
            result
        })
        .collect();

    let ok = plans.iter().filter(|p| p.is_ok()).count();
    progress.finish(format!("Planned {} of {} files", ok, files.len()));
    plans
}

/// Rejects every plan whose destination was already claimed by an earlier
/// plan in the same batch.
pub fn claim_destinations(plans: Vec<Result<Plan, FormatError>>) -> Vec<Result<Plan, FormatError>> {
    let mut claimed: FxHashSet<PathBuf> = FxHashSet::default();
    plans
        .into_iter()
        .map(|result| {
            let plan = result?;
            if claimed.insert(plan.destination.clone()) {
                Ok(plan)
            } else {
                Err(FormatError::DestinationExists {
                    path: plan.source,
                    destination: plan.destination,
                })
            }
        })
        .collect()
}

/// Commits plans one at a time, in order. Failed plans are passed through
/// untouched.
fn commit_all(plans: Vec<Result<Plan, FormatError>>, writer: &dyn TagWriter) -> Vec<Outcome> {
    let total = plans.len();
    let progress = PhaseProgress::new("Committing", total as u64);
    let outcomes = plans
        .into_iter()
        .map(|result| {
            let outcome = match result.and_then(|plan| commit::commit(&plan, writer).map(|()| plan)) {
                Ok(plan) if plan.is_rename() => Outcome::Renamed(plan),
                Ok(plan) => Outcome::Unchanged(plan),
                Err(err) => Outcome::Failed(err),
            };
            progress.tick();
            outcome
        })
        .collect();
    progress.finish(format!("Processed {} files", total));
    outcomes
}

/// Runs the whole batch: scan, plan, de-duplicate, commit.
pub fn run(
    formatter: Formatter<'_>,
    inputs: &[PathBuf],
    options: &BatchOptions,
    writer: &dyn TagWriter,
) -> BatchReport {
    let (files, scan_errors) = collect_inputs(inputs);
    let mut report = BatchReport::default();
    report
        .outcomes
        .extend(scan_errors.into_iter().map(Outcome::Failed));

    let plans = claim_destinations(plan_all(formatter, &files, options.target_dir.as_deref()));

    if options.dry_run {
        report.outcomes.extend(plans.into_iter().map(|result| match result {
            Ok(plan) => Outcome::Planned(plan),
            Err(err) => Outcome::Failed(err),
        }));
    } else {
        report.outcomes.extend(commit_all(plans, writer));
    }

    for err in report.failures() {
        warn!("{} ({})", err, err.kind());
    }
    report
}
