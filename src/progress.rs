//! Progress reporting for batch runs.
//!
//! Each batch phase gets a [`PhaseProgress`]: an indicatif bar on a terminal,
//! or periodic `[phase] n/total` log lines in log-only mode.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::info;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Global flag for log-only mode (set from args in main)
static LOG_ONLY: AtomicBool = AtomicBool::new(false);

/// Files between two progress lines in log-only mode.
const LOG_INTERVAL: u64 = 500;

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// Format duration in human-readable format
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

/// Progress of one batch phase over a known number of files.
/// Safe to tick from rayon workers.
pub struct PhaseProgress {
    phase: &'static str,
    total: u64,
    done: AtomicU64,
    bar: ProgressBar,
}

impl PhaseProgress {
    pub fn new(phase: &'static str, total: u64) -> Self {
        let bar = ProgressBar::new(total);
        if is_log_only() {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        } else {
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, ETA: {eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
        }
        bar.set_message(phase);
        Self {
            phase,
            total,
            done: AtomicU64::new(0),
            bar,
        }
    }

    /// Marks one more file as handled.
    pub fn tick(&self) {
        self.bar.inc(1);
        let current = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if is_log_only() && (current % LOG_INTERVAL == 0 || current == self.total) {
            let pct = 100.0 * current as f64 / self.total as f64;
            info!("[{}] {}/{} ({:.1}%)", self.phase, current, self.total, pct);
        }
    }

    pub fn finish(&self, summary: String) {
        if is_log_only() {
            info!("[{}] {}", self.phase, summary);
        }
        self.bar.finish_with_message(summary);
    }
}

/// Spinner for work with no known length (e.g. listing input directories).
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{msg} {spinner} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
    }
    pb.set_message(msg.to_string());
    pb
}
