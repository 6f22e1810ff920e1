//! Run summary counters and their console rendering

use crate::storage::PersistWarning;
use chrono::{DateTime, SecondsFormat, Utc};

/// Counters collected over one harvest run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Seeds processed after sitemap expansion
    pub seeds: usize,

    /// URLs accepted by the frontier and policy during this run
    pub fetched: usize,

    /// Page bodies written to the HTML directory
    pub html_saved: usize,

    /// Downloaded and direct files written to the files directory
    pub files_saved: usize,

    /// Seeds for which both the render stage and the fallback failed
    pub seeds_skipped: usize,

    /// Linked files whose download came back empty or failed
    pub file_errors: usize,

    /// Best-effort writes that did not succeed
    pub warnings: Vec<PersistWarning>,
}

impl RunSummary {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Wall-clock duration of the run in whole seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds().max(0)
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &RunSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Started:  {}", timestamp(&summary.started_at));
    println!("Finished: {}", timestamp(&summary.finished_at));
    println!("Duration: {}s", summary.duration_seconds());
    println!();

    println!("Seeds: {}", summary.seeds);
    println!("  Skipped (render and fallback failed): {}", summary.seeds_skipped);
    println!();

    println!("Fetched: {}", summary.fetched);
    println!("  HTML saved: {}", summary.html_saved);
    println!("  Files saved: {}", summary.files_saved);
    println!("  File errors: {}", summary.file_errors);

    if summary.has_warnings() {
        println!();
        println!("Persistence Warnings ({}):", summary.warnings.len());
        for warning in &summary.warnings {
            println!("  - {}", warning);
        }
    }
}
