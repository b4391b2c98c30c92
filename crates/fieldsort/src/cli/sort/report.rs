//! Progress bar and end-of-run summary table.

use std::time::Duration;

use fieldsort_core::{Code, IdentifiedBatch, RelocationMode, SortReport};
use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar for the identification pass.
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb.set_message("reading cards...");
    pb
}

/// Images per second, or zero for an instant run.
pub fn rate(images: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        images as f64 / secs
    } else {
        0.0
    }
}

/// Print a formatted summary table after the run.
pub fn print_summary(batch: &IdentifiedBatch, report: &SortReport, mode: RelocationMode) {
    let unassigned: usize = batch
        .groups
        .iter()
        .filter(|g| g.code == Code::Unknown)
        .map(|g| g.len())
        .sum();
    let relocated_label = match mode {
        RelocationMode::Copy => "Copied:",
        RelocationMode::Move => "Moved:",
        RelocationMode::DryRun => "Planned:",
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Specimens:    {:>8}", batch.coded_groups());
    eprintln!("    Photos:       {:>8}", report.images);
    if unassigned > 0 {
        eprintln!("    Before card:  {:>8}", unassigned);
    }
    if report.skipped > 0 {
        eprintln!("    Skipped:      {:>8}", report.skipped);
    }
    if !batch.capture_order.is_empty() {
        eprintln!("    Out of order: {:>8}", batch.capture_order.len());
    }
    eprintln!("  ------------------------------------");
    eprintln!("    {:<14}{:>8}", relocated_label, report.relocated);
    if report.summary_rows > 0 {
        eprintln!("    Summary rows: {:>8}", report.summary_rows);
    }
    eprintln!("    Duration:     {:>7.1}s", batch.elapsed.as_secs_f64());
    eprintln!(
        "    Rate:         {:>7.1} img/sec",
        rate(report.images + report.skipped, batch.elapsed)
    );
    eprintln!("  ====================================");
}
