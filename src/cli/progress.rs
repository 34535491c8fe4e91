//! CLI-specific progress handling for dotplot-bench
//!
//! One bar is reused across every run of a benchmark; it restarts whenever a
//! new build reports its first row.

use std::sync::Arc;

use dotplot::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} rows ({percent}%) ETA: {eta}";

/// Creates a row-counting progress bar for CLI display
pub fn create_progress_bar(total_rows: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_rows);
    let style = ProgressStyle::default_bar()
        .template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Progress manager shared by all benchmark runs
pub struct ProgressManager {
    pub pb: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_rows: u64, message: &str) -> Self {
        let pb = create_progress_bar(total_rows);

        // Print initial message to stderr
        eprintln!("{message}");

        Self { pb }
    }

    /// Callback for the executors, `(rows_done, rows_total)`
    pub fn callback(&self) -> ProgressCallback {
        let pb = self.pb.clone();
        Arc::new(move |done, total| {
            if done <= 1 {
                pb.reset();
            }
            if pb.length().unwrap_or(0) != total {
                pb.set_length(total);
            }
            pb.set_position(done);
            if done >= total {
                pb.finish();
            }
        })
    }
}
