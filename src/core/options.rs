//! Options shared by the matrix executors

use std::sync::Arc;

/// Progress callback receiving `(rows_done, rows_total)`
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Options for matrix construction
#[derive(Clone)]
pub struct BuildOptions {
    /// Optional progress callback
    pub progress: Option<ProgressCallback>,

    /// Worker count for the shared-memory pool
    pub workers: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            progress: None,
            workers: num_cpus::get(),
        }
    }
}

impl BuildOptions {
    /// Default options with an explicit worker count
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Default::default()
        }
    }

    pub(crate) fn report(&self, done: u64, total: u64) {
        if let Some(ref progress) = self.progress {
            progress(done, total);
        }
    }
}

impl std::fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildOptions")
            .field("progress", &self.progress.is_some())
            .field("workers", &self.workers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_default_workers_is_cpu_count() {
        assert_eq!(BuildOptions::default().workers, num_cpus::get());
        assert_eq!(BuildOptions::with_workers(3).workers, 3);
    }

    #[test]
    fn test_report_invokes_callback() {
        let seen = Arc::new(AtomicU64::new(0));
        let seen_clone = Arc::clone(&seen);
        let options = BuildOptions {
            progress: Some(Arc::new(move |done, _total| {
                seen_clone.store(done, Ordering::SeqCst);
            })),
            ..Default::default()
        };
        options.report(7, 10);
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }
}
