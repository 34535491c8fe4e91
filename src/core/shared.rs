//! Shared-memory worker-pool matrix construction
//!
//! One task per row is submitted to a fixed-size `rayon` pool. Workers send
//! `(row, cells)` back over a channel in whatever order they finish; the
//! caller drops each result into its indexed slot and stacks the slots once
//! every row has arrived.
//!
//! Inputs are shared read-only and every worker owns its output row, so no
//! locking is involved. A worker that dies leaves an empty slot, which fails
//! the whole build with [`Error::WorkerFailed`] instead of returning a partial
//! matrix.

use std::sync::Arc;

use crossbeam_channel::unbounded;
use log::{debug, error};

use crate::core::error::{Error, Result};
use crate::core::matrix::{compute_row, ComparisonMatrix};
use crate::core::options::BuildOptions;
use crate::core::sequence::Sequence;

/// A single row of work
#[derive(Debug, Clone)]
pub struct RowTask {
    pub index: usize,
    pub primary: Arc<[u8]>,
    pub secondary: Arc<[u8]>,
}

impl RowTask {
    /// Compute this task's row against the whole secondary sequence
    pub fn run(&self) -> Vec<u8> {
        compute_row(self.index, &self.primary, &self.secondary)
    }
}

/// Build the matrix on a pool of `options.workers` threads
pub fn shared_memory_dotplot(
    primary: &Sequence,
    secondary: &Sequence,
    options: &BuildOptions,
) -> Result<ComparisonMatrix> {
    if options.workers == 0 {
        return Err(Error::InvalidInput(
            "shared-memory executor needs at least one worker".to_string(),
        ));
    }

    let (rows, cols) = (primary.len(), secondary.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .thread_name(|i| format!("dotplot-worker-{i}"))
        .panic_handler(|_| error!("A dot-plot worker panicked; its row will be missing"))
        .build()
        .map_err(|e| Error::WorkerFailed(format!("could not start worker pool: {e}")))?;

    debug!("Submitting {rows} row tasks to {} workers", options.workers);

    let primary: Arc<[u8]> = Arc::from(primary.as_bytes());
    let secondary: Arc<[u8]> = Arc::from(secondary.as_bytes());
    let (tx, rx) = unbounded::<(usize, Vec<u8>)>();

    for index in 0..rows {
        let task = RowTask {
            index,
            primary: Arc::clone(&primary),
            secondary: Arc::clone(&secondary),
        };
        let tx = tx.clone();
        pool.spawn(move || {
            let row = task.run();
            // Receiver only goes away if the caller bailed out already
            let _ = tx.send((task.index, row));
        });
    }
    drop(tx);

    let mut done = 0u64;
    let results = rx.iter().inspect(|_| {
        done += 1;
        options.report(done, rows as u64);
    });

    reassemble(rows, cols, results)
}

/// Place out-of-order row results into their slots and stack them
pub fn reassemble<I>(rows: usize, cols: usize, results: I) -> Result<ComparisonMatrix>
where
    I: IntoIterator<Item = (usize, Vec<u8>)>,
{
    let mut slots: Vec<Option<Vec<u8>>> = vec![None; rows];

    for (index, row) in results {
        let slot = slots.get_mut(index).ok_or_else(|| {
            Error::WorkerFailed(format!("worker returned unknown row {index}"))
        })?;
        if row.len() != cols {
            return Err(Error::WorkerFailed(format!(
                "row {index} has {} cells, expected {cols}",
                row.len()
            )));
        }
        *slot = Some(row);
    }

    let mut cells = Vec::with_capacity(rows * cols);
    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(row) => cells.extend_from_slice(&row),
            None => {
                return Err(Error::WorkerFailed(format!(
                    "row {index} was never delivered"
                )))
            }
        }
    }

    Ok(ComparisonMatrix::from_raw(rows, cols, cells))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sequential::sequential_dotplot;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_matches_sequential_for_worker_counts() {
        let a = Sequence::from("GATTACAGATTACACCGGTTAACG");
        let b = Sequence::from("TTACAGGATCCAGATTAC");
        let expected = sequential_dotplot(&a, &b, &BuildOptions::default());

        for workers in [1, 2, 3, 4, 8, 16] {
            let m = shared_memory_dotplot(&a, &b, &BuildOptions::with_workers(workers)).unwrap();
            assert_eq!(m, expected, "divergence with {workers} workers");
        }
    }

    #[test]
    fn test_reference_example() {
        let m = shared_memory_dotplot(
            &Sequence::from("ACGT"),
            &Sequence::from("AGCT"),
            &BuildOptions::with_workers(2),
        )
        .unwrap();
        assert_eq!(
            m.cells(),
            &[2, 0, 0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 0, 0, 0, 2]
        );
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = shared_memory_dotplot(
            &Sequence::from("A"),
            &Sequence::from("A"),
            &BuildOptions::with_workers(0),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_empty_inputs() {
        let m = shared_memory_dotplot(
            &Sequence::from(""),
            &Sequence::from("ACGT"),
            &BuildOptions::with_workers(4),
        )
        .unwrap();
        assert_eq!(m.shape(), (0, 4));

        let m = shared_memory_dotplot(
            &Sequence::from("ACG"),
            &Sequence::from(""),
            &BuildOptions::with_workers(4),
        )
        .unwrap();
        assert_eq!(m.shape(), (3, 0));
    }

    #[test]
    fn test_reassemble_out_of_order() {
        let results = vec![(2, vec![0, 2]), (0, vec![2, 0]), (1, vec![1, 1])];
        let m = reassemble(3, 2, results).unwrap();
        assert_eq!(m.cells(), &[2, 0, 1, 1, 0, 2]);
    }

    #[test]
    fn test_reassemble_missing_row_fails() {
        let results = vec![(0, vec![2, 0]), (2, vec![0, 2])];
        match reassemble(3, 2, results) {
            Err(Error::WorkerFailed(msg)) => assert!(msg.contains("row 1")),
            other => panic!("Expected WorkerFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_reassemble_unknown_row_fails() {
        let results = vec![(5, vec![0, 0])];
        assert!(matches!(reassemble(1, 2, results), Err(Error::WorkerFailed(_))));
    }

    #[test]
    fn test_progress_reaches_total() {
        let last = Arc::new(AtomicU64::new(0));
        let last_clone = Arc::clone(&last);
        let options = BuildOptions {
            progress: Some(Arc::new(move |done, total| {
                assert!(done <= total);
                last_clone.store(done, Ordering::SeqCst);
            })),
            workers: 3,
        };
        shared_memory_dotplot(&Sequence::from("ACGTACGTAC"), &Sequence::from("CGTA"), &options)
            .unwrap();
        assert_eq!(last.load(Ordering::SeqCst), 10);
    }
}
