//! # Dotplot Library
//!
//! Builds comparison matrices between two symbol sequences and benchmarks
//! three ways of doing it.
//!
//! ## Features
//!
//! - **Sequential**: a single-threaded row-by-row reference build
//! - **Shared memory**: one task per row on a fixed-size worker pool
//! - **Distributed**: contiguous row chunks on isolated participants that
//!   only talk through messages, gathered on a coordinator
//! - **Analysis**: speedup and efficiency over a processor-count series
//! - **Diagonal filter**: binary mask of runs parallel to the main diagonal
//!
//! Every executor produces a bit-identical matrix for the same inputs.
//!
//! ## Basic Usage
//!
//! ```rust
//! use dotplot::Sequence;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let primary = Sequence::from("ACGT");
//! let secondary = Sequence::from("AGCT");
//!
//! let reference = dotplot::sequential(&primary, &secondary);
//! assert_eq!(reference.row(0), &[2, 0, 0, 0]);
//!
//! assert_eq!(dotplot::shared_memory(&primary, &secondary, 4)?, reference);
//! assert_eq!(dotplot::distributed(&primary, &secondary, 3)?, reference);
//! # Ok(())
//! # }
//! ```
//!
//! ## Benchmarking
//!
//! ```rust,no_run
//! use dotplot::{Benchmark, BenchmarkConfig, Sequence};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let primary = Sequence::from_fasta("a.fasta")?.truncated(10_000);
//! let secondary = Sequence::from_fasta("b.fasta")?.truncated(10_000);
//!
//! let mut bench = Benchmark::new(BenchmarkConfig::default(), primary, secondary);
//! let outcome = bench.run_shared_memory()?;
//! for line in outcome.lines.lines() {
//!     println!("{line}");
//! }
//! # Ok(())
//! # }
//! ```

// Re-export core types that users might need
pub use crate::core::analysis::{efficiency, speedup, PerformanceReport, PerformanceSample};
pub use crate::core::bench::{Benchmark, BenchmarkConfig, Strategy, StrategyOutcome};
pub use crate::core::distributed::{
    chunk_range, distributed_dotplot, partition, run_distributed, ChannelCommunicator,
    Communicator, World,
};
pub use crate::core::error::{Error, Result};
pub use crate::core::filter::{DiagonalFilter, DiagonalMask};
pub use crate::core::matrix::{cell, ComparisonMatrix};
pub use crate::core::options::{BuildOptions, ProgressCallback};
pub use crate::core::report::ReportLog;
pub use crate::core::sequence::Sequence;
pub use crate::core::shared::shared_memory_dotplot;
pub use crate::core::sequential::sequential_dotplot;

pub mod core;

/// Build the matrix on the calling thread
pub fn sequential(primary: &Sequence, secondary: &Sequence) -> ComparisonMatrix {
    sequential_dotplot(primary, secondary, &BuildOptions::default())
}

/// Build the matrix on a pool of `workers` threads
///
/// # Examples
/// ```rust
/// use dotplot::Sequence;
///
/// let a = Sequence::from("GATTACA");
/// let m = dotplot::shared_memory(&a, &a, 2).unwrap();
/// assert_eq!(m.shape(), (7, 7));
/// assert!(dotplot::shared_memory(&a, &a, 0).is_err());
/// ```
pub fn shared_memory(
    primary: &Sequence,
    secondary: &Sequence,
    workers: usize,
) -> Result<ComparisonMatrix> {
    shared_memory_dotplot(primary, secondary, &BuildOptions::with_workers(workers))
}

/// Build the matrix across `participants` message-passing ranks
pub fn distributed(
    primary: &Sequence,
    secondary: &Sequence,
    participants: usize,
) -> Result<ComparisonMatrix> {
    run_distributed(primary, secondary, participants, &BuildOptions::default())
}

/// Run the default diagonal filter over `matrix`
///
/// # Examples
/// ```rust
/// use dotplot::Sequence;
///
/// let a = Sequence::from("ACGTTGCAACGT");
/// let mask = dotplot::diagonal_mask(&dotplot::sequential(&a, &a));
/// assert_eq!(mask.shape(), (12, 12));
/// assert!(mask.cells().iter().all(|&c| c == 0 || c == 255));
/// ```
pub fn diagonal_mask(matrix: &ComparisonMatrix) -> DiagonalMask {
    DiagonalFilter::default().apply(matrix)
}
