//! Core library modules for dotplot
//!
//! Matrix rule and executors, analysis, filtering, output and the benchmark
//! driver that ties them together.

pub mod analysis;
pub mod bench;
pub mod distributed;
pub mod error;
pub mod filter;
pub mod matrix;
pub mod options;
pub mod render;
pub mod report;
pub mod sequence;
pub mod sequential;
pub mod shared;

// Re-export main types for internal use
pub use analysis::{PerformanceReport, PerformanceSample};
pub use bench::{Benchmark, BenchmarkConfig, Strategy, StrategyOutcome};
pub use distributed::{ChannelCommunicator, Communicator, World};
pub use filter::{DiagonalFilter, DiagonalMask};
pub use matrix::ComparisonMatrix;
pub use options::{BuildOptions, ProgressCallback};
pub use report::ReportLog;
pub use sequence::Sequence;
