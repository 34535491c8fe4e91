//! Single-threaded matrix construction
//!
//! The correctness and performance baseline for the parallel executors.

use log::debug;

use crate::core::matrix::{fill_row, ComparisonMatrix, MISMATCH};
use crate::core::options::BuildOptions;
use crate::core::sequence::Sequence;

/// Build the full matrix row by row on the calling thread
pub fn sequential_dotplot(
    primary: &Sequence,
    secondary: &Sequence,
    options: &BuildOptions,
) -> ComparisonMatrix {
    let (rows, cols) = (primary.len(), secondary.len());
    let mut cells = vec![MISMATCH; rows * cols];

    if cols > 0 {
        for (i, row) in cells.chunks_exact_mut(cols).enumerate() {
            fill_row(i, primary.as_bytes(), secondary.as_bytes(), row);
            options.report(i as u64 + 1, rows as u64);
        }
    }

    debug!("Sequential dot-plot finished: {rows}x{cols}");
    ComparisonMatrix::from_raw(rows, cols, cells)
}
