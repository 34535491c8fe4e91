//! Comparison matrix rule and storage
//!
//! Cell `(i, j)` compares `primary[i]` against `secondary[j]`:
//!
//! | condition                         | value |
//! |-----------------------------------|-------|
//! | symbols equal and `i == j`        | 2     |
//! | symbols equal and `i != j`        | 1     |
//! | symbols differ                    | 0     |
//!
//! `i` and `j` are always global matrix coordinates, never offsets inside a
//! chunk or task, so every executor produces bit-identical output.

use crate::core::error::{Error, Result};

/// Cell value for a match on the principal diagonal
pub const DIAGONAL_MATCH: u8 = 2;

/// Cell value for a match off the principal diagonal
pub const OFF_DIAGONAL_MATCH: u8 = 1;

/// Cell value for a mismatch
pub const MISMATCH: u8 = 0;

/// Compare `primary[i]` with `secondary[j]`
#[inline]
pub fn cell(i: usize, j: usize, primary: &[u8], secondary: &[u8]) -> u8 {
    if primary[i] != secondary[j] {
        MISMATCH
    } else if i == j {
        DIAGONAL_MATCH
    } else {
        OFF_DIAGONAL_MATCH
    }
}

/// Fill `out` with the full row `i`; `out.len()` must equal `secondary.len()`
#[inline]
pub fn fill_row(i: usize, primary: &[u8], secondary: &[u8], out: &mut [u8]) {
    debug_assert_eq!(out.len(), secondary.len());
    let symbol = primary[i];
    for (j, (slot, &other)) in out.iter_mut().zip(secondary).enumerate() {
        *slot = if symbol != other {
            MISMATCH
        } else if i == j {
            DIAGONAL_MATCH
        } else {
            OFF_DIAGONAL_MATCH
        };
    }
}

/// Compute row `i` as an owned vector
pub fn compute_row(i: usize, primary: &[u8], secondary: &[u8]) -> Vec<u8> {
    let mut row = vec![MISMATCH; secondary.len()];
    fill_row(i, primary, secondary, &mut row);
    row
}

/// Row-major N×M grid of cell values in {0, 1, 2}
///
/// Built once by exactly one executor, then read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
}

impl ComparisonMatrix {
    /// Wrap a row-major cell buffer
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<u8>) -> Result<Self> {
        if rows.checked_mul(cols) != Some(cells.len()) {
            return Err(Error::InvalidInput(format!(
                "{} cells cannot form a {rows}x{cols} matrix",
                cells.len()
            )));
        }
        Ok(Self { rows, cols, cells })
    }

    /// Buffer already sized `rows * cols` by the caller
    pub(crate) fn from_raw(rows: usize, cols: usize, cells: Vec<u8>) -> Self {
        debug_assert_eq!(rows * cols, cells.len());
        Self { rows, cols, cells }
    }

    /// Stack row vectors in order; every row must have `cols` cells
    pub fn from_rows(cols: usize, rows: Vec<Vec<u8>>) -> Result<Self> {
        let n = rows.len();
        let mut cells = Vec::with_capacity(n * cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(Error::InvalidInput(format!(
                    "row {i} has {} cells, expected {cols}",
                    row.len()
                )));
            }
            cells.extend_from_slice(&row);
        }
        Ok(Self {
            rows: n,
            cols,
            cells,
        })
    }

    /// Concatenate row blocks top to bottom
    pub fn vstack(cols: usize, blocks: Vec<ComparisonMatrix>) -> Result<Self> {
        let rows = blocks.iter().map(|b| b.rows).sum();
        let mut cells = Vec::with_capacity(rows * cols);
        for (idx, block) in blocks.into_iter().enumerate() {
            if block.cols != cols && block.rows > 0 {
                return Err(Error::InvalidInput(format!(
                    "block {idx} has {} columns, expected {cols}",
                    block.cols
                )));
            }
            cells.extend(block.cells);
        }
        Ok(Self { rows, cols, cells })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> u8 {
        self.cells[i * self.cols + j]
    }

    pub fn row(&self, i: usize) -> &[u8] {
        &self.cells[i * self.cols..(i + 1) * self.cols]
    }

    /// Row-major cell buffer
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Copy of the top-left `rows`×`cols` corner, clamped to the real shape
    pub fn crop(&self, rows: usize, cols: usize) -> ComparisonMatrix {
        let rows = rows.min(self.rows);
        let cols = cols.min(self.cols);
        let mut cells = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            cells.extend_from_slice(&self.row(i)[..cols]);
        }
        Self { rows, cols, cells }
    }

    /// Number of cells holding `value`
    pub fn count(&self, value: u8) -> usize {
        self.cells.iter().filter(|&&c| c == value).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_rule() {
        let a = b"ACGT";
        let b = b"AGCT";
        assert_eq!(cell(0, 0, a, b), DIAGONAL_MATCH);
        assert_eq!(cell(1, 2, a, b), OFF_DIAGONAL_MATCH);
        assert_eq!(cell(2, 1, a, b), OFF_DIAGONAL_MATCH);
        assert_eq!(cell(1, 1, a, b), MISMATCH);
        assert_eq!(cell(3, 3, a, b), DIAGONAL_MATCH);
    }

    #[test]
    fn test_fill_row_matches_cell() {
        let a = b"GATTACA";
        let b = b"TACGATA";
        for i in 0..a.len() {
            let row = compute_row(i, a, b);
            for j in 0..b.len() {
                assert_eq!(row[j], cell(i, j, a, b), "mismatch at ({i}, {j})");
            }
        }
    }

    #[test]
    fn test_from_cells_rejects_bad_length() {
        assert!(ComparisonMatrix::from_cells(2, 3, vec![0; 5]).is_err());
        let m = ComparisonMatrix::from_cells(2, 3, vec![0; 6]).unwrap();
        assert_eq!(m.shape(), (2, 3));
    }

    #[test]
    fn test_from_rows_rejects_ragged_rows() {
        let result = ComparisonMatrix::from_rows(2, vec![vec![0, 1], vec![2]]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_vstack_keeps_order() {
        let top = ComparisonMatrix::from_rows(2, vec![vec![2, 0]]).unwrap();
        let empty = ComparisonMatrix::from_rows(2, vec![]).unwrap();
        let bottom = ComparisonMatrix::from_rows(2, vec![vec![0, 1], vec![1, 0]]).unwrap();
        let m = ComparisonMatrix::vstack(2, vec![top, empty, bottom]).unwrap();
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m.row(0), &[2, 0]);
        assert_eq!(m.row(2), &[1, 0]);
    }

    #[test]
    fn test_crop_clamps() {
        let m = ComparisonMatrix::from_rows(3, vec![vec![2, 0, 1], vec![0, 2, 0]]).unwrap();
        let c = m.crop(1, 2);
        assert_eq!(c.shape(), (1, 2));
        assert_eq!(c.cells(), &[2, 0]);

        let whole = m.crop(10, 10);
        assert_eq!(whole, m);
    }

    #[test]
    fn test_count() {
        let m = ComparisonMatrix::from_rows(2, vec![vec![2, 1], vec![1, 0]]).unwrap();
        assert_eq!(m.count(OFF_DIAGONAL_MATCH), 2);
        assert_eq!(m.count(DIAGONAL_MATCH), 1);
    }
}
