//! Diagonal extraction filter
//!
//! Turns a comparison matrix into a binary mask that highlights stretches of
//! matches running parallel to the principal diagonal:
//!
//! 1. correlate with a 3×3 kernel (+1 on the diagonal, −1 elsewhere) using
//!    reflect-101 borders, saturating the response to `u8`
//! 2. min-max rescale the response into `[0, 127]`
//! 3. binarize: strictly above the threshold becomes 255, the rest 0
//!
//! Every stage is pure, so the same matrix always yields the same mask.

use log::debug;

use crate::core::matrix::ComparisonMatrix;

/// Kernel favouring diagonal runs
pub const DIAGONAL_KERNEL: [[i32; 3]; 3] = [[1, -1, -1], [-1, 1, -1], [-1, -1, 1]];

/// Upper bound of the normalised range
pub const NORMALIZED_MAX: u8 = 127;

/// Binarization threshold on the normalised scale
pub const DEFAULT_THRESHOLD: u8 = 70;

/// Value of a set mask cell
pub const MASK_ON: u8 = 255;

/// Row-major 8-bit grid produced by the filter stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagonalMask {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
}

impl DiagonalMask {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, i: usize, j: usize) -> u8 {
        self.cells[i * self.cols + j]
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Number of cells set to [`MASK_ON`]
    pub fn count_on(&self) -> usize {
        self.cells.iter().filter(|&&c| c == MASK_ON).count()
    }
}

/// Map an out-of-range index back inside `[0, len)`, `gfedcb|abcdefgh|gfedcba`
fn reflect_101(mut p: isize, len: usize) -> usize {
    let len = len as isize;
    if len == 1 {
        return 0;
    }
    while p < 0 || p >= len {
        if p < 0 {
            p = -p;
        } else {
            p = 2 * len - p - 2;
        }
    }
    p as usize
}

/// Stage 1: kernel correlation, same-shape output saturated to `[0, 255]`
pub fn convolve(matrix: &ComparisonMatrix, kernel: &[[i32; 3]; 3]) -> DiagonalMask {
    let (rows, cols) = matrix.shape();
    let mut cells = vec![0u8; rows * cols];

    for i in 0..rows {
        for j in 0..cols {
            let mut acc = 0i32;
            for (di, kernel_row) in kernel.iter().enumerate() {
                let y = reflect_101(i as isize + di as isize - 1, rows);
                for (dj, &weight) in kernel_row.iter().enumerate() {
                    let x = reflect_101(j as isize + dj as isize - 1, cols);
                    acc += weight * i32::from(matrix.get(y, x));
                }
            }
            cells[i * cols + j] = acc.clamp(0, 255) as u8;
        }
    }

    DiagonalMask { rows, cols, cells }
}

/// Stage 2: min-max rescale into `[0, max]`, rounding half to even.
///
/// A flat input maps entirely to 0.
pub fn normalize(grid: &DiagonalMask, max: u8) -> DiagonalMask {
    let lo = grid.cells.iter().copied().min().unwrap_or(0);
    let hi = grid.cells.iter().copied().max().unwrap_or(0);
    let scale = if hi > lo {
        f64::from(max) / f64::from(hi - lo)
    } else {
        0.0
    };

    let cells = grid
        .cells
        .iter()
        .map(|&v| {
            let scaled = (f64::from(v) - f64::from(lo)) * scale;
            scaled.round_ties_even().clamp(0.0, 255.0) as u8
        })
        .collect();

    DiagonalMask {
        rows: grid.rows,
        cols: grid.cols,
        cells,
    }
}

/// Stage 3: cells strictly above `threshold` become [`MASK_ON`], others 0
pub fn threshold(grid: &DiagonalMask, threshold: u8) -> DiagonalMask {
    let cells = grid
        .cells
        .iter()
        .map(|&v| if v > threshold { MASK_ON } else { 0 })
        .collect();

    DiagonalMask {
        rows: grid.rows,
        cols: grid.cols,
        cells,
    }
}

/// Kernel, normalisation range and threshold bundled together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagonalFilter {
    pub kernel: [[i32; 3]; 3],
    pub normalized_max: u8,
    pub threshold: u8,
}

impl Default for DiagonalFilter {
    fn default() -> Self {
        Self {
            kernel: DIAGONAL_KERNEL,
            normalized_max: NORMALIZED_MAX,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl DiagonalFilter {
    /// Run all three stages
    pub fn apply(&self, matrix: &ComparisonMatrix) -> DiagonalMask {
        let response = convolve(matrix, &self.kernel);
        let scaled = normalize(&response, self.normalized_max);
        let mask = threshold(&scaled, self.threshold);
        debug!(
            "Diagonal filter on {}x{}: {} cells set",
            mask.rows,
            mask.cols,
            mask.count_on()
        );
        mask
    }
}
