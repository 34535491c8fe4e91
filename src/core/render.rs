//! Greyscale PNG output for matrices and masks
//!
//! Images are written cell-for-pixel; rows map to image rows.

use std::fs;
use std::path::Path;
use std::time::Instant;

use image::GrayImage;
use log::{debug, warn};

use crate::core::error::{Error, Result};
use crate::core::filter::{DiagonalFilter, DiagonalMask};
use crate::core::matrix::ComparisonMatrix;
use crate::core::report::ReportLog;

/// Anything that can be rendered as an 8-bit greyscale image
pub trait Grayscale {
    fn dimensions(&self) -> (usize, usize);

    fn luma(&self, i: usize, j: usize) -> u8;

    /// Label used in timing report lines
    fn kind(&self) -> &'static str;
}

impl Grayscale for ComparisonMatrix {
    fn dimensions(&self) -> (usize, usize) {
        self.shape()
    }

    /// Inverted scale: mismatches white, diagonal matches black
    fn luma(&self, i: usize, j: usize) -> u8 {
        match self.get(i, j) {
            0 => 255,
            1 => 128,
            _ => 0,
        }
    }

    fn kind(&self) -> &'static str {
        "dot-plot"
    }
}

impl Grayscale for DiagonalMask {
    fn dimensions(&self) -> (usize, usize) {
        self.shape()
    }

    fn luma(&self, i: usize, j: usize) -> u8 {
        self.get(i, j)
    }

    fn kind(&self) -> &'static str {
        "filtered"
    }
}

/// Encode `grid` as an in-memory greyscale image
pub fn to_image<G: Grayscale>(grid: &G) -> Result<GrayImage> {
    let (rows, cols) = grid.dimensions();
    let width = u32::try_from(cols)
        .map_err(|_| Error::ImageError(format!("{cols} columns exceed image width")))?;
    let height = u32::try_from(rows)
        .map_err(|_| Error::ImageError(format!("{rows} rows exceed image height")))?;
    Ok(GrayImage::from_fn(width, height, |x, y| {
        image::Luma([grid.luma(y as usize, x as usize)])
    }))
}

/// Save `grid` as a PNG at `path` and record how long it took in `timings`.
///
/// Empty grids produce no file.
pub fn save_grayscale<G: Grayscale>(
    grid: &G,
    path: impl AsRef<Path>,
    timings: &mut ReportLog,
) -> Result<()> {
    let start = Instant::now();
    if write_png(grid, path.as_ref())? {
        record(timings, grid.kind(), start);
    }
    Ok(())
}

/// Filter `matrix`, save the mask at `path` and record the combined time
pub fn save_filtered(
    matrix: &ComparisonMatrix,
    filter: &DiagonalFilter,
    path: impl AsRef<Path>,
    timings: &mut ReportLog,
) -> Result<DiagonalMask> {
    let start = Instant::now();
    let mask = filter.apply(matrix);
    if write_png(&mask, path.as_ref())? {
        record(timings, mask.kind(), start);
    }
    Ok(mask)
}

fn write_png<G: Grayscale>(grid: &G, path: &Path) -> Result<bool> {
    let (rows, cols) = grid.dimensions();
    if rows == 0 || cols == 0 {
        warn!("Skipping empty {} image {}", grid.kind(), path.display());
        return Ok(false);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    to_image(grid)?.save(path)?;
    debug!("Rendered {rows}x{cols} {} image to {}", grid.kind(), path.display());
    Ok(true)
}

fn record(timings: &mut ReportLog, kind: &str, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    timings.push(format!("{kind} image generation time: {elapsed}"));
}
