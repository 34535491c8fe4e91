//! Speedup and efficiency analysis
//!
//! The baseline is always the first sample of the supplied series. When that
//! series does not start at one processor, speedup and efficiency are
//! relative to that first configuration rather than absolute.

use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

/// One timed configuration of a benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    pub processors: usize,
    pub elapsed: Duration,
}

impl PerformanceSample {
    pub fn new(processors: usize, elapsed: Duration) -> Self {
        Self {
            processors,
            elapsed,
        }
    }
}

/// `speedup[i] = times[0] / times[i]`, with `speedup[0] == 1.0` exactly
pub fn speedup(times: &[f64]) -> Vec<f64> {
    let Some(&baseline) = times.first() else {
        return Vec::new();
    };
    times
        .iter()
        .enumerate()
        .map(|(i, &t)| if i == 0 { 1.0 } else { baseline / t })
        .collect()
}

/// `efficiency[i] = speedup[i] / processors[i]`
pub fn efficiency(speedups: &[f64], processors: &[usize]) -> Result<Vec<f64>> {
    if speedups.len() != processors.len() {
        return Err(Error::InvalidInput(format!(
            "{} speedups but {} processor counts",
            speedups.len(),
            processors.len()
        )));
    }
    if let Some(pos) = processors.iter().position(|&p| p == 0) {
        return Err(Error::InvalidInput(format!(
            "processor count at position {pos} is zero"
        )));
    }
    Ok(speedups
        .iter()
        .zip(processors)
        .map(|(&s, &p)| s / p as f64)
        .collect())
}

/// Derived metrics for an ordered series of samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub processors: Vec<usize>,
    pub times: Vec<f64>,
    pub speedup: Vec<f64>,
    pub efficiency: Vec<f64>,
}

impl PerformanceReport {
    /// Analyze samples in the order they were recorded
    pub fn from_samples(samples: &[PerformanceSample]) -> Result<Self> {
        let times: Vec<f64> = samples.iter().map(|s| s.elapsed.as_secs_f64()).collect();
        let processors: Vec<usize> = samples.iter().map(|s| s.processors).collect();
        Self::from_series(&times, &processors)
    }

    /// Analyze index-aligned time and processor-count series
    pub fn from_series(times: &[f64], processors: &[usize]) -> Result<Self> {
        if times.len() != processors.len() {
            return Err(Error::InvalidInput(format!(
                "{} times but {} processor counts",
                times.len(),
                processors.len()
            )));
        }
        if let Some(&first) = processors.first() {
            if first != 1 {
                warn!(
                    "Baseline runs on {first} processors; speedup and efficiency are relative to it"
                );
            }
        }

        let speedup = speedup(times);
        let efficiency = efficiency(&speedup, processors)?;
        Ok(Self {
            processors: processors.to_vec(),
            times: times.to_vec(),
            speedup,
            efficiency,
        })
    }

    pub fn is_relative(&self) -> bool {
        self.processors.first().is_some_and(|&p| p != 1)
    }

    /// Human-readable report lines: times, then speedups, then efficiencies
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.times.len() * 3);
        for (p, t) in self.processors.iter().zip(&self.times) {
            lines.push(format!("Elapsed time with {p} processors: {t}"));
        }
        for (p, s) in self.processors.iter().zip(&self.speedup) {
            lines.push(format!("Speedup with {p} processors: {s}"));
        }
        for (p, e) in self.processors.iter().zip(&self.efficiency) {
            lines.push(format!("Efficiency with {p} processors: {e}"));
        }
        lines
    }
}
