//! Text report accumulation
//!
//! A [`ReportLog`] is owned by whoever drives a run and passed by `&mut` to
//! each step that contributes lines. Nothing is written until the owner
//! calls [`ReportLog::flush_to`].

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use crate::core::error::Result;

/// Ordered, human-readable report lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportLog {
    lines: Vec<String>,
}

impl ReportLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Append every line of `other`, keeping its order
    pub fn merge(&mut self, other: ReportLog) {
        self.lines.extend(other.lines);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Write one line per entry to `path`, creating parent directories
    pub fn flush_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        for line in &self.lines {
            writeln!(writer, "{line}")?;
        }
        writer.flush()?;

        info!("Wrote {} report line(s) to {}", self.lines.len(), path.display());
        Ok(())
    }
}

impl Extend<String> for ReportLog {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.lines.extend(iter);
    }
}

impl From<Vec<String>> for ReportLog {
    fn from(lines: Vec<String>) -> Self {
        Self { lines }
    }
}
