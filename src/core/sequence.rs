//! Symbol sequences and FASTA ingestion
//!
//! A [`Sequence`] is immutable once loaded; both executors and the filter
//! only ever borrow its symbols.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use bio::io::fasta;
use log::debug;

use crate::core::error::{Error, Result};

/// An ordered, zero-indexed sequence of byte symbols
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sequence {
    symbols: Vec<u8>,
}

impl Sequence {
    pub fn new(symbols: impl Into<Vec<u8>>) -> Self {
        Self {
            symbols: symbols.into(),
        }
    }

    /// Load a FASTA file, concatenating every record in file order
    pub fn from_fasta(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::SequenceNotFound(path.to_path_buf()),
            _ => Error::IoError(e),
        })?;

        let mut symbols = Vec::new();
        let mut records = 0usize;
        for record in fasta::Reader::new(BufReader::new(file)).records() {
            let record = record.map_err(|e| {
                Error::ParseError(format!("{}: {e}", path.display()))
            })?;
            symbols.extend_from_slice(record.seq());
            records += 1;
        }

        debug!(
            "Loaded {} symbols from {} record(s) in {}",
            symbols.len(),
            records,
            path.display()
        );
        Ok(Self { symbols })
    }

    /// Keep at most `max_len` leading symbols
    pub fn truncated(mut self, max_len: usize) -> Self {
        self.symbols.truncate(max_len);
        self
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.symbols
    }
}

impl From<&str> for Sequence {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl AsRef<[u8]> for Sequence {
    fn as_ref(&self) -> &[u8] {
        &self.symbols
    }
}
