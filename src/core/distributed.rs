//! Message-passing matrix construction
//!
//! The primary sequence's row range `[0, N)` is split into `k` contiguous
//! chunks whose sizes differ by at most one row, the remainder going to the
//! lowest ranks. Each participant computes its own chunk with global row
//! indices, then all chunks are gathered on the coordinator (rank 0) and
//! stacked in rank order.
//!
//! Participants share no memory. A [`World`] launches one thread per rank,
//! hands each rank its own copy of the inputs, and connects the ranks only
//! through channels. The gather is the single synchronisation point: the
//! coordinator blocks until every chunk has arrived. A participant that exits
//! without contributing fails the gather with [`Error::WorkerFailed`]; one
//! that never finishes stalls it forever, as there is no timeout.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::debug;

use crate::core::error::{Error, Result};
use crate::core::matrix::{fill_row, ComparisonMatrix, MISMATCH};
use crate::core::options::{BuildOptions, ProgressCallback};
use crate::core::sequence::Sequence;

/// Rank that receives every chunk
pub const COORDINATOR: usize = 0;

/// Row range owned by `rank` when `n` rows are split across `participants`
pub fn chunk_range(n: usize, participants: usize, rank: usize) -> Result<Range<usize>> {
    if participants == 0 {
        return Err(Error::InvalidInput(
            "a distributed run needs at least one participant".to_string(),
        ));
    }
    if rank >= participants {
        return Err(Error::InvalidInput(format!(
            "rank {rank} outside a world of {participants}"
        )));
    }

    let base = n / participants;
    let extra = n % participants;
    let start = rank * base + rank.min(extra);
    let len = base + usize::from(rank < extra);
    Ok(start..start + len)
}

/// All chunk ranges in rank order
pub fn partition(n: usize, participants: usize) -> Result<Vec<Range<usize>>> {
    (0..participants.max(1))
        .map(|rank| chunk_range(n, participants, rank))
        .collect()
}

/// Point-to-point view of the world for one participant
pub trait Communicator {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    fn is_coordinator(&self) -> bool {
        self.rank() == COORDINATOR
    }

    /// Collective gather onto the coordinator.
    ///
    /// Every participant must call it exactly once. The coordinator gets all
    /// chunks ordered by rank; everybody else gets `None`.
    fn gather(&self, local: ComparisonMatrix) -> Result<Option<Vec<ComparisonMatrix>>>;
}

/// A chunk in flight to the coordinator
#[derive(Debug)]
struct Envelope {
    rank: usize,
    chunk: ComparisonMatrix,
}

/// Channel-backed communicator handed out by [`World`]
pub struct ChannelCommunicator {
    rank: usize,
    size: usize,
    link: Link,
}

enum Link {
    Coordinator(Receiver<Envelope>),
    Participant(Sender<Envelope>),
}

impl Communicator for ChannelCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn gather(&self, local: ComparisonMatrix) -> Result<Option<Vec<ComparisonMatrix>>> {
        match &self.link {
            Link::Participant(tx) => {
                tx.send(Envelope {
                    rank: self.rank,
                    chunk: local,
                })
                .map_err(|_| {
                    Error::WorkerFailed(format!(
                        "rank {} could not reach the coordinator",
                        self.rank
                    ))
                })?;
                Ok(None)
            }
            Link::Coordinator(rx) => {
                let mut slots: Vec<Option<ComparisonMatrix>> =
                    (0..self.size).map(|_| None).collect();
                slots[COORDINATOR] = Some(local);

                for received in 1..self.size {
                    let envelope = rx.recv().map_err(|_| {
                        Error::WorkerFailed(format!(
                            "gather ended after {received} of {} chunks",
                            self.size
                        ))
                    })?;
                    match slots.get_mut(envelope.rank) {
                        Some(slot) if slot.is_none() => *slot = Some(envelope.chunk),
                        _ => {
                            return Err(Error::WorkerFailed(format!(
                                "unexpected chunk from rank {}",
                                envelope.rank
                            )))
                        }
                    }
                    debug!("Coordinator received chunk from rank {}", envelope.rank);
                }

                let chunks = slots.into_iter().collect::<Option<Vec<_>>>().ok_or_else(|| {
                    Error::WorkerFailed("gather finished with a missing chunk".to_string())
                })?;
                Ok(Some(chunks))
            }
        }
    }
}

/// A fixed set of participants connected to one coordinator
#[derive(Debug, Clone, Copy)]
pub struct World {
    size: usize,
}

impl World {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidInput(
                "a distributed run needs at least one participant".to_string(),
            ));
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `f` once per rank, each on its own thread, and collect the
    /// per-rank outcomes in rank order
    pub fn run<F, T>(&self, f: F) -> Result<Vec<T>>
    where
        F: Fn(ChannelCommunicator) -> T + Sync,
        T: Send,
    {
        let (tx, rx) = unbounded::<Envelope>();
        let mut communicators = Vec::with_capacity(self.size);
        communicators.push(ChannelCommunicator {
            rank: COORDINATOR,
            size: self.size,
            link: Link::Coordinator(rx),
        });
        for rank in 1..self.size {
            communicators.push(ChannelCommunicator {
                rank,
                size: self.size,
                link: Link::Participant(tx.clone()),
            });
        }
        drop(tx);

        let f = &f;
        thread::scope(|scope| {
            let handles: Vec<_> = communicators
                .into_iter()
                .map(|comm| {
                    let rank = comm.rank;
                    thread::Builder::new()
                        .name(format!("dotplot-rank-{rank}"))
                        .spawn_scoped(scope, move || f(comm))
                        .map_err(Error::IoError)
                })
                .collect::<Result<Vec<_>>>()?;

            handles
                .into_iter()
                .enumerate()
                .map(|(rank, handle)| {
                    handle
                        .join()
                        .map_err(|_| Error::WorkerFailed(format!("rank {rank} panicked")))
                })
                .collect()
        })
    }
}

/// Per-participant entry point: compute the local chunk and join the gather.
///
/// Returns the reconstructed matrix on the coordinator and `None` elsewhere.
pub fn distributed_dotplot<C: Communicator>(
    comm: &C,
    primary: &Sequence,
    secondary: &Sequence,
    options: &BuildOptions,
) -> Result<Option<ComparisonMatrix>> {
    let range = chunk_range(primary.len(), comm.size(), comm.rank())?;
    let cols = secondary.len();
    let rows = range.len();

    let mut cells = vec![MISMATCH; rows * cols];
    if cols > 0 {
        for (offset, row) in cells.chunks_exact_mut(cols).enumerate() {
            fill_row(range.start + offset, primary.as_bytes(), secondary.as_bytes(), row);
            options.report(offset as u64 + 1, rows as u64);
        }
    }
    debug!(
        "Rank {}/{} computed rows {}..{}",
        comm.rank(),
        comm.size(),
        range.start,
        range.end
    );

    let local = ComparisonMatrix::from_raw(rows, cols, cells);
    match comm.gather(local)? {
        Some(chunks) => Ok(Some(ComparisonMatrix::vstack(cols, chunks)?)),
        None => Ok(None),
    }
}

/// Launch a world of `participants` ranks and return the coordinator's matrix
pub fn run_distributed(
    primary: &Sequence,
    secondary: &Sequence,
    participants: usize,
    options: &BuildOptions,
) -> Result<ComparisonMatrix> {
    let world = World::new(participants)?;
    let rank_options = BuildOptions {
        progress: options
            .progress
            .clone()
            .map(|cb| global_progress(cb, primary.len() as u64)),
        ..options.clone()
    };

    let outcomes = world.run(|comm| {
        // Every rank works on its own copy of the inputs
        let primary = primary.clone();
        let secondary = secondary.clone();
        distributed_dotplot(&comm, &primary, &secondary, &rank_options)
    })?;

    let mut coordinator_matrix = None;
    for (rank, outcome) in outcomes.into_iter().enumerate() {
        if let Some(matrix) = outcome? {
            debug!("Rank {rank} returned the gathered matrix");
            coordinator_matrix = Some(matrix);
        }
    }
    coordinator_matrix
        .ok_or_else(|| Error::WorkerFailed("coordinator returned no matrix".to_string()))
}

/// Fold per-rank row ticks into one `(rows_done, total_rows)` stream
fn global_progress(cb: ProgressCallback, total: u64) -> ProgressCallback {
    let done = Arc::new(AtomicU64::new(0));
    Arc::new(move |_, _| {
        let current = done.fetch_add(1, Ordering::Relaxed) + 1;
        cb(current, total);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sequential::sequential_dotplot;

    #[test]
    fn test_chunk_sizes_differ_by_at_most_one() {
        for n in [0, 1, 5, 10, 17, 100] {
            for k in 1..=12 {
                let chunks = partition(n, k).unwrap();
                assert_eq!(chunks.len(), k);
                let sizes: Vec<usize> = chunks.iter().map(|r| r.len()).collect();
                let max = *sizes.iter().max().unwrap();
                let min = *sizes.iter().min().unwrap();
                assert!(max - min <= 1, "n={n} k={k} sizes={sizes:?}");
            }
        }
    }

    #[test]
    fn test_chunks_cover_range_in_order() {
        for n in [0, 3, 10, 23] {
            for k in 1..=8 {
                let chunks = partition(n, k).unwrap();
                let mut next = 0;
                for chunk in &chunks {
                    assert_eq!(chunk.start, next);
                    next = chunk.end;
                }
                assert_eq!(next, n);
            }
        }
    }

    #[test]
    fn test_remainder_goes_to_earliest_chunks() {
        let chunks = partition(10, 4).unwrap();
        assert_eq!(chunks, vec![0..3, 3..6, 6..8, 8..10]);
    }

    #[test]
    fn test_more_participants_than_rows() {
        let chunks = partition(2, 4).unwrap();
        assert_eq!(chunks, vec![0..1, 1..2, 2..2, 2..2]);
    }

    #[test]
    fn test_zero_participants_rejected() {
        assert!(matches!(chunk_range(10, 0, 0), Err(Error::InvalidInput(_))));
        assert!(matches!(World::new(0), Err(Error::InvalidInput(_))));
        let result = run_distributed(
            &Sequence::from("A"),
            &Sequence::from("A"),
            0,
            &BuildOptions::default(),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_rank_outside_world_rejected() {
        assert!(chunk_range(10, 2, 2).is_err());
    }

    #[test]
    fn test_matches_sequential_for_participant_counts() {
        let a = Sequence::from("GATTACAGATTACACCGGTTAACGT");
        let b = Sequence::from("TTACAGGATCCAGATTACG");
        let expected = sequential_dotplot(&a, &b, &BuildOptions::default());

        for k in 1..=9 {
            let m = run_distributed(&a, &b, k, &BuildOptions::default()).unwrap();
            assert_eq!(m, expected, "divergence with {k} participants");
        }
    }

    #[test]
    fn test_global_indices_used_in_chunks() {
        // With 2 ranks, rank 1 owns rows 2..4; its diagonal cells must still be 2
        let a = Sequence::from("AAAA");
        let m = run_distributed(&a, &a, 2, &BuildOptions::default()).unwrap();
        assert_eq!(m.get(2, 2), 2);
        assert_eq!(m.get(3, 3), 2);
        assert_eq!(m.get(2, 0), 1);
    }

    #[test]
    fn test_only_coordinator_gets_matrix() {
        let a = Sequence::from("ACGTAC");
        let b = Sequence::from("CGTA");
        let world = World::new(3).unwrap();
        let outcomes = world
            .run(|comm| {
                let is_coordinator = comm.is_coordinator();
                let result = distributed_dotplot(&comm, &a, &b, &BuildOptions::default()).unwrap();
                (is_coordinator, result.is_some())
            })
            .unwrap();
        assert_eq!(outcomes, vec![(true, true), (false, false), (false, false)]);
    }

    #[test]
    fn test_gather_fails_when_participant_leaves() {
        let world = World::new(3).unwrap();
        let outcomes = world
            .run(|comm| {
                if comm.rank() == 2 {
                    // Leave without contributing a chunk
                    return Ok(None);
                }
                let local = ComparisonMatrix::from_rows(1, vec![vec![comm.rank() as u8]])?;
                comm.gather(local)
            })
            .unwrap();
        assert!(matches!(outcomes[0], Err(Error::WorkerFailed(_))));
        assert!(matches!(outcomes[1], Ok(None)));
    }

    #[test]
    fn test_gather_orders_by_rank() {
        let world = World::new(4).unwrap();
        let outcomes = world
            .run(|comm| {
                let local = ComparisonMatrix::from_rows(1, vec![vec![comm.rank() as u8]])?;
                comm.gather(local)
            })
            .unwrap();
        let chunks = outcomes.into_iter().next().unwrap().unwrap().unwrap();
        let ranks: Vec<u8> = chunks.iter().map(|c| c.get(0, 0)).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_empty_primary() {
        let m = run_distributed(
            &Sequence::from(""),
            &Sequence::from("ACGT"),
            3,
            &BuildOptions::default(),
        )
        .unwrap();
        assert_eq!(m.shape(), (0, 4));
    }
}
