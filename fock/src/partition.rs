//! Contiguous row ranges owned by each rank.

use crate::comm::Communicator;
use crate::error::{Error, Result};
use std::ops::Range;

/// Split of a global dimension into one contiguous range per rank.
///
/// The first `dim % size` ranks hold one extra element, so the layout only
/// depends on `(dim, size)` and every rank derives it without communication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    offsets: Vec<usize>,
}

impl Partition {
    pub fn even(dim: usize, n_ranks: usize) -> Self {
        let n_ranks = n_ranks.max(1);
        let base = dim / n_ranks;
        let extra = dim % n_ranks;
        let mut offsets = Vec::with_capacity(n_ranks + 1);
        offsets.push(0);
        for rank in 0..n_ranks {
            let len = base + usize::from(rank < extra);
            offsets.push(offsets[rank] + len);
        }
        Partition { offsets }
    }

    /// Build a partition from explicit per-rank lengths.
    pub fn from_counts(counts: &[usize]) -> Self {
        let mut offsets = Vec::with_capacity(counts.len() + 1);
        offsets.push(0);
        for (rank, &count) in counts.iter().enumerate() {
            offsets.push(offsets[rank] + count);
        }
        Partition { offsets }
    }

    pub fn dim(&self) -> usize {
        self.offsets[self.offsets.len() - 1]
    }

    pub fn n_ranks(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn range(&self, rank: usize) -> Range<usize> {
        self.offsets[rank]..self.offsets[rank + 1]
    }

    pub fn len(&self, rank: usize) -> usize {
        self.offsets[rank + 1] - self.offsets[rank]
    }

    pub fn is_empty(&self) -> bool {
        self.dim() == 0
    }

    pub fn counts(&self) -> Vec<usize> {
        self.offsets.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Verify that every rank agrees on the layout.
    ///
    /// Each rank contributes the length it believes it owns; any disagreement
    /// with the locally computed counts is a `DimensionMismatch` raised on all
    /// ranks alike.
    pub fn check(&self, comm: &dyn Communicator) -> Result<()> {
        if comm.size() != self.n_ranks() {
            return Err(Error::DimensionMismatch {
                context: "partition rank count",
                expected: comm.size(),
                found: self.n_ranks(),
            });
        }
        let reported = comm.all_gather_count(self.len(comm.rank()));
        for (rank, (&found, expected)) in reported.iter().zip(self.counts()).enumerate() {
            if found != expected {
                return Err(Error::DimensionMismatch {
                    context: if rank == comm.rank() {
                        "local partition length"
                    } else {
                        "remote partition length"
                    },
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::{run_ranks, SelfComm};

    #[test]
    fn test_even_split() {
        let p = Partition::even(10, 3);
        assert_eq!(p.counts(), vec![4, 3, 3]);
        assert_eq!(p.range(1), 4..7);
        assert_eq!(p.dim(), 10);
    }

    #[test]
    fn test_more_ranks_than_rows() {
        let p = Partition::even(2, 4);
        assert_eq!(p.counts(), vec![1, 1, 0, 0]);
        assert!(p.check(&SelfComm).is_err());
    }

    #[test]
    fn test_check_detects_inconsistent_layout() {
        let results = run_ranks(2, |comm| {
            // rank 1 believes in a different split
            let p = if comm.rank() == 0 {
                Partition::from_counts(&[3, 2])
            } else {
                Partition::from_counts(&[2, 3])
            };
            p.check(comm)
        });
        assert!(results.iter().all(|r| matches!(r, Err(Error::DimensionMismatch { .. }))));

        let ok = run_ranks(2, |comm| Partition::even(5, 2).check(comm));
        assert!(ok.iter().all(|r| r.is_ok()));
    }
}
