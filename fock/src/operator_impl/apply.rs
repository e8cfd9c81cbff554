//! Row-wise action of an operator sum between two bases.

use super::term::{LadderOp, OperatorSum};
use crate::basis_impl::{FockBasis, FockState, MAX_ORBITALS};
use crate::error::{Error, Result};
use crate::C64;
use serde::Deserialize;
use std::sync::Arc;

/// What to do with a coupled pattern that is not part of the column basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupPolicy {
    /// Raise `BasisLookupFailure`: the terms do not conserve the sector.
    #[default]
    Strict,
    /// Drop the contribution, i.e. project onto the column basis.
    Project,
}

/// Nonzero `(column, value)` entries of one matrix row.
pub type CouplingRow = Vec<(usize, C64)>;

/// Apply a ladder string to `state`, rightmost operator first.
///
/// Returns the resulting state and the fermionic sign, or `None` when the
/// string annihilates the state.
#[inline]
pub fn apply_string(ops: &[LadderOp], state: FockState) -> Option<(FockState, f64)> {
    let mut current = state;
    let mut odd = false;
    for &op in ops.iter().rev() {
        let i = op.orbital();
        let occupied = current.is_occupied(i);
        match op {
            LadderOp::Annihilate(_) if !occupied => return None,
            LadderOp::Create(_) if occupied => return None,
            _ => {}
        }
        odd ^= current.occupied_below(i) % 2 == 1;
        current = current.flip(i);
    }
    Some((current, if odd { -1.0 } else { 1.0 }))
}

/// Matrix elements `⟨left_r| Σ_t a_t O_t |right_c⟩` generated on demand.
///
/// For a row state `|r⟩` the adjoint string `O_t†` maps it onto the unique
/// column state `|c⟩` with `⟨r|O_t|c⟩ = sign`, so each term contributes at
/// most one entry per row.
#[derive(Debug, Clone)]
pub struct CouplingKernel {
    adjoints: Vec<(Vec<LadderOp>, C64)>,
    left: Arc<FockBasis>,
    right: Arc<FockBasis>,
    policy: LookupPolicy,
}

impl CouplingKernel {
    pub fn new(
        terms: &OperatorSum,
        left: Arc<FockBasis>,
        right: Arc<FockBasis>,
        policy: LookupPolicy,
    ) -> Result<Self> {
        let n_orbitals = left.n_orbitals().max(right.n_orbitals());
        if let Some(max) = terms.max_orbital() {
            if max >= n_orbitals || max >= MAX_ORBITALS {
                return Err(Error::InvalidArgument(format!(
                    "operator acts on orbital {} but the bases have {} orbitals",
                    max, n_orbitals
                )));
            }
        }
        let adjoints = terms
            .terms()
            .iter()
            .map(|t| (t.adjoint().ops, t.amplitude))
            .collect();
        Ok(CouplingKernel {
            adjoints,
            left,
            right,
            policy,
        })
    }

    pub fn left(&self) -> &Arc<FockBasis> {
        &self.left
    }

    pub fn right(&self) -> &Arc<FockBasis> {
        &self.right
    }

    pub fn policy(&self) -> LookupPolicy {
        self.policy
    }

    /// Visit every contribution of row `row` as `(term, column, value)`.
    #[inline]
    fn for_each_coupling<F>(&self, row: usize, mut visit: F) -> Result<()>
    where
        F: FnMut(usize, C64),
    {
        let state = self.left.state(row);
        for (term, (ops, amplitude)) in self.adjoints.iter().enumerate() {
            let Some((target, sign)) = apply_string(ops, state) else {
                continue;
            };
            match self.right.rank_of(target) {
                Some(column) => visit(column, *amplitude * sign),
                None if self.policy == LookupPolicy::Project => {}
                None => {
                    return Err(Error::BasisLookupFailure {
                        state: target.bits(),
                        term,
                    })
                }
            }
        }
        Ok(())
    }

    /// Fail if row `row` couples outside the column basis under `Strict`.
    pub fn check_row(&self, row: usize) -> Result<()> {
        self.for_each_coupling(row, |_, _| {})
    }

    /// Nonzero entries of row `row`, sorted by column with duplicates merged.
    pub fn row(&self, row: usize) -> Result<CouplingRow> {
        let mut entries = Vec::new();
        self.for_each_coupling(row, |column, value| entries.push((column, value)))?;
        entries.sort_unstable_by_key(|&(column, _)| column);
        let mut merged: CouplingRow = Vec::with_capacity(entries.len());
        for (column, value) in entries {
            match merged.last_mut() {
                Some(last) if last.0 == column => last.1 += value,
                _ => merged.push((column, value)),
            }
        }
        merged.retain(|&(_, value)| value != C64::new(0.0, 0.0));
        Ok(merged)
    }

    /// `Σ_c H_{row,c} x_c` for a full-length input `x`.
    #[inline]
    pub fn row_dot(&self, row: usize, x: &[C64]) -> Result<C64> {
        let mut acc = C64::new(0.0, 0.0);
        self.for_each_coupling(row, |column, value| acc += value * x[column])?;
        Ok(acc)
    }
}
