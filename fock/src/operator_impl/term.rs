//! Operator terms and builders.

extern crate nalgebra as na;

use crate::C64;
use na::DMatrix;
use serde::Deserialize;

/// Single fermionic creation or annihilation operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LadderOp {
    Create(usize),
    Annihilate(usize),
}

impl LadderOp {
    pub fn orbital(self) -> usize {
        match self {
            LadderOp::Create(i) | LadderOp::Annihilate(i) => i,
        }
    }

    pub fn adjoint(self) -> Self {
        match self {
            LadderOp::Create(i) => LadderOp::Annihilate(i),
            LadderOp::Annihilate(i) => LadderOp::Create(i),
        }
    }
}

/// `amplitude * ops[0] ops[1] ... ops[n-1]`; the rightmost operator acts
/// first.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorTerm {
    pub ops: Vec<LadderOp>,
    pub amplitude: C64,
}

impl OperatorTerm {
    pub fn new(ops: Vec<LadderOp>, amplitude: C64) -> Self {
        OperatorTerm { ops, amplitude }
    }

    /// `amplitude * c†_i c_j`
    pub fn hopping(i: usize, j: usize, amplitude: C64) -> Self {
        Self::new(vec![LadderOp::Create(i), LadderOp::Annihilate(j)], amplitude)
    }

    /// `amplitude * c†_i c†_j c_k c_l`
    pub fn coulomb(i: usize, j: usize, k: usize, l: usize, amplitude: C64) -> Self {
        Self::new(
            vec![
                LadderOp::Create(i),
                LadderOp::Create(j),
                LadderOp::Annihilate(k),
                LadderOp::Annihilate(l),
            ],
            amplitude,
        )
    }

    /// Hermitian adjoint: reversed string of adjoint operators, conjugated
    /// amplitude.
    pub fn adjoint(&self) -> Self {
        OperatorTerm {
            ops: self.ops.iter().rev().map(|op| op.adjoint()).collect(),
            amplitude: self.amplitude.conj(),
        }
    }

    /// Highest orbital index touched by the term.
    pub fn max_orbital(&self) -> Option<usize> {
        self.ops.iter().map(|op| op.orbital()).max()
    }
}

/// Immutable-by-convention list of operator terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorSum {
    terms: Vec<OperatorTerm>,
}

impl OperatorSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_terms(terms: Vec<OperatorTerm>) -> Self {
        OperatorSum { terms }
    }

    pub fn push(&mut self, term: OperatorTerm) {
        self.terms.push(term);
    }

    pub fn extend(&mut self, other: OperatorSum) {
        self.terms.extend(other.terms);
    }

    pub fn terms(&self) -> &[OperatorTerm] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn adjoint(&self) -> Self {
        OperatorSum {
            terms: self.terms.iter().map(|t| t.adjoint()).collect(),
        }
    }

    /// Every term multiplied by `factor`.
    pub fn scaled(&self, factor: C64) -> Self {
        OperatorSum {
            terms: self
                .terms
                .iter()
                .map(|t| OperatorTerm::new(t.ops.clone(), t.amplitude * factor))
                .collect(),
        }
    }

    /// Operator product `self * other`, term by term.
    ///
    /// Used for composite observables such as `S² = Sx Sx + Sy Sy + Sz Sz`.
    pub fn product(&self, other: &OperatorSum) -> Self {
        let mut terms = Vec::with_capacity(self.len() * other.len());
        for a in &self.terms {
            for b in &other.terms {
                let mut ops = a.ops.clone();
                ops.extend_from_slice(&b.ops);
                terms.push(OperatorTerm::new(ops, a.amplitude * b.amplitude));
            }
        }
        OperatorSum { terms }
    }

    pub fn max_orbital(&self) -> Option<usize> {
        self.terms.iter().filter_map(|t| t.max_orbital()).max()
    }
}

impl FromIterator<OperatorTerm> for OperatorSum {
    fn from_iter<I: IntoIterator<Item = OperatorTerm>>(iter: I) -> Self {
        OperatorSum {
            terms: iter.into_iter().collect(),
        }
    }
}

/// `Σ_ij h_ij c†_i c_j`, skipping entries with `|h_ij| <= cutoff`.
pub fn two_fermion_terms(h: &DMatrix<C64>, cutoff: f64) -> OperatorSum {
    let mut sum = OperatorSum::new();
    for j in 0..h.ncols() {
        for i in 0..h.nrows() {
            let value = h[(i, j)];
            if value.norm() > cutoff {
                sum.push(OperatorTerm::hopping(i, j, value));
            }
        }
    }
    sum
}

/// `Σ_ijkl u(i, j, k, l) c†_i c†_j c_k c_l` over `n_orbitals` orbitals,
/// skipping amplitudes with `|u| <= cutoff` and strings that vanish
/// identically (`i == j` or `k == l`).
pub fn four_fermion_terms<F>(n_orbitals: usize, u: F, cutoff: f64) -> OperatorSum
where
    F: Fn(usize, usize, usize, usize) -> C64,
{
    let mut sum = OperatorSum::new();
    for i in 0..n_orbitals {
        for j in 0..n_orbitals {
            if i == j {
                continue;
            }
            for k in 0..n_orbitals {
                for l in 0..n_orbitals {
                    if k == l {
                        continue;
                    }
                    let value = u(i, j, k, l);
                    if value.norm() > cutoff {
                        sum.push(OperatorTerm::coulomb(i, j, k, l, value));
                    }
                }
            }
        }
    }
    sum
}

/// Total particle number `Σ_i c†_i c_i`.
pub fn number_operator(n_orbitals: usize) -> OperatorSum {
    (0..n_orbitals)
        .map(|i| OperatorTerm::hopping(i, i, C64::new(1.0, 0.0)))
        .collect()
}
