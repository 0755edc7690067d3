//! Factor vertices: the joint-potential nodes of the factor graph.
//!
//! Each factor carries an ordered list of neighbour hypotheses (its degree)
//! and a weight table of length `2^degree` giving an unnormalised potential
//! over every boolean assignment to those neighbours. Bit `j` of a weight
//! index is the truth value of the `j`-th neighbour in definition order.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::id::HypothesisId;

/// Inline capacity for a factor's neighbour list. Every factor kind this
/// core produces has degree 2 or 3; `SmallVec` avoids a heap allocation for
/// the common case while still accepting larger degrees (`Content` factors
/// can have any degree).
type Neighbours = SmallVec<[HypothesisId; 3]>;

/// Which structural relation a factor encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactorKind {
    /// Links a parent's and a child's declared-type (or content-type)
    /// hypotheses across array-element or record-field decomposition.
    Decomposition,
    /// Links a pointer's declared type, its content type, and its target's
    /// declared type.
    Pointer,
    /// Links hypotheses derived purely from inspecting memory content.
    Content,
    /// Links a `DeclaredType` and a `ContentType` hypothesis for the same
    /// range and type.
    DeclarationContent,
}

/// A factor vertex: an ordered neighbour list plus a weight table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Factor {
    kind: FactorKind,
    neighbours: Neighbours,
    weights: Vec<f64>,
}

/// A weight table's length didn't match `2^degree` for the neighbour count
/// it was constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("factor of degree {degree} needs {expected} weights, got {actual}")]
pub struct WeightShapeError {
    pub degree: usize,
    pub expected: usize,
    pub actual: usize,
}

impl Factor {
    /// Builds a factor, checking the `weights.len() == 2^neighbours.len()`
    /// shape invariant.
    pub fn new(
        kind: FactorKind,
        neighbours: impl IntoIterator<Item = HypothesisId>,
        weights: Vec<f64>,
    ) -> Result<Self, WeightShapeError> {
        let neighbours: Neighbours = neighbours.into_iter().collect();
        let expected = 1usize << neighbours.len();
        if weights.len() != expected {
            return Err(WeightShapeError {
                degree: neighbours.len(),
                expected,
                actual: weights.len(),
            });
        }
        Ok(Factor {
            kind,
            neighbours,
            weights,
        })
    }

    pub fn kind(&self) -> FactorKind {
        self.kind
    }

    pub fn degree(&self) -> usize {
        self.neighbours.len()
    }

    pub fn neighbours(&self) -> &[HypothesisId] {
        &self.neighbours
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// The unnormalised potential for one full boolean assignment to this
    /// factor's neighbours, addressed the same way as `weights`: bit `j` of
    /// `index` is the truth value of the `j`-th neighbour.
    pub fn weight_at(&self, index: usize) -> f64 {
        self.weights[index]
    }
}

/// Deduplication key for factors: kind plus the *set* of neighbour
/// hypotheses, irrespective of order (order is preserved on the stored
/// factor itself, since it determines weight-bit semantics; only the
/// dedup key ignores it).
pub fn factor_key(kind: FactorKind, neighbours: &[HypothesisId]) -> (FactorKind, Vec<HypothesisId>) {
    let mut sorted: Vec<HypothesisId> = neighbours.to_vec();
    sorted.sort_by_key(|id| id.0.index());
    (kind, sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::NodeIndex;

    fn hid(i: u32) -> HypothesisId {
        HypothesisId(NodeIndex::new(i as usize))
    }

    #[test]
    fn degree_two_factor_needs_four_weights() {
        let f = Factor::new(FactorKind::Decomposition, [hid(0), hid(1)], vec![0.0; 4]);
        assert!(f.is_ok());
    }

    #[test]
    fn degree_three_factor_needs_eight_weights() {
        let f = Factor::new(
            FactorKind::Pointer,
            [hid(0), hid(1), hid(2)],
            vec![0.0; 8],
        );
        assert!(f.is_ok());
    }

    #[test]
    fn mismatched_weight_table_is_rejected() {
        let err = Factor::new(FactorKind::Decomposition, [hid(0), hid(1)], vec![0.0; 3])
            .unwrap_err();
        assert_eq!(
            err,
            WeightShapeError {
                degree: 2,
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn factor_key_ignores_neighbour_order() {
        let a = factor_key(FactorKind::Decomposition, &[hid(1), hid(2)]);
        let b = factor_key(FactorKind::Decomposition, &[hid(2), hid(1)]);
        assert_eq!(a, b);
    }

    #[test]
    fn factor_key_distinguishes_kind() {
        let a = factor_key(FactorKind::Decomposition, &[hid(1), hid(2)]);
        let b = factor_key(FactorKind::Pointer, &[hid(1), hid(2)]);
        assert_ne!(a, b);
    }
}
