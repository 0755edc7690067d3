//! Hypothesis vertices: the variable nodes of the factor graph.
//!
//! A hypothesis is one of three things: a [`HypothesisKind::DeclaredType`]
//! ("some part of the program asserts this range has this type"), a
//! [`HypothesisKind::ContentType`] ("the bits in this range look like this
//! type"), or an [`HypothesisKind::Observation`] -- an anchor with no payload,
//! paired with a forcing factor to encode a hard fact.

use serde::{Deserialize, Serialize};

use crate::address::AddressRange;
use crate::id::TypeId;

/// Which of the three hypothesis shapes a vertex is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HypothesisKind {
    DeclaredType,
    ContentType,
    Observation,
}

/// A hypothesis vertex and its current belief.
///
/// `marginal` is `None` until [`crate::inference::infer`] converges; reading
/// a probability before then is a logic error in the caller, which is why it
/// is exposed as `Option<f64>` rather than a bare `f64`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Hypothesis {
    DeclaredType {
        range: AddressRange,
        type_id: TypeId,
        marginal: Option<f64>,
    },
    ContentType {
        range: AddressRange,
        type_id: TypeId,
        marginal: Option<f64>,
    },
    Observation {
        marginal: Option<f64>,
    },
}

impl Hypothesis {
    pub fn declared_type(range: AddressRange, type_id: TypeId) -> Self {
        Hypothesis::DeclaredType {
            range,
            type_id,
            marginal: None,
        }
    }

    pub fn content_type(range: AddressRange, type_id: TypeId) -> Self {
        Hypothesis::ContentType {
            range,
            type_id,
            marginal: None,
        }
    }

    pub fn observation() -> Self {
        Hypothesis::Observation { marginal: None }
    }

    pub fn kind(&self) -> HypothesisKind {
        match self {
            Hypothesis::DeclaredType { .. } => HypothesisKind::DeclaredType,
            Hypothesis::ContentType { .. } => HypothesisKind::ContentType,
            Hypothesis::Observation { .. } => HypothesisKind::Observation,
        }
    }

    /// The range and type id this hypothesis is about, for the two type
    /// hypothesis kinds. `None` for observations.
    pub fn range_and_type(&self) -> Option<(AddressRange, TypeId)> {
        match self {
            Hypothesis::DeclaredType { range, type_id, .. }
            | Hypothesis::ContentType { range, type_id, .. } => Some((*range, *type_id)),
            Hypothesis::Observation { .. } => None,
        }
    }

    /// The converged marginal probability that this hypothesis holds, in
    /// `[0, 1]`. `None` if inference has not yet converged.
    pub fn marginal(&self) -> Option<f64> {
        match self {
            Hypothesis::DeclaredType { marginal, .. }
            | Hypothesis::ContentType { marginal, .. }
            | Hypothesis::Observation { marginal } => *marginal,
        }
    }

    pub(crate) fn set_marginal(&mut self, value: f64) {
        match self {
            Hypothesis::DeclaredType { marginal, .. }
            | Hypothesis::ContentType { marginal, .. }
            | Hypothesis::Observation { marginal } => *marginal = Some(value),
        }
    }

    pub(crate) fn clear_marginal(&mut self) {
        match self {
            Hypothesis::DeclaredType { marginal, .. }
            | Hypothesis::ContentType { marginal, .. }
            | Hypothesis::Observation { marginal } => *marginal = None,
        }
    }
}

/// Semantic-identity key for deduplicating type hypotheses.
///
/// Observations have no structural key -- they are only ever equal to
/// themselves, which the builder models by never deduplicating them: each
/// call to `add_observation` inserts a fresh vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeHypothesisKey {
    pub kind: HypothesisKind,
    pub start: u64,
    pub size: u64,
    pub type_id: TypeId,
}

impl TypeHypothesisKey {
    pub fn new(kind: HypothesisKind, range: AddressRange, type_id: TypeId) -> Self {
        TypeHypothesisKey {
            kind,
            start: range.start,
            size: range.size,
            type_id,
        }
    }
}
