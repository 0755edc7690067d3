//! Incremental factor-graph construction with deduplication.
//!
//! The destructuring walk revisits the same address range from multiple
//! paths (a record field and an array element can describe the same bytes,
//! a cyclic pointer chain revisits its own origin). [`GraphBuilder`] keeps
//! catalogues keyed by semantic identity so that re-deriving a hypothesis or
//! factor that already exists returns the existing vertex instead of a
//! duplicate. Deduplication is also how the destructuring walk knows when to
//! stop recursing: [`GraphBuilder::add_hypothesis`] reports whether the
//! hypothesis was newly created, and a non-new result means the same
//! sub-tree has already been explored.

use std::collections::HashMap;

use crate::address::AddressRange;
use crate::factor::{factor_key, Factor, FactorKind, WeightShapeError};
use crate::graph::FactorGraph;
use crate::hypothesis::{Hypothesis, HypothesisKind, TypeHypothesisKey};
use crate::id::{FactorId, HypothesisId, TypeId};

/// Builds a [`FactorGraph`] incrementally, deduplicating hypotheses and
/// factors by semantic identity.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: FactorGraph,
    type_hypotheses: HashMap<TypeHypothesisKey, HypothesisId>,
    factors: HashMap<(FactorKind, Vec<HypothesisId>), FactorId>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        GraphBuilder {
            graph: FactorGraph::new(),
            type_hypotheses: HashMap::new(),
            factors: HashMap::new(),
        }
    }

    /// Adds a `DeclaredType` or `ContentType` hypothesis, or returns the
    /// existing one for the same `(kind, range, type_id)`. The returned
    /// `bool` is `true` iff a new vertex was created; the destructuring walk
    /// uses this to decide whether to keep recursing into the range.
    pub fn add_hypothesis(
        &mut self,
        kind: HypothesisKind,
        range: AddressRange,
        type_id: TypeId,
    ) -> (HypothesisId, bool) {
        debug_assert_ne!(kind, HypothesisKind::Observation);
        let key = TypeHypothesisKey::new(kind, range, type_id);
        if let Some(&id) = self.type_hypotheses.get(&key) {
            return (id, false);
        }
        let hypothesis = match kind {
            HypothesisKind::DeclaredType => Hypothesis::declared_type(range, type_id),
            HypothesisKind::ContentType => Hypothesis::content_type(range, type_id),
            HypothesisKind::Observation => unreachable!(),
        };
        let id = self.graph.add_hypothesis(hypothesis);
        self.type_hypotheses.insert(key, id);
        (id, true)
    }

    /// Looks up an existing `DeclaredType`/`ContentType` hypothesis without
    /// inserting one, for callers that revisit a `(kind, range, type_id)`
    /// they know might already be in the catalogue.
    pub fn lookup_hypothesis(
        &self,
        kind: HypothesisKind,
        range: AddressRange,
        type_id: TypeId,
    ) -> Option<HypothesisId> {
        self.type_hypotheses
            .get(&TypeHypothesisKey::new(kind, range, type_id))
            .copied()
    }

    /// Adds an observation anchor. Observations have no structural identity,
    /// so this never deduplicates: every call inserts a fresh vertex.
    pub fn add_observation(&mut self) -> HypothesisId {
        self.graph.add_hypothesis(Hypothesis::observation())
    }

    /// Adds a factor over `neighbours` (in definition order, which fixes the
    /// bit semantics of `weights`), or returns the existing factor if one
    /// already links the same kind to the same set of neighbours. Links to
    /// every neighbour are only created the first time.
    pub fn add_factor(
        &mut self,
        kind: FactorKind,
        neighbours: &[HypothesisId],
        weights: Vec<f64>,
    ) -> Result<FactorId, WeightShapeError> {
        let key = factor_key(kind, neighbours);
        if let Some(&id) = self.factors.get(&key) {
            return Ok(id);
        }
        let factor = Factor::new(kind, neighbours.iter().copied(), weights)?;
        let id = self.graph.add_factor(factor);
        for &neighbour in neighbours {
            self.graph.link(id, neighbour);
        }
        self.factors.insert(key, id);
        Ok(id)
    }

    /// Consumes the builder, yielding the constructed graph.
    pub fn into_graph(self) -> FactorGraph {
        self.graph
    }

    pub fn graph(&self) -> &FactorGraph {
        &self.graph
    }
}
