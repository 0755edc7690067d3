//! FactorGraph: the bipartite graph container tying hypotheses and factors
//! together.
//!
//! Hypotheses and factors share a single `StableGraph` node space -- they are
//! kept as one undirected bipartite graph rather than two separate
//! containers with cross-referencing pointers, which sidesteps the ownership
//! cycles a hand-rolled object graph (parent pointers, child pointers,
//! shared factor references) would otherwise need reference counting to
//! break. Vertices never own each other; they are addressed by
//! [`HypothesisId`]/[`FactorId`], both newtypes over the same underlying
//! `NodeIndex`.
//!
//! Every hypothesis-factor link is given a fixed endpoint convention: the
//! hypothesis side is always endpoint `0`, the factor side always endpoint
//! `1`. This lets the inference engine call `send`/`receive` on an
//! [`EdgeState`] without re-deriving which side it's standing on each time.

use petgraph::stable_graph::StableGraph;
use petgraph::Undirected;
use serde::{Deserialize, Serialize};

use crate::edge::EdgeState;
use crate::factor::Factor;
use crate::hypothesis::Hypothesis;
use crate::id::{EdgeId, FactorId, HypothesisId};

/// Endpoint index of the hypothesis side of every link, per the fixed
/// convention described on [`FactorGraph`].
pub const HYPOTHESIS_ENDPOINT: usize = 0;
/// Endpoint index of the factor side of every link.
pub const FACTOR_ENDPOINT: usize = 1;

/// The payload of one vertex: either a hypothesis or a factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VertexData {
    Hypothesis(Hypothesis),
    Factor(Factor),
}

/// The bipartite factor graph: hypothesis vertices, factor vertices, and the
/// message state carried on the edges between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorGraph {
    graph: StableGraph<VertexData, EdgeState, Undirected, u32>,
}

impl FactorGraph {
    pub fn new() -> Self {
        FactorGraph {
            graph: StableGraph::default(),
        }
    }

    /// Inserts a hypothesis vertex with no edges yet. Dedup against existing
    /// hypotheses is the builder's job, not the graph's.
    pub fn add_hypothesis(&mut self, hypothesis: Hypothesis) -> HypothesisId {
        HypothesisId(self.graph.add_node(VertexData::Hypothesis(hypothesis)))
    }

    /// Inserts a factor vertex with no edges yet.
    pub fn add_factor(&mut self, factor: Factor) -> FactorId {
        FactorId(self.graph.add_node(VertexData::Factor(factor)))
    }

    /// Links a factor to one of its neighbour hypotheses with a fresh,
    /// neutral [`EdgeState`]. Does not check that `hypothesis` actually
    /// appears in `factor`'s neighbour list -- the caller (the builder) is
    /// responsible for linking every neighbour exactly once, in order.
    pub fn link(&mut self, factor: FactorId, hypothesis: HypothesisId) -> EdgeId {
        EdgeId(self.graph.add_edge(hypothesis.0, factor.0, EdgeState::new()))
    }

    pub fn hypothesis(&self, id: HypothesisId) -> &Hypothesis {
        match &self.graph[id.0] {
            VertexData::Hypothesis(h) => h,
            VertexData::Factor(_) => panic!("{id} does not refer to a hypothesis vertex"),
        }
    }

    pub fn hypothesis_mut(&mut self, id: HypothesisId) -> &mut Hypothesis {
        match &mut self.graph[id.0] {
            VertexData::Hypothesis(h) => h,
            VertexData::Factor(_) => panic!("{id} does not refer to a hypothesis vertex"),
        }
    }

    pub fn factor(&self, id: FactorId) -> &Factor {
        match &self.graph[id.0] {
            VertexData::Factor(f) => f,
            VertexData::Hypothesis(_) => panic!("{id} does not refer to a factor vertex"),
        }
    }

    pub fn hypothesis_ids(&self) -> impl Iterator<Item = HypothesisId> + '_ {
        self.graph.node_indices().filter_map(move |idx| {
            matches!(self.graph[idx], VertexData::Hypothesis(_)).then_some(HypothesisId(idx))
        })
    }

    pub fn factor_ids(&self) -> impl Iterator<Item = FactorId> + '_ {
        self.graph.node_indices().filter_map(move |idx| {
            matches!(self.graph[idx], VertexData::Factor(_)).then_some(FactorId(idx))
        })
    }

    pub fn hypothesis_count(&self) -> usize {
        self.hypothesis_ids().count()
    }

    pub fn factor_count(&self) -> usize {
        self.factor_ids().count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.graph.edge_indices().map(EdgeId)
    }

    /// The `(EdgeId, FactorId)` pairs for every factor this hypothesis is
    /// linked to, in no particular order.
    pub fn hypothesis_edges(&self, id: HypothesisId) -> Vec<(EdgeId, FactorId)> {
        self.graph
            .edges(id.0)
            .map(|e| (EdgeId(e.id()), FactorId(e.target())))
            .collect()
    }

    /// Looks up the edge linking `factor` and `hypothesis`, if one exists.
    pub fn edge_between(&self, factor: FactorId, hypothesis: HypothesisId) -> Option<EdgeId> {
        self.graph.find_edge(hypothesis.0, factor.0).map(EdgeId)
    }

    pub fn edge_state(&self, id: EdgeId) -> &EdgeState {
        &self.graph[id.0]
    }

    pub fn edge_state_mut(&mut self, id: EdgeId) -> &mut EdgeState {
        &mut self.graph[id.0]
    }
}

impl Default for FactorGraph {
    fn default() -> Self {
        FactorGraph::new()
    }
}
