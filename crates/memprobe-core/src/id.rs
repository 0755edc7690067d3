//! Stable ID newtypes for graph entities.
//!
//! [`HypothesisId`] and [`FactorId`] both index into the same underlying
//! `StableGraph` (the graph is bipartite over a single petgraph node space),
//! but are kept as distinct Rust types so a hypothesis handle can never be
//! passed where a factor handle is expected. [`EdgeId`] identifies the link
//! between one hypothesis and one factor.

use std::fmt;

use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};

/// Identifies a type id interned by the external type repository.
///
/// Opaque by design -- the core never interprets the value, only compares it
/// for equality and uses it as a hash key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeId(pub u64);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Handle to a hypothesis vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HypothesisId(pub(crate) NodeIndex<u32>);

/// Handle to a factor vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactorId(pub(crate) NodeIndex<u32>);

/// Handle to an edge linking one hypothesis to one factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub(crate) EdgeIndex<u32>);

impl fmt::Display for HypothesisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.0.index())
    }
}

impl fmt::Display for FactorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0.index())
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_id_display() {
        assert_eq!(format!("{}", TypeId(42)), "TypeId(42)");
    }

    #[test]
    fn hypothesis_and_factor_ids_are_distinct_types() {
        let h = HypothesisId(NodeIndex::new(3));
        let f = FactorId(NodeIndex::new(3));
        // Same underlying index, different Rust types -- this is a
        // compile-time guarantee; we just check the indices line up.
        assert_eq!(h.0.index(), f.0.index());
    }

    #[test]
    fn id_display_formats() {
        assert_eq!(format!("{}", HypothesisId(NodeIndex::new(5))), "H5");
        assert_eq!(format!("{}", FactorId(NodeIndex::new(6))), "F6");
        assert_eq!(format!("{}", EdgeId(EdgeIndex::new(7))), "E7");
    }

    #[test]
    fn serde_roundtrip() {
        let id = TypeId(99);
        let json = serde_json::to_string(&id).unwrap();
        let back: TypeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
