//! The single public entry point: walks every top-level typed block, builds
//! a factor graph, and runs inference over it.

use crate::builder::GraphBuilder;
use crate::conflict::conflict_subgraph;
use crate::destructurer::destructure;
use crate::error::CoreError;
use crate::graph::FactorGraph;
use crate::inference::{infer, InferenceOutcome};
use crate::repository::{ProcessState, TypeRepository};

/// Builds a [`FactorGraph`] for every typed block `process` reports and runs
/// belief propagation over it.
///
/// Fails before any graph is built if `process` exposes no typed-block
/// layer, or if any top-level block names a type `types` doesn't recognise --
/// both are construction-fatal per the error taxonomy. Every other failure
/// mode encountered while walking a block's structure (a bad cast, a missing
/// field, a failed dereference, a partially readable range) is absorbed
/// silently: the destructuring walk just stops recursing into that sub-tree.
///
/// Non-convergence is not an error: it is reported back to the caller as
/// [`InferenceOutcome::NotConverged`] inside the returned graph's hypotheses,
/// which are simply left without a marginal.
pub fn run_analysis(
    types: &dyn TypeRepository,
    process: &dyn ProcessState,
) -> Result<(FactorGraph, InferenceOutcome), CoreError> {
    let blocks = process.typed_blocks().ok_or(CoreError::NoTypedBlockLayer)?;

    for &(_, type_id) in &blocks {
        if types.get_type(type_id).is_none() {
            return Err(CoreError::UnknownTypeId { id: type_id });
        }
    }

    tracing::debug!(block_count = blocks.len(), "starting destructuring walk");

    let mut builder = GraphBuilder::new();
    for (range, type_id) in blocks {
        destructure(&mut builder, types, process, range, type_id);
    }
    conflict_subgraph(&mut builder);

    let mut graph = builder.into_graph();
    tracing::debug!(
        hypotheses = graph.hypothesis_count(),
        factors = graph.factor_count(),
        "destructuring complete, running belief propagation"
    );

    let outcome = infer(&mut graph);
    match outcome {
        InferenceOutcome::Converged { iterations } => {
            tracing::info!(iterations, "belief propagation converged");
        }
        InferenceOutcome::NotConverged => {
            tracing::warn!("belief propagation did not converge within the iteration cap");
        }
    }

    Ok((graph, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressRange;
    use crate::id::TypeId;
    use crate::repository::TypeShape;
    use std::collections::HashMap;

    struct FakeTypes(HashMap<TypeId, TypeShape>);

    impl TypeRepository for FakeTypes {
        fn get_type(&self, type_id: TypeId) -> Option<TypeShape> {
            self.0.get(&type_id).cloned()
        }
        fn size_of(&self, _type_id: TypeId) -> Option<u64> {
            Some(4)
        }
    }

    struct FakeProcess {
        blocks: Option<Vec<(AddressRange, TypeId)>>,
    }

    impl ProcessState for FakeProcess {
        fn typed_blocks(&self) -> Option<Vec<(AddressRange, TypeId)>> {
            self.blocks.clone()
        }
        fn read_range(&self, range: AddressRange) -> u64 {
            range.size
        }
        fn read_pointer(&self, _range: AddressRange) -> Option<u64> {
            None
        }
    }

    #[test]
    fn missing_typed_block_layer_is_fatal() {
        let types = FakeTypes(HashMap::new());
        let process = FakeProcess { blocks: None };
        let err = run_analysis(&types, &process).unwrap_err();
        assert!(matches!(err, CoreError::NoTypedBlockLayer));
    }

    #[test]
    fn unknown_top_level_type_is_fatal() {
        let types = FakeTypes(HashMap::new());
        let process = FakeProcess {
            blocks: Some(vec![(AddressRange::new(0x1000, 4), TypeId(99))]),
        };
        let err = run_analysis(&types, &process).unwrap_err();
        assert!(matches!(err, CoreError::UnknownTypeId { id: TypeId(99) }));
    }

    #[test]
    fn single_scalar_block_converges() {
        let types = FakeTypes(HashMap::from([(TypeId(1), TypeShape::Scalar)]));
        let process = FakeProcess {
            blocks: Some(vec![(AddressRange::new(0x1000, 4), TypeId(1))]),
        };
        let (graph, outcome) = run_analysis(&types, &process).unwrap();
        assert!(matches!(outcome, InferenceOutcome::Converged { .. }));
        assert_eq!(graph.hypothesis_count(), 2);
    }
}
