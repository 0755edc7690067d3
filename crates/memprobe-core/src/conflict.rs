//! The conflict subgraph: additional factors linking hypotheses that make
//! mutually exclusive claims about overlapping memory.
//!
//! Two declared-type hypotheses whose ranges overlap without one containing
//! the other (e.g. two unrelated locals that happen to alias after a union
//! or a bad cast) can't both be true. Finding every such pair is an O(n^2)
//! scan over the hypothesis catalogue -- tractable for the block counts this
//! engine sees, but the weight table for an overlap factor depends on
//! calibration data this crate doesn't have yet, so the scan and the factor
//! construction are left for when that data exists.
//!
//! Called once per [`crate::analysis::run_analysis`], after the destructuring
//! walk has populated the builder and before inference runs.

use crate::builder::GraphBuilder;

/// Adds conflict factors for overlapping hypotheses to `builder`'s graph.
///
/// Currently a no-op: the destructuring walk alone produces a graph whose
/// belief propagation already handles every case this crate implements.
pub fn conflict_subgraph(_builder: &mut GraphBuilder) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_subgraph_does_not_touch_an_empty_builder() {
        let mut builder = GraphBuilder::new();
        conflict_subgraph(&mut builder);
        assert_eq!(builder.graph().hypothesis_count(), 0);
        assert_eq!(builder.graph().factor_count(), 0);
    }
}
