//! Property-based tests for two universal invariants of the factor graph:
//! factor degree/table-length agreement, and symmetric initial marginals
//! before any message has been sent.

use memprobe_core::{AddressRange, EdgeState, Factor, FactorGraph, FactorKind, Hypothesis, Message};
use proptest::prelude::*;

proptest! {
    /// `Factor::new` accepts a weight table iff its length is exactly
    /// `2^degree`, for any degree between 1 and 4 (this core's factor kinds
    /// only ever reach degree 3, but the shape invariant itself doesn't
    /// depend on that).
    #[test]
    fn weight_table_must_match_two_to_the_degree(degree in 1usize..=4, slack in -2isize..=2isize) {
        let correct_len = 1usize << degree;
        let actual_len = (correct_len as isize + slack).max(0) as usize;

        let mut graph = FactorGraph::new();
        let neighbours: Vec<_> = (0..degree)
            .map(|_| graph.add_hypothesis(Hypothesis::observation()))
            .collect();
        let weights = vec![1.0; actual_len];
        let result = Factor::new(FactorKind::Decomposition, neighbours, weights);

        if actual_len == correct_len {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(result.is_err());
        }
    }

    /// A freshly reset edge that never sends a message reports the neutral
    /// `(0.5, 0.5)` message from either side -- the basis for the
    /// "symmetric initial state" property: any hypothesis with at least one
    /// neighbour computes marginal exactly 0.5 before inference runs.
    #[test]
    fn reset_edge_is_neutral_from_both_sides(noise in 0.0f64..1.0) {
        let mut edge = EdgeState::new();
        // Perturb and reset -- reset must always win regardless of prior state.
        edge.send(0, (noise, 1.0 - noise));
        edge.commit();
        edge.reset();

        let neutral: Message = (0.5, 0.5);
        prop_assert_eq!(edge.receive(0), neutral);
        prop_assert_eq!(edge.receive(1), neutral);
    }
}

proptest! {
    /// Every element of an array decomposition falls inside the parent
    /// range, and consecutive elements never overlap -- the geometric fact
    /// the destructurer's array-decomposition case relies on without
    /// re-deriving it per call.
    #[test]
    fn array_elements_tile_the_parent_range_without_overlap(
        start in 0u64..1_000_000,
        element_size in 1u64..64,
        count in 1u64..32,
    ) {
        let parent = AddressRange::new(start, element_size * count);
        for index in 0..count {
            let element = parent.array_element(index, element_size);
            prop_assert!(element.start >= parent.start);
            prop_assert!(element.end() <= parent.end());
            if index + 1 < count {
                let next = parent.array_element(index + 1, element_size);
                prop_assert_eq!(element.end(), next.start);
            }
        }
    }
}
