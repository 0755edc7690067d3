//! Synchronous loopy belief propagation over a [`FactorGraph`].
//!
//! Every round, every hypothesis computes its outgoing messages from the
//! *previous* round's incoming messages, every factor does the same, and
//! only then are all edges committed together -- no vertex ever sees a
//! mixture of old and new messages within a round (Jacobi-style update,
//! as opposed to Gauss-Seidel). A round is converged only if every edge in
//! the graph reports convergence; a single disagreeing edge keeps the whole
//! graph going.

use crate::factor::Factor;
use crate::graph::{FactorGraph, FACTOR_ENDPOINT, HYPOTHESIS_ENDPOINT};
use crate::id::{EdgeId, FactorId, HypothesisId};

/// Hard cap on rounds of message passing. Loopy belief propagation has no
/// general convergence guarantee, so this bounds how long `infer` can run.
pub const MAX_ITERATIONS: usize = 1000;

/// The result of running inference to a fixed point (or giving up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InferenceOutcome {
    /// All edges stabilised within `iterations` rounds. Every hypothesis's
    /// marginal has been computed and set.
    Converged { iterations: usize },
    /// The iteration cap was reached without every edge stabilising.
    /// Hypothesis marginals are left as they were (typically `None`) --
    /// callers must treat this graph's beliefs as undefined.
    NotConverged,
}

/// Runs synchronous loopy belief propagation on `graph` until every edge
/// converges or [`MAX_ITERATIONS`] rounds have elapsed.
pub fn infer(graph: &mut FactorGraph) -> InferenceOutcome {
    for edge in graph.edge_ids().collect::<Vec<_>>() {
        graph.edge_state_mut(edge).reset();
    }

    let mut converged = false;
    let mut iterations_used = 0;

    for iteration in 1..=MAX_ITERATIONS {
        iterations_used = iteration;
        if run_round(graph) {
            converged = true;
            break;
        }
    }

    if !converged {
        return InferenceOutcome::NotConverged;
    }

    for hypothesis in graph.hypothesis_ids().collect::<Vec<_>>() {
        let marginal = compute_marginal(graph, hypothesis);
        graph.hypothesis_mut(hypothesis).set_marginal(marginal);
    }

    InferenceOutcome::Converged {
        iterations: iterations_used,
    }
}

/// Runs one synchronous round: every vertex sends, then every edge commits.
/// Returns whether every edge reported convergence this round. Separated out
/// of [`infer`] so tests can drive rounds directly without going through its
/// initial `reset()` pass.
fn run_round(graph: &mut FactorGraph) -> bool {
    for hypothesis in graph.hypothesis_ids().collect::<Vec<_>>() {
        send_hypothesis_messages(graph, hypothesis);
    }
    for factor in graph.factor_ids().collect::<Vec<_>>() {
        send_factor_messages(graph, factor);
    }

    let mut round_converged = true;
    for edge in graph.edge_ids().collect::<Vec<_>>() {
        // AND, not OR: one unsettled edge means the graph as a whole has
        // not converged, even if every other edge has.
        round_converged &= graph.edge_state_mut(edge).commit();
    }
    round_converged
}

/// A hypothesis's outgoing message to one neighbouring factor is the
/// componentwise product of the messages it received from every *other*
/// neighbouring factor last round. A hypothesis with a single neighbour
/// sends the multiplicative identity, `(1, 1)`.
fn send_hypothesis_messages(graph: &mut FactorGraph, id: HypothesisId) {
    let edges = graph.hypothesis_edges(id);
    for (i, &(edge_id, _)) in edges.iter().enumerate() {
        let mut product = (1.0, 1.0);
        for (j, &(other_edge, _)) in edges.iter().enumerate() {
            if i == j {
                continue;
            }
            let incoming = graph.edge_state(other_edge).receive(HYPOTHESIS_ENDPOINT);
            product.0 *= incoming.0;
            product.1 *= incoming.1;
        }
        graph
            .edge_state_mut(edge_id)
            .send(HYPOTHESIS_ENDPOINT, normalize(product));
    }
}

/// A factor's outgoing message to neighbour `k` sums the weighted product of
/// every other neighbour's incoming message, over every assignment to those
/// other neighbours, bucketed by the truth value `k` would take in that
/// assignment. Weight index bit `j` is the truth value of the `j`-th
/// neighbour, so sweeping `0..2^degree` and reading bit `k` out of each
/// index does the bucketing without building assignments explicitly.
fn send_factor_messages(graph: &mut FactorGraph, id: FactorId) {
    let factor: Factor = graph.factor(id).clone();
    let neighbours = factor.neighbours().to_vec();
    let degree = neighbours.len();

    let edge_ids: Vec<EdgeId> = neighbours
        .iter()
        .map(|&h| {
            graph
                .edge_between(id, h)
                .expect("every factor neighbour must be linked")
        })
        .collect();
    let incoming: Vec<_> = edge_ids
        .iter()
        .map(|&e| graph.edge_state(e).receive(FACTOR_ENDPOINT))
        .collect();

    for k in 0..degree {
        let mut out = (0.0, 0.0);
        for index in 0..(1usize << degree) {
            let mut term = factor.weight_at(index);
            for j in 0..degree {
                if j == k {
                    continue;
                }
                let bit = (index >> j) & 1;
                term *= if bit == 0 { incoming[j].0 } else { incoming[j].1 };
            }
            if (index >> k) & 1 == 0 {
                out.0 += term;
            } else {
                out.1 += term;
            }
        }
        graph
            .edge_state_mut(edge_ids[k])
            .send(FACTOR_ENDPOINT, normalize(out));
    }
}

/// Messages are kept normalised to sum to `1` after every send. Besides
/// bounding their magnitude across rounds, this is what makes the
/// convergence ratio test in [`crate::edge::EdgeState::commit`] meaningful:
/// an unnormalised product can grow or shrink geometrically round over
/// round even at a stable belief, which would never satisfy a ratio check.
fn normalize(message: (f64, f64)) -> (f64, f64) {
    let total = message.0 + message.1;
    if total > 0.0 {
        (message.0 / total, message.1 / total)
    } else {
        (0.5, 0.5)
    }
}

/// The converged marginal for a hypothesis: the normalised product of the
/// messages it receives from every neighbouring factor. A hypothesis with no
/// neighbours (shouldn't occur for a well-formed graph) reports `0.5`.
fn compute_marginal(graph: &FactorGraph, id: HypothesisId) -> f64 {
    let mut product = (1.0, 1.0);
    for (edge, _) in graph.hypothesis_edges(id) {
        let incoming = graph.edge_state(edge).receive(HYPOTHESIS_ENDPOINT);
        product.0 *= incoming.0;
        product.1 *= incoming.1;
    }
    let total = product.0 + product.1;
    if total == 0.0 {
        0.5
    } else {
        product.1 / total
    }
}
