//! Message state carried on each hypothesis-factor edge.
//!
//! Inference is synchronous (Jacobi-style): every edge reads the messages
//! produced during the *previous* round while writing the messages for the
//! next one, so a full sweep never observes a mix of old and new values.
//! `in_messages` is always the writable side of a round; `commit` swaps it
//! into `out_messages` and reports whether the swap changed anything.

use serde::{Deserialize, Serialize};

/// An unnormalised two-state message: `(weight_false, weight_true)`.
pub type Message = (f64, f64);

/// The message sent before any real belief has propagated: both states
/// equally likely.
const NEUTRAL: Message = (0.5, 0.5);

/// Ratio window a component's new value must fall within, relative to its
/// previous value, to count as converged.
const CONVERGED_LOW: f64 = 0.99;
const CONVERGED_HIGH: f64 = 1.01;

/// Per-edge message banks for both directions of a hypothesis-factor edge.
///
/// Endpoint `0` is the hypothesis side, endpoint `1` is the factor side.
/// `send(0, m)` stages the message the hypothesis is sending to the factor;
/// `receive(0)` reads the message the factor sent back during the previous
/// round (and symmetrically for endpoint `1`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeState {
    in_messages: [Message; 2],
    out_messages: [Message; 2],
}

impl EdgeState {
    pub fn new() -> Self {
        EdgeState {
            in_messages: [NEUTRAL, NEUTRAL],
            out_messages: [NEUTRAL, NEUTRAL],
        }
    }

    /// Resets both message banks to neutral, as at the start of inference.
    pub fn reset(&mut self) {
        *self = EdgeState::new();
    }

    /// Stages a message from `endpoint_index`'s side of the edge for the
    /// next round. Not visible to `receive` until [`EdgeState::commit`] runs.
    pub fn send(&mut self, endpoint_index: usize, message: Message) {
        self.in_messages[endpoint_index] = message;
    }

    /// Reads the message the *other* endpoint sent during the previous
    /// round.
    pub fn receive(&self, endpoint_index: usize) -> Message {
        self.out_messages[1 - endpoint_index]
    }

    /// Publishes the staged messages, becoming visible to `receive`, and
    /// reports whether every component of every message stayed within the
    /// convergence ratio window of its previous value.
    ///
    /// A previous value of zero is treated as not converged -- there is no
    /// ratio to compare against, and a message collapsing to zero is itself
    /// informative enough to warrant another round.
    pub fn commit(&mut self) -> bool {
        let mut converged = true;
        for endpoint in 0..2 {
            for component in 0..2 {
                let prev = select(self.out_messages[endpoint], component);
                let next = select(self.in_messages[endpoint], component);
                if prev == 0.0 {
                    converged = false;
                    continue;
                }
                let ratio = next / prev;
                if !(CONVERGED_LOW..=CONVERGED_HIGH).contains(&ratio) {
                    converged = false;
                }
            }
        }
        self.out_messages = self.in_messages;
        converged
    }
}

impl Default for EdgeState {
    fn default() -> Self {
        EdgeState::new()
    }
}

fn select(message: Message, component: usize) -> f64 {
    if component == 0 {
        message.0
    } else {
        message.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_edge_starts_neutral() {
        let e = EdgeState::new();
        assert_eq!(e.receive(0), NEUTRAL);
        assert_eq!(e.receive(1), NEUTRAL);
    }

    #[test]
    fn send_is_not_visible_until_commit() {
        let mut e = EdgeState::new();
        e.send(0, (1.0, 0.0));
        assert_eq!(e.receive(1), NEUTRAL);
        e.commit();
        assert_eq!(e.receive(1), (1.0, 0.0));
    }

    #[test]
    fn commit_with_no_change_converges() {
        let mut e = EdgeState::new();
        // Starting from a fresh edge, in == out == NEUTRAL already, so even
        // this first commit sees a 1.0 ratio on every component.
        e.send(0, NEUTRAL);
        e.send(1, NEUTRAL);
        assert!(e.commit());
        e.send(0, NEUTRAL);
        e.send(1, NEUTRAL);
        assert!(e.commit());
    }

    #[test]
    fn commit_with_large_change_does_not_converge() {
        let mut e = EdgeState::new();
        e.send(0, (1.0, 0.0));
        e.send(1, (1.0, 0.0));
        assert!(!e.commit());
        e.send(0, (0.1, 0.9));
        e.send(1, (0.1, 0.9));
        assert!(!e.commit());
    }

    #[test]
    fn two_commits_in_a_row_with_same_message_converge() {
        let mut e = EdgeState::new();
        let m = (0.3, 0.7);
        e.send(0, m);
        e.send(1, m);
        e.commit();
        e.send(0, m);
        e.send(1, m);
        assert!(e.commit());
    }

    #[test]
    fn reset_returns_to_neutral_after_sends() {
        let mut e = EdgeState::new();
        e.send(0, (1.0, 0.0));
        e.commit();
        e.reset();
        assert_eq!(e.receive(0), NEUTRAL);
        assert_eq!(e.receive(1), NEUTRAL);
    }
}
