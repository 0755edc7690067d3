//! Factor-graph construction and loopy belief propagation for probabilistic
//! memory type inference.
//!
//! [`run_analysis`] is the single public entry point: given a
//! [`TypeRepository`] and a [`ProcessState`], it walks every top-level typed
//! block, builds a [`FactorGraph`] of competing type hypotheses, runs
//! synchronous belief propagation over it, and returns the graph with each
//! hypothesis's marginal probability filled in.

pub mod address;
pub mod analysis;
pub mod builder;
pub mod conflict;
pub mod destructurer;
pub mod edge;
pub mod error;
pub mod factor;
pub mod graph;
pub mod hypothesis;
pub mod id;
pub mod inference;
pub mod repository;

pub use address::AddressRange;
pub use analysis::run_analysis;
pub use conflict::conflict_subgraph;
pub use edge::{EdgeState, Message};
pub use error::CoreError;
pub use factor::{Factor, FactorKind, WeightShapeError};
pub use graph::{FactorGraph, VertexData};
pub use hypothesis::{Hypothesis, HypothesisKind, TypeHypothesisKey};
pub use id::{EdgeId, FactorId, HypothesisId, TypeId};
pub use inference::{infer, InferenceOutcome, MAX_ITERATIONS};
pub use repository::{FieldDescriptor, FieldKind, ProcessState, TypeRepository, TypeShape};
