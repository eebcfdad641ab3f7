//! Structured-document evaluation engine.
//!
//! Compares a machine-extracted nested document against a ground-truth
//! baseline under a declarative field-policy configuration and produces a
//! graded accuracy report: per-attribute verdicts, optimally aligned list
//! items, and weighted precision/recall/accuracy roll-ups from section to
//! document level.
//!
//! The engine is a pure function over (predicted, expected, policy): the
//! same inputs always produce the same verdict tree, configuration problems
//! fail before any comparison runs, and everything that goes wrong during a
//! comparison degrades a single leaf instead of aborting the evaluation.

pub mod align;
pub mod cli;
pub mod commands;
pub mod comparators;
pub mod corpus;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod report;
pub mod util;

pub use corpus::{CorpusComparison, compare_runs};
pub use embedding::{EmbeddingError, EmbeddingProvider, LocalHashEmbedder};
pub use engine::evaluate_document;
pub use error::ConfigError;
pub use policy::{ComparatorKind, Criticality, FieldPolicy, Normalization, PolicyConfig};
pub use report::{
    AttributeCounts, AttributeResult, DocumentReport, EvaluationStatus, ResultMarker,
    SectionResult,
};
