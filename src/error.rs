use thiserror::Error;

/// Fatal configuration problems, surfaced before any comparison runs.
///
/// Everything that can go wrong during an evaluation itself (numeric parse
/// failures, embedding outages, structural mismatches) is degraded into the
/// result tree instead; only a broken policy aborts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("policy config declares no fields")]
    EmptyPolicy,

    #[error("malformed field path: {path}: {reason}")]
    MalformedPath { path: String, reason: String },

    #[error("field path {path} is declared as both an object and a list")]
    ConflictingShape { path: String },

    #[error("comparator {comparator} is not valid for {path}: {reason}")]
    InvalidComparator {
        path: String,
        comparator: String,
        reason: String,
    },

    #[error("scalar field {path} has no comparator")]
    MissingComparator { path: String },

    #[error("threshold {threshold} for {path} is outside [0, 1]")]
    InvalidThreshold { path: String, threshold: f64 },

    #[error("weight {weight} for {path} must be a positive finite number")]
    InvalidWeight { path: String, weight: f64 },
}
