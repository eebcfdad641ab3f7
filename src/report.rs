//! The immutable evaluation result tree.
//!
//! Field names and nesting are part of the crate's output contract:
//! downstream dashboards compare reports across runs, so renames here are
//! breaking changes. `report_version` is bumped instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::policy::{ComparatorKind, Criticality};

pub const REPORT_VERSION: u32 = 1;

/// Why a leaf carries the score it does, when that score was not produced by
/// a clean comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultMarker {
    /// Numeric comparator could not parse one side; degraded to score 0.
    NumericParseFailure,
    /// Embedding provider failed or timed out; degraded to score 0.
    EmbeddingUnavailable,
    /// Declared field absent from the predicted document (recall miss).
    MissingPredicted,
    /// Declared field absent from the expected document (precision miss).
    MissingExpected,
    /// Field present in a document but not declared in the policy; recorded
    /// for audit with zero weight, never counted as a mismatch.
    Unscored,
}

/// Leaf of the verdict tree. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeResult {
    pub field_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    pub score: f64,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparator: Option<ComparatorKind>,
    pub weight: f64,
    pub criticality: Criticality,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<ResultMarker>,
}

/// Aggregate over one object, list, or matched list item. Built bottom-up;
/// every figure is a function of this section's own children only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionResult {
    pub section_id: String,
    pub attributes: Vec<AttributeResult>,
    pub sub_results: Vec<SectionResult>,
    pub matched_weight: f64,
    pub predicted_weight: f64,
    pub expected_weight: f64,
    pub total_weight: f64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Weighted mean of raw leaf scores (continuous counterpart of accuracy).
    pub confidence: f64,
    /// Residual weighted mismatch: sum of (1 - score) * weight over scored
    /// leaves.
    pub mismatch_cost: f64,
    /// Section verdict: aggregate accuracy against this section's threshold.
    pub matched: bool,
    pub critical_failure: bool,
    /// Raw predicted list items with no counterpart (false positives).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmatched_predicted: Vec<Value>,
    /// Raw expected list items with no counterpart (false negatives).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmatched_expected: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Passed,
    Failed,
    /// A critical field failed somewhere in the tree; overrides the numeric
    /// accuracy for gating decisions regardless of how high it is.
    CriticalFailure,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeCounts {
    pub total: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub missing: usize,
    pub extra: usize,
    pub unscored: usize,
    pub false_positive_items: usize,
    pub false_negative_items: usize,
}

/// Top-level result of one evaluation invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub report_version: u32,
    pub document_id: String,
    pub generated_at: String,
    /// Checksum of the canonical policy JSON, so longitudinal dashboards can
    /// tell which configuration produced a report.
    pub policy_checksum: String,
    pub status: EvaluationStatus,
    pub overall_accuracy: f64,
    pub overall_precision: f64,
    pub overall_recall: f64,
    pub overall_f1: f64,
    pub overall_confidence: f64,
    pub total_cost: f64,
    pub attribute_counts: AttributeCounts,
    pub root: SectionResult,
}
