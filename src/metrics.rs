//! Weight arithmetic: folding attribute and sub-section verdicts into
//! section figures, and section figures into the document roll-up.
//!
//! Every fold is a sum of weighted contributions, so the result is
//! independent of evaluation order and the document figures always equal the
//! weight-proportional mean of their sections.

use crate::policy::{Criticality, FieldPolicy};
use crate::report::{
    AttributeCounts, AttributeResult, DocumentReport, EvaluationStatus, ResultMarker, SectionResult,
};

/// Running weighted tallies for one section.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightTally {
    pub matched: f64,
    pub predicted: f64,
    pub expected: f64,
    pub total: f64,
    pub score_mass: f64,
    pub cost: f64,
}

impl WeightTally {
    pub fn add_attribute(&mut self, attribute: &AttributeResult) {
        let weight = attribute.weight;
        match attribute.marker {
            Some(ResultMarker::Unscored) => {}
            Some(ResultMarker::MissingPredicted) => {
                self.expected += weight;
                self.total += weight;
                self.cost += weight;
            }
            Some(ResultMarker::MissingExpected) => {
                self.predicted += weight;
                self.total += weight;
                self.cost += weight;
            }
            // Scored leaves, including locally degraded ones.
            _ => {
                self.predicted += weight;
                self.expected += weight;
                self.total += weight;
                self.score_mass += attribute.score * weight;
                self.cost += (1.0 - attribute.score) * weight;
                if attribute.matched {
                    self.matched += weight;
                }
            }
        }
    }

    pub fn add_section(&mut self, section: &SectionResult) {
        self.matched += section.matched_weight;
        self.predicted += section.predicted_weight;
        self.expected += section.expected_weight;
        self.total += section.total_weight;
        self.score_mass += section.confidence * section.total_weight;
        self.cost += section.mismatch_cost;
    }

    /// An expected list item with no predicted counterpart: its subtree's
    /// full weight is missed on the recall side.
    pub fn add_false_negative(&mut self, item_weight: f64) {
        self.expected += item_weight;
        self.total += item_weight;
        self.cost += item_weight;
    }

    /// A predicted list item with no expected counterpart: precision miss.
    pub fn add_false_positive(&mut self, item_weight: f64) {
        self.predicted += item_weight;
        self.total += item_weight;
        self.cost += item_weight;
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    // Nothing on the denominator side means nothing to get wrong.
    if denominator <= 0.0 {
        1.0
    } else {
        numerator / denominator
    }
}

fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Build a [`SectionResult`] from its children and the container policy.
/// The container weight scales the subtree's contribution to its parent;
/// ratios are unaffected.
pub fn finalize_section(
    section_id: String,
    policy: &FieldPolicy,
    attributes: Vec<AttributeResult>,
    sub_results: Vec<SectionResult>,
    unmatched_predicted: Vec<serde_json::Value>,
    unmatched_expected: Vec<serde_json::Value>,
    mut tally: WeightTally,
) -> SectionResult {
    let scale = policy.weight;
    tally.matched *= scale;
    tally.predicted *= scale;
    tally.expected *= scale;
    tally.total *= scale;
    tally.score_mass *= scale;
    tally.cost *= scale;

    let accuracy = ratio(tally.matched, tally.total);
    let precision = ratio(tally.matched, tally.predicted);
    let recall = ratio(tally.matched, tally.expected);
    let confidence = ratio(tally.score_mass, tally.total);

    let critical_failure = attributes.iter().any(|attribute| {
        attribute.criticality == Criticality::Critical
            && !attribute.matched
            && attribute.marker != Some(ResultMarker::Unscored)
    }) || sub_results.iter().any(|sub| sub.critical_failure);

    SectionResult {
        section_id,
        attributes,
        sub_results,
        matched_weight: tally.matched,
        predicted_weight: tally.predicted,
        expected_weight: tally.expected,
        total_weight: tally.total,
        accuracy,
        precision,
        recall,
        f1: f1_score(precision, recall),
        confidence,
        mismatch_cost: tally.cost,
        matched: accuracy >= policy.threshold,
        critical_failure,
        unmatched_predicted,
        unmatched_expected,
    }
}

/// Walk the finished tree and count attribute dispositions.
pub fn count_attributes(root: &SectionResult) -> AttributeCounts {
    let mut counts = AttributeCounts::default();
    accumulate_counts(root, &mut counts);
    counts
}

fn accumulate_counts(section: &SectionResult, counts: &mut AttributeCounts) {
    for attribute in &section.attributes {
        counts.total += 1;
        match attribute.marker {
            Some(ResultMarker::Unscored) => counts.unscored += 1,
            Some(ResultMarker::MissingPredicted) => counts.missing += 1,
            Some(ResultMarker::MissingExpected) => counts.extra += 1,
            _ => {
                if attribute.matched {
                    counts.matched += 1;
                } else {
                    counts.mismatched += 1;
                }
            }
        }
    }
    counts.false_positive_items += section.unmatched_predicted.len();
    counts.false_negative_items += section.unmatched_expected.len();
    for sub in &section.sub_results {
        accumulate_counts(sub, counts);
    }
}

/// Assemble the document-level report from the finished root section.
pub fn document_report(
    document_id: String,
    generated_at: String,
    policy_checksum: String,
    root: SectionResult,
    root_threshold: f64,
) -> DocumentReport {
    let status = if root.critical_failure {
        EvaluationStatus::CriticalFailure
    } else if root.accuracy >= root_threshold {
        EvaluationStatus::Passed
    } else {
        EvaluationStatus::Failed
    };

    DocumentReport {
        report_version: crate::report::REPORT_VERSION,
        document_id,
        generated_at,
        policy_checksum,
        status,
        overall_accuracy: root.accuracy,
        overall_precision: root.precision,
        overall_recall: root.recall,
        overall_f1: root.f1,
        overall_confidence: root.confidence,
        total_cost: root.mismatch_cost,
        attribute_counts: count_attributes(&root),
        root,
    }
}
