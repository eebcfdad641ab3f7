//! The recursive comparator: walks predicted and expected values in
//! lock-step over the resolved schema, delegating scalars to the comparator
//! library, lists to the aligner, and objects to itself.
//!
//! Evaluation is a pure function of (predicted, expected, config): no shared
//! state, no I/O apart from the injected embedding provider, and any error
//! past configuration time degrades a single leaf instead of aborting.

use std::collections::BTreeSet;

use rayon::prelude::*;
use serde_json::Value;

use crate::align::{self, CostMatrix};
use crate::comparators::compare_leaf;
use crate::embedding::EmbeddingProvider;
use crate::error::ConfigError;
use crate::metrics::{self, WeightTally};
use crate::policy::{
    ComparatorKind, FieldPolicy, ListSchema, ObjectSchema, PolicyConfig, SchemaNode, resolve_schema,
};
use crate::report::{AttributeResult, DocumentReport, ResultMarker, SectionResult};
use crate::util::{now_utc_string, sha256_hex};

/// Evaluate one predicted document against its expected baseline under the
/// given policy. The only fallible part is policy resolution; it runs before
/// any comparison, so callers see either a complete report or a
/// [`ConfigError`] with no partial work.
pub fn evaluate_document(
    predicted: &Value,
    expected: &Value,
    config: &PolicyConfig,
    embedder: &dyn EmbeddingProvider,
    document_id: &str,
) -> Result<DocumentReport, ConfigError> {
    let schema = resolve_schema(config)?;
    let policy_checksum = sha256_hex(&serde_json::to_vec(config).unwrap_or_default());
    let root_threshold = schema.policy().threshold;

    let walker = Walker { embedder };
    let root = match walker.evaluate_node("document", &schema, Some(predicted), Some(expected)) {
        NodeOutcome::Section(section) => section,
        // A terminal-gated root collapses to a single attribute; wrap it so
        // the report shape stays stable.
        NodeOutcome::Attribute(attribute) => {
            let mut tally = WeightTally::default();
            tally.add_attribute(&attribute);
            metrics::finalize_section(
                "document".to_string(),
                &FieldPolicy::default(),
                vec![attribute],
                Vec::new(),
                Vec::new(),
                Vec::new(),
                tally,
            )
        }
    };

    Ok(metrics::document_report(
        document_id.to_string(),
        now_utc_string(),
        policy_checksum,
        root,
        root_threshold,
    ))
}

enum NodeOutcome {
    Attribute(AttributeResult),
    Section(SectionResult),
}

struct Walker<'a> {
    embedder: &'a dyn EmbeddingProvider,
}

impl Walker<'_> {
    fn evaluate_node(
        &self,
        path: &str,
        schema: &SchemaNode,
        predicted: Option<&Value>,
        expected: Option<&Value>,
    ) -> NodeOutcome {
        match schema {
            SchemaNode::Scalar(policy) => {
                NodeOutcome::Attribute(self.leaf_attribute(path, policy, predicted, expected))
            }
            SchemaNode::Object(object) => self.object_node(path, object, predicted, expected),
            SchemaNode::List(list) => {
                NodeOutcome::Section(self.list_section(path, list, predicted, expected))
            }
        }
    }

    fn leaf_attribute(
        &self,
        path: &str,
        policy: &FieldPolicy,
        predicted: Option<&Value>,
        expected: Option<&Value>,
    ) -> AttributeResult {
        // The resolver guarantees a leaf kind on every scalar policy.
        let kind = policy.comparator.unwrap_or(ComparatorKind::Exact);

        let (score, matched, marker) = match (predicted, expected) {
            (Some(predicted_value), Some(expected_value)) => {
                let outcome = compare_leaf(
                    kind,
                    predicted_value,
                    expected_value,
                    &policy.normalization,
                    self.embedder,
                );
                (outcome.score, outcome.score >= policy.threshold, outcome.marker)
            }
            (None, Some(_)) => (0.0, false, Some(ResultMarker::MissingPredicted)),
            (Some(_), None) => (0.0, false, Some(ResultMarker::MissingExpected)),
            (None, None) => (0.0, false, Some(ResultMarker::Unscored)),
        };

        AttributeResult {
            field_path: path.to_string(),
            predicted: predicted.cloned(),
            expected: expected.cloned(),
            score,
            matched,
            comparator: Some(kind),
            weight: policy.weight,
            criticality: policy.criticality,
            marker,
        }
    }

    fn object_node(
        &self,
        path: &str,
        schema: &ObjectSchema,
        predicted: Option<&Value>,
        expected: Option<&Value>,
    ) -> NodeOutcome {
        // Threshold-gated recursion: a terminal-marked object whose wholesale
        // score misses its threshold is reported as one attribute and never
        // descended. Objects without the terminal mark always recurse fully.
        if let Some(kind) = schema.terminal
            && let (Some(predicted_value), Some(expected_value)) = (predicted, expected)
        {
            let outcome = compare_leaf(
                kind,
                predicted_value,
                expected_value,
                &schema.policy.normalization,
                self.embedder,
            );
            if outcome.score < schema.policy.threshold {
                return NodeOutcome::Attribute(AttributeResult {
                    field_path: path.to_string(),
                    predicted: predicted.cloned(),
                    expected: expected.cloned(),
                    score: outcome.score,
                    matched: false,
                    comparator: Some(kind),
                    weight: subtree_weight(schema),
                    criticality: schema.policy.criticality,
                    marker: outcome.marker,
                });
            }
        }

        let predicted_map = predicted.and_then(Value::as_object);
        let expected_map = expected.and_then(Value::as_object);

        let mut attributes = Vec::new();
        let mut sub_results = Vec::new();
        let mut tally = WeightTally::default();

        for (name, child) in &schema.fields {
            let child_path = join_path(path, name);
            let child_predicted = predicted_map.and_then(|map| map.get(name));
            let child_expected = expected_map.and_then(|map| map.get(name));
            if child_predicted.is_none() && child_expected.is_none() {
                continue;
            }

            match self.evaluate_node(&child_path, child, child_predicted, child_expected) {
                NodeOutcome::Attribute(attribute) => {
                    tally.add_attribute(&attribute);
                    attributes.push(attribute);
                }
                NodeOutcome::Section(section) => {
                    tally.add_section(&section);
                    sub_results.push(section);
                }
            }
        }

        // Fields present in a document but undeclared in the policy are
        // recorded for audit with zero weight.
        let mut undeclared = BTreeSet::new();
        for map in [predicted_map, expected_map].into_iter().flatten() {
            for name in map.keys() {
                if !schema.fields.contains_key(name) {
                    undeclared.insert(name.clone());
                }
            }
        }
        for name in undeclared {
            let attribute = AttributeResult {
                field_path: join_path(path, &name),
                predicted: predicted_map.and_then(|map| map.get(&name)).cloned(),
                expected: expected_map.and_then(|map| map.get(&name)).cloned(),
                score: 0.0,
                matched: false,
                comparator: None,
                weight: 0.0,
                criticality: crate::policy::Criticality::Normal,
                marker: Some(ResultMarker::Unscored),
            };
            tally.add_attribute(&attribute);
            attributes.push(attribute);
        }

        NodeOutcome::Section(metrics::finalize_section(
            path.to_string(),
            &schema.policy,
            attributes,
            sub_results,
            Vec::new(),
            Vec::new(),
            tally,
        ))
    }

    fn list_section(
        &self,
        path: &str,
        schema: &ListSchema,
        predicted: Option<&Value>,
        expected: Option<&Value>,
    ) -> SectionResult {
        let empty: &[Value] = &[];
        let predicted_items = predicted.and_then(Value::as_array).map_or(empty, Vec::as_slice);
        let expected_items = expected.and_then(Value::as_array).map_or(empty, Vec::as_slice);

        let mut attributes = Vec::new();
        let mut sub_results = Vec::new();
        let mut unmatched_predicted = Vec::new();
        let mut unmatched_expected = Vec::new();
        let mut tally = WeightTally::default();
        let item_weight = schema.item.full_weight();

        if predicted_items.is_empty() || expected_items.is_empty() {
            for item in predicted_items {
                unmatched_predicted.push(item.clone());
                tally.add_false_positive(item_weight);
            }
            for item in expected_items {
                unmatched_expected.push(item.clone());
                tally.add_false_negative(item_weight);
            }
        } else {
            let assignment = align::solve(&self.cost_matrix(schema, predicted_items, expected_items));

            for &(predicted_index, expected_index) in &assignment.pairs {
                let item_path = format!("{path}[{expected_index}]");
                match self.evaluate_node(
                    &item_path,
                    &schema.item,
                    Some(&predicted_items[predicted_index]),
                    Some(&expected_items[expected_index]),
                ) {
                    NodeOutcome::Attribute(attribute) => {
                        tally.add_attribute(&attribute);
                        attributes.push(attribute);
                    }
                    NodeOutcome::Section(section) => {
                        tally.add_section(&section);
                        sub_results.push(section);
                    }
                }
            }

            for &index in &assignment.unmatched_predicted {
                unmatched_predicted.push(predicted_items[index].clone());
                tally.add_false_positive(item_weight);
            }
            for &index in &assignment.unmatched_expected {
                unmatched_expected.push(expected_items[index].clone());
                tally.add_false_negative(item_weight);
            }
        }

        metrics::finalize_section(
            path.to_string(),
            &schema.policy,
            attributes,
            sub_results,
            unmatched_predicted,
            unmatched_expected,
            tally,
        )
    }

    /// Pairwise costs for the aligner. Cells are independent, so they fan
    /// out across the rayon pool; the fold over them stays deterministic.
    fn cost_matrix(
        &self,
        schema: &ListSchema,
        predicted_items: &[Value],
        expected_items: &[Value],
    ) -> CostMatrix {
        let rows = predicted_items.len();
        let cols = expected_items.len();
        let cells = (0..rows * cols)
            .into_par_iter()
            .map(|index| {
                let (row, col) = (index / cols, index % cols);
                1.0 - self.item_similarity(&schema.item, &predicted_items[row], &expected_items[col])
            })
            .collect();
        CostMatrix::new(rows, cols, cells)
    }

    /// Scalar similarity of two list items: the recursive weighted mean over
    /// the item schema, ignoring thresholds and criticality. Only used to
    /// fill the cost matrix; verdicts come from the full recursion on
    /// matched pairs.
    fn item_similarity(&self, schema: &SchemaNode, predicted: &Value, expected: &Value) -> f64 {
        match schema {
            SchemaNode::Scalar(policy) => {
                let kind = policy.comparator.unwrap_or(ComparatorKind::Exact);
                compare_leaf(kind, predicted, expected, &policy.normalization, self.embedder).score
            }
            SchemaNode::Object(object) => {
                if let Some(kind) = object.terminal {
                    return compare_leaf(
                        kind,
                        predicted,
                        expected,
                        &object.policy.normalization,
                        self.embedder,
                    )
                    .score;
                }

                let predicted_map = predicted.as_object();
                let expected_map = expected.as_object();
                let mut mass = 0.0;
                let mut total = 0.0;
                for (name, child) in &object.fields {
                    let child_predicted = predicted_map.and_then(|map| map.get(name));
                    let child_expected = expected_map.and_then(|map| map.get(name));
                    if child_predicted.is_none() && child_expected.is_none() {
                        continue;
                    }
                    let weight = child.full_weight();
                    total += weight;
                    if let (Some(child_predicted), Some(child_expected)) =
                        (child_predicted, child_expected)
                    {
                        mass += weight * self.item_similarity(child, child_predicted, child_expected);
                    }
                }
                if total == 0.0 { 1.0 } else { mass / total }
            }
            SchemaNode::List(list) => {
                let empty: &[Value] = &[];
                let predicted_items = predicted.as_array().map_or(empty, Vec::as_slice);
                let expected_items = expected.as_array().map_or(empty, Vec::as_slice);
                let size = predicted_items.len().max(expected_items.len());
                if size == 0 {
                    return 1.0;
                }
                let cells: Vec<f64> = predicted_items
                    .iter()
                    .flat_map(|predicted_item| {
                        expected_items.iter().map(|expected_item| {
                            1.0 - self.item_similarity(&list.item, predicted_item, expected_item)
                        })
                    })
                    .collect();
                let matrix =
                    CostMatrix::new(predicted_items.len(), expected_items.len(), cells);
                let assignment = align::solve(&matrix);
                let matched_similarity: f64 = assignment
                    .pairs
                    .iter()
                    .map(|&(row, col)| 1.0 - matrix.get(row, col))
                    .sum();
                matched_similarity / size as f64
            }
        }
    }
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() || path == "document" {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn subtree_weight(schema: &ObjectSchema) -> f64 {
    let children: f64 = schema.fields.values().map(SchemaNode::full_weight).sum();
    if schema.fields.is_empty() {
        schema.policy.weight
    } else {
        schema.policy.weight * children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::LocalHashEmbedder;
    use crate::policy::{Criticality, Normalization};
    use crate::report::EvaluationStatus;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn invoice_config() -> PolicyConfig {
        let mut fields = BTreeMap::new();
        fields.insert(
            "vendor.name".to_string(),
            FieldPolicy {
                comparator: Some(ComparatorKind::Fuzzy),
                threshold: 0.8,
                normalization: Normalization {
                    case_fold: true,
                    ..Normalization::default()
                },
                ..FieldPolicy::default()
            },
        );
        fields.insert(
            "vendor.tax_id".to_string(),
            FieldPolicy {
                comparator: Some(ComparatorKind::Exact),
                threshold: 1.0,
                criticality: Criticality::Critical,
                ..FieldPolicy::default()
            },
        );
        fields.insert(
            "total".to_string(),
            FieldPolicy {
                comparator: Some(ComparatorKind::Numeric),
                threshold: 0.95,
                weight: 2.0,
                ..FieldPolicy::default()
            },
        );
        fields.insert(
            "line_items[].description".to_string(),
            FieldPolicy {
                comparator: Some(ComparatorKind::Fuzzy),
                threshold: 0.7,
                ..FieldPolicy::default()
            },
        );
        fields.insert(
            "line_items[].amount".to_string(),
            FieldPolicy {
                comparator: Some(ComparatorKind::Numeric),
                threshold: 0.95,
                ..FieldPolicy::default()
            },
        );
        PolicyConfig { fields, root: None }
    }

    fn invoice() -> Value {
        json!({
            "vendor": {"name": "Acme Corp", "tax_id": "DE-123"},
            "total": 341.5,
            "line_items": [
                {"description": "widgets", "amount": 120.0},
                {"description": "gadgets", "amount": 221.5}
            ]
        })
    }

    fn embedder() -> LocalHashEmbedder {
        LocalHashEmbedder::default()
    }

    #[test]
    fn self_comparison_is_a_perfect_report() {
        let document = invoice();
        let report =
            evaluate_document(&document, &document, &invoice_config(), &embedder(), "inv-1")
                .expect("evaluation should run");

        assert_eq!(report.status, EvaluationStatus::Passed);
        assert_eq!(report.overall_accuracy, 1.0);
        assert_eq!(report.overall_precision, 1.0);
        assert_eq!(report.overall_recall, 1.0);
        assert_eq!(report.overall_confidence, 1.0);
        assert_eq!(report.total_cost, 0.0);
        assert_eq!(report.attribute_counts.mismatched, 0);
        assert_eq!(report.attribute_counts.false_positive_items, 0);
        assert_eq!(report.attribute_counts.false_negative_items, 0);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let predicted = json!({
            "vendor": {"name": "ACME corp", "tax_id": "DE-123"},
            "total": 340.0,
            "line_items": [
                {"description": "gadgets", "amount": 221.5},
                {"description": "widgts", "amount": 120.0}
            ]
        });
        let expected = invoice();
        let config = invoice_config();

        let first = evaluate_document(&predicted, &expected, &config, &embedder(), "inv-1")
            .expect("evaluation should run");
        let second = evaluate_document(&predicted, &expected, &config, &embedder(), "inv-1")
            .expect("evaluation should run");

        assert_eq!(
            serde_json::to_value(&first.root).expect("serialize"),
            serde_json::to_value(&second.root).expect("serialize")
        );
        assert_eq!(first.overall_accuracy, second.overall_accuracy);
    }

    #[test]
    fn list_alignment_survives_reordered_items() {
        let predicted = json!({
            "vendor": {"name": "Acme Corp", "tax_id": "DE-123"},
            "total": 341.5,
            "line_items": [
                {"description": "gadgets", "amount": 221.5},
                {"description": "widgets", "amount": 120.0}
            ]
        });
        let report = evaluate_document(&predicted, &invoice(), &invoice_config(), &embedder(), "inv-1")
            .expect("evaluation should run");
        assert_eq!(report.overall_accuracy, 1.0);
        assert_eq!(report.attribute_counts.false_positive_items, 0);
    }

    #[test]
    fn extra_predicted_list_item_is_a_false_positive() {
        // Predicted [A, B, C] vs expected [B, C]: perfect overlap on B and
        // C, so recall 1.0 and precision 2/3 on the list section.
        let mut fields = BTreeMap::new();
        fields.insert(
            "items[].name".to_string(),
            FieldPolicy::leaf(ComparatorKind::Exact),
        );
        let config = PolicyConfig { fields, root: None };

        let predicted = json!({"items": [{"name": "A"}, {"name": "B"}, {"name": "C"}]});
        let expected = json!({"items": [{"name": "B"}, {"name": "C"}]});

        let report = evaluate_document(&predicted, &expected, &config, &embedder(), "doc")
            .expect("evaluation should run");
        let list = &report.root.sub_results[0];
        assert_eq!(list.sub_results.len(), 2);
        assert_eq!(list.unmatched_predicted, vec![json!({"name": "A"})]);
        assert!(list.unmatched_expected.is_empty());
        assert_eq!(list.recall, 1.0);
        assert!((list.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.attribute_counts.false_positive_items, 1);
    }

    #[test]
    fn empty_expected_list_marks_all_predictions_false_positive() {
        let mut fields = BTreeMap::new();
        fields.insert(
            "items[].name".to_string(),
            FieldPolicy::leaf(ComparatorKind::Exact),
        );
        let config = PolicyConfig { fields, root: None };

        let predicted = json!({"items": [{"name": "A"}, {"name": "B"}]});
        let expected = json!({"items": []});

        let report = evaluate_document(&predicted, &expected, &config, &embedder(), "doc")
            .expect("evaluation should run");
        let list = &report.root.sub_results[0];
        assert_eq!(list.unmatched_predicted.len(), 2);
        assert_eq!(list.recall, 1.0);
        assert_eq!(list.precision, 0.0);
    }

    #[test]
    fn low_scoring_object_fails_but_keeps_children_visible() {
        let mut fields = BTreeMap::new();
        fields.insert(
            "vendor".to_string(),
            FieldPolicy {
                threshold: 0.9,
                ..FieldPolicy::default()
            },
        );
        fields.insert(
            "vendor.name".to_string(),
            FieldPolicy::leaf(ComparatorKind::Exact),
        );
        fields.insert(
            "vendor.city".to_string(),
            FieldPolicy::leaf(ComparatorKind::Exact),
        );
        let config = PolicyConfig { fields, root: None };

        let predicted = json!({"vendor": {"name": "Acme", "city": "Berlin"}});
        let expected = json!({"vendor": {"name": "Acme", "city": "Munich"}});

        let report = evaluate_document(&predicted, &expected, &config, &embedder(), "doc")
            .expect("evaluation should run");
        let vendor = &report.root.sub_results[0];
        assert!(!vendor.matched);
        assert_eq!(vendor.attributes.len(), 2, "children stay visible");
        assert!((vendor.accuracy - 0.5).abs() < 1e-12);
    }

    #[test]
    fn terminal_object_below_threshold_short_circuits_recursion() {
        let mut fields = BTreeMap::new();
        fields.insert(
            "address".to_string(),
            FieldPolicy {
                comparator: Some(ComparatorKind::Exact),
                threshold: 1.0,
                ..FieldPolicy::default()
            },
        );
        fields.insert(
            "address.street".to_string(),
            FieldPolicy::leaf(ComparatorKind::Exact),
        );
        fields.insert(
            "address.city".to_string(),
            FieldPolicy::leaf(ComparatorKind::Exact),
        );
        let config = PolicyConfig { fields, root: None };

        let predicted = json!({"address": {"street": "Main St 1", "city": "Berlin"}});
        let expected = json!({"address": {"street": "Main St 2", "city": "Berlin"}});

        let report = evaluate_document(&predicted, &expected, &config, &embedder(), "doc")
            .expect("evaluation should run");
        // The gated subtree collapses into a single attribute carrying the
        // subtree's full weight.
        assert_eq!(report.root.attributes.len(), 1);
        assert!(report.root.sub_results.is_empty());
        let gated = &report.root.attributes[0];
        assert_eq!(gated.field_path, "address");
        assert!(!gated.matched);
        assert_eq!(gated.weight, 2.0);
    }

    #[test]
    fn undeclared_fields_are_recorded_unscored() {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), FieldPolicy::leaf(ComparatorKind::Exact));
        let config = PolicyConfig { fields, root: None };

        let predicted = json!({"name": "Acme", "surprise": 42});
        let expected = json!({"name": "Acme"});

        let report = evaluate_document(&predicted, &expected, &config, &embedder(), "doc")
            .expect("evaluation should run");
        let extra = report
            .root
            .attributes
            .iter()
            .find(|attribute| attribute.field_path == "surprise")
            .expect("undeclared field should be recorded");
        assert_eq!(extra.marker, Some(ResultMarker::Unscored));
        assert_eq!(extra.weight, 0.0);
        assert_eq!(report.overall_accuracy, 1.0, "unscored fields carry no mass");
        assert_eq!(report.attribute_counts.unscored, 1);
    }

    #[test]
    fn missing_declared_field_penalizes_recall_only() {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), FieldPolicy::leaf(ComparatorKind::Exact));
        fields.insert("total".to_string(), FieldPolicy::leaf(ComparatorKind::Numeric));
        let config = PolicyConfig { fields, root: None };

        let predicted = json!({"name": "Acme"});
        let expected = json!({"name": "Acme", "total": 100.0});

        let report = evaluate_document(&predicted, &expected, &config, &embedder(), "doc")
            .expect("evaluation should run");
        assert_eq!(report.overall_precision, 1.0);
        assert!((report.overall_recall - 0.5).abs() < 1e-12);
        assert_eq!(report.attribute_counts.missing, 1);
    }

    #[test]
    fn critical_field_failure_overrides_high_accuracy() {
        let mut fields = BTreeMap::new();
        for index in 0..9 {
            fields.insert(
                format!("field_{index}"),
                FieldPolicy::leaf(ComparatorKind::Exact),
            );
        }
        fields.insert(
            "iban".to_string(),
            FieldPolicy {
                comparator: Some(ComparatorKind::Fuzzy),
                threshold: 0.9,
                criticality: Criticality::Critical,
                ..FieldPolicy::default()
            },
        );
        let config = PolicyConfig { fields, root: None };

        let mut predicted = serde_json::Map::new();
        let mut expected = serde_json::Map::new();
        for index in 0..9 {
            predicted.insert(format!("field_{index}"), json!("same"));
            expected.insert(format!("field_{index}"), json!("same"));
        }
        predicted.insert("iban".to_string(), json!("DE00 1234"));
        expected.insert("iban".to_string(), json!("GB99 9876"));

        let report = evaluate_document(
            &Value::Object(predicted),
            &Value::Object(expected),
            &config,
            &embedder(),
            "doc",
        )
        .expect("evaluation should run");

        assert!(report.overall_accuracy >= 0.9, "accuracy {}", report.overall_accuracy);
        assert_eq!(report.status, EvaluationStatus::CriticalFailure);
    }

    #[test]
    fn numeric_scenario_scores_ninety_nine_percent() {
        let mut fields = BTreeMap::new();
        fields.insert(
            "total".to_string(),
            FieldPolicy {
                comparator: Some(ComparatorKind::Numeric),
                threshold: 0.95,
                ..FieldPolicy::default()
            },
        );
        let config = PolicyConfig { fields, root: None };

        let report = evaluate_document(
            &json!({"total": 101.0}),
            &json!({"total": 100.0}),
            &config,
            &embedder(),
            "doc",
        )
        .expect("evaluation should run");

        let attribute = &report.root.attributes[0];
        assert!((attribute.score - 0.99).abs() < 1e-12);
        assert!(attribute.matched);
    }

    #[test]
    fn scalar_list_items_align_by_value() {
        let mut fields = BTreeMap::new();
        fields.insert(
            "tags[]".to_string(),
            FieldPolicy {
                comparator: Some(ComparatorKind::Fuzzy),
                threshold: 0.8,
                ..FieldPolicy::default()
            },
        );
        let config = PolicyConfig { fields, root: None };

        let predicted = json!({"tags": ["beta", "alpha"]});
        let expected = json!({"tags": ["alpha", "beta"]});

        let report = evaluate_document(&predicted, &expected, &config, &embedder(), "doc")
            .expect("evaluation should run");
        let tags = &report.root.sub_results[0];
        assert_eq!(tags.attributes.len(), 2);
        assert!(tags.attributes.iter().all(|attribute| attribute.matched));
        assert_eq!(tags.accuracy, 1.0);
    }

    #[test]
    fn config_errors_surface_before_any_comparison() {
        let mut fields = BTreeMap::new();
        fields.insert(
            "total".to_string(),
            FieldPolicy::leaf(ComparatorKind::Hungarian),
        );
        let config = PolicyConfig { fields, root: None };

        let error = evaluate_document(
            &json!({"total": 1}),
            &json!({"total": 1}),
            &config,
            &embedder(),
            "doc",
        )
        .expect_err("hungarian scalar should fail resolution");
        assert!(matches!(error, ConfigError::InvalidComparator { .. }));
    }
}
