//! Field policy configuration and schema resolution.
//!
//! A policy config is a flat map from field path to [`FieldPolicy`]. Paths
//! use dot notation; a segment suffixed with `[]` addresses the items of a
//! list (`line_items[].unit_price`). The resolver compiles that map once
//! into a [`SchemaNode`] tree so the comparison walk never inspects value
//! shapes at runtime.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_THRESHOLD: f64 = 0.7;
pub const DEFAULT_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparatorKind {
    Exact,
    Numeric,
    Fuzzy,
    Semantic,
    Hungarian,
}

impl ComparatorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Numeric => "numeric",
            Self::Fuzzy => "fuzzy",
            Self::Semantic => "semantic",
            Self::Hungarian => "hungarian",
        }
    }

    /// Leaf kinds compare two values directly; `Hungarian` only ever drives
    /// list alignment.
    pub fn is_leaf(self) -> bool {
        !matches!(self, Self::Hungarian)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    #[default]
    Normal,
    Critical,
}

/// Normalization applied before `Exact` comparison (and to the string forms
/// used by `Fuzzy`/`Semantic`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Normalization {
    pub case_fold: bool,
    pub trim_whitespace: bool,
    pub strip_currency: bool,
    pub canonicalize_dates: bool,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            case_fold: false,
            trim_whitespace: true,
            strip_currency: false,
            canonicalize_dates: false,
        }
    }
}

/// Per-path policy entry.
///
/// `comparator` is required for scalar paths. On container paths it is
/// optional: absent means "aggregate only", a leaf kind on an object marks
/// the subtree terminal (wholesale comparison gates recursion, see the
/// engine), and `hungarian` is accepted on list paths as an explicit spelling
/// of the default alignment behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldPolicy {
    #[serde(default)]
    pub comparator: Option<ComparatorKind>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub criticality: Criticality,
    #[serde(default)]
    pub normalization: Normalization,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

impl Default for FieldPolicy {
    fn default() -> Self {
        Self {
            comparator: None,
            threshold: DEFAULT_THRESHOLD,
            weight: DEFAULT_WEIGHT,
            criticality: Criticality::Normal,
            normalization: Normalization::default(),
        }
    }
}

impl FieldPolicy {
    pub fn leaf(comparator: ComparatorKind) -> Self {
        Self {
            comparator: Some(comparator),
            ..Self::default()
        }
    }
}

/// The declarative configuration supplied by the caller, loaded whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub fields: BTreeMap<String, FieldPolicy>,
    /// Aggregate policy for the document root (threshold gates the overall
    /// pass/fail verdict). Defaults apply when absent.
    #[serde(default)]
    pub root: Option<FieldPolicy>,
}

/// Shape-resolved schema node. Built once per config, immutable afterwards.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    Scalar(FieldPolicy),
    Object(ObjectSchema),
    List(ListSchema),
}

#[derive(Debug, Clone)]
pub struct ObjectSchema {
    pub policy: FieldPolicy,
    /// Leaf kind configured directly on this object path; marks the subtree
    /// terminal for threshold-gated recursion.
    pub terminal: Option<ComparatorKind>,
    pub fields: BTreeMap<String, SchemaNode>,
}

#[derive(Debug, Clone)]
pub struct ListSchema {
    pub policy: FieldPolicy,
    pub item: Box<SchemaNode>,
}

impl SchemaNode {
    pub fn policy(&self) -> &FieldPolicy {
        match self {
            Self::Scalar(policy) => policy,
            Self::Object(object) => &object.policy,
            Self::List(list) => &list.policy,
        }
    }

    /// Static weight of the whole subtree: the mass an unmatched list item
    /// or a gated terminal object contributes as a miss.
    pub fn full_weight(&self) -> f64 {
        match self {
            Self::Scalar(policy) => policy.weight,
            Self::Object(object) => {
                let children: f64 = object.fields.values().map(SchemaNode::full_weight).sum();
                if object.fields.is_empty() {
                    object.policy.weight
                } else {
                    object.policy.weight * children
                }
            }
            Self::List(list) => list.policy.weight * list.item.full_weight(),
        }
    }
}

/// Compile the flat path map into the schema tree, validating comparator
/// kinds against node shapes. All configuration errors surface here, before
/// any comparison runs.
pub fn resolve_schema(config: &PolicyConfig) -> Result<SchemaNode, ConfigError> {
    if config.fields.is_empty() {
        return Err(ConfigError::EmptyPolicy);
    }

    let mut root = PathNode::default();
    for (path, policy) in &config.fields {
        validate_policy_numbers(path, policy)?;
        let steps = parse_path(path)?;
        root.insert(&steps, policy)?;
    }

    let root_policy = match &config.root {
        Some(policy) => {
            validate_policy_numbers("<root>", policy)?;
            policy.clone()
        }
        None => FieldPolicy::default(),
    };
    root.policy = Some(root_policy);

    root.finalize("")
}

fn validate_policy_numbers(path: &str, policy: &FieldPolicy) -> Result<(), ConfigError> {
    if !policy.threshold.is_finite() || !(0.0..=1.0).contains(&policy.threshold) {
        return Err(ConfigError::InvalidThreshold {
            path: path.to_string(),
            threshold: policy.threshold,
        });
    }
    if !policy.weight.is_finite() || policy.weight <= 0.0 {
        return Err(ConfigError::InvalidWeight {
            path: path.to_string(),
            weight: policy.weight,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathStep {
    Field(String),
    ListItem,
}

fn parse_path(path: &str) -> Result<Vec<PathStep>, ConfigError> {
    if path.trim().is_empty() {
        return Err(ConfigError::MalformedPath {
            path: path.to_string(),
            reason: "empty path".to_string(),
        });
    }

    let mut steps = Vec::new();
    for segment in path.split('.') {
        let (name, is_list) = match segment.strip_suffix("[]") {
            Some(stripped) => (stripped, true),
            None => (segment, false),
        };
        if name.is_empty() || name.contains('[') || name.contains(']') {
            return Err(ConfigError::MalformedPath {
                path: path.to_string(),
                reason: format!("invalid segment: {segment:?}"),
            });
        }
        steps.push(PathStep::Field(name.to_string()));
        if is_list {
            steps.push(PathStep::ListItem);
        }
    }
    Ok(steps)
}

/// Mutable intermediate tree; shape (scalar/object/list) is decided at
/// finalize time from which branches were populated.
#[derive(Debug, Default)]
struct PathNode {
    policy: Option<FieldPolicy>,
    children: BTreeMap<String, PathNode>,
    item: Option<Box<PathNode>>,
}

impl PathNode {
    fn insert(&mut self, steps: &[PathStep], policy: &FieldPolicy) -> Result<(), ConfigError> {
        let Some(step) = steps.first() else {
            self.policy = Some(policy.clone());
            return Ok(());
        };
        let next = match step {
            PathStep::Field(name) => self.children.entry(name.clone()).or_default(),
            PathStep::ListItem => self.item.get_or_insert_with(Box::default),
        };
        next.insert(&steps[1..], policy)
    }

    fn finalize(self, path: &str) -> Result<SchemaNode, ConfigError> {
        let policy = self.policy.unwrap_or_default();

        if self.item.is_some() && !self.children.is_empty() {
            return Err(ConfigError::ConflictingShape {
                path: path.to_string(),
            });
        }

        if let Some(item) = self.item {
            if let Some(kind) = policy.comparator
                && kind != ComparatorKind::Hungarian
            {
                return Err(ConfigError::InvalidComparator {
                    path: path.to_string(),
                    comparator: kind.as_str().to_string(),
                    reason: "list paths align with the hungarian comparator".to_string(),
                });
            }
            let item_path = format!("{path}[]");
            let item = item.finalize(&item_path)?;
            return Ok(SchemaNode::List(ListSchema {
                policy,
                item: Box::new(item),
            }));
        }

        if !self.children.is_empty() {
            let terminal = match policy.comparator {
                Some(kind) if kind.is_leaf() => Some(kind),
                Some(kind) => {
                    return Err(ConfigError::InvalidComparator {
                        path: path.to_string(),
                        comparator: kind.as_str().to_string(),
                        reason: "object paths take a leaf comparator or none".to_string(),
                    });
                }
                None => None,
            };
            let mut fields = BTreeMap::new();
            for (name, child) in self.children {
                let child_path = if path.is_empty() {
                    name.clone()
                } else {
                    format!("{path}.{name}")
                };
                fields.insert(name, child.finalize(&child_path)?);
            }
            return Ok(SchemaNode::Object(ObjectSchema {
                policy,
                terminal,
                fields,
            }));
        }

        match policy.comparator {
            Some(kind) if kind.is_leaf() => Ok(SchemaNode::Scalar(policy)),
            Some(kind) => Err(ConfigError::InvalidComparator {
                path: path.to_string(),
                comparator: kind.as_str().to_string(),
                reason: "scalar fields need a leaf comparator".to_string(),
            }),
            None => Err(ConfigError::MissingComparator {
                path: path.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(entries: &[(&str, FieldPolicy)]) -> PolicyConfig {
        PolicyConfig {
            fields: entries
                .iter()
                .map(|(path, policy)| (path.to_string(), policy.clone()))
                .collect(),
            root: None,
        }
    }

    #[test]
    fn resolves_nested_object_and_list_paths() {
        let config = config(&[
            ("vendor.name", FieldPolicy::leaf(ComparatorKind::Fuzzy)),
            ("vendor.tax_id", FieldPolicy::leaf(ComparatorKind::Exact)),
            (
                "line_items[].description",
                FieldPolicy::leaf(ComparatorKind::Fuzzy),
            ),
            (
                "line_items[].unit_price",
                FieldPolicy::leaf(ComparatorKind::Numeric),
            ),
        ]);

        let root = resolve_schema(&config).expect("schema should resolve");
        let SchemaNode::Object(root) = root else {
            panic!("root should be an object");
        };
        assert!(matches!(root.fields.get("vendor"), Some(SchemaNode::Object(_))));
        let Some(SchemaNode::List(items)) = root.fields.get("line_items") else {
            panic!("line_items should be a list");
        };
        let SchemaNode::Object(item) = items.item.as_ref() else {
            panic!("list item should be an object");
        };
        assert_eq!(item.fields.len(), 2);
    }

    #[test]
    fn hungarian_on_scalar_path_is_a_config_error() {
        let config = config(&[("total", FieldPolicy::leaf(ComparatorKind::Hungarian))]);
        let error = resolve_schema(&config).expect_err("hungarian scalar should fail");
        assert!(matches!(error, ConfigError::InvalidComparator { .. }));
    }

    #[test]
    fn leaf_comparator_on_list_path_is_a_config_error() {
        let config = config(&[
            ("items", FieldPolicy::leaf(ComparatorKind::Exact)),
            ("items[].name", FieldPolicy::leaf(ComparatorKind::Exact)),
        ]);
        let error = resolve_schema(&config).expect_err("exact list should fail");
        assert!(matches!(error, ConfigError::InvalidComparator { .. }));
    }

    #[test]
    fn container_without_comparator_aggregates() {
        let mut aggregate = FieldPolicy::default();
        aggregate.threshold = 0.9;
        let config = config(&[
            ("customer", aggregate),
            ("customer.name", FieldPolicy::leaf(ComparatorKind::Exact)),
        ]);
        let root = resolve_schema(&config).expect("schema should resolve");
        let SchemaNode::Object(root) = root else {
            panic!("root should be an object");
        };
        let Some(SchemaNode::Object(customer)) = root.fields.get("customer") else {
            panic!("customer should be an object");
        };
        assert!(customer.terminal.is_none());
        assert_eq!(customer.policy.threshold, 0.9);
    }

    #[test]
    fn empty_policy_is_rejected() {
        let config = PolicyConfig {
            fields: BTreeMap::new(),
            root: None,
        };
        assert!(matches!(
            resolve_schema(&config),
            Err(ConfigError::EmptyPolicy)
        ));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut policy = FieldPolicy::leaf(ComparatorKind::Exact);
        policy.threshold = 1.5;
        let config = config(&[("total", policy)]);
        assert!(matches!(
            resolve_schema(&config),
            Err(ConfigError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn full_weight_sums_leaf_weights_through_containers() {
        let mut heavy = FieldPolicy::leaf(ComparatorKind::Numeric);
        heavy.weight = 3.0;
        let config = config(&[
            ("items[].name", FieldPolicy::leaf(ComparatorKind::Exact)),
            ("items[].price", heavy),
        ]);
        let root = resolve_schema(&config).expect("schema should resolve");
        let SchemaNode::Object(root) = root else {
            panic!("root should be an object");
        };
        let items = root.fields.get("items").expect("items should resolve");
        // one item subtree: 1.0 (name) + 3.0 (price)
        assert_eq!(items.full_weight(), 4.0);
    }
}
