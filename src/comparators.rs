//! Leaf comparators: Exact, Numeric, Fuzzy, and Semantic.
//!
//! Each turns a pair of scalar values into a bounded score in [0, 1].
//! Comparison never errors: parse failures and provider outages degrade the
//! single leaf to score 0 with an explanatory marker so the rest of the
//! evaluation continues.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

use crate::embedding::{EmbeddingProvider, cosine_similarity};
use crate::policy::{ComparatorKind, Normalization};
use crate::report::ResultMarker;

/// Floor for the relative-error denominator in the numeric comparator, so an
/// expected value of zero does not divide away the score.
const NUMERIC_EPSILON: f64 = 1e-9;

static CURRENCY_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,$€£¥]").expect("currency pattern is valid"));

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafOutcome {
    pub score: f64,
    pub marker: Option<ResultMarker>,
}

impl LeafOutcome {
    fn scored(score: f64) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
            marker: None,
        }
    }

    fn degraded(marker: ResultMarker) -> Self {
        Self {
            score: 0.0,
            marker: Some(marker),
        }
    }
}

/// Compare two leaf values with the given comparator kind.
///
/// `kind` must be a leaf kind; the resolver rejects `Hungarian` on scalar
/// paths before evaluation starts.
pub fn compare_leaf(
    kind: ComparatorKind,
    predicted: &Value,
    expected: &Value,
    normalization: &Normalization,
    embedder: &dyn EmbeddingProvider,
) -> LeafOutcome {
    match kind {
        ComparatorKind::Exact => compare_exact(predicted, expected, normalization),
        ComparatorKind::Numeric => compare_numeric(predicted, expected),
        ComparatorKind::Fuzzy => compare_fuzzy(predicted, expected, normalization),
        ComparatorKind::Semantic => compare_semantic(predicted, expected, normalization, embedder),
        ComparatorKind::Hungarian => LeafOutcome::scored(0.0),
    }
}

fn compare_exact(predicted: &Value, expected: &Value, normalization: &Normalization) -> LeafOutcome {
    let left = normalize_text(&value_text(predicted), normalization);
    let right = normalize_text(&value_text(expected), normalization);
    LeafOutcome::scored(if left == right { 1.0 } else { 0.0 })
}

fn compare_numeric(predicted: &Value, expected: &Value) -> LeafOutcome {
    let (Some(left), Some(right)) = (parse_number(predicted), parse_number(expected)) else {
        return LeafOutcome::degraded(ResultMarker::NumericParseFailure);
    };

    let denominator = right.abs().max(NUMERIC_EPSILON);
    LeafOutcome::scored(1.0 - (left - right).abs() / denominator)
}

fn compare_fuzzy(predicted: &Value, expected: &Value, normalization: &Normalization) -> LeafOutcome {
    let left = normalize_text(&value_text(predicted), normalization);
    let right = normalize_text(&value_text(expected), normalization);
    // strsim already divides by the longer length and treats two empty
    // strings as identical.
    LeafOutcome::scored(strsim::normalized_levenshtein(&left, &right))
}

fn compare_semantic(
    predicted: &Value,
    expected: &Value,
    normalization: &Normalization,
    embedder: &dyn EmbeddingProvider,
) -> LeafOutcome {
    let left = normalize_text(&value_text(predicted), normalization);
    let right = normalize_text(&value_text(expected), normalization);
    if left == right {
        return LeafOutcome::scored(1.0);
    }

    let vectors = embedder.embed_batch(&[&left, &right]);
    match vectors {
        Ok(vectors) if vectors.len() == 2 => {
            LeafOutcome::scored(cosine_similarity(&vectors[0], &vectors[1]))
        }
        _ => LeafOutcome::degraded(ResultMarker::EmbeddingUnavailable),
    }
}

/// Canonical text form of a leaf value. Containers serialize to JSON with
/// sorted keys, which is what terminal wholesale comparison relies on.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

pub fn normalize_text(text: &str, normalization: &Normalization) -> String {
    let mut out = if normalization.trim_whitespace {
        text.split_whitespace().collect::<Vec<&str>>().join(" ")
    } else {
        text.to_string()
    };

    if normalization.case_fold {
        out = out.to_lowercase();
    }

    if normalization.strip_currency {
        let stripped = CURRENCY_CHARS.replace_all(&out, "").trim().to_string();
        // Re-render through f64 so "1234.50" and "1234.5" agree.
        out = match stripped.parse::<f64>() {
            Ok(number) => format!("{number}"),
            Err(_) => stripped,
        };
    }

    if normalization.canonicalize_dates
        && let Some(date) = parse_any_date(&out)
    {
        out = date.format("%Y-%m-%d").to_string();
    }

    out
}

fn parse_any_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let cleaned = CURRENCY_CHARS.replace_all(text, "");
            cleaned.trim().parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}
