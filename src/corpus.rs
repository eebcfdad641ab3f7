//! Corpus-level comparison: a thin reducer over already-computed
//! [`DocumentReport`]s, producing side-by-side metric rows and per-run
//! deltas against a baseline run.

use serde::{Deserialize, Serialize};

use crate::report::{AttributeCounts, DocumentReport, EvaluationStatus};

/// Delta band below which two runs count as unchanged.
const SIGNIFICANT_DELTA: f64 = 0.05;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub document_id: String,
    pub status: EvaluationStatus,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub confidence: f64,
    pub total_cost: f64,
    pub attribute_counts: AttributeCounts,
}

impl RunSummary {
    pub fn from_report(run_id: &str, report: &DocumentReport) -> Self {
        Self {
            run_id: run_id.to_string(),
            document_id: report.document_id.clone(),
            status: report.status,
            accuracy: report.overall_accuracy,
            precision: report.overall_precision,
            recall: report.overall_recall,
            f1: report.overall_f1,
            confidence: report.overall_confidence,
            total_cost: report.total_cost,
            attribute_counts: report.attribute_counts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Improved,
    Unchanged,
    Regressed,
}

impl DiffStatus {
    pub fn from_delta(delta: f64) -> Self {
        if delta > SIGNIFICANT_DELTA {
            Self::Improved
        } else if delta < -SIGNIFICANT_DELTA {
            Self::Regressed
        } else {
            Self::Unchanged
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Improved => "+",
            Self::Unchanged => "=",
            Self::Regressed => "-",
        }
    }
}

/// One candidate run held against the baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDiff {
    pub run_id: String,
    pub accuracy_delta: f64,
    pub f1_delta: f64,
    pub confidence_delta: f64,
    pub status: DiffStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusComparison {
    pub generated_at: String,
    pub baseline_run_id: String,
    pub runs: Vec<RunSummary>,
    pub diffs: Vec<RunDiff>,
}

/// Reduce named reports to a side-by-side comparison. The first entry is
/// the baseline; input order is preserved in the output rows.
pub fn compare_runs(runs: &[(String, DocumentReport)], generated_at: String) -> CorpusComparison {
    let summaries: Vec<RunSummary> = runs
        .iter()
        .map(|(run_id, report)| RunSummary::from_report(run_id, report))
        .collect();

    let Some(baseline) = summaries.first() else {
        return CorpusComparison {
            generated_at,
            baseline_run_id: String::new(),
            runs: Vec::new(),
            diffs: Vec::new(),
        };
    };
    let diffs = summaries
        .iter()
        .skip(1)
        .map(|candidate| {
            let accuracy_delta = candidate.accuracy - baseline.accuracy;
            let f1_delta = candidate.f1 - baseline.f1;
            RunDiff {
                run_id: candidate.run_id.clone(),
                accuracy_delta,
                f1_delta,
                confidence_delta: candidate.confidence - baseline.confidence,
                status: DiffStatus::from_delta(f1_delta),
            }
        })
        .collect();

    CorpusComparison {
        generated_at,
        baseline_run_id: baseline.run_id.clone(),
        runs: summaries,
        diffs,
    }
}

impl CorpusComparison {
    /// Fixed-width table for terminal output.
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{:<16} {:>9} {:>9} {:>9} {:>9} {:>11} {:>7}\n",
            "run", "accuracy", "precision", "recall", "f1", "confidence", "status"
        ));
        out.push_str(&format!("{}\n", "-".repeat(76)));
        for run in &self.runs {
            let status = match run.status {
                EvaluationStatus::Passed => "pass",
                EvaluationStatus::Failed => "fail",
                EvaluationStatus::CriticalFailure => "CRIT",
            };
            out.push_str(&format!(
                "{:<16} {:>8.1}% {:>8.1}% {:>8.1}% {:>8.1}% {:>10.1}% {:>7}\n",
                run.run_id,
                run.accuracy * 100.0,
                run.precision * 100.0,
                run.recall * 100.0,
                run.f1 * 100.0,
                run.confidence * 100.0,
                status,
            ));
        }
        if !self.diffs.is_empty() {
            out.push('\n');
            out.push_str(&format!("baseline: {}\n", self.baseline_run_id));
            for diff in &self.diffs {
                out.push_str(&format!(
                    "[{}] {:<16} accuracy {:+.1}%, f1 {:+.1}%\n",
                    diff.status.as_str(),
                    diff.run_id,
                    diff.accuracy_delta * 100.0,
                    diff.f1_delta * 100.0,
                ));
            }
        }
        out
    }
}
