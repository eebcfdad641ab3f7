use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use crate::cli::EvaluateArgs;
use crate::embedding::LocalHashEmbedder;
use crate::engine::evaluate_document;
use crate::policy::PolicyConfig;
use crate::report::EvaluationStatus;
use crate::util::{read_json_file, write_json_pretty};

pub fn run(args: EvaluateArgs) -> Result<()> {
    let predicted: Value = read_json_file(&args.predicted)?;
    let expected: Value = read_json_file(&args.expected)?;
    let config: PolicyConfig = read_json_file(&args.policy)?;

    let document_id = match &args.document_id {
        Some(id) => id.clone(),
        None => args
            .predicted
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string()),
    };

    let embedder = LocalHashEmbedder::new(args.embedding_dim);
    let report = evaluate_document(&predicted, &expected, &config, &embedder, &document_id)
        .context("policy configuration is invalid")?;

    info!(
        document_id = %report.document_id,
        status = ?report.status,
        accuracy = report.overall_accuracy,
        precision = report.overall_precision,
        recall = report.overall_recall,
        f1 = report.overall_f1,
        confidence = report.overall_confidence,
        attributes = report.attribute_counts.total,
        mismatched = report.attribute_counts.mismatched,
        missing = report.attribute_counts.missing,
        false_positive_items = report.attribute_counts.false_positive_items,
        false_negative_items = report.attribute_counts.false_negative_items,
        "evaluation finished"
    );

    if let Some(report_path) = &args.report_path {
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "evaluation report written");
    }

    if args.json {
        let rendered = serde_json::to_string_pretty(&report)
            .context("failed to render evaluation report")?;
        println!("{rendered}");
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn print_summary(report: &crate::report::DocumentReport) {
    let status = match report.status {
        EvaluationStatus::Passed => "PASS",
        EvaluationStatus::Failed => "FAIL",
        EvaluationStatus::CriticalFailure => "CRITICAL FAILURE",
    };

    println!("=== {} ===", report.document_id);
    println!();
    println!("Accuracy:   {:.1}%", report.overall_accuracy * 100.0);
    println!("Precision:  {:.1}%", report.overall_precision * 100.0);
    println!("Recall:     {:.1}%", report.overall_recall * 100.0);
    println!("F1:         {:.1}%", report.overall_f1 * 100.0);
    println!("Confidence: {:.1}%", report.overall_confidence * 100.0);
    println!();
    let counts = &report.attribute_counts;
    println!(
        "Attributes: {} total, {} matched, {} mismatched, {} missing, {} extra, {} unscored",
        counts.total, counts.matched, counts.mismatched, counts.missing, counts.extra,
        counts.unscored
    );
    if counts.false_positive_items > 0 || counts.false_negative_items > 0 {
        println!(
            "List items: {} false positives, {} false negatives",
            counts.false_positive_items, counts.false_negative_items
        );
    }
    println!();
    println!("[{status}]");
}
