use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::embedding::DEFAULT_EMBEDDING_DIM;

#[derive(Parser, Debug)]
#[command(
    name = "docgrade",
    version,
    about = "Structured-document evaluation and grading tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Evaluate(EvaluateArgs),
    Compare(CompareArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Machine-extracted document (JSON).
    #[arg(long)]
    pub predicted: PathBuf,

    /// Ground-truth baseline document (JSON).
    #[arg(long)]
    pub expected: PathBuf,

    /// Field policy configuration (JSON).
    #[arg(long)]
    pub policy: PathBuf,

    /// Defaults to the predicted file's stem.
    #[arg(long)]
    pub document_id: Option<String>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    /// Print the full report as JSON instead of the summary.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long, default_value_t = DEFAULT_EMBEDDING_DIM)]
    pub embedding_dim: usize,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    /// Stored evaluation report, as NAME=PATH. Repeatable; the first one is
    /// the baseline.
    #[arg(long = "report", value_parser = parse_named_report, required = true)]
    pub reports: Vec<NamedReport>,

    #[arg(long)]
    pub comparison_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct NamedReport {
    pub run_id: String,
    pub path: PathBuf,
}

fn parse_named_report(raw: &str) -> Result<NamedReport, String> {
    let (run_id, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got {raw:?}"))?;
    if run_id.trim().is_empty() {
        return Err(format!("empty run name in {raw:?}"));
    }
    if path.trim().is_empty() {
        return Err(format!("empty report path in {raw:?}"));
    }
    Ok(NamedReport {
        run_id: run_id.trim().to_string(),
        path: PathBuf::from(path.trim()),
    })
}
