use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::CompareArgs;
use crate::corpus::compare_runs;
use crate::report::DocumentReport;
use crate::util::{now_utc_string, read_json_file, write_json_pretty};

pub fn run(args: CompareArgs) -> Result<()> {
    if args.reports.len() < 2 {
        bail!("compare needs at least two --report entries (baseline first)");
    }

    let mut runs = Vec::with_capacity(args.reports.len());
    for named in &args.reports {
        let report: DocumentReport = read_json_file(&named.path)
            .with_context(|| format!("failed to load run {}", named.run_id))?;
        runs.push((named.run_id.clone(), report));
    }

    let comparison = compare_runs(&runs, now_utc_string());

    info!(
        baseline = %comparison.baseline_run_id,
        runs = comparison.runs.len(),
        "corpus comparison computed"
    );

    if let Some(comparison_path) = &args.comparison_path {
        write_json_pretty(comparison_path, &comparison)?;
        info!(path = %comparison_path.display(), "comparison written");
    }

    if args.json {
        let rendered = serde_json::to_string_pretty(&comparison)
            .context("failed to render comparison")?;
        println!("{rendered}");
    } else {
        print!("{}", comparison.render_table());
    }

    Ok(())
}
