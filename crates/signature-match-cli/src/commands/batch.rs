//! One-reference, many-candidates comparison command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use signature_match::{BatchEntry, BatchReport};

use crate::ScoreOptions;

pub fn run(
    reference: PathBuf,
    candidates: Vec<PathBuf>,
    options: &ScoreOptions,
    output: Option<PathBuf>,
) -> Result<()> {
    let scorer = options.scorer()?;
    let threshold = options.threshold()?;

    let prepared = scorer
        .prepare(&reference)
        .with_context(|| format!("Failed to load reference {}", reference.display()))?;

    log::info!(
        "Scoring {} candidates against {}",
        candidates.len(),
        reference.display()
    );

    // Each comparison stays single-threaded; parallelism is across candidates.
    let entries: Vec<BatchEntry> = candidates
        .par_iter()
        .map(|candidate| {
            let result = scorer
                .prepare(candidate)
                .and_then(|c| scorer.compare_prepared(&prepared, &c));
            match result {
                Ok(report) => BatchEntry::Scored(report.with_verdict(threshold)),
                Err(e) => {
                    log::warn!("{}: {}", candidate.display(), e);
                    BatchEntry::Failed {
                        source: candidate.display().to_string(),
                        error: e.to_string(),
                    }
                }
            }
        })
        .collect();

    let mut report = BatchReport::new(prepared.label().to_string(), threshold);
    report.entries = entries;

    print_table(&report);

    if let Some(output_path) = output {
        write_report(&report, &output_path)?;
        println!();
        println!("Saved to: {}", output_path.display());
    }

    Ok(())
}

fn print_table(report: &BatchReport) {
    println!("Reference: {}", report.reference);
    println!("Threshold: {}", report.threshold);
    println!();
    println!("{:<40} {:>8} {:>10}", "Candidate", "Score", "Verdict");
    println!("{:-<60}", "");

    let mut sorted: Vec<&BatchEntry> = report.entries.iter().collect();
    sorted.sort_by(|a, b| {
        let a = a.score().unwrap_or(f64::NEG_INFINITY);
        let b = b.score().unwrap_or(f64::NEG_INFINITY);
        b.total_cmp(&a)
    });

    for entry in sorted {
        match entry {
            BatchEntry::Scored(r) => {
                let verdict = r.verdict.map_or("-".to_string(), |v| v.to_string());
                println!("{:<40} {:>8.2} {:>10}", r.source_b, r.score, verdict);
            }
            BatchEntry::Failed { source, error } => {
                println!("{:<40} {:>8} {:>10}  {}", source, "-", "error", error);
            }
        }
    }

    println!();
    println!(
        "{} of {} candidates match ({} failed)",
        report.matches().count(),
        report.entries.len(),
        report.failure_count()
    );
    if let Some(best) = report.best() {
        println!("Best: {} ({:.2}%)", best.source_b, best.score);
    }
}

fn write_report(report: &BatchReport, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("json") => report.write_json(path),
        Some("csv") => report.write_csv(path),
        _ => bail!(
            "Unsupported output format for {} (use .json or .csv)",
            path.display()
        ),
    }
    .with_context(|| format!("Failed to write to {}", path.display()))
}
