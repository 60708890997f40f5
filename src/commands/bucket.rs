use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::cli::BucketArgs;
use crate::layout::{Signal, score_file_path, tuple_dir_name};
use crate::model::{CoverageMap, SEARCH_OUTPUT_DIR, ScoreEntry, ScoreFile};
use crate::scores::read_score_file;
use crate::util::{read_json, sorted_entry_names, write_json_pretty};

const UNBUCKETED_DIR: &str = "all";

pub fn run(args: BucketArgs) -> Result<()> {
    if args.thresholds.is_empty() {
        bail!("at least one --threshold is required");
    }
    if let Some(threshold) = args.thresholds.iter().find(|threshold| **threshold > 100) {
        bail!("coverage threshold must be a percentage: {threshold}");
    }

    let coverage: CoverageMap = read_json(&args.coverage_path)?;
    info!(
        tables = coverage.len(),
        path = %args.coverage_path.display(),
        "loaded coverage map"
    );

    for &signal in &args.signals {
        for &tuple in &args.tuples {
            let written = bucket_configuration(&args, &coverage, signal, tuple)?;
            info!(
                signal = %signal,
                tuple,
                queries = written,
                thresholds = ?args.thresholds,
                "bucketed linking results"
            );
        }
    }

    Ok(())
}

fn params_path(root: &Path, bucket: &str, signal: Signal, vectors: u32, band_size: u32) -> PathBuf {
    root.join(bucket)
        .join(signal.as_str())
        .join(format!("vectors_{vectors}"))
        .join(format!("bandsize_{band_size}"))
}

fn bucket_configuration(
    args: &BucketArgs,
    coverage: &CoverageMap,
    signal: Signal,
    tuple: u32,
) -> Result<usize> {
    let source_base = params_path(
        &args.results_root,
        UNBUCKETED_DIR,
        signal,
        args.vectors,
        args.band_size,
    );
    let search_output = source_base
        .join(args.source_k.to_string())
        .join(tuple_dir_name(tuple))
        .join(SEARCH_OUTPUT_DIR);

    let mut written = 0usize;
    for query_id in sorted_entry_names(&search_output)? {
        let source_file = score_file_path(&source_base, args.source_k, tuple, &query_id);
        let file = read_score_file(&source_file)?
            .with_context(|| format!("missing result file: {}", source_file.display()))?;

        for &threshold in &args.thresholds {
            let scores = bucket_scores(&file.scores, coverage, threshold, args.k);
            let target_base = params_path(
                &args.results_root,
                &threshold.to_string(),
                signal,
                args.vectors,
                args.band_size,
            );
            let target_file = score_file_path(&target_base, args.k, tuple, &query_id);
            debug!(
                query = %query_id,
                threshold,
                kept = scores.len(),
                "writing coverage band"
            );
            write_json_pretty(&target_file, &ScoreFile::from_scores(scores))?;
        }
        written += 1;
    }

    Ok(written)
}

/// Of the first `k` entries, keeps those whose coverage is strictly below
/// `threshold_pct` percent. Tables without a coverage value are dropped.
pub fn bucket_scores(
    scores: &[ScoreEntry],
    coverage: &CoverageMap,
    threshold_pct: u32,
    k: usize,
) -> Vec<ScoreEntry> {
    let limit = f64::from(threshold_pct) / 100.0;
    scores
        .iter()
        .take(k)
        .filter(|entry| {
            coverage
                .get(&entry.table_id)
                .is_some_and(|fraction| *fraction < limit)
        })
        .cloned()
        .collect()
}
