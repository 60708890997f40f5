use super::*;

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationInputs {
    pub results_root: String,
    pub queries_dir: String,
    pub ground_truth_dir: String,
    pub corpus_dir: String,
    pub mapping_path: String,
    pub mapping_sha256: String,
    pub corpus_size: usize,
    pub mapped_pages: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TupleCounts {
    pub tuple: u32,
    pub queries: usize,
    pub queries_without_truth: usize,
    pub cells_evaluated: usize,
    pub cells_missing: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub tuple: u32,
    pub metric: Metric,
    pub label: String,
    pub summary: Summary,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub report_version: u32,
    pub generated_at: String,
    pub k: usize,
    pub inputs: EvaluationInputs,
    pub counts: Vec<TupleCounts>,
    pub groups: Vec<GroupReport>,
    pub figures: Vec<String>,
}

pub fn build_groups(table: &MetricTable, tuples: &[u32]) -> Vec<GroupReport> {
    let mut groups = Vec::new();
    for &tuple in tuples {
        for metric in Metric::ALL {
            for (label, values) in table.groups(tuple, metric) {
                let Some(summary) = Summary::from_values(values) else {
                    continue;
                };
                groups.push(GroupReport {
                    tuple,
                    metric,
                    label: label.to_string(),
                    summary,
                    values: values.to_vec(),
                });
            }
        }
    }
    groups
}

/// Median table per arity and metric, one line per series.
pub fn write_median_table<W: Write>(output: &mut W, k: usize, groups: &[GroupReport]) -> Result<()> {
    let mut current: Option<(u32, Metric)> = None;

    for group in groups {
        if current != Some((group.tuple, group.metric)) {
            if current.is_some() {
                writeln!(output)?;
            }
            writeln!(
                output,
                "{}@{} ({}-tuple queries)",
                group.metric.title(),
                k,
                group.tuple
            )?;
            current = Some((group.tuple, group.metric));
        }

        writeln!(
            output,
            "  {:<14} median={:.4} mean={:.4} n={}",
            group.label, group.summary.median, group.summary.mean, group.summary.count
        )?;
    }

    Ok(())
}
