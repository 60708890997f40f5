use super::*;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Ndcg,
    Precision,
    Recall,
    MixedRecall,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Ndcg,
        Metric::Precision,
        Metric::Recall,
        Metric::MixedRecall,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ndcg => "ndcg",
            Self::Precision => "precision",
            Self::Recall => "recall",
            Self::MixedRecall => "mixed_recall",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Ndcg => "NDCG",
            Self::Precision => "Precision",
            Self::Recall => "Recall",
            Self::MixedRecall => "Mixed recall",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SampleKey {
    pub tuple: u32,
    pub metric: Metric,
    pub label: String,
}

/// Per-query metric values keyed by (arity, metric, series label). Labels
/// are reported in sweep order.
#[derive(Debug, Clone, Default)]
pub struct MetricTable {
    labels: Vec<String>,
    samples: HashMap<SampleKey, Vec<f64>>,
}

impl MetricTable {
    pub fn new(labels: Vec<String>) -> Self {
        Self {
            labels,
            samples: HashMap::new(),
        }
    }

    pub fn record(&mut self, tuple: u32, metric: Metric, label: &str, value: f64) {
        self.samples
            .entry(SampleKey {
                tuple,
                metric,
                label: label.to_string(),
            })
            .or_default()
            .push(value);
    }

    pub fn values(&self, tuple: u32, metric: Metric, label: &str) -> &[f64] {
        self.samples
            .get(&SampleKey {
                tuple,
                metric,
                label: label.to_string(),
            })
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Non-empty groups for one panel, in label order.
    pub fn groups(&self, tuple: u32, metric: Metric) -> Vec<(&str, &[f64])> {
        self.labels
            .iter()
            .map(|label| (label.as_str(), self.values(tuple, metric, label)))
            .filter(|(_, values)| !values.is_empty())
            .collect()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SweepContext<'a> {
    pub layout: &'a ResultLayout,
    pub sweep: &'a SweepConfig,
    pub corpus: &'a Corpus,
    pub k: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueryOutcome {
    pub cells_evaluated: usize,
    pub cells_missing: usize,
}

/// Evaluates every series of the sweep for one query and records the
/// resulting samples. Series without a result file contribute nothing.
pub fn evaluate_query(
    context: &SweepContext<'_>,
    query_id: &str,
    tuple: u32,
    truth: &GroundTruth,
    table: &mut MetricTable,
) -> Result<QueryOutcome> {
    let truth_ids = truth.top_ids(context.k);
    let mut outcome = QueryOutcome::default();
    let mut rankings = HashMap::<&str, Ranking>::new();

    for series in &context.sweep.series {
        let configuration = Configuration {
            method: series.method,
            tuple,
            k: context.k,
        };
        let source = context.layout.locate(&configuration, query_id);
        let Some(ranking) = read_ranking(&source)? else {
            debug!(
                query = %query_id,
                series = %series.label,
                path = %source.path().display(),
                "result file missing"
            );
            outcome.cells_missing += 1;
            continue;
        };
        outcome.cells_evaluated += 1;

        if series.ndcg {
            let (relevance, predicted) = truth.aligned_vectors(context.corpus, &ranking);
            if let Some(value) = ndcg_at_k(&relevance, &predicted, context.k) {
                table.record(tuple, Metric::Ndcg, &series.label, value);
            }
        }

        if series.precision_recall {
            let predicted = ranking.ranked_ids(Some(context.k));
            table.record(
                tuple,
                Metric::Precision,
                &series.label,
                precision(&predicted, &truth_ids),
            );
            if let Some(value) = recall(&predicted, &truth_ids) {
                table.record(tuple, Metric::Recall, &series.label, value);
            }
        }

        rankings.insert(series.label.as_str(), ranking);
    }

    let half = context.k / 2;
    for mixed in &context.sweep.mixed {
        let (Some(left), Some(right)) = (
            rankings.get(mixed.left.as_str()),
            rankings.get(mixed.right.as_str()),
        ) else {
            continue;
        };

        let union = mixed_union(left, right, half);
        if let Some(value) = recall(&union, &truth_ids) {
            table.record(tuple, Metric::MixedRecall, &mixed.label, value);
        }
    }

    Ok(outcome)
}

/// Top-`top` tables of both rankings, deduplicated, left first.
pub fn mixed_union(left: &Ranking, right: &Ranking, top: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    left.ranked_ids(Some(top))
        .into_iter()
        .chain(right.ranked_ids(Some(top)))
        .filter(|table_id| seen.insert(table_id.clone()))
        .collect()
}
