use super::*;

/// One plotted series: a labelled retrieval method and the metrics it feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    pub label: String,
    pub method: RetrievalMethod,
    #[serde(default = "default_true")]
    pub ndcg: bool,
    #[serde(default)]
    pub precision_recall: bool,
}

/// Recall of the union of two series' top-k/2 tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixedConfig {
    pub label: String,
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub series: Vec<SeriesConfig>,
    #[serde(default)]
    pub mixed: Vec<MixedConfig>,
}

fn default_true() -> bool {
    true
}

const LSH_SHAPES: [(u32, u32); 3] = [(30, 10), (32, 8), (128, 8)];
const PRECISION_RECALL_SHAPE: (u32, u32) = (30, 10);

impl SweepConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = read_json(path)?;
        config
            .validate()
            .with_context(|| format!("invalid sweep config: {}", path.display()))?;
        Ok(config)
    }

    /// The experiment matrix: LSH over types and embeddings at three
    /// (vectors, band size) shapes with and without column aggregation, the
    /// brute-force and BM25 baselines, and two mixed ensembles.
    pub fn default_matrix(votes: u32) -> Self {
        let mut series = Vec::new();

        for signal in [Signal::Types, Signal::Embeddings] {
            let prefix = match signal {
                Signal::Types => "T",
                Signal::Embeddings => "E",
            };
            for column_aggregation in [false, true] {
                for (vectors, band_size) in LSH_SHAPES {
                    let suffix = if column_aggregation { "*" } else { "" };
                    series.push(SeriesConfig {
                        label: format!("{prefix}({vectors}, {band_size}){suffix}"),
                        method: RetrievalMethod::Lsh(LshParams {
                            signal,
                            votes,
                            vectors,
                            band_size,
                            column_aggregation,
                        }),
                        ndcg: true,
                        precision_recall: !column_aggregation
                            && (vectors, band_size) == PRECISION_RECALL_SHAPE,
                    });
                }
            }
        }

        let baselines = [
            (
                "BFJ",
                RetrievalMethod::BruteForce {
                    similarity: Similarity::Jaccard,
                },
                true,
            ),
            (
                "BFC",
                RetrievalMethod::BruteForce {
                    similarity: Similarity::Cosine,
                },
                true,
            ),
            (
                "BM25E",
                RetrievalMethod::Bm25 {
                    field: Bm25Field::Entities,
                },
                true,
            ),
            (
                "BM25T",
                RetrievalMethod::Bm25 {
                    field: Bm25Field::Text,
                },
                true,
            ),
            (
                "BM25PT",
                RetrievalMethod::Bm25Prefilter {
                    signal: Signal::Types,
                },
                false,
            ),
            (
                "BM25PC",
                RetrievalMethod::Bm25Prefilter {
                    signal: Signal::Embeddings,
                },
                false,
            ),
        ];
        for (label, method, precision_recall) in baselines {
            series.push(SeriesConfig {
                label: label.to_string(),
                method,
                ndcg: true,
                precision_recall,
            });
        }

        let mixed = vec![
            MixedConfig {
                label: "BFJ+BM25T".to_string(),
                left: "BFJ".to_string(),
                right: "BM25T".to_string(),
            },
            MixedConfig {
                label: "BFC+BM25T".to_string(),
                left: "BFC".to_string(),
                right: "BM25T".to_string(),
            },
        ];

        Self { series, mixed }
    }

    pub fn validate(&self) -> Result<()> {
        if self.series.is_empty() {
            bail!("sweep config has no series");
        }

        let mut labels = HashSet::new();
        for series in &self.series {
            if series.label.trim().is_empty() {
                bail!("series label must not be empty");
            }
            if !labels.insert(series.label.as_str()) {
                bail!("duplicate series label: {}", series.label);
            }
        }

        for mixed in &self.mixed {
            for reference in [&mixed.left, &mixed.right] {
                if !labels.contains(reference.as_str()) {
                    bail!(
                        "mixed series {} references unknown series {}",
                        mixed.label,
                        reference
                    );
                }
            }
        }

        Ok(())
    }

    pub fn series_labels(&self) -> Vec<String> {
        self.series.iter().map(|series| series.label.clone()).collect()
    }

    pub fn mixed_labels(&self) -> Vec<String> {
        self.mixed.iter().map(|mixed| mixed.label.clone()).collect()
    }
}
