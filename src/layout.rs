use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::{SCORE_FILE_NAME, SEARCH_OUTPUT_DIR};

/// Entity signal the LSH index was built from.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Types,
    Embeddings,
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Types => "types",
            Self::Embeddings => "embeddings",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Similarity {
    Jaccard,
    Cosine,
}

impl Similarity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jaccard => "jaccard",
            Self::Cosine => "cosine",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bm25Field {
    Entities,
    Text,
}

impl Bm25Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entities => "entities",
            Self::Text => "text",
        }
    }
}

/// LSH parameters shared by the evaluation sweep and the statistics walkers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct LshParams {
    pub signal: Signal,
    pub votes: u32,
    pub vectors: u32,
    pub band_size: u32,
    #[serde(default)]
    pub column_aggregation: bool,
}

impl LshParams {
    /// `vote_<v>/[aggregation/]<signal>` under a results root.
    pub fn signal_dir(root: &Path, votes: u32, signal: Signal, column_aggregation: bool) -> PathBuf {
        let mut path = root.join(format!("vote_{votes}"));
        if column_aggregation {
            path.push("aggregation");
        }
        path.join(signal.as_str())
    }

    pub fn params_dir(&self, root: &Path) -> PathBuf {
        Self::signal_dir(root, self.votes, self.signal, self.column_aggregation)
            .join(format!("vectors_{}", self.vectors))
            .join(format!("bandsize_{}", self.band_size))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMethod {
    Lsh(LshParams),
    BruteForce { similarity: Similarity },
    Bm25 { field: Bm25Field },
    Bm25Prefilter { signal: Signal },
}

/// One experimental condition: a method at a given query arity and top-k.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Configuration {
    pub method: RetrievalMethod,
    pub tuple: u32,
    pub k: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResultSource {
    Json(PathBuf),
    Tsv { path: PathBuf, query_id: String },
}

impl ResultSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Json(path) => path,
            Self::Tsv { path, .. } => path,
        }
    }
}

pub fn tuple_dir_name(tuple: u32) -> String {
    format!("{tuple}-tuple")
}

/// `<k>/<t>-tuple/search_output/<query>/filenameToScore.json` below `base`.
pub fn score_file_path(base: &Path, k: usize, tuple: u32, query_id: &str) -> PathBuf {
    base.join(k.to_string())
        .join(tuple_dir_name(tuple))
        .join(SEARCH_OUTPUT_DIR)
        .join(query_id)
        .join(SCORE_FILE_NAME)
}

#[derive(Clone, Debug)]
pub struct ResultLayout {
    root: PathBuf,
}

impl ResultLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn locate(&self, configuration: &Configuration, query_id: &str) -> ResultSource {
        let Configuration { method, tuple, k } = *configuration;
        let baseline = self.root.join("baseline");

        match method {
            RetrievalMethod::Lsh(params) => {
                ResultSource::Json(score_file_path(&params.params_dir(&self.root), k, tuple, query_id))
            }
            RetrievalMethod::BruteForce { similarity } => ResultSource::Json(score_file_path(
                &baseline.join(format!("baseline_{}", similarity.as_str())),
                k,
                tuple,
                query_id,
            )),
            RetrievalMethod::Bm25 { field } => ResultSource::Tsv {
                path: baseline
                    .join("bm25")
                    .join(k.to_string())
                    .join(tuple_dir_name(tuple))
                    .join(field.as_str())
                    .join("content.txt"),
                query_id: query_id.to_string(),
            },
            RetrievalMethod::Bm25Prefilter { signal } => ResultSource::Json(score_file_path(
                &baseline
                    .join("baseline_bm25_prefiltering")
                    .join(signal.as_str()),
                k,
                tuple,
                query_id,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lsh_path_includes_aggregation_segment_only_when_requested() {
        let layout = ResultLayout::new("results");
        let mut params = LshParams {
            signal: Signal::Types,
            votes: 3,
            vectors: 30,
            band_size: 10,
            column_aggregation: false,
        };
        let configuration = Configuration {
            method: RetrievalMethod::Lsh(params),
            tuple: 1,
            k: 100,
        };

        assert_eq!(
            layout.locate(&configuration, "wikipage_7"),
            ResultSource::Json(PathBuf::from(
                "results/vote_3/types/vectors_30/bandsize_10/100/1-tuple/search_output/wikipage_7/filenameToScore.json"
            ))
        );

        params.column_aggregation = true;
        let aggregated = Configuration {
            method: RetrievalMethod::Lsh(params),
            ..configuration
        };
        assert_eq!(
            layout.locate(&aggregated, "wikipage_7").path(),
            Path::new(
                "results/vote_3/aggregation/types/vectors_30/bandsize_10/100/1-tuple/search_output/wikipage_7/filenameToScore.json"
            )
        );
    }

    #[test]
    fn baseline_paths_follow_baseline_tree() {
        let layout = ResultLayout::new("results");
        let brute_force = Configuration {
            method: RetrievalMethod::BruteForce {
                similarity: Similarity::Cosine,
            },
            tuple: 5,
            k: 10,
        };
        assert_eq!(
            layout.locate(&brute_force, "wikipage_1").path(),
            Path::new(
                "results/baseline/baseline_cosine/10/5-tuple/search_output/wikipage_1/filenameToScore.json"
            )
        );

        let bm25 = Configuration {
            method: RetrievalMethod::Bm25 {
                field: Bm25Field::Text,
            },
            tuple: 1,
            k: 100,
        };
        assert_eq!(
            layout.locate(&bm25, "wikipage_1"),
            ResultSource::Tsv {
                path: PathBuf::from("results/baseline/bm25/100/1-tuple/text/content.txt"),
                query_id: "wikipage_1".to_string(),
            }
        );

        let prefilter = Configuration {
            method: RetrievalMethod::Bm25Prefilter {
                signal: Signal::Embeddings,
            },
            tuple: 1,
            k: 100,
        };
        assert_eq!(
            layout.locate(&prefilter, "wikipage_1").path(),
            Path::new(
                "results/baseline/baseline_bm25_prefiltering/embeddings/100/1-tuple/search_output/wikipage_1/filenameToScore.json"
            )
        );
    }

    #[test]
    fn retrieval_method_deserializes_from_tagged_json() {
        let method: RetrievalMethod = serde_json::from_str(
            r#"{"lsh": {"signal": "embeddings", "votes": 2, "vectors": 128, "band_size": 8}}"#,
        )
        .expect("lsh method should deserialize");
        assert_eq!(
            method,
            RetrievalMethod::Lsh(LshParams {
                signal: Signal::Embeddings,
                votes: 2,
                vectors: 128,
                band_size: 8,
                column_aggregation: false,
            })
        );

        let method: RetrievalMethod =
            serde_json::from_str(r#"{"bm25": {"field": "entities"}}"#).expect("bm25 method");
        assert_eq!(
            method,
            RetrievalMethod::Bm25 {
                field: Bm25Field::Entities
            }
        );
    }
}
