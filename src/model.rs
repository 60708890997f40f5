use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const SCORE_FILE_NAME: &str = "filenameToScore.json";
pub const SEARCH_OUTPUT_DIR: &str = "search_output";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    #[serde(rename = "tableID")]
    pub table_id: String,
    pub score: f64,
}

/// Search duration in nanoseconds. Producers write either a JSON number or a
/// numeric string, and rewrites keep whichever form was read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Runtime {
    Number(serde_json::Number),
    Text(String),
}

impl Runtime {
    pub fn nanos(&self) -> Result<f64> {
        match self {
            Self::Number(number) => number
                .as_f64()
                .with_context(|| format!("runtime is not representable as f64: {number}")),
            Self::Text(text) => text
                .trim()
                .parse::<f64>()
                .with_context(|| format!("invalid runtime value: {text}")),
        }
    }

    pub fn seconds(&self) -> Result<f64> {
        Ok(self.nanos()? / 1_000_000_000.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFile {
    pub scores: Vec<ScoreEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<Runtime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduction: Option<f64>,
}

impl ScoreFile {
    pub fn from_scores(scores: Vec<ScoreEntry>) -> Self {
        Self {
            scores,
            runtime: None,
            threads: None,
            algorithm: None,
            reduction: None,
        }
    }
}

/// Wikipedia page index of the table corpus: both maps share the same row keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WikipageMapping {
    #[serde(default)]
    pub wikipage: HashMap<String, String>,
    #[serde(default)]
    pub tables: HashMap<String, Vec<String>>,
}

pub type CoverageMap = HashMap<String, f64>;
