use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::layout::ResultSource;
use crate::model::{ScoreEntry, ScoreFile};

const TSV_QUERY_COLUMN: usize = 0;
const TSV_TABLE_COLUMN: usize = 2;
const TSV_SCORE_COLUMN: usize = 4;
const TSV_QUERY_PREFIX: &str = "wikipage_";

/// Scored tables for one query in producer order. Re-scoring an id keeps its
/// first position and takes the newer score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    entries: Vec<ScoreEntry>,
    positions: HashMap<String, usize>,
}

impl Ranking {
    pub fn push(&mut self, table_id: String, score: f64) {
        if let Some(&position) = self.positions.get(&table_id) {
            self.entries[position].score = score;
            return;
        }

        self.positions.insert(table_id.clone(), self.entries.len());
        self.entries.push(ScoreEntry { table_id, score });
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn score_of(&self, table_id: &str) -> Option<f64> {
        self.positions
            .get(table_id)
            .map(|&position| self.entries[position].score)
    }

    /// Entries by descending score; equal scores keep insertion order.
    pub fn sorted(&self) -> Vec<ScoreEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|left, right| right.score.total_cmp(&left.score));
        sorted
    }

    pub fn truncated(&self, limit: usize) -> Vec<ScoreEntry> {
        let mut sorted = self.sorted();
        sorted.truncate(limit);
        sorted
    }

    pub fn ranked_ids(&self, top: Option<usize>) -> Vec<String> {
        let sorted = match top {
            Some(limit) => self.truncated(limit),
            None => self.sorted(),
        };
        sorted.into_iter().map(|entry| entry.table_id).collect()
    }
}

impl FromIterator<ScoreEntry> for Ranking {
    fn from_iter<I: IntoIterator<Item = ScoreEntry>>(iter: I) -> Self {
        let mut ranking = Ranking::default();
        for entry in iter {
            ranking.push(entry.table_id, entry.score);
        }
        ranking
    }
}

/// Reads one query's ranking. A missing file is a lookup miss, not an error.
pub fn read_ranking(source: &ResultSource) -> Result<Option<Ranking>> {
    let raw = match read_optional(source.path())? {
        Some(raw) => raw,
        None => return Ok(None),
    };

    let ranking = match source {
        ResultSource::Json(path) => {
            let file: ScoreFile = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            file.scores.into_iter().collect()
        }
        ResultSource::Tsv { path, query_id } => parse_tsv_ranking(&raw, query_id)
            .with_context(|| format!("failed to parse {}", path.display()))?,
    };

    Ok(Some(ranking))
}

pub fn read_score_file(path: &Path) -> Result<Option<ScoreFile>> {
    match read_optional(path)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .with_context(|| format!("failed to parse {}", path.display())),
        None => Ok(None),
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}

/// Parses the BM25 run format: one tab-separated line per (query, table)
/// with the numeric query suffix, table id and score in fixed columns.
pub fn parse_tsv_ranking(raw: &str, query_id: &str) -> Result<Ranking> {
    let mut ranking = Ranking::default();

    for (index, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let columns = line.split('\t').collect::<Vec<&str>>();
        if columns.len() <= TSV_SCORE_COLUMN {
            bail!(
                "line {} has {} columns, expected at least {}",
                index + 1,
                columns.len(),
                TSV_SCORE_COLUMN + 1
            );
        }

        let line_query = format!("{TSV_QUERY_PREFIX}{}", columns[TSV_QUERY_COLUMN].trim());
        if line_query != query_id {
            continue;
        }

        let score = columns[TSV_SCORE_COLUMN]
            .trim()
            .parse::<f64>()
            .with_context(|| format!("invalid score on line {}", index + 1))?;
        ranking.push(columns[TSV_TABLE_COLUMN].trim().to_string(), score);
    }

    Ok(ranking)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranking(pairs: &[(&str, f64)]) -> Ranking {
        pairs
            .iter()
            .map(|(id, score)| ScoreEntry {
                table_id: id.to_string(),
                score: *score,
            })
            .collect()
    }

    #[test]
    fn sorted_is_stable_for_tied_scores() {
        let ranking = ranking(&[("a", 0.5), ("b", 0.9), ("c", 0.5), ("d", 0.9)]);
        assert_eq!(ranking.ranked_ids(None), vec!["b", "d", "a", "c"]);
        assert_eq!(ranking.ranked_ids(Some(3)), vec!["b", "d", "a"]);
    }

    #[test]
    fn repeated_id_keeps_first_position_and_last_score() {
        let ranking = ranking(&[("a", 0.1), ("b", 0.2), ("a", 0.7)]);
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking.entries()[0].table_id, "a");
        assert_eq!(ranking.score_of("a"), Some(0.7));
    }

    #[test]
    fn tsv_ranking_filters_on_reconstructed_query_id() {
        let raw = "12\tQ0\ttable-a.json\t1\t3.5\trun\n\
                   13\tQ0\ttable-b.json\t1\t9.0\trun\n\
                   \n\
                   12\tQ0\ttable-c.json\t2\t1.25\trun\n";

        let ranking = parse_tsv_ranking(raw, "wikipage_12").expect("tsv should parse");
        assert_eq!(ranking.ranked_ids(None), vec!["table-a.json", "table-c.json"]);
        assert_eq!(ranking.score_of("table-c.json"), Some(1.25));
    }

    #[test]
    fn tsv_ranking_rejects_short_lines() {
        let error = parse_tsv_ranking("12\tQ0\ttable-a.json\n", "wikipage_12")
            .expect_err("short line should fail");
        assert!(error.to_string().contains("columns"), "unexpected error: {error}");
    }

    #[test]
    fn missing_result_file_is_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = ResultSource::Json(dir.path().join("absent").join("filenameToScore.json"));
        assert!(read_ranking(&source).expect("lookup miss").is_none());

        let tsv = ResultSource::Tsv {
            path: dir.path().join("content.txt"),
            query_id: "wikipage_1".to_string(),
        };
        assert!(read_ranking(&tsv).expect("lookup miss").is_none());
    }

    #[test]
    fn json_result_file_parses_scores_and_optional_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("filenameToScore.json");
        fs::write(
            &path,
            serde_json::json!({
                "scores": [
                    {"tableID": "t1.json", "score": 0.25},
                    {"tableID": "t2.json", "score": 0.75}
                ],
                "runtime": "1500000000",
                "threads": 4,
                "algorithm": "lsh"
            })
            .to_string(),
        )
        .expect("write fixture");

        let ranking = read_ranking(&ResultSource::Json(path.clone()))
            .expect("read")
            .expect("present");
        assert_eq!(ranking.ranked_ids(None), vec!["t2.json", "t1.json"]);

        let file = read_score_file(&path).expect("read").expect("present");
        assert_eq!(file.threads, Some(4));
        let seconds = file.runtime.expect("runtime").seconds().expect("seconds");
        assert!((seconds - 1.5).abs() < 1e-12);
    }

    #[test]
    fn malformed_result_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("filenameToScore.json");
        fs::write(&path, "{\"scores\": 3}").expect("write fixture");

        assert!(read_ranking(&ResultSource::Json(path)).is_err());
    }
}
