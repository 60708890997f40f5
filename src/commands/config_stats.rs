use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{info, warn};

use crate::cli::ConfigStatsArgs;
use crate::layout::{LshParams, score_file_path, tuple_dir_name};
use crate::model::{SEARCH_OUTPUT_DIR, ScoreFile};
use crate::scores::read_score_file;
use crate::util::{sorted_entry_names, sorted_subdirectories};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StatField {
    Runtime,
    Reduction,
}

impl StatField {
    fn as_str(self) -> &'static str {
        match self {
            Self::Runtime => "runtime_seconds",
            Self::Reduction => "reduction_percent",
        }
    }

    fn extract(self, file: &ScoreFile) -> Result<Option<f64>> {
        match self {
            Self::Runtime => file.runtime.as_ref().map(|runtime| runtime.seconds()).transpose(),
            Self::Reduction => Ok(file.reduction.map(|fraction| fraction * 100.0)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationDir {
    pub vectors: u32,
    pub band_size: u32,
    pub path: PathBuf,
}

impl ConfigurationDir {
    pub fn label(&self) -> String {
        format!("vectors_{} - bandsize_{}", self.vectors, self.band_size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationValues {
    pub configuration: ConfigurationDir,
    pub values: Vec<(String, f64)>,
}

pub fn run(args: ConfigStatsArgs, field: StatField) -> Result<()> {
    let signal_dir = LshParams::signal_dir(
        &args.results_root,
        args.votes,
        args.signal,
        args.column_aggregation,
    );
    let configurations = discover_configurations(&signal_dir)?;
    info!(
        root = %signal_dir.display(),
        configurations = configurations.len(),
        field = field.as_str(),
        "collecting configuration statistics"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    for configuration in configurations {
        let collected = collect_values(&configuration, args.k, args.tuple, field)?;

        writeln!(output)?;
        writeln!(output, "{}", collected.configuration.label())?;
        for (_, value) in &collected.values {
            writeln!(output, "{}", format_value(*value, args.decimal_comma))?;
        }

        let values = collected
            .values
            .iter()
            .map(|(_, value)| *value)
            .collect::<Vec<f64>>();
        if values.is_empty() {
            warn!(configuration = %collected.configuration.label(), "no values found");
            continue;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        info!(
            configuration = %collected.configuration.label(),
            queries = values.len(),
            median = median(&values),
            mean,
            field = field.as_str(),
            "configuration summary"
        );
    }
    output.flush()?;

    Ok(())
}

/// Finds `vectors_<n>/bandsize_<b>` directories under a signal directory,
/// ordered numerically by vector count then band size.
pub fn discover_configurations(signal_dir: &Path) -> Result<Vec<ConfigurationDir>> {
    let vectors_pattern =
        Regex::new(r"^vectors_(\d+)$").context("failed to compile vectors directory regex")?;
    let band_pattern =
        Regex::new(r"^bandsize_(\d+)$").context("failed to compile band size directory regex")?;

    let mut configurations = Vec::new();
    for vectors_dir in sorted_subdirectories(signal_dir)? {
        let Some(vectors) = capture_number(&vectors_pattern, &vectors_dir)? else {
            continue;
        };
        for band_dir in sorted_subdirectories(&vectors_dir)? {
            let Some(band_size) = capture_number(&band_pattern, &band_dir)? else {
                continue;
            };
            configurations.push(ConfigurationDir {
                vectors,
                band_size,
                path: band_dir,
            });
        }
    }

    configurations.sort_by_key(|configuration| (configuration.vectors, configuration.band_size));
    Ok(configurations)
}

fn capture_number(pattern: &Regex, dir: &Path) -> Result<Option<u32>> {
    let Some(name) = dir.file_name().and_then(|name| name.to_str()) else {
        return Ok(None);
    };
    let Some(captures) = pattern.captures(name) else {
        return Ok(None);
    };

    let number = captures
        .get(1)
        .map(|m| m.as_str())
        .context("missing numeric capture")?
        .parse::<u32>()
        .with_context(|| format!("invalid number in directory name: {name}"))?;
    Ok(Some(number))
}

pub fn collect_values(
    configuration: &ConfigurationDir,
    k: usize,
    tuple: u32,
    field: StatField,
) -> Result<ConfigurationValues> {
    let search_output = configuration
        .path
        .join(k.to_string())
        .join(tuple_dir_name(tuple))
        .join(SEARCH_OUTPUT_DIR);

    let mut values = Vec::new();
    for query_id in sorted_entry_names(&search_output)? {
        let path = score_file_path(&configuration.path, k, tuple, &query_id);
        let file = read_score_file(&path)?
            .with_context(|| format!("missing result file: {}", path.display()))?;
        let value = field
            .extract(&file)
            .with_context(|| format!("invalid {} in {}", field.as_str(), path.display()))?
            .with_context(|| format!("{} missing from {}", field.as_str(), path.display()))?;
        values.push((query_id, value));
    }

    Ok(ConfigurationValues {
        configuration: configuration.clone(),
        values,
    })
}

pub fn format_value(value: f64, decimal_comma: bool) -> String {
    let formatted = value.to_string();
    if decimal_comma {
        formatted.replace('.', ",")
    } else {
        formatted
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|left, right| left.total_cmp(right));
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Signal;
    use crate::model::{Runtime, ScoreEntry};
    use crate::util::write_json_pretty;

    fn write_result(base: &Path, query_id: &str, runtime: &str, reduction: f64) {
        let mut file = ScoreFile::from_scores(vec![ScoreEntry {
            table_id: "t.json".to_string(),
            score: 1.0,
        }]);
        file.runtime = Some(Runtime::Text(runtime.to_string()));
        file.reduction = Some(reduction);
        write_json_pretty(&score_file_path(base, 10, 1, query_id), &file).expect("write fixture");
    }

    #[test]
    fn configurations_are_discovered_in_numeric_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let signal_dir = LshParams::signal_dir(dir.path(), 3, Signal::Types, false);
        for (vectors, band) in [(128, 8), (32, 8), (30, 10)] {
            std::fs::create_dir_all(
                signal_dir
                    .join(format!("vectors_{vectors}"))
                    .join(format!("bandsize_{band}")),
            )
            .expect("create fixture dirs");
        }
        std::fs::create_dir_all(signal_dir.join("notes")).expect("create stray dir");

        let found = discover_configurations(&signal_dir).expect("discover");
        let shapes = found
            .iter()
            .map(|configuration| (configuration.vectors, configuration.band_size))
            .collect::<Vec<(u32, u32)>>();
        assert_eq!(shapes, vec![(30, 10), (32, 8), (128, 8)]);
    }

    #[test]
    fn runtime_and_reduction_are_scaled() {
        let dir = tempfile::tempdir().expect("tempdir");
        let band_dir = dir.path().join("vectors_30").join("bandsize_10");
        write_result(&band_dir, "wikipage_1", "2000000000", 0.25);
        write_result(&band_dir, "wikipage_2", "500000000", 0.5);
        let configuration = ConfigurationDir {
            vectors: 30,
            band_size: 10,
            path: band_dir,
        };

        let runtime = collect_values(&configuration, 10, 1, StatField::Runtime).expect("runtime");
        assert_eq!(
            runtime.values,
            vec![
                ("wikipage_1".to_string(), 2.0),
                ("wikipage_2".to_string(), 0.5)
            ]
        );

        let reduction =
            collect_values(&configuration, 10, 1, StatField::Reduction).expect("reduction");
        assert_eq!(reduction.values[0].1, 25.0);
        assert_eq!(reduction.values[1].1, 50.0);
    }

    #[test]
    fn decimal_comma_formatting() {
        assert_eq!(format_value(1.25, true), "1,25");
        assert_eq!(format_value(1.25, false), "1.25");
        assert_eq!(median(&[3.0, 1.0, 2.0, 10.0]), 2.5);
    }
}
