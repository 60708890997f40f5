use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::TruncateArgs;
use crate::model::{SCORE_FILE_NAME, SEARCH_OUTPUT_DIR, ScoreFile};
use crate::scores::read_score_file;
use crate::util::{sorted_subdirectories, write_json_pretty};

pub fn run(args: TruncateArgs) -> Result<()> {
    if args.k == 0 {
        bail!("--k must be at least 1");
    }

    for source_dir in &args.source_dirs {
        let target_dir = sibling_for_k(source_dir, args.k)?;
        let written = truncate_tree(source_dir, &target_dir, args.k)?;
        info!(
            source = %source_dir.display(),
            target = %target_dir.display(),
            files = written,
            k = args.k,
            "truncated result tree"
        );
    }

    Ok(())
}

/// `.../bandsize_8/100` becomes `.../bandsize_8/10` for k = 10.
pub fn sibling_for_k(source_dir: &Path, k: usize) -> Result<PathBuf> {
    let parent = source_dir
        .parent()
        .with_context(|| format!("source directory has no parent: {}", source_dir.display()))?;
    Ok(parent.join(k.to_string()))
}

/// Mirrors `<query_dir>/search_output/<query>/filenameToScore.json` from
/// `source_dir` into `target_dir`, keeping the first `k` scores of each file.
pub fn truncate_tree(source_dir: &Path, target_dir: &Path, k: usize) -> Result<usize> {
    if source_dir == target_dir {
        bail!(
            "refusing to truncate {} onto itself",
            source_dir.display()
        );
    }

    let mut written = 0usize;
    for query_dir in sorted_subdirectories(source_dir)? {
        let query_dir_name = query_dir
            .file_name()
            .with_context(|| format!("invalid directory: {}", query_dir.display()))?;
        let search_output = query_dir.join(SEARCH_OUTPUT_DIR);

        for query_folder in sorted_subdirectories(&search_output)? {
            let query_name = query_folder
                .file_name()
                .with_context(|| format!("invalid directory: {}", query_folder.display()))?;
            let source_file = query_folder.join(SCORE_FILE_NAME);
            let file = read_score_file(&source_file)?
                .with_context(|| format!("missing result file: {}", source_file.display()))?;

            let target_file = target_dir
                .join(query_dir_name)
                .join(SEARCH_OUTPUT_DIR)
                .join(query_name)
                .join(SCORE_FILE_NAME);
            write_json_pretty(&target_file, &truncate_scores(file, k))?;
            written += 1;
        }
    }

    Ok(written)
}

/// First `k` scores in file order; metadata fields carried over verbatim.
pub fn truncate_scores(mut file: ScoreFile, k: usize) -> ScoreFile {
    file.scores.truncate(k);
    file
}
