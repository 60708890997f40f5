use super::*;

const REPORT_VERSION: u32 = 1;
const REPORT_FILE_NAME: &str = "evaluation_report.json";

pub fn run(args: EvaluateArgs) -> Result<()> {
    if args.k == 0 {
        bail!("--k must be at least 1");
    }
    let tuples = if args.tuples.is_empty() {
        vec![1, 5]
    } else {
        args.tuples.clone()
    };

    let sweep = match &args.sweep_config {
        Some(path) => SweepConfig::load(path)?,
        None => {
            let sweep = SweepConfig::default_matrix(args.votes);
            sweep.validate()?;
            sweep
        }
    };

    let corpus = Corpus::from_dir(&args.corpus_dir)?;
    let index = CategoryIndex::load(&args.mapping_path)?;
    let mapping_sha256 = sha256_file(&args.mapping_path)?;
    info!(
        corpus_size = corpus.len(),
        mapped_pages = index.page_count(),
        series = sweep.series.len(),
        mixed = sweep.mixed.len(),
        k = args.k,
        "loaded evaluation inputs"
    );

    let layout = ResultLayout::new(&args.results_root);
    let context = SweepContext {
        layout: &layout,
        sweep: &sweep,
        corpus: &corpus,
        k: args.k,
    };

    let mut labels = sweep.series_labels();
    labels.extend(sweep.mixed_labels());
    let mut table = MetricTable::new(labels);
    let mut counts = Vec::with_capacity(tuples.len());

    for &tuple in &tuples {
        let queries = discover_queries(&args.queries_dir, tuple)?;
        info!(tuple, queries = queries.len(), "evaluating queries");

        let mut tuple_counts = TupleCounts {
            tuple,
            queries: queries.len(),
            queries_without_truth: 0,
            cells_evaluated: 0,
            cells_missing: 0,
        };

        for query in &queries {
            let truth = load_ground_truth(&args.ground_truth_dir, query, &index, &corpus)?;
            if truth.is_empty() {
                tuple_counts.queries_without_truth += 1;
                debug!(query = %query.id, "query has no judged tables in the corpus");
            } else {
                debug!(
                    query = %query.id,
                    judged = truth.judgments().len(),
                    "loaded ground truth"
                );
            }

            let outcome = evaluate_query(&context, &query.id, tuple, &truth, &mut table)?;
            tuple_counts.cells_evaluated += outcome.cells_evaluated;
            tuple_counts.cells_missing += outcome.cells_missing;
        }

        if tuple_counts.cells_missing > 0 {
            warn!(
                tuple,
                missing = tuple_counts.cells_missing,
                "some configurations have no result file and were skipped"
            );
        }
        counts.push(tuple_counts);
    }

    let groups = build_groups(&table, &tuples);
    info!(
        samples = table.sample_count(),
        groups = groups.len(),
        "evaluation sweep complete"
    );

    let mut figures = Vec::new();
    if !args.skip_plots {
        for &tuple in &tuples {
            for metric in Metric::ALL {
                let panel = table.groups(tuple, metric);
                if panel.is_empty() {
                    continue;
                }

                let title = format!("{}@{} ({}-tuple queries)", metric.title(), args.k, tuple);
                let y_label = match metric {
                    Metric::Ndcg => "NDCG",
                    _ => "Fraction",
                };
                let path = args
                    .output_dir
                    .join(format!("{}_{}.svg", metric.as_str(), tuple_dir_name(tuple)));
                write_figure(&path, &render_box_plot(&title, y_label, &panel))?;
                info!(path = %path.display(), "wrote figure");
                figures.push(path.display().to_string());
            }
        }
    }

    let report = EvaluationReport {
        report_version: REPORT_VERSION,
        generated_at: now_utc_string(),
        k: args.k,
        inputs: EvaluationInputs {
            results_root: args.results_root.display().to_string(),
            queries_dir: args.queries_dir.display().to_string(),
            ground_truth_dir: args.ground_truth_dir.display().to_string(),
            corpus_dir: args.corpus_dir.display().to_string(),
            mapping_path: args.mapping_path.display().to_string(),
            mapping_sha256,
            corpus_size: corpus.len(),
            mapped_pages: index.page_count(),
        },
        counts,
        groups,
        figures,
    };

    let report_path = args.output_dir.join(REPORT_FILE_NAME);
    write_json_pretty(&report_path, &report)?;
    info!(path = %report_path.display(), "wrote evaluation report");

    let mut output = io::BufWriter::new(io::stdout().lock());
    write_median_table(&mut output, args.k, &report.groups)?;
    output.flush()?;

    Ok(())
}
