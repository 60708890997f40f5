use super::*;

pub const WIKIPEDIA_PAGE_PREFIX: &str = "https://en.wikipedia.org/wiki/";

/// Table ids of the searchable corpus, in listing order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    ids: Vec<String>,
    members: HashSet<String>,
}

impl Corpus {
    /// Lists table files under `dir`. Subdirectories whose names carry no
    /// extension are shard folders and contribute their own files.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut ids = Vec::new();
        for name in sorted_entry_names(dir)? {
            let path = dir.join(&name);
            if path.is_dir() {
                if name.contains('.') {
                    continue;
                }
                ids.extend(sorted_entry_names(&path)?);
            } else {
                ids.push(name);
            }
        }

        if ids.is_empty() {
            bail!("table corpus is empty: {}", dir.display());
        }
        Ok(Self::from_ids(ids))
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut corpus = Corpus::default();
        for id in ids {
            let id = id.into();
            if corpus.members.insert(id.clone()) {
                corpus.ids.push(id);
            }
        }
        corpus
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, table_id: &str) -> bool {
        self.members.contains(table_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Wikipedia page URL to member tables, built once from the mapping file.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    tables_by_page: HashMap<String, Vec<String>>,
}

impl CategoryIndex {
    pub fn load(path: &Path) -> Result<Self> {
        let mapping: WikipageMapping = read_json(path)?;
        Ok(Self::from_mapping(mapping))
    }

    pub fn from_mapping(mapping: WikipageMapping) -> Self {
        let WikipageMapping {
            wikipage,
            mut tables,
        } = mapping;

        // Rows are scanned in index order so the first row wins a shared URL.
        let mut rows = wikipage.into_iter().collect::<Vec<(String, String)>>();
        rows.sort_by(|(left, _), (right, _)| row_order(left).cmp(&row_order(right)));

        let mut tables_by_page = HashMap::with_capacity(rows.len());
        for (row, url) in rows {
            let members = tables.remove(&row).unwrap_or_default();
            tables_by_page.entry(url).or_insert(members);
        }

        Self { tables_by_page }
    }

    pub fn tables_for_category(&self, category: &str) -> &[String] {
        let url = format!("{WIKIPEDIA_PAGE_PREFIX}{category}");
        self.tables_by_page
            .get(&url)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn page_count(&self) -> usize {
        self.tables_by_page.len()
    }
}

/// Numeric row keys first, in numeric order, then any other keys by name.
fn row_order(row: &str) -> (bool, u64, &str) {
    match row.parse::<u64>() {
        Ok(index) => (false, index, row),
        Err(_) => (true, 0, row),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub id: String,
    pub ground_truth_name: String,
}

impl QuerySpec {
    /// `wikipage_123.json` has id `wikipage_123` and ground truth `123.json`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("invalid query filename: {}", path.display()))?;

        let id = file_name
            .split('.')
            .next()
            .filter(|stem| !stem.is_empty())
            .with_context(|| format!("query filename has no stem: {file_name}"))?;
        let (_, ground_truth_name) = file_name
            .split_once('_')
            .with_context(|| format!("query filename has no '_' separator: {file_name}"))?;

        Ok(Self {
            id: id.to_string(),
            ground_truth_name: ground_truth_name.to_string(),
        })
    }
}

pub fn discover_queries(queries_dir: &Path, tuple: u32) -> Result<Vec<QuerySpec>> {
    let tuple_dir = queries_dir.join(tuple_dir_name(tuple));
    let mut queries = Vec::new();
    for name in sorted_entry_names(&tuple_dir)? {
        let path = tuple_dir.join(&name);
        if path.is_file() {
            queries.push(QuerySpec::from_path(&path)?);
        }
    }
    Ok(queries)
}

/// Graded judgments for one query over a fixed corpus.
#[derive(Debug, Clone, Default)]
pub struct GroundTruth {
    judgments: Vec<(String, f64)>,
    relevance: HashMap<String, f64>,
}

impl GroundTruth {
    /// Resolves each category to its corpus tables. A table reachable from
    /// several categories keeps its lowest weight.
    pub fn from_categories(
        categories: &BTreeMap<String, f64>,
        index: &CategoryIndex,
        corpus: &Corpus,
    ) -> Self {
        let mut relevance = HashMap::<String, f64>::new();
        let mut order = Vec::<String>::new();

        for (category, weight) in categories {
            for table_id in index.tables_for_category(category) {
                if !corpus.contains(table_id) {
                    continue;
                }
                match relevance.get_mut(table_id) {
                    Some(existing) => *existing = existing.min(*weight),
                    None => {
                        relevance.insert(table_id.clone(), *weight);
                        order.push(table_id.clone());
                    }
                }
            }
        }

        let mut judgments = order
            .into_iter()
            .map(|table_id| {
                let weight = relevance[&table_id];
                (table_id, weight)
            })
            .collect::<Vec<(String, f64)>>();
        judgments.sort_by(|left, right| right.1.total_cmp(&left.1));

        Self {
            judgments,
            relevance,
        }
    }

    pub fn judgments(&self) -> &[(String, f64)] {
        &self.judgments
    }

    pub fn is_empty(&self) -> bool {
        self.judgments.is_empty()
    }

    pub fn relevance_of(&self, table_id: &str) -> f64 {
        self.relevance.get(table_id).copied().unwrap_or(0.0)
    }

    /// Ids of the `k` most relevant tables.
    pub fn top_ids(&self, k: usize) -> HashSet<String> {
        self.judgments
            .iter()
            .take(k)
            .map(|(table_id, _)| table_id.clone())
            .collect()
    }

    /// Relevance and predicted-score vectors over the corpus followed by any
    /// predicted tables outside it. Unjudged and unscored positions are 0.
    pub fn aligned_vectors(&self, corpus: &Corpus, ranking: &Ranking) -> (Vec<f64>, Vec<f64>) {
        let extra = ranking
            .entries()
            .iter()
            .filter(|entry| !corpus.contains(&entry.table_id))
            .map(|entry| &entry.table_id);

        let width = corpus.len() + ranking.len();
        let mut relevance = Vec::with_capacity(width);
        let mut predicted = Vec::with_capacity(width);
        for table_id in corpus.ids().iter().chain(extra) {
            relevance.push(self.relevance_of(table_id));
            predicted.push(ranking.score_of(table_id).unwrap_or(0.0));
        }
        (relevance, predicted)
    }
}

/// Loads the category weights for `query`. Entries whose weight is not a
/// number are ignored.
pub fn load_ground_truth(
    ground_truth_dir: &Path,
    query: &QuerySpec,
    index: &CategoryIndex,
    corpus: &Corpus,
) -> Result<GroundTruth> {
    let path = ground_truth_dir.join(&query.ground_truth_name);
    let raw: BTreeMap<String, serde_json::Value> = read_json(&path)?;

    let mut categories = BTreeMap::new();
    for (category, value) in raw {
        match value.as_f64() {
            Some(weight) => {
                categories.insert(category, weight);
            }
            None => debug!(
                query = %query.id,
                category = %category,
                "ignoring non-numeric category weight"
            ),
        }
    }

    Ok(GroundTruth::from_categories(&categories, index, corpus))
}
