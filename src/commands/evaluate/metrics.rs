use super::*;

/// Fraction of predicted tables that are relevant; 0 for an empty prediction.
pub fn precision(predicted: &[String], truth: &HashSet<String>) -> f64 {
    if predicted.is_empty() {
        return 0.0;
    }

    let hit_count = predicted
        .iter()
        .filter(|table_id| truth.contains(*table_id))
        .count();
    hit_count as f64 / predicted.len() as f64
}

/// Fraction of relevant tables that were predicted. `None` when there is
/// nothing to recall.
pub fn recall(predicted: &[String], truth: &HashSet<String>) -> Option<f64> {
    if truth.is_empty() {
        return None;
    }
    if predicted.is_empty() {
        return Some(0.0);
    }

    let hit_count = predicted
        .iter()
        .filter(|table_id| truth.contains(*table_id))
        .count();
    Some(hit_count as f64 / truth.len() as f64)
}

/// NDCG@k of the ranking induced by `predicted` over graded `relevance`.
///
/// Both slices are aligned by position. Positions are ranked by descending
/// predicted score. Positions sharing a score form one tie group whose mean
/// relevance is credited at every rank the group spans, so unscored tables
/// padding a short ranking earn only their average gain. The ideal ordering
/// sorts the same relevance values. An all-zero relevance vector scores 0.
pub fn ndcg_at_k(relevance: &[f64], predicted: &[f64], k: usize) -> Option<f64> {
    if k == 0 || relevance.len() != predicted.len() {
        return None;
    }

    let mut order = (0..predicted.len()).collect::<Vec<usize>>();
    order.sort_by(|left, right| predicted[*right].total_cmp(&predicted[*left]));

    let mut dcg = 0.0;
    let mut start = 0;
    while start < order.len() && start < k {
        let score = predicted[order[start]];
        let end = order[start..]
            .iter()
            .position(|index| predicted[*index].total_cmp(&score).is_ne())
            .map_or(order.len(), |offset| start + offset);

        let group = &order[start..end];
        let group_gain = group.iter().map(|index| relevance[*index]).sum::<f64>();
        let mean_gain = group_gain / group.len() as f64;
        let discount = (start..end.min(k)).map(rank_discount).sum::<f64>();
        dcg += mean_gain * discount;
        start = end;
    }

    let mut ideal = relevance.to_vec();
    ideal.sort_by(|left, right| right.total_cmp(left));
    let idcg = ideal
        .iter()
        .take(k)
        .enumerate()
        .map(|(position, gain)| gain * rank_discount(position))
        .sum::<f64>();

    if idcg <= 0.0 {
        return Some(0.0);
    }
    Some(dcg / idcg)
}

/// Discount of the zero-based `position`: 1 / log2(rank + 1).
fn rank_discount(position: usize) -> f64 {
    1.0 / (position as f64 + 2.0).log2()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

impl Summary {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|left, right| left.total_cmp(right));

        Some(Self {
            count: sorted.len(),
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Linear interpolation between closest ranks; `sorted` must be ascending and
/// non-empty. The 0.5 quantile is the usual median.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}
