use std::collections::BTreeMap;

use super::similarity::Neighbor;
use super::tables::{RatingMatrix, UserHistory};
use crate::models::ItemId;

/// Similarity sums this close to zero cannot normalize a score
const SIMILARITY_SUM_EPSILON: f64 = 1e-12;

#[derive(Debug, Default, Clone, Copy)]
struct ScoreAccumulator {
    weighted_rating_sum: f64,
    similarity_sum: f64,
}

impl ScoreAccumulator {
    fn add(&mut self, similarity: f64, rating: f64) {
        self.weighted_rating_sum += similarity * rating;
        self.similarity_sum += similarity;
    }

    fn score(&self) -> Option<f64> {
        if self.similarity_sum.abs() <= SIMILARITY_SUM_EPSILON {
            return None;
        }
        Some(self.weighted_rating_sum / self.similarity_sum).filter(|score| score.is_finite())
    }
}

/// Predicts a score for every movie rated by at least one neighbor
///
/// Each score is the similarity-weighted average of the neighbors' ratings. Movies whose
/// similarity weights sum to zero are left out. Movies in `exclude` are never scored.
pub fn aggregate(
    neighbors: &[Neighbor],
    matrix: &RatingMatrix,
    exclude: Option<&UserHistory>,
) -> BTreeMap<ItemId, f64> {
    let mut accumulators: BTreeMap<ItemId, ScoreAccumulator> = BTreeMap::new();

    for neighbor in neighbors {
        let Some(history) = matrix.history(neighbor.user_id) else {
            continue;
        };

        for (item_id, rating) in history {
            if exclude.is_some_and(|seen| seen.contains_key(item_id)) {
                continue;
            }
            accumulators
                .entry(*item_id)
                .or_default()
                .add(neighbor.similarity, *rating);
        }
    }

    accumulators
        .into_iter()
        .filter_map(|(item_id, accumulator)| accumulator.score().map(|score| (item_id, score)))
        .collect()
}
