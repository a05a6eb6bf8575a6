use std::cmp::Ordering;

use super::tables::{RatingMatrix, UserHistory};
use super::EngineConfig;
use crate::models::UserId;

/// Sums of squares below this are treated as zero variance
const VARIANCE_EPSILON: f64 = 1e-12;

/// A user who rated at least one movie in common with the target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub user_id: UserId,
    /// Pearson correlation over the co-rated movies, in [-1, 1]
    pub similarity: f64,
}

/// Pearson correlation of paired ratings
///
/// Returns `None` when there are no pairs. When either side has zero variance the
/// correlation carries no signal and is defined as 0, as it is when the sums overflow.
pub fn pearson<I>(pairs: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut n = 0usize;
    let (mut sum_x, mut sum_y) = (0.0, 0.0);
    let (mut sum_xx, mut sum_yy, mut sum_xy) = (0.0, 0.0, 0.0);

    for (x, y) in pairs {
        n += 1;
        sum_x += x;
        sum_y += y;
        sum_xx += x * x;
        sum_yy += y * y;
        sum_xy += x * y;
    }

    if n == 0 {
        return None;
    }

    let n = n as f64;
    let sxx = sum_xx - sum_x * sum_x / n;
    let syy = sum_yy - sum_y * sum_y / n;
    let sxy = sum_xy - sum_x * sum_y / n;

    if !(sxx.is_finite() && syy.is_finite() && sxy.is_finite()) {
        return Some(0.0);
    }

    if sxx.abs() <= VARIANCE_EPSILON || syy.abs() <= VARIANCE_EPSILON {
        return Some(0.0);
    }

    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Computes the similarity of every other user who shares a rated movie with the target
///
/// Users with no co-rated movie get no entry at all. Results are ordered by user id.
pub fn find_neighbors(
    target_id: UserId,
    target: &UserHistory,
    matrix: &RatingMatrix,
) -> Vec<Neighbor> {
    matrix
        .users()
        .filter(|(user_id, _)| *user_id != target_id)
        .filter_map(|(user_id, history)| {
            let pairs = history
                .iter()
                .filter_map(|(item_id, theirs)| target.get(item_id).map(|ours| (*ours, *theirs)));

            pearson(pairs).map(|similarity| Neighbor { user_id, similarity })
        })
        .collect()
}

/// Applies the neighbor pool policies of the configuration
///
/// With `max_neighbors` the pool keeps the most similar users, ties broken by ascending
/// user id. The returned pool is ordered by user id either way.
pub fn select_neighbors(mut neighbors: Vec<Neighbor>, config: &EngineConfig) -> Vec<Neighbor> {
    if config.positive_neighbors_only {
        neighbors.retain(|neighbor| neighbor.similarity > 0.0);
    }

    if let Some(max) = config.max_neighbors {
        if neighbors.len() > max {
            neighbors.sort_by(|a, b| {
                b.similarity
                    .partial_cmp(&a.similarity)
                    .unwrap_or(Ordering::Equal)
                    .then(a.user_id.cmp(&b.user_id))
            });
            neighbors.truncate(max);
            neighbors.sort_by_key(|neighbor| neighbor.user_id);
        }
    }

    neighbors
}

#[cfg(test)]
mod tests {
    use super::super::tables::fixtures::*;
    use super::*;

    fn pairs(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
        x.iter().copied().zip(y.iter().copied()).collect()
    }

    #[test]
    fn test_pearson_identical_vectors() {
        let similarity = pearson(pairs(&[5.0, 3.0, 4.0], &[5.0, 3.0, 4.0])).unwrap();
        assert!((similarity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_opposite_vectors() {
        let similarity = pearson(pairs(&[5.0, 3.0], &[1.0, 5.0])).unwrap();
        assert!((similarity + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_zero_variance_is_zero() {
        // The neighbor gave the same rating to every co-rated movie
        assert_eq!(pearson(pairs(&[5.0, 3.0, 4.0], &[4.0, 4.0, 4.0])), Some(0.0));
        // The target gave the same rating to every co-rated movie
        assert_eq!(pearson(pairs(&[2.0, 2.0], &[1.0, 5.0])), Some(0.0));
    }

    #[test]
    fn test_pearson_single_pair_is_zero() {
        assert_eq!(pearson(pairs(&[5.0], &[1.0])), Some(0.0));
    }

    #[test]
    fn test_pearson_fractional_constant_ratings_are_zero() {
        assert_eq!(pearson(pairs(&[0.1, 0.1, 0.1], &[1.0, 2.0, 3.0])), Some(0.0));
    }

    #[test]
    fn test_pearson_overflowing_sums_are_zero() {
        assert_eq!(pearson(pairs(&[1e200, 2.0, 3.0], &[1.0, 3.0, 2.0])), Some(0.0));
        assert_eq!(pearson(pairs(&[5.0, 3.0], &[1e300, -1e300])), Some(0.0));
    }

    #[test]
    fn test_pearson_without_pairs_is_none() {
        assert_eq!(pearson(Vec::new()), None);
    }

    #[test]
    fn test_pearson_partial_correlation_in_range() {
        let similarity = pearson(pairs(&[1.0, 2.0, 3.0, 4.0], &[2.0, 1.0, 4.0, 3.0])).unwrap();
        assert!((similarity - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_find_neighbors_excludes_target_and_strangers() {
        let catalog = catalog(&[1, 2, 3, 4]);
        let matrix = RatingMatrix::load(
            vec![
                rating(1, 1, 5.0),
                rating(1, 2, 3.0),
                rating(2, 1, 4.0),
                rating(2, 2, 2.0),
                // user 3 shares nothing with user 1
                rating(3, 3, 5.0),
                rating(3, 4, 1.0),
            ],
            &catalog,
        );

        let target = matrix.history(1).unwrap();
        let neighbors = find_neighbors(1, target, &matrix);

        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].user_id, 2);
        assert!((neighbors[0].similarity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_find_neighbors_keeps_zero_similarity_users() {
        let catalog = catalog(&[1, 2]);
        let matrix = RatingMatrix::load(
            vec![rating(1, 1, 5.0), rating(1, 2, 3.0), rating(2, 1, 4.0)],
            &catalog,
        );

        let neighbors = find_neighbors(1, matrix.history(1).unwrap(), &matrix);
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].similarity, 0.0);
    }

    fn neighbor(user_id: UserId, similarity: f64) -> Neighbor {
        Neighbor { user_id, similarity }
    }

    #[test]
    fn test_select_neighbors_unbounded_by_default() {
        let pool = vec![neighbor(1, -0.5), neighbor(2, 0.0), neighbor(3, 0.9)];
        let selected = select_neighbors(pool.clone(), &EngineConfig::default());
        assert_eq!(selected, pool);
    }

    #[test]
    fn test_select_neighbors_positive_only() {
        let config = EngineConfig {
            positive_neighbors_only: true,
            ..EngineConfig::default()
        };
        let selected = select_neighbors(
            vec![neighbor(1, -0.5), neighbor(2, 0.0), neighbor(3, 0.9)],
            &config,
        );

        assert_eq!(selected, vec![neighbor(3, 0.9)]);
    }

    #[test]
    fn test_select_neighbors_caps_to_most_similar() {
        let config = EngineConfig {
            max_neighbors: Some(2),
            ..EngineConfig::default()
        };
        let selected = select_neighbors(
            vec![
                neighbor(1, 0.2),
                neighbor(2, 0.8),
                neighbor(3, 0.8),
                neighbor(4, 0.9),
            ],
            &config,
        );

        assert_eq!(selected, vec![neighbor(2, 0.8), neighbor(4, 0.9)]);
    }
}
