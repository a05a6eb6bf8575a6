//! User-based collaborative filtering
//!
//! The engine is a pure function of a catalog snapshot and a rating snapshot:
//! load both into tables, pull the target's history, correlate it with every other
//! user over co-rated movies, turn the correlations into similarity-weighted scores
//! and rank them.

pub mod aggregator;
pub mod ranker;
pub mod similarity;
pub mod tables;

use crate::models::{Item, RatingObservation, RecommendationStatus, Recommendations, UserId};

use tables::{Catalog, RatingMatrix};

/// Largest number of recommendations a single request may ask for
pub const MAX_TOP_K: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Length of the recommendation list
    pub top_k: usize,
    /// Leave out movies the target has already rated
    pub exclude_rated: bool,
    /// Ignore neighbors whose similarity is zero or negative
    pub positive_neighbors_only: bool,
    /// Keep only the M most similar neighbors
    pub max_neighbors: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            exclude_rated: true,
            positive_neighbors_only: false,
            max_neighbors: None,
        }
    }
}

impl EngineConfig {
    /// Compact form of the policies that shape the result apart from `top_k`
    ///
    /// Two configurations with the same fingerprint and `top_k` produce the same list.
    pub fn policy_fingerprint(&self) -> String {
        let max_neighbors = self
            .max_neighbors
            .map_or_else(|| "all".to_string(), |max| max.to_string());

        format!(
            "x{}p{}m{}",
            u8::from(self.exclude_rated),
            u8::from(self.positive_neighbors_only),
            max_neighbors
        )
    }
}

/// Computes the ranked recommendations for one user
///
/// A user without usable ratings gets the [`RecommendationStatus::NoHistory`] result.
/// Zero variance and zero similarity sums shrink the result instead of failing.
pub fn recommend(
    items: Vec<Item>,
    ratings: Vec<RatingObservation>,
    user_id: UserId,
    config: &EngineConfig,
) -> Recommendations {
    let catalog = Catalog::new(items);
    let matrix = RatingMatrix::load(ratings, &catalog);

    let Some(target) = matrix.history(user_id) else {
        tracing::debug!(user_id, dropped = matrix.dropped(), "No ratings for user");
        return Recommendations::no_history(matrix.dropped());
    };

    let neighbors = similarity::find_neighbors(user_id, target, &matrix);
    let neighbors = similarity::select_neighbors(neighbors, config);

    let exclude = config.exclude_rated.then_some(target);
    let scores = aggregator::aggregate(&neighbors, &matrix, exclude);
    let candidates = scores.len();
    let items = ranker::rank(scores, &catalog, config.top_k);

    tracing::debug!(
        user_id,
        history = target.len(),
        neighbors = neighbors.len(),
        candidates,
        returned = items.len(),
        dropped = matrix.dropped(),
        "Recommendations computed"
    );

    Recommendations {
        status: RecommendationStatus::Ranked,
        items,
        dropped_observations: matrix.dropped(),
        neighbor_count: neighbors.len(),
    }
}
