use std::sync::Arc;
use std::time::Instant;

use crate::{
    cached,
    db::{Cache, CacheKey, RatingStore},
    engine::{self, EngineConfig, MAX_TOP_K},
    error::{AppError, AppResult},
    models::{Recommendations, UserId},
};

/// Generates personalized movie recommendations
///
/// Every computation loads a fresh snapshot of the catalog and the ratings from the
/// store and runs the collaborative filtering engine over it. With a cache attached,
/// results are reused until the next rating write or until their TTL expires.
#[derive(Clone)]
pub struct RecommendationService {
    store: Arc<dyn RatingStore>,
    cache: Option<Cache>,
    config: EngineConfig,
    cache_ttl: u64,
}

impl RecommendationService {
    pub fn new(store: Arc<dyn RatingStore>, config: EngineConfig) -> Self {
        Self {
            store,
            cache: None,
            config,
            cache_ttl: 0,
        }
    }

    /// Reuses computed lists for `ttl` seconds. A TTL of 0 disables caching.
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        if ttl > 0 {
            self.cache = Some(cache);
            self.cache_ttl = ttl;
        }
        self
    }

    /// Recommends up to `limit` movies (the configured top-K when `None`) for a user
    pub async fn recommend(
        &self,
        user_id: UserId,
        limit: Option<usize>,
    ) -> AppResult<Recommendations> {
        let config = self.config_for(limit)?;

        let Some(cache) = &self.cache else {
            return self.compute(user_id, config).await;
        };

        match self.recommend_cached(cache, user_id, config.clone()).await {
            Err(AppError::Cache(e)) => {
                tracing::warn!(error = %e, "Recommendation cache unavailable, computing directly");
                self.compute(user_id, config).await
            }
            result => result,
        }
    }

    async fn recommend_cached(
        &self,
        cache: &Cache,
        user_id: UserId,
        config: EngineConfig,
    ) -> AppResult<Recommendations> {
        let key = CacheKey::Recommendations {
            user_id,
            top_k: config.top_k,
            policy: config.policy_fingerprint(),
            generation: cache.ratings_generation().await?,
        };

        cached!(cache, key, self.cache_ttl, self.compute(user_id, config))
    }

    fn config_for(&self, limit: Option<usize>) -> AppResult<EngineConfig> {
        let mut config = self.config.clone();

        if let Some(limit) = limit {
            if limit == 0 || limit > MAX_TOP_K {
                return Err(AppError::InvalidInput(format!(
                    "limit must be between 1 and {}",
                    MAX_TOP_K
                )));
            }
            config.top_k = limit;
        }

        Ok(config)
    }

    /// Loads a snapshot and runs the engine on a blocking thread
    async fn compute(&self, user_id: UserId, config: EngineConfig) -> AppResult<Recommendations> {
        let start = Instant::now();

        let (items, ratings) = tokio::try_join!(
            self.store.load_all_items(),
            self.store.load_all_ratings()
        )
        .map_err(data_unavailable)?;

        tracing::debug!(
            store = self.store.name(),
            items = items.len(),
            ratings = ratings.len(),
            "Snapshot loaded"
        );

        let recommendations =
            tokio::task::spawn_blocking(move || engine::recommend(items, ratings, user_id, &config))
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;

        if recommendations.dropped_observations > 0 {
            tracing::warn!(
                user_id,
                dropped = recommendations.dropped_observations,
                "Skipped dangling or malformed ratings"
            );
        }

        tracing::info!(
            user_id,
            status = ?recommendations.status,
            returned = recommendations.items.len(),
            neighbors = recommendations.neighbor_count,
            processing_time_ms = start.elapsed().as_millis(),
            "Recommendations generated"
        );

        Ok(recommendations)
    }
}

/// Any failure to load a snapshot is reported as the data being unavailable
fn data_unavailable(error: AppError) -> AppError {
    match error {
        AppError::DataUnavailable(_) => error,
        other => AppError::DataUnavailable(other.to_string()),
    }
}
