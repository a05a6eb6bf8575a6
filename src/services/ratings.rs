use crate::{
    db::{Cache, RatingStore},
    error::{AppError, AppResult},
    models::{RatingObservation, UserId, UserProfile, MAX_RATING, MIN_RATING},
};

/// Records a user's rating for a movie
///
/// Each user may rate a movie once. A successful write bumps the ratings generation so
/// cached recommendation lists are recomputed.
pub async fn submit_rating(
    store: &dyn RatingStore,
    cache: Option<&Cache>,
    rating: RatingObservation,
) -> AppResult<()> {
    if !rating.rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&rating.rating) {
        return Err(AppError::InvalidInput(format!(
            "rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }

    if store.get_item(rating.item_id).await?.is_none() {
        return Err(AppError::NotFound(format!("movie {}", rating.item_id)));
    }

    store.add_rating(rating).await?;

    tracing::info!(
        user_id = rating.user_id,
        item_id = rating.item_id,
        rating = rating.rating,
        "Rating submitted"
    );

    if let Some(cache) = cache {
        if let Err(e) = cache.bump_ratings_generation().await {
            tracing::warn!(error = %e, "Failed to invalidate cached recommendations");
        }
    }

    Ok(())
}

/// Rating statistics for a user's profile
pub async fn user_profile(store: &dyn RatingStore, user_id: UserId) -> AppResult<UserProfile> {
    let ratings = store.ratings_for_user(user_id).await?;

    let total_review = ratings
        .iter()
        .filter(|rating| rating.rating.is_finite())
        .map(|rating| rating.rating.trunc() as i64)
        .sum();

    Ok(UserProfile {
        user_id,
        total_review,
        watched_count: ratings.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, MockRatingStore};
    use crate::models::Item;

    fn rating(user_id: i64, item_id: i64, rating: f64) -> RatingObservation {
        RatingObservation {
            user_id,
            item_id,
            rating,
        }
    }

    fn store_with_movie() -> MemoryStore {
        MemoryStore::with_data(
            vec![Item {
                id: 1,
                title: "Alien".to_string(),
                duration: 117.0,
                image_ref: String::new(),
                genre: "Horror".to_string(),
            }],
            vec![],
        )
    }

    #[tokio::test]
    async fn test_submit_rating_out_of_range() {
        let store = MockRatingStore::new();

        for value in [0.0, 5.5, f64::NAN] {
            let result = submit_rating(&store, None, rating(1, 1, value)).await;
            assert!(matches!(result, Err(AppError::InvalidInput(_))));
        }
    }

    #[tokio::test]
    async fn test_submit_rating_unknown_movie() {
        let mut store = MockRatingStore::new();
        store.expect_get_item().returning(|_| Ok(None));
        store.expect_add_rating().never();

        let result = submit_rating(&store, None, rating(1, 404, 3.0)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_submit_rating_twice_conflicts() {
        let store = store_with_movie();

        submit_rating(&store, None, rating(1, 1, 4.0)).await.unwrap();
        let result = submit_rating(&store, None, rating(1, 1, 2.0)).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_user_profile_truncates_ratings() {
        let mut store = MockRatingStore::new();
        store
            .expect_ratings_for_user()
            .withf(|user_id| *user_id == 3)
            .returning(|_| Ok(vec![rating(3, 1, 4.5), rating(3, 2, 3.0), rating(3, 5, 1.9)]));

        let profile = user_profile(&store, 3).await.unwrap();

        assert_eq!(profile.total_review, 8);
        assert_eq!(profile.watched_count, 3);
    }

    #[tokio::test]
    async fn test_user_profile_without_ratings() {
        let profile = user_profile(&store_with_movie(), 9).await.unwrap();

        assert_eq!(profile.total_review, 0);
        assert_eq!(profile.watched_count, 0);
    }
}
