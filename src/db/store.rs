use crate::{
    error::AppResult,
    models::{Item, ItemId, NewItem, RatingObservation, UserId},
};

/// Source of movies and ratings
///
/// The two `load_all_*` methods are the snapshot providers the recommendation engine
/// reads from. A snapshot that cannot be loaded is reported as
/// [`AppError::DataUnavailable`](crate::error::AppError::DataUnavailable).
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RatingStore: Send + Sync {
    /// Every movie in the catalog, ordered by id
    async fn load_all_items(&self) -> AppResult<Vec<Item>>;

    /// Every rating observation
    async fn load_all_ratings(&self) -> AppResult<Vec<RatingObservation>>;

    /// Ratings submitted by one user
    async fn ratings_for_user(&self, user_id: UserId) -> AppResult<Vec<RatingObservation>>;

    async fn get_item(&self, item_id: ItemId) -> AppResult<Option<Item>>;

    /// Adds a movie and returns it with its assigned id
    async fn add_item(&self, item: NewItem) -> AppResult<Item>;

    /// Records a rating
    ///
    /// Fails with [`AppError::Conflict`](crate::error::AppError::Conflict) when the user
    /// has already rated the movie.
    async fn add_rating(&self, rating: RatingObservation) -> AppResult<()>;

    /// Store name for logging
    fn name(&self) -> &'static str;
}
