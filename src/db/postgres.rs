use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::RatingStore,
    error::{AppError, AppResult},
    models::{Item, ItemId, NewItem, RatingObservation, UserId},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

#[derive(sqlx::FromRow)]
struct RatingRow {
    user_id: i64,
    movie_id: i64,
    rating: Option<f64>,
}

impl RatingRow {
    fn into_observation(self) -> Option<RatingObservation> {
        match self.rating {
            Some(rating) => Some(RatingObservation {
                user_id: self.user_id,
                item_id: self.movie_id,
                rating,
            }),
            None => {
                tracing::warn!(
                    user_id = self.user_id,
                    item_id = self.movie_id,
                    "Dropping rating row without a value"
                );
                None
            }
        }
    }
}

/// Store backed by the `movies` and `ratings` tables
///
/// Expects `movies(id BIGSERIAL, title TEXT, duration DOUBLE PRECISION, image_ref TEXT,
/// genre TEXT)` and `ratings(user_id BIGINT, movie_id BIGINT, rating DOUBLE PRECISION)`
/// with a unique constraint on `(user_id, movie_id)`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RatingStore for PgStore {
    async fn load_all_items(&self) -> AppResult<Vec<Item>> {
        sqlx::query_as::<_, Item>(
            "SELECT id, title, duration, image_ref, genre FROM movies ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DataUnavailable(format!("failed to load movies: {}", e)))
    }

    async fn load_all_ratings(&self) -> AppResult<Vec<RatingObservation>> {
        let rows = sqlx::query_as::<_, RatingRow>("SELECT user_id, movie_id, rating FROM ratings")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DataUnavailable(format!("failed to load ratings: {}", e)))?;

        Ok(rows
            .into_iter()
            .filter_map(RatingRow::into_observation)
            .collect())
    }

    async fn ratings_for_user(&self, user_id: UserId) -> AppResult<Vec<RatingObservation>> {
        let rows = sqlx::query_as::<_, RatingRow>(
            "SELECT user_id, movie_id, rating FROM ratings WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(RatingRow::into_observation)
            .collect())
    }

    async fn get_item(&self, item_id: ItemId) -> AppResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            "SELECT id, title, duration, image_ref, genre FROM movies WHERE id = $1",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn add_item(&self, item: NewItem) -> AppResult<Item> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO movies (title, duration, image_ref, genre)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, duration, image_ref, genre
            "#,
        )
        .bind(item.title)
        .bind(item.duration)
        .bind(item.image_ref)
        .bind(item.genre)
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    async fn add_rating(&self, rating: RatingObservation) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO ratings (user_id, movie_id, rating)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, movie_id) DO NOTHING
            "#,
        )
        .bind(rating.user_id)
        .bind(rating.item_id)
        .bind(rating.rating)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "You have already submitted your review".to_string(),
            ));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
