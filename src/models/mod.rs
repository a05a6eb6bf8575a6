use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a user in the rating matrix
pub type UserId = i64;

/// Identifier of a movie in the catalog
pub type ItemId = i64;

/// Lowest star rating a user can give
pub const MIN_RATING: f64 = 1.0;

/// Highest star rating a user can give
pub const MAX_RATING: f64 = 5.0;

/// A movie in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    /// Running time in minutes
    pub duration: f64,
    pub image_ref: String,
    pub genre: String,
}

/// A movie submitted through the catalog workflow, before it has an id
#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    pub title: String,
    pub duration: f64,
    #[serde(default)]
    pub image_ref: String,
    pub genre: String,
}

/// One user's rating for one movie
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RatingObservation {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub rating: f64,
}

/// A recommended movie with the score it was ranked by
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedItem {
    pub item_id: ItemId,
    pub title: String,
    pub duration: f64,
    pub image_ref: String,
    pub genre: String,
    pub predicted_score: f64,
}

impl RecommendedItem {
    pub fn new(item: &Item, predicted_score: f64) -> Self {
        Self {
            item_id: item.id,
            title: item.title.clone(),
            duration: item.duration,
            image_ref: item.image_ref.clone(),
            genre: item.genre.clone(),
            predicted_score,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    /// The user has not rated anything yet, so there is nothing to compare against
    NoHistory,
    /// Items were ranked; the list may still be empty if no candidate survived
    Ranked,
}

/// Result of one recommendation computation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendations {
    pub status: RecommendationStatus,
    /// Ordered by descending predicted score, ties by ascending item id
    pub items: Vec<RecommendedItem>,
    /// Rating observations skipped because they were dangling or malformed
    pub dropped_observations: usize,
    /// Neighbors that contributed to the scores
    pub neighbor_count: usize,
}

impl Recommendations {
    /// The "no ratings available" terminal state
    pub fn no_history(dropped_observations: usize) -> Self {
        Self {
            status: RecommendationStatus::NoHistory,
            items: Vec::new(),
            dropped_observations,
            neighbor_count: 0,
        }
    }
}

/// Response body of the recommendations endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub user_id: UserId,
    pub status: RecommendationStatus,
    pub items: Vec<RecommendedItem>,
    pub dropped_observations: usize,
    pub generated_at: DateTime<Utc>,
}

impl RecommendationResponse {
    pub fn new(user_id: UserId, recommendations: Recommendations) -> Self {
        Self {
            user_id,
            status: recommendations.status,
            items: recommendations.items,
            dropped_observations: recommendations.dropped_observations,
            generated_at: Utc::now(),
        }
    }
}

/// Movies of one genre, paged into carousel slides
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreGroup {
    pub genre: String,
    pub movies: Vec<Item>,
    pub slide_count: usize,
}

/// Rating statistics shown on a user's profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: UserId,
    /// Sum of the user's ratings, each truncated to a whole star
    pub total_review: i64,
    pub watched_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        let no_history = serde_json::to_string(&RecommendationStatus::NoHistory).unwrap();
        let ranked = serde_json::to_string(&RecommendationStatus::Ranked).unwrap();

        assert_eq!(no_history, "\"no_history\"");
        assert_eq!(ranked, "\"ranked\"");
    }

    #[test]
    fn test_recommended_item_copies_catalog_attributes() {
        let item = Item {
            id: 7,
            title: "Inception".to_string(),
            duration: 148.0,
            image_ref: "/media/inception.jpg".to_string(),
            genre: "Sci-Fi".to_string(),
        };

        let recommended = RecommendedItem::new(&item, 4.5);
        assert_eq!(recommended.item_id, 7);
        assert_eq!(recommended.title, "Inception");
        assert_eq!(recommended.genre, "Sci-Fi");
        assert_eq!(recommended.predicted_score, 4.5);
    }

    #[test]
    fn test_new_item_image_ref_is_optional() {
        let new_item: NewItem =
            serde_json::from_str(r#"{"title":"Heat","duration":170,"genre":"Crime"}"#).unwrap();
        assert_eq!(new_item.image_ref, "");
        assert_eq!(new_item.duration, 170.0);
    }
}
