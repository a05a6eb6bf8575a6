use std::collections::BTreeMap;

use crate::{
    db::RatingStore,
    error::{AppError, AppResult},
    models::{GenreGroup, Item, NewItem},
};

/// Movies shown per carousel slide when browsing by genre
pub const SLIDE_SIZE: usize = 4;

/// Lists every movie in the catalog
pub async fn list_movies(store: &dyn RatingStore) -> AppResult<Vec<Item>> {
    store.load_all_items().await
}

/// Validates and stores a new movie
pub async fn add_movie(store: &dyn RatingStore, mut movie: NewItem) -> AppResult<Item> {
    movie.title = movie.title.trim().to_string();
    movie.genre = movie.genre.trim().to_string();

    if movie.title.is_empty() {
        return Err(AppError::InvalidInput("title must not be empty".to_string()));
    }
    if movie.genre.is_empty() {
        return Err(AppError::InvalidInput("genre must not be empty".to_string()));
    }
    if !movie.duration.is_finite() || movie.duration <= 0.0 {
        return Err(AppError::InvalidInput(
            "duration must be a positive number of minutes".to_string(),
        ));
    }

    let item = store.add_item(movie).await?;
    tracing::info!(item_id = item.id, title = %item.title, "Movie added");

    Ok(item)
}

/// Catalog grouped by genre for browsing
pub async fn movies_by_genre(store: &dyn RatingStore) -> AppResult<Vec<GenreGroup>> {
    let items = store.load_all_items().await?;
    Ok(group_by_genre(items))
}

/// Groups movies by genre, genres ascending and movies by id within a genre
pub fn group_by_genre(items: Vec<Item>) -> Vec<GenreGroup> {
    let mut groups: BTreeMap<String, Vec<Item>> = BTreeMap::new();
    for item in items {
        groups.entry(item.genre.clone()).or_default().push(item);
    }

    groups
        .into_iter()
        .map(|(genre, mut movies)| {
            movies.sort_by_key(|movie| movie.id);
            let slide_count = movies.len().div_ceil(SLIDE_SIZE);
            GenreGroup {
                genre,
                movies,
                slide_count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockRatingStore;

    fn item(id: i64, genre: &str) -> Item {
        Item {
            id,
            title: format!("Movie {}", id),
            duration: 95.0,
            image_ref: String::new(),
            genre: genre.to_string(),
        }
    }

    #[test]
    fn test_group_by_genre_orders_and_counts_slides() {
        let items = vec![
            item(6, "Horror"),
            item(1, "Comedy"),
            item(5, "Comedy"),
            item(2, "Comedy"),
            item(3, "Comedy"),
            item(4, "Comedy"),
        ];

        let groups = group_by_genre(items);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].genre, "Comedy");
        let ids: Vec<i64> = groups[0].movies.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(groups[0].slide_count, 2);
        assert_eq!(groups[1].genre, "Horror");
        assert_eq!(groups[1].slide_count, 1);
    }

    #[test]
    fn test_group_by_genre_exact_slide_multiple() {
        let items = (1..=8).map(|id| item(id, "Western")).collect();
        let groups = group_by_genre(items);
        assert_eq!(groups[0].slide_count, 2);
    }

    #[test]
    fn test_group_by_genre_empty_catalog() {
        assert!(group_by_genre(vec![]).is_empty());
    }

    #[tokio::test]
    async fn test_add_movie_rejects_invalid_input() {
        let store = MockRatingStore::new();

        let blank_title = NewItem {
            title: "   ".to_string(),
            duration: 100.0,
            image_ref: String::new(),
            genre: "Drama".to_string(),
        };
        assert!(matches!(
            add_movie(&store, blank_title).await,
            Err(AppError::InvalidInput(_))
        ));

        let bad_duration = NewItem {
            title: "Solaris".to_string(),
            duration: -5.0,
            image_ref: String::new(),
            genre: "Drama".to_string(),
        };
        assert!(matches!(
            add_movie(&store, bad_duration).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_add_movie_trims_and_stores() {
        let mut store = MockRatingStore::new();
        store
            .expect_add_item()
            .withf(|movie| movie.title == "Solaris" && movie.genre == "Sci-Fi")
            .times(1)
            .returning(|movie| {
                Ok(Item {
                    id: 1,
                    title: movie.title,
                    duration: movie.duration,
                    image_ref: movie.image_ref,
                    genre: movie.genre,
                })
            });

        let movie = NewItem {
            title: " Solaris ".to_string(),
            duration: 167.0,
            image_ref: String::new(),
            genre: "Sci-Fi ".to_string(),
        };
        let item = add_movie(&store, movie).await.unwrap();

        assert_eq!(item.id, 1);
        assert_eq!(item.title, "Solaris");
    }
}
