use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    db::RatingStore,
    error::{AppError, AppResult},
    models::{Item, ItemId, NewItem, RatingObservation, UserId},
};

/// In-process store for local development and tests
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    items: BTreeMap<ItemId, Item>,
    ratings: Vec<RatingObservation>,
    next_item_id: ItemId,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given movies and ratings as-is
    ///
    /// Ratings are not checked against the catalog, so dangling references survive
    /// until the engine drops them.
    pub fn with_data(items: Vec<Item>, ratings: Vec<RatingObservation>) -> Self {
        let next_item_id = items.iter().map(|item| item.id).max().unwrap_or(0);
        let items = items.into_iter().map(|item| (item.id, item)).collect();

        Self {
            inner: Arc::new(RwLock::new(MemoryStoreInner {
                items,
                ratings,
                next_item_id,
            })),
        }
    }
}

#[async_trait::async_trait]
impl RatingStore for MemoryStore {
    async fn load_all_items(&self) -> AppResult<Vec<Item>> {
        let inner = self.inner.read().await;
        Ok(inner.items.values().cloned().collect())
    }

    async fn load_all_ratings(&self) -> AppResult<Vec<RatingObservation>> {
        let inner = self.inner.read().await;
        Ok(inner.ratings.clone())
    }

    async fn ratings_for_user(&self, user_id: UserId) -> AppResult<Vec<RatingObservation>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .iter()
            .filter(|rating| rating.user_id == user_id)
            .copied()
            .collect())
    }

    async fn get_item(&self, item_id: ItemId) -> AppResult<Option<Item>> {
        let inner = self.inner.read().await;
        Ok(inner.items.get(&item_id).cloned())
    }

    async fn add_item(&self, item: NewItem) -> AppResult<Item> {
        let mut inner = self.inner.write().await;
        inner.next_item_id += 1;

        let item = Item {
            id: inner.next_item_id,
            title: item.title,
            duration: item.duration,
            image_ref: item.image_ref,
            genre: item.genre,
        };
        inner.items.insert(item.id, item.clone());

        Ok(item)
    }

    async fn add_rating(&self, rating: RatingObservation) -> AppResult<()> {
        let mut inner = self.inner.write().await;

        let already_rated = inner
            .ratings
            .iter()
            .any(|r| r.user_id == rating.user_id && r.item_id == rating.item_id);
        if already_rated {
            return Err(AppError::Conflict(
                "You have already submitted your review".to_string(),
            ));
        }

        inner.ratings.push(rating);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
