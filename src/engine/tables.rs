use std::collections::BTreeMap;

use crate::models::{Item, ItemId, RatingObservation, UserId, MAX_RATING, MIN_RATING};

/// A user's ratings keyed by movie
pub type UserHistory = BTreeMap<ItemId, f64>;

/// Read-only view of every movie for the duration of one request
#[derive(Debug, Default)]
pub struct Catalog {
    items: BTreeMap<ItemId, Item>,
}

impl Catalog {
    pub fn new(items: Vec<Item>) -> Self {
        let mut map = BTreeMap::new();
        for item in items {
            if let Some(previous) = map.insert(item.id, item) {
                tracing::warn!(item_id = previous.id, "Duplicate movie id in catalog, keeping the last one");
            }
        }
        Self { items: map }
    }

    pub fn get(&self, item_id: ItemId) -> Option<&Item> {
        self.items.get(&item_id)
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.items.contains_key(&item_id)
    }
}

/// Read-only view of every usable rating, grouped by user
///
/// Observations that point at a movie missing from the catalog, or whose rating is
/// not a number within the rating scale, are dropped while loading and counted in [`RatingMatrix::dropped`].
/// When a user rated the same movie more than once, the last observation wins.
#[derive(Debug, Default)]
pub struct RatingMatrix {
    by_user: BTreeMap<UserId, UserHistory>,
    dropped: usize,
}

impl RatingMatrix {
    pub fn load(observations: Vec<RatingObservation>, catalog: &Catalog) -> Self {
        let mut matrix = Self::default();

        for observation in observations {
            if !(MIN_RATING..=MAX_RATING).contains(&observation.rating) {
                tracing::warn!(
                    user_id = observation.user_id,
                    item_id = observation.item_id,
                    "Dropping rating with a malformed value"
                );
                matrix.dropped += 1;
                continue;
            }

            if !catalog.contains(observation.item_id) {
                tracing::warn!(
                    user_id = observation.user_id,
                    item_id = observation.item_id,
                    "Dropping rating for a movie that is not in the catalog"
                );
                matrix.dropped += 1;
                continue;
            }

            let duplicate = matrix
                .by_user
                .entry(observation.user_id)
                .or_default()
                .insert(observation.item_id, observation.rating)
                .is_some();

            if duplicate {
                tracing::debug!(
                    user_id = observation.user_id,
                    item_id = observation.item_id,
                    "Duplicate rating, keeping the last one"
                );
            }
        }

        matrix
    }

    /// Ratings of one user, or `None` if the user has rated nothing usable
    pub fn history(&self, user_id: UserId) -> Option<&UserHistory> {
        self.by_user.get(&user_id).filter(|history| !history.is_empty())
    }

    /// Every user with their history, by ascending user id
    pub fn users(&self) -> impl Iterator<Item = (UserId, &UserHistory)> {
        self.by_user.iter().map(|(user_id, history)| (*user_id, history))
    }

    /// Number of observations skipped while loading
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_empty_sources_give_empty_tables() {
        let catalog = Catalog::new(vec![]);
        let matrix = RatingMatrix::load(vec![], &catalog);

        assert!(!catalog.contains(1));
        assert_eq!(matrix.dropped(), 0);
        assert_eq!(matrix.users().count(), 0);
    }

    #[test]
    fn test_dangling_rating_is_dropped() {
        let catalog = catalog(&[1, 2]);
        let matrix = RatingMatrix::load(vec![rating(1, 1, 4.0), rating(1, 99, 5.0)], &catalog);

        assert_eq!(matrix.dropped(), 1);
        let history = matrix.history(1).unwrap();
        assert!(!history.contains_key(&99));
    }

    #[test]
    fn test_malformed_rating_is_dropped() {
        let catalog = catalog(&[1, 2]);
        let matrix = RatingMatrix::load(
            vec![rating(1, 1, f64::NAN), rating(1, 2, f64::INFINITY)],
            &catalog,
        );

        assert_eq!(matrix.dropped(), 2);
        assert_eq!(matrix.history(1), None);
    }

    #[test]
    fn test_rating_outside_scale_is_dropped() {
        let catalog = catalog(&[1, 2, 3]);
        let matrix = RatingMatrix::load(
            vec![
                rating(1, 1, 1e200),
                rating(1, 2, 0.0),
                rating(1, 3, -4.0),
                rating(2, 1, 1.0),
                rating(2, 2, 5.0),
            ],
            &catalog,
        );

        assert_eq!(matrix.dropped(), 3);
        assert_eq!(matrix.history(1), None);
        assert_eq!(matrix.history(2).unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_rating_keeps_last() {
        let catalog = catalog(&[1]);
        let matrix = RatingMatrix::load(vec![rating(3, 1, 2.0), rating(3, 1, 5.0)], &catalog);

        assert_eq!(matrix.dropped(), 0);
        assert_eq!(matrix.history(3).unwrap().len(), 1);
        assert_eq!(matrix.history(3).unwrap().get(&1), Some(&5.0));
    }

    #[test]
    fn test_history_of_unknown_user_is_none() {
        let catalog = catalog(&[1]);
        let matrix = RatingMatrix::load(vec![rating(1, 1, 3.0)], &catalog);

        assert!(matrix.history(2).is_none());
    }

    #[test]
    fn test_duplicate_catalog_ids_keep_last() {
        let mut renamed = item(1);
        renamed.title = "Renamed".to_string();
        let catalog = Catalog::new(vec![item(1), renamed]);

        assert_eq!(catalog.get(1).unwrap().title, "Renamed");
    }
}
