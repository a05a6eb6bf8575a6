use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::tables::Catalog;
use crate::models::{ItemId, RecommendedItem};

/// Orders scored movies by descending score, ties by ascending id, and keeps the top `k`
/// joined with their catalog attributes.
pub fn rank(scores: BTreeMap<ItemId, f64>, catalog: &Catalog, k: usize) -> Vec<RecommendedItem> {
    let mut ranked: Vec<(ItemId, f64)> = scores.into_iter().collect();

    ranked.sort_by(|(a_id, a_score), (b_id, b_score)| {
        b_score
            .partial_cmp(a_score)
            .unwrap_or(Ordering::Equal)
            .then(a_id.cmp(b_id))
    });

    ranked
        .into_iter()
        .filter_map(|(item_id, score)| {
            catalog
                .get(item_id)
                .map(|item| RecommendedItem::new(item, score))
        })
        .take(k)
        .collect()
}
