use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::{
    error::AppResult, models::RatingObservation, routes::AppState, services::ratings,
};

/// Handler for submitting a rating
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(rating): Json<RatingObservation>,
) -> AppResult<(StatusCode, Json<RatingObservation>)> {
    ratings::submit_rating(state.store.as_ref(), state.cache.as_ref(), rating).await?;
    Ok((StatusCode::CREATED, Json(rating)))
}
