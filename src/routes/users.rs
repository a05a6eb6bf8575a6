use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{UserId, UserProfile},
    routes::AppState,
    services::ratings,
};

/// Handler for a user's rating statistics
pub async fn profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<UserProfile>> {
    let profile = ratings::user_profile(state.store.as_ref(), user_id).await?;
    Ok(Json(profile))
}
