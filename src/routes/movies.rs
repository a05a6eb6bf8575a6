use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{GenreGroup, Item, NewItem},
    routes::AppState,
    services::catalog,
};

/// Handler for listing the catalog
pub async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Item>>> {
    let movies = catalog::list_movies(state.store.as_ref()).await?;
    Ok(Json(movies))
}

/// Handler for adding a movie
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(movie): Json<NewItem>,
) -> AppResult<(StatusCode, Json<Item>)> {
    let item = catalog::add_movie(state.store.as_ref(), movie).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Handler for browsing the catalog by genre
pub async fn by_genre(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<GenreGroup>>> {
    let groups = catalog::movies_by_genre(state.store.as_ref()).await?;
    Ok(Json(groups))
}
