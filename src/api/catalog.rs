use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use super::db_error;
use crate::infrastructure::AppState;

/// Home page summary: record counts per collection, fetched concurrently
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    match tokio::try_join!(
        state.book_repo.count(),
        state.instance_repo.count(),
        state.instance_repo.count_by_status("Available"),
        state.author_repo.count(),
        state.genre_repo.count(),
    ) {
        Ok((books, instances, available, authors, genres)) => Json(json!({
            "book_count": books,
            "book_instance_count": instances,
            "book_instance_available_count": available,
            "author_count": authors,
            "genre_count": genres,
        }))
        .into_response(),
        Err(e) => db_error(e),
    }
}
