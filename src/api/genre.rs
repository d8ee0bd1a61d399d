use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use serde_json::json;

use super::{db_error, not_found};
use crate::domain::{validate_genre, DeleteOutcome, DomainError, GenreForm, Validated};
use crate::infrastructure::AppState;

pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    match state.genre_repo.find_all().await {
        Ok(genres) => Json(json!({ "genre_list": genres })).into_response(),
        Err(e) => db_error(e),
    }
}

pub async fn detail(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    let (genre, books) = match tokio::try_join!(
        state.genre_repo.find_by_id(id),
        state.book_repo.find_by_genre(id),
    ) {
        Ok(pair) => pair,
        Err(e) => return db_error(e),
    };

    match genre {
        Some(genre) => Json(json!({ "genre": genre, "genre_books": books })).into_response(),
        None => not_found("Genre"),
    }
}

pub async fn create_form() -> impl IntoResponse {
    Json(json!({ "genre": null }))
}

pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<GenreForm>,
) -> impl IntoResponse {
    let input = match validate_genre(&form) {
        Validated::Valid(input) => input,
        Validated::Invalid { attempted, errors } => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "genre": attempted, "errors": errors })),
            )
                .into_response();
        }
    };

    // A case-insensitive match converges on the existing genre instead
    // of creating a duplicate.
    match state.genre_repo.find_by_name(&input.name).await {
        Ok(Some(existing)) => {
            Redirect::to(&format!("/catalog/genre/{}", existing.id)).into_response()
        }
        Ok(None) => match state.genre_repo.create(input).await {
            Ok(genre) => Redirect::to(&format!("/catalog/genre/{}", genre.id)).into_response(),
            Err(e) => db_error(e),
        },
        Err(e) => db_error(e),
    }
}

pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match state.genre_repo.find_by_id(id).await {
        Ok(Some(genre)) => Json(json!({ "genre": genre })).into_response(),
        Ok(None) => not_found("Genre"),
        Err(e) => db_error(e),
    }
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<GenreForm>,
) -> impl IntoResponse {
    let input = match validate_genre(&form) {
        Validated::Valid(input) => input,
        Validated::Invalid { attempted, errors } => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "genre": attempted, "errors": errors })),
            )
                .into_response();
        }
    };

    // Renaming onto an existing name converges there as well; no row
    // is touched.
    match state.genre_repo.find_by_name(&input.name).await {
        Ok(Some(existing)) => {
            Redirect::to(&format!("/catalog/genre/{}", existing.id)).into_response()
        }
        Ok(None) => match state.genre_repo.update(id, input).await {
            Ok(genre) => Redirect::to(&format!("/catalog/genre/{}", genre.id)).into_response(),
            Err(DomainError::NotFound) => not_found("Genre"),
            Err(e) => db_error(e),
        },
        Err(e) => db_error(e),
    }
}

pub async fn delete_confirm(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let (genre, books) = match tokio::try_join!(
        state.genre_repo.find_by_id(id),
        state.book_repo.find_by_genre(id),
    ) {
        Ok(pair) => pair,
        Err(e) => return db_error(e),
    };

    match genre {
        Some(genre) => Json(json!({ "genre": genre, "genre_books": books })).into_response(),
        None => not_found("Genre"),
    }
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    match state.genre_repo.delete(id).await {
        Ok(DeleteOutcome::Deleted) => Redirect::to("/catalog/genres").into_response(),
        Ok(DeleteOutcome::Blocked(books)) => (
            StatusCode::CONFLICT,
            Json(json!({
                "message": "Genre is still assigned to books; remove it from them first",
                "genre_books": books,
            })),
        )
            .into_response(),
        Err(DomainError::NotFound) => not_found("Genre"),
        Err(e) => db_error(e),
    }
}
