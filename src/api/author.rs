use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use serde_json::json;

use super::{db_error, not_found};
use crate::domain::{validate_author, AuthorForm, DeleteOutcome, DomainError, Validated};
use crate::infrastructure::AppState;

pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    match state.author_repo.find_all().await {
        Ok(authors) => Json(json!({ "author_list": authors })).into_response(),
        Err(e) => db_error(e),
    }
}

pub async fn detail(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    let (author, books) = match tokio::try_join!(
        state.author_repo.find_by_id(id),
        state.book_repo.find_by_author(id),
    ) {
        Ok(pair) => pair,
        Err(e) => return db_error(e),
    };

    match author {
        Some(author) => Json(json!({ "author": author, "author_books": books })).into_response(),
        None => not_found("Author"),
    }
}

pub async fn create_form() -> impl IntoResponse {
    Json(json!({ "author": null }))
}

pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<AuthorForm>,
) -> impl IntoResponse {
    let input = match validate_author(&form) {
        Validated::Valid(input) => input,
        Validated::Invalid { attempted, errors } => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "author": attempted, "errors": errors })),
            )
                .into_response();
        }
    };

    match state.author_repo.create(input).await {
        Ok(author) => Redirect::to(&format!("/catalog/author/{}", author.id)).into_response(),
        Err(e) => db_error(e),
    }
}

pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match state.author_repo.find_by_id(id).await {
        Ok(Some(author)) => Json(json!({ "author": author })).into_response(),
        Ok(None) => not_found("Author"),
        Err(e) => db_error(e),
    }
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<AuthorForm>,
) -> impl IntoResponse {
    let input = match validate_author(&form) {
        Validated::Valid(input) => input,
        Validated::Invalid { attempted, errors } => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "author": attempted, "errors": errors })),
            )
                .into_response();
        }
    };

    match state.author_repo.update(id, input).await {
        Ok(author) => Redirect::to(&format!("/catalog/author/{}", author.id)).into_response(),
        Err(DomainError::NotFound) => not_found("Author"),
        Err(e) => db_error(e),
    }
}

pub async fn delete_confirm(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let (author, books) = match tokio::try_join!(
        state.author_repo.find_by_id(id),
        state.book_repo.find_by_author(id),
    ) {
        Ok(pair) => pair,
        Err(e) => return db_error(e),
    };

    match author {
        Some(author) => Json(json!({ "author": author, "author_books": books })).into_response(),
        None => not_found("Author"),
    }
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    match state.author_repo.delete(id).await {
        Ok(DeleteOutcome::Deleted) => Redirect::to("/catalog/authors").into_response(),
        Ok(DeleteOutcome::Blocked(books)) => (
            StatusCode::CONFLICT,
            Json(json!({
                "message": "Author has books; delete them first",
                "author_books": books,
            })),
        )
            .into_response(),
        Err(DomainError::NotFound) => not_found("Author"),
        Err(e) => db_error(e),
    }
}
