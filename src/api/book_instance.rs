use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use serde_json::json;

use super::{db_error, not_found};
use crate::domain::{
    validate_book_instance, BookInstanceForm, DomainError, FieldError, Validated,
};
use crate::infrastructure::AppState;

pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    match state.instance_repo.find_all().await {
        Ok(instances) => Json(json!({ "bookinstance_list": instances })).into_response(),
        Err(e) => db_error(e),
    }
}

pub async fn detail(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    match state.instance_repo.find_by_id(id).await {
        Ok(Some(instance)) => Json(json!({ "bookinstance": instance })).into_response(),
        Ok(None) => not_found("Book copy"),
        Err(e) => db_error(e),
    }
}

pub async fn create_form(State(state): State<AppState>) -> impl IntoResponse {
    match state.book_repo.find_all().await {
        Ok(books) => Json(json!({ "book_list": books })).into_response(),
        Err(e) => db_error(e),
    }
}

/// Re-render payload for a failed submission: the book list plus the
/// attempted instance
async fn form_with_errors(
    state: &AppState,
    attempted: BookInstanceForm,
    errors: Vec<FieldError>,
) -> axum::response::Response {
    let books = match state.book_repo.find_all().await {
        Ok(books) => books,
        Err(e) => return db_error(e),
    };

    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "bookinstance": attempted,
            "errors": errors,
            "book_list": books,
        })),
    )
        .into_response()
}

pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<BookInstanceForm>,
) -> impl IntoResponse {
    let input = match validate_book_instance(&form) {
        Validated::Valid(input) => input,
        Validated::Invalid { attempted, errors } => {
            return form_with_errors(&state, attempted, errors).await;
        }
    };

    match state.instance_repo.create(input).await {
        Ok(instance) => {
            Redirect::to(&format!("/catalog/bookinstance/{}", instance.id)).into_response()
        }
        Err(e) => db_error(e),
    }
}

pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let (instance, books) = match tokio::try_join!(
        state.instance_repo.find_by_id(id),
        state.book_repo.find_all(),
    ) {
        Ok(pair) => pair,
        Err(e) => return db_error(e),
    };

    match instance {
        Some(instance) => Json(json!({
            "bookinstance": instance,
            "book_list": books,
        }))
        .into_response(),
        None => not_found("Book copy"),
    }
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<BookInstanceForm>,
) -> impl IntoResponse {
    let input = match validate_book_instance(&form) {
        Validated::Valid(input) => input,
        Validated::Invalid { attempted, errors } => {
            return form_with_errors(&state, attempted, errors).await;
        }
    };

    match state.instance_repo.update(id, input).await {
        Ok(instance) => {
            Redirect::to(&format!("/catalog/bookinstance/{}", instance.id)).into_response()
        }
        Err(DomainError::NotFound) => not_found("Book copy"),
        Err(e) => db_error(e),
    }
}

pub async fn delete_confirm(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match state.instance_repo.find_by_id(id).await {
        Ok(Some(instance)) => Json(json!({ "bookinstance": instance })).into_response(),
        Ok(None) => not_found("Book copy"),
        Err(e) => db_error(e),
    }
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    match state.instance_repo.delete(id).await {
        Ok(book_id) => Redirect::to(&format!("/catalog/book/{}", book_id)).into_response(),
        Err(DomainError::NotFound) => not_found("Book copy"),
        Err(e) => db_error(e),
    }
}
