pub mod author;
pub mod book;
pub mod book_instance;
pub mod catalog;
pub mod genre;

use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use crate::domain::DomainError;
use crate::infrastructure::AppState;

/// Build the catalog router; callers nest it under "/catalog"
pub fn catalog_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(catalog::index))
        // Authors
        .route("/authors", get(author::list))
        .route(
            "/author/create",
            get(author::create_form).post(author::create),
        )
        .route("/author/:id", get(author::detail))
        .route(
            "/author/:id/update",
            get(author::update_form).post(author::update),
        )
        .route(
            "/author/:id/delete",
            get(author::delete_confirm).post(author::delete),
        )
        // Books
        .route("/books", get(book::list))
        .route("/book/create", get(book::create_form).post(book::create))
        .route("/book/:id", get(book::detail))
        .route(
            "/book/:id/update",
            get(book::update_form).post(book::update),
        )
        .route(
            "/book/:id/delete",
            get(book::delete_confirm).post(book::delete),
        )
        // Genres
        .route("/genres", get(genre::list))
        .route("/genre/create", get(genre::create_form).post(genre::create))
        .route("/genre/:id", get(genre::detail))
        .route(
            "/genre/:id/update",
            get(genre::update_form).post(genre::update),
        )
        .route(
            "/genre/:id/delete",
            get(genre::delete_confirm).post(genre::delete),
        )
        // Book instances
        .route("/bookinstances", get(book_instance::list))
        .route(
            "/bookinstance/create",
            get(book_instance::create_form).post(book_instance::create),
        )
        .route("/bookinstance/:id", get(book_instance::detail))
        .route(
            "/bookinstance/:id/update",
            get(book_instance::update_form).post(book_instance::update),
        )
        .route(
            "/bookinstance/:id/delete",
            get(book_instance::delete_confirm).post(book_instance::delete),
        )
        .with_state(state)
}

pub(crate) fn db_error(e: DomainError) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": format!("Database error: {}", e) })),
    )
        .into_response()
}

pub(crate) fn not_found(what: &str) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("{} not found", what) })),
    )
        .into_response()
}
