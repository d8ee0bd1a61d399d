use axum::{
    extract::{Path, RawForm, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use serde_json::json;

use super::{db_error, not_found};
use crate::domain::{
    validate_book, BookForm, DeleteOutcome, DomainError, Genre, Validated,
};
use crate::infrastructure::AppState;

/// Genre with a form-selection marker, for (re-)rendering the book form
#[derive(serde::Serialize)]
struct GenreOption {
    #[serde(flatten)]
    genre: Genre,
    checked: bool,
}

fn mark_checked(genres: Vec<Genre>, selected: &[i32]) -> Vec<GenreOption> {
    genres
        .into_iter()
        .map(|genre| GenreOption {
            checked: selected.contains(&genre.id),
            genre,
        })
        .collect()
}

/// The genre field may appear any number of times in the body, which
/// plain struct deserialization cannot express; collect the pairs by
/// hand so zero, one, or many values all normalize to a list.
fn parse_book_form(bytes: &[u8]) -> BookForm {
    let mut form = BookForm::default();
    for (key, value) in url::form_urlencoded::parse(bytes) {
        match key.as_ref() {
            "title" => form.title = value.into_owned(),
            "author" => form.author = value.into_owned(),
            "summary" => form.summary = value.into_owned(),
            "isbn" => form.isbn = value.into_owned(),
            "genre" => form.genre.push(value.into_owned()),
            _ => {}
        }
    }
    form
}

pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    match state.book_repo.find_all().await {
        Ok(books) => Json(json!({ "book_list": books })).into_response(),
        Err(e) => db_error(e),
    }
}

pub async fn detail(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    let (book, instances) = match tokio::try_join!(
        state.book_repo.find_by_id(id),
        state.instance_repo.find_by_book(id),
    ) {
        Ok(pair) => pair,
        Err(e) => return db_error(e),
    };

    match book {
        Some(book) => {
            Json(json!({ "book": book, "book_instances": instances })).into_response()
        }
        None => not_found("Book"),
    }
}

pub async fn create_form(State(state): State<AppState>) -> impl IntoResponse {
    let (authors, genres) = match tokio::try_join!(
        state.author_repo.find_all(),
        state.genre_repo.find_all(),
    ) {
        Ok(pair) => pair,
        Err(e) => return db_error(e),
    };

    Json(json!({
        "authors": authors,
        "genres": mark_checked(genres, &[]),
    }))
    .into_response()
}

/// Re-render payload for a failed submission: form support data with
/// the attempted genres pre-checked, plus the attempted book itself
async fn form_with_errors(
    state: &AppState,
    attempted: BookForm,
    errors: Vec<crate::domain::FieldError>,
) -> axum::response::Response {
    let (authors, genres) = match tokio::try_join!(
        state.author_repo.find_all(),
        state.genre_repo.find_all(),
    ) {
        Ok(pair) => pair,
        Err(e) => return db_error(e),
    };

    let selected: Vec<i32> = attempted
        .genre
        .iter()
        .filter_map(|g| g.parse().ok())
        .collect();

    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "book": attempted,
            "errors": errors,
            "authors": authors,
            "genres": mark_checked(genres, &selected),
        })),
    )
        .into_response()
}

pub async fn create(State(state): State<AppState>, RawForm(body): RawForm) -> impl IntoResponse {
    let form = parse_book_form(&body);

    let input = match validate_book(&form) {
        Validated::Valid(input) => input,
        Validated::Invalid { attempted, errors } => {
            return form_with_errors(&state, attempted, errors).await;
        }
    };

    match state.book_repo.create(input).await {
        Ok(book) => Redirect::to(&format!("/catalog/book/{}", book.id)).into_response(),
        Err(e) => db_error(e),
    }
}

pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let (book, authors, genres) = match tokio::try_join!(
        state.book_repo.find_by_id(id),
        state.author_repo.find_all(),
        state.genre_repo.find_all(),
    ) {
        Ok(triple) => triple,
        Err(e) => return db_error(e),
    };

    let book = match book {
        Some(book) => book,
        None => return not_found("Book"),
    };

    let selected: Vec<i32> = book
        .genres
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|g| g.id)
        .collect();

    Json(json!({
        "book": book,
        "authors": authors,
        "genres": mark_checked(genres, &selected),
    }))
    .into_response()
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    RawForm(body): RawForm,
) -> impl IntoResponse {
    let form = parse_book_form(&body);

    let input = match validate_book(&form) {
        Validated::Valid(input) => input,
        Validated::Invalid { attempted, errors } => {
            return form_with_errors(&state, attempted, errors).await;
        }
    };

    match state.book_repo.update(id, input).await {
        Ok(book) => Redirect::to(&format!("/catalog/book/{}", book.id)).into_response(),
        Err(DomainError::NotFound) => not_found("Book"),
        Err(e) => db_error(e),
    }
}

pub async fn delete_confirm(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let (book, instances) = match tokio::try_join!(
        state.book_repo.find_by_id(id),
        state.instance_repo.find_by_book_due_first(id),
    ) {
        Ok(pair) => pair,
        Err(e) => return db_error(e),
    };

    match book {
        Some(book) => {
            Json(json!({ "book": book, "book_instances": instances })).into_response()
        }
        None => not_found("Book"),
    }
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    match state.book_repo.delete(id).await {
        Ok(DeleteOutcome::Deleted) => Redirect::to("/catalog/books").into_response(),
        Ok(DeleteOutcome::Blocked(instances)) => (
            StatusCode::CONFLICT,
            Json(json!({
                "message": "Book has copies; delete them first",
                "book_instances": instances,
            })),
        )
            .into_response(),
        Err(DomainError::NotFound) => not_found("Book"),
        Err(e) => db_error(e),
    }
}
