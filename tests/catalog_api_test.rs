use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use tower::util::ServiceExt; // for `oneshot`

use cardcat::api;
use cardcat::db;
use cardcat::infrastructure::AppState;

// Helper to build the full app against an in-memory database
async fn setup_app() -> Router {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    Router::new().nest("/catalog", api::catalog_router(AppState::new(db)))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("GET")
        .body(Body::empty())
        .unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("missing Location header")
        .to_str()
        .unwrap()
        .to_string()
}

// Create via form post, assert the redirect, return the new record's path
async fn create_redirected(app: &Router, uri: &str, body: &str) -> String {
    let response = app.clone().oneshot(post_form(uri, body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER, "create at {uri}");
    location(&response)
}

#[tokio::test]
async fn test_index_counts() {
    let app = setup_app().await;

    create_redirected(
        &app,
        "/catalog/author/create",
        "first_name=Isaac&family_name=Asimov&date_of_birth=1920-01-02",
    )
    .await;
    create_redirected(&app, "/catalog/genre/create", "name=Fiction").await;
    let book_path = create_redirected(
        &app,
        "/catalog/book/create",
        "title=Foundation&author=1&summary=Psychohistory&isbn=9780553293357",
    )
    .await;
    let book_id: i32 = book_path.rsplit('/').next().unwrap().parse().unwrap();
    create_redirected(
        &app,
        "/catalog/bookinstance/create",
        &format!("book={book_id}&imprint=Gnome+Press&status=Available"),
    )
    .await;
    create_redirected(
        &app,
        "/catalog/bookinstance/create",
        &format!("book={book_id}&imprint=Bantam&status=Loaned&due_back=2026-09-01"),
    )
    .await;

    let response = app.clone().oneshot(get("/catalog/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["book_count"], 1);
    assert_eq!(json["book_instance_count"], 2);
    assert_eq!(json["book_instance_available_count"], 1);
    assert_eq!(json["author_count"], 1);
    assert_eq!(json["genre_count"], 1);
}

#[tokio::test]
async fn test_create_author_derives_display_name() {
    let app = setup_app().await;

    let path = create_redirected(
        &app,
        "/catalog/author/create",
        "first_name=John&family_name=Doe&date_of_birth=1950-06-01",
    )
    .await;

    let response = app.clone().oneshot(get(&path)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["author"]["name"], "Doe, John");
    assert_eq!(json["author"]["lifespan"], "1950-06-01 - present");
    assert_eq!(json["author_books"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_author_create_validation_failure_preserves_input() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(post_form(
            "/catalog/author/create",
            "first_name=John&family_name=&date_of_birth=1950-06-01",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;

    let errors = json["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e["field"] == "family_name"));
    // attempted record comes back for re-rendering
    assert_eq!(json["author"]["first_name"], "John");

    // nothing was persisted
    let response = app.clone().oneshot(get("/catalog/authors")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["author_list"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_genre_duplicate_is_case_insensitive() {
    let app = setup_app().await;

    let first = create_redirected(&app, "/catalog/genre/create", "name=Fiction").await;
    let second = create_redirected(&app, "/catalog/genre/create", "name=fiction").await;
    assert_eq!(first, second);

    let response = app.clone().oneshot(get("/catalog/genres")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["genre_list"].as_array().unwrap().len(), 1);
    assert_eq!(json["genre_list"][0]["name"], "Fiction");
}

#[tokio::test]
async fn test_genre_rename_onto_existing_name_is_a_noop() {
    let app = setup_app().await;

    let fiction = create_redirected(&app, "/catalog/genre/create", "name=Fiction").await;
    let fantasy = create_redirected(&app, "/catalog/genre/create", "name=Fantasy").await;

    // Renaming Fantasy to FICTION converges on the existing Fiction
    let response = app
        .clone()
        .oneshot(post_form(&format!("{fantasy}/update"), "name=FICTION"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), fiction);

    // Fantasy kept its name
    let response = app.clone().oneshot(get(&fantasy)).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["genre"]["name"], "Fantasy");
}

#[tokio::test]
async fn test_genre_name_too_short() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(post_form("/catalog/genre/create", "name=sf"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(
        json["errors"][0]["message"],
        "Genre name must contain at least 3 characters"
    );
}

#[tokio::test]
async fn test_delete_author_with_books_is_blocked() {
    let app = setup_app().await;

    let author_path = create_redirected(
        &app,
        "/catalog/author/create",
        "first_name=Isaac&family_name=Asimov&date_of_birth=1920-01-02",
    )
    .await;
    create_redirected(
        &app,
        "/catalog/book/create",
        "title=Foundation&author=1&summary=Psychohistory&isbn=9780553293357",
    )
    .await;

    let response = app
        .clone()
        .oneshot(post_form(&format!("{author_path}/delete"), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;

    let books = json["author_books"].as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], "Foundation");

    // the author survived
    let response = app.clone().oneshot(get(&author_path)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_author_without_books() {
    let app = setup_app().await;

    let author_path = create_redirected(
        &app,
        "/catalog/author/create",
        "first_name=John&family_name=Doe&date_of_birth=1950-06-01",
    )
    .await;

    let response = app
        .clone()
        .oneshot(post_form(&format!("{author_path}/delete"), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/catalog/authors");

    let response = app.clone().oneshot(get(&author_path)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_book_create_empty_title_rejected() {
    let app = setup_app().await;

    create_redirected(
        &app,
        "/catalog/author/create",
        "first_name=Isaac&family_name=Asimov&date_of_birth=1920-01-02",
    )
    .await;

    let response = app
        .clone()
        .oneshot(post_form(
            "/catalog/book/create",
            "title=&author=1&summary=Psychohistory&isbn=9780553293357",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;

    let errors = json["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["field"], "title");
    assert_eq!(errors[0]["message"], "Title must not be empty.");
    // form support data rides along for re-rendering
    assert_eq!(json["authors"].as_array().unwrap().len(), 1);

    let response = app.clone().oneshot(get("/catalog/books")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["book_list"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_book_detail_lists_genre_and_author_name() {
    let app = setup_app().await;

    create_redirected(
        &app,
        "/catalog/author/create",
        "first_name=Isaac&family_name=Asimov&date_of_birth=1920-01-02",
    )
    .await;
    create_redirected(&app, "/catalog/genre/create", "name=Sci-Fi").await;

    let book_path = create_redirected(
        &app,
        "/catalog/book/create",
        "title=Foundation&author=1&summary=Psychohistory&isbn=9780553293357&genre=1",
    )
    .await;

    let response = app.clone().oneshot(get(&book_path)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["book"]["title"], "Foundation");
    assert_eq!(json["book"]["author"]["name"], "Asimov, Isaac");
    let genres = json["book"]["genres"].as_array().unwrap();
    assert_eq!(genres.len(), 1);
    assert_eq!(genres[0]["name"], "Sci-Fi");
}

#[tokio::test]
async fn test_book_update_replaces_genre_set() {
    let app = setup_app().await;

    create_redirected(
        &app,
        "/catalog/author/create",
        "first_name=Isaac&family_name=Asimov&date_of_birth=1920-01-02",
    )
    .await;
    create_redirected(&app, "/catalog/genre/create", "name=Sci-Fi").await;
    create_redirected(&app, "/catalog/genre/create", "name=Fantasy").await;

    let book_path = create_redirected(
        &app,
        "/catalog/book/create",
        "title=Foundation&author=1&summary=Psychohistory&isbn=9780553293357&genre=1",
    )
    .await;

    // full replace: the genre set swaps from Sci-Fi to Fantasy only
    let response = app
        .clone()
        .oneshot(post_form(
            &format!("{book_path}/update"),
            "title=Foundation&author=1&summary=Psychohistory&isbn=9780553293357&genre=2",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app.clone().oneshot(get(&book_path)).await.unwrap();
    let json = body_json(response).await;
    let genres = json["book"]["genres"].as_array().unwrap();
    assert_eq!(genres.len(), 1);
    assert_eq!(genres[0]["name"], "Fantasy");

    // the update form marks the current selection
    let response = app
        .clone()
        .oneshot(get(&format!("{book_path}/update")))
        .await
        .unwrap();
    let json = body_json(response).await;
    let options = json["genres"].as_array().unwrap();
    assert_eq!(options.len(), 2);
    for option in options {
        let expected = option["name"] == "Fantasy";
        assert_eq!(option["checked"], expected);
    }
}

#[tokio::test]
async fn test_book_delete_blocked_by_instances() {
    let app = setup_app().await;

    create_redirected(
        &app,
        "/catalog/author/create",
        "first_name=Isaac&family_name=Asimov&date_of_birth=1920-01-02",
    )
    .await;
    let book_path = create_redirected(
        &app,
        "/catalog/book/create",
        "title=Foundation&author=1&summary=Psychohistory&isbn=9780553293357",
    )
    .await;
    let instance_path = create_redirected(
        &app,
        "/catalog/bookinstance/create",
        "book=1&imprint=Gnome+Press&status=Available",
    )
    .await;

    let response = app
        .clone()
        .oneshot(post_form(&format!("{book_path}/delete"), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["book_instances"].as_array().unwrap().len(), 1);

    // deleting the copy redirects to the parent book
    let response = app
        .clone()
        .oneshot(post_form(&format!("{instance_path}/delete"), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), book_path);

    // with the copy gone the book delete goes through
    let response = app
        .clone()
        .oneshot(post_form(&format!("{book_path}/delete"), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/catalog/books");
}

#[tokio::test]
async fn test_bookinstance_update_round_trip() {
    let app = setup_app().await;

    create_redirected(
        &app,
        "/catalog/author/create",
        "first_name=Isaac&family_name=Asimov&date_of_birth=1920-01-02",
    )
    .await;
    create_redirected(
        &app,
        "/catalog/book/create",
        "title=Foundation&author=1&summary=Psychohistory&isbn=9780553293357",
    )
    .await;
    let instance_path = create_redirected(
        &app,
        "/catalog/bookinstance/create",
        "book=1&imprint=Gnome+Press&status=Available",
    )
    .await;

    let response = app
        .clone()
        .oneshot(post_form(
            &format!("{instance_path}/update"),
            "book=1&imprint=Gnome+Press&status=Loaned&due_back=2026-09-01",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), instance_path);

    let response = app.clone().oneshot(get(&instance_path)).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["bookinstance"]["status"], "Loaned");
    assert_eq!(json["bookinstance"]["due_back"], "2026-09-01");
    // untouched fields survive the full replace
    assert_eq!(json["bookinstance"]["imprint"], "Gnome Press");
    assert_eq!(json["bookinstance"]["book_id"], 1);
}

#[tokio::test]
async fn test_bookinstance_delete_missing_is_not_found() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(post_form("/catalog/bookinstance/999/delete", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_detail_of_missing_records_is_not_found() {
    let app = setup_app().await;

    for uri in [
        "/catalog/author/999",
        "/catalog/book/999",
        "/catalog/genre/999",
        "/catalog/bookinstance/999",
    ] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_lists_use_fixed_sort_orders() {
    let app = setup_app().await;

    // created out of order on purpose
    for (first, family) in [("Frank", "Herbert"), ("Isaac", "Asimov"), ("Octavia", "Butler")] {
        create_redirected(
            &app,
            "/catalog/author/create",
            &format!("first_name={first}&family_name={family}&date_of_birth=1920-01-02"),
        )
        .await;
    }
    for name in ["Western", "Fantasy", "Romance"] {
        create_redirected(&app, "/catalog/genre/create", &format!("name={name}")).await;
    }
    for title in ["Dune", "Foundation", "Kindred"] {
        create_redirected(
            &app,
            "/catalog/book/create",
            &format!("title={title}&author=1&summary=Classic&isbn=123"),
        )
        .await;
    }

    let response = app.clone().oneshot(get("/catalog/authors")).await.unwrap();
    let json = body_json(response).await;
    let families: Vec<&str> = json["author_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["family_name"].as_str().unwrap())
        .collect();
    assert_eq!(families, vec!["Asimov", "Butler", "Herbert"]);

    let response = app.clone().oneshot(get("/catalog/genres")).await.unwrap();
    let json = body_json(response).await;
    let names: Vec<&str> = json["genre_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Fantasy", "Romance", "Western"]);

    let response = app.clone().oneshot(get("/catalog/books")).await.unwrap();
    let json = body_json(response).await;
    let titles: Vec<&str> = json["book_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Dune", "Foundation", "Kindred"]);
}

#[tokio::test]
async fn test_book_delete_confirmation_orders_instances_by_due_back() {
    let app = setup_app().await;

    create_redirected(
        &app,
        "/catalog/author/create",
        "first_name=Isaac&family_name=Asimov&date_of_birth=1920-01-02",
    )
    .await;
    let book_path = create_redirected(
        &app,
        "/catalog/book/create",
        "title=Foundation&author=1&summary=Psychohistory&isbn=9780553293357",
    )
    .await;

    // due dates submitted latest-first
    for due in ["2026-12-01", "2026-09-01", "2026-10-15"] {
        create_redirected(
            &app,
            "/catalog/bookinstance/create",
            &format!("book=1&imprint=Gnome+Press&status=Loaned&due_back={due}"),
        )
        .await;
    }

    let response = app
        .clone()
        .oneshot(get(&format!("{book_path}/delete")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    let due_dates: Vec<&str> = json["book_instances"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["due_back"].as_str().unwrap())
        .collect();
    assert_eq!(due_dates, vec!["2026-09-01", "2026-10-15", "2026-12-01"]);
}

#[tokio::test]
async fn test_author_update_full_replace() {
    let app = setup_app().await;

    let author_path = create_redirected(
        &app,
        "/catalog/author/create",
        "first_name=John&family_name=Doe&date_of_birth=1950-06-01&date_of_death=2020-03-15",
    )
    .await;

    // the death date is dropped by the replacement submission
    let response = app
        .clone()
        .oneshot(post_form(
            &format!("{author_path}/update"),
            "first_name=Jane&family_name=Doe&date_of_birth=1950-06-01",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app.clone().oneshot(get(&author_path)).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["author"]["name"], "Doe, Jane");
    assert_eq!(json["author"]["lifespan"], "1950-06-01 - present");
    assert!(json["author"]["date_of_death"].is_null());
}
