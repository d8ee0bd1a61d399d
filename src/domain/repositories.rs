//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::DomainError;

/// Author data for responses, with derived display fields
#[derive(Debug, Clone, serde::Serialize)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    /// "family_name, first_name", empty when either part is missing
    pub name: String,
    /// "<birth> - <death>", with "present" while the author lives
    pub lifespan: String,
}

impl Author {
    pub fn display_name(first_name: &str, family_name: &str) -> String {
        if first_name.is_empty() || family_name.is_empty() {
            return String::new();
        }
        format!("{}, {}", family_name, first_name)
    }

    pub fn lifespan(
        date_of_birth: Option<NaiveDate>,
        date_of_death: Option<NaiveDate>,
    ) -> String {
        let born = date_of_birth.map(|d| d.to_string()).unwrap_or_default();
        let died = date_of_death
            .map(|d| d.to_string())
            .unwrap_or_else(|| "present".to_string());
        format!("{} - {}", born, died)
    }
}

/// Sanitized author record ready for persistence
#[derive(Debug, Clone)]
pub struct NewAuthor {
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: NaiveDate,
    pub date_of_death: Option<NaiveDate>,
}

/// Genre data for responses
#[derive(Debug, Clone, serde::Serialize)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

/// Sanitized genre record
#[derive(Debug, Clone)]
pub struct NewGenre {
    pub name: String,
}

/// Book data for responses; related records populated where the
/// endpoint needs them
#[derive(Debug, Clone, serde::Serialize)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    pub summary: String,
    pub isbn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<Genre>>,
}

/// Slim projection used when books appear as dependents of
/// another record (delete confirmations, author/genre details)
#[derive(Debug, Clone, serde::Serialize)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub summary: String,
}

/// Sanitized book record ready for persistence
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author_id: i32,
    pub summary: String,
    pub isbn: String,
    pub genre_ids: Vec<i32>,
}

/// Book instance (physical copy) data for responses
#[derive(Debug, Clone, serde::Serialize)]
pub struct BookInstance {
    pub id: i32,
    pub book_id: i32,
    pub imprint: String,
    pub status: String,
    pub due_back: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_title: Option<String>,
}

/// Sanitized book instance record
#[derive(Debug, Clone)]
pub struct NewBookInstance {
    pub book_id: i32,
    pub imprint: String,
    pub status: String,
    pub due_back: Option<NaiveDate>,
}

/// Outcome of a guarded delete: either the record went away, or
/// dependents block it and are returned for display
#[derive(Debug)]
pub enum DeleteOutcome<D> {
    Deleted,
    Blocked(Vec<D>),
}

/// Repository trait for Author entity
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Find all authors, family name ascending
    async fn find_all(&self) -> Result<Vec<Author>, DomainError>;

    /// Find an author by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Author>, DomainError>;

    /// Create a new author
    async fn create(&self, input: NewAuthor) -> Result<Author, DomainError>;

    /// Full-replace update of an existing author
    async fn update(&self, id: i32, input: NewAuthor) -> Result<Author, DomainError>;

    /// Delete an author unless books still reference it
    async fn delete(&self, id: i32) -> Result<DeleteOutcome<BookSummary>, DomainError>;

    /// Count all authors
    async fn count(&self) -> Result<u64, DomainError>;
}

/// Repository trait for Genre entity
#[async_trait]
pub trait GenreRepository: Send + Sync {
    /// Find all genres, name ascending
    async fn find_all(&self) -> Result<Vec<Genre>, DomainError>;

    /// Find a genre by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Genre>, DomainError>;

    /// Find a genre whose name matches case-insensitively
    /// (Unicode-aware, application-layer comparison)
    async fn find_by_name(&self, name: &str) -> Result<Option<Genre>, DomainError>;

    /// Create a new genre
    async fn create(&self, input: NewGenre) -> Result<Genre, DomainError>;

    /// Full-replace update (rename) of an existing genre
    async fn update(&self, id: i32, input: NewGenre) -> Result<Genre, DomainError>;

    /// Delete a genre unless books still reference it
    async fn delete(&self, id: i32) -> Result<DeleteOutcome<BookSummary>, DomainError>;

    /// Count all genres
    async fn count(&self) -> Result<u64, DomainError>;
}

/// Repository trait for Book entity
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Find all books, title ascending, with authors populated
    async fn find_all(&self) -> Result<Vec<Book>, DomainError>;

    /// Find a single book by ID with author and genres populated
    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, DomainError>;

    /// Books referencing the given author
    async fn find_by_author(&self, author_id: i32) -> Result<Vec<BookSummary>, DomainError>;

    /// Books referencing the given genre, title ascending
    async fn find_by_genre(&self, genre_id: i32) -> Result<Vec<BookSummary>, DomainError>;

    /// Create a new book and its genre links
    async fn create(&self, input: NewBook) -> Result<Book, DomainError>;

    /// Full-replace update of a book, including its genre links
    async fn update(&self, id: i32, input: NewBook) -> Result<Book, DomainError>;

    /// Delete a book unless instances still reference it
    async fn delete(&self, id: i32) -> Result<DeleteOutcome<BookInstance>, DomainError>;

    /// Count all books
    async fn count(&self) -> Result<u64, DomainError>;
}

/// Repository trait for BookInstance entity
#[async_trait]
pub trait BookInstanceRepository: Send + Sync {
    /// Find all instances with book titles (no defined order)
    async fn find_all(&self) -> Result<Vec<BookInstance>, DomainError>;

    /// Find an instance by ID with its book title
    async fn find_by_id(&self, id: i32) -> Result<Option<BookInstance>, DomainError>;

    /// Instances of a specific book
    async fn find_by_book(&self, book_id: i32) -> Result<Vec<BookInstance>, DomainError>;

    /// Instances of a specific book, due-back date ascending
    /// (delete-confirmation ordering)
    async fn find_by_book_due_first(
        &self,
        book_id: i32,
    ) -> Result<Vec<BookInstance>, DomainError>;

    /// Create a new instance
    async fn create(&self, input: NewBookInstance) -> Result<BookInstance, DomainError>;

    /// Full-replace update of an instance
    async fn update(&self, id: i32, input: NewBookInstance)
        -> Result<BookInstance, DomainError>;

    /// Delete an instance; the instance and its parent book must both
    /// exist. Returns the parent book id for the redirect.
    async fn delete(&self, id: i32) -> Result<i32, DomainError>;

    /// Count all instances
    async fn count(&self) -> Result<u64, DomainError>;

    /// Count instances with the given status
    async fn count_by_status(&self, status: &str) -> Result<u64, DomainError>;
}
