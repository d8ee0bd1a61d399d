pub mod author_repository;
pub mod book_instance_repository;
pub mod book_repository;
pub mod genre_repository;

pub use author_repository::SeaOrmAuthorRepository;
pub use book_instance_repository::SeaOrmBookInstanceRepository;
pub use book_repository::SeaOrmBookRepository;
pub use genre_repository::SeaOrmGenreRepository;

use chrono::NaiveDate;

/// Dates are stored as ISO text columns; rows written outside the
/// validation pipeline may hold anything, so bad values read as NULL.
pub(crate) fn parse_stored_date(value: Option<&str>) -> Option<NaiveDate> {
    value.and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
}
