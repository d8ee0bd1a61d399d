//! Form validation pipeline
//!
//! Raw form fields come in as strings; each entity has a rule set that
//! either yields a sanitized record or an ordered list of field errors.
//! On failure the trimmed-so-far form is handed back so the caller can
//! re-render the submission pre-filled. Validation never panics and
//! never touches the database.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// A single failed field rule, in submission order
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

/// Discriminated validation result: a sanitized record, or the
/// attempted form plus its errors
#[derive(Debug)]
pub enum Validated<T, F> {
    Valid(T),
    Invalid { attempted: F, errors: Vec<FieldError> },
}

/// Case-insensitive key for name comparison: NFKC-normalized, then
/// Unicode-lowercased. Used for duplicate genre detection.
pub fn name_key(name: &str) -> String {
    name.trim().nfkc().flat_map(char::to_lowercase).collect()
}

fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

// ---------------------------------------------------------------------------
// Author

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub date_of_death: String,
}

fn check_name(field: &'static str, label: &str, value: &str, errors: &mut Vec<FieldError>) {
    if value.is_empty() {
        errors.push(FieldError::new(
            field,
            &format!("{} must be specified.", label),
        ));
        return;
    }
    if value.chars().count() > 100 {
        errors.push(FieldError::new(
            field,
            &format!("{} must not exceed 100 characters.", label),
        ));
    }
    // Alphanumeric-only rejects legitimate names (hyphens, apostrophes,
    // spaces); the inherited form rules keep it regardless.
    if !value.chars().all(char::is_alphanumeric) {
        errors.push(FieldError::new(
            field,
            &format!("{} has non-alphanumeric characters.", label),
        ));
    }
}

pub fn validate_author(form: &AuthorForm) -> Validated<super::NewAuthor, AuthorForm> {
    let attempted = AuthorForm {
        first_name: form.first_name.trim().to_string(),
        family_name: form.family_name.trim().to_string(),
        date_of_birth: form.date_of_birth.trim().to_string(),
        date_of_death: form.date_of_death.trim().to_string(),
    };

    let mut errors = Vec::new();
    check_name("first_name", "First name", &attempted.first_name, &mut errors);
    check_name("family_name", "Family name", &attempted.family_name, &mut errors);

    let date_of_birth = parse_iso_date(&attempted.date_of_birth);
    if date_of_birth.is_none() {
        errors.push(FieldError::new("date_of_birth", "Invalid date of birth"));
    }

    let mut date_of_death = None;
    if !attempted.date_of_death.is_empty() {
        date_of_death = parse_iso_date(&attempted.date_of_death);
        if date_of_death.is_none() {
            errors.push(FieldError::new("date_of_death", "Invalid date of death"));
        }
    }

    match (date_of_birth, errors.is_empty()) {
        (Some(date_of_birth), true) => Validated::Valid(super::NewAuthor {
            first_name: attempted.first_name,
            family_name: attempted.family_name,
            date_of_birth,
            date_of_death,
        }),
        _ => Validated::Invalid { attempted, errors },
    }
}

// ---------------------------------------------------------------------------
// Book

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub isbn: String,
    /// Already normalized to a list: absent field becomes empty,
    /// a single submitted value becomes one element
    #[serde(default)]
    pub genre: Vec<String>,
}

pub fn validate_book(form: &BookForm) -> Validated<super::NewBook, BookForm> {
    let attempted = BookForm {
        title: form.title.trim().to_string(),
        author: form.author.trim().to_string(),
        summary: form.summary.trim().to_string(),
        isbn: form.isbn.trim().to_string(),
        genre: form.genre.iter().map(|g| g.trim().to_string()).collect(),
    };

    let mut errors = Vec::new();
    if attempted.title.is_empty() {
        errors.push(FieldError::new("title", "Title must not be empty."));
    }
    if attempted.author.is_empty() {
        errors.push(FieldError::new("author", "Author must not be empty."));
    }
    if attempted.summary.is_empty() {
        errors.push(FieldError::new("summary", "Summary must not be empty."));
    }
    if attempted.isbn.is_empty() {
        errors.push(FieldError::new("isbn", "ISBN must not be empty."));
    }

    let author_id = attempted.author.parse::<i32>().ok();
    if !attempted.author.is_empty() && author_id.is_none() {
        errors.push(FieldError::new("author", "Invalid author reference."));
    }

    let mut genre_ids = Vec::with_capacity(attempted.genre.len());
    for value in &attempted.genre {
        match value.parse::<i32>() {
            Ok(id) => genre_ids.push(id),
            Err(_) => {
                errors.push(FieldError::new("genre", "Invalid genre reference."));
                break;
            }
        }
    }

    match (author_id, errors.is_empty()) {
        (Some(author_id), true) => Validated::Valid(super::NewBook {
            title: attempted.title,
            author_id,
            summary: attempted.summary,
            isbn: attempted.isbn,
            genre_ids,
        }),
        _ => Validated::Invalid { attempted, errors },
    }
}

// ---------------------------------------------------------------------------
// Genre

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenreForm {
    #[serde(default)]
    pub name: String,
}

pub fn validate_genre(form: &GenreForm) -> Validated<super::NewGenre, GenreForm> {
    let attempted = GenreForm {
        name: form.name.trim().to_string(),
    };

    if attempted.name.chars().count() < 3 {
        let errors = vec![FieldError::new(
            "name",
            "Genre name must contain at least 3 characters",
        )];
        return Validated::Invalid { attempted, errors };
    }

    Validated::Valid(super::NewGenre {
        name: attempted.name,
    })
}

// ---------------------------------------------------------------------------
// BookInstance

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookInstanceForm {
    #[serde(default)]
    pub book: String,
    #[serde(default)]
    pub imprint: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub due_back: String,
}

pub fn validate_book_instance(
    form: &BookInstanceForm,
) -> Validated<super::NewBookInstance, BookInstanceForm> {
    let attempted = BookInstanceForm {
        book: form.book.trim().to_string(),
        imprint: form.imprint.trim().to_string(),
        status: form.status.trim().to_string(),
        due_back: form.due_back.trim().to_string(),
    };

    let mut errors = Vec::new();
    if attempted.book.is_empty() {
        errors.push(FieldError::new("book", "Book must be specified"));
    }
    if attempted.imprint.is_empty() {
        errors.push(FieldError::new("imprint", "Imprint must be specified"));
    }

    let book_id = attempted.book.parse::<i32>().ok();
    if !attempted.book.is_empty() && book_id.is_none() {
        errors.push(FieldError::new("book", "Invalid book reference."));
    }

    let mut due_back = None;
    if !attempted.due_back.is_empty() {
        due_back = parse_iso_date(&attempted.due_back);
        if due_back.is_none() {
            errors.push(FieldError::new("due_back", "Invalid date"));
        }
    }

    let status = if attempted.status.is_empty() {
        "Maintenance".to_string()
    } else {
        attempted.status.clone()
    };

    match (book_id, errors.is_empty()) {
        (Some(book_id), true) => Validated::Valid(super::NewBookInstance {
            book_id,
            imprint: attempted.imprint,
            status,
            due_back,
        }),
        _ => Validated::Invalid { attempted, errors },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author_form(first: &str, family: &str, dob: &str, dod: &str) -> AuthorForm {
        AuthorForm {
            first_name: first.to_string(),
            family_name: family.to_string(),
            date_of_birth: dob.to_string(),
            date_of_death: dod.to_string(),
        }
    }

    #[test]
    fn author_valid_input_is_trimmed_and_parsed() {
        let form = author_form("  Isaac ", " Asimov ", "1920-01-02", "");
        match validate_author(&form) {
            Validated::Valid(author) => {
                assert_eq!(author.first_name, "Isaac");
                assert_eq!(author.family_name, "Asimov");
                assert_eq!(author.date_of_birth.to_string(), "1920-01-02");
                assert!(author.date_of_death.is_none());
            }
            Validated::Invalid { errors, .. } => panic!("unexpected errors: {:?}", errors),
        }
    }

    #[test]
    fn author_missing_names_collects_both_errors() {
        let form = author_form("", "  ", "1920-01-02", "");
        match validate_author(&form) {
            Validated::Invalid { errors, .. } => {
                let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec!["first_name", "family_name"]);
            }
            Validated::Valid(_) => panic!("expected validation failure"),
        }
    }

    #[test]
    fn author_non_alphanumeric_name_rejected() {
        let form = author_form("Jean-Luc", "Picard", "2305-07-13", "");
        match validate_author(&form) {
            Validated::Invalid { errors, .. } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "first_name");
                assert!(errors[0].message.contains("non-alphanumeric"));
            }
            Validated::Valid(_) => panic!("expected validation failure"),
        }
    }

    #[test]
    fn author_birth_date_is_required() {
        let form = author_form("Isaac", "Asimov", "", "");
        match validate_author(&form) {
            Validated::Invalid { errors, attempted } => {
                assert_eq!(errors[0].field, "date_of_birth");
                // attempted form keeps the sanitized names for re-rendering
                assert_eq!(attempted.first_name, "Isaac");
            }
            Validated::Valid(_) => panic!("expected validation failure"),
        }
    }

    #[test]
    fn author_bad_death_date_rejected() {
        let form = author_form("Isaac", "Asimov", "1920-01-02", "not-a-date");
        match validate_author(&form) {
            Validated::Invalid { errors, .. } => {
                assert_eq!(errors[0].field, "date_of_death");
            }
            Validated::Valid(_) => panic!("expected validation failure"),
        }
    }

    #[test]
    fn book_empty_title_rejected_with_attempted_record() {
        let form = BookForm {
            title: "  ".to_string(),
            author: "1".to_string(),
            summary: "A summary".to_string(),
            isbn: "9780553293357".to_string(),
            genre: vec!["2".to_string()],
        };
        match validate_book(&form) {
            Validated::Invalid { attempted, errors } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "title");
                assert_eq!(errors[0].message, "Title must not be empty.");
                assert_eq!(attempted.summary, "A summary");
            }
            Validated::Valid(_) => panic!("expected validation failure"),
        }
    }

    #[test]
    fn book_genres_parse_to_ids() {
        let form = BookForm {
            title: "Foundation".to_string(),
            author: "1".to_string(),
            summary: "Psychohistory".to_string(),
            isbn: "9780553293357".to_string(),
            genre: vec!["3".to_string(), "7".to_string()],
        };
        match validate_book(&form) {
            Validated::Valid(book) => assert_eq!(book.genre_ids, vec![3, 7]),
            Validated::Invalid { errors, .. } => panic!("unexpected errors: {:?}", errors),
        }
    }

    #[test]
    fn book_with_no_genres_is_valid() {
        let form = BookForm {
            title: "Foundation".to_string(),
            author: "1".to_string(),
            summary: "Psychohistory".to_string(),
            isbn: "9780553293357".to_string(),
            genre: vec![],
        };
        match validate_book(&form) {
            Validated::Valid(book) => assert!(book.genre_ids.is_empty()),
            Validated::Invalid { errors, .. } => panic!("unexpected errors: {:?}", errors),
        }
    }

    #[test]
    fn genre_name_minimum_length() {
        let form = GenreForm {
            name: " sf ".to_string(),
        };
        match validate_genre(&form) {
            Validated::Invalid { attempted, errors } => {
                assert_eq!(attempted.name, "sf");
                assert_eq!(
                    errors[0].message,
                    "Genre name must contain at least 3 characters"
                );
            }
            Validated::Valid(_) => panic!("expected validation failure"),
        }
    }

    #[test]
    fn instance_empty_status_defaults_to_maintenance() {
        let form = BookInstanceForm {
            book: "1".to_string(),
            imprint: "First edition".to_string(),
            status: "".to_string(),
            due_back: "".to_string(),
        };
        match validate_book_instance(&form) {
            Validated::Valid(instance) => assert_eq!(instance.status, "Maintenance"),
            Validated::Invalid { errors, .. } => panic!("unexpected errors: {:?}", errors),
        }
    }

    #[test]
    fn instance_bad_due_back_rejected() {
        let form = BookInstanceForm {
            book: "1".to_string(),
            imprint: "First edition".to_string(),
            status: "Loaned".to_string(),
            due_back: "next week".to_string(),
        };
        match validate_book_instance(&form) {
            Validated::Invalid { errors, .. } => {
                assert_eq!(errors[0].field, "due_back");
                assert_eq!(errors[0].message, "Invalid date");
            }
            Validated::Valid(_) => panic!("expected validation failure"),
        }
    }

    #[test]
    fn name_key_folds_case_and_width() {
        assert_eq!(name_key("Fiction"), name_key("fiction"));
        assert_eq!(name_key(" FICTION "), name_key("fiction"));
        assert_eq!(name_key("Ｆｉｃｔｉｏｎ"), name_key("fiction"));
    }
}
