//! SeaORM implementation of BookRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use super::parse_stored_date;
use crate::domain::{
    Author, Book, BookInstance, BookRepository, BookSummary, DeleteOutcome, DomainError, Genre,
    NewBook,
};
use crate::models::author::{self, Entity as AuthorEntity};
use crate::models::book::{self, ActiveModel, Column, Entity as BookEntity};
use crate::models::book_genres::{
    ActiveModel as BookGenreActiveModel, Column as BookGenreColumn, Entity as BookGenreEntity,
};
use crate::models::book_instance::{
    Column as InstanceColumn, Entity as InstanceEntity,
};
use crate::models::genre::Entity as GenreEntity;

/// SeaORM-based implementation of BookRepository
pub struct SeaOrmBookRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn replace_genre_links(
        &self,
        book_id: i32,
        genre_ids: &[i32],
    ) -> Result<(), DomainError> {
        BookGenreEntity::delete_many()
            .filter(BookGenreColumn::BookId.eq(book_id))
            .exec(&self.db)
            .await?;

        if !genre_ids.is_empty() {
            let links = genre_ids.iter().map(|genre_id| BookGenreActiveModel {
                book_id: Set(book_id),
                genre_id: Set(*genre_id),
            });
            BookGenreEntity::insert_many(links).exec(&self.db).await?;
        }

        Ok(())
    }
}

fn populated_author(model: author::Model) -> Author {
    let date_of_birth = parse_stored_date(model.date_of_birth.as_deref());
    let date_of_death = parse_stored_date(model.date_of_death.as_deref());

    Author {
        id: model.id,
        name: Author::display_name(&model.first_name, &model.family_name),
        lifespan: Author::lifespan(date_of_birth, date_of_death),
        first_name: model.first_name,
        family_name: model.family_name,
        date_of_birth,
        date_of_death,
    }
}

fn to_book(model: book::Model, author: Option<author::Model>) -> Book {
    Book {
        id: model.id,
        title: model.title,
        author_id: model.author_id,
        summary: model.summary,
        isbn: model.isbn,
        author: author.map(populated_author),
        genres: None,
    }
}

fn to_summary(model: book::Model) -> BookSummary {
    BookSummary {
        id: model.id,
        title: model.title,
        summary: model.summary,
    }
}

#[async_trait]
impl BookRepository for SeaOrmBookRepository {
    async fn find_all(&self) -> Result<Vec<Book>, DomainError> {
        let books = BookEntity::find()
            .find_also_related(AuthorEntity)
            .order_by_asc(Column::Title)
            .all(&self.db)
            .await?;

        Ok(books
            .into_iter()
            .map(|(book, author)| to_book(book, author))
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, DomainError> {
        let result = BookEntity::find_by_id(id)
            .find_also_related(AuthorEntity)
            .one(&self.db)
            .await?;

        let (book_model, author) = match result {
            Some(pair) => pair,
            None => return Ok(None),
        };

        let genres = book_model
            .find_related(GenreEntity)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|g| Genre {
                id: g.id,
                name: g.name,
            })
            .collect();

        let mut book = to_book(book_model, author);
        book.genres = Some(genres);
        Ok(Some(book))
    }

    async fn find_by_author(&self, author_id: i32) -> Result<Vec<BookSummary>, DomainError> {
        let books = BookEntity::find()
            .filter(Column::AuthorId.eq(author_id))
            .all(&self.db)
            .await?;

        Ok(books.into_iter().map(to_summary).collect())
    }

    async fn find_by_genre(&self, genre_id: i32) -> Result<Vec<BookSummary>, DomainError> {
        let links = BookGenreEntity::find()
            .filter(BookGenreColumn::GenreId.eq(genre_id))
            .all(&self.db)
            .await?;
        let book_ids: Vec<i32> = links.into_iter().map(|l| l.book_id).collect();

        let books = BookEntity::find()
            .filter(Column::Id.is_in(book_ids))
            .order_by_asc(Column::Title)
            .all(&self.db)
            .await?;

        Ok(books.into_iter().map(to_summary).collect())
    }

    async fn create(&self, input: NewBook) -> Result<Book, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();

        let new_book = ActiveModel {
            title: Set(input.title),
            author_id: Set(input.author_id),
            summary: Set(input.summary),
            isbn: Set(input.isbn),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = new_book.insert(&self.db).await?;
        self.replace_genre_links(result.id, &input.genre_ids).await?;

        Ok(to_book(result, None))
    }

    async fn update(&self, id: i32, input: NewBook) -> Result<Book, DomainError> {
        let existing = BookEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        active.title = Set(input.title);
        active.author_id = Set(input.author_id);
        active.summary = Set(input.summary);
        active.isbn = Set(input.isbn);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let result = active.update(&self.db).await?;
        self.replace_genre_links(result.id, &input.genre_ids).await?;

        Ok(to_book(result, None))
    }

    async fn delete(&self, id: i32) -> Result<DeleteOutcome<BookInstance>, DomainError> {
        BookEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let dependents = InstanceEntity::find()
            .filter(InstanceColumn::BookId.eq(id))
            .order_by_asc(InstanceColumn::DueBack)
            .all(&self.db)
            .await?;

        if !dependents.is_empty() {
            let instances = dependents
                .into_iter()
                .map(|i| BookInstance {
                    id: i.id,
                    book_id: i.book_id,
                    imprint: i.imprint,
                    status: i.status,
                    due_back: parse_stored_date(i.due_back.as_deref()),
                    book_title: None,
                })
                .collect();
            return Ok(DeleteOutcome::Blocked(instances));
        }

        // Genre links go with the book; genres themselves stay.
        BookGenreEntity::delete_many()
            .filter(BookGenreColumn::BookId.eq(id))
            .exec(&self.db)
            .await?;
        BookEntity::delete_by_id(id).exec(&self.db).await?;

        Ok(DeleteOutcome::Deleted)
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(BookEntity::find().count(&self.db).await?)
    }
}
