//! SeaORM implementation of GenreRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait, QueryOrder,
    Set,
};

use crate::domain::{
    validation::name_key, BookSummary, DeleteOutcome, DomainError, Genre, GenreRepository,
    NewGenre,
};
use crate::models::book::{Column as BookColumn, Entity as BookEntity};
use crate::models::genre::{self, ActiveModel, Column, Entity as GenreEntity};

/// SeaORM-based implementation of GenreRepository
pub struct SeaOrmGenreRepository {
    db: DatabaseConnection,
}

impl SeaOrmGenreRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_genre(model: genre::Model) -> Genre {
    Genre {
        id: model.id,
        name: model.name,
    }
}

#[async_trait]
impl GenreRepository for SeaOrmGenreRepository {
    async fn find_all(&self) -> Result<Vec<Genre>, DomainError> {
        let genres = GenreEntity::find()
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await?;

        Ok(genres.into_iter().map(to_genre).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Genre>, DomainError> {
        let genre = GenreEntity::find_by_id(id).one(&self.db).await?;
        Ok(genre.map(to_genre))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Genre>, DomainError> {
        // Unicode case-insensitive match done in the application layer;
        // sqlite NOCASE only folds ASCII. The genre collection stays
        // small enough to scan.
        let key = name_key(name);
        let genres = GenreEntity::find().all(&self.db).await?;

        Ok(genres
            .into_iter()
            .find(|g| name_key(&g.name) == key)
            .map(to_genre))
    }

    async fn create(&self, input: NewGenre) -> Result<Genre, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();

        let new_genre = ActiveModel {
            name: Set(input.name),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = new_genre.insert(&self.db).await?;
        Ok(to_genre(result))
    }

    async fn update(&self, id: i32, input: NewGenre) -> Result<Genre, DomainError> {
        let existing = GenreEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        active.name = Set(input.name);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let result = active.update(&self.db).await?;
        Ok(to_genre(result))
    }

    async fn delete(&self, id: i32) -> Result<DeleteOutcome<BookSummary>, DomainError> {
        let genre = GenreEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let dependents = genre
            .find_related(BookEntity)
            .order_by_asc(BookColumn::Title)
            .all(&self.db)
            .await?;

        if !dependents.is_empty() {
            let books = dependents
                .into_iter()
                .map(|b| BookSummary {
                    id: b.id,
                    title: b.title,
                    summary: b.summary,
                })
                .collect();
            return Ok(DeleteOutcome::Blocked(books));
        }

        GenreEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(DeleteOutcome::Deleted)
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(GenreEntity::find().count(&self.db).await?)
    }
}
