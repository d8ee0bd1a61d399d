//! SeaORM implementation of AuthorRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use super::parse_stored_date;
use crate::domain::{
    Author, AuthorRepository, BookSummary, DeleteOutcome, DomainError, NewAuthor,
};
use crate::models::author::{self, ActiveModel, Column, Entity as AuthorEntity};
use crate::models::book::{Column as BookColumn, Entity as BookEntity};

/// SeaORM-based implementation of AuthorRepository
pub struct SeaOrmAuthorRepository {
    db: DatabaseConnection,
}

impl SeaOrmAuthorRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_author(model: author::Model) -> Author {
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

#[async_trait]
impl AuthorRepository for SeaOrmAuthorRepository {
    async fn find_all(&self) -> Result<Vec<Author>, DomainError> {
        let authors = AuthorEntity::find()
            .order_by_asc(Column::FamilyName)
            .all(&self.db)
            .await?;

        Ok(authors.into_iter().map(to_author).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Author>, DomainError> {
        let author = AuthorEntity::find_by_id(id).one(&self.db).await?;
        Ok(author.map(to_author))
    }

    async fn create(&self, input: NewAuthor) -> Result<Author, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();

        let new_author = ActiveModel {
            first_name: Set(input.first_name),
            family_name: Set(input.family_name),
            date_of_birth: Set(Some(input.date_of_birth.to_string())),
            date_of_death: Set(input.date_of_death.map(|d| d.to_string())),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = new_author.insert(&self.db).await?;
        Ok(to_author(result))
    }

    async fn update(&self, id: i32, input: NewAuthor) -> Result<Author, DomainError> {
        let existing = AuthorEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        active.first_name = Set(input.first_name);
        active.family_name = Set(input.family_name);
        active.date_of_birth = Set(Some(input.date_of_birth.to_string()));
        active.date_of_death = Set(input.date_of_death.map(|d| d.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let result = active.update(&self.db).await?;
        Ok(to_author(result))
    }

    async fn delete(&self, id: i32) -> Result<DeleteOutcome<BookSummary>, DomainError> {
        AuthorEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let dependents = BookEntity::find()
            .filter(BookColumn::AuthorId.eq(id))
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

        AuthorEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(DeleteOutcome::Deleted)
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(AuthorEntity::find().count(&self.db).await?)
    }
}
