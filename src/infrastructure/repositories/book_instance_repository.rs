//! SeaORM implementation of BookInstanceRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use super::parse_stored_date;
use crate::domain::{BookInstance, BookInstanceRepository, DomainError, NewBookInstance};
use crate::models::book::Entity as BookEntity;
use crate::models::book_instance::{self, ActiveModel, Column, Entity as InstanceEntity};

/// SeaORM-based implementation of BookInstanceRepository
pub struct SeaOrmBookInstanceRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookInstanceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_instance(model: book_instance::Model, book_title: Option<String>) -> BookInstance {
    BookInstance {
        id: model.id,
        book_id: model.book_id,
        imprint: model.imprint,
        status: model.status,
        due_back: parse_stored_date(model.due_back.as_deref()),
        book_title,
    }
}

#[async_trait]
impl BookInstanceRepository for SeaOrmBookInstanceRepository {
    async fn find_all(&self) -> Result<Vec<BookInstance>, DomainError> {
        let instances = InstanceEntity::find()
            .find_also_related(BookEntity)
            .all(&self.db)
            .await?;

        Ok(instances
            .into_iter()
            .map(|(instance, book)| to_instance(instance, book.map(|b| b.title)))
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<BookInstance>, DomainError> {
        let result = InstanceEntity::find_by_id(id)
            .find_also_related(BookEntity)
            .one(&self.db)
            .await?;

        Ok(result.map(|(instance, book)| to_instance(instance, book.map(|b| b.title))))
    }

    async fn find_by_book(&self, book_id: i32) -> Result<Vec<BookInstance>, DomainError> {
        let instances = InstanceEntity::find()
            .filter(Column::BookId.eq(book_id))
            .all(&self.db)
            .await?;

        Ok(instances
            .into_iter()
            .map(|instance| to_instance(instance, None))
            .collect())
    }

    async fn find_by_book_due_first(
        &self,
        book_id: i32,
    ) -> Result<Vec<BookInstance>, DomainError> {
        let instances = InstanceEntity::find()
            .filter(Column::BookId.eq(book_id))
            .order_by_asc(Column::DueBack)
            .all(&self.db)
            .await?;

        Ok(instances
            .into_iter()
            .map(|instance| to_instance(instance, None))
            .collect())
    }

    async fn create(&self, input: NewBookInstance) -> Result<BookInstance, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();

        let new_instance = ActiveModel {
            book_id: Set(input.book_id),
            imprint: Set(input.imprint),
            status: Set(input.status),
            due_back: Set(input.due_back.map(|d| d.to_string())),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = new_instance.insert(&self.db).await?;
        Ok(to_instance(result, None))
    }

    async fn update(
        &self,
        id: i32,
        input: NewBookInstance,
    ) -> Result<BookInstance, DomainError> {
        let existing = InstanceEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        active.book_id = Set(input.book_id);
        active.imprint = Set(input.imprint);
        active.status = Set(input.status);
        active.due_back = Set(input.due_back.map(|d| d.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let result = active.update(&self.db).await?;
        Ok(to_instance(result, None))
    }

    async fn delete(&self, id: i32) -> Result<i32, DomainError> {
        let (instance, book) = InstanceEntity::find_by_id(id)
            .find_also_related(BookEntity)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        // A copy whose parent book is gone is a broken chain: surface it
        // instead of deleting quietly.
        let book = book.ok_or(DomainError::NotFound)?;

        InstanceEntity::delete_by_id(instance.id)
            .exec(&self.db)
            .await?;

        Ok(book.id)
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(InstanceEntity::find().count(&self.db).await?)
    }

    async fn count_by_status(&self, status: &str) -> Result<u64, DomainError> {
        Ok(InstanceEntity::find()
            .filter(Column::Status.eq(status))
            .count(&self.db)
            .await?)
    }
}
