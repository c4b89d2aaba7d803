use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Executor, Postgres};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    database::{is_unique_violation, PostgresConnection},
    ledger::domain::categories::Category,
    models::ledger::CategoryRow,
};

#[derive(Debug, Error)]
pub enum CategoryPersistenceError {
    #[error("duplicate category name: {0:?}")]
    DuplicateName(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Find a user's category by name, creating it if it does not exist yet.
///
/// Runs on any executor so a batch of transactions can resolve its categories
/// inside its own database transaction.
///
/// # Arguments
///
/// * `executor` - The pool or open database transaction to run on.
/// * `user_id` - The owner of the category.
/// * `name` - The normalized name of the category.
pub(super) async fn resolve_or_create<'e, E>(
    executor: E,
    user_id: Uuid,
    name: &str,
) -> anyhow::Result<Category>
where
    E: Executor<'e, Database = Postgres>,
{
    // The no-op update makes the existing row visible to RETURNING, so
    // concurrent requests resolving the same name agree on one category.
    let row = sqlx::query_as::<_, CategoryRow>(
        r#"
        INSERT INTO categories (user_id, name)
        VALUES ($1, $2)
        ON CONFLICT (user_id, name) DO UPDATE SET name = EXCLUDED.name
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(name)
    .fetch_one(executor)
    .await?;

    debug!(%user_id, category_id = %row.id, %name, "Resolved category by name.");

    Ok(row.into())
}

pub type DynCategoryRepo = Arc<dyn CategoryRepo + Send + Sync>;

/// Storage for categories. Names passed to these methods are expected to be
/// normalized already.
#[async_trait]
pub trait CategoryRepo {
    /// List a user's categories ordered by name.
    async fn list_categories(&self, user_id: Uuid) -> anyhow::Result<Vec<Category>>;

    async fn get_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> anyhow::Result<Option<Category>>;

    async fn find_category_by_name(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> anyhow::Result<Option<Category>>;

    /// Create a category, failing if the user already has one with the same
    /// name.
    async fn create_category(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<Category, CategoryPersistenceError>;
}

#[async_trait]
impl CategoryRepo for PostgresConnection {
    async fn list_categories(&self, user_id: Uuid) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT * FROM categories WHERE user_id = $1 ORDER BY name",
        )
        .bind(user_id)
        .fetch_all(&**self)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT * FROM categories WHERE id = $1 AND user_id = $2",
        )
        .bind(category_id)
        .bind(user_id)
        .fetch_optional(&**self)
        .await?;

        Ok(row.map(Category::from))
    }

    async fn find_category_by_name(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT * FROM categories WHERE user_id = $1 AND name = $2",
        )
        .bind(user_id)
        .bind(name)
        .fetch_optional(&**self)
        .await?;

        Ok(row.map(Category::from))
    }

    async fn create_category(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<Category, CategoryPersistenceError> {
        let result = sqlx::query_as::<_, CategoryRow>(
            "INSERT INTO categories (user_id, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&**self)
        .await;

        match result {
            Ok(row) => Ok(row.into()),
            Err(error) if is_unique_violation(&error) => {
                Err(CategoryPersistenceError::DuplicateName(name.to_owned()))
            }
            Err(error) => Err(anyhow::Error::from(error).into()),
        }
    }
}
