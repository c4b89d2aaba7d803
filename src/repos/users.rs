use std::{convert::TryFrom, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    database::{is_unique_violation, PostgresConnection},
    identities::domain::users::{User, UserCredentials},
    models::{NewUserModel, UserRow},
};

#[derive(Debug, Error)]
pub enum UserPersistenceError {
    #[error("duplicate email address: {0:?}")]
    DuplicateEmail(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DynUserRepo = Arc<dyn UserRepo + Send + Sync>;

#[async_trait]
pub trait UserRepo {
    /// Persist a new user.
    ///
    /// # Returns
    ///
    /// The stored user, or [`UserPersistenceError::DuplicateEmail`] if the
    /// email address is already registered.
    async fn persist_new_user(&self, user: &NewUserModel) -> Result<User, UserPersistenceError>;

    /// Find a user and their password hash by email address.
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> anyhow::Result<Option<UserCredentials>>;

    async fn get_user(&self, user_id: Uuid) -> anyhow::Result<Option<User>>;
}

#[async_trait]
impl UserRepo for PostgresConnection {
    async fn persist_new_user(&self, user: &NewUserModel) -> Result<User, UserPersistenceError> {
        let result = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&**self)
        .await;

        match result {
            Ok(row) => Ok(row.into()),
            Err(error) if is_unique_violation(&error) => {
                Err(UserPersistenceError::DuplicateEmail(user.email.clone()))
            }
            Err(error) => Err(anyhow::Error::from(error).into()),
        }
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> anyhow::Result<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&**self)
            .await?;

        row.map(UserCredentials::try_from).transpose()
    }

    async fn get_user(&self, user_id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&**self)
            .await?;

        Ok(row.map(User::from))
    }
}
