use std::convert::TryFrom;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    identities::domain::users::{NewUser, User, UserCredentials},
    passwords,
};

pub mod ledger;

/// A user as it is stored in the `users` table.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_premium: bool,
    pub membership_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            is_premium: row.is_premium,
            membership_type: row.membership_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl TryFrom<UserRow> for UserCredentials {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let password_hash = passwords::Hash::parse(&row.password_hash)?;

        Ok(Self {
            user: row.into(),
            password_hash,
        })
    }
}

#[derive(Clone, Debug)]
pub struct NewUserModel {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl TryFrom<&NewUser> for NewUserModel {
    type Error = anyhow::Error;

    fn try_from(user: &NewUser) -> Result<Self, Self::Error> {
        Ok(Self {
            id: user.id(),
            name: user.name().to_owned(),
            email: user.email().address().to_owned(),
            password_hash: user.password_hash()?.as_str().to_owned(),
        })
    }
}
