use std::{ops::Deref, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};

/// The SQLSTATE Postgres reports for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PostgresConnection(PgPool);

impl PostgresConnection {
    pub fn new(pool: PgPool) -> Self {
        Self(pool)
    }

    /// Open a connection pool.
    ///
    /// # Arguments
    ///
    /// * `url` - Connection string for the database.
    /// * `pool_size` - The maximum number of pooled connections.
    /// * `timeout_seconds` - How long to wait when acquiring a connection.
    pub async fn connect(url: &str, pool_size: u32, timeout_seconds: u8) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(timeout_seconds.into()))
            .connect(url)
            .await?;

        Ok(Self(pool))
    }
}

impl Deref for PostgresConnection {
    type Target = PgPool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Determine if a query failed because it violated a unique constraint.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|error| error.code())
        .map_or(false, |code| code == UNIQUE_VIOLATION)
}
