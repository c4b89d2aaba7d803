use std::{convert::TryFrom, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    database::PostgresConnection,
    ledger::domain::{
        categories::CategoryRef,
        transactions::{NewTransaction, Transaction, TransactionDraft, TransactionType},
    },
    models::ledger::TransactionRow,
};

use super::categories::resolve_or_create;

/// The field used to order a transaction list.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortField {
    Date,
    Amount,
}

impl SortField {
    fn column(&self) -> &'static str {
        match self {
            Self::Date => "t.occurred_at",
            Self::Amount => "t.amount",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn keyword(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// An inclusive range of calendar days in UTC.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// The first instant of the range.
    pub fn start_instant(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.start.and_time(NaiveTime::MIN))
    }

    /// The first instant after the range.
    pub fn end_instant(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.end.and_time(NaiveTime::MIN)) + Duration::days(1)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start_instant() && instant < self.end_instant()
    }
}

/// Query parameters for listing transactions.
#[derive(Clone, Debug)]
pub struct TransactionQuery {
    /// The owner of the transactions to search for.
    pub user_id: Uuid,
    /// Only list transactions of this type.
    pub kind: Option<TransactionType>,
    /// Only list transactions in this category.
    pub category_id: Option<Uuid>,
    /// Only list transactions that occurred during these days.
    pub date_range: Option<DateRange>,
    pub sort_by: SortField,
    pub order: SortOrder,
    /// The one-based page to return.
    pub page: u32,
    pub limit: u32,
}

impl TransactionQuery {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            kind: None,
            category_id: None,
            date_range: None,
            sort_by: SortField::Date,
            order: SortOrder::Descending,
            page: 1,
            limit: 10,
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

pub type DynTransactionRepo = Arc<dyn TransactionRepo + Send + Sync>;

#[async_trait]
pub trait TransactionRepo {
    /// Persist a batch of transactions atomically.
    ///
    /// Categories referenced by name are found or created as part of the same
    /// atomic write, so a failed batch leaves no new categories behind.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The owner of the transactions.
    /// * `drafts` - The validated transactions to save. Categories referenced
    ///   by ID must belong to the owner.
    ///
    /// # Returns
    ///
    /// An [`anyhow::Result`] containing the saved transactions in the order
    /// they were provided.
    async fn insert_transactions(
        &self,
        user_id: Uuid,
        drafts: &[TransactionDraft],
    ) -> anyhow::Result<Vec<Transaction>>;

    /// List the transactions matching the provided query.
    ///
    /// # Arguments
    ///
    /// * `query` - The query parameters used to filter the list.
    ///
    /// # Returns
    ///
    /// An [`anyhow::Result`] containing a single page of transactions.
    async fn list_transactions(&self, query: &TransactionQuery)
        -> anyhow::Result<Vec<Transaction>>;

    /// Replace the contents of one of a user's transactions.
    ///
    /// Returns [`None`] if the user has no transaction with the given ID.
    async fn update_transaction(
        &self,
        transaction_id: Uuid,
        transaction: &NewTransaction,
    ) -> anyhow::Result<Option<Transaction>>;

    /// Delete one of a user's transactions.
    ///
    /// Returns `false` if the user has no transaction with the given ID.
    async fn delete_transaction(&self, user_id: Uuid, transaction_id: Uuid)
        -> anyhow::Result<bool>;
}

fn rows_into_transactions(rows: Vec<TransactionRow>) -> anyhow::Result<Vec<Transaction>> {
    rows.into_iter().map(Transaction::try_from).collect()
}

#[async_trait]
impl TransactionRepo for PostgresConnection {
    async fn insert_transactions(
        &self,
        user_id: Uuid,
        drafts: &[TransactionDraft],
    ) -> anyhow::Result<Vec<Transaction>> {
        if drafts.is_empty() {
            return Ok(vec![]);
        }

        let mut tx = self.begin().await?;

        let mut transactions: Vec<NewTransaction> = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let category_id = match draft.category() {
                CategoryRef::Id(category_id) => *category_id,
                CategoryRef::Name(name) => resolve_or_create(&mut tx, user_id, name).await?.id,
            };

            transactions.push(draft.clone().into_new_transaction(user_id, category_id));
        }

        // IDs are assigned up front so the saved rows can be returned in the
        // order they were provided.
        let ids: Vec<Uuid> = transactions.iter().map(|_| Uuid::new_v4()).collect();

        let mut query_builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            r#"
            WITH inserted AS (
                INSERT INTO transactions
                    (id, user_id, amount, category_id, kind, spending_type, description, occurred_at)
            "#,
        );

        query_builder.push_values(
            ids.iter().zip(&transactions),
            |mut row, (id, transaction)| {
                row.push_bind(*id)
                    .push_bind(transaction.user_id)
                    .push_bind(transaction.amount)
                    .push_bind(transaction.category_id)
                    .push_bind(transaction.kind.as_str())
                    .push_bind(transaction.spending_type.map(|bucket| bucket.as_str()))
                    .push_bind(transaction.description.clone())
                    .push_bind(transaction.occurred_at);
            },
        );

        query_builder.push(
            r#"
                RETURNING *
            )
            SELECT i.id, i.user_id, i.amount, i.category_id, c.name AS category_name,
                i.kind, i.spending_type, i.description, i.occurred_at, i.created_at, i.updated_at
            FROM inserted i
                JOIN categories c ON c.id = i.category_id AND c.user_id = i.user_id
            "#,
        );

        let mut rows = query_builder
            .build()
            .fetch_all(&mut tx)
            .await?
            .iter()
            .map(TransactionRow::from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        tx.commit().await?;

        rows.sort_by_key(|row| ids.iter().position(|id| *id == row.id));

        rows_into_transactions(rows)
    }

    async fn list_transactions(
        &self,
        query: &TransactionQuery,
    ) -> anyhow::Result<Vec<Transaction>> {
        let mut query_builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            r#"
            SELECT t.id, t.user_id, t.amount, t.category_id, c.name AS category_name,
                t.kind, t.spending_type, t.description, t.occurred_at, t.created_at, t.updated_at
            FROM transactions t
                JOIN categories c ON c.id = t.category_id AND c.user_id = t.user_id
            WHERE t.user_id = "#,
        );
        query_builder.push_bind(query.user_id);

        if let Some(kind) = query.kind {
            query_builder.push(" AND t.kind = ").push_bind(kind.as_str());
        }

        if let Some(category_id) = query.category_id {
            query_builder
                .push(" AND t.category_id = ")
                .push_bind(category_id);
        }

        if let Some(range) = query.date_range {
            query_builder
                .push(" AND t.occurred_at >= ")
                .push_bind(range.start_instant())
                .push(" AND t.occurred_at < ")
                .push_bind(range.end_instant());
        }

        query_builder
            .push(" ORDER BY ")
            .push(query.sort_by.column())
            .push(" ")
            .push(query.order.keyword())
            .push(", t.created_at DESC, t.id LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.offset())?);

        let rows = query_builder
            .build()
            .fetch_all(&**self)
            .await?
            .iter()
            .map(TransactionRow::from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        rows_into_transactions(rows)
    }

    async fn update_transaction(
        &self,
        transaction_id: Uuid,
        transaction: &NewTransaction,
    ) -> anyhow::Result<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            WITH updated AS (
                UPDATE transactions
                SET amount = $1,
                    category_id = $2,
                    kind = $3,
                    spending_type = $4,
                    description = $5,
                    occurred_at = $6,
                    updated_at = now()
                WHERE id = $7 AND user_id = $8
                RETURNING *
            )
            SELECT u.id, u.user_id, u.amount, u.category_id, c.name AS category_name,
                u.kind, u.spending_type, u.description, u.occurred_at, u.created_at, u.updated_at
            FROM updated u
                JOIN categories c ON c.id = u.category_id AND c.user_id = u.user_id
            "#,
        )
        .bind(transaction.amount)
        .bind(transaction.category_id)
        .bind(transaction.kind.as_str())
        .bind(transaction.spending_type.map(|bucket| bucket.as_str()))
        .bind(&transaction.description)
        .bind(transaction.occurred_at)
        .bind(transaction_id)
        .bind(transaction.user_id)
        .fetch_optional(&**self)
        .await?;

        row.map(Transaction::try_from).transpose()
    }

    async fn delete_transaction(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
            .bind(transaction_id)
            .bind(user_id)
            .execute(&**self)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn date_range_covers_whole_end_day() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
        };

        assert!(range.contains(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()));
        assert!(range.contains(Utc.with_ymd_and_hms(2024, 2, 10, 23, 59, 59).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 2, 11, 0, 0, 0).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 1, 31, 23, 0, 0).unwrap()));
    }

    #[test]
    fn offset_is_zero_based() {
        let mut query = TransactionQuery::for_user(Uuid::new_v4());
        assert_eq!(0, query.offset());

        query.page = 3;
        query.limit = 25;
        assert_eq!(50, query.offset());
    }
}
