use std::{convert::TryFrom, sync::Arc};

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, FromRow, Postgres, QueryBuilder};
use tracing::trace;
use uuid::Uuid;

use crate::{
    database::PostgresConnection,
    ledger::domain::{
        month::{Month, MonthWindow},
        reports::{BucketTotals, CategoryMonthTotal, TypeTotals},
        transactions::{SpendingType, TransactionType},
    },
    models::ledger::{
        BucketTotalRow, CategoryMonthTotalRow, CategorySpendRow, MonthTotalRow, TypeTotalRow,
    },
};

pub type DynReportRepo = Arc<dyn ReportRepo + Send + Sync>;

/// Read-only aggregations over a user's transactions.
///
/// Months are derived from each transaction's timestamp in UTC.
#[async_trait]
pub trait ReportRepo {
    /// Sum income and expenses within a window.
    async fn type_totals(&self, user_id: Uuid, window: MonthWindow) -> anyhow::Result<TypeTotals>;

    /// Sum expenses per spending bucket within a window.
    async fn bucket_totals(
        &self,
        user_id: Uuid,
        window: MonthWindow,
    ) -> anyhow::Result<BucketTotals>;

    /// Sum expenses per category and month across a user's whole history.
    async fn category_month_totals(&self, user_id: Uuid)
        -> anyhow::Result<Vec<CategoryMonthTotal>>;

    /// Sum expenses per month across a user's whole history.
    async fn monthly_expense_totals(&self, user_id: Uuid)
        -> anyhow::Result<Vec<(Month, Decimal)>>;

    /// Sum expenses per category name within a window.
    async fn expense_by_category(
        &self,
        user_id: Uuid,
        window: MonthWindow,
    ) -> anyhow::Result<Vec<(String, Decimal)>>;
}

const MONTH_OF_OCCURRENCE: &str = "to_char(t.occurred_at AT TIME ZONE 'UTC', 'YYYY-MM')";

fn push_window(query_builder: &mut QueryBuilder<'_, Postgres>, window: MonthWindow) {
    let end_comparison = if window.end_inclusive() {
        " AND t.occurred_at <= "
    } else {
        " AND t.occurred_at < "
    };

    query_builder
        .push(" AND t.occurred_at >= ")
        .push_bind(window.start())
        .push(end_comparison)
        .push_bind(window.end());
}

async fn fetch_rows<R>(
    db: &PostgresConnection,
    report: &'static str,
    mut query_builder: QueryBuilder<'_, Postgres>,
) -> anyhow::Result<Vec<R>>
where
    R: for<'r> FromRow<'r, PgRow>,
{
    trace!(report, "Running report query.");

    let rows = query_builder
        .build()
        .fetch_all(&**db)
        .await?
        .iter()
        .map(R::from_row)
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    Ok(rows)
}

fn type_totals_query(user_id: Uuid, window: MonthWindow) -> QueryBuilder<'static, Postgres> {
    let mut query_builder = QueryBuilder::new(
        "SELECT t.kind, SUM(t.amount) AS total FROM transactions t WHERE t.user_id = ",
    );
    query_builder.push_bind(user_id);
    push_window(&mut query_builder, window);
    query_builder.push(" GROUP BY t.kind");

    query_builder
}

fn bucket_totals_query(user_id: Uuid, window: MonthWindow) -> QueryBuilder<'static, Postgres> {
    let mut query_builder = QueryBuilder::new(
        r#"
        SELECT t.spending_type, SUM(t.amount) AS total
        FROM transactions t
        WHERE t.kind = 'expense' AND t.spending_type IS NOT NULL AND t.user_id = "#,
    );
    query_builder.push_bind(user_id);
    push_window(&mut query_builder, window);
    query_builder.push(" GROUP BY t.spending_type");

    query_builder
}

fn category_month_totals_query(user_id: Uuid) -> QueryBuilder<'static, Postgres> {
    let mut query_builder = QueryBuilder::new("SELECT ");
    query_builder
        .push(MONTH_OF_OCCURRENCE)
        .push(
            r#" AS month, t.category_id, c.name AS category_name, SUM(t.amount) AS total
            FROM transactions t
                JOIN categories c ON c.id = t.category_id AND c.user_id = t.user_id
            WHERE t.kind = 'expense' AND t.user_id = "#,
        )
        .push_bind(user_id)
        .push(" GROUP BY 1, t.category_id, c.name");

    query_builder
}

fn monthly_expense_totals_query(user_id: Uuid) -> QueryBuilder<'static, Postgres> {
    let mut query_builder = QueryBuilder::new("SELECT ");
    query_builder
        .push(MONTH_OF_OCCURRENCE)
        .push(
            r#" AS month, SUM(t.amount) AS total
            FROM transactions t
            WHERE t.kind = 'expense' AND t.user_id = "#,
        )
        .push_bind(user_id)
        .push(" GROUP BY 1 ORDER BY 1");

    query_builder
}

fn expense_by_category_query(
    user_id: Uuid,
    window: MonthWindow,
) -> QueryBuilder<'static, Postgres> {
    let mut query_builder = QueryBuilder::new(
        r#"
        SELECT c.name AS category, SUM(t.amount) AS total
        FROM transactions t
            JOIN categories c ON c.id = t.category_id AND c.user_id = t.user_id
        WHERE t.kind = 'expense' AND t.user_id = "#,
    );
    query_builder.push_bind(user_id);
    push_window(&mut query_builder, window);
    query_builder.push(" GROUP BY c.name");

    query_builder
}

#[async_trait]
impl ReportRepo for PostgresConnection {
    async fn type_totals(&self, user_id: Uuid, window: MonthWindow) -> anyhow::Result<TypeTotals> {
        let query_builder = type_totals_query(user_id, window);
        let rows: Vec<TypeTotalRow> = fetch_rows(self, "type totals", query_builder).await?;
        let totals = rows
            .into_iter()
            .map(<(TransactionType, Decimal)>::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(TypeTotals::from_rows(totals))
    }

    async fn bucket_totals(
        &self,
        user_id: Uuid,
        window: MonthWindow,
    ) -> anyhow::Result<BucketTotals> {
        let query_builder = bucket_totals_query(user_id, window);
        let rows: Vec<BucketTotalRow> = fetch_rows(self, "bucket totals", query_builder).await?;
        let totals = rows
            .into_iter()
            .map(<(SpendingType, Decimal)>::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(BucketTotals::from_rows(totals))
    }

    async fn category_month_totals(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<CategoryMonthTotal>> {
        let query_builder = category_month_totals_query(user_id);
        let rows: Vec<CategoryMonthTotalRow> =
            fetch_rows(self, "category month totals", query_builder).await?;

        rows.into_iter().map(CategoryMonthTotal::try_from).collect()
    }

    async fn monthly_expense_totals(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<(Month, Decimal)>> {
        let query_builder = monthly_expense_totals_query(user_id);
        let rows: Vec<MonthTotalRow> =
            fetch_rows(self, "monthly expense totals", query_builder).await?;

        rows.into_iter()
            .map(<(Month, Decimal)>::try_from)
            .collect()
    }

    async fn expense_by_category(
        &self,
        user_id: Uuid,
        window: MonthWindow,
    ) -> anyhow::Result<Vec<(String, Decimal)>> {
        let query_builder = expense_by_category_query(user_id, window);
        let rows: Vec<CategorySpendRow> =
            fetch_rows(self, "expense by category", query_builder).await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.category, row.total))
            .collect())
    }
}
