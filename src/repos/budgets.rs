use std::{convert::TryFrom, sync::Arc};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    database::PostgresConnection,
    ledger::domain::{
        budgets::{Budget, NewBudget},
        month::Month,
    },
    models::ledger::BudgetRow,
};

pub type DynBudgetRepo = Arc<dyn BudgetRepo + Send + Sync>;

#[async_trait]
pub trait BudgetRepo {
    /// List every budget of a user, newest month first.
    async fn list_budgets(&self, user_id: Uuid) -> anyhow::Result<Vec<Budget>>;

    /// List a user's budgets for a single month ordered by category.
    async fn list_budgets_for_month(
        &self,
        user_id: Uuid,
        month: Month,
    ) -> anyhow::Result<Vec<Budget>>;

    async fn get_budget(&self, user_id: Uuid, budget_id: Uuid) -> anyhow::Result<Option<Budget>>;

    async fn create_budget(&self, user_id: Uuid, budget: &NewBudget) -> anyhow::Result<Budget>;

    /// Save the category, amount and month of an existing budget.
    ///
    /// Returns [`None`] if the budget does not exist or belongs to another
    /// user.
    async fn update_budget(&self, budget: &Budget) -> anyhow::Result<Option<Budget>>;

    async fn delete_budget(&self, user_id: Uuid, budget_id: Uuid) -> anyhow::Result<bool>;
}

fn rows_into_budgets(rows: Vec<BudgetRow>) -> anyhow::Result<Vec<Budget>> {
    rows.into_iter().map(Budget::try_from).collect()
}

#[async_trait]
impl BudgetRepo for PostgresConnection {
    async fn list_budgets(&self, user_id: Uuid) -> anyhow::Result<Vec<Budget>> {
        let rows = sqlx::query_as::<_, BudgetRow>(
            r#"
            SELECT * FROM budgets
            WHERE user_id = $1
            ORDER BY month DESC, category, created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&**self)
        .await?;

        rows_into_budgets(rows)
    }

    async fn list_budgets_for_month(
        &self,
        user_id: Uuid,
        month: Month,
    ) -> anyhow::Result<Vec<Budget>> {
        let rows = sqlx::query_as::<_, BudgetRow>(
            r#"
            SELECT * FROM budgets
            WHERE user_id = $1 AND month = $2
            ORDER BY category, created_at
            "#,
        )
        .bind(user_id)
        .bind(month.to_string())
        .fetch_all(&**self)
        .await?;

        rows_into_budgets(rows)
    }

    async fn get_budget(&self, user_id: Uuid, budget_id: Uuid) -> anyhow::Result<Option<Budget>> {
        let row =
            sqlx::query_as::<_, BudgetRow>("SELECT * FROM budgets WHERE id = $1 AND user_id = $2")
                .bind(budget_id)
                .bind(user_id)
                .fetch_optional(&**self)
                .await?;

        row.map(Budget::try_from).transpose()
    }

    async fn create_budget(&self, user_id: Uuid, budget: &NewBudget) -> anyhow::Result<Budget> {
        let row = sqlx::query_as::<_, BudgetRow>(
            r#"
            INSERT INTO budgets (user_id, category, amount, month)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&budget.category)
        .bind(budget.amount)
        .bind(budget.month.to_string())
        .fetch_one(&**self)
        .await?;

        Budget::try_from(row)
    }

    async fn update_budget(&self, budget: &Budget) -> anyhow::Result<Option<Budget>> {
        let row = sqlx::query_as::<_, BudgetRow>(
            r#"
            UPDATE budgets
            SET category = $1, amount = $2, month = $3, updated_at = now()
            WHERE id = $4 AND user_id = $5
            RETURNING *
            "#,
        )
        .bind(&budget.category)
        .bind(budget.amount)
        .bind(budget.month.to_string())
        .bind(budget.id)
        .bind(budget.user_id)
        .fetch_optional(&**self)
        .await?;

        row.map(Budget::try_from).transpose()
    }

    async fn delete_budget(&self, user_id: Uuid, budget_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM budgets WHERE id = $1 AND user_id = $2")
            .bind(budget_id)
            .bind(user_id)
            .execute(&**self)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
