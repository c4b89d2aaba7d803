use std::convert::TryFrom;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::ledger::domain::{
    budgets::Budget,
    categories::Category,
    month::Month,
    reports::CategoryMonthTotal,
    transactions::{SpendingType, Transaction, TransactionType},
};

/// A transaction joined with the name of its category.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub category_id: Uuid,
    pub category_name: String,
    pub kind: String,
    pub spending_type: Option<String>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = anyhow::Error;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            amount: row.amount,
            category_id: row.category_id,
            category_name: row.category_name,
            kind: row.kind.parse()?,
            spending_type: row
                .spending_type
                .as_deref()
                .map(str::parse)
                .transpose()?,
            description: row.description,
            occurred_at: row.occurred_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct BudgetRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    pub amount: Decimal,
    pub month: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BudgetRow> for Budget {
    type Error = anyhow::Error;

    fn try_from(row: BudgetRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            category: row.category,
            amount: row.amount,
            month: row.month.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// The sum of amounts for one transaction type.
#[derive(Debug, sqlx::FromRow)]
pub struct TypeTotalRow {
    pub kind: String,
    pub total: Decimal,
}

impl TryFrom<TypeTotalRow> for (TransactionType, Decimal) {
    type Error = anyhow::Error;

    fn try_from(row: TypeTotalRow) -> Result<Self, Self::Error> {
        Ok((row.kind.parse()?, row.total))
    }
}

/// The sum of expense amounts for one spending bucket.
#[derive(Debug, sqlx::FromRow)]
pub struct BucketTotalRow {
    pub spending_type: String,
    pub total: Decimal,
}

impl TryFrom<BucketTotalRow> for (SpendingType, Decimal) {
    type Error = anyhow::Error;

    fn try_from(row: BucketTotalRow) -> Result<Self, Self::Error> {
        Ok((row.spending_type.parse()?, row.total))
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct CategoryMonthTotalRow {
    pub month: String,
    pub category_id: Uuid,
    pub category_name: String,
    pub total: Decimal,
}

impl TryFrom<CategoryMonthTotalRow> for CategoryMonthTotal {
    type Error = anyhow::Error;

    fn try_from(row: CategoryMonthTotalRow) -> Result<Self, Self::Error> {
        Ok(Self {
            month: row.month.parse()?,
            category_id: row.category_id,
            category_name: row.category_name,
            total: row.total,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct MonthTotalRow {
    pub month: String,
    pub total: Decimal,
}

impl TryFrom<MonthTotalRow> for (Month, Decimal) {
    type Error = anyhow::Error;

    fn try_from(row: MonthTotalRow) -> Result<Self, Self::Error> {
        Ok((row.month.parse()?, row.total))
    }
}

/// Money spent in a category, keyed by the category's name.
#[derive(Debug, sqlx::FromRow)]
pub struct CategorySpendRow {
    pub category: String,
    pub total: Decimal,
}
