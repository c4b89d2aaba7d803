use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    ledger::domain::{
        budgets::{Budget, NewBudgetData},
        categories::Category,
        month::Month,
        reports::{BudgetComparison, MonthlySummary, MonthlyTopCategories, MonthlyTotal},
        transactions::{SpendingType, Transaction, TransactionType},
    },
    repos::{DateRange, SortField, SortOrder, TransactionQuery},
};

/// The largest page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize, Serialize)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRep {
    pub id: Uuid,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub category: CategorySummary,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub spending_type: Option<SpendingType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionRep {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            amount: transaction.amount,
            date: transaction.occurred_at,
            description: transaction.description,
            category: CategorySummary {
                id: transaction.category_id,
                name: transaction.category_name,
            },
            kind: transaction.kind,
            spending_type: transaction.spending_type,
            created_at: transaction.created_at,
            updated_at: transaction.updated_at,
        }
    }
}

pub fn transaction_reps(transactions: Vec<Transaction>) -> Vec<TransactionRep> {
    transactions.into_iter().map(TransactionRep::from).collect()
}

#[derive(Serialize)]
pub struct CreatedTransactions {
    pub transactions: Vec<TransactionRep>,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct TransactionPage {
    pub transactions: Vec<TransactionRep>,
    pub page: u32,
    pub limit: u32,
}

#[derive(Serialize)]
pub struct UpdatedTransaction {
    pub message: &'static str,
    pub transaction: TransactionRep,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentIncome {
    pub recent_income: Vec<TransactionRep>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentExpenses {
    pub recent_expenses: Vec<TransactionRep>,
}

#[derive(Serialize)]
pub struct Message {
    pub message: &'static str,
}

/// Filters, sorting and paging for transaction lists, as provided in a query
/// string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListParams {
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date {:?}, expected YYYY-MM-DD.", raw))
}

impl TransactionListParams {
    /// Build a repository query, or describe why the parameters are invalid.
    pub fn into_query(
        self,
        user_id: Uuid,
        kind: Option<TransactionType>,
    ) -> Result<TransactionQuery, String> {
        let defaults = TransactionQuery::for_user(user_id);

        let category_id = self
            .category
            .as_deref()
            .map(|raw| {
                Uuid::parse_str(raw.trim()).map_err(|_| format!("Invalid category ID: {}", raw))
            })
            .transpose()?;

        // A range only applies once both ends are known.
        let date_range = match (self.start_date.as_deref(), self.end_date.as_deref()) {
            (Some(start), Some(end)) => Some(DateRange {
                start: parse_day(start)?,
                end: parse_day(end)?,
            }),
            _ => None,
        };

        let sort_by = match self.sort_by.as_deref() {
            None | Some("date") => SortField::Date,
            Some("amount") => SortField::Amount,
            Some(other) => return Err(format!("Cannot sort by {:?}.", other)),
        };

        let order = match self.order.as_deref() {
            None | Some("desc") => SortOrder::Descending,
            Some("asc") => SortOrder::Ascending,
            Some(other) => return Err(format!("Invalid sort order {:?}.", other)),
        };

        Ok(TransactionQuery {
            kind,
            category_id,
            date_range,
            sort_by,
            order,
            page: self.page.unwrap_or(defaults.page).max(1),
            limit: self.limit.unwrap_or(defaults.limit).clamp(1, MAX_PAGE_SIZE),
            ..defaults
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRep {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryRep {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            created_at: category.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct CategoryList {
    pub categories: Vec<CategoryRep>,
}

#[derive(Serialize)]
pub struct CreatedCategory {
    pub category: CategoryRep,
    pub message: &'static str,
}

#[derive(Default, Deserialize)]
pub struct NewCategoryRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRep {
    pub id: Uuid,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub month: Month,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Budget> for BudgetRep {
    fn from(budget: Budget) -> Self {
        Self {
            id: budget.id,
            category: budget.category,
            amount: budget.amount,
            month: budget.month,
            created_at: budget.created_at,
            updated_at: budget.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct BudgetList {
    pub budgets: Vec<BudgetRep>,
}

#[derive(Serialize)]
pub struct SavedBudget {
    pub message: &'static str,
    pub budget: BudgetRep,
}

/// A budget update. Fields that are left out keep their current value.
#[derive(Default, Deserialize)]
pub struct BudgetUpdateRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub month: Option<Month>,
}

impl BudgetUpdateRequest {
    /// Split the request into the budget's ID and its changes.
    pub fn into_parts(self) -> (Option<Uuid>, NewBudgetData) {
        (
            self.id,
            NewBudgetData {
                category: self.category,
                amount: self.amount,
                month: self.month,
            },
        )
    }
}

#[derive(Default, Deserialize)]
pub struct BudgetIdRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
}

#[derive(Default, Deserialize)]
pub struct MonthParams {
    pub month: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummaryRep {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_expense: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub needs: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub wants: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub savings: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub needs_percentage: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub wants_percentage: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub savings_percentage: Decimal,
    pub warnings: Vec<&'static str>,
}

impl From<MonthlySummary> for MonthlySummaryRep {
    fn from(summary: MonthlySummary) -> Self {
        Self {
            total_income: summary.total_income,
            total_expense: summary.total_expense,
            balance: summary.balance,
            needs: summary.needs,
            wants: summary.wants,
            savings: summary.savings,
            needs_percentage: summary.needs_percentage,
            wants_percentage: summary.wants_percentage,
            savings_percentage: summary.savings_percentage,
            warnings: summary
                .warnings
                .iter()
                .map(|warning| warning.message())
                .collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotalRep {
    pub category_id: Uuid,
    pub category_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

#[derive(Serialize)]
pub struct MonthlyTopCategoriesRep {
    pub month: Month,
    pub categories: Vec<CategoryTotalRep>,
}

impl From<MonthlyTopCategories> for MonthlyTopCategoriesRep {
    fn from(top: MonthlyTopCategories) -> Self {
        Self {
            month: top.month,
            categories: top
                .categories
                .into_iter()
                .map(|category| CategoryTotalRep {
                    category_id: category.category_id,
                    category_name: category.category_name,
                    total: category.total,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCategories {
    pub top_categories: Vec<MonthlyTopCategoriesRep>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotalRep {
    pub month: Month,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_expense: Decimal,
}

impl From<MonthlyTotal> for MonthlyTotalRep {
    fn from(total: MonthlyTotal) -> Self {
        Self {
            month: total.month,
            total_expense: total.total_expense,
        }
    }
}

#[derive(Serialize)]
pub struct Trends {
    pub trends: Vec<MonthlyTotalRep>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetComparisonRep {
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub budgeted_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub actual_spent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_budget: Decimal,
}

impl From<BudgetComparison> for BudgetComparisonRep {
    fn from(comparison: BudgetComparison) -> Self {
        Self {
            category: comparison.category,
            budgeted_amount: comparison.budgeted_amount,
            actual_spent: comparison.actual_spent,
            remaining_budget: comparison.remaining_budget,
        }
    }
}

#[derive(Serialize)]
pub struct BudgetSummary {
    pub summary: Vec<BudgetComparisonRep>,
    pub month: Month,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn list_params_default_to_newest_first() {
        let user_id = Uuid::new_v4();

        let query = TransactionListParams::default()
            .into_query(user_id, Some(TransactionType::Income))
            .unwrap();

        assert_eq!(user_id, query.user_id);
        assert_eq!(Some(TransactionType::Income), query.kind);
        assert_eq!(SortField::Date, query.sort_by);
        assert_eq!(SortOrder::Descending, query.order);
        assert_eq!((1, 10), (query.page, query.limit));
        assert_eq!(None, query.date_range);
    }

    #[test]
    fn date_range_needs_both_ends() {
        let params = TransactionListParams {
            start_date: Some("2024-03-01".to_owned()),
            ..Default::default()
        };

        let query = params.into_query(Uuid::new_v4(), None).unwrap();

        assert_eq!(None, query.date_range);
    }

    #[test]
    fn list_params_are_clamped_and_checked() {
        let params = TransactionListParams {
            sort_by: Some("amount".to_owned()),
            order: Some("asc".to_owned()),
            page: Some(0),
            limit: Some(1000),
            start_date: Some("2024-03-01".to_owned()),
            end_date: Some("2024-03-31".to_owned()),
            ..Default::default()
        };

        let query = params.into_query(Uuid::new_v4(), None).unwrap();

        assert_eq!(SortField::Amount, query.sort_by);
        assert_eq!(SortOrder::Ascending, query.order);
        assert_eq!((1, MAX_PAGE_SIZE), (query.page, query.limit));
        assert_eq!(
            Some(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()),
            query.date_range.map(|range| range.end)
        );

        let bad_category = TransactionListParams {
            category: Some("groceries".to_owned()),
            ..Default::default()
        };
        assert_eq!(
            Err("Invalid category ID: groceries".to_owned()),
            bad_category
                .into_query(Uuid::new_v4(), None)
                .map(|query| query.category_id)
        );
    }

    #[test]
    fn summary_serializes_numbers() {
        let rep = MonthlyTotalRep {
            month: Month::new(2024, 3).unwrap(),
            total_expense: Decimal::new(12550, 2),
        };

        assert_eq!(
            serde_json::json!({ "month": "2024-03", "totalExpense": 125.5 }),
            serde_json::to_value(rep).unwrap()
        );
    }
}
