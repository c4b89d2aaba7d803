//! Read-only reports over a user's transactions and budgets.

use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::repos::{DynBudgetRepo, DynReportRepo};

use super::domain::{
    month::{Month, MonthEndPolicy},
    reports::{
        compare_budgets, spending_trends, top_categories_by_month, BudgetComparison,
        MonthlySummary, MonthlyTopCategories, MonthlyTotal, TOP_CATEGORY_COUNT,
    },
};

#[derive(Clone)]
pub struct ReportService {
    budget_repo: DynBudgetRepo,
    month_end: MonthEndPolicy,
    report_repo: DynReportRepo,
}

impl ReportService {
    /// Create a new report service.
    ///
    /// # Arguments
    ///
    /// * `budget_repo` - The repository used to look up budgets.
    /// * `month_end` - Where the window of a month ends for the monthly
    ///   summary and the budget comparison.
    /// * `report_repo` - The repository used to aggregate transactions.
    pub fn new(
        budget_repo: DynBudgetRepo,
        month_end: MonthEndPolicy,
        report_repo: DynReportRepo,
    ) -> Self {
        Self {
            budget_repo,
            month_end,
            report_repo,
        }
    }

    /// Summarize a month of income and expenses, including the split of
    /// expenses into needs, wants and savings.
    pub async fn monthly_summary(
        &self,
        user_id: Uuid,
        month: Month,
    ) -> anyhow::Result<MonthlySummary> {
        let window = month.window(self.month_end);
        debug!(%user_id, %month, ?window, "Summarizing month.");

        let totals = self.report_repo.type_totals(user_id, window).await?;
        let buckets = self.report_repo.bucket_totals(user_id, window).await?;

        Ok(MonthlySummary::compute(totals, buckets)?)
    }

    /// The highest spending categories of every month with expenses.
    pub async fn top_categories(&self, user_id: Uuid) -> anyhow::Result<Vec<MonthlyTopCategories>> {
        let rows = self.report_repo.category_month_totals(user_id).await?;

        Ok(top_categories_by_month(rows, TOP_CATEGORY_COUNT))
    }

    pub async fn spending_trends(&self, user_id: Uuid) -> anyhow::Result<Vec<MonthlyTotal>> {
        let rows = self.report_repo.monthly_expense_totals(user_id).await?;

        Ok(spending_trends(rows))
    }

    /// Compare each of a month's budgets to what was actually spent in its
    /// category.
    pub async fn budget_summary(
        &self,
        user_id: Uuid,
        month: Month,
    ) -> anyhow::Result<Vec<BudgetComparison>> {
        let budgets = self
            .budget_repo
            .list_budgets_for_month(user_id, month)
            .await?;
        if budgets.is_empty() {
            return Ok(vec![]);
        }

        let spent: Vec<(String, Decimal)> = self
            .report_repo
            .expense_by_category(user_id, month.window(self.month_end))
            .await?;

        Ok(compare_budgets(&budgets, spent))
    }
}
