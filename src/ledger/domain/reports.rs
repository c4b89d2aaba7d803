use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::{
    budgets::Budget,
    categories::normalize_name,
    month::Month,
    transactions::{SpendingType, TransactionType},
};

const NEEDS_CEILING: u32 = 50;
const WANTS_CEILING: u32 = 30;
const SAVINGS_FLOOR: u32 = 20;

/// The number of categories reported for each month.
pub const TOP_CATEGORY_COUNT: usize = 3;

/// Income and expense totals over some period.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TypeTotals {
    pub income: Decimal,
    pub expense: Decimal,
}

impl TypeTotals {
    /// Accumulate per-type sums as produced by an aggregation query.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (TransactionType, Decimal)>,
    {
        rows.into_iter()
            .fold(Self::default(), |mut totals, (kind, amount)| {
                match kind {
                    TransactionType::Income => totals.income += amount,
                    TransactionType::Expense => totals.expense += amount,
                }
                totals
            })
    }
}

/// Expense totals for each spending bucket.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BucketTotals {
    pub needs: Decimal,
    pub wants: Decimal,
    pub savings: Decimal,
}

impl BucketTotals {
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (SpendingType, Decimal)>,
    {
        rows.into_iter()
            .fold(Self::default(), |mut totals, (bucket, amount)| {
                match bucket {
                    SpendingType::Needs => totals.needs += amount,
                    SpendingType::Wants => totals.wants += amount,
                    SpendingType::Savings => totals.savings += amount,
                }
                totals
            })
    }
}

/// A warning about the share of income spent in a bucket.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SpendingWarning {
    NeedsTooHigh,
    WantsTooHigh,
    SavingsTooLow,
}

impl SpendingWarning {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NeedsTooHigh => "needs too high",
            Self::WantsTooHigh => "wants too high",
            Self::SavingsTooLow => "savings too low",
        }
    }
}

/// The income, expenses and 50/30/20 breakdown of a single month.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthlySummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub needs: Decimal,
    pub wants: Decimal,
    pub savings: Decimal,
    pub needs_percentage: Decimal,
    pub wants_percentage: Decimal,
    pub savings_percentage: Decimal,
    pub warnings: Vec<SpendingWarning>,
}

impl MonthlySummary {
    /// Compute a summary from the totals of a month.
    ///
    /// Percentages are relative to income and are zero when there is no
    /// income. Warnings are evaluated independently, so an empty month still
    /// warns that savings are too low.
    ///
    /// Returns [`SummaryOverflow`] when a total is too far out of proportion
    /// to income for its percentage to be represented.
    pub fn compute(totals: TypeTotals, buckets: BucketTotals) -> Result<Self, SummaryOverflow> {
        let share = |part: Decimal| {
            if totals.income.is_zero() {
                return Ok(Decimal::ZERO);
            }

            part.checked_mul(Decimal::ONE_HUNDRED)
                .and_then(|scaled| scaled.checked_div(totals.income))
                .ok_or(SummaryOverflow)
        };

        let needs_percentage = share(buckets.needs)?;
        let wants_percentage = share(buckets.wants)?;
        let savings_percentage = share(buckets.savings)?;

        let mut warnings = Vec::new();
        if needs_percentage > Decimal::from(NEEDS_CEILING) {
            warnings.push(SpendingWarning::NeedsTooHigh);
        }
        if wants_percentage > Decimal::from(WANTS_CEILING) {
            warnings.push(SpendingWarning::WantsTooHigh);
        }
        if savings_percentage < Decimal::from(SAVINGS_FLOOR) {
            warnings.push(SpendingWarning::SavingsTooLow);
        }

        Ok(Self {
            total_income: totals.income,
            total_expense: totals.expense,
            balance: totals
                .income
                .checked_sub(totals.expense)
                .ok_or(SummaryOverflow)?,
            needs: buckets.needs,
            wants: buckets.wants,
            savings: buckets.savings,
            needs_percentage,
            wants_percentage,
            savings_percentage,
            warnings,
        })
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("monthly totals are too large to summarize")]
pub struct SummaryOverflow;

/// The expense total of one category during one month.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryMonthTotal {
    pub month: Month,
    pub category_id: Uuid,
    pub category_name: String,
    pub total: Decimal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CategoryTotal {
    pub category_id: Uuid,
    pub category_name: String,
    pub total: Decimal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonthlyTopCategories {
    pub month: Month,
    pub categories: Vec<CategoryTotal>,
}

/// Pick the highest spending categories of every month.
///
/// # Arguments
///
/// * `rows` - Per category and month expense totals, in any order.
/// * `count` - The maximum number of categories to keep for each month.
///
/// # Returns
///
/// One entry per month, in chronological order. Categories within a month are
/// ordered by descending total, with ties broken by category ID.
pub fn top_categories_by_month(
    mut rows: Vec<CategoryMonthTotal>,
    count: usize,
) -> Vec<MonthlyTopCategories> {
    rows.sort_by(|a, b| {
        a.month
            .cmp(&b.month)
            .then_with(|| b.total.cmp(&a.total))
            .then_with(|| a.category_id.cmp(&b.category_id))
    });

    let mut months: Vec<MonthlyTopCategories> = Vec::new();
    for row in rows {
        if months.last().map(|last| last.month) != Some(row.month) {
            months.push(MonthlyTopCategories {
                month: row.month,
                categories: Vec::new(),
            });
        }

        if let Some(entry) = months.last_mut() {
            if entry.categories.len() < count {
                entry.categories.push(CategoryTotal {
                    category_id: row.category_id,
                    category_name: row.category_name,
                    total: row.total,
                });
            }
        }
    }

    months
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MonthlyTotal {
    pub month: Month,
    pub total_expense: Decimal,
}

/// Combine per month expense sums into a chronological trend.
///
/// Sums for the same month are added together and months without any
/// expenses are left out.
pub fn spending_trends<I>(rows: I) -> Vec<MonthlyTotal>
where
    I: IntoIterator<Item = (Month, Decimal)>,
{
    let mut by_month: BTreeMap<Month, Decimal> = BTreeMap::new();
    for (month, amount) in rows {
        *by_month.entry(month).or_default() += amount;
    }

    by_month
        .into_iter()
        .filter(|(_, total)| !total.is_zero())
        .map(|(month, total_expense)| MonthlyTotal {
            month,
            total_expense,
        })
        .collect()
}

/// A budget next to the money actually spent in its category.
#[derive(Clone, Debug, PartialEq)]
pub struct BudgetComparison {
    pub category: String,
    pub budgeted_amount: Decimal,
    pub actual_spent: Decimal,
    pub remaining_budget: Decimal,
}

/// Compare budgets against expense totals keyed by category name.
///
/// Category names are matched case-insensitively. The output keeps the order
/// of `budgets`.
pub fn compare_budgets<I>(budgets: &[Budget], spent: I) -> Vec<BudgetComparison>
where
    I: IntoIterator<Item = (String, Decimal)>,
{
    let mut spent_by_category: HashMap<String, Decimal> = HashMap::new();
    for (category, amount) in spent {
        *spent_by_category
            .entry(normalize_name(&category))
            .or_default() += amount;
    }

    budgets
        .iter()
        .map(|budget| {
            let actual_spent = spent_by_category
                .get(&normalize_name(&budget.category))
                .copied()
                .unwrap_or_default();

            BudgetComparison {
                category: budget.category.clone(),
                budgeted_amount: budget.amount,
                actual_spent,
                remaining_budget: budget.amount - actual_spent,
            }
        })
        .collect()
}
