mod budgets;
mod categories;
#[cfg(test)]
pub mod memory;
mod reports;
mod transactions;
mod users;

pub use budgets::{BudgetRepo, DynBudgetRepo};
pub use categories::{CategoryPersistenceError, CategoryRepo, DynCategoryRepo};
pub use reports::{DynReportRepo, ReportRepo};
pub use transactions::{
    DateRange, DynTransactionRepo, SortField, SortOrder, TransactionQuery, TransactionRepo,
};
pub use users::{DynUserRepo, UserPersistenceError, UserRepo};
