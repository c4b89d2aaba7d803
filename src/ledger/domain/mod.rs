pub mod budgets;
pub mod categories;
pub mod month;
pub mod reports;
pub mod transactions;
