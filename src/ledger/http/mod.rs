use axum::{
    routing::{get, put},
    Router,
};

use crate::server::AppState;

mod handlers;
mod reports;
pub mod reps;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transaction",
            get(handlers::get_transactions).post(handlers::create_transactions),
        )
        .route("/transaction/income", get(handlers::get_income))
        .route("/transaction/expense", get(handlers::get_expenses))
        .route("/transaction/recent-income", get(handlers::get_recent_income))
        .route(
            "/transaction/recent-expenses",
            get(handlers::get_recent_expenses),
        )
        .route("/transaction/summary", get(reports::get_monthly_summary))
        .route("/transaction/top-categories", get(reports::get_top_categories))
        .route("/transaction/trends", get(reports::get_spending_trends))
        .route(
            "/transaction/:transaction_id",
            put(handlers::update_transaction).delete(handlers::delete_transaction),
        )
        .route(
            "/categories",
            get(handlers::get_categories).post(handlers::create_category),
        )
        .route(
            "/budget",
            get(handlers::get_budgets)
                .post(handlers::create_budget)
                .put(handlers::update_budget)
                .delete(handlers::delete_budget),
        )
        .route("/budget/summary", get(reports::get_budget_summary))
}
