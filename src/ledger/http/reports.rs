use std::str::FromStr;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use tracing::error;

use crate::{
    authentication::domain::session::Session,
    http_err::{ApiError, ApiResponse},
    ledger::{domain::month::Month, reporting::ReportService},
};

use super::reps;

const MONTH_REQUIRED: &str = "Month is required in YYYY-MM format";

pub(super) async fn get_monthly_summary(
    session: Session,
    State(report_service): State<ReportService>,
    params: Result<Query<reps::MonthParams>, QueryRejection>,
) -> ApiResponse<Json<reps::MonthlySummaryRep>> {
    let Query(params) = params?;
    let month = params
        .month
        .as_deref()
        .and_then(|raw| Month::from_str(raw).ok())
        .ok_or_else(|| ApiError::bad_request(MONTH_REQUIRED))?;

    match report_service
        .monthly_summary(session.user_id(), month)
        .await
    {
        Ok(summary) => Ok(Json(summary.into())),
        Err(error) => {
            error!(?error, %month, "Failed to summarize month.");

            Err(ApiError::InternalServerError)
        }
    }
}

pub(super) async fn get_top_categories(
    session: Session,
    State(report_service): State<ReportService>,
) -> ApiResponse<Json<reps::TopCategories>> {
    match report_service.top_categories(session.user_id()).await {
        Ok(months) => Ok(Json(reps::TopCategories {
            top_categories: months.into_iter().map(Into::into).collect(),
        })),
        Err(error) => {
            error!(?error, "Failed to find top categories.");

            Err(ApiError::InternalServerError)
        }
    }
}

pub(super) async fn get_spending_trends(
    session: Session,
    State(report_service): State<ReportService>,
) -> ApiResponse<Json<reps::Trends>> {
    match report_service.spending_trends(session.user_id()).await {
        Ok(trends) => Ok(Json(reps::Trends {
            trends: trends.into_iter().map(Into::into).collect(),
        })),
        Err(error) => {
            error!(?error, "Failed to compute spending trends.");

            Err(ApiError::InternalServerError)
        }
    }
}

/// Compare budgets to spending for the current month, or for the month given
/// in the query string.
pub(super) async fn get_budget_summary(
    session: Session,
    State(report_service): State<ReportService>,
    params: Result<Query<reps::MonthParams>, QueryRejection>,
) -> ApiResponse<Json<reps::BudgetSummary>> {
    let Query(params) = params?;
    let month = match params.month.as_deref() {
        Some(raw) => Month::from_str(raw).map_err(|_| ApiError::bad_request(MONTH_REQUIRED))?,
        None => Month::current(),
    };

    match report_service
        .budget_summary(session.user_id(), month)
        .await
    {
        Ok(summary) => Ok(Json(reps::BudgetSummary {
            summary: summary.into_iter().map(Into::into).collect(),
            month,
        })),
        Err(error) => {
            error!(?error, %month, "Failed to summarize budgets.");

            Err(ApiError::InternalServerError)
        }
    }
}
