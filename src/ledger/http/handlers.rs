use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use tracing::error;
use uuid::Uuid;

use crate::{
    authentication::domain::session::Session,
    http_err::{ApiError, ApiResponse},
    ledger::{
        domain::{
            budgets::{BudgetInvalidity, NewBudgetData},
            transactions::{NewTransactionData, TransactionInvalidity, TransactionType},
        },
        services::{
            BudgetError, CreateCategoryError, CreateTransactionError, LedgerService,
            UpdateTransactionError,
        },
    },
};

use super::reps;

fn describe_transaction_invalidity<I>(invalidities: I) -> String
where
    I: IntoIterator<Item = TransactionInvalidity>,
{
    invalidities
        .into_iter()
        .map(|invalidity| invalidity.message())
        .collect::<Vec<_>>()
        .join(" ")
}

fn describe_budget_invalidity<I>(invalidities: I) -> String
where
    I: IntoIterator<Item = BudgetInvalidity>,
{
    invalidities
        .into_iter()
        .map(|invalidity| invalidity.message())
        .collect::<Vec<_>>()
        .join(" ")
}

fn budget_error(error: BudgetError) -> ApiError {
    match error {
        BudgetError::InvalidBudget(context) => {
            ApiError::bad_request(describe_budget_invalidity(context))
        }
        BudgetError::BudgetNotFound => ApiError::not_found("Budget not found or unauthorized"),
        BudgetError::Other(error) => {
            error!(?error, "Failed to save budget.");

            ApiError::InternalServerError
        }
    }
}

pub(super) async fn create_transactions(
    session: Session,
    State(ledger_service): State<LedgerService>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResponse<(StatusCode, Json<reps::CreatedTransactions>)> {
    let Json(body) = payload?;

    match body.as_array() {
        Some(entries) if !entries.is_empty() => (),
        _ => return Err(ApiError::bad_request("Provide at least one transaction.")),
    }

    let batch: Vec<NewTransactionData> = serde_json::from_value(body)
        .map_err(|error| ApiError::bad_request(format!("Invalid transaction data: {}", error)))?;

    match ledger_service
        .create_transactions(session.user_id(), batch)
        .await
    {
        Ok(transactions) => Ok((
            StatusCode::CREATED,
            Json(reps::CreatedTransactions {
                transactions: reps::transaction_reps(transactions),
                message: "Transactions added!",
            }),
        )),
        Err(CreateTransactionError::Empty) => {
            Err(ApiError::bad_request("Provide at least one transaction."))
        }
        Err(CreateTransactionError::InvalidTransaction { index, context }) => {
            Err(ApiError::bad_request(format!(
                "Transaction {} is invalid: {}",
                index + 1,
                describe_transaction_invalidity(context)
            )))
        }
        Err(CreateTransactionError::InvalidCategory(category_id)) => Err(ApiError::bad_request(
            format!("Invalid category ID: {}", category_id),
        )),
        Err(CreateTransactionError::Other(error)) => {
            error!(?error, "Failed to create transactions.");

            Err(ApiError::InternalServerError)
        }
    }
}

async fn list_transactions(
    session: Session,
    ledger_service: LedgerService,
    params: reps::TransactionListParams,
    kind: Option<TransactionType>,
) -> ApiResponse<Json<reps::TransactionPage>> {
    let query = params
        .into_query(session.user_id(), kind)
        .map_err(ApiError::BadRequest)?;

    match ledger_service.list_transactions(&query).await {
        Ok(transactions) => Ok(Json(reps::TransactionPage {
            transactions: reps::transaction_reps(transactions),
            page: query.page,
            limit: query.limit,
        })),
        Err(error) => {
            error!(?error, "Failed to list transactions.");

            Err(ApiError::InternalServerError)
        }
    }
}

pub(super) async fn get_transactions(
    session: Session,
    State(ledger_service): State<LedgerService>,
    params: Result<Query<reps::TransactionListParams>, QueryRejection>,
) -> ApiResponse<Json<reps::TransactionPage>> {
    let Query(params) = params?;

    list_transactions(session, ledger_service, params, None).await
}

pub(super) async fn get_income(
    session: Session,
    State(ledger_service): State<LedgerService>,
    params: Result<Query<reps::TransactionListParams>, QueryRejection>,
) -> ApiResponse<Json<reps::TransactionPage>> {
    let Query(params) = params?;

    list_transactions(session, ledger_service, params, Some(TransactionType::Income)).await
}

pub(super) async fn get_expenses(
    session: Session,
    State(ledger_service): State<LedgerService>,
    params: Result<Query<reps::TransactionListParams>, QueryRejection>,
) -> ApiResponse<Json<reps::TransactionPage>> {
    let Query(params) = params?;

    list_transactions(session, ledger_service, params, Some(TransactionType::Expense)).await
}

pub(super) async fn get_recent_income(
    session: Session,
    State(ledger_service): State<LedgerService>,
) -> ApiResponse<Json<reps::RecentIncome>> {
    match ledger_service
        .recent_transactions(session.user_id(), TransactionType::Income)
        .await
    {
        Ok(transactions) => Ok(Json(reps::RecentIncome {
            recent_income: reps::transaction_reps(transactions),
        })),
        Err(error) => {
            error!(?error, "Failed to list recent income.");

            Err(ApiError::InternalServerError)
        }
    }
}

pub(super) async fn get_recent_expenses(
    session: Session,
    State(ledger_service): State<LedgerService>,
) -> ApiResponse<Json<reps::RecentExpenses>> {
    match ledger_service
        .recent_transactions(session.user_id(), TransactionType::Expense)
        .await
    {
        Ok(transactions) => Ok(Json(reps::RecentExpenses {
            recent_expenses: reps::transaction_reps(transactions),
        })),
        Err(error) => {
            error!(?error, "Failed to list recent expenses.");

            Err(ApiError::InternalServerError)
        }
    }
}

pub(super) async fn update_transaction(
    session: Session,
    State(ledger_service): State<LedgerService>,
    transaction_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<NewTransactionData>, JsonRejection>,
) -> ApiResponse<Json<reps::UpdatedTransaction>> {
    let Path(transaction_id) = transaction_id?;
    let Json(data) = payload?;

    match ledger_service
        .update_transaction(session.user_id(), transaction_id, data)
        .await
    {
        Ok(transaction) => Ok(Json(reps::UpdatedTransaction {
            message: "Transaction updated!",
            transaction: transaction.into(),
        })),
        Err(UpdateTransactionError::InvalidTransaction(context)) => Err(ApiError::bad_request(
            describe_transaction_invalidity(context),
        )),
        Err(UpdateTransactionError::CategoryNotFound) => Err(ApiError::bad_request(
            "Category not found. Please provide a valid category ID or name.",
        )),
        Err(UpdateTransactionError::TransactionNotFound) => Err(ApiError::not_found(
            "Transaction not found or unauthorized!",
        )),
        Err(UpdateTransactionError::Other(error)) => {
            error!(?error, %transaction_id, "Failed to update transaction.");

            Err(ApiError::InternalServerError)
        }
    }
}

pub(super) async fn delete_transaction(
    session: Session,
    State(ledger_service): State<LedgerService>,
    transaction_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResponse<Json<reps::Message>> {
    let Path(transaction_id) = transaction_id?;

    match ledger_service
        .delete_transaction(session.user_id(), transaction_id)
        .await
    {
        Ok(true) => Ok(Json(reps::Message {
            message: "Transaction deleted successfully",
        })),
        Ok(false) => Err(ApiError::not_found(
            "Transaction not found or unauthorized",
        )),
        Err(error) => {
            error!(?error, %transaction_id, "Failed to delete transaction.");

            Err(ApiError::InternalServerError)
        }
    }
}

pub(super) async fn get_categories(
    session: Session,
    State(ledger_service): State<LedgerService>,
) -> ApiResponse<Json<reps::CategoryList>> {
    match ledger_service.list_categories(session.user_id()).await {
        Ok(categories) => Ok(Json(reps::CategoryList {
            categories: categories.into_iter().map(Into::into).collect(),
        })),
        Err(error) => {
            error!(?error, "Failed to list categories.");

            Err(ApiError::InternalServerError)
        }
    }
}

pub(super) async fn create_category(
    session: Session,
    State(ledger_service): State<LedgerService>,
    payload: Result<Json<reps::NewCategoryRequest>, JsonRejection>,
) -> ApiResponse<(StatusCode, Json<reps::CreatedCategory>)> {
    let Json(request) = payload?;
    let name = request.name.unwrap_or_default();

    match ledger_service
        .create_category(session.user_id(), &name)
        .await
    {
        Ok(category) => Ok((
            StatusCode::CREATED,
            Json(reps::CreatedCategory {
                category: category.into(),
                message: "Category added!",
            }),
        )),
        Err(CreateCategoryError::BlankName) => {
            Err(ApiError::bad_request("Category name is required"))
        }
        Err(CreateCategoryError::DuplicateName(_)) => {
            Err(ApiError::bad_request("Category already exists"))
        }
        Err(CreateCategoryError::Other(error)) => {
            error!(?error, "Failed to create category.");

            Err(ApiError::InternalServerError)
        }
    }
}

pub(super) async fn get_budgets(
    session: Session,
    State(ledger_service): State<LedgerService>,
) -> ApiResponse<Json<reps::BudgetList>> {
    match ledger_service.list_budgets(session.user_id()).await {
        Ok(budgets) => Ok(Json(reps::BudgetList {
            budgets: budgets.into_iter().map(Into::into).collect(),
        })),
        Err(error) => {
            error!(?error, "Failed to list budgets.");

            Err(ApiError::InternalServerError)
        }
    }
}

pub(super) async fn create_budget(
    session: Session,
    State(ledger_service): State<LedgerService>,
    payload: Result<Json<NewBudgetData>, JsonRejection>,
) -> ApiResponse<(StatusCode, Json<reps::SavedBudget>)> {
    let Json(data) = payload?;

    let budget = ledger_service
        .create_budget(session.user_id(), data)
        .await
        .map_err(budget_error)?;

    Ok((
        StatusCode::CREATED,
        Json(reps::SavedBudget {
            message: "Budget added successfully",
            budget: budget.into(),
        }),
    ))
}

pub(super) async fn update_budget(
    session: Session,
    State(ledger_service): State<LedgerService>,
    payload: Result<Json<reps::BudgetUpdateRequest>, JsonRejection>,
) -> ApiResponse<Json<reps::SavedBudget>> {
    let Json(request) = payload?;

    let (budget_id, changes) = request.into_parts();
    let budget_id = budget_id.ok_or_else(|| ApiError::bad_request("Budget ID is required"))?;

    let budget = ledger_service
        .update_budget(session.user_id(), budget_id, changes)
        .await
        .map_err(budget_error)?;

    Ok(Json(reps::SavedBudget {
        message: "Budget updated",
        budget: budget.into(),
    }))
}

pub(super) async fn delete_budget(
    session: Session,
    State(ledger_service): State<LedgerService>,
    payload: Result<Json<reps::BudgetIdRequest>, JsonRejection>,
) -> ApiResponse<Json<reps::Message>> {
    let Json(request) = payload?;
    let budget_id = request
        .id
        .ok_or_else(|| ApiError::bad_request("Budget ID is required"))?;

    match ledger_service
        .delete_budget(session.user_id(), budget_id)
        .await
    {
        Ok(true) => Ok(Json(reps::Message {
            message: "Budget deleted successfully",
        })),
        Ok(false) => Err(ApiError::not_found("Budget not found or unauthorized")),
        Err(error) => {
            error!(?error, %budget_id, "Failed to delete budget.");

            Err(ApiError::InternalServerError)
        }
    }
}
