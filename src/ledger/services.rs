use semval::{context::Context as ValidationContext, ValidatedFrom};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::repos::{
    CategoryPersistenceError, DynBudgetRepo, DynCategoryRepo, DynTransactionRepo,
    TransactionQuery,
};

use super::domain::{
    budgets::{Budget, BudgetChanges, BudgetInvalidity, NewBudget, NewBudgetData},
    categories::{normalize_name, Category, CategoryRef},
    transactions::{
        NewTransactionData, Transaction, TransactionDraft, TransactionInvalidity, TransactionType,
    },
};

/// The number of transactions returned by the "recent" listings.
pub const RECENT_TRANSACTION_COUNT: u32 = 3;

#[derive(Debug, Error)]
pub enum CreateTransactionError {
    #[error("no transactions provided")]
    Empty,

    /// One of the transactions in the batch is invalid. Nothing was saved.
    #[error("invalid transaction at position {index}: {context:?}")]
    InvalidTransaction {
        index: usize,
        context: ValidationContext<TransactionInvalidity>,
    },

    /// A category was referenced by an ID that the user does not own.
    #[error("invalid category ID: {0}")]
    InvalidCategory(Uuid),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum UpdateTransactionError {
    #[error("invalid transaction: {0:?}")]
    InvalidTransaction(ValidationContext<TransactionInvalidity>),

    #[error("category not found")]
    CategoryNotFound,

    #[error("transaction not found")]
    TransactionNotFound,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum CreateCategoryError {
    #[error("category name is blank")]
    BlankName,

    #[error("category already exists: {0:?}")]
    DuplicateName(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<CategoryPersistenceError> for CreateCategoryError {
    fn from(error: CategoryPersistenceError) -> Self {
        match error {
            CategoryPersistenceError::DuplicateName(name) => Self::DuplicateName(name),
            CategoryPersistenceError::Other(error) => Self::Other(error),
        }
    }
}

#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("invalid budget: {0:?}")]
    InvalidBudget(ValidationContext<BudgetInvalidity>),

    #[error("budget not found")]
    BudgetNotFound,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Bookkeeping operations on a user's transactions, categories and budgets.
#[derive(Clone)]
pub struct LedgerService {
    budget_repo: DynBudgetRepo,
    category_repo: DynCategoryRepo,
    transaction_repo: DynTransactionRepo,
}

impl LedgerService {
    pub fn new(
        budget_repo: DynBudgetRepo,
        category_repo: DynCategoryRepo,
        transaction_repo: DynTransactionRepo,
    ) -> Self {
        Self {
            budget_repo,
            category_repo,
            transaction_repo,
        }
    }

    /// Find an existing category a user referred to.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The owner of the category.
    /// * `category` - The category ID or name provided by the user.
    ///
    /// # Returns
    ///
    /// The referenced category, or [`None`] if the user has no such category.
    pub async fn resolve_category(
        &self,
        user_id: Uuid,
        category: &CategoryRef,
    ) -> anyhow::Result<Option<Category>> {
        match category {
            CategoryRef::Id(category_id) => {
                self.category_repo.get_category(user_id, *category_id).await
            }
            CategoryRef::Name(name) => self.category_repo.find_category_by_name(user_id, name).await,
        }
    }

    /// Record a batch of transactions.
    ///
    /// Every transaction is validated and every category ID checked before
    /// anything is saved. Categories referenced by name are created if they
    /// don't exist yet, atomically with the transactions themselves.
    pub async fn create_transactions(
        &self,
        user_id: Uuid,
        batch: Vec<NewTransactionData>,
    ) -> Result<Vec<Transaction>, CreateTransactionError> {
        if batch.is_empty() {
            return Err(CreateTransactionError::Empty);
        }

        let drafts = batch
            .into_iter()
            .enumerate()
            .map(|(index, data)| {
                TransactionDraft::validated_from(data).map_err(|(_, context)| {
                    CreateTransactionError::InvalidTransaction { index, context }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Unknown IDs fail the batch before any category gets created by name.
        for draft in &drafts {
            if let CategoryRef::Id(category_id) = draft.category() {
                if self
                    .category_repo
                    .get_category(user_id, *category_id)
                    .await?
                    .is_none()
                {
                    return Err(CreateTransactionError::InvalidCategory(*category_id));
                }
            }
        }

        let saved = self
            .transaction_repo
            .insert_transactions(user_id, &drafts)
            .await?;

        info!(%user_id, count = saved.len(), "Recorded transactions.");

        Ok(saved)
    }

    /// Replace the contents of a transaction. Unlike creation, the category
    /// must already exist.
    pub async fn update_transaction(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
        data: NewTransactionData,
    ) -> Result<Transaction, UpdateTransactionError> {
        let draft = TransactionDraft::validated_from(data)
            .map_err(|(_, context)| UpdateTransactionError::InvalidTransaction(context))?;

        let category = self
            .resolve_category(user_id, draft.category())
            .await?
            .ok_or(UpdateTransactionError::CategoryNotFound)?;

        let transaction = draft.into_new_transaction(user_id, category.id);

        match self
            .transaction_repo
            .update_transaction(transaction_id, &transaction)
            .await?
        {
            Some(updated) => {
                info!(%user_id, %transaction_id, "Updated transaction.");

                Ok(updated)
            }
            None => Err(UpdateTransactionError::TransactionNotFound),
        }
    }

    pub async fn list_transactions(
        &self,
        query: &TransactionQuery,
    ) -> anyhow::Result<Vec<Transaction>> {
        debug!(user_id = %query.user_id, ?query, "Listing transactions.");

        self.transaction_repo.list_transactions(query).await
    }

    /// List a user's newest transactions of one type.
    pub async fn recent_transactions(
        &self,
        user_id: Uuid,
        kind: TransactionType,
    ) -> anyhow::Result<Vec<Transaction>> {
        let query = TransactionQuery {
            kind: Some(kind),
            limit: RECENT_TRANSACTION_COUNT,
            ..TransactionQuery::for_user(user_id)
        };

        self.transaction_repo.list_transactions(&query).await
    }

    /// Delete one of a user's transactions.
    ///
    /// Returns `false` if the user has no such transaction.
    pub async fn delete_transaction(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> anyhow::Result<bool> {
        let deleted = self
            .transaction_repo
            .delete_transaction(user_id, transaction_id)
            .await?;

        if deleted {
            info!(%user_id, %transaction_id, "Deleted transaction.");
        }

        Ok(deleted)
    }

    pub async fn list_categories(&self, user_id: Uuid) -> anyhow::Result<Vec<Category>> {
        self.category_repo.list_categories(user_id).await
    }

    pub async fn create_category(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<Category, CreateCategoryError> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Err(CreateCategoryError::BlankName);
        }

        let category = self.category_repo.create_category(user_id, &name).await?;

        info!(%user_id, category_id = %category.id, "Created category.");

        Ok(category)
    }

    pub async fn list_budgets(&self, user_id: Uuid) -> anyhow::Result<Vec<Budget>> {
        self.budget_repo.list_budgets(user_id).await
    }

    pub async fn create_budget(
        &self,
        user_id: Uuid,
        data: NewBudgetData,
    ) -> Result<Budget, BudgetError> {
        let new_budget = NewBudget::validated_from(data)
            .map_err(|(_, context)| BudgetError::InvalidBudget(context))?;

        let budget = self.budget_repo.create_budget(user_id, &new_budget).await?;

        info!(%user_id, budget_id = %budget.id, month = %budget.month, "Created budget.");

        Ok(budget)
    }

    /// Apply a partial update to one of a user's budgets.
    pub async fn update_budget(
        &self,
        user_id: Uuid,
        budget_id: Uuid,
        data: NewBudgetData,
    ) -> Result<Budget, BudgetError> {
        let changes = BudgetChanges::validated_from(data)
            .map_err(|(_, context)| BudgetError::InvalidBudget(context))?;

        let mut budget = self
            .budget_repo
            .get_budget(user_id, budget_id)
            .await?
            .ok_or(BudgetError::BudgetNotFound)?;
        changes.apply(&mut budget);

        let updated = self
            .budget_repo
            .update_budget(&budget)
            .await?
            .ok_or(BudgetError::BudgetNotFound)?;

        info!(%user_id, %budget_id, "Updated budget.");

        Ok(updated)
    }

    pub async fn delete_budget(&self, user_id: Uuid, budget_id: Uuid) -> anyhow::Result<bool> {
        self.budget_repo.delete_budget(user_id, budget_id).await
    }
}
