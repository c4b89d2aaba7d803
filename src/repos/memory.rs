//! An in-memory store implementing every repository trait, used to exercise
//! services and handlers without a database.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    identities::domain::users::{User, UserCredentials},
    ledger::domain::{
        budgets::{Budget, NewBudget},
        categories::{Category, CategoryRef},
        month::{Month, MonthWindow},
        reports::{BucketTotals, CategoryMonthTotal, TypeTotals},
        transactions::{NewTransaction, Transaction, TransactionDraft, TransactionType},
    },
    models::NewUserModel,
    passwords,
};

use super::{
    budgets::BudgetRepo,
    categories::{CategoryPersistenceError, CategoryRepo},
    reports::ReportRepo,
    transactions::{SortField, SortOrder, TransactionQuery, TransactionRepo},
    users::{UserPersistenceError, UserRepo},
};

#[derive(Default)]
struct Tables {
    users: Vec<(User, passwords::Hash)>,
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
    budgets: Vec<Budget>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> anyhow::Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }

    /// Store a category directly.
    pub fn seed_category(&self, user_id: Uuid, name: &str) -> Category {
        let category = Category {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_owned(),
            created_at: Utc::now(),
        };
        self.tables
            .lock()
            .unwrap()
            .categories
            .push(category.clone());

        category
    }

    /// Find a user's category by name, seeding it if it is missing.
    pub fn category_named(&self, user_id: Uuid, name: &str) -> Category {
        let existing = self
            .tables
            .lock()
            .unwrap()
            .categories
            .iter()
            .find(|category| category.user_id == user_id && category.name == name)
            .cloned();

        existing.unwrap_or_else(|| self.seed_category(user_id, name))
    }

    /// Store a transaction directly. The category must have been seeded for
    /// the same user.
    pub fn seed_transaction(&self, transaction: NewTransaction) -> Transaction {
        let mut tables = self.tables.lock().unwrap();
        let stored = tables.build_transaction(Uuid::new_v4(), &transaction).unwrap();
        tables.transactions.push(stored.clone());

        stored
    }

    pub fn transaction_count(&self) -> usize {
        self.tables.lock().unwrap().transactions.len()
    }

    pub fn category_count(&self, user_id: Uuid) -> usize {
        self.tables
            .lock()
            .unwrap()
            .categories
            .iter()
            .filter(|category| category.user_id == user_id)
            .count()
    }
}

impl Tables {
    fn category_name(&self, user_id: Uuid, category_id: Uuid) -> anyhow::Result<String> {
        self.categories
            .iter()
            .find(|category| category.id == category_id && category.user_id == user_id)
            .map(|category| category.name.clone())
            .ok_or_else(|| anyhow!("category {} does not belong to user {}", category_id, user_id))
    }

    fn build_transaction(
        &self,
        id: Uuid,
        transaction: &NewTransaction,
    ) -> anyhow::Result<Transaction> {
        let now = Utc::now();

        Ok(Transaction {
            id,
            user_id: transaction.user_id,
            amount: transaction.amount,
            category_id: transaction.category_id,
            category_name: self.category_name(transaction.user_id, transaction.category_id)?,
            kind: transaction.kind,
            spending_type: transaction.spending_type,
            description: transaction.description.clone(),
            occurred_at: transaction.occurred_at,
            created_at: now,
            updated_at: now,
        })
    }

    fn expenses<'a>(&'a self, user_id: Uuid) -> impl Iterator<Item = &'a Transaction> + 'a {
        self.transactions.iter().filter(move |transaction| {
            transaction.user_id == user_id && transaction.kind == TransactionType::Expense
        })
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn persist_new_user(&self, user: &NewUserModel) -> Result<User, UserPersistenceError> {
        let mut tables = self.tables()?;

        if tables.users.iter().any(|(existing, _)| existing.email == user.email) {
            return Err(UserPersistenceError::DuplicateEmail(user.email.clone()));
        }

        let now = Utc::now();
        let stored = User {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_premium: false,
            membership_type: None,
            created_at: now,
            updated_at: now,
        };
        let hash = passwords::Hash::parse(&user.password_hash)?;
        tables.users.push((stored.clone(), hash));

        Ok(stored)
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> anyhow::Result<Option<UserCredentials>> {
        Ok(self
            .tables()?
            .users
            .iter()
            .find(|(user, _)| user.email == email)
            .map(|(user, hash)| UserCredentials {
                user: user.clone(),
                password_hash: hash.clone(),
            }))
    }

    async fn get_user(&self, user_id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self
            .tables()?
            .users
            .iter()
            .find(|(user, _)| user.id == user_id)
            .map(|(user, _)| user.clone()))
    }
}

#[async_trait]
impl CategoryRepo for MemoryStore {
    async fn list_categories(&self, user_id: Uuid) -> anyhow::Result<Vec<Category>> {
        let mut categories: Vec<Category> = self
            .tables()?
            .categories
            .iter()
            .filter(|category| category.user_id == user_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(categories)
    }

    async fn get_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> anyhow::Result<Option<Category>> {
        Ok(self
            .tables()?
            .categories
            .iter()
            .find(|category| category.id == category_id && category.user_id == user_id)
            .cloned())
    }

    async fn find_category_by_name(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> anyhow::Result<Option<Category>> {
        Ok(self
            .tables()?
            .categories
            .iter()
            .find(|category| category.user_id == user_id && category.name == name)
            .cloned())
    }

    async fn create_category(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<Category, CategoryPersistenceError> {
        if self.find_category_by_name(user_id, name).await?.is_some() {
            return Err(CategoryPersistenceError::DuplicateName(name.to_owned()));
        }

        Ok(self.seed_category(user_id, name))
    }
}

#[async_trait]
impl TransactionRepo for MemoryStore {
    async fn insert_transactions(
        &self,
        user_id: Uuid,
        drafts: &[TransactionDraft],
    ) -> anyhow::Result<Vec<Transaction>> {
        let mut tables = self.tables()?;

        // Work on a copy so a failure part way through leaves nothing behind.
        let mut categories = tables.categories.clone();
        let mut transactions = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let category_id = match draft.category() {
                CategoryRef::Id(category_id) => *category_id,
                CategoryRef::Name(name) => {
                    let existing = categories
                        .iter()
                        .find(|category| category.user_id == user_id && &category.name == name)
                        .map(|category| category.id);

                    match existing {
                        Some(category_id) => category_id,
                        None => {
                            let category = Category {
                                id: Uuid::new_v4(),
                                user_id,
                                name: name.clone(),
                                created_at: Utc::now(),
                            };
                            let category_id = category.id;
                            categories.push(category);

                            category_id
                        }
                    }
                }
            };

            transactions.push(draft.clone().into_new_transaction(user_id, category_id));
        }

        let staged = Tables {
            categories,
            ..Tables::default()
        };
        let stored = transactions
            .iter()
            .map(|transaction| staged.build_transaction(Uuid::new_v4(), transaction))
            .collect::<anyhow::Result<Vec<_>>>()?;

        tables.categories = staged.categories;
        tables.transactions.extend(stored.iter().cloned());

        Ok(stored)
    }

    async fn list_transactions(
        &self,
        query: &TransactionQuery,
    ) -> anyhow::Result<Vec<Transaction>> {
        let tables = self.tables()?;

        let mut matching: Vec<Transaction> = tables
            .transactions
            .iter()
            .filter(|transaction| transaction.user_id == query.user_id)
            .filter(|transaction| query.kind.map_or(true, |kind| transaction.kind == kind))
            .filter(|transaction| {
                query
                    .category_id
                    .map_or(true, |category_id| transaction.category_id == category_id)
            })
            .filter(|transaction| {
                query
                    .date_range
                    .map_or(true, |range| range.contains(transaction.occurred_at))
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let ordering = match query.sort_by {
                SortField::Date => a.occurred_at.cmp(&b.occurred_at),
                SortField::Amount => a.amount.cmp(&b.amount),
            };

            match query.order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });

        Ok(matching
            .into_iter()
            .skip(usize::try_from(query.offset())?)
            .take(usize::try_from(query.limit)?)
            .collect())
    }

    async fn update_transaction(
        &self,
        transaction_id: Uuid,
        transaction: &NewTransaction,
    ) -> anyhow::Result<Option<Transaction>> {
        let mut tables = self.tables()?;

        let index = match tables.transactions.iter().position(|existing| {
            existing.id == transaction_id && existing.user_id == transaction.user_id
        }) {
            Some(index) => index,
            None => return Ok(None),
        };

        let mut updated = tables.build_transaction(transaction_id, transaction)?;
        updated.created_at = tables.transactions[index].created_at;
        tables.transactions[index] = updated.clone();

        Ok(Some(updated))
    }

    async fn delete_transaction(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> anyhow::Result<bool> {
        let mut tables = self.tables()?;
        let before = tables.transactions.len();
        tables
            .transactions
            .retain(|transaction| !(transaction.id == transaction_id && transaction.user_id == user_id));

        Ok(tables.transactions.len() < before)
    }
}

#[async_trait]
impl BudgetRepo for MemoryStore {
    async fn list_budgets(&self, user_id: Uuid) -> anyhow::Result<Vec<Budget>> {
        let mut budgets: Vec<Budget> = self
            .tables()?
            .budgets
            .iter()
            .filter(|budget| budget.user_id == user_id)
            .cloned()
            .collect();
        budgets.sort_by(|a, b| b.month.cmp(&a.month).then_with(|| a.category.cmp(&b.category)));

        Ok(budgets)
    }

    async fn list_budgets_for_month(
        &self,
        user_id: Uuid,
        month: Month,
    ) -> anyhow::Result<Vec<Budget>> {
        let mut budgets: Vec<Budget> = self
            .list_budgets(user_id)
            .await?
            .into_iter()
            .filter(|budget| budget.month == month)
            .collect();
        budgets.sort_by(|a, b| a.category.cmp(&b.category));

        Ok(budgets)
    }

    async fn get_budget(&self, user_id: Uuid, budget_id: Uuid) -> anyhow::Result<Option<Budget>> {
        Ok(self
            .tables()?
            .budgets
            .iter()
            .find(|budget| budget.id == budget_id && budget.user_id == user_id)
            .cloned())
    }

    async fn create_budget(&self, user_id: Uuid, budget: &NewBudget) -> anyhow::Result<Budget> {
        let now = Utc::now();
        let stored = Budget {
            id: Uuid::new_v4(),
            user_id,
            category: budget.category.clone(),
            amount: budget.amount,
            month: budget.month,
            created_at: now,
            updated_at: now,
        };
        self.tables()?.budgets.push(stored.clone());

        Ok(stored)
    }

    async fn update_budget(&self, budget: &Budget) -> anyhow::Result<Option<Budget>> {
        let mut tables = self.tables()?;

        match tables
            .budgets
            .iter_mut()
            .find(|existing| existing.id == budget.id && existing.user_id == budget.user_id)
        {
            Some(existing) => {
                *existing = Budget {
                    updated_at: Utc::now(),
                    ..budget.clone()
                };
                Ok(Some(existing.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_budget(&self, user_id: Uuid, budget_id: Uuid) -> anyhow::Result<bool> {
        let mut tables = self.tables()?;
        let before = tables.budgets.len();
        tables
            .budgets
            .retain(|budget| !(budget.id == budget_id && budget.user_id == user_id));

        Ok(tables.budgets.len() < before)
    }
}

#[async_trait]
impl ReportRepo for MemoryStore {
    async fn type_totals(&self, user_id: Uuid, window: MonthWindow) -> anyhow::Result<TypeTotals> {
        let tables = self.tables()?;

        Ok(TypeTotals::from_rows(
            tables
                .transactions
                .iter()
                .filter(|transaction| {
                    transaction.user_id == user_id && window.contains(transaction.occurred_at)
                })
                .map(|transaction| (transaction.kind, transaction.amount)),
        ))
    }

    async fn bucket_totals(
        &self,
        user_id: Uuid,
        window: MonthWindow,
    ) -> anyhow::Result<BucketTotals> {
        let tables = self.tables()?;

        Ok(BucketTotals::from_rows(
            tables
                .expenses(user_id)
                .filter(|transaction| window.contains(transaction.occurred_at))
                .filter_map(|transaction| {
                    transaction
                        .spending_type
                        .map(|bucket| (bucket, transaction.amount))
                }),
        ))
    }

    async fn category_month_totals(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<CategoryMonthTotal>> {
        let tables = self.tables()?;

        let mut totals: HashMap<(Month, Uuid), CategoryMonthTotal> = HashMap::new();
        for transaction in tables.expenses(user_id) {
            let month = Month::containing(transaction.occurred_at);
            totals
                .entry((month, transaction.category_id))
                .or_insert_with(|| CategoryMonthTotal {
                    month,
                    category_id: transaction.category_id,
                    category_name: transaction.category_name.clone(),
                    total: Decimal::ZERO,
                })
                .total += transaction.amount;
        }

        Ok(totals.into_values().collect())
    }

    async fn monthly_expense_totals(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<(Month, Decimal)>> {
        let tables = self.tables()?;

        Ok(tables
            .expenses(user_id)
            .map(|transaction| (Month::containing(transaction.occurred_at), transaction.amount))
            .collect())
    }

    async fn expense_by_category(
        &self,
        user_id: Uuid,
        window: MonthWindow,
    ) -> anyhow::Result<Vec<(String, Decimal)>> {
        let tables = self.tables()?;

        Ok(tables
            .expenses(user_id)
            .filter(|transaction| window.contains(transaction.occurred_at))
            .map(|transaction| (transaction.category_name.clone(), transaction.amount))
            .collect())
    }
}
