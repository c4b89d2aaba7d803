use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use semval::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use super::{categories::normalize_name, month::Month};

/// A spending limit for one category during one month.
#[derive(Clone, Debug, PartialEq)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    /// The normalized name of the budgeted category.
    pub category: String,
    pub amount: Decimal,
    pub month: Month,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Budget data as provided by a user. Every field is optional so that
/// missing fields can be reported with a single message.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewBudgetData {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub month: Option<Month>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewBudget {
    pub category: String,
    pub amount: Decimal,
    pub month: Month,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BudgetInvalidity {
    MissingField,
    NonPositiveAmount,
}

impl BudgetInvalidity {
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingField => "All fields are required",
            Self::NonPositiveAmount => "Budget amount must be greater than zero.",
        }
    }
}

impl Validate for NewBudget {
    type Invalidity = BudgetInvalidity;

    fn validate(&self) -> ValidationResult<Self::Invalidity> {
        ValidationContext::new()
            .invalidate_if(self.category.is_empty(), BudgetInvalidity::MissingField)
            .invalidate_if(
                self.amount <= Decimal::ZERO,
                BudgetInvalidity::NonPositiveAmount,
            )
            .into()
    }
}

impl ValidatedFrom<NewBudgetData> for NewBudget {
    fn validated_from(from: NewBudgetData) -> ValidatedResult<Self> {
        let category = from
            .category
            .as_deref()
            .map(normalize_name)
            .unwrap_or_default();

        match (from.amount, from.month) {
            (Some(amount), Some(month)) => {
                let into = Self {
                    category,
                    amount,
                    month,
                };

                match into.validate() {
                    Ok(()) => Ok(into),
                    Err(context) => Err((into, context)),
                }
            }
            (amount, month) => {
                let into = Self {
                    category,
                    amount: amount.unwrap_or_default(),
                    month: month.unwrap_or_else(Month::current),
                };
                let context = ValidationContext::new()
                    .invalidate_if(true, BudgetInvalidity::MissingField);

                Err((into, context))
            }
        }
    }
}

/// A partial update to an existing budget.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BudgetChanges {
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub month: Option<Month>,
}

impl Validate for BudgetChanges {
    type Invalidity = BudgetInvalidity;

    fn validate(&self) -> ValidationResult<Self::Invalidity> {
        ValidationContext::new()
            .invalidate_if(
                self.amount.map_or(false, |amount| amount <= Decimal::ZERO),
                BudgetInvalidity::NonPositiveAmount,
            )
            .into()
    }
}

impl ValidatedFrom<NewBudgetData> for BudgetChanges {
    fn validated_from(from: NewBudgetData) -> ValidatedResult<Self> {
        let into = Self {
            category: from
                .category
                .as_deref()
                .map(normalize_name)
                .filter(|category| !category.is_empty()),
            amount: from.amount,
            month: from.month,
        };

        match into.validate() {
            Ok(()) => Ok(into),
            Err(context) => Err((into, context)),
        }
    }
}

impl BudgetChanges {
    pub fn apply(self, budget: &mut Budget) {
        if let Some(category) = self.category {
            budget.category = category;
        }
        if let Some(amount) = self.amount {
            budget.amount = amount;
        }
        if let Some(month) = self.month {
            budget.month = month;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn data() -> NewBudgetData {
        NewBudgetData {
            category: Some(" Food ".to_owned()),
            amount: Some(Decimal::from(500)),
            month: Some(Month::new(2024, 3).unwrap()),
        }
    }

    #[test]
    fn new_budget_normalizes_category() {
        let budget = NewBudget::validated_from(data()).expect("should be valid");

        assert_eq!("food", budget.category);
        assert_eq!(Decimal::from(500), budget.amount);
        assert_eq!("2024-03", budget.month.to_string());
    }

    #[test]
    fn new_budget_requires_every_field() {
        for data in [
            NewBudgetData {
                category: None,
                ..data()
            },
            NewBudgetData {
                category: Some("   ".to_owned()),
                ..data()
            },
            NewBudgetData {
                amount: None,
                ..data()
            },
            NewBudgetData {
                month: None,
                ..data()
            },
        ] {
            let (_, context) = NewBudget::validated_from(data).expect_err("should be invalid");

            assert_eq!(
                vec![BudgetInvalidity::MissingField],
                context.into_iter().collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn new_budget_rejects_negative_amount() {
        let data = NewBudgetData {
            amount: Some(Decimal::from(-5)),
            ..data()
        };

        let (_, context) = NewBudget::validated_from(data).expect_err("should be invalid");

        assert_eq!(
            vec![BudgetInvalidity::NonPositiveAmount],
            context.into_iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn deserialize_rejects_malformed_month() {
        assert!(serde_json::from_str::<NewBudgetData>(
            r#"{"category": "food", "amount": 10, "month": "March"}"#
        )
        .is_err());
    }

    #[test]
    fn changes_apply_only_provided_fields() {
        let now = Utc::now();
        let mut budget = Budget {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            category: "food".to_owned(),
            amount: Decimal::from(500),
            month: Month::new(2024, 3).unwrap(),
            created_at: now,
            updated_at: now,
        };

        let changes = BudgetChanges::validated_from(NewBudgetData {
            amount: Some(Decimal::from(650)),
            ..Default::default()
        })
        .expect("should be valid");
        changes.apply(&mut budget);

        assert_eq!("food", budget.category);
        assert_eq!(Decimal::from(650), budget.amount);
        assert_eq!(Month::new(2024, 3).unwrap(), budget.month);
    }
}
