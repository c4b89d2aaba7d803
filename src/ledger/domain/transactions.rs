use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use semval::prelude::*;
use serde::{de, Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::categories::CategoryRef;

/// Whether money came in or went out.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

/// The spending bucket an expense belongs to.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpendingType {
    Needs,
    Wants,
    Savings,
}

#[derive(Debug, Error)]
#[error("unrecognized {kind} {value:?}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl FromStr for TransactionType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(UnknownVariant {
                kind: "transaction type",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SpendingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Needs => "needs",
            Self::Wants => "wants",
            Self::Savings => "savings",
        }
    }
}

impl FromStr for SpendingType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "needs" => Ok(Self::Needs),
            "wants" => Ok(Self::Wants),
            "savings" => Ok(Self::Savings),
            other => Err(UnknownVariant {
                kind: "spending type",
                value: other.to_owned(),
            }),
        }
    }
}

/// A transaction that has been persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub category_id: Uuid,
    pub category_name: String,
    pub kind: TransactionType,
    pub spending_type: Option<SpendingType>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A transaction ready to be persisted. Its category has already been
/// resolved to an ID belonging to the same user.
#[derive(Clone, Debug, PartialEq)]
pub struct NewTransaction {
    pub user_id: Uuid,
    pub amount: Decimal,
    pub category_id: Uuid,
    pub kind: TransactionType,
    pub spending_type: Option<SpendingType>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Transaction data provided by a user.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransactionData {
    pub amount: Decimal,

    /// Either an RFC 3339 timestamp or a plain `YYYY-MM-DD` date, which is
    /// taken as midnight UTC.
    #[serde(deserialize_with = "deserialize_occurred_at")]
    pub date: DateTime<Utc>,

    #[serde(default)]
    pub description: Option<String>,

    /// The ID of an existing category, or the name of a category.
    pub category_id: String,

    #[serde(rename = "type")]
    pub kind: TransactionType,

    #[serde(default)]
    pub spending_type: Option<SpendingType>,
}

/// Parse the timestamp of a transaction as provided by a user.
pub fn parse_occurred_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

fn deserialize_occurred_at<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;

    parse_occurred_at(&raw).ok_or_else(|| {
        de::Error::custom(format!(
            "invalid date {:?}, expected YYYY-MM-DD or an RFC 3339 timestamp",
            raw
        ))
    })
}

/// A validated transaction whose category is still a reference by ID or
/// name.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionDraft {
    amount: Decimal,
    occurred_at: DateTime<Utc>,
    description: Option<String>,
    category: CategoryRef,
    kind: TransactionType,
    spending_type: Option<SpendingType>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransactionInvalidity {
    /// Amounts must be strictly positive. The transaction type carries the
    /// direction.
    NonPositiveAmount,
    /// Expenses must be classified as needs, wants or savings.
    MissingSpendingType,
    /// The category reference is empty.
    BlankCategory,
}

impl TransactionInvalidity {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount => "Amount must be greater than zero.",
            Self::MissingSpendingType => "Expenses require a spending type of needs, wants, or savings.",
            Self::BlankCategory => "A category ID or name is required.",
        }
    }
}

impl Validate for TransactionDraft {
    type Invalidity = TransactionInvalidity;

    fn validate(&self) -> ValidationResult<Self::Invalidity> {
        ValidationContext::new()
            .invalidate_if(
                self.amount <= Decimal::ZERO,
                TransactionInvalidity::NonPositiveAmount,
            )
            .invalidate_if(
                self.kind == TransactionType::Expense && self.spending_type.is_none(),
                TransactionInvalidity::MissingSpendingType,
            )
            .invalidate_if(self.category.is_blank(), TransactionInvalidity::BlankCategory)
            .into()
    }
}

impl ValidatedFrom<NewTransactionData> for TransactionDraft {
    fn validated_from(from: NewTransactionData) -> ValidatedResult<Self> {
        let into = Self {
            amount: from.amount,
            occurred_at: from.date,
            description: from
                .description
                .map(|description| description.trim().to_owned())
                .filter(|description| !description.is_empty()),
            category: CategoryRef::parse(&from.category_id),
            kind: from.kind,
            // The spending bucket only classifies expenses.
            spending_type: match from.kind {
                TransactionType::Income => None,
                TransactionType::Expense => from.spending_type,
            },
        };

        match into.validate() {
            Ok(()) => Ok(into),
            Err(context) => Err((into, context)),
        }
    }
}

impl TransactionDraft {
    pub fn category(&self) -> &CategoryRef {
        &self.category
    }

    /// Finish the draft once its category has been resolved.
    pub fn into_new_transaction(self, user_id: Uuid, category_id: Uuid) -> NewTransaction {
        NewTransaction {
            user_id,
            amount: self.amount,
            category_id,
            kind: self.kind,
            spending_type: self.spending_type,
            description: self.description,
            occurred_at: self.occurred_at,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn expense_data() -> NewTransactionData {
        NewTransactionData {
            amount: Decimal::new(4250, 2),
            date: Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap(),
            description: Some("  Weekly groceries ".to_owned()),
            category_id: "Food".to_owned(),
            kind: TransactionType::Expense,
            spending_type: Some(SpendingType::Needs),
        }
    }

    #[test]
    fn deserialize_plain_date_as_midnight_utc() {
        let data: NewTransactionData = serde_json::from_str(
            r#"{"amount": 12.5, "date": "2024-03-05", "categoryId": "food", "type": "expense", "spendingType": "wants"}"#,
        )
        .expect("should deserialize");

        assert_eq!(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap(), data.date);
        assert_eq!(Decimal::new(125, 1), data.amount);
        assert_eq!(Some(SpendingType::Wants), data.spending_type);
        assert_eq!(None, data.description);
    }

    #[test]
    fn deserialize_rfc3339_timestamp() {
        let data: NewTransactionData = serde_json::from_str(
            r#"{"amount": "1000", "date": "2024-03-01T09:30:00+02:00", "categoryId": "salary", "type": "income"}"#,
        )
        .expect("should deserialize");

        assert_eq!(Utc.with_ymd_and_hms(2024, 3, 1, 7, 30, 0).unwrap(), data.date);
        assert_eq!(TransactionType::Income, data.kind);
    }

    #[test]
    fn deserialize_rejects_unknown_type_and_bad_date() {
        assert!(serde_json::from_str::<NewTransactionData>(
            r#"{"amount": 1, "date": "2024-03-01", "categoryId": "x", "type": "transfer"}"#
        )
        .is_err());
        assert!(serde_json::from_str::<NewTransactionData>(
            r#"{"amount": 1, "date": "yesterday", "categoryId": "x", "type": "income"}"#
        )
        .is_err());
    }

    #[test]
    fn valid_expense_draft() {
        let draft = TransactionDraft::validated_from(expense_data()).expect("should be valid");

        assert_eq!(&CategoryRef::Name("food".to_owned()), draft.category());

        let user_id = Uuid::new_v4();
        let category_id = Uuid::new_v4();
        let transaction = draft.into_new_transaction(user_id, category_id);

        assert_eq!(user_id, transaction.user_id);
        assert_eq!(category_id, transaction.category_id);
        assert_eq!(Some("Weekly groceries".to_owned()), transaction.description);
        assert_eq!(Some(SpendingType::Needs), transaction.spending_type);
    }

    #[test]
    fn expense_requires_spending_type() {
        let data = NewTransactionData {
            spending_type: None,
            ..expense_data()
        };

        let (_, context) = TransactionDraft::validated_from(data).expect_err("should be invalid");
        let invalidities = context.into_iter().collect::<Vec<_>>();

        assert_eq!(vec![TransactionInvalidity::MissingSpendingType], invalidities);
    }

    #[test]
    fn income_drops_spending_type() {
        let data = NewTransactionData {
            kind: TransactionType::Income,
            spending_type: Some(SpendingType::Savings),
            ..expense_data()
        };

        let transaction = TransactionDraft::validated_from(data)
            .expect("should be valid")
            .into_new_transaction(Uuid::new_v4(), Uuid::new_v4());

        assert_eq!(None, transaction.spending_type);
    }

    #[test]
    fn rejects_non_positive_amount_and_blank_category() {
        let data = NewTransactionData {
            amount: Decimal::ZERO,
            category_id: "   ".to_owned(),
            ..expense_data()
        };

        let (_, context) = TransactionDraft::validated_from(data).expect_err("should be invalid");
        let invalidities = context.into_iter().collect::<Vec<_>>();

        assert_eq!(
            vec![
                TransactionInvalidity::NonPositiveAmount,
                TransactionInvalidity::BlankCategory
            ],
            invalidities
        );
    }

    #[test]
    fn type_round_trips_through_str() {
        assert_eq!(TransactionType::Expense, "expense".parse().unwrap());
        assert_eq!(SpendingType::Savings, "savings".parse().unwrap());
        assert!("luxuries".parse::<SpendingType>().is_err());
    }
}
