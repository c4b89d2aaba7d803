use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A named grouping of transactions owned by a single user.
#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Normalize a category name for storage and comparison.
///
/// Category names are unique per user regardless of case or surrounding
/// whitespace.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A reference to a category provided by a user, either by ID or by name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CategoryRef {
    Id(Uuid),
    /// A normalized category name.
    Name(String),
}

impl CategoryRef {
    /// Interpret a raw category reference.
    ///
    /// Anything that parses as a UUID is treated as the ID of an existing
    /// category. Everything else is a category name.
    pub fn parse(raw: &str) -> Self {
        match Uuid::parse_str(raw.trim()) {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Name(normalize_name(raw)),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Id(_) => false,
            Self::Name(name) => name.is_empty(),
        }
    }
}
