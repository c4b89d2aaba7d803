use anyhow::Result;
use chrono::{DateTime, Utc};
use semval::prelude::*;
use uuid::Uuid;

use crate::passwords::{self, Password, PasswordInvalidity};

use super::email::{Email, EmailInvalidity};

const MIN_NAME_LENGTH: usize = 4;
const MAX_NAME_LENGTH: usize = 49;

#[derive(Debug)]
pub struct NewUser {
    id: Uuid,
    name: String,
    email: Email,
    password: Password,
}

impl NewUser {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password_hash(&self) -> Result<passwords::Hash> {
        passwords::Hash::new(&self.password)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NameInvalidity {
    MinLength(usize),
    MaxLength(usize),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NewUserInvalidity {
    Name(NameInvalidity),
    Email(EmailInvalidity),
    Password(PasswordInvalidity),
}

impl Validate for NewUser {
    type Invalidity = NewUserInvalidity;

    fn validate(&self) -> ValidationResult<Self::Invalidity> {
        let name_length = self.name.chars().count();

        ValidationContext::new()
            .invalidate_if(
                name_length < MIN_NAME_LENGTH,
                NewUserInvalidity::Name(NameInvalidity::MinLength(MIN_NAME_LENGTH)),
            )
            .invalidate_if(
                name_length > MAX_NAME_LENGTH,
                NewUserInvalidity::Name(NameInvalidity::MaxLength(MAX_NAME_LENGTH)),
            )
            .validate_with(&self.email, NewUserInvalidity::Email)
            .validate_with(&self.password, NewUserInvalidity::Password)
            .into()
    }
}

#[derive(Clone, Debug)]
pub struct NewUserData {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl ValidatedFrom<NewUserData> for NewUser {
    fn validated_from(from: NewUserData) -> ValidatedResult<Self> {
        let into = NewUser {
            id: Uuid::new_v4(),
            name: from.name.trim().to_owned(),
            email: Email::unvalidated(&from.email),
            password: Password::unvalidated(from.password),
        };

        match into.validate() {
            Ok(()) => Ok(into),
            Err(context) => Err((into, context)),
        }
    }
}

/// A registered user.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_premium: bool,
    pub membership_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user along with the hash used to verify their password.
#[derive(Clone, Debug)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: passwords::Hash,
}

#[cfg(test)]
mod tests {

    use super::*;

    fn data() -> NewUserData {
        NewUserData {
            name: "Alice Example".to_owned(),
            email: "Alice@Example.com".to_owned(),
            password: "Correct-Horse-9".to_owned(),
        }
    }

    #[test]
    pub fn validated_from_valid() -> Result<()> {
        let new_user = NewUser::validated_from(data()).expect("user should be valid");

        assert_eq!("Alice Example", new_user.name());
        assert_eq!("alice@example.com", new_user.email().address());
        assert!(new_user
            .password_hash()?
            .verify("Correct-Horse-9")?);

        Ok(())
    }

    #[test]
    fn validated_from_short_name() {
        let data = NewUserData {
            name: " Bob ".to_owned(),
            ..data()
        };

        let (_, context) = NewUser::validated_from(data).expect_err("name is too short");
        let invalidities = context.into_iter().collect::<Vec<_>>();

        assert_eq!(
            vec![NewUserInvalidity::Name(NameInvalidity::MinLength(4))],
            invalidities
        );
    }

    #[test]
    fn validated_from_long_name() {
        let data = NewUserData {
            name: "x".repeat(50),
            ..data()
        };

        let (_, context) = NewUser::validated_from(data).expect_err("name is too long");
        let invalidities = context.into_iter().collect::<Vec<_>>();

        assert_eq!(
            vec![NewUserInvalidity::Name(NameInvalidity::MaxLength(49))],
            invalidities
        );
    }

    #[test]
    fn validated_from_collects_every_invalidity() {
        let data = NewUserData {
            name: "Al".to_owned(),
            email: "not-an-email".to_owned(),
            password: "weak".to_owned(),
        };

        let (_, context) = NewUser::validated_from(data).expect_err("everything is invalid");
        let invalidities = context.into_iter().collect::<Vec<_>>();

        assert!(invalidities.contains(&NewUserInvalidity::Name(NameInvalidity::MinLength(4))));
        assert!(invalidities.contains(&NewUserInvalidity::Email(EmailInvalidity::MissingSeparator)));
        assert!(invalidities.contains(&NewUserInvalidity::Password(PasswordInvalidity::MinLength(8))));
    }
}
