use chrono::{DateTime, Utc};
use semval::context::Context as ValidationContext;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identities::domain::{
    email::EmailInvalidity,
    users::{NameInvalidity, NewUserData, NewUserInvalidity, User},
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email_id: String,
    #[serde(default)]
    password: String,
}

impl From<NewUserRequest> for NewUserData {
    fn from(rep: NewUserRequest) -> Self {
        Self {
            name: rep.name,
            email: rep.email_id,
            password: rep.password,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default)]
    pub email_id: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRep {
    pub id: Uuid,
    pub name: String,
    pub email_id: String,
    pub is_premium: bool,
    pub membership_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserRep {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email_id: user.email,
            is_premium: user.is_premium,
            membership_type: user.membership_type,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub data: UserRep,
}

#[derive(Serialize)]
pub struct CurrentUser {
    pub user: UserRep,
}

fn email_message(invalidity: EmailInvalidity) -> &'static str {
    match invalidity {
        EmailInvalidity::MissingDomain => "Email is missing a domain.",
        EmailInvalidity::MissingLocalPart => "Email is missing a name before the '@' symbol.",
        EmailInvalidity::MissingSeparator => "Email is missing an '@' symbol.",
        EmailInvalidity::ContainsWhitespace => "Email may not contain whitespace.",
    }
}

/// Describe every problem with a signup request in a single message.
pub fn describe_invalid_user(validation: ValidationContext<NewUserInvalidity>) -> String {
    validation
        .into_iter()
        .map(|invalidity| match invalidity {
            NewUserInvalidity::Name(NameInvalidity::MinLength(min)) => {
                format!("Name must contain at least {} characters.", min)
            }
            NewUserInvalidity::Name(NameInvalidity::MaxLength(max)) => {
                format!("Name may not contain more than {} characters.", max)
            }
            NewUserInvalidity::Email(email) => email_message(email).to_owned(),
            NewUserInvalidity::Password(password) => password.message(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod test {
    use semval::ValidatedFrom;

    use crate::identities::domain::users::NewUser;

    use super::*;

    #[test]
    fn invalid_user_message_lists_each_problem() {
        let (_, context) = NewUser::validated_from(NewUserData {
            name: "Jo".to_owned(),
            email: "jo@example.com".to_owned(),
            password: "password1!".to_owned(),
        })
        .expect_err("Name and password are invalid");

        assert_eq!(
            "Name must contain at least 4 characters. Passwords must contain an uppercase letter.",
            describe_invalid_user(context)
        );
    }
}
