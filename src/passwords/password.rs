use std::fmt::Debug;

use semval::prelude::*;

const MAX_PASSWORD_LENGTH: usize = 512;
const MIN_PASSWORD_LENGTH: usize = 8;

/// A user's password.
pub struct Password(String);

impl Password {
    /// Construct an unvalidated password.
    ///
    /// This can be useful when constructing an object that contains a password
    /// so that the object can be validated as a whole.
    ///
    /// # Arguments
    ///
    /// * `password` - The password to store.
    pub fn unvalidated(password: String) -> Self {
        Self(password)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    fn contains(&self, predicate: impl Fn(char) -> bool) -> bool {
        self.0.chars().any(predicate)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PasswordInvalidity {
    /// The provided value exceeds the maximum allowable length for a password.
    /// The max length is contained as a value.
    MaxLength(usize),
    /// The provided value is smaller than the minimum allowable length for a
    /// password. The min length is contained as a value.
    MinLength(usize),
    MissingLowercase,
    MissingUppercase,
    MissingDigit,
    /// Passwords need at least one character that is neither a letter, a
    /// digit, nor whitespace.
    MissingSymbol,
}

impl PasswordInvalidity {
    pub fn message(&self) -> String {
        match self {
            Self::MaxLength(max) => format!(
                "Passwords may not contain more than {} characters.",
                max
            ),
            Self::MinLength(min) => {
                format!("Passwords must contain at least {} characters.", min)
            }
            Self::MissingLowercase => "Passwords must contain a lowercase letter.".to_owned(),
            Self::MissingUppercase => "Passwords must contain an uppercase letter.".to_owned(),
            Self::MissingDigit => "Passwords must contain a digit.".to_owned(),
            Self::MissingSymbol => "Passwords must contain a symbol.".to_owned(),
        }
    }
}

impl Validate for Password {
    type Invalidity = PasswordInvalidity;

    fn validate(&self) -> ValidationResult<Self::Invalidity> {
        let length = self.0.chars().count();

        ValidationContext::new()
            .invalidate_if(
                length < MIN_PASSWORD_LENGTH,
                PasswordInvalidity::MinLength(MIN_PASSWORD_LENGTH),
            )
            .invalidate_if(
                length > MAX_PASSWORD_LENGTH,
                PasswordInvalidity::MaxLength(MAX_PASSWORD_LENGTH),
            )
            .invalidate_if(
                !self.contains(char::is_lowercase),
                PasswordInvalidity::MissingLowercase,
            )
            .invalidate_if(
                !self.contains(char::is_uppercase),
                PasswordInvalidity::MissingUppercase,
            )
            .invalidate_if(
                !self.contains(|c| c.is_ascii_digit()),
                PasswordInvalidity::MissingDigit,
            )
            .invalidate_if(
                !self.contains(|c| !c.is_alphanumeric() && !c.is_whitespace()),
                PasswordInvalidity::MissingSymbol,
            )
            .into()
    }
}

impl ValidatedFrom<&str> for Password {
    fn validated_from(from: &str) -> ValidatedResult<Self> {
        let into = Password(from.to_owned());

        match into.validate() {
            Ok(_) => Ok(into),
            Err(context) => Err((into, context)),
        }
    }
}

impl Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't include the raw password in debug output.
        f.debug_tuple("Password").field(&"*".repeat(8)).finish()
    }
}
