use semval::prelude::*;

/// A user's email address, normalized to lowercase without surrounding
/// whitespace.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Email(String);

impl Email {
    /// Create an unvalidated email.
    ///
    /// This can be useful when constructing an object that contains an email
    /// but has not been validated yet. The address is still normalized.
    ///
    /// # Arguments
    ///
    /// * `address` - The email's address.
    pub fn unvalidated(address: &str) -> Self {
        Self(address.trim().to_lowercase())
    }

    pub fn address(&self) -> &str {
        &self.0
    }

    fn parts(&self) -> Option<(&str, &str)> {
        self.0.rsplit_once('@')
    }

    fn has_local_part(&self) -> bool {
        self.parts().map_or(false, |(local, _)| !local.is_empty())
    }

    fn has_domain(&self) -> bool {
        self.parts().map_or(false, |(_, domain)| {
            domain
                .split('.')
                .filter(|label| !label.is_empty())
                .count()
                >= 2
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EmailInvalidity {
    /// The address does not have a domain portion with at least two labels.
    MissingDomain,

    /// Nothing precedes the `@` symbol.
    MissingLocalPart,

    /// The address is missing the `@` symbol separating the local and domain
    /// parts.
    MissingSeparator,

    ContainsWhitespace,
}

impl Validate for Email {
    type Invalidity = EmailInvalidity;

    fn validate(&self) -> ValidationResult<Self::Invalidity> {
        ValidationContext::new()
            .invalidate_if(!self.0.contains('@'), EmailInvalidity::MissingSeparator)
            .invalidate_if(!self.has_local_part(), EmailInvalidity::MissingLocalPart)
            .invalidate_if(!self.has_domain(), EmailInvalidity::MissingDomain)
            .invalidate_if(
                self.0.chars().any(char::is_whitespace),
                EmailInvalidity::ContainsWhitespace,
            )
            .into()
    }
}

impl ValidatedFrom<&str> for Email {
    fn validated_from(from: &str) -> ValidatedResult<Self> {
        let into = Self::unvalidated(from);

        match into.validate() {
            Ok(()) => Ok(into),
            Err(context) => Err((into, context)),
        }
    }
}
