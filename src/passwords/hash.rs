use std::fmt::{self, Debug};

use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use password_hash::SaltString;
use rand_core::OsRng;

use super::Password;

/// An argon2 hash of a user's password in PHC string format, as stored in
/// the `users.password_hash` column.
#[derive(Clone, Eq, PartialEq)]
pub struct Hash(String);

fn argon2() -> Argon2<'static> {
    Argon2::default()
}

impl Hash {
    /// Hash a password under a freshly generated salt.
    ///
    /// # Arguments
    ///
    /// * `password` - The validated password to hash.
    pub fn new(password: &Password) -> Result<Self> {
        let salt = SaltString::generate(&mut OsRng);

        let phc = argon2()
            .hash_password(password.as_bytes(), salt.as_ref())
            .map_err(|error| anyhow!("failed to hash password: {}", error))?;

        Ok(Self(phc.to_string()))
    }

    /// Restore a hash loaded from storage. Fails if the stored value is not a
    /// PHC string.
    pub fn parse(stored: &str) -> Result<Self> {
        let phc = PasswordHash::new(stored)
            .map_err(|error| anyhow!("stored password hash is malformed: {}", error))?;

        Ok(Self(phc.to_string()))
    }

    /// Check a login attempt against the hash.
    ///
    /// A wrong password is `Ok(false)`. Errors are reserved for hashes that
    /// cannot be verified at all.
    pub fn verify(&self, attempt: &str) -> Result<bool> {
        let phc = PasswordHash::new(&self.0)
            .map_err(|error| anyhow!("stored password hash is malformed: {}", error))?;

        match argon2().verify_password(attempt.as_bytes(), &phc) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(error) => Err(anyhow!("failed to verify password: {}", error)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keeps hashes out of logs that format users or credentials with `?`.
impl Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hash(<redacted>)")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn hash_of(raw_password: &str) -> Hash {
        Hash::new(&Password::unvalidated(raw_password.to_owned()))
            .expect("Password should hash with no validators")
    }

    #[test]
    fn new_hash_verifies_only_its_password() {
        let hash = hash_of("Hunter2!");

        assert!(hash.verify("Hunter2!").expect("Verification should not error"));
        assert!(!hash.verify("hunter2!").expect("Verification should not error"));
    }

    #[test]
    fn stored_hash_round_trips() {
        let hash = hash_of("Correct-Horse-1");

        let restored = Hash::parse(hash.as_str()).expect("Stored hash should parse");

        assert_eq!(hash, restored);
        assert!(restored
            .verify("Correct-Horse-1")
            .expect("Verification should not error"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        assert_ne!(hash_of("Sup3r-Secret"), hash_of("Sup3r-Secret"));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Hash::parse("not a hash").is_err());
    }

    #[test]
    fn debug_output_is_redacted() {
        let hash = hash_of("Sup3r-Secret");

        assert_eq!("Hash(<redacted>)", format!("{:?}", hash));
        assert!(hash.as_str().starts_with("$argon2"));
    }
}
