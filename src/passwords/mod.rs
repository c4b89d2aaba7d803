//! Hashing and validating user passwords.
mod hash;
mod password;

pub use hash::Hash;
pub use password::{Password, PasswordInvalidity};
