use std::{convert::TryFrom, sync::Arc};

use anyhow::Context;
use semval::ValidatedFrom;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    models,
    rate_limit::{RateLimitResult, RateLimiter},
    repos::{DynUserRepo, UserPersistenceError},
};

use super::domain::{
    email::Email,
    users::{NewUser, NewUserData, NewUserInvalidity, User},
};

pub type DynRateLimiter = Arc<dyn RateLimiter>;

/// Signup and login attempts allowed per client and minute.
const MAX_ATTEMPTS_PER_MINUTE: u64 = 10;

#[derive(Debug, Error)]
pub enum CreateUserError {
    /// The provided user data is invalid.
    #[error("invalid user data: {0:?}")]
    InvalidUser(semval::context::Context<NewUserInvalidity>),

    #[error("email address is already registered")]
    DuplicateEmail,

    /// The operation is rate limited for the provided client.
    #[error("operation is rate limited")]
    RateLimited(RateLimitResult),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
    /// The email address is unknown or the password does not match. The two
    /// cases are deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("operation is rate limited")]
    RateLimited(RateLimitResult),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A service object providing functionality relating to users.
#[derive(Clone)]
pub struct UserService {
    rate_limiter: DynRateLimiter,
    user_repo: DynUserRepo,
}

impl UserService {
    /// Create a new user service.
    ///
    /// # Arguments
    ///
    /// * `rate_limiter` - The rate limiter to use for rate limited operations.
    /// * `user_repo` - The repository used to persist and query user
    ///   information.
    ///
    /// # Returns
    ///
    /// A new [`UserService`] instance.
    pub fn new(rate_limiter: DynRateLimiter, user_repo: DynUserRepo) -> Self {
        Self {
            rate_limiter,
            user_repo,
        }
    }

    fn check_rate_limit(&self, key: &str) -> anyhow::Result<RateLimitResult> {
        self.rate_limiter
            .is_limited(key, MAX_ATTEMPTS_PER_MINUTE)
            .context("Failed to query rate limiter.")
    }

    /// Register a new user.
    ///
    /// # Arguments
    ///
    /// * `client_identifier` - A unique identifier for the client performing
    ///   the operation. This is used for rate limiting.
    /// * `new_user_data` - The new user's information.
    pub async fn create_user(
        &self,
        client_identifier: &str,
        new_user_data: NewUserData,
    ) -> Result<User, CreateUserError> {
        let rate_limit_key = format!("/auth/signup_post_{}", client_identifier);
        if let limited @ RateLimitResult::LimitedUntil(_) = self.check_rate_limit(&rate_limit_key)? {
            return Err(CreateUserError::RateLimited(limited));
        }

        let new_user = NewUser::validated_from(new_user_data)
            .map_err(|(_, context)| CreateUserError::InvalidUser(context))?;

        let user_model = models::NewUserModel::try_from(&new_user)
            .context("Failed to convert from domain to model.")?;

        match self.user_repo.persist_new_user(&user_model).await {
            Ok(user) => {
                info!(user_id = %user.id, "Registered new user.");

                Ok(user)
            }
            Err(UserPersistenceError::DuplicateEmail(_)) => Err(CreateUserError::DuplicateEmail),
            Err(UserPersistenceError::Other(error)) => Err(error.into()),
        }
    }

    /// Verify a user's email address and password.
    pub async fn authenticate(
        &self,
        client_identifier: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthenticationError> {
        let rate_limit_key = format!("/auth/login_post_{}", client_identifier);
        if let limited @ RateLimitResult::LimitedUntil(_) = self.check_rate_limit(&rate_limit_key)? {
            return Err(AuthenticationError::RateLimited(limited));
        }

        let email =
            Email::validated_from(email).map_err(|_| AuthenticationError::InvalidCredentials)?;

        let credentials = self
            .user_repo
            .find_credentials_by_email(email.address())
            .await?
            .ok_or(AuthenticationError::InvalidCredentials)?;

        if credentials
            .password_hash
            .verify(password)
            .context("Failed to compare password and hash.")?
        {
            debug!(user_id = %credentials.user.id, "Validated user credentials.");

            Ok(credentials.user)
        } else {
            Err(AuthenticationError::InvalidCredentials)
        }
    }

    pub async fn get_user(&self, user_id: Uuid) -> anyhow::Result<Option<User>> {
        self.user_repo.get_user(user_id).await
    }
}
