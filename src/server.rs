use std::{net::SocketAddr, sync::Arc};

use anyhow::{bail, Context};
use axum::{extract::FromRef, Router};
use axum_extra::extract::cookie::Key;
use tracing::{info, warn};

use crate::{
    cors,
    database::PostgresConnection,
    identities::services::{DynRateLimiter, UserService},
    ledger::{domain::month::MonthEndPolicy, reporting::ReportService, services::LedgerService},
    rate_limit::{RedisRateLimiter, Unlimited},
    repos::{BudgetRepo, CategoryRepo, ReportRepo, TransactionRepo, UserRepo},
};

/// The shortest secret key, in bytes, that session keys are derived from.
const MIN_SECRET_KEY_BYTES: usize = 32;

pub struct Options {
    pub bind_address: SocketAddr,
    pub cors_origin: String,

    pub database_pool_size: u32,
    pub database_timeout_seconds: u8,
    pub database_url: String,

    pub month_end: MonthEndPolicy,
    pub redis_url: Option<String>,
    pub secret_key: String,
}

#[derive(Clone)]
pub struct AppState {
    ledger_service: LedgerService,
    report_service: ReportService,
    session_key: Key,
    user_service: UserService,
}

impl AppState {
    /// Wire the services to a single store that holds every kind of record.
    pub fn new<S>(
        store: S,
        rate_limiter: DynRateLimiter,
        month_end: MonthEndPolicy,
        session_key: Key,
    ) -> Self
    where
        S: BudgetRepo
            + CategoryRepo
            + ReportRepo
            + TransactionRepo
            + UserRepo
            + Clone
            + Send
            + Sync
            + 'static,
    {
        Self {
            ledger_service: LedgerService::new(
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                Arc::new(store.clone()),
            ),
            report_service: ReportService::new(
                Arc::new(store.clone()),
                month_end,
                Arc::new(store.clone()),
            ),
            session_key,
            user_service: UserService::new(rate_limiter, Arc::new(store)),
        }
    }
}

/// Derive the key used to encrypt session cookies.
///
/// # Arguments
///
/// * `secret_key` - Base64 encoded key material of at least 32 bytes.
pub fn session_key(secret_key: &str) -> anyhow::Result<Key> {
    let master_key =
        base64::decode(secret_key.trim()).context("Secret key must be base64 encoded.")?;

    if master_key.len() < MIN_SECRET_KEY_BYTES {
        bail!(
            "Secret key must contain at least {} bytes, received {}.",
            MIN_SECRET_KEY_BYTES,
            master_key.len()
        );
    }

    Ok(Key::derive_from(&master_key))
}

/// Build the application's routes. Everything lives under `/api`.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .nest(
            "/auth",
            crate::authentication::http::routes().merge(crate::identities::http::routes()),
        )
        .merge(crate::ledger::http::routes());

    Router::new().nest("/api", api).with_state(state)
}

pub async fn serve(opts: Options) -> anyhow::Result<()> {
    let db = PostgresConnection::connect(
        &opts.database_url,
        opts.database_pool_size,
        opts.database_timeout_seconds,
    )
    .await?;

    let rate_limiter: DynRateLimiter = match &opts.redis_url {
        Some(redis_url) => Arc::new(RedisRateLimiter::new(redis_url)?),
        None => {
            warn!("No Redis URL provided. Signup and login will not be rate limited.");

            Arc::new(Unlimited)
        }
    };

    let state = AppState::new(
        db,
        rate_limiter,
        opts.month_end,
        session_key(&opts.secret_key)?,
    );

    let app = router(state).layer(cors::layer(&opts.cors_origin)?);

    info!(address = %opts.bind_address, month_end = ?opts.month_end, "Starting server.");

    axum::Server::bind(&opts.bind_address)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    Ok(())
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.session_key.clone()
    }
}

impl FromRef<AppState> for LedgerService {
    fn from_ref(state: &AppState) -> Self {
        state.ledger_service.clone()
    }
}

impl FromRef<AppState> for ReportService {
    fn from_ref(state: &AppState) -> Self {
        state.report_service.clone()
    }
}

impl FromRef<AppState> for UserService {
    fn from_ref(state: &AppState) -> Self {
        state.user_service.clone()
    }
}
