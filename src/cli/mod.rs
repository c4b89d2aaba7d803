use std::{borrow::Cow, net::SocketAddr};

use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::{ledger::domain::month::MonthEndPolicy, server};

mod migrate;

#[derive(Parser)]
#[clap(about = "Personal finance API for tracking income, spending, and budgets.")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    /// DSN to tell Sentry where to send events.
    ///
    /// If provided, errors will be sent to Sentry.
    #[clap(long = "sentry-dsn", env = "SENTRY_DSN")]
    sentry_dsn: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations and exit.
    Migrate(MigrateOpts),
    /// Apply pending database migrations and start the API server.
    Serve(ServeOpts),
}

#[derive(Args)]
struct MigrateOpts {
    /// Connection string for the database.
    #[clap(long = "database-url", env = "DATABASE_URL")]
    database_url: String,
}

impl From<MigrateOpts> for migrate::MigrationOpts {
    fn from(opts: MigrateOpts) -> Self {
        Self {
            database_url: opts.database_url,
        }
    }
}

#[derive(Args)]
struct ServeOpts {
    /// The address the HTTP server listens on.
    #[clap(
        long = "bind-address",
        default_value = "0.0.0.0:3000",
        env = "BIND_ADDRESS"
    )]
    bind_address: SocketAddr,

    /// The origin of the frontend allowed to make credentialed requests.
    #[clap(
        long = "cors-origin",
        default_value = "http://localhost:5173",
        env = "CORS_ORIGIN"
    )]
    cors_origin: String,

    /// The number of connections to use for the database pool.
    #[clap(long = "database-pool-size", default_value = "16")]
    database_pool_size: u32,

    /// The number of seconds before a database connection times out.
    #[clap(long = "database-timeout", default_value = "5")]
    database_timeout: u8,

    /// Connection string for the application database.
    #[clap(long = "database-url", env = "DATABASE_URL")]
    database_url: String,

    /// Where monthly reports draw the end of a month.
    ///
    /// `day-31` ends every month 30 days after its first day, `calendar` ends
    /// it at the first instant of the next month.
    #[clap(long = "month-end", default_value = "day-31", env = "MONTH_END_POLICY")]
    month_end: MonthEndPolicy,

    /// Connection string for Redis.
    ///
    /// If omitted, signup and login attempts are not rate limited.
    #[clap(long = "redis-url", env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Secret key for encrypting session cookies.
    ///
    /// If this is changed, existing session cookies will become invalid.
    /// Generate with: openssl rand -base64 32
    #[clap(long = "secret-key", env = "SECRET_KEY")]
    secret_key: String,
}

impl From<ServeOpts> for server::Options {
    fn from(opts: ServeOpts) -> Self {
        Self {
            bind_address: opts.bind_address,
            cors_origin: opts.cors_origin,
            database_pool_size: opts.database_pool_size,
            database_timeout_seconds: opts.database_timeout,
            database_url: opts.database_url,
            month_end: opts.month_end,
            redis_url: opts.redis_url,
            secret_key: opts.secret_key,
        }
    }
}

pub async fn run_with_sys_args() -> anyhow::Result<()> {
    use tracing_subscriber::prelude::*;

    let cli = Cli::parse();

    let sentry_config = cli.sentry_dsn.map(|dsn| {
        debug!("Enabled sentry.");

        let release_name = option_env!("GIT_SHA")
            .map(Cow::from)
            .or_else(|| sentry::release_name!());

        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: release_name,
                ..Default::default()
            },
        ))
    });

    let sentry_tracing_layer = sentry_config.as_ref().map(|_| sentry_tracing::layer());

    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(EnvFilter::from_default_env());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(sentry_tracing_layer)
        .init();

    match cli.command {
        Commands::Migrate(opts) => migrate::run_migrations(opts.into()).await,
        Commands::Serve(opts) => {
            let migrate_opts = MigrateOpts {
                database_url: opts.database_url.clone(),
            };

            migrate::run_migrations(migrate_opts.into()).await?;

            server::serve(opts.into()).await
        }
    }
}
