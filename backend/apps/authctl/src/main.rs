//! authctl - Auth Core Maintenance CLI
//!
//! Uses `anyhow` for process-level errors; auth failures are reported
//! through `kernel::error::AppError` so the output matches what callers of
//! the library would see.
//!
//! ```bash
//! echo -n 'admin' | authctl encode-password --algorithm bcrypt
//! echo -n 'admin' | authctl verify-password --hash '$2b$12$...' --algorithm bcrypt
//! echo -n 'admin' | authctl check-login admin
//! ```

mod cli;

use std::env;
use std::io::{self, BufRead};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use auth::application::config::{ENV_PASSWORD_ALGORITHM, ENV_PASSWORD_PEPPER};
use auth::{AppError, AuthConfig, CredentialVerifier, PgSessionStore, PgUserStore};
use clap::Parser;
use platform::password::{ClearTextPassword, PasswordAlgorithm, PasswordCodec};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing (stderr, so stdout only carries command output)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authctl=info,auth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::EncodePassword { algorithm, salt } => {
            let codec = codec_for(algorithm.as_deref())?;
            let password = read_password()?;
            let encoded = codec.encode(&password, salt.as_deref())?;
            println!("{encoded}");
            Ok(ExitCode::SUCCESS)
        }
        Commands::VerifyPassword {
            hash,
            algorithm,
            salt,
        } => {
            let codec = codec_for(algorithm.as_deref())?;
            let password = read_password()?;
            if codec.verify(&password, &hash, salt.as_deref())? {
                println!("match");
                if codec.needs_rehash(&hash) {
                    println!("needs rehash");
                }
                Ok(ExitCode::SUCCESS)
            } else {
                println!("mismatch");
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Migrate => {
            let pool = connect().await?;
            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;
            tracing::info!("Migrations completed");
            Ok(ExitCode::SUCCESS)
        }
        Commands::CheckLogin { identifier } => check_login(&identifier).await,
        Commands::CleanupSessions => {
            let pool = connect().await?;
            let deleted = PgSessionStore::new(pool).cleanup_expired().await?;
            println!("{deleted}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn check_login(identifier: &str) -> anyhow::Result<ExitCode> {
    let config = Arc::new(AuthConfig::from_env()?);
    let pool = connect().await?;
    let verifier = CredentialVerifier::new(Arc::new(PgUserStore::new(pool)), config)?;

    let password = read_line()?;
    match verifier.authenticate(identifier, password).await {
        Ok(user) => {
            println!("{} {} [{}]", user.id, user.username, user.roles.names().join(", "));
            if verifier.needs_rehash(&user) {
                println!("needs rehash");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let app_error: AppError = e.into();
            if app_error.is_server_error() {
                return Err(app_error.into());
            }
            println!("{app_error}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn codec_for(name: Option<&str>) -> anyhow::Result<Arc<dyn PasswordCodec>> {
    let name = name
        .map(str::to_string)
        .or_else(|| env::var(ENV_PASSWORD_ALGORITHM).ok());

    let algorithm = match name {
        Some(name) => PasswordAlgorithm::from_name(&name)
            .with_context(|| format!("unknown password algorithm {name:?}"))?,
        None => PasswordAlgorithm::default(),
    };

    let pepper = env::var(ENV_PASSWORD_PEPPER).ok().map(String::into_bytes);
    Ok(algorithm.codec(pepper.as_deref())?)
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    Ok(pool)
}

/// First line of stdin without its line terminator
fn read_line() -> anyhow::Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed_len);

    if line.is_empty() {
        bail!("expected a password on stdin");
    }
    Ok(line)
}

fn read_password() -> anyhow::Result<ClearTextPassword> {
    Ok(ClearTextPassword::new(read_line()?)?)
}
