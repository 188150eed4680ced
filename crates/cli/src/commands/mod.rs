//! CLI subcommands.

pub mod migrate;
pub mod seed;

use thiserror::Error;

use qkart_storefront::db::{CatalogError, RepositoryError};

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Store error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Database URL from `QKART_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// # Errors
///
/// Returns `CommandError::MissingEnvVar` if neither is set.
pub fn database_url() -> Result<secrecy::SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("QKART_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(secrecy::SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("QKART_DATABASE_URL"))
}
