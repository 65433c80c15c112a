//! CLI command implementations.

pub mod companies;
pub mod token;

use edepot_client::{CompanyDirectory, ConfigError, DepotApiError, EDepotConfig};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The API client could not be created.
    #[error("Client error: {0}")]
    Client(#[from] DepotApiError),

    /// Output could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The requested company does not exist.
    #[error("No company found for {0}")]
    NotFound(String),

    /// The token endpoint did not issue a token.
    #[error("Token request for {0} was rejected")]
    TokenRejected(String),
}

/// Build a directory from environment configuration.
fn directory() -> Result<CompanyDirectory, CommandError> {
    let config = EDepotConfig::from_env()?;
    Ok(CompanyDirectory::from_config(&config)?)
}

/// Write a value to stdout as pretty JSON.
#[allow(clippy::print_stdout)]
fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
