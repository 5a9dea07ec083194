//! Error types for the wallet ledger
//!
//! This module provides a unified error handling system shared by the rounding
//! engine, the balance ledger and the wallet service. It defines the standard
//! error kinds and the conversions from the libraries underneath.

use std::fmt::Display;
use thiserror::Error;

/// Wallet ledger error type
#[derive(Debug, Error)]
pub enum Error {
    /// Arithmetic failure such as division by zero or decimal overflow
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    /// Malformed decimal input (non-finite float, unparsable text)
    #[error("Decimal conversion error: {0}")]
    DecimalError(String),

    /// A serialized balance set that cannot be decoded without losing entries
    #[error("Malformed balances: {0}")]
    MalformedBalances(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Asset or asset pair unknown to the registry
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// A balance change rejected by validation
    #[error("Invalid balance: {0}")]
    InvalidBalance(String),

    /// The stored balance set changed between load and save
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl Error {
    /// Whether the operation may succeed if retried against fresh state
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::ConcurrencyConflict(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::Arithmetic(msg) => Error::Arithmetic(format!("{}: {}", context, msg)),
                Error::DecimalError(msg) => Error::DecimalError(format!("{}: {}", context, msg)),
                Error::MalformedBalances(msg) => Error::MalformedBalances(format!("{}: {}", context, msg)),
                Error::AssetNotFound(msg) => Error::AssetNotFound(format!("{}: {}", context, msg)),
                Error::InvalidBalance(msg) => Error::InvalidBalance(format!("{}: {}", context, msg)),
                Error::ConcurrencyConflict(msg) => Error::ConcurrencyConflict(format!("{}: {}", context, msg)),
                Error::ConfigurationError(msg) => Error::ConfigurationError(format!("{}: {}", context, msg)),
                Error::Serialization(e) => Error::Serialization(e),
                Error::Database(e) => Error::Database(e),
                Error::Migration(e) => Error::Migration(e),
            }
        })
    }
}

/// From rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::DecimalError(err.to_string())
    }
}
