//! Error types for every layer of the client.

use thiserror::Error;

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Another write workflow already holds the domain's mutation lock
    #[error("A mutation is already in progress for domain {0}")]
    MutationInProgress(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Preconditions for a workflow step are not met yet (no session, account
    /// not initialized, domain not loaded)
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not supported: {0}")]
    NotSupported(String),
}

/// Failures talking to the Flow access node
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChainError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Script execution failed: {0}")]
    ScriptFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Transaction expired: {0}")]
    TransactionExpired(String),

    #[error("Failed to decode chain response: {0}")]
    Decode(String),
}

/// Failures reported by the wallet connector
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WalletError {
    #[error("Wallet unavailable: {0}")]
    Unavailable(String),

    #[error("Authorization rejected: {0}")]
    Rejected(String),

    #[error("Invalid wallet response: {0}")]
    InvalidResponse(String),
}

/// Input validation failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Must be renewing for at least one year")]
    RenewalDuration,

    #[error("{0}")]
    Multiple(String),
}

/// Configuration failures at startup
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(String),

    #[error("Invalid configuration value for {key}: {message}")]
    Invalid { key: String, message: String },
}
