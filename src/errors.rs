//! Unified error types and result handling.
//!
//! Every fallible operation in the crate returns [`Result`]. The variants map
//! onto four caller-visible kinds: invalid input, missing resource, operation
//! incompatible with current state, and unreachable dependency — so an API
//! layer can translate them to response codes without string matching.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or out-of-range input, detected before any write.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable description of the violated rule
        message: String,
    },

    /// A monetary amount that is negative, zero where positive is required,
    /// or not finite.
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The offending value
        amount: f64,
    },

    /// Referenced credit purchase does not exist.
    #[error("Credit purchase not found: {id}")]
    PurchaseNotFound {
        /// The purchase id that failed to resolve
        id: String,
    },

    /// Referenced installment does not exist.
    #[error("Installment not found: {id}")]
    InstallmentNotFound {
        /// The installment id that failed to resolve
        id: String,
    },

    /// Referenced payment modality does not exist.
    #[error("Payment modality not found: {id}")]
    ModalityNotFound {
        /// The modality id that failed to resolve
        id: String,
    },

    /// Operation is incompatible with the entity's current status
    /// (e.g. paying an already-paid installment).
    #[error("State conflict: {message}")]
    StateConflict {
        /// What precondition failed
        message: String,
    },

    /// The tenant store (or a statement against it) could not be reached.
    /// Fatal for the current request; never retried internally.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Configuration error (environment, config file, store paths).
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong while loading configuration
        message: String,
    },

    /// I/O error from the config/store layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
