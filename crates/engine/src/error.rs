//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`InsufficientBalance`] thrown when an annual leave exceeds the days available.
//! - [`NotFound`] thrown when an item is not found.
//!
//!  [`InsufficientBalance`]: EngineError::InsufficientBalance
//!  [`NotFound`]: EngineError::NotFound
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Invalid absence: {0}")]
    Validation(String),
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::InsufficientBalance(a), Self::InsufficientBalance(b)) => a == b,
            (Self::InvalidState(a), Self::InvalidState(b)) => a == b,
            _ => false,
        }
    }
}
