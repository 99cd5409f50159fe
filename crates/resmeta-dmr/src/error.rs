//! Model and dispatch error types

use thiserror::Error;

/// Malformed model data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid address '{0}': {1}")]
    InvalidAddress(String, String),

    #[error("unexpected model shape: {0}")]
    UnexpectedShape(String),
}

impl ModelError {
    pub fn invalid_address(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress(address.into(), reason.into())
    }

    pub fn unexpected_shape(msg: impl Into<String>) -> Self {
        Self::UnexpectedShape(msg.into())
    }
}

/// Failure reported by the dispatcher for an operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("operation on {address} failed: {message}")]
pub struct DispatchError {
    /// Address of the failed operation
    pub address: String,
    /// Human readable cause
    pub message: String,
}

impl DispatchError {
    pub fn new(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            message: message.into(),
        }
    }
}
