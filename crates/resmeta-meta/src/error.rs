//! Metadata error types

use resmeta_dmr::{DispatchError, ModelError};
use resmeta_store::StoreError;
use resmeta_template::TemplateError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MetaError>;

/// A fetched response did not have the expected shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error("unexpected response for {address}: {reason}")]
    UnexpectedShape { address: String, reason: String },

    #[error("step {step} ({address}) failed: {reason}")]
    FailedStep {
        step: usize,
        address: String,
        reason: String,
    },

    #[error("no result for step {step} ({address})")]
    MissingStep { step: usize, address: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ParserError {
    pub fn unexpected_shape(address: impl ToString, reason: impl Into<String>) -> Self {
        Self::UnexpectedShape {
            address: address.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the metadata pipeline
#[derive(Debug, Error)]
pub enum MetaError {
    #[error(transparent)]
    InvalidTemplate(#[from] TemplateError),

    #[error("no metadata found for {template}")]
    MissingMetadata { template: String },

    #[error("unable to parse metadata: {0}")]
    Parser(#[from] ParserError),

    #[error("unable to fetch metadata: {0}")]
    Transport(#[from] DispatchError),

    #[error("metadata database error: {0}")]
    Database(#[from] StoreError),

    #[error("invalid constraint '{0}'")]
    InvalidConstraint(String),
}

impl MetaError {
    pub fn missing_metadata(template: impl ToString) -> Self {
        Self::MissingMetadata {
            template: template.to_string(),
        }
    }

    /// Check if the caller can recover by running the asynchronous pipeline
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::MissingMetadata { .. })
    }

    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_predicates() {
        let missing = MetaError::missing_metadata("/subsystem=mail");
        assert!(missing.is_recoverable());
        assert!(!missing.is_transport());
        assert_eq!(missing.to_string(), "no metadata found for /subsystem=mail");

        let transport = MetaError::from(DispatchError::new("/subsystem=mail", "timeout"));
        assert!(transport.is_transport());
        assert!(!transport.is_recoverable());
    }
}
