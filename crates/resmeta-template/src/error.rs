//! Template error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TemplateError>;

/// Errors raised while parsing or slicing address templates
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("invalid address template '{template}': {reason}")]
    Parse { template: String, reason: String },

    #[error("sub template range {from}..{to} out of bounds for template of size {size}")]
    OutOfRange { from: usize, to: usize, size: usize },
}

impl TemplateError {
    pub fn parse(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            template: template.into(),
            reason: reason.into(),
        }
    }
}
