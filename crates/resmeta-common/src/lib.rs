//! Resmeta Common - Shared configuration and policy types
//!
//! This crate provides the configuration tree, the common error type and
//! the policy data (operation mode, unresolve rules) shared by all
//! resmeta components.

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
