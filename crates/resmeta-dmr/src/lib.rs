//! Resmeta DMR - Management model vocabulary
//!
//! This crate provides the types exchanged with the management server:
//! concrete resource addresses, read operations and composites of them,
//! composite step results, and the [`Dispatcher`] trait implemented by the
//! transport layer.

pub mod address;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod operation;

pub use address::{ResourceAddress, Segment, escape_value, unescape_value};
pub use dispatch::Dispatcher;
pub use error::{DispatchError, ModelError};
pub use operation::{Composite, CompositeResult, Operation, StepResult};
