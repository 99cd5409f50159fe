//! Dispatcher contract
//!
//! The transport layer sending operations to the management server lives
//! outside this workspace; the metadata pipeline depends only on this trait.

use crate::error::DispatchError;
use crate::operation::{Composite, CompositeResult, Operation};
use async_trait::async_trait;
use serde_json::Value;

/// Executes operations against the management server
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Execute a composite. Step failures are reported in the returned
    /// result; an `Err` means the composite as a whole could not be executed.
    async fn execute_composite(
        &self,
        composite: &Composite,
    ) -> Result<CompositeResult, DispatchError>;

    /// Execute a single operation as a one-step composite and return its
    /// `result` payload. A failed step becomes an `Err`.
    async fn execute(&self, operation: &Operation) -> Result<Value, DispatchError> {
        let composite = Composite::from(vec![operation.clone()]);
        let result = self.execute_composite(&composite).await?;
        let address = operation.address().to_string();
        match result.step(0) {
            Some(step) if step.is_failure() => {
                Err(DispatchError::new(address, step.failure_description()))
            }
            Some(step) => Ok(step.result().clone()),
            None => Err(DispatchError::new(address, "composite returned no step")),
        }
    }
}
