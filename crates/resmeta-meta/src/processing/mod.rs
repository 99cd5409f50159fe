//! Metadata processing pipeline
//!
//! One `process` call runs these tasks in order over a shared
//! [`LookupContext`]:
//!
//! 1. registry lookup
//! 2. database lookup (when persistence is enabled)
//! 3. read-resource-description fetch of whatever is still missing
//! 4. registry update
//! 5. database update through the persistence worker
//!
//! The pipeline stops after the registry lookup when everything is already
//! known.

mod context;
mod lookup_database;
mod lookup_registry;
pub mod parser;
mod processor;
mod rrd;
mod update;

pub use context::LookupContext;
pub use lookup_database::LookupDatabaseTask;
pub use lookup_registry::LookupRegistryTask;
pub use processor::{MetadataProcessor, ProcessorBuilder, ScreenOutcome};
pub use rrd::RrdTask;
pub use update::{UpdateDatabaseTask, UpdateRegistryTask};

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// One step of the pipeline
#[async_trait]
pub trait Task: Send + Sync {
    /// Task name for logging
    fn name(&self) -> &'static str;

    async fn apply(&self, context: &mut LookupContext) -> Result<()>;
}

/// Tasks applied in sequence; the first error stops the chain
#[derive(Clone, Default)]
pub struct TaskChain {
    tasks: Vec<Arc<dyn Task>>,
}

impl TaskChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<T: Task + 'static>(&mut self, task: T) -> &mut Self {
        self.tasks.push(Arc::new(task));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|t| t.name()).collect()
    }

    pub async fn apply(&self, context: &mut LookupContext) -> Result<()> {
        for task in &self.tasks {
            tracing::debug!("Running {} for {}", task.name(), context.lookup_result);
            task.apply(context).await?;
        }
        Ok(())
    }

    /// Like [`TaskChain::apply`], but stops as soon as every template has
    /// all its metadata
    pub async fn apply_until_complete(&self, context: &mut LookupContext) -> Result<()> {
        for task in &self.tasks {
            if context.all_present() {
                tracing::debug!("All metadata present, skipping {}", task.name());
                break;
            }
            task.apply(context).await?;
        }
        Ok(())
    }
}
