use super::{LookupContext, Task};
use crate::error::Result;
use crate::registry::MetadataRegistry;
use async_trait::async_trait;
use resmeta_store::{Documents, MetaTable, WorkerChannel};
use resmeta_template::AddressTemplate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Adds everything found or fetched to the session registry before the
/// caller continues
pub struct UpdateRegistryTask {
    registry: Arc<MetadataRegistry>,
}

impl UpdateRegistryTask {
    pub const fn new(registry: Arc<MetadataRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Task for UpdateRegistryTask {
    fn name(&self) -> &'static str {
        "update-registry"
    }

    async fn apply(&self, context: &mut LookupContext) -> Result<()> {
        self.registry.add_all(std::mem::take(&mut context.to_registry));
        Ok(())
    }
}

/// Hands freshly fetched metadata to the persistence worker without waiting
pub struct UpdateDatabaseTask {
    worker: WorkerChannel,
}

impl UpdateDatabaseTask {
    pub const fn new(worker: WorkerChannel) -> Self {
        Self { worker }
    }
}

fn documents<T: Serialize>(table: MetaTable, pieces: &BTreeMap<AddressTemplate, T>) -> Documents {
    pieces
        .iter()
        .filter_map(|(key, piece)| match serde_json::to_value(piece) {
            Ok(document) => Some((key.to_string(), document)),
            Err(e) => {
                error!("Unable to encode {} document for {}: {}", table, key, e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl Task for UpdateDatabaseTask {
    fn name(&self) -> &'static str {
        "update-database"
    }

    async fn apply(&self, context: &mut LookupContext) -> Result<()> {
        let pieces = std::mem::take(&mut context.to_database);
        if pieces.is_empty() {
            return Ok(());
        }
        let table = MetaTable::ResourceDescriptions;
        self.worker.post(table, documents(table, &pieces.descriptions));
        let table = MetaTable::SecurityContexts;
        self.worker.post(table, documents(table, &pieces.security_contexts));
        debug!(
            "Queued {} descriptions and {} security contexts for persistence",
            pieces.descriptions.len(),
            pieces.security_contexts.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::ResourceDescription;
    use crate::registry::TemplateResolver;
    use crate::security::SecurityContext;
    use resmeta_common::OperationMode;
    use resmeta_store::{MemoryDatabase, MetaDatabase};
    use resmeta_template::{BaseContext, UnresolvePolicy};
    use serde_json::json;

    fn t(s: &str) -> AddressTemplate {
        AddressTemplate::parse(s).unwrap()
    }

    fn fetched() -> LookupContext {
        let mut context = LookupContext::new([t("/subsystem=mail")], false);
        context.to_database.descriptions.insert(
            t("/subsystem=mail"),
            ResourceDescription::new(json!({"description": "mail"}), false),
        );
        context
            .to_database
            .security_contexts
            .insert(t("/subsystem=mail"), SecurityContext::RWX);
        context.to_registry = context.to_database.clone();
        context
    }

    #[tokio::test]
    async fn test_update_registry() {
        let registry = Arc::new(MetadataRegistry::new(TemplateResolver::new(
            Arc::new(BaseContext::Empty),
            Arc::new(UnresolvePolicy::wildcards()),
            OperationMode::Domain,
        )));
        let mut context = fetched();
        UpdateRegistryTask::new(registry.clone())
            .apply(&mut context)
            .await
            .unwrap();
        assert!(registry.contains(&t("/subsystem=mail")));
        assert!(context.to_registry.is_empty());
    }

    #[tokio::test]
    async fn test_update_database() {
        let database = Arc::new(MemoryDatabase::new());
        let (worker, _handle) = WorkerChannel::spawn(database.clone(), 4);
        let mut context = fetched();
        UpdateDatabaseTask::new(worker.clone())
            .apply(&mut context)
            .await
            .unwrap();
        worker.flush().await.unwrap();

        let stored = database
            .get(MetaTable::ResourceDescriptions, "/subsystem=mail")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["payload"]["description"], "mail");
        assert_eq!(
            database.list(MetaTable::SecurityContexts).await.unwrap(),
            vec!["/subsystem=mail"]
        );
    }
}
