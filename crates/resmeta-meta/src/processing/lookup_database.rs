use super::{LookupContext, Task};
use crate::description::ResourceDescription;
use crate::error::Result;
use crate::lookup::Presence;
use crate::registry::TemplateResolver;
use crate::security::SecurityContext;
use async_trait::async_trait;
use resmeta_store::{Documents, MetaDatabase, MetaTable, StoreResult};
use resmeta_template::AddressTemplate;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Loads what the persistent database knows for the templates the registry
/// could not answer. Read failures leave the lookup result unchanged.
pub struct LookupDatabaseTask {
    database: Arc<dyn MetaDatabase>,
    resolver: TemplateResolver,
}

impl LookupDatabaseTask {
    pub fn new(database: Arc<dyn MetaDatabase>, resolver: TemplateResolver) -> Self {
        Self { database, resolver }
    }

    /// Incomplete templates with their registry key
    fn incomplete(&self, context: &LookupContext) -> Vec<(AddressTemplate, AddressTemplate, Presence)> {
        context
            .lookup_result
            .incomplete()
            .filter_map(|(template, presence)| match self.resolver.key(template) {
                Ok(key) => Some((template.clone(), key, presence)),
                Err(e) => {
                    warn!("Unable to compute database key for {}: {}", template, e);
                    None
                }
            })
            .collect()
    }

    async fn bulk(&self, context: &mut LookupContext) {
        let wanted = self.incomplete(context);
        let keys_missing = |piece: Presence| -> Vec<String> {
            wanted
                .iter()
                .filter(|(_, _, presence)| !presence.contains(piece))
                .map(|(_, key, _)| key.to_string())
                .collect()
        };
        let description_keys = keys_missing(Presence::RESOURCE_DESCRIPTION);
        let security_keys = keys_missing(Presence::SECURITY_CONTEXT);

        let (descriptions, contexts) = futures::join!(
            self.database
                .get_many(MetaTable::ResourceDescriptions, &description_keys),
            self.database.get_many(MetaTable::SecurityContexts, &security_keys),
        );
        let descriptions: BTreeMap<_, ResourceDescription> =
            decode_all(MetaTable::ResourceDescriptions, descriptions);
        let contexts: BTreeMap<_, SecurityContext> =
            decode_all(MetaTable::SecurityContexts, contexts);

        for (template, key, _) in &wanted {
            if let Some(description) = descriptions.get(key) {
                context
                    .to_registry
                    .descriptions
                    .insert(key.clone(), description.clone());
                context
                    .lookup_result
                    .mark_metadata_present(template, Presence::RESOURCE_DESCRIPTION);
            }
            if let Some(security_context) = contexts.get(key) {
                context
                    .to_registry
                    .security_contexts
                    .insert(key.clone(), security_context.clone());
                context
                    .lookup_result
                    .mark_metadata_present(template, Presence::SECURITY_CONTEXT);
            }
        }
    }

    /// A template counts as present only when its own key was stored and
    /// every document below it came from a recursive read
    async fn recursive(&self, context: &mut LookupContext) {
        for (template, key, presence) in self.incomplete(context) {
            let root = key.to_string();
            let (descriptions, contexts) = futures::join!(
                self.database
                    .get_subtree(MetaTable::ResourceDescriptions, &root),
                self.database.get_subtree(MetaTable::SecurityContexts, &root),
            );

            if !presence.contains(Presence::RESOURCE_DESCRIPTION) {
                let subtree: BTreeMap<_, ResourceDescription> =
                    decode_all(MetaTable::ResourceDescriptions, descriptions);
                if subtree.contains_key(&key) && subtree.values().all(ResourceDescription::is_recursive) {
                    context.to_registry.descriptions.extend(subtree);
                    context
                        .lookup_result
                        .mark_metadata_present(&template, Presence::RESOURCE_DESCRIPTION);
                }
            }
            if !presence.contains(Presence::SECURITY_CONTEXT) {
                let subtree: BTreeMap<_, SecurityContext> =
                    decode_all(MetaTable::SecurityContexts, contexts);
                if subtree.contains_key(&key) && subtree.values().all(SecurityContext::is_recursive) {
                    context.to_registry.security_contexts.extend(subtree);
                    context
                        .lookup_result
                        .mark_metadata_present(&template, Presence::SECURITY_CONTEXT);
                }
            }
        }
    }
}

/// Decode stored documents, keyed by the template their key parses to.
/// Undecodable documents and read errors are logged and skipped.
fn decode_all<T: DeserializeOwned>(
    table: MetaTable,
    documents: StoreResult<Documents>,
) -> BTreeMap<AddressTemplate, T> {
    let documents = match documents {
        Ok(documents) => documents,
        Err(e) => {
            warn!("Unable to read {} from database: {}", table, e);
            return BTreeMap::new();
        }
    };
    documents
        .into_iter()
        .filter_map(|(key, document)| {
            let template = AddressTemplate::parse(&key)
                .map_err(|e| warn!("Ignoring {} document '{}': {}", table, key, e))
                .ok()?;
            let value = serde_json::from_value(document)
                .map_err(|e| warn!("Ignoring {} document '{}': {}", table, key, e))
                .ok()?;
            Some((template, value))
        })
        .collect()
}

#[async_trait]
impl Task for LookupDatabaseTask {
    fn name(&self) -> &'static str {
        "lookup-database"
    }

    async fn apply(&self, context: &mut LookupContext) -> Result<()> {
        if context.all_present() {
            return Ok(());
        }
        if context.recursive {
            self.recursive(context).await;
        } else {
            self.bulk(context).await;
        }
        debug!("Database lookup: {}", context.lookup_result);
        Ok(())
    }
}
