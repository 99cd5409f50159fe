use super::parser::CompositeRrdParser;
use super::{LookupContext, Task};
use crate::error::Result;
use crate::lookup::{LookupResult, Presence};
use crate::registry::TemplateResolver;
use async_trait::async_trait;
use resmeta_common::config::ProcessingConfig;
use resmeta_dmr::model::{
    ACCESS_CONTROL, COMBINED_DESCRIPTIONS, INCLUDE_ALIASES, OPERATIONS, READ_RESOURCE_DESCRIPTION,
    RECURSIVE, RECURSIVE_DEPTH, TRIM_DESCRIPTIONS,
};
use resmeta_dmr::{Composite, Dispatcher, Operation};
use resmeta_template::AddressTemplate;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fetches missing metadata with read-resource-description operations,
/// batched into composites that run one after another
pub struct RrdTask {
    dispatcher: Arc<dyn Dispatcher>,
    resolver: TemplateResolver,
    settings: ProcessingConfig,
}

impl RrdTask {
    pub fn new(
        dispatcher: Arc<dyn Dispatcher>,
        resolver: TemplateResolver,
        settings: ProcessingConfig,
    ) -> Self {
        Self {
            dispatcher,
            resolver,
            settings,
        }
    }

    /// One operation per incomplete template, asking only for what is
    /// missing
    pub fn create_operations(
        &self,
        lookup_result: &LookupResult,
        recursive: bool,
    ) -> Vec<(AddressTemplate, Operation)> {
        lookup_result
            .incomplete()
            .map(|(template, presence)| {
                let mut operation =
                    Operation::new(READ_RESOURCE_DESCRIPTION, self.resolver.address(template));
                if presence.contains(Presence::RESOURCE_DESCRIPTION) {
                    operation = operation.param(ACCESS_CONTROL, TRIM_DESCRIPTIONS);
                } else if presence == Presence::NOTHING {
                    operation = operation.param(ACCESS_CONTROL, COMBINED_DESCRIPTIONS);
                }
                operation = operation.param(OPERATIONS, true);
                operation = if recursive {
                    operation.param(RECURSIVE, true)
                } else {
                    operation.param(RECURSIVE_DEPTH, self.settings.rrd_depth)
                };
                if self.settings.include_aliases {
                    operation = operation.param(INCLUDE_ALIASES, true);
                }
                (template.clone(), operation)
            })
            .collect()
    }
}

#[async_trait]
impl Task for RrdTask {
    fn name(&self) -> &'static str {
        "read-resource-description"
    }

    async fn apply(&self, context: &mut LookupContext) -> Result<()> {
        let operations = self.create_operations(&context.lookup_result, context.recursive);
        if operations.is_empty() {
            return Ok(());
        }

        for batch in operations.chunks(self.settings.batch_size.max(1)) {
            let composite =
                Composite::from(batch.iter().map(|(_, op)| op.clone()).collect::<Vec<_>>());
            debug!(
                "Reading resource descriptions for {}",
                batch
                    .iter()
                    .map(|(template, _)| template.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );

            let result = match self.dispatcher.execute_composite(&composite).await {
                Ok(result) => result,
                Err(e) if batch.iter().all(|(template, _)| template.is_optional()) => {
                    warn!("Ignoring failed read of optional templates: {}", e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            for (address, parsed) in CompositeRrdParser::new(batch).parse(&result)? {
                let requested = batch
                    .iter()
                    .map(|(_, operation)| operation.address())
                    .filter(|requested| requested.is_wildcard())
                    .find(|requested| address.matches_prefix(requested));
                let key = match requested.map_or_else(
                    || self.resolver.key_for_address(&address),
                    |requested| self.resolver.key_for_result(requested, &address),
                ) {
                    Ok(key) => key,
                    Err(e) => {
                        warn!("Unable to compute registry key for {}: {}", address, e);
                        continue;
                    }
                };
                if let Some(description) = parsed.description {
                    context
                        .to_database
                        .descriptions
                        .entry(key.clone())
                        .or_insert_with(|| description.clone());
                    context
                        .to_registry
                        .descriptions
                        .entry(key.clone())
                        .or_insert(description);
                }
                if let Some(security_context) = parsed.security_context {
                    context
                        .to_database
                        .security_contexts
                        .entry(key.clone())
                        .or_insert_with(|| security_context.clone());
                    context
                        .to_registry
                        .security_contexts
                        .entry(key)
                        .or_insert(security_context);
                }
            }
        }
        Ok(())
    }
}
