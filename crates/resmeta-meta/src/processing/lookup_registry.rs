use super::{LookupContext, Task};
use crate::error::Result;
use crate::lookup::Presence;
use crate::registry::MetadataRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Marks what the session registry already knows
pub struct LookupRegistryTask {
    registry: Arc<MetadataRegistry>,
}

impl LookupRegistryTask {
    pub const fn new(registry: Arc<MetadataRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Task for LookupRegistryTask {
    fn name(&self) -> &'static str {
        "lookup-registry"
    }

    async fn apply(&self, context: &mut LookupContext) -> Result<()> {
        let templates = context.lookup_result.templates().to_vec();
        for template in &templates {
            let presence = self.registry.check(template, context.recursive);
            if presence != Presence::NOTHING {
                context.lookup_result.mark_metadata_present(template, presence);
            }
        }
        debug!("Registry lookup: {}", context.lookup_result);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::ResourceDescription;
    use crate::registry::{MetadataPieces, TemplateResolver};
    use crate::security::SecurityContext;
    use resmeta_common::OperationMode;
    use resmeta_template::{AddressTemplate, BaseContext, UnresolvePolicy};
    use serde_json::json;

    fn t(s: &str) -> AddressTemplate {
        AddressTemplate::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_marks_registry_hits() {
        let registry = Arc::new(MetadataRegistry::new(TemplateResolver::new(
            Arc::new(BaseContext::Empty),
            Arc::new(UnresolvePolicy::wildcards()),
            OperationMode::Domain,
        )));
        let mut pieces = MetadataPieces::default();
        pieces
            .descriptions
            .insert(t("/subsystem=mail"), ResourceDescription::new(json!({}), false));
        pieces
            .security_contexts
            .insert(t("/subsystem=jmx"), SecurityContext::READ_ONLY);
        registry.add_all(pieces);

        let task = LookupRegistryTask::new(registry);
        let mut context = LookupContext::new([t("/subsystem=mail"), t("/subsystem=jmx")], false);
        task.apply(&mut context).await.unwrap();
        assert_eq!(
            context.lookup_result.presence(&t("/subsystem=mail")),
            Presence::RESOURCE_DESCRIPTION
        );
        assert_eq!(
            context.lookup_result.presence(&t("/subsystem=jmx")),
            Presence::SECURITY_CONTEXT
        );

        // non-recursive entries do not satisfy a recursive lookup
        let mut recursive = LookupContext::new([t("/subsystem=mail")], true);
        task.apply(&mut recursive).await.unwrap();
        assert_eq!(
            recursive.lookup_result.presence(&t("/subsystem=mail")),
            Presence::NOTHING
        );
    }
}
