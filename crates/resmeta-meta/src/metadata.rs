//! Metadata of one template

use crate::capabilities::Capabilities;
use crate::description::ResourceDescription;
use crate::security::SecurityContext;
use resmeta_dmr::model::{ATTRIBUTES, DESCRIPTION, REQUEST_PROPERTIES};
use resmeta_template::AddressTemplate;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Template, security context, description and capabilities of a resource
#[derive(Clone, Debug)]
pub struct Metadata {
    template: AddressTemplate,
    security_context: Arc<SecurityContext>,
    description: Arc<ResourceDescription>,
    capabilities: Arc<Capabilities>,
}

impl Metadata {
    #[must_use]
    pub const fn new(
        template: AddressTemplate,
        security_context: Arc<SecurityContext>,
        description: Arc<ResourceDescription>,
        capabilities: Arc<Capabilities>,
    ) -> Self {
        Self {
            template,
            security_context,
            description,
            capabilities,
        }
    }

    /// Metadata with an empty description and full access
    #[must_use]
    pub fn empty() -> Self {
        Self::static_description(ResourceDescription::default())
    }

    /// Metadata for a description that does not come from the server
    #[must_use]
    pub fn static_description(description: ResourceDescription) -> Self {
        Self::new(
            AddressTemplate::ROOT,
            Arc::new(SecurityContext::RWX),
            Arc::new(description),
            Arc::new(Capabilities::new()),
        )
    }

    /// Metadata describing the request of operation `name`: the operation's
    /// request properties become the attributes, and they are readable and
    /// writable when the operation is executable.
    #[must_use]
    pub fn for_operation(&self, name: &str) -> Self {
        let operation = self.description.operation(name);
        let mut payload = Map::new();
        payload.insert(
            DESCRIPTION.to_string(),
            operation
                .and_then(|o| o.get(DESCRIPTION))
                .cloned()
                .unwrap_or(Value::Null),
        );
        payload.insert(
            ATTRIBUTES.to_string(),
            operation
                .and_then(|o| o.get(REQUEST_PROPERTIES))
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
        );

        let executable = self.security_context.is_executable(name);
        Self::new(
            self.template.clone(),
            Arc::new(self.security_context.with_flags(executable, executable)),
            Arc::new(ResourceDescription::new(
                Value::Object(payload),
                self.description.is_recursive(),
            )),
            self.capabilities.clone(),
        )
    }

    #[must_use]
    pub const fn template(&self) -> &AddressTemplate {
        &self.template
    }

    #[must_use]
    pub fn security_context(&self) -> &SecurityContext {
        &self.security_context
    }

    #[must_use]
    pub fn description(&self) -> &ResourceDescription {
        &self.description
    }

    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }
}
