//! Capability registry
//!
//! Maps capability names to the templates of the resources that register
//! them. Filled whenever a description with `capabilities` entries reaches
//! the metadata registry.

use dashmap::DashMap;
use resmeta_template::AddressTemplate;
use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct Capabilities {
    registry: DashMap<String, BTreeSet<AddressTemplate>>,
}

impl Capabilities {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, template: AddressTemplate) {
        self.registry.entry(name.into()).or_default().insert(template);
    }

    /// Templates registering `name`, in template order
    #[must_use]
    pub fn lookup(&self, name: &str) -> Vec<AddressTemplate> {
        self.registry
            .get(name)
            .map(|templates| templates.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}
