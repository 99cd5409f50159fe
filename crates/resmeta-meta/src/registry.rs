//! Session metadata registry
//!
//! Descriptions and security contexts are kept per registry key: the
//! template a resolved address unresolves to under the configured policy.
//! A template such as `{selected.profile}/subsystem=mail` and the concrete
//! addresses returned for it therefore share one entry.

use crate::capabilities::Capabilities;
use crate::description::ResourceDescription;
use crate::error::{MetaError, Result};
use crate::lookup::Presence;
use crate::metadata::Metadata;
use crate::security::SecurityContext;
use parking_lot::RwLock;
use resmeta_common::OperationMode;
use resmeta_dmr::model::WILDCARD;
use resmeta_dmr::{ResourceAddress, Segment};
use resmeta_template::{
    AddressTemplate, FilteringContext, StatementContext, TemplateError, Unresolver,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves templates to the addresses sent to the server and to registry
/// keys
#[derive(Clone)]
pub struct TemplateResolver {
    context: Arc<dyn StatementContext>,
    unresolver: Arc<dyn Unresolver>,
}

impl TemplateResolver {
    /// In domain mode, well-known selection tuples without a value resolve
    /// to wildcards. In standalone mode they are dropped.
    pub fn new(
        context: Arc<dyn StatementContext>,
        unresolver: Arc<dyn Unresolver>,
        mode: OperationMode,
    ) -> Self {
        let context: Arc<dyn StatementContext> = if mode.is_standalone() {
            context
        } else {
            Arc::new(FilteringContext::wildcard_when_undefined(context))
        };
        Self {
            context,
            unresolver,
        }
    }

    #[must_use]
    pub fn address(&self, template: &AddressTemplate) -> ResourceAddress {
        template.resolve(self.context.as_ref())
    }

    pub fn key_for_address(
        &self,
        address: &ResourceAddress,
    ) -> std::result::Result<AddressTemplate, TemplateError> {
        AddressTemplate::from_address(address, self.unresolver.as_ref())
    }

    pub fn key(
        &self,
        template: &AddressTemplate,
    ) -> std::result::Result<AddressTemplate, TemplateError> {
        self.key_for_address(&self.address(template))
    }

    /// Registry key of `address`, returned for an operation sent to
    /// `requested`. Segments `requested` left as wildcards stay wildcards,
    /// so the key of the requested address itself equals [`Self::key`] of
    /// the template the operation was created for.
    pub fn key_for_result(
        &self,
        requested: &ResourceAddress,
        address: &ResourceAddress,
    ) -> std::result::Result<AddressTemplate, TemplateError> {
        if !requested.is_wildcard() || !address.matches_prefix(requested) {
            return self.key_for_address(address);
        }
        let generalized: ResourceAddress = address
            .iter()
            .zip(requested.iter().map(Some).chain(std::iter::repeat(None)))
            .map(|(segment, pattern)| match pattern {
                Some(p) if p.is_wildcard() => Segment::new(segment.key.clone(), WILDCARD),
                _ => segment.clone(),
            })
            .collect();
        self.key_for_address(&generalized)
    }
}

/// Metadata pieces keyed by registry key
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetadataPieces {
    pub descriptions: BTreeMap<AddressTemplate, ResourceDescription>,
    pub security_contexts: BTreeMap<AddressTemplate, SecurityContext>,
}

impl MetadataPieces {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty() && self.security_contexts.is_empty()
    }

    /// Add the pieces of `other` not already present
    pub fn merge(&mut self, other: Self) {
        for (key, description) in other.descriptions {
            self.descriptions.entry(key).or_insert(description);
        }
        for (key, context) in other.security_contexts {
            self.security_contexts.entry(key).or_insert(context);
        }
    }
}

#[derive(Default)]
struct Entries {
    descriptions: HashMap<AddressTemplate, Arc<ResourceDescription>>,
    security_contexts: HashMap<AddressTemplate, Arc<SecurityContext>>,
}

pub struct MetadataRegistry {
    resolver: TemplateResolver,
    capabilities: Arc<Capabilities>,
    entries: RwLock<Entries>,
}

impl MetadataRegistry {
    pub fn new(resolver: TemplateResolver) -> Self {
        Self {
            resolver,
            capabilities: Arc::new(Capabilities::new()),
            entries: RwLock::new(Entries::default()),
        }
    }

    pub const fn resolver(&self) -> &TemplateResolver {
        &self.resolver
    }

    pub const fn capabilities(&self) -> &Arc<Capabilities> {
        &self.capabilities
    }

    /// Pieces known for `template`. With `recursive`, only pieces fetched
    /// recursively count.
    pub fn check(&self, template: &AddressTemplate, recursive: bool) -> Presence {
        let key = match self.resolver.key(template) {
            Ok(key) => key,
            Err(e) => {
                warn!("Unable to compute registry key for {}: {}", template, e);
                return Presence::NOTHING;
            }
        };
        let entries = self.entries.read();
        let mut presence = Presence::NOTHING;
        if entries
            .descriptions
            .get(&key)
            .is_some_and(|d| !recursive || d.is_recursive())
        {
            presence |= Presence::RESOURCE_DESCRIPTION;
        }
        if entries
            .security_contexts
            .get(&key)
            .is_some_and(|c| !recursive || c.is_recursive())
        {
            presence |= Presence::SECURITY_CONTEXT;
        }
        presence
    }

    /// Check if both pieces are known for `template`
    pub fn contains(&self, template: &AddressTemplate) -> bool {
        self.check(template, false).is_complete()
    }

    /// Metadata of `template`. Fails with [`MetaError::MissingMetadata`]
    /// unless both pieces are known.
    pub fn lookup(&self, template: &AddressTemplate) -> Result<Metadata> {
        let key = self.resolver.key(template)?;
        let entries = self.entries.read();
        match (
            entries.security_contexts.get(&key),
            entries.descriptions.get(&key),
        ) {
            (Some(context), Some(description)) => Ok(Metadata::new(
                template.clone(),
                context.clone(),
                description.clone(),
                self.capabilities.clone(),
            )),
            _ => Err(MetaError::missing_metadata(template)),
        }
    }

    /// Store every piece under one write lock, replacing older entries
    pub fn add_all(&self, pieces: MetadataPieces) {
        if pieces.is_empty() {
            return;
        }
        let (descriptions, contexts) = (pieces.descriptions.len(), pieces.security_contexts.len());
        let mut entries = self.entries.write();
        for (key, description) in pieces.descriptions {
            for capability in description.capabilities() {
                self.capabilities.register(capability, key.clone());
            }
            entries.descriptions.insert(key, Arc::new(description));
        }
        for (key, context) in pieces.security_contexts {
            entries.security_contexts.insert(key, Arc::new(context));
        }
        debug!(
            "Added {} descriptions and {} security contexts to the registry",
            descriptions, contexts
        );
    }

    pub fn description_count(&self) -> usize {
        self.entries.read().descriptions.len()
    }

    pub fn security_context_count(&self) -> usize {
        self.entries.read().security_contexts.len()
    }
}
