use super::{
    LookupContext, LookupDatabaseTask, LookupRegistryTask, RrdTask, TaskChain, UpdateDatabaseTask,
    UpdateRegistryTask,
};
use crate::error::Result;
use crate::lookup::LookupResult;
use crate::metadata::Metadata;
use crate::registry::MetadataRegistry;
use crate::required::RequiredResources;
use dashmap::DashMap;
use resmeta_common::config::ProcessingConfig;
use resmeta_dmr::Dispatcher;
use resmeta_store::{MetaDatabase, WorkerChannel};
use resmeta_template::AddressTemplate;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// How a screen's metadata processing ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenOutcome {
    /// Metadata of the screen is in the registry
    Completed,
    /// A newer call for the same screen started meanwhile. Fetched metadata
    /// was still cached.
    Superseded,
}

pub struct ProcessorBuilder {
    registry: Arc<MetadataRegistry>,
    dispatcher: Arc<dyn Dispatcher>,
    settings: ProcessingConfig,
    database: Option<(Arc<dyn MetaDatabase>, WorkerChannel)>,
    required: RequiredResources,
}

impl ProcessorBuilder {
    #[must_use]
    pub fn settings(mut self, settings: ProcessingConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Consult `database` after the registry and persist fetched metadata
    /// through `worker`
    #[must_use]
    pub fn database(mut self, database: Arc<dyn MetaDatabase>, worker: WorkerChannel) -> Self {
        self.database = Some((database, worker));
        self
    }

    #[must_use]
    pub fn required_resources(mut self, required: RequiredResources) -> Self {
        self.required = required;
        self
    }

    pub fn build(self) -> MetadataProcessor {
        let resolver = self.registry.resolver().clone();

        let mut lookup = TaskChain::new();
        lookup.add(LookupRegistryTask::new(self.registry.clone()));
        let mut fetch = TaskChain::new();
        fetch.add(RrdTask::new(self.dispatcher, resolver.clone(), self.settings));
        fetch.add(UpdateRegistryTask::new(self.registry.clone()));

        if let Some((database, worker)) = self.database {
            lookup.add(LookupDatabaseTask::new(database, resolver));
            fetch.add(UpdateDatabaseTask::new(worker));
        }

        MetadataProcessor {
            registry: self.registry,
            lookup,
            fetch,
            required: self.required,
            generation: AtomicU64::new(0),
            screens: DashMap::new(),
        }
    }
}

/// Entry point of the metadata pipeline
pub struct MetadataProcessor {
    registry: Arc<MetadataRegistry>,
    lookup: TaskChain,
    fetch: TaskChain,
    required: RequiredResources,
    generation: AtomicU64,
    screens: DashMap<String, u64>,
}

impl MetadataProcessor {
    pub fn builder(registry: Arc<MetadataRegistry>, dispatcher: Arc<dyn Dispatcher>) -> ProcessorBuilder {
        ProcessorBuilder {
            registry,
            dispatcher,
            settings: ProcessingConfig::default(),
            database: None,
            required: RequiredResources::new(),
        }
    }

    pub const fn registry(&self) -> &Arc<MetadataRegistry> {
        &self.registry
    }

    pub const fn required_resources(&self) -> &RequiredResources {
        &self.required
    }

    /// What the registry and the database already know, without touching
    /// the network. Database hits are added to the registry.
    pub async fn check(
        &self,
        templates: impl IntoIterator<Item = AddressTemplate> + Send,
        recursive: bool,
    ) -> Result<LookupResult> {
        let mut context = LookupContext::new(templates, recursive);
        self.lookup.apply_until_complete(&mut context).await?;
        self.registry.add_all(std::mem::take(&mut context.to_registry));
        Ok(context.lookup_result)
    }

    /// Make sure the registry holds the metadata of `templates`, fetching
    /// what neither the registry nor the database knows.
    pub async fn process(
        &self,
        templates: impl IntoIterator<Item = AddressTemplate> + Send,
        recursive: bool,
    ) -> Result<()> {
        let start = Instant::now();
        let mut context = LookupContext::new(templates, recursive);
        if context.lookup_result.is_empty() {
            return Ok(());
        }

        self.lookup.apply_until_complete(&mut context).await?;
        if !context.all_present() || !context.to_registry.is_empty() {
            self.fetch.apply(&mut context).await?;
        }
        info!(
            "Successfully processed metadata in {} ms",
            start.elapsed().as_millis()
        );
        Ok(())
    }

    /// Process `template`, then return its metadata from the registry
    pub async fn lookup(&self, template: &AddressTemplate) -> Result<Metadata> {
        self.process([template.clone()], false).await?;
        self.registry.lookup(template)
    }

    /// Process the required resources of screen `id`
    pub async fn process_screen(&self, id: &str) -> Result<ScreenOutcome> {
        let templates = self.required.resources(id).to_vec();
        if templates.is_empty() {
            debug!("No required resources for screen {}", id);
            return Ok(ScreenOutcome::Completed);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.screens.insert(id.to_string(), generation);
        let result = self.process(templates, self.required.is_recursive(id)).await;

        let latest = self.screens.get(id).map(|g| *g);
        if latest != Some(generation) {
            debug!("Processing of screen {} was superseded", id);
            return Ok(ScreenOutcome::Superseded);
        }
        result.map(|()| ScreenOutcome::Completed)
    }
}
