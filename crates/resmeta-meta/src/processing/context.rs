use crate::lookup::LookupResult;
use crate::registry::MetadataPieces;
use resmeta_template::AddressTemplate;

/// State shared by the tasks of one pipeline run
#[derive(Debug, Default)]
pub struct LookupContext {
    pub recursive: bool,
    pub lookup_result: LookupResult,
    /// Pieces to add to the registry: database hits and fetched metadata
    pub to_registry: MetadataPieces,
    /// Freshly fetched pieces to persist
    pub to_database: MetadataPieces,
}

impl LookupContext {
    pub fn new(templates: impl IntoIterator<Item = AddressTemplate>, recursive: bool) -> Self {
        Self {
            recursive,
            lookup_result: LookupResult::new(templates),
            to_registry: MetadataPieces::default(),
            to_database: MetadataPieces::default(),
        }
    }

    #[must_use]
    pub fn all_present(&self) -> bool {
        self.lookup_result.all_present()
    }
}
