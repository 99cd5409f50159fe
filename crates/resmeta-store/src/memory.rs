//! In-memory metadata database for embedders without a database file

use crate::database::{Documents, MetaDatabase, in_subtree};
use crate::error::StoreResult;
use crate::tables::MetaTable;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryDatabase {
    tables: RwLock<HashMap<MetaTable, Documents>>,
}

impl MemoryDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetaDatabase for MemoryDatabase {
    async fn get_many(&self, table: MetaTable, keys: &[String]) -> StoreResult<Documents> {
        let tables = self.tables.read();
        let Some(documents) = tables.get(&table) else {
            return Ok(Documents::new());
        };
        Ok(keys
            .iter()
            .filter_map(|k| documents.get(k).map(|doc| (k.clone(), doc.clone())))
            .collect())
    }

    async fn put_many(&self, table: MetaTable, documents: Documents) -> StoreResult<Vec<String>> {
        let keys = documents.keys().cloned().collect();
        self.tables.write().entry(table).or_default().extend(documents);
        Ok(keys)
    }

    async fn get_subtree(&self, table: MetaTable, root: &str) -> StoreResult<Documents> {
        Ok(self
            .tables
            .read()
            .get(&table)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|(k, _)| in_subtree(k, root))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list(&self, table: MetaTable) -> StoreResult<Vec<String>> {
        Ok(self
            .tables
            .read()
            .get(&table)
            .map(|documents| documents.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn clear(&self, table: MetaTable) -> StoreResult<usize> {
        Ok(self
            .tables
            .write()
            .remove(&table)
            .map_or(0, |documents| documents.len()))
    }
}
