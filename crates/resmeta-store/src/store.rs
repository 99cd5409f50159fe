//! Persistent metadata database backed by redb.
//!
//! Documents are stored as JSON bytes. Every write is its own write
//! transaction, so a batch handed to [`RedbDatabase::put_documents`] is
//! either stored completely or not at all.

use crate::database::{Documents, MetaDatabase, in_subtree};
use crate::error::StoreResult;
use crate::tables::MetaTable;
use async_trait::async_trait;
use redb::{Database, ReadableTable, ReadableTableMetadata};
use std::path::Path;
use tracing::{debug, error};

/// Metadata database backed by a redb file
pub struct RedbDatabase {
    db: Database,
}

impl RedbDatabase {
    /// Open (or create) the redb database at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Create all tables eagerly so later read txns don't fail
        let write_txn = db.begin_write()?;
        for table in MetaTable::ALL {
            let _t = write_txn.open_table(table.definition())?;
        }
        write_txn.commit()?;

        debug!("Opened metadata database at {}", path.display());
        Ok(Self { db })
    }

    pub fn get_documents(&self, table: MetaTable, keys: &[String]) -> StoreResult<Documents> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table.definition())?;
        let mut result = Documents::new();
        for key in keys {
            if let Some(bytes) = t.get(key.as_str())? {
                match serde_json::from_slice(bytes.value()) {
                    Ok(doc) => {
                        result.insert(key.clone(), doc);
                    }
                    Err(e) => error!("Failed to decode {} document '{}': {}", table, key, e),
                }
            }
        }
        Ok(result)
    }

    pub fn put_documents(&self, table: MetaTable, documents: &Documents) -> StoreResult<Vec<String>> {
        let encoded = documents
            .iter()
            .map(|(key, doc)| Ok((key.as_str(), serde_json::to_vec(doc)?)))
            .collect::<StoreResult<Vec<_>>>()?;

        let write_txn = self.db.begin_write()?;
        {
            let mut t = write_txn.open_table(table.definition())?;
            for (key, bytes) in &encoded {
                t.insert(*key, bytes.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(documents.keys().cloned().collect())
    }

    pub fn subtree(&self, table: MetaTable, root: &str) -> StoreResult<Documents> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table.definition())?;
        let start = if root == "/" { "" } else { root };
        let mut result = Documents::new();
        for entry in t.range(start..)? {
            let (key, bytes) = entry?;
            let key = key.value();
            if !key.starts_with(start) {
                break;
            }
            if !in_subtree(key, root) {
                continue;
            }
            match serde_json::from_slice(bytes.value()) {
                Ok(doc) => {
                    result.insert(key.to_string(), doc);
                }
                Err(e) => error!("Failed to decode {} document '{}': {}", table, key, e),
            }
        }
        Ok(result)
    }

    pub fn keys(&self, table: MetaTable) -> StoreResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table.definition())?;
        let mut result = Vec::new();
        for entry in t.iter()? {
            let entry = entry?;
            result.push(entry.0.value().to_string());
        }
        Ok(result)
    }

    pub fn clear_table(&self, table: MetaTable) -> StoreResult<usize> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut t = write_txn.open_table(table.definition())?;
            let removed = usize::try_from(t.len()?).unwrap_or(usize::MAX);
            t.retain(|_, _| false)?;
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }
}

#[async_trait]
impl MetaDatabase for RedbDatabase {
    async fn get_many(&self, table: MetaTable, keys: &[String]) -> StoreResult<Documents> {
        self.get_documents(table, keys)
    }

    async fn put_many(&self, table: MetaTable, documents: Documents) -> StoreResult<Vec<String>> {
        self.put_documents(table, &documents)
    }

    async fn get_subtree(&self, table: MetaTable, root: &str) -> StoreResult<Documents> {
        self.subtree(table, root)
    }

    async fn list(&self, table: MetaTable) -> StoreResult<Vec<String>> {
        self.keys(table)
    }

    async fn clear(&self, table: MetaTable) -> StoreResult<usize> {
        self.clear_table(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(entries: &[(&str, serde_json::Value)]) -> Documents {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_put_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let db = RedbDatabase::open(dir.path().join("meta.redb")).unwrap();

        let stored = db
            .put_documents(
                MetaTable::ResourceDescriptions,
                &docs(&[
                    ("/subsystem=mail", json!({"description": "mail"})),
                    ("/subsystem=jmx", json!({"description": "jmx"})),
                ]),
            )
            .unwrap();
        assert_eq!(stored.len(), 2);

        let found = db
            .get_documents(
                MetaTable::ResourceDescriptions,
                &["/subsystem=mail".to_string(), "/subsystem=absent".to_string()],
            )
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found["/subsystem=mail"]["description"], "mail");

        // tables are separate
        assert!(
            db.get_documents(MetaTable::SecurityContexts, &["/subsystem=mail".to_string()])
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_subtree() {
        let dir = tempfile::tempdir().unwrap();
        let db = RedbDatabase::open(dir.path().join("meta.redb")).unwrap();
        db.put_documents(
            MetaTable::SecurityContexts,
            &docs(&[
                ("/subsystem=mail", json!(1)),
                ("/subsystem=mail/mail-session=*", json!(2)),
                ("/subsystem=mail/mail-session=*/server=imap", json!(3)),
                ("/subsystem=mailer", json!(4)),
                ("/subsystem=logging", json!(5)),
            ]),
        )
        .unwrap();

        let subtree = db.subtree(MetaTable::SecurityContexts, "/subsystem=mail").unwrap();
        assert_eq!(subtree.len(), 3);
        assert!(!subtree.contains_key("/subsystem=mailer"));

        assert_eq!(db.subtree(MetaTable::SecurityContexts, "/").unwrap().len(), 5);
    }

    #[test]
    fn test_persists_across_reopen_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("meta.redb");
        {
            let db = RedbDatabase::open(&path).unwrap();
            db.put_documents(MetaTable::ResourceDescriptions, &docs(&[("/a=b", json!({}))]))
                .unwrap();
        }
        let db = RedbDatabase::open(&path).unwrap();
        assert_eq!(db.keys(MetaTable::ResourceDescriptions).unwrap(), vec!["/a=b"]);
        assert_eq!(db.clear_table(MetaTable::ResourceDescriptions).unwrap(), 1);
        assert!(db.keys(MetaTable::ResourceDescriptions).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trait_get_single() {
        let dir = tempfile::tempdir().unwrap();
        let db = RedbDatabase::open(dir.path().join("meta.redb")).unwrap();
        db.put_many(MetaTable::SecurityContexts, docs(&[("/a=b", json!({"read": true}))]))
            .await
            .unwrap();
        let doc = db.get(MetaTable::SecurityContexts, "/a=b").await.unwrap();
        assert_eq!(doc, Some(json!({"read": true})));
        assert_eq!(db.get(MetaTable::SecurityContexts, "/c=d").await.unwrap(), None);
    }
}
