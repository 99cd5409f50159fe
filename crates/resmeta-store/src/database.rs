//! Metadata database contract

use crate::error::StoreResult;
use crate::tables::MetaTable;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

/// Documents keyed by concrete address
pub type Documents = BTreeMap<String, Value>;

/// Key/value store of JSON documents addressed by the serialized concrete
/// address
#[async_trait]
pub trait MetaDatabase: Send + Sync {
    /// Fetch the documents stored under `keys`. Missing keys are absent
    /// from the result.
    async fn get_many(&self, table: MetaTable, keys: &[String]) -> StoreResult<Documents>;

    /// Store documents, returning the keys written
    async fn put_many(&self, table: MetaTable, documents: Documents) -> StoreResult<Vec<String>>;

    /// Fetch the document stored under `root` and every document below it
    async fn get_subtree(&self, table: MetaTable, root: &str) -> StoreResult<Documents>;

    /// All keys of a table
    async fn list(&self, table: MetaTable) -> StoreResult<Vec<String>>;

    /// Remove every document of a table, returning how many were removed
    async fn clear(&self, table: MetaTable) -> StoreResult<usize>;

    async fn get(&self, table: MetaTable, key: &str) -> StoreResult<Option<Value>> {
        let mut documents = self.get_many(table, &[key.to_string()]).await?;
        Ok(documents.remove(key))
    }
}

/// Check if `key` is `root` or lies below it
#[must_use]
pub fn in_subtree(key: &str, root: &str) -> bool {
    if root == "/" {
        return true;
    }
    key.strip_prefix(root)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_subtree() {
        assert!(in_subtree("/subsystem=mail", "/subsystem=mail"));
        assert!(in_subtree("/subsystem=mail/mail-session=*", "/subsystem=mail"));
        assert!(!in_subtree("/subsystem=mailer", "/subsystem=mail"));
        assert!(!in_subtree("/subsystem=logging", "/subsystem=mail"));
        assert!(in_subtree("/subsystem=logging", "/"));
    }
}
