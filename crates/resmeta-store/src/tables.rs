//! Redb table definitions for persistent metadata storage.

use redb::TableDefinition;
use std::fmt;
use std::str::FromStr;

// Key: concrete address ("/subsystem=mail"), Value: JSON document
pub const RESOURCE_DESCRIPTIONS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("resource_descriptions");
pub const SECURITY_CONTEXTS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("security_contexts");

/// The two metadata tables
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetaTable {
    ResourceDescriptions,
    SecurityContexts,
}

impl MetaTable {
    pub const ALL: [Self; 2] = [Self::ResourceDescriptions, Self::SecurityContexts];

    #[must_use]
    pub const fn definition(self) -> TableDefinition<'static, &'static str, &'static [u8]> {
        match self {
            Self::ResourceDescriptions => RESOURCE_DESCRIPTIONS,
            Self::SecurityContexts => SECURITY_CONTEXTS,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ResourceDescriptions => "descriptions",
            Self::SecurityContexts => "security",
        }
    }
}

impl fmt::Display for MetaTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetaTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| format!("unknown table '{s}' (expected descriptions or security)"))
    }
}
