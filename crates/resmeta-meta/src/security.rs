//! Security contexts
//!
//! A security context holds the access-control facts of the current user for
//! one resource: whether the resource itself is readable and writable, and
//! per-attribute and per-operation overrides. Attributes without an override
//! inherit the resource flags; operations without one are executable when
//! the resource is writable.

use resmeta_dmr::model::{ATTRIBUTES, EXECUTE, OPERATIONS, READ, WRITE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Read/write flags of one attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeAccess {
    pub read: bool,
    pub write: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContext {
    readable: bool,
    writable: bool,
    #[serde(default)]
    attributes: BTreeMap<String, AttributeAccess>,
    #[serde(default)]
    operations: BTreeMap<String, bool>,
    #[serde(default)]
    recursive: bool,
}

impl SecurityContext {
    /// Everything readable, nothing writable or executable
    pub const READ_ONLY: Self = Self::uniform(true, false);

    /// Everything readable, writable and executable
    pub const RWX: Self = Self::uniform(true, true);

    const fn uniform(readable: bool, writable: bool) -> Self {
        Self {
            readable,
            writable,
            attributes: BTreeMap::new(),
            operations: BTreeMap::new(),
            recursive: false,
        }
    }

    /// Context with uniform flags and no overrides
    #[must_use]
    pub const fn new(readable: bool, writable: bool) -> Self {
        Self::uniform(readable, writable)
    }

    /// Parse the access-control model of one resource:
    /// `{"read": .., "write": .., "attributes": {..}, "operations": {..}}`.
    /// Missing flags count as denied.
    #[must_use]
    pub fn from_model(model: &Value, recursive: bool) -> Self {
        let flag = |v: &Value, key: &str| v.get(key).and_then(Value::as_bool).unwrap_or(false);

        let attributes = model
            .get(ATTRIBUTES)
            .and_then(Value::as_object)
            .map(|attrs| {
                attrs
                    .iter()
                    .map(|(name, a)| {
                        (
                            name.clone(),
                            AttributeAccess {
                                read: flag(a, READ),
                                write: flag(a, WRITE),
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        let operations = model
            .get(OPERATIONS)
            .and_then(Value::as_object)
            .map(|ops| {
                ops.iter()
                    .map(|(name, o)| (name.clone(), flag(o, EXECUTE)))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            readable: flag(model, READ),
            writable: flag(model, WRITE),
            attributes,
            operations,
            recursive,
        }
    }

    #[must_use]
    pub const fn is_readable(&self) -> bool {
        self.readable
    }

    #[must_use]
    pub const fn is_writable(&self) -> bool {
        self.writable
    }

    #[must_use]
    pub const fn is_recursive(&self) -> bool {
        self.recursive
    }

    #[must_use]
    pub fn is_attribute_readable(&self, attribute: &str) -> bool {
        self.attributes
            .get(attribute)
            .map_or(self.readable, |a| a.read)
    }

    #[must_use]
    pub fn is_attribute_writable(&self, attribute: &str) -> bool {
        self.attributes
            .get(attribute)
            .map_or(self.writable, |a| a.write)
    }

    #[must_use]
    pub fn is_executable(&self, operation: &str) -> bool {
        self.operations
            .get(operation)
            .copied()
            .unwrap_or(self.writable)
    }

    #[must_use]
    pub const fn operations(&self) -> &BTreeMap<String, bool> {
        &self.operations
    }

    /// Copy of this context with different resource flags, keeping the
    /// operation overrides
    #[must_use]
    pub fn with_flags(&self, readable: bool, writable: bool) -> Self {
        Self {
            readable,
            writable,
            attributes: BTreeMap::new(),
            operations: self.operations.clone(),
            recursive: self.recursive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_model() {
        let ctx = SecurityContext::from_model(
            &json!({
                "read": true,
                "write": false,
                "attributes": {
                    "password": {"read": false, "write": false},
                    "debug": {"read": true, "write": true}
                },
                "operations": {"add": {"execute": true}, "remove": {"execute": false}}
            }),
            true,
        );
        assert!(ctx.is_readable());
        assert!(!ctx.is_writable());
        assert!(ctx.is_recursive());
        assert!(!ctx.is_attribute_readable("password"));
        assert!(ctx.is_attribute_writable("debug"));
        assert!(ctx.is_attribute_readable("other"));
        assert!(!ctx.is_attribute_writable("other"));
        assert!(ctx.is_executable("add"));
        assert!(!ctx.is_executable("remove"));
        assert!(!ctx.is_executable("undefined"));
    }

    #[test]
    fn test_missing_flags_are_denied() {
        let ctx = SecurityContext::from_model(&json!({}), false);
        assert!(!ctx.is_readable());
        assert!(!ctx.is_writable());
    }

    #[test]
    fn test_constants() {
        assert!(SecurityContext::RWX.is_executable("anything"));
        assert!(SecurityContext::RWX.is_attribute_writable("anything"));
        assert!(SecurityContext::READ_ONLY.is_attribute_readable("anything"));
        assert!(!SecurityContext::READ_ONLY.is_attribute_writable("anything"));
        assert!(!SecurityContext::READ_ONLY.is_executable("anything"));
    }

    #[test]
    fn test_document_form() {
        let ctx = SecurityContext::from_model(
            &json!({"read": true, "write": true, "operations": {"add": {"execute": false}}}),
            false,
        );
        let doc = serde_json::to_value(&ctx).unwrap();
        let back: SecurityContext = serde_json::from_value(doc).unwrap();
        assert_eq!(back, ctx);
    }
}
