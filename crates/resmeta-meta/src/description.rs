//! Resource descriptions

use resmeta_dmr::model::{
    ATTRIBUTES, CAPABILITIES, DESCRIPTION, NAME, OPERATIONS, REQUEST_PROPERTIES,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The schema of one resource: its description text, attributes,
/// operations and capabilities, as returned by the server.
///
/// `recursive` records whether the description was fetched together with
/// the descriptions of every resource below it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescription {
    payload: Value,
    #[serde(default)]
    recursive: bool,
}

impl ResourceDescription {
    #[must_use]
    pub const fn new(payload: Value, recursive: bool) -> Self {
        Self { payload, recursive }
    }

    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    #[must_use]
    pub const fn is_recursive(&self) -> bool {
        self.recursive
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.payload.get(DESCRIPTION).and_then(Value::as_str)
    }

    #[must_use]
    pub fn attributes(&self) -> Option<&Map<String, Value>> {
        self.payload.get(ATTRIBUTES).and_then(Value::as_object)
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes().and_then(|a| a.get(name))
    }

    #[must_use]
    pub fn operations(&self) -> Option<&Map<String, Value>> {
        self.payload.get(OPERATIONS).and_then(Value::as_object)
    }

    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&Value> {
        self.operations().and_then(|o| o.get(name))
    }

    /// Request properties of an operation, if the operation is described
    #[must_use]
    pub fn request_properties(&self, operation: &str) -> Option<&Value> {
        self.operation(operation).and_then(|o| o.get(REQUEST_PROPERTIES))
    }

    /// Names of the capabilities this resource registers
    #[must_use]
    pub fn capabilities(&self) -> Vec<&str> {
        self.payload
            .get(CAPABILITIES)
            .and_then(Value::as_array)
            .map(|caps| {
                caps.iter()
                    .filter_map(|c| c.get(NAME).and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mail() -> ResourceDescription {
        ResourceDescription::new(
            json!({
                "description": "The mail subsystem",
                "attributes": {"debug": {"type": "BOOLEAN"}},
                "operations": {
                    "add": {
                        "description": "Add a mail session",
                        "request-properties": {"jndi-name": {"type": "STRING"}}
                    }
                },
                "capabilities": [{"name": "org.wildfly.mail.session", "dynamic": true}]
            }),
            false,
        )
    }

    #[test]
    fn test_accessors() {
        let d = mail();
        assert_eq!(d.description(), Some("The mail subsystem"));
        assert!(d.attribute("debug").is_some());
        assert!(d.attribute("absent").is_none());
        assert_eq!(
            d.request_properties("add").unwrap()["jndi-name"]["type"],
            "STRING"
        );
        assert_eq!(d.capabilities(), vec!["org.wildfly.mail.session"]);
        assert!(!d.is_recursive());
    }

    #[test]
    fn test_document_form() {
        let d = ResourceDescription::new(json!({"description": "x"}), true);
        let doc = serde_json::to_value(&d).unwrap();
        assert_eq!(doc["recursive"], true);
        let back: ResourceDescription = serde_json::from_value(doc).unwrap();
        assert_eq!(back, d);

        // older documents without the flag
        let plain: ResourceDescription =
            serde_json::from_value(json!({"payload": {"description": "x"}})).unwrap();
        assert!(!plain.is_recursive());
    }
}
