//! Read-resource-description response parsing
//!
//! A single response is either one payload for the operation's address or,
//! for wildcard addresses, a list of `{"address": .., "result": ..}` entries.
//! Each payload yields the description and security context of its address
//! and recurses into `children.<type>.model-description.<name>`.

use crate::description::ResourceDescription;
use crate::error::ParserError;
use crate::security::SecurityContext;
use resmeta_dmr::model::{
    ACCESS_CONTROL, ADDRESS, CHILDREN, DEFAULT, DESCRIPTION, EXCEPTIONS, FAILED, MODEL_DESCRIPTION,
    OUTCOME, RECURSIVE, RESULT,
};
use resmeta_dmr::{CompositeResult, Operation, ResourceAddress};
use resmeta_template::AddressTemplate;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Metadata parsed for one concrete address
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RrdResult {
    pub description: Option<ResourceDescription>,
    pub security_context: Option<SecurityContext>,
}

/// Parsed results per address. The first value for each piece wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RrdResults {
    results: BTreeMap<ResourceAddress, RrdResult>,
}

impl RrdResults {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn description(&mut self, address: ResourceAddress, description: ResourceDescription) {
        let entry = self.results.entry(address).or_default();
        if entry.description.is_none() {
            entry.description = Some(description);
        }
    }

    fn security_context(&mut self, address: ResourceAddress, context: SecurityContext) {
        let entry = self.results.entry(address).or_default();
        if entry.security_context.is_none() {
            entry.security_context = Some(context);
        }
    }

    pub fn merge(&mut self, other: Self) {
        for (address, result) in other.results {
            if let Some(description) = result.description {
                self.description(address.clone(), description);
            }
            if let Some(context) = result.security_context {
                self.security_context(address, context);
            }
        }
    }

    #[must_use]
    pub fn get(&self, address: &ResourceAddress) -> Option<&RrdResult> {
        self.results.get(address)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceAddress, &RrdResult)> {
        self.results.iter()
    }
}

impl IntoIterator for RrdResults {
    type Item = (ResourceAddress, RrdResult);
    type IntoIter = std::collections::btree_map::IntoIter<ResourceAddress, RrdResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

/// Parser for the result of one read-resource-description operation
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleRrdParser {
    recursive: bool,
}

impl SingleRrdParser {
    #[must_use]
    pub const fn new(recursive: bool) -> Self {
        Self { recursive }
    }

    pub fn parse(&self, address: &ResourceAddress, payload: &Value) -> Result<RrdResults, ParserError> {
        let mut results = RrdResults::new();
        match payload {
            Value::Array(entries) => {
                for entry in entries {
                    if entry.get(OUTCOME).and_then(Value::as_str) == Some(FAILED) {
                        warn!("Skipping failed list entry for {}", address);
                        continue;
                    }
                    let entry_address = ResourceAddress::from_model(
                        entry.get(ADDRESS).unwrap_or(&Value::Null),
                    )?;
                    let result = entry.get(RESULT).ok_or_else(|| {
                        ParserError::unexpected_shape(&entry_address, "list entry without result")
                    })?;
                    self.parse_payload(entry_address, result, &mut results)?;
                }
            }
            Value::Object(_) => self.parse_payload(address.clone(), payload, &mut results)?,
            other => {
                return Err(ParserError::unexpected_shape(
                    address,
                    format!("expected an object or a list, got {other}"),
                ));
            }
        }
        Ok(results)
    }

    fn parse_payload(
        &self,
        address: ResourceAddress,
        payload: &Value,
        results: &mut RrdResults,
    ) -> Result<(), ParserError> {
        let object = payload
            .as_object()
            .ok_or_else(|| ParserError::unexpected_shape(&address, "payload must be an object"))?;

        if let Some(access_control) = object.get(ACCESS_CONTROL) {
            self.parse_access_control(&address, access_control, results)?;
        }

        if object.contains_key(DESCRIPTION) {
            let description: Map<String, Value> = object
                .iter()
                .filter(|(k, _)| *k != CHILDREN && *k != ACCESS_CONTROL)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            results.description(
                address.clone(),
                ResourceDescription::new(Value::Object(description), self.recursive),
            );
        }

        if let Some(children) = object.get(CHILDREN).and_then(Value::as_object) {
            for (child_type, child) in children {
                let Some(descriptions) = child.get(MODEL_DESCRIPTION).and_then(Value::as_object)
                else {
                    continue;
                };
                for (name, nested) in descriptions {
                    // depth exhausted
                    if !nested.is_object() {
                        continue;
                    }
                    self.parse_payload(address.child(child_type, name), nested, results)?;
                }
            }
        }
        Ok(())
    }

    fn parse_access_control(
        &self,
        address: &ResourceAddress,
        access_control: &Value,
        results: &mut RrdResults,
    ) -> Result<(), ParserError> {
        if let Some(default) = access_control.get(DEFAULT) {
            results.security_context(
                address.clone(),
                SecurityContext::from_model(default, self.recursive),
            );
        }
        if let Some(exceptions) = access_control.get(EXCEPTIONS).and_then(Value::as_object) {
            for exception in exceptions.values() {
                let exception_address =
                    ResourceAddress::from_model(exception.get(ADDRESS).unwrap_or(&Value::Null))?;
                results.security_context(
                    exception_address,
                    SecurityContext::from_model(exception, self.recursive),
                );
            }
        }
        Ok(())
    }
}

/// Parser for a composite of read-resource-description operations. Each
/// operation is paired with the template it was created for.
pub struct CompositeRrdParser<'a> {
    operations: &'a [(AddressTemplate, Operation)],
}

impl<'a> CompositeRrdParser<'a> {
    #[must_use]
    pub const fn new(operations: &'a [(AddressTemplate, Operation)]) -> Self {
        Self { operations }
    }

    /// Parse every step. Failed or malformed steps abort the parse unless
    /// their template is optional, in which case they are skipped.
    pub fn parse(&self, result: &CompositeResult) -> Result<RrdResults, ParserError> {
        let mut results = RrdResults::new();
        for (step, (template, operation)) in self.operations.iter().enumerate() {
            let address = operation.address();
            let Some(step_result) = result.step(step) else {
                if template.is_optional() {
                    debug!("No result for optional {}", template);
                    continue;
                }
                return Err(ParserError::MissingStep {
                    step,
                    address: address.to_string(),
                });
            };

            if step_result.is_failure() {
                if template.is_optional() {
                    debug!(
                        "Ignoring failed step for optional {}: {}",
                        template,
                        step_result.failure_description()
                    );
                    continue;
                }
                return Err(ParserError::FailedStep {
                    step,
                    address: address.to_string(),
                    reason: step_result.failure_description().to_string(),
                });
            }

            let recursive = operation
                .get_param(RECURSIVE)
                .and_then(Value::as_bool)
                .unwrap_or(false);
            match SingleRrdParser::new(recursive).parse(address, step_result.result()) {
                Ok(parsed) => results.merge(parsed),
                Err(e) if template.is_optional() => {
                    warn!("Ignoring unparsable result for optional {}: {}", template, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(results)
    }
}
