//! Operations, composites and their results

use crate::address::ResourceAddress;
use crate::error::ModelError;
use crate::model::{
    ADDRESS, COMPOSITE, FAILED, FAILURE_DESCRIPTION, OPERATION, OUTCOME, RESULT, STEP_PREFIX,
    STEPS,
};
use serde_json::{Map, Value};
use std::fmt;

/// A management operation against one address
#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    name: String,
    address: ResourceAddress,
    params: Map<String, Value>,
}

impl Operation {
    pub fn new(name: impl Into<String>, address: ResourceAddress) -> Self {
        Self {
            name: name.into(),
            address,
            params: Map::new(),
        }
    }

    /// Set a parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn address(&self) -> &ResourceAddress {
        &self.address
    }

    #[must_use]
    pub fn get_param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    #[must_use]
    pub const fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Model form: `{"operation": ..., "address": [...], <params>}`
    #[must_use]
    pub fn to_model(&self) -> Value {
        let mut model = Map::new();
        model.insert(OPERATION.to_string(), Value::String(self.name.clone()));
        model.insert(ADDRESS.to_string(), self.address.to_model());
        for (key, value) in &self.params {
            model.insert(key.clone(), value.clone());
        }
        Value::Object(model)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.name)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self
                .params
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => format!("{k}={s}"),
                    other => format!("{k}={other}"),
                })
                .collect();
            write!(f, "({})", params.join(","))?;
        }
        Ok(())
    }
}

/// Several operations executed in one round trip
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Composite {
    operations: Vec<Operation>,
}

impl Composite {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            operations: Vec::new(),
        }
    }

    pub fn add(&mut self, operation: Operation) -> &mut Self {
        self.operations.push(operation);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    #[must_use]
    pub fn to_model(&self) -> Value {
        let mut model = Map::new();
        model.insert(OPERATION.to_string(), Value::String(COMPOSITE.to_string()));
        model.insert(ADDRESS.to_string(), Value::Array(Vec::new()));
        model.insert(
            STEPS.to_string(),
            Value::Array(self.operations.iter().map(Operation::to_model).collect()),
        );
        Value::Object(model)
    }
}

impl From<Vec<Operation>> for Composite {
    fn from(operations: Vec<Operation>) -> Self {
        Self { operations }
    }
}

/// Outcome and payload of one operation
#[derive(Clone, Debug, PartialEq)]
pub struct StepResult {
    failed: bool,
    result: Value,
    failure_description: Option<String>,
}

impl StepResult {
    #[must_use]
    pub const fn success(result: Value) -> Self {
        Self {
            failed: false,
            result,
            failure_description: None,
        }
    }

    pub fn failure(description: impl Into<String>) -> Self {
        Self {
            failed: true,
            result: Value::Null,
            failure_description: Some(description.into()),
        }
    }

    /// Parse `{"outcome": ..., "result": ..., "failure-description": ...}`.
    /// A missing outcome counts as success.
    pub fn from_model(model: &Value) -> Result<Self, ModelError> {
        let object = model
            .as_object()
            .ok_or_else(|| ModelError::unexpected_shape(format!("step must be an object, got {model}")))?;
        let failed = object.get(OUTCOME).and_then(Value::as_str) == Some(FAILED);
        let failure_description = object.get(FAILURE_DESCRIPTION).map(|d| match d {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        Ok(Self {
            failed,
            result: object.get(RESULT).cloned().unwrap_or(Value::Null),
            failure_description,
        })
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.failed
    }

    #[must_use]
    pub const fn result(&self) -> &Value {
        &self.result
    }

    #[must_use]
    pub fn into_result(self) -> Value {
        self.result
    }

    #[must_use]
    pub fn failure_description(&self) -> &str {
        self.failure_description.as_deref().unwrap_or("unknown failure")
    }
}

/// Step results of a composite, in step order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompositeResult {
    steps: Vec<StepResult>,
}

impl CompositeResult {
    #[must_use]
    pub const fn new(steps: Vec<StepResult>) -> Self {
        Self { steps }
    }

    /// Parse `{"step-1": {...}, "step-2": {...}}`. Steps are ordered by their
    /// number, not by their position in the object.
    pub fn from_model(model: &Value) -> Result<Self, ModelError> {
        let object = model.as_object().ok_or_else(|| {
            ModelError::unexpected_shape(format!("composite result must be an object, got {model}"))
        })?;

        let mut numbered = Vec::with_capacity(object.len());
        for (name, step) in object {
            let index = name
                .strip_prefix(STEP_PREFIX)
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| {
                    ModelError::unexpected_shape(format!("unexpected composite step '{name}'"))
                })?;
            numbered.push((index, StepResult::from_model(step)?));
        }
        numbered.sort_by_key(|(index, _)| *index);

        Ok(Self {
            steps: numbered.into_iter().map(|(_, step)| step).collect(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step by zero-based index
    #[must_use]
    pub fn step(&self, index: usize) -> Option<&StepResult> {
        self.steps.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StepResult> {
        self.steps.iter()
    }
}

impl IntoIterator for CompositeResult {
    type Item = StepResult;
    type IntoIter = std::vec::IntoIter<StepResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ACCESS_CONTROL, READ_RESOURCE_DESCRIPTION, TRIM_DESCRIPTIONS};
    use serde_json::json;

    #[test]
    fn test_operation_model() {
        let address: ResourceAddress = "/subsystem=mail".parse().unwrap();
        let op = Operation::new(READ_RESOURCE_DESCRIPTION, address)
            .param(ACCESS_CONTROL, TRIM_DESCRIPTIONS)
            .param("operations", true);

        assert_eq!(
            op.get_param(ACCESS_CONTROL),
            Some(&Value::String(TRIM_DESCRIPTIONS.to_string()))
        );
        let model = op.to_model();
        assert_eq!(model["operation"], "read-resource-description");
        assert_eq!(model["address"], json!([{"subsystem": "mail"}]));
        assert_eq!(model["operations"], true);
        assert_eq!(
            op.to_string(),
            "/subsystem=mail:read-resource-description(access-control=trim-descriptions,operations=true)"
        );
    }

    #[test]
    fn test_composite_model() {
        let mut composite = Composite::new();
        composite.add(Operation::new("a", ResourceAddress::root()));
        composite.add(Operation::new("b", ResourceAddress::root()));
        assert_eq!(composite.len(), 2);
        let model = composite.to_model();
        assert_eq!(model["operation"], "composite");
        assert_eq!(model["steps"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_composite_result_step_order() {
        let model = json!({
            "step-10": {"outcome": "success", "result": 10},
            "step-2": {"outcome": "success", "result": 2},
            "step-1": {"outcome": "failed", "failure-description": "boom"},
        });
        let result = CompositeResult::from_model(&model).unwrap();
        assert_eq!(result.len(), 3);
        assert!(result.step(0).unwrap().is_failure());
        assert_eq!(result.step(0).unwrap().failure_description(), "boom");
        assert_eq!(result.step(1).unwrap().result(), &json!(2));
        assert_eq!(result.step(2).unwrap().result(), &json!(10));
    }

    #[test]
    fn test_composite_result_rejects_unknown_key() {
        let err = CompositeResult::from_model(&json!({"outcome": "success"})).unwrap_err();
        assert!(matches!(err, ModelError::UnexpectedShape(_)));
        assert!(CompositeResult::from_model(&json!([])).is_err());
    }
}
