//! Dispatcher answering from a JSON file of canned responses
//!
//! The file maps concrete addresses to read-resource-description payloads:
//!
//! ```json
//! { "/subsystem=mail": { "description": "...", "access-control": { ... } } }
//! ```
//!
//! Wildcard addresses are answered with a list of every canned address they
//! match.

use anyhow::{Context, Result};
use async_trait::async_trait;
use resmeta_dmr::model::{ADDRESS, OUTCOME, RESULT, SUCCESS, WILDCARD};
use resmeta_dmr::{
    Composite, CompositeResult, DispatchError, Dispatcher, ResourceAddress, StepResult,
};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

pub struct FixtureDispatcher {
    responses: BTreeMap<ResourceAddress, Value>,
}

impl FixtureDispatcher {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: BTreeMap<String, Value> =
            serde_json::from_str(text).context("Responses must be a JSON object")?;
        let responses = raw
            .into_iter()
            .map(|(address, payload)| {
                let address: ResourceAddress = address.parse()?;
                Ok((address, payload))
            })
            .collect::<Result<_>>()?;
        Ok(Self { responses })
    }

    fn respond(&self, address: &ResourceAddress) -> Result<Value, DispatchError> {
        if let Some(payload) = self.responses.get(address) {
            return Ok(payload.clone());
        }
        if address.is_wildcard() {
            let entries: Vec<Value> = self
                .responses
                .iter()
                .filter(|(candidate, _)| matches(address, candidate))
                .map(|(candidate, payload)| {
                    json!({OUTCOME: SUCCESS, ADDRESS: candidate.to_model(), RESULT: payload})
                })
                .collect();
            if !entries.is_empty() {
                return Ok(Value::Array(entries));
            }
        }
        Err(DispatchError::new(address.to_string(), "no canned response"))
    }
}

fn matches(pattern: &ResourceAddress, candidate: &ResourceAddress) -> bool {
    pattern.len() == candidate.len()
        && pattern.iter().zip(candidate.iter()).all(|(p, c)| {
            p.key == c.key && (p.value == WILDCARD || p.value == c.value)
        })
}

#[async_trait]
impl Dispatcher for FixtureDispatcher {
    async fn execute_composite(&self, composite: &Composite) -> Result<CompositeResult, DispatchError> {
        debug!("Answering composite of {} operations", composite.len());
        Ok(CompositeResult::new(
            composite
                .iter()
                .map(|operation| match self.respond(operation.address()) {
                    Ok(payload) => StepResult::success(payload),
                    Err(e) => StepResult::failure(e.message),
                })
                .collect(),
        ))
    }
}
