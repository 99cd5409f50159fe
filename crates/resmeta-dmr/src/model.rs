//! Model names used by the read-resource-description protocol

// Operations
pub const READ_RESOURCE_DESCRIPTION: &str = "read-resource-description";
pub const COMPOSITE: &str = "composite";

// Operation parameters
pub const OPERATION: &str = "operation";
pub const ADDRESS: &str = "address";
pub const STEPS: &str = "steps";
pub const ACCESS_CONTROL: &str = "access-control";
pub const COMBINED_DESCRIPTIONS: &str = "combined-descriptions";
pub const TRIM_DESCRIPTIONS: &str = "trim-descriptions";
pub const OPERATIONS: &str = "operations";
pub const RECURSIVE: &str = "recursive";
pub const RECURSIVE_DEPTH: &str = "recursive-depth";
pub const INCLUDE_ALIASES: &str = "include-aliases";

// Responses
pub const OUTCOME: &str = "outcome";
pub const SUCCESS: &str = "success";
pub const FAILED: &str = "failed";
pub const RESULT: &str = "result";
pub const FAILURE_DESCRIPTION: &str = "failure-description";
pub const STEP_PREFIX: &str = "step-";

// Descriptions
pub const DESCRIPTION: &str = "description";
pub const ATTRIBUTES: &str = "attributes";
pub const CHILDREN: &str = "children";
pub const MODEL_DESCRIPTION: &str = "model-description";
pub const REQUEST_PROPERTIES: &str = "request-properties";
pub const CAPABILITIES: &str = "capabilities";
pub const NAME: &str = "name";

// Access control
pub const DEFAULT: &str = "default";
pub const EXCEPTIONS: &str = "exceptions";
pub const READ: &str = "read";
pub const WRITE: &str = "write";
pub const EXECUTE: &str = "execute";

/// Wildcard value of an address segment
pub const WILDCARD: &str = "*";
