//! Resmeta Meta - Metadata lookup and caching
//!
//! This crate answers "what does the management model say about the
//! resources behind these templates": attribute and operation descriptions
//! plus the access-control facts of the current user. Metadata is looked up
//! in a session registry, then in the persistent database, and only what is
//! still missing is fetched from the server in batched composite reads.

pub mod authorisation;
pub mod capabilities;
pub mod description;
pub mod error;
pub mod lookup;
pub mod metadata;
pub mod processing;
pub mod registry;
pub mod required;
pub mod security;

// Re-exports
pub use authorisation::{AuthorisationDecision, Constraint, Permission, Target};
pub use capabilities::Capabilities;
pub use description::ResourceDescription;
pub use error::{MetaError, ParserError, Result};
pub use lookup::{LookupResult, Presence};
pub use metadata::Metadata;
pub use processing::{MetadataProcessor, ScreenOutcome};
pub use registry::{MetadataRegistry, TemplateResolver};
pub use required::RequiredResources;
pub use security::SecurityContext;
