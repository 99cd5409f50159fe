//! Resmeta Template - Address templates
//!
//! An address template is a generic path into the management model:
//!
//! ```text
//! {selected.profile}/subsystem=datasources/data-source={selection}
//! opt://host=*/server-config=*
//! ```
//!
//! Templates are resolved into concrete [`ResourceAddress`]es against a
//! [`StatementContext`], and concrete addresses are turned back into
//! templates through an [`Unresolver`].
//!
//! [`ResourceAddress`]: resmeta_dmr::ResourceAddress

pub mod context;
pub mod error;
pub mod filter;
mod resolve;
pub mod selection;
pub mod template;
pub mod unresolve;

pub use context::{BaseContext, StatementContext};
pub use error::{Result, TemplateError};
pub use filter::{Filter, FilteringContext, SELECTION};
pub use resolve::BLANK;
pub use selection::{SelectionContext, Tuple};
pub use template::{AddressTemplate, Token};
pub use unresolve::{SegmentRef, UnresolvePolicy, Unresolver};
