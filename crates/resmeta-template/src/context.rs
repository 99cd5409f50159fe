//! Statement contexts
//!
//! A statement context answers the variables of an address template: single
//! values for `key={variable}` tokens and `(key, value)` tuples for bare
//! `{variable}` tokens. `None` means the context has no opinion.

use crate::template::AddressTemplate;
use resmeta_dmr::Segment;

/// Resolves template variables
pub trait StatementContext: Send + Sync {
    /// Resolve a single value
    fn resolve(&self, variable: &str, template: &AddressTemplate) -> Option<String>;

    /// Resolve a `(key, value)` tuple
    fn resolve_tuple(&self, variable: &str, template: &AddressTemplate) -> Option<Segment>;

    /// All candidate values, least specific first. Resolution consumes the
    /// list from the back.
    fn collect(&self, variable: &str, template: &AddressTemplate) -> Vec<String> {
        self.resolve(variable, template).into_iter().collect()
    }

    /// All candidate tuples, least specific first
    fn collect_tuples(&self, variable: &str, template: &AddressTemplate) -> Vec<Segment> {
        self.resolve_tuple(variable, template).into_iter().collect()
    }
}

/// Context at the bottom of a decorator chain
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BaseContext {
    /// Every variable resolves to its own name; a tuple `{a}` resolves to
    /// `a=a`
    Echo,
    /// Nothing resolves
    #[default]
    Empty,
}

impl StatementContext for BaseContext {
    fn resolve(&self, variable: &str, _template: &AddressTemplate) -> Option<String> {
        match self {
            Self::Echo => Some(variable.to_string()),
            Self::Empty => None,
        }
    }

    fn resolve_tuple(&self, variable: &str, _template: &AddressTemplate) -> Option<Segment> {
        match self {
            Self::Echo => Some(Segment::new(variable, variable)),
            Self::Empty => None,
        }
    }
}
