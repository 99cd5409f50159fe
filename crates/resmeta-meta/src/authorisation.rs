//! Authorisation decisions over cached security contexts
//!
//! A [`Constraint`] names a permission on an attribute or operation of a
//! template, written as `readable(/subsystem=mail@debug)` or
//! `executable(/subsystem=mail:add)`. Decisions only evaluate the
//! access-control facts the server returned; there is no local policy.

use crate::error::{MetaError, Result};
use crate::registry::MetadataRegistry;
use crate::security::SecurityContext;
use derive_more::Display;
use resmeta_template::AddressTemplate;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum Target {
    #[display("attribute")]
    Attribute,
    #[display("operation")]
    Operation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum Permission {
    #[display("readable")]
    Readable,
    #[display("writable")]
    Writable,
    #[display("executable")]
    Executable,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Constraint {
    template: AddressTemplate,
    target: Target,
    name: String,
    permission: Permission,
}

impl Constraint {
    pub fn attribute(template: AddressTemplate, name: impl Into<String>, permission: Permission) -> Self {
        Self {
            template,
            target: Target::Attribute,
            name: name.into(),
            permission,
        }
    }

    pub fn executable(template: AddressTemplate, operation: impl Into<String>) -> Self {
        Self {
            template,
            target: Target::Operation,
            name: operation.into(),
            permission: Permission::Executable,
        }
    }

    /// Parse `permission(template:operation)` or
    /// `permission(template@attribute)`
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || MetaError::InvalidConstraint(text.to_string());
        let (permission, rest) = text.split_once('(').ok_or_else(invalid)?;
        let body = rest.strip_suffix(')').ok_or_else(invalid)?;
        let permission = match permission {
            "readable" => Permission::Readable,
            "writable" => Permission::Writable,
            "executable" => Permission::Executable,
            _ => return Err(invalid()),
        };
        let split = body.rfind([':', '@']).ok_or_else(invalid)?;
        let (template, name) = (&body[..split], &body[split + 1..]);
        if name.is_empty() {
            return Err(invalid());
        }
        let target = if body[split..].starts_with(':') {
            Target::Operation
        } else {
            Target::Attribute
        };
        Ok(Self {
            template: AddressTemplate::parse(template)?,
            target,
            name: name.to_string(),
            permission,
        })
    }

    #[must_use]
    pub const fn template(&self) -> &AddressTemplate {
        &self.template
    }

    #[must_use]
    pub const fn target(&self) -> Target {
        self.target
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn permission(&self) -> Permission {
        self.permission
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = match self.target {
            Target::Attribute => '@',
            Target::Operation => ':',
        };
        write!(f, "{}({}{}{})", self.permission, self.template, separator, self.name)
    }
}

impl FromStr for Constraint {
    type Err = MetaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Source of the security context a constraint is evaluated against
pub trait SecurityContextResolver: Send + Sync {
    fn resolve(&self, constraint: &Constraint) -> Option<Arc<SecurityContext>>;
}

impl SecurityContextResolver for MetadataRegistry {
    fn resolve(&self, constraint: &Constraint) -> Option<Arc<SecurityContext>> {
        self.lookup(constraint.template())
            .ok()
            .map(|metadata| Arc::new(metadata.security_context().clone()))
    }
}

impl SecurityContextResolver for SecurityContext {
    fn resolve(&self, _constraint: &Constraint) -> Option<Arc<SecurityContext>> {
        Some(Arc::new(self.clone()))
    }
}

impl<F> SecurityContextResolver for F
where
    F: Fn(&Constraint) -> Option<Arc<SecurityContext>> + Send + Sync,
{
    fn resolve(&self, constraint: &Constraint) -> Option<Arc<SecurityContext>> {
        self(constraint)
    }
}

/// Evaluates constraints. A strict decision denies when no security
/// context is known, a lenient one allows.
pub struct AuthorisationDecision {
    strict: bool,
    resolver: Arc<dyn SecurityContextResolver>,
}

impl AuthorisationDecision {
    pub fn strict(resolver: Arc<dyn SecurityContextResolver>) -> Self {
        Self {
            strict: true,
            resolver,
        }
    }

    pub fn lenient(resolver: Arc<dyn SecurityContextResolver>) -> Self {
        Self {
            strict: false,
            resolver,
        }
    }

    #[must_use]
    pub fn is_allowed(&self, constraint: &Constraint) -> bool {
        let Some(context) = self.resolver.resolve(constraint) else {
            return !self.strict;
        };
        match (constraint.target, constraint.permission) {
            (Target::Operation, Permission::Executable) => context.is_executable(&constraint.name),
            (Target::Attribute, Permission::Readable) => {
                context.is_attribute_readable(&constraint.name)
            }
            (Target::Attribute, Permission::Writable) => {
                context.is_attribute_writable(&constraint.name)
            }
            _ => {
                error!("Unsupported constraint {}", constraint);
                !self.strict
            }
        }
    }

    /// Check if every constraint is allowed
    #[must_use]
    pub fn is_allowed_all(&self, constraints: &[Constraint]) -> bool {
        constraints.iter().all(|c| self.is_allowed(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> Arc<dyn SecurityContextResolver> {
        Arc::new(SecurityContext::from_model(
            &json!({
                "read": true,
                "write": false,
                "attributes": {"debug": {"read": true, "write": true}},
                "operations": {"add": {"execute": true}}
            }),
            false,
        ))
    }

    #[test]
    fn test_parse_constraint() {
        let c = Constraint::parse("executable(/subsystem=mail:add)").unwrap();
        assert_eq!(c.template().to_string(), "/subsystem=mail");
        assert_eq!(c.target(), Target::Operation);
        assert_eq!(c.name(), "add");
        assert_eq!(c.permission(), Permission::Executable);
        assert_eq!(c.to_string(), "executable(/subsystem=mail:add)");

        let c: Constraint = "writable(/subsystem=mail@debug)".parse().unwrap();
        assert_eq!(c.target(), Target::Attribute);
        assert_eq!(c.to_string(), "writable(/subsystem=mail@debug)");
    }

    #[test]
    fn test_parse_invalid() {
        for text in [
            "executable/subsystem=mail:add",
            "deletable(/subsystem=mail:add)",
            "readable(/subsystem=mail)",
            "readable(/subsystem=mail@)",
        ] {
            let err = Constraint::parse(text).unwrap_err();
            assert!(matches!(err, MetaError::InvalidConstraint(_)), "{text}");
        }
    }

    #[test]
    fn test_decisions() {
        let decision = AuthorisationDecision::strict(context());
        assert!(decision.is_allowed(&Constraint::parse("executable(/a=b:add)").unwrap()));
        assert!(!decision.is_allowed(&Constraint::parse("executable(/a=b:remove)").unwrap()));
        assert!(decision.is_allowed(&Constraint::parse("writable(/a=b@debug)").unwrap()));
        assert!(!decision.is_allowed(&Constraint::parse("writable(/a=b@other)").unwrap()));
        assert!(decision.is_allowed(&Constraint::parse("readable(/a=b@other)").unwrap()));
    }

    #[test]
    fn test_unknown_context() {
        let nothing: Arc<dyn SecurityContextResolver> =
            Arc::new(|_: &Constraint| -> Option<Arc<SecurityContext>> { None });
        let c = Constraint::parse("executable(/a=b:add)").unwrap();
        assert!(!AuthorisationDecision::strict(nothing.clone()).is_allowed(&c));
        assert!(AuthorisationDecision::lenient(nothing).is_allowed(&c));
    }

    #[test]
    fn test_unsupported_combination_keeps_default() {
        let c = Constraint {
            template: AddressTemplate::ROOT,
            target: Target::Operation,
            name: "add".to_string(),
            permission: Permission::Readable,
        };
        assert!(!AuthorisationDecision::strict(context()).is_allowed(&c));
        assert!(AuthorisationDecision::lenient(context()).is_allowed(&c));
    }
}
