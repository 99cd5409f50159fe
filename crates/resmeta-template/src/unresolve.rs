//! Turning concrete addresses back into templates
//!
//! Metadata fetched for a concrete address is cached under a generic
//! template so that it can be found again for other selections. The
//! [`Unresolver`] decides per segment what the generic form looks like.

use crate::error::Result;
use crate::template::{AddressTemplate, Token};
use resmeta_common::{Replacement, SegmentRule, selection_rules, wildcard_rules};
use resmeta_dmr::ResourceAddress;
use resmeta_dmr::model::WILDCARD;

/// A segment of a concrete address together with its position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentRef<'a> {
    pub key: &'a str,
    pub value: &'a str,
    /// Key of the preceding segment
    pub parent_key: Option<&'a str>,
    pub index: usize,
    pub size: usize,
}

impl SegmentRef<'_> {
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.index == 0
    }

    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.index + 1 == self.size
    }
}

/// Maps one concrete segment to its template form, e.g. `host=*`,
/// `{selected.host}` or `subsystem=mail`
pub trait Unresolver: Send + Sync {
    fn unresolve(&self, segment: &SegmentRef<'_>) -> String;
}

impl<F> Unresolver for F
where
    F: Fn(&SegmentRef<'_>) -> String + Send + Sync,
{
    fn unresolve(&self, segment: &SegmentRef<'_>) -> String {
        self(segment)
    }
}

/// Rule based unresolver. The first matching rule decides; segments no rule
/// matches stay literal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnresolvePolicy {
    rules: Vec<SegmentRule>,
}

impl UnresolvePolicy {
    #[must_use]
    pub const fn new(rules: Vec<SegmentRule>) -> Self {
        Self { rules }
    }

    /// Collapse profiles, server groups, hosts and servers into wildcards
    #[must_use]
    pub fn wildcards() -> Self {
        Self::new(wildcard_rules())
    }

    /// Collapse profiles, server groups, hosts and servers into the
    /// selection tuples
    #[must_use]
    pub fn selections() -> Self {
        Self::new(selection_rules())
    }

    #[must_use]
    pub fn rules(&self) -> &[SegmentRule] {
        &self.rules
    }
}

impl Default for UnresolvePolicy {
    fn default() -> Self {
        Self::wildcards()
    }
}

impl Unresolver for UnresolvePolicy {
    fn unresolve(&self, segment: &SegmentRef<'_>) -> String {
        let rule = self.rules.iter().find(|rule| {
            rule.matches(segment.key, segment.index, segment.size, segment.parent_key)
        });
        match rule.map(|r| &r.replacement) {
            Some(Replacement::Wildcard) => format!("{}={WILDCARD}", segment.key),
            Some(Replacement::Tuple(name)) => format!("{{{name}}}"),
            Some(Replacement::Variable(name)) => format!("{}={{{name}}}", segment.key),
            Some(Replacement::Keep) | None => format!("{}={}", segment.key, segment.value),
        }
    }
}

impl AddressTemplate {
    /// Build the template a concrete address belongs to. `unresolver` is
    /// called once per segment.
    pub fn from_address(
        address: &ResourceAddress,
        unresolver: &dyn Unresolver,
    ) -> Result<Self> {
        let size = address.len();
        let mut parent_key = None;
        let mut tokens = Vec::with_capacity(size);
        for (index, segment) in address.iter().enumerate() {
            let text = unresolver.unresolve(&SegmentRef {
                key: &segment.key,
                value: &segment.value,
                parent_key,
                index,
                size,
            });
            if text == format!("{}={}", segment.key, segment.value) {
                tokens.push(Token::keyed(&segment.key, &segment.value));
            } else {
                tokens.push(Token::parse(&text, &text)?);
            }
            parent_key = Some(segment.key.as_str());
        }
        Ok(Self::from_tokens(tokens, false))
    }
}

/// Unresolver keeping every segment literal
#[must_use]
pub fn literal(segment: &SegmentRef<'_>) -> String {
    Token::keyed(segment.key, segment.value).to_string()
}
