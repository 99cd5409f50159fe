//! Shared policy types
//!
//! These types are plain data: they are read from the configuration file and
//! interpreted by the template engine. Keeping them here lets the config tree
//! describe them without depending on the engine itself.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// How the management server is operated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
pub enum OperationMode {
    /// Single server, no profiles, hosts or server groups
    #[display("standalone")]
    Standalone,
    /// Managed domain with profiles, hosts and server groups
    #[default]
    #[display("domain")]
    Domain,
}

impl OperationMode {
    #[must_use]
    pub const fn is_standalone(self) -> bool {
        matches!(self, Self::Standalone)
    }
}

/// Where in a concrete address a [`SegmentRule`] applies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
pub enum RuleScope {
    /// The first segment, regardless of the address length
    #[display("root")]
    Root,
    /// The first segment of an address with more than one segment
    #[display("root-of-many")]
    RootOfMany,
    /// The second segment when the first one is a `host=` segment
    #[display("under-host")]
    UnderHost,
    /// Any segment
    #[display("anywhere")]
    Anywhere,
}

impl RuleScope {
    /// Check whether a segment at `index` of an address with `size` segments
    /// is covered by this scope. `parent_key` is the key of the segment at
    /// `index - 1`, if any.
    #[must_use]
    pub fn covers(self, index: usize, size: usize, parent_key: Option<&str>) -> bool {
        match self {
            Self::Root => index == 0,
            Self::RootOfMany => index == 0 && size > 1,
            Self::UnderHost => index == 1 && parent_key == Some("host"),
            Self::Anywhere => true,
        }
    }
}

/// What a matched segment turns into
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Replacement {
    /// `key=*`
    Wildcard,
    /// A bare tuple placeholder `{name}`
    Tuple(String),
    /// `key={name}`
    Variable(String),
    /// Keep the concrete `key=value`
    Keep,
}

/// One rule of an unresolve policy. The first matching rule wins.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentRule {
    /// Segment key this rule applies to
    pub key: String,
    /// Position constraint
    pub scope: RuleScope,
    /// Replacement for matched segments
    pub replacement: Replacement,
}

impl SegmentRule {
    pub fn new(key: impl Into<String>, scope: RuleScope, replacement: Replacement) -> Self {
        Self {
            key: key.into(),
            scope,
            replacement,
        }
    }

    /// Check if this rule applies to the given segment
    #[must_use]
    pub fn matches(&self, key: &str, index: usize, size: usize, parent_key: Option<&str>) -> bool {
        self.key == key && self.scope.covers(index, size, parent_key)
    }
}

/// Rules collapsing concrete profile, server-group, host and server names
/// into wildcards. `subsystem` segments are always kept verbatim.
#[must_use]
pub fn wildcard_rules() -> Vec<SegmentRule> {
    vec![
        SegmentRule::new("subsystem", RuleScope::Anywhere, Replacement::Keep),
        SegmentRule::new("profile", RuleScope::Root, Replacement::Wildcard),
        SegmentRule::new("server-group", RuleScope::Root, Replacement::Wildcard),
        SegmentRule::new("host", RuleScope::RootOfMany, Replacement::Wildcard),
        SegmentRule::new("server", RuleScope::UnderHost, Replacement::Wildcard),
        SegmentRule::new("server-config", RuleScope::UnderHost, Replacement::Wildcard),
    ]
}

/// Rules collapsing concrete names into the selection placeholders, so that
/// resolving the result against the same selection reproduces the address.
#[must_use]
pub fn selection_rules() -> Vec<SegmentRule> {
    vec![
        SegmentRule::new("subsystem", RuleScope::Anywhere, Replacement::Keep),
        SegmentRule::new(
            "profile",
            RuleScope::Root,
            Replacement::Tuple("selected.profile".to_string()),
        ),
        SegmentRule::new(
            "server-group",
            RuleScope::Root,
            Replacement::Tuple("selected.group".to_string()),
        ),
        SegmentRule::new(
            "host",
            RuleScope::Root,
            Replacement::Tuple("selected.host".to_string()),
        ),
        SegmentRule::new(
            "server",
            RuleScope::UnderHost,
            Replacement::Tuple("selected.server".to_string()),
        ),
        SegmentRule::new(
            "server-config",
            RuleScope::UnderHost,
            Replacement::Tuple("selected.server-config".to_string()),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_covers() {
        assert!(RuleScope::Root.covers(0, 1, None));
        assert!(!RuleScope::Root.covers(1, 2, Some("profile")));
        assert!(!RuleScope::RootOfMany.covers(0, 1, None));
        assert!(RuleScope::RootOfMany.covers(0, 2, None));
        assert!(RuleScope::UnderHost.covers(1, 2, Some("host")));
        assert!(!RuleScope::UnderHost.covers(1, 2, Some("profile")));
        assert!(!RuleScope::UnderHost.covers(2, 3, Some("host")));
        assert!(RuleScope::Anywhere.covers(7, 8, Some("x")));
    }

    #[test]
    fn test_rule_matches_key_and_scope() {
        let rule = SegmentRule::new("host", RuleScope::RootOfMany, Replacement::Wildcard);
        assert!(rule.matches("host", 0, 2, None));
        assert!(!rule.matches("host", 0, 1, None));
        assert!(!rule.matches("profile", 0, 2, None));
    }

    #[test]
    fn test_operation_mode_display() {
        assert_eq!(OperationMode::Standalone.to_string(), "standalone");
        assert_eq!(OperationMode::default(), OperationMode::Domain);
        assert!(OperationMode::Standalone.is_standalone());
    }
}
