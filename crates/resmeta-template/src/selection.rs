//! Run-time selection
//!
//! The console keeps one [`SelectionContext`] per session. It is shared
//! behind an `Arc` and updated through [`SelectionContext::select`] and
//! [`SelectionContext::clear`] whenever the user picks a profile, host,
//! server group or server.

use crate::context::StatementContext;
use crate::template::AddressTemplate;
use parking_lot::RwLock;
use resmeta_common::OperationMode;
use resmeta_dmr::Segment;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Well-known tuple variables
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tuple {
    SelectedProfile,
    SelectedGroup,
    SelectedHost,
    SelectedServerConfig,
    SelectedServer,
    DomainController,
}

impl Tuple {
    pub const ALL: [Self; 6] = [
        Self::SelectedProfile,
        Self::SelectedGroup,
        Self::SelectedHost,
        Self::SelectedServerConfig,
        Self::SelectedServer,
        Self::DomainController,
    ];

    /// Variable name as used in templates
    #[must_use]
    pub const fn variable(self) -> &'static str {
        match self {
            Self::SelectedProfile => "selected.profile",
            Self::SelectedGroup => "selected.group",
            Self::SelectedHost => "selected.host",
            Self::SelectedServerConfig => "selected.server-config",
            Self::SelectedServer => "selected.server",
            Self::DomainController => "domain.controller",
        }
    }

    /// Resource type the tuple resolves to
    #[must_use]
    pub const fn resource(self) -> &'static str {
        match self {
            Self::SelectedProfile => "profile",
            Self::SelectedGroup => "server-group",
            Self::SelectedHost | Self::DomainController => "host",
            Self::SelectedServerConfig => "server-config",
            Self::SelectedServer => "server",
        }
    }

    #[must_use]
    pub fn from_variable(variable: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.variable() == variable)
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.variable())
    }
}

impl FromStr for Tuple {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_variable(s).ok_or_else(|| format!("unknown tuple '{s}'"))
    }
}

/// The session's current selection
#[derive(Debug, Default)]
pub struct SelectionContext {
    mode: OperationMode,
    selection: RwLock<HashMap<Tuple, String>>,
}

impl SelectionContext {
    #[must_use]
    pub fn new(mode: OperationMode) -> Self {
        Self {
            mode,
            selection: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn mode(&self) -> OperationMode {
        self.mode
    }

    /// Record a selection event
    pub fn select(&self, tuple: Tuple, value: impl Into<String>) {
        self.selection.write().insert(tuple, value.into());
    }

    /// Forget a selection
    pub fn clear(&self, tuple: Tuple) {
        self.selection.write().remove(&tuple);
    }

    #[must_use]
    pub fn selected(&self, tuple: Tuple) -> Option<String> {
        if self.mode.is_standalone() {
            return None;
        }
        self.selection.read().get(&tuple).cloned()
    }
}

impl StatementContext for SelectionContext {
    fn resolve(&self, variable: &str, _template: &AddressTemplate) -> Option<String> {
        Tuple::from_variable(variable).and_then(|tuple| self.selected(tuple))
    }

    fn resolve_tuple(&self, variable: &str, _template: &AddressTemplate) -> Option<Segment> {
        let tuple = Tuple::from_variable(variable)?;
        self.selected(tuple)
            .map(|value| Segment::new(tuple.resource(), value))
    }
}
