//! Per-template presence tracking for one pipeline run

use resmeta_template::AddressTemplate;
use std::collections::HashMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Which metadata pieces are known for a template
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Presence(u8);

impl Presence {
    pub const NOTHING: Self = Self(0);
    pub const SECURITY_CONTEXT: Self = Self(0b01);
    pub const RESOURCE_DESCRIPTION: Self = Self(0b10);
    pub const ALL: Self = Self(0b11);

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_complete(self) -> bool {
        self.0 == Self::ALL.0
    }

    /// Pieces not present
    #[must_use]
    pub const fn missing(self) -> Self {
        Self(!self.0 & Self::ALL.0)
    }
}

impl BitOr for Presence {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Presence {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NOTHING => write!(f, "nothing"),
            Self::SECURITY_CONTEXT => write!(f, "security"),
            Self::RESOURCE_DESCRIPTION => write!(f, "description"),
            _ => write!(f, "all"),
        }
    }
}

/// Templates of one lookup and what is already known about each of them.
/// Bits only ever get set.
#[derive(Clone, Debug, Default)]
pub struct LookupResult {
    templates: Vec<AddressTemplate>,
    presence: HashMap<AddressTemplate, Presence>,
}

impl LookupResult {
    /// Start with nothing present. Duplicate templates are kept once.
    pub fn new(templates: impl IntoIterator<Item = AddressTemplate>) -> Self {
        let mut result = Self::default();
        for template in templates {
            if !result.presence.contains_key(&template) {
                result.presence.insert(template.clone(), Presence::NOTHING);
                result.templates.push(template);
            }
        }
        result
    }

    /// Templates in insertion order
    #[must_use]
    pub fn templates(&self) -> &[AddressTemplate] {
        &self.templates
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Record that `pieces` are present for `template`
    ///
    /// # Panics
    ///
    /// Panics if `template` is not part of this lookup.
    pub fn mark_metadata_present(&mut self, template: &AddressTemplate, pieces: Presence) {
        match self.presence.get_mut(template) {
            Some(presence) => *presence |= pieces,
            None => panic!("template {template} is not part of this lookup"),
        }
    }

    /// Pieces currently present for `template`
    ///
    /// # Panics
    ///
    /// Panics if `template` is not part of this lookup.
    #[must_use]
    pub fn presence(&self, template: &AddressTemplate) -> Presence {
        match self.presence.get(template) {
            Some(presence) => *presence,
            None => panic!("template {template} is not part of this lookup"),
        }
    }

    /// Check if every template has all pieces
    #[must_use]
    pub fn all_present(&self) -> bool {
        self.presence.values().all(|p| p.is_complete())
    }

    /// Templates still missing a piece, in insertion order
    pub fn incomplete(&self) -> impl Iterator<Item = (&AddressTemplate, Presence)> {
        self.templates.iter().filter_map(|t| {
            let presence = self.presence[t];
            (!presence.is_complete()).then_some((t, presence))
        })
    }
}

impl fmt::Display for LookupResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LookupResult(")?;
        for (i, template) in self.templates.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{template} -> {}", self.presence[template])?;
        }
        write!(f, ")")
    }
}
