//! Templates each screen needs before it can render

use crate::error::Result;
use resmeta_common::config::ScreenConfig;
use resmeta_template::AddressTemplate;
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug, Default)]
struct Screen {
    templates: Vec<AddressTemplate>,
    recursive: bool,
}

#[derive(Clone, Debug, Default)]
pub struct RequiredResources {
    screens: HashMap<String, Screen>,
}

impl RequiredResources {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `screens` configuration section. Every template must
    /// parse.
    pub fn from_config(screens: &BTreeMap<String, ScreenConfig>) -> Result<Self> {
        let mut required = Self::new();
        for (id, screen) in screens {
            let templates = screen
                .resources
                .iter()
                .map(|r| AddressTemplate::parse(r))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            required.add(id, templates, screen.recursive);
        }
        Ok(required)
    }

    pub fn add(&mut self, id: impl Into<String>, templates: Vec<AddressTemplate>, recursive: bool) {
        self.screens.insert(
            id.into(),
            Screen {
                templates,
                recursive,
            },
        );
    }

    /// Templates of screen `id`; empty for unknown screens
    #[must_use]
    pub fn resources(&self, id: &str) -> &[AddressTemplate] {
        self.screens
            .get(id)
            .map(|s| s.templates.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_recursive(&self, id: &str) -> bool {
        self.screens.get(id).is_some_and(|s| s.recursive)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.screens.contains_key(id)
    }
}
