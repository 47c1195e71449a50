//! Versioned generation names.
//!
//! A generation is replaced wholesale when the version tag changes; nothing
//! inside one is ever expired individually.

use serde::{Deserialize, Serialize};

/// Which of the two live generations an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    /// Long-lived assets, filled at install and by cache-first misses.
    Static,
    /// Pages and API responses cached opportunistically.
    Dynamic,
}

/// The pair of generation names currently in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generations {
    static_name: String,
    dynamic_name: String,
}

impl Generations {
    pub fn new(namespace: &str, version: &str) -> Self {
        Self { static_name: format!("{namespace}-static-{version}"), dynamic_name: format!("{namespace}-dynamic-{version}") }
    }

    pub fn static_name(&self) -> &str {
        &self.static_name
    }

    pub fn dynamic_name(&self) -> &str {
        &self.dynamic_name
    }

    pub fn name(&self, kind: GenerationKind) -> &str {
        match kind {
            GenerationKind::Static => &self.static_name,
            GenerationKind::Dynamic => &self.dynamic_name,
        }
    }

    /// Names that survive activation.
    pub fn whitelist(&self) -> [&str; 2] {
        [&self.static_name, &self.dynamic_name]
    }

    pub fn is_current(&self, name: &str) -> bool {
        self.whitelist().contains(&name)
    }
}
