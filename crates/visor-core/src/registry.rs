//! Engine registry - process-wide catalog of playback engines
//!
//! Each engine registers a descriptor (ranking weight plus a runtime
//! support flag) and a factory producing conforming instances.
//! Selection works purely by preference ordering; format-based
//! filtering is accepted as a parameter but is an extension point that
//! currently rejects nothing.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::EngineFactory;

/// Engine catalog entry: identity, ranking weight and runtime support
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineDescriptor {
    /// Unique engine id ("MJPEG", "MJPEGBase64MXHR", "Flash", ...)
    pub id: String,
    /// Human-readable engine name
    pub name: String,
    /// Ranking weight; higher is more preferred, 0 disables the engine
    pub preference: i32,
    /// Whether the current runtime environment can use this engine
    pub support: bool,
}

impl EngineDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        preference: i32,
        support: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            preference,
            support,
        }
    }
}

/// Catalog of available playback engines.
///
/// Constructed once at startup and shared by reference; registration is
/// expected to happen during startup only (single writer, then many
/// readers). Descriptors are kept in registration order so equal
/// preferences rank in encounter order.
#[derive(Default)]
pub struct EngineRegistry {
    engines: RwLock<Vec<EngineDescriptor>>,
    factories: RwLock<HashMap<String, EngineFactory>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an engine descriptor.
    ///
    /// Returns false, leaving the registry unchanged, when the
    /// descriptor is incomplete. Re-registering an id overwrites the
    /// prior entry in place.
    pub fn register(&self, descriptor: EngineDescriptor) -> bool {
        if descriptor.id.is_empty() || descriptor.name.is_empty() {
            warn!(?descriptor, "cannot register invalid engine");
            return false;
        }
        debug!(
            id = %descriptor.id,
            name = %descriptor.name,
            preference = descriptor.preference,
            support = descriptor.support,
            "register media engine"
        );
        let mut engines = self.engines.write();
        match engines.iter_mut().find(|e| e.id == descriptor.id) {
            Some(existing) => *existing = descriptor,
            None => engines.push(descriptor),
        }
        true
    }

    /// Installs the concrete constructor for an engine id.
    ///
    /// A descriptor may be registered without a factory; the player
    /// reports such engines as not found at setup time.
    pub fn register_factory(&self, id: impl Into<String>, factory: EngineFactory) {
        self.factories.write().insert(id.into(), factory);
    }

    pub fn has(&self, id: &str) -> bool {
        self.engines.read().iter().any(|e| e.id == id)
    }

    /// True iff the engine is registered and its runtime support flag is set.
    pub fn supports(&self, id: &str) -> bool {
        self.engines.read().iter().any(|e| e.id == id && e.support)
    }

    /// Re-evaluates the runtime support flag for a registered engine.
    pub fn set_support(&self, id: &str, support: bool) -> bool {
        match self.engines.write().iter_mut().find(|e| e.id == id) {
            Some(engine) => {
                engine.support = support;
                true
            }
            None => false,
        }
    }

    /// True when at least one compatible engine exists for the format.
    pub fn supports_format(&self, format: &str) -> bool {
        self.preferred_engine(Some(format)).is_some()
    }

    /// Compatible engines sorted descending by preference.
    ///
    /// Disabled (`preference == 0`) and unsupported engines are
    /// rejected; ties keep registration order (the sort is stable).
    /// The optional `format` argument further filters by engines which
    /// support the given media format; the filter is not implemented
    /// yet and rejects nothing.
    pub fn compatible_engines(&self, format: Option<&str>) -> Vec<EngineDescriptor> {
        let _ = format;
        let mut arr: Vec<EngineDescriptor> = self
            .engines
            .read()
            .iter()
            .filter(|e| e.preference != 0 && e.support)
            .cloned()
            .collect();
        arr.sort_by(|a, b| b.preference.cmp(&a.preference));
        arr
    }

    /// Highest-preference compatible engine, if any.
    pub fn preferred_engine(&self, format: Option<&str>) -> Option<EngineDescriptor> {
        let engine = self.compatible_engines(format).into_iter().next();
        debug!(engine = ?engine.as_ref().map(|e| e.id.as_str()), "preferred engine");
        engine
    }

    /// Concrete constructor for an engine id, when one is installed.
    pub fn factory(&self, id: &str) -> Option<EngineFactory> {
        self.factories.read().get(id).cloned()
    }
}
