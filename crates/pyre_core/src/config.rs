//! # World Configuration
//!
//! Sizing and feature flags for one world, loaded once at startup.
//!
//! Configs come from TOML files; every field has a default so partial files
//! work. Nothing here is reloadable at runtime: arena capacity and table
//! sizes are fixed for the world's lifetime.

use pyre_shared::constants::{
    DEFAULT_ACTOR_ARENA_BYTES, DEFAULT_EVENT_CAPACITY, DEFAULT_MAX_ACTORS, DEFAULT_MAX_NODES,
    MIN_ARENA_ALIGNMENT,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML source failed to parse or had wrongly-typed fields.
    #[error("invalid world config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Per-world configuration.
///
/// # Example
///
/// ```rust,ignore
/// let config: WorldConfig = WorldConfig::from_toml_str(r#"
///     name = "Arena01"
///     enable_physics = false
/// "#)?;
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World name, used to label the arena and log spans.
    pub name: String,
    /// Actor arena capacity in bytes.
    pub actor_arena_bytes: usize,
    /// Actor arena allocation alignment.
    pub arena_alignment: usize,
    /// Capacity of the actor table.
    pub max_actors: usize,
    /// Capacity of the spatial node table.
    pub max_nodes: usize,
    /// Scene event channel capacity.
    pub event_capacity: usize,
    /// Whether the external physics collaborator runs for this world.
    ///
    /// The core never reads this itself; the frame orchestrator uses it to
    /// gate the external phase between tick and cleanup.
    pub enable_physics: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: "World".to_owned(),
            actor_arena_bytes: DEFAULT_ACTOR_ARENA_BYTES,
            arena_alignment: MIN_ARENA_ALIGNMENT * 2,
            max_actors: DEFAULT_MAX_ACTORS,
            max_nodes: DEFAULT_MAX_NODES,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            enable_physics: true,
        }
    }
}

impl WorldConfig {
    /// Parses a config from TOML source.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or mistyped fields.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }
}
