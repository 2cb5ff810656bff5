//! Loading a complete simulation document.
//!
//! A document bundles everything a viewer needs to replay one run:
//!
//! ```json
//! {
//!   "entities": [{ "id": "w1", "type": "CUSTOM", "visual": "worker" }],
//!   "visuals":  [{ "id": "worker", "frames": ["idle.png", "busy.png"] }],
//!   "grid":     { "cols": 10, "rows": 6, "areas": [] },
//!   "events":   [{ "targetId": "w1", "timestamp": 0, "kind": "SET_VISIBLE", "args": { "visible": true } }]
//! }
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tickreel_events::EventRegistry;
use tickreel_scene::{
    EntityDefinition, GridDefinition, MemoryScene, SceneError, VisualDefinition,
};
use tracing::info;

use crate::log::{LogError, SimulationLog};

/// Errors that can occur while loading a simulation document.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// Failed to read the document from disk.
    #[error("failed to read simulation document: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The document is not valid JSON or has the wrong shape.
    #[error("failed to parse simulation document: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The event log could not be decoded.
    #[error("invalid event log: {source}")]
    Log {
        /// The underlying log error.
        #[from]
        source: LogError,
    },

    /// Entity definitions are inconsistent (unknown visual, duplicate id).
    #[error("invalid scene definition: {source}")]
    Scene {
        /// The underlying scene error.
        #[from]
        source: SceneError,
    },
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    entities: Vec<EntityDefinition>,
    #[serde(default)]
    visuals: Vec<VisualDefinition>,
    #[serde(default)]
    grid: GridDefinition,
    #[serde(default)]
    events: Vec<Value>,
}

/// A decoded simulation document.
#[derive(Debug, Clone)]
pub struct SimulationData {
    /// Entity definitions in document order.
    pub entities: Vec<EntityDefinition>,
    /// Visual definitions.
    pub visuals: Vec<VisualDefinition>,
    /// Grid layout.
    pub grid: GridDefinition,
    /// The decoded event log.
    pub log: SimulationLog,
}

impl SimulationData {
    /// Parse a document using the standard event registry.
    ///
    /// # Errors
    ///
    /// See [`from_json_with`](Self::from_json_with).
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        Self::from_json_with(&EventRegistry::standard(), json)
    }

    /// Parse a document, decoding events through `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Json`] for malformed JSON, [`DataError::Log`]
    /// if an event fails to decode, and [`DataError::Scene`] if an entity
    /// references an undefined visual or two entities share an id.
    pub fn from_json_with(registry: &EventRegistry, json: &str) -> Result<Self, DataError> {
        let raw: RawDocument = serde_json::from_str(json)?;
        check_definitions(&raw.entities, &raw.visuals)?;
        let log = SimulationLog::from_records(registry, raw.events)?;

        info!(
            entities = raw.entities.len(),
            visuals = raw.visuals.len(),
            events = log.len(),
            total_steps = log.total_steps(),
            "Simulation document loaded"
        );

        Ok(Self {
            entities: raw.entities,
            visuals: raw.visuals,
            grid: raw.grid,
            log,
        })
    }

    /// Read and parse a document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Io`] if the file cannot be read; otherwise as
    /// [`from_json`](Self::from_json).
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Build an in-memory scene with every entity in its initial state.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Scene`] if the definitions are inconsistent.
    pub fn build_scene(&self) -> Result<MemoryScene, DataError> {
        Ok(MemoryScene::from_definitions(&self.entities, &self.visuals)?)
    }
}

fn check_definitions(
    entities: &[EntityDefinition],
    visuals: &[VisualDefinition],
) -> Result<(), SceneError> {
    let known: BTreeSet<&str> = visuals.iter().map(|visual| visual.id.as_str()).collect();
    let mut seen = BTreeSet::new();
    for entity in entities {
        if !seen.insert(entity.id.as_str()) {
            return Err(SceneError::DuplicateEntity {
                id: entity.id.clone(),
            });
        }
        if let Some(visual) = entity
            .visual
            .as_deref()
            .filter(|visual| !known.contains(visual))
        {
            return Err(SceneError::UnknownVisual {
                entity: entity.id.clone(),
                visual: visual.to_owned(),
            });
        }
    }
    Ok(())
}
