//! Serialized entity, visual, and grid definitions.
//!
//! These mirror the static part of a simulation document: which entities
//! exist, what they look like, and the grid they live on. Playback never
//! changes them; a [`MemoryScene`](crate::MemoryScene) copies them into its
//! initial state.

use serde::{Deserialize, Serialize};

use crate::Cell;

/// Simulation role of an entity, which decides how its auxiliary state
/// is summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityType {
    /// A plain visual entity with no simulation resource attached.
    #[default]
    Custom,
    /// A store holding a list of items.
    Store,
    /// A container holding a continuous level.
    Container,
    /// A resource with a capacity and a utilization.
    Resource,
    /// A simulation process.
    Process,
}

/// Static definition of one scene entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDefinition {
    /// Unique entity identifier referenced by events.
    pub id: String,

    /// Simulation role of the entity.
    #[serde(default, rename = "type")]
    pub entity_type: EntityType,

    /// Identifier of the visual providing the entity's animation frames.
    #[serde(default, alias = "graphic")]
    pub visual: Option<String>,

    /// Base tint restored on reset (`0xRRGGBB`).
    #[serde(default = "default_tint")]
    pub tint: u32,

    /// Cell the entity occupies before any event moves it.
    #[serde(default)]
    pub position: Cell,
}

impl EntityDefinition {
    /// Create a `CUSTOM` entity definition without a visual.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: EntityType::Custom,
            visual: None,
            tint: default_tint(),
            position: Cell::default(),
        }
    }

    /// Set the entity type.
    #[must_use]
    pub const fn with_type(mut self, entity_type: EntityType) -> Self {
        self.entity_type = entity_type;
        self
    }

    /// Attach a visual by identifier.
    #[must_use]
    pub fn with_visual(mut self, visual: impl Into<String>) -> Self {
        self.visual = Some(visual.into());
        self
    }

    /// Set the base tint.
    #[must_use]
    pub const fn with_tint(mut self, tint: u32) -> Self {
        self.tint = tint;
        self
    }
}

/// A named sequence of animation frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualDefinition {
    /// Unique visual identifier.
    pub id: String,
    /// Frame asset names, in animation order.
    #[serde(default)]
    pub frames: Vec<String>,
}

/// A rectangular, colored region of the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaDefinition {
    /// Unique area identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Fill color (`0xRRGGBB`).
    #[serde(default)]
    pub color: u32,
    /// Placement of the area on the grid.
    pub grid_definition: AreaBounds,
}

/// Cell-aligned bounds of an [`AreaDefinition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaBounds {
    /// Leftmost column.
    pub x: i64,
    /// Topmost row.
    pub y: i64,
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
}

/// The grid entities are positioned on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDefinition {
    /// Number of columns.
    pub cols: u32,
    /// Number of rows.
    pub rows: u32,
    /// Decorative areas drawn beneath the entities.
    #[serde(default)]
    pub areas: Vec<AreaDefinition>,
}

impl Default for GridDefinition {
    fn default() -> Self {
        Self {
            cols: 1,
            rows: 1,
            areas: Vec::new(),
        }
    }
}

const fn default_tint() -> u32 {
    0xFF_FFFF
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn entity_definition_accepts_graphic_alias() {
        let def: EntityDefinition = serde_json::from_value(serde_json::json!({
            "id": "truck",
            "type": "CONTAINER",
            "graphic": "truck-visual",
            "tint": 0x4512fa,
        }))
        .unwrap();
        assert_eq!(def.entity_type, EntityType::Container);
        assert_eq!(def.visual.as_deref(), Some("truck-visual"));
        assert_eq!(def.tint, 0x4512fa);
        assert_eq!(def.position, Cell::default());
    }

    #[test]
    fn entity_definition_defaults() {
        let def: EntityDefinition =
            serde_json::from_value(serde_json::json!({ "id": "plain" })).unwrap();
        assert_eq!(def.entity_type, EntityType::Custom);
        assert_eq!(def.tint, 0xFF_FFFF);
        assert!(def.visual.is_none());
    }

    #[test]
    fn grid_parses_areas() {
        let grid: GridDefinition = serde_json::from_value(serde_json::json!({
            "cols": 5,
            "rows": 4,
            "areas": [{
                "id": "area1",
                "name": "Area 1",
                "color": 0x1234af,
                "gridDefinition": { "x": 1, "y": 1, "width": 2, "height": 2 }
            }]
        }))
        .unwrap();
        assert_eq!(grid.cols, 5);
        assert_eq!(grid.areas.len(), 1);
        assert_eq!(grid.areas.first().unwrap().grid_definition.width, 2);
    }
}
