//! Scene adapter contract for tickreel playback.
//!
//! The playback core never renders anything itself. Every visible effect of
//! an event is expressed through the narrow [`Scene`] trait defined here:
//! locate an entity, mutate one of its properties, add or remove an
//! interaction, or update auxiliary simulation state.
//!
//! # Modules
//!
//! - [`definition`] -- Serialized entity, visual, and grid definitions.
//! - [`error`] -- [`SceneError`].
//! - [`memory`] -- [`MemoryScene`], the in-memory reference adapter.

pub mod definition;
pub mod error;
pub mod memory;

use serde::{Deserialize, Serialize};

pub use definition::{
    AreaBounds, AreaDefinition, EntityDefinition, EntityType, GridDefinition, VisualDefinition,
};
pub use error::SceneError;
pub use memory::{AuxiliaryState, EntityState, MemoryScene};

/// Opaque reference to an entity, valid for the scene that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityHandle(usize);

impl EntityHandle {
    /// Wrap a raw adapter-specific index.
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Return the raw adapter-specific index.
    pub const fn raw(self) -> usize {
        self.0
    }
}

/// A grid cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
}

impl Cell {
    /// Create a cell coordinate.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Fractional displacement of an entity inside its cell, in cell units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    /// Horizontal displacement.
    pub dx: f64,
    /// Vertical displacement.
    pub dy: f64,
}

impl Offset {
    /// No displacement.
    pub const ZERO: Self = Self { dx: 0.0, dy: 0.0 };

    /// Create an offset.
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

/// Numeric auxiliary fields carried by simulation entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuxField {
    /// Maximum amount a resource, container, or store can hold.
    Capacity,
    /// Current fill level of a container.
    Level,
    /// Units of a resource currently in use.
    Utilization,
}

/// The capability set playback needs from a visual scene.
///
/// Implementations own the visual representation of every entity. All
/// operations are synchronous; the playback engine guarantees it never
/// calls into the scene from two places at once.
pub trait Scene {
    /// Locate an entity by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::EntityNotFound`] if no such entity exists.
    fn find_entity(&self, id: &str) -> Result<EntityHandle, SceneError>;

    /// Read the cell an entity currently occupies.
    fn position(&self, entity: EntityHandle) -> Result<Cell, SceneError>;

    /// Show or hide an entity.
    fn set_visible(&mut self, entity: EntityHandle, visible: bool) -> Result<(), SceneError>;

    /// Move an entity to a cell, keeping its in-cell offset.
    fn set_position(&mut self, entity: EntityHandle, cell: Cell) -> Result<(), SceneError>;

    /// Displace an entity inside its cell.
    fn set_offset(&mut self, entity: EntityHandle, offset: Offset) -> Result<(), SceneError>;

    /// Tint an entity (`0xRRGGBB`).
    fn set_tint(&mut self, entity: EntityHandle, color: u32) -> Result<(), SceneError>;

    /// Show one frame of the entity's visual.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::FrameOutOfRange`] if the visual has no such frame.
    fn set_animation_frame(&mut self, entity: EntityHandle, index: usize)
    -> Result<(), SceneError>;

    /// Replace the text drawn next to an entity.
    fn set_decorating_text(&mut self, entity: EntityHandle, text: &str) -> Result<(), SceneError>;

    /// Mark `source` as interacting with `target`. Repeating is a no-op.
    fn begin_interaction(
        &mut self,
        source: EntityHandle,
        target: EntityHandle,
    ) -> Result<(), SceneError>;

    /// Remove the interaction from `source` to `target`. Repeating is a no-op.
    fn end_interaction(&mut self, source: EntityHandle, target: EntityHandle)
    -> Result<(), SceneError>;

    /// Update a numeric auxiliary field.
    fn set_auxiliary_numeric(
        &mut self,
        entity: EntityHandle,
        field: AuxField,
        value: f64,
    ) -> Result<(), SceneError>;

    /// Replace the item list of a store.
    fn set_auxiliary_content(
        &mut self,
        entity: EntityHandle,
        items: &[serde_json::Value],
    ) -> Result<(), SceneError>;

    /// Restore every entity to its initial state and clear all interactions.
    fn reset_all(&mut self);
}
