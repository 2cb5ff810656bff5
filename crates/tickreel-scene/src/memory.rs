//! In-memory reference implementation of the [`Scene`] trait.
//!
//! [`MemoryScene`] keeps every entity's visual and auxiliary state in plain
//! structs. The player binary drives it headless, and the tests use it to
//! read back exactly what playback did.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use tracing::debug;

use crate::definition::{EntityDefinition, EntityType, VisualDefinition};
use crate::error::SceneError;
use crate::{AuxField, Cell, EntityHandle, Offset, Scene};

/// Auxiliary simulation values attached to an entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuxiliaryState {
    /// Capacity of a resource, container, or store.
    pub capacity: Option<f64>,
    /// Fill level of a container.
    pub level: Option<f64>,
    /// Utilization of a resource.
    pub utilization: Option<f64>,
    /// Items held by a store.
    pub content: Vec<serde_json::Value>,
}

/// Current state of one entity in a [`MemoryScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState {
    /// Entity identifier.
    pub id: String,
    /// Simulation role.
    pub entity_type: EntityType,
    /// Number of frames of the entity's visual.
    pub frame_count: usize,
    /// Tint restored on reset.
    pub base_tint: u32,
    /// Cell restored on reset.
    pub initial_cell: Cell,
    /// Whether the entity is drawn.
    pub visible: bool,
    /// Cell the entity occupies.
    pub cell: Cell,
    /// Displacement inside the cell.
    pub offset: Offset,
    /// Current tint.
    pub tint: u32,
    /// Current animation frame.
    pub frame: usize,
    /// Free text drawn next to the entity.
    pub decorating_text: String,
    /// Summary of the auxiliary state, derived from the entity type.
    pub information_text: String,
    /// Auxiliary simulation values.
    pub auxiliary: AuxiliaryState,
}

impl EntityState {
    fn from_definition(definition: &EntityDefinition, frame_count: usize) -> Self {
        Self {
            id: definition.id.clone(),
            entity_type: definition.entity_type,
            frame_count,
            base_tint: definition.tint,
            initial_cell: definition.position,
            visible: false,
            cell: definition.position,
            offset: Offset::ZERO,
            tint: definition.tint,
            frame: 0,
            decorating_text: String::new(),
            information_text: String::new(),
            auxiliary: AuxiliaryState::default(),
        }
    }

    fn reset(&mut self) {
        self.visible = false;
        self.cell = self.initial_cell;
        self.offset = Offset::ZERO;
        self.tint = self.base_tint;
        self.frame = 0;
        self.decorating_text.clear();
        self.information_text.clear();
        self.auxiliary = AuxiliaryState::default();
    }

    fn refresh_information_text(&mut self) {
        let aux = &self.auxiliary;
        let capacity = aux.capacity.unwrap_or(0.0);
        let mut text = String::new();
        let written = match self.entity_type {
            EntityType::Container => {
                write!(text, "{} / {capacity}", aux.level.unwrap_or(0.0))
            }
            EntityType::Resource => {
                write!(text, "{} / {capacity}", aux.utilization.unwrap_or(0.0))
            }
            EntityType::Store => write!(text, "{} / {capacity}", aux.content.len()),
            EntityType::Custom | EntityType::Process => return,
        };
        if written.is_ok() {
            self.information_text = text;
        }
    }
}

/// A headless scene holding entity state in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    entities: Vec<EntityState>,
    index: BTreeMap<String, EntityHandle>,
    interactions: BTreeSet<(EntityHandle, EntityHandle)>,
}

impl MemoryScene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from entity and visual definitions.
    ///
    /// Each entity's frame count comes from the visual it references;
    /// entities without a visual have no frames.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownVisual`] if an entity references a
    /// visual that is not defined, or [`SceneError::DuplicateEntity`] if
    /// two entities share an identifier.
    pub fn from_definitions(
        entities: &[EntityDefinition],
        visuals: &[VisualDefinition],
    ) -> Result<Self, SceneError> {
        let frames: BTreeMap<&str, usize> = visuals
            .iter()
            .map(|visual| (visual.id.as_str(), visual.frames.len()))
            .collect();

        let mut scene = Self::new();
        for definition in entities {
            let frame_count = match definition.visual.as_deref() {
                Some(visual) => *frames.get(visual).ok_or_else(|| SceneError::UnknownVisual {
                    entity: definition.id.clone(),
                    visual: visual.to_owned(),
                })?,
                None => 0,
            };
            scene.add_entity(definition, frame_count)?;
        }
        Ok(scene)
    }

    /// Add one entity in its initial state.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::DuplicateEntity`] if the identifier is taken.
    pub fn add_entity(
        &mut self,
        definition: &EntityDefinition,
        frame_count: usize,
    ) -> Result<EntityHandle, SceneError> {
        if self.index.contains_key(&definition.id) {
            return Err(SceneError::DuplicateEntity {
                id: definition.id.clone(),
            });
        }
        let handle = EntityHandle::new(self.entities.len());
        self.entities
            .push(EntityState::from_definition(definition, frame_count));
        self.index.insert(definition.id.clone(), handle);
        Ok(handle)
    }

    /// Look up an entity's state by identifier.
    pub fn entity(&self, id: &str) -> Option<&EntityState> {
        self.index
            .get(id)
            .and_then(|handle| self.entities.get(handle.raw()))
    }

    /// Iterate over all entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityState> {
        self.entities.iter()
    }

    /// Number of entities in the scene.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the scene holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether `source` is currently interacting with `target`.
    pub fn is_interacting(&self, source: &str, target: &str) -> bool {
        match (self.index.get(source), self.index.get(target)) {
            (Some(s), Some(t)) => self.interactions.contains(&(*s, *t)),
            _ => false,
        }
    }

    /// Number of active interactions.
    pub fn interaction_count(&self) -> usize {
        self.interactions.len()
    }

    fn state(&self, entity: EntityHandle) -> Result<&EntityState, SceneError> {
        self.entities
            .get(entity.raw())
            .ok_or(SceneError::UnknownHandle {
                handle: entity.raw(),
            })
    }

    fn state_mut(&mut self, entity: EntityHandle) -> Result<&mut EntityState, SceneError> {
        self.entities
            .get_mut(entity.raw())
            .ok_or(SceneError::UnknownHandle {
                handle: entity.raw(),
            })
    }
}

impl Scene for MemoryScene {
    fn find_entity(&self, id: &str) -> Result<EntityHandle, SceneError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| SceneError::EntityNotFound { id: id.to_owned() })
    }

    fn position(&self, entity: EntityHandle) -> Result<Cell, SceneError> {
        Ok(self.state(entity)?.cell)
    }

    fn set_visible(&mut self, entity: EntityHandle, visible: bool) -> Result<(), SceneError> {
        self.state_mut(entity)?.visible = visible;
        Ok(())
    }

    fn set_position(&mut self, entity: EntityHandle, cell: Cell) -> Result<(), SceneError> {
        self.state_mut(entity)?.cell = cell;
        Ok(())
    }

    fn set_offset(&mut self, entity: EntityHandle, offset: Offset) -> Result<(), SceneError> {
        self.state_mut(entity)?.offset = offset;
        Ok(())
    }

    fn set_tint(&mut self, entity: EntityHandle, color: u32) -> Result<(), SceneError> {
        self.state_mut(entity)?.tint = color;
        Ok(())
    }

    fn set_animation_frame(
        &mut self,
        entity: EntityHandle,
        index: usize,
    ) -> Result<(), SceneError> {
        let state = self.state_mut(entity)?;
        if index >= state.frame_count {
            return Err(SceneError::FrameOutOfRange {
                entity: state.id.clone(),
                index: i64::try_from(index).unwrap_or(i64::MAX),
                frames: state.frame_count,
            });
        }
        state.frame = index;
        Ok(())
    }

    fn set_decorating_text(&mut self, entity: EntityHandle, text: &str) -> Result<(), SceneError> {
        text.clone_into(&mut self.state_mut(entity)?.decorating_text);
        Ok(())
    }

    fn begin_interaction(
        &mut self,
        source: EntityHandle,
        target: EntityHandle,
    ) -> Result<(), SceneError> {
        self.state(source)?;
        self.state(target)?;
        if self.interactions.insert((source, target)) {
            debug!(source = source.raw(), target = target.raw(), "Interaction started");
        }
        Ok(())
    }

    fn end_interaction(
        &mut self,
        source: EntityHandle,
        target: EntityHandle,
    ) -> Result<(), SceneError> {
        self.state(source)?;
        self.state(target)?;
        if self.interactions.remove(&(source, target)) {
            debug!(source = source.raw(), target = target.raw(), "Interaction ended");
        }
        Ok(())
    }

    fn set_auxiliary_numeric(
        &mut self,
        entity: EntityHandle,
        field: AuxField,
        value: f64,
    ) -> Result<(), SceneError> {
        let state = self.state_mut(entity)?;
        let slot = match field {
            AuxField::Capacity => &mut state.auxiliary.capacity,
            AuxField::Level => &mut state.auxiliary.level,
            AuxField::Utilization => &mut state.auxiliary.utilization,
        };
        *slot = Some(value);
        state.refresh_information_text();
        Ok(())
    }

    fn set_auxiliary_content(
        &mut self,
        entity: EntityHandle,
        items: &[serde_json::Value],
    ) -> Result<(), SceneError> {
        let state = self.state_mut(entity)?;
        state.auxiliary.content = items.to_vec();
        state.refresh_information_text();
        Ok(())
    }

    fn reset_all(&mut self) {
        for entity in &mut self.entities {
            entity.reset();
        }
        self.interactions.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn sample_scene() -> MemoryScene {
        let visuals = vec![VisualDefinition {
            id: String::from("walker"),
            frames: vec![String::from("a.png"), String::from("b.png")],
        }];
        let entities = vec![
            EntityDefinition::new("alice").with_visual("walker").with_tint(0x4512fa),
            EntityDefinition::new("tank").with_type(EntityType::Container),
            EntityDefinition::new("pump").with_type(EntityType::Resource),
            EntityDefinition::new("shelf").with_type(EntityType::Store),
        ];
        MemoryScene::from_definitions(&entities, &visuals).unwrap()
    }

    #[test]
    fn entities_start_hidden_with_base_tint() {
        let scene = sample_scene();
        let alice = scene.entity("alice").unwrap();
        assert!(!alice.visible);
        assert_eq!(alice.tint, 0x4512fa);
        assert_eq!(alice.frame_count, 2);
        assert_eq!(scene.len(), 4);
    }

    #[test]
    fn find_unknown_entity_fails() {
        let scene = sample_scene();
        let err = scene.find_entity("nobody").unwrap_err();
        assert_eq!(
            err,
            SceneError::EntityNotFound {
                id: String::from("nobody")
            }
        );
    }

    #[test]
    fn unknown_visual_is_rejected() {
        let entities = vec![EntityDefinition::new("ghost").with_visual("missing")];
        let err = MemoryScene::from_definitions(&entities, &[]).unwrap_err();
        assert!(matches!(err, SceneError::UnknownVisual { .. }));
    }

    #[test]
    fn duplicate_entity_is_rejected() {
        let entities = vec![EntityDefinition::new("twin"), EntityDefinition::new("twin")];
        let err = MemoryScene::from_definitions(&entities, &[]).unwrap_err();
        assert!(matches!(err, SceneError::DuplicateEntity { .. }));
    }

    #[test]
    fn frame_out_of_range_fails() {
        let mut scene = sample_scene();
        let alice = scene.find_entity("alice").unwrap();
        assert!(scene.set_animation_frame(alice, 1).is_ok());
        let err = scene.set_animation_frame(alice, 2).unwrap_err();
        assert!(matches!(err, SceneError::FrameOutOfRange { frames: 2, .. }));
        assert_eq!(scene.entity("alice").unwrap().frame, 1);
    }

    #[test]
    fn interactions_are_idempotent() {
        let mut scene = sample_scene();
        let alice = scene.find_entity("alice").unwrap();
        let tank = scene.find_entity("tank").unwrap();
        scene.begin_interaction(alice, tank).unwrap();
        scene.begin_interaction(alice, tank).unwrap();
        assert_eq!(scene.interaction_count(), 1);
        assert!(scene.is_interacting("alice", "tank"));
        assert!(!scene.is_interacting("tank", "alice"));

        scene.end_interaction(alice, tank).unwrap();
        scene.end_interaction(alice, tank).unwrap();
        assert_eq!(scene.interaction_count(), 0);
    }

    #[test]
    fn container_information_text_tracks_level_and_capacity() {
        let mut scene = sample_scene();
        let tank = scene.find_entity("tank").unwrap();
        scene
            .set_auxiliary_numeric(tank, AuxField::Capacity, 100.0)
            .unwrap();
        assert_eq!(scene.entity("tank").unwrap().information_text, "0 / 100");
        scene
            .set_auxiliary_numeric(tank, AuxField::Level, 42.5)
            .unwrap();
        assert_eq!(scene.entity("tank").unwrap().information_text, "42.5 / 100");
    }

    #[test]
    fn resource_and_store_information_text() {
        let mut scene = sample_scene();
        let pump = scene.find_entity("pump").unwrap();
        let shelf = scene.find_entity("shelf").unwrap();
        scene
            .set_auxiliary_numeric(pump, AuxField::Utilization, 1.0)
            .unwrap();
        scene
            .set_auxiliary_numeric(pump, AuxField::Capacity, 3.0)
            .unwrap();
        scene
            .set_auxiliary_content(shelf, &[serde_json::json!({ "resourceId": 98 })])
            .unwrap();
        assert_eq!(scene.entity("pump").unwrap().information_text, "1 / 3");
        assert_eq!(scene.entity("shelf").unwrap().information_text, "1 / 0");
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut scene = sample_scene();
        let alice = scene.find_entity("alice").unwrap();
        let tank = scene.find_entity("tank").unwrap();
        scene.set_visible(alice, true).unwrap();
        scene.set_position(alice, Cell::new(3, 4)).unwrap();
        scene.set_offset(alice, Offset::new(0.2, -0.1)).unwrap();
        scene.set_tint(alice, 0x00ff00).unwrap();
        scene.set_animation_frame(alice, 1).unwrap();
        scene.set_decorating_text(alice, "busy").unwrap();
        scene.set_auxiliary_numeric(tank, AuxField::Level, 5.0).unwrap();
        scene.begin_interaction(alice, tank).unwrap();

        scene.reset_all();

        let state = scene.entity("alice").unwrap();
        assert!(!state.visible);
        assert_eq!(state.cell, Cell::default());
        assert_eq!(state.offset, Offset::ZERO);
        assert_eq!(state.tint, 0x4512fa);
        assert_eq!(state.frame, 0);
        assert!(state.decorating_text.is_empty());
        let tank_state = scene.entity("tank").unwrap();
        assert!(tank_state.information_text.is_empty());
        assert_eq!(tank_state.auxiliary.level, None);
        assert_eq!(scene.interaction_count(), 0);
    }
}
