//! Applying events to a [`Scene`].
//!
//! Every command is one synchronous state transition expressed purely in
//! terms of scene operations. "Set"-style commands are idempotent.
//! Movement commands add a jitter offset drawn from an RNG seeded by the
//! event's own contents, so replaying the same event always lands on the
//! same spot.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tickreel_scene::{AuxField, Cell, EntityHandle, Offset, Scene};
use tracing::trace;

use crate::command::{CellArgs, Command, Event};
use crate::error::ApplyError;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Largest representable `0xRRGGBB` color.
pub const MAX_COLOR: u32 = 0xFF_FFFF;

/// Maximum jitter, in cell units per axis, for movement commands.
pub const NEAR_OFFSET_EXTENT: f64 = 0.35;

impl Event {
    /// Apply this event to `scene`.
    ///
    /// # Errors
    ///
    /// Returns [`ApplyError::Scene`] if a referenced entity does not exist
    /// or the scene rejects the operation, [`ApplyError::InvalidColor`] for
    /// a tint outside `0..=0xFFFFFF`, and [`ApplyError::NegativeFrame`] for
    /// a negative frame index.
    pub fn apply<S: Scene + ?Sized>(&self, scene: &mut S) -> Result<(), ApplyError> {
        trace!(
            entity = self.target_id(),
            timestamp = self.timestamp(),
            kind = %self.kind(),
            "Applying event"
        );
        let entity = scene.find_entity(self.target_id())?;
        match self.command() {
            Command::SetVisible(args) => scene.set_visible(entity, args.visible)?,
            Command::SetPosition(args) => {
                scene.set_position(entity, Cell::new(args.x, args.y))?;
                scene.set_offset(entity, Offset::ZERO)?;
            }
            Command::SetDecoratingText(args) => scene.set_decorating_text(entity, &args.text)?,
            Command::SetInteracting(args) => {
                let peer = scene.find_entity(&args.with_id)?;
                scene.begin_interaction(entity, peer)?;
            }
            Command::SetNotInteracting(args) => {
                let peer = scene.find_entity(&args.with_id)?;
                scene.end_interaction(entity, peer)?;
            }
            Command::MoveNear(args) => {
                let target = scene.find_entity(&args.target)?;
                let cell = scene.position(target)?;
                self.move_near(scene, entity, cell)?;
            }
            Command::MoveNearCell(CellArgs { x, y }) => {
                self.move_near(scene, entity, Cell::new(*x, *y))?;
            }
            Command::SetTintColor(args) => {
                let color = u32::try_from(args.color)
                    .ok()
                    .filter(|color| *color <= MAX_COLOR)
                    .ok_or_else(|| ApplyError::InvalidColor {
                        entity: self.target_id().to_owned(),
                        color: args.color,
                    })?;
                scene.set_tint(entity, color)?;
            }
            Command::SetSpriteFrame(args) => {
                let index = usize::try_from(args.frame).map_err(|_err| ApplyError::NegativeFrame {
                    entity: self.target_id().to_owned(),
                    index: args.frame,
                })?;
                scene.set_animation_frame(entity, index)?;
            }
            Command::ResourceSetCapacity(args)
            | Command::ContainerSetCapacity(args)
            | Command::StoreSetCapacity(args) => {
                scene.set_auxiliary_numeric(entity, AuxField::Capacity, args.capacity)?;
            }
            Command::ResourceSetUtilization(args) => {
                scene.set_auxiliary_numeric(entity, AuxField::Utilization, args.utilization)?;
            }
            Command::ContainerSetLevel(args) => {
                scene.set_auxiliary_numeric(entity, AuxField::Level, args.level)?;
            }
            Command::StoreSetContent(args) => scene.set_auxiliary_content(entity, &args.content)?,
        }
        Ok(())
    }

    fn move_near<S: Scene + ?Sized>(
        &self,
        scene: &mut S,
        entity: EntityHandle,
        cell: Cell,
    ) -> Result<(), ApplyError> {
        scene.set_position(entity, cell)?;
        scene.set_offset(entity, self.jitter())?;
        Ok(())
    }

    /// Jitter offset for movement commands, stable for a given event.
    pub fn jitter(&self) -> Offset {
        let mut rng = StdRng::seed_from_u64(self.jitter_seed());
        Offset::new(
            rng.random_range(-NEAR_OFFSET_EXTENT..=NEAR_OFFSET_EXTENT),
            rng.random_range(-NEAR_OFFSET_EXTENT..=NEAR_OFFSET_EXTENT),
        )
    }

    /// FNV-1a over the event's target, timestamp, kind, and movement args.
    fn jitter_seed(&self) -> u64 {
        let mut seed = fnv1a(FNV_OFFSET_BASIS, self.target_id().as_bytes());
        seed = fnv1a(seed, &self.timestamp().to_le_bytes());
        seed = fnv1a(seed, self.kind().tag().as_bytes());
        match self.command() {
            Command::MoveNear(args) => fnv1a(seed, args.target.as_bytes()),
            Command::MoveNearCell(args) => {
                let seed = fnv1a(seed, &args.x.to_le_bytes());
                fnv1a(seed, &args.y.to_le_bytes())
            }
            _ => seed,
        }
    }
}

fn fnv1a(hash: u64, bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(hash, |hash, byte| (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use tickreel_scene::{
        EntityDefinition, EntityType, MemoryScene, SceneError, VisualDefinition,
    };

    use super::*;
    use crate::command::{
        CapacityArgs, ColorArgs, ContentArgs, FrameArgs, LevelArgs, PeerArgs, TargetArgs,
        TextArgs, UtilizationArgs, VisibleArgs,
    };

    fn scene() -> MemoryScene {
        let visuals = vec![VisualDefinition {
            id: String::from("walker"),
            frames: vec![String::from("f0"), String::from("f1"), String::from("f2")],
        }];
        let entities = vec![
            EntityDefinition::new("alice").with_visual("walker"),
            EntityDefinition::new("bob"),
            EntityDefinition::new("tank").with_type(EntityType::Container),
            EntityDefinition::new("pump").with_type(EntityType::Resource),
            EntityDefinition::new("shelf").with_type(EntityType::Store),
        ];
        MemoryScene::from_definitions(&entities, &visuals).unwrap()
    }

    fn event(target: &str, command: Command) -> Event {
        Event::new(target, 0, command)
    }

    #[test]
    fn set_visible_shows_entity() {
        let mut scene = scene();
        event("alice", Command::SetVisible(VisibleArgs { visible: true }))
            .apply(&mut scene)
            .unwrap();
        assert!(scene.entity("alice").unwrap().visible);
    }

    #[test]
    fn missing_entity_propagates() {
        let mut scene = scene();
        let err = event("ghost", Command::SetVisible(VisibleArgs { visible: true }))
            .apply(&mut scene)
            .unwrap_err();
        assert_eq!(
            err,
            ApplyError::Scene(SceneError::EntityNotFound {
                id: String::from("ghost")
            })
        );
    }

    #[test]
    fn set_position_clears_offset() {
        let mut scene = scene();
        event("alice", Command::MoveNearCell(CellArgs { x: 1, y: 1 }))
            .apply(&mut scene)
            .unwrap();
        event("alice", Command::SetPosition(CellArgs { x: 3, y: 2 }))
            .apply(&mut scene)
            .unwrap();
        let alice = scene.entity("alice").unwrap();
        assert_eq!(alice.cell, Cell::new(3, 2));
        assert_eq!(alice.offset, Offset::ZERO);
    }

    #[test]
    fn interactions_need_both_entities() {
        let mut scene = scene();
        let with_bob = PeerArgs {
            with_id: String::from("bob"),
        };
        event("alice", Command::SetInteracting(with_bob.clone()))
            .apply(&mut scene)
            .unwrap();
        assert!(scene.is_interacting("alice", "bob"));

        event("alice", Command::SetNotInteracting(with_bob))
            .apply(&mut scene)
            .unwrap();
        assert!(!scene.is_interacting("alice", "bob"));

        let err = event(
            "alice",
            Command::SetInteracting(PeerArgs {
                with_id: String::from("nobody"),
            }),
        )
        .apply(&mut scene)
        .unwrap_err();
        assert!(matches!(err, ApplyError::Scene(SceneError::EntityNotFound { .. })));
    }

    #[test]
    fn move_near_lands_on_target_cell_with_stable_jitter() {
        let mut scene = scene();
        event("bob", Command::SetPosition(CellArgs { x: 4, y: 1 }))
            .apply(&mut scene)
            .unwrap();
        let move_near = event(
            "alice",
            Command::MoveNear(TargetArgs {
                target: String::from("bob"),
            }),
        );
        move_near.apply(&mut scene).unwrap();
        let first = scene.entity("alice").unwrap().offset;
        assert_eq!(scene.entity("alice").unwrap().cell, Cell::new(4, 1));
        assert!(first.dx.abs() <= NEAR_OFFSET_EXTENT);
        assert!(first.dy.abs() <= NEAR_OFFSET_EXTENT);

        scene.reset_all();
        event("bob", Command::SetPosition(CellArgs { x: 4, y: 1 }))
            .apply(&mut scene)
            .unwrap();
        move_near.apply(&mut scene).unwrap();
        assert_eq!(scene.entity("alice").unwrap().offset, first);
    }

    #[test]
    fn fnv1a_matches_reference_vectors() {
        assert_eq!(fnv1a(FNV_OFFSET_BASIS, b""), FNV_OFFSET_BASIS);
        assert_eq!(fnv1a(FNV_OFFSET_BASIS, b"a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(fnv1a(FNV_OFFSET_BASIS, b"foobar"), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn jitter_seed_is_pinned_across_builds() {
        let near = event(
            "alice",
            Command::MoveNear(TargetArgs {
                target: String::from("bob"),
            }),
        );
        assert_eq!(near.jitter_seed(), 0x3eb8_bd9f_1c66_dae4);

        let near_cell = event("alice", Command::MoveNearCell(CellArgs { x: 2, y: -1 }));
        assert_eq!(near_cell.jitter_seed(), 0xef00_05b0_fb0b_85ec);
        assert_ne!(near.jitter_seed(), near_cell.jitter_seed());
    }

    #[test]
    fn tint_color_range_is_enforced() {
        let mut scene = scene();
        event("alice", Command::SetTintColor(ColorArgs { color: 0x123456 }))
            .apply(&mut scene)
            .unwrap();
        assert_eq!(scene.entity("alice").unwrap().tint, 0x123456);

        for color in [-1, 0x100_0000] {
            let err = event("alice", Command::SetTintColor(ColorArgs { color }))
                .apply(&mut scene)
                .unwrap_err();
            assert!(matches!(err, ApplyError::InvalidColor { .. }));
        }
        assert_eq!(scene.entity("alice").unwrap().tint, 0x123456);
    }

    #[test]
    fn sprite_frame_range_is_enforced() {
        let mut scene = scene();
        event("alice", Command::SetSpriteFrame(FrameArgs { frame: 2 }))
            .apply(&mut scene)
            .unwrap();
        assert_eq!(scene.entity("alice").unwrap().frame, 2);

        let err = event("alice", Command::SetSpriteFrame(FrameArgs { frame: 3 }))
            .apply(&mut scene)
            .unwrap_err();
        assert!(matches!(err, ApplyError::Scene(SceneError::FrameOutOfRange { .. })));

        let err = event("alice", Command::SetSpriteFrame(FrameArgs { frame: -1 }))
            .apply(&mut scene)
            .unwrap_err();
        assert!(matches!(err, ApplyError::NegativeFrame { index: -1, .. }));
    }

    #[test]
    fn auxiliary_commands_update_scene() {
        let mut scene = scene();
        event(
            "tank",
            Command::ContainerSetCapacity(CapacityArgs { capacity: 50.0 }),
        )
        .apply(&mut scene)
        .unwrap();
        event("tank", Command::ContainerSetLevel(LevelArgs { level: 20.0 }))
            .apply(&mut scene)
            .unwrap();
        assert_eq!(scene.entity("tank").unwrap().information_text, "20 / 50");

        event(
            "pump",
            Command::ResourceSetUtilization(UtilizationArgs { utilization: 2.0 }),
        )
        .apply(&mut scene)
        .unwrap();
        event(
            "pump",
            Command::ResourceSetCapacity(CapacityArgs { capacity: 4.0 }),
        )
        .apply(&mut scene)
        .unwrap();
        assert_eq!(scene.entity("pump").unwrap().auxiliary.utilization, Some(2.0));

        event(
            "shelf",
            Command::StoreSetCapacity(CapacityArgs { capacity: 10.0 }),
        )
        .apply(&mut scene)
        .unwrap();
        event(
            "shelf",
            Command::StoreSetContent(ContentArgs {
                content: vec![serde_json::json!({ "resourceId": 98, "amount": 76 })],
            }),
        )
        .apply(&mut scene)
        .unwrap();
        assert_eq!(scene.entity("shelf").unwrap().auxiliary.content.len(), 1);
        assert_eq!(scene.entity("shelf").unwrap().information_text, "1 / 10");
    }

    #[test]
    fn decorating_text_is_replaced() {
        let mut scene = scene();
        event(
            "bob",
            Command::SetDecoratingText(TextArgs {
                text: String::from("waiting"),
            }),
        )
        .apply(&mut scene)
        .unwrap();
        assert_eq!(scene.entity("bob").unwrap().decorating_text, "waiting");
    }
}
