//! Error types for the `tickreel-scene` crate.
//!
//! Every fallible [`Scene`](crate::Scene) operation returns [`SceneError`].

/// Errors raised by a scene adapter while locating or mutating entities.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// No entity with the requested identifier exists in the scene.
    #[error("entity not found: {id}")]
    EntityNotFound {
        /// The identifier that was looked up.
        id: String,
    },

    /// A handle does not refer to an entity owned by this scene.
    #[error("unknown entity handle {handle}")]
    UnknownHandle {
        /// The raw handle value.
        handle: usize,
    },

    /// The requested animation frame does not exist on the entity's visual.
    #[error("frame {index} out of range for entity {entity} ({frames} frames)")]
    FrameOutOfRange {
        /// The entity whose frame was set.
        entity: String,
        /// The requested frame index.
        index: i64,
        /// Number of frames the entity's visual provides.
        frames: usize,
    },

    /// An entity references a visual that was never defined.
    #[error("entity {entity} references unknown visual {visual}")]
    UnknownVisual {
        /// The entity carrying the reference.
        entity: String,
        /// The missing visual identifier.
        visual: String,
    },

    /// Two entity definitions share the same identifier.
    #[error("duplicate entity id: {id}")]
    DuplicateEntity {
        /// The repeated identifier.
        id: String,
    },
}
