//! Error types for decoding and applying events.

use tickreel_scene::SceneError;

use crate::kind::EventKind;

/// A serialized record could not be turned into an [`Event`](crate::Event).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The record's kind is not registered.
    #[error("unknown event kind: {kind}")]
    UnknownKind {
        /// The tag found in the record.
        kind: String,
    },

    /// The arguments do not satisfy the kind's schema.
    #[error("invalid args for event {kind}: {reason}")]
    InvalidArgs {
        /// The kind whose schema was violated.
        kind: EventKind,
        /// Which field was missing, null, or mistyped.
        reason: String,
    },

    /// The record itself is not well formed.
    #[error("malformed event record: {reason}")]
    MalformedRecord {
        /// Description of the structural problem.
        reason: String,
    },
}

/// Applying an event to a scene failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    /// The scene rejected the operation (missing entity, bad frame, ...).
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// The color lies outside `0x000000..=0xFFFFFF`.
    #[error("invalid color {color:#x} for entity {entity}")]
    InvalidColor {
        /// The entity being tinted.
        entity: String,
        /// The rejected color value.
        color: i64,
    },

    /// A negative animation frame index was requested.
    #[error("frame {index} out of range for entity {entity}")]
    NegativeFrame {
        /// The entity being animated.
        entity: String,
        /// The rejected frame index.
        index: i64,
    },
}
