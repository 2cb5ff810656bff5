//! Typed argument payloads and the [`Command`] sum type.
//!
//! Each [`EventKind`] maps to exactly one [`Command`] variant. Argument
//! structs deserialize from the normalized map produced by
//! [`schema::validate`](crate::schema::validate).

use serde::{Deserialize, Serialize};

use crate::kind::EventKind;

/// Arguments of [`EventKind::SetVisible`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleArgs {
    /// Whether the entity is drawn.
    pub visible: bool,
}

/// Cell coordinates for [`EventKind::SetPosition`] and [`EventKind::MoveNearCell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellArgs {
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
}

/// Arguments of [`EventKind::SetDecoratingText`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextArgs {
    /// Replacement text.
    pub text: String,
}

/// Peer entity for [`EventKind::SetInteracting`] and [`EventKind::SetNotInteracting`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerArgs {
    /// The other side of the interaction.
    #[serde(rename = "withId")]
    pub with_id: String,
}

/// Arguments of [`EventKind::MoveNear`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetArgs {
    /// Entity to move next to.
    pub target: String,
}

/// Arguments of [`EventKind::SetTintColor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorArgs {
    /// Tint as `0xRRGGBB`; range is checked when applied.
    pub color: i64,
}

/// Arguments of [`EventKind::SetSpriteFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameArgs {
    /// Frame index; range is checked when applied.
    pub frame: i64,
}

/// Capacity for the resource, container, and store capacity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityArgs {
    /// New capacity.
    pub capacity: f64,
}

/// Arguments of [`EventKind::ResourceSetUtilization`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtilizationArgs {
    /// Units in use.
    pub utilization: f64,
}

/// Arguments of [`EventKind::ContainerSetLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelArgs {
    /// New fill level.
    pub level: f64,
}

/// Arguments of [`EventKind::StoreSetContent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentArgs {
    /// Items held by the store, passed through to the scene as-is.
    pub content: Vec<serde_json::Value>,
}

/// A validated command, one variant per [`EventKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// See [`EventKind::SetVisible`].
    SetVisible(VisibleArgs),
    /// See [`EventKind::SetPosition`].
    SetPosition(CellArgs),
    /// See [`EventKind::SetDecoratingText`].
    SetDecoratingText(TextArgs),
    /// See [`EventKind::SetInteracting`].
    SetInteracting(PeerArgs),
    /// See [`EventKind::SetNotInteracting`].
    SetNotInteracting(PeerArgs),
    /// See [`EventKind::MoveNear`].
    MoveNear(TargetArgs),
    /// See [`EventKind::MoveNearCell`].
    MoveNearCell(CellArgs),
    /// See [`EventKind::SetTintColor`].
    SetTintColor(ColorArgs),
    /// See [`EventKind::SetSpriteFrame`].
    SetSpriteFrame(FrameArgs),
    /// See [`EventKind::ResourceSetCapacity`].
    ResourceSetCapacity(CapacityArgs),
    /// See [`EventKind::ResourceSetUtilization`].
    ResourceSetUtilization(UtilizationArgs),
    /// See [`EventKind::ContainerSetLevel`].
    ContainerSetLevel(LevelArgs),
    /// See [`EventKind::ContainerSetCapacity`].
    ContainerSetCapacity(CapacityArgs),
    /// See [`EventKind::StoreSetCapacity`].
    StoreSetCapacity(CapacityArgs),
    /// See [`EventKind::StoreSetContent`].
    StoreSetContent(ContentArgs),
}

impl Command {
    /// The kind this command was decoded as.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::SetVisible(_) => EventKind::SetVisible,
            Self::SetPosition(_) => EventKind::SetPosition,
            Self::SetDecoratingText(_) => EventKind::SetDecoratingText,
            Self::SetInteracting(_) => EventKind::SetInteracting,
            Self::SetNotInteracting(_) => EventKind::SetNotInteracting,
            Self::MoveNear(_) => EventKind::MoveNear,
            Self::MoveNearCell(_) => EventKind::MoveNearCell,
            Self::SetTintColor(_) => EventKind::SetTintColor,
            Self::SetSpriteFrame(_) => EventKind::SetSpriteFrame,
            Self::ResourceSetCapacity(_) => EventKind::ResourceSetCapacity,
            Self::ResourceSetUtilization(_) => EventKind::ResourceSetUtilization,
            Self::ContainerSetLevel(_) => EventKind::ContainerSetLevel,
            Self::ContainerSetCapacity(_) => EventKind::ContainerSetCapacity,
            Self::StoreSetCapacity(_) => EventKind::StoreSetCapacity,
            Self::StoreSetContent(_) => EventKind::StoreSetContent,
        }
    }
}

/// One validated, timestamped command in a simulation log.
///
/// Events are immutable once built and may be applied any number of
/// times (every replay after a reset applies them again).
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    target_id: String,
    timestamp: u64,
    command: Command,
}

impl Event {
    /// Create an event from an already-typed command.
    pub fn new(target_id: impl Into<String>, timestamp: u64, command: Command) -> Self {
        Self {
            target_id: target_id.into(),
            timestamp,
            command,
        }
    }

    /// Identifier of the entity this event affects.
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Logical step at which the event takes effect.
    pub const fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The event's kind.
    pub const fn kind(&self) -> EventKind {
        self.command.kind()
    }

    /// The typed command payload.
    pub const fn command(&self) -> &Command {
        &self.command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_exposes_its_fields() {
        let event = Event::new(
            "leet",
            1337,
            Command::SetSpriteFrame(FrameArgs { frame: 9 }),
        );
        assert_eq!(event.target_id(), "leet");
        assert_eq!(event.timestamp(), 1337);
        assert_eq!(event.kind(), EventKind::SetSpriteFrame);
        assert_eq!(
            event.command(),
            &Command::SetSpriteFrame(FrameArgs { frame: 9 })
        );
    }

    #[test]
    fn shared_payloads_keep_distinct_kinds() {
        let args = CapacityArgs { capacity: 4.0 };
        assert_eq!(
            Command::ResourceSetCapacity(args).kind(),
            EventKind::ResourceSetCapacity
        );
        assert_eq!(
            Command::ContainerSetCapacity(args).kind(),
            EventKind::ContainerSetCapacity
        );
        assert_eq!(
            Command::StoreSetCapacity(args).kind(),
            EventKind::StoreSetCapacity
        );
    }
}
