//! The closed set of event kinds and their wire tags.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discriminator selecting an event's argument shape and apply semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Show or hide an entity.
    #[serde(rename = "SET_VISIBLE")]
    SetVisible,
    /// Place an entity on a cell.
    #[serde(rename = "SET_POSITION")]
    SetPosition,
    /// Replace an entity's decorating text.
    #[serde(rename = "SET_DECORATING_TEXT")]
    SetDecoratingText,
    /// Start an interaction with another entity.
    #[serde(rename = "SET_INTERACTING")]
    SetInteracting,
    /// End an interaction with another entity.
    #[serde(rename = "SET_NOT_INTERACTING")]
    SetNotInteracting,
    /// Move next to another entity.
    #[serde(rename = "MOVE_NEAR")]
    MoveNear,
    /// Move next to a cell.
    #[serde(rename = "MOVE_NEAR_CELL")]
    MoveNearCell,
    /// Tint an entity.
    #[serde(rename = "SET_TINT_COLOR")]
    SetTintColor,
    /// Show one animation frame.
    #[serde(rename = "SET_SPRITE_FRAME")]
    SetSpriteFrame,
    /// Set a resource's capacity.
    #[serde(rename = "RESOURCE.SET_CAPACITY")]
    ResourceSetCapacity,
    /// Set a resource's utilization.
    #[serde(rename = "RESOURCE.SET_UTILIZATION")]
    ResourceSetUtilization,
    /// Set a container's level.
    #[serde(rename = "CONTAINER.SET_LEVEL")]
    ContainerSetLevel,
    /// Set a container's capacity.
    #[serde(rename = "CONTAINER.SET_CAPACITY")]
    ContainerSetCapacity,
    /// Set a store's capacity.
    #[serde(rename = "STORE.SET_CAPACITY")]
    StoreSetCapacity,
    /// Replace a store's content.
    #[serde(rename = "STORE.SET_CONTENT")]
    StoreSetContent,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 15] = [
        Self::SetVisible,
        Self::SetPosition,
        Self::SetDecoratingText,
        Self::SetInteracting,
        Self::SetNotInteracting,
        Self::MoveNear,
        Self::MoveNearCell,
        Self::SetTintColor,
        Self::SetSpriteFrame,
        Self::ResourceSetCapacity,
        Self::ResourceSetUtilization,
        Self::ContainerSetLevel,
        Self::ContainerSetCapacity,
        Self::StoreSetCapacity,
        Self::StoreSetContent,
    ];

    /// The tag used for this kind in serialized logs.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::SetVisible => "SET_VISIBLE",
            Self::SetPosition => "SET_POSITION",
            Self::SetDecoratingText => "SET_DECORATING_TEXT",
            Self::SetInteracting => "SET_INTERACTING",
            Self::SetNotInteracting => "SET_NOT_INTERACTING",
            Self::MoveNear => "MOVE_NEAR",
            Self::MoveNearCell => "MOVE_NEAR_CELL",
            Self::SetTintColor => "SET_TINT_COLOR",
            Self::SetSpriteFrame => "SET_SPRITE_FRAME",
            Self::ResourceSetCapacity => "RESOURCE.SET_CAPACITY",
            Self::ResourceSetUtilization => "RESOURCE.SET_UTILIZATION",
            Self::ContainerSetLevel => "CONTAINER.SET_LEVEL",
            Self::ContainerSetCapacity => "CONTAINER.SET_CAPACITY",
            Self::StoreSetCapacity => "STORE.SET_CAPACITY",
            Self::StoreSetContent => "STORE.SET_CONTENT",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
