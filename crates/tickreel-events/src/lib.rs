//! Typed event protocol for tickreel playback.
//!
//! Serialized records are decoded through an [`EventRegistry`], which
//! checks each record against its kind's argument schema and produces an
//! immutable [`Event`]. Events are applied to any [`Scene`](tickreel_scene::Scene).
//!
//! # Modules
//!
//! - [`apply`] -- Applying events to a scene.
//! - [`command`] -- Typed argument payloads and [`Command`].
//! - [`error`] -- [`DecodeError`] and [`ApplyError`].
//! - [`kind`] -- The closed set of [`EventKind`]s and their wire tags.
//! - [`registry`] -- [`EventRecord`] and [`EventRegistry`].
//! - [`schema`] -- Per-kind required fields and validation.

pub mod apply;
pub mod command;
pub mod error;
pub mod kind;
pub mod registry;
pub mod schema;

pub use apply::{MAX_COLOR, NEAR_OFFSET_EXTENT};
pub use command::{
    CapacityArgs, CellArgs, ColorArgs, Command, ContentArgs, Event, FrameArgs, LevelArgs,
    PeerArgs, TargetArgs, TextArgs, UtilizationArgs, VisibleArgs,
};
pub use error::{ApplyError, DecodeError};
pub use kind::EventKind;
pub use registry::{EventRecord, EventRegistry};
pub use schema::FieldSpec;
