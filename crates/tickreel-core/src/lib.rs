//! Playback core for tickreel.
//!
//! Replays a [`SimulationLog`] against a [`Scene`](tickreel_scene::Scene)
//! at wall-clock time scaled by a speed factor, with pause, single-step,
//! seek, and reset. At every reached step the scene holds exactly the
//! cumulative effect of every event up to that step.
//!
//! # Modules
//!
//! - [`config`] -- YAML player configuration.
//! - [`data`] -- Simulation document loading.
//! - [`listeners`] -- Position-changed observers.
//! - [`log`] -- The timestamp-grouped event log.
//! - [`spooler`] -- The playback engine.

pub mod config;
pub mod data;
pub mod listeners;
pub mod log;
pub mod spooler;

pub use config::{ConfigError, LoggingConfig, PlaybackConfig, PlayerConfig, SpeedScale};
pub use data::{DataError, SimulationData};
pub use listeners::{BroadcastListener, ListenerId, StepListener};
pub use log::{LogError, SimulationLog};
pub use spooler::{RunCompletion, RunState, Spooler, SpoolerError, SpoolerStatus};
