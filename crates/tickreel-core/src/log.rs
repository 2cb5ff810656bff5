//! The immutable, timestamp-grouped event log.
//!
//! A [`SimulationLog`] is built once from decoded events and never changes.
//! Events sharing a timestamp keep the order they had in the source. The
//! step index is computed up front so [`SimulationLog::events_at`] is a
//! single map lookup per playback step.

use std::collections::BTreeMap;

use serde_json::Value;
use tickreel_events::{DecodeError, Event, EventRegistry};
use tracing::{debug, warn};

/// Errors that can occur while building a [`SimulationLog`].
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// A record in the source could not be decoded.
    #[error("event record {index}: {source}")]
    Decode {
        /// Position of the offending record in the source.
        index: usize,
        /// The underlying decode error.
        source: DecodeError,
    },

    /// The source is not a JSON array of records.
    #[error("failed to parse event log JSON: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

/// An ordered sequence of validated events.
#[derive(Debug, Clone, Default)]
pub struct SimulationLog {
    events: Vec<Event>,
    by_step: BTreeMap<u64, Vec<usize>>,
    total_steps: u64,
}

impl SimulationLog {
    /// Build a log from already-decoded events, keeping their order.
    ///
    /// Source data is expected to be sorted by timestamp. An unsorted
    /// source is accepted as-is with a warning; events are still grouped
    /// by their exact timestamp.
    pub fn new(events: Vec<Event>) -> Self {
        let unsorted = events
            .windows(2)
            .any(|pair| matches!(pair, [a, b] if b.timestamp() < a.timestamp()));
        if unsorted {
            warn!(
                events = events.len(),
                "Event log is not sorted by timestamp; keeping stored order"
            );
        }

        let mut by_step: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
        for (index, event) in events.iter().enumerate() {
            by_step.entry(event.timestamp()).or_default().push(index);
        }
        let total_steps = by_step.keys().next_back().copied().unwrap_or(0);

        debug!(
            events = events.len(),
            distinct_steps = by_step.len(),
            total_steps,
            "Simulation log built"
        );

        Self {
            events,
            by_step,
            total_steps,
        }
    }

    /// Decode serialized records through `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Decode`] for the first record that fails to
    /// decode. Nothing is skipped.
    pub fn from_records(
        registry: &EventRegistry,
        records: Vec<Value>,
    ) -> Result<Self, LogError> {
        let events = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                registry
                    .decode_value(record)
                    .map_err(|source| LogError::Decode { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(events))
    }

    /// Parse a bare JSON array of records.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Json`] if `json` is not an array, or
    /// [`LogError::Decode`] if a record fails to decode.
    pub fn from_json(registry: &EventRegistry, json: &str) -> Result<Self, LogError> {
        let records: Vec<Value> = serde_json::from_str(json)?;
        Self::from_records(registry, records)
    }

    /// All events in stored order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events whose timestamp equals `step`, in stored order.
    pub fn events_at(&self, step: u64) -> impl Iterator<Item = &Event> + '_ {
        self.by_step
            .get(&step)
            .into_iter()
            .flatten()
            .filter_map(|index| self.events.get(*index))
    }

    /// The largest timestamp in the log, or 0 if the log is empty.
    pub const fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
