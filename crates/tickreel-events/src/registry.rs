//! Decoding serialized records into typed [`Event`]s.
//!
//! The [`EventRegistry`] is a lookup table from wire tag to the kind's
//! argument schema and constructor. It is the only way records become
//! events, so every event in a log has passed validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::command::{Command, Event};
use crate::error::DecodeError;
use crate::kind::EventKind;
use crate::schema;

/// One serialized event as found in a simulation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Identifier of the affected entity.
    #[serde(alias = "forId")]
    pub target_id: String,
    /// Logical step at which the event takes effect.
    pub timestamp: u64,
    /// Wire tag of the event kind.
    #[serde(alias = "action")]
    pub kind: String,
    /// Kind-specific arguments.
    #[serde(default)]
    pub args: Value,
}

impl EventRecord {
    /// Build a record from its parts.
    pub fn new(
        target_id: impl Into<String>,
        timestamp: u64,
        kind: impl Into<String>,
        args: Value,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            timestamp,
            kind: kind.into(),
            args,
        }
    }
}

type Constructor = fn(Map<String, Value>) -> Result<Command, serde_json::Error>;

#[derive(Clone, Copy)]
struct Registration {
    kind: EventKind,
    construct: Constructor,
}

/// Lookup table from wire tag to `(schema, constructor)`.
#[derive(Clone)]
pub struct EventRegistry {
    entries: BTreeMap<&'static str, Registration>,
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("kinds", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl EventRegistry {
    /// The registry of every built-in event kind.
    pub fn standard() -> Self {
        let mut registry = Self {
            entries: BTreeMap::new(),
        };
        registry.register(EventKind::SetVisible, |args| {
            from_map(args).map(Command::SetVisible)
        });
        registry.register(EventKind::SetPosition, |args| {
            from_map(args).map(Command::SetPosition)
        });
        registry.register(EventKind::SetDecoratingText, |args| {
            from_map(args).map(Command::SetDecoratingText)
        });
        registry.register(EventKind::SetInteracting, |args| {
            from_map(args).map(Command::SetInteracting)
        });
        registry.register(EventKind::SetNotInteracting, |args| {
            from_map(args).map(Command::SetNotInteracting)
        });
        registry.register(EventKind::MoveNear, |args| {
            from_map(args).map(Command::MoveNear)
        });
        registry.register(EventKind::MoveNearCell, |args| {
            from_map(args).map(Command::MoveNearCell)
        });
        registry.register(EventKind::SetTintColor, |args| {
            from_map(args).map(Command::SetTintColor)
        });
        registry.register(EventKind::SetSpriteFrame, |args| {
            from_map(args).map(Command::SetSpriteFrame)
        });
        registry.register(EventKind::ResourceSetCapacity, |args| {
            from_map(args).map(Command::ResourceSetCapacity)
        });
        registry.register(EventKind::ResourceSetUtilization, |args| {
            from_map(args).map(Command::ResourceSetUtilization)
        });
        registry.register(EventKind::ContainerSetLevel, |args| {
            from_map(args).map(Command::ContainerSetLevel)
        });
        registry.register(EventKind::ContainerSetCapacity, |args| {
            from_map(args).map(Command::ContainerSetCapacity)
        });
        registry.register(EventKind::StoreSetCapacity, |args| {
            from_map(args).map(Command::StoreSetCapacity)
        });
        registry.register(EventKind::StoreSetContent, |args| {
            from_map(args).map(Command::StoreSetContent)
        });
        registry
    }

    fn register(&mut self, kind: EventKind, construct: Constructor) {
        self.entries
            .insert(kind.tag(), Registration { kind, construct });
    }

    /// Kinds this registry can decode.
    pub fn kinds(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.entries.values().map(|registration| registration.kind)
    }

    /// Look up a kind by its wire tag.
    pub fn lookup(&self, tag: &str) -> Option<EventKind> {
        self.entries.get(tag).map(|registration| registration.kind)
    }

    /// Decode a record into a typed event.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownKind`] for an unregistered tag and
    /// [`DecodeError::InvalidArgs`] if the arguments are missing, `null`,
    /// or of the wrong type.
    pub fn decode(&self, record: EventRecord) -> Result<Event, DecodeError> {
        let registration =
            self.entries
                .get(record.kind.as_str())
                .ok_or_else(|| DecodeError::UnknownKind {
                    kind: record.kind.clone(),
                })?;
        let kind = registration.kind;
        let args = schema::validate(kind, record.args)?;
        let command = (registration.construct)(args).map_err(|err| DecodeError::InvalidArgs {
            kind,
            reason: err.to_string(),
        })?;
        Ok(Event::new(record.target_id, record.timestamp, command))
    }

    /// Decode an untyped JSON value into a typed event.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MalformedRecord`] if `value` is not a record
    /// object with a string target, a non-negative integer timestamp, and a
    /// string kind; otherwise as [`decode`](Self::decode).
    pub fn decode_value(&self, value: Value) -> Result<Event, DecodeError> {
        let record: EventRecord =
            serde_json::from_value(value).map_err(|err| DecodeError::MalformedRecord {
                reason: err.to_string(),
            })?;
        self.decode(record)
    }
}

fn from_map<T: serde::de::DeserializeOwned>(args: Map<String, Value>) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(args))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::command::{CellArgs, PeerArgs, VisibleArgs};

    fn sample_args(kind: EventKind) -> Value {
        match kind {
            EventKind::SetVisible => json!({ "visible": true }),
            EventKind::SetPosition | EventKind::MoveNearCell => json!({ "x": 0, "y": 0 }),
            EventKind::SetDecoratingText => json!({ "text": "baz" }),
            EventKind::SetInteracting | EventKind::SetNotInteracting => json!({ "withId": "foo" }),
            EventKind::MoveNear => json!({ "target": "bar" }),
            EventKind::SetTintColor => json!({ "color": 0x123456 }),
            EventKind::SetSpriteFrame => json!({ "frame": 9 }),
            EventKind::ResourceSetCapacity
            | EventKind::ContainerSetCapacity
            | EventKind::StoreSetCapacity => json!({ "capacity": 5 }),
            EventKind::ResourceSetUtilization => json!({ "utilization": 3 }),
            EventKind::ContainerSetLevel => json!({ "level": 2.5 }),
            EventKind::StoreSetContent => json!({ "content": [{ "resourceId": 98, "amount": 76 }] }),
        }
    }

    #[test]
    fn standard_registry_covers_every_kind() {
        let registry = EventRegistry::standard();
        assert_eq!(registry.kinds().count(), EventKind::ALL.len());
        for kind in EventKind::ALL {
            assert_eq!(registry.lookup(kind.tag()), Some(kind));
        }
    }

    #[test]
    fn decodes_every_kind() {
        let registry = EventRegistry::standard();
        for kind in EventKind::ALL {
            let record = EventRecord::new("leet", 1337, kind.tag(), sample_args(kind));
            let event = registry.decode(record).unwrap();
            assert_eq!(event.kind(), kind);
            assert_eq!(event.target_id(), "leet");
            assert_eq!(event.timestamp(), 1337);
        }
    }

    #[test]
    fn decodes_typed_payloads() {
        let registry = EventRegistry::standard();
        let event = registry
            .decode(EventRecord::new("a", 0, "SET_POSITION", json!({ "x": 3, "y": -2 })))
            .unwrap();
        assert_eq!(event.command(), &Command::SetPosition(CellArgs { x: 3, y: -2 }));
    }

    #[test]
    fn unknown_kind_fails() {
        let registry = EventRegistry::standard();
        let err = registry
            .decode(EventRecord::new("a", 0, "EXPLODE", json!({})))
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownKind {
                kind: String::from("EXPLODE")
            }
        );
    }

    #[test]
    fn missing_args_fail_for_every_kind() {
        let registry = EventRegistry::standard();
        for kind in EventKind::ALL {
            let err = registry
                .decode(EventRecord::new("a", 0, kind.tag(), json!({ "some": "thing" })))
                .unwrap_err();
            assert!(
                matches!(err, DecodeError::InvalidArgs { kind: k, .. } if k == kind),
                "{kind}: {err}"
            );
        }
    }

    #[test]
    fn mistyped_args_fail() {
        let registry = EventRegistry::standard();
        let err = registry
            .decode(EventRecord::new("a", 0, "SET_VISIBLE", json!({ "visible": "yes" })))
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidArgs {
                kind: EventKind::SetVisible,
                ..
            }
        ));
    }

    #[test]
    fn wire_aliases_are_accepted() {
        let registry = EventRegistry::standard();
        let event = registry
            .decode_value(json!({
                "action": "SET_INTERACTING",
                "forId": "alice",
                "timestamp": 4,
                "args": { "with_id": "bob" }
            }))
            .unwrap();
        assert_eq!(event.target_id(), "alice");
        assert_eq!(
            event.command(),
            &Command::SetInteracting(PeerArgs {
                with_id: String::from("bob")
            })
        );
    }

    #[test]
    fn canonical_wire_names_are_accepted() {
        let registry = EventRegistry::standard();
        let event = registry
            .decode_value(json!({
                "kind": "SET_VISIBLE",
                "targetId": "alice",
                "timestamp": 0,
                "args": { "visible": false }
            }))
            .unwrap();
        assert_eq!(
            event.command(),
            &Command::SetVisible(VisibleArgs { visible: false })
        );
    }

    #[test]
    fn negative_timestamp_is_malformed() {
        let registry = EventRegistry::standard();
        let err = registry
            .decode_value(json!({
                "kind": "SET_VISIBLE",
                "targetId": "alice",
                "timestamp": -1,
                "args": { "visible": true }
            }))
            .unwrap_err();
        assert!(matches!(err, DecodeError::MalformedRecord { .. }));
    }

    #[test]
    fn non_object_record_is_malformed() {
        let registry = EventRegistry::standard();
        let err = registry.decode_value(json!("SET_VISIBLE")).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedRecord { .. }));
    }

    #[test]
    fn absent_args_fail_with_invalid_args() {
        let registry = EventRegistry::standard();
        let err = registry
            .decode_value(json!({ "kind": "SET_TINT_COLOR", "targetId": "a", "timestamp": 1 }))
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidArgs { .. }));
    }
}
