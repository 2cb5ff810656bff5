//! Per-kind argument schemas.
//!
//! A schema lists the fields a kind requires. Validation normalizes
//! accepted aliases onto the canonical field name and rejects any
//! required field that is absent or `null`. Type checking happens when
//! the validated map is deserialized into the kind's argument struct.

use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::kind::EventKind;

/// One required argument field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Canonical field name.
    pub name: &'static str,
    /// Alternative spellings accepted on the wire.
    pub aliases: &'static [&'static str],
}

impl FieldSpec {
    const fn plain(name: &'static str) -> Self {
        Self { name, aliases: &[] }
    }

    const fn aliased(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { name, aliases }
    }
}

const VISIBLE: &[FieldSpec] = &[FieldSpec::plain("visible")];
const CELL: &[FieldSpec] = &[FieldSpec::plain("x"), FieldSpec::plain("y")];
const TEXT: &[FieldSpec] = &[FieldSpec::plain("text")];
const PEER: &[FieldSpec] = &[FieldSpec::aliased("withId", &["with_id"])];
const TARGET: &[FieldSpec] = &[FieldSpec::aliased("target", &["target_id", "targetId"])];
const COLOR: &[FieldSpec] = &[FieldSpec::plain("color")];
const FRAME: &[FieldSpec] = &[FieldSpec::plain("frame")];
const CAPACITY: &[FieldSpec] = &[FieldSpec::plain("capacity")];
const UTILIZATION: &[FieldSpec] = &[FieldSpec::plain("utilization")];
const LEVEL: &[FieldSpec] = &[FieldSpec::plain("level")];
const CONTENT: &[FieldSpec] = &[FieldSpec::plain("content")];

/// The fields a kind requires.
pub const fn required_fields(kind: EventKind) -> &'static [FieldSpec] {
    match kind {
        EventKind::SetVisible => VISIBLE,
        EventKind::SetPosition | EventKind::MoveNearCell => CELL,
        EventKind::SetDecoratingText => TEXT,
        EventKind::SetInteracting | EventKind::SetNotInteracting => PEER,
        EventKind::MoveNear => TARGET,
        EventKind::SetTintColor => COLOR,
        EventKind::SetSpriteFrame => FRAME,
        EventKind::ResourceSetCapacity
        | EventKind::ContainerSetCapacity
        | EventKind::StoreSetCapacity => CAPACITY,
        EventKind::ResourceSetUtilization => UTILIZATION,
        EventKind::ContainerSetLevel => LEVEL,
        EventKind::StoreSetContent => CONTENT,
    }
}

/// Check `args` against the kind's schema and return the normalized map.
///
/// `args` may be `null` (treated as an empty object) or an object.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidArgs`] if `args` is not an object or a
/// required field is missing or `null`.
pub fn validate(kind: EventKind, args: Value) -> Result<Map<String, Value>, DecodeError> {
    let mut map = match args {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(DecodeError::InvalidArgs {
                kind,
                reason: format!("args must be an object, got {}", json_type(&other)),
            });
        }
    };

    for field in required_fields(kind) {
        if is_missing(map.get(field.name)) {
            let alias_value = field
                .aliases
                .iter()
                .find_map(|alias| map.remove(*alias).filter(|value| !value.is_null()));
            if let Some(value) = alias_value {
                map.insert(field.name.to_owned(), value);
            }
        }
        if is_missing(map.get(field.name)) {
            return Err(DecodeError::InvalidArgs {
                kind,
                reason: format!("missing required field `{}`", field.name),
            });
        }
    }

    Ok(map)
}

fn is_missing(value: Option<&Value>) -> bool {
    value.is_none_or(Value::is_null)
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
