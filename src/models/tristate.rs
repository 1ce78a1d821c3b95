//! Three-valued progress marker used by references, materials and checklist items.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Progress of a single tracked item.
///
/// Exported files written by older versions of the tracker encode this as a
/// mix of booleans, numbers and strings. Those encodings are only accepted
/// here; everything past deserialization sees the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriState {
    #[default]
    Incomplete,
    Complete,
    Optional,
}

impl TriState {
    pub fn is_complete(self) -> bool {
        self == TriState::Complete
    }

    /// Advance to the next state, wrapping after `Optional`.
    pub fn cycle(self) -> Self {
        match self {
            TriState::Incomplete => TriState::Complete,
            TriState::Complete => TriState::Optional,
            TriState::Optional => TriState::Incomplete,
        }
    }

    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(TriState::Incomplete),
            1 => Some(TriState::Complete),
            2 => Some(TriState::Optional),
            _ => None,
        }
    }
}

impl Serialize for TriState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TriState::Incomplete => serializer.serialize_bool(false),
            TriState::Complete => serializer.serialize_bool(true),
            TriState::Optional => serializer.serialize_str("optional"),
        }
    }
}

struct TriStateVisitor;

impl<'de> Visitor<'de> for TriStateVisitor {
    type Value = TriState;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("false, true, 0, 1, 2 or \"optional\"")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<TriState, E> {
        Ok(if v {
            TriState::Complete
        } else {
            TriState::Incomplete
        })
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<TriState, E> {
        TriState::from_code(v).ok_or_else(|| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<TriState, E> {
        i64::try_from(v)
            .ok()
            .and_then(TriState::from_code)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<TriState, E> {
        if v.fract() == 0.0 {
            if let Some(state) = TriState::from_code(v as i64) {
                return Ok(state);
            }
        }
        Err(E::invalid_value(de::Unexpected::Float(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<TriState, E> {
        match v {
            "optional" => Ok(TriState::Optional),
            _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
        }
    }

    fn visit_unit<E: de::Error>(self) -> Result<TriState, E> {
        Ok(TriState::Incomplete)
    }

    fn visit_none<E: de::Error>(self) -> Result<TriState, E> {
        Ok(TriState::Incomplete)
    }
}

impl<'de> Deserialize<'de> for TriState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TriStateVisitor)
    }
}
