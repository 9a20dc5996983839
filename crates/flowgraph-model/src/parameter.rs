//! The typed parameter model: declared types, wire values, and engine values.
//!
//! Wire values are the form that travels between nodes and into persisted
//! records; binary payloads are references into the object store. Engine
//! values are the form handed to a node's `execute`; binary payloads are
//! materialized bytes. Converting between the two is the Parameter System's
//! job (see `flowgraph_engine::parameters`), not this crate's.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// The closed set of parameter types a node input/output may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterType {
    String,
    Number,
    Boolean,
    Json,
    Image,
    Document,
    Audio,
    Geojson,
    Binary,
    Any,
}

impl ParameterType {
    /// Binary subtypes carry a dual engine/wire representation.
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            ParameterType::Image | ParameterType::Document | ParameterType::Audio | ParameterType::Binary
        )
    }

    /// Whether a value declared as `source` may flow into an input declared
    /// as `self` (the target type). See spec §4.4 check 3.
    pub fn accepts(self, source: ParameterType) -> bool {
        if self == source {
            return true;
        }
        if self == ParameterType::Any {
            // `any` target accepts any other declared type.
            return true;
        }
        if source == ParameterType::Any {
            // Forbid an `any`-typed output feeding a typed binary input
            // (open question, resolved in SPEC_FULL.md §9).
            return !self.is_binary();
        }
        if self == ParameterType::Json {
            return !source.is_binary();
        }
        false
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParameterType::String => "string",
            ParameterType::Number => "number",
            ParameterType::Boolean => "boolean",
            ParameterType::Json => "json",
            ParameterType::Image => "image",
            ParameterType::Document => "document",
            ParameterType::Audio => "audio",
            ParameterType::Geojson => "geojson",
            ParameterType::Binary => "binary",
            ParameterType::Any => "any",
        }
    }
}

impl FromStr for ParameterType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ParameterType::String),
            "number" => Ok(ParameterType::Number),
            "boolean" => Ok(ParameterType::Boolean),
            "json" => Ok(ParameterType::Json),
            "image" => Ok(ParameterType::Image),
            "document" => Ok(ParameterType::Document),
            "audio" => Ok(ParameterType::Audio),
            "geojson" => Ok(ParameterType::Geojson),
            "binary" => Ok(ParameterType::Binary),
            "any" => Ok(ParameterType::Any),
            other => Err(ModelError::UnknownParameterType(other.to_string())),
        }
    }
}

/// A reference to a blob held by the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    pub id: String,
    pub mime_type: String,
}

/// A value as it travels between nodes, or as persisted in an execution
/// record. Binary payloads are always object references here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Binary(ObjectReference),
    Json(serde_json::Value),
}

impl WireValue {
    pub fn null() -> Self {
        WireValue::Json(serde_json::Value::Null)
    }

    pub fn string(s: impl Into<String>) -> Self {
        WireValue::Json(serde_json::Value::String(s.into()))
    }

    pub fn number(n: f64) -> Self {
        WireValue::Json(serde_json::json!(n))
    }

    pub fn boolean(b: bool) -> Self {
        WireValue::Json(serde_json::Value::Bool(b))
    }

    pub fn as_object_reference(&self) -> Option<&ObjectReference> {
        match self {
            WireValue::Binary(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            WireValue::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_json().and_then(|v| v.as_f64())
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_json().and_then(|v| v.as_bool())
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(|v| v.as_str())
    }
}

/// Materialized binary payload, the engine-side counterpart of a binary
/// `ObjectReference`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryData {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// A value as handed to a node's `execute`. Binary payloads are
/// materialized bytes rather than references.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineValue {
    Json(serde_json::Value),
    Binary(BinaryData),
}

impl EngineValue {
    pub fn null() -> Self {
        EngineValue::Json(serde_json::Value::Null)
    }

    pub fn string(s: impl Into<String>) -> Self {
        EngineValue::Json(serde_json::Value::String(s.into()))
    }

    pub fn number(n: f64) -> Self {
        EngineValue::Json(serde_json::json!(n))
    }

    pub fn boolean(b: bool) -> Self {
        EngineValue::Json(serde_json::Value::Bool(b))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            EngineValue::Json(v) => v.as_f64(),
            EngineValue::Binary(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            EngineValue::Json(v) => v.as_bool(),
            EngineValue::Binary(_) => None,
        }
    }

    pub fn as_binary(&self) -> Option<&BinaryData> {
        match self {
            EngineValue::Binary(b) => Some(b),
            EngineValue::Json(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, EngineValue::Json(serde_json::Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflexive_compatibility() {
        assert!(ParameterType::Number.accepts(ParameterType::Number));
        assert!(!ParameterType::Number.accepts(ParameterType::String));
    }

    #[test]
    fn any_target_accepts_everything() {
        assert!(ParameterType::Any.accepts(ParameterType::Image));
        assert!(ParameterType::Any.accepts(ParameterType::Json));
    }

    #[test]
    fn any_source_forbidden_into_binary_target() {
        assert!(!ParameterType::Image.accepts(ParameterType::Any));
        assert!(ParameterType::Json.accepts(ParameterType::Any));
    }

    #[test]
    fn json_target_rejects_binary_source() {
        assert!(!ParameterType::Json.accepts(ParameterType::Image));
        assert!(ParameterType::Json.accepts(ParameterType::String));
    }

    #[test]
    fn binary_subtypes_mutually_incompatible() {
        assert!(!ParameterType::Image.accepts(ParameterType::Document));
        assert!(!ParameterType::Audio.accepts(ParameterType::Binary));
    }

    #[test]
    fn wire_value_untagged_roundtrip() {
        let v = WireValue::Binary(ObjectReference {
            id: "abc".into(),
            mime_type: "image/png".into(),
        });
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["id"], "abc");
        let back: WireValue = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }
}
