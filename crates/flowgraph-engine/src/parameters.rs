//! Parameter System (C2): bidirectional conversion between engine values
//! (materialized bytes) and wire values (object references), per §4.2.

use flowgraph_model::{BinaryData, EngineValue, ObjectReference, ParameterType, WireValue};
use thiserror::Error;

use crate::error::StorageError;
use crate::object_store::ObjectStore;

/// Conversion failures. A `TypeMismatch` on an *output* conversion (`toWire`)
/// is a node error, per §4.2 ("malformed binary output ... is a node error,
/// not an engine error") — callers in the scheduler turn it into the node's
/// `NodeExecution.error` rather than aborting the run.
#[derive(Error, Debug, Clone)]
pub enum ParameterError {
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn looks_like_object_reference(value: &serde_json::Value) -> Option<ObjectReference> {
    let obj = value.as_object()?;
    let id = obj.get("id")?.as_str()?;
    let mime_type = obj.get("mimeType")?.as_str()?;
    Some(ObjectReference {
        id: id.to_string(),
        mime_type: mime_type.to_string(),
    })
}

/// Convert an engine value into its wire form, writing binary payloads
/// through the object store.
pub async fn to_wire(
    param_type: ParameterType,
    value: &EngineValue,
    store: &ObjectStore,
    organization_id: &str,
    execution_id: Option<&str>,
) -> Result<WireValue, ParameterError> {
    if param_type.is_binary() {
        match value {
            EngineValue::Binary(data) => {
                let reference = store
                    .write_object(data.data.clone(), data.mime_type.clone(), organization_id, execution_id)
                    .await?;
                Ok(WireValue::Binary(reference))
            }
            // Already a reference passed through unchanged: write through
            // without duplicating the blob.
            EngineValue::Json(v) => looks_like_object_reference(v)
                .map(WireValue::Binary)
                .ok_or_else(|| {
                    ParameterError::TypeMismatch(format!(
                        "expected binary data or an object reference for {} output",
                        param_type.as_str()
                    ))
                }),
        }
    } else {
        match value {
            EngineValue::Json(v) => Ok(WireValue::Json(v.clone())),
            EngineValue::Binary(_) => Err(ParameterError::TypeMismatch(format!(
                "unexpected binary value for {} output",
                param_type.as_str()
            ))),
        }
    }
}

/// Convert a wire value into its engine form, reading binary payloads from
/// the object store. Returns `Ok(None)` if the wire value does not
/// type-check against `param_type` (§4.2: "returns undefined").
pub async fn from_wire(
    param_type: ParameterType,
    value: &WireValue,
    store: &ObjectStore,
) -> Result<Option<EngineValue>, ParameterError> {
    if param_type.is_binary() {
        match value {
            WireValue::Binary(reference) => {
                let record = store.read_object(reference).await?;
                Ok(Some(EngineValue::Binary(BinaryData {
                    data: record.data,
                    mime_type: reference.mime_type.clone(),
                })))
            }
            WireValue::Json(_) => Ok(None),
        }
    } else {
        match value {
            WireValue::Json(v) => Ok(Some(EngineValue::Json(v.clone()))),
            WireValue::Binary(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binary_roundtrip_is_byte_exact() {
        let store = ObjectStore::in_memory();
        let original = EngineValue::Binary(BinaryData {
            data: vec![0xFFu8; 100],
            mime_type: "image/png".to_string(),
        });

        let wire = to_wire(ParameterType::Image, &original, &store, "org-1", Some("exec-1"))
            .await
            .unwrap();
        let reference = wire.as_object_reference().cloned().unwrap();
        assert_eq!(reference.mime_type, "image/png");

        let back = from_wire(ParameterType::Image, &wire, &store).await.unwrap().unwrap();
        assert_eq!(back, original);
    }

    #[tokio::test]
    async fn scalar_conversion_is_identity() {
        let store = ObjectStore::in_memory();
        let value = EngineValue::number(42.0);
        let wire = to_wire(ParameterType::Number, &value, &store, "org-1", None)
            .await
            .unwrap();
        assert_eq!(wire.as_f64(), Some(42.0));
        let back = from_wire(ParameterType::Number, &wire, &store).await.unwrap().unwrap();
        assert_eq!(back, value);
    }

    #[tokio::test]
    async fn malformed_binary_output_is_type_mismatch_not_storage_error() {
        let store = ObjectStore::in_memory();
        let value = EngineValue::string("not binary");
        let err = to_wire(ParameterType::Image, &value, &store, "org-1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ParameterError::TypeMismatch(_)));
    }
}
