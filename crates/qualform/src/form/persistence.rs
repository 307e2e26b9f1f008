use serde_json::Value;

use super::domain::{FormState, QualificationRecord};

/// Fixed identifier the serialized form state is stored under.
pub const STORAGE_KEY: &str = "qualifications_form_v1";

/// Storage failures surfaced by blob store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("state store unavailable: {0}")]
    Unavailable(String),
    #[error("state blob could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Opaque key-value blob store boundary. Implementations live with the
/// binary so the core can be exercised against an in-memory store.
pub trait BlobStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError>;
}

/// Serialize the form state for storage.
pub fn encode_state(state: &FormState) -> Result<String, StorageError> {
    Ok(serde_json::to_string(state)?)
}

fn field_records(object: &serde_json::Map<String, Value>, key: &str) -> Vec<QualificationRecord> {
    object
        .get(key)
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default()
}

/// Decode a stored blob, recovering field by field.
///
/// Unparseable or non-object blobs yield the default state. Each of the four
/// fields is defaulted independently when absent or of the wrong shape, so a
/// corrupt tier list never discards the note or the other tiers.
pub fn decode_state(blob: &str) -> FormState {
    let value: Value = match serde_json::from_str(blob) {
        Ok(value) => value,
        Err(_) => return FormState::default(),
    };
    let Value::Object(object) = value else {
        return FormState::default();
    };

    FormState {
        gcse: field_records(&object, "gcse"),
        l3: field_records(&object, "l3"),
        higher: field_records(&object, "higher"),
        extenuating: object
            .get("extenuating")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}
