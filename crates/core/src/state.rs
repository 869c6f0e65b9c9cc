//! Versioned JSON save states for chip cores.
//!
//! Save states are plain serde_json values wrapped in an envelope that
//! records the chip name and a format version, so a mismatched or stale
//! snapshot is rejected instead of silently loading garbage.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("save state is for chip {found:?}, expected {expected:?}")]
    ChipMismatch { expected: String, found: String },
    #[error("save state version {found} is not supported (expected {expected})")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("malformed save state: {0}")]
    Malformed(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Wrap serialized chip state in a `{chip, version, state}` envelope.
pub fn save<T: Serialize>(chip: &str, version: u32, state: &T) -> Result<Value, StateError> {
    Ok(serde_json::json!({
        "chip": chip,
        "version": version,
        "state": serde_json::to_value(state)?,
    }))
}

/// Unwrap and validate an envelope produced by [`save`].
pub fn load<T: DeserializeOwned>(chip: &str, version: u32, value: &Value) -> Result<T, StateError> {
    let found_chip = value
        .get("chip")
        .and_then(Value::as_str)
        .ok_or_else(|| StateError::Malformed("missing chip field".into()))?;
    if found_chip != chip {
        return Err(StateError::ChipMismatch {
            expected: chip.to_string(),
            found: found_chip.to_string(),
        });
    }

    let found_version = value
        .get("version")
        .and_then(Value::as_u64)
        .ok_or_else(|| StateError::Malformed("missing version field".into()))?
        as u32;
    if found_version != version {
        return Err(StateError::VersionMismatch {
            expected: version,
            found: found_version,
        });
    }

    let state = value
        .get("state")
        .ok_or_else(|| StateError::Malformed("missing state field".into()))?;
    Ok(serde_json::from_value(state.clone())?)
}
