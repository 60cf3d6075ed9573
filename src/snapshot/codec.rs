//! Snapshot Codec
//!
//! Decodes the two historical envelope shapes into one canonical snapshot and
//! encodes only the canonical shape. Pure transforms, no I/O.
//!
//! Recognized shapes:
//! - canonical: `{"components": [...], "prompts": [...], "lastUpdated": ...}`
//!   (`exportedAt` is accepted in place of `lastUpdated`; either `components`
//!   or `prompts` may be absent, but not both)
//! - legacy envelope: `{"tree": [...]}`
//! - legacy bare tree: `[...]`

use super::{Prompt, Snapshot};
use crate::error::SyncError;
use crate::tree::Tree;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Envelope shape a payload was recognized as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotShape {
    Canonical,
    LegacyEnvelope,
    LegacyBare,
}

impl fmt::Display for SnapshotShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SnapshotShape::Canonical => "canonical",
            SnapshotShape::LegacyEnvelope => "legacy envelope",
            SnapshotShape::LegacyBare => "legacy bare tree",
        };
        f.write_str(label)
    }
}

/// A decoded payload plus what the payload itself carried
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub snapshot: Snapshot,
    pub shape: SnapshotShape,
    /// False when the payload had no prompt list (legacy shapes, or a
    /// canonical payload without `prompts`); `snapshot.prompts` is then empty
    /// and must not replace a caller's prompts.
    pub carries_prompts: bool,
}

impl Decoded {
    /// The payload's prompts, or `None` when it carried none.
    pub fn prompts(&self) -> Option<&[Prompt]> {
        self.carries_prompts.then_some(self.snapshot.prompts.as_slice())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalEnvelope {
    #[serde(default)]
    components: Tree,
    #[serde(default)]
    prompts: Option<Vec<Prompt>>,
    #[serde(default, alias = "exportedAt")]
    last_updated: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct LegacyEnvelope {
    tree: Tree,
}

/// Classify a parsed payload into one of the recognized shapes.
pub fn classify(value: &Value) -> Option<SnapshotShape> {
    match value {
        Value::Array(_) => Some(SnapshotShape::LegacyBare),
        Value::Object(map) if map.contains_key("components") || map.contains_key("prompts") => {
            Some(SnapshotShape::Canonical)
        }
        Value::Object(map) if map.contains_key("tree") => Some(SnapshotShape::LegacyEnvelope),
        _ => None,
    }
}

/// Decode raw bytes into a canonical snapshot.
pub fn decode(raw: &[u8]) -> Result<Snapshot, SyncError> {
    decode_with_shape(raw).map(|(snapshot, _)| snapshot)
}

/// Decode raw bytes, also reporting which envelope shape was found.
pub fn decode_with_shape(raw: &[u8]) -> Result<(Snapshot, SnapshotShape), SyncError> {
    decode_payload(raw).map(|decoded| (decoded.snapshot, decoded.shape))
}

/// Decode raw bytes, keeping track of whether the payload carried prompts.
pub fn decode_payload(raw: &[u8]) -> Result<Decoded, SyncError> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| SyncError::MalformedSnapshot(format!("Payload is not valid JSON: {}", e)))?;

    let shape = classify(&value).ok_or_else(|| {
        SyncError::MalformedSnapshot(
            "Payload matches neither the canonical nor the legacy snapshot shape".to_string(),
        )
    })?;

    let (snapshot, carries_prompts) = match shape {
        SnapshotShape::Canonical => {
            let envelope: CanonicalEnvelope = from_value(value, shape)?;
            let carries_prompts = envelope.prompts.is_some();
            let snapshot = Snapshot {
                components: envelope.components,
                prompts: envelope.prompts.unwrap_or_default(),
                last_updated: envelope.last_updated,
            };
            (snapshot, carries_prompts)
        }
        SnapshotShape::LegacyEnvelope => {
            let envelope: LegacyEnvelope = from_value(value, shape)?;
            (Snapshot::new(envelope.tree, Vec::new()), false)
        }
        SnapshotShape::LegacyBare => (Snapshot::new(from_value(value, shape)?, Vec::new()), false),
    };

    snapshot
        .components
        .validate_ids()
        .map_err(|e| SyncError::MalformedSnapshot(format!("Invalid {} snapshot: {}", shape, e)))?;

    Ok(Decoded {
        snapshot,
        shape,
        carries_prompts,
    })
}

fn from_value<T: for<'de> Deserialize<'de>>(value: Value, shape: SnapshotShape) -> Result<T, SyncError> {
    serde_json::from_value(value)
        .map_err(|e| SyncError::MalformedSnapshot(format!("Invalid {} snapshot: {}", shape, e)))
}

/// Encode a snapshot in the canonical shape.
///
/// Output is pretty-printed JSON with a fixed field order, so equal snapshots
/// always encode to identical bytes.
pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, SyncError> {
    serde_json::to_vec_pretty(snapshot)
        .map_err(|e| SyncError::MalformedSnapshot(format!("Failed to encode snapshot: {}", e)))
}
