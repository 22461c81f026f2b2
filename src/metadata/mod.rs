//! Metadata document
//!
//! `metadata.json` at the namespace root carries identity and ordering for every
//! folder and leaf path, plus the monotonic `pushCount` used for stale detection.

pub mod codec;

pub use codec::{build_metadata, canonical_string, normalize};

use crate::error::SyncError;
use crate::types::Millis;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const METADATA_VERSION: u32 = 1;

/// Prefix marking leaf entries that are not backed by a file.
pub const VIRTUAL_LEAF_PREFIX: &str = "__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteMeta {
    pub id: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafMeta {
    pub id: String,
    #[serde(default)]
    pub updated_at: Millis,
    #[serde(default)]
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub push_count: u64,
    #[serde(default)]
    pub notes: BTreeMap<String, NoteMeta>,
    #[serde(default)]
    pub leaves: BTreeMap<String, LeafMeta>,
}

fn default_version() -> u32 {
    METADATA_VERSION
}

impl Default for MetadataDocument {
    fn default() -> Self {
        Self {
            version: METADATA_VERSION,
            push_count: 0,
            notes: BTreeMap::new(),
            leaves: BTreeMap::new(),
        }
    }
}

impl MetadataDocument {
    /// Decode a remote document; absent fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, SyncError> {
        // The derived visitor also accepts the sequence form; only objects are documents.
        let value: serde_json::Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(SyncError::Network(
                "metadata document is not a JSON object".to_string(),
            ));
        }
        let mut doc: MetadataDocument = serde_json::from_value(value)?;
        if doc.version == 0 {
            doc.version = METADATA_VERSION;
        }
        Ok(doc)
    }

    /// Pretty JSON as written to the repository.
    pub fn to_pretty_json(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn virtual_leaves(&self) -> impl Iterator<Item = (&String, &LeafMeta)> {
        self.leaves
            .iter()
            .filter(|(key, _)| key.starts_with(VIRTUAL_LEAF_PREFIX))
    }
}
