//! Core types for the note/leaf model exchanged with the UI layer.

use crate::metadata::LeafMeta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable identifier of a note or leaf.
pub type EntityId = String;

/// Epoch milliseconds.
pub type Millis = i64;

/// Folder-like grouping of leaves; at most one level of sub-notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<EntityId>,
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_color: Option<String>,
}

/// A single markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaf {
    pub id: EntityId,
    pub title: String,
    pub note_id: EntityId,
    pub content: String,
    pub updated_at: Millis,
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_color: Option<String>,
}

/// Leaf information known before its content is downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafSkeleton {
    pub id: EntityId,
    pub title: String,
    pub note_id: EntityId,
    /// Path relative to the managed namespace, e.g. `Work/Notes.md`.
    pub path: String,
    pub order: i64,
    pub badge_icon: Option<String>,
    pub badge_color: Option<String>,
}

/// Full local state handed to a push.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub leaves: Vec<Leaf>,
    /// Badge entries for leaves that have no backing file, keyed `__name`.
    #[serde(default)]
    pub virtual_leaves: BTreeMap<String, LeafMeta>,
}

impl Snapshot {
    pub fn new(notes: Vec<Note>, leaves: Vec<Leaf>) -> Self {
        Self {
            notes,
            leaves,
            virtual_leaves: BTreeMap::new(),
        }
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }
}
