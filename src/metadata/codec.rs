//! Canonical form of the metadata document.
//!
//! Two documents that differ only in key order or in absent-vs-empty optional
//! fields normalize to byte-identical canonical strings.

use super::{LeafMeta, MetadataDocument, NoteMeta, METADATA_VERSION};
use crate::paths::{folder_path, leaf_relative_path};
use crate::types::Snapshot;
use std::collections::btree_map::Entry;
use tracing::warn;

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Normalize a document, optionally pinning `pushCount`.
pub fn normalize(doc: &MetadataDocument, push_count_override: Option<u64>) -> MetadataDocument {
    let notes = doc
        .notes
        .iter()
        .map(|(key, n)| {
            (
                key.clone(),
                NoteMeta {
                    id: n.id.clone(),
                    order: n.order,
                    badge_icon: non_empty(&n.badge_icon),
                    badge_color: non_empty(&n.badge_color),
                },
            )
        })
        .collect();
    let leaves = doc
        .leaves
        .iter()
        .map(|(key, l)| {
            (
                key.clone(),
                LeafMeta {
                    id: l.id.clone(),
                    updated_at: l.updated_at,
                    order: l.order,
                    badge_icon: non_empty(&l.badge_icon),
                    badge_color: non_empty(&l.badge_color),
                },
            )
        })
        .collect();

    MetadataDocument {
        version: if doc.version == 0 {
            METADATA_VERSION
        } else {
            doc.version
        },
        push_count: push_count_override.unwrap_or(doc.push_count),
        notes,
        leaves,
    }
}

/// Stable serialization for equality comparison.
///
/// Maps are `BTreeMap`s and optional fields are skipped when absent, so the
/// compact JSON form is already canonical once the document is normalized.
pub fn canonical_string(doc: &MetadataDocument) -> String {
    let normalized = normalize(doc, None);
    serde_json::to_string(&normalized).unwrap_or_default()
}

/// Build the metadata describing a snapshot.
///
/// Virtual leaf entries from `existing` are carried forward unless the snapshot
/// supplies its own entry for the same key.
pub fn build_metadata(
    snapshot: &Snapshot,
    existing: Option<&MetadataDocument>,
    push_count: u64,
) -> MetadataDocument {
    let mut doc = MetadataDocument {
        version: METADATA_VERSION,
        push_count,
        ..MetadataDocument::default()
    };

    for note in &snapshot.notes {
        let path = folder_path(note, &snapshot.notes);
        match doc.notes.entry(path) {
            Entry::Occupied(taken) => {
                warn!(
                    note_id = %note.id,
                    kept = %taken.get().id,
                    path = %taken.key(),
                    "Note folder already claimed, metadata entry skipped"
                );
            }
            Entry::Vacant(slot) => {
                slot.insert(NoteMeta {
                    id: note.id.clone(),
                    order: note.order,
                    badge_icon: note.badge_icon.clone(),
                    badge_color: note.badge_color.clone(),
                });
            }
        }
    }

    for leaf in &snapshot.leaves {
        let Some(path) = leaf_relative_path(leaf, &snapshot.notes) else {
            warn!(leaf_id = %leaf.id, note_id = %leaf.note_id, "Leaf references a missing note, not persisted");
            continue;
        };
        // First leaf wins a shared path, matching the file the push writes.
        doc.leaves.entry(path).or_insert_with(|| LeafMeta {
            id: leaf.id.clone(),
            updated_at: leaf.updated_at,
            order: leaf.order,
            badge_icon: leaf.badge_icon.clone(),
            badge_color: leaf.badge_color.clone(),
        });
    }

    if let Some(existing) = existing {
        for (key, meta) in existing.virtual_leaves() {
            doc.leaves.entry(key.clone()).or_insert_with(|| meta.clone());
        }
    }
    for (key, meta) in &snapshot.virtual_leaves {
        doc.leaves.insert(key.clone(), meta.clone());
    }

    doc
}
