//! Partition of an existing tree into preserved and managed blobs.

use crate::github::types::{EntryKind, TreeEntry};
use crate::paths::ManagedNamespace;
use std::collections::BTreeMap;

/// A blob outside the managed namespace, copied through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreservedBlob {
    pub path: String,
    pub mode: String,
    pub sha: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreePartition {
    pub preserved: Vec<PreservedBlob>,
    /// Full path ⇒ blob sha for every blob under the namespace.
    pub managed: BTreeMap<String, String>,
}

impl TreePartition {
    pub fn managed_sha(&self, path: &str) -> Option<&str> {
        self.managed.get(path).map(String::as_str)
    }
}

/// Split blob entries by namespace. Tree and submodule rows are dropped since
/// the new tree is rebuilt from blob paths alone.
pub fn partition_entries(entries: &[TreeEntry], namespace: &ManagedNamespace) -> TreePartition {
    let mut partition = TreePartition::default();
    for entry in entries.iter().filter(|e| e.kind == EntryKind::Blob) {
        if namespace.contains(&entry.path) {
            partition.managed.insert(entry.path.clone(), entry.sha.clone());
        } else {
            partition.preserved.push(PreservedBlob {
                path: entry.path.clone(),
                mode: entry.mode.clone(),
                sha: entry.sha.clone(),
            });
        }
    }
    partition
}
