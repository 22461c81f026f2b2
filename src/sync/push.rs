//! Push pipeline
//!
//! The managed namespace is rebuilt from the snapshot on every push; nothing is
//! patched incrementally. Blobs whose content hash matches the remote blob are
//! referenced by sha instead of re-uploaded. The ref update is the only step
//! that changes state visible to other clients, so any earlier failure leaves
//! the remote untouched and the whole push can be retried.

use super::{fetch_metadata, resolve_branch, RemoteMetadata};
use crate::error::SyncError;
use crate::github::{GitDataApi, NewCommit, NewTreeItem, Signature, FILE_MODE};
use crate::metadata::{build_metadata, canonical_string, normalize, MetadataDocument};
use crate::paths::{folder_path, leaf_relative_path, ManagedNamespace};
use crate::tree::{hash_blob, partition_entries, TreePartition, EMPTY_BLOB_HEX};
use crate::types::Snapshot;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

pub const DEFAULT_COMMIT_MESSAGE: &str = "leafsync pushed notes";

#[derive(Debug, Clone)]
pub struct PushOptions {
    pub namespace: ManagedNamespace,
    /// Used when the repository reports no default branch.
    pub fallback_branch: String,
    pub commit_message: String,
    pub committer: Signature,
}

impl Default for PushOptions {
    fn default() -> Self {
        Self {
            namespace: ManagedNamespace::default(),
            fallback_branch: "main".to_string(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            committer: Signature {
                name: "leafsync".to_string(),
                email: "leafsync@users.noreply.github.com".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushOutcome {
    /// Nothing differed from the remote; no tree, commit or ref call was made.
    pub no_changes: bool,
    /// The branch did not exist and was created by this push.
    pub bootstrap: bool,
    /// Leaves whose content was uploaded rather than referenced by sha.
    pub changed_leaf_count: usize,
    pub metadata_changed: bool,
    /// `pushCount` now on the remote.
    pub push_count: u64,
    pub commit_sha: Option<String>,
}

impl PushOutcome {
    pub fn message_key(&self) -> &'static str {
        if self.no_changes {
            "github.noChanges"
        } else {
            "github.pushOk"
        }
    }
}

/// Where the branch currently stands.
struct RemoteBase {
    head: Option<String>,
    partition: TreePartition,
}

async fn load_base<A>(api: &A, branch: &str, namespace: &ManagedNamespace) -> Result<RemoteBase, SyncError>
where
    A: GitDataApi + ?Sized,
{
    let Some(head) = api.get_branch_head(branch).await? else {
        info!(branch, "Branch has no commits, bootstrapping");
        return Ok(RemoteBase {
            head: None,
            partition: TreePartition::default(),
        });
    };
    let commit = api.get_commit(&head).await?;
    let listing = api.get_tree_recursive(&commit.tree.sha).await?;
    if listing.truncated {
        warn!(tree = %commit.tree.sha, "Tree listing truncated, unlisted files will not be preserved");
    }
    Ok(RemoteBase {
        head: Some(head),
        partition: partition_entries(&listing.tree, namespace),
    })
}

/// Placeholder blob, reusing the remote sha only when it is the empty blob.
fn placeholder_item(path: String, partition: &TreePartition) -> NewTreeItem {
    match partition.managed_sha(&path) {
        Some(sha) if sha == EMPTY_BLOB_HEX => NewTreeItem::existing(path, FILE_MODE, sha),
        _ => NewTreeItem::inline(path, ""),
    }
}

/// Managed tree items for the snapshot, keyed by full path, plus the number
/// of leaves whose content must be uploaded.
fn managed_items(
    snapshot: &Snapshot,
    namespace: &ManagedNamespace,
    partition: &TreePartition,
) -> (BTreeMap<String, NewTreeItem>, usize) {
    let mut items = BTreeMap::new();

    let root = namespace.root_placeholder();
    items.insert(root.clone(), placeholder_item(root, partition));
    for note in &snapshot.notes {
        let path = namespace.folder_placeholder(&folder_path(note, &snapshot.notes));
        items
            .entry(path.clone())
            .or_insert_with(|| placeholder_item(path, partition));
    }

    let mut changed = 0;
    for leaf in &snapshot.leaves {
        let Some(relative) = leaf_relative_path(leaf, &snapshot.notes) else {
            warn!(leaf_id = %leaf.id, note_id = %leaf.note_id, "Leaf references a missing note, skipped");
            continue;
        };
        let path = namespace.join(&relative);
        if items.contains_key(&path) {
            warn!(leaf_id = %leaf.id, path = %path, "Another leaf already maps to this path, skipped");
            continue;
        }
        let reusable = partition
            .managed_sha(&path)
            .filter(|sha| hash_blob(&leaf.content).matches_hex(sha));
        let item = match reusable {
            Some(sha) => NewTreeItem::existing(path.clone(), FILE_MODE, sha),
            None => {
                changed += 1;
                NewTreeItem::inline(path.clone(), leaf.content.clone())
            }
        };
        items.insert(path, item);
    }

    (items, changed)
}

/// Publish `snapshot` as a single commit on the default branch.
pub async fn push_snapshot<A>(
    api: &A,
    snapshot: &Snapshot,
    options: &PushOptions,
) -> Result<PushOutcome, SyncError>
where
    A: GitDataApi + ?Sized,
{
    if snapshot.leaves.is_empty() {
        return Err(SyncError::NoLeaves);
    }
    let namespace = &options.namespace;

    let branch = resolve_branch(api, &options.fallback_branch).await?;
    let base = load_base(api, &branch, namespace).await?;
    let bootstrap = base.head.is_none();

    let existing = if bootstrap {
        None
    } else {
        match fetch_metadata(api, namespace).await? {
            RemoteMetadata::Corrupt(err) => {
                warn!(error = %err, "Remote metadata unreadable, rebuilding from defaults");
                None
            }
            found => found.into_option(),
        }
    };
    let current_count = existing.as_ref().map(|doc| doc.push_count).unwrap_or(0);

    let next = build_metadata(snapshot, existing.as_ref(), current_count);
    let baseline = existing.clone().unwrap_or_default();
    let metadata_changed = canonical_string(&normalize(&baseline, Some(current_count)))
        != canonical_string(&normalize(&next, Some(current_count)));

    let (managed, changed_leaf_count) = managed_items(snapshot, namespace, &base.partition);
    debug!(
        branch = %branch,
        managed = managed.len(),
        preserved = base.partition.preserved.len(),
        changed_leaf_count,
        metadata_changed,
        "Push diff computed"
    );

    if !bootstrap && changed_leaf_count == 0 && !metadata_changed {
        info!(push_count = current_count, "Nothing to push");
        return Ok(PushOutcome {
            no_changes: true,
            bootstrap: false,
            changed_leaf_count: 0,
            metadata_changed: false,
            push_count: current_count,
            commit_sha: None,
        });
    }

    let push_count = current_count + 1;
    let metadata_json = normalize(&next, Some(push_count)).to_pretty_json()?;

    let mut items: Vec<NewTreeItem> = base
        .partition
        .preserved
        .iter()
        .map(|blob| NewTreeItem::existing(blob.path.clone(), blob.mode.clone(), blob.sha.clone()))
        .collect();
    items.extend(managed.into_values());
    items.push(NewTreeItem::inline(namespace.metadata_path(), metadata_json));

    let tree_sha = api.create_tree(&items).await?;
    let commit = NewCommit {
        message: options.commit_message.clone(),
        tree: tree_sha,
        parents: base.head.iter().cloned().collect(),
        author: options.committer.clone(),
        committer: options.committer.clone(),
    };
    let commit_sha = api.create_commit(&commit).await?;

    match base.head {
        Some(_) => api.update_ref(&branch, &commit_sha, true).await?,
        None => api.create_ref(&branch, &commit_sha).await?,
    }

    info!(
        branch = %branch,
        commit = %commit_sha,
        push_count,
        changed_leaf_count,
        bootstrap,
        "Push complete"
    );
    Ok(PushOutcome {
        no_changes: false,
        bootstrap,
        changed_leaf_count,
        metadata_changed,
        push_count,
        commit_sha: Some(commit_sha),
    })
}
