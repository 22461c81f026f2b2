//! Pull pipeline
//!
//! Structure first, content second: notes and leaf skeletons are rebuilt from
//! the tree listing and `metadata.json` before any file is downloaded, the
//! observer picks what to load first, and contents stream in through a bounded
//! worker pool.

use super::{fetch_metadata, resolve_branch, RemoteMetadata};
use crate::concurrency::run_bounded;
use crate::error::SyncError;
use crate::github::{EntryKind, GitDataApi, TreeEntry};
use crate::metadata::{LeafMeta, MetadataDocument, NoteMeta};
use crate::paths::{
    collapse_folder_segments, is_leaf_file, is_placeholder, title_from_file_name, ManagedNamespace,
};
use crate::types::{EntityId, Leaf, LeafSkeleton, Note};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, info, warn};

pub const DEFAULT_CONTENT_CONCURRENCY: usize = 10;

/// Leaves the caller wants first. Paths are relative to the namespace root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullPriority {
    pub leaf_paths: BTreeSet<String>,
    pub note_ids: BTreeSet<EntityId>,
}

/// Staged-loading callbacks. Every method has a no-op default.
pub trait PullObserver: Send + Sync {
    /// Structure is known; return the leaves to fetch first.
    fn on_structure(
        &self,
        _notes: &[Note],
        _metadata: &MetadataDocument,
        _leaves: &[LeafSkeleton],
    ) -> Option<PullPriority> {
        None
    }

    fn on_leaf(&self, _leaf: &Leaf) {}

    /// Fires exactly once, after every tier-0 leaf has finished fetching.
    fn on_priority_complete(&self) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PullObserver for NoopObserver {}

#[derive(Debug, Clone)]
pub struct PullOptions {
    pub namespace: ManagedNamespace,
    pub fallback_branch: String,
    pub concurrency: usize,
}

impl Default for PullOptions {
    fn default() -> Self {
        Self {
            namespace: ManagedNamespace::default(),
            fallback_branch: "main".to_string(),
            concurrency: DEFAULT_CONTENT_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullOutcome {
    pub notes: Vec<Note>,
    pub leaves: Vec<Leaf>,
    pub metadata: MetadataDocument,
    /// The branch had no commits.
    pub empty_repository: bool,
    /// Leaf files whose content could not be fetched.
    pub failed_paths: Vec<String>,
}

impl PullOutcome {
    pub fn message_key(&self) -> &'static str {
        "github.pullOk"
    }

    fn empty() -> Self {
        Self {
            notes: Vec::new(),
            leaves: Vec::new(),
            metadata: MetadataDocument::default(),
            empty_repository: true,
            failed_paths: Vec::new(),
        }
    }
}

/// A leaf whose content has not been fetched yet.
#[derive(Debug, Clone)]
struct LeafTarget {
    /// Full repository path.
    path: String,
    /// Collapsed path relative to the namespace root.
    relative_path: String,
    title: String,
    note_id: EntityId,
    meta: LeafMeta,
}

impl LeafTarget {
    fn skeleton(&self) -> LeafSkeleton {
        LeafSkeleton {
            id: self.meta.id.clone(),
            title: self.title.clone(),
            note_id: self.note_id.clone(),
            path: self.relative_path.clone(),
            order: self.meta.order,
            badge_icon: self.meta.badge_icon.clone(),
            badge_color: self.meta.badge_color.clone(),
        }
    }

    fn tier(&self, priority: &PullPriority) -> u8 {
        if priority.leaf_paths.contains(&self.relative_path) {
            0
        } else if priority.note_ids.contains(&self.note_id) {
            1
        } else {
            2
        }
    }
}

/// Notes resolved from folder paths, in the order they were first seen.
struct NoteResolver<'m> {
    metadata: &'m MetadataDocument,
    notes: Vec<Note>,
    by_path: HashMap<String, usize>,
}

impl<'m> NoteResolver<'m> {
    fn new(metadata: &'m MetadataDocument) -> Self {
        Self {
            metadata,
            notes: Vec::new(),
            by_path: HashMap::new(),
        }
    }

    /// Resolve every prefix of a collapsed folder chain; returns the id of the
    /// deepest note.
    fn ensure(&mut self, segments: &[String]) -> Option<EntityId> {
        let mut parent_id: Option<EntityId> = None;
        for depth in 0..segments.len() {
            let partial = segments[..=depth].join("/");
            if let Some(&index) = self.by_path.get(&partial) {
                parent_id = Some(self.notes[index].id.clone());
                continue;
            }
            let meta = self.metadata.notes.get(&partial).cloned().unwrap_or_else(|| NoteMeta {
                id: uuid::Uuid::new_v4().to_string(),
                order: self.notes.len() as i64,
                badge_icon: None,
                badge_color: None,
            });
            let note = Note {
                id: meta.id,
                name: segments[depth].clone(),
                parent_id: parent_id.take(),
                order: meta.order,
                badge_icon: meta.badge_icon,
                badge_color: meta.badge_color,
            };
            parent_id = Some(note.id.clone());
            self.by_path.insert(partial, self.notes.len());
            self.notes.push(note);
        }
        parent_id
    }

    fn into_sorted(self) -> Vec<Note> {
        let mut notes = self.notes;
        notes.sort_by_key(|n| n.order);
        notes
    }
}

/// Split a namespace-relative file path into collapsed folder segments and
/// the file name.
fn split_relative(relative: &str) -> Option<(Vec<String>, &str)> {
    let (folders, file_name) = relative.rsplit_once('/')?;
    let parts: Vec<&str> = folders.split('/').filter(|p| !p.is_empty()).collect();
    let collapsed = collapse_folder_segments(&parts);
    if collapsed.is_empty() {
        return None;
    }
    Some((collapsed, file_name))
}

/// Rebuild notes and leaf targets from the tree listing.
fn build_structure(
    entries: &[TreeEntry],
    namespace: &ManagedNamespace,
    metadata: &MetadataDocument,
) -> (Vec<Note>, Vec<LeafTarget>) {
    let mut resolver = NoteResolver::new(metadata);
    let blobs: Vec<(&TreeEntry, &str)> = entries
        .iter()
        .filter(|e| e.kind == EntryKind::Blob)
        .filter_map(|e| namespace.strip(&e.path).map(|rel| (e, rel)))
        .collect();

    // Placeholders first so folders without leaves survive.
    for (_, relative) in blobs.iter().filter(|(_, rel)| is_placeholder(rel)) {
        if let Some((folders, _)) = split_relative(relative) {
            resolver.ensure(&folders);
        }
    }

    let now = chrono::Utc::now().timestamp_millis();
    let mut targets = Vec::new();
    let leaf_files = blobs
        .iter()
        .filter(|(_, rel)| is_leaf_file(rel) && !is_placeholder(rel));
    for (index, (entry, relative)) in leaf_files.enumerate() {
        let Some((folders, file_name)) = split_relative(relative) else {
            debug!(path = %entry.path, "Leaf outside any note, ignored");
            continue;
        };
        let Some(note_id) = resolver.ensure(&folders) else {
            continue;
        };
        let collapsed = format!("{}/{}", folders.join("/"), file_name);
        let meta = metadata
            .leaves
            .get(&collapsed)
            .or_else(|| metadata.leaves.get(*relative))
            .cloned()
            .unwrap_or_else(|| LeafMeta {
                id: uuid::Uuid::new_v4().to_string(),
                updated_at: now,
                order: index as i64,
                badge_icon: None,
                badge_color: None,
            });
        targets.push(LeafTarget {
            path: entry.path.clone(),
            relative_path: collapsed,
            title: title_from_file_name(file_name),
            note_id,
            meta,
        });
    }

    (resolver.into_sorted(), targets)
}

/// One-shot signal for the tier-0 batch.
struct PriorityLatch<'o> {
    observer: &'o dyn PullObserver,
    remaining: AtomicUsize,
    fired: AtomicBool,
}

impl<'o> PriorityLatch<'o> {
    fn new(observer: &'o dyn PullObserver, count: usize) -> Self {
        Self {
            observer,
            remaining: AtomicUsize::new(count),
            fired: AtomicBool::new(false),
        }
    }

    fn fire(&self) {
        if !self.fired.swap(true, Ordering::SeqCst) {
            self.observer.on_priority_complete();
        }
    }

    fn complete_one(&self) {
        if self.remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.fire();
        }
    }
}

enum Fetched {
    Leaf(Leaf),
    Failed(String),
}

/// Pull the full note/leaf hierarchy from the default branch.
pub async fn pull_snapshot<A>(
    api: &A,
    options: &PullOptions,
    observer: &dyn PullObserver,
) -> Result<PullOutcome, SyncError>
where
    A: GitDataApi + ?Sized,
{
    let namespace = &options.namespace;
    let branch = resolve_branch(api, &options.fallback_branch).await?;

    let Some(head) = api.get_branch_head(&branch).await? else {
        info!(branch = %branch, "Repository is empty, nothing to pull");
        let outcome = PullOutcome::empty();
        observer.on_structure(&[], &outcome.metadata, &[]);
        observer.on_priority_complete();
        return Ok(outcome);
    };

    let (listing, remote_metadata) = futures::join!(
        api.get_tree_recursive(&head),
        fetch_metadata(api, namespace)
    );
    let listing = listing?;
    if listing.truncated {
        warn!(commit = %head, "Tree listing truncated, some leaves will be missing");
    }
    let metadata = match remote_metadata? {
        RemoteMetadata::Parsed(doc) => doc,
        RemoteMetadata::Absent => MetadataDocument::default(),
        RemoteMetadata::Corrupt(err) => {
            warn!(error = %err, "Remote metadata unreadable, using defaults");
            MetadataDocument::default()
        }
    };

    let (notes, mut targets) = build_structure(&listing.tree, namespace, &metadata);
    let skeletons: Vec<LeafSkeleton> = targets.iter().map(LeafTarget::skeleton).collect();
    let priority = observer
        .on_structure(&notes, &metadata, &skeletons)
        .unwrap_or_default();

    targets.sort_by_key(|t| (t.tier(&priority), t.meta.order));
    let tier0 = targets.iter().filter(|t| t.tier(&priority) == 0).count();
    debug!(
        notes = notes.len(),
        leaves = targets.len(),
        tier0,
        "Pull structure resolved"
    );

    let latch = PriorityLatch::new(observer, tier0);
    if tier0 == 0 {
        latch.fire();
    }

    let results = run_bounded(&targets, options.concurrency, |target, _| {
        let latch = &latch;
        let priority = &priority;
        async move {
            let fetched = match api.get_file_raw(&target.path).await {
                Ok(Some(content)) => {
                    let leaf = Leaf {
                        id: target.meta.id.clone(),
                        title: target.title.clone(),
                        note_id: target.note_id.clone(),
                        content,
                        updated_at: target.meta.updated_at,
                        order: target.meta.order,
                        badge_icon: target.meta.badge_icon.clone(),
                        badge_color: target.meta.badge_color.clone(),
                    };
                    observer.on_leaf(&leaf);
                    Fetched::Leaf(leaf)
                }
                Ok(None) => {
                    warn!(path = %target.path, "Leaf listed in tree but not found");
                    Fetched::Failed(target.path.clone())
                }
                Err(err) => {
                    warn!(path = %target.path, error = %err, "Leaf fetch failed, dropped");
                    Fetched::Failed(target.path.clone())
                }
            };
            if target.tier(priority) == 0 {
                latch.complete_one();
            }
            Some(fetched)
        }
    })
    .await;
    latch.fire();

    let mut leaves = Vec::with_capacity(results.len());
    let mut failed_paths = Vec::new();
    for result in results {
        match result {
            Fetched::Leaf(leaf) => leaves.push(leaf),
            Fetched::Failed(path) => failed_paths.push(path),
        }
    }
    leaves.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.title.cmp(&b.title)));
    failed_paths.sort();

    info!(
        branch = %branch,
        notes = notes.len(),
        leaves = leaves.len(),
        failed = failed_paths.len(),
        "Pull complete"
    );
    Ok(PullOutcome {
        notes,
        leaves,
        metadata,
        empty_repository: false,
        failed_paths,
    })
}
