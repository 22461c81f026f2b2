//! Managed namespace layout and path normalisation.
//!
//! Leaf files live at `<root>/<folder path>/<title>.md`, folders are kept alive by
//! `.gitkeep` placeholders and `metadata.json` sits at the namespace root. The
//! same functions build paths for push and parse them on pull, so metadata keys
//! line up across both directions.

use crate::types::{Leaf, Note};

pub const METADATA_FILE: &str = "metadata.json";
pub const PLACEHOLDER_FILE: &str = ".gitkeep";
pub const LEAF_EXTENSION: &str = ".md";
pub const UNTITLED: &str = "Untitled";
pub const MAX_SEGMENT_CHARS: usize = 80;

const ILLEGAL_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// The path prefix this engine owns and rebuilds on every push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedNamespace {
    root: String,
}

impl ManagedNamespace {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.trim_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// `root/`
    pub fn prefix(&self) -> String {
        format!("{}/", self.root)
    }

    pub fn contains(&self, path: &str) -> bool {
        path.len() > self.root.len() + 1
            && path.starts_with(&self.root)
            && path.as_bytes()[self.root.len()] == b'/'
    }

    /// Path relative to the namespace root, if the path is inside it.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.contains(path) {
            Some(&path[self.root.len() + 1..])
        } else {
            None
        }
    }

    pub fn join(&self, relative: &str) -> String {
        format!("{}/{}", self.root, relative)
    }

    pub fn metadata_path(&self) -> String {
        self.join(METADATA_FILE)
    }

    pub fn root_placeholder(&self) -> String {
        self.join(PLACEHOLDER_FILE)
    }

    pub fn folder_placeholder(&self, folder_path: &str) -> String {
        self.join(&format!("{}/{}", folder_path, PLACEHOLDER_FILE))
    }
}

impl Default for ManagedNamespace {
    fn default() -> Self {
        Self::new("notes")
    }
}

/// Canonical sanitizer for one path segment.
///
/// Replaces `\ / : * ? " < > |` with `-`, collapses whitespace runs to a single
/// space and keeps at most 80 characters. Empty and dot-only segments (`.`, `..`)
/// become `Untitled`; git trees cannot hold them.
pub fn sanitize_segment(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    let mut in_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !in_space {
                cleaned.push(' ');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if ILLEGAL_CHARS.contains(&ch) {
            cleaned.push('-');
        } else {
            cleaned.push(ch);
        }
    }
    let limited: String = cleaned.chars().take(MAX_SEGMENT_CHARS).collect();
    if limited.chars().all(|ch| ch == '.') {
        UNTITLED.to_string()
    } else {
        limited
    }
}

/// Sanitize a note name, keeping `/` as the separator of collapsed sub-paths.
pub fn sanitize_note_name(name: &str) -> String {
    name.split('/')
        .map(sanitize_segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// Collapse a folder chain to at most two levels.
///
/// Each segment is sanitized first; anything past the first segment is joined
/// with `/` into the second, so `[A, B, C]` becomes `[A, "B/C"]`.
pub fn collapse_folder_segments<S: AsRef<str>>(parts: &[S]) -> Vec<String> {
    let sanitized: Vec<String> = parts
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| !p.is_empty())
        .map(sanitize_segment)
        .collect();
    if sanitized.len() <= 2 {
        return sanitized;
    }
    let mut iter = sanitized.into_iter();
    let first = iter.next().unwrap_or_else(|| UNTITLED.to_string());
    let rest: Vec<String> = iter.collect();
    vec![first, rest.join("/")]
}

/// Folder path of a note relative to the namespace root.
///
/// Only the direct parent is consulted; hierarchy depth never exceeds two.
pub fn folder_path(note: &Note, notes: &[Note]) -> String {
    let own = sanitize_note_name(&note.name);
    let parent = note
        .parent_id
        .as_deref()
        .and_then(|pid| notes.iter().find(|n| n.id == pid));
    match parent {
        Some(parent) => format!("{}/{}", sanitize_note_name(&parent.name), own),
        None => own,
    }
}

/// Leaf file path relative to the namespace root, `None` when its note is absent.
pub fn leaf_relative_path(leaf: &Leaf, notes: &[Note]) -> Option<String> {
    let note = notes.iter().find(|n| n.id == leaf.note_id)?;
    Some(format!(
        "{}/{}{}",
        folder_path(note, notes),
        sanitize_segment(&leaf.title),
        LEAF_EXTENSION
    ))
}

/// Title of a leaf file name, `Notes.md` ⇒ `Notes`.
pub fn title_from_file_name(file_name: &str) -> String {
    let stem = if file_name.to_ascii_lowercase().ends_with(LEAF_EXTENSION) {
        &file_name[..file_name.len() - LEAF_EXTENSION.len()]
    } else {
        file_name
    };
    if stem.is_empty() {
        UNTITLED.to_string()
    } else {
        stem.to_string()
    }
}

pub fn is_leaf_file(path: &str) -> bool {
    path.to_ascii_lowercase().ends_with(LEAF_EXTENSION)
}

pub fn is_placeholder(path: &str) -> bool {
    path == PLACEHOLDER_FILE || path.ends_with(&format!("/{}", PLACEHOLDER_FILE))
}
