//! Wire types for the GitHub REST and Git Data endpoints used by the engine.

use serde::{Deserialize, Serialize};

pub const FILE_MODE: &str = "100644";

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryInfo {
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticatedUser {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitObject {
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitRef {
    pub object: GitObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    pub tree: GitObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    Commit,
    #[serde(other)]
    Other,
}

/// One row of a recursive tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub sha: String,
}

impl TreeEntry {
    pub fn blob(path: &str, sha: &str) -> Self {
        Self {
            path: path.to_string(),
            mode: FILE_MODE.to_string(),
            kind: EntryKind::Blob,
            sha: sha.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeListing {
    #[serde(default)]
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentsResponse {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

/// Entry of a tree being created: either an existing blob id or inline content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTreeItem {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl NewTreeItem {
    pub fn existing(path: impl Into<String>, mode: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: mode.into(),
            kind: "blob".to_string(),
            sha: Some(sha.into()),
            content: None,
        }
    }

    pub fn inline(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: FILE_MODE.to_string(),
            kind: "blob".to_string(),
            sha: None,
            content: Some(content.into()),
        }
    }

    pub fn is_inline(&self) -> bool {
        self.content.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewTree<'a> {
    pub tree: &'a [NewTreeItem],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCommit {
    pub message: String,
    pub tree: String,
    pub parents: Vec<String>,
    pub author: Signature,
    pub committer: Signature,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ShaResponse {
    pub sha: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct UpdateRef<'a> {
    pub sha: &'a str,
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateRef<'a> {
    #[serde(rename = "ref")]
    pub reference: String,
    pub sha: &'a str,
}
