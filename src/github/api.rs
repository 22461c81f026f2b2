//! Transport seam between the sync pipelines and GitHub.

use super::types::{
    AuthenticatedUser, CommitInfo, NewCommit, NewTreeItem, RepositoryInfo, TreeListing,
};
use crate::error::SyncError;
use async_trait::async_trait;

/// Git Data API operations the pipelines depend on.
///
/// Implementations map every non-success response to a [`SyncError`] at the
/// call site; callers never see raw HTTP statuses.
#[async_trait]
pub trait GitDataApi: Send + Sync {
    /// `GET /user`
    async fn get_authenticated_user(&self) -> Result<AuthenticatedUser, SyncError>;

    /// `GET /repos/{owner}/{repo}`
    async fn get_repository(&self) -> Result<RepositoryInfo, SyncError>;

    /// Head commit sha of `branch`; `None` when the branch has no ref yet
    /// (the repository is empty).
    async fn get_branch_head(&self, branch: &str) -> Result<Option<String>, SyncError>;

    async fn get_commit(&self, sha: &str) -> Result<CommitInfo, SyncError>;

    /// Full recursive listing of a tree.
    async fn get_tree_recursive(&self, tree_sha: &str) -> Result<TreeListing, SyncError>;

    /// File text through the contents API, base64-decoded. `None` on 404.
    async fn get_file(&self, path: &str) -> Result<Option<String>, SyncError>;

    /// File text through the raw media type. `None` on 404.
    async fn get_file_raw(&self, path: &str) -> Result<Option<String>, SyncError>;

    /// Create a tree from scratch (no base tree) and return its sha.
    async fn create_tree(&self, items: &[NewTreeItem]) -> Result<String, SyncError>;

    /// Create a commit and return its sha.
    async fn create_commit(&self, commit: &NewCommit) -> Result<String, SyncError>;

    /// Move `branch` to `sha`.
    async fn update_ref(&self, branch: &str, sha: &str, force: bool) -> Result<(), SyncError>;

    /// Create `refs/heads/{branch}` pointing at `sha`.
    async fn create_ref(&self, branch: &str, sha: &str) -> Result<(), SyncError>;
}
