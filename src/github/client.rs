//! `reqwest` implementation of [`GitDataApi`].

use super::api::GitDataApi;
use super::repo::RepoRef;
use super::types::{
    AuthenticatedUser, CommitInfo, ContentsResponse, CreateRef, GitRef, NewCommit, NewTree,
    NewTreeItem, RepositoryInfo, ShaResponse, TreeListing, UpdateRef,
};
use crate::error::{ApiStep, SyncError};
use crate::rate_limit::{RateLimitMonitor, DEFAULT_FALLBACK_SECS};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode, Url};
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = concat!("leafsync/", env!("CARGO_PKG_VERSION"));

const MEDIA_JSON: &str = "application/vnd.github+json";
const MEDIA_RAW: &str = "application/vnd.github.raw";
const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";

/// Authenticated client bound to one repository.
#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    base_url: Url,
    repo: RepoRef,
    monitor: RateLimitMonitor,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url.as_str())
            .field("repo", &self.repo.full_name())
            .finish()
    }
}

impl GitHubClient {
    pub fn new(repo: RepoRef, token: &str) -> Result<Self, SyncError> {
        Self::with_options(repo, token, DEFAULT_API_BASE, DEFAULT_USER_AGENT, DEFAULT_FALLBACK_SECS)
    }

    pub fn with_options(
        repo: RepoRef,
        token: &str,
        base_url: &str,
        user_agent: &str,
        rate_limit_fallback_secs: u64,
    ) -> Result<Self, SyncError> {
        if token.trim().is_empty() {
            return Err(SyncError::ConfigInvalid("GitHub token is empty".to_string()));
        }
        let base_url = Url::parse(base_url)
            .map_err(|e| SyncError::ConfigInvalid(format!("Invalid API base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::ConfigInvalid(format!(
                "Invalid API base URL '{}'",
                base_url
            )));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|_| SyncError::ConfigInvalid("GitHub token contains invalid characters".to_string()))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_JSON));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));

        let http = Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            http,
            base_url,
            repo,
            monitor: RateLimitMonitor::new(rate_limit_fallback_secs),
        })
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn repo_url(&self, tail: &[&str]) -> Url {
        let mut segments = vec!["repos", self.repo.owner.as_str(), self.repo.name.as_str()];
        segments.extend_from_slice(tail);
        self.url(&segments)
    }

    /// Repository URL ending in a possibly multi-segment path such as a branch.
    fn repo_url_with(&self, head: &[&str], rest: &str) -> Url {
        let mut tail = head.to_vec();
        tail.extend(rest.split('/'));
        self.repo_url(&tail)
    }

    fn contents_url(&self, path: &str) -> Url {
        let mut url = self.repo_url_with(&["contents"], path);
        url.query_pairs_mut()
            .append_pair("t", &chrono::Utc::now().timestamp_millis().to_string());
        url
    }

    fn rate_limited(&self, response: &Response) -> Option<SyncError> {
        let info = self.monitor.classify(response.status(), response.headers());
        info.is_rate_limited.then_some(SyncError::RateLimited(info))
    }

    /// Map a response to success or a classified failure.
    fn check(&self, step: ApiStep, response: Response) -> Result<Response, SyncError> {
        let status = response.status();
        debug!(step = %step, status = status.as_u16(), "GitHub response");
        if let Some(limited) = self.rate_limited(&response) {
            return Err(limited);
        }
        if status.is_success() {
            return Ok(response);
        }
        Err(match status {
            StatusCode::UNAUTHORIZED => SyncError::AuthError,
            StatusCode::NOT_FOUND if step == ApiStep::RepoFetch => SyncError::RepoNotFound,
            other => SyncError::Api {
                step,
                status: other.as_u16(),
            },
        })
    }

    async fn fetch_file(&self, path: &str, raw: bool) -> Result<Option<String>, SyncError> {
        let mut request = self.http.get(self.contents_url(path));
        if raw {
            request = request.header(ACCEPT, MEDIA_RAW);
        }
        let response = request.send().await?;
        if self.rate_limited(&response).is_none() && response.status() == StatusCode::NOT_FOUND {
            debug!(path, "File not present");
            return Ok(None);
        }
        let response = self.check(ApiStep::ContentFetch, response)?;
        if raw {
            return Ok(Some(response.text().await?));
        }
        let body: ContentsResponse = response.json().await?;
        decode_contents(&body).map(Some)
    }
}

/// Decode a contents API body; GitHub wraps base64 at 60 columns.
fn decode_contents(body: &ContentsResponse) -> Result<String, SyncError> {
    let Some(content) = body.content.as_deref() else {
        return Ok(String::new());
    };
    if let Some(encoding) = body.encoding.as_deref() {
        if encoding != "base64" {
            return Err(SyncError::Network(format!("Unsupported content encoding '{}'", encoding)));
        }
    }
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| SyncError::Network(format!("Invalid base64 content: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| SyncError::Network(format!("File is not UTF-8: {}", e)))
}

#[async_trait]
impl GitDataApi for GitHubClient {
    async fn get_authenticated_user(&self) -> Result<AuthenticatedUser, SyncError> {
        let response = self.http.get(self.url(&["user"])).send().await?;
        Ok(self.check(ApiStep::UserFetch, response)?.json().await?)
    }

    async fn get_repository(&self) -> Result<RepositoryInfo, SyncError> {
        let response = self.http.get(self.repo_url(&[])).send().await?;
        Ok(self.check(ApiStep::RepoFetch, response)?.json().await?)
    }

    async fn get_branch_head(&self, branch: &str) -> Result<Option<String>, SyncError> {
        let url = self.repo_url_with(&["git", "ref", "heads"], branch);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if self.rate_limited(&response).is_none()
            && (status == StatusCode::NOT_FOUND || status == StatusCode::CONFLICT)
        {
            debug!(branch, status = status.as_u16(), "Branch ref absent, repository is empty");
            return Ok(None);
        }
        let head: GitRef = self.check(ApiStep::BranchFetch, response)?.json().await?;
        Ok(Some(head.object.sha))
    }

    async fn get_commit(&self, sha: &str) -> Result<CommitInfo, SyncError> {
        let response = self.http.get(self.repo_url(&["git", "commits", sha])).send().await?;
        Ok(self.check(ApiStep::CommitFetch, response)?.json().await?)
    }

    async fn get_tree_recursive(&self, tree_sha: &str) -> Result<TreeListing, SyncError> {
        let mut url = self.repo_url(&["git", "trees", tree_sha]);
        url.query_pairs_mut().append_pair("recursive", "1");
        let response = self.http.get(url).send().await?;
        Ok(self.check(ApiStep::TreeFetch, response)?.json().await?)
    }

    async fn get_file(&self, path: &str) -> Result<Option<String>, SyncError> {
        self.fetch_file(path, false).await
    }

    async fn get_file_raw(&self, path: &str) -> Result<Option<String>, SyncError> {
        self.fetch_file(path, true).await
    }

    async fn create_tree(&self, items: &[NewTreeItem]) -> Result<String, SyncError> {
        let response = self
            .http
            .post(self.repo_url(&["git", "trees"]))
            .json(&NewTree { tree: items })
            .send()
            .await?;
        let created: ShaResponse = self.check(ApiStep::TreeCreate, response)?.json().await?;
        Ok(created.sha)
    }

    async fn create_commit(&self, commit: &NewCommit) -> Result<String, SyncError> {
        let response = self
            .http
            .post(self.repo_url(&["git", "commits"]))
            .json(commit)
            .send()
            .await?;
        let created: ShaResponse = self.check(ApiStep::CommitCreate, response)?.json().await?;
        Ok(created.sha)
    }

    async fn update_ref(&self, branch: &str, sha: &str, force: bool) -> Result<(), SyncError> {
        let url = self.repo_url_with(&["git", "refs", "heads"], branch);
        let response = self
            .http
            .patch(url)
            .json(&UpdateRef { sha, force })
            .send()
            .await?;
        self.check(ApiStep::RefUpdate, response)?;
        Ok(())
    }

    async fn create_ref(&self, branch: &str, sha: &str) -> Result<(), SyncError> {
        let response = self
            .http
            .post(self.repo_url(&["git", "refs"]))
            .json(&CreateRef {
                reference: format!("refs/heads/{}", branch),
                sha,
            })
            .send()
            .await?;
        self.check(ApiStep::RefUpdate, response)?;
        Ok(())
    }
}
