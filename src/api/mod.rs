use async_trait::async_trait;

use crate::error::RepoSizeError;
use crate::types::{DirectoryEntry, RepoSummary, Tree};

pub mod client;

pub use client::GithubClient;

/// Read-only view of the remote repository API.
#[async_trait]
pub trait RepoApi: Send + Sync {
    /// `GET /repos/{repo}`
    async fn fetch_summary(&self, repo: &str) -> Result<RepoSummary, RepoSizeError>;

    /// `GET /repos/{repo}/contents/{path}?ref={git_ref}`
    async fn fetch_listing(
        &self,
        repo: &str,
        git_ref: &str,
        path: &str,
    ) -> Result<Vec<DirectoryEntry>, RepoSizeError>;

    /// `GET /repos/{repo}/git/trees/{git_ref}?recursive=1`
    async fn fetch_tree(&self, repo: &str, git_ref: &str) -> Result<Tree, RepoSizeError>;
}
