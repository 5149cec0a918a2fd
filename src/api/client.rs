use async_trait::async_trait;
use reqwest::{header, Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::RepoApi;
use crate::error::RepoSizeError;
use crate::settings::TokenCache;
use crate::types::github::{GithubContents, GithubRepo, GithubTree};
use crate::types::{DirectoryEntry, RepoSummary, Tree};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = "repo-size";

pub struct GithubClient {
    client: Client,
    base: Url,
    user_agent: String,
    token: TokenCache,
}

impl GithubClient {
    pub fn new(api_base: &str, user_agent: &str, token: TokenCache) -> Result<Self, RepoSizeError> {
        let base = Url::parse(api_base)
            .map_err(|e| RepoSizeError::Config(format!("invalid api_base {}: {}", api_base, e)))?;
        if base.cannot_be_a_base() {
            return Err(RepoSizeError::Config(format!("invalid api_base {}", api_base)));
        }

        if token.get().is_some() {
            tracing::info!("using authenticated GitHub API requests");
        } else {
            tracing::warn!("using unauthenticated GitHub API requests; set an access token to raise rate limits");
        }

        Ok(Self {
            client: Client::new(),
            base,
            user_agent: user_agent.to_string(),
            token,
        })
    }

    fn build_headers(&self) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        let agent = header::HeaderValue::from_str(&self.user_agent)
            .unwrap_or_else(|_| header::HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers.insert(header::USER_AGENT, agent);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );

        // Read per request so a token change applies to the next call.
        if let Some(token) = self.token.get() {
            match header::HeaderValue::from_str(&format!("token {}", token)) {
                Ok(value) => {
                    headers.insert(header::AUTHORIZATION, value);
                }
                Err(_) => tracing::warn!("access token is not a valid header value; sending request without it"),
            }
        }

        headers
    }

    /// `{base}/repos/{owner}/{name}/{tail...}`
    fn repo_url(&self, repo: &str, tail: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("repos");
            segments.extend(repo.split('/').filter(|s| !s.is_empty()));
            segments.extend(tail.iter().flat_map(|t| t.split('/')).filter(|s| !s.is_empty()));
        }
        url
    }

    async fn get_json<T>(&self, url: Url) -> Result<T, RepoSizeError>
    where
        T: DeserializeOwned,
    {
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .headers(self.build_headers())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| RepoSizeError::ParseError(e.to_string()));
        }

        if matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS) {
            let header_u64 = |name: &str| {
                response
                    .headers()
                    .get(name)
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
            };
            if header_u64("x-ratelimit-remaining") == Some(0) {
                return Err(RepoSizeError::RateLimited {
                    reset: header_u64("x-ratelimit-reset").unwrap_or(0),
                });
            }
        }

        Err(RepoSizeError::Http {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl RepoApi for GithubClient {
    async fn fetch_summary(&self, repo: &str) -> Result<RepoSummary, RepoSizeError> {
        let url = self.repo_url(repo, &[]);
        let repo: GithubRepo = self.get_json(url).await?;
        Ok(repo.into())
    }

    async fn fetch_listing(
        &self,
        repo: &str,
        git_ref: &str,
        path: &str,
    ) -> Result<Vec<DirectoryEntry>, RepoSizeError> {
        let mut url = self.repo_url(repo, &["contents", path]);
        url.query_pairs_mut().append_pair("ref", git_ref);
        let contents: GithubContents = self.get_json(url).await?;
        Ok(contents.into_entries())
    }

    async fn fetch_tree(&self, repo: &str, git_ref: &str) -> Result<Tree, RepoSizeError> {
        let mut url = self.repo_url(repo, &["git", "trees"]);
        if let Ok(mut segments) = url.path_segments_mut() {
            // Refs like `feature/x` stay a single segment here.
            segments.push(git_ref);
        }
        url.query_pairs_mut().append_pair("recursive", "1");
        let tree: GithubTree = self.get_json(url).await?;
        Ok(tree.into())
    }
}
