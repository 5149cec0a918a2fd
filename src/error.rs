use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoSizeError {
    #[error("current page is not a repository tree view")]
    ContextUnavailable,
    #[error("GitHub returned an invalid status: {status} ({url})")]
    Http { status: u16, url: String },
    #[error("Rate limit exceeded. Resets at timestamp: {reset}")]
    RateLimited { reset: u64 },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("listing rows not rendered")]
    DomNotReady,
    #[error("page changed while a request was in flight")]
    Stale,
    #[error("Config error: {0}")]
    Config(String),
}

impl RepoSizeError {
    /// Early exits that are part of normal operation rather than failures.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            RepoSizeError::ContextUnavailable | RepoSizeError::DomNotReady | RepoSizeError::Stale
        )
    }
}

impl From<reqwest::Error> for RepoSizeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RepoSizeError::ParseError(e.to_string())
        } else {
            RepoSizeError::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn early_exits_are_expected() {
        assert!(RepoSizeError::ContextUnavailable.is_expected());
        assert!(RepoSizeError::DomNotReady.is_expected());
        assert!(RepoSizeError::Stale.is_expected());
        assert!(!RepoSizeError::Http { status: 404, url: "u".into() }.is_expected());
        assert!(!RepoSizeError::Config("bad".into()).is_expected());
    }
}
