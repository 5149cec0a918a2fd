use std::fmt;
use std::sync::OnceLock;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use reqwest::Url;
use serde::Serialize;

use crate::page::Page;

const WEB_BASE: &str = "https://github.com";

/// Bytes escaped when a segment is written back into a permalink.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn github_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| Regex::new(r"^https?://github\.com/").expect("static regex"))
}

/// Repository, ref and sub-path currently being browsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoContext {
    /// `owner/name`
    pub repo: String,
    pub git_ref: String,
    /// Relative to the repository root, without leading or trailing `/`.
    pub path: String,
}

/// Decoded, non-empty path segments of `href` after the host. Query string
/// and fragment are dropped; `None` for other hosts or invalid UTF-8.
fn segments(href: &str) -> Option<Vec<String>> {
    if !github_prefix().is_match(href) {
        return None;
    }
    let url = Url::parse(href).ok()?;
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .map(|s| percent_decode_str(s).decode_utf8().ok().map(|d| d.into_owned()))
        .collect()
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|s| utf8_percent_encode(s, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

impl RepoContext {
    /// Parses a permalink of the form `https://github.com/<owner>/<name>/tree/<ref>/<path...>`.
    pub fn from_permalink(href: &str) -> Option<Self> {
        let parts = segments(href.trim())?;
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        match parts.as_slice() {
            [owner, name, "tree", git_ref, path @ ..] => Some(Self {
                repo: format!("{}/{}", owner, name),
                git_ref: (*git_ref).to_string(),
                path: path.join("/"),
            }),
            _ => None,
        }
    }

    /// Like [`RepoContext::from_permalink`], but also accepts a bare repository URL,
    /// taking the ref from `default_ref`.
    pub fn from_url(url: &str, default_ref: &str) -> Option<Self> {
        if let Some(context) = Self::from_permalink(url) {
            return Some(context);
        }
        let parts = segments(url.trim())?;
        match parts.as_slice() {
            [owner, name] if !default_ref.is_empty() => Some(Self {
                repo: format!("{}/{}", owner, name.trim_end_matches(".git")),
                git_ref: default_ref.to_string(),
                path: String::new(),
            }),
            _ => None,
        }
    }

    /// `owner/name` of a repository URL, with or without a `tree/<ref>` suffix.
    pub fn repo_of_url(url: &str) -> Option<String> {
        let parts = segments(url.trim())?;
        match parts.as_slice() {
            [owner, name, ..] => Some(format!("{}/{}", owner, name.trim_end_matches(".git"))),
            _ => None,
        }
    }

    pub fn permalink(&self) -> String {
        if self.path.is_empty() {
            format!("{}/{}/tree/{}", WEB_BASE, encode_path(&self.repo), encode_path(&self.git_ref))
        } else {
            format!(
                "{}/{}/tree/{}/{}",
                WEB_BASE,
                encode_path(&self.repo),
                encode_path(&self.git_ref),
                encode_path(&self.path)
            )
        }
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }
}

impl fmt::Display for RepoContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}:/{}", self.repo, self.git_ref, self.path)
    }
}

/// Context of the page currently shown, or `None` off repository tree views.
pub fn extract<P: Page + ?Sized>(page: &P) -> Option<RepoContext> {
    page.permalink_href()
        .as_deref()
        .and_then(RepoContext::from_permalink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_root_and_nested_paths() {
        let root = RepoContext::from_permalink("https://github.com/rust-lang/rust/tree/abc123").unwrap();
        assert_eq!(root.repo, "rust-lang/rust");
        assert_eq!(root.git_ref, "abc123");
        assert_eq!(root.path, "");
        assert!(root.is_root());

        let nested =
            RepoContext::from_permalink("http://github.com/o/n/tree/main/src/bin/").unwrap();
        assert_eq!(nested.path, "src/bin");
        assert_eq!(nested.permalink(), "https://github.com/o/n/tree/main/src/bin");
    }

    #[test]
    fn ignores_query_and_fragment() {
        let ctx = RepoContext::from_permalink("https://github.com/o/n/tree/v1/docs?plain=1#top").unwrap();
        assert_eq!(ctx.git_ref, "v1");
        assert_eq!(ctx.path, "docs");
    }

    #[test]
    fn rejects_everything_else() {
        for href in [
            "",
            "https://gitlab.com/o/n/tree/main",
            "https://github.com/o/n",
            "https://github.com/o/n/blob/main/README.md",
            "https://github.com/o/n/tree",
            "https://github.com/o/n/tree/",
            "https://github.com/o",
            "ftp://github.com/o/n/tree/main",
        ] {
            assert_eq!(RepoContext::from_permalink(href), None, "{}", href);
        }
    }

    #[test]
    fn decodes_escaped_segments() {
        let ctx = RepoContext::from_permalink(
            "https://github.com/o/n/tree/r%C3%A9lease/my%20dir/caf%C3%A9",
        )
        .unwrap();
        assert_eq!(ctx.git_ref, "rélease");
        assert_eq!(ctx.path, "my dir/café");
        assert_eq!(
            ctx.permalink(),
            "https://github.com/o/n/tree/r%C3%A9lease/my%20dir/caf%C3%A9"
        );
        assert_eq!(RepoContext::from_permalink(&ctx.permalink()), Some(ctx));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert_eq!(RepoContext::from_permalink("https://github.com/o/n/tree/main/%FF%FE"), None);
    }

    #[test]
    fn from_url_falls_back_to_default_ref() {
        let ctx = RepoContext::from_url("https://github.com/o/n.git", "trunk").unwrap();
        assert_eq!(ctx.repo, "o/n");
        assert_eq!(ctx.git_ref, "trunk");

        let explicit = RepoContext::from_url("https://github.com/o/n/tree/dev/src", "trunk").unwrap();
        assert_eq!(explicit.git_ref, "dev");
        assert_eq!(explicit.path, "src");

        assert_eq!(RepoContext::from_url("https://github.com/o/n", ""), None);
        assert_eq!(RepoContext::repo_of_url("https://github.com/o/n/tree/x").as_deref(), Some("o/n"));
    }
}
