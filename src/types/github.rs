use serde::Deserialize;

use super::{DirectoryEntry, EntryKind, RepoSummary, Tree, TreeEntry, TreeKind};

#[derive(Debug, Deserialize)]
pub struct GithubRepo {
    /// Reported in kilobytes.
    #[serde(default)]
    pub size: u64,
    pub default_branch: Option<String>,
}

impl From<GithubRepo> for RepoSummary {
    fn from(repo: GithubRepo) -> Self {
        RepoSummary {
            size_kb: repo.size,
            default_branch: repo.default_branch,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GithubContent {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "type")]
    pub content_type: String,
}

impl From<GithubContent> for DirectoryEntry {
    fn from(content: GithubContent) -> Self {
        // Files, symlinks and submodules all render as sized rows.
        if content.content_type == "dir" {
            DirectoryEntry {
                name: content.name,
                kind: EntryKind::Dir,
                size: None,
            }
        } else {
            DirectoryEntry {
                name: content.name,
                kind: EntryKind::File,
                size: Some(content.size),
            }
        }
    }
}

/// `contents` answers with an array for directories and a bare object for files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GithubContents {
    Dir(Vec<GithubContent>),
    File(GithubContent),
}

impl GithubContents {
    pub fn into_entries(self) -> Vec<DirectoryEntry> {
        match self {
            GithubContents::Dir(items) => items.into_iter().map(DirectoryEntry::from).collect(),
            GithubContents::File(item) => vec![item.into()],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GithubTreeItem {
    pub path: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct GithubTree {
    #[serde(default)]
    pub truncated: bool,
    #[serde(default)]
    pub tree: Vec<GithubTreeItem>,
}

impl From<GithubTree> for Tree {
    fn from(tree: GithubTree) -> Self {
        let entries = tree
            .tree
            .into_iter()
            .filter_map(|item| {
                // Commits (submodules) carry no size and never count.
                let kind = match item.item_type.as_str() {
                    "blob" => TreeKind::Blob,
                    "tree" => TreeKind::Tree,
                    _ => return None,
                };
                Some(TreeEntry {
                    path: item.path,
                    kind,
                    size: if kind == TreeKind::Blob { item.size } else { None },
                })
            })
            .collect();

        Tree {
            entries,
            truncated: tree.truncated,
        }
    }
}
