use std::collections::HashMap;

use serde::Serialize;

pub mod github;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// One row of a flat `contents` listing.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Only set for files.
    pub size: Option<u64>,
}

impl DirectoryEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// Directory entries keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    entries: HashMap<String, DirectoryEntry>,
}

impl Listing {
    pub fn get(&self, name: &str) -> Option<&DirectoryEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<DirectoryEntry> for Listing {
    fn from_iter<I: IntoIterator<Item = DirectoryEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|e| (e.name.clone(), e)).collect(),
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TreeKind {
    Blob,
    Tree,
}

/// One entry of a recursive tree, path relative to the repository root.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub kind: TreeKind,
    /// Only set for blobs.
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
    /// The API dropped entries to stay under its response limit.
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSummary {
    pub size_kb: u64,
    pub default_branch: Option<String>,
}

impl RepoSummary {
    pub fn size_bytes(&self) -> u64 {
        self.size_kb.saturating_mul(1024)
    }
}
