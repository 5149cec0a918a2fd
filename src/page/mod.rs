//! Page-integration layer: what the annotator needs from the host page.
//!
//! The host page owns the document; implementations hand out a cheap handle
//! with interior mutability so the page can change while a request is in
//! flight, just like a live DOM.

use serde::Serialize;

use crate::analysis::SizeMeasure;

pub mod memory;
pub mod ready;

pub use memory::MemoryPage;
pub use ready::ReadyPolicy;

/// Id of the summary element appended to the repository summary list.
pub const SUMMARY_ID: &str = "github-repo-size";
/// Id of the unit selector appended to the commit-info container.
pub const SELECTOR_ID: &str = "github-repo-select";

pub const SUMMARY_TITLE: &str = "Click to load folder sizes";
pub const FOLDER_TITLE: &str = "Click to load folder size";
pub const FOLDER_PLACEHOLDER: &str = "···";
pub const LOADING: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryView {
    pub text: String,
    pub title: Option<String>,
    pub clickable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorView {
    pub options: Vec<String>,
    pub selected: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    File,
    Folder,
    Parent,
}

/// Size column injected into a listing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeCell {
    pub kind: CellKind,
    pub text: String,
    /// Tooltip, only while the cell is clickable.
    pub title: Option<String>,
    pub clickable: bool,
}

impl SizeCell {
    pub fn file(text: String) -> Self {
        Self {
            kind: CellKind::File,
            text,
            title: None,
            clickable: false,
        }
    }

    pub fn folder_placeholder() -> Self {
        Self {
            kind: CellKind::Folder,
            text: FOLDER_PLACEHOLDER.to_string(),
            title: Some(FOLDER_TITLE.to_string()),
            clickable: true,
        }
    }

    pub fn folder(text: String) -> Self {
        Self {
            kind: CellKind::Folder,
            text,
            title: None,
            clickable: false,
        }
    }

    pub fn parent() -> Self {
        Self {
            kind: CellKind::Parent,
            text: String::new(),
            title: None,
            clickable: false,
        }
    }
}

/// One row of the rendered directory table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRow {
    /// Link text as displayed; collapsed folders read `a/b/c`.
    pub name: String,
    /// The `..` row leading to the parent directory.
    pub up_tree: bool,
    pub cell: Option<SizeCell>,
}

impl ListingRow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            up_tree: false,
            cell: None,
        }
    }

    pub fn up_tree() -> Self {
        Self {
            name: "..".to_string(),
            up_tree: true,
            cell: None,
        }
    }

    /// Name of the directory entry this row stands for.
    pub fn key(&self) -> &str {
        self.name.trim().split('/').next().unwrap_or_default()
    }
}

pub trait Page {
    /// `href` of the permalink anchor, when the page has one.
    fn permalink_href(&self) -> Option<String>;

    fn has_element(&self, id: &str) -> bool;

    /// Repository summary list the summary element is appended to.
    fn has_summary_container(&self) -> bool;

    /// Container the unit selector is appended to.
    fn has_commit_info(&self) -> bool;

    /// Rows of the directory table, `None` while the table is not rendered.
    fn rows(&self) -> Option<Vec<ListingRow>>;

    fn insert_summary(&self, view: SummaryView);

    fn update_summary(&self, view: SummaryView);

    fn insert_unit_selector(&self, options: &[SizeMeasure], selected: SizeMeasure);

    /// Sets the size cell of the row at `index` in [`Page::rows`] order.
    fn set_cell(&self, index: usize, cell: SizeCell);

    fn has_size_cells(&self) -> bool {
        self.rows()
            .map(|rows| rows.iter().any(|row| row.cell.is_some()))
            .unwrap_or(false)
    }
}
