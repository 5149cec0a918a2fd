use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use super::{ListingRow, Page, SelectorView, SizeCell, SummaryView, SELECTOR_ID, SUMMARY_ID};
use crate::analysis::{RepoContext, SizeMeasure};
use crate::types::DirectoryEntry;

/// Snapshot of everything a [`MemoryPage`] renders.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageState {
    pub permalink: Option<String>,
    pub summary_container: bool,
    pub commit_info: bool,
    /// Ids of injected elements, in insertion order.
    pub element_ids: Vec<String>,
    pub summary: Option<SummaryView>,
    pub selector: Option<SelectorView>,
    pub rows: Option<Vec<ListingRow>>,
}

/// In-process page model with the host page's attachment points.
///
/// Clones share the same document.
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    state: Arc<Mutex<PageState>>,
}

impl MemoryPage {
    /// An empty page with no repository anchors at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository tree view with every attachment point present.
    pub fn repository(permalink: impl Into<String>, rows: Vec<ListingRow>) -> Self {
        let page = Self::new();
        page.navigate(permalink, Some(rows));
        page
    }

    /// Renders a directory the way the host does: parent row below the root,
    /// folders first, then files, each group sorted case-insensitively.
    pub fn from_listing(ctx: &RepoContext, entries: &[DirectoryEntry]) -> Self {
        let mut sorted: Vec<&DirectoryEntry> = entries.iter().collect();
        sorted.sort_by_key(|e| (!e.is_dir(), e.name.to_lowercase()));

        let mut rows = Vec::with_capacity(sorted.len() + 1);
        if !ctx.is_root() {
            rows.push(ListingRow::up_tree());
        }
        rows.extend(sorted.into_iter().map(|e| ListingRow::new(e.name.clone())));
        Self::repository(ctx.permalink(), rows)
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replaces the document as a client-side navigation would.
    pub fn navigate(&self, permalink: impl Into<String>, rows: Option<Vec<ListingRow>>) {
        let mut state = self.state();
        *state = PageState {
            permalink: Some(permalink.into()),
            summary_container: true,
            commit_info: true,
            rows,
            ..PageState::default()
        };
    }

    /// Renders (or removes) the directory table without touching anything else.
    pub fn set_rows(&self, rows: Option<Vec<ListingRow>>) {
        self.state().rows = rows;
    }

    pub fn set_summary_container(&self, present: bool) {
        self.state().summary_container = present;
    }

    pub fn set_commit_info(&self, present: bool) {
        self.state().commit_info = present;
    }

    pub fn snapshot(&self) -> PageState {
        self.state().clone()
    }

    pub fn summary(&self) -> Option<SummaryView> {
        self.state().summary.clone()
    }

    pub fn selector(&self) -> Option<SelectorView> {
        self.state().selector.clone()
    }

    pub fn cells(&self) -> Vec<Option<SizeCell>> {
        self.state()
            .rows
            .iter()
            .flatten()
            .map(|row| row.cell.clone())
            .collect()
    }

    /// Cell of the row whose entry is `name`.
    pub fn cell(&self, name: &str) -> Option<SizeCell> {
        self.state()
            .rows
            .iter()
            .flatten()
            .find(|row| row.key() == name)
            .and_then(|row| row.cell.clone())
    }

    pub fn count_elements(&self, id: &str) -> usize {
        self.state().element_ids.iter().filter(|e| *e == id).count()
    }
}

impl Page for MemoryPage {
    fn permalink_href(&self) -> Option<String> {
        self.state().permalink.clone()
    }

    fn has_element(&self, id: &str) -> bool {
        self.state().element_ids.iter().any(|e| e == id)
    }

    fn has_summary_container(&self) -> bool {
        self.state().summary_container
    }

    fn has_commit_info(&self) -> bool {
        self.state().commit_info
    }

    fn rows(&self) -> Option<Vec<ListingRow>> {
        self.state().rows.clone()
    }

    fn insert_summary(&self, view: SummaryView) {
        let mut state = self.state();
        if !state.summary_container {
            return;
        }
        state.element_ids.push(SUMMARY_ID.to_string());
        state.summary = Some(view);
    }

    fn update_summary(&self, view: SummaryView) {
        if let Some(summary) = self.state().summary.as_mut() {
            *summary = view;
        }
    }

    fn insert_unit_selector(&self, options: &[SizeMeasure], selected: SizeMeasure) {
        let mut state = self.state();
        if !state.commit_info {
            return;
        }
        state.element_ids.push(SELECTOR_ID.to_string());
        state.selector = Some(SelectorView {
            options: options.iter().map(|m| m.label().to_string()).collect(),
            selected: selected.label().to_string(),
        });
    }

    fn set_cell(&self, index: usize, cell: SizeCell) {
        if let Some(row) = self.state().rows.as_mut().and_then(|rows| rows.get_mut(index)) {
            row.cell = Some(cell);
        }
    }
}
