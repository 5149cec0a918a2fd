//! Drives one page: reacts to navigation and clicks, fetches sizes and
//! writes them into the page.

use tokio::sync::mpsc;

use crate::analysis::context::{self, RepoContext};
use crate::analysis::{folder_sizes, humanize, size_label, RenderConfig, SizeMeasure};
use crate::api::RepoApi;
use crate::error::RepoSizeError;
use crate::page::{
    CellKind, ListingRow, Page, ReadyPolicy, SizeCell, SummaryView, LOADING, SELECTOR_ID,
    SUMMARY_ID, SUMMARY_TITLE,
};
use crate::types::{Listing, RepoSummary};

/// Something the user or the host page did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// Initial load or a client-side navigation finished.
    Navigated,
    SummaryClicked,
    /// A folder's size cell was clicked; carries the folder name.
    FolderClicked(String),
    UnitSelected(SizeMeasure),
}

/// Lifecycle of the summary element within one page view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryState {
    #[default]
    Uninitialized,
    /// Repository size shown, click loads folder sizes.
    Collapsed { bytes: u64 },
    Loading { bytes: u64 },
    Expanded { bytes: u64 },
}

impl SummaryState {
    pub fn view(&self, render: &RenderConfig) -> Option<SummaryView> {
        match *self {
            SummaryState::Uninitialized => None,
            SummaryState::Collapsed { bytes } => Some(SummaryView {
                text: humanize(bytes, render.unit).to_string(),
                title: Some(SUMMARY_TITLE.to_string()),
                clickable: true,
            }),
            SummaryState::Loading { .. } => Some(SummaryView {
                text: LOADING.to_string(),
                title: None,
                clickable: false,
            }),
            SummaryState::Expanded { bytes } => Some(SummaryView {
                text: humanize(bytes, render.unit).to_string(),
                title: None,
                clickable: false,
            }),
        }
    }
}

/// State between two navigation events.
#[derive(Debug, Default)]
struct PageView {
    context: Option<RepoContext>,
    summary: SummaryState,
    listing: Option<Listing>,
}

pub struct Annotator<A, P> {
    api: A,
    page: P,
    render: RenderConfig,
    ready: ReadyPolicy,
    view: PageView,
}

fn row_cell(row: &ListingRow, listing: &Listing, render: &RenderConfig) -> SizeCell {
    if row.up_tree {
        return SizeCell::parent();
    }
    match listing.get(row.key()) {
        Some(entry) if entry.is_dir() => SizeCell::folder_placeholder(),
        Some(entry) => SizeCell::file(size_label(entry.size, render)),
        None => SizeCell::file(String::new()),
    }
}

impl<A, P> Annotator<A, P>
where
    A: RepoApi,
    P: Page,
{
    pub fn new(api: A, page: P, render: RenderConfig, ready: ReadyPolicy) -> Self {
        Self {
            api,
            page,
            render,
            ready,
            view: PageView::default(),
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn render(&self) -> RenderConfig {
        self.render
    }

    pub fn summary_state(&self) -> SummaryState {
        self.view.summary
    }

    pub fn context(&self) -> Option<&RepoContext> {
        self.view.context.as_ref()
    }

    /// Handles one event. Failures are logged and leave the page as it was.
    pub async fn handle(&mut self, event: PageEvent) {
        tracing::debug!(?event, "page event");
        let result = match event {
            PageEvent::Navigated => self.on_navigation().await,
            PageEvent::SummaryClicked => self.on_summary_click().await,
            PageEvent::FolderClicked(name) => self.on_folder_click(&name).await,
            PageEvent::UnitSelected(unit) => self.select_unit(unit).await,
        };

        match result {
            Ok(()) => {}
            Err(e) if e.is_expected() => tracing::debug!(reason = %e, "annotation skipped"),
            Err(e) => tracing::warn!(error = %e, "annotation failed"),
        }
    }

    /// Handles events in order until every sender is gone.
    pub async fn run(&mut self, mut events: mpsc::Receiver<PageEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        tracing::debug!("event channel closed");
    }

    /// Fails with [`RepoSizeError::Stale`] once the page no longer shows `ctx`.
    fn ensure_current(&self, ctx: &RepoContext) -> Result<(), RepoSizeError> {
        match context::extract(&self.page) {
            Some(current) if &current == ctx => Ok(()),
            _ => Err(RepoSizeError::Stale),
        }
    }

    fn current_context(&self) -> Result<RepoContext, RepoSizeError> {
        let ctx = self
            .view
            .context
            .clone()
            .ok_or(RepoSizeError::ContextUnavailable)?;
        self.ensure_current(&ctx)?;
        Ok(ctx)
    }

    fn set_summary(&mut self, state: SummaryState) {
        self.view.summary = state;
        if let Some(view) = state.view(&self.render) {
            self.page.update_summary(view);
        }
    }

    pub async fn on_navigation(&mut self) -> Result<(), RepoSizeError> {
        let previous = std::mem::take(&mut self.view);
        let ctx = context::extract(&self.page).ok_or(RepoSizeError::ContextUnavailable)?;
        tracing::info!(context = %ctx, "repository page");

        // Same document re-announced: injected elements survived, keep their state.
        if previous.context.as_ref() == Some(&ctx) {
            if self.page.has_element(SUMMARY_ID) {
                self.view.summary = previous.summary;
            }
            if self.page.has_size_cells() {
                self.view.listing = previous.listing;
            }
        }
        self.view.context = Some(ctx.clone());

        self.ensure_unit_selector();

        let want_summary = self.page.has_summary_container() && !self.page.has_element(SUMMARY_ID);
        let want_listing = !self.page.has_size_cells();

        let api = &self.api;
        let (summary, listing) = tokio::join!(
            async {
                if want_summary {
                    Some(api.fetch_summary(&ctx.repo).await)
                } else {
                    None
                }
            },
            async {
                if want_listing {
                    Some(api.fetch_listing(&ctx.repo, &ctx.git_ref, &ctx.path).await)
                } else {
                    None
                }
            },
        );

        let summary_result = match summary {
            Some(result) => result.and_then(|summary| self.show_summary(&ctx, &summary)),
            None => Ok(()),
        };
        let listing_result = match listing {
            Some(Ok(entries)) => self.annotate_rows(&ctx, entries.into_iter().collect()).await,
            Some(Err(e)) => Err(e),
            None => Ok(()),
        };

        // Both halves run to completion; the first failure is reported.
        summary_result.and(listing_result)
    }

    fn ensure_unit_selector(&self) {
        if self.page.has_commit_info() && !self.page.has_element(SELECTOR_ID) {
            self.page
                .insert_unit_selector(&SizeMeasure::ALL, self.render.unit);
        }
    }

    fn show_summary(&mut self, ctx: &RepoContext, summary: &RepoSummary) -> Result<(), RepoSizeError> {
        self.ensure_current(ctx)?;
        if summary.size_kb == 0 {
            tracing::debug!(repo = %ctx.repo, "repository reports no size");
            return Ok(());
        }
        if !self.page.has_summary_container() || self.page.has_element(SUMMARY_ID) {
            return Ok(());
        }

        let state = SummaryState::Collapsed {
            bytes: summary.size_bytes(),
        };
        if let Some(view) = state.view(&self.render) {
            self.page.insert_summary(view);
        }
        self.view.summary = state;
        Ok(())
    }

    async fn annotate_rows(&mut self, ctx: &RepoContext, listing: Listing) -> Result<(), RepoSizeError> {
        let page = &self.page;
        let rows = self
            .ready
            .wait_for(|| page.rows())
            .await
            .ok_or(RepoSizeError::DomNotReady)?;
        self.ensure_current(ctx)?;

        if rows.iter().any(|row| row.cell.is_some()) {
            return Ok(());
        }

        for (index, row) in rows.iter().enumerate() {
            self.page.set_cell(index, row_cell(row, &listing, &self.render));
        }
        tracing::debug!(rows = rows.len(), entries = listing.len(), "rows annotated");
        self.view.listing = Some(listing);
        Ok(())
    }

    async fn on_summary_click(&mut self) -> Result<(), RepoSizeError> {
        if !matches!(self.view.summary, SummaryState::Collapsed { .. }) {
            return Ok(());
        }
        self.load_folder_sizes().await
    }

    async fn on_folder_click(&mut self, name: &str) -> Result<(), RepoSizeError> {
        let clickable = self.page.rows().into_iter().flatten().any(|row| {
            row.key() == name
                && row
                    .cell
                    .as_ref()
                    .is_some_and(|cell| cell.kind == CellKind::Folder && cell.clickable)
        });
        if !clickable {
            return Ok(());
        }
        self.load_folder_sizes().await
    }

    /// Fetches the recursive tree once and fills in every folder cell.
    pub async fn load_folder_sizes(&mut self) -> Result<(), RepoSizeError> {
        let ctx = self.current_context()?;

        if let SummaryState::Collapsed { bytes } = self.view.summary {
            self.set_summary(SummaryState::Loading { bytes });
        }
        for (index, row) in self.page.rows().into_iter().flatten().enumerate() {
            if row.cell.as_ref().is_some_and(|cell| cell.kind == CellKind::Folder) {
                self.page.set_cell(index, SizeCell::folder(LOADING.to_string()));
            }
        }

        let tree = self.api.fetch_tree(&ctx.repo, &ctx.git_ref).await?;
        if tree.truncated {
            tracing::warn!(repo = %ctx.repo, "tree data truncated, folder sizes may be incomplete");
        }
        self.ensure_current(&ctx)?;

        let sizes = folder_sizes(&tree.entries, &ctx.path);
        let rows = self.page.rows().ok_or(RepoSizeError::DomNotReady)?;
        for (index, row) in rows.iter().enumerate() {
            if row.cell.as_ref().is_some_and(|cell| cell.kind == CellKind::Folder) {
                let label = size_label(sizes.get(row.key()).copied(), &self.render);
                self.page.set_cell(index, SizeCell::folder(label));
            }
        }
        tracing::debug!(folders = sizes.len(), "folder sizes loaded");

        if let SummaryState::Loading { bytes } = self.view.summary {
            self.set_summary(SummaryState::Expanded { bytes });
        }
        Ok(())
    }

    /// Switches the unit and re-renders file rows; folder cells keep their text.
    pub async fn select_unit(&mut self, unit: SizeMeasure) -> Result<(), RepoSizeError> {
        self.render.unit = unit;
        tracing::debug!(%unit, "unit selected");

        let ctx = self.current_context()?;
        if !self.page.has_size_cells() {
            return Ok(());
        }

        let listing = match self.view.listing.take() {
            Some(listing) => listing,
            None => {
                let entries = self
                    .api
                    .fetch_listing(&ctx.repo, &ctx.git_ref, &ctx.path)
                    .await?;
                self.ensure_current(&ctx)?;
                entries.into_iter().collect()
            }
        };

        if let Some(rows) = self.page.rows() {
            for (index, row) in rows.iter().enumerate() {
                if row.cell.as_ref().is_some_and(|cell| cell.kind == CellKind::File) {
                    self.page.set_cell(index, row_cell(row, &listing, &self.render));
                }
            }
        }
        self.view.listing = Some(listing);
        Ok(())
    }
}
