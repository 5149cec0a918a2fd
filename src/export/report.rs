use serde::Serialize;

use crate::analysis::{RepoContext, SizeMeasure};
use crate::page::memory::PageState;
use crate::page::CellKind;

#[derive(Debug, Serialize, Clone)]
pub struct ReportRow {
    pub name: String,
    pub kind: Option<CellKind>,
    pub size: String,
}

/// Annotated listing as shown on the page, ready to print.
#[derive(Debug, Serialize, Clone)]
pub struct ListingReport {
    pub repo: String,
    pub git_ref: String,
    pub path: String,
    pub unit: String,
    pub total: Option<String>,
    pub rows: Vec<ReportRow>,
}

impl ListingReport {
    pub fn from_page(ctx: &RepoContext, state: &PageState, unit: SizeMeasure) -> Self {
        let rows = state
            .rows
            .iter()
            .flatten()
            .map(|row| ReportRow {
                name: row.name.clone(),
                kind: row.cell.as_ref().map(|c| c.kind),
                size: row.cell.as_ref().map(|c| c.text.clone()).unwrap_or_default(),
            })
            .collect();

        Self {
            repo: ctx.repo.clone(),
            git_ref: ctx.git_ref.clone(),
            path: ctx.path.clone(),
            unit: unit.to_string(),
            total: state.summary.as_ref().map(|s| s.text.clone()),
            rows,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_table(&self) -> String {
        let name_width = self
            .rows
            .iter()
            .map(|r| r.name.chars().count())
            .max()
            .unwrap_or(0)
            .max(4);

        let mut out = format!("{} @ {} /{}\n", self.repo, self.git_ref, self.path);
        if let Some(total) = &self.total {
            out.push_str(&format!("total: {}\n", total));
        }
        for row in &self.rows {
            let marker = if row.kind == Some(CellKind::Folder) { "/" } else { "" };
            let name = format!("{}{}", row.name, marker);
            out.push_str(&format!("  {:<width$}  {:>12}\n", name, row.size, width = name_width + 1));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{ListingRow, Page, SizeCell, SummaryView, MemoryPage};

    fn page() -> (RepoContext, MemoryPage) {
        let ctx = RepoContext::from_permalink("https://github.com/o/n/tree/main").unwrap();
        let page = MemoryPage::repository(ctx.permalink(), vec![ListingRow::new("src"), ListingRow::new("a.txt")]);
        page.insert_summary(SummaryView {
            text: "2 KB".into(),
            title: None,
            clickable: false,
        });
        page.set_cell(0, SizeCell::folder("1 KB".into()));
        page.set_cell(1, SizeCell::file("12 B".into()));
        (ctx, page)
    }

    #[test]
    fn table_lists_rows_with_folder_marker() {
        let (ctx, page) = page();
        let report = ListingReport::from_page(&ctx, &page.snapshot(), SizeMeasure::Auto);
        let table = report.render_table();
        assert!(table.starts_with("o/n @ main /\ntotal: 2 KB\n"));
        assert!(table.contains("src/"));
        assert!(table.contains("1 KB"));
        assert!(table.contains("a.txt"));
        assert!(!table.contains("a.txt/"));
    }

    #[test]
    fn json_carries_kinds() {
        let (ctx, page) = page();
        let report = ListingReport::from_page(&ctx, &page.snapshot(), SizeMeasure::KB);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["unit"], "KB");
        assert_eq!(value["rows"][0]["kind"], "folder");
        assert_eq!(value["rows"][1]["size"], "12 B");
    }
}
