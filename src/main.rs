use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;

use repo_size::analysis::{RenderConfig, RepoContext, SizeMeasure};
use repo_size::api::{GithubClient, RepoApi};
use repo_size::config::{self, AppConfig};
use repo_size::export::ListingReport;
use repo_size::logging::init_logging;
use repo_size::page::MemoryPage;
use repo_size::settings::{MemorySettings, TokenCache, ACCESS_TOKEN_KEY};
use repo_size::{Annotator, PageEvent};

/// Show a GitHub directory with file and folder sizes.
#[derive(Debug, Parser)]
#[command(name = "repo-size", version)]
struct Cli {
    /// Repository or directory URL, e.g. https://github.com/owner/name/tree/main/src
    url: String,

    /// Unit for sizes: AUTO, B, KB, MB, GB, TB, PB, EB, ZB or YB
    #[arg(short, long)]
    unit: Option<SizeMeasure>,

    /// Also load folder sizes (one recursive tree request)
    #[arg(short, long)]
    folders: bool,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Access token; overrides GITHUB_TOKEN and the config file
    #[arg(long)]
    token: Option<String>,

    /// Read configuration from this file instead of the XDG location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(path) => config::load_from(path),
        None => Ok(config::load_or_init().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using built-in config");
            AppConfig::default()
        })),
    }
}

/// Context for `url`, asking the API for the default branch when the URL has no ref.
async fn resolve_context(client: &GithubClient, url: &str) -> Result<RepoContext> {
    if let Some(ctx) = RepoContext::from_permalink(url) {
        return Ok(ctx);
    }
    let repo = RepoContext::repo_of_url(url)
        .with_context(|| format!("not a GitHub repository URL: {}", url))?;
    let summary = client.fetch_summary(&repo).await?;
    let branch = summary.default_branch.unwrap_or_else(|| "HEAD".to_string());
    RepoContext::from_url(url, &branch).with_context(|| format!("not a GitHub repository URL: {}", url))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = load_config(&cli)?;

    let settings = MemorySettings::new();
    let tokens = TokenCache::subscribe(&settings);
    if let Some(token) = cfg.resolve_token(cli.token.clone()) {
        settings.set(ACCESS_TOKEN_KEY, token);
    }

    let client = GithubClient::new(&cfg.api_base, &cfg.user_agent, tokens)?;
    let render = RenderConfig {
        unit: cli.unit.unwrap_or(cfg.default_unit),
    };

    let ctx = resolve_context(&client, &cli.url).await?;

    // Stand in for the host page: render the directory before annotating it.
    let entries = client
        .fetch_listing(&ctx.repo, &ctx.git_ref, &ctx.path)
        .await
        .with_context(|| format!("listing {}", ctx))?;
    let page = MemoryPage::from_listing(&ctx, &entries);
    let first_folder = entries.iter().find(|e| e.is_dir()).map(|e| e.name.clone());

    let mut annotator = Annotator::new(client, page.clone(), render, cfg.ready_policy());
    let (events, receiver) = mpsc::channel(4);
    events.send(PageEvent::Navigated).await?;
    if cli.folders {
        events.send(PageEvent::SummaryClicked).await?;
        // Covers repositories that report no total size; ignored once expanded.
        if let Some(name) = first_folder {
            events.send(PageEvent::FolderClicked(name)).await?;
        }
    }
    drop(events);
    annotator.run(receiver).await;

    let report = ListingReport::from_page(&ctx, &page.snapshot(), annotator.render().unit);
    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_table());
    }

    Ok(())
}
