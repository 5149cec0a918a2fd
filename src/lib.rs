//! Annotates repository directory listings with file and folder sizes
//! fetched from the GitHub REST API.

pub mod analysis;
pub mod annotator;
pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod page;
pub mod settings;
pub mod types;

pub use annotator::{Annotator, PageEvent, SummaryState};
pub use error::RepoSizeError;
