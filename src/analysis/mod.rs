pub mod context;
pub mod folders;
pub mod size;

pub use context::RepoContext;
pub use folders::folder_sizes;
pub use size::{humanize, size_label, HumanSize, RenderConfig, SizeMeasure};
