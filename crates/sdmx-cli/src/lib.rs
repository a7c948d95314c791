//! Pipeline library behind the `sdmx-codelists` binary.

pub mod config;
pub mod logging;
pub mod pipeline;
pub mod types;

pub use config::{RunConfig, StageToggles};
pub use pipeline::run_pipeline;
pub use types::RunSummary;
