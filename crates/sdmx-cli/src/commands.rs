use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::info_span;

use sdmx_cli::{RunConfig, RunSummary, run_pipeline};

use crate::cli::{ConfigArgs, RunArgs};
use crate::summary::apply_table_style;

/// Result of a run that got past configuration loading.
pub struct RunOutcome {
    pub summary: RunSummary,
    /// The fatal error that stopped the run early, if any.
    pub error: Option<anyhow::Error>,
}

pub fn run_organizations(args: &ConfigArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let generator = config.generator_config();
    let mut table = Table::new();
    table.set_header(vec!["Organization", "Label", "Prefix", "Base URI"]);
    apply_table_style(&mut table);
    for (id, org) in generator.organizations.iter() {
        table.add_row(vec![
            id.to_string(),
            org.label.clone().unwrap_or_default(),
            org.prefix.clone().unwrap_or_else(|| generator.prefix.clone()),
            org.base_uri
                .clone()
                .unwrap_or_else(|| generator.base_uri.clone()),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run(args: &RunArgs) -> Result<RunOutcome> {
    let mut config = load_config(args.config.config.as_deref())?;
    if let Some(retrieval) = args.retrieval_override() {
        config.stages.retrieval = retrieval;
    }
    if let Some(analysis) = args.analysis_override() {
        config.stages.analysis = analysis;
    }

    let span = info_span!(
        "run",
        retrieval = config.stages.retrieval,
        analysis = config.stages.analysis
    );
    let _guard = span.enter();
    let mut summary = RunSummary::default();
    let error = run_pipeline(&config, &mut summary).err();
    if let Some(error) = &error {
        tracing::error!("run stopped: {error:#}");
    }
    Ok(RunOutcome { summary, error })
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display())),
        None => Ok(RunConfig::default()),
    }
}
