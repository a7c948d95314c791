//! Stage orchestration: retrieve, flatten, analyze, generate, check.
//!
//! Each stage reads only what the previous stage produced. Recoverable
//! problems are logged and counted in the [`RunSummary`]; a fatal error stops
//! the remaining stages and is returned, leaving finished outputs in place.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use sdmx_analysis::{TablePaths, aggregate, read_filtered_tables, write_tables};
use sdmx_ingest::{
    FlattenedList, Retriever, flatten_file, load_registry, source_document_path,
};
use sdmx_model::{CodeListRecord, CodeRecord, CodelistError, SourceRow};
use sdmx_quality::{QUALITY_REPORT, audit_lists, check_documents, write_audit_table, write_reports};
use sdmx_rdf::Generator;

use crate::config::RunConfig;
use crate::types::RunSummary;

/// Run every enabled stage, recording progress into `summary`.
pub fn run_pipeline(config: &RunConfig, summary: &mut RunSummary) -> Result<()> {
    let stages = config.stages;
    let paths = &config.paths;
    let tables = TablePaths::in_dir(&paths.analysis_dir);

    let rows = if stages.retrieval || stages.analysis {
        load_sources(&paths.registry, summary)?
    } else {
        Vec::new()
    };

    if stages.retrieval {
        info_span!("retrieve").in_scope(|| retrieve(&rows, config, summary))?;
    }

    let (lists, codes) = if stages.analysis {
        let flattened =
            info_span!("flatten").in_scope(|| flatten(&rows, &paths.sources_dir, summary));
        info_span!("analyze").in_scope(|| analyze(flattened, &rows, config, &tables, summary))?
    } else {
        info!(
            dir = %paths.analysis_dir.display(),
            "analysis disabled, reading stored filtered tables"
        );
        read_filtered_tables(&tables).context("analysis stage is disabled")?
    };
    summary.filtered_lists = lists.len();
    summary.filtered_codes = codes.len();

    let generator = Generator::new(config.generator_config());
    let documents = info_span!("generate")
        .in_scope(|| generate(&generator, &lists, &codes, &paths.output_dir, summary))?;

    info_span!("check").in_scope(|| check(&generator, &documents, &lists, config, summary))
}

fn load_sources(path: &Path, summary: &mut RunSummary) -> Result<Vec<SourceRow>> {
    let load = load_registry(path)
        .with_context(|| format!("failed to load source registry {}", path.display()))?;
    summary.total_sources = load.rows.len() + load.duplicates.len() + load.incomplete;
    summary.duplicate_sources = load.duplicates.len();
    summary.incomplete_sources = load.incomplete;
    summary
        .warnings
        .extend(load.duplicates.iter().map(ToString::to_string));
    info!(
        path = %path.display(),
        sources = load.rows.len(),
        duplicates = load.duplicates.len(),
        incomplete = load.incomplete,
        "loaded source registry"
    );
    Ok(load.rows)
}

fn retrieve(rows: &[SourceRow], config: &RunConfig, summary: &mut RunSummary) -> Result<()> {
    let start = Instant::now();
    let retriever = Retriever::new(config.retrieval.options()).context("retrieval setup")?;
    let outcome = retriever.retrieve_all(rows, &config.paths.sources_dir);
    summary.retrieved = outcome.saved.len();
    summary.retrieval_failures = outcome.failures.len();
    summary
        .warnings
        .extend(outcome.failures.iter().map(ToString::to_string));
    info!(
        saved = outcome.saved.len(),
        failed = outcome.failures.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "retrieval complete"
    );
    Ok(())
}

fn flatten(rows: &[SourceRow], sources_dir: &Path, summary: &mut RunSummary) -> Vec<FlattenedList> {
    let start = Instant::now();
    let mut flattened = Vec::with_capacity(rows.len());
    for row in rows {
        let path = source_document_path(sources_dir, row);
        match flatten_file(&path, row) {
            Ok(list) => flattened.push(list),
            Err(err) => {
                warn!(
                    organization = %row.owning_organization,
                    list_id = %row.list_id,
                    path = %path.display(),
                    error = %err,
                    "source document skipped"
                );
                if matches!(err, CodelistError::MissingSource { .. }) {
                    summary.missing_documents += 1;
                } else {
                    summary.malformed_documents += 1;
                }
                summary.warnings.push(err.to_string());
            }
        }
    }
    summary.flattened = flattened.len();
    info!(
        flattened = flattened.len(),
        missing = summary.missing_documents,
        malformed = summary.malformed_documents,
        duration_ms = start.elapsed().as_millis() as u64,
        "flattening complete"
    );
    flattened
}

fn analyze(
    flattened: Vec<FlattenedList>,
    rows: &[SourceRow],
    config: &RunConfig,
    tables: &TablePaths,
    summary: &mut RunSummary,
) -> Result<(Vec<CodeListRecord>, Vec<CodeRecord>)> {
    let start = Instant::now();
    let aggregation = aggregate(flattened, rows, config.generation.collision_policy);
    write_tables(tables, &aggregation).context("failed to write analysis tables")?;
    summary.filtered_out = aggregation
        .exclusion_counts()
        .into_iter()
        .map(|(reason, count)| (reason.to_string(), count))
        .collect();
    summary.agency_groups = aggregation.groups.len();
    for group in &aggregation.groups {
        info!(
            organization = %group.owning_organization,
            lists = %group.member_list_ids.join(", "),
            "organization publishes several code lists"
        );
    }
    info!(
        lists = aggregation.filtered_lists.len(),
        codes = aggregation.filtered_codes.len(),
        excluded_lists = aggregation.excluded_lists(),
        duration_ms = start.elapsed().as_millis() as u64,
        "analysis complete"
    );
    Ok((aggregation.filtered_lists, aggregation.filtered_codes))
}

/// Write the scheme documents and the combined document.
///
/// Returns the paths to check. A prefix conflict in the combined document is
/// fatal, after the per-scheme documents have been written.
fn generate(
    generator: &Generator,
    lists: &[CodeListRecord],
    codes: &[CodeRecord],
    output_dir: &Path,
    summary: &mut RunSummary,
) -> Result<Vec<PathBuf>> {
    let outcome = generator.generate_schemes(lists, codes, output_dir);
    summary.generated_documents = outcome.documents.len();
    summary.generation_failures = outcome.failures.len();
    summary
        .warnings
        .extend(outcome.failures.iter().map(ToString::to_string));

    let mut paths: Vec<PathBuf> = outcome.documents.iter().map(|d| d.path.clone()).collect();
    match generator.write_combined(&outcome.documents, output_dir) {
        Ok(path) => {
            summary.combined_document = Some(path.clone());
            paths.push(path);
            Ok(paths)
        }
        Err(err) => {
            if let CodelistError::PrefixConflicts { conflicts } = &err {
                summary
                    .prefix_conflicts
                    .extend(conflicts.iter().map(ToString::to_string));
            }
            Err(err).context("failed to generate the combined document")
        }
    }
}

fn check(
    generator: &Generator,
    documents: &[PathBuf],
    lists: &[CodeListRecord],
    config: &RunConfig,
    summary: &mut RunSummary,
) -> Result<()> {
    let reports = check_documents(documents);
    let report_path = write_reports(&config.paths.output_dir.join(QUALITY_REPORT), &reports)
        .context("failed to write quality reports")?;
    summary.quality_report = Some(report_path);
    summary.reports = reports;

    let audit = audit_lists(lists, &generator.config().organizations);
    let audit_path = write_audit_table(&config.paths.audit_table, &audit)
        .context("failed to write the audit table")?;
    summary.audit_rows = audit.len();
    summary.audit_table = Some(audit_path);
    Ok(())
}
