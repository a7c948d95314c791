//! Source registry loading.
//!
//! The registry is a semicolon-delimited table with one row per code list.
//! Header names are matched case-insensitively after trimming; extra columns
//! are ignored.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use sdmx_model::{CodelistError, Result, SourceRow};

pub const REQUIRED_COLUMNS: [&str; 4] =
    ["owning_organization", "list_id", "display_name", "endpoint"];

/// Loaded registry rows plus the rows that were skipped.
#[derive(Debug, Default)]
pub struct RegistryLoad {
    pub rows: Vec<SourceRow>,
    /// One `DuplicateKey` error per repeated `(owning_organization, list_id)`.
    pub duplicates: Vec<CodelistError>,
    /// Rows with an empty organization or list id.
    pub incomplete: usize,
}

pub fn load_registry(path: &Path) -> Result<RegistryLoad> {
    let file = std::fs::File::open(path).map_err(|e| CodelistError::io(path, e))?;
    read_registry(file, path)
}

/// Read a registry from any reader. `path` is only used in diagnostics.
pub fn read_registry<R: Read>(reader: R, path: &Path) -> Result<RegistryLoad> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|e| CodelistError::csv(path, e))?
        .iter()
        .map(normalize_header)
        .collect::<Vec<_>>();

    let mut indices = [0usize; 4];
    let mut missing = Vec::new();
    for (slot, column) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        match headers.iter().position(|header| header == column) {
            Some(idx) => *slot = idx,
            None => missing.push(column.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(CodelistError::Schema {
            path: path.to_path_buf(),
            missing,
        });
    }
    let [org_idx, list_idx, name_idx, endpoint_idx] = indices;

    let mut load = RegistryLoad::default();
    let mut seen = HashSet::new();
    for (offset, record) in reader.records().enumerate() {
        let record = record.map_err(|e| CodelistError::csv(path, e))?;
        // Header is line 1.
        let row_number = offset + 2;
        let cell = |idx: usize| record.get(idx).map(str::trim).unwrap_or("").to_string();
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        let row = SourceRow::new(
            cell(org_idx),
            cell(list_idx),
            cell(name_idx),
            cell(endpoint_idx),
        );
        if row.owning_organization.is_empty() || row.list_id.is_empty() {
            tracing::warn!(
                row = row_number,
                path = %path.display(),
                "registry row without organization or list id skipped"
            );
            load.incomplete += 1;
            continue;
        }
        if !seen.insert(row.key()) {
            let error = CodelistError::DuplicateKey {
                organization: row.owning_organization.clone(),
                list_id: row.list_id.clone(),
                row: row_number,
            };
            tracing::warn!(
                organization = %row.owning_organization,
                list_id = %row.list_id,
                row = row_number,
                "duplicate registry row skipped"
            );
            load.duplicates.push(error);
            continue;
        }
        load.rows.push(row);
    }
    tracing::info!(
        path = %path.display(),
        rows = load.rows.len(),
        duplicates = load.duplicates.len(),
        "loaded source registry"
    );
    Ok(load)
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_lowercase()
}
