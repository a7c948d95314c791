//! Analysis tables on disk.
//!
//! Four semicolon-delimited tables are written per run, each fully replaced:
//! all codes, all code lists, and their filtered variants. Label maps are
//! stored as JSON objects keyed by language tag.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

use sdmx_model::{
    AtomicFile, CodeListRecord, CodeRecord, CodeStatistics, CodelistError, Labels, Result,
};

use crate::aggregate::Aggregation;

const LIST_SEPARATOR: char = '|';

pub const CODE_COLUMNS: [&str; 5] = [
    "owning_organization",
    "list_id",
    "code_id",
    "parent_code_id",
    "labels",
];

pub const CODELIST_COLUMNS: [&str; 16] = [
    "owning_organization",
    "list_id",
    "display_name",
    "code_count",
    "language_tags",
    "version",
    "urn",
    "source_url",
    "labels",
    "descriptions",
    "total_codes",
    "unique_codes",
    "common_codes",
    "shared_codes",
    "similar_lists",
    "source_sha256",
];

/// Locations of the four analysis tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePaths {
    pub codes: PathBuf,
    pub codelists: PathBuf,
    pub filtered_codes: PathBuf,
    pub filtered_codelists: PathBuf,
}

impl TablePaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            codes: dir.join("codes.csv"),
            codelists: dir.join("codelists.csv"),
            filtered_codes: dir.join("filtered_codes.csv"),
            filtered_codelists: dir.join("filtered_codelists.csv"),
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct CodeRow {
    owning_organization: String,
    list_id: String,
    code_id: String,
    parent_code_id: Option<String>,
    labels: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct CodeListRow {
    owning_organization: String,
    list_id: String,
    display_name: String,
    code_count: usize,
    language_tags: String,
    version: Option<String>,
    urn: Option<String>,
    source_url: Option<String>,
    labels: String,
    descriptions: String,
    total_codes: usize,
    unique_codes: usize,
    common_codes: usize,
    shared_codes: usize,
    similar_lists: String,
    source_sha256: Option<String>,
}

pub fn write_tables(paths: &TablePaths, aggregation: &Aggregation) -> Result<()> {
    write_codes(&paths.codes, &aggregation.codes)?;
    write_codelists(&paths.codelists, &aggregation.lists)?;
    write_codes(&paths.filtered_codes, &aggregation.filtered_codes)?;
    write_codelists(&paths.filtered_codelists, &aggregation.filtered_lists)?;
    tracing::info!(
        dir = %paths.codes.parent().unwrap_or(Path::new(".")).display(),
        "wrote analysis tables"
    );
    Ok(())
}

/// Read the stored filtered tables back, for runs that skip analysis.
///
/// Code counts and language tags are recomputed from the stored codes.
pub fn read_filtered_tables(paths: &TablePaths) -> Result<(Vec<CodeListRecord>, Vec<CodeRecord>)> {
    let mut lists = read_rows::<CodeListRow>(&paths.filtered_codelists)?
        .into_iter()
        .map(|row| list_from_row(row, &paths.filtered_codelists))
        .collect::<Result<Vec<_>>>()?;
    let codes = read_rows::<CodeRow>(&paths.filtered_codes)?
        .into_iter()
        .map(|row| code_from_row(row, &paths.filtered_codes))
        .collect::<Result<Vec<_>>>()?;
    for list in &mut lists {
        list.recompute(&codes);
    }
    Ok((lists, codes))
}

pub fn write_codes(path: &Path, codes: &[CodeRecord]) -> Result<PathBuf> {
    let rows = codes.iter().map(|code| CodeRow {
        owning_organization: code.owning_organization.clone(),
        list_id: code.list_id.clone(),
        code_id: code.code_id.clone(),
        parent_code_id: code.parent_code_id.clone(),
        labels: labels_json(&code.labels),
    });
    write_table(path, &CODE_COLUMNS, rows)
}

pub fn write_codelists(path: &Path, lists: &[CodeListRecord]) -> Result<PathBuf> {
    let rows = lists.iter().map(|list| CodeListRow {
        owning_organization: list.owning_organization.clone(),
        list_id: list.list_id.clone(),
        display_name: list.display_name.clone(),
        code_count: list.code_count,
        language_tags: join(list.language_tags.iter()),
        version: list.version.clone(),
        urn: list.urn.clone(),
        source_url: list.source_url.clone(),
        labels: labels_json(&list.labels),
        descriptions: labels_json(&list.descriptions),
        total_codes: list.statistics.total,
        unique_codes: list.statistics.unique,
        common_codes: list.statistics.common,
        shared_codes: list.statistics.shared,
        similar_lists: join(list.similar_lists.iter()),
        source_sha256: list.source_sha256.clone(),
    });
    write_table(path, &CODELIST_COLUMNS, rows)
}

/// Write a semicolon-delimited table through a scoped file.
///
/// The header is always written, so an empty table still documents its schema.
pub fn write_table<T, I>(path: &Path, columns: &[&str], rows: I) -> Result<PathBuf>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let file = AtomicFile::create(path)?;
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_writer(file);
    writer
        .write_record(columns)
        .map_err(|e| CodelistError::csv(path, e))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| CodelistError::csv(path, e))?;
    }
    let file = writer
        .into_inner()
        .map_err(|e| CodelistError::write(path, e.into_error()))?;
    file.commit()
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(CodelistError::MissingInput {
                path: path.to_path_buf(),
                reason: "no stored analysis table; enable the analysis stage".to_string(),
            });
        }
        Err(err) => return Err(CodelistError::io(path, err)),
    };
    let mut reader = ReaderBuilder::new().delimiter(b';').from_reader(file);
    reader
        .deserialize()
        .map(|row| row.map_err(|e| CodelistError::csv(path, e)))
        .collect()
}

fn code_from_row(row: CodeRow, path: &Path) -> Result<CodeRecord> {
    Ok(CodeRecord {
        owning_organization: row.owning_organization,
        list_id: row.list_id,
        code_id: row.code_id,
        parent_code_id: row.parent_code_id.filter(|parent| !parent.is_empty()),
        labels: parse_labels(&row.labels, path)?,
    })
}

fn list_from_row(row: CodeListRow, path: &Path) -> Result<CodeListRecord> {
    Ok(CodeListRecord {
        owning_organization: row.owning_organization,
        list_id: row.list_id,
        display_name: row.display_name,
        code_count: row.code_count,
        language_tags: split(&row.language_tags).collect::<BTreeSet<_>>(),
        version: row.version,
        urn: row.urn,
        source_url: row.source_url,
        labels: parse_labels(&row.labels, path)?,
        descriptions: parse_labels(&row.descriptions, path)?,
        statistics: CodeStatistics {
            total: row.total_codes,
            unique: row.unique_codes,
            common: row.common_codes,
            shared: row.shared_codes,
        },
        similar_lists: split(&row.similar_lists).collect(),
        source_sha256: row.source_sha256,
    })
}

fn labels_json(labels: &Labels) -> String {
    serde_json::to_string(labels).unwrap_or_else(|_| "{}".to_string())
}

fn parse_labels(raw: &str, path: &Path) -> Result<Labels> {
    if raw.trim().is_empty() {
        return Ok(Labels::new());
    }
    serde_json::from_str(raw).map_err(|e| CodelistError::csv(path, format!("labels: {e}")))
}

fn join<'a>(values: impl Iterator<Item = &'a String>) -> String {
    values
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(&LIST_SEPARATOR.to_string())
}

fn split(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_filtered_table_is_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_filtered_tables(&TablePaths::in_dir(dir.path())).unwrap_err();
        assert!(matches!(err, CodelistError::MissingInput { .. }));
    }

    #[test]
    fn stored_counts_are_recomputed_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let paths = TablePaths::in_dir(dir.path());
        let codes = vec![
            CodeRecord::new("ESTAT", "CL_FREQ", "A").with_label("en", "Annual"),
            CodeRecord::new("ESTAT", "CL_FREQ", "M").with_label("de", "Monatlich"),
        ];
        let mut list = CodeListRecord::new("ESTAT", "CL_FREQ", "Frequency");
        list.code_count = 99;
        list.language_tags = BTreeSet::from(["xx".to_string()]);
        write_codelists(&paths.filtered_codelists, &[list]).unwrap();
        write_codes(&paths.filtered_codes, &codes).unwrap();

        let (lists, _) = read_filtered_tables(&paths).unwrap();
        assert_eq!(lists[0].code_count, 2);
        assert_eq!(
            lists[0].language_tags,
            BTreeSet::from(["de".to_string(), "en".to_string()])
        );
    }

    #[test]
    fn empty_table_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_codes(&dir.path().join("codes.csv"), &[]).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            text,
            "owning_organization;list_id;code_id;parent_code_id;labels\n"
        );
    }
}
