//! AACT pipe-delimited export reader.
//!
//! The monthly AACT snapshot unpacks to one `<table>.txt` file per table,
//! pipe-delimited with a header row. Only three tables are needed here:
//!   - studies        (one row per registered trial)
//!   - sponsors       (lead sponsor and collaborator associations)
//!   - interventions  (one row per named intervention)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info};
use trialgraph_common::{Result, TrialGraphError};

/// Required columns for one table. Each requirement lists the header
/// names that satisfy it; the first is the preferred spelling.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub required: &'static [&'static [&'static str]],
}

pub const STUDIES: TableSpec = TableSpec {
    name: "studies",
    required: &[&["nct_id"], &["brief_title"], &["phase"], &["overall_status"]],
};

pub const SPONSORS: TableSpec = TableSpec {
    name: "sponsors",
    required: &[&["nct_id"], &["name"], &["agency_class"], &["lead_or_collaborator"]],
};

pub const INTERVENTIONS: TableSpec = TableSpec {
    name: "interventions",
    required: &[&["nct_id"], &["intervention_name", "name"], &["intervention_type"]],
};

/// Map every `*.txt` file in `dir` by its stem.
pub fn discover_tables(dir: &Path) -> Result<BTreeMap<String, PathBuf>> {
    let mut tables = BTreeMap::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_txt = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("txt"))
            .unwrap_or(false);
        if !is_txt || !path.is_file() {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            tables.insert(stem.to_string(), path.clone());
        }
    }
    info!(n_tables = tables.len(), dir = %dir.display(), "Discovered AACT tables");
    Ok(tables)
}

/// Find the file for `table`, trying the exact stem first and then the
/// naming variants seen across export vintages.
pub fn resolve_table(
    dir: &Path,
    tables: &BTreeMap<String, PathBuf>,
    table: &str,
) -> Result<PathBuf> {
    if let Some(path) = tables.get(table) {
        return Ok(path.clone());
    }

    let alternatives = [
        format!("{table}_table"),
        format!("{table}_data"),
        capitalise(table),
        table.to_uppercase(),
    ];
    for alt in &alternatives {
        if let Some(path) = tables.get(alt) {
            debug!(table, found = %alt, "Resolved table under alternate name");
            return Ok(path.clone());
        }
    }

    tracing::error!(
        table,
        available = ?tables.keys().take(10).collect::<Vec<_>>(),
        "Required table not found"
    );
    Err(TrialGraphError::MissingTable {
        table: table.to_string(),
        dir: dir.to_path_buf(),
    })
}

/// Load a pipe-delimited table into typed rows.
///
/// Fails with `MissingColumns` before reading any row if a required
/// column is absent from the header.
pub fn load_table<T: DeserializeOwned>(path: &Path, spec: &TableSpec) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let missing: Vec<String> = spec
        .required
        .iter()
        .filter(|alts| !alts.iter().any(|alt| headers.iter().any(|h| h == *alt)))
        .map(|alts| alts.join(" | "))
        .collect();
    if !missing.is_empty() {
        return Err(TrialGraphError::MissingColumns {
            table: spec.name.to_string(),
            columns: missing,
        });
    }

    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()?;

    info!(table = spec.name, rows = rows.len(), "Loaded table");
    Ok(rows)
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None        => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialgraph_common::{InterventionRecord, StudyRecord};

    fn write(dir: &Path, file: &str, body: &str) -> PathBuf {
        let path = dir.join(file);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_discover_only_txt_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "studies.txt", "nct_id\n");
        write(dir.path(), "README.md", "ignore me");
        let tables = discover_tables(dir.path()).unwrap();
        assert_eq!(tables.keys().collect::<Vec<_>>(), vec!["studies"]);
    }

    #[test]
    fn test_resolve_alternate_names() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Sponsors.txt", "nct_id\n");
        write(dir.path(), "interventions_table.txt", "nct_id\n");
        let tables = discover_tables(dir.path()).unwrap();
        assert!(resolve_table(dir.path(), &tables, "sponsors").is_ok());
        assert!(resolve_table(dir.path(), &tables, "interventions").is_ok());
    }

    #[test]
    fn test_resolve_missing_table_errors() {
        let dir = tempfile::tempdir().unwrap();
        let tables = discover_tables(dir.path()).unwrap();
        let err = resolve_table(dir.path(), &tables, "studies").unwrap_err();
        assert!(matches!(err, TrialGraphError::MissingTable { ref table, .. } if table == "studies"));
    }

    #[test]
    fn test_load_table_reports_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "studies.txt", "nct_id|brief_title\nNCT1|x\n");
        let err = load_table::<StudyRecord>(&path, &STUDIES).unwrap_err();
        match err {
            TrialGraphError::MissingColumns { table, columns } => {
                assert_eq!(table, "studies");
                assert_eq!(columns, vec!["phase".to_string(), "overall_status".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_table_accepts_alternate_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "interventions.txt",
            "id|nct_id|intervention_type|name\n1|NCT1|Drug|Aspirin\n2|NCT1|Drug|\n",
        );
        let rows: Vec<InterventionRecord> = load_table(&path, &INTERVENTIONS).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].intervention_name.as_deref(), Some("Aspirin"));
        assert_eq!(rows[1].intervention_name, None);
    }

    #[test]
    fn test_capitalise() {
        assert_eq!(capitalise("studies"), "Studies");
        assert_eq!(capitalise(""), "");
    }
}
