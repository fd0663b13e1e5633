//! Parser for candidate catalog files.
//!
//! A catalog file is a JSON array of candidate records, or an object with a
//! `universities` array (the shape of an exported table dump).

use crate::error::{CatalogError, Result};
use crate::types::CandidateRecord;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Rows(Vec<Value>),
    Wrapped { universities: Vec<Value> },
}

/// Parse a catalog from JSON text.
///
/// Rows are decoded one at a time. A row that does not decode, or has no
/// name or country, is skipped with a warning; nothing downstream can use
/// it, and it must not take the rest of the catalog down with it.
///
/// # Arguments
/// * `source` - Label used in error messages (usually the file path)
/// * `contents` - The JSON text
pub fn parse_candidates(source: &str, contents: &str) -> Result<Vec<CandidateRecord>> {
    let parsed: CatalogFile =
        serde_json::from_str(contents).map_err(|e| CatalogError::ParseError {
            file: source.to_string(),
            reason: e.to_string(),
        })?;

    let rows = match parsed {
        CatalogFile::Rows(rows) => rows,
        CatalogFile::Wrapped { universities } => universities,
    };

    let total = rows.len();
    let records: Vec<CandidateRecord> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(i, row)| match decode_row(row) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping row {} in {}: {}", i, source, e);
                None
            }
        })
        .collect();

    if records.len() < total {
        tracing::warn!(
            "Kept {} of {} records from {}",
            records.len(),
            total,
            source
        );
    }

    Ok(records)
}

fn decode_row(row: Value) -> Result<CandidateRecord> {
    let name = row
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let record: CandidateRecord =
        serde_json::from_value(row).map_err(|e| CatalogError::InvalidRecord {
            name: name.clone(),
            reason: e.to_string(),
        })?;

    if record.name.trim().is_empty() || record.country.trim().is_empty() {
        return Err(CatalogError::InvalidRecord {
            name,
            reason: "missing name or country".to_string(),
        });
    }
    Ok(record)
}

/// Read and parse a catalog file.
pub fn load_candidates(path: &Path) -> Result<Vec<CandidateRecord>> {
    if !path.exists() {
        return Err(CatalogError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    parse_candidates(&path.display().to_string(), &contents)
}
