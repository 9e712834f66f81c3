//! CSV export of query rows and verification against an earlier export.

use std::path::Path;

use super::error::ResultsError;
use crate::store::Row;

/// Writes `rows` under a header line.
pub fn export_rows(path: &Path, header: &[String], rows: &[Row]) -> Result<(), ResultsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ResultsError::io(parent, e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| ResultsError::csv(path, e))?;
    writer
        .write_record(header)
        .map_err(|e| ResultsError::csv(path, e))?;
    for row in rows {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(|e| ResultsError::csv(path, e))?;
    }
    writer.flush().map_err(|e| ResultsError::io(path, e))
}

/// Reads the data lines of an export (header excluded).
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>, ResultsError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| ResultsError::csv(path, e))?;

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(|e| ResultsError::csv(path, e))
        })
        .collect()
}

/// Checks `rows` line by line against the export at `path`.
pub fn verify_rows(path: &Path, rows: &[Row]) -> Result<(), ResultsError> {
    if !path.exists() {
        return Err(ResultsError::MissingBaseline(path.to_path_buf()));
    }

    let expected = read_rows(path)?;
    let mismatch = |reason: String| ResultsError::Mismatch {
        path: path.to_path_buf(),
        reason,
    };

    if expected.len() != rows.len() {
        return Err(mismatch(format!(
            "expected {} rows, got {}",
            expected.len(),
            rows.len()
        )));
    }

    for (line, (want, got)) in expected.iter().zip(rows).enumerate() {
        let got: Vec<String> = got.iter().map(|v| v.to_string()).collect();
        if *want != got {
            return Err(mismatch(format!(
                "row {}: expected {:?}, got {:?}",
                line + 1,
                want,
                got
            )));
        }
    }
    Ok(())
}
