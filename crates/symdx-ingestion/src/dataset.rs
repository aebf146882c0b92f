//! Symptom–disease dataset reader.
//!
//! The dataset is a CSV with `label` (disease name) and `text` (free-text
//! symptom description) columns. Rows with empty fields are skipped, not
//! fatal.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::{IngestError, Result};

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DatasetRow {
    pub label: String,
    pub text: String,
}

pub struct DatasetReader;

impl DatasetReader {
    /// Read and validate all rows. Returns the kept rows and the number of
    /// skipped ones.
    pub fn read(path: impl AsRef<Path>) -> Result<(Vec<DatasetRow>, usize)> {
        let mut reader = csv::Reader::from_path(path.as_ref()).map_err(|e| {
            IngestError::Dataset(format!(
                "Cannot open dataset {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let headers = reader.headers()?.clone();
        for required in ["label", "text"] {
            if !headers.iter().any(|h| h == required) {
                return Err(IngestError::Dataset(format!(
                    "Dataset is missing required column '{}'",
                    required
                )));
            }
        }

        let mut rows = Vec::new();
        let mut skipped = 0usize;

        for (i, record) in reader.deserialize::<DatasetRow>().enumerate() {
            match record {
                Ok(mut row) => {
                    row.label = row.label.trim().to_string();
                    row.text = row.text.trim().to_string();
                    if row.label.is_empty() || row.text.is_empty() {
                        warn!(row = i + 1, "skipping row with empty label or text");
                        skipped += 1;
                        continue;
                    }
                    rows.push(row);
                }
                Err(e) => {
                    warn!(row = i + 1, "skipping malformed row: {}", e);
                    skipped += 1;
                }
            }
        }

        if rows.is_empty() {
            return Err(IngestError::Dataset("Dataset contains no usable rows".to_string()));
        }

        Ok((rows, skipped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_reads_valid_rows() {
        let f = write_csv("label,text\nPsoriasis,itchy red rash\nMalaria,fever and chills\n");
        let (rows, skipped) = DatasetReader::read(f.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(skipped, 0);
        assert_eq!(rows[0].label, "Psoriasis");
    }

    #[test]
    fn test_trims_and_skips_empty() {
        let f = write_csv("label,text\n  Malaria  , fever \n,missing label\nDengue,\n");
        let (rows, skipped) = DatasetReader::read(f.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "Malaria");
        assert_eq!(rows[0].text, "fever");
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_missing_column_is_error() {
        let f = write_csv("disease,description\nMalaria,fever\n");
        assert!(DatasetReader::read(f.path()).is_err());
    }

    #[test]
    fn test_empty_dataset_is_error() {
        let f = write_csv("label,text\n");
        assert!(DatasetReader::read(f.path()).is_err());
    }
}
