//! JSON row source.
//!
//! Reads a JSON array of objects keyed by the spreadsheet column headers, as
//! produced by a typical CSV/XLSX-to-JSON export. Cell values may be strings,
//! numbers or booleans (stringified) or null (missing). Columns the catalog
//! does not use are ignored.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

use super::{RowSource, SourceError, SourceResult};
use crate::models::CatalogRecord;

/// Row source backed by a JSON file, parsed once on open.
#[derive(Debug, Clone)]
pub struct JsonRowSource {
    name: String,
    rows: Vec<CatalogRecord>,
}

impl JsonRowSource {
    /// Read and parse a JSON export.
    pub async fn from_file(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await?;
        let mut source = Self::parse(&contents)?;
        source.name = format!("JSON file {}", path.display());
        Ok(source)
    }

    /// Parse a JSON export from a string.
    pub fn parse(contents: &str) -> SourceResult<Self> {
        let objects: Vec<Map<String, Value>> =
            serde_json::from_str(contents).map_err(|e| SourceError::ParseError(e.to_string()))?;

        let rows = objects
            .into_iter()
            .enumerate()
            .map(|(row, object)| record_from_object(object).map_err(|e| {
                SourceError::ParseError(format!("row {}: {}", row, e))
            }))
            .collect::<SourceResult<Vec<_>>>()?;

        debug!("Parsed {} raw rows", rows.len());
        Ok(Self {
            name: "JSON string".to_string(),
            rows,
        })
    }
}

/// Convert one spreadsheet-style object into a record, stringifying scalar cells.
fn record_from_object(object: Map<String, Value>) -> Result<CatalogRecord, serde_json::Error> {
    let cells: Map<String, Value> = object
        .into_iter()
        .filter_map(|(header, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => return None,
            };
            Some((header, Value::String(text)))
        })
        .collect();

    serde_json::from_value(Value::Object(cells))
}

#[async_trait]
impl RowSource for JsonRowSource {
    async fn fetch_rows(&self) -> SourceResult<Vec<CatalogRecord>> {
        Ok(self.rows.clone())
    }

    async fn count_rows(&self) -> SourceResult<usize> {
        Ok(self.rows.len())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EXPORT: &str = r#"[
        {"Country": "France", "Region": "Europe", "Name of Database/Report": "SNDS",
         "Dataset Type": "Claims", "Parent Vendor Name (If Applicable)": null,
         "Description": "National claims", "TA coverage": "All", "Unused column": 7},
        {"Country": "Japan", "Dataset Name": "JMDC", "Year": 2019,
         "Description": "Insurer claims", "TA coverage": 42}
    ]"#;

    #[tokio::test]
    async fn test_parse_export() {
        let source = JsonRowSource::parse(EXPORT).unwrap();
        let rows = source.fetch_rows().await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].dataset_name.as_deref(), Some("SNDS"));
        assert!(rows[0].vendor_name.is_none());
        assert_eq!(rows[1].dataset_name.as_deref(), Some("JMDC"));
        // Numeric cells are stringified
        assert_eq!(rows[1].ta_coverage.as_deref(), Some("42"));
        assert!(rows.iter().all(|r| r.embedding.is_empty()));
    }

    #[tokio::test]
    async fn test_limit_and_count() {
        let source = JsonRowSource::parse(EXPORT).unwrap();
        assert_eq!(source.count_rows().await.unwrap(), 2);
        assert_eq!(source.fetch_rows_limit(1).await.unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_non_array() {
        let result = JsonRowSource::parse(r#"{"Country": "France"}"#);
        assert!(matches!(result, Err(SourceError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", EXPORT).unwrap();

        let source = JsonRowSource::from_file(file.path()).await.unwrap();
        assert!(source.name().starts_with("JSON file"));
        assert_eq!(source.count_rows().await.unwrap(), 2);
    }
}
