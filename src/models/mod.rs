//! Core data models for the catalog search system.
//!
//! This module contains the fundamental data structures used across the application:
//! catalog records, the per-query factors extracted from free text, and the scored
//! results produced by the ranking engine.

use serde::{Deserialize, Serialize};

/// A single dataset description from the catalog.
///
/// Every descriptive column is optional; absence is explicit rather than defaulted
/// to an empty string. Field names serialize to the column headers of the source
/// spreadsheet so artifacts stay readable next to the original data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogRecord {
    #[serde(rename = "Country", default)]
    pub country: Option<String>,

    #[serde(rename = "Region", default)]
    pub region: Option<String>,

    #[serde(rename = "Name of Database/Report", alias = "Dataset Name", default)]
    pub dataset_name: Option<String>,

    #[serde(rename = "Dataset Type", default)]
    pub dataset_type: Option<String>,

    #[serde(
        rename = "Parent Vendor Name (If Applicable)",
        alias = "Vendor",
        default
    )]
    pub vendor_name: Option<String>,

    #[serde(rename = "Description", default)]
    pub description: Option<String>,

    /// Therapeutic-area coverage
    #[serde(rename = "TA coverage", default)]
    pub ta_coverage: Option<String>,

    #[serde(rename = "Geographic coverage", default)]
    pub geographic_coverage: Option<String>,

    #[serde(rename = "Therapeutic coverage", default)]
    pub thematic_coverage: Option<String>,

    #[serde(rename = "Dataset Category", default)]
    pub dataset_category: Option<String>,

    /// Precomputed embedding of the record's descriptive columns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

impl CatalogRecord {
    /// Whether the record satisfies the load-time invariant: a non-empty
    /// description and a non-empty therapeutic-area coverage.
    pub fn is_complete(&self) -> bool {
        has_text(&self.description) && has_text(&self.ta_coverage)
    }

    /// Read a column by its typed identifier.
    pub fn column(&self, column: Column) -> Option<&str> {
        let value = match column {
            Column::Country => &self.country,
            Column::Region => &self.region,
            Column::DatasetName => &self.dataset_name,
            Column::DatasetType => &self.dataset_type,
            Column::VendorName => &self.vendor_name,
            Column::Description => &self.description,
            Column::TaCoverage => &self.ta_coverage,
            Column::GeographicCoverage => &self.geographic_coverage,
            Column::ThematicCoverage => &self.thematic_coverage,
            Column::DatasetCategory => &self.dataset_category,
        };
        value.as_deref()
    }

    /// Join the given columns with single spaces, treating missing values as empty.
    pub fn join_columns(&self, columns: &[Column]) -> String {
        columns
            .iter()
            .map(|&c| self.column(c).unwrap_or(""))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Typed identifiers for the catalog's descriptive columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Country,
    Region,
    DatasetName,
    DatasetType,
    VendorName,
    Description,
    TaCoverage,
    GeographicCoverage,
    ThematicCoverage,
    DatasetCategory,
}

impl Column {
    /// Columns concatenated and embedded by the offline ingestion pipeline.
    pub const EMBEDDED: [Column; 7] = [
        Column::Country,
        Column::Region,
        Column::DatasetName,
        Column::DatasetType,
        Column::VendorName,
        Column::Description,
        Column::TaCoverage,
    ];

    /// Columns checked for the "TBD" placeholder marker.
    pub const PENALIZED: [Column; 6] = [
        Column::DatasetCategory,
        Column::VendorName,
        Column::DatasetName,
        Column::Description,
        Column::ThematicCoverage,
        Column::GeographicCoverage,
    ];
}

/// Structured hints extracted from a query.
///
/// `dataset_hint` always carries the full normalized query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFactors {
    pub geographic: Option<String>,
    pub thematic: Option<String>,
    pub dataset_hint: String,
}

impl QueryFactors {
    /// Factors with no entities: only the dataset hint is set.
    pub fn from_query(query: &str) -> Self {
        Self {
            geographic: None,
            thematic: None,
            dataset_hint: query.to_string(),
        }
    }

    /// Coverage columns to compare the query against, in fixed order.
    pub fn comparison_columns(&self) -> Vec<Column> {
        let mut columns = Vec::with_capacity(3);
        if self.geographic.is_some() {
            columns.push(Column::GeographicCoverage);
        }
        if self.thematic.is_some() {
            columns.push(Column::ThematicCoverage);
        }
        if !self.dataset_hint.is_empty() {
            columns.push(Column::DatasetCategory);
        }
        columns
    }
}

/// A catalog record together with its per-request scores.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRecord {
    pub record: CatalogRecord,

    /// Inner product between the query and the record embedding
    pub similarity: f32,

    /// Accumulated data-quality penalty (>= 0)
    pub penalty: f32,

    /// `similarity - penalty`, the ranking key
    pub penalized_similarity: f32,
}

impl ScoredRecord {
    pub fn new(record: CatalogRecord, similarity: f32, penalty: f32) -> Self {
        Self {
            record,
            similarity,
            penalty,
            penalized_similarity: similarity - penalty,
        }
    }
}

/// Configuration for the embedding model.
///
/// Stored alongside the catalog artifact to ensure consistency between
/// ingestion and query-time embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbeddingConfig {
    /// Name/identifier of the embedding model (e.g., "all-MiniLM-L6-v2")
    pub model_name: String,

    /// Dimension of the embedding vectors
    pub dimension: usize,
}

/// The serialized output of the offline ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogArtifact {
    pub config: EmbeddingConfig,
    pub records: Vec<CatalogRecord>,
}
