//! JSON catalog artifact source.
//!
//! Reads the file written by the ingestion pipeline. Two layouts are accepted:
//!
//! - a [`CatalogArtifact`] object: `{"config": {...}, "records": [...]}`
//! - a bare array of records, with no embedding config to validate against

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::{CatalogError, CatalogResult, CatalogSource};
use crate::models::{CatalogArtifact, CatalogRecord, EmbeddingConfig};

#[derive(Deserialize)]
#[serde(untagged)]
enum ArtifactLayout {
    Artifact(CatalogArtifact),
    Records(Vec<CatalogRecord>),
}

/// Catalog source backed by a JSON file, parsed once on open.
#[derive(Debug, Clone)]
pub struct JsonCatalogSource {
    path: PathBuf,
    name: String,
    records: Vec<CatalogRecord>,
    config: Option<EmbeddingConfig>,
}

impl JsonCatalogSource {
    /// Read and parse a catalog artifact.
    pub async fn from_file(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = tokio::fs::read_to_string(&path).await?;
        let mut source = Self::parse(&contents)?;
        source.name = format!("JSON file {}", path.display());
        source.path = path;
        Ok(source)
    }

    /// Parse a catalog artifact from a string.
    pub fn parse(contents: &str) -> CatalogResult<Self> {
        let layout: ArtifactLayout = serde_json::from_str(contents)
            .map_err(|e| CatalogError::ParseError(e.to_string()))?;

        let (records, config) = match layout {
            ArtifactLayout::Artifact(artifact) => (artifact.records, Some(artifact.config)),
            ArtifactLayout::Records(records) => (records, None),
        };

        Ok(Self {
            path: PathBuf::new(),
            name: "JSON string".to_string(),
            records,
            config,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CatalogSource for JsonCatalogSource {
    async fn fetch_records(&self) -> CatalogResult<Vec<CatalogRecord>> {
        Ok(self.records.clone())
    }

    async fn embedding_config(&self) -> CatalogResult<Option<EmbeddingConfig>> {
        Ok(self.config.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Write a catalog artifact as JSON.
pub async fn write_artifact(path: impl AsRef<Path>, artifact: &CatalogArtifact) -> CatalogResult<()> {
    let json = serde_json::to_string(artifact).map_err(|e| CatalogError::ParseError(e.to_string()))?;
    tokio::fs::write(path, json).await?;
    Ok(())
}
