//! Query ranking module.
//!
//! Scores every catalog record against a query, adjusts the scores with
//! data-quality penalties, filters by the extracted factors and returns the
//! top-k records. Filtering is two-tier: if no record passes the factor masks,
//! the top-k is taken from the whole catalog instead.
//!
//! # Usage
//!
//! ```rust,no_run
//! use catalog_search::catalog::{Catalog, JsonCatalogSource};
//! use catalog_search::embedding::fastembed::FastEmbedProvider;
//! use catalog_search::extraction::FactorExtractor;
//! use catalog_search::query::{Ranker, RankingEngine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = JsonCatalogSource::from_file("catalog.json").await?;
//! let (catalog, _) = Catalog::load(&source).await?;
//! let engine = RankingEngine::new(FastEmbedProvider::new(None, None)?);
//!
//! let factors = FactorExtractor::default().extract("oncology claims in france");
//! let results = engine.rank("oncology claims in france", &factors, &catalog).await?;
//!
//! for result in results {
//!     println!("{:?} - {:.3}", result.record.dataset_name, result.penalized_similarity);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::embedding::{inner_product, EmbeddingError, EmbeddingProvider};
use crate::models::{CatalogRecord, Column, QueryFactors, ScoredRecord};

/// Default number of results returned per query.
pub const DEFAULT_TOP_K: usize = 20;

/// Marker for incomplete data in catalog columns (case-sensitive).
pub const PLACEHOLDER_MARKER: &str = "TBD";

/// Score deduction per penalized column containing the placeholder marker.
pub const PENALTY_PER_COLUMN: f32 = 0.1;

/// Errors that can occur during ranking.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Query and record vectors have different lengths
    #[error("Dimension mismatch: query has {query} dimensions, record has {record}")]
    DimensionMismatch { query: usize, record: usize },

    /// The provider returned a different number of vectors than requested
    #[error("Expected {expected} embeddings, got {actual}")]
    BatchSizeMismatch { expected: usize, actual: usize },
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Which record vectors the query is compared against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScoringMode {
    /// Embed each record's factor-selected coverage columns on every request
    #[default]
    ColumnEmbeddings,
    /// Reuse the embedding stored with each record at ingestion time
    StoredEmbeddings,
}

impl FromStr for ScoringMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "column-embeddings" | "columns" => Ok(ScoringMode::ColumnEmbeddings),
            "stored-embeddings" | "stored" => Ok(ScoringMode::StoredEmbeddings),
            other => Err(format!(
                "unknown scoring mode '{}' (expected column-embeddings or stored-embeddings)",
                other
            )),
        }
    }
}

impl fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringMode::ColumnEmbeddings => write!(f, "column-embeddings"),
            ScoringMode::StoredEmbeddings => write!(f, "stored-embeddings"),
        }
    }
}

/// Trait for ranking engines.
#[async_trait]
pub trait Ranker: Send + Sync {
    /// Rank catalog records for a normalized query and its factors.
    ///
    /// # Returns
    /// At most `top_k` records, highest adjusted score first
    async fn rank(
        &self,
        query: &str,
        factors: &QueryFactors,
        catalog: &Catalog,
    ) -> QueryResult<Vec<ScoredRecord>>;
}

/// Data-quality penalty for a record: 0.1 per penalized column containing "TBD".
pub fn penalty(record: &CatalogRecord) -> f32 {
    let marked = Column::PENALIZED
        .iter()
        .filter(|&&c| record.column(c).is_some_and(|v| v.contains(PLACEHOLDER_MARKER)))
        .count();
    marked as f32 * PENALTY_PER_COLUMN
}

/// Case-insensitive substring filter.
///
/// An absent or empty factor accepts every value; a missing value never matches
/// a present factor.
pub fn matches_factor(value: Option<&str>, factor: Option<&str>) -> bool {
    match factor.filter(|f| !f.is_empty()) {
        None => true,
        Some(factor) => value.is_some_and(|v| v.to_lowercase().contains(&factor.to_lowercase())),
    }
}

/// Whether a record passes both the geographic and the category mask.
pub fn passes_filters(record: &CatalogRecord, factors: &QueryFactors) -> bool {
    matches_factor(record.geographic_coverage.as_deref(), factors.geographic.as_deref())
        && matches_factor(record.dataset_category.as_deref(), Some(factors.dataset_hint.as_str()))
}

/// Per-record scores before selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub index: usize,
    pub similarity: f32,
    pub penalty: f32,
}

impl Score {
    pub fn adjusted(&self) -> f32 {
        self.similarity - self.penalty
    }
}

/// Pick the top `k` scores among those passing `mask`, falling back to all
/// scores when none pass. Equal scores keep catalog order.
///
/// # Returns
/// The selected scores and whether the fallback was used
pub fn select_top_k(scores: &[Score], mask: &[bool], k: usize) -> (Vec<Score>, bool) {
    let mut candidates: Vec<Score> = scores
        .iter()
        .zip(mask.iter())
        .filter(|(_, &passes)| passes)
        .map(|(score, _)| *score)
        .collect();

    let fell_back = candidates.is_empty();
    if fell_back {
        candidates = scores.to_vec();
    }

    candidates.sort_by(|a, b| b.adjusted().total_cmp(&a.adjusted()));
    candidates.truncate(k);
    (candidates, fell_back)
}

fn similarity(query: &[f32], record: &[f32]) -> QueryResult<f32> {
    inner_product(query, record).ok_or(QueryError::DimensionMismatch {
        query: query.len(),
        record: record.len(),
    })
}

/// Brute-force ranking engine over an in-memory catalog.
pub struct RankingEngine<E>
where
    E: EmbeddingProvider,
{
    embedding_provider: E,
    scoring_mode: ScoringMode,
    top_k: usize,
}

impl<E> RankingEngine<E>
where
    E: EmbeddingProvider,
{
    /// Create an engine with the default scoring mode and top-k.
    pub fn new(embedding_provider: E) -> Self {
        Self {
            embedding_provider,
            scoring_mode: ScoringMode::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_scoring_mode(mut self, scoring_mode: ScoringMode) -> Self {
        self.scoring_mode = scoring_mode;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn scoring_mode(&self) -> ScoringMode {
        self.scoring_mode
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Raw similarity of the query against every record, in catalog order.
    async fn similarities(
        &self,
        query_vector: &[f32],
        factors: &QueryFactors,
        catalog: &Catalog,
    ) -> QueryResult<Vec<f32>> {
        match self.scoring_mode {
            ScoringMode::ColumnEmbeddings => {
                let columns = factors.comparison_columns();
                debug!("Comparing against columns {:?}", columns);

                let texts: Vec<String> = catalog.iter().map(|r| r.join_columns(&columns)).collect();
                let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
                let embeddings = self.embedding_provider.embed_batch(&text_refs).await?;

                if embeddings.len() != texts.len() {
                    return Err(QueryError::BatchSizeMismatch {
                        expected: texts.len(),
                        actual: embeddings.len(),
                    });
                }
                embeddings
                    .iter()
                    .map(|e| similarity(query_vector, e))
                    .collect()
            }
            ScoringMode::StoredEmbeddings => catalog
                .iter()
                .map(|r| similarity(query_vector, &r.embedding))
                .collect(),
        }
    }
}

#[async_trait]
impl<E> Ranker for RankingEngine<E>
where
    E: EmbeddingProvider,
{
    async fn rank(
        &self,
        query: &str,
        factors: &QueryFactors,
        catalog: &Catalog,
    ) -> QueryResult<Vec<ScoredRecord>> {
        if catalog.is_empty() {
            return Ok(Vec::new());
        }
        let started = Instant::now();

        // 1. Embed the query
        let query_vector = self.embedding_provider.embed(query).await?;

        // 2. Score every record
        let similarities = self.similarities(&query_vector, factors, catalog).await?;
        let scores: Vec<Score> = catalog
            .iter()
            .zip(similarities)
            .enumerate()
            .map(|(index, (record, similarity))| Score {
                index,
                similarity,
                penalty: penalty(record),
            })
            .collect();

        // 3. Filter by factors, falling back to the full catalog
        let mask: Vec<bool> = catalog.iter().map(|r| passes_filters(r, factors)).collect();
        let (selected, fell_back) = select_top_k(&scores, &mask, self.top_k);
        if fell_back {
            info!("No catalog record matched the query factors; ranking the full catalog");
        }

        debug!(
            "Ranked {} records in {:.2?} ({} returned)",
            catalog.len(),
            started.elapsed(),
            selected.len()
        );

        // 4. Materialize only the selected records
        Ok(selected
            .into_iter()
            .map(|s| ScoredRecord::new(catalog[s.index].clone(), s.similarity, s.penalty))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmbeddingConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const VOCABULARY: [&str; 6] = ["france", "germany", "covid", "epidemiology", "oncology", "claims"];

    /// Bag-of-words embedding over a fixed vocabulary
    #[derive(Default)]
    struct KeywordEmbedding {
        batch_calls: AtomicUsize,
        batches: Mutex<Vec<Vec<String>>>,
        should_fail: bool,
    }

    impl KeywordEmbedding {
        fn with_failure() -> Self {
            Self {
                should_fail: true,
                ..Default::default()
            }
        }

        fn vector(text: &str) -> Vec<f32> {
            let text = text.to_lowercase();
            VOCABULARY
                .iter()
                .map(|w| if text.contains(w) { 1.0 } else { 0.0 })
                .collect()
        }
    }

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedding {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            if self.should_fail {
                return Err(EmbeddingError::ModelUnavailable("mock backend down".to_string()));
            }
            Ok(Self::vector(text))
        }

        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            self.batches
                .lock()
                .unwrap()
                .push(texts.iter().map(|t| t.to_string()).collect());
            Ok(texts.iter().map(|t| Self::vector(t)).collect())
        }

        fn dimension(&self) -> usize {
            VOCABULARY.len()
        }

        fn model_name(&self) -> &str {
            "keyword-mock"
        }
    }

    fn record(name: &str, geo: &str, category: &str) -> CatalogRecord {
        CatalogRecord {
            dataset_name: Some(name.to_string()),
            description: Some(format!("{} dataset", name)),
            ta_coverage: Some("General".to_string()),
            geographic_coverage: Some(geo.to_string()),
            dataset_category: Some(category.to_string()),
            ..Default::default()
        }
    }

    fn catalog(records: Vec<CatalogRecord>) -> Catalog {
        Catalog::from_records(records, None).0
    }

    fn names(results: &[ScoredRecord]) -> Vec<&str> {
        results
            .iter()
            .map(|r| r.record.dataset_name.as_deref().unwrap())
            .collect()
    }

    fn hint_only(query: &str) -> QueryFactors {
        QueryFactors::from_query(query)
    }

    #[test]
    fn test_penalty_counts_marked_columns() {
        let mut r = record("a", "France", "Claims");
        assert_eq!(penalty(&r), 0.0);

        r.vendor_name = Some("TBD".to_string());
        assert!((penalty(&r) - 0.1).abs() < 1e-6);

        r.description = Some("Coverage TBD later".to_string());
        assert!((penalty(&r) - 0.2).abs() < 1e-6);

        // Case-sensitive, and columns outside the penalized set are ignored
        r.thematic_coverage = Some("tbd".to_string());
        r.country = Some("TBD".to_string());
        assert!((penalty(&r) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_penalty_is_additive_per_column() {
        let base = record("a", "France", "Claims");
        for column in Column::PENALIZED {
            let mut marked = base.clone();
            match column {
                Column::DatasetCategory => marked.dataset_category = Some("TBD".into()),
                Column::VendorName => marked.vendor_name = Some("TBD".into()),
                Column::DatasetName => marked.dataset_name = Some("TBD".into()),
                Column::Description => marked.description = Some("TBD".into()),
                Column::ThematicCoverage => marked.thematic_coverage = Some("TBD".into()),
                Column::GeographicCoverage => marked.geographic_coverage = Some("TBD".into()),
                _ => unreachable!(),
            }
            assert!(
                (penalty(&marked) - penalty(&base) - PENALTY_PER_COLUMN).abs() < 1e-6,
                "column {:?} should add one penalty step",
                column
            );
        }
    }

    #[test]
    fn test_matches_factor() {
        assert!(matches_factor(Some("France, Germany"), Some("germany")));
        assert!(matches_factor(Some("FRANCE"), Some("france")));
        assert!(!matches_factor(Some("Spain"), Some("france")));
        assert!(!matches_factor(None, Some("france")));
        assert!(matches_factor(None, None));
        assert!(matches_factor(Some("Spain"), Some("")));
        // Literal match: regex metacharacters have no special meaning
        assert!(!matches_factor(Some("abc"), Some("a.c")));
        assert!(matches_factor(Some("a.c registry"), Some("a.c")));
    }

    #[test]
    fn test_select_top_k_stable_ties() {
        let scores: Vec<Score> = [0.5, 0.9, 0.5, 0.9, 0.1]
            .iter()
            .enumerate()
            .map(|(index, &similarity)| Score { index, similarity, penalty: 0.0 })
            .collect();

        let (selected, fell_back) = select_top_k(&scores, &[true; 5], 4);
        let order: Vec<usize> = selected.iter().map(|s| s.index).collect();
        assert_eq!(order, vec![1, 3, 0, 2]);
        assert!(!fell_back);
    }

    #[test]
    fn test_select_top_k_fallback_matches_unmasked() {
        let scores: Vec<Score> = [0.3, 0.7, 0.2, 0.8]
            .iter()
            .enumerate()
            .map(|(index, &similarity)| Score { index, similarity, penalty: 0.05 * index as f32 })
            .collect();

        let (fallback, fell_back) = select_top_k(&scores, &[false; 4], 20);
        let (unmasked, _) = select_top_k(&scores, &[true; 4], 20);
        assert!(fell_back);
        assert_eq!(fallback, unmasked);
    }

    #[test]
    fn test_select_top_k_filters_before_truncating() {
        let scores: Vec<Score> = [0.9, 0.1, 0.8]
            .iter()
            .enumerate()
            .map(|(index, &similarity)| Score { index, similarity, penalty: 0.0 })
            .collect();

        let (selected, fell_back) = select_top_k(&scores, &[false, true, false], 20);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].index, 1);
        assert!(!fell_back);
    }

    #[test]
    fn test_scoring_mode_from_str() {
        assert_eq!("stored".parse(), Ok(ScoringMode::StoredEmbeddings));
        assert_eq!("Column-Embeddings".parse(), Ok(ScoringMode::ColumnEmbeddings));
        assert!("cached".parse::<ScoringMode>().is_err());
        assert_eq!(ScoringMode::StoredEmbeddings.to_string(), "stored-embeddings");
    }

    #[tokio::test]
    async fn test_results_bounded_sorted_and_from_catalog() {
        let records: Vec<CatalogRecord> = (0..25)
            .map(|i| {
                let category = if i % 2 == 0 { "Oncology claims" } else { "Claims" };
                record(&format!("r{}", i), "France", category)
            })
            .collect();
        let catalog = catalog(records);
        let engine = RankingEngine::new(KeywordEmbedding::default());

        let results = engine
            .rank("oncology claims", &hint_only("oncology claims"), &catalog)
            .await
            .unwrap();

        assert!(results.len() <= DEFAULT_TOP_K);
        for pair in results.windows(2) {
            assert!(pair[0].penalized_similarity >= pair[1].penalized_similarity);
        }
        for result in &results {
            assert!(catalog.iter().any(|r| r == &result.record));
        }
    }

    #[tokio::test]
    async fn test_full_catalog_is_truncated_to_top_k() {
        let records: Vec<CatalogRecord> =
            (0..30).map(|i| record(&format!("r{}", i), "France", "Claims")).collect();
        let engine = RankingEngine::new(KeywordEmbedding::default());

        let results = engine
            .rank("claims", &hint_only("claims"), &catalog(records))
            .await
            .unwrap();

        assert_eq!(results.len(), DEFAULT_TOP_K);
        // All tie: catalog order is preserved
        assert_eq!(names(&results)[..3], ["r0", "r1", "r2"]);
    }

    #[tokio::test]
    async fn test_france_ranks_above_germany_when_geo_mask_succeeds() {
        let catalog = catalog(vec![
            record("germany-epi", "Germany", "Epidemiology"),
            record("france-epi", "France", "Epidemiology"),
        ]);
        let engine = RankingEngine::new(KeywordEmbedding::default());
        let factors = QueryFactors {
            geographic: Some("france".to_string()),
            thematic: None,
            dataset_hint: String::new(),
        };

        let results = engine
            .rank("covid-19 datasets in france", &factors, &catalog)
            .await
            .unwrap();

        assert_eq!(names(&results), vec!["france-epi"]);
    }

    #[tokio::test]
    async fn test_france_ranks_above_germany_via_similarity_on_fallback() {
        let catalog = catalog(vec![
            record("germany-epi", "Germany", "Epidemiology"),
            record("france-epi", "France", "Epidemiology"),
        ]);
        let engine = RankingEngine::new(KeywordEmbedding::default());
        let factors = QueryFactors {
            geographic: Some("france".to_string()),
            thematic: Some("covid-19".to_string()),
            dataset_hint: "covid-19 datasets in france".to_string(),
        };

        // The category mask rejects everything, so both records are ranked
        let results = engine
            .rank("covid-19 datasets in france", &factors, &catalog)
            .await
            .unwrap();

        assert_eq!(names(&results), vec!["france-epi", "germany-epi"]);
        assert!(results[0].similarity > results[1].similarity);
    }

    #[tokio::test]
    async fn test_only_eligible_records_returned_without_padding() {
        let mut records: Vec<CatalogRecord> =
            (0..3).map(|i| record(&format!("fr{}", i), "France", "Claims")).collect();
        records.extend((0..10).map(|i| record(&format!("de{}", i), "Germany", "Claims")));
        let engine = RankingEngine::new(KeywordEmbedding::default());
        let factors = QueryFactors {
            geographic: Some("france".to_string()),
            thematic: None,
            dataset_hint: "claims".to_string(),
        };

        let results = engine.rank("claims in france", &factors, &catalog(records)).await.unwrap();

        assert_eq!(names(&results), vec!["fr0", "fr1", "fr2"]);
    }

    #[tokio::test]
    async fn test_placeholder_markers_reduce_score_by_exact_penalty() {
        let mut marked = record("marked", "France", "Claims");
        marked.vendor_name = Some("TBD".to_string());
        marked.description = Some("Details TBD".to_string());
        let engine = RankingEngine::new(KeywordEmbedding::default());

        let results = engine
            .rank("claims", &hint_only("claims"), &catalog(vec![marked]))
            .await
            .unwrap();

        let result = &results[0];
        assert!((result.penalty - 0.2).abs() < 1e-6);
        assert!((result.similarity - result.penalized_similarity - 0.2).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_penalty_demotes_otherwise_identical_record() {
        let clean = record("clean", "France", "Claims");
        let mut marked = record("marked", "France", "Claims");
        marked.thematic_coverage = Some("TBD".to_string());
        let engine = RankingEngine::new(KeywordEmbedding::default());

        let results = engine
            .rank("claims", &hint_only("claims"), &catalog(vec![marked, clean]))
            .await
            .unwrap();

        assert_eq!(names(&results), vec!["clean", "marked"]);
        let gap = results[0].penalized_similarity - results[1].penalized_similarity;
        assert!((gap - 0.1).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_ranking_is_idempotent() {
        let catalog = catalog(vec![
            record("a", "France", "Oncology"),
            record("b", "Germany", "Claims"),
            record("c", "France", "Oncology claims"),
        ]);
        let engine = RankingEngine::new(KeywordEmbedding::default());
        let factors = hint_only("oncology");

        let first = engine.rank("oncology", &factors, &catalog).await.unwrap();
        let second = engine.rank("oncology", &factors, &catalog).await.unwrap();

        assert_eq!(names(&first), names(&second));
        let scores = |r: &[ScoredRecord]| r.iter().map(|s| s.penalized_similarity).collect::<Vec<_>>();
        assert_eq!(scores(&first), scores(&second));
    }

    #[tokio::test]
    async fn test_comparison_strings_embedded_in_one_batch() {
        let mut sparse = record("sparse", "France", "Claims");
        sparse.geographic_coverage = None;
        let catalog = catalog(vec![record("full", "France", "Claims"), sparse]);
        let provider = Arc::new(KeywordEmbedding::default());
        let engine = RankingEngine::new(Arc::clone(&provider));
        let factors = QueryFactors {
            geographic: Some("france".to_string()),
            thematic: None,
            dataset_hint: "claims".to_string(),
        };

        engine.rank("claims", &factors, &catalog).await.unwrap();

        assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 1);
        let batches = provider.batches.lock().unwrap();
        assert_eq!(batches[0], vec!["France Claims".to_string(), " Claims".to_string()]);
    }

    #[tokio::test]
    async fn test_all_factors_absent_embeds_empty_strings() {
        let provider = Arc::new(KeywordEmbedding::default());
        let engine = RankingEngine::new(Arc::clone(&provider));
        let catalog = catalog(vec![record("a", "France", "Claims")]);

        let results = engine.rank("claims", &QueryFactors::default(), &catalog).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(provider.batches.lock().unwrap()[0], vec![String::new()]);
    }

    #[tokio::test]
    async fn test_stored_embeddings_mode_skips_batch() {
        let mut france = record("france", "France", "Claims");
        france.embedding = KeywordEmbedding::vector("france oncology");
        let mut germany = record("germany", "Germany", "Claims");
        germany.embedding = KeywordEmbedding::vector("germany");
        let (catalog, _) = Catalog::from_records(
            vec![germany, france],
            Some(EmbeddingConfig {
                model_name: "keyword-mock".to_string(),
                dimension: VOCABULARY.len(),
            }),
        );
        let provider = Arc::new(KeywordEmbedding::default());
        let engine = RankingEngine::new(Arc::clone(&provider))
            .with_scoring_mode(ScoringMode::StoredEmbeddings);

        let results = engine
            .rank("oncology in france", &hint_only("oncology in france"), &catalog)
            .await
            .unwrap();

        assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 0);
        assert_eq!(names(&results), vec!["france", "germany"]);
        assert!((results[0].similarity - 2.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_stored_embeddings_dimension_mismatch() {
        let mut r = record("a", "France", "Claims");
        r.embedding = vec![1.0, 0.0];
        let engine = RankingEngine::new(KeywordEmbedding::default())
            .with_scoring_mode(ScoringMode::StoredEmbeddings);

        let result = engine.rank("claims", &hint_only("claims"), &catalog(vec![r])).await;

        assert!(matches!(
            result,
            Err(QueryError::DimensionMismatch { query: 6, record: 2 })
        ));
    }

    #[tokio::test]
    async fn test_embedding_error_propagation() {
        let engine = RankingEngine::new(KeywordEmbedding::with_failure());
        let catalog = catalog(vec![record("a", "France", "Claims")]);

        let result = engine.rank("claims", &hint_only("claims"), &catalog).await;

        match result {
            Err(QueryError::Embedding(EmbeddingError::ModelUnavailable(_))) => {}
            other => panic!("Expected ModelUnavailable, got {:?}", other.map(|r| r.len())),
        }
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let engine = RankingEngine::new(KeywordEmbedding::default()).with_top_k(5);
        assert_eq!(engine.top_k(), 5);

        let results = engine.rank("claims", &hint_only("claims"), &Catalog::default()).await.unwrap();
        assert!(results.is_empty());
    }
}
