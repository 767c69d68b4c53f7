//! FastEmbed embedding provider implementation.
//!
//! Runs sentence-transformer models locally through ONNX, so neither the offline
//! ingestion job nor the search service needs a network embedding API.
//!
//! Inference is CPU-bound. Calls are moved onto tokio's blocking pool and
//! serialized behind a mutex: the model is not assumed to be reentrant.

use super::{EmbeddingError, EmbeddingProvider, EmbeddingResult};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Default model, matching the one used to build catalog artifacts.
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Resolve a sentence-transformers style model name to a FastEmbed model and
/// its embedding dimension.
pub fn parse_model_name(name: &str) -> EmbeddingResult<(EmbeddingModel, usize)> {
    let normalized = name
        .trim()
        .trim_start_matches("sentence-transformers/")
        .to_lowercase();

    let resolved = match normalized.as_str() {
        "all-minilm-l6-v2" | "allminilml6v2" => (EmbeddingModel::AllMiniLML6V2, 384),
        "bge-small-en-v1.5" | "bgesmallenv15" => (EmbeddingModel::BGESmallENV15, 384),
        "bge-base-en-v1.5" | "bgebaseenv15" => (EmbeddingModel::BGEBaseENV15, 768),
        "bge-large-en-v1.5" | "bgelargeenv15" => (EmbeddingModel::BGELargeENV15, 1024),
        "nomic-embed-text-v1" | "nomicembedtextv1" => (EmbeddingModel::NomicEmbedTextV1, 768),
        "nomic-embed-text-v1.5" | "nomicembedtextv15" => (EmbeddingModel::NomicEmbedTextV15, 768),
        "paraphrase-multilingual-minilm-l12-v2" | "paraphrasemlminilml12v2" => {
            (EmbeddingModel::ParaphraseMLMiniLML12V2, 384)
        }
        "paraphrase-multilingual-mpnet-base-v2" | "paraphrasemlmpnetbasev2" => {
            (EmbeddingModel::ParaphraseMLMpnetBaseV2, 768)
        }
        _ => {
            return Err(EmbeddingError::ModelUnavailable(format!(
                "Unsupported embedding model: {}",
                name
            )))
        }
    };
    Ok(resolved)
}

/// Per-user model cache, falling back to `.cache/fastembed` under the working
/// directory when the platform has no cache dir.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("fastembed"))
        .unwrap_or_else(|| PathBuf::from(".cache/fastembed"))
}

/// FastEmbed embedding provider.
#[derive(Clone)]
pub struct FastEmbedProvider {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    embedding_dimension: usize,
}

impl FastEmbedProvider {
    /// Load a FastEmbed model by name.
    ///
    /// # Arguments
    /// * `model_name` - Model identifier (defaults to all-MiniLM-L6-v2)
    /// * `cache_dir` - Optional cache directory for model files
    ///
    /// # Errors
    /// Returns `EmbeddingError::ModelUnavailable` if the name is unknown or the
    /// model cannot be downloaded or loaded
    pub fn new(model_name: Option<&str>, cache_dir: Option<PathBuf>) -> EmbeddingResult<Self> {
        let model_name = model_name.unwrap_or(DEFAULT_MODEL_NAME).to_string();
        let (model_type, embedding_dimension) = parse_model_name(&model_name)?;

        let mut init_options = InitOptions::new(model_type);
        if let Some(dir) = cache_dir {
            debug!("Using FastEmbed cache directory: {}", dir.display());
            init_options = init_options.with_cache_dir(dir);
        }

        let text_embedding = TextEmbedding::try_new(init_options).map_err(|e| {
            EmbeddingError::ModelUnavailable(format!("Failed to initialize FastEmbed model: {}", e))
        })?;

        info!(
            "Loaded embedding model {} (dimension: {})",
            model_name, embedding_dimension
        );

        Ok(Self {
            model: Arc::new(Mutex::new(text_embedding)),
            model_name,
            embedding_dimension,
        })
    }

    async fn run(&self, texts: Vec<String>) -> EmbeddingResult<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.model);
        let expected = texts.len();

        let embeddings = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| EmbeddingError::ModelUnavailable("Model lock poisoned".to_string()))?;
            model
                .embed(texts, None)
                .map_err(|e| EmbeddingError::Generation(e.to_string()))
        })
        .await
        .map_err(|e| EmbeddingError::ModelUnavailable(format!("Embedding task failed: {}", e)))??;

        if embeddings.len() != expected {
            return Err(EmbeddingError::Generation(format!(
                "Expected {} embeddings, model returned {}",
                expected,
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("Text cannot be empty".to_string()));
        }

        self.run(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Generation("No embedding generated".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        self.run(texts.iter().map(|&s| s.to_string()).collect()).await
    }

    fn dimension(&self) -> usize {
        self.embedding_dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

// TextEmbedding does not implement Debug
impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("model_name", &self.model_name)
            .field("embedding_dimension", &self.embedding_dimension)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_provider() -> FastEmbedProvider {
        FastEmbedProvider::new(None, None).expect("Failed to create default FastEmbedProvider")
    }

    #[test]
    fn test_parse_model_name() {
        let (model, dim) = parse_model_name("all-MiniLM-L6-v2").unwrap();
        assert!(matches!(model, EmbeddingModel::AllMiniLML6V2));
        assert_eq!(dim, 384);

        let (_, dim) = parse_model_name("sentence-transformers/all-MiniLM-L6-v2").unwrap();
        assert_eq!(dim, 384);

        let (_, dim) = parse_model_name("BGE-Base-EN-v1.5").unwrap();
        assert_eq!(dim, 768);
    }

    #[test]
    fn test_parse_unknown_model_is_unavailable() {
        match parse_model_name("not-a-model") {
            Err(EmbeddingError::ModelUnavailable(msg)) => assert!(msg.contains("not-a-model")),
            other => panic!("Expected ModelUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_default_cache_dir() {
        assert!(default_cache_dir().ends_with("fastembed"));
    }

    #[test]
    fn test_unknown_model_fails_before_download() {
        let result = FastEmbedProvider::new(Some("gpt-embeddings"), None);
        assert!(matches!(result, Err(EmbeddingError::ModelUnavailable(_))));
    }

    #[tokio::test]
    #[ignore = "downloads the ONNX model"]
    async fn test_embed_single_text() {
        let provider = create_test_provider();
        let embedding = provider.embed("Hospital claims in France").await.unwrap();

        assert_eq!(embedding.len(), provider.dimension());
        assert!(embedding.iter().all(|x| x.is_finite()));
    }

    #[tokio::test]
    #[ignore = "downloads the ONNX model"]
    async fn test_embed_empty_text() {
        let provider = create_test_provider();
        let result = provider.embed("   ").await;
        assert!(matches!(result, Err(EmbeddingError::InvalidInput(_))));
    }

    #[tokio::test]
    #[ignore = "downloads the ONNX model"]
    async fn test_embed_batch_accepts_empty_members() {
        let provider = create_test_provider();
        let texts = vec!["France Oncology", "", "Germany Claims"];

        let embeddings = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 3);
        for embedding in &embeddings {
            assert_eq!(embedding.len(), provider.dimension());
        }
        assert_ne!(embeddings[0], embeddings[2]);
    }

    #[tokio::test]
    #[ignore = "downloads the ONNX model"]
    async fn test_embed_batch_consistency_with_single_embed() {
        let provider = create_test_provider();
        let text = "Epidemiology registry";

        let single = provider.embed(text).await.unwrap();
        let batch = provider.embed_batch(&[text, "another text"]).await.unwrap();

        for (a, b) in single.iter().zip(batch[0].iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[tokio::test]
    #[ignore = "downloads the ONNX model"]
    async fn test_concurrent_embeddings() {
        let provider = Arc::new(create_test_provider());

        let mut handles = vec![];
        for i in 0..5 {
            let provider = Arc::clone(&provider);
            handles.push(tokio::spawn(async move {
                provider.embed(&format!("Concurrent query {}", i)).await
            }));
        }

        for handle in handles {
            let result = handle.await.expect("Task should complete");
            assert!(result.is_ok());
        }
    }
}
