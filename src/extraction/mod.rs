//! Query factor extraction.
//!
//! Turns a normalized query into [`QueryFactors`]: an optional geographic hint,
//! an optional thematic hint and the dataset hint (always the full query).
//!
//! Extraction is split in two seams:
//!
//! - [`EntityRecognizer`] finds labelled entities in the text, in scan order.
//! - [`FactorStrategy`] decides which entity fills a factor when several map to
//!   the same category.
//!
//! Neither step fails on a query without entities; absence is `None`.

pub mod gazetteer;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::models::QueryFactors;

pub use gazetteer::{GazetteerEntry, GazetteerRecognizer};

/// Errors raised while building a recognizer. Extraction itself never fails.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Failed to read a gazetteer file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse a gazetteer file
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The gazetteer could not be compiled into a matcher
    #[error("Invalid gazetteer pattern: {0}")]
    PatternError(String),
}

/// Result type for extraction setup.
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Named-entity labels, using the conventional OntoNotes tag names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    /// Countries, cities, states
    Gpe,
    /// Non-GPE locations (regions, continents)
    Loc,
    Org,
    Product,
    Event,
    WorkOfArt,
    /// Nationalities, religious or political groups
    Norp,
}

/// Factor slot an entity label feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorCategory {
    Geographic,
    Thematic,
}

impl EntityLabel {
    pub fn category(self) -> Option<FactorCategory> {
        match self {
            EntityLabel::Gpe | EntityLabel::Loc => Some(FactorCategory::Geographic),
            EntityLabel::Org | EntityLabel::Product | EntityLabel::Event | EntityLabel::WorkOfArt => {
                Some(FactorCategory::Thematic)
            }
            EntityLabel::Norp => None,
        }
    }
}

/// An entity found in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Matched text, as it appears in the input
    pub text: String,
    pub label: EntityLabel,
    /// Byte offset of the match start
    pub start: usize,
    /// Byte offset one past the match end
    pub end: usize,
}

/// Trait for named-entity recognizers.
pub trait EntityRecognizer: Send + Sync {
    /// Find entities in `text`, ordered by position.
    fn recognize(&self, text: &str) -> Vec<Entity>;
}

/// Policy for filling a factor when several entities share its category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FactorStrategy {
    /// Each matching entity overwrites the previous one
    #[default]
    LastMatchWins,
    /// The first matching entity is kept
    FirstMatchWins,
}

impl FactorStrategy {
    fn fill(self, slot: &mut Option<String>, value: &str) {
        match self {
            FactorStrategy::LastMatchWins => *slot = Some(value.to_string()),
            FactorStrategy::FirstMatchWins => {
                if slot.is_none() {
                    *slot = Some(value.to_string());
                }
            }
        }
    }
}

impl FromStr for FactorStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "last-match-wins" | "last" => Ok(FactorStrategy::LastMatchWins),
            "first-match-wins" | "first" => Ok(FactorStrategy::FirstMatchWins),
            other => Err(format!(
                "unknown factor strategy '{}' (expected last-match-wins or first-match-wins)",
                other
            )),
        }
    }
}

impl fmt::Display for FactorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorStrategy::LastMatchWins => write!(f, "last-match-wins"),
            FactorStrategy::FirstMatchWins => write!(f, "first-match-wins"),
        }
    }
}

/// Extracts [`QueryFactors`] from normalized queries.
pub struct FactorExtractor {
    recognizer: Box<dyn EntityRecognizer>,
    strategy: FactorStrategy,
}

impl FactorExtractor {
    pub fn new(recognizer: impl EntityRecognizer + 'static, strategy: FactorStrategy) -> Self {
        Self {
            recognizer: Box::new(recognizer),
            strategy,
        }
    }

    pub fn strategy(&self) -> FactorStrategy {
        self.strategy
    }

    /// Extract factors from an already-normalized query.
    pub fn extract(&self, query: &str) -> QueryFactors {
        let mut factors = QueryFactors::from_query(query);

        for entity in self.recognizer.recognize(query) {
            match entity.label.category() {
                Some(FactorCategory::Geographic) => {
                    self.strategy.fill(&mut factors.geographic, &entity.text)
                }
                Some(FactorCategory::Thematic) => {
                    self.strategy.fill(&mut factors.thematic, &entity.text)
                }
                None => {}
            }
        }

        debug!(
            geographic = ?factors.geographic,
            thematic = ?factors.thematic,
            "Extracted query factors"
        );
        factors
    }
}

impl Default for FactorExtractor {
    fn default() -> Self {
        Self::new(GazetteerRecognizer::default(), FactorStrategy::default())
    }
}

impl fmt::Debug for FactorExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactorExtractor")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}
