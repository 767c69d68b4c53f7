//! Gazetteer-based entity recognizer.
//!
//! Matches a labelled phrase list against the text, case-insensitively and on
//! whole words. All phrases are compiled into one alternation, longest first, so
//! "united states" wins over "states" and matches come back in scan order.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::{Entity, EntityLabel, EntityRecognizer, ExtractionError, ExtractionResult};

/// A single phrase with the entity label it denotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GazetteerEntry {
    pub phrase: String,
    pub label: EntityLabel,
}

impl GazetteerEntry {
    pub fn new(phrase: &str, label: EntityLabel) -> Self {
        Self {
            phrase: phrase.to_string(),
            label,
        }
    }
}

const COUNTRIES: &[&str] = &[
    "argentina", "australia", "austria", "belgium", "brazil", "bulgaria", "canada",
    "chile", "china", "colombia", "croatia", "czech republic", "czechia", "denmark",
    "egypt", "estonia", "finland", "france", "germany", "greece", "hong kong",
    "hungary", "iceland", "india", "indonesia", "ireland", "israel", "italy", "japan",
    "kenya", "latvia", "lithuania", "luxembourg", "malaysia", "mexico", "morocco",
    "netherlands", "new zealand", "nigeria", "norway", "pakistan", "peru",
    "philippines", "poland", "portugal", "romania", "russia", "saudi arabia",
    "singapore", "slovakia", "slovenia", "south africa", "south korea", "korea",
    "spain", "sweden", "switzerland", "taiwan", "thailand", "turkey", "ukraine",
    "united arab emirates", "uae", "united kingdom", "uk", "great britain",
    "england", "scotland", "wales", "united states", "usa", "us", "vietnam",
];

const REGIONS: &[&str] = &[
    "africa", "asia", "asia pacific", "apac", "europe", "eu", "emea", "latin america",
    "latam", "middle east", "north america", "south america", "central america",
    "oceania", "scandinavia", "nordics", "western europe", "eastern europe",
    "southeast asia", "global", "worldwide",
];

const ORGANIZATIONS: &[&str] = &[
    "who", "cdc", "fda", "ema", "nhs", "cms", "nih", "ecdc", "medicare", "medicaid",
    "iqvia", "optum", "flatiron", "komodo", "cprd", "seer",
];

const EVENTS: &[&str] = &[
    "covid-19", "covid", "sars-cov-2", "coronavirus", "influenza", "h1n1", "mpox", "ebola",
];

const PRODUCTS: &[&str] = &["ehr", "emr", "claims database", "registry"];

/// Built-in phrase list covering common countries, regions and health-data terms.
pub fn default_entries() -> Vec<GazetteerEntry> {
    let groups: [(&[&str], EntityLabel); 5] = [
        (COUNTRIES, EntityLabel::Gpe),
        (REGIONS, EntityLabel::Loc),
        (ORGANIZATIONS, EntityLabel::Org),
        (EVENTS, EntityLabel::Event),
        (PRODUCTS, EntityLabel::Product),
    ];

    groups
        .iter()
        .flat_map(|(phrases, label)| phrases.iter().map(move |p| GazetteerEntry::new(p, *label)))
        .collect()
}

/// Entity recognizer backed by a phrase list.
#[derive(Debug, Clone)]
pub struct GazetteerRecognizer {
    pattern: Option<Regex>,
    labels: HashMap<String, EntityLabel>,
}

impl GazetteerRecognizer {
    /// Compile a recognizer from phrase entries.
    ///
    /// Later entries override the label of an earlier identical phrase.
    /// Blank phrases are skipped.
    pub fn new(entries: Vec<GazetteerEntry>) -> ExtractionResult<Self> {
        let mut labels = HashMap::new();
        for entry in entries {
            let phrase = entry.phrase.trim().to_lowercase();
            if !phrase.is_empty() {
                labels.insert(phrase, entry.label);
            }
        }

        let mut phrases: Vec<&String> = labels.keys().collect();
        phrases.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let pattern = if phrases.is_empty() {
            None
        } else {
            let alternation = phrases
                .iter()
                .map(|p| word_bounded(p))
                .collect::<Vec<_>>()
                .join("|");
            let regex = Regex::new(&format!("(?i){}", alternation))
                .map_err(|e| ExtractionError::PatternError(e.to_string()))?;
            Some(regex)
        };

        Ok(Self { pattern, labels })
    }

    /// Load entries from a JSON array of `{"phrase": ..., "label": ...}` objects.
    ///
    /// With `extend_defaults`, the file's entries are layered over the built-in list.
    pub fn from_file(path: &Path, extend_defaults: bool) -> ExtractionResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let file_entries: Vec<GazetteerEntry> = serde_json::from_str(&contents)
            .map_err(|e| ExtractionError::ParseError(format!("{}: {}", path.display(), e)))?;

        let mut entries = if extend_defaults {
            default_entries()
        } else {
            Vec::new()
        };
        entries.extend(file_entries);
        Self::new(entries)
    }

    /// Number of distinct phrases.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for GazetteerRecognizer {
    fn default() -> Self {
        // Built-in phrases are escaped literals; compilation cannot fail
        Self::new(default_entries()).unwrap_or_else(|_| Self {
            pattern: None,
            labels: HashMap::new(),
        })
    }
}

impl EntityRecognizer for GazetteerRecognizer {
    fn recognize(&self, text: &str) -> Vec<Entity> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };

        pattern
            .find_iter(text)
            .filter_map(|m| {
                let label = self.labels.get(&m.as_str().to_lowercase())?;
                Some(Entity {
                    text: m.as_str().to_string(),
                    label: *label,
                    start: m.start(),
                    end: m.end(),
                })
            })
            .collect()
    }
}

/// Escape a phrase and anchor it on word boundaries where it starts or ends
/// with a word character.
fn word_bounded(phrase: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut out = String::new();
    if phrase.chars().next().is_some_and(is_word) {
        out.push_str(r"\b");
    }
    out.push_str(&regex::escape(phrase));
    if phrase.chars().last().is_some_and(is_word) {
        out.push_str(r"\b");
    }
    out
}
