use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DemandSignalError, Result};

/// Phrases that mark a post as expressing an unmet need.
const BASELINE_DEMAND_PHRASES: &[&str] = &[
    "need a tool",
    "need an app",
    "need app",
    "need a way to",
    "looking for",
    "wish there was",
    "wish there were",
    "how do i automate",
    "how can i automate",
    "any software for",
    "any tool for",
    "any app for",
    "is there a tool",
    "is there an app",
    "is there a way to",
    "struggling with",
    "frustrated with",
    "alternative to",
    "would pay for",
    "does anyone know",
];

/// Phrases that mark the author as promoting their own product.
const BASELINE_SELF_PROMO_PHRASES: &[&str] = &[
    "i built",
    "i ve built",
    "i made",
    "i created",
    "we built",
    "check out my",
    "launching my",
    "just launched",
    "we launched",
    "show hn",
    "my startup",
    "our product",
    "i m building",
    "introducing",
];

const COMMERCIAL_TLDS: &[&str] = &["com", "io", "app", "ai", "co", "dev", "so", "xyz", "net"];

/// Hosts whose links are discussion context, not product pitches.
const ALLOWED_DOMAINS: &[&str] = &[
    "ycombinator.com",
    "stackoverflow.com",
    "stackexchange.com",
    "superuser.com",
    "serverfault.com",
    "askubuntu.com",
    "github.com",
    "youtube.com",
    "google.com",
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Lexical vocabulary for the signal matcher. Passed explicitly so runs with
/// different vocabularies never interfere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub demand_phrases: Vec<String>,
    /// Active search queries; matched exactly like baseline phrases.
    pub query_terms: Vec<String>,
    pub self_promo_phrases: Vec<String>,
    pub commercial_tlds: Vec<String>,
    pub allowed_domains: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            demand_phrases: owned(BASELINE_DEMAND_PHRASES),
            query_terms: Vec::new(),
            self_promo_phrases: owned(BASELINE_SELF_PROMO_PHRASES),
            commercial_tlds: owned(COMMERCIAL_TLDS),
            allowed_domains: owned(ALLOWED_DOMAINS),
        }
    }
}

impl Vocabulary {
    pub fn with_query_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query_terms = terms.into_iter().map(Into::into).collect();
        self
    }
}

/// Weights for the confidence formula:
///
/// ```text
/// phrases    = phrase_weight * distinct_phrases
/// engagement = min(engagement_cap, engagement_weight * ln(1 + engagement))
/// replies    = min(reply_cap, reply_weight * ln(1 + replies))
/// recency    = recency_weight * (1 - age_hours / max_age_hours)
/// confidence = max(0, phrases + engagement + replies + recency - empty_body_penalty?)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub phrase_weight: f64,
    pub engagement_weight: f64,
    pub engagement_cap: f64,
    pub reply_weight: f64,
    pub reply_cap: f64,
    pub recency_weight: f64,
    pub empty_body_penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            phrase_weight: 2.0,
            engagement_weight: 0.5,
            engagement_cap: 2.0,
            reply_weight: 0.5,
            reply_cap: 1.5,
            recency_weight: 1.0,
            empty_body_penalty: 1.0,
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("phrase_weight", self.phrase_weight),
            ("engagement_weight", self.engagement_weight),
            ("engagement_cap", self.engagement_cap),
            ("reply_weight", self.reply_weight),
            ("reply_cap", self.reply_cap),
            ("recency_weight", self.recency_weight),
            ("empty_body_penalty", self.empty_body_penalty),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(DemandSignalError::Configuration(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Per-run extraction gates. No defaults: the caller decides every value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionParams {
    pub max_age_hours: f64,
    pub min_score: f64,
    pub exclude_self_promo: bool,
}

impl ExtractionParams {
    pub fn validate(&self) -> Result<()> {
        if !self.max_age_hours.is_finite() || self.max_age_hours <= 0.0 {
            return Err(DemandSignalError::Configuration(format!(
                "max_age_hours must be > 0, got {}",
                self.max_age_hours
            )));
        }
        if self.min_score.is_nan() {
            return Err(DemandSignalError::Configuration(
                "min_score must be a number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Tunable engine configuration, loadable from a TOML file with
/// `[vocabulary]` and `[weights]` tables. Missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub vocabulary: Vocabulary,
    pub weights: ScoringWeights,
    pub excerpt_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vocabulary: Vocabulary::default(),
            weights: ScoringWeights::default(),
            excerpt_chars: 280,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| DemandSignalError::Configuration(format!("invalid engine config: {e}")))?;
        config.weights.validate()?;
        if config.excerpt_chars == 0 {
            return Err(DemandSignalError::Configuration(
                "excerpt_chars must be > 0".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DemandSignalError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_include_core_demand_phrases() {
        let vocab = Vocabulary::default();
        for phrase in ["need a tool", "looking for", "wish there was", "struggling with"] {
            assert!(vocab.demand_phrases.iter().any(|p| p == phrase), "missing {phrase}");
        }
        assert!(vocab.query_terms.is_empty());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [weights]
            phrase_weight = 3.5

            [vocabulary]
            query_terms = ["need app"]
            "#,
        )
        .unwrap();
        assert_eq!(config.weights.phrase_weight, 3.5);
        assert_eq!(config.weights.reply_cap, ScoringWeights::default().reply_cap);
        assert_eq!(config.vocabulary.query_terms, vec!["need app".to_string()]);
        assert_eq!(
            config.vocabulary.demand_phrases,
            Vocabulary::default().demand_phrases
        );
        assert_eq!(config.excerpt_chars, 280);
    }

    #[test]
    fn negative_weight_is_rejected() {
        let err = EngineConfig::from_toml_str("[weights]\nreply_weight = -1.0\n").unwrap_err();
        assert!(matches!(err, DemandSignalError::Configuration(_)));
    }

    #[test]
    fn malformed_toml_is_configuration_error() {
        let err = EngineConfig::from_toml_str("[weights\nphrase_weight = 1").unwrap_err();
        assert!(matches!(err, DemandSignalError::Configuration(_)));
    }

    #[test]
    fn extraction_params_require_positive_window() {
        let ok = ExtractionParams {
            max_age_hours: 168.0,
            min_score: -5.0,
            exclude_self_promo: true,
        };
        assert!(ok.validate().is_ok());

        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let params = ExtractionParams {
                max_age_hours: bad,
                ..ok
            };
            assert!(params.validate().is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn with_query_terms_replaces_terms() {
        let vocab = Vocabulary::default().with_query_terms(["need app", "any software for"]);
        assert_eq!(vocab.query_terms.len(), 2);
    }
}
