//! Lexical demand-signal matcher.
//!
//! Two disjoint heuristics over the same text: demand phrases ("wish there
//! was", "looking for", ...) and self-promotion indicators ("i built",
//! "show hn", links to commercial domains). Both are driven entirely by the
//! [`Vocabulary`] handed in at construction, so results are reproducible for
//! a given vocabulary and input.

use std::collections::HashSet;

use regex::Regex;

use demandsignal_common::{DemandSignalError, Result, Vocabulary};

use crate::text::normalize_words;

/// Outcome of scanning one piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignalMatch {
    /// Distinct demand phrases found, in vocabulary order.
    pub phrases: Vec<String>,
    pub self_promo: bool,
}

impl SignalMatch {
    pub fn has_demand(&self) -> bool {
        !self.phrases.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SignalMatcher {
    demand_phrases: Vec<String>,
    self_promo_phrases: Vec<String>,
    commercial_url: Option<Regex>,
    allowed_domains: Vec<String>,
}

impl SignalMatcher {
    pub fn new(vocabulary: &Vocabulary) -> Result<Self> {
        let demand_phrases = normalized_unique(
            vocabulary
                .demand_phrases
                .iter()
                .chain(vocabulary.query_terms.iter()),
        );
        if demand_phrases.is_empty() {
            return Err(DemandSignalError::Configuration(
                "demand vocabulary is empty".to_string(),
            ));
        }

        let self_promo_phrases = normalized_unique(vocabulary.self_promo_phrases.iter());
        let commercial_url = commercial_url_pattern(&vocabulary.commercial_tlds)?;
        let allowed_domains = vocabulary
            .allowed_domains
            .iter()
            .map(|d| d.trim().trim_start_matches("www.").to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        Ok(Self {
            demand_phrases,
            self_promo_phrases,
            commercial_url,
            allowed_domains,
        })
    }

    /// Active demand vocabulary after normalization and dedup.
    pub fn demand_phrases(&self) -> &[String] {
        &self.demand_phrases
    }

    pub fn scan(&self, text: &str) -> SignalMatch {
        let padded = format!(" {} ", normalize_words(text));
        let phrases = self
            .demand_phrases
            .iter()
            .filter(|p| contains_phrase(&padded, p))
            .cloned()
            .collect();
        let self_promo = self
            .self_promo_phrases
            .iter()
            .any(|p| contains_phrase(&padded, p))
            || self.links_commercial_domain(text);
        SignalMatch {
            phrases,
            self_promo,
        }
    }

    fn links_commercial_domain(&self, text: &str) -> bool {
        let Some(re) = &self.commercial_url else {
            return false;
        };
        re.captures_iter(text).any(|caps| {
            let host = caps[1].to_lowercase();
            !self
                .allowed_domains
                .iter()
                .any(|d| host == *d || host.ends_with(&format!(".{d}")))
        })
    }
}

/// Word-bounded containment against a text already padded with spaces.
fn contains_phrase(padded_text: &str, phrase: &str) -> bool {
    padded_text.contains(&format!(" {phrase} "))
}

fn normalized_unique<'a>(phrases: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    phrases
        .map(|p| normalize_words(p))
        .filter(|p| !p.is_empty())
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

/// `http(s)://host.tld` where tld is one of the configured commercial TLDs.
/// Capture group 1 is the host without a leading `www.`.
fn commercial_url_pattern(tlds: &[String]) -> Result<Option<Regex>> {
    let alternatives: Vec<String> = tlds
        .iter()
        .map(|t| t.trim().trim_start_matches('.').to_lowercase())
        .filter(|t| !t.is_empty())
        .map(|t| regex::escape(&t))
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }
    let pattern = format!(
        r"(?i)\bhttps?://(?:www\.)?((?:[a-z0-9-]+\.)+(?:{}))\b",
        alternatives.join("|")
    );
    Regex::new(&pattern)
        .map(Some)
        .map_err(|e| DemandSignalError::Configuration(format!("invalid TLD pattern: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> SignalMatcher {
        SignalMatcher::new(&Vocabulary::default()).unwrap()
    }

    #[test]
    fn matches_phrases_case_insensitively() {
        let m = matcher().scan("Is there a TOOL... I WISH there was one. Looking   for ideas");
        assert_eq!(m.phrases, vec!["looking for", "wish there was", "is there a tool"]);
        assert!(!m.self_promo);
    }

    #[test]
    fn repeated_phrase_reported_once() {
        let m = matcher().scan("looking for X. still looking for X. looking for anything");
        assert_eq!(m.phrases, vec!["looking for"]);
    }

    #[test]
    fn phrases_are_word_bounded() {
        // "overlooking former" contains "looking for" only as a substring.
        let m = matcher().scan("overlooking formerly known issues");
        assert!(m.phrases.is_empty());
    }

    #[test]
    fn query_terms_extend_vocabulary() {
        let vocab = Vocabulary::default().with_query_terms(["Invoice Splitter"]);
        let m = SignalMatcher::new(&vocab).unwrap().scan("an invoice splitter for teams");
        assert_eq!(m.phrases, vec!["invoice splitter"]);
    }

    #[test]
    fn duplicate_query_term_does_not_double_count() {
        let vocab = Vocabulary::default().with_query_terms(["looking for", "LOOKING  FOR"]);
        let matcher = SignalMatcher::new(&vocab).unwrap();
        let count = matcher
            .demand_phrases()
            .iter()
            .filter(|p| *p == "looking for")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn self_promo_phrases_detected() {
        assert!(matcher().scan("Show HN: I built a tool for invoices").self_promo);
        assert!(matcher().scan("Check out my new app").self_promo);
        assert!(matcher().scan("I've built something").self_promo);
    }

    #[test]
    fn commercial_links_flag_self_promo() {
        assert!(matcher().scan("Try it at https://www.invoicely.io/pricing").self_promo);
        assert!(!matcher()
            .scan("see https://stackoverflow.com/questions/1 and https://github.com/x/y")
            .self_promo);
        assert!(!matcher().scan("works on ASP.NET without links").self_promo);
    }

    #[test]
    fn demand_and_self_promo_can_coexist() {
        let m = matcher().scan("I built this because I wish there was a simpler tracker");
        assert!(m.has_demand());
        assert!(m.self_promo);
    }

    #[test]
    fn empty_vocabulary_is_rejected() {
        let vocab = Vocabulary {
            demand_phrases: vec!["  ".to_string()],
            query_terms: vec![],
            ..Vocabulary::default()
        };
        assert!(matches!(
            SignalMatcher::new(&vocab),
            Err(DemandSignalError::Configuration(_))
        ));
    }

    #[test]
    fn no_tlds_disables_link_heuristic() {
        let vocab = Vocabulary {
            commercial_tlds: vec![],
            ..Vocabulary::default()
        };
        let m = SignalMatcher::new(&vocab).unwrap().scan("https://acme.io looking for");
        assert!(!m.self_promo);
    }
}
