//! Candidate extraction: recency, self-promotion, phrase and score gates.
//!
//! A candidate only exists if its post passed every gate active for the call,
//! so downstream stages never re-check them.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use demandsignal_common::{
    DemandCandidate, DemandSignalError, ExtractionParams, Post, Result, ScoringWeights,
};

use crate::signals::SignalMatcher;
use crate::text::{collapse_whitespace, truncate_chars};

const DEFAULT_EXCERPT_CHARS: usize = 280;

/// Per-gate rejection counts for one extraction call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionStats {
    pub posts_seen: u32,
    pub too_old: u32,
    pub self_promo: u32,
    pub no_phrase: u32,
    pub below_min_score: u32,
    pub accepted: u32,
}

pub struct CandidateExtractor {
    matcher: SignalMatcher,
    weights: ScoringWeights,
    excerpt_chars: usize,
}

impl CandidateExtractor {
    pub fn new(matcher: SignalMatcher, weights: ScoringWeights) -> Self {
        Self {
            matcher,
            weights,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }

    pub fn with_excerpt_chars(mut self, excerpt_chars: usize) -> Self {
        self.excerpt_chars = excerpt_chars.max(1);
        self
    }

    /// Extract candidates, ordered by descending confidence (ties keep post order).
    ///
    /// `now` is the caller's reference instant; the extractor never reads the clock.
    pub fn extract(
        &self,
        posts: &[Post],
        params: &ExtractionParams,
        now: DateTime<Utc>,
    ) -> Result<Vec<DemandCandidate>> {
        self.extract_with_stats(posts, params, now)
            .map(|(candidates, _)| candidates)
    }

    pub fn extract_with_stats(
        &self,
        posts: &[Post],
        params: &ExtractionParams,
        now: DateTime<Utc>,
    ) -> Result<(Vec<DemandCandidate>, ExtractionStats)> {
        params.validate()?;
        self.weights.validate()?;
        if let Some(bad) = posts.iter().find(|p| !p.is_valid()) {
            return Err(DemandSignalError::DataContract(format!(
                "post '{}' from '{}' is missing an id or title",
                bad.id, bad.source_tag
            )));
        }

        let mut stats = ExtractionStats::default();
        let mut candidates = Vec::new();

        for post in posts {
            stats.posts_seen += 1;

            let age_hours = age_hours(post.created_at, now);
            if age_hours > params.max_age_hours {
                stats.too_old += 1;
                debug!(post = %post.key(), age_hours, "Rejected: older than window");
                continue;
            }

            let signal = self.matcher.scan(&format!("{}\n{}", post.title, post.body));
            if signal.self_promo && params.exclude_self_promo {
                stats.self_promo += 1;
                debug!(post = %post.key(), "Rejected: self-promotion");
                continue;
            }
            if !signal.has_demand() {
                stats.no_phrase += 1;
                continue;
            }

            let confidence = self.confidence(post, signal.phrases.len(), age_hours, params);
            if confidence < params.min_score {
                stats.below_min_score += 1;
                debug!(
                    post = %post.key(),
                    confidence,
                    min_score = params.min_score,
                    "Rejected: below min score"
                );
                continue;
            }

            stats.accepted += 1;
            candidates.push(DemandCandidate {
                post_id: post.id.clone(),
                source_tag: post.source_tag.clone(),
                title: post.title.clone(),
                author: post.author.clone(),
                permalink: post.permalink.clone(),
                query_tag: post.query_tag.clone(),
                created_at: post.created_at,
                engagement_score: post.engagement_score,
                reply_count: post.reply_count,
                matched_phrases: signal.phrases,
                confidence_score: confidence,
                excerpt: excerpt(&post.title, &post.body, self.excerpt_chars),
                age_hours: round4(age_hours),
                self_promo: signal.self_promo,
            });
        }

        candidates.sort_by(|a, b| b.confidence_score.total_cmp(&a.confidence_score));

        info!(
            posts = stats.posts_seen,
            accepted = stats.accepted,
            too_old = stats.too_old,
            self_promo = stats.self_promo,
            no_phrase = stats.no_phrase,
            below_min_score = stats.below_min_score,
            "Demand extraction complete"
        );

        Ok((candidates, stats))
    }

    /// Weighted confidence; see [`ScoringWeights`] for the formula.
    fn confidence(
        &self,
        post: &Post,
        distinct_phrases: usize,
        age_hours: f64,
        params: &ExtractionParams,
    ) -> f64 {
        let w = &self.weights;
        let phrases = w.phrase_weight * distinct_phrases as f64;
        let engagement =
            (w.engagement_weight * log_scale(post.engagement_score)).min(w.engagement_cap);
        let replies = (w.reply_weight * log_scale(post.reply_count)).min(w.reply_cap);
        let freshness = (1.0 - age_hours / params.max_age_hours).clamp(0.0, 1.0);
        let recency = w.recency_weight * freshness;
        let penalty = if post.body.trim().is_empty() {
            w.empty_body_penalty
        } else {
            0.0
        };
        round4((phrases + engagement + replies + recency - penalty).max(0.0))
    }
}

/// Hours between `created_at` and `now`; future timestamps count as fresh.
fn age_hours(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    ((now - created_at).num_milliseconds() as f64 / 3_600_000.0).max(0.0)
}

fn log_scale(count: i64) -> f64 {
    (count.max(0) as f64).ln_1p()
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn excerpt(title: &str, body: &str, max_chars: usize) -> String {
    let title = collapse_whitespace(title);
    let body = collapse_whitespace(body);
    let joined = if body.is_empty() {
        title
    } else if title.ends_with(['.', '?', '!', ':']) {
        format!("{title} {body}")
    } else {
        format!("{title}. {body}")
    };
    truncate_chars(&joined, max_chars)
}
