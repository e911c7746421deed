use std::collections::BTreeMap;

use demandsignal_common::{
    DemandCandidate, DemandCluster, MetaSummary, PhraseCount, Post, TopCluster,
};

/// Aggregate counts over one run. Diagnostic only: nothing is filtered.
pub fn build_meta_summary(
    posts: &[Post],
    candidates: &[DemandCandidate],
    clusters: &[DemandCluster],
    top_n: usize,
) -> MetaSummary {
    let mut posts_by_source: BTreeMap<String, usize> = BTreeMap::new();
    for post in posts {
        *posts_by_source.entry(post.source_tag.clone()).or_default() += 1;
    }

    let mut candidates_by_source: BTreeMap<String, usize> = BTreeMap::new();
    let mut phrase_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for candidate in candidates {
        *candidates_by_source
            .entry(candidate.source_tag.clone())
            .or_default() += 1;
        for phrase in &candidate.matched_phrases {
            *phrase_counts.entry(phrase.as_str()).or_default() += 1;
        }
    }

    let mut top_phrases: Vec<PhraseCount> = phrase_counts
        .into_iter()
        .map(|(phrase, count)| PhraseCount {
            phrase: phrase.to_string(),
            count,
        })
        .collect();
    // BTreeMap iteration already sorted by phrase; stable sort keeps that for ties.
    top_phrases.sort_by(|a, b| b.count.cmp(&a.count));
    top_phrases.truncate(top_n);

    // Largest first; score then id break ties.
    let mut by_size: Vec<&DemandCluster> = clusters.iter().collect();
    by_size.sort_by(|a, b| {
        b.size
            .cmp(&a.size)
            .then_with(|| b.aggregate_score.total_cmp(&a.aggregate_score))
            .then_with(|| a.id.cmp(&b.id))
    });
    let top_clusters = by_size
        .into_iter()
        .take(top_n)
        .map(|c| TopCluster {
            cluster_id: c.id,
            representative_excerpt: c.representative_excerpt.clone(),
            size: c.size,
            aggregate_score: c.aggregate_score,
            sources: c.sources.iter().cloned().collect(),
        })
        .collect();

    let candidate_rate = if posts.is_empty() {
        0.0
    } else {
        candidates.len() as f64 / posts.len() as f64
    };

    MetaSummary {
        total_posts: posts.len(),
        total_candidates: candidates.len(),
        total_clusters: clusters.len(),
        candidate_rate,
        multi_member_clusters: clusters.iter().filter(|c| c.size > 1).count(),
        cross_source_clusters: clusters.iter().filter(|c| c.sources.len() > 1).count(),
        posts_by_source,
        candidates_by_source,
        top_phrases,
        top_clusters,
    }
}
