use demandsignal_common::{DemandCluster, SeedDocument, SeedIdea};

use crate::text::{collapse_whitespace, truncate_chars};

const SEED_TITLE_CHARS: usize = 120;

/// Reduce clusters to idea seeds: exactly one seed per cluster, same order.
/// Per-member detail is dropped except for a few sample permalinks.
pub fn build_seed(clusters: &[DemandCluster], source_name: &str, max_samples: usize) -> SeedDocument {
    let ideas = clusters
        .iter()
        .map(|cluster| {
            let representative = cluster.representative();
            let title = representative
                .map(|m| m.title.as_str())
                .unwrap_or(cluster.representative_excerpt.as_str());
            SeedIdea {
                cluster_id: cluster.id,
                title: truncate_chars(&collapse_whitespace(title), SEED_TITLE_CHARS),
                problem_statement: cluster.representative_excerpt.clone(),
                evidence_count: cluster.size,
                aggregate_score: cluster.aggregate_score,
                primary_source: representative
                    .map(|m| m.source_tag.clone())
                    .unwrap_or_default(),
                source_tags: cluster.sources.iter().cloned().collect(),
                sample_permalinks: cluster
                    .members
                    .iter()
                    .map(|m| m.permalink.clone())
                    .filter(|p| !p.is_empty())
                    .take(max_samples)
                    .collect(),
            }
        })
        .collect();

    SeedDocument {
        source: source_name.to_string(),
        ideas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouper::cluster;
    use chrono::{TimeZone, Utc};
    use demandsignal_common::DemandCandidate;

    fn candidate(id: &str, title: &str, score: f64) -> DemandCandidate {
        DemandCandidate {
            post_id: id.to_string(),
            source_tag: "hackernews".to_string(),
            title: title.to_string(),
            author: String::new(),
            permalink: format!("https://news.ycombinator.com/item?id={id}"),
            query_tag: String::new(),
            created_at: Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap(),
            engagement_score: 0,
            reply_count: 0,
            matched_phrases: vec!["looking for".to_string()],
            confidence_score: score,
            excerpt: format!("{title}. some body text"),
            age_hours: 0.0,
            self_promo: false,
        }
    }

    #[test]
    fn one_seed_per_cluster() {
        let clusters = cluster(
            &[
                candidate("1", "Invoice splitter", 3.0),
                candidate("2", "invoice splitter", 2.0),
                candidate("3", "Garden timer", 1.0),
            ],
            0.5,
        )
        .unwrap();
        let seed = build_seed(&clusters, "social", 1);

        assert_eq!(seed.source, "social");
        assert_eq!(seed.ideas.len(), clusters.len());
        for (idea, cluster) in seed.ideas.iter().zip(&clusters) {
            assert_eq!(idea.cluster_id, cluster.id);
            assert_eq!(idea.evidence_count, cluster.size);
        }
        assert_eq!(seed.ideas[0].title, "Invoice splitter");
        assert_eq!(seed.ideas[0].primary_source, "hackernews");
        assert_eq!(seed.ideas[0].sample_permalinks.len(), 1);
    }

    #[test]
    fn empty_clusters_give_empty_seed() {
        assert!(build_seed(&[], "social", 3).ideas.is_empty());
    }
}
