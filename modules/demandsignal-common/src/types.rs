use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Posts ---

/// A normalized post from any public discussion source.
/// Source clients convert their native payloads into this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    /// "hackernews" or "stackexchange:<site>"
    pub source_tag: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author: String,
    pub created_at: DateTime<Utc>,
    /// Upvotes / points / question score.
    #[serde(default)]
    pub engagement_score: i64,
    /// Comments or answers.
    #[serde(default)]
    pub reply_count: i64,
    pub permalink: String,
    #[serde(default)]
    pub url: String,
    /// Which search query produced this post, e.g. "hn:need app".
    #[serde(default)]
    pub query_tag: String,
}

impl Post {
    /// Globally unique key: `<source_tag>:<id>`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.source_tag, self.id)
    }

    /// True when the post carries everything the engine relies on.
    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty() && !self.title.trim().is_empty()
    }
}

// --- Candidates ---

/// A post that passed every extraction gate. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandCandidate {
    pub post_id: String,
    pub source_tag: String,
    pub title: String,
    pub author: String,
    pub permalink: String,
    pub query_tag: String,
    pub created_at: DateTime<Utc>,
    pub engagement_score: i64,
    pub reply_count: i64,
    /// Distinct demand phrases found, in vocabulary order.
    pub matched_phrases: Vec<String>,
    pub confidence_score: f64,
    pub excerpt: String,
    pub age_hours: f64,
    /// Only ever true when self-promotion was explicitly admitted.
    pub self_promo: bool,
}

impl DemandCandidate {
    pub fn key(&self) -> String {
        format!("{}:{}", self.source_tag, self.post_id)
    }
}

// --- Clusters ---

/// Per-member detail carried by a cluster for report rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMember {
    pub key: String,
    pub post_id: String,
    pub source_tag: String,
    pub title: String,
    pub permalink: String,
    pub excerpt: String,
    pub confidence_score: f64,
    pub created_at: DateTime<Utc>,
}

impl From<&DemandCandidate> for ClusterMember {
    fn from(c: &DemandCandidate) -> Self {
        Self {
            key: c.key(),
            post_id: c.post_id.clone(),
            source_tag: c.source_tag.clone(),
            title: c.title.clone(),
            permalink: c.permalink.clone(),
            excerpt: c.excerpt.clone(),
            confidence_score: c.confidence_score,
            created_at: c.created_at,
        }
    }
}

/// A group of mutually similar candidates standing for one underlying demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandCluster {
    /// 1-based rank in the ordered cluster list.
    pub id: usize,
    pub representative_key: String,
    pub representative_excerpt: String,
    pub aggregate_score: f64,
    pub sources: BTreeSet<String>,
    pub size: usize,
    /// Ranked members; the first one is the representative.
    pub members: Vec<ClusterMember>,
}

impl DemandCluster {
    pub fn member_ids(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.key.as_str())
    }

    pub fn representative(&self) -> Option<&ClusterMember> {
        self.members.first()
    }
}

// --- Meta summary ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseCount {
    pub phrase: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCluster {
    pub cluster_id: usize,
    pub representative_excerpt: String,
    pub size: usize,
    pub aggregate_score: f64,
    pub sources: Vec<String>,
}

/// Diagnostic aggregate over one run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaSummary {
    pub total_posts: usize,
    pub total_candidates: usize,
    pub total_clusters: usize,
    /// Fraction of posts that became candidates (0.0 when there are no posts).
    pub candidate_rate: f64,
    pub multi_member_clusters: usize,
    pub cross_source_clusters: usize,
    pub posts_by_source: BTreeMap<String, usize>,
    pub candidates_by_source: BTreeMap<String, usize>,
    pub top_phrases: Vec<PhraseCount>,
    pub top_clusters: Vec<TopCluster>,
}

impl std::fmt::Display for MetaSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Demand Run Complete ===")?;
        writeln!(f, "Total posts:        {}", self.total_posts)?;
        writeln!(f, "Demand candidates:  {}", self.total_candidates)?;
        writeln!(f, "Demand clusters:    {}", self.total_clusters)?;
        writeln!(
            f,
            "Candidate rate:     {:.1}%",
            self.candidate_rate * 100.0
        )?;
        writeln!(f, "Multi-post demands: {}", self.multi_member_clusters)?;
        writeln!(f, "Cross-source:       {}", self.cross_source_clusters)?;
        if !self.posts_by_source.is_empty() {
            writeln!(f, "\nBy source (posts / candidates):")?;
            for (source, posts) in &self.posts_by_source {
                let candidates = self.candidates_by_source.get(source).copied().unwrap_or(0);
                writeln!(f, "  {source}: {posts} / {candidates}")?;
            }
        }
        if !self.top_phrases.is_empty() {
            writeln!(f, "\nTop phrases:")?;
            for p in &self.top_phrases {
                writeln!(f, "  {:<24} {}", p.phrase, p.count)?;
            }
        }
        Ok(())
    }
}

// --- Idea seeds ---

/// One cluster reduced to what the idea-generation step consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedIdea {
    pub cluster_id: usize,
    pub title: String,
    pub problem_statement: String,
    pub evidence_count: usize,
    pub aggregate_score: f64,
    pub primary_source: String,
    pub source_tags: Vec<String>,
    pub sample_permalinks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedDocument {
    pub source: String,
    pub ideas: Vec<SeedIdea>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(id: &str, title: &str) -> Post {
        Post {
            id: id.to_string(),
            source_tag: "hackernews".to_string(),
            title: title.to_string(),
            body: String::new(),
            author: "pg".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap(),
            engagement_score: 3,
            reply_count: 1,
            permalink: format!("https://news.ycombinator.com/item?id={id}"),
            url: String::new(),
            query_tag: "hn:need app".to_string(),
        }
    }

    #[test]
    fn post_key_joins_source_and_id() {
        assert_eq!(post("42", "t").key(), "hackernews:42");
    }

    #[test]
    fn blank_id_or_title_is_invalid() {
        assert!(post("1", "Need a tool").is_valid());
        assert!(!post("  ", "Need a tool").is_valid());
        assert!(!post("1", "   ").is_valid());
    }

    #[test]
    fn post_deserializes_with_missing_optional_fields() {
        let json = r#"{
            "id": "9",
            "source_tag": "stackexchange:superuser",
            "title": "Any software for batch renaming?",
            "created_at": "2026-10-01T12:00:00Z",
            "permalink": "https://superuser.com/q/9"
        }"#;
        let p: Post = serde_json::from_str(json).unwrap();
        assert_eq!(p.body, "");
        assert_eq!(p.engagement_score, 0);
        assert_eq!(p.key(), "stackexchange:superuser:9");
    }

    #[test]
    fn summary_display_lists_sources() {
        let mut posts_by_source = BTreeMap::new();
        posts_by_source.insert("hackernews".to_string(), 4);
        let summary = MetaSummary {
            total_posts: 4,
            total_candidates: 1,
            total_clusters: 1,
            candidate_rate: 0.25,
            multi_member_clusters: 0,
            cross_source_clusters: 0,
            posts_by_source,
            candidates_by_source: BTreeMap::new(),
            top_phrases: vec![],
            top_clusters: vec![],
        };
        let text = summary.to_string();
        assert!(text.contains("Candidate rate:     25.0%"));
        assert!(text.contains("hackernews: 4 / 0"));
    }
}
