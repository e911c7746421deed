//! Fetch orchestration: every (query, source) pair is searched, sources for a
//! query run concurrently, and the whole batch is deduplicated before the
//! engine sees it.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{info, warn};

use demandsignal_common::Post;
use social_client::{HackerNewsClient, HttpFetcher, PostSource, StackExchangeClient};

use crate::cli::SourceKind;

pub struct FetchOutcome {
    /// Deduplicated posts in first-seen order.
    pub posts: Vec<Post>,
    /// One message per failed (query, source) fetch.
    pub failures: Vec<String>,
}

pub fn build_sources(
    kinds: &[SourceKind],
    http: &HttpFetcher,
    stackexchange_site: &str,
) -> Vec<Box<dyn PostSource>> {
    kinds
        .iter()
        .map(|kind| -> Box<dyn PostSource> {
            match kind {
                SourceKind::HackerNews => Box::new(HackerNewsClient::new(http.clone())),
                SourceKind::StackExchange => {
                    Box::new(StackExchangeClient::new(http.clone(), stackexchange_site))
                }
            }
        })
        .collect()
}

/// Run every query against every source. A failing fetch is logged and
/// counted; it never aborts the run.
pub async fn collect_posts(
    sources: &[Box<dyn PostSource>],
    queries: &[String],
    limit: usize,
    since: Option<DateTime<Utc>>,
) -> FetchOutcome {
    let mut posts = Vec::new();
    let mut failures = Vec::new();

    for query in queries {
        let fetches = sources.iter().map(|source| async move {
            (source.name(), source.search(query, limit, since).await)
        });

        for (name, result) in join_all(fetches).await {
            match result {
                Ok(batch) => {
                    info!(source = name, query = query.as_str(), posts = batch.len(), "Fetched posts");
                    posts.extend(batch);
                }
                Err(e) => {
                    warn!(source = name, query = query.as_str(), error = %e, "Fetch failed, continuing");
                    failures.push(format!("Failed {name} query='{query}': {e}"));
                }
            }
        }
    }

    let fetched = posts.len();
    let posts = dedup_posts(posts);
    info!(fetched, unique = posts.len(), failures = failures.len(), "Collection complete");

    FetchOutcome { posts, failures }
}

/// Deduplicate by `(source_tag, id)`. The slot of the first occurrence is
/// kept and the last occurrence's data wins.
pub fn dedup_posts(posts: Vec<Post>) -> Vec<Post> {
    let mut slots: HashMap<(String, String), usize> = HashMap::new();
    let mut out: Vec<Post> = Vec::with_capacity(posts.len());

    for post in posts {
        match slots.entry((post.source_tag.clone(), post.id.clone())) {
            Entry::Occupied(slot) => out[*slot.get()] = post,
            Entry::Vacant(slot) => {
                slot.insert(out.len());
                out.push(post);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use social_client::SocialError;

    fn post(source: &str, id: &str, title: &str) -> Post {
        Post {
            id: id.to_string(),
            source_tag: source.to_string(),
            title: title.to_string(),
            body: String::new(),
            author: String::new(),
            created_at: Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap(),
            engagement_score: 0,
            reply_count: 0,
            permalink: String::new(),
            url: String::new(),
            query_tag: String::new(),
        }
    }

    struct FixedSource {
        name: String,
        posts: Vec<Post>,
    }

    #[async_trait]
    impl PostSource for FixedSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn search(
            &self,
            query: &str,
            limit: usize,
            _since: Option<DateTime<Utc>>,
        ) -> social_client::Result<Vec<Post>> {
            Ok(self
                .posts
                .iter()
                .take(limit)
                .cloned()
                .map(|mut p| {
                    p.query_tag = query.to_string();
                    p
                })
                .collect())
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl PostSource for BrokenSource {
        fn name(&self) -> &str {
            "broken"
        }

        async fn search(
            &self,
            _query: &str,
            _limit: usize,
            _since: Option<DateTime<Utc>>,
        ) -> social_client::Result<Vec<Post>> {
            Err(SocialError::Api {
                status: 400,
                message: "bad request".to_string(),
            })
        }
    }

    #[test]
    fn dedup_keeps_first_slot_and_last_data() {
        let posts = vec![
            post("hackernews", "1", "first"),
            post("hackernews", "2", "other"),
            post("stackexchange:stackoverflow", "1", "same id, other source"),
            post("hackernews", "1", "updated"),
        ];
        let deduped = dedup_posts(posts);
        let titles: Vec<_> = deduped.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["updated", "other", "same id, other source"]);
    }

    #[tokio::test]
    async fn failures_are_counted_and_run_continues() {
        let sources: Vec<Box<dyn PostSource>> = vec![
            Box::new(FixedSource {
                name: "hackernews".to_string(),
                posts: vec![post("hackernews", "1", "a"), post("hackernews", "2", "b")],
            }),
            Box::new(BrokenSource),
        ];
        let queries = vec!["need app".to_string(), "wish there was".to_string()];

        let outcome = collect_posts(&sources, &queries, 10, None).await;

        assert_eq!(outcome.posts.len(), 2);
        assert_eq!(outcome.failures.len(), 2);
        assert!(outcome.failures[0].contains("broken"));
        // Second query re-fetched the same posts; its data wins.
        assert!(outcome.posts.iter().all(|p| p.query_tag == "wish there was"));
    }

    #[test]
    fn builds_one_client_per_kind() {
        let http = HttpFetcher::new("test-agent").unwrap();
        let sources = build_sources(
            &[SourceKind::HackerNews, SourceKind::StackExchange],
            &http,
            "superuser",
        );
        let names: Vec<_> = sources.iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["hackernews", "stackexchange:superuser"]);
    }
}
