use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use demandsignal_common::Post;

use crate::error::Result;
use crate::http::HttpFetcher;
use crate::{html_to_text, utc_from_secs, PostSource};

const SEARCH_URL: &str = "https://hn.algolia.com/api/v1/search_by_date";
const SOURCE_TAG: &str = "hackernews";
const MAX_PAGE_SIZE: usize = 100;
const PAGE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

/// One story hit from the Algolia search API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hit {
    #[serde(rename = "objectID", default)]
    pub object_id: Option<String>,
    pub title: Option<String>,
    pub story_title: Option<String>,
    pub story_text: Option<String>,
    pub comment_text: Option<String>,
    pub author: Option<String>,
    pub created_at_i: Option<i64>,
    pub points: Option<i64>,
    pub num_comments: Option<i64>,
    pub url: Option<String>,
}

impl Hit {
    /// Normalize into a [`Post`]. Hits without an id or title are dropped.
    pub fn into_post(self, query: &str) -> Option<Post> {
        let id = self.object_id.unwrap_or_default().trim().to_string();
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .or(self.story_title)
            .unwrap_or_default()
            .trim()
            .to_string();
        if id.is_empty() || title.is_empty() {
            return None;
        }

        let permalink = format!("https://news.ycombinator.com/item?id={id}");
        let body = self
            .story_text
            .filter(|t| !t.trim().is_empty())
            .or(self.comment_text)
            .map(|html| html_to_text(&html))
            .unwrap_or_default();

        Some(Post {
            url: self
                .url
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| permalink.clone()),
            id,
            source_tag: SOURCE_TAG.to_string(),
            title,
            body,
            author: self.author.unwrap_or_default(),
            created_at: utc_from_secs(self.created_at_i.unwrap_or(0)),
            engagement_score: self.points.unwrap_or(0),
            reply_count: self.num_comments.unwrap_or(0),
            permalink,
            query_tag: format!("hn:{query}"),
        })
    }
}

/// Story search over Hacker News via the Algolia API, newest first.
pub struct HackerNewsClient {
    http: HttpFetcher,
}

impl HackerNewsClient {
    pub fn new(http: HttpFetcher) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PostSource for HackerNewsClient {
    fn name(&self) -> &str {
        SOURCE_TAG
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Post>> {
        let mut out = Vec::new();
        let mut page = 0usize;
        let mut remaining = limit.max(1);

        while remaining > 0 {
            let page_size = remaining.min(MAX_PAGE_SIZE);
            let mut params = vec![
                ("query", query.to_string()),
                ("tags", "story".to_string()),
                ("hitsPerPage", page_size.to_string()),
                ("page", page.to_string()),
            ];
            if let Some(since) = since {
                params.push(("numericFilters", format!("created_at_i>{}", since.timestamp())));
            }

            let response: SearchResponse = self.http.get_json(SEARCH_URL, &params).await?;
            let hit_count = response.hits.len();
            if hit_count == 0 {
                break;
            }
            out.extend(response.hits.into_iter().filter_map(|h| h.into_post(query)));
            debug!(query, page, hits = hit_count, "Fetched Hacker News page");

            page += 1;
            remaining = remaining.saturating_sub(hit_count);
            if hit_count < page_size {
                break;
            }
            tokio::time::sleep(PAGE_DELAY).await;
        }

        info!(query, posts = out.len(), "Hacker News search complete");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit(value: serde_json::Value) -> Hit {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn maps_story_hit_to_post() {
        let post = hit(json!({
            "objectID": "4123",
            "title": "Ask HN: Any software for tracking invoices?",
            "story_text": "<p>I&#x27;m looking for a simple tool</p>",
            "author": "jdoe",
            "created_at_i": 1_760_000_000,
            "points": 12,
            "num_comments": 7,
            "url": null
        }))
        .into_post("any software for")
        .unwrap();

        assert_eq!(post.id, "4123");
        assert_eq!(post.source_tag, "hackernews");
        assert_eq!(post.permalink, "https://news.ycombinator.com/item?id=4123");
        assert_eq!(post.url, post.permalink);
        assert!(post.body.contains("looking for a simple tool"));
        assert_eq!(post.engagement_score, 12);
        assert_eq!(post.reply_count, 7);
        assert_eq!(post.created_at.timestamp(), 1_760_000_000);
        assert_eq!(post.query_tag, "hn:any software for");
    }

    #[test]
    fn falls_back_to_story_title() {
        let post = hit(json!({
            "objectID": "9",
            "title": "",
            "story_title": "Parent story",
            "comment_text": "wish there was a tool"
        }))
        .into_post("q")
        .unwrap();
        assert_eq!(post.title, "Parent story");
        assert_eq!(post.body, "wish there was a tool");
        assert_eq!(post.engagement_score, 0);
    }

    #[test]
    fn drops_hits_without_id_or_title() {
        assert!(hit(json!({"objectID": "1"})).into_post("q").is_none());
        assert!(hit(json!({"title": "Looking for a tool"})).into_post("q").is_none());
    }

    #[test]
    fn response_tolerates_missing_hits() {
        let response: SearchResponse = serde_json::from_value(json!({"nbHits": 0})).unwrap();
        assert!(response.hits.is_empty());
    }
}
