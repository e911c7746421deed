use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use demandsignal_common::Post;

use crate::error::Result;
use crate::http::HttpFetcher;
use crate::{html_to_text, utc_from_secs, PostSource};

const SEARCH_URL: &str = "https://api.stackexchange.com/2.3/search/advanced";
const MAX_PAGE_SIZE: usize = 100;
const PAGE_DELAY: Duration = Duration::from_millis(350);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Question>,
    #[serde(default)]
    has_more: bool,
    /// Seconds the API asks us to wait before the next request.
    backoff: Option<u64>,
    quota_remaining: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Owner {
    pub display_name: Option<String>,
}

/// One question from `/search/advanced` with the `withbody` filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Question {
    pub question_id: Option<i64>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub owner: Option<Owner>,
    pub creation_date: Option<i64>,
    pub score: Option<i64>,
    pub answer_count: Option<i64>,
    pub link: Option<String>,
}

impl Question {
    pub fn into_post(self, site: &str, query: &str) -> Option<Post> {
        let id = self.question_id?.to_string();
        let title = html_to_text(self.title.as_deref().unwrap_or_default());
        if title.is_empty() {
            return None;
        }

        let permalink = self
            .link
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| format!("https://stackoverflow.com/questions/{id}"));

        Some(Post {
            id,
            source_tag: format!("stackexchange:{site}"),
            title,
            body: html_to_text(self.body.as_deref().unwrap_or_default()),
            author: self
                .owner
                .and_then(|o| o.display_name)
                .map(|n| html_to_text(&n))
                .unwrap_or_default(),
            created_at: utc_from_secs(self.creation_date.unwrap_or(0)),
            engagement_score: self.score.unwrap_or(0),
            reply_count: self.answer_count.unwrap_or(0),
            url: permalink.clone(),
            permalink,
            query_tag: format!("se:{site}:{query}"),
        })
    }
}

/// Question search on one StackExchange site, newest first.
pub struct StackExchangeClient {
    http: HttpFetcher,
    site: String,
    name: String,
}

impl StackExchangeClient {
    pub fn new(http: HttpFetcher, site: impl Into<String>) -> Self {
        let site = site.into();
        Self {
            http,
            name: format!("stackexchange:{site}"),
            site,
        }
    }
}

#[async_trait]
impl PostSource for StackExchangeClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Post>> {
        let mut out = Vec::new();
        let mut page = 1usize;
        let mut remaining = limit.max(1);

        while remaining > 0 {
            let page_size = remaining.min(MAX_PAGE_SIZE);
            let mut params = vec![
                ("order", "desc".to_string()),
                ("sort", "creation".to_string()),
                ("site", self.site.clone()),
                ("q", query.to_string()),
                ("pagesize", page_size.to_string()),
                ("page", page.to_string()),
                ("filter", "withbody".to_string()),
            ];
            if let Some(since) = since {
                params.push(("fromdate", since.timestamp().to_string()));
            }

            let response: SearchResponse = self.http.get_json(SEARCH_URL, &params).await?;
            let item_count = response.items.len();
            out.extend(
                response
                    .items
                    .into_iter()
                    .filter_map(|q| q.into_post(&self.site, query)),
            );
            debug!(
                site = self.site.as_str(),
                query,
                page,
                items = item_count,
                quota_remaining = response.quota_remaining,
                "Fetched StackExchange page"
            );

            if !response.has_more || item_count == 0 {
                break;
            }
            page += 1;
            remaining = remaining.saturating_sub(item_count);
            if remaining == 0 {
                break;
            }

            let delay = match response.backoff {
                Some(secs) if secs > 0 => {
                    warn!(site = self.site.as_str(), secs, "API requested backoff");
                    Duration::from_secs(secs).max(PAGE_DELAY)
                }
                _ => PAGE_DELAY,
            };
            tokio::time::sleep(delay).await;
        }

        out.truncate(limit.max(1));
        info!(site = self.site.as_str(), query, posts = out.len(), "StackExchange search complete");
        Ok(out)
    }
}
