pub mod error;
pub mod hackernews;
pub mod http;
pub mod stackexchange;

pub use error::{Result, SocialError};
pub use hackernews::HackerNewsClient;
pub use http::HttpFetcher;
pub use stackexchange::StackExchangeClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use demandsignal_common::Post;

/// A public discussion source that can be searched for posts.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Stable source name, e.g. "hackernews" or "stackexchange:superuser".
    fn name(&self) -> &str;

    /// Fetch up to `limit` posts matching `query`, newest first.
    /// `since` is a hint; sources that cannot filter by date ignore it.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Post>>;
}

/// Render an HTML fragment to single-line plain text.
pub(crate) fn html_to_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let text = html2text::from_read(html.as_bytes(), 1000).unwrap_or_default();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Unix seconds to UTC; garbage timestamps fall back to the epoch.
pub(crate) fn utc_from_secs(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}
