use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{Result, SocialError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Statuses worth waiting out rather than failing on.
const THROTTLED_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// JSON GET with retry. Throttled statuses back off `min(10s, 1.5s * attempt)`;
/// transport and decode failures back off `1.3s * attempt`. Any other
/// non-success status fails immediately.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_attempts: u32,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let mut last_error = String::from("no attempt made");

        for attempt in 1..=self.max_attempts {
            match self.client.get(url).query(params).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if THROTTLED_STATUSES.contains(&status.as_u16()) {
                        let backoff = throttle_backoff(attempt);
                        warn!(
                            url,
                            status = status.as_u16(),
                            attempt,
                            backoff_ms = backoff.as_millis() as u64,
                            "Throttled, backing off"
                        );
                        last_error = format!("HTTP {status}");
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    if !status.is_success() {
                        let message = resp.text().await.unwrap_or_default();
                        return Err(SocialError::Api {
                            status: status.as_u16(),
                            message,
                        });
                    }
                    match resp.json::<T>().await {
                        Ok(payload) => return Ok(payload),
                        Err(e) => last_error = e.to_string(),
                    }
                }
                Err(e) => last_error = e.to_string(),
            }

            if attempt < self.max_attempts {
                let backoff = error_backoff(attempt);
                warn!(url, attempt, error = %last_error, "Request failed, retrying");
                tokio::time::sleep(backoff).await;
            }
        }

        Err(SocialError::RetriesExhausted {
            url: url.to_string(),
            attempts: self.max_attempts,
            last_error,
        })
    }
}

fn throttle_backoff(attempt: u32) -> Duration {
    Duration::from_millis(1_500 * attempt as u64).min(Duration::from_secs(10))
}

fn error_backoff(attempt: u32) -> Duration {
    Duration::from_millis(1_300 * attempt as u64)
}
