pub mod error;

pub use error::{HeadlessError, Result};

use std::time::Duration;

/// Wait bound for page renders. The remote browser gives up on selectors
/// that have not appeared by then.
const RENDER_TIMEOUT: Duration = Duration::from_secs(45);
const DEFAULT_WAIT_MS: u64 = 30_000;

pub struct HeadlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HeadlessClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(RENDER_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        let mut endpoint = format!("{}{}", self.base_url, path);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }

    /// Fetch fully-rendered HTML for a URL via the /content endpoint.
    pub async fn content(&self, url: &str) -> Result<String> {
        self.post_content(serde_json::json!({ "url": url })).await
    }

    /// Fetch rendered HTML, waiting until `selector` is present (bounded).
    pub async fn content_with_wait(&self, url: &str, selector: &str) -> Result<String> {
        self.post_content(serde_json::json!({
            "url": url,
            "waitForSelector": { "selector": selector, "timeout": DEFAULT_WAIT_MS },
        }))
        .await
    }

    async fn post_content(&self, body: serde_json::Value) -> Result<String> {
        let resp = self
            .client
            .post(self.endpoint("/content"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(HeadlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}
