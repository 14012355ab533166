use serde::Deserialize;

use crate::config::NewsConfig;
use crate::error::{ AppError, Result };

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: Option<String>,
}

/// NewsAPI client used to enrich alert emails with recent headlines.
pub struct NewsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    articles: usize,
}

impl NewsClient {
    pub fn new(config: &NewsConfig) -> Result<Self> {
        let client = reqwest::Client
            ::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            articles: config.articles,
        })
    }

    fn everything_url(&self, query: &str) -> String {
        format!(
            "{}/everything?q={}&apiKey={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.api_key)
        )
    }

    /// Up to the configured number of headline titles mentioning `query`.
    pub async fn headlines(&self, query: &str) -> Result<Vec<String>> {
        if self.articles == 0 {
            return Ok(Vec::new());
        }

        let response = self.client
            .get(self.everything_url(query))
            .send().await
            .map_err(|e| AppError::Transport(format!("NewsAPI request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Transport(format!("NewsAPI returned status: {}", status)));
        }

        let body: EverythingResponse = response
            .json().await
            .map_err(|e| AppError::MalformedResponse(format!("Failed to parse NewsAPI response: {}", e.without_url())))?;

        Ok(
            body.articles
                .into_iter()
                .filter_map(|a| a.title)
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .take(self.articles)
                .collect()
        )
    }
}
