use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::config::ProviderConfig;
use crate::error::{ AppError, Result };
use crate::providers::{ CompanyProfile, Quote, QuoteProvider };

/// Quotes get one initial attempt plus a single retry.
const QUOTE_ATTEMPTS: u32 = 2;
/// Profiles are cosmetic and never retried.
const PROFILE_ATTEMPTS: u32 = 1;
const RETRY_DELAY_MS: u64 = 250;

pub struct FinnhubProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl FinnhubProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = reqwest::Client
            ::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint_url(&self, path: &str, symbol: &str, api_key: &str) -> String {
        format!(
            "{}/{}?symbol={}&token={}",
            self.base_url,
            path,
            urlencoding::encode(symbol),
            urlencoding::encode(api_key)
        )
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or(AppError::ProviderUnavailable)
    }

    /// GET, retrying transport failures, 429 and 5xx responses up to `attempts` tries.
    async fn fetch_with_retry(&self, url: &str, attempts: u32) -> Result<reqwest::Response> {
        let mut last_err = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
            }

            let response = match self.client.get(url).send().await {
                Ok(response) => response,
                Err(e) => {
                    // Strip the URL so the API token never reaches logs.
                    let e = e.without_url();
                    tracing::debug!("Finnhub request attempt {} failed: {}", attempt, e);
                    last_err = Some(AppError::Transport(format!("Finnhub request failed: {}", e)));
                    continue;
                }
            };

            let status = response.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                tracing::debug!("Finnhub attempt {} returned {}", attempt, status);
                last_err = Some(AppError::Transport(format!("Finnhub API returned status: {}", status)));
                continue;
            }

            if !status.is_success() {
                return Err(AppError::Transport(format!("Finnhub API returned status: {}", status)));
            }

            return Ok(response);
        }

        Err(last_err.unwrap_or_else(|| AppError::Transport("Finnhub request failed after retries".to_string())))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, symbol: &str, attempts: u32) -> Result<T> {
        let url = self.endpoint_url(path, symbol, self.api_key()?);
        let response = self.fetch_with_retry(&url, attempts).await?;

        response
            .json::<T>().await
            .map_err(|e| AppError::MalformedResponse(format!("Failed to parse Finnhub {} response: {}", path, e.without_url())))
    }
}

#[async_trait]
impl QuoteProvider for FinnhubProvider {
    fn name(&self) -> &'static str {
        "finnhub"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote> {
        self.get_json("quote", symbol, QUOTE_ATTEMPTS).await
    }

    async fn get_profile(&self, symbol: &str) -> Result<CompanyProfile> {
        self.get_json("stock/profile2", symbol, PROFILE_ATTEMPTS).await
    }
}
