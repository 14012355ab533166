use std::sync::Arc;

use serde::{ Deserialize, Serialize };

use crate::enums::QuoteStatus;
use crate::providers::{ CompanyProfile, Quote, QuoteProvider };
use crate::services::metrics::{ normalize_quote, MarketSimulator, Metrics };

/// Where the data for one symbol came from.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteOutcome {
    Live {
        quote: Quote,
        profile: CompanyProfile,
    },
    Mock,
    /// Any provider-side failure; the cause is only kept as a message.
    ProviderError(String),
}

/// Quote record returned to dashboards. Field names are part of the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuote {
    pub symbol: String,
    pub company_name: String,
    pub current_price: f64,
    pub price_change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub day_high: f64,
    pub day_low: f64,
    pub status: QuoteStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl StockQuote {
    pub fn new(symbol: &str, company_name: String, metrics: Metrics) -> Self {
        let status = if metrics.current_price > 0.0 {
            QuoteStatus::Active
        } else {
            QuoteStatus::Inactive
        };

        Self {
            symbol: symbol.to_string(),
            company_name,
            current_price: metrics.current_price,
            price_change: metrics.price_change,
            change_percent: metrics.change_percent,
            volume: metrics.volume,
            day_high: metrics.day_high,
            day_low: metrics.day_low,
            status,
            error: None,
        }
    }

    /// Zero-valued record for a symbol whose quote could not be obtained.
    pub fn halted(symbol: &str, reason: String) -> Self {
        Self {
            status: QuoteStatus::Halted,
            error: Some(reason),
            ..Self::new(symbol, CompanyProfile::default().display_name(symbol), Metrics::default())
        }
    }

    pub fn is_halted(&self) -> bool {
        self.error.is_some()
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            current_price: self.current_price,
            price_change: self.price_change,
            change_percent: self.change_percent,
            day_high: self.day_high,
            day_low: self.day_low,
            volume: self.volume,
        }
    }
}

pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Picks live, mock or degraded data for a symbol and normalizes it.
pub struct PriceService {
    provider: Arc<dyn QuoteProvider>,
    simulator: Arc<MarketSimulator>,
    use_mock_data: bool,
}

impl PriceService {
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        simulator: Arc<MarketSimulator>,
        use_mock_data: bool
    ) -> Self {
        Self {
            provider,
            simulator,
            use_mock_data,
        }
    }

    pub fn is_mock_mode(&self) -> bool {
        self.use_mock_data
    }

    pub fn simulator(&self) -> &MarketSimulator {
        &self.simulator
    }

    /// Apply the fallback policy: mock mode, then credentials, then the live call.
    pub async fn fetch_quote(&self, symbol: &str) -> QuoteOutcome {
        if self.use_mock_data {
            return QuoteOutcome::Mock;
        }

        let quote = match self.live_quote(symbol).await {
            Ok(quote) => quote,
            Err(reason) => {
                return QuoteOutcome::ProviderError(reason);
            }
        };

        let profile = match self.provider.get_profile(symbol).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::debug!("{} profile for {} unavailable: {}", self.provider.name(), symbol, e);
                CompanyProfile::default()
            }
        };

        QuoteOutcome::Live { quote, profile }
    }

    async fn live_quote(&self, symbol: &str) -> std::result::Result<Quote, String> {
        if !self.provider.is_configured() {
            return Err("not configured".to_string());
        }

        self.provider.get_quote(symbol).await.map_err(|e| {
            tracing::warn!("{} quote for {} failed: {}", self.provider.name(), symbol, e);
            e.to_string()
        })
    }

    /// Metrics only, for alert evaluation. Never fetches the company profile.
    ///
    /// A live quote without a current price is reported as missing data so
    /// that a blank quote cannot satisfy price-below or loss conditions.
    pub async fn fetch_metrics(&self, symbol: &str) -> std::result::Result<Metrics, String> {
        let symbol = normalize_symbol(symbol);
        if self.use_mock_data {
            return Ok(self.simulator.metrics(&symbol));
        }

        let metrics = normalize_quote(&self.live_quote(&symbol).await?);
        if metrics.current_price <= 0.0 {
            return Err(format!("no price data for {}", symbol));
        }
        Ok(metrics)
    }

    /// Turn an outcome into a response record.
    pub fn assemble(&self, symbol: &str, outcome: QuoteOutcome) -> StockQuote {
        match outcome {
            QuoteOutcome::Live { quote, profile } => {
                StockQuote::new(symbol, profile.display_name(symbol), normalize_quote(&quote))
            }
            QuoteOutcome::Mock => {
                StockQuote::new(
                    symbol,
                    CompanyProfile::default().display_name(symbol),
                    self.simulator.metrics(symbol)
                )
            }
            QuoteOutcome::ProviderError(reason) => StockQuote::halted(symbol, reason),
        }
    }

    /// Current quote for one symbol. Provider failures degrade to a halted record.
    pub async fn get_stock(&self, symbol: &str) -> StockQuote {
        let symbol = normalize_symbol(symbol);
        let outcome = self.fetch_quote(&symbol).await;
        self.assemble(&symbol, outcome)
    }

    /// Quotes for several symbols, in request order, one lookup at a time.
    pub async fn get_stocks(&self, symbols: &[String]) -> Vec<StockQuote> {
        let mut stocks = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if symbol.trim().is_empty() {
                continue;
            }
            stocks.push(self.get_stock(symbol).await);
        }
        stocks
    }
}
