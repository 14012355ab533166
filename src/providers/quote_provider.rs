use async_trait::async_trait;
use serde::{ Deserialize, Serialize };

use crate::error::Result;

/// Raw quote as returned by the provider. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(rename = "c", default)]
    pub current: Option<f64>,
    #[serde(rename = "pc", default)]
    pub previous_close: Option<f64>,
    #[serde(rename = "h", default)]
    pub high: Option<f64>,
    #[serde(rename = "l", default)]
    pub low: Option<f64>,
    #[serde(rename = "v", default)]
    pub volume: Option<f64>,
}

impl Quote {
    /// Positive current price, if the provider had one for the symbol.
    pub fn price(&self) -> Option<f64> {
        self.current.filter(|c| *c > 0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    #[serde(default)]
    pub name: Option<String>,
}

impl CompanyProfile {
    /// Profile name, falling back to `"<symbol> Corp."`.
    pub fn display_name(&self, symbol: &str) -> String {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} Corp.", symbol))
    }
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Whether credentials are present; unconfigured providers are never called.
    fn is_configured(&self) -> bool;

    /// Fetch the latest quote for a symbol
    async fn get_quote(&self, symbol: &str) -> Result<Quote>;

    /// Fetch the company profile for a symbol
    async fn get_profile(&self, symbol: &str) -> Result<CompanyProfile>;
}
