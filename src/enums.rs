use std::fmt;
use std::str::FromStr;

use serde::{ Deserialize, Serialize };

use crate::error::AppError;

// ─── AlertType ───────────────────────────────────────────────────────

/// Price alert trigger condition, stored by its wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertType {
    #[serde(rename = "price-above")]
    PriceAbove,
    #[serde(rename = "price-below")]
    PriceBelow,
    #[serde(rename = "percentage-gain")]
    PercentageGain,
    #[serde(rename = "percentage-loss")]
    PercentageLoss,
    #[serde(rename = "percentage-change")]
    PercentageChange,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::PriceAbove => "price-above",
            AlertType::PriceBelow => "price-below",
            AlertType::PercentageGain => "percentage-gain",
            AlertType::PercentageLoss => "percentage-loss",
            AlertType::PercentageChange => "percentage-change",
        }
    }

    /// Price types compare against `threshold`, percentage types against `percentage`.
    pub fn uses_threshold(&self) -> bool {
        matches!(self, AlertType::PriceAbove | AlertType::PriceBelow)
    }

    pub fn all() -> &'static [AlertType] {
        &[
            AlertType::PriceAbove,
            AlertType::PriceBelow,
            AlertType::PercentageGain,
            AlertType::PercentageLoss,
            AlertType::PercentageChange,
        ]
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "price-above" => Ok(AlertType::PriceAbove),
            "price-below" => Ok(AlertType::PriceBelow),
            "percentage-gain" => Ok(AlertType::PercentageGain),
            "percentage-loss" => Ok(AlertType::PercentageLoss),
            "percentage-change" => Ok(AlertType::PercentageChange),
            _ => Err(AppError::Validation(format!(
                "Invalid alert type: {}. Supported: price-above, price-below, percentage-gain, percentage-loss, percentage-change",
                s
            ))),
        }
    }
}

// ─── AlertStatus ─────────────────────────────────────────────────────

/// Alert statuses with behavior attached. Any other stored value is inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertStatus {
    Active,
    Triggered,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Triggered => "triggered",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── QuoteStatus ─────────────────────────────────────────────────────

/// Trading status reported alongside a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    Active,
    Inactive,
    Halted,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Active => "active",
            QuoteStatus::Inactive => "inactive",
            QuoteStatus::Halted => "halted",
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── CheckStatus ─────────────────────────────────────────────────────

/// Result of evaluating one alert during a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Triggered,
    Monitoring,
    Error,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Triggered => "triggered",
            CheckStatus::Monitoring => "monitoring",
            CheckStatus::Error => "error",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
