use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };

use crate::enums::{ AlertStatus, AlertType };

/// A persisted price alert rule, serialized with the dashboard's field names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub company_name: String,
    pub alert_type: String, // "price-above", "price-below", "percentage-gain", ...
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub percentage: Option<f64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_triggered: Option<DateTime<Utc>>,
    #[serde(default)]
    pub triggered_price: Option<f64>,
    #[serde(default)]
    pub triggered_change: Option<f64>,
    #[serde(default = "default_true")]
    pub email_notifications: bool,
    #[serde(default = "default_true")]
    pub in_app_notifications: bool,
}

fn default_true() -> bool {
    true
}

impl Alert {
    /// Parsed alert type, `None` when the stored value is unknown.
    pub fn kind(&self) -> Option<AlertType> {
        self.alert_type.parse().ok()
    }

    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active.as_str()
    }

    pub fn is_triggered(&self) -> bool {
        self.status == AlertStatus::Triggered.as_str()
    }
}
