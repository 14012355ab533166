use std::sync::Arc;

use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

use crate::db::{ Alert, AlertStore };
use crate::enums::{ AlertStatus, AlertType };
use crate::error::{ AppError, Result };
use crate::services::price_service::normalize_symbol;

const RECENT_ALERTS_LIMIT: usize = 5;

#[derive(Clone)]
pub struct PriceAlertService {
    store: Arc<AlertStore>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    pub symbol: Option<String>,
    pub company_name: Option<String>,
    pub alert_type: Option<String>,
    pub threshold: Option<f64>,
    pub percentage: Option<f64>,
    pub email_notifications: Option<bool>,
    pub in_app_notifications: Option<bool>,
}

/// Fields a client may change. Trigger bookkeeping is owned by the checker.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAlertRequest {
    pub company_name: Option<String>,
    pub alert_type: Option<String>,
    pub threshold: Option<f64>,
    pub percentage: Option<f64>,
    pub status: Option<String>,
    pub email_notifications: Option<bool>,
    pub in_app_notifications: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAlert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub time: String,
    pub symbol: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSummary {
    pub active_alerts: usize,
    pub triggered_today: usize,
    pub recent_alerts: Vec<RecentAlert>,
}

fn validate_bound(name: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() => Err(AppError::Validation(format!("{} must be a finite number", name))),
        Some(v) if name == "percentage" && v < 0.0 => {
            Err(AppError::Validation("percentage must not be negative".to_string()))
        }
        _ => Ok(()),
    }
}

/// The bound an alert type compares against must be present.
fn require_bound(kind: AlertType, threshold: Option<f64>, percentage: Option<f64>) -> Result<()> {
    if kind.uses_threshold() && threshold.is_none() {
        return Err(AppError::Validation(format!("threshold is required for {} alerts", kind)));
    }
    if !kind.uses_threshold() && percentage.is_none() {
        return Err(AppError::Validation(format!("percentage is required for {} alerts", kind)));
    }
    Ok(())
}

impl PriceAlertService {
    pub fn new(store: Arc<AlertStore>) -> Self {
        Self { store }
    }

    /// Create a new price alert in the `active` state
    pub async fn create_alert(&self, req: CreateAlertRequest) -> Result<Alert> {
        let symbol = req.symbol
            .as_deref()
            .map(normalize_symbol)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::missing_field("symbol"))?;

        let alert_type: AlertType = req.alert_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::missing_field("alertType"))?
            .parse()?;

        validate_bound("threshold", req.threshold)?;
        validate_bound("percentage", req.percentage)?;
        require_bound(alert_type, req.threshold, req.percentage)?;

        let alert = Alert {
            id: Uuid::new_v4().to_string(),
            symbol,
            company_name: req.company_name.unwrap_or_default().trim().to_string(),
            alert_type: alert_type.to_string(),
            threshold: req.threshold,
            percentage: req.percentage,
            status: AlertStatus::Active.to_string(),
            created_at: Utc::now(),
            last_triggered: None,
            triggered_price: None,
            triggered_change: None,
            email_notifications: req.email_notifications.unwrap_or(true),
            in_app_notifications: req.in_app_notifications.unwrap_or(true),
        };

        let repo = self.store.lock().await;
        let mut alerts = repo.load().await?;
        alerts.push(alert.clone());
        repo.save(&alerts).await?;

        tracing::info!("Created {} alert {} for {}", alert.alert_type, alert.id, alert.symbol);
        Ok(alert)
    }

    /// List every stored alert
    pub async fn list_alerts(&self) -> Result<Vec<Alert>> {
        let repo = self.store.lock().await;
        repo.load().await
    }

    /// Get a specific alert by ID
    pub async fn get_alert(&self, id: &str) -> Result<Alert> {
        let repo = self.store.lock().await;
        repo.load().await?
            .into_iter()
            .find(|a| a.id == id)
            .ok_or(AppError::AlertNotFound)
    }

    /// Apply a partial update. Resetting `status` to `active` re-arms a triggered alert.
    pub async fn update_alert(&self, id: &str, req: UpdateAlertRequest) -> Result<Alert> {
        validate_bound("threshold", req.threshold)?;
        validate_bound("percentage", req.percentage)?;

        let alert_type = match req.alert_type.as_deref() {
            Some(t) => Some(t.parse::<AlertType>()?),
            None => None,
        };

        let status = match req.status.as_deref().map(str::trim) {
            Some("") => {
                return Err(AppError::Validation("status must not be empty".to_string()));
            }
            Some(s) => Some(s.to_lowercase()),
            None => None,
        };

        let repo = self.store.lock().await;
        let mut alerts = repo.load().await?;
        let alert = alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AppError::AlertNotFound)?;

        if let Some(name) = req.company_name {
            alert.company_name = name.trim().to_string();
        }
        if let Some(kind) = alert_type {
            alert.alert_type = kind.to_string();
        }
        if let Some(threshold) = req.threshold {
            alert.threshold = Some(threshold);
        }
        if let Some(percentage) = req.percentage {
            alert.percentage = Some(percentage);
        }
        if let Some(status) = status {
            alert.status = status;
        }
        if let Some(email) = req.email_notifications {
            alert.email_notifications = email;
        }
        if let Some(in_app) = req.in_app_notifications {
            alert.in_app_notifications = in_app;
        }

        if let Some(kind) = alert.kind() {
            require_bound(kind, alert.threshold, alert.percentage)?;
        }

        let updated = alert.clone();
        repo.save(&alerts).await?;

        tracing::info!("Updated alert {} (status: {})", updated.id, updated.status);
        Ok(updated)
    }

    /// Delete an alert
    pub async fn delete_alert(&self, id: &str) -> Result<()> {
        let repo = self.store.lock().await;
        let mut alerts = repo.load().await?;

        let before = alerts.len();
        alerts.retain(|a| a.id != id);
        if alerts.len() == before {
            return Err(AppError::AlertNotFound);
        }

        repo.save(&alerts).await?;
        tracing::info!("Deleted alert {}", id);
        Ok(())
    }

    /// Dashboard counters plus the most recently triggered alerts.
    pub async fn summary(&self, now: DateTime<Utc>) -> Result<AlertSummary> {
        let alerts = self.list_alerts().await?;
        Ok(summarize(&alerts, now))
    }
}

pub fn summarize(alerts: &[Alert], now: DateTime<Utc>) -> AlertSummary {
    let today = now.date_naive();

    let active_alerts = alerts
        .iter()
        .filter(|a| a.is_active())
        .count();
    let triggered_today = alerts
        .iter()
        .filter(|a| a.last_triggered.is_some_and(|t| t.date_naive() == today))
        .count();

    let mut triggered: Vec<&Alert> = alerts
        .iter()
        .filter(|a| a.last_triggered.is_some())
        .collect();
    triggered.sort_by(|a, b| b.last_triggered.cmp(&a.last_triggered));

    let recent_alerts = triggered
        .into_iter()
        .take(RECENT_ALERTS_LIMIT)
        .map(|a| {
            let kind = match a.kind() {
                Some(AlertType::PriceAbove | AlertType::PercentageGain) => "success",
                Some(AlertType::PriceBelow | AlertType::PercentageLoss) => "warning",
                _ => "info",
            };
            RecentAlert {
                id: a.id.clone(),
                kind: kind.to_string(),
                title: format!("{} {} alert triggered", a.symbol, a.alert_type),
                time: a.last_triggered.map(|t| t.to_rfc3339()).unwrap_or_default(),
                symbol: a.symbol.clone(),
                price: a.triggered_price.unwrap_or(0.0),
            }
        })
        .collect();

    AlertSummary {
        active_alerts,
        triggered_today,
        recent_alerts,
    }
}
