use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::time::{ interval, MissedTickBehavior };

use crate::db::{ Alert, AlertStore };
use crate::enums::{ AlertStatus, AlertType, CheckStatus };
use crate::error::{ AppError, Result };
use crate::notifications::Notifier;
use crate::services::metrics::Metrics;
use crate::services::price_service::PriceService;

/// Metrics for a symbol, or why they could not be obtained.
type Lookup = std::result::Result<Metrics, String>;

/// Message for an alert whose condition holds against `metrics`, `None` otherwise.
///
/// Unknown alert types and a missing bound never trigger.
pub fn evaluate(alert: &Alert, metrics: &Metrics) -> Option<String> {
    let price = metrics.current_price;
    let change = metrics.change_percent;

    match alert.kind()? {
        AlertType::PriceAbove => {
            let threshold = alert.threshold?;
            (price >= threshold).then(|| format!("Price above ${:.2}", threshold))
        }
        AlertType::PriceBelow => {
            let threshold = alert.threshold?;
            (price <= threshold).then(|| format!("Price below ${:.2}", threshold))
        }
        AlertType::PercentageGain => {
            let pct = alert.percentage?;
            (change >= pct).then(|| format!("Gained {:.2}% (threshold: {:.2}%)", change, pct))
        }
        AlertType::PercentageLoss => {
            let pct = alert.percentage?;
            (change <= -pct).then(|| format!("Lost {:.2}% (threshold: {:.2}%)", change.abs(), pct))
        }
        AlertType::PercentageChange => {
            let pct = alert.percentage?;
            let direction = if change >= 0.0 { "Gained" } else { "Lost" };
            (change.abs() >= pct).then(||
                format!("{} {:.2}% (threshold: {:.2}%)", direction, change.abs(), pct)
            )
        }
    }
}

/// Outcome of checking one alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub alert_id: String,
    pub symbol: String,
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    fn monitoring(alert: &Alert) -> Self {
        Self {
            alert_id: alert.id.clone(),
            symbol: alert.symbol.clone(),
            status: CheckStatus::Monitoring,
            message: None,
            current_price: None,
            change_percent: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub message: String,
    pub processed: usize,
    pub triggered: usize,
    pub results: Vec<CheckResult>,
}

pub struct AlertChecker {
    store: Arc<AlertStore>,
    price_service: Arc<PriceService>,
    notifier: Arc<dyn Notifier>,
}

impl AlertChecker {
    pub fn new(
        store: Arc<AlertStore>,
        price_service: Arc<PriceService>,
        notifier: Arc<dyn Notifier>
    ) -> Self {
        Self {
            store,
            price_service,
            notifier,
        }
    }

    /// Run batch evaluation every `period` until the task is dropped.
    pub async fn start(self: Arc<Self>, period: Duration) {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            match self.check_alerts().await {
                Ok(report) if report.processed > 0 => {
                    tracing::info!(
                        "Alert check: {} processed, {} triggered",
                        report.processed,
                        report.triggered
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::error!("Alert checker error: {}", e),
            }
        }
    }

    /// Evaluate every active alert and persist the whole collection once.
    pub async fn check_alerts(&self) -> Result<BatchReport> {
        let repo = self.store.lock().await;
        let mut alerts = repo.load().await?;

        // One quote lookup per symbol per batch.
        let mut lookups: HashMap<String, Lookup> = HashMap::new();
        let mut results = Vec::new();

        for alert in alerts.iter_mut().filter(|a| a.is_active()) {
            let lookup = match lookups.get(&alert.symbol) {
                Some(lookup) => lookup.clone(),
                None => {
                    let lookup = self.price_service.fetch_metrics(&alert.symbol).await;
                    lookups.insert(alert.symbol.clone(), lookup.clone());
                    lookup
                }
            };

            results.push(self.apply(alert, &lookup).await);
        }

        repo.save(&alerts).await?;

        let triggered = results
            .iter()
            .filter(|r| r.status == CheckStatus::Triggered)
            .count();

        Ok(BatchReport {
            message: "Alerts processed".to_string(),
            processed: results.len(),
            triggered,
            results,
        })
    }

    /// Evaluate one active or triggered alert on demand.
    ///
    /// Alerts in any other status are left alone and reported as monitoring.
    pub async fn check_alert(&self, id: &str) -> Result<CheckResult> {
        let repo = self.store.lock().await;
        let mut alerts = repo.load().await?;

        let alert = alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AppError::AlertNotFound)?;

        if !alert.is_active() && !alert.is_triggered() {
            tracing::debug!("Alert {} is {}, not checking", alert.id, alert.status);
            return Ok(CheckResult::monitoring(alert));
        }

        let lookup = self.price_service.fetch_metrics(&alert.symbol).await;
        let result = self.apply(alert, &lookup).await;

        if result.status == CheckStatus::Triggered {
            repo.save(&alerts).await?;
        }

        Ok(result)
    }

    /// Evaluate against a quote lookup, recording the trigger on the alert.
    async fn apply(&self, alert: &mut Alert, lookup: &Lookup) -> CheckResult {
        let mut result = CheckResult::monitoring(alert);

        let metrics = match lookup {
            Ok(metrics) => *metrics,
            Err(reason) => {
                tracing::warn!("Skipping alert {}: quote for {} unavailable", alert.id, alert.symbol);
                result.status = CheckStatus::Error;
                result.error = Some(reason.clone());
                return result;
            }
        };

        result.current_price = Some(metrics.current_price);
        result.change_percent = Some(metrics.change_percent);

        let Some(message) = evaluate(alert, &metrics) else {
            return result;
        };

        alert.status = AlertStatus::Triggered.to_string();
        alert.last_triggered = Some(Utc::now());
        alert.triggered_price = Some(metrics.current_price);
        alert.triggered_change = Some(metrics.change_percent);

        tracing::info!(
            "Alert triggered for {} ({}): {} at ${:.2}",
            alert.symbol,
            alert.id,
            message,
            metrics.current_price
        );

        if alert.email_notifications {
            if let Err(e) = self.notifier.notify(alert, &message).await {
                tracing::error!("Failed to send notification for alert {}: {}", alert.id, e);
            }
        }

        result.status = CheckStatus::Triggered;
        result.message = Some(message);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ AlertRepository, InMemoryAlertRepository };
    use crate::notifications::test_support::RecordingNotifier;
    use crate::services::metrics::MarketSimulator;
    use crate::services::price_service::test_support::StubProvider;

    fn alert(id: &str, symbol: &str, alert_type: &str, threshold: Option<f64>, percentage: Option<f64>) -> Alert {
        Alert {
            id: id.to_string(),
            symbol: symbol.to_string(),
            company_name: String::new(),
            alert_type: alert_type.to_string(),
            threshold,
            percentage,
            status: "active".to_string(),
            created_at: Utc::now(),
            last_triggered: None,
            triggered_price: None,
            triggered_change: None,
            email_notifications: true,
            in_app_notifications: true,
        }
    }

    fn metrics(current_price: f64, change_percent: f64) -> Metrics {
        Metrics {
            current_price,
            change_percent,
            ..Metrics::default()
        }
    }

    struct Harness {
        checker: AlertChecker,
        repo: Arc<InMemoryAlertRepository>,
        provider: Arc<StubProvider>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(provider: StubProvider, alerts: Vec<Alert>) -> Harness {
        let repo = Arc::new(InMemoryAlertRepository::with_alerts(alerts));
        let provider = Arc::new(provider);
        let notifier = Arc::new(RecordingNotifier::default());
        let price_service = Arc::new(
            PriceService::new(provider.clone(), Arc::new(MarketSimulator::new(Some(9))), false)
        );
        let checker = AlertChecker::new(
            Arc::new(AlertStore::new(repo.clone())),
            price_service,
            notifier.clone()
        );
        Harness { checker, repo, provider, notifier }
    }

    #[test]
    fn test_price_above_boundary() {
        let a = alert("1", "AAPL", "price-above", Some(200.0), None);
        assert_eq!(evaluate(&a, &metrics(200.0, 0.0)).as_deref(), Some("Price above $200.00"));
        assert!(evaluate(&a, &metrics(250.5, 0.0)).is_some());
        assert!(evaluate(&a, &metrics(199.99, 0.0)).is_none());
    }

    #[test]
    fn test_price_below_boundary() {
        let a = alert("1", "AAPL", "price-below", Some(150.0), None);
        assert_eq!(evaluate(&a, &metrics(150.0, 0.0)).as_deref(), Some("Price below $150.00"));
        assert!(evaluate(&a, &metrics(150.01, 0.0)).is_none());
    }

    #[test]
    fn test_percentage_gain() {
        let a = alert("1", "AAPL", "percentage-gain", None, Some(2.0));
        assert_eq!(
            evaluate(&a, &metrics(1.0, 2.5)).as_deref(),
            Some("Gained 2.50% (threshold: 2.00%)")
        );
        assert!(evaluate(&a, &metrics(1.0, 1.99)).is_none());
        assert!(evaluate(&a, &metrics(1.0, -3.0)).is_none());
    }

    #[test]
    fn test_percentage_loss_scenario() {
        let a = alert("1", "TSLA", "percentage-loss", None, Some(3.0));
        assert_eq!(
            evaluate(&a, &metrics(1.0, -4.2)).as_deref(),
            Some("Lost 4.20% (threshold: 3.00%)")
        );
        assert!(evaluate(&a, &metrics(1.0, -2.0)).is_none());
        assert!(evaluate(&a, &metrics(1.0, 4.2)).is_none());
    }

    #[test]
    fn test_percentage_change_ignores_sign() {
        let a = alert("1", "NVDA", "percentage-change", None, Some(3.0));
        assert_eq!(
            evaluate(&a, &metrics(1.0, 3.5)).as_deref(),
            Some("Gained 3.50% (threshold: 3.00%)")
        );
        assert_eq!(
            evaluate(&a, &metrics(1.0, -3.5)).as_deref(),
            Some("Lost 3.50% (threshold: 3.00%)")
        );
        assert!(evaluate(&a, &metrics(1.0, 2.99)).is_none());
        assert!(evaluate(&a, &metrics(1.0, -2.99)).is_none());
    }

    #[test]
    fn test_missing_bound_or_unknown_type_never_triggers() {
        assert!(evaluate(&alert("1", "A", "price-above", None, Some(1.0)), &metrics(1e9, 0.0)).is_none());
        assert!(evaluate(&alert("1", "A", "percentage-change", Some(1.0), None), &metrics(1.0, 99.0)).is_none());
        assert!(evaluate(&alert("1", "A", "volume-spike", Some(0.0), Some(0.0)), &metrics(1.0, 1.0)).is_none());
    }

    #[tokio::test]
    async fn test_batch_triggers_and_persists() {
        let stub = StubProvider::new().with_price("TSLA", 95.8, 100.0);
        let h = harness(stub, vec![
            alert("loss", "TSLA", "percentage-loss", None, Some(3.0)),
            alert("above", "TSLA", "price-above", Some(120.0), None),
        ]);

        let report = h.checker.check_alerts().await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.triggered, 1);
        assert_eq!(report.results[0].status, CheckStatus::Triggered);
        assert_eq!(report.results[0].message.as_deref(), Some("Lost 4.20% (threshold: 3.00%)"));
        assert_eq!(report.results[1].status, CheckStatus::Monitoring);
        assert_eq!(report.results[1].current_price, Some(95.8));

        let stored = h.repo.load().await.unwrap();
        assert_eq!(stored[0].status, "triggered");
        assert_eq!(stored[0].triggered_price, Some(95.8));
        assert_eq!(stored[0].triggered_change, Some(-4.2));
        assert!(stored[0].last_triggered.is_some());
        assert_eq!(stored[1].status, "active");
        assert!(stored[1].last_triggered.is_none());

        assert_eq!(h.notifier.sent(), vec![("loss".to_string(), "Lost 4.20% (threshold: 3.00%)".to_string())]);
        assert_eq!(h.provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_batch_leaves_inactive_alerts_untouched() {
        let stub = StubProvider::new().with_price("AAPL", 250.0, 200.0);
        let mut triggered = alert("t", "AAPL", "price-above", Some(100.0), None);
        triggered.status = "triggered".to_string();
        triggered.last_triggered = Some(Utc::now() - chrono::Duration::hours(3));
        triggered.triggered_price = Some(101.0);
        let mut paused = alert("p", "AAPL", "price-above", Some(100.0), None);
        paused.status = "paused".to_string();

        let before = vec![triggered, paused];
        let h = harness(stub, before.clone());

        let report = h.checker.check_alerts().await.unwrap();
        assert_eq!(report.processed, 0);
        assert_eq!(h.repo.load().await.unwrap(), before);
        assert!(h.notifier.sent().is_empty());
        assert_eq!(h.provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_batch_fetches_quotes_only() {
        let stub = StubProvider::new()
            .with_price("AAPL", 250.0, 200.0)
            .with_price("MSFT", 300.0, 310.0)
            .with_price("NVDA", 500.0, 480.0)
            .with_name("AAPL", "Apple Inc");
        let h = harness(stub, vec![
            alert("a", "AAPL", "price-above", Some(1.0), None),
            alert("m", "MSFT", "percentage-loss", None, Some(1.0)),
            alert("n", "NVDA", "price-below", Some(1.0), None),
        ]);

        let report = h.checker.check_alerts().await.unwrap();
        assert_eq!(report.processed, 3);
        assert_eq!(h.provider.calls(), 3);
        assert_eq!(h.provider.profile_calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_quote_does_not_trigger() {
        let mut stub = StubProvider::new();
        stub.quotes.insert("DEAD".to_string(), crate::providers::Quote {
            current: Some(0.0),
            previous_close: Some(50.0),
            ..Default::default()
        });
        let below = alert("b", "DEAD", "price-below", Some(10.0), None);
        let h = harness(stub, vec![below.clone()]);

        let report = h.checker.check_alerts().await.unwrap();
        assert_eq!(report.results[0].status, CheckStatus::Error);
        assert_eq!(h.repo.load().await.unwrap()[0], below);
        assert!(h.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_error_outcome() {
        let stub = StubProvider::new().with_price("AAPL", 250.0, 200.0);
        let failing = alert("missing", "ZZZZ", "price-above", Some(1.0), None);
        let h = harness(stub, vec![failing.clone(), alert("ok", "AAPL", "price-above", Some(240.0), None)]);

        let report = h.checker.check_alerts().await.unwrap();
        assert_eq!(report.results[0].status, CheckStatus::Error);
        assert!(report.results[0].error.is_some());
        assert_eq!(report.results[1].status, CheckStatus::Triggered);

        let stored = h.repo.load().await.unwrap();
        assert_eq!(stored[0], failing);
        assert_eq!(stored[1].status, "triggered");
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_abort_batch() {
        let stub = StubProvider::new().with_price("AAPL", 250.0, 200.0);
        let repo = Arc::new(InMemoryAlertRepository::with_alerts(vec![
            alert("a", "AAPL", "price-above", Some(1.0), None),
        ]));
        let notifier = Arc::new(RecordingNotifier { fail: true, ..RecordingNotifier::default() });
        let checker = AlertChecker::new(
            Arc::new(AlertStore::new(repo.clone())),
            Arc::new(PriceService::new(Arc::new(stub), Arc::new(MarketSimulator::new(None)), false)),
            notifier.clone()
        );

        let report = checker.check_alerts().await.unwrap();
        assert_eq!(report.triggered, 1);
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(repo.load().await.unwrap()[0].status, "triggered");
    }

    #[tokio::test]
    async fn test_email_opt_out_skips_notifier() {
        let stub = StubProvider::new().with_price("AAPL", 250.0, 200.0);
        let mut quiet = alert("q", "AAPL", "price-above", Some(1.0), None);
        quiet.email_notifications = false;
        let h = harness(stub, vec![quiet]);

        let report = h.checker.check_alerts().await.unwrap();
        assert_eq!(report.triggered, 1);
        assert!(h.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_check_single_alert_retriggers() {
        let stub = StubProvider::new().with_price("AAPL", 250.0, 200.0);
        let mut a = alert("a", "AAPL", "price-above", Some(240.0), None);
        a.status = "triggered".to_string();
        a.triggered_price = Some(241.0);
        let h = harness(stub, vec![a]);

        let result = h.checker.check_alert("a").await.unwrap();
        assert_eq!(result.status, CheckStatus::Triggered);

        let stored = h.repo.load().await.unwrap();
        assert_eq!(stored[0].triggered_price, Some(250.0));
        assert_eq!(stored[0].triggered_change, Some(25.0));
        assert_eq!(stored[0].status, "triggered");

        assert!(matches!(h.checker.check_alert("nope").await, Err(AppError::AlertNotFound)));
    }

    #[tokio::test]
    async fn test_check_single_paused_alert_is_inert() {
        let stub = StubProvider::new().with_price("AAPL", 250.0, 200.0);
        let mut paused = alert("p", "AAPL", "price-above", Some(1.0), None);
        paused.status = "paused".to_string();
        let h = harness(stub, vec![paused.clone()]);

        let result = h.checker.check_alert("p").await.unwrap();
        assert_eq!(result.status, CheckStatus::Monitoring);
        assert!(result.message.is_none());

        assert_eq!(h.repo.load().await.unwrap(), vec![paused]);
        assert!(h.notifier.sent().is_empty());
        assert_eq!(h.provider.calls(), 0);
    }
}
