use async_trait::async_trait;

use crate::db::Alert;
use crate::error::Result;

pub mod email;

pub use email::EmailNotifier;

/// Rendered notification for a triggered alert.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertNotification {
    pub subject: String,
    pub body: String,
}

impl AlertNotification {
    pub fn for_alert(alert: &Alert, message: &str) -> Self {
        let emoji = if alert.alert_type.ends_with("below") || alert.alert_type.ends_with("loss") {
            "📉"
        } else {
            "📈"
        };

        let price = alert.triggered_price
            .map(|p| format!("${:.2}", p))
            .unwrap_or_else(|| "n/a".to_string());
        let change = alert.triggered_change
            .map(|c| format!("{:+.2}%", c))
            .unwrap_or_else(|| "n/a".to_string());

        let company = if alert.company_name.is_empty() {
            alert.symbol.as_str()
        } else {
            alert.company_name.as_str()
        };

        Self {
            subject: format!("{} Stock Alert", alert.symbol),
            body: format!(
                "{emoji} Price Alert Triggered!\n\n\
                Symbol: {symbol} ({company})\n\
                Condition: {message}\n\
                Current Price: {price}\n\
                Daily Change: {change}\n\n\
                This alert is now marked as triggered. Reactivate it to keep monitoring.",
                emoji = emoji,
                symbol = alert.symbol,
                company = company,
                message = message,
                price = price,
                change = change,
            ),
        }
    }
}

/// Delivery hook invoked when an alert fires.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, alert: &Alert, message: &str) -> Result<()>;
}

/// Records notifications through `tracing` instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, alert: &Alert, message: &str) -> Result<()> {
        let notification = AlertNotification::for_alert(alert, message);
        tracing::info!(
            alert_id = %alert.id,
            symbol = %alert.symbol,
            subject = %notification.subject,
            "Alert notification: {}",
            notification.body.replace('\n', " | ")
        );
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn triggered_alert(alert_type: &str) -> Alert {
        Alert {
            id: "a1".to_string(),
            symbol: "TSLA".to_string(),
            company_name: String::new(),
            alert_type: alert_type.to_string(),
            threshold: None,
            percentage: Some(3.0),
            status: "triggered".to_string(),
            created_at: Utc::now(),
            last_triggered: Some(Utc::now()),
            triggered_price: Some(241.5),
            triggered_change: Some(-4.2),
            email_notifications: true,
            in_app_notifications: true,
        }
    }

    #[test]
    fn test_notification_contents() {
        let alert = triggered_alert("percentage-loss");
        let n = AlertNotification::for_alert(&alert, "Lost 4.20% (threshold: 3.00%)");

        assert_eq!(n.subject, "TSLA Stock Alert");
        assert!(n.body.starts_with("📉"));
        assert!(n.body.contains("Symbol: TSLA (TSLA)"));
        assert!(n.body.contains("Current Price: $241.50"));
        assert!(n.body.contains("Daily Change: -4.20%"));
        assert!(n.body.contains("Lost 4.20% (threshold: 3.00%)"));
    }

    #[tokio::test]
    async fn test_log_notifier_succeeds() {
        let alert = triggered_alert("price-above");
        assert!(LogNotifier.notify(&alert, "Price above $200.00").await.is_ok());
    }
}
