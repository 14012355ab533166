use async_trait::async_trait;
use lettre::message::{ header::ContentType, Mailbox };
use lettre::transport::smtp::authentication::Credentials;
use lettre::{ AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor };

use crate::config::EmailConfig;
use crate::db::Alert;
use crate::error::{ AppError, Result };
use crate::providers::NewsClient;

use super::{ AlertNotification, Notifier };

/// Sends alert notifications over SMTP (implicit TLS), with optional news headlines.
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    news: Option<NewsClient>,
}

/// Notification body followed by one `Headline:` line per article.
pub fn email_body(notification: &AlertNotification, headlines: &[String]) -> String {
    let mut body = notification.body.clone();
    if !headlines.is_empty() {
        body.push_str("\n\nRecent news:\n");
        for headline in headlines {
            body.push_str(&format!("\nHeadline: {}\n", headline));
        }
    }
    body
}

impl EmailNotifier {
    pub fn new(config: &EmailConfig, news: Option<NewsClient>) -> Result<Self> {
        let from: Mailbox = config.address
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid EMAIL_ADDRESS: {}", e)))?;
        let to: Mailbox = config.recipient
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid RECIPIENT_EMAIL: {}", e)))?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>
            ::relay(&config.smtp_host)
            .map_err(|e| AppError::Config(format!("Invalid SMTP host {}: {}", config.smtp_host, e)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(config.address.clone(), config.password.clone()))
            .build();

        Ok(Self { mailer, from, to, news })
    }

    /// Headlines for the alert's company, empty when news is off or unavailable.
    async fn headlines(&self, alert: &Alert) -> Vec<String> {
        let Some(news) = &self.news else {
            return Vec::new();
        };

        let query = if alert.company_name.is_empty() { &alert.symbol } else { &alert.company_name };
        match news.headlines(query).await {
            Ok(headlines) => headlines,
            Err(e) => {
                tracing::warn!("No headlines for {}: {}", alert.symbol, e);
                Vec::new()
            }
        }
    }

    pub fn compose(&self, notification: &AlertNotification, headlines: &[String]) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email_body(notification, headlines))
            .map_err(|e| AppError::Notification(format!("Failed to build email: {}", e)))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, alert: &Alert, message: &str) -> Result<()> {
        let notification = AlertNotification::for_alert(alert, message);
        let headlines = self.headlines(alert).await;
        let email = self.compose(&notification, &headlines)?;

        self.mailer
            .send(email).await
            .map_err(|e| AppError::Notification(format!("SMTP delivery failed: {}", e)))?;

        tracing::info!("Alert email for {} ({}) sent to {}", alert.symbol, alert.id, self.to);
        Ok(())
    }
}
