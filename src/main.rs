use stock_alerts::{ AppError, Config, Result };
use std::sync::Arc;
use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };

use stock_alerts::alert_checker::AlertChecker;
use stock_alerts::db::{ AlertStore, JsonFileAlertRepository };
use stock_alerts::notifications::{ EmailNotifier, LogNotifier, Notifier };
use stock_alerts::providers::{ FinnhubProvider, NewsClient };
use stock_alerts::services::{ MarketSimulator, PortfolioService, PriceAlertService, PriceService };

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber
        ::registry()
        .with(
            tracing_subscriber::EnvFilter
                ::try_from_default_env()
                .unwrap_or_else(|_| "stock_alerts=debug,tower_http=debug".into())
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| AppError::Config(e.to_string()))?;

    tracing::info!(
        "Starting stock-alerts (mock data: {}, alert store: {})",
        config.is_mock_mode(),
        config.alerts_file.display()
    );
    if !config.is_mock_mode() && config.provider.api_key.is_none() {
        tracing::warn!("FINNHUB_API_KEY is not set; live quotes will be reported as halted");
    }

    // Quote pipeline
    let provider = Arc::new(FinnhubProvider::new(&config.provider)?);
    let simulator = Arc::new(MarketSimulator::new(config.provider.mock_seed));
    let price_service = Arc::new(PriceService::new(provider, simulator, config.is_mock_mode()));

    // Alert store
    let repository = Arc::new(JsonFileAlertRepository::new(config.alerts_file.clone()));
    let store = Arc::new(AlertStore::new(repository));

    // Alert delivery
    let news = config.news.as_ref().map(NewsClient::new).transpose()?;
    let notifier: Arc<dyn Notifier> = match &config.email {
        Some(email) => {
            tracing::info!("Alert emails go to {} via {}:{}", email.recipient, email.smtp_host, email.smtp_port);
            Arc::new(EmailNotifier::new(email, news)?)
        }
        None => {
            tracing::info!("EMAIL_ADDRESS/EMAIL_PASSWORD/RECIPIENT_EMAIL not set; alert notifications are only logged");
            Arc::new(LogNotifier)
        }
    };

    // Initialize services
    let alert_service = Arc::new(PriceAlertService::new(store.clone()));
    let portfolio_service = Arc::new(
        PortfolioService::new(price_service.clone(), config.portfolio_symbols.clone())
    );
    let alert_checker = Arc::new(
        AlertChecker::new(store, price_service.clone(), notifier)
    );

    if let Some(period) = config.alert_check_interval {
        tracing::info!("Background alert checks every {}s", period.as_secs());
        tokio::spawn(alert_checker.clone().start(period));
    }

    let app_state = stock_alerts::api::AppState::new(
        price_service,
        alert_service,
        portfolio_service,
        alert_checker
    );

    let app = stock_alerts::api::create_router(app_state);

    // Start server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener
        ::bind(&addr).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    axum::serve(listener, app).await.map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(())
}
