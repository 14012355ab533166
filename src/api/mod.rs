use std::sync::Arc;

use axum::{ routing::{ get, post }, Router };
use tower_http::{ cors::CorsLayer, trace::TraceLayer };

pub mod stocks;
pub mod dashboard;
pub mod alerts;

use crate::alert_checker::AlertChecker;
use crate::services::{ PortfolioService, PriceAlertService, PriceService };

#[derive(Clone)]
pub struct AppState {
    pub price_service: Arc<PriceService>,
    pub alert_service: Arc<PriceAlertService>,
    pub portfolio_service: Arc<PortfolioService>,
    pub alert_checker: Arc<AlertChecker>,
}

impl AppState {
    pub fn new(
        price_service: Arc<PriceService>,
        alert_service: Arc<PriceAlertService>,
        portfolio_service: Arc<PortfolioService>,
        alert_checker: Arc<AlertChecker>
    ) -> Self {
        Self {
            price_service,
            alert_service,
            portfolio_service,
            alert_checker,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(stocks::health_check))
        .route("/api/stocks", get(stocks::list_stocks))
        .route("/api/stock/{symbol}", get(stocks::get_stock))
        .route("/api/dashboard/portfolio", get(dashboard::get_portfolio))
        .route("/api/dashboard/market-leaders", get(dashboard::get_market_leaders))
        .route("/api/dashboard/alerts", get(dashboard::get_alert_summary))
        .route("/api/alerts", get(alerts::list_alerts).post(alerts::create_alert))
        .route("/api/alerts/process", post(alerts::process_alerts))
        .route(
            "/api/alerts/{id}",
            get(alerts::get_alert).put(alerts::update_alert).delete(alerts::delete_alert)
        )
        .route("/api/alerts/{id}/check", post(alerts::check_alert))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
