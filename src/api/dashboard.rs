use axum::{ extract::State, Json };
use chrono::Utc;

use crate::error::Result;
use crate::services::portfolio_service::{ MarketLeaders, Portfolio };
use crate::services::price_alert_service::AlertSummary;

use super::AppState;

pub async fn get_portfolio(State(state): State<AppState>) -> Json<Portfolio> {
    Json(state.portfolio_service.get_portfolio().await)
}

pub async fn get_market_leaders(State(state): State<AppState>) -> Json<MarketLeaders> {
    Json(state.portfolio_service.get_market_leaders().await)
}

pub async fn get_alert_summary(State(state): State<AppState>) -> Result<Json<AlertSummary>> {
    let summary = state.alert_service.summary(Utc::now()).await?;

    Ok(Json(summary))
}
