use axum::{ extract::{ Path, Query, State }, Json };
use serde::{ Deserialize, Serialize };

use crate::config::Config;
use crate::services::StockQuote;

use super::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub mock_mode: bool,
}

#[derive(Deserialize)]
pub struct StocksQuery {
    #[serde(default)]
    pub symbols: Option<String>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "API is running",
        mock_mode: state.price_service.is_mock_mode(),
    })
}

/// Quotes for `?symbols=A,B`, or for the tracked universe when none are given.
pub async fn list_stocks(
    State(state): State<AppState>,
    Query(query): Query<StocksQuery>
) -> Json<Vec<StockQuote>> {
    let requested = query.symbols.as_deref().map(Config::parse_symbols).unwrap_or_default();
    let symbols = if requested.is_empty() {
        state.portfolio_service.symbols().to_vec()
    } else {
        requested
    };

    Json(state.price_service.get_stocks(&symbols).await)
}

pub async fn get_stock(
    State(state): State<AppState>,
    Path(symbol): Path<String>
) -> Json<StockQuote> {
    Json(state.price_service.get_stock(&symbol).await)
}
