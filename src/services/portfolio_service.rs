use std::sync::Arc;

use serde::Serialize;

use crate::services::metrics::{ round2, Metrics };
use crate::services::price_service::PriceService;

pub struct PortfolioService {
    price_service: Arc<PriceService>,
    symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub symbol: String,
    pub shares: u32,
    pub current_price: f64,
    pub position_value: f64,
    pub position_change: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub total_value: f64,
    pub total_change: f64,
    pub change_percent: f64,
    pub holdings: Vec<Holding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketLeaderEntry {
    pub symbol: String,
    pub change_percent: f64,
    pub current_price: f64,
}

/// Leader as shown on the dashboard, e.g. `{"symbol":"NVDA","change":"+3.1% today","price":494.2}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderView {
    pub symbol: String,
    pub change: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketLeaders {
    pub top_gainer: LeaderView,
    pub top_loser: LeaderView,
}

impl From<&MarketLeaderEntry> for LeaderView {
    fn from(entry: &MarketLeaderEntry) -> Self {
        // `+ 0.0` turns -0.0 into 0.0 so a flat day reads "+0.0".
        let change_percent = entry.change_percent + 0.0;
        Self {
            symbol: entry.symbol.clone(),
            change: format!("{:+.1}% today", change_percent),
            price: entry.current_price,
        }
    }
}

impl LeaderView {
    fn placeholder() -> Self {
        Self {
            symbol: String::new(),
            change: String::new(),
            price: 0.0,
        }
    }
}

/// Value a set of `(symbol, shares, metrics)` positions.
pub fn value_portfolio(positions: &[(String, u32, Metrics)]) -> Portfolio {
    let mut total_value = 0.0;
    let mut total_change = 0.0;

    let holdings = positions
        .iter()
        .map(|(symbol, shares, metrics)| {
            let qty = f64::from(*shares);
            let position_value = qty * metrics.current_price;
            let position_change = qty * metrics.price_change;
            total_value += position_value;
            total_change += position_change;

            Holding {
                symbol: symbol.clone(),
                shares: *shares,
                current_price: metrics.current_price,
                position_value: round2(position_value),
                position_change: round2(position_change),
                change_percent: metrics.change_percent,
            }
        })
        .collect();

    // Value before today's move.
    let opening_value = total_value - total_change;
    let change_percent = if opening_value > 0.0 {
        (total_change / opening_value) * 100.0
    } else {
        0.0
    };

    Portfolio {
        total_value: round2(total_value),
        total_change: round2(total_change),
        change_percent: round2(change_percent),
        holdings,
    }
}

/// Entries ordered by `change_percent`, highest first; ties keep input order.
pub fn rank_leaders(mut entries: Vec<MarketLeaderEntry>) -> Vec<MarketLeaderEntry> {
    entries.sort_by(|a, b| b.change_percent.total_cmp(&a.change_percent));
    entries
}

pub fn pick_leaders(entries: Vec<MarketLeaderEntry>) -> MarketLeaders {
    let ranked = rank_leaders(entries);
    match (ranked.first(), ranked.last()) {
        (Some(gainer), Some(loser)) => MarketLeaders {
            top_gainer: gainer.into(),
            top_loser: loser.into(),
        },
        _ => MarketLeaders {
            top_gainer: LeaderView::placeholder(),
            top_loser: LeaderView::placeholder(),
        },
    }
}

impl PortfolioService {
    pub fn new(price_service: Arc<PriceService>, symbols: Vec<String>) -> Self {
        Self {
            price_service,
            symbols,
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Value a synthetic portfolio over the tracked universe.
    ///
    /// Share counts are redrawn on every call. Symbols whose quote failed are
    /// valued at zero.
    pub async fn get_portfolio(&self) -> Portfolio {
        let mut positions = Vec::with_capacity(self.symbols.len());

        for stock in self.price_service.get_stocks(&self.symbols).await {
            if stock.is_halted() {
                tracing::warn!("No quote for portfolio symbol {}, valuing at zero", stock.symbol);
            }
            let shares = self.price_service.simulator().shares();
            positions.push((stock.symbol.clone(), shares, stock.metrics()));
        }

        value_portfolio(&positions)
    }

    /// Top gainer and loser across the tracked universe.
    pub async fn get_market_leaders(&self) -> MarketLeaders {
        let entries = self.price_service
            .get_stocks(&self.symbols).await
            .into_iter()
            .map(|stock| MarketLeaderEntry {
                symbol: stock.symbol,
                change_percent: stock.change_percent,
                current_price: stock.current_price,
            })
            .collect();

        pick_leaders(entries)
    }
}
