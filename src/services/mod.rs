pub mod metrics;
pub mod price_service;
pub mod price_alert_service;
pub mod portfolio_service;

pub use metrics::{ MarketSimulator, Metrics };
pub use price_service::{ PriceService, StockQuote };
pub use price_alert_service::PriceAlertService;
pub use portfolio_service::PortfolioService;
