pub mod config;
pub mod enums;
pub mod error;
pub mod db;
pub mod providers;
pub mod services;
pub mod notifications;
pub mod alert_checker;
pub mod api;

pub use config::Config;
pub use enums::{ AlertStatus, AlertType, CheckStatus, QuoteStatus };
pub use error::{ AppError, Result };
