use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{ Rng, SeedableRng };
use serde::{ Deserialize, Serialize };

use crate::providers::Quote;

/// Price used for mock symbols missing from the base table.
pub const DEFAULT_MOCK_BASE_PRICE: f64 = 100.0;

const MOCK_BASE_PRICES: &[(&str, f64)] = &[
    ("AAPL", 180.0),
    ("GOOGL", 140.0),
    ("MSFT", 380.0),
    ("TSLA", 250.0),
    ("NVDA", 480.0),
    ("AMZN", 150.0),
    ("META", 350.0),
    ("NFLX", 450.0),
];

/// Canonical price record every downstream component works from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub current_price: f64,
    pub price_change: f64,
    pub change_percent: f64,
    pub day_high: f64,
    pub day_low: f64,
    pub volume: u64,
}

/// Round to cents. Adding `0.0` folds `-0.0` into `0.0`.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0 + 0.0
}

/// Normalize a live provider quote.
///
/// Missing fields default relative to the current price, so a quote with only
/// `current` yields zero change. A quote without a positive current price
/// becomes the all-zero record rather than an error.
pub fn normalize_quote(quote: &Quote) -> Metrics {
    let Some(current_price) = quote.price() else {
        return Metrics::default();
    };
    let previous_close = quote.previous_close.unwrap_or(current_price);
    let day_high = quote.high.unwrap_or(current_price);
    let day_low = quote.low.unwrap_or(current_price);
    let volume = quote.volume.map(|v| v.max(0.0).trunc() as u64).unwrap_or(0);

    let price_change = current_price - previous_close;
    let change_percent = if previous_close > 0.0 {
        (price_change / previous_close) * 100.0
    } else {
        0.0
    };

    Metrics {
        current_price: round2(current_price),
        price_change: round2(price_change),
        change_percent: round2(change_percent),
        day_high: round2(day_high),
        day_low: round2(day_low),
        volume,
    }
}

pub fn mock_base_price(symbol: &str) -> f64 {
    MOCK_BASE_PRICES.iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, price)| *price)
        .unwrap_or(DEFAULT_MOCK_BASE_PRICE)
}

/// Random inputs for one synthetic quote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockDraw {
    /// Percentage move from the base price, in [-5, 5].
    pub movement: f64,
    /// Multiplier for the day high, in [1.01, 1.05].
    pub high_factor: f64,
    /// Multiplier for the day low, in [0.95, 0.99].
    pub low_factor: f64,
    pub volume: u64,
}

pub fn mock_metrics(symbol: &str, draw: &MockDraw) -> Metrics {
    let base = mock_base_price(symbol);
    let current_price = round2(base * (1.0 + draw.movement / 100.0));

    Metrics {
        current_price,
        price_change: round2(current_price - base),
        change_percent: round2(draw.movement),
        day_high: round2(current_price * draw.high_factor),
        day_low: round2(current_price * draw.low_factor),
        volume: draw.volume,
    }
}

/// Source of simulated market movement and synthetic position sizes.
pub struct MarketSimulator {
    rng: Mutex<StdRng>,
}

impl MarketSimulator {
    /// Seeded simulators replay the same sequence of draws.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng: Mutex::new(rng) }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    pub fn draw(&self) -> MockDraw {
        self.with_rng(|rng| MockDraw {
            movement: rng.random_range(-5.0..=5.0),
            high_factor: rng.random_range(1.01..=1.05),
            low_factor: rng.random_range(0.95..=0.99),
            volume: rng.random_range(1_000_000..=50_000_000),
        })
    }

    pub fn metrics(&self, symbol: &str) -> Metrics {
        mock_metrics(symbol, &self.draw())
    }

    /// Share count for a synthetic holding, in [10, 100].
    pub fn shares(&self) -> u32 {
        self.with_rng(|rng| rng.random_range(10..=100))
    }
}
