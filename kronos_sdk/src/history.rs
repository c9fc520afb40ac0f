//! Synthetic OHLCV history used as model context.

use std::collections::BTreeMap;

use rand::Rng;

use crate::config::ForecastConfig;
use crate::dto::{HistorySeries, PricePoint};
use crate::helpers;

/// Builds plausible daily OHLCV series from a per-symbol base price.
///
/// Each bar opens at the previous close; high, low and close are drawn
/// within `volatility` of the open and then clamped so every bar satisfies
/// `low <= min(open, close) <= max(open, close) <= high`.
#[derive(Clone, Debug)]
pub struct HistorySynthesizer {
    base_prices: BTreeMap<String, f64>,
    default_price: f64,
    volatility: f64,
    volume_low: f64,
    volume_high: f64,
}

impl HistorySynthesizer {
    pub fn new(
        base_prices: BTreeMap<String, f64>,
        default_price: f64,
        volatility: f64,
        volume_low: f64,
        volume_high: f64,
    ) -> Self {
        Self {
            base_prices,
            default_price,
            volatility,
            volume_low,
            volume_high,
        }
    }

    pub fn from_config(config: &ForecastConfig) -> Self {
        Self::new(
            config.history_prices.clone(),
            config.default_price,
            config.history_volatility,
            config.volume_range.start,
            config.volume_range.end,
        )
    }

    pub fn base_price(&self, symbol: &str) -> f64 {
        helpers::lookup_price(&self.base_prices, symbol, self.default_price)
    }

    /// Generate `days` bars for `symbol`, oldest first.
    pub fn generate<R: Rng + ?Sized>(&self, symbol: &str, days: usize, rng: &mut R) -> HistorySeries {
        let v = self.volatility;
        let mut current_price = self.base_price(symbol);
        let mut series = Vec::with_capacity(days);

        for _ in 0..days {
            let open = current_price;
            let high = open * (1.0 + helpers::uniform(rng, 0.0, v));
            let low = open * (1.0 - helpers::uniform(rng, 0.0, v));
            let close = open * (1.0 + helpers::uniform(rng, -v, v));
            let volume = helpers::uniform(rng, self.volume_low, self.volume_high);

            series.push(PricePoint {
                open,
                high: high.max(open).max(close),
                low: low.min(open).min(close),
                close,
                volume,
                amount: volume * close,
            });

            current_price = close;
        }

        series
    }
}

impl Default for HistorySynthesizer {
    fn default() -> Self {
        Self::from_config(&ForecastConfig::default())
    }
}
