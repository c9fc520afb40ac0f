//! Forecast configuration: symbol price tables, generation parameters and
//! model settings.
//!
//! Every field has a default, so a TOML file only needs the keys it
//! overrides:
//!
//! ```toml
//! context_days = 256
//! model_url = "http://127.0.0.1:8000"
//!
//! [fallback_prices]
//! BTCUSDT = 98000.0
//! ```
//!
//! Entrypoints:
//! - Parse from a TOML string: [`ForecastConfig::from_toml_str`]
//! - Parse from a file path: [`ForecastConfig::from_path`]
//! - Environment overrides: [`ForecastConfig::apply_env`]

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dto::PredictionError;

pub const ENV_CONFIG_PATH: &str = "KRONOS_CONFIG";
pub const ENV_MODEL_URL: &str = "KRONOS_MODEL_URL";
pub const ENV_MODEL_NAME: &str = "KRONOS_MODEL_NAME";
pub const ENV_CONTEXT_DAYS: &str = "KRONOS_CONTEXT_DAYS";

const HISTORY_BASE_PRICES: &[(&str, f64)] = &[
    ("BTCUSDT", 110_000.0),
    ("ETHUSDT", 3_500.0),
    ("ADAUSDT", 0.5),
    ("SOLUSDT", 100.0),
    ("DOTUSDT", 6.0),
    ("MATICUSDT", 0.8),
    ("AVAXUSDT", 25.0),
    ("LINKUSDT", 15.0),
    ("UNIUSDT", 8.0),
    ("LTCUSDT", 80.0),
    ("BCHUSDT", 250.0),
    ("XLMUSDT", 0.12),
    ("ATOMUSDT", 8.0),
    ("VETUSDT", 0.03),
    ("FILUSDT", 5.0),
    ("DOGEUSDT", 0.08),
];

const FALLBACK_BASE_PRICES: &[(&str, f64)] = &[
    ("BTCUSDT", 110_000.0),
    ("ETHUSDT", 3_500.0),
    ("BNBUSDT", 600.0),
    ("ADAUSDT", 0.48),
    ("SOLUSDT", 180.0),
    ("XRPUSDT", 0.52),
    ("DOGEUSDT", 0.08),
    ("MATICUSDT", 0.85),
    ("AVAXUSDT", 25.5),
    ("DOTUSDT", 6.2),
    ("LINKUSDT", 14.8),
    ("UNIUSDT", 6.5),
    ("LTCUSDT", 85.2),
    ("BCHUSDT", 245.6),
    ("ATOMUSDT", 8.9),
    ("NEARUSDT", 3.2),
    ("FTMUSDT", 0.35),
    ("ALGOUSDT", 0.18),
    ("VETUSDT", 0.025),
    ("ICPUSDT", 4.8),
];

fn price_table(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries
        .iter()
        .map(|(symbol, price)| (symbol.to_string(), *price))
        .collect()
}

/// Sampling parameters forwarded to the model on every prediction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplingConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub sample_count: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.9,
            sample_count: 1,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Base prices used to seed synthetic model context.
    pub history_prices: BTreeMap<String, f64>,
    /// Base prices used by the synthetic forecast path.
    pub fallback_prices: BTreeMap<String, f64>,
    /// Quote currency stripped and re-appended on a fallback table miss.
    pub quote_suffix: String,
    /// Price used when a symbol is in neither table.
    pub default_price: f64,
    /// Length of the context window handed to the model.
    pub context_days: usize,
    /// Daily volatility of synthesized history bars.
    pub history_volatility: f64,
    /// Standard deviation of the synthetic forward random walk.
    pub fallback_volatility: f64,
    pub volume_range: Range<f64>,
    /// Relative spread of forecast volumes around their base volume.
    pub volume_jitter: f64,
    pub fallback_confidence_range: Range<f64>,
    pub sampling: SamplingConfig,
    /// Tag reported when the model produced the forecast.
    pub model_name: String,
    /// Tag reported when the synthetic path produced the forecast.
    pub fallback_model_name: String,
    /// Base URL of the inference server, if any.
    pub model_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            history_prices: price_table(HISTORY_BASE_PRICES),
            fallback_prices: price_table(FALLBACK_BASE_PRICES),
            quote_suffix: "USDT".to_string(),
            default_price: 100.0,
            context_days: 400,
            history_volatility: 0.02,
            fallback_volatility: 0.02,
            volume_range: 1_000_000.0..5_000_000.0,
            volume_jitter: 0.3,
            fallback_confidence_range: 0.6..0.9,
            sampling: SamplingConfig::default(),
            model_name: "Kronos-small".to_string(),
            fallback_model_name: "Mock (Kronos unavailable)".to_string(),
            model_url: None,
            request_timeout_secs: None,
        }
    }
}

impl ForecastConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, PredictionError> {
        let config: Self =
            toml::from_str(input).map_err(|err| PredictionError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PredictionError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| {
            PredictionError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Load from `KRONOS_CONFIG` when set, otherwise start from the
    /// defaults. Environment overrides are applied in both cases.
    pub fn from_env() -> Result<Self, PredictionError> {
        let mut config = match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) => Self::from_path(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Override `model_url`, `model_name` and `context_days` from
    /// `KRONOS_MODEL_URL`, `KRONOS_MODEL_NAME` and `KRONOS_CONTEXT_DAYS`.
    pub fn apply_env(&mut self) -> Result<(), PredictionError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub(crate) fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), PredictionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_MODEL_URL).filter(|value| !value.trim().is_empty()) {
            self.model_url = Some(url.trim().to_string());
        }
        if let Some(name) = lookup(ENV_MODEL_NAME).filter(|value| !value.trim().is_empty()) {
            self.model_name = name.trim().to_string();
        }
        if let Some(days) = lookup(ENV_CONTEXT_DAYS) {
            self.context_days = days.trim().parse().map_err(|_| {
                PredictionError::Config(format!("{ENV_CONTEXT_DAYS} must be a positive integer"))
            })?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), PredictionError> {
        if self.context_days == 0 {
            return Err(PredictionError::Config(
                "context_days must be positive".to_string(),
            ));
        }
        if !(self.default_price.is_finite() && self.default_price > 0.0) {
            return Err(PredictionError::Config(
                "default_price must be a positive number".to_string(),
            ));
        }
        if let Some((symbol, _)) = self
            .history_prices
            .iter()
            .chain(self.fallback_prices.iter())
            .find(|(_, price)| !(price.is_finite() && **price > 0.0))
        {
            return Err(PredictionError::Config(format!(
                "base price for {symbol} must be a positive number"
            )));
        }
        if !(self.history_volatility >= 0.0 && self.fallback_volatility >= 0.0) {
            return Err(PredictionError::Config(
                "volatility must not be negative".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.volume_jitter) {
            return Err(PredictionError::Config(
                "volume_jitter must lie in [0, 1)".to_string(),
            ));
        }
        if self.volume_range.is_empty() || self.volume_range.start < 0.0 {
            return Err(PredictionError::Config(
                "volume_range must be a non-empty, non-negative range".to_string(),
            ));
        }
        let confidence = &self.fallback_confidence_range;
        if confidence.is_empty() || confidence.start < 0.0 || confidence.end > 1.0 {
            return Err(PredictionError::Config(
                "fallback_confidence_range must be a non-empty range within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}
