use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SamplingConfig;

/// One synthesized OHLCV bar.
///
/// * `open`, `high`, `low` and `close` satisfy
///   `low <= min(open, close) <= max(open, close) <= high`.
/// * `volume` is the traded base volume for the period.
/// * `amount` is the turnover (`volume * close`) at generation time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub amount: f64,
}

/// Chronological OHLCV series, most recent bar last.
pub type HistorySeries = Vec<PricePoint>;

/// Coarse direction of a forecast relative to the current price.
///
/// Serialized as `"Bullish"` / `"Bearish"`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Trend {
    Bullish,
    Bearish,
}

impl Trend {
    /// `Bullish` only when `final_price` is strictly above `current_price`.
    pub fn from_prices(current_price: f64, final_price: f64) -> Self {
        if final_price > current_price {
            Trend::Bullish
        } else {
            Trend::Bearish
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Normalized forecast record shared by the model and synthetic paths.
///
/// Field names are the wire contract consumed by downstream services:
///
/// ```json
/// {
///   "symbol": "BTCUSDT",
///   "currentPrice": 110000.0,
///   "predictedPrices": [110412.3, 109870.1],
///   "currentVolume": 2841234.5,
///   "predictedVolumes": [3012554.2, 2450871.9],
///   "confidence": 0.74,
///   "volatility": 0.02,
///   "trend": "Bearish",
///   "timestamp": "2026-10-18T09:12:44.120Z",
///   "model": "Mock (Kronos unavailable)"
/// }
/// ```
///
/// * `predicted_prices` and `predicted_volumes` always hold exactly the
///   requested horizon.
/// * `confidence` lies in `[0.0, 1.0]`; `volatility` is non-negative.
/// * `model_name` tells a genuine model forecast apart from a synthetic one.
pub struct ForecastResult {
    pub symbol: String,
    pub current_price: f64,
    pub predicted_prices: Vec<f64>,
    pub current_volume: f64,
    pub predicted_volumes: Vec<f64>,
    pub confidence: f64,
    pub volatility: f64,
    pub trend: Trend,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "model")]
    pub model_name: String,
}

/// Forecast tagged with the path that produced it.
#[derive(Clone, Debug, PartialEq)]
pub enum ForecastOutcome {
    Model(ForecastResult),
    Synthetic(ForecastResult),
}

impl ForecastOutcome {
    /// Collapse to the shared schema. The origin survives in `model_name`.
    pub fn into_result(self) -> ForecastResult {
        match self {
            ForecastOutcome::Model(result) | ForecastOutcome::Synthetic(result) => result,
        }
    }

    pub fn result(&self) -> &ForecastResult {
        match self {
            ForecastOutcome::Model(result) | ForecastOutcome::Synthetic(result) => result,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, ForecastOutcome::Synthetic(_))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
/// Request payload for the prediction handler.
///
/// * `symbol` is the exchange pair (e.g., `"BTCUSDT"`).
/// * `days` is the forecast horizon and must be positive.
pub struct ForecastRequest {
    pub symbol: String,
    pub days: usize,
}

/// Everything the external model needs to condition one prediction.
///
/// `x_timestamp` has one instant per `history` bar; `y_timestamp` has one
/// instant per forecast step.
#[derive(Clone, Debug)]
pub struct ModelRequest<'a> {
    pub history: &'a [PricePoint],
    pub x_timestamp: &'a [DateTime<Utc>],
    pub y_timestamp: &'a [DateTime<Utc>],
    pub horizon: usize,
    pub sampling: &'a SamplingConfig,
}

/// Output columns returned by the external model.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ModelForecast {
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
}

#[derive(Debug, Error)]
/// Errors raised while loading or querying the forecasting model, or while
/// handling a request. The engine never surfaces the model variants to its
/// callers; they select the synthetic path instead.
pub enum PredictionError {
    #[error("forecasting model is not available")]
    ModelUnavailable,
    #[error("failed to load forecasting model: {0}")]
    ModelLoad(String),
    #[error("model prediction failed: {0}")]
    Prediction(String),
    #[error("insufficient data for calculation")]
    InsufficientData,
    #[error("network call failed: {0}")]
    Network(String),
    #[error("failed to serialize payload: {0}")]
    Serialization(String),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}
