use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand_distr::StandardNormal;
use statrs::statistics::Statistics;

use crate::dto::{ModelForecast, PredictionError};

/// Volatility reported when a model forecast has no successive changes.
pub(crate) const SINGLE_STEP_VOLATILITY: f64 = 0.1;
const MODEL_CONFIDENCE_CAP: f64 = 0.95;

/// Exact table lookup with a default for unknown symbols.
pub(crate) fn lookup_price(table: &BTreeMap<String, f64>, symbol: &str, default: f64) -> f64 {
    table.get(symbol).copied().unwrap_or(default)
}

/// Exact lookup, then a retry on the symbol normalized to carry the quote
/// suffix exactly once (`"BTC"` and `"BTCUSDT"` resolve alike), then the
/// default.
pub(crate) fn lookup_price_with_suffix(
    table: &BTreeMap<String, f64>,
    symbol: &str,
    quote_suffix: &str,
    default: f64,
) -> f64 {
    if let Some(price) = table.get(symbol) {
        return *price;
    }
    if quote_suffix.is_empty() {
        return default;
    }

    let base = symbol.replace(quote_suffix, "");
    lookup_price(table, &format!("{base}{quote_suffix}"), default)
}

/// Uniform draw from `[low, high)`; a degenerate range yields `low`.
pub(crate) fn uniform<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

/// Draw from `N(0, std_dev)`.
pub(crate) fn normal<R: Rng + ?Sized>(rng: &mut R, std_dev: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    z * std_dev
}

/// `count` instants evenly spaced from `end - days` to `end`, both included.
pub(crate) fn context_timestamps(end: DateTime<Utc>, days: usize, count: usize) -> Vec<DateTime<Utc>> {
    let start = end - Duration::days(days as i64);
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let span_ms = (end - start).num_milliseconds() as f64;
            let step_ms = span_ms / (count - 1) as f64;
            (0..count)
                .map(|idx| {
                    if idx == count - 1 {
                        end
                    } else {
                        start + Duration::milliseconds((step_ms * idx as f64).round() as i64)
                    }
                })
                .collect()
        }
    }
}

/// `horizon` daily instants starting the day after `now`.
pub(crate) fn forecast_timestamps(now: DateTime<Utc>, horizon: usize) -> Vec<DateTime<Utc>> {
    (1..=horizon)
        .map(|day| now + Duration::days(day as i64))
        .collect()
}

/// Mean absolute relative change between consecutive prices.
pub(crate) fn relative_change_volatility(prices: &[f64]) -> f64 {
    let changes: Vec<f64> = prices
        .windows(2)
        .map(|pair| ((pair[1] - pair[0]) / pair[0]).abs())
        .collect();

    if changes.is_empty() {
        return SINGLE_STEP_VOLATILITY;
    }
    changes.iter().mean()
}

/// Confidence decreasing with volatility, capped at 0.95 and kept in `[0, 1]`.
pub(crate) fn model_confidence(volatility: f64) -> f64 {
    if volatility.is_nan() {
        return 0.0;
    }
    let raw = (0.7 + (1.0 - volatility) * 0.25).min(MODEL_CONFIDENCE_CAP);
    normalize_confidence(raw)
}

pub(crate) fn normalize_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Reject model output that cannot be normalized into a result.
pub(crate) fn validate_model_output(
    forecast: &ModelForecast,
    horizon: usize,
) -> Result<(), PredictionError> {
    if forecast.close.len() != horizon || forecast.volume.len() != horizon {
        return Err(PredictionError::Prediction(format!(
            "expected {horizon} forecast rows, got {} prices and {} volumes",
            forecast.close.len(),
            forecast.volume.len()
        )));
    }
    if forecast
        .close
        .iter()
        .any(|price| !price.is_finite() || *price <= 0.0)
    {
        return Err(PredictionError::Prediction(
            "model returned a non-positive or non-finite price".to_string(),
        ));
    }
    if forecast.volume.iter().any(|volume| !volume.is_finite()) {
        return Err(PredictionError::Prediction(
            "model returned a non-finite volume".to_string(),
        ));
    }
    Ok(())
}
