use std::panic::AssertUnwindSafe;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use futures::FutureExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::config::ForecastConfig;
use crate::helpers;
use crate::history::HistorySynthesizer;
use crate::model::ForecastModel;
use crate::{ForecastOutcome, ForecastResult, ModelRequest, PredictionError, Trend};

/// Forecasting engine that prefers the bound model and degrades to a
/// synthetic projection whenever the model is absent or fails.
pub struct ForecastEngine {
    config: ForecastConfig,
    synthesizer: HistorySynthesizer,
    model: Option<Box<dyn ForecastModel>>,
    model_loaded: bool,
    rng: Mutex<StdRng>,
}

impl ForecastEngine {
    /// Construct an engine without a model; every forecast is synthetic
    /// until [`with_model`](Self::with_model) and
    /// [`load_model`](Self::load_model) succeed.
    ///
    /// ```no_run
    /// use kronos_sdk::{ForecastConfig, ForecastEngine};
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let engine = ForecastEngine::new(ForecastConfig::default());
    /// let forecast = engine.forecast("BTCUSDT", 5).await;
    /// assert_eq!(forecast.predicted_prices.len(), 5);
    /// # }
    /// ```
    pub fn new(config: ForecastConfig) -> Self {
        let synthesizer = HistorySynthesizer::from_config(&config);
        Self {
            config,
            synthesizer,
            model: None,
            model_loaded: false,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Bind an external model. Binding resets the loaded flag.
    pub fn with_model(mut self, model: Box<dyn ForecastModel>) -> Self {
        self.model = Some(model);
        self.model_loaded = false;
        self
    }

    /// Seed the random source so synthetic paths are reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn synthesizer(&self) -> &HistorySynthesizer {
        &self.synthesizer
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some() && self.model_loaded
    }

    /// Load the bound model once, at startup.
    ///
    /// Returns [`PredictionError::ModelUnavailable`] when no model is bound
    /// and propagates the model's own load error otherwise. The engine stays
    /// usable either way; failed loads only mean synthetic forecasts.
    pub async fn load_model(&mut self) -> Result<(), PredictionError> {
        let Some(model) = self.model.as_ref() else {
            return Err(PredictionError::ModelUnavailable);
        };

        match model.load().await {
            Ok(()) => {
                info!(model = model.name(), "forecasting model loaded");
                self.model_loaded = true;
                Ok(())
            }
            Err(err) => {
                warn!(model = model.name(), error = %err, "forecasting model failed to load");
                self.model_loaded = false;
                Err(err)
            }
        }
    }

    /// Forecast `horizon` days for `symbol`.
    ///
    /// Never fails: model errors and panics select the synthetic path, whose
    /// origin is visible in [`ForecastResult::model_name`].
    pub async fn forecast(&self, symbol: &str, horizon: usize) -> ForecastResult {
        self.forecast_outcome(symbol, horizon).await.into_result()
    }

    /// Same as [`forecast`](Self::forecast) but keeps the origin tag.
    pub async fn forecast_outcome(&self, symbol: &str, horizon: usize) -> ForecastOutcome {
        if !self.is_model_loaded() {
            debug!(symbol, horizon, "model not loaded, using synthetic forecast");
            return ForecastOutcome::Synthetic(self.synthetic_forecast(symbol, horizon));
        }

        let attempt = AssertUnwindSafe(self.model_forecast(symbol, horizon))
            .catch_unwind()
            .await;

        match attempt {
            Ok(Ok(result)) => ForecastOutcome::Model(result),
            Ok(Err(err)) => {
                warn!(symbol, horizon, error = %err, "model forecast failed, using synthetic forecast");
                ForecastOutcome::Synthetic(self.synthetic_forecast(symbol, horizon))
            }
            Err(_) => {
                warn!(symbol, horizon, "model forecast panicked, using synthetic forecast");
                ForecastOutcome::Synthetic(self.synthetic_forecast(symbol, horizon))
            }
        }
    }

    async fn model_forecast(
        &self,
        symbol: &str,
        horizon: usize,
    ) -> Result<ForecastResult, PredictionError> {
        let model = self.model.as_ref().ok_or(PredictionError::ModelUnavailable)?;

        let context = {
            let mut rng = self.rng();
            self.synthesizer
                .generate(symbol, self.config.context_days, &mut *rng)
        };
        let last = context.last().cloned().ok_or(PredictionError::InsufficientData)?;

        let now = Utc::now();
        let x_timestamp = helpers::context_timestamps(now, self.config.context_days, context.len());
        let y_timestamp = helpers::forecast_timestamps(now, horizon);

        let request = ModelRequest {
            history: &context,
            x_timestamp: &x_timestamp,
            y_timestamp: &y_timestamp,
            horizon,
            sampling: &self.config.sampling,
        };

        let output = model.predict(&request).await?;
        helpers::validate_model_output(&output, horizon)?;

        let final_price = output
            .close
            .last()
            .copied()
            .ok_or(PredictionError::InsufficientData)?;
        let volatility = helpers::relative_change_volatility(&output.close);

        debug!(symbol, horizon, volatility, "model forecast complete");

        Ok(ForecastResult {
            symbol: symbol.to_string(),
            current_price: last.close,
            current_volume: last.volume,
            trend: Trend::from_prices(last.close, final_price),
            confidence: helpers::model_confidence(volatility),
            volatility,
            predicted_prices: output.close,
            predicted_volumes: output.volume,
            timestamp: Utc::now(),
            model_name: model.name().to_string(),
        })
    }

    /// Synthetic forward projection: a geometric random walk from the
    /// symbol's configured price with volumes scattered around one base
    /// volume.
    pub fn synthetic_forecast(&self, symbol: &str, horizon: usize) -> ForecastResult {
        let config = &self.config;
        let current_price = helpers::lookup_price_with_suffix(
            &config.fallback_prices,
            symbol,
            &config.quote_suffix,
            config.default_price,
        );

        let mut rng = self.rng();

        let mut predicted_prices = Vec::with_capacity(horizon);
        let mut price = current_price;
        for _ in 0..horizon {
            price *= 1.0 + helpers::normal(&mut *rng, config.fallback_volatility);
            predicted_prices.push(price);
        }

        let base_volume =
            helpers::uniform(&mut *rng, config.volume_range.start, config.volume_range.end);
        let predicted_volumes = (0..horizon)
            .map(|_| {
                base_volume
                    * (1.0 + helpers::uniform(&mut *rng, -config.volume_jitter, config.volume_jitter))
            })
            .collect();

        let confidence = helpers::uniform(
            &mut *rng,
            config.fallback_confidence_range.start,
            config.fallback_confidence_range.end,
        );

        let final_price = predicted_prices.last().copied().unwrap_or(current_price);

        ForecastResult {
            symbol: symbol.to_string(),
            current_price,
            predicted_prices,
            current_volume: base_volume,
            predicted_volumes,
            confidence,
            volatility: config.fallback_volatility,
            trend: Trend::from_prices(current_price, final_price),
            timestamp: Utc::now(),
            model_name: config.fallback_model_name.clone(),
        }
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::new(ForecastConfig::default())
    }
}
