//! Entry point for the Kronos forecast SDK crate.
//! Consumers should import exported types via the crate root.
//!
//! A [`ForecastEngine`] delegates to an external Kronos model when one is
//! bound and loaded, and otherwise produces a synthetic forecast. Both paths
//! return the same [`ForecastResult`] schema; the `model` field tells them
//! apart.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use kronos_sdk::{ForecastConfig, ForecastEngine, HttpForecastModel};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), kronos_sdk::PredictionError> {
//!     let config = ForecastConfig::default();
//!     let model = HttpForecastModel::new(
//!         "http://127.0.0.1:8000",
//!         config.model_name.clone(),
//!         Some(Duration::from_secs(30)),
//!     )?;
//!
//!     let mut engine = ForecastEngine::new(config).with_model(Box::new(model));
//!     if engine.load_model().await.is_err() {
//!         eprintln!("Kronos unavailable, forecasts will be synthetic");
//!     }
//!
//!     let forecast = engine.forecast("BTCUSDT", 5).await;
//!     println!("{forecast:?}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dto;
pub mod handler;
pub(crate) mod helpers;
pub mod history;
pub mod model;
pub mod implementation {
    include!("impl.rs");
}

pub use config::{ForecastConfig, SamplingConfig};
pub use dto::*;
pub use handler::{run_cli, run_prediction_handler, CliOutcome};
pub use history::HistorySynthesizer;
pub use implementation::ForecastEngine;
pub use model::{ForecastModel, HttpForecastModel};
