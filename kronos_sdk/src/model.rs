//! External forecasting model capability.
//!
//! [`ForecastModel`] is the seam between the engine and a pretrained
//! time-series model. Implementations must tolerate being unavailable and
//! only serve predictions after [`ForecastModel::load`] has succeeded.
//!
//! [`HttpForecastModel`] drives a Kronos inference server over HTTP:
//!
//! * `GET  {base}/health`  → `{"ready": true, ...}`
//! * `POST {base}/predict` → `{"close": [...], "volume": [...]}`

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dto::{ModelForecast, ModelRequest, PredictionError, PricePoint};

#[async_trait]
pub trait ForecastModel: Send + Sync {
    /// Identifier reported in the `model` field of genuine forecasts.
    fn name(&self) -> &str;

    /// Acquire weights or remote resources. Called once before predicting.
    async fn load(&self) -> Result<(), PredictionError>;

    async fn predict(&self, request: &ModelRequest<'_>) -> Result<ModelForecast, PredictionError>;
}

#[derive(Deserialize)]
struct HealthResponse {
    #[serde(default)]
    ready: bool,
}

#[derive(Serialize)]
struct PredictPayload<'a> {
    model: &'a str,
    history: &'a [PricePoint],
    x_timestamp: Vec<String>,
    y_timestamp: Vec<String>,
    pred_len: usize,
    #[serde(rename = "T")]
    temperature: f64,
    top_p: f64,
    sample_count: u32,
}

fn format_timestamps(stamps: &[DateTime<Utc>]) -> Vec<String> {
    stamps
        .iter()
        .map(|stamp| stamp.to_rfc3339_opts(SecondsFormat::Secs, true))
        .collect()
}

pub struct HttpForecastModel {
    client: Client,
    base_url: String,
    model_name: String,
    loaded: AtomicBool,
}

impl HttpForecastModel {
    /// Build a model client for the inference server at `base_url`.
    ///
    /// `timeout` bounds each HTTP request; the engine itself never times out
    /// a prediction.
    ///
    /// ```no_run
    /// use kronos_sdk::HttpForecastModel;
    ///
    /// let model = HttpForecastModel::new("http://127.0.0.1:8000", "Kronos-small", None)?;
    /// # Ok::<(), kronos_sdk::PredictionError>(())
    /// ```
    pub fn new(
        base_url: impl Into<String>,
        model_name: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, PredictionError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| PredictionError::Network(err.to_string()))?;

        Ok(Self::with_client(client, base_url, model_name))
    }

    /// Use a pre-configured HTTP client, e.g. one pointed at a mock server.
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            model_name: model_name.into(),
            loaded: AtomicBool::new(false),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }
}

#[async_trait]
impl ForecastModel for HttpForecastModel {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn load(&self) -> Result<(), PredictionError> {
        let url = format!("{}/health", self.base_url);
        debug!(%url, "checking inference server health");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|_| PredictionError::ModelUnavailable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PredictionError::ModelLoad(format!(
                "unexpected status: {}",
                status
            )));
        }

        let health: HealthResponse = response
            .json()
            .await
            .map_err(|err| PredictionError::ModelLoad(err.to_string()))?;
        if !health.ready {
            return Err(PredictionError::ModelLoad(
                "inference server reported not ready".to_string(),
            ));
        }

        self.loaded.store(true, Ordering::Release);
        Ok(())
    }

    async fn predict(&self, request: &ModelRequest<'_>) -> Result<ModelForecast, PredictionError> {
        if !self.is_loaded() {
            return Err(PredictionError::ModelUnavailable);
        }

        let payload = PredictPayload {
            model: &self.model_name,
            history: request.history,
            x_timestamp: format_timestamps(request.x_timestamp),
            y_timestamp: format_timestamps(request.y_timestamp),
            pred_len: request.horizon,
            temperature: request.sampling.temperature,
            top_p: request.sampling.top_p,
            sample_count: request.sampling.sample_count,
        };

        let url = format!("{}/predict", self.base_url);
        debug!(%url, context = request.history.len(), horizon = request.horizon, "requesting prediction");

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| PredictionError::Prediction(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PredictionError::Prediction(format!(
                "unexpected status: {}",
                status
            )));
        }

        response
            .json::<ModelForecast>()
            .await
            .map_err(|err| PredictionError::Serialization(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingConfig;
    use chrono::Duration as ChronoDuration;
    use httpmock::prelude::*;
    use serde_json::json;

    fn build_model(server: &MockServer) -> HttpForecastModel {
        let client = Client::builder().build().unwrap();
        HttpForecastModel::with_client(client, server.base_url(), "Kronos-small")
    }

    fn sample_history() -> Vec<PricePoint> {
        vec![PricePoint {
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.5,
            volume: 2_000_000.0,
            amount: 201_000_000.0,
        }]
    }

    #[test]
    fn with_client_trims_trailing_slash() {
        let client = Client::builder().build().unwrap();
        let model = HttpForecastModel::with_client(client, "http://127.0.0.1:8000/", "Kronos-small");

        assert_eq!(model.base_url(), "http://127.0.0.1:8000");
        assert_eq!(model.name(), "Kronos-small");
        assert!(!model.is_loaded());
    }

    #[tokio::test]
    async fn load_marks_model_ready() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/health");
                then.status(200).json_body(json!({ "ready": true, "model": "Kronos-small" }));
            })
            .await;

        let model = build_model(&server);
        assert!(!model.is_loaded());

        model.load().await.expect("load should succeed");

        mock.assert_async().await;
        assert!(model.is_loaded());
    }

    #[tokio::test]
    async fn load_rejects_not_ready_server() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/health");
                then.status(200).json_body(json!({ "ready": false }));
            })
            .await;

        let model = build_model(&server);
        let result = model.load().await;

        assert!(matches!(result, Err(PredictionError::ModelLoad(message)) if message.contains("not ready")));
        assert!(!model.is_loaded());
    }

    #[tokio::test]
    async fn load_reports_unavailable_server() {
        let client = Client::builder().build().unwrap();
        let model = HttpForecastModel::with_client(client, "http://127.0.0.1:9", "Kronos-small");

        let result = model.load().await;

        assert!(matches!(result, Err(PredictionError::ModelUnavailable)));
    }

    #[tokio::test]
    async fn predict_requires_load() {
        let server = MockServer::start_async().await;
        let model = build_model(&server);
        let history = sample_history();
        let sampling = SamplingConfig::default();
        let request = ModelRequest {
            history: &history,
            x_timestamp: &[Utc::now()],
            y_timestamp: &[Utc::now() + ChronoDuration::days(1)],
            horizon: 1,
            sampling: &sampling,
        };

        let result = model.predict(&request).await;

        assert!(matches!(result, Err(PredictionError::ModelUnavailable)));
    }

    #[tokio::test]
    async fn predict_posts_context_and_sampling() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/health");
                then.status(200).json_body(json!({ "ready": true }));
            })
            .await;
        let predict = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/predict")
                    .json_body_partial(r#"{ "pred_len": 2, "T": 1.0, "top_p": 0.9, "sample_count": 1 }"#);
                then.status(200)
                    .json_body(json!({ "close": [101.0, 102.0], "volume": [1.0e6, 2.0e6] }));
            })
            .await;

        let model = build_model(&server);
        model.load().await.unwrap();

        let history = sample_history();
        let sampling = SamplingConfig::default();
        let now = Utc::now();
        let y = [now + ChronoDuration::days(1), now + ChronoDuration::days(2)];
        let request = ModelRequest {
            history: &history,
            x_timestamp: &[now],
            y_timestamp: &y,
            horizon: 2,
            sampling: &sampling,
        };

        let forecast = model.predict(&request).await.expect("predict should succeed");

        predict.assert_async().await;
        assert_eq!(forecast.close, vec![101.0, 102.0]);
        assert_eq!(forecast.volume, vec![1.0e6, 2.0e6]);
    }

    #[tokio::test]
    async fn predict_surfaces_server_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/health");
                then.status(200).json_body(json!({ "ready": true }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/predict");
                then.status(500);
            })
            .await;

        let model = build_model(&server);
        model.load().await.unwrap();
        let history = sample_history();
        let sampling = SamplingConfig::default();
        let request = ModelRequest {
            history: &history,
            x_timestamp: &[Utc::now()],
            y_timestamp: &[Utc::now()],
            horizon: 1,
            sampling: &sampling,
        };

        let result = model.predict(&request).await;

        assert!(matches!(result, Err(PredictionError::Prediction(message)) if message.contains("unexpected status")));
    }
}
