use std::process::ExitCode;
use std::time::Duration;

use kronos_sdk::{run_cli, ForecastConfig, ForecastEngine, HttpForecastModel};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kronos_sdk=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

async fn build_engine() -> ForecastEngine {
    let config = match ForecastConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "invalid configuration, using defaults");
            ForecastConfig::default()
        }
    };

    let model = config.model_url.as_deref().map(|url| {
        HttpForecastModel::new(
            url,
            config.model_name.clone(),
            config.request_timeout_secs.map(Duration::from_secs),
        )
    });

    let mut engine = ForecastEngine::new(config);
    match model {
        Some(Ok(model)) => {
            engine = engine.with_model(Box::new(model));
            if engine.load_model().await.is_err() {
                warn!("Kronos model not loaded, forecasts will be synthetic");
            }
        }
        Some(Err(err)) => warn!(error = %err, "failed to build model client"),
        None => info!("no model url configured, forecasts will be synthetic"),
    }

    engine
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let engine = build_engine().await;
    let outcome = run_cli(&engine, std::env::args()).await;

    println!("{}", outcome.output);
    if outcome.exit_code == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(outcome.exit_code.clamp(1, 255) as u8)
    }
}
