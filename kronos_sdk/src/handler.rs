use clap::Parser;
use serde_json::json;
use tracing::{debug, warn};

use crate::{ForecastEngine, ForecastRequest, ForecastResult, PredictionError};

pub const USAGE: &str = "Usage: kronos-forecast <symbol> <days>";

#[derive(Debug, Parser)]
#[command(name = "kronos-forecast", about = "Forecast daily prices for a trading pair")]
struct CliArgs {
    /// Trading pair, e.g. BTCUSDT
    symbol: String,
    /// Forecast horizon in days
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    days: u32,
}

/// JSON document and exit status produced by one CLI invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliOutcome {
    pub output: String,
    pub exit_code: i32,
}

/// Execute a forecast for a [`ForecastRequest`], returning serialized JSON.
///
/// Intended for process or HTTP entry points that receive a single payload.
/// Model failures never surface here; the engine degrades to its synthetic
/// path. Only a zero horizon or a serialization failure is an error.
///
/// # Examples
///
/// ```no_run
/// use kronos_sdk::{ForecastEngine, ForecastRequest};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), kronos_sdk::PredictionError> {
/// let engine = ForecastEngine::default();
/// let request = ForecastRequest {
///     symbol: "ETHUSDT".to_string(),
///     days: 7,
/// };
///
/// let json = kronos_sdk::run_prediction_handler(&engine, request).await?;
/// println!("{json}");
/// # Ok(())
/// # }
/// ```
pub async fn run_prediction_handler(
    engine: &ForecastEngine,
    request: ForecastRequest,
) -> Result<String, PredictionError> {
    if request.days == 0 {
        return Err(PredictionError::InvalidArguments(
            "days must be a positive integer".to_string(),
        ));
    }

    let forecast = engine.forecast(&request.symbol, request.days).await;
    to_json(&forecast)
}

/// Run the `kronos-forecast <symbol> <days>` contract.
///
/// `args` includes the program name, as yielded by [`std::env::args`].
/// Malformed arguments produce `{"error": ...}` with exit code 1 and no
/// forecast. Any failure past argument parsing is answered with a synthetic
/// forecast.
pub async fn run_cli<I, T>(engine: &ForecastEngine, args: I) -> CliOutcome
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let args = match CliArgs::try_parse_from(args) {
        Ok(args) => args,
        Err(err) => {
            debug!(error = %err, "rejected command line");
            return CliOutcome {
                output: json!({ "error": USAGE }).to_string(),
                exit_code: 1,
            };
        }
    };

    let request = ForecastRequest {
        symbol: args.symbol,
        days: args.days as usize,
    };

    let output = match run_prediction_handler(engine, request.clone()).await {
        Ok(output) => Ok(output),
        Err(err) => {
            warn!(error = %err, "prediction handler failed, using synthetic forecast");
            to_json(&engine.synthetic_forecast(&request.symbol, request.days))
        }
    };

    match output {
        Ok(output) => CliOutcome {
            output,
            exit_code: 0,
        },
        Err(err) => CliOutcome {
            output: json!({ "error": err.to_string() }).to_string(),
            exit_code: 1,
        },
    }
}

fn to_json(forecast: &ForecastResult) -> Result<String, PredictionError> {
    serde_json::to_string(forecast).map_err(|err| PredictionError::Serialization(err.to_string()))
}
