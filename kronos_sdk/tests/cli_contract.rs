use kronos_sdk::{run_cli, ForecastEngine};
use serde_json::Value;

const USAGE: &str = "Usage: kronos-forecast <symbol> <days>";

fn parse(output: &str) -> Value {
    serde_json::from_str(output).expect("output should be a single JSON object")
}

#[tokio::test]
async fn single_argument_is_rejected() {
    let engine = ForecastEngine::default();

    let outcome = run_cli(&engine, ["kronos-forecast", "BTCUSDT"]).await;

    assert_ne!(outcome.exit_code, 0);
    let value = parse(&outcome.output);
    assert_eq!(value["error"], USAGE);
    assert!(value.get("predictedPrices").is_none());
}

#[tokio::test]
async fn extra_and_missing_arguments_are_rejected() {
    let engine = ForecastEngine::default();

    for args in [
        vec!["kronos-forecast"],
        vec!["kronos-forecast", "BTCUSDT", "5", "extra"],
    ] {
        let outcome = run_cli(&engine, args).await;
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(parse(&outcome.output)["error"], USAGE);
    }
}

#[tokio::test]
async fn non_integer_or_zero_horizon_is_rejected() {
    let engine = ForecastEngine::default();

    for days in ["five", "2.5", "0", "-3"] {
        let outcome = run_cli(&engine, ["kronos-forecast", "BTCUSDT", days]).await;
        assert_eq!(outcome.exit_code, 1, "days = {days}");
        assert_eq!(parse(&outcome.output)["error"], USAGE);
    }
}

#[tokio::test]
async fn valid_invocation_prints_synthetic_forecast() {
    let engine = ForecastEngine::default().with_seed(31);

    let outcome = run_cli(&engine, ["kronos-forecast", "BTCUSDT", "5"]).await;

    assert_eq!(outcome.exit_code, 0);
    let value = parse(&outcome.output);
    assert_eq!(value["symbol"], "BTCUSDT");
    assert_eq!(value["currentPrice"], 110_000.0);
    assert_eq!(value["predictedPrices"].as_array().map(Vec::len), Some(5));
    assert_eq!(value["predictedVolumes"].as_array().map(Vec::len), Some(5));
    assert_eq!(value["model"], "Mock (Kronos unavailable)");
    assert_eq!(value["volatility"], 0.02);
    assert!(value["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn unknown_symbol_defaults_price() {
    let engine = ForecastEngine::default();

    let outcome = run_cli(&engine, ["kronos-forecast", "UNKNOWNCOIN", "3"]).await;

    assert_eq!(outcome.exit_code, 0);
    let value = parse(&outcome.output);
    assert_eq!(value["currentPrice"], 100.0);
    assert_eq!(value["predictedPrices"].as_array().map(Vec::len), Some(3));
}
