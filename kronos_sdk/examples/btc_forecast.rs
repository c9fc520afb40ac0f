use kronos_sdk::{ForecastConfig, ForecastEngine, HttpForecastModel};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = ForecastConfig::from_env()?;
    let mut engine = ForecastEngine::new(config.clone());

    if let Some(url) = config.model_url.as_deref() {
        let model = HttpForecastModel::new(url, config.model_name.clone(), None)?;
        engine = engine.with_model(Box::new(model));
        if let Err(err) = engine.load_model().await {
            eprintln!("⚠️  Kronos unavailable ({err}), falling back to synthetic forecasts");
        }
    }

    let forecast = engine.forecast("BTCUSDT", 7).await;

    println!("📈 {} via {}", forecast.symbol, forecast.model_name);
    println!("   current:    {:.2}", forecast.current_price);
    for (day, (price, volume)) in forecast
        .predicted_prices
        .iter()
        .zip(&forecast.predicted_volumes)
        .enumerate()
    {
        println!("   day {:>2}:     {:>12.2}  vol {:>12.0}", day + 1, price, volume);
    }
    println!(
        "   trend {:?}, confidence {:.1}%, volatility {:.4}",
        forecast.trend,
        forecast.confidence * 100.0,
        forecast.volatility
    );

    Ok(())
}
