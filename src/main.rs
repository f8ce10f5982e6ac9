use anyhow::Result;
use clap::Parser;
use chrono::Utc;
use sprinkler_weather_engine::config::Config;
use sprinkler_weather_engine::engine::Engine;
use sprinkler_weather_engine::model::GeoCoordinates;
use sprinkler_weather_engine::push::PushParams;

/// Smoke-test harness for the watering-window engine: ingests a handful of
/// synthetic PWS pushes, composes a watering window against a live forecast
/// provider, and prints the result. Not a production transport — there is no
/// HTTP listener here, only the engine the eventual one would wire up.
#[derive(Debug, Parser)]
#[command(name = "sprinkler-weather-engine", version, about)]
struct Cli {
    #[arg(long, default_value_t = 37.3382)]
    lat: f64,

    #[arg(long, default_value_t = -121.8863)]
    lon: f64,

    #[arg(long, default_value = "open-meteo")]
    provider: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = Config::from_env()?;
    let engine = Engine::new(config);
    let worker = engine.start();

    let coords = GeoCoordinates::new(cli.lat, cli.lon);
    seed_synthetic_pushes(&engine)?;

    match engine.watering_window(coords, &cli.provider).await {
        Ok(series) => {
            let json = serde_watering_window(&series);
            println!("{json}");
        }
        Err(err) => {
            eprintln!("watering_window failed: {err}");
        }
    }

    engine.shutdown(worker);
    Ok(())
}

fn seed_synthetic_pushes(engine: &Engine) -> Result<()> {
    let now = Utc::now();
    for hour_ago in 0..200i64 {
        let at = now - chrono::Duration::hours(hour_ago);
        engine.ingest_push(PushParams {
            dateutc: Some(at.format("%Y-%m-%d %H:%M:%S").to_string()),
            tempf: Some(format!("{:.1}", 62.0 + (hour_ago % 12) as f64)),
            humidity: Some(format!("{:.0}", 35.0 + (hour_ago % 20) as f64)),
            windspeedmph: Some("4.0".to_string()),
            solarradiation: Some("150".to_string()),
            dailyrainin: Some("0.0".to_string()),
            rainin: Some("0.0".to_string()),
        })?;
    }
    Ok(())
}

fn serde_watering_window(series: &[sprinkler_weather_engine::model::SeriesDay]) -> String {
    #[derive(serde::Serialize)]
    struct Row<'a> {
        local_midnight_epoch: i64,
        min_temp_f: f64,
        max_temp_f: f64,
        mean_temp_f: f64,
        mean_humidity_pct: Option<f64>,
        precip_in: f64,
        source: &'a str,
        provider_tag: &'a Option<String>,
    }

    let rows: Vec<Row> = series
        .iter()
        .map(|day| Row {
            local_midnight_epoch: day.local_midnight_epoch,
            min_temp_f: day.min_temp_f,
            max_temp_f: day.max_temp_f,
            mean_temp_f: day.mean_temp_f,
            mean_humidity_pct: day.mean_humidity_pct,
            precip_in: day.precip_in,
            source: match day.source {
                sprinkler_weather_engine::model::Source::Local => "local",
                sprinkler_weather_engine::model::Source::Forecast => "forecast",
            },
            provider_tag: &day.provider_tag,
        })
        .collect();

    serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
}
