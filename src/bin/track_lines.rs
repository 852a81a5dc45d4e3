use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::time;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use odds_board::api::TheOddsApiClient;
use odds_board::config::{flag_value, Config};
use odds_board::db::OpeningLineStore;
use odds_board::models::OddsRecord;
use odds_board::tracking::LineTracker;

/// Envelope the board reads from /odds/{sport}
#[derive(Serialize)]
struct RecordsEnvelope<'a> {
    sport: &'a str,
    bookmaker: &'a str,
    records: &'a [OddsRecord],
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; stdout carries the records
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "track_lines=info,odds_board=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    let args: Vec<String> = env::args().collect();

    let sport = flag_value(&args, "--sport").unwrap_or_else(|| config.default_sport.clone());
    let bookmaker =
        flag_value(&args, "--bookmaker").unwrap_or_else(|| config.default_bookmaker.clone());
    let output = flag_value(&args, "--output").map(PathBuf::from);
    let watch = flag_value(&args, "--watch")
        .map(|v| v.parse::<u64>())
        .transpose()
        .context("--watch must be a number of seconds")?
        .filter(|secs| *secs > 0);

    let api_key = config
        .odds_api_key
        .as_deref()
        .context("THE_ODDS_API_KEY must be set to track lines")?;

    let client = TheOddsApiClient::new(
        &config.odds_api_url,
        api_key,
        &config.odds_regions,
        config.http_timeout,
    )?;
    let store = OpeningLineStore::new(&config.database_url).await?;
    let tracker = LineTracker::new(store);

    info!("Tracking {}@{}", sport, bookmaker);

    let Some(period) = watch else {
        return track_once(&client, &tracker, &sport, &bookmaker, output.as_deref()).await;
    };

    let mut interval = time::interval(Duration::from_secs(period));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            _ = interval.tick() => {
                // A failed cycle is reported and the next one proceeds on schedule
                if let Err(e) = track_once(&client, &tracker, &sport, &bookmaker, output.as_deref()).await {
                    error!("Tracking cycle failed: {:#}", e);
                }
            }
        }
    }

    let total = tracker.store().count().await?;
    info!("Stopped with {} opening lines recorded", total);
    Ok(())
}

/// Fetch current quotes, diff them against openings, and write the records
async fn track_once(
    client: &TheOddsApiClient,
    tracker: &LineTracker,
    sport: &str,
    bookmaker: &str,
    output: Option<&Path>,
) -> Result<()> {
    let events = client.fetch_odds(sport, bookmaker).await?;
    let records = tracker.track_events(sport, bookmaker, &events).await?;

    let json = serde_json::to_string_pretty(&RecordsEnvelope {
        sport,
        bookmaker,
        records: &records,
    })?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).context("Failed to create output directory")?;
            }
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} records to {}", records.len(), path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
