use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Markets requested upstream, in the upstream's own naming
const UPSTREAM_MARKETS: &str = "h2h,spreads,totals";

/// Client for The Odds API v4 (source of live lines)
pub struct TheOddsApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    regions: String,
}

/// A game with every bookmaker's quotes
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    #[serde(default)]
    pub commence_time: Option<String>,
    #[serde(default)]
    pub bookmakers: Vec<UpstreamBookmaker>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamBookmaker {
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub markets: Vec<UpstreamMarket>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamMarket {
    /// "h2h", "spreads", or "totals"
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<UpstreamOutcome>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamOutcome {
    pub name: String,
    /// Decimal odds
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub point: Option<f64>,
}

impl UpstreamEvent {
    /// This event's quotes from one bookmaker
    pub fn bookmaker(&self, key: &str) -> Option<&UpstreamBookmaker> {
        self.bookmakers.iter().find(|b| b.key == key)
    }
}

impl TheOddsApiClient {
    /// Create a new client
    pub fn new(base_url: &str, api_key: &str, regions: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            regions: regions.to_string(),
        })
    }

    /// Fetch current moneyline, spread, and total quotes for a sport at one bookmaker
    pub async fn fetch_odds(&self, sport: &str, bookmaker: &str) -> Result<Vec<UpstreamEvent>> {
        let url = format!(
            "{}/sports/{}/odds?regions={}&markets={}&bookmakers={}&oddsFormat=decimal&apiKey={}",
            self.base_url,
            urlencoding::encode(sport),
            urlencoding::encode(&self.regions),
            UPSTREAM_MARKETS,
            urlencoding::encode(bookmaker),
            urlencoding::encode(&self.api_key),
        );

        debug!("Fetching upstream odds for {}@{}", sport, bookmaker);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to fetch upstream odds")?;

        log_quota(response.headers());

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("The Odds API error: {} - {}", status, text);
        }

        let events: Vec<UpstreamEvent> = response
            .json()
            .await
            .context("Failed to parse upstream odds response")?;

        info!(
            "Upstream returned {} events for {}@{}",
            events.len(),
            sport,
            bookmaker
        );
        Ok(events)
    }
}

/// Report the request quota headers the upstream sends back
fn log_quota(headers: &reqwest::header::HeaderMap) {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok())
    };

    match (read("x-requests-remaining"), read("x-requests-used")) {
        (Some(remaining), used) => {
            debug!("Upstream quota: {} remaining, {:?} used", remaining, used);
            if remaining < 50 {
                warn!("Upstream quota running low: {} requests remaining", remaining);
            }
        }
        _ => debug!("Upstream sent no quota headers"),
    }
}
