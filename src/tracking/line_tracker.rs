use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::the_odds_api::{UpstreamEvent, UpstreamMarket};
use crate::db::{OpeningKey, OpeningLineStore};
use crate::models::catalog::is_combat_sport;
use crate::models::{Market, OddsRecord, RawLine, SideLines, StartTime};

/// One side's quote: American price and optional point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineQuote {
    pub side: String,
    pub price: Option<i64>,
    pub point: Option<f64>,
}

/// Convert decimal odds to an American price.
///
/// Halves round to even (2.125 -> +112). Returns `None` for odds at or
/// below 1.0, which have no American form.
pub fn decimal_to_american(decimal: f64) -> Option<i64> {
    if !decimal.is_finite() || decimal <= 1.0 {
        return None;
    }
    let american = if decimal >= 2.0 {
        ((decimal - 1.0) * 100.0).round_ties_even()
    } else {
        -(100.0 / (decimal - 1.0)).round_ties_even()
    };
    Some(american as i64)
}

/// Map an upstream market key onto a board market
pub fn market_for_key(key: &str) -> Option<Market> {
    match key {
        "h2h" => Some(Market::Moneyline),
        "spreads" => Some(Market::Spread),
        "totals" => Some(Market::Total),
        _ => None,
    }
}

/// Round to one decimal place, the precision points are quoted in
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Key used to remember a game's openings
pub fn matchup_key(home: &str, away: &str) -> String {
    format!("{} vs {}", home, away)
}

/// Current quotes of an upstream market, in outcome order
pub fn quotes_from_market(market: &UpstreamMarket) -> Vec<LineQuote> {
    market
        .outcomes
        .iter()
        .filter(|o| !o.name.trim().is_empty())
        .map(|o| LineQuote {
            side: o.name.clone(),
            price: o.price.and_then(decimal_to_american),
            point: o.point,
        })
        .collect()
}

/// Pair current quotes with their openings.
///
/// Moneyline diffs are on the American price; spread and total diffs are on
/// the point. A diff is only present when both ends are.
pub fn merge_lines(
    market: Market,
    current: &[LineQuote],
    openings: &HashMap<String, LineQuote>,
) -> SideLines {
    let mut lines = SideLines::new();

    for quote in current {
        let opening = openings.get(&quote.side);
        let open_price = opening.and_then(|o| o.price);
        let open_point = opening.and_then(|o| o.point);

        let line = match market {
            Market::Moneyline => RawLine {
                open: open_price.map(|p| p as f64),
                live: quote.price.map(|p| p as f64),
                diff: open_price
                    .zip(quote.price)
                    .map(|(open, live)| (live - open) as f64),
                ..Default::default()
            },
            Market::Spread | Market::Total => RawLine {
                open_point,
                open_price: open_price.map(|p| p as f64),
                live_point: quote.point,
                live_price: quote.price.map(|p| p as f64),
                diff_point: open_point
                    .zip(quote.point)
                    .map(|(open, live)| round_tenth(live - open)),
                ..Default::default()
            },
        };

        lines.insert(quote.side.clone(), line);
    }

    lines
}

/// Turns upstream quotes into board records, remembering the first line seen
pub struct LineTracker {
    store: OpeningLineStore,
}

impl LineTracker {
    pub fn new(store: OpeningLineStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &OpeningLineStore {
        &self.store
    }

    /// Build records for one bookmaker's quotes, recording openings as needed
    pub async fn track_events(
        &self,
        sport: &str,
        bookmaker: &str,
        events: &[UpstreamEvent],
    ) -> Result<Vec<OddsRecord>> {
        let mut records = Vec::new();

        for event in events {
            let (Some(home), Some(away)) = (
                event.home_team.as_deref().filter(|n| !n.trim().is_empty()),
                event.away_team.as_deref().filter(|n| !n.trim().is_empty()),
            ) else {
                debug!("Skipping event {:?} without both team names", event.id);
                continue;
            };

            let Some(book) = event.bookmaker(bookmaker) else {
                debug!("Skipping {} vs {}: no {} quotes", home, away, bookmaker);
                continue;
            };

            let matchup = matchup_key(home, away);
            let mut record = if is_combat_sport(sport) {
                OddsRecord {
                    fighters: Some(vec![away.to_string(), home.to_string()]),
                    ..Default::default()
                }
            } else {
                OddsRecord {
                    home_team: Some(home.to_string()),
                    away_team: Some(away.to_string()),
                    ..Default::default()
                }
            };
            record.commence_time = event.commence_time.clone().map(StartTime::Text);

            for upstream_market in &book.markets {
                let Some(market) = market_for_key(&upstream_market.key) else {
                    continue;
                };

                let key = OpeningKey {
                    sport,
                    bookmaker,
                    matchup: &matchup,
                    market,
                };
                let current = quotes_from_market(upstream_market);

                self.store.record_if_absent(key, &current).await?;
                let openings = self.store.openings(key).await?;

                *record.lines_mut(market) = merge_lines(market, &current, &openings);
            }

            records.push(record);
        }

        info!(
            "Tracked {} of {} events for {}@{}",
            records.len(),
            events.len(),
            sport,
            bookmaker
        );
        Ok(records)
    }
}
