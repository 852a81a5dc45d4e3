use std::fmt::Display;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use crate::models::{
    DisplayRow, GameView, LineSnapshot, Market, MarketKind, MarketViews, OddsRecord, SideLines,
    StartTime,
};

use super::formatting::{
    classify_polarity, format_moneyline_price, format_point_with_price,
};

pub const HOME_PLACEHOLDER: &str = "Home";
pub const AWAY_PLACEHOLDER: &str = "Away";
pub const FIGHTER_A_PLACEHOLDER: &str = "Fighter A";
pub const FIGHTER_B_PLACEHOLDER: &str = "Fighter B";

/// Month/day hour:minute, e.g. "01/01 03:00 PM"
const WHEN_FORMAT: &str = "%m/%d %I:%M %p";

/// Epoch values at or above this are milliseconds
const EPOCH_MILLIS_THRESHOLD: f64 = 1e12;

/// Build one display row per side, in payload order
pub fn build_market_rows(market: Option<&SideLines>, kind: MarketKind) -> Vec<DisplayRow> {
    let Some(market) = market else {
        return Vec::new();
    };

    market
        .iter()
        .map(|(side, raw)| {
            let (open_text, live_text, diff) = match LineSnapshot::from_raw(raw, kind) {
                LineSnapshot::PriceOnly { open, live, diff } => (
                    format_moneyline_price(open),
                    format_moneyline_price(live),
                    diff,
                ),
                LineSnapshot::PointAndPrice {
                    open_point,
                    open_price,
                    live_point,
                    live_price,
                    diff_point,
                } => (
                    format_point_with_price(open_point, open_price),
                    format_point_with_price(live_point, live_price),
                    diff_point,
                ),
            };
            DisplayRow::new(side, open_text, live_text, diff, classify_polarity(diff))
        })
        .collect()
}

/// Build a game's view with times shown in the local time zone
pub fn build_game_view(record: &OddsRecord) -> GameView {
    build_game_view_in(record, &Local)
}

/// Build a game's view with times shown in `tz`
pub fn build_game_view_in<Tz>(record: &OddsRecord, tz: &Tz) -> GameView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let rows = |market: Market| build_market_rows(Some(record.lines(market)), market.kind());

    GameView {
        matchup_label: matchup_label(record),
        when_label: when_label(record, tz),
        markets: MarketViews {
            moneyline: rows(Market::Moneyline),
            spread: rows(Market::Spread),
            total: rows(Market::Total),
        },
    }
}

fn non_blank(name: Option<&String>) -> Option<&str> {
    name.map(|n| n.trim()).filter(|n| !n.is_empty())
}

fn matchup_label(record: &OddsRecord) -> String {
    let home = non_blank(record.home_team.as_ref());
    let away = non_blank(record.away_team.as_ref());
    if home.is_some() || away.is_some() {
        return format!(
            "{} vs {}",
            away.unwrap_or(AWAY_PLACEHOLDER),
            home.unwrap_or(HOME_PLACEHOLDER)
        );
    }

    if let Some(fighters) = &record.fighters {
        let first = non_blank(fighters.first());
        let second = non_blank(fighters.get(1));
        if first.is_some() || second.is_some() {
            return format!(
                "{} vs {}",
                first.unwrap_or(FIGHTER_A_PLACEHOLDER),
                second.unwrap_or(FIGHTER_B_PLACEHOLDER)
            );
        }
    }

    if let Some(matchup) = non_blank(record.matchup.as_ref()) {
        return matchup.to_string();
    }

    format!("{} vs {}", AWAY_PLACEHOLDER, HOME_PLACEHOLDER)
}

fn when_label<Tz>(record: &OddsRecord, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if let Some(start) = record.commence_time.as_ref().and_then(parse_start_time) {
        return start.with_timezone(tz).format(WHEN_FORMAT).to_string();
    }

    // Older servers send the label already formatted
    non_blank(record.commence_time_est.as_ref())
        .map(str::to_string)
        .unwrap_or_default()
}

/// Parse an RFC 3339 / naive ISO-8601 string or epoch seconds/milliseconds
pub fn parse_start_time(start: &StartTime) -> Option<DateTime<Utc>> {
    match start {
        StartTime::Epoch(n) => from_epoch(*n),
        StartTime::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }

            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
                        .iter()
                        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                        .map(|naive| naive.and_utc())
                })
                .or_else(|| s.parse::<f64>().ok().and_then(from_epoch))
        }
    }
}

fn from_epoch(n: f64) -> Option<DateTime<Utc>> {
    if !n.is_finite() {
        return None;
    }
    if n.abs() >= EPOCH_MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(n as i64)
    } else {
        DateTime::from_timestamp(n as i64, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Polarity, RawLine};

    fn lakers_celtics() -> OddsRecord {
        serde_json::from_str(
            r#"{
                "home_team": "Lakers",
                "away_team": "Celtics",
                "commence_time": "2024-01-01T20:00:00Z",
                "moneyline": {
                    "Lakers": {"open": -150, "live": -180, "diff": -30},
                    "Celtics": {"open": 130, "live": 155, "diff": 25}
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_market_has_no_rows() {
        assert!(build_market_rows(Some(&SideLines::new()), MarketKind::Moneyline).is_empty());
        assert!(build_market_rows(None, MarketKind::Pointed).is_empty());
    }

    #[test]
    fn test_moneyline_rows() {
        let view = build_game_view_in(&lakers_celtics(), &Utc);
        let rows = &view.markets.moneyline;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "Lakers");
        assert_eq!(rows[0].open_text, "-150");
        assert_eq!(rows[0].live_text, "-180");
        assert_eq!(rows[0].diff_text, "-30");
        assert_eq!(rows[0].diff_polarity, Polarity::Negative);

        assert_eq!(rows[1].label, "Celtics");
        assert_eq!(rows[1].diff_text, "+25");
        assert_eq!(rows[1].diff_polarity, Polarity::Positive);

        assert!(view.markets.spread.is_empty());
        assert!(view.markets.total.is_empty());
    }

    #[test]
    fn test_pointed_rows_use_point_diff() {
        let mut lines = SideLines::new();
        lines.insert(
            "Over",
            RawLine {
                open_point: Some(8.5),
                open_price: Some(-110.0),
                live_point: Some(9.0),
                live_price: None,
                diff_point: Some(0.5),
                diff: Some(-40.0),
                ..Default::default()
            },
        );
        lines.insert("Under", RawLine::default());

        let rows = build_market_rows(Some(&lines), MarketKind::Pointed);

        assert_eq!(rows[0].open_text, "8.5 (-110)");
        assert_eq!(rows[0].live_text, "9 (-)");
        assert_eq!(rows[0].diff_value, Some(0.5));
        assert_eq!(rows[0].diff_text, "+0.5");

        assert_eq!(rows[1].open_text, "- (-)");
        assert_eq!(rows[1].diff_text, "-");
        assert_eq!(rows[1].diff_polarity, Polarity::Neutral);
    }

    #[test]
    fn test_matchup_label() {
        assert_eq!(build_game_view(&lakers_celtics()).matchup_label, "Celtics vs Lakers");

        let label = build_game_view(&OddsRecord::default()).matchup_label;
        assert!(label.contains("Home"));
        assert!(label.contains("Away"));

        let half = OddsRecord {
            home_team: Some("Lakers".to_string()),
            away_team: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(build_game_view(&half).matchup_label, "Away vs Lakers");

        let fight = OddsRecord {
            fighters: Some(vec!["Jones".to_string()]),
            ..Default::default()
        };
        assert_eq!(build_game_view(&fight).matchup_label, "Jones vs Fighter B");

        let legacy = OddsRecord {
            matchup: Some("Mets vs Cubs".to_string()),
            ..Default::default()
        };
        assert_eq!(build_game_view(&legacy).matchup_label, "Mets vs Cubs");
    }

    #[test]
    fn test_when_label() {
        assert_eq!(build_game_view_in(&lakers_celtics(), &Utc).when_label, "01/01 08:00 PM");

        let offset = chrono::FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(
            build_game_view_in(&lakers_celtics(), &offset).when_label,
            "01/01 03:00 PM"
        );

        let epoch = OddsRecord {
            commence_time: Some(StartTime::Epoch(1704139200.0)),
            ..Default::default()
        };
        assert_eq!(build_game_view_in(&epoch, &Utc).when_label, "01/01 08:00 PM");

        let millis = OddsRecord {
            commence_time: Some(StartTime::Text("1704139200000".to_string())),
            ..Default::default()
        };
        assert_eq!(build_game_view_in(&millis, &Utc).when_label, "01/01 08:00 PM");
    }

    #[test]
    fn test_bad_start_time_is_empty() {
        let bad = OddsRecord {
            commence_time: Some(StartTime::Text("next tuesday".to_string())),
            ..Default::default()
        };
        assert_eq!(build_game_view(&bad).when_label, "");
        assert_eq!(build_game_view(&OddsRecord::default()).when_label, "");

        let legacy = OddsRecord {
            commence_time_est: Some("06/01 07:05 PM".to_string()),
            ..Default::default()
        };
        assert_eq!(build_game_view(&legacy).when_label, "06/01 07:05 PM");
    }
}
