use serde::de::{Deserializer, Error as _};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// One game's odds as served by the odds board API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OddsRecord {
    /// Home team name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_team: Option<String>,

    /// Away team name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_team: Option<String>,

    /// Fighter names for combat sports (first vs second)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fighters: Option<Vec<String>>,

    /// Preformatted "Home vs Away" label from older servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matchup: Option<String>,

    /// Start time (RFC 3339 string or epoch seconds/milliseconds)
    #[serde(
        default,
        deserialize_with = "lenient_start_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub commence_time: Option<StartTime>,

    /// Start time already formatted for display by older servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commence_time_est: Option<String>,

    #[serde(default, skip_serializing_if = "SideLines::is_empty")]
    pub moneyline: SideLines,

    #[serde(default, alias = "spreads", skip_serializing_if = "SideLines::is_empty")]
    pub spread: SideLines,

    #[serde(default, alias = "totals", skip_serializing_if = "SideLines::is_empty")]
    pub total: SideLines,

    /// Market sections nested under `markets` by older servers
    #[serde(default, skip_serializing_if = "MarketSections::is_empty")]
    pub markets: MarketSections,
}

impl OddsRecord {
    /// Lines for a market section, falling back to the nested `markets` copy
    pub fn lines(&self, market: Market) -> &SideLines {
        let top = match market {
            Market::Moneyline => &self.moneyline,
            Market::Spread => &self.spread,
            Market::Total => &self.total,
        };
        if top.is_empty() {
            self.markets.section(market)
        } else {
            top
        }
    }

    /// Mutable lines for a market section
    pub fn lines_mut(&mut self, market: Market) -> &mut SideLines {
        match market {
            Market::Moneyline => &mut self.moneyline,
            Market::Spread => &mut self.spread,
            Market::Total => &mut self.total,
        }
    }
}

/// `{moneyline, spread, total}` grouped under one key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSections {
    #[serde(default, skip_serializing_if = "SideLines::is_empty")]
    pub moneyline: SideLines,

    #[serde(default, alias = "spreads", skip_serializing_if = "SideLines::is_empty")]
    pub spread: SideLines,

    #[serde(default, alias = "totals", skip_serializing_if = "SideLines::is_empty")]
    pub total: SideLines,
}

impl MarketSections {
    pub fn is_empty(&self) -> bool {
        self.moneyline.is_empty() && self.spread.is_empty() && self.total.is_empty()
    }

    pub fn section(&self, market: Market) -> &SideLines {
        match market {
            Market::Moneyline => &self.moneyline,
            Market::Spread => &self.spread,
            Market::Total => &self.total,
        }
    }
}

/// Raw start time value as it appeared in the payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StartTime {
    Epoch(f64),
    Text(String),
}

/// The three market sections of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    Moneyline,
    Spread,
    Total,
}

impl Market {
    pub const ALL: [Market; 3] = [Market::Moneyline, Market::Spread, Market::Total];

    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Moneyline => "moneyline",
            Market::Spread => "spread",
            Market::Total => "total",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Market::Moneyline => "Moneyline",
            Market::Spread => "Spread",
            Market::Total => "Total",
        }
    }

    pub fn kind(&self) -> MarketKind {
        match self {
            Market::Moneyline => MarketKind::Moneyline,
            Market::Spread | Market::Total => MarketKind::Pointed,
        }
    }
}

/// How a market's lines are quoted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketKind {
    /// Price only (moneyline)
    Moneyline,
    /// Point handicap plus price (spread, total)
    Pointed,
}

/// A side's line exactly as it arrived; every field may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLine {
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub live: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub diff: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub open_point: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub open_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub live_point: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub live_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub diff_point: Option<f64>,
}

/// A side's line interpreted for its market kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineSnapshot {
    PriceOnly {
        open: Option<f64>,
        live: Option<f64>,
        diff: Option<f64>,
    },
    PointAndPrice {
        open_point: Option<f64>,
        open_price: Option<f64>,
        live_point: Option<f64>,
        live_price: Option<f64>,
        diff_point: Option<f64>,
    },
}

impl LineSnapshot {
    pub fn from_raw(raw: &RawLine, kind: MarketKind) -> Self {
        match kind {
            MarketKind::Moneyline => LineSnapshot::PriceOnly {
                open: raw.open,
                live: raw.live,
                diff: raw.diff,
            },
            MarketKind::Pointed => LineSnapshot::PointAndPrice {
                open_point: raw.open_point,
                open_price: raw.open_price,
                live_point: raw.live_point,
                live_price: raw.live_price,
                diff_point: raw.diff_point,
            },
        }
    }
}

/// Side name -> line, in payload order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideLines {
    entries: Vec<(String, RawLine)>,
}

impl SideLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Insert or replace a side's line, keeping first-insertion order
    pub fn insert(&mut self, side: impl Into<String>, line: RawLine) {
        let side = side.into();
        match self.entries.iter_mut().find(|(name, _)| *name == side) {
            Some((_, existing)) => *existing = line,
            None => self.entries.push((side, line)),
        }
    }

    pub fn get(&self, side: &str) -> Option<&RawLine> {
        self.entries
            .iter()
            .find(|(name, _)| name == side)
            .map(|(_, line)| line)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawLine)> {
        self.entries.iter().map(|(name, line)| (name.as_str(), line))
    }

    fn from_object(object: Map<String, Value>) -> Self {
        if is_legacy_ledger(&object) {
            return Self::from_legacy_ledger(&object);
        }

        let mut lines = Self::new();
        for (side, value) in object {
            // A side whose value is not an object has no usable fields
            let line = RawLine::deserialize(value).unwrap_or_default();
            lines.insert(side, line);
        }
        lines
    }

    /// Convert an `{opening, current, diff}` ledger into per-side lines.
    ///
    /// The ledger does not say which market it belongs to, so the price diff
    /// and point diff both receive the ledger's diff; `LineSnapshot::from_raw`
    /// picks the one that applies.
    fn from_legacy_ledger(object: &Map<String, Value>) -> Self {
        let opening_price = ledger_table(object, "opening", "price");
        let opening_points = ledger_table(object, "opening", "points");
        let current_price = ledger_table(object, "current", "price");
        let current_points = ledger_table(object, "current", "points");
        let diffs = object.get("diff").and_then(Value::as_object);

        let mut sides: Vec<&String> = Vec::new();
        for table in [current_price, current_points].into_iter().flatten() {
            for side in table.keys() {
                if !sides.contains(&side) {
                    sides.push(side);
                }
            }
        }

        let pick = |table: Option<&Map<String, Value>>, side: &str| {
            table.and_then(|t| t.get(side)).and_then(number_from_value)
        };

        let mut lines = Self::new();
        for side in sides {
            let open_price = pick(opening_price, side);
            let live_price = pick(current_price, side);
            let diff = pick(diffs, side);
            lines.insert(
                side.clone(),
                RawLine {
                    open: open_price,
                    live: live_price,
                    diff,
                    open_point: pick(opening_points, side),
                    open_price,
                    live_point: pick(current_points, side),
                    live_price,
                    diff_point: diff,
                },
            );
        }
        lines
    }
}

impl SideLines {
    /// Convert `[{name, open, live, diff}, ...]` rows into per-side lines.
    ///
    /// Open/live cells are either a bare number or text such as
    /// `"-3.5 (-110)"`. A bare number fills both the price and the point,
    /// a `"<point> (<price>)"` pair fills them separately; the market kind
    /// later decides which fields are read.
    fn from_rows(rows: Vec<Value>) -> Self {
        let mut lines = Self::new();
        for row in rows {
            let Some(object) = row.as_object() else {
                debug!("Skipping non-object market row: {}", row);
                continue;
            };
            let Some(name) = object
                .get("name")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|n| !n.is_empty())
            else {
                debug!("Skipping market row without a name: {}", row);
                continue;
            };

            let open = RowCell::from_value(object.get("open"));
            let live = RowCell::from_value(object.get("live"));
            let diff = object.get("diff").and_then(number_from_value);
            lines.insert(
                name,
                RawLine {
                    open: open.price,
                    live: live.price,
                    diff,
                    open_point: open.point,
                    open_price: open.pair_price,
                    live_point: live.point,
                    live_price: live.pair_price,
                    diff_point: diff,
                },
            );
        }
        lines
    }
}

/// One open/live cell of a market row
#[derive(Debug, Default, PartialEq)]
struct RowCell {
    /// Moneyline reading of the cell
    price: Option<f64>,
    point: Option<f64>,
    /// Price half of a `"<point> (<price>)"` pair
    pair_price: Option<f64>,
}

impl RowCell {
    fn from_value(value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };

        if let Some((point, price)) = value.as_str().and_then(split_point_price) {
            return Self {
                price,
                point,
                pair_price: price,
            };
        }

        let number = number_from_value(value);
        Self {
            price: number,
            point: number,
            pair_price: None,
        }
    }
}

/// Split `"<point> (<price>)"`; either half may be the `-` placeholder
fn split_point_price(text: &str) -> Option<(Option<f64>, Option<f64>)> {
    let (point, rest) = text.trim().split_once('(')?;
    let price = rest.trim_end().strip_suffix(')')?;
    Some((number_from_text(point), number_from_text(price)))
}

impl Serialize for SideLines {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (side, line) in &self.entries {
            map.serialize_entry(side, line)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SideLines {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(object) => Ok(Self::from_object(object)),
            Value::Array(rows) => Ok(Self::from_rows(rows)),
            // Missing sections and placeholders such as null mean "no data"
            _ => Ok(Self::new()),
        }
    }
}

fn is_legacy_ledger(object: &Map<String, Value>) -> bool {
    let current_is_ledger = object
        .get("current")
        .and_then(Value::as_object)
        .map(|c| c.contains_key("price") || c.contains_key("points"))
        .unwrap_or(false);

    current_is_ledger && (object.contains_key("opening") || object.contains_key("diff"))
}

fn ledger_table<'a>(
    object: &'a Map<String, Value>,
    section: &str,
    table: &str,
) -> Option<&'a Map<String, Value>> {
    object
        .get(section)
        .and_then(Value::as_object)
        .and_then(|s| s.get(table))
        .and_then(Value::as_object)
}

/// Read a number from a JSON number or a numeric string such as "+130"
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => number_from_text(s),
        _ => None,
    }
}

fn number_from_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    trimmed
        .strip_prefix('+')
        .unwrap_or(trimmed)
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_start_time<'de, D>(deserializer: D) -> Result<Option<StartTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(|n| Some(StartTime::Epoch(n)))
            .ok_or_else(|| D::Error::custom("start time out of range")),
        Some(Value::String(s)) => Ok(Some(StartTime::Text(s))),
        // Unusable shapes degrade to "no start time"
        Some(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_order_follows_payload() {
        let record: OddsRecord = serde_json::from_str(
            r#"{"moneyline": {"Zebras": {"open": 120}, "Aardvarks": {"open": -140}}}"#,
        )
        .unwrap();

        let sides: Vec<&str> = record.moneyline.iter().map(|(side, _)| side).collect();
        assert_eq!(sides, vec!["Zebras", "Aardvarks"]);
    }

    #[test]
    fn test_plural_market_aliases() {
        let record: OddsRecord = serde_json::from_str(
            r#"{"spreads": {"A": {"open_point": -3.5}}, "totals": {"Over": {"live_point": 8.5}}}"#,
        )
        .unwrap();

        assert_eq!(record.spread.get("A").unwrap().open_point, Some(-3.5));
        assert_eq!(record.total.get("Over").unwrap().live_point, Some(8.5));
    }

    #[test]
    fn test_lenient_numbers() {
        let line: RawLine =
            serde_json::from_str(r#"{"open": "+130", "live": null, "diff": "n/a"}"#).unwrap();

        assert_eq!(line.open, Some(130.0));
        assert_eq!(line.live, None);
        assert_eq!(line.diff, None);
    }

    #[test]
    fn test_null_and_empty_sections() {
        let record: OddsRecord =
            serde_json::from_str(r#"{"moneyline": null, "spread": {}, "total": []}"#).unwrap();

        assert!(record.moneyline.is_empty());
        assert!(record.spread.is_empty());
        assert!(record.total.is_empty());
    }

    #[test]
    fn test_non_object_side_has_no_fields() {
        let lines: SideLines = serde_json::from_str(r#"{"Over": null}"#).unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines.get("Over"), Some(&RawLine::default()));
    }

    #[test]
    fn test_legacy_ledger() {
        let lines: SideLines = serde_json::from_str(
            r#"{
                "opening": {"price": {"Mets": "-110", "Cubs": "+100"}, "points": {"Mets": -1.5}},
                "current": {"price": {"Mets": "-125", "Cubs": "+105"}, "points": {"Mets": -1.5, "Cubs": 1.5}},
                "diff": {"Mets": -15}
            }"#,
        )
        .unwrap();

        let sides: Vec<&str> = lines.iter().map(|(side, _)| side).collect();
        assert_eq!(sides, vec!["Mets", "Cubs"]);

        let mets = lines.get("Mets").unwrap();
        assert_eq!(mets.open, Some(-110.0));
        assert_eq!(mets.live, Some(-125.0));
        assert_eq!(mets.diff, Some(-15.0));
        assert_eq!(mets.live_point, Some(-1.5));

        let cubs = lines.get("Cubs").unwrap();
        assert_eq!(cubs.open_point, None);
        assert_eq!(cubs.live_point, Some(1.5));
        assert_eq!(cubs.diff, None);
    }

    #[test]
    fn test_market_rows() {
        let lines: SideLines = serde_json::from_str(
            r#"[
                {"name": "Lakers", "open": "-3.5 (-110)", "live": "-4 (-105)", "diff": "-0.5"},
                {"name": "Celtics", "open": "3.5 (-)", "live": 4, "diff": null},
                {"open": 1},
                "junk"
            ]"#,
        )
        .unwrap();

        assert_eq!(lines.len(), 2);

        let lakers = lines.get("Lakers").unwrap();
        assert_eq!(lakers.open_point, Some(-3.5));
        assert_eq!(lakers.open_price, Some(-110.0));
        assert_eq!(lakers.live_point, Some(-4.0));
        assert_eq!(lakers.live_price, Some(-105.0));
        assert_eq!(lakers.diff_point, Some(-0.5));

        let celtics = lines.get("Celtics").unwrap();
        assert_eq!(celtics.open_price, None);
        assert_eq!(celtics.live_point, Some(4.0));
        assert_eq!(celtics.live_price, None);
        assert_eq!(celtics.diff_point, None);
    }

    #[test]
    fn test_nested_markets_fill_empty_sections() {
        let record: OddsRecord = serde_json::from_str(
            r#"{
                "home_team": "Lakers",
                "total": {"Over": {"open_point": 220.5}},
                "markets": {
                    "moneyline": [{"name": "Lakers", "open": -150, "live": -180, "diff": -30}],
                    "total": [{"name": "Under", "open": "220.5 (-110)"}]
                }
            }"#,
        )
        .unwrap();

        let moneyline = record.lines(Market::Moneyline);
        assert_eq!(moneyline.get("Lakers").unwrap().open, Some(-150.0));
        assert_eq!(moneyline.get("Lakers").unwrap().diff, Some(-30.0));

        // A top-level section wins over the nested copy
        let total = record.lines(Market::Total);
        assert!(total.get("Over").is_some());
        assert!(total.get("Under").is_none());

        assert!(record.lines(Market::Spread).is_empty());
    }

    #[test]
    fn test_start_time_shapes() {
        let text: OddsRecord =
            serde_json::from_str(r#"{"commence_time": "2024-01-01T20:00:00Z"}"#).unwrap();
        let epoch: OddsRecord = serde_json::from_str(r#"{"commence_time": 1704139200}"#).unwrap();
        let junk: OddsRecord = serde_json::from_str(r#"{"commence_time": {"x": 1}}"#).unwrap();

        assert_eq!(
            text.commence_time,
            Some(StartTime::Text("2024-01-01T20:00:00Z".to_string()))
        );
        assert_eq!(epoch.commence_time, Some(StartTime::Epoch(1704139200.0)));
        assert_eq!(junk.commence_time, None);
    }

    #[test]
    fn test_snapshot_follows_kind() {
        let raw = RawLine {
            open: Some(-150.0),
            diff_point: Some(0.5),
            ..Default::default()
        };

        assert_eq!(
            LineSnapshot::from_raw(&raw, MarketKind::Moneyline),
            LineSnapshot::PriceOnly {
                open: Some(-150.0),
                live: None,
                diff: None
            }
        );
        assert!(matches!(
            LineSnapshot::from_raw(&raw, MarketKind::Pointed),
            LineSnapshot::PointAndPrice {
                diff_point: Some(d),
                ..
            } if d == 0.5
        ));
    }
}
