use serde::Serialize;

use crate::transform::format_signed_diff;

/// Direction of a line's movement
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
    /// Zero or unknown movement
    Neutral,
}

impl Polarity {
    /// Marker shown next to the diff column in text output
    pub fn marker(&self) -> &'static str {
        match self {
            Polarity::Positive => "▲",
            Polarity::Negative => "▼",
            Polarity::Neutral => " ",
        }
    }
}

/// One side of one market, ready to print
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DisplayRow {
    /// Team, fighter, or Over/Under
    pub label: String,

    pub open_text: String,

    pub live_text: String,

    /// Live minus open (point for spread/total, price for moneyline)
    pub diff_value: Option<f64>,

    pub diff_polarity: Polarity,

    /// `diff_value` with a forced leading `+` when positive
    pub diff_text: String,
}

impl DisplayRow {
    pub fn new(
        label: impl Into<String>,
        open_text: String,
        live_text: String,
        diff_value: Option<f64>,
        diff_polarity: Polarity,
    ) -> Self {
        Self {
            label: label.into(),
            open_text,
            live_text,
            diff_value,
            diff_polarity,
            diff_text: format_signed_diff(diff_value),
        }
    }
}

/// Rows for each market of a game
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MarketViews {
    pub moneyline: Vec<DisplayRow>,
    pub spread: Vec<DisplayRow>,
    pub total: Vec<DisplayRow>,
}

/// Render-ready view of a single game
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GameView {
    /// "Away vs Home" or "Fighter vs Fighter"
    pub matchup_label: String,

    /// Local start time, empty when unknown
    pub when_label: String,

    pub markets: MarketViews,
}
