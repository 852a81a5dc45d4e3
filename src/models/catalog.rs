use serde::{Deserialize, Serialize};

/// A sport offered by the odds board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CatalogEntry")]
pub struct Sport {
    /// Upstream sport key (e.g., "baseball_mlb")
    pub key: String,

    /// Display title (e.g., "MLB")
    pub title: String,
}

/// A bookmaker whose lines the board can show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CatalogEntry")]
pub struct Bookmaker {
    pub key: String,
    pub title: String,
}

/// Bookmakers plus the server's preferred selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmakerList {
    pub bookmakers: Vec<Bookmaker>,
    pub default: Option<String>,
}

impl BookmakerList {
    /// Pick the bookmaker to start with: server default, then ours, then the first listed
    pub fn resolve_default(&self, preferred: &str) -> Option<String> {
        let listed = |key: &str| self.bookmakers.iter().any(|b| b.key == key);

        self.default
            .as_deref()
            .filter(|key| listed(key))
            .or_else(|| Some(preferred).filter(|key| listed(key)))
            .or_else(|| self.bookmakers.first().map(|b| b.key.as_str()))
            .map(str::to_string)
    }
}

/// Sport and bookmaker currently shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub sport: String,
    pub bookmaker: String,
}

impl Selection {
    pub fn new(sport: impl Into<String>, bookmaker: impl Into<String>) -> Self {
        Self {
            sport: sport.into(),
            bookmaker: bookmaker.into(),
        }
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.sport, self.bookmaker)
    }
}

/// Catalog entries arrive either as bare keys or as {key, title} objects
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogEntry {
    Key(String),
    Titled {
        key: String,
        #[serde(default)]
        title: Option<String>,
    },
}

impl CatalogEntry {
    fn into_parts(self) -> (String, String) {
        match self {
            CatalogEntry::Key(key) => (key.clone(), key),
            CatalogEntry::Titled { key, title } => {
                let title = title.unwrap_or_else(|| key.clone());
                (key, title)
            }
        }
    }
}

impl From<CatalogEntry> for Sport {
    fn from(entry: CatalogEntry) -> Self {
        let (key, title) = entry.into_parts();
        Sport { key, title }
    }
}

impl From<CatalogEntry> for Bookmaker {
    fn from(entry: CatalogEntry) -> Self {
        let (key, title) = entry.into_parts();
        Bookmaker { key, title }
    }
}

/// Sports shown when the board API cannot list them
pub fn fallback_sports() -> Vec<Sport> {
    [
        ("americanfootball_ncaaf", "NCAAF"),
        ("americanfootball_nfl", "NFL"),
        ("baseball_mlb", "MLB"),
        ("basketball_nba", "NBA"),
        ("basketball_wnba", "WNBA"),
        ("mma_mixed_martial_arts", "MMA"),
    ]
    .into_iter()
    .map(|(key, title)| Sport {
        key: key.to_string(),
        title: title.to_string(),
    })
    .collect()
}

/// Bookmakers shown when the board API cannot list them
pub fn fallback_bookmakers() -> Vec<Bookmaker> {
    [
        ("betonlineag", "BetOnlineAG"),
        ("draftkings", "DraftKings"),
        ("fanduel", "FanDuel"),
    ]
    .into_iter()
    .map(|(key, title)| Bookmaker {
        key: key.to_string(),
        title: title.to_string(),
    })
    .collect()
}

/// Whether a sport is a head-to-head combat sport (fighters instead of teams)
pub fn is_combat_sport(sport_key: &str) -> bool {
    sport_key.starts_with("mma_") || sport_key.starts_with("boxing_")
}
