use std::env;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Odds board API URL (serves /sports, /bookmakers, /odds/{sport})
    pub board_api_url: String,

    /// Sport selected at startup
    pub default_sport: String,

    /// Bookmaker selected at startup when the server names no default
    pub default_bookmaker: String,

    /// Interval in seconds between automatic refreshes (0 = manual only)
    pub refresh_interval: u64,

    /// HTTP request timeout in seconds
    pub http_timeout: u64,

    /// The Odds API key, only needed by the line tracker
    pub odds_api_key: Option<String>,

    /// The Odds API base URL
    pub odds_api_url: String,

    /// The Odds API region filter
    pub odds_regions: String,

    /// SQLite database path for opening lines
    pub database_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            board_api_url: env::var("BOARD_API_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:5050".to_string())
                .trim_end_matches('/')
                .to_string(),

            default_sport: env::var("DEFAULT_SPORT")
                .unwrap_or_else(|_| "baseball_mlb".to_string()),

            default_bookmaker: env::var("DEFAULT_BOOKMAKER")
                .unwrap_or_else(|_| "draftkings".to_string()),

            refresh_interval: env::var("BOARD_REFRESH_INTERVAL")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .context("BOARD_REFRESH_INTERVAL must be a valid number")?,

            http_timeout: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("HTTP_TIMEOUT_SECS must be a valid number")?,

            odds_api_key: env::var("THE_ODDS_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),

            odds_api_url: env::var("ODDS_API_URL")
                .unwrap_or_else(|_| "https://api.the-odds-api.com/v4".to_string())
                .trim_end_matches('/')
                .to_string(),

            odds_regions: env::var("ODDS_REGIONS").unwrap_or_else(|_| "us".to_string()),

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:data/opening_lines.db".to_string()),
        })
    }
}

/// Value following a `--flag` command-line argument
pub fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .filter(|v| !v.starts_with("--"))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_flag_value() {
        let argv = args("odds-board --sport basketball_nba --once --bookmaker");

        assert_eq!(flag_value(&argv, "--sport").as_deref(), Some("basketball_nba"));
        assert_eq!(flag_value(&argv, "--bookmaker"), None);
        assert_eq!(flag_value(&args("odds-board --sport --once"), "--sport"), None);
        assert_eq!(flag_value(&argv, "--output"), None);
    }
}
