use std::time::Duration;

use reqwest::Client;
use serde::de::Error as _;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{BoardError, BoardResult};
use crate::models::catalog::{fallback_bookmakers, fallback_sports};
use crate::models::{Bookmaker, BookmakerList, OddsRecord, Selection, Sport};

/// Client for the odds board API (sports, bookmakers, and tracked odds)
#[derive(Clone)]
pub struct OddsBoardClient {
    client: Client,
    base_url: String,
}

/// Sports and bookmakers available for selection
#[derive(Debug, Clone)]
pub struct Catalog {
    pub sports: Vec<Sport>,
    pub bookmakers: BookmakerList,
}

impl OddsBoardClient {
    /// Create a new odds board client
    pub fn new(base_url: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the sports the board can show
    pub async fn fetch_sports(&self) -> BoardResult<Vec<Sport>> {
        let url = format!("{}/sports", self.base_url);
        let body = self.get_text("Sports", &url).await?;
        parse_sports(&body)
    }

    /// Fetch the bookmakers and the server's default
    pub async fn fetch_bookmakers(&self) -> BoardResult<BookmakerList> {
        let url = format!("{}/bookmakers", self.base_url);
        let body = self.get_text("Bookmakers", &url).await?;
        parse_bookmakers(&body)
    }

    /// Fetch odds records for a sport at a bookmaker
    pub async fn fetch_odds(&self, selection: &Selection) -> BoardResult<Vec<OddsRecord>> {
        let url = format!(
            "{}/odds/{}?bookmaker={}",
            self.base_url,
            urlencoding::encode(&selection.sport),
            urlencoding::encode(&selection.bookmaker)
        );
        let body = self.get_text("Odds", &url).await?;
        let records = parse_odds(&body)?;

        info!("Fetched {} games for {}", records.len(), selection);
        Ok(records)
    }

    /// Load sports and bookmakers, substituting built-in lists for any that fail
    pub async fn load_catalog(&self) -> Catalog {
        let sports = self.fetch_sports().await;
        let bookmakers = self.fetch_bookmakers().await;
        catalog_from(sports, bookmakers)
    }

    async fn get_text(&self, endpoint: &'static str, url: &str) -> BoardResult<String> {
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| BoardError::Transport {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BoardError::Status {
                endpoint,
                status,
                body,
            });
        }

        response.text().await.map_err(|source| BoardError::Transport {
            url: url.to_string(),
            source,
        })
    }
}

/// Parse a /sports body: a bare list or `{sports: [...]}`
pub fn parse_sports(body: &str) -> BoardResult<Vec<Sport>> {
    let value = parse_json("sports", body)?;
    let list = match unwrap_envelope(value, "sports")? {
        Value::Null => return Ok(Vec::new()),
        list => list,
    };
    Vec::<Sport>::deserialize(list).map_err(|source| BoardError::Decode {
        endpoint: "sports",
        source,
    })
}

/// Parse a /bookmakers body: a bare list or `{bookmakers: [...], default}`
pub fn parse_bookmakers(body: &str) -> BoardResult<BookmakerList> {
    let value = parse_json("bookmakers", body)?;

    let default = value
        .as_object()
        .and_then(|o| o.get("default").or_else(|| o.get("default_bookmaker")))
        .and_then(Value::as_str)
        .map(str::to_string);

    let bookmakers = match unwrap_envelope(value, "bookmakers")? {
        Value::Null => Vec::new(),
        list => Vec::<Bookmaker>::deserialize(list).map_err(|source| BoardError::Decode {
            endpoint: "bookmakers",
            source,
        })?,
    };

    Ok(BookmakerList {
        bookmakers,
        default,
    })
}

/// Parse an /odds body: a bare list or `{records: [...]}`
///
/// Entries that are not objects are skipped; fields inside a record are
/// null-guarded by the record's own decoding.
pub fn parse_odds(body: &str) -> BoardResult<Vec<OddsRecord>> {
    let value = parse_json("odds", body)?;

    let items = match unwrap_envelope(value, "records")? {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        _ => {
            return Err(BoardError::Decode {
                endpoint: "odds",
                source: serde_json::Error::custom("expected a list of records"),
            })
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        if !item.is_object() {
            debug!("Skipping non-object odds entry: {}", item);
            continue;
        }
        let record = OddsRecord::deserialize(item).map_err(|source| BoardError::Decode {
            endpoint: "odds",
            source,
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Combine catalog responses, falling back per list when one failed or came back empty
pub fn catalog_from(
    sports: BoardResult<Vec<Sport>>,
    bookmakers: BoardResult<BookmakerList>,
) -> Catalog {
    let sports = match sports {
        Ok(sports) if !sports.is_empty() => sports,
        Ok(_) => {
            warn!("Sports API returned no sports, using fallback");
            fallback_sports()
        }
        Err(e) => {
            warn!("Failed to load sports from API, using fallback: {}", e);
            fallback_sports()
        }
    };

    let bookmakers = match bookmakers {
        Ok(list) if !list.bookmakers.is_empty() => list,
        Ok(_) => {
            warn!("Bookmakers API returned no bookmakers, using fallback");
            BookmakerList {
                bookmakers: fallback_bookmakers(),
                default: None,
            }
        }
        Err(e) => {
            warn!("Failed to load bookmakers from API, using fallback: {}", e);
            BookmakerList {
                bookmakers: fallback_bookmakers(),
                default: None,
            }
        }
    };

    Catalog { sports, bookmakers }
}

fn parse_json(endpoint: &'static str, body: &str) -> BoardResult<Value> {
    serde_json::from_str(body).map_err(|source| BoardError::Decode { endpoint, source })
}

/// Pull `field` out of an envelope object, surfacing `{error: ...}` bodies
fn unwrap_envelope(value: Value, field: &str) -> BoardResult<Value> {
    match value {
        Value::Object(mut object) => {
            if let Some(error) = object.get("error") {
                let message = error
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string());
                return Err(BoardError::Upstream(message));
            }
            Ok(object.remove(field).unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_odds_bare_and_envelope() {
        let bare = parse_odds(r#"[{"home_team": "Lakers"}, null, 3]"#).unwrap();
        assert_eq!(bare.len(), 1);
        assert_eq!(bare[0].home_team.as_deref(), Some("Lakers"));

        let wrapped = parse_odds(r#"{"records": [{"away_team": "Celtics"}]}"#).unwrap();
        assert_eq!(wrapped[0].away_team.as_deref(), Some("Celtics"));

        assert!(parse_odds(r#"{"records": null}"#).unwrap().is_empty());
        assert!(parse_odds("null").unwrap().is_empty());
    }

    #[test]
    fn test_parse_odds_error_envelope() {
        let err = parse_odds(r#"{"error": "quota exceeded"}"#).unwrap_err();
        assert!(matches!(err, BoardError::Upstream(ref m) if m == "quota exceeded"));
        assert_eq!(err.to_string(), "server reported: quota exceeded");
    }

    #[test]
    fn test_parse_odds_rejects_garbage() {
        assert!(matches!(
            parse_odds("<html>"),
            Err(BoardError::Decode { endpoint: "odds", .. })
        ));
        assert!(matches!(
            parse_odds(r#""nope""#),
            Err(BoardError::Decode { .. })
        ));
    }

    #[test]
    fn test_parse_sports() {
        let sports = parse_sports(r#"[{"key": "baseball_mlb", "title": "MLB"}, "mma_ufc"]"#).unwrap();
        assert_eq!(sports.len(), 2);
        assert_eq!(sports[1].title, "mma_ufc");

        let wrapped = parse_sports(r#"{"sports": [{"key": "basketball_nba", "title": "NBA"}]}"#)
            .unwrap();
        assert_eq!(wrapped[0].key, "basketball_nba");
    }

    #[test]
    fn test_parse_bookmakers() {
        let bare = parse_bookmakers(r#"[{"key": "draftkings", "title": "DraftKings"}]"#).unwrap();
        assert_eq!(bare.bookmakers.len(), 1);
        assert_eq!(bare.default, None);

        let wrapped = parse_bookmakers(
            r#"{"bookmakers": [{"key": "fanduel", "title": "FanDuel"}], "default": "fanduel"}"#,
        )
        .unwrap();
        assert_eq!(wrapped.default.as_deref(), Some("fanduel"));
        assert_eq!(wrapped.bookmakers[0].title, "FanDuel");
    }

    #[test]
    fn test_empty_lists_fall_back() {
        assert!(parse_sports("[]").unwrap().is_empty());

        let catalog = catalog_from(parse_sports("[]"), parse_bookmakers(r#"{"bookmakers": []}"#));
        assert_eq!(catalog.sports, fallback_sports());
        assert_eq!(catalog.bookmakers.bookmakers, fallback_bookmakers());
        assert_eq!(catalog.bookmakers.default, None);
    }

    #[test]
    fn test_server_lists_are_kept() {
        let catalog = catalog_from(
            parse_sports(r#"["mma_ufc"]"#),
            parse_bookmakers(r#"{"bookmakers": ["fanduel"], "default": "fanduel"}"#),
        );

        assert_eq!(catalog.sports.len(), 1);
        assert_eq!(catalog.sports[0].key, "mma_ufc");
        assert_eq!(catalog.bookmakers.default.as_deref(), Some("fanduel"));
    }

    #[tokio::test]
    async fn test_unreachable_server_uses_fallback_catalog() {
        // Nothing listens on port 9
        let client = OddsBoardClient::new("http://127.0.0.1:9", 1).unwrap();

        let catalog = client.load_catalog().await;

        assert_eq!(catalog.sports, fallback_sports());
        assert_eq!(catalog.bookmakers.bookmakers, fallback_bookmakers());
        assert_eq!(catalog.bookmakers.default, None);
        assert_eq!(
            catalog.bookmakers.resolve_default("draftkings").as_deref(),
            Some("draftkings")
        );
    }
}
