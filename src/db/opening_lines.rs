use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use tracing::{debug, info};

use crate::models::Market;
use crate::tracking::LineQuote;

/// Identifies one market of one game at one bookmaker
#[derive(Debug, Clone, Copy)]
pub struct OpeningKey<'a> {
    pub sport: &'a str,
    pub bookmaker: &'a str,
    pub matchup: &'a str,
    pub market: Market,
}

/// SQLite store for the first line seen per side
pub struct OpeningLineStore {
    pool: Pool<Sqlite>,
}

impl OpeningLineStore {
    /// Create a new opening line store and initialize the database
    pub async fn new(database_url: &str) -> Result<Self> {
        // Create data directory if needed
        if let Some(path) = database_url.strip_prefix("sqlite:") {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .context("Failed to create database directory")?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .create_if_missing(true);

        // Every connection to an in-memory database is a separate database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init_schema().await?;

        info!("Opening line store initialized");
        Ok(store)
    }

    /// Initialize database schema
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS opening_lines (
                sport TEXT NOT NULL,
                bookmaker TEXT NOT NULL,
                matchup TEXT NOT NULL,
                market TEXT NOT NULL,
                side TEXT NOT NULL,
                price INTEGER,
                point REAL,
                recorded_at TEXT NOT NULL,
                PRIMARY KEY (sport, bookmaker, matchup, market, side)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create opening_lines table")?;

        Ok(())
    }

    /// Record quotes as openings for sides that have none yet.
    ///
    /// Existing openings are never overwritten. Returns the number of sides
    /// newly recorded.
    pub async fn record_if_absent(&self, key: OpeningKey<'_>, quotes: &[LineQuote]) -> Result<u64> {
        let recorded_at = Utc::now().to_rfc3339();
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start opening line transaction")?;

        let mut inserted = 0;
        for quote in quotes {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO opening_lines (
                    sport, bookmaker, matchup, market, side, price, point, recorded_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(key.sport)
            .bind(key.bookmaker)
            .bind(key.matchup)
            .bind(key.market.as_str())
            .bind(&quote.side)
            .bind(quote.price)
            .bind(quote.point)
            .bind(&recorded_at)
            .execute(&mut *tx)
            .await
            .context("Failed to insert opening line")?;

            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .context("Failed to commit opening lines")?;

        if inserted > 0 {
            debug!(
                "Recorded {} opening {} lines for {} ({}@{})",
                inserted,
                key.market.as_str(),
                key.matchup,
                key.sport,
                key.bookmaker
            );
        }
        Ok(inserted)
    }

    /// Opening quotes for a market, keyed by side
    pub async fn openings(&self, key: OpeningKey<'_>) -> Result<HashMap<String, LineQuote>> {
        let rows = sqlx::query(
            r#"
            SELECT side, price, point FROM opening_lines
            WHERE sport = ? AND bookmaker = ? AND matchup = ? AND market = ?
            "#,
        )
        .bind(key.sport)
        .bind(key.bookmaker)
        .bind(key.matchup)
        .bind(key.market.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch opening lines")?;

        rows.into_iter()
            .map(|row| {
                let quote = LineQuote {
                    side: row.try_get("side")?,
                    price: row.try_get("price")?,
                    point: row.try_get("point")?,
                };
                Ok((quote.side.clone(), quote))
            })
            .collect::<std::result::Result<_, sqlx::Error>>()
            .context("Failed to read opening line row")
    }

    /// Get count of recorded opening lines
    pub async fn count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM opening_lines")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count opening lines")?;

        Ok(row.0)
    }
}
