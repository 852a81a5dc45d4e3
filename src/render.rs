//! Plain-text rendering of game views for the terminal board.

use std::fmt::Write;

use crate::api::Catalog;
use crate::models::{DisplayRow, GameView, Market, Selection};

pub const NO_GAMES: &str = "No games available.";

const HEADERS: [&str; 4] = ["Team", "Open", "Live", "Diff"];

/// Render every game for a selection, or the empty-board notice
pub fn render_board(selection: &Selection, games: &[GameView]) -> String {
    let mut out = format!("== {} ==\n", selection);

    if games.is_empty() {
        out.push_str(NO_GAMES);
        out.push('\n');
        return out;
    }

    for game in games {
        out.push('\n');
        out.push_str(&render_game(game));
    }
    out
}

/// Header line plus one table per market that has rows
pub fn render_game(game: &GameView) -> String {
    let mut out = if game.when_label.is_empty() {
        format!("{}\n", game.matchup_label)
    } else {
        format!("{} — {}\n", game.when_label, game.matchup_label)
    };

    for market in Market::ALL {
        let rows = match market {
            Market::Moneyline => &game.markets.moneyline,
            Market::Spread => &game.markets.spread,
            Market::Total => &game.markets.total,
        };
        out.push_str(&render_market(market.title(), rows));
    }
    out
}

/// A titled Team/Open/Live/Diff table; empty when there are no rows
pub fn render_market(title: &str, rows: &[DisplayRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|row| {
            [
                row.label.clone(),
                row.open_text.clone(),
                row.live_text.clone(),
                format!("{} {}", row.diff_polarity.marker(), row.diff_text),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = format!("  {}\n", title);
    push_row(&mut out, &HEADERS.map(str::to_string), &widths);
    for row in &cells {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String; 4], widths: &[usize; 4]) {
    out.push_str("   ");
    for (cell, width) in cells.iter().zip(widths) {
        let _ = write!(out, " {:<width$}", cell, width = *width);
    }
    // Drop the padding after the last column
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
}

/// One-line message shown in place of the board when a refresh fails
pub fn render_error(message: &str) -> String {
    format!("Failed to load odds: {}\n", message)
}

/// Available sports and bookmakers with the active selection marked
pub fn render_catalog(catalog: &Catalog, selection: &Selection) -> String {
    let mark = |active: bool| if active { "*" } else { " " };

    let mut out = String::from("Sports:\n");
    for sport in &catalog.sports {
        let _ = writeln!(
            out,
            "  {} {:<24} {}",
            mark(sport.key == selection.sport),
            sport.key,
            sport.title
        );
    }
    out.push_str("Bookmakers:\n");
    for book in &catalog.bookmakers.bookmakers {
        let _ = writeln!(
            out,
            "  {} {:<24} {}",
            mark(book.key == selection.bookmaker),
            book.key,
            book.title
        );
    }
    out.push_str("Commands: sport <key> | book <key> | refresh | quit\n");
    out
}
