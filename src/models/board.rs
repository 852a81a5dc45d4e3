use crate::error::BoardError;

use super::{OddsRecord, Selection};

/// A user action on the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    SetSport(String),
    SetBookmaker(String),
    Refresh,
}

/// A line typed on the board's input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Control(Control),
    Quit,
}

impl Command {
    /// Parse `sport <key>`, `book <key>`, `refresh`, or `quit`
    pub fn parse(line: &str) -> Option<Command> {
        let mut words = line.split_whitespace();
        let verb = words.next()?.to_ascii_lowercase();
        let arg = words.next();

        match (verb.as_str(), arg) {
            ("sport" | "s", Some(key)) => Some(Command::Control(Control::SetSport(key.to_string()))),
            ("book" | "bookmaker" | "b", Some(key)) => {
                Some(Command::Control(Control::SetBookmaker(key.to_string())))
            }
            ("refresh" | "r", None) => Some(Command::Control(Control::Refresh)),
            ("quit" | "q" | "exit", None) => Some(Command::Quit),
            _ => None,
        }
    }
}

/// Result of one odds request, sent from the refresher to the renderer
#[derive(Debug)]
pub struct BoardUpdate {
    /// Sequence token issued when the request started
    pub token: u64,

    /// Selection the request was made for
    pub selection: Selection,

    pub outcome: Result<Vec<OddsRecord>, BoardError>,
}
