pub mod board;
pub mod catalog;
pub mod display;
pub mod odds_record;

pub use board::{BoardUpdate, Command, Control};
pub use catalog::{Bookmaker, BookmakerList, Selection, Sport};
pub use display::{DisplayRow, GameView, MarketViews, Polarity};
pub use odds_record::{
    LineSnapshot, Market, MarketKind, MarketSections, OddsRecord, RawLine, SideLines, StartTime,
};
