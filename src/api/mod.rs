pub mod odds_board;
pub mod the_odds_api;

pub use odds_board::{Catalog, OddsBoardClient};
pub use the_odds_api::{TheOddsApiClient, UpstreamEvent};
