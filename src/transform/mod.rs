//! Maps odds records into render-ready game views.

pub mod formatting;
pub mod view;

pub use formatting::{
    classify_polarity, format_moneyline_price, format_number, format_point_with_price,
    format_signed_diff, PLACEHOLDER,
};
pub use view::{build_game_view, build_game_view_in, build_market_rows, parse_start_time};
