pub mod opening_lines;

pub use opening_lines::{OpeningKey, OpeningLineStore};
