pub mod board_refresher;
pub mod board_renderer;

pub use board_refresher::{BoardRefresherWorker, RefreshSequencer};
pub use board_renderer::BoardRendererWorker;
