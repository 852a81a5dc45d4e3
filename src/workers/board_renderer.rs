use std::io::Write;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::models::{BoardUpdate, GameView};
use crate::render::{render_board, render_error};
use crate::transform::build_game_view;

use super::RefreshSequencer;

/// Worker that turns the newest odds response into board output
pub struct BoardRendererWorker<W> {
    sequencer: Arc<RefreshSequencer>,
    update_rx: mpsc::Receiver<BoardUpdate>,
    out: W,
}

impl<W: Write> BoardRendererWorker<W> {
    /// Create a new board renderer worker
    pub fn new(
        sequencer: Arc<RefreshSequencer>,
        update_rx: mpsc::Receiver<BoardUpdate>,
        out: W,
    ) -> Self {
        Self {
            sequencer,
            update_rx,
            out,
        }
    }

    /// Run the worker loop
    pub async fn run(mut self) {
        info!("Board renderer started");

        while let Some(update) = self.update_rx.recv().await {
            self.handle(update);
        }

        warn!("Board renderer channel closed");
    }

    /// Render an update unless a newer request has started; returns whether it was shown
    pub fn handle(&mut self, update: BoardUpdate) -> bool {
        if !self.sequencer.is_current(update.token) {
            info!(
                "Discarding stale response #{} for {}",
                update.token, update.selection
            );
            return false;
        }

        let text = match update.outcome {
            Ok(records) => {
                let games: Vec<GameView> = records.iter().map(build_game_view).collect();
                render_board(&update.selection, &games)
            }
            Err(e) => {
                error!("Failed to load odds for {}: {}", update.selection, e);
                render_error(&e.to_string())
            }
        };

        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            warn!("Failed to write board: {}", e);
        }
        true
    }

    pub fn into_output(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoardError;
    use crate::models::{OddsRecord, Selection};

    fn renderer() -> (Arc<RefreshSequencer>, BoardRendererWorker<Vec<u8>>) {
        let sequencer = Arc::new(RefreshSequencer::new());
        let (_tx, rx) = mpsc::channel(1);
        let worker = BoardRendererWorker::new(Arc::clone(&sequencer), rx, Vec::new());
        (sequencer, worker)
    }

    fn record(home: &str, away: &str) -> OddsRecord {
        OddsRecord {
            home_team: Some(home.to_string()),
            away_team: Some(away.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let (sequencer, mut worker) = renderer();

        let old = sequencer.issue();
        let new = sequencer.issue();

        // The newer request answers first
        assert!(worker.handle(BoardUpdate {
            token: new,
            selection: Selection::new("basketball_nba", "fanduel"),
            outcome: Ok(vec![record("Lakers", "Celtics")]),
        }));
        assert!(!worker.handle(BoardUpdate {
            token: old,
            selection: Selection::new("baseball_mlb", "fanduel"),
            outcome: Ok(vec![record("Mets", "Cubs")]),
        }));

        let out = String::from_utf8(worker.into_output()).unwrap();
        assert!(out.contains("Celtics vs Lakers"));
        assert!(!out.contains("Mets"));
    }

    #[test]
    fn test_failure_replaces_board() {
        let (sequencer, mut worker) = renderer();
        let token = sequencer.issue();

        worker.handle(BoardUpdate {
            token,
            selection: Selection::new("baseball_mlb", "draftkings"),
            outcome: Err(BoardError::Upstream("quota exceeded".to_string())),
        });

        let out = String::from_utf8(worker.into_output()).unwrap();
        assert_eq!(out, "Failed to load odds: server reported: quota exceeded\n");
    }

    #[test]
    fn test_empty_response() {
        let (sequencer, mut worker) = renderer();
        let token = sequencer.issue();

        worker.handle(BoardUpdate {
            token,
            selection: Selection::new("baseball_mlb", "draftkings"),
            outcome: Ok(Vec::new()),
        });

        let out = String::from_utf8(worker.into_output()).unwrap();
        assert!(out.ends_with("No games available.\n"));
    }
}
