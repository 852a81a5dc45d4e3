use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Interval};
use tracing::{debug, info, warn};

use crate::api::OddsBoardClient;
use crate::models::{BoardUpdate, Control, Selection};

/// Issues request tokens so only the newest response is shown
#[derive(Debug, Default)]
pub struct RefreshSequencer {
    latest: AtomicU64,
}

impl RefreshSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request; every token is greater than the last
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether no newer request has started since `token` was issued
    pub fn is_current(&self, token: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == token
    }
}

/// Worker that owns the selection and fetches odds on every control change
pub struct BoardRefresherWorker {
    client: OddsBoardClient,
    selection: Selection,
    control_rx: mpsc::Receiver<Control>,
    update_tx: mpsc::Sender<BoardUpdate>,
    sequencer: Arc<RefreshSequencer>,
    refresh_interval: Option<Duration>,
    in_flight: Option<JoinHandle<()>>,
}

impl BoardRefresherWorker {
    /// Create a new board refresher worker
    pub fn new(
        client: OddsBoardClient,
        selection: Selection,
        control_rx: mpsc::Receiver<Control>,
        update_tx: mpsc::Sender<BoardUpdate>,
        sequencer: Arc<RefreshSequencer>,
        refresh_interval_secs: u64,
    ) -> Self {
        Self {
            client,
            selection,
            control_rx,
            update_tx,
            sequencer,
            refresh_interval: (refresh_interval_secs > 0)
                .then(|| Duration::from_secs(refresh_interval_secs)),
            in_flight: None,
        }
    }

    /// Run the worker loop until the control channel closes
    pub async fn run(mut self) {
        info!(
            "Board refresher started for {} (auto refresh: {:?})",
            self.selection, self.refresh_interval
        );

        // Initial load
        self.refresh();

        let mut ticker = self.refresh_interval.map(|period| {
            let mut interval = time::interval(period);
            interval.reset();
            interval
        });

        loop {
            tokio::select! {
                control = self.control_rx.recv() => match control {
                    Some(control) => {
                        self.apply(control);
                        self.refresh();
                    }
                    None => break,
                },
                _ = tick(&mut ticker) => {
                    // A new token would make the pending response stale
                    if self.is_fetching() {
                        debug!(
                            "Skipping auto refresh for {}, previous request still running",
                            self.selection
                        );
                    } else {
                        debug!("Auto refresh for {}", self.selection);
                        self.refresh();
                    }
                }
            }
        }

        info!("Board refresher stopped");
    }

    /// Update the selection from a control
    fn apply(&mut self, control: Control) {
        match control {
            Control::SetSport(sport) => {
                info!("Sport changed: {} -> {}", self.selection.sport, sport);
                self.selection.sport = sport;
            }
            Control::SetBookmaker(bookmaker) => {
                info!(
                    "Bookmaker changed: {} -> {}",
                    self.selection.bookmaker, bookmaker
                );
                self.selection.bookmaker = bookmaker;
            }
            Control::Refresh => debug!("Manual refresh requested"),
        }
    }

    fn is_fetching(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Start a tagged fetch for the current selection
    fn refresh(&mut self) {
        let token = self.sequencer.issue();
        let client = self.client.clone();
        let selection = self.selection.clone();
        let update_tx = self.update_tx.clone();

        debug!("Refresh #{} for {}", token, selection);

        self.in_flight = Some(tokio::spawn(async move {
            let outcome = client.fetch_odds(&selection).await;
            let update = BoardUpdate {
                token,
                selection,
                outcome,
            };
            if let Err(e) = update_tx.send(update).await {
                warn!("Failed to send board update: {}", e);
            }
        }));
    }
}

/// Wait for the next tick, or forever when auto refresh is off
async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequencer_tracks_latest() {
        let sequencer = RefreshSequencer::new();

        let first = sequencer.issue();
        assert!(sequencer.is_current(first));

        let second = sequencer.issue();
        assert!(second > first);
        assert!(!sequencer.is_current(first));
        assert!(sequencer.is_current(second));
    }

    #[tokio::test]
    async fn test_each_control_issues_a_request() {
        let client = OddsBoardClient::new("http://127.0.0.1:9", 1).unwrap();
        let sequencer = Arc::new(RefreshSequencer::new());
        let (control_tx, control_rx) = mpsc::channel(8);
        let (update_tx, mut update_rx) = mpsc::channel(8);

        let worker = BoardRefresherWorker::new(
            client,
            Selection::new("baseball_mlb", "draftkings"),
            control_rx,
            update_tx,
            Arc::clone(&sequencer),
            0,
        );
        let handle = tokio::spawn(worker.run());

        control_tx
            .send(Control::SetSport("basketball_nba".to_string()))
            .await
            .unwrap();
        drop(control_tx);
        handle.await.unwrap();

        let mut updates = Vec::new();
        while let Some(update) = update_rx.recv().await {
            updates.push(update);
        }
        updates.sort_by_key(|u| u.token);

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].selection.sport, "baseball_mlb");
        assert_eq!(updates[1].selection.sport, "basketball_nba");
        // Nothing listens on port 9
        assert!(updates.iter().all(|u| u.outcome.is_err()));
        assert!(sequencer.is_current(updates[1].token));
    }

    /// Serve `[]` to every request after `delay`
    async fn slow_server(delay: Duration) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 2048];
                    let _ = socket.read(&mut buf).await;
                    time::sleep(delay).await;
                    let _ = socket
                        .write_all(
                            b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n[]",
                        )
                        .await;
                });
            }
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_slow_server_still_renders_with_auto_refresh() {
        use crate::workers::BoardRendererWorker;

        let base_url = slow_server(Duration::from_millis(1500)).await;
        let client = OddsBoardClient::new(&base_url, 10).unwrap();
        let sequencer = Arc::new(RefreshSequencer::new());
        let (_control_tx, control_rx) = mpsc::channel(8);
        let (update_tx, mut update_rx) = mpsc::channel(8);

        // Ticks every second while each response takes 1.5s
        let worker = BoardRefresherWorker::new(
            client,
            Selection::new("baseball_mlb", "draftkings"),
            control_rx,
            update_tx,
            Arc::clone(&sequencer),
            1,
        );
        let handle = tokio::spawn(worker.run());

        let (_unused_tx, unused_rx) = mpsc::channel(1);
        let mut renderer = BoardRendererWorker::new(Arc::clone(&sequencer), unused_rx, Vec::new());

        let mut received = 0;
        let mut rendered = 0;
        let deadline = time::Instant::now() + Duration::from_millis(4500);
        while let Ok(Some(update)) = time::timeout_at(deadline, update_rx.recv()).await {
            assert!(update.outcome.is_ok());
            received += 1;
            if renderer.handle(update) {
                rendered += 1;
            }
        }
        handle.abort();

        assert!(received >= 2, "received {}", received);
        assert_eq!(rendered, received);

        let out = String::from_utf8(renderer.into_output()).unwrap();
        assert!(out.contains("No games available."));
    }
}
