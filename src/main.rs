use std::env;
use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use odds_board::api::OddsBoardClient;
use odds_board::config::{flag_value, Config};
use odds_board::models::{Command, Control, GameView, Selection};
use odds_board::render::{render_board, render_catalog, render_error};
use odds_board::transform::build_game_view;
use odds_board::workers::{BoardRefresherWorker, BoardRendererWorker, RefreshSequencer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; stdout carries the board itself
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "odds_board=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting odds-board");

    // Load configuration
    let config = Config::from_env()?;
    let args: Vec<String> = env::args().collect();
    info!("Configuration loaded (API: {})", config.board_api_url);

    let client = OddsBoardClient::new(&config.board_api_url, config.http_timeout)?;

    // Populate selections
    let catalog = client.load_catalog().await;
    let sport = flag_value(&args, "--sport").unwrap_or_else(|| config.default_sport.clone());
    let bookmaker = flag_value(&args, "--bookmaker")
        .or_else(|| catalog.bookmakers.resolve_default(&config.default_bookmaker))
        .unwrap_or_else(|| config.default_bookmaker.clone());
    let selection = Selection::new(sport, bookmaker);

    if !catalog.sports.iter().any(|s| s.key == selection.sport) {
        warn!("Sport {} is not in the sports list", selection.sport);
    }

    if args.iter().any(|a| a == "--once") {
        return run_once(&client, &selection).await;
    }

    print!("{}", render_catalog(&catalog, &selection));

    let sequencer = Arc::new(RefreshSequencer::new());
    let (control_tx, control_rx) = mpsc::channel(16);
    let (update_tx, update_rx) = mpsc::channel(16);

    let refresher = BoardRefresherWorker::new(
        client,
        selection,
        control_rx,
        update_tx,
        Arc::clone(&sequencer),
        config.refresh_interval,
    );
    let renderer = BoardRendererWorker::new(Arc::clone(&sequencer), update_rx, std::io::stdout());

    let refresher_handle = tokio::spawn(refresher.run());
    let renderer_handle = tokio::spawn(renderer.run());
    let input_handle = tokio::spawn(read_commands(control_tx));

    info!("Board running");

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        result = input_handle => {
            if let Err(e) = result {
                error!("Input reader failed: {:?}", e);
            }
        }
        result = refresher_handle => {
            error!("Board refresher exited unexpectedly: {:?}", result);
        }
        result = renderer_handle => {
            error!("Board renderer exited unexpectedly: {:?}", result);
        }
    }

    info!("Shutting down odds-board");
    Ok(())
}

/// Fetch and print a single board, then exit
async fn run_once(client: &OddsBoardClient, selection: &Selection) -> Result<()> {
    let text = match client.fetch_odds(selection).await {
        Ok(records) => {
            let games: Vec<GameView> = records.iter().map(build_game_view).collect();
            render_board(selection, &games)
        }
        Err(e) => {
            error!("Failed to load odds for {}: {}", selection, e);
            render_error(&e.to_string())
        }
    };

    let mut stdout = std::io::stdout();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Forward stdin commands to the refresher until `quit`
async fn read_commands(control_tx: mpsc::Sender<Control>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                // Keep the board up without input; Ctrl-C still stops it
                info!("Input closed, commands disabled");
                std::future::pending::<()>().await;
                return;
            }
            Err(e) => {
                warn!("Failed to read input: {}", e);
                break;
            }
        };

        match Command::parse(&line) {
            Some(Command::Control(control)) => {
                if control_tx.send(control).await.is_err() {
                    break;
                }
            }
            Some(Command::Quit) => break,
            None if line.trim().is_empty() => {}
            None => warn!("Unknown command: {}", line.trim()),
        }
    }
}
