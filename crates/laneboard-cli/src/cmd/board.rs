use anyhow::Context;
use clap::Subcommand;
use laneboard_client::{BoardApi, BoardSession, HttpBoardClient, Poller};
use laneboard_core::board::BoardSnapshot;
use laneboard_core::config::Config;
use laneboard_core::store::BoardStore;
use laneboard_core::BoardError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::RemoteArgs;
use crate::output::{print_board, print_json, print_table};

#[derive(Subcommand)]
pub enum BoardSubcommand {
    /// List boards in the local database
    List,

    /// Print a board's lanes and items from the local database
    Show { board: String },

    /// Follow a board on a running server, reprinting it on every change
    Watch {
        board: String,
        #[command(flatten)]
        remote: RemoteArgs,
        /// Poll interval (default: poll.interval_ms from config)
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

pub fn run(root: &Path, subcmd: BoardSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        BoardSubcommand::List => list(root, json),
        BoardSubcommand::Show { board } => show(root, &board, json),
        BoardSubcommand::Watch {
            board,
            remote,
            interval_ms,
        } => watch(root, board, remote, interval_ms, json),
    }
}

fn open_store(root: &Path) -> anyhow::Result<BoardStore> {
    let config = Config::load(root).context("failed to load config")?;
    BoardStore::open(&config.db_path(root)).context("failed to open board database")
}

// ---------------------------------------------------------------------------
// list / show
// ---------------------------------------------------------------------------

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let boards = open_store(root)?.list_boards()?;
    if json {
        return print_json(&boards);
    }
    if boards.is_empty() {
        println!("No boards.");
        return Ok(());
    }
    let rows = boards
        .iter()
        .map(|b| {
            vec![
                b.id.clone(),
                b.name.clone(),
                b.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "CREATED"], rows);
    Ok(())
}

fn show(root: &Path, board_id: &str, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let snapshot = store.snapshot(board_id)?;
    if json {
        return print_json(&snapshot);
    }
    let board = store.get_board(board_id)?;
    println!("{} ({})\n", board.name, board.id);
    print_board(&snapshot);
    Ok(())
}

// ---------------------------------------------------------------------------
// watch
// ---------------------------------------------------------------------------

fn poll_interval(root: &Path, explicit: Option<u64>) -> anyhow::Result<Duration> {
    if let Some(ms) = explicit {
        anyhow::ensure!(ms > 0, "--interval-ms must be greater than zero");
        return Ok(Duration::from_millis(ms));
    }
    let config = match Config::load(root) {
        Ok(config) => config,
        Err(BoardError::NotInitialized) => Config::default(),
        Err(e) => return Err(e).context("failed to load config"),
    };
    Ok(config.poll.interval())
}

fn render(snapshot: &BoardSnapshot, board_id: &str, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(snapshot)?);
    } else {
        println!("=== {board_id} ===");
        print_board(snapshot);
        println!();
    }
    Ok(())
}

fn watch(
    root: &Path,
    board_id: String,
    remote: RemoteArgs,
    interval_ms: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let interval = poll_interval(root, interval_ms)?;
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        let api = Arc::new(HttpBoardClient::new(remote.url, remote.user)?);
        let initial = api
            .fetch_snapshot(&board_id)
            .await
            .with_context(|| format!("failed to fetch board '{board_id}'"))?;

        let session = Arc::new(BoardSession::new(board_id.clone(), initial));
        render(&session.snapshot(), &board_id, json)?;

        let mut changes = session.subscribe();
        let _poller = Poller::new(api, session.clone(), interval).spawn();
        tracing::info!(board = %board_id, ?interval, "watching");

        loop {
            tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = changes.borrow_and_update().clone();
                    render(&snapshot, &board_id, json)?;
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }
        Ok(())
    })
}
