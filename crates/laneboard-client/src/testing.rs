//! In-memory [`BoardApi`] for session, poller and reconcile tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use laneboard_core::board::{BoardSnapshot, Item, Lane};
use laneboard_core::intent::{MoveIntent, MoveOutcome};
use laneboard_core::reorder::plan_move;
use laneboard_core::types::LaneCategory;
use laneboard_core::ErrorKind;
use tokio::sync::oneshot;

use crate::api::BoardApi;
use crate::error::ClientError;
use crate::Result;

pub fn ids(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

pub fn lane_ids(snapshot: &BoardSnapshot, lane_id: &str) -> Vec<String> {
    snapshot.lane_items(lane_id).map(|i| i.id.clone()).collect()
}

fn item(id: &str, lane: &str, position: u32) -> Item {
    Item {
        id: id.to_string(),
        lane_id: lane.to_string(),
        position,
        key: format!("DEMO-{}", id.to_uppercase()),
        title: format!("Item {id}"),
        assignee_id: Some("alice".to_string()),
    }
}

/// Lanes todo/doing/done; items x, y, z in todo.
pub fn board() -> BoardSnapshot {
    BoardSnapshot::new(
        vec![
            Lane::new("todo", "To Do", 0, LaneCategory::NotStarted),
            Lane::new("doing", "In Progress", 1, LaneCategory::InProgress),
            Lane::new("done", "Done", 2, LaneCategory::Done),
        ],
        vec![item("x", "todo", 0), item("y", "todo", 1), item("z", "todo", 2)],
    )
}

/// A scripted server holding one board.
pub struct FakeApi {
    pub server: Mutex<BoardSnapshot>,
    pub reject_moves: Mutex<Option<ErrorKind>>,
    pub fail_fetches: AtomicBool,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub fetches: AtomicUsize,
    pub submits: AtomicUsize,
}

impl FakeApi {
    pub fn new(server: BoardSnapshot) -> Self {
        Self {
            server: Mutex::new(server),
            reject_moves: Mutex::new(None),
            fail_fetches: AtomicBool::new(false),
            gate: Mutex::new(None),
            fetches: AtomicUsize::new(0),
            submits: AtomicUsize::new(0),
        }
    }

    /// Hold the next fetch open until the returned sender fires. The fetch
    /// reads server state before waiting.
    pub fn hold_next_fetch(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn reject_moves_with(&self, kind: ErrorKind) {
        *self.reject_moves.lock().unwrap() = Some(kind);
    }

    /// Change the server's board as another client would.
    pub fn edit(&self, f: impl FnOnce(&mut BoardSnapshot)) {
        let mut server = self.server.lock().unwrap();
        f(&mut server);
    }

    pub fn current(&self) -> BoardSnapshot {
        self.server.lock().unwrap().clone()
    }
}

impl BoardApi for FakeApi {
    async fn fetch_snapshot(&self, _board_id: &str) -> Result<BoardSnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(ClientError::Unexpected {
                status: 503,
                body: "unavailable".into(),
            });
        }
        let snapshot = self.current();
        let gate = self.gate.lock().unwrap().take();
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        Ok(snapshot)
    }

    async fn submit_move(&self, _board_id: &str, intent: &MoveIntent) -> Result<MoveOutcome> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        let rejection = *self.reject_moves.lock().unwrap();
        if let Some(kind) = rejection {
            return Err(ClientError::rejected(kind, format!("{} refused", kind)));
        }
        let mut server = self.server.lock().unwrap();
        let plan = plan_move(&server.items, intent)
            .map_err(|e| ClientError::rejected(e.kind(), e.to_string()))?;
        let mut items = server.items.clone();
        for write in plan.writes {
            if let Some(slot) = items.iter_mut().find(|i| i.id == write.id) {
                *slot = write;
            }
        }
        *server = BoardSnapshot::new(server.lanes.clone(), items);
        Ok(plan.outcome)
    }
}
