//! One editor's local copy of a board.
//!
//! The session owns two snapshots: `local`, which is what the user sees and
//! may contain speculative drag results, and `authoritative`, the last copy
//! the server confirmed. Every change to `local` is published on a
//! `watch` channel; publishing only happens when the arrangement actually
//! changes, so subscribers never see a fresh reference for an equal board.
//!
//! A generation counter ties poll fetches to the state they were started
//! from. Drag boundaries and reverts bump it, so a fetch that was already in
//! flight when one of those happened is discarded instead of applied.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use laneboard_core::board::BoardSnapshot;
use laneboard_core::intent::MoveIntent;
use laneboard_core::mutator::{self, DragTarget};
use tokio::sync::{broadcast, watch};

use crate::notice::Notice;

/// Why a poll tick did not fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Dragging,
    Background,
}

/// What happened to a fetched snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Local state was replaced and subscribers notified.
    Applied,
    /// The fetched board equals the held one; nothing was replaced.
    Unchanged,
    /// A drag is in progress; the result was dropped.
    Suspended,
    /// A drag boundary or revert happened after the fetch began.
    Superseded,
}

#[derive(Debug, Clone)]
struct DragSession {
    item_id: String,
    origin_lane_id: String,
    /// Local arrangement when the drag began, restored on cancel.
    baseline: Arc<BoardSnapshot>,
}

#[derive(Debug)]
struct SessionState {
    local: Arc<BoardSnapshot>,
    authoritative: Arc<BoardSnapshot>,
    drag: Option<DragSession>,
    generation: u64,
    foreground: bool,
}

pub struct BoardSession {
    board_id: String,
    state: Mutex<SessionState>,
    changes: watch::Sender<Arc<BoardSnapshot>>,
    notices: broadcast::Sender<Notice>,
}

impl BoardSession {
    /// Start a session from an authoritative snapshot.
    pub fn new(board_id: impl Into<String>, initial: BoardSnapshot) -> Self {
        let initial = Arc::new(initial);
        let (changes, _) = watch::channel(initial.clone());
        let (notices, _) = broadcast::channel(32);
        Self {
            board_id: board_id.into(),
            state: Mutex::new(SessionState {
                local: initial.clone(),
                authoritative: initial,
                drag: None,
                generation: 0,
                foreground: true,
            }),
            changes,
            notices,
        }
    }

    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace `local` and notify subscribers, unless it is the same board.
    fn publish(&self, state: &mut SessionState, next: Arc<BoardSnapshot>) -> bool {
        if Arc::ptr_eq(&state.local, &next) || *state.local == *next {
            return false;
        }
        state.local = next.clone();
        self.changes.send_replace(next);
        true
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    /// The board as the user currently sees it.
    pub fn snapshot(&self) -> Arc<BoardSnapshot> {
        self.lock().local.clone()
    }

    /// The last snapshot confirmed by the server.
    pub fn authoritative(&self) -> Arc<BoardSnapshot> {
        self.lock().authoritative.clone()
    }

    /// Change-notification hook: yields each new local snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<BoardSnapshot>> {
        self.changes.subscribe()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub(crate) fn notify(&self, notice: Notice) {
        // No subscribers is fine; notices are transient.
        let _ = self.notices.send(notice);
    }

    pub fn is_dragging(&self) -> bool {
        self.lock().drag.is_some()
    }

    pub fn set_foreground(&self, foreground: bool) {
        self.lock().foreground = foreground;
    }

    // -----------------------------------------------------------------------
    // Drag session
    // -----------------------------------------------------------------------

    /// Begin dragging `item_id`. Returns `false` if another drag is active
    /// or the item is not on the board.
    pub fn drag_start(&self, item_id: &str) -> bool {
        let mut state = self.lock();
        if state.drag.is_some() {
            return false;
        }
        let Some(item) = state.local.item(item_id) else {
            return false;
        };
        let drag = DragSession {
            item_id: item.id.clone(),
            origin_lane_id: item.lane_id.clone(),
            baseline: state.local.clone(),
        };
        state.drag = Some(drag);
        state.generation += 1;
        tracing::debug!(board = %self.board_id, item = item_id, "drag started");
        true
    }

    /// Apply one pointer-move frame. Returns whether the arrangement changed.
    /// Targets that are not on the board are ignored.
    pub fn drag_over(&self, over: Option<&DragTarget>) -> bool {
        let mut state = self.lock();
        let Some(drag) = state.drag.as_ref() else {
            return false;
        };
        if over.is_some_and(|t| !on_board(&state.local, t)) {
            return false;
        }
        let Some(items) = mutator::apply_drag(&state.local.items, &drag.item_id, over) else {
            return false;
        };
        let next = Arc::new(BoardSnapshot {
            lanes: state.local.lanes.clone(),
            items,
        });
        self.publish(&mut state, next)
    }

    /// Finish the drag over `over`.
    ///
    /// Returns the Move Intent to submit, or `None` when the drop has no
    /// target on the board (the pre-drag arrangement is restored) or leaves
    /// the item's lane exactly as it was. Polling resumes either way.
    pub fn drag_end(&self, over: Option<&DragTarget>) -> Option<MoveIntent> {
        let mut state = self.lock();
        let drag = state.drag.take()?;
        state.generation += 1;

        let Some(over) = over.filter(|t| on_board(&state.local, t)) else {
            self.publish(&mut state, drag.baseline);
            return None;
        };

        if let Some(items) = mutator::apply_drag(&state.local.items, &drag.item_id, Some(over)) {
            let next = Arc::new(BoardSnapshot {
                lanes: state.local.lanes.clone(),
                items,
            });
            self.publish(&mut state, next);
        }

        let to_lane_id = state.local.item(&drag.item_id)?.lane_id.clone();
        let order = mutator::lane_order(&state.local.items, &to_lane_id);
        let unchanged = to_lane_id == drag.origin_lane_id
            && order == mutator::lane_order(&drag.baseline.items, &to_lane_id);
        if unchanged {
            return None;
        }

        Some(MoveIntent::new(
            drag.item_id,
            drag.origin_lane_id,
            to_lane_id,
            order,
        ))
    }

    /// Abandon the drag and restore the pre-drag arrangement.
    pub fn drag_cancel(&self) {
        let mut state = self.lock();
        if let Some(drag) = state.drag.take() {
            state.generation += 1;
            self.publish(&mut state, drag.baseline);
        }
    }

    // -----------------------------------------------------------------------
    // Synchronization
    // -----------------------------------------------------------------------

    /// Gate for a poll tick: returns the generation to tag the fetch with.
    pub fn begin_poll(&self) -> Result<u64, SkipReason> {
        let state = self.lock();
        if state.drag.is_some() {
            return Err(SkipReason::Dragging);
        }
        if !state.foreground {
            return Err(SkipReason::Background);
        }
        Ok(state.generation)
    }

    /// Merge a polled snapshot fetched at `generation`.
    ///
    /// Items missing from `snapshot` simply disappear locally; the server's
    /// copy is trusted.
    pub fn merge_polled(&self, snapshot: BoardSnapshot, generation: u64) -> MergeOutcome {
        let mut state = self.lock();
        if state.drag.is_some() {
            return MergeOutcome::Suspended;
        }
        if state.generation != generation {
            return MergeOutcome::Superseded;
        }
        if *state.authoritative != snapshot {
            state.authoritative = Arc::new(snapshot);
        }
        let next = state.authoritative.clone();
        if self.publish(&mut state, next) {
            MergeOutcome::Applied
        } else {
            MergeOutcome::Unchanged
        }
    }

    /// Throw away speculative state and show the authoritative board.
    ///
    /// `fresh` is a just-fetched snapshot; without one the last
    /// authoritative snapshot held is used. In-flight polls are invalidated.
    /// A drag that started after the failed move keeps going, rebased onto
    /// the reverted board.
    pub fn revert(&self, fresh: Option<BoardSnapshot>) {
        let mut state = self.lock();
        if let Some(snapshot) = fresh {
            if *state.authoritative != snapshot {
                state.authoritative = Arc::new(snapshot);
            }
        }
        state.generation += 1;
        let next = state.authoritative.clone();
        if let Some(drag) = state.drag.as_mut() {
            drag.baseline = next.clone();
        }
        self.publish(&mut state, next);
        tracing::debug!(board = %self.board_id, "local state reverted to authoritative");
    }
}

fn on_board(snapshot: &BoardSnapshot, target: &DragTarget) -> bool {
    match target {
        DragTarget::Lane(lane_id) => snapshot.lane(lane_id).is_some(),
        DragTarget::Item(item_id) => snapshot.item(item_id).is_some(),
    }
}
