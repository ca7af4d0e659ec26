//! Server-side entry point for committing a completed drag.

use std::sync::Arc;

use crate::access::{AuthDecision, Authorizer, Notifier};
use crate::board::BoardSnapshot;
use crate::error::{BoardError, Result};
use crate::intent::{MoveIntent, MoveOutcome};
use crate::store::BoardStore;
use crate::types::BoardAction;

/// Validates, authorizes and commits Move Intents against the store.
///
/// This is the only component that writes item lane membership or
/// positions. It holds no lock of its own; the store's write transaction is
/// the arbitration point for concurrent commits on a board.
#[derive(Clone)]
pub struct PersistenceCoordinator {
    store: Arc<BoardStore>,
    authorizer: Arc<dyn Authorizer>,
    notifier: Arc<dyn Notifier>,
}

impl PersistenceCoordinator {
    pub fn new(
        store: Arc<BoardStore>,
        authorizer: Arc<dyn Authorizer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            authorizer,
            notifier,
        }
    }

    pub fn store(&self) -> &Arc<BoardStore> {
        &self.store
    }

    fn authorize(&self, user_id: &str, board_id: &str, action: BoardAction) -> Result<()> {
        match self.authorizer.authorize(user_id, board_id, action) {
            AuthDecision::Allow => Ok(()),
            AuthDecision::Deny(reason) => Err(BoardError::PermissionDenied(reason)),
        }
    }

    /// Read the authoritative snapshot on behalf of `user_id`.
    pub fn snapshot(&self, user_id: &str, board_id: &str) -> Result<BoardSnapshot> {
        self.authorize(user_id, board_id, BoardAction::ViewBoard)?;
        self.store.snapshot(board_id)
    }

    /// Commit one Move Intent for `user_id`.
    ///
    /// Malformed intents and denied callers fail before any write. The
    /// assignee is not notified here; call [`notify_moved`] once the result
    /// has been handed back.
    ///
    /// [`notify_moved`]: Self::notify_moved
    pub fn submit_move(
        &self,
        user_id: &str,
        board_id: &str,
        intent: &MoveIntent,
    ) -> Result<MoveOutcome> {
        intent.validate()?;
        self.authorize(user_id, board_id, BoardAction::MoveItem)?;

        let outcome = self.store.commit_move(board_id, intent)?;
        tracing::info!(
            board = board_id,
            user = user_id,
            item = %outcome.item.id,
            from = %outcome.source_lane_id,
            to = %outcome.destination_lane_id,
            written = outcome.items_written,
            "move committed"
        );
        Ok(outcome)
    }

    /// Tell the item's assignee it changed lane. Failures are logged only.
    pub fn notify_moved(&self, board_id: &str, outcome: &MoveOutcome) {
        if !outcome.lane_changed {
            return;
        }
        let Some(assignee) = outcome.item.assignee_id.as_deref() else {
            return;
        };
        let lane_name = match self.store.get_lane(board_id, &outcome.destination_lane_id) {
            Ok(lane) => lane.name,
            Err(e) => {
                tracing::warn!("skipping move notification: {e}");
                return;
            }
        };
        let message = format!(
            "{} \"{}\" moved to {}",
            outcome.item.key, outcome.item.title, lane_name
        );
        let link = format!("/board/{board_id}/items/{}", outcome.item.id);
        if let Err(e) = self.notifier.notify(assignee, &message, &link) {
            tracing::warn!(user = assignee, "{e}");
        }
    }
}
