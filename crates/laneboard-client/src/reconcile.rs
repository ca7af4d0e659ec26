//! Submitting a finished drag and undoing it when the server says no.

use laneboard_core::intent::{MoveIntent, MoveOutcome};

use crate::api::BoardApi;
use crate::notice::Notice;
use crate::session::BoardSession;
use crate::Result;

/// Send `intent` and reconcile the session with the answer.
///
/// On success the optimistic arrangement stays; the next poll confirms it.
/// On any failure the user gets an error notice and local state is replaced
/// with a freshly fetched snapshot, or with the last authoritative snapshot
/// held if that fetch fails too. The error is returned; nothing is retried.
pub async fn submit_move<A: BoardApi>(
    api: &A,
    session: &BoardSession,
    intent: &MoveIntent,
) -> Result<MoveOutcome> {
    let board_id = session.board_id();
    match api.submit_move(board_id, intent).await {
        Ok(outcome) => {
            if outcome.lane_changed {
                let lane = session
                    .snapshot()
                    .lane(&outcome.destination_lane_id)
                    .map(|l| l.name.clone())
                    .unwrap_or_else(|| outcome.destination_lane_id.clone());
                session.notify(Notice::info(format!("Item moved to {lane}")));
            }
            Ok(outcome)
        }
        Err(e) => {
            tracing::warn!(
                board = board_id,
                item = %intent.item_id,
                kind = %e.kind(),
                "move rejected, reverting: {e}"
            );
            session.notify(Notice::error(
                "Error updating item",
                "Could not save changes. The board has been reset.",
            ));
            let fresh = match api.fetch_snapshot(board_id).await {
                Ok(snapshot) => Some(snapshot),
                Err(fetch_err) => {
                    tracing::warn!(board = board_id, "refetch after failed move: {fetch_err}");
                    None
                }
            };
            session.revert(fresh);
            Err(e)
        }
    }
}
