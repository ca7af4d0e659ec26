use std::future::Future;

use laneboard_core::board::BoardSnapshot;
use laneboard_core::intent::{MoveIntent, MoveOutcome};

use crate::Result;

/// The two server endpoints the client core depends on.
///
/// `fetch_snapshot` must be read-only and idempotent; it is the poller's
/// only input. `submit_move` is sent once per completed drag and never
/// retried by this crate.
pub trait BoardApi: Send + Sync {
    fn fetch_snapshot(&self, board_id: &str) -> impl Future<Output = Result<BoardSnapshot>> + Send;

    fn submit_move(
        &self,
        board_id: &str,
        intent: &MoveIntent,
    ) -> impl Future<Output = Result<MoveOutcome>> + Send;
}
