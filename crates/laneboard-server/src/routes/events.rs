use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::auth::Caller;
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/board/{board_id}/events: SSE stream that emits `update` after
/// each committed move on the board. The payload names the moved item.
pub async fn board_events(
    State(app): State<AppState>,
    Caller(user): Caller,
    Path(board_id): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let coordinator = app.coordinator.clone();
    let board = board_id.clone();
    // Same check as a snapshot read; also 404s for unknown boards.
    tokio::task::spawn_blocking(move || coordinator.snapshot(&user, &board).map(|_| ()))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    let rx = app.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| {
        let event = msg.ok().filter(|e| e.board_id == board_id)?;
        let data = serde_json::to_string(&event).ok()?;
        Some(Ok::<Event, Infallible>(Event::default().event("update").data(data)))
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
