use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use laneboard_core::board::BoardSnapshot;
use laneboard_core::BoardError;
use laneboard_core::intent::{MoveIntent, MoveOutcome};

use crate::auth::Caller;
use crate::error::AppError;
use crate::state::{AppState, BoardEvent};

/// GET /api/board/{board_id}: authoritative snapshot of lanes and items.
pub async fn get_board(
    State(app): State<AppState>,
    Caller(user): Caller,
    Path(board_id): Path<String>,
) -> Result<Json<BoardSnapshot>, AppError> {
    let coordinator = app.coordinator.clone();
    let snapshot = tokio::task::spawn_blocking(move || coordinator.snapshot(&user, &board_id))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(snapshot))
}

/// POST /api/board/{board_id}/move: commit one completed drag.
///
/// An unreadable body is a validation error like any other malformed intent.
/// The assignee notification runs detached, after the commit, so a slow
/// notifier never holds up the response.
pub async fn move_item(
    State(app): State<AppState>,
    Caller(user): Caller,
    Path(board_id): Path<String>,
    payload: Result<Json<MoveIntent>, JsonRejection>,
) -> Result<Json<MoveOutcome>, AppError> {
    let Json(intent) = payload.map_err(|e| BoardError::InvalidMove(e.body_text()))?;
    let coordinator = app.coordinator.clone();
    let board = board_id.clone();
    let outcome =
        tokio::task::spawn_blocking(move || coordinator.submit_move(&user, &board, &intent))
            .await
            .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    if outcome.lane_changed {
        let coordinator = app.coordinator.clone();
        let board = board_id.clone();
        let moved = outcome.clone();
        tokio::task::spawn_blocking(move || coordinator.notify_moved(&board, &moved));
    }

    if outcome.items_written > 0 {
        app.publish(BoardEvent {
            board_id,
            item_id: outcome.item.id.clone(),
        });
    }
    Ok(Json(outcome))
}
