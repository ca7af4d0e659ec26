use std::path::Path;
use std::sync::Arc;

use laneboard_core::access::{authorizer_from_config, TracingNotifier};
use laneboard_core::config::Config;
use laneboard_core::coordinator::PersistenceCoordinator;
use laneboard_core::store::BoardStore;
use serde::Serialize;
use tokio::sync::broadcast;

/// Broadcast after every committed move.
#[derive(Debug, Clone, Serialize)]
pub struct BoardEvent {
    pub board_id: String,
    pub item_id: String,
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: PersistenceCoordinator,
    pub event_tx: broadcast::Sender<BoardEvent>,
}

impl AppState {
    pub fn new(coordinator: PersistenceCoordinator) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            coordinator,
            event_tx,
        }
    }

    /// Open the project's board database and access policy.
    pub fn open(root: &Path, config: &Config) -> laneboard_core::Result<Self> {
        let store = BoardStore::open(&config.db_path(root))?;
        let coordinator = PersistenceCoordinator::new(
            Arc::new(store),
            authorizer_from_config(&config.access),
            Arc::new(TracingNotifier),
        );
        Ok(Self::new(coordinator))
    }

    pub(crate) fn publish(&self, event: BoardEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_database_at_configured_path() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        let state = AppState::open(dir.path(), &config).unwrap();
        assert!(config.db_path(dir.path()).exists());
        assert!(state.coordinator.store().list_boards().unwrap().is_empty());
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let dir = TempDir::new().unwrap();
        let state = AppState::open(dir.path(), &Config::default()).unwrap();
        state.publish(BoardEvent {
            board_id: "demo".into(),
            item_id: "x".into(),
        });
        let mut rx = state.event_tx.subscribe();
        assert!(rx.try_recv().is_err());
    }
}
