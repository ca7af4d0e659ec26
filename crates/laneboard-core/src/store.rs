//! Authoritative board storage using redb.
//!
//! # Table design
//!
//! ```text
//! BOARDS  board_id              -> JSON Board
//! LANES   (board_id, lane_id)   -> JSON Lane
//! ITEMS   (board_id, item_id)   -> JSON Item
//! ```
//!
//! The tuple keys sort by board first, so one range scan starting at
//! `(board_id, "")` yields every lane or item of a board.
//!
//! A move is committed in a single write transaction. redb admits one writer
//! at a time and readers see the last committed state, so concurrent commits
//! touching the same lane are serialized by the storage engine and no reader
//! can observe a half-renumbered lane.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::board::{Board, BoardSnapshot, Item, Lane};
use crate::error::{storage, BoardError, Result};
use crate::intent::{MoveIntent, MoveOutcome};
use crate::paths;
use crate::reorder;

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

const BOARDS: TableDefinition<&str, &[u8]> = TableDefinition::new("boards");
const LANES: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("lanes");
const ITEMS: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("items");

/// Decode every record belonging to `board_id` from a `(board, id)` table.
fn scan_board<T, R>(table: &T, board_id: &str) -> Result<Vec<R>>
where
    T: ReadableTable<(&'static str, &'static str), &'static [u8]>,
    R: DeserializeOwned,
{
    let mut out = Vec::new();
    for entry in table.range((board_id, "")..).map_err(storage)? {
        let (key, value) = entry.map_err(storage)?;
        if key.value().0 != board_id {
            break;
        }
        out.push(serde_json::from_slice(value.value())?);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// NewItem
// ---------------------------------------------------------------------------

/// Input to the item-creation flow used by seeding and tests.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub id: String,
    pub lane_id: String,
    pub key: String,
    pub title: String,
    pub assignee_id: Option<String>,
}

impl NewItem {
    pub fn new(
        lane_id: impl Into<String>,
        key: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            lane_id: lane_id.into(),
            key: key.into(),
            title: title.into(),
            assignee_id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn assigned_to(mut self, user_id: impl Into<String>) -> Self {
        self.assignee_id = Some(user_id.into());
        self
    }
}

// ---------------------------------------------------------------------------
// BoardStore
// ---------------------------------------------------------------------------

/// The single writer of board state.
pub struct BoardStore {
    db: Database,
}

impl BoardStore {
    /// Open or create the database at `path`, creating all tables.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::create(path).map_err(storage)?;
        let wt = db.begin_write().map_err(storage)?;
        wt.open_table(BOARDS).map_err(storage)?;
        wt.open_table(LANES).map_err(storage)?;
        wt.open_table(ITEMS).map_err(storage)?;
        wt.commit().map_err(storage)?;
        Ok(Self { db })
    }

    /// Run `f` inside one write transaction; commit on `Ok`, abort on `Err`.
    fn write<T>(&self, f: impl FnOnce(&WriteTransaction) -> Result<T>) -> Result<T> {
        let wt = self.db.begin_write().map_err(storage)?;
        match f(&wt) {
            Ok(value) => {
                wt.commit().map_err(storage)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = wt.abort() {
                    tracing::warn!("abort after failed write: {abort_err}");
                }
                Err(e)
            }
        }
    }

    fn require_board(wt: &WriteTransaction, board_id: &str) -> Result<()> {
        let boards = wt.open_table(BOARDS).map_err(storage)?;
        if boards.get(board_id).map_err(storage)?.is_none() {
            return Err(BoardError::BoardNotFound(board_id.to_string()));
        }
        Ok(())
    }

    fn require_lane(wt: &WriteTransaction, board_id: &str, lane_id: &str) -> Result<()> {
        let lanes = wt.open_table(LANES).map_err(storage)?;
        if lanes.get((board_id, lane_id)).map_err(storage)?.is_none() {
            return Err(BoardError::LaneNotFound(lane_id.to_string()));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Boards and lanes (administrative)
    // -----------------------------------------------------------------------

    pub fn create_board(&self, board: &Board) -> Result<()> {
        paths::validate_id(&board.id)?;
        let value = serde_json::to_vec(board)?;
        self.write(|wt| {
            let mut boards = wt.open_table(BOARDS).map_err(storage)?;
            if boards.get(board.id.as_str()).map_err(storage)?.is_some() {
                return Err(BoardError::BoardExists(board.id.clone()));
            }
            boards
                .insert(board.id.as_str(), value.as_slice())
                .map_err(storage)?;
            Ok(())
        })
    }

    pub fn get_board(&self, board_id: &str) -> Result<Board> {
        let rt = self.db.begin_read().map_err(storage)?;
        let boards = rt.open_table(BOARDS).map_err(storage)?;
        let guard = boards
            .get(board_id)
            .map_err(storage)?
            .ok_or_else(|| BoardError::BoardNotFound(board_id.to_string()))?;
        Ok(serde_json::from_slice(guard.value())?)
    }

    pub fn list_boards(&self) -> Result<Vec<Board>> {
        let rt = self.db.begin_read().map_err(storage)?;
        let boards = rt.open_table(BOARDS).map_err(storage)?;
        let mut result = Vec::new();
        for entry in boards.iter().map_err(storage)? {
            let (_, v) = entry.map_err(storage)?;
            result.push(serde_json::from_slice::<Board>(v.value())?);
        }
        Ok(result)
    }

    /// Insert or replace a lane on an existing board.
    pub fn put_lane(&self, board_id: &str, lane: &Lane) -> Result<()> {
        paths::validate_id(&lane.id)?;
        let value = serde_json::to_vec(lane)?;
        self.write(|wt| {
            Self::require_board(wt, board_id)?;
            let mut lanes = wt.open_table(LANES).map_err(storage)?;
            lanes
                .insert((board_id, lane.id.as_str()), value.as_slice())
                .map_err(storage)?;
            Ok(())
        })
    }

    pub fn get_lane(&self, board_id: &str, lane_id: &str) -> Result<Lane> {
        let rt = self.db.begin_read().map_err(storage)?;
        let lanes = rt.open_table(LANES).map_err(storage)?;
        let guard = lanes
            .get((board_id, lane_id))
            .map_err(storage)?
            .ok_or_else(|| BoardError::LaneNotFound(lane_id.to_string()))?;
        Ok(serde_json::from_slice(guard.value())?)
    }

    /// Create an item at the end of its lane.
    ///
    /// Counting the lane and inserting happen in the same transaction, so
    /// concurrent creations cannot both claim the same position.
    pub fn create_item(&self, board_id: &str, new: NewItem) -> Result<Item> {
        self.write(|wt| {
            Self::require_board(wt, board_id)?;
            Self::require_lane(wt, board_id, &new.lane_id)?;
            let mut items = wt.open_table(ITEMS).map_err(storage)?;
            if items
                .get((board_id, new.id.as_str()))
                .map_err(storage)?
                .is_some()
            {
                return Err(BoardError::ItemExists(new.id.clone()));
            }
            let existing: Vec<Item> = scan_board(&items, board_id)?;
            let position = existing.iter().filter(|i| i.lane_id == new.lane_id).count() as u32;

            let item = Item {
                id: new.id,
                lane_id: new.lane_id,
                position,
                key: new.key,
                title: new.title,
                assignee_id: new.assignee_id,
            };
            let value = serde_json::to_vec(&item)?;
            items
                .insert((board_id, item.id.as_str()), value.as_slice())
                .map_err(storage)?;
            Ok(item)
        })
    }

    // -----------------------------------------------------------------------
    // Snapshot and move
    // -----------------------------------------------------------------------

    /// Read a board's lanes and items from one consistent read transaction.
    pub fn snapshot(&self, board_id: &str) -> Result<BoardSnapshot> {
        let rt = self.db.begin_read().map_err(storage)?;
        {
            let boards = rt.open_table(BOARDS).map_err(storage)?;
            if boards.get(board_id).map_err(storage)?.is_none() {
                return Err(BoardError::BoardNotFound(board_id.to_string()));
            }
        }
        let lanes: Vec<Lane> = scan_board(&rt.open_table(LANES).map_err(storage)?, board_id)?;
        let items: Vec<Item> = scan_board(&rt.open_table(ITEMS).map_err(storage)?, board_id)?;
        Ok(BoardSnapshot::new(lanes, items))
    }

    /// Apply a Move Intent as one all-or-nothing transaction.
    ///
    /// Callers are expected to have validated the intent's shape already;
    /// this checks it against stored state and rewrites only the records
    /// whose lane or position change.
    pub fn commit_move(&self, board_id: &str, intent: &MoveIntent) -> Result<MoveOutcome> {
        self.write(|wt| {
            Self::require_board(wt, board_id)?;
            Self::require_lane(wt, board_id, &intent.to_lane_id)?;

            let mut table = wt.open_table(ITEMS).map_err(storage)?;
            let items: Vec<Item> = scan_board(&table, board_id)?;
            let plan = reorder::plan_move(&items, intent)?;

            for item in &plan.writes {
                let value = serde_json::to_vec(item)?;
                table
                    .insert((board_id, item.id.as_str()), value.as_slice())
                    .map_err(storage)?;
            }
            Ok(plan.outcome)
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::testing::demo_store;
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn lane_ids(snap: &BoardSnapshot, lane: &str) -> Vec<String> {
        snap.lane_items(lane).map(|i| i.id.clone()).collect()
    }

    #[test]
    fn created_items_append_to_their_lane() {
        let (_dir, store) = demo_store();
        let snap = store.snapshot("demo").unwrap();
        assert_eq!(lane_ids(&snap, "todo"), ids(&["x", "y", "z"]));
        let positions: Vec<u32> = snap.lane_items("todo").map(|i| i.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        snap.verify_positions().unwrap();
    }

    #[test]
    fn reorder_within_lane_commits() {
        let (_dir, store) = demo_store();
        let intent = MoveIntent::new("x", "todo", "todo", ids(&["y", "z", "x"]));
        let outcome = store.commit_move("demo", &intent).unwrap();
        assert_eq!(outcome.items_written, 3);

        let snap = store.snapshot("demo").unwrap();
        assert_eq!(snap.item("y").unwrap().position, 0);
        assert_eq!(snap.item("z").unwrap().position, 1);
        assert_eq!(snap.item("x").unwrap().position, 2);
        assert_eq!(snap.item("x").unwrap().lane_id, "todo");
    }

    #[test]
    fn move_to_empty_lane_renumbers_source() {
        let (_dir, store) = demo_store();
        let intent = MoveIntent::new("x", "todo", "done", ids(&["x"]));
        store.commit_move("demo", &intent).unwrap();

        let snap = store.snapshot("demo").unwrap();
        assert_eq!(snap.item("x").unwrap().lane_id, "done");
        assert_eq!(snap.item("x").unwrap().position, 0);
        assert_eq!(lane_ids(&snap, "todo"), ids(&["y", "z"]));
        snap.verify_positions().unwrap();
    }

    #[test]
    fn resubmitting_an_intent_changes_nothing() {
        let (_dir, store) = demo_store();
        let intent = MoveIntent::new("x", "todo", "done", ids(&["x"]));
        store.commit_move("demo", &intent).unwrap();
        let first = store.snapshot("demo").unwrap();

        let again = store.commit_move("demo", &intent).unwrap();
        assert_eq!(again.items_written, 0);
        assert_eq!(store.snapshot("demo").unwrap(), first);
    }

    #[test]
    fn failed_commit_leaves_storage_untouched() {
        let (_dir, store) = demo_store();
        let before = store.snapshot("demo").unwrap();

        let intent = MoveIntent::new("x", "todo", "done", ids(&["x", "ghost"]));
        let err = store.commit_move("demo", &intent).unwrap_err();
        assert!(matches!(err, BoardError::ItemNotFound(_)));
        assert_eq!(store.snapshot("demo").unwrap(), before);
    }

    #[test]
    fn unknown_lane_and_board_are_not_found() {
        let (_dir, store) = demo_store();
        let intent = MoveIntent::new("x", "todo", "archive", ids(&["x"]));
        assert!(matches!(
            store.commit_move("demo", &intent),
            Err(BoardError::LaneNotFound(_))
        ));
        assert!(matches!(
            store.snapshot("nope"),
            Err(BoardError::BoardNotFound(_))
        ));
    }

    #[test]
    fn lanes_are_scoped_to_their_board() {
        let (_dir, store) = demo_store();
        store.create_board(&Board::new("other", "Other")).unwrap();
        // "todo" exists on demo but not on other.
        assert!(matches!(
            store.get_lane("other", "todo"),
            Err(BoardError::LaneNotFound(_))
        ));
        assert!(store.snapshot("other").unwrap().items.is_empty());
    }

    #[test]
    fn duplicate_board_is_rejected() {
        let (_dir, store) = demo_store();
        assert!(matches!(
            store.create_board(&Board::new("demo", "Again")),
            Err(BoardError::BoardExists(_))
        ));
        assert_eq!(store.list_boards().unwrap().len(), 1);
    }

    #[test]
    fn invariant_holds_across_a_sequence_of_moves() {
        let (_dir, store) = demo_store();
        let moves = [
            MoveIntent::new("x", "todo", "doing", ids(&["x"])),
            MoveIntent::new("z", "todo", "doing", ids(&["z", "x"])),
            MoveIntent::new("y", "todo", "done", ids(&["y"])),
            MoveIntent::new("x", "doing", "done", ids(&["y", "x"])),
            MoveIntent::new("z", "doing", "todo", ids(&["z"])),
        ];
        for intent in &moves {
            store.commit_move("demo", intent).unwrap();
            store.snapshot("demo").unwrap().verify_positions().unwrap();
        }
        let snap = store.snapshot("demo").unwrap();
        assert_eq!(lane_ids(&snap, "done"), ids(&["y", "x"]));
        assert_eq!(lane_ids(&snap, "todo"), ids(&["z"]));
        assert!(lane_ids(&snap, "doing").is_empty());
    }
}
