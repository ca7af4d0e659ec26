use crate::board::Item;
use crate::error::{BoardError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// MoveIntent
// ---------------------------------------------------------------------------

/// One completed drag: the item that moved and the *entire* resulting order
/// of the destination lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub item_id: String,
    #[serde(default)]
    pub from_lane_id: String,
    #[serde(rename = "lane_id", alias = "to_lane_id")]
    pub to_lane_id: String,
    pub destination_ordered_item_ids: Vec<String>,
}

impl MoveIntent {
    pub fn new(
        item_id: impl Into<String>,
        from_lane_id: impl Into<String>,
        to_lane_id: impl Into<String>,
        destination_ordered_item_ids: Vec<String>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            from_lane_id: from_lane_id.into(),
            to_lane_id: to_lane_id.into(),
            destination_ordered_item_ids,
        }
    }

    pub fn changes_lane(&self) -> bool {
        self.from_lane_id != self.to_lane_id
    }

    /// Reject malformed intents before any authorization or storage work.
    pub fn validate(&self) -> Result<()> {
        if self.item_id.trim().is_empty() {
            return Err(BoardError::InvalidMove("missing item id".into()));
        }
        if self.to_lane_id.trim().is_empty() {
            return Err(BoardError::InvalidMove("missing destination lane".into()));
        }
        if self.destination_ordered_item_ids.is_empty() {
            return Err(BoardError::InvalidMove(
                "destination ordering is empty".into(),
            ));
        }
        let mut seen = HashSet::with_capacity(self.destination_ordered_item_ids.len());
        for id in &self.destination_ordered_item_ids {
            if !seen.insert(id.as_str()) {
                return Err(BoardError::InvalidMove(format!(
                    "item '{id}' appears twice in destination ordering"
                )));
            }
        }
        if !seen.contains(self.item_id.as_str()) {
            return Err(BoardError::InvalidMove(format!(
                "destination ordering does not contain moved item '{}'",
                self.item_id
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MoveOutcome
// ---------------------------------------------------------------------------

/// Receipt of a committed move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub item: Item,
    pub source_lane_id: String,
    pub destination_lane_id: String,
    pub lane_changed: bool,
    pub destination_order: Vec<String>,
    /// Number of item records rewritten; zero when the move was already applied.
    pub items_written: usize,
}
