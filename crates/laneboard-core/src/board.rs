use crate::error::{BoardError, Result};
use crate::types::LaneCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Board / Lane / Item
// ---------------------------------------------------------------------------

/// Aggregate root: every lane and item belongs to exactly one board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Board {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lane {
    pub id: String,
    pub name: String,
    pub display_order: u32,
    pub category: LaneCategory,
}

impl Lane {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        display_order: u32,
        category: LaneCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            display_order,
            category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub lane_id: String,
    pub position: u32,
    pub key: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
}

// ---------------------------------------------------------------------------
// BoardSnapshot
// ---------------------------------------------------------------------------

/// The unit exchanged between the authoritative store and clients.
///
/// Equality is structural. Snapshots produced by the store are in canonical
/// order (lanes by display order, items by position) so two reads of an
/// unchanged board compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub lanes: Vec<Lane>,
    pub items: Vec<Item>,
}

impl BoardSnapshot {
    pub fn new(mut lanes: Vec<Lane>, mut items: Vec<Item>) -> Self {
        lanes.sort_by(|a, b| (a.display_order, &a.id).cmp(&(b.display_order, &b.id)));
        items.sort_by(|a, b| (a.position, &a.id).cmp(&(b.position, &b.id)));
        Self { lanes, items }
    }

    pub fn lane(&self, lane_id: &str) -> Option<&Lane> {
        self.lanes.iter().find(|l| l.id == lane_id)
    }

    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Items of one lane in array order, which is the rendered order.
    pub fn lane_items<'a>(&'a self, lane_id: &'a str) -> impl Iterator<Item = &'a Item> + 'a {
        self.items.iter().filter(move |i| i.lane_id == lane_id)
    }

    /// Check that every lane's positions are exactly `0..count`.
    pub fn verify_positions(&self) -> Result<()> {
        let mut by_lane: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
        for item in &self.items {
            by_lane.entry(&item.lane_id).or_default().push(item.position);
        }
        for (lane, positions) in by_lane {
            check_contiguous(lane, positions)?;
        }
        Ok(())
    }
}

/// Verify a single lane's positions form `0..positions.len()` with no
/// duplicates and no gaps.
pub fn check_contiguous(lane_id: &str, mut positions: Vec<u32>) -> Result<()> {
    positions.sort_unstable();
    for (expected, actual) in positions.iter().enumerate() {
        if *actual as usize != expected {
            let detail = if expected > 0 && positions[expected - 1] == *actual {
                format!("duplicate position {actual}")
            } else {
                format!("expected position {expected}, found {actual}")
            };
            return Err(BoardError::Inconsistent {
                lane: lane_id.to_string(),
                detail,
            });
        }
    }
    Ok(())
}
