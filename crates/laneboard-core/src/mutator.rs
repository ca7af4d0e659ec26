//! Optimistic re-arrangement of a client's local item list during a drag.
//!
//! Runs on every pointer-move frame, so every operation here is a single
//! linear pass over the board's items. Nothing here touches the network or
//! the shared store.

use crate::board::Item;
use serde::{Deserialize, Serialize};

/// What the pointer is currently over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DragTarget {
    Item(String),
    Lane(String),
}

/// Stable array move: remove the element at `from` and reinsert it at `to`.
///
/// Both indices are clamped to the vector bounds.
pub fn array_move<T>(v: &mut Vec<T>, from: usize, to: usize) {
    if v.is_empty() {
        return;
    }
    let from = from.min(v.len() - 1);
    let elem = v.remove(from);
    let to = to.min(v.len());
    v.insert(to, elem);
}

/// Apply one drag-over frame to `items`.
///
/// Returns `None` when the frame changes nothing (no target, dragging onto
/// itself, unknown ids, or hovering the lane the item is already in), so the
/// caller can keep the arrangement it already holds.
pub fn apply_drag(items: &[Item], active_id: &str, over: Option<&DragTarget>) -> Option<Vec<Item>> {
    let over = over?;
    let active_idx = items.iter().position(|i| i.id == active_id)?;

    match over {
        DragTarget::Item(over_id) => {
            if over_id == active_id {
                return None;
            }
            let over_idx = items.iter().position(|i| &i.id == over_id)?;
            let target_lane = &items[over_idx].lane_id;
            let mut next = items.to_vec();

            if items[active_idx].lane_id == *target_lane {
                array_move(&mut next, active_idx, over_idx);
            } else {
                next[active_idx].lane_id = target_lane.clone();
                let moved = next.remove(active_idx);
                // Lane change: land immediately before the hovered item.
                let before = if active_idx < over_idx {
                    over_idx - 1
                } else {
                    over_idx
                };
                next.insert(before, moved);
            }
            Some(next)
        }
        DragTarget::Lane(lane_id) => {
            if items[active_idx].lane_id == *lane_id {
                return None;
            }
            let mut next = items.to_vec();
            next[active_idx].lane_id = lane_id.clone();
            Some(next)
        }
    }
}

/// Ids of one lane's items in array order.
pub fn lane_order(items: &[Item], lane_id: &str) -> Vec<String> {
    items
        .iter()
        .filter(|i| i.lane_id == lane_id)
        .map(|i| i.id.clone())
        .collect()
}
