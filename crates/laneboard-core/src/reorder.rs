//! Turns a Move Intent into the exact set of item records to rewrite.
//!
//! The plan is computed from the items as they are stored *inside* the commit
//! transaction, so a client's view of the lane may be stale. The destination
//! order follows the intent ("last full order wins"), but lane membership
//! follows storage: only the moved item changes lane, ids that have since
//! left the destination lane are dropped, and members the client did not
//! know about are appended. The result always leaves every touched lane at
//! `0..count`.

use crate::board::{check_contiguous, Item};
use crate::error::{BoardError, Result};
use crate::intent::{MoveIntent, MoveOutcome};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    /// Records whose lane or position differ from storage, in write order.
    pub writes: Vec<Item>,
    pub outcome: MoveOutcome,
}

fn by_position(a: &&Item, b: &&Item) -> std::cmp::Ordering {
    (a.position, &a.id).cmp(&(b.position, &b.id))
}

/// Plan a move against `items`, every stored item of one board.
pub fn plan_move(items: &[Item], intent: &MoveIntent) -> Result<MovePlan> {
    let by_id: HashMap<&str, &Item> = items.iter().map(|i| (i.id.as_str(), i)).collect();

    let moved = *by_id
        .get(intent.item_id.as_str())
        .ok_or_else(|| BoardError::ItemNotFound(intent.item_id.clone()))?;
    if let Some(missing) = intent
        .destination_ordered_item_ids
        .iter()
        .find(|id| !by_id.contains_key(id.as_str()))
    {
        return Err(BoardError::ItemNotFound(missing.clone()));
    }

    let dest = intent.to_lane_id.as_str();
    let source = moved.lane_id.as_str();

    let mut order: Vec<&Item> = Vec::with_capacity(intent.destination_ordered_item_ids.len());
    let mut placed: HashSet<&str> = HashSet::new();
    for id in &intent.destination_ordered_item_ids {
        let item = by_id[id.as_str()];
        if item.id == moved.id || item.lane_id == dest {
            order.push(item);
            placed.insert(item.id.as_str());
        } else {
            tracing::debug!(
                item = %item.id,
                lane = %item.lane_id,
                "dropping item that left the destination lane"
            );
        }
    }
    let mut unlisted: Vec<&Item> = items
        .iter()
        .filter(|i| i.lane_id == dest && !placed.contains(i.id.as_str()))
        .collect();
    unlisted.sort_by(by_position);
    order.extend(unlisted);

    let mut targets: Vec<(&Item, &str, u32)> = order
        .iter()
        .enumerate()
        .map(|(pos, item)| (*item, dest, pos as u32))
        .collect();

    if source != dest {
        let mut remaining: Vec<&Item> = items
            .iter()
            .filter(|i| i.lane_id == source && i.id != moved.id)
            .collect();
        remaining.sort_by(by_position);
        targets.extend(
            remaining
                .into_iter()
                .enumerate()
                .map(|(pos, item)| (item, source, pos as u32)),
        );
    }

    let writes: Vec<Item> = targets
        .iter()
        .filter(|(item, lane, pos)| item.lane_id != *lane || item.position != *pos)
        .map(|(item, lane, pos)| Item {
            lane_id: lane.to_string(),
            position: *pos,
            ..(*item).clone()
        })
        .collect();

    verify_plan(items, &writes, &[dest, source])?;

    let moved_after = targets
        .iter()
        .find(|(item, _, _)| item.id == moved.id)
        .map(|(item, lane, pos)| Item {
            lane_id: lane.to_string(),
            position: *pos,
            ..(*item).clone()
        })
        .ok_or_else(|| BoardError::ItemNotFound(moved.id.clone()))?;

    let outcome = MoveOutcome {
        item: moved_after,
        source_lane_id: source.to_string(),
        destination_lane_id: dest.to_string(),
        lane_changed: source != dest,
        destination_order: order.iter().map(|i| i.id.clone()).collect(),
        items_written: writes.len(),
    };

    Ok(MovePlan { writes, outcome })
}

/// Re-check the touched lanes as they will look after `writes` land.
fn verify_plan(items: &[Item], writes: &[Item], lanes: &[&str]) -> Result<()> {
    let written: HashMap<&str, &Item> = writes.iter().map(|i| (i.id.as_str(), i)).collect();
    for lane in lanes {
        let positions: Vec<u32> = items
            .iter()
            .map(|i| written.get(i.id.as_str()).copied().unwrap_or(i))
            .filter(|i| i.lane_id == *lane)
            .map(|i| i.position)
            .collect();
        check_contiguous(lane, positions)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fixtures::item;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn todo_xyz() -> Vec<Item> {
        vec![item("x", "todo", 0), item("y", "todo", 1), item("z", "todo", 2)]
    }

    fn after(items: &[Item], plan: &MovePlan) -> Vec<Item> {
        items
            .iter()
            .map(|i| {
                plan.writes
                    .iter()
                    .find(|w| w.id == i.id)
                    .cloned()
                    .unwrap_or_else(|| i.clone())
            })
            .collect()
    }

    fn pos(items: &[Item], id: &str) -> (String, u32) {
        let i = items.iter().find(|i| i.id == id).unwrap();
        (i.lane_id.clone(), i.position)
    }

    #[test]
    fn reorder_within_lane() {
        let items = todo_xyz();
        let intent = MoveIntent::new("x", "todo", "todo", ids(&["y", "z", "x"]));
        let plan = plan_move(&items, &intent).unwrap();
        let next = after(&items, &plan);

        assert_eq!(pos(&next, "y"), ("todo".into(), 0));
        assert_eq!(pos(&next, "z"), ("todo".into(), 1));
        assert_eq!(pos(&next, "x"), ("todo".into(), 2));
        assert!(!plan.outcome.lane_changed);
        assert_eq!(plan.outcome.items_written, 3);
    }

    #[test]
    fn move_to_empty_lane_closes_the_gap() {
        let items = todo_xyz();
        let intent = MoveIntent::new("x", "todo", "done", ids(&["x"]));
        let plan = plan_move(&items, &intent).unwrap();
        let next = after(&items, &plan);

        assert_eq!(pos(&next, "x"), ("done".into(), 0));
        assert_eq!(pos(&next, "y"), ("todo".into(), 0));
        assert_eq!(pos(&next, "z"), ("todo".into(), 1));
        assert!(plan.outcome.lane_changed);
        assert_eq!(plan.outcome.source_lane_id, "todo");
    }

    #[test]
    fn already_applied_intent_writes_nothing() {
        let items = vec![item("y", "todo", 0), item("z", "todo", 1), item("x", "todo", 2)];
        let intent = MoveIntent::new("x", "todo", "todo", ids(&["y", "z", "x"]));
        let plan = plan_move(&items, &intent).unwrap();
        assert!(plan.writes.is_empty());
        assert_eq!(plan.outcome.items_written, 0);
    }

    #[test]
    fn stale_foreign_ids_are_dropped() {
        // Client still thinks "y" lives in todo, but it has moved to done.
        let items = vec![item("x", "todo", 0), item("z", "todo", 1), item("y", "done", 0)];
        let intent = MoveIntent::new("x", "todo", "todo", ids(&["y", "z", "x"]));
        let plan = plan_move(&items, &intent).unwrap();
        let next = after(&items, &plan);

        assert_eq!(plan.outcome.destination_order, ids(&["z", "x"]));
        assert_eq!(pos(&next, "y"), ("done".into(), 0));
        assert_eq!(pos(&next, "z"), ("todo".into(), 0));
        assert_eq!(pos(&next, "x"), ("todo".into(), 1));
    }

    #[test]
    fn unlisted_members_are_appended() {
        // "w" arrived in done after the client built its ordering.
        let items = vec![item("x", "todo", 0), item("d", "done", 0), item("w", "done", 1)];
        let intent = MoveIntent::new("x", "todo", "done", ids(&["x", "d"]));
        let plan = plan_move(&items, &intent).unwrap();
        let next = after(&items, &plan);

        assert_eq!(plan.outcome.destination_order, ids(&["x", "d", "w"]));
        assert_eq!(pos(&next, "w"), ("done".into(), 2));
    }

    #[test]
    fn unknown_item_is_not_found() {
        let items = todo_xyz();
        let intent = MoveIntent::new("x", "todo", "todo", ids(&["x", "ghost"]));
        let err = plan_move(&items, &intent).unwrap_err();
        assert!(matches!(err, BoardError::ItemNotFound(ref id) if id == "ghost"));

        let intent = MoveIntent::new("ghost", "todo", "todo", ids(&["ghost"]));
        assert!(matches!(
            plan_move(&items, &intent),
            Err(BoardError::ItemNotFound(_))
        ));
    }

    #[test]
    fn source_lane_from_storage_wins_over_intent() {
        // Intent claims the item came from "doing" but storage says "todo".
        let items = todo_xyz();
        let intent = MoveIntent::new("y", "doing", "done", ids(&["y"]));
        let plan = plan_move(&items, &intent).unwrap();
        let next = after(&items, &plan);

        assert_eq!(plan.outcome.source_lane_id, "todo");
        assert_eq!(pos(&next, "x"), ("todo".into(), 0));
        assert_eq!(pos(&next, "z"), ("todo".into(), 1));
    }

    #[test]
    fn damaged_destination_lane_is_repaired() {
        let items = vec![item("a", "todo", 0), item("b", "todo", 0), item("c", "todo", 5)];
        let intent = MoveIntent::new("c", "todo", "todo", ids(&["c", "a", "b"]));
        let plan = plan_move(&items, &intent).unwrap();
        let next = after(&items, &plan);
        crate::board::BoardSnapshot::new(vec![], next)
            .verify_positions()
            .unwrap();
    }
}
