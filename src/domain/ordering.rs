//! Position bookkeeping for ordered lanes (cards within a column, columns within
//! a board).
//!
//! Every routine works on an in-memory list, mutates it into its new display
//! order and reports the rows whose stored `position` (or lane) must change.
//! After any routine returns, the positions of the list are exactly `0..len`.

use serde::{Deserialize, Serialize};

pub trait Positioned {
    fn id(&self) -> &str;
    fn position(&self) -> i64;
    fn set_position(&mut self, position: i64);
}

/// A single row write: the item `id` now sits at `position`, and in `lane` if
/// it changed lanes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionChange {
    pub id: String,
    pub position: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lane: Option<String>,
}

impl PositionChange {
    fn new(id: &str, position: i64) -> Self {
        Self {
            id: id.to_string(),
            position,
            lane: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderingError {
    #[error("item {0} is not in this lane")]
    NotFound(String),
}

/// Id and position only. Services load these instead of full rows when all
/// they need is to recompute an order.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Slot {
    pub id: String,
    pub position: i64,
}

impl Positioned for Slot {
    fn id(&self) -> &str {
        &self.id
    }

    fn position(&self) -> i64 {
        self.position
    }

    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}

/// Display order. Duplicate positions fall back to id order so legacy rows
/// still sort deterministically.
pub fn sort_by_position<T: Positioned>(items: &mut [T]) {
    items.sort_by(|a, b| {
        a.position()
            .cmp(&b.position())
            .then_with(|| a.id().cmp(b.id()))
    });
}

pub fn next_position<T: Positioned>(items: &[T]) -> i64 {
    items.len() as i64
}

/// Sorts, then closes gaps and duplicates.
pub fn resequence<T: Positioned>(items: &mut [T]) -> Vec<PositionChange> {
    sort_by_position(items);
    renumber(items)
}

/// Moves `id` to `to_index` within the same lane. Indexes past the end put the
/// item last.
pub fn reorder<T: Positioned>(
    items: &mut Vec<T>,
    id: &str,
    to_index: usize,
) -> Result<Vec<PositionChange>, OrderingError> {
    sort_by_position(items);
    let from = index_of(items, id)?;
    let item = items.remove(from);
    let to = to_index.min(items.len());
    items.insert(to, item);
    Ok(renumber(items))
}

/// Moves `id` out of `source` and into `target` at `to_index` (`None` appends).
///
/// The change for the moved item always carries `target_lane`, even when its
/// numeric position happens to stay the same.
pub fn transfer<T: Positioned>(
    source: &mut Vec<T>,
    target: &mut Vec<T>,
    id: &str,
    to_index: Option<usize>,
    target_lane: &str,
) -> Result<Vec<PositionChange>, OrderingError> {
    sort_by_position(source);
    sort_by_position(target);

    let from = index_of(source, id)?;
    let item = source.remove(from);
    let mut changes = renumber(source);

    let to = to_index.map_or(target.len(), |index| index.min(target.len()));
    target.insert(to, item);
    let mut target_changes = renumber(target);

    match target_changes.iter_mut().find(|change| change.id == id) {
        Some(change) => change.lane = Some(target_lane.to_string()),
        None => target_changes.push(PositionChange {
            id: id.to_string(),
            position: to as i64,
            lane: Some(target_lane.to_string()),
        }),
    }

    changes.append(&mut target_changes);
    Ok(changes)
}

/// Inserts `item` at `index` (`None` appends). The returned changes include
/// the inserted item whenever its position had to be rewritten.
pub fn insert_at<T: Positioned>(
    items: &mut Vec<T>,
    item: T,
    index: Option<usize>,
) -> Vec<PositionChange> {
    sort_by_position(items);
    let to = index.map_or(items.len(), |index| index.min(items.len()));
    items.insert(to, item);
    renumber(items)
}

/// Removes `id` and closes the gap it leaves.
pub fn remove<T: Positioned>(
    items: &mut Vec<T>,
    id: &str,
) -> Result<(T, Vec<PositionChange>), OrderingError> {
    sort_by_position(items);
    let from = index_of(items, id)?;
    let item = items.remove(from);
    Ok((item, renumber(items)))
}

fn index_of<T: Positioned>(items: &[T], id: &str) -> Result<usize, OrderingError> {
    items
        .iter()
        .position(|item| item.id() == id)
        .ok_or_else(|| OrderingError::NotFound(id.to_string()))
}

fn renumber<T: Positioned>(items: &mut [T]) -> Vec<PositionChange> {
    items
        .iter_mut()
        .enumerate()
        .filter_map(|(index, item)| {
            let position = index as i64;
            if item.position() == position {
                return None;
            }
            item.set_position(position);
            Some(PositionChange::new(item.id(), position))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lane(ids: &[&str]) -> Vec<Slot> {
        ids.iter()
            .enumerate()
            .map(|(index, id)| Slot {
                id: id.to_string(),
                position: index as i64,
            })
            .collect()
    }

    fn ids(items: &[Slot]) -> Vec<&str> {
        items.iter().map(|slot| slot.id.as_str()).collect()
    }

    fn assert_contiguous(items: &[Slot]) {
        for (index, slot) in items.iter().enumerate() {
            assert_eq!(slot.position, index as i64, "slot {} out of place", slot.id);
        }
    }

    #[test]
    fn resequence_closes_gaps_and_breaks_ties_by_id() {
        let mut items = vec![
            Slot { id: "c".into(), position: 7 },
            Slot { id: "b".into(), position: 3 },
            Slot { id: "a".into(), position: 3 },
            Slot { id: "d".into(), position: -2 },
        ];

        let changes = resequence(&mut items);

        assert_eq!(ids(&items), vec!["d", "a", "b", "c"]);
        assert_contiguous(&items);
        assert_eq!(changes.len(), 4);
    }

    #[test]
    fn resequence_of_clean_lane_is_a_no_op() {
        let mut items = lane(&["a", "b", "c"]);
        assert!(resequence(&mut items).is_empty());
    }

    #[test]
    fn reorder_moves_down_and_reports_only_shifted_items() {
        let mut items = lane(&["a", "b", "c", "d"]);

        let changes = reorder(&mut items, "a", 2).unwrap();

        assert_eq!(ids(&items), vec!["b", "c", "a", "d"]);
        assert_contiguous(&items);
        let changed: Vec<&str> = changes.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(changed, vec!["b", "c", "a"]);
        assert!(changes.iter().all(|c| c.lane.is_none()));
    }

    #[test]
    fn reorder_moves_up() {
        let mut items = lane(&["a", "b", "c", "d"]);

        reorder(&mut items, "d", 1).unwrap();

        assert_eq!(ids(&items), vec!["a", "d", "b", "c"]);
        assert_contiguous(&items);
    }

    #[test]
    fn reorder_past_the_end_puts_item_last() {
        let mut items = lane(&["a", "b", "c"]);

        reorder(&mut items, "a", 99).unwrap();

        assert_eq!(ids(&items), vec!["b", "c", "a"]);
    }

    #[test]
    fn reorder_to_same_index_changes_nothing() {
        let mut items = lane(&["a", "b", "c"]);
        assert!(reorder(&mut items, "b", 1).unwrap().is_empty());
    }

    #[test]
    fn reorder_unknown_id_fails() {
        let mut items = lane(&["a"]);
        assert_eq!(
            reorder(&mut items, "zz", 0),
            Err(OrderingError::NotFound("zz".into()))
        );
    }

    #[test]
    fn transfer_appends_by_default_and_renumbers_both_lanes() {
        let mut source = lane(&["a", "b", "c"]);
        let mut target = lane(&["x", "y"]);

        let changes = transfer(&mut source, &mut target, "a", None, "col-2").unwrap();

        assert_eq!(ids(&source), vec!["b", "c"]);
        assert_eq!(ids(&target), vec!["x", "y", "a"]);
        assert_contiguous(&source);
        assert_contiguous(&target);

        let moved = changes.iter().find(|c| c.id == "a").unwrap();
        assert_eq!(moved.position, 2);
        assert_eq!(moved.lane.as_deref(), Some("col-2"));
    }

    #[test]
    fn transfer_at_index_shifts_target_items() {
        let mut source = lane(&["a", "b"]);
        let mut target = lane(&["x", "y"]);

        let changes = transfer(&mut source, &mut target, "b", Some(0), "col-2").unwrap();

        assert_eq!(ids(&target), vec!["b", "x", "y"]);
        assert_contiguous(&target);
        // "b" keeps no numeric slot from the source; "x" and "y" shift down.
        let changed: Vec<&str> = changes.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(changed, vec!["b", "x", "y"]);
    }

    #[test]
    fn transfer_keeps_lane_change_when_position_is_unchanged() {
        let mut source = lane(&["a"]);
        let mut target: Vec<Slot> = Vec::new();

        let changes = transfer(&mut source, &mut target, "a", None, "empty").unwrap();

        assert!(source.is_empty());
        assert_eq!(
            changes,
            vec![PositionChange {
                id: "a".into(),
                position: 0,
                lane: Some("empty".into()),
            }]
        );
    }

    #[test]
    fn transfer_unknown_id_leaves_lanes_untouched() {
        let mut source = lane(&["a"]);
        let mut target = lane(&["x"]);

        assert!(transfer(&mut source, &mut target, "nope", None, "t").is_err());
        assert_eq!(ids(&source), vec!["a"]);
        assert_eq!(ids(&target), vec!["x"]);
    }

    #[test]
    fn insert_at_clamps_and_shifts() {
        let mut items = lane(&["a", "b"]);
        let new_slot = Slot { id: "n".into(), position: 0 };

        let changes = insert_at(&mut items, new_slot, Some(1));

        assert_eq!(ids(&items), vec!["a", "n", "b"]);
        assert_contiguous(&items);
        let changed: Vec<&str> = changes.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(changed, vec!["n", "b"]);
    }

    #[test]
    fn remove_closes_the_gap() {
        let mut items = lane(&["a", "b", "c"]);

        let (removed, changes) = remove(&mut items, "a").unwrap();

        assert_eq!(removed.id, "a");
        assert_eq!(ids(&items), vec!["b", "c"]);
        assert_contiguous(&items);
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn next_position_is_lane_length() {
        assert_eq!(next_position::<Slot>(&[]), 0);
        assert_eq!(next_position(&lane(&["a", "b"])), 2);
    }
}
