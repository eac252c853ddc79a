use crate::core::task::{Lane, TaskId};

use super::error::TaskError;
use super::kv::KeyValueStore;
use super::store::TaskStore;

/// Vertical extent of a rendered card, in the pointer's coordinate space
/// (y grows downwards).
#[derive(Debug, Clone, PartialEq)]
pub struct CardGeometry {
    pub id: TaskId,
    pub top: f64,
    pub height: f64,
}

impl CardGeometry {
    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Where the dragged card would land if dropped now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionMarker {
    pub lane: Lane,
    /// Card the drop lands in front of; `None` means the end of the lane.
    pub before: Option<TaskId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Moved {
        id: TaskId,
        lane: Lane,
        before: Option<TaskId>,
    },
    /// A drop arrived with no drag in progress.
    NoDrag,
}

/// First card, other than the dragged one, whose midpoint lies below the pointer.
pub fn insertion_anchor(dragged: &TaskId, pointer_y: f64, cards: &[CardGeometry]) -> Option<TaskId> {
    cards
        .iter()
        .filter(|c| &c.id != dragged)
        .find(|c| c.midpoint() > pointer_y)
        .map(|c| c.id.clone())
}

/// Tracks one drag gesture by stable id from start to drop.
///
/// Positions are never captured: the store resolves both ids at the moment
/// of the drop, whatever re-renders happened in between.
#[derive(Debug, Default)]
pub struct DragCoordinator {
    dragging: Option<TaskId>,
    marker: Option<InsertionMarker>,
}

impl DragCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drag_start(&mut self, id: TaskId) {
        log::debug!("Drag started for {}", id);
        self.dragging = Some(id);
        self.marker = None;
    }

    pub fn dragging(&self) -> Option<&TaskId> {
        self.dragging.as_ref()
    }

    pub fn marker(&self) -> Option<&InsertionMarker> {
        self.marker.as_ref()
    }

    /// Recompute the insertion preview for the hovered lane.
    pub fn drag_over(
        &mut self,
        lane: Lane,
        pointer_y: f64,
        cards: &[CardGeometry],
    ) -> Option<&InsertionMarker> {
        let dragged = self.dragging.as_ref()?;
        let before = insertion_anchor(dragged, pointer_y, cards);
        self.marker = Some(InsertionMarker { lane, before });
        self.marker.as_ref()
    }

    pub fn drag_leave(&mut self) {
        self.marker = None;
    }

    pub fn drag_end(&mut self) {
        self.marker = None;
        self.dragging = None;
    }

    /// Finish the gesture. Gesture state is cleared even when the store
    /// rejects the move.
    pub fn drop<S: KeyValueStore>(
        &mut self,
        store: &mut TaskStore<S>,
        lane: Lane,
        pointer_y: f64,
        cards: &[CardGeometry],
    ) -> Result<DropOutcome, TaskError> {
        let dragged = self.dragging.take();
        self.marker = None;
        let Some(id) = dragged else {
            return Ok(DropOutcome::NoDrag);
        };

        let before = insertion_anchor(&id, pointer_y, cards);
        store.reorder(&id, lane, before.as_ref())?;
        log::debug!("Dropped {} into {} before {:?}", id, lane, before);
        Ok(DropOutcome::Moved { id, lane, before })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::kv::MemoryStore;
    use crate::board::lanes::{TagFilter, route};
    use crate::core::task::NewTask;

    fn geometry(ids: &[&TaskId]) -> Vec<CardGeometry> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| CardGeometry {
                id: (*id).clone(),
                top: i as f64 * 100.0,
                height: 80.0,
            })
            .collect()
    }

    #[test]
    fn anchor_is_first_card_with_midpoint_below_pointer() {
        let (a, b, c) = (TaskId::from("a"), TaskId::from("b"), TaskId::from("c"));
        let cards = geometry(&[&a, &b, &c]);
        let dragged = TaskId::from("x");
        assert_eq!(insertion_anchor(&dragged, 10.0, &cards), Some(a.clone()));
        assert_eq!(insertion_anchor(&dragged, 60.0, &cards), Some(b.clone()));
        assert_eq!(insertion_anchor(&dragged, 250.0, &cards), None);
        assert_eq!(insertion_anchor(&b, 60.0, &cards), Some(c));
    }

    #[test]
    fn leave_and_end_always_clear_marker() {
        let mut drag = DragCoordinator::new();
        let cards = geometry(&[&TaskId::from("a")]);
        assert!(drag.drag_over(Lane::Div1, 0.0, &cards).is_none());

        drag.drag_start(TaskId::from("x"));
        assert!(drag.drag_over(Lane::Div1, 0.0, &cards).is_some());
        drag.drag_leave();
        assert!(drag.marker().is_none());
        assert!(drag.dragging().is_some());

        drag.drag_over(Lane::Div2, 500.0, &cards);
        assert_eq!(
            drag.marker(),
            Some(&InsertionMarker {
                lane: Lane::Div2,
                before: None
            })
        );
        drag.drag_end();
        assert!(drag.marker().is_none());
        assert!(drag.dragging().is_none());
    }

    #[test]
    fn drop_moves_by_identity_across_rerender() {
        let mut store = TaskStore::open(MemoryStore::new()).unwrap().0;
        let a = store.create(NewTask::titled("a").priority(1)).unwrap();
        let b = store.create(NewTask::titled("b").priority(2)).unwrap();
        let c = store.create(NewTask::titled("c").priority(2)).unwrap();

        let mut drag = DragCoordinator::new();
        drag.drag_start(a.clone());

        // Another mutation shifts positions mid-gesture.
        let early = store.create(NewTask::titled("early").priority(2)).unwrap();
        store.reorder(&early, Lane::Div2, Some(&a)).unwrap();

        let cards = {
            let view = route(store.tasks(), &TagFilter::new());
            let lane_ids: Vec<&TaskId> = view.lane(Lane::Div2).iter().map(|r| &r.task.id).collect();
            geometry(&lane_ids)
        };
        // Past the middle of "early", short of the middle of "b".
        let outcome = drag.drop(&mut store, Lane::Div2, 50.0, &cards).unwrap();
        assert_eq!(
            outcome,
            DropOutcome::Moved {
                id: a.clone(),
                lane: Lane::Div2,
                before: Some(b.clone())
            }
        );

        let pos = store.position_of(&a).unwrap();
        assert_eq!(store.id_at(pos + 1), Some(&b));
        assert_eq!(store.get(&a).unwrap().section(), Lane::Div2);
        assert!(store.get(&c).is_some());
        assert!(drag.dragging().is_none());
    }

    #[test]
    fn drop_without_drag_is_ignored() {
        let mut store = TaskStore::open(MemoryStore::new()).unwrap().0;
        let mut drag = DragCoordinator::new();
        assert_eq!(
            drag.drop(&mut store, Lane::Div1, 0.0, &[]).unwrap(),
            DropOutcome::NoDrag
        );
    }

    #[test]
    fn failed_drop_still_clears_gesture() {
        let mut store = TaskStore::open(MemoryStore::new()).unwrap().0;
        let gone = store.create(NewTask::titled("gone")).unwrap();
        let mut drag = DragCoordinator::new();
        drag.drag_start(gone.clone());
        store.hard_delete(&gone).unwrap();
        assert!(drag.drop(&mut store, Lane::Div1, 0.0, &[]).is_err());
        assert!(drag.dragging().is_none());
        assert!(drag.marker().is_none());
    }
}
