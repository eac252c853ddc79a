//! Turns a routed board into flat per-card descriptors for the presentation
//! layer. Every rebuild starts from scratch; there is no incremental patching.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::core::settings::Settings;
use crate::core::task::{Lane, Task, TaskId, TaskStatus};

use super::kv::KeyValueStore;
use super::lanes::{TagFilter, route};
use super::store::TaskStore;

/// Everything a card needs to draw itself, plus the positional index the
/// presentation layer routes actions through.
#[derive(Debug, Clone, PartialEq)]
pub struct CardDescriptor {
    /// Position in the full, unfiltered collection at render time.
    pub index: usize,
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub has_notes: bool,
    pub status: TaskStatus,
    pub priority: u8,
    pub tags: Vec<String>,
    pub date_due: Option<DateTime<Utc>>,
    pub overdue: bool,
    pub subtask_count: usize,
}

impl CardDescriptor {
    fn from_task(index: usize, task: &Task, now: DateTime<Utc>) -> Self {
        Self {
            index,
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            has_notes: !task.notes.trim().is_empty(),
            status: task.status,
            priority: task.priority().get(),
            tags: task.tags.iter().cloned().collect(),
            date_due: task.date_due,
            overdue: task.is_overdue(now),
            subtask_count: task.subtasks.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaneRender {
    pub lane: Lane,
    pub label: String,
    pub cards: Vec<CardDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagChip {
    pub tag: String,
    pub count: usize,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardRender {
    pub lanes: Vec<LaneRender>,
    /// Soft-deleted tasks, in storage order.
    pub trash: Vec<CardDescriptor>,
    pub tags: Vec<TagChip>,
    pub total: usize,
}

impl BoardRender {
    pub fn lane(&self, lane: Lane) -> Option<&LaneRender> {
        self.lanes.iter().find(|l| l.lane == lane)
    }

    pub fn visible(&self) -> usize {
        self.lanes.iter().map(|l| l.cards.len()).sum()
    }

    /// Look a card up by the index it was rendered with.
    pub fn card_at(&self, index: usize) -> Option<&CardDescriptor> {
        self.lanes
            .iter()
            .flat_map(|l| l.cards.iter())
            .chain(self.trash.iter())
            .find(|c| c.index == index)
    }
}

/// Build a complete render of the board from a task slice.
pub fn build(
    tasks: &[Task],
    settings: &Settings,
    filter: &TagFilter,
    now: DateTime<Utc>,
) -> BoardRender {
    let view = route(tasks, filter);
    let lanes = view
        .iter()
        .map(|(lane, routed)| LaneRender {
            lane,
            label: settings.label(lane).to_string(),
            cards: routed
                .iter()
                .map(|r| CardDescriptor::from_task(r.index, r.task, now))
                .collect(),
        })
        .collect();

    let trash = tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.deleted)
        .map(|(i, t)| CardDescriptor::from_task(i, t, now))
        .collect();

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for task in tasks.iter().filter(|t| !t.deleted) {
        for tag in &task.tags {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
    }
    // Active filter tags stay listed even when nothing carries them any more.
    for tag in filter.tags() {
        counts.entry(tag.as_str()).or_default();
    }
    let tags = counts
        .into_iter()
        .map(|(tag, count)| TagChip {
            tag: tag.to_string(),
            count,
            active: filter.contains(tag),
        })
        .collect();

    BoardRender {
        lanes,
        trash,
        tags,
        total: tasks.len(),
    }
}

/// Holds the latest render so same-tick index lookups resolve against the
/// exact output the presentation layer is showing.
#[derive(Debug, Default)]
pub struct Reconciler {
    current: Option<BoardRender>,
    generation: u64,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the previous render and build a fresh one.
    pub fn rebuild<S: KeyValueStore>(
        &mut self,
        store: &TaskStore<S>,
        filter: &TagFilter,
        now: DateTime<Utc>,
    ) -> &BoardRender {
        self.generation += 1;
        let render = build(store.tasks(), store.settings(), filter, now);
        log::debug!(
            "Render #{}: {} of {} task(s) visible",
            self.generation,
            render.visible(),
            render.total
        );
        self.current.insert(render)
    }

    pub fn current(&self) -> Option<&BoardRender> {
        self.current.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resolve a rendered index to the stable id it stood for. Use it right
    /// away; an index is meaningless after the next mutation.
    pub fn id_at(&self, index: usize) -> Option<&TaskId> {
        self.current.as_ref()?.card_at(index).map(|c| &c.id)
    }
}
