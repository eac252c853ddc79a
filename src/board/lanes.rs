use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::tags::normalize_tag;
use crate::core::task::{Lane, Task};

/// Active tag filter. Conjunctive: a task must carry every tag in the set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    tags: BTreeSet<String>,
}

impl TagFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags<I, T>(tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self {
            tags: tags
                .into_iter()
                .filter_map(|t| normalize_tag(t.as_ref()))
                .collect(),
        }
    }

    /// Add the tag if absent, remove it if present. Returns whether it is now active.
    pub fn toggle(&mut self, tag: &str) -> bool {
        let Some(tag) = normalize_tag(tag) else {
            return false;
        };
        if self.tags.remove(&tag) {
            false
        } else {
            self.tags.insert(tag);
            true
        }
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn matches(&self, task: &Task) -> bool {
        task.has_all_tags(&self.tags)
    }
}

/// A visible task together with its position in the unfiltered collection.
#[derive(Debug, Clone, Copy)]
pub struct RoutedTask<'a> {
    pub index: usize,
    pub task: &'a Task,
}

/// Visible tasks partitioned into the four lanes, each in display order.
#[derive(Debug, Clone)]
pub struct LaneView<'a> {
    lanes: BTreeMap<Lane, Vec<RoutedTask<'a>>>,
}

impl<'a> LaneView<'a> {
    pub fn lane(&self, lane: Lane) -> &[RoutedTask<'a>] {
        self.lanes.get(&lane).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Lane, &[RoutedTask<'a>])> {
        Lane::ALL.into_iter().map(move |lane| (lane, self.lane(lane)))
    }

    pub fn visible_count(&self) -> usize {
        self.lanes.values().map(Vec::len).sum()
    }
}

/// Priority ascending, then due date ascending with undated tasks last.
pub fn priority_then_due(a: &Task, b: &Task) -> Ordering {
    a.priority()
        .cmp(&b.priority())
        .then_with(|| match (a.date_due, b.date_due) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

pub fn route<'a>(tasks: &'a [Task], filter: &TagFilter) -> LaneView<'a> {
    route_by(tasks, filter, priority_then_due)
}

/// Drop soft-deleted and filtered-out tasks, stable-sort the rest with
/// `compare`, then partition by section.
pub fn route_by<'a, F>(tasks: &'a [Task], filter: &TagFilter, mut compare: F) -> LaneView<'a>
where
    F: FnMut(&Task, &Task) -> Ordering,
{
    let mut visible: Vec<RoutedTask<'a>> = tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.deleted && filter.matches(t))
        .map(|(index, task)| RoutedTask { index, task })
        .collect();

    // `sort_by` is stable, so ties keep storage order.
    visible.sort_by(|a, b| compare(a.task, b.task));

    let mut lanes: BTreeMap<Lane, Vec<RoutedTask<'a>>> =
        Lane::ALL.into_iter().map(|lane| (lane, Vec::new())).collect();
    for routed in visible {
        lanes.entry(routed.task.section()).or_default().push(routed);
    }
    LaneView { lanes }
}
