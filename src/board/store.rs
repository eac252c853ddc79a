//! The canonical ordered task collection and every mutation on it.
//!
//! Storage order is "most recent manual arrangement": the store appends new
//! tasks at the tail and only moves them on an explicit [`TaskStore::reorder`].
//! Display ordering belongs to the lane router.

use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

use crate::core::settings::{Settings, default_label};
use crate::core::task::{Lane, NewTask, Priority, Task, TaskId, TaskStatus};
use crate::core::temporal::normalize_timestamp;
use crate::core::update::{DateField, FieldUpdate, TextField};

use super::error::{StorageError, TaskError};
use super::kv::{DATA_KEY, KeyValueStore, SETTINGS_KEY};
use super::migrate::{Migration, classify_record};

/// Outcome of bringing a batch of raw records up to the current schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Records that were not already current.
    pub migrated: usize,
    /// Current records rewritten because a stored value was stale or
    /// loosely typed.
    pub resynced: usize,
    /// Records given a fresh id because theirs was missing or duplicated.
    pub repaired_ids: usize,
    /// Entries that were not objects and could not be read as tasks.
    pub dropped: usize,
}

impl MigrationReport {
    pub fn changed(&self) -> bool {
        self.migrated + self.resynced + self.repaired_ids + self.dropped > 0
    }
}

fn migrate_records(records: &[Value]) -> (Vec<Task>, MigrationReport) {
    let mut report = MigrationReport::default();
    let mut seen: HashSet<TaskId> = HashSet::new();
    let mut tasks = Vec::with_capacity(records.len());

    for record in records {
        let Some((mut task, how)) = classify_record(record) else {
            log::warn!("Dropping stored entry that is not a task object: {}", record);
            report.dropped += 1;
            continue;
        };
        match how {
            Migration::Upgraded => report.migrated += 1,
            Migration::Resynced => report.resynced += 1,
            Migration::Unchanged => {}
        }
        if task.id.as_str().is_empty() || seen.contains(&task.id) {
            let fresh = TaskId::fresh();
            log::warn!("Task id '{}' missing or duplicated, assigning {}", task.id, fresh);
            task.id = fresh;
            report.repaired_ids += 1;
        }
        seen.insert(task.id.clone());
        tasks.push(task);
    }

    (tasks, report)
}

/// Raw state read from storage that has not been migrated yet.
///
/// The only way forward is [`UnmigratedBoard::migrate_all_if_needed`], so no
/// mutation can ever observe a legacy-shaped record.
pub struct UnmigratedBoard<S: KeyValueStore> {
    kv: S,
    records: Vec<Value>,
    settings: Settings,
}

impl<S: KeyValueStore> UnmigratedBoard<S> {
    pub fn records(&self) -> &[Value] {
        &self.records
    }

    /// Migrate every non-current record and persist once if anything changed.
    pub fn migrate_all_if_needed(self) -> (TaskStore<S>, MigrationReport) {
        let (tasks, report) = migrate_records(&self.records);
        let mut store = TaskStore {
            kv: self.kv,
            tasks,
            settings: self.settings,
            durability_warning: None,
        };
        if report.changed() {
            log::info!(
                "Migrated {} task(s), resynced {}, repaired {} id(s), dropped {} entr(ies)",
                report.migrated,
                report.resynced,
                report.repaired_ids,
                report.dropped
            );
            store.persist_tasks();
        }
        (store, report)
    }
}

pub struct TaskStore<S: KeyValueStore> {
    kv: S,
    tasks: Vec<Task>,
    settings: Settings,
    durability_warning: Option<StorageError>,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Read both blobs from storage. A corrupt task blob is an error; a
    /// corrupt settings blob falls back to the default labels.
    pub fn load(kv: S) -> Result<UnmigratedBoard<S>, TaskError> {
        let records = match kv.get(DATA_KEY)? {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str::<Vec<Value>>(&raw)
                .map_err(|source| TaskError::CorruptData {
                    key: DATA_KEY.to_string(),
                    source,
                })?,
            _ => Vec::new(),
        };

        let settings = match kv.get(SETTINGS_KEY)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("Stored settings unreadable, using defaults: {}", e);
                Settings::default()
            }),
            None => Settings::default(),
        };

        log::debug!("Loaded {} stored task record(s)", records.len());
        Ok(UnmigratedBoard {
            kv,
            records,
            settings,
        })
    }

    /// Load and migrate in one step.
    pub fn open(kv: S) -> Result<(Self, MigrationReport), TaskError> {
        Ok(Self::load(kv)?.migrate_all_if_needed())
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    pub fn kv_mut(&mut self) -> &mut S {
        &mut self.kv
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn position_of(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }

    /// Id at a positional index. Only meaningful against the render that
    /// produced the index; never hold on to an index across a mutation.
    pub fn id_at(&self, index: usize) -> Option<&TaskId> {
        self.tasks.get(index).map(|t| &t.id)
    }

    /// Every tag carried by a task that is not soft-deleted.
    pub fn all_tags(&self) -> BTreeSet<String> {
        self.tasks
            .iter()
            .filter(|t| !t.deleted)
            .flat_map(|t| t.tags.iter().cloned())
            .collect()
    }

    /// The most recent persistence failure, if any, cleared on read.
    pub fn take_durability_warning(&mut self) -> Option<StorageError> {
        self.durability_warning.take()
    }

    fn index_of(&self, id: &TaskId) -> Result<usize, TaskError> {
        self.position_of(id).ok_or_else(|| {
            log::warn!("No task with id {}", id);
            TaskError::NotFound(id.clone())
        })
    }

    pub fn create(&mut self, new: NewTask) -> Result<TaskId, TaskError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(TaskError::EmptyTitle);
        }
        let due = match new.date_due.as_deref() {
            Some(raw) => normalize_timestamp(raw).map_err(TaskError::InvalidDate)?,
            None => None,
        };

        let mut task = Task::new(title);
        task.description = new.description;
        task.notes = new.notes;
        task.date_due = due;
        if let Some(status) = new.status {
            task.status = status;
            task.deleted = status == TaskStatus::Deleted;
        }
        task.set_priority(new.priority.map(Priority::clamped).unwrap_or_default());
        task.subtasks = new.subtasks;
        task.refresh_tags();

        let id = task.id.clone();
        log::debug!("Created task {} in {}", id, task.section());
        self.tasks.push(task);
        self.persist_tasks();
        Ok(id)
    }

    /// Apply one field edit. Invalid input is rejected before anything changes.
    pub fn update_field(&mut self, id: &TaskId, update: FieldUpdate) -> Result<(), TaskError> {
        let idx = self.index_of(id)?;
        let date = match &update {
            FieldUpdate::Date(_, raw) => normalize_timestamp(raw).map_err(TaskError::InvalidDate)?,
            _ => None,
        };

        let task = &mut self.tasks[idx];
        match update {
            FieldUpdate::Date(field, _) => match field {
                DateField::Due => task.date_due = date,
                DateField::Captured => task.date_captured = date,
                DateField::Closed => task.date_closed = date,
            },
            FieldUpdate::Status(status) => {
                task.status = status;
                // Leaving Deleted does not clear the flag; only restore does.
                if status == TaskStatus::Deleted {
                    task.deleted = true;
                }
            }
            FieldUpdate::Priority(n) => task.set_priority(Priority::clamped(n)),
            FieldUpdate::Text(field, value) => {
                match field {
                    TextField::Title => task.title = value,
                    TextField::Description => task.description = value,
                    TextField::Notes => task.notes = value,
                }
                task.refresh_tags();
            }
            FieldUpdate::Subtasks(items) => task.subtasks = items,
        }
        task.touch();
        self.persist_tasks();
        Ok(())
    }

    pub fn soft_delete(&mut self, id: &TaskId) -> Result<(), TaskError> {
        let idx = self.index_of(id)?;
        let task = &mut self.tasks[idx];
        task.deleted = true;
        task.status = TaskStatus::Deleted;
        task.touch();
        self.persist_tasks();
        Ok(())
    }

    /// Remove a task from the collection for good.
    pub fn hard_delete(&mut self, id: &TaskId) -> Result<Task, TaskError> {
        let idx = self.index_of(id)?;
        let removed = self.tasks.remove(idx);
        log::info!("Permanently deleted task {}", removed.id);
        self.persist_tasks();
        Ok(removed)
    }

    pub fn restore(&mut self, id: &TaskId) -> Result<(), TaskError> {
        let idx = self.index_of(id)?;
        let task = &mut self.tasks[idx];
        task.deleted = false;
        task.status = TaskStatus::Pending;
        task.touch();
        self.persist_tasks();
        Ok(())
    }

    /// Move a task into `lane`, placing it immediately before `before` in the
    /// collection, or at the very end when `before` is `None`.
    ///
    /// Both ids are resolved now, at mutation time. A `before` equal to the
    /// moved task only changes the lane.
    pub fn reorder(
        &mut self,
        id: &TaskId,
        lane: Lane,
        before: Option<&TaskId>,
    ) -> Result<(), TaskError> {
        let from = self.index_of(id)?;
        if let Some(anchor) = before {
            self.index_of(anchor)?;
        }

        let mut task = self.tasks.remove(from);
        task.set_lane(lane);
        task.touch();

        let to = match before {
            Some(anchor) if anchor == id => from,
            // Anchor was validated above and is not the removed task.
            Some(anchor) => self.position_of(anchor).unwrap_or(self.tasks.len()),
            None => self.tasks.len(),
        };
        self.tasks.insert(to, task);
        self.persist_tasks();
        Ok(())
    }

    pub fn rename_lane(&mut self, lane: Lane, label: &str) -> Result<(), TaskError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(TaskError::EmptyLaneLabel);
        }
        self.settings.sections.insert(lane, label.to_string());
        self.persist_settings();
        Ok(())
    }

    pub fn reset_lane_labels(&mut self) {
        for lane in Lane::ALL {
            self.settings
                .sections
                .insert(lane, default_label(lane).to_string());
        }
        self.persist_settings();
    }

    /// Full-state restore from an import. Records go through the migrator
    /// exactly like a fresh load.
    pub fn replace_all(&mut self, records: &[Value], settings: Option<Settings>) -> MigrationReport {
        let (tasks, report) = migrate_records(records);
        log::info!("Replacing board with {} imported task(s)", tasks.len());
        self.tasks = tasks;
        self.persist_tasks();
        if let Some(settings) = settings {
            self.settings = settings;
            self.persist_settings();
        }
        report
    }

    /// Write both blobs and report any failure directly.
    pub fn flush(&mut self) -> Result<(), TaskError> {
        self.write_tasks()?;
        self.write_settings()?;
        self.durability_warning = None;
        Ok(())
    }

    fn write_tasks(&mut self) -> Result<(), TaskError> {
        let data = serde_json::to_string(&self.tasks)?;
        self.kv.set(DATA_KEY, &data)?;
        Ok(())
    }

    fn write_settings(&mut self) -> Result<(), TaskError> {
        let data = serde_json::to_string(&self.settings)?;
        self.kv.set(SETTINGS_KEY, &data)?;
        Ok(())
    }

    fn persist_tasks(&mut self) {
        let result = self.write_tasks();
        self.note_persist_result(result);
    }

    fn persist_settings(&mut self) {
        let result = self.write_settings();
        self.note_persist_result(result);
    }

    /// The in-memory mutation already happened; a failed write only puts
    /// durability at risk, so it is kept as a warning rather than returned.
    fn note_persist_result(&mut self, result: Result<(), TaskError>) {
        match result {
            Ok(()) => {}
            Err(TaskError::Storage(e)) => {
                log::warn!("Failed to persist board: {}", e);
                self.durability_warning = Some(e);
            }
            Err(e) => log::error!("Failed to serialize board: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::kv::MemoryStore;
    use serde_json::json;

    fn empty_store() -> TaskStore<MemoryStore> {
        TaskStore::open(MemoryStore::new()).unwrap().0
    }

    fn assert_sections_in_sync(store: &TaskStore<MemoryStore>) {
        for task in store.tasks() {
            assert_eq!(
                task.section().as_str(),
                format!("div{}", task.priority().get())
            );
        }
    }

    fn persisted(store: &TaskStore<MemoryStore>) -> Vec<Task> {
        let raw = store.kv().get(DATA_KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn create_assigns_defaults_and_persists() {
        let mut store = empty_store();
        let id = store
            .create(NewTask::titled("  Water plants ").description("#home #Garden"))
            .unwrap();
        let task = store.get(&id).unwrap();
        assert_eq!(task.title, "Water plants");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority(), Priority::LOWEST);
        assert!(task.date_captured.is_some());
        assert_eq!(
            task.tags.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["garden", "home"]
        );
        assert_eq!(persisted(&store), store.tasks());
    }

    #[test]
    fn create_clamps_priority() {
        let mut store = empty_store();
        let high = store.create(NewTask::titled("a").priority(9)).unwrap();
        let low = store.create(NewTask::titled("b").priority(-1)).unwrap();
        assert_eq!(store.get(&high).unwrap().priority().get(), 4);
        assert_eq!(store.get(&high).unwrap().section(), Lane::Div4);
        assert_eq!(store.get(&low).unwrap().priority().get(), 1);
        assert_eq!(store.get(&low).unwrap().section(), Lane::Div1);
    }

    #[test]
    fn create_rejects_empty_title_without_change() {
        let mut store = empty_store();
        assert!(matches!(
            store.create(NewTask::titled("   ")),
            Err(TaskError::EmptyTitle)
        ));
        assert!(store.tasks().is_empty());
        assert_eq!(store.kv().get(DATA_KEY).unwrap(), None);
    }

    #[test]
    fn create_rejects_bad_due_date() {
        let mut store = empty_store();
        let err = store.create(NewTask::titled("x").due("someday")).unwrap_err();
        assert!(matches!(err, TaskError::InvalidDate(raw) if raw == "someday"));
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let mut store = empty_store();
        let ids: HashSet<TaskId> = (0..20)
            .map(|i| store.create(NewTask::titled(format!("t{i}"))).unwrap())
            .collect();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn update_field_coercions() {
        let mut store = empty_store();
        let id = store.create(NewTask::titled("Edit me")).unwrap();
        let before = store.get(&id).unwrap().date_updated;

        store.update_field(&id, FieldUpdate::Priority(2)).unwrap();
        store.update_field(&id, FieldUpdate::due("2026-05-01")).unwrap();
        store
            .update_field(&id, FieldUpdate::description("now #urgent"))
            .unwrap();
        store.update_field(&id, FieldUpdate::notes("# Heading")).unwrap();

        let task = store.get(&id).unwrap();
        assert_eq!(task.section(), Lane::Div2);
        assert!(task.date_due.is_some());
        assert!(task.tags.contains("urgent"));
        assert_eq!(task.notes, "# Heading");
        assert!(task.date_updated >= before);
        assert_sections_in_sync(&store);
    }

    #[test]
    fn text_edit_leaves_no_stale_tags() {
        let mut store = empty_store();
        let id = store
            .create(NewTask::titled("t").description("#one #two"))
            .unwrap();
        store.update_field(&id, FieldUpdate::description("#two")).unwrap();
        let tags: Vec<_> = store.get(&id).unwrap().tags.iter().cloned().collect();
        assert_eq!(tags, vec!["two".to_string()]);
    }

    #[test]
    fn blank_date_clears_and_garbage_is_rejected() {
        let mut store = empty_store();
        let id = store.create(NewTask::titled("d").due("2026-01-02")).unwrap();
        let err = store.update_field(&id, FieldUpdate::due("tomorrow-ish"));
        assert!(matches!(err, Err(TaskError::InvalidDate(_))));
        assert!(store.get(&id).unwrap().date_due.is_some());
        store.update_field(&id, FieldUpdate::due("")).unwrap();
        assert!(store.get(&id).unwrap().date_due.is_none());
    }

    #[test]
    fn deleted_status_sets_flag_but_leaving_it_does_not_clear() {
        let mut store = empty_store();
        let id = store.create(NewTask::titled("s")).unwrap();
        store
            .update_field(&id, FieldUpdate::Status(TaskStatus::Deleted))
            .unwrap();
        assert!(store.get(&id).unwrap().deleted);
        store
            .update_field(&id, FieldUpdate::Status(TaskStatus::Pending))
            .unwrap();
        assert!(store.get(&id).unwrap().deleted);
    }

    #[test]
    fn lookup_miss_is_typed_and_changes_nothing() {
        let mut store = empty_store();
        store.create(NewTask::titled("only")).unwrap();
        let snapshot = store.tasks().to_vec();
        let ghost = TaskId::from("ghost");
        assert!(matches!(
            store.update_field(&ghost, FieldUpdate::Priority(1)),
            Err(TaskError::NotFound(_))
        ));
        assert!(matches!(store.soft_delete(&ghost), Err(TaskError::NotFound(_))));
        assert!(matches!(store.hard_delete(&ghost), Err(TaskError::NotFound(_))));
        assert!(matches!(store.restore(&ghost), Err(TaskError::NotFound(_))));
        assert!(matches!(
            store.reorder(&ghost, Lane::Div1, None),
            Err(TaskError::NotFound(_))
        ));
        assert_eq!(store.tasks(), snapshot.as_slice());
    }

    #[test]
    fn soft_delete_then_restore_round_trip() {
        let mut store = empty_store();
        let id = store.create(NewTask::titled("Round trip")).unwrap();
        store.soft_delete(&id).unwrap();
        let task = store.get(&id).unwrap();
        assert!(task.deleted);
        assert_eq!(task.status, TaskStatus::Deleted);

        store.restore(&id).unwrap();
        let task = store.get(&id).unwrap();
        assert!(!task.deleted);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.id, id);
        assert_eq!(task.title, "Round trip");
    }

    #[test]
    fn hard_delete_removes_membership() {
        let mut store = empty_store();
        let keep = store.create(NewTask::titled("keep")).unwrap();
        let gone = store.create(NewTask::titled("gone")).unwrap();
        store.hard_delete(&gone).unwrap();
        assert!(store.tasks().iter().all(|t| t.id != gone));
        assert!(persisted(&store).iter().all(|t| t.id != gone));
        assert!(store.get(&keep).is_some());
    }

    #[test]
    fn reorder_places_task_before_anchor_in_target_lane() {
        let mut store = empty_store();
        let a = store.create(NewTask::titled("a").priority(1)).unwrap();
        let b = store.create(NewTask::titled("b").priority(2)).unwrap();
        let c = store.create(NewTask::titled("c").priority(2)).unwrap();

        store.reorder(&a, Lane::Div2, Some(&c)).unwrap();
        let order: Vec<_> = store.tasks().iter().map(|t| t.id.clone()).collect();
        assert_eq!(order, vec![b.clone(), a.clone(), c.clone()]);
        let pos = store.position_of(&a).unwrap();
        assert_eq!(store.id_at(pos + 1), Some(&c));
        assert_eq!(store.get(&a).unwrap().section(), Lane::Div2);
        assert_sections_in_sync(&store);
    }

    #[test]
    fn reorder_to_end_and_backwards() {
        let mut store = empty_store();
        let a = store.create(NewTask::titled("a")).unwrap();
        let b = store.create(NewTask::titled("b")).unwrap();
        let c = store.create(NewTask::titled("c")).unwrap();

        store.reorder(&a, Lane::Div3, None).unwrap();
        assert_eq!(store.id_at(2), Some(&a));
        store.reorder(&c, Lane::Div3, Some(&b)).unwrap();
        let order: Vec<_> = store.tasks().iter().map(|t| t.id.clone()).collect();
        assert_eq!(order, vec![c, b, a]);
    }

    #[test]
    fn reorder_before_itself_only_changes_lane() {
        let mut store = empty_store();
        let a = store.create(NewTask::titled("a")).unwrap();
        let b = store.create(NewTask::titled("b")).unwrap();
        store.reorder(&b, Lane::Div1, Some(&b)).unwrap();
        assert_eq!(store.id_at(1), Some(&b));
        assert_eq!(store.id_at(0), Some(&a));
        assert_eq!(store.get(&b).unwrap().section(), Lane::Div1);
    }

    #[test]
    fn reorder_with_missing_anchor_changes_nothing() {
        let mut store = empty_store();
        let a = store.create(NewTask::titled("a")).unwrap();
        let err = store.reorder(&a, Lane::Div1, Some(&TaskId::from("nope")));
        assert!(matches!(err, Err(TaskError::NotFound(_))));
        assert_eq!(store.get(&a).unwrap().section(), Lane::Div4);
    }

    #[test]
    fn load_migrates_legacy_records_once() {
        let mut kv = MemoryStore::new();
        let legacy = json!([
            {"id": "1", "title": "old", "status": "To Do", "section": "div1"},
            {"id": "1", "title": "dup"},
            "garbage"
        ]);
        kv.set(DATA_KEY, &legacy.to_string()).unwrap();

        let (store, report) = TaskStore::open(kv).unwrap();
        assert_eq!(
            report,
            MigrationReport {
                migrated: 2,
                resynced: 0,
                repaired_ids: 1,
                dropped: 1
            }
        );
        assert_eq!(store.tasks().len(), 2);
        assert_eq!(store.tasks()[0].id.as_str(), "1");
        assert_ne!(store.tasks()[1].id.as_str(), "1");

        let (reopened, report) = TaskStore::open(store.kv().clone()).unwrap();
        assert!(!report.changed());
        assert_eq!(reopened.tasks(), store.tasks());
    }

    #[test]
    fn stale_section_on_disk_is_rewritten() {
        let mut kv = MemoryStore::new();
        let mut record = serde_json::to_value(Task::new("drifted")).unwrap();
        record["priority"] = json!(2);
        record["section"] = json!("div4");
        kv.set(DATA_KEY, &json!([record]).to_string()).unwrap();

        let (store, report) = TaskStore::open(kv).unwrap();
        assert_eq!(report.resynced, 1);
        assert_eq!(report.migrated, 0);
        assert!(report.changed());
        let raw: Value = serde_json::from_str(&store.kv().get(DATA_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(raw[0]["section"], "div2");

        let (_, report) = TaskStore::open(store.kv().clone()).unwrap();
        assert!(!report.changed());
    }

    #[test]
    fn corrupt_data_is_an_error() {
        let mut kv = MemoryStore::new();
        kv.set(DATA_KEY, "{not json").unwrap();
        assert!(matches!(
            TaskStore::load(kv),
            Err(TaskError::CorruptData { .. })
        ));
    }

    #[test]
    fn corrupt_settings_fall_back_to_defaults() {
        let mut kv = MemoryStore::new();
        kv.set(SETTINGS_KEY, "[]").unwrap();
        let (store, _) = TaskStore::open(kv).unwrap();
        assert_eq!(store.settings(), &Settings::default());
    }

    #[test]
    fn unknown_lane_in_settings_keeps_other_labels() {
        let mut kv = MemoryStore::new();
        kv.set(SETTINGS_KEY, r#"{"sections":{"div1":"Today","div5":"Never"}}"#)
            .unwrap();
        let (store, _) = TaskStore::open(kv).unwrap();
        assert_eq!(store.settings().label(Lane::Div1), "Today");
        assert_eq!(store.settings().sections.len(), 4);
    }

    #[test]
    fn persistence_failure_keeps_memory_authoritative() {
        let mut store = TaskStore::open(MemoryStore::with_quota(64)).unwrap().0;
        let id = store
            .create(NewTask::titled("a title long enough to blow the quota"))
            .unwrap();
        assert!(store.get(&id).is_some());
        assert!(matches!(
            store.take_durability_warning(),
            Some(StorageError::QuotaExceeded { .. })
        ));
        assert!(store.take_durability_warning().is_none());

        store.kv_mut().set_quota(None);
        store.flush().unwrap();
        assert_eq!(persisted(&store).len(), 1);
    }

    #[test]
    fn lane_labels_persist_independently() {
        let mut store = empty_store();
        store.rename_lane(Lane::Div1, " Today ").unwrap();
        assert!(matches!(
            store.rename_lane(Lane::Div2, "  "),
            Err(TaskError::EmptyLaneLabel)
        ));
        assert_eq!(store.kv().get(DATA_KEY).unwrap(), None);

        let (reopened, _) = TaskStore::open(store.kv().clone()).unwrap();
        assert_eq!(reopened.settings().label(Lane::Div1), "Today");

        store.reset_lane_labels();
        assert_eq!(store.settings(), &Settings::default());
    }

    #[test]
    fn replace_all_migrates_imported_records() {
        let mut store = empty_store();
        store.create(NewTask::titled("will vanish")).unwrap();
        let report = store.replace_all(
            &[json!({"title": "imported", "section": "div3"})],
            None,
        );
        assert_eq!(report.migrated, 1);
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.tasks()[0].section(), Lane::Div3);
        assert_eq!(persisted(&store).len(), 1);
    }

    #[test]
    fn section_stays_in_sync_across_every_mutation() {
        let mut store = empty_store();
        let a = store.create(NewTask::titled("a").priority(3)).unwrap();
        assert_sections_in_sync(&store);
        store.update_field(&a, FieldUpdate::Priority(1)).unwrap();
        assert_sections_in_sync(&store);
        store.soft_delete(&a).unwrap();
        assert_sections_in_sync(&store);
        store.restore(&a).unwrap();
        assert_sections_in_sync(&store);
        store.reorder(&a, Lane::Div4, None).unwrap();
        assert_sections_in_sync(&store);
        store.replace_all(&[json!({"section": "div2"})], None);
        assert_sections_in_sync(&store);
    }
}
