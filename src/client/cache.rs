//! Client-side task cache with tracked optimistic mutations.
//!
//! Entries are keyed by the normalised [`TaskQuery`] they were fetched with.
//! A mutation moves through `Idle -> Pending -> Reconciled | RolledBack`:
//! staged, applied tentatively to one entry, then either replaced by the
//! server's answer or undone.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Task, TaskQuery};

pub type MutationId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationState {
    Idle,
    Pending,
    Reconciled,
    RolledBack,
}

impl MutationState {
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Reconciled | Self::RolledBack)
    }
}

/// The change a mutation applies before the server has answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tentative {
    /// A new task, carrying a temporary (negative) id.
    Insert(Task),
    /// A new version of an existing task.
    Replace(Task),
    Remove(i64),
}

impl Tentative {
    fn task_id(&self) -> i64 {
        match self {
            Self::Insert(task) | Self::Replace(task) => task.id,
            Self::Remove(id) => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("unknown mutation {0}")]
    UnknownMutation(MutationId),

    #[error("mutation {id} is {actual:?}, expected {expected:?}")]
    InvalidTransition {
        id: MutationId,
        actual: MutationState,
        expected: MutationState,
    },
}

#[derive(Debug)]
struct Entry {
    tasks: Vec<Task>,
    stale: bool,
}

#[derive(Debug)]
struct Mutation {
    key: TaskQuery,
    change: Tentative,
    state: MutationState,
    /// The cached version of the affected task before `apply`.
    previous: Option<Task>,
}

#[derive(Debug, Default)]
pub struct TaskCache {
    entries: HashMap<TaskQuery, Entry>,
    mutations: HashMap<MutationId, Mutation>,
    last_temp_id: i64,
}

impl TaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached tasks for `key`, stale or not.
    pub fn get(&self, key: &TaskQuery) -> Option<&[Task]> {
        self.entries.get(key).map(|entry| entry.tasks.as_slice())
    }

    pub fn is_fresh(&self, key: &TaskQuery) -> bool {
        self.entries.get(key).is_some_and(|entry| !entry.stale)
    }

    /// Replace an entry with a server response.
    pub fn store(&mut self, key: TaskQuery, tasks: Vec<Task>) {
        self.entries.insert(key, Entry { tasks, stale: false });
    }

    pub fn invalidate_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.stale = true;
        }
    }

    /// A fresh id for a tentative task. Never collides with storage ids.
    pub fn temporary_id(&mut self) -> i64 {
        self.last_temp_id -= 1;
        self.last_temp_id
    }

    /// Record a mutation against `key` without touching the cache.
    pub fn stage(&mut self, key: TaskQuery, change: Tentative) -> MutationId {
        let id = Uuid::new_v4();
        self.mutations.insert(
            id,
            Mutation {
                key,
                change,
                state: MutationState::Idle,
                previous: None,
            },
        );
        id
    }

    pub fn state(&self, id: MutationId) -> Option<MutationState> {
        self.mutations.get(&id).map(|m| m.state)
    }

    /// Apply the tentative change to its entry.
    pub fn apply(&mut self, id: MutationId) -> Result<(), CacheError> {
        let mutation = Self::transition(&mut self.mutations, id, MutationState::Idle)?;
        mutation.state = MutationState::Pending;

        let Some(entry) = self.entries.get_mut(&mutation.key) else {
            return Ok(());
        };

        let task_id = mutation.change.task_id();
        mutation.previous = remove_task(&mut entry.tasks, task_id);
        match &mutation.change {
            Tentative::Insert(task) | Tentative::Replace(task) => {
                insert_sorted(&mutation.key, &mut entry.tasks, task.clone());
            }
            Tentative::Remove(_) => {}
        }
        Ok(())
    }

    /// Swap the tentative change for the server's version of the task.
    ///
    /// `server` is `None` when the task no longer exists (a delete). Every
    /// other entry is marked stale since it may now be out of date.
    pub fn reconcile(&mut self, id: MutationId, server: Option<Task>) -> Result<(), CacheError> {
        let mutation = Self::transition(&mut self.mutations, id, MutationState::Pending)?;
        mutation.state = MutationState::Reconciled;

        for (key, entry) in self.entries.iter_mut() {
            if *key != mutation.key {
                entry.stale = true;
                continue;
            }
            remove_task(&mut entry.tasks, mutation.change.task_id());
            if let Some(task) = &server {
                remove_task(&mut entry.tasks, task.id);
                insert_sorted(key, &mut entry.tasks, task.clone());
            }
        }
        Ok(())
    }

    /// Undo the tentative change, restoring the previous version of the task.
    pub fn rollback(&mut self, id: MutationId) -> Result<(), CacheError> {
        let mutation = Self::transition(&mut self.mutations, id, MutationState::Pending)?;
        mutation.state = MutationState::RolledBack;

        if let Some(entry) = self.entries.get_mut(&mutation.key) {
            remove_task(&mut entry.tasks, mutation.change.task_id());
            if let Some(previous) = mutation.previous.take() {
                insert_sorted(&mutation.key, &mut entry.tasks, previous);
            }
        }
        Ok(())
    }

    /// Drop records of reconciled and rolled-back mutations.
    pub fn prune_settled(&mut self) {
        self.mutations.retain(|_, m| !m.state.is_settled());
    }

    fn transition(
        mutations: &mut HashMap<MutationId, Mutation>,
        id: MutationId,
        expected: MutationState,
    ) -> Result<&mut Mutation, CacheError> {
        let mutation = mutations
            .get_mut(&id)
            .ok_or(CacheError::UnknownMutation(id))?;
        if mutation.state != expected {
            return Err(CacheError::InvalidTransition {
                id,
                actual: mutation.state,
                expected,
            });
        }
        Ok(mutation)
    }
}

fn remove_task(tasks: &mut Vec<Task>, id: i64) -> Option<Task> {
    let index = tasks.iter().position(|t| t.id == id)?;
    Some(tasks.remove(index))
}

/// Insert `task` where the query would order it, if the query matches it.
fn insert_sorted(query: &TaskQuery, tasks: &mut Vec<Task>, task: Task) {
    if !query.matches(&task) {
        return;
    }
    let index = tasks
        .iter()
        .position(|existing| query.compare(&task, existing).is_lt())
        .unwrap_or(tasks.len());
    tasks.insert(index, task);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SortDirection, SortField, TaskStatus};
    use chrono::{TimeZone, Utc};

    fn task(id: i64, title: &str, created_secs: i64) -> Task {
        let at = Utc.timestamp_opt(created_secs, 0).unwrap();
        Task {
            id,
            title: title.to_string(),
            description: None,
            status: TaskStatus::Pending,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    fn ids(cache: &TaskCache, key: &TaskQuery) -> Vec<i64> {
        cache.get(key).unwrap().iter().map(|t| t.id).collect()
    }

    fn seeded() -> (TaskCache, TaskQuery) {
        let key = TaskQuery::default();
        let mut cache = TaskCache::new();
        cache.store(key.clone(), vec![task(2, "b", 20), task(1, "a", 10)]);
        (cache, key)
    }

    #[test]
    fn staged_mutation_is_idle_and_changes_nothing() {
        let (mut cache, key) = seeded();
        let id = cache.stage(key.clone(), Tentative::Remove(1));
        assert_eq!(cache.state(id), Some(MutationState::Idle));
        assert_eq!(ids(&cache, &key), vec![2, 1]);
    }

    #[test]
    fn optimistic_insert_is_reconciled_with_server_task() {
        let (mut cache, key) = seeded();
        let temp = cache.temporary_id();
        assert!(temp < 0);

        let id = cache.stage(key.clone(), Tentative::Insert(task(temp, "c", 30)));
        cache.apply(id).unwrap();
        assert_eq!(cache.state(id), Some(MutationState::Pending));
        assert_eq!(ids(&cache, &key), vec![temp, 2, 1]);

        cache.reconcile(id, Some(task(3, "c", 31))).unwrap();
        assert_eq!(cache.state(id), Some(MutationState::Reconciled));
        assert_eq!(ids(&cache, &key), vec![3, 2, 1]);
    }

    #[test]
    fn rollback_removes_tentative_insert() {
        let (mut cache, key) = seeded();
        let temp = cache.temporary_id();
        let id = cache.stage(key.clone(), Tentative::Insert(task(temp, "c", 30)));
        cache.apply(id).unwrap();

        cache.rollback(id).unwrap();
        assert_eq!(cache.state(id), Some(MutationState::RolledBack));
        assert_eq!(ids(&cache, &key), vec![2, 1]);
    }

    #[test]
    fn rollback_restores_removed_task_in_place() {
        let (mut cache, key) = seeded();
        let id = cache.stage(key.clone(), Tentative::Remove(2));
        cache.apply(id).unwrap();
        assert_eq!(ids(&cache, &key), vec![1]);

        cache.rollback(id).unwrap();
        assert_eq!(ids(&cache, &key), vec![2, 1]);
    }

    #[test]
    fn rollback_restores_previous_version() {
        let (mut cache, key) = seeded();
        let mut edited = task(1, "a", 10);
        edited.title = "edited".into();

        let id = cache.stage(key.clone(), Tentative::Replace(edited));
        cache.apply(id).unwrap();
        assert_eq!(cache.get(&key).unwrap()[1].title, "edited");

        cache.rollback(id).unwrap();
        assert_eq!(cache.get(&key).unwrap()[1].title, "a");
    }

    #[test]
    fn replace_leaves_filtered_entry_when_status_no_longer_matches() {
        let key = TaskQuery::default().with_status(TaskStatus::Pending);
        let mut cache = TaskCache::new();
        cache.store(key.clone(), vec![task(1, "a", 10)]);

        let mut done = task(1, "a", 10);
        done.status = TaskStatus::Completed;
        let id = cache.stage(key.clone(), Tentative::Replace(done.clone()));
        cache.apply(id).unwrap();
        assert!(cache.get(&key).unwrap().is_empty());

        cache.reconcile(id, Some(done)).unwrap();
        assert!(cache.get(&key).unwrap().is_empty());
    }

    #[test]
    fn insert_follows_entry_sort_order() {
        let key = TaskQuery::default().sorted_by(SortField::Title, SortDirection::Asc);
        let mut cache = TaskCache::new();
        cache.store(key.clone(), vec![task(1, "a", 10), task(2, "c", 20)]);

        let id = cache.stage(key.clone(), Tentative::Insert(task(-1, "b", 30)));
        cache.apply(id).unwrap();
        assert_eq!(ids(&cache, &key), vec![1, -1, 2]);
    }

    #[test]
    fn reconcile_marks_other_entries_stale() {
        let (mut cache, key) = seeded();
        let other = TaskQuery::default().with_status(TaskStatus::Completed);
        cache.store(other.clone(), vec![]);

        let id = cache.stage(key.clone(), Tentative::Remove(1));
        cache.apply(id).unwrap();
        cache.reconcile(id, None).unwrap();

        assert!(cache.is_fresh(&key));
        assert!(!cache.is_fresh(&other));
        assert_eq!(ids(&cache, &key), vec![2]);
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        let (mut cache, key) = seeded();
        let id = cache.stage(key, Tentative::Remove(1));

        assert_eq!(
            cache.reconcile(id, None),
            Err(CacheError::InvalidTransition {
                id,
                actual: MutationState::Idle,
                expected: MutationState::Pending,
            })
        );

        cache.apply(id).unwrap();
        cache.rollback(id).unwrap();
        assert!(cache.rollback(id).is_err());
        assert!(cache.apply(id).is_err());

        let unknown = Uuid::new_v4();
        assert_eq!(cache.apply(unknown), Err(CacheError::UnknownMutation(unknown)));
    }

    #[test]
    fn apply_without_entry_only_tracks_state() {
        let mut cache = TaskCache::new();
        let key = TaskQuery::default();
        let id = cache.stage(key.clone(), Tentative::Remove(1));
        cache.apply(id).unwrap();
        assert_eq!(cache.state(id), Some(MutationState::Pending));
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn prune_settled_keeps_pending_mutations() {
        let (mut cache, key) = seeded();
        let done = cache.stage(key.clone(), Tentative::Remove(1));
        cache.apply(done).unwrap();
        cache.reconcile(done, None).unwrap();
        let pending = cache.stage(key, Tentative::Remove(2));
        cache.apply(pending).unwrap();

        cache.prune_settled();
        assert_eq!(cache.state(done), None);
        assert_eq!(cache.state(pending), Some(MutationState::Pending));
    }

    #[test]
    fn invalidate_all_keeps_data_but_marks_stale() {
        let (mut cache, key) = seeded();
        cache.invalidate_all();
        assert!(!cache.is_fresh(&key));
        assert_eq!(ids(&cache, &key), vec![2, 1]);
    }
}
