//! Loading status per data section and single-flight guards for backend tasks.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::models::Blockchain;

/// A slice of state whose loading progress is tracked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Blockchain(Blockchain),
    LoopringBalances,
    Prices,
    NonFungibleBalances,
    ExchangeBalances,
    ManualBalances,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    None,
    Loading,
    Loaded,
    Refreshing,
}

impl Status {
    /// A fetch for this section is already running.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Status::Loading | Status::Refreshing)
    }

    /// Shown as loading: never fetched or on its first fetch.
    pub fn is_loading(self) -> bool {
        matches!(self, Status::None | Status::Loading)
    }

    /// The status a new fetch starts in, given the current one.
    pub fn next_fetch(self) -> Status {
        if self == Status::Loaded {
            Status::Refreshing
        } else {
            Status::Loading
        }
    }
}

pub type SectionStatuses = HashMap<Section, Status>;

/// Thread-safe map of section statuses.
#[derive(Debug, Default)]
pub struct StatusTracker {
    statuses: Mutex<SectionStatuses>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, section: Section) -> Status {
        self.statuses
            .lock()
            .expect("status lock poisoned")
            .get(&section)
            .copied()
            .unwrap_or_default()
    }

    pub fn set(&self, section: Section, status: Status) {
        self.statuses
            .lock()
            .expect("status lock poisoned")
            .insert(section, status);
    }

    /// Atomically move `section` into its fetching status.
    ///
    /// Returns the previous status, or `None` when a fetch is already in flight.
    pub fn try_begin(&self, section: Section) -> Option<Status> {
        let mut statuses = self.statuses.lock().expect("status lock poisoned");
        let current = statuses.get(&section).copied().unwrap_or_default();
        if current.is_in_flight() {
            return None;
        }
        statuses.insert(section, current.next_fetch());
        Some(current)
    }

    /// Like [`StatusTracker::try_begin`], but a loaded section is only
    /// refetched when `refresh` is set.
    pub fn try_begin_refresh(&self, section: Section, refresh: bool) -> Option<Status> {
        let mut statuses = self.statuses.lock().expect("status lock poisoned");
        let current = statuses.get(&section).copied().unwrap_or_default();
        if current.is_in_flight() || (current == Status::Loaded && !refresh) {
            return None;
        }
        let next = if refresh {
            Status::Refreshing
        } else {
            Status::Loading
        };
        statuses.insert(section, next);
        Some(current)
    }

    pub fn snapshot(&self) -> SectionStatuses {
        self.statuses.lock().expect("status lock poisoned").clone()
    }

    pub fn reset(&self) {
        self.statuses.lock().expect("status lock poisoned").clear();
    }
}

/// Backend task kinds that must not run concurrently with themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    QueryBalances,
    AddAccount,
    RemoveAccount,
    AddEth2Validator,
}

/// Tracks which task types are currently running.
#[derive(Debug, Clone, Default)]
pub struct TaskTracker {
    running: Arc<Mutex<HashSet<TaskType>>>,
}

impl TaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `task`. Returns `None` when a task of that type is already running.
    pub fn try_start(&self, task: TaskType) -> Option<TaskGuard> {
        let mut running = self.running.lock().expect("task lock poisoned");
        if !running.insert(task) {
            return None;
        }
        Some(TaskGuard {
            running: Arc::clone(&self.running),
            task,
        })
    }

    pub fn is_running(&self, task: TaskType) -> bool {
        self.running
            .lock()
            .expect("task lock poisoned")
            .contains(&task)
    }
}

/// Releases the claimed task type when dropped.
#[derive(Debug)]
pub struct TaskGuard {
    running: Arc<Mutex<HashSet<TaskType>>>,
    task: TaskType,
}

impl TaskGuard {
    pub fn task(&self) -> TaskType {
        self.task
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        if let Ok(mut running) = self.running.lock() {
            running.remove(&self.task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_begin_skips_in_flight_sections() {
        let tracker = StatusTracker::new();
        let section = Section::Blockchain(Blockchain::Eth);

        assert_eq!(tracker.try_begin(section), Some(Status::None));
        assert_eq!(tracker.get(section), Status::Loading);
        assert_eq!(tracker.try_begin(section), None);

        tracker.set(section, Status::Loaded);
        assert_eq!(tracker.try_begin(section), Some(Status::Loaded));
        assert_eq!(tracker.get(section), Status::Refreshing);
        assert_eq!(tracker.try_begin(section), None);
    }

    #[test]
    fn try_begin_refresh_keeps_loaded_sections_unless_asked() {
        let tracker = StatusTracker::new();
        let section = Section::LoopringBalances;

        assert_eq!(tracker.try_begin_refresh(section, false), Some(Status::None));
        assert_eq!(tracker.get(section), Status::Loading);
        assert_eq!(tracker.try_begin_refresh(section, true), None);

        tracker.set(section, Status::Loaded);
        assert_eq!(tracker.try_begin_refresh(section, false), None);
        assert_eq!(tracker.get(section), Status::Loaded);

        assert_eq!(tracker.try_begin_refresh(section, true), Some(Status::Loaded));
        assert_eq!(tracker.get(section), Status::Refreshing);
        assert_eq!(tracker.try_begin_refresh(section, true), None);
    }

    #[test]
    fn unknown_section_reports_none() {
        let tracker = StatusTracker::new();
        assert_eq!(tracker.get(Section::Prices), Status::None);
        assert!(tracker.get(Section::Prices).is_loading());
    }

    #[test]
    fn task_guard_releases_on_drop() {
        let tracker = TaskTracker::new();
        let guard = tracker.try_start(TaskType::AddAccount);
        assert!(guard.is_some());
        assert!(tracker.try_start(TaskType::AddAccount).is_none());
        assert!(tracker.try_start(TaskType::RemoveAccount).is_some());

        drop(guard);
        assert!(!tracker.is_running(TaskType::AddAccount));
        assert!(tracker.try_start(TaskType::AddAccount).is_some());
    }
}
