//! Activity store service: in-memory mapping plus its persisted file.
//!
//! # Responsibility
//! - Load the full store from the repository, or establish an empty one.
//! - Save the full store back, overwriting the previous snapshot.
//! - Expose add/delete/list over the in-memory mapping.
//!
//! # Invariants
//! - `load` always leaves a usable store; read and parse failures fall back
//!   to an empty mapping instead of propagating.
//! - A malformed snapshot is quarantined before the fallback, so a later
//!   `save` cannot destroy it.
//! - After an `Unreadable` fallback the file is still in place; `save` is
//!   refused until a successful load or an explicit `force_save`.
//! - `dirty` is true exactly when mutations happened after the last
//!   successful load or save.

use crate::model::activity::{Activity, ActivityId, ClockTime, DateKey};
use crate::repo::file_repo::{ActivityRepository, RepoError, RepoResult};
use crate::store::activity_store::ActivityStore;
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::time::Instant;

/// What `CalendarService::load` found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Snapshot decoded and installed.
    Loaded { dates: usize, records: usize },
    /// No snapshot existed; an empty one was written.
    Created,
    /// Snapshot was malformed, moved to `backup`, and replaced in memory by
    /// an empty store.
    Quarantined { backup: PathBuf, reason: String },
    /// Snapshot could not be read (or moved aside); memory holds an empty
    /// store.
    Unreadable { reason: String },
}

impl LoadOutcome {
    /// Whether the in-memory store was reset because of a bad snapshot.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Quarantined { .. } | Self::Unreadable { .. })
    }
}

/// Store object handed to the UI layer.
pub struct CalendarService<R: ActivityRepository> {
    repo: R,
    store: ActivityStore,
    dirty: bool,
    /// Reason the persisted file must not be overwritten, if any.
    save_block: Option<String>,
}

impl<R: ActivityRepository> CalendarService<R> {
    /// Creates a service with an empty store; nothing is read yet.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            store: ActivityStore::new(),
            dirty: false,
            save_block: None,
        }
    }

    /// Replaces the in-memory store with the persisted snapshot.
    ///
    /// # Errors
    /// - Returns an error only when the snapshot is missing and the empty
    ///   replacement cannot be written.
    pub fn load(&mut self) -> RepoResult<LoadOutcome> {
        let started_at = Instant::now();
        let path = self.repo.location().display().to_string();

        let outcome = match self.repo.read() {
            Ok(Some(store)) => {
                let outcome = LoadOutcome::Loaded {
                    dates: store.date_count(),
                    records: store.record_count(),
                };
                self.store = store;
                outcome
            }
            Ok(None) => {
                self.store = ActivityStore::new();
                self.repo.write(&self.store)?;
                LoadOutcome::Created
            }
            Err(RepoError::Malformed { message, .. }) => {
                self.store = ActivityStore::new();
                match self.repo.quarantine() {
                    Ok(backup) => LoadOutcome::Quarantined {
                        backup,
                        reason: message,
                    },
                    Err(err) => {
                        error!(
                            "event=store_quarantine module=service status=error path={} error={}",
                            path, err
                        );
                        LoadOutcome::Unreadable {
                            reason: format!("{message}; could not move file aside: {err}"),
                        }
                    }
                }
            }
            Err(err) => {
                self.store = ActivityStore::new();
                LoadOutcome::Unreadable {
                    reason: err.to_string(),
                }
            }
        };
        self.dirty = false;
        self.save_block = match &outcome {
            LoadOutcome::Unreadable { reason } => Some(reason.clone()),
            _ => None,
        };

        let duration_ms = started_at.elapsed().as_millis();
        match &outcome {
            LoadOutcome::Loaded { dates, records } => info!(
                "event=store_load module=service status=ok path={} dates={} records={} duration_ms={}",
                path, dates, records, duration_ms
            ),
            LoadOutcome::Created => info!(
                "event=store_load module=service status=created path={} duration_ms={}",
                path, duration_ms
            ),
            LoadOutcome::Quarantined { backup, reason } => warn!(
                "event=store_load module=service status=quarantined path={} backup={} duration_ms={} error={}",
                path,
                backup.display(),
                duration_ms,
                reason
            ),
            LoadOutcome::Unreadable { reason } => warn!(
                "event=store_load module=service status=fallback path={} duration_ms={} error={}",
                path, duration_ms, reason
            ),
        }

        Ok(outcome)
    }

    /// Writes the full store, overwriting the persisted snapshot.
    ///
    /// # Errors
    /// - `RepoError::Refused` while the last load could not read the file.
    pub fn save(&mut self) -> RepoResult<()> {
        if let Some(reason) = &self.save_block {
            warn!(
                "event=store_save module=service status=refused path={}",
                self.repo.location().display()
            );
            return Err(RepoError::Refused {
                path: self.repo.location().to_path_buf(),
                reason: reason.clone(),
            });
        }
        self.force_save()
    }

    /// Writes the full store even over a file the last load could not read.
    pub fn force_save(&mut self) -> RepoResult<()> {
        self.repo.write(&self.store)?;
        self.dirty = false;
        self.save_block = None;
        Ok(())
    }

    /// Whether `save` is currently refused.
    pub fn is_save_blocked(&self) -> bool {
        self.save_block.is_some()
    }

    /// Appends an activity under `date` and returns its id.
    pub fn add(
        &mut self,
        date: DateKey,
        time: ClockTime,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> ActivityId {
        let id = self.store.add(date, time, title, description);
        self.dirty = true;
        debug!(
            "event=activity_add module=service date={} position={}",
            date,
            self.store.list(date).len() - 1
        );
        id
    }

    /// Removes the activity at `position` under `date`; no-op when absent.
    pub fn delete(&mut self, date: DateKey, position: usize) -> Option<Activity> {
        let removed = self.store.delete(date, position);
        self.note_delete(date, removed.is_some());
        removed
    }

    /// Removes the activity with `id` under `date`; no-op when absent.
    pub fn delete_by_id(&mut self, date: DateKey, id: ActivityId) -> Option<Activity> {
        let removed = self.store.delete_by_id(date, id);
        self.note_delete(date, removed.is_some());
        removed
    }

    pub fn list(&self, date: DateKey) -> &[Activity] {
        self.store.list(date)
    }

    pub fn get(&self, date: DateKey, position: usize) -> Option<&Activity> {
        self.store.get(date, position)
    }

    pub fn find(&self, date: DateKey, id: ActivityId) -> Option<&Activity> {
        self.store.find(date, id)
    }

    pub fn contains_date(&self, date: DateKey) -> bool {
        self.store.contains_date(date)
    }

    pub fn dates(&self) -> Vec<DateKey> {
        self.store.dates().collect()
    }

    pub fn record_count(&self) -> usize {
        self.store.record_count()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn store(&self) -> &ActivityStore {
        &self.store
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    fn note_delete(&mut self, date: DateKey, removed: bool) {
        if removed {
            self.dirty = true;
        }
        debug!(
            "event=activity_delete module=service date={} status={} date_present={}",
            date,
            if removed { "ok" } else { "noop" },
            self.store.contains_date(date)
        );
    }
}
