//! Date-keyed activity mapping.
//!
//! # Responsibility
//! - Append, remove and list activities per date.
//! - Keep per-date insertion order, which is the display order.
//!
//! # Invariants
//! - A date key exists only while its sequence is non-empty.
//! - Removal preserves the relative order of the remaining records.
//! - Dates iterate in ascending calendar order.

use crate::model::activity::{Activity, ActivityId, ClockTime, DateKey};
use std::collections::BTreeMap;

/// Ordered activity sequences keyed by date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityStore {
    days: BTreeMap<DateKey, Vec<Activity>>,
}

impl ActivityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from decoded sequences, dropping empty dates.
    pub fn from_days(days: BTreeMap<DateKey, Vec<Activity>>) -> Self {
        let days = days
            .into_iter()
            .filter(|(_, activities)| !activities.is_empty())
            .collect();
        Self { days }
    }

    /// Read access to the whole mapping, e.g. for serialization.
    pub fn days(&self) -> &BTreeMap<DateKey, Vec<Activity>> {
        &self.days
    }

    /// Appends a new record under `date` and returns its id.
    ///
    /// Field contents are not validated.
    pub fn add(
        &mut self,
        date: DateKey,
        time: ClockTime,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> ActivityId {
        self.push(date, Activity::new(time, title, description))
    }

    /// Appends an existing record under `date` and returns its id.
    pub fn push(&mut self, date: DateKey, activity: Activity) -> ActivityId {
        let id = activity.id;
        self.days.entry(date).or_default().push(activity);
        id
    }

    /// Removes the record at `position` under `date`.
    ///
    /// Returns `None` without touching the store when the date has no
    /// records or the position is out of range.
    pub fn delete(&mut self, date: DateKey, position: usize) -> Option<Activity> {
        let activities = self.days.get_mut(&date)?;
        if position >= activities.len() {
            return None;
        }
        let removed = activities.remove(position);
        self.prune(date);
        Some(removed)
    }

    /// Removes the record with `id` under `date`.
    pub fn delete_by_id(&mut self, date: DateKey, id: ActivityId) -> Option<Activity> {
        let position = self.position_of(date, id)?;
        self.delete(date, position)
    }

    /// Records under `date` in insertion order; empty when none exist.
    pub fn list(&self, date: DateKey) -> &[Activity] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn get(&self, date: DateKey, position: usize) -> Option<&Activity> {
        self.list(date).get(position)
    }

    pub fn find(&self, date: DateKey, id: ActivityId) -> Option<&Activity> {
        self.list(date).iter().find(|activity| activity.id == id)
    }

    pub fn position_of(&self, date: DateKey, id: ActivityId) -> Option<usize> {
        self.list(date).iter().position(|activity| activity.id == id)
    }

    pub fn contains_date(&self, date: DateKey) -> bool {
        self.days.contains_key(&date)
    }

    /// Dates that currently hold at least one record, ascending.
    pub fn dates(&self) -> impl Iterator<Item = DateKey> + '_ {
        self.days.keys().copied()
    }

    pub fn date_count(&self) -> usize {
        self.days.len()
    }

    pub fn record_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    fn prune(&mut self, date: DateKey) {
        if self.days.get(&date).is_some_and(Vec::is_empty) {
            self.days.remove(&date);
        }
    }
}
