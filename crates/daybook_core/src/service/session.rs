//! UI-boundary session over a calendar service.
//!
//! # Responsibility
//! - Track the selected date and the listing last shown for it.
//! - Resolve display positions to stable activity ids.
//! - Build the read-only detail view and the status line.
//!
//! # Invariants
//! - Positions are only meaningful against the current `listing()`; the
//!   listing is refreshed after every mutation, load and date change.
//! - A position that no longer maps to a record is a silent no-op.

use crate::model::activity::{Activity, ActivityId, ClockTime, DateKey};
use crate::repo::file_repo::{ActivityRepository, RepoResult};
use crate::service::calendar_service::{CalendarService, LoadOutcome};
use chrono::NaiveTime;

const APP_TITLE: &str = "Activity Calendar";

/// One row of the listing shown for the selected date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub position: usize,
    pub id: ActivityId,
    pub time: ClockTime,
    pub title: String,
}

/// Read-only detail view of one activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityDetails {
    /// `"{date} | {time}"`.
    pub header: String,
    pub title: String,
    pub description: String,
}

/// Handler-side state holding the single owned service.
pub struct CalendarSession<R: ActivityRepository> {
    service: CalendarService<R>,
    selected: DateKey,
    listing: Vec<ListingRow>,
}

impl<R: ActivityRepository> CalendarSession<R> {
    pub fn new(service: CalendarService<R>, selected: DateKey) -> Self {
        let mut session = Self {
            service,
            selected,
            listing: Vec::new(),
        };
        session.refresh();
        session
    }

    pub fn selected_date(&self) -> DateKey {
        self.selected
    }

    /// Changes the selected date and repaints the listing.
    pub fn select(&mut self, date: DateKey) {
        self.selected = date;
        self.refresh();
    }

    pub fn listing(&self) -> &[ListingRow] {
        &self.listing
    }

    /// Adds an activity under the selected date.
    pub fn add(
        &mut self,
        time: ClockTime,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> ActivityId {
        let id = self.service.add(self.selected, time, title, description);
        self.refresh();
        id
    }

    /// Deletes the activity shown at `position` in the current listing.
    pub fn delete_selected(&mut self, position: usize) -> Option<Activity> {
        let id = self.listing.get(position)?.id;
        let removed = self.service.delete_by_id(self.selected, id);
        self.refresh();
        removed
    }

    /// Detail view for the activity shown at `position`.
    pub fn details(&self, position: usize) -> Option<ActivityDetails> {
        let row = self.listing.get(position)?;
        let activity = self.service.find(self.selected, row.id)?;
        Some(ActivityDetails {
            header: format!("{} | {}", self.selected, activity.time),
            title: activity.title.clone(),
            description: activity.description.clone(),
        })
    }

    pub fn load(&mut self) -> RepoResult<LoadOutcome> {
        let outcome = self.service.load();
        self.refresh();
        outcome
    }

    pub fn save(&mut self) -> RepoResult<()> {
        self.service.save()
    }

    pub fn force_save(&mut self) -> RepoResult<()> {
        self.service.force_save()
    }

    /// `"{selected date} | {HH:MM} | Activity Calendar"`.
    pub fn status_line(&self, now: NaiveTime) -> String {
        format!("{} | {} | {APP_TITLE}", self.selected, now.format("%H:%M"))
    }

    pub fn service(&self) -> &CalendarService<R> {
        &self.service
    }

    pub fn into_service(self) -> CalendarService<R> {
        self.service
    }

    fn refresh(&mut self) {
        self.listing = self
            .service
            .list(self.selected)
            .iter()
            .enumerate()
            .map(|(position, activity)| ListingRow {
                position,
                id: activity.id,
                time: activity.time,
                title: activity.title.clone(),
            })
            .collect();
    }
}
