//! # Operating Hours Store
//!
//! In-memory mirror of the clinic's seven weekday opening windows.
//!
//! Window edits are local drafts until [`OperatingHoursStore::save`]; the
//! enabled flag is flipped optimistically and persisted at once by
//! [`OperatingHoursStore::toggle_enabled`]. Every successful write is
//! followed by a fresh load so the mirror reflects what the service stored.

use std::sync::Arc;

use chrono::{DateTime, Utc, Weekday};
use clinicsched_core::{
    ScheduleError, ScheduleResult,
    models::{
        clock::TimeWindow,
        operating_hours::{OperatingHoursEntry, OperatingHoursUpdate},
    },
    time_codec,
};
use clinicsched_gateway::ConfigSyncGateway;
use eyre::eyre;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    row_edit::{Discarded, EditPolicy, RowEditController, RowEditState},
    sync::{SyncTracker, ToggleSnapshot},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowField {
    Start,
    End,
}

/// Unsaved window text for the day being edited. Either time form is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowDraft {
    pub start: String,
    pub end: String,
}

impl WindowDraft {
    pub fn from_window(window: &TimeWindow) -> Self {
        Self {
            start: window.start.to_string(),
            end: window.end.to_string(),
        }
    }

    pub fn set(&mut self, field: WindowField, value: &str) {
        let value = value.trim().to_string();
        match field {
            WindowField::Start => self.start = value,
            WindowField::End => self.end = value,
        }
    }

    /// Parses and validates the draft.
    pub fn to_window(&self) -> ScheduleResult<TimeWindow> {
        TimeWindow::new(
            time_codec::parse_flexible(&self.start)?,
            time_codec::parse_flexible(&self.end)?,
        )
    }
}

pub type HoursEditState = RowEditState<Weekday, WindowDraft>;

#[derive(Debug)]
struct HoursState {
    entries: Vec<OperatingHoursEntry>,
    edits: RowEditController<Weekday, WindowDraft>,
    sync: SyncTracker<Weekday>,
}

impl HoursState {
    fn entry(&self, day: Weekday) -> ScheduleResult<&OperatingHoursEntry> {
        self.entries
            .iter()
            .find(|entry| entry.day == day)
            .ok_or_else(|| missing(day))
    }

    fn entry_mut(&mut self, day: Weekday) -> ScheduleResult<&mut OperatingHoursEntry> {
        self.entries
            .iter_mut()
            .find(|entry| entry.day == day)
            .ok_or_else(|| missing(day))
    }
}

fn missing(day: Weekday) -> ScheduleError {
    ScheduleError::NotFound(format!("operating hours for {}", day))
}

/// Cheap to clone; clones share the same collection.
#[derive(Clone)]
pub struct OperatingHoursStore {
    gateway: Arc<dyn ConfigSyncGateway>,
    state: Arc<RwLock<HoursState>>,
}

impl OperatingHoursStore {
    pub fn new(gateway: Arc<dyn ConfigSyncGateway>) -> Self {
        Self::with_policy(gateway, EditPolicy::default())
    }

    pub fn with_policy(gateway: Arc<dyn ConfigSyncGateway>, policy: EditPolicy) -> Self {
        Self {
            gateway,
            state: Arc::new(RwLock::new(HoursState {
                entries: Vec::new(),
                edits: RowEditController::new(policy),
                sync: SyncTracker::default(),
            })),
        }
    }

    /// Replaces the collection with the service's current entries.
    ///
    /// On failure the previous entries are kept untouched.
    pub async fn load(&self) -> ScheduleResult<()> {
        let cancel = self.state.read().await.sync.token();
        let mut entries = match self.gateway.list_operating_hours(&cancel).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Failed to load operating hours: {}", err);
                return Err(err);
            }
        };

        if let Some(entry) = entries.iter().find(|entry| entry.window.validate().is_err()) {
            return Err(ScheduleError::Sync(eyre!(
                "clinic settings service returned an inverted window for {}: {}",
                entry.day,
                entry.window
            )));
        }
        entries.sort_by_key(|entry| entry.day.num_days_from_monday());
        if let Some(pair) = entries.windows(2).find(|pair| pair[0].day == pair[1].day) {
            return Err(ScheduleError::Sync(eyre!(
                "clinic settings service returned more than one entry for {}",
                pair[0].day
            )));
        }

        let mut state = self.state.write().await;
        state.entries = entries;
        state.sync.mark_loaded();
        info!("Loaded {} operating hours entries", state.entries.len());
        Ok(())
    }

    /// Entries in Mon→Sun order.
    pub async fn entries(&self) -> Vec<OperatingHoursEntry> {
        self.state.read().await.entries.clone()
    }

    pub async fn entry(&self, day: Weekday) -> Option<OperatingHoursEntry> {
        self.state.read().await.entry(day).ok().cloned()
    }

    pub async fn draft(&self, day: Weekday) -> Option<WindowDraft> {
        self.state.read().await.edits.draft(&day).cloned()
    }

    pub async fn edit_state(&self) -> HoursEditState {
        self.state.read().await.edits.state().clone()
    }

    pub async fn editing(&self) -> Option<Weekday> {
        self.state.read().await.edits.editing().copied()
    }

    /// True when a refresh after a successful write failed; cleared by the
    /// next successful [`load`](Self::load).
    pub async fn is_stale(&self) -> bool {
        self.state.read().await.sync.is_stale()
    }

    pub async fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.sync.last_synced_at()
    }

    pub async fn is_in_flight(&self, day: Weekday) -> bool {
        self.state.read().await.sync.is_in_flight(&day)
    }

    /// Cancels every outstanding gateway call of this collection.
    pub async fn cancel_in_flight(&self) {
        self.state.write().await.sync.cancel_all();
    }

    pub async fn begin_edit(
        &self,
        day: Weekday,
    ) -> ScheduleResult<Option<Discarded<Weekday, WindowDraft>>> {
        let mut state = self.state.write().await;
        let draft = WindowDraft::from_window(&state.entry(day)?.window);
        state.edits.begin_edit(day, draft)
    }

    pub async fn cancel_edit(&self) -> Option<Discarded<Weekday, WindowDraft>> {
        self.state.write().await.edits.cancel_edit()
    }

    /// Changes the draft of `day`, making it the edit target first if needed.
    /// Nothing is sent until `save`.
    pub async fn set_window(
        &self,
        day: Weekday,
        field: WindowField,
        value: &str,
    ) -> ScheduleResult<()> {
        let mut state = self.state.write().await;
        state.sync.ensure_idle(&day)?;
        if !state.edits.is_editing(&day) {
            let draft = WindowDraft::from_window(&state.entry(day)?.window);
            state.edits.begin_edit(day, draft)?;
        }
        state.edits.draft_mut(&day)?.set(field, value);
        Ok(())
    }

    /// Validates and persists the draft of `day`.
    ///
    /// Validation failures never reach the gateway. If the gateway fails the
    /// row stays in edit mode with its draft so the save can be retried.
    pub async fn save(&self, day: Weekday) -> ScheduleResult<()> {
        let (id, update, generation, cancel) = {
            let mut state = self.state.write().await;
            let draft = state
                .edits
                .draft(&day)
                .cloned()
                .ok_or_else(|| {
                    ScheduleError::EditConflict(format!("{} is not being edited", day))
                })?;
            let window = draft.to_window()?;
            let entry = state.entry(day)?;
            let id = entry.id.clone();
            let update = OperatingHoursUpdate {
                window,
                is_enabled: entry.enabled,
            };
            let cancel = state.sync.begin_request(&day)?;
            (id, update, state.sync.generation(), cancel)
        };

        let result = self
            .gateway
            .update_operating_hours(&id, &update, &cancel)
            .await;

        {
            let mut state = self.state.write().await;
            state.sync.end_request(&day);
            if let Err(err) = result {
                warn!("Saving operating hours for {} failed: {}", day, err);
                return Err(err);
            }
            state.edits.finish(&day);
            if state.sync.generation() == generation {
                if let Ok(entry) = state.entry_mut(day) {
                    entry.window = update.window;
                }
            } else {
                debug!("A newer load landed while saving {}; keeping it", day);
            }
        }

        info!("Saved operating hours for {}: {}", day, update.window);
        self.resync().await;
        Ok(())
    }

    /// Flips the enabled flag locally and persists it immediately.
    ///
    /// Returns the new value. On failure the pre-toggle value is restored and
    /// the collection is fetched again.
    pub async fn toggle_enabled(&self, day: Weekday) -> ScheduleResult<bool> {
        let (snapshot, id, update, cancel) = {
            let mut state = self.state.write().await;
            let entry = state.entry(day)?;
            let snapshot = ToggleSnapshot {
                key: day,
                original: entry.enabled,
                generation: state.sync.generation(),
            };
            let id = entry.id.clone();
            let update = OperatingHoursUpdate {
                window: entry.window,
                is_enabled: !entry.enabled,
            };
            let cancel = state.sync.begin_request(&day)?;
            if let Ok(entry) = state.entry_mut(day) {
                entry.enabled = update.is_enabled;
            }
            (snapshot, id, update, cancel)
        };

        let result = self
            .gateway
            .update_operating_hours(&id, &update, &cancel)
            .await;
        self.state.write().await.sync.end_request(&day);

        match result {
            Ok(()) => {
                info!(
                    "{} is now {}",
                    day,
                    if update.is_enabled { "open" } else { "closed" }
                );
                self.resync().await;
                Ok(update.is_enabled)
            }
            Err(err) => {
                warn!("Toggling {} failed, reverting: {}", day, err);
                self.revert_toggle(snapshot).await;
                self.resync().await;
                Err(err)
            }
        }
    }

    /// Restores the value captured in `snapshot`.
    ///
    /// Returns false, leaving the row alone, when a newer load has already
    /// replaced the collection or the day no longer exists.
    pub async fn revert_toggle(&self, snapshot: ToggleSnapshot<Weekday>) -> bool {
        let mut state = self.state.write().await;
        if state.sync.generation() != snapshot.generation {
            debug!("Skipping revert of {}: collection was reloaded", snapshot.key);
            return false;
        }
        match state.entry_mut(snapshot.key) {
            Ok(entry) => {
                entry.enabled = snapshot.original;
                true
            }
            Err(_) => false,
        }
    }

    async fn resync(&self) {
        if let Err(err) = self.load().await {
            warn!("Operating hours may be stale: {}", err);
            self.state.write().await.sync.mark_stale();
        }
    }
}
