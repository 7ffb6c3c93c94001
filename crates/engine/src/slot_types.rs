//! # Slot Type Store
//!
//! In-memory mirror of the clinic's slot types.
//!
//! A row being edited is keyed by [`SlotKey`]: existing rows by id, and the
//! single not-yet-persisted row by [`SlotKey::Draft`]. Saving a draft creates
//! it remotely; saving an existing row updates it. Booking toggles and deletes
//! go to the service at once.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clinicsched_core::{
    ScheduleError, ScheduleResult,
    models::{
        clock::TimeWindow,
        slot_type::{NewSlotType, SlotCategory, SlotType, SlotTypeFields, SlotTypeId},
        weekday::WeekdaySet,
    },
    time_codec,
};
use clinicsched_gateway::ConfigSyncGateway;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    row_edit::{Discarded, EditPolicy, RowEditController, RowEditState},
    sync::{SyncTracker, ToggleSnapshot},
};

/// Identifies a row of the slot-type collection, persisted or not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SlotKey {
    /// The row opened by `begin_add` that has no id yet.
    Draft,
    Id(SlotTypeId),
}

impl From<SlotTypeId> for SlotKey {
    fn from(id: SlotTypeId) -> Self {
        SlotKey::Id(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotField {
    Label,
    Start,
    End,
    Price,
}

/// Unsaved text of the slot-type row being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDraft {
    pub label: String,
    pub category: SlotCategory,
    pub start: String,
    pub end: String,
    pub price: String,
    pub allow_booking: bool,
    pub days: WeekdaySet,
}

impl SlotDraft {
    /// Starting point for a new row: 09:00–17:00, free, bookable.
    pub fn new(category: SlotCategory) -> Self {
        Self {
            label: String::new(),
            category,
            start: "09:00".to_string(),
            end: "17:00".to_string(),
            price: "0".to_string(),
            allow_booking: true,
            days: WeekdaySet::new(),
        }
    }

    pub fn from_slot_type(slot_type: &SlotType) -> Self {
        Self {
            label: slot_type.label.clone(),
            category: slot_type.category,
            start: slot_type.window.start.to_string(),
            end: slot_type.window.end.to_string(),
            price: slot_type.price.to_string(),
            allow_booking: slot_type.allow_booking,
            days: slot_type.days,
        }
    }

    pub fn set(&mut self, field: SlotField, value: &str) {
        match field {
            SlotField::Label => self.label = value.to_string(),
            SlotField::Start => self.start = value.trim().to_string(),
            SlotField::End => self.end = value.trim().to_string(),
            SlotField::Price => self.price = value.trim().to_string(),
        }
    }

    /// Parses, normalizes and validates the draft into a request body.
    pub fn to_fields(&self) -> ScheduleResult<SlotTypeFields> {
        let window = TimeWindow::new(
            time_codec::parse_flexible(&self.start)?,
            time_codec::parse_flexible(&self.end)?,
        )?;
        let fields = SlotTypeFields {
            label: self.label.clone(),
            category: self.category,
            window,
            price: parse_price(&self.price)?,
            allow_booking: self.allow_booking,
            days: self.days,
        }
        .normalized();
        fields.validate()?;
        Ok(fields)
    }
}

fn parse_price(raw: &str) -> ScheduleResult<Decimal> {
    let price = Decimal::from_str(raw.trim())
        .map_err(|_| ScheduleError::Validation(format!("price '{}' is not a number", raw)))?;
    if price.normalize().scale() > 2 {
        return Err(ScheduleError::Validation(format!(
            "price '{}' has more than two decimal places",
            raw
        )));
    }
    Ok(price)
}

pub type SlotEditState = RowEditState<SlotKey, SlotDraft>;

#[derive(Debug)]
struct SlotState {
    slot_types: Vec<SlotType>,
    edits: RowEditController<SlotKey, SlotDraft>,
    sync: SyncTracker<SlotKey>,
}

impl SlotState {
    fn slot(&self, id: &SlotTypeId) -> ScheduleResult<&SlotType> {
        self.slot_types
            .iter()
            .find(|slot_type| &slot_type.id == id)
            .ok_or_else(|| missing(id))
    }

    fn slot_mut(&mut self, id: &SlotTypeId) -> ScheduleResult<&mut SlotType> {
        self.slot_types
            .iter_mut()
            .find(|slot_type| &slot_type.id == id)
            .ok_or_else(|| missing(id))
    }

    fn ensure_editing(&mut self, key: &SlotKey) -> ScheduleResult<()> {
        if self.edits.is_editing(key) {
            return Ok(());
        }
        match key {
            SlotKey::Id(id) => {
                let draft = SlotDraft::from_slot_type(self.slot(id)?);
                self.edits.begin_edit(key.clone(), draft)?;
                Ok(())
            }
            SlotKey::Draft => Err(ScheduleError::EditConflict(
                "no unsaved slot type is open; call begin_add first".into(),
            )),
        }
    }
}

fn missing(id: &SlotTypeId) -> ScheduleError {
    ScheduleError::NotFound(format!("slot type {}", id))
}

#[derive(Clone)]
pub struct SlotTypeStore {
    gateway: Arc<dyn ConfigSyncGateway>,
    state: Arc<RwLock<SlotState>>,
}

impl SlotTypeStore {
    pub fn new(gateway: Arc<dyn ConfigSyncGateway>) -> Self {
        Self::with_policy(gateway, EditPolicy::default())
    }

    pub fn with_policy(gateway: Arc<dyn ConfigSyncGateway>, policy: EditPolicy) -> Self {
        Self {
            gateway,
            state: Arc::new(RwLock::new(SlotState {
                slot_types: Vec::new(),
                edits: RowEditController::new(policy),
                sync: SyncTracker::default(),
            })),
        }
    }

    /// Replaces the collection with the service's slot types, in service order.
    pub async fn load(&self) -> ScheduleResult<()> {
        let cancel = self.state.read().await.sync.token();
        let slot_types = match self.gateway.list_slot_types(&cancel).await {
            Ok(slot_types) => slot_types,
            Err(err) => {
                warn!("Failed to load slot types: {}", err);
                return Err(err);
            }
        };

        if let Some(slot_type) = slot_types
            .iter()
            .find(|slot_type| slot_type.window.validate().is_err())
        {
            return Err(ScheduleError::Sync(eyre::eyre!(
                "clinic settings service returned an inverted window for slot type {}: {}",
                slot_type.id,
                slot_type.window
            )));
        }

        let mut state = self.state.write().await;
        state.slot_types = slot_types;
        state.sync.mark_loaded();
        info!("Loaded {} slot types", state.slot_types.len());
        Ok(())
    }

    pub async fn slot_types(&self) -> Vec<SlotType> {
        self.state.read().await.slot_types.clone()
    }

    pub async fn slot_type(&self, id: &SlotTypeId) -> Option<SlotType> {
        self.state.read().await.slot(id).ok().cloned()
    }

    pub async fn draft(&self, key: &SlotKey) -> Option<SlotDraft> {
        self.state.read().await.edits.draft(key).cloned()
    }

    pub async fn edit_state(&self) -> SlotEditState {
        self.state.read().await.edits.state().clone()
    }

    pub async fn editing(&self) -> Option<SlotKey> {
        self.state.read().await.edits.editing().cloned()
    }

    pub async fn is_stale(&self) -> bool {
        self.state.read().await.sync.is_stale()
    }

    pub async fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.sync.last_synced_at()
    }

    pub async fn is_in_flight(&self, key: &SlotKey) -> bool {
        self.state.read().await.sync.is_in_flight(key)
    }

    pub async fn cancel_in_flight(&self) {
        self.state.write().await.sync.cancel_all();
    }

    /// Opens an existing slot type for editing.
    pub async fn begin_edit(
        &self,
        id: &SlotTypeId,
    ) -> ScheduleResult<Option<Discarded<SlotKey, SlotDraft>>> {
        let mut state = self.state.write().await;
        let draft = SlotDraft::from_slot_type(state.slot(id)?);
        state.edits.begin_edit(SlotKey::Id(id.clone()), draft)
    }

    /// Opens a blank, unsaved row of `category` as the edit target.
    pub async fn begin_add(
        &self,
        category: SlotCategory,
    ) -> ScheduleResult<Option<Discarded<SlotKey, SlotDraft>>> {
        let mut state = self.state.write().await;
        state.edits.begin_edit(SlotKey::Draft, SlotDraft::new(category))
    }

    pub async fn cancel_edit(&self) -> Option<Discarded<SlotKey, SlotDraft>> {
        self.state.write().await.edits.cancel_edit()
    }

    /// Changes one text field of `key`'s draft. An existing row becomes the
    /// edit target first if needed; the unsaved row must have been opened by
    /// `begin_add`.
    pub async fn set_field(
        &self,
        key: &SlotKey,
        field: SlotField,
        value: &str,
    ) -> ScheduleResult<()> {
        let mut state = self.state.write().await;
        state.sync.ensure_idle(key)?;
        state.ensure_editing(key)?;
        state.edits.draft_mut(key)?.set(field, value);
        Ok(())
    }

    /// Replaces the day set of `key`'s draft; persisted by the next `save`.
    ///
    /// Only recurring day-off types carry days; a regular type is rejected.
    pub async fn update_days(&self, key: &SlotKey, days: WeekdaySet) -> ScheduleResult<()> {
        let mut state = self.state.write().await;
        state.sync.ensure_idle(key)?;
        let category = match (state.edits.draft(key), key) {
            (Some(draft), _) => Some(draft.category),
            (None, SlotKey::Id(id)) => Some(state.slot(id)?.category),
            (None, SlotKey::Draft) => None,
        };
        if category.is_some_and(|category| !category.uses_days()) {
            return Err(ScheduleError::Validation(
                "only recurring day-off slot types have a day set".into(),
            ));
        }
        state.ensure_editing(key)?;
        state.edits.draft_mut(key)?.days = days;
        debug!("Days of {:?} are now {}", key, days);
        Ok(())
    }

    /// Validates and persists the row being edited under `key`.
    ///
    /// A draft row is created remotely; an existing row is updated. Returns
    /// the id of the persisted row. On failure the edit stays open.
    pub async fn save(&self, key: &SlotKey) -> ScheduleResult<SlotTypeId> {
        let (fields, generation, cancel) = {
            let mut state = self.state.write().await;
            let draft = state.edits.draft(key).cloned().ok_or_else(|| {
                ScheduleError::EditConflict(format!("{:?} is not being edited", key))
            })?;
            let mut fields = draft.to_fields()?;
            if let SlotKey::Id(id) = key {
                // Booking is toggled outside the edit session.
                fields.allow_booking = state.slot(id)?.allow_booking;
            }
            let cancel = state.sync.begin_request(key)?;
            (fields, state.sync.generation(), cancel)
        };

        let outcome = match key {
            SlotKey::Draft => self
                .gateway
                .create_slot_type(&fields, &cancel)
                .await
                .map(Some),
            SlotKey::Id(id) => self
                .gateway
                .update_slot_type(id, &fields, &cancel)
                .await
                .map(|()| None),
        };

        let id = {
            let mut state = self.state.write().await;
            state.sync.end_request(key);
            let created = match outcome {
                Ok(created) => created,
                Err(err) => {
                    warn!("Saving slot type {:?} failed: {}", key, err);
                    return Err(err);
                }
            };
            state.edits.finish(key);
            let current = state.sync.generation() == generation;
            match (created, key) {
                (Some(slot_type), _) => {
                    let id = slot_type.id.clone();
                    if current {
                        state.slot_types.push(slot_type);
                    }
                    id
                }
                (None, SlotKey::Id(id)) => {
                    if current {
                        if let Ok(slot_type) = state.slot_mut(id) {
                            *slot_type = SlotType::from_fields(id.clone(), fields.clone());
                        }
                    }
                    id.clone()
                }
                (None, SlotKey::Draft) => {
                    return Err(ScheduleError::Sync(eyre::eyre!(
                        "create returned no slot type"
                    )));
                }
            }
        };

        info!("Saved slot type {} ({})", id, fields.label);
        self.resync().await;
        Ok(id)
    }

    /// Creates a slot type directly, without an edit session.
    pub async fn add(&self, fields: NewSlotType) -> ScheduleResult<SlotType> {
        let fields = fields.normalized();
        fields.validate()?;

        let (generation, cancel) = {
            let state = self.state.read().await;
            (state.sync.generation(), state.sync.token())
        };
        let created = match self.gateway.create_slot_type(&fields, &cancel).await {
            Ok(created) => created,
            Err(err) => {
                warn!("Adding slot type '{}' failed: {}", fields.label, err);
                return Err(err);
            }
        };

        {
            let mut state = self.state.write().await;
            if state.sync.generation() == generation {
                state.slot_types.push(created.clone());
            }
        }
        info!("Added slot type {} ({})", created.id, created.label);
        self.resync().await;
        Ok(created)
    }

    /// Flips `allow_booking` locally and persists it immediately.
    pub async fn toggle_booking(&self, id: &SlotTypeId) -> ScheduleResult<bool> {
        let key = SlotKey::Id(id.clone());
        let (snapshot, fields, cancel) = {
            let mut state = self.state.write().await;
            let mut fields = state.slot(id)?.fields();
            let snapshot = ToggleSnapshot {
                key: id.clone(),
                original: fields.allow_booking,
                generation: state.sync.generation(),
            };
            fields.allow_booking = !fields.allow_booking;
            let cancel = state.sync.begin_request(&key)?;
            if let Ok(slot_type) = state.slot_mut(id) {
                slot_type.allow_booking = fields.allow_booking;
            }
            (snapshot, fields, cancel)
        };

        let result = self.gateway.update_slot_type(id, &fields, &cancel).await;
        self.state.write().await.sync.end_request(&key);

        match result {
            Ok(()) => {
                info!(
                    "Booking for slot type {} is now {}",
                    id,
                    if fields.allow_booking { "allowed" } else { "blocked" }
                );
                self.resync().await;
                Ok(fields.allow_booking)
            }
            Err(err) => {
                warn!("Toggling booking for slot type {} failed, reverting: {}", id, err);
                self.revert_toggle(snapshot).await;
                self.resync().await;
                Err(err)
            }
        }
    }

    /// Restores `allow_booking` from `snapshot` unless the collection was
    /// reloaded since the snapshot was taken.
    pub async fn revert_toggle(&self, snapshot: ToggleSnapshot<SlotTypeId>) -> bool {
        let mut state = self.state.write().await;
        if state.sync.generation() != snapshot.generation {
            debug!("Skipping revert of {}: collection was reloaded", snapshot.key);
            return false;
        }
        match state.slot_mut(&snapshot.key) {
            Ok(slot_type) => {
                slot_type.allow_booking = snapshot.original;
                true
            }
            Err(_) => false,
        }
    }

    /// Deletes a slot type remotely, then locally.
    ///
    /// On failure the collection is fetched again; the row is never restored
    /// from local memory.
    pub async fn delete(&self, id: &SlotTypeId) -> ScheduleResult<()> {
        let key = SlotKey::Id(id.clone());
        let (generation, cancel) = {
            let mut state = self.state.write().await;
            state.slot(id)?;
            let cancel = state.sync.begin_request(&key)?;
            (state.sync.generation(), cancel)
        };

        let result = self.gateway.delete_slot_type(id, &cancel).await;

        {
            let mut state = self.state.write().await;
            state.sync.end_request(&key);
            if result.is_ok() {
                state.edits.discard(&key);
                if state.sync.generation() == generation {
                    state.slot_types.retain(|slot_type| &slot_type.id != id);
                }
            }
        }

        match result {
            Ok(()) => {
                info!("Deleted slot type {}", id);
                self.resync().await;
                Ok(())
            }
            Err(err) => {
                warn!("Deleting slot type {} failed, re-fetching: {}", id, err);
                self.resync().await;
                Err(err)
            }
        }
    }

    async fn resync(&self) {
        if let Err(err) = self.load().await {
            warn!("Slot types may be stale: {}", err);
            self.state.write().await.sync.mark_stale();
        }
    }
}
