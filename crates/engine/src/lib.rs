//! # Clinic Schedule Engine
//!
//! Client-side state for a clinic's weekly operating hours and slot types,
//! kept consistent with the clinic settings service through a
//! [`ConfigSyncGateway`].
//!
//! Both collections allow at most one row in edit mode at a time. Writes are
//! followed by a fresh load, so the local mirror always ends up reflecting
//! what the service stored rather than what was optimistically assumed.

use std::sync::Arc;

use chrono::Weekday;
use clinicsched_core::{ScheduleResult, models::slot_type::SlotType};
use clinicsched_gateway::ConfigSyncGateway;

pub mod operating_hours;
pub mod row_edit;
pub mod slot_types;
pub mod sync;

pub use operating_hours::{OperatingHoursStore, WindowDraft, WindowField};
pub use row_edit::{Discarded, EditPolicy, EditSession, RowEditController, RowEditState};
pub use slot_types::{SlotDraft, SlotField, SlotKey, SlotTypeStore};
pub use sync::ToggleSnapshot;

/// Both stores over one shared gateway.
#[derive(Clone)]
pub struct ScheduleEngine {
    hours: OperatingHoursStore,
    slot_types: SlotTypeStore,
}

impl ScheduleEngine {
    pub fn new(gateway: Arc<dyn ConfigSyncGateway>) -> Self {
        Self::with_policy(gateway, EditPolicy::default())
    }

    pub fn with_policy(gateway: Arc<dyn ConfigSyncGateway>, policy: EditPolicy) -> Self {
        Self {
            hours: OperatingHoursStore::with_policy(gateway.clone(), policy),
            slot_types: SlotTypeStore::with_policy(gateway, policy),
        }
    }

    pub fn operating_hours(&self) -> &OperatingHoursStore {
        &self.hours
    }

    pub fn slot_types(&self) -> &SlotTypeStore {
        &self.slot_types
    }

    /// Loads both collections concurrently. Each keeps its previous state if
    /// its own load fails; the first error is returned.
    pub async fn load_all(&self) -> ScheduleResult<()> {
        let (hours, slot_types) = tokio::join!(self.hours.load(), self.slot_types.load());
        hours?;
        slot_types
    }

    /// Slot types a booking client may be offered on `day`.
    ///
    /// The clinic must be open that day, the type must allow booking and
    /// apply on that day, and its window must lie inside the opening window.
    pub async fn bookable_slot_types(&self, day: Weekday) -> Vec<SlotType> {
        let Some(entry) = self.hours.entry(day).await else {
            return Vec::new();
        };
        if !entry.enabled {
            return Vec::new();
        }
        self.slot_types
            .slot_types()
            .await
            .into_iter()
            .filter(|slot_type| {
                slot_type.allow_booking
                    && slot_type.applies_on(day)
                    && entry.window.covers(&slot_type.window)
            })
            .collect()
    }

    pub async fn cancel_in_flight(&self) {
        self.hours.cancel_in_flight().await;
        self.slot_types.cancel_in_flight().await;
    }
}
