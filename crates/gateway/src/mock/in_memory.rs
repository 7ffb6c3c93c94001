use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Weekday;
use clinicsched_core::{
    ScheduleError, ScheduleResult,
    models::{
        clock::{ClockTime, TimeWindow},
        operating_hours::{EntryId, OperatingHoursEntry, OperatingHoursUpdate},
        slot_type::{SlotType, SlotTypeFields, SlotTypeId},
        weekday::{WEEK, weekday_label},
    },
};
use eyre::eyre;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::ConfigSyncGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    ListOperatingHours,
    UpdateOperatingHours,
    ListSlotTypes,
    CreateSlotType,
    UpdateSlotType,
    DeleteSlotType,
}

/// Parks the next call of one operation until released.
#[derive(Debug, Clone, Default)]
pub struct GatewayHold {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl GatewayHold {
    /// Resolves once the held call has reached the gateway.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Default)]
struct Remote {
    hours: Vec<OperatingHoursEntry>,
    slot_types: Vec<SlotType>,
    calls: HashMap<GatewayOp, usize>,
    failures: HashMap<GatewayOp, usize>,
    holds: HashMap<GatewayOp, GatewayHold>,
}

/// A clinic settings service kept in memory, with failure injection and
/// call holds for exercising optimistic updates.
#[derive(Default)]
pub struct InMemoryGateway {
    remote: Mutex<Remote>,
}

impl InMemoryGateway {
    pub fn new(hours: Vec<OperatingHoursEntry>, slot_types: Vec<SlotType>) -> Self {
        Self {
            remote: Mutex::new(Remote {
                hours,
                slot_types,
                ..Remote::default()
            }),
        }
    }

    /// Seven entries, 09:00-17:00, open Monday to Saturday.
    pub fn standard_week() -> Vec<OperatingHoursEntry> {
        let window = TimeWindow {
            start: ClockTime::from_hm(9, 0).expect("valid clock time"),
            end: ClockTime::from_hm(17, 0).expect("valid clock time"),
        };
        WEEK.into_iter()
            .map(|day| OperatingHoursEntry {
                id: EntryId(format!("oh-{}", weekday_label(day).to_lowercase())),
                day,
                window,
                enabled: day != Weekday::Sun,
            })
            .collect()
    }

    pub async fn operating_hours(&self) -> Vec<OperatingHoursEntry> {
        self.remote.lock().await.hours.clone()
    }

    pub async fn slot_types(&self) -> Vec<SlotType> {
        self.remote.lock().await.slot_types.clone()
    }

    /// Changes a day directly, as another client would.
    pub async fn set_operating_hours(&self, entry: OperatingHoursEntry) {
        let mut remote = self.remote.lock().await;
        match remote.hours.iter().position(|existing| existing.day == entry.day) {
            Some(index) => remote.hours[index] = entry,
            None => remote.hours.push(entry),
        }
    }

    pub async fn insert_slot_type(&self, slot_type: SlotType) {
        self.remote.lock().await.slot_types.push(slot_type);
    }

    pub async fn calls(&self, op: GatewayOp) -> usize {
        self.remote.lock().await.calls.get(&op).copied().unwrap_or(0)
    }

    /// The next `times` calls of `op` fail with a sync error.
    pub async fn fail_next(&self, op: GatewayOp, times: usize) {
        self.remote.lock().await.failures.insert(op, times);
    }

    /// Parks the next call of `op` until [`GatewayHold::release`].
    pub async fn hold(&self, op: GatewayOp) -> GatewayHold {
        let hold = GatewayHold::default();
        self.remote.lock().await.holds.insert(op, hold.clone());
        hold
    }

    async fn begin(&self, op: GatewayOp, cancel: &CancellationToken) -> ScheduleResult<()> {
        let hold = {
            let mut remote = self.remote.lock().await;
            *remote.calls.entry(op).or_default() += 1;
            remote.holds.remove(&op)
        };

        if let Some(hold) = hold {
            hold.entered.notify_one();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ScheduleError::Cancelled),
                _ = hold.release.notified() => {}
            }
        }
        if cancel.is_cancelled() {
            return Err(ScheduleError::Cancelled);
        }

        let mut remote = self.remote.lock().await;
        if let Some(remaining) = remote.failures.get_mut(&op) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ScheduleError::Sync(eyre!("injected {:?} failure", op)));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigSyncGateway for InMemoryGateway {
    async fn list_operating_hours(
        &self,
        cancel: &CancellationToken,
    ) -> ScheduleResult<Vec<OperatingHoursEntry>> {
        self.begin(GatewayOp::ListOperatingHours, cancel).await?;
        Ok(self.operating_hours().await)
    }

    async fn update_operating_hours(
        &self,
        id: &EntryId,
        update: &OperatingHoursUpdate,
        cancel: &CancellationToken,
    ) -> ScheduleResult<()> {
        self.begin(GatewayOp::UpdateOperatingHours, cancel).await?;
        let mut remote = self.remote.lock().await;
        let entry = remote
            .hours
            .iter_mut()
            .find(|entry| &entry.id == id)
            .ok_or_else(|| eyre!("404: operating hours {} not found", id))?;
        entry.window = update.window;
        entry.enabled = update.is_enabled;
        Ok(())
    }

    async fn list_slot_types(&self, cancel: &CancellationToken) -> ScheduleResult<Vec<SlotType>> {
        self.begin(GatewayOp::ListSlotTypes, cancel).await?;
        Ok(self.slot_types().await)
    }

    async fn create_slot_type(
        &self,
        fields: &SlotTypeFields,
        cancel: &CancellationToken,
    ) -> ScheduleResult<SlotType> {
        self.begin(GatewayOp::CreateSlotType, cancel).await?;
        let slot_type = SlotType::from_fields(
            SlotTypeId(format!("st-{}", Uuid::new_v4())),
            fields.clone(),
        );
        self.remote.lock().await.slot_types.push(slot_type.clone());
        Ok(slot_type)
    }

    async fn update_slot_type(
        &self,
        id: &SlotTypeId,
        fields: &SlotTypeFields,
        cancel: &CancellationToken,
    ) -> ScheduleResult<()> {
        self.begin(GatewayOp::UpdateSlotType, cancel).await?;
        let mut remote = self.remote.lock().await;
        let slot_type = remote
            .slot_types
            .iter_mut()
            .find(|slot_type| &slot_type.id == id)
            .ok_or_else(|| eyre!("404: slot type {} not found", id))?;
        *slot_type = SlotType::from_fields(id.clone(), fields.clone());
        Ok(())
    }

    async fn delete_slot_type(
        &self,
        id: &SlotTypeId,
        cancel: &CancellationToken,
    ) -> ScheduleResult<()> {
        self.begin(GatewayOp::DeleteSlotType, cancel).await?;
        let mut remote = self.remote.lock().await;
        let before = remote.slot_types.len();
        remote.slot_types.retain(|slot_type| &slot_type.id != id);
        if remote.slot_types.len() == before {
            return Err(eyre!("404: slot type {} not found", id).into());
        }
        Ok(())
    }
}
