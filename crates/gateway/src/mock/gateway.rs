use async_trait::async_trait;
use clinicsched_core::{
    ScheduleResult,
    models::{
        operating_hours::{EntryId, OperatingHoursEntry, OperatingHoursUpdate},
        slot_type::{SlotType, SlotTypeFields, SlotTypeId},
    },
};
use mockall::mock;
use tokio_util::sync::CancellationToken;

use crate::ConfigSyncGateway;

// Mock gateway for testing
mock! {
    pub Gateway {}

    #[async_trait]
    impl ConfigSyncGateway for Gateway {
        async fn list_operating_hours(
            &self,
            cancel: &CancellationToken,
        ) -> ScheduleResult<Vec<OperatingHoursEntry>>;

        async fn update_operating_hours(
            &self,
            id: &EntryId,
            update: &OperatingHoursUpdate,
            cancel: &CancellationToken,
        ) -> ScheduleResult<()>;

        async fn list_slot_types(
            &self,
            cancel: &CancellationToken,
        ) -> ScheduleResult<Vec<SlotType>>;

        async fn create_slot_type(
            &self,
            fields: &SlotTypeFields,
            cancel: &CancellationToken,
        ) -> ScheduleResult<SlotType>;

        async fn update_slot_type(
            &self,
            id: &SlotTypeId,
            fields: &SlotTypeFields,
            cancel: &CancellationToken,
        ) -> ScheduleResult<()>;

        async fn delete_slot_type(
            &self,
            id: &SlotTypeId,
            cancel: &CancellationToken,
        ) -> ScheduleResult<()>;
    }
}
