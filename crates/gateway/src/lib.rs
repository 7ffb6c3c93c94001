//! # Clinic Settings Gateway
//!
//! The boundary between the scheduling engine and the remote clinic settings
//! service. [`ConfigSyncGateway`] is the consumed interface; [`HttpGateway`]
//! talks to the real service over JSON/HTTP, and the [`mock`] module provides
//! a mockall mock plus an in-memory fake for tests.
//!
//! Every call takes a [`CancellationToken`]. Implementations must return
//! [`ScheduleError::Cancelled`](clinicsched_core::ScheduleError::Cancelled)
//! once the token fires instead of completing the request.

/// Connection settings for the clinic settings service
pub mod config;
/// reqwest-backed gateway
pub mod http;
/// Test doubles
pub mod mock;

use async_trait::async_trait;
use clinicsched_core::{
    ScheduleResult,
    models::{
        operating_hours::{EntryId, OperatingHoursEntry, OperatingHoursUpdate},
        slot_type::{SlotType, SlotTypeFields, SlotTypeId},
    },
};
use tokio_util::sync::CancellationToken;

pub use config::GatewayConfig;
pub use http::HttpGateway;

/// Request/response access to the clinic settings service.
///
/// There are no push updates: callers only see remote changes by listing again.
#[async_trait]
pub trait ConfigSyncGateway: Send + Sync {
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

    async fn list_slot_types(&self, cancel: &CancellationToken) -> ScheduleResult<Vec<SlotType>>;

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
