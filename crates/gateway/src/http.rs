use std::future::Future;

use async_trait::async_trait;
use clinicsched_core::{
    ScheduleError, ScheduleResult,
    models::{
        operating_hours::{EntryId, OperatingHoursEntry, OperatingHoursUpdate},
        slot_type::{SlotType, SlotTypeFields, SlotTypeId},
    },
};
use eyre::{WrapErr, eyre};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, de::DeserializeOwned};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{ConfigSyncGateway, config::GatewayConfig};

const OPERATING_HOURS_PATH: &str = "clinic/operating-hours";
const SLOT_TYPES_PATH: &str = "clinic/slot-types";

/// Responses from the clinic settings service wrap their payload in `data`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// [`ConfigSyncGateway`] over JSON/HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> eyre::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .wrap_err("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Sends the request and returns the body of a 2xx response.
    async fn execute(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> ScheduleResult<String> {
        let call = async {
            let response = request
                .bearer_auth(&self.config.bearer_token)
                .send()
                .await
                .map_err(|err| self.transport_error(err))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|err| self.transport_error(err))?;

            if !status.is_success() {
                return Err(ScheduleError::Sync(eyre!(
                    "clinic settings service returned {}: {}",
                    status,
                    body
                )));
            }
            Ok(body)
        };
        cancellable(call, cancel).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> ScheduleResult<T> {
        let body = self.execute(request, cancel).await?;
        let envelope: Envelope<T> = serde_json::from_str(&body)
            .wrap_err("Malformed response from clinic settings service")?;
        Ok(envelope.data)
    }

    fn transport_error(&self, err: reqwest::Error) -> ScheduleError {
        if err.is_timeout() {
            ScheduleError::Timeout(self.config.request_timeout)
        } else {
            ScheduleError::Sync(eyre!(err).wrap_err("Failed to reach clinic settings service"))
        }
    }
}

/// `collection/{id}` with the id escaped as a single path segment.
fn item_path(collection: &str, id: &str) -> String {
    format!("{}/{}", collection, urlencoding::encode(id))
}

async fn cancellable<T, F>(call: F, cancel: &CancellationToken) -> ScheduleResult<T>
where
    F: Future<Output = ScheduleResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ScheduleError::Cancelled),
        result = call => result,
    }
}

#[async_trait]
impl ConfigSyncGateway for HttpGateway {
    async fn list_operating_hours(
        &self,
        cancel: &CancellationToken,
    ) -> ScheduleResult<Vec<OperatingHoursEntry>> {
        let url = self.config.endpoint(OPERATING_HOURS_PATH);
        debug!("GET {}", url);
        self.fetch(self.client.get(url), cancel).await
    }

    async fn update_operating_hours(
        &self,
        id: &EntryId,
        update: &OperatingHoursUpdate,
        cancel: &CancellationToken,
    ) -> ScheduleResult<()> {
        let url = self.config.endpoint(&item_path(OPERATING_HOURS_PATH, &id.0));
        debug!("PUT {}", url);
        self.execute(self.client.put(url).json(update), cancel).await?;
        Ok(())
    }

    async fn list_slot_types(&self, cancel: &CancellationToken) -> ScheduleResult<Vec<SlotType>> {
        let url = self.config.endpoint(SLOT_TYPES_PATH);
        debug!("GET {}", url);
        self.fetch(self.client.get(url), cancel).await
    }

    async fn create_slot_type(
        &self,
        fields: &SlotTypeFields,
        cancel: &CancellationToken,
    ) -> ScheduleResult<SlotType> {
        let url = self.config.endpoint(SLOT_TYPES_PATH);
        debug!("POST {}", url);
        self.fetch(self.client.post(url).json(fields), cancel).await
    }

    async fn update_slot_type(
        &self,
        id: &SlotTypeId,
        fields: &SlotTypeFields,
        cancel: &CancellationToken,
    ) -> ScheduleResult<()> {
        let url = self.config.endpoint(&item_path(SLOT_TYPES_PATH, &id.0));
        debug!("PUT {}", url);
        self.execute(self.client.put(url).json(fields), cancel).await?;
        Ok(())
    }

    async fn delete_slot_type(
        &self,
        id: &SlotTypeId,
        cancel: &CancellationToken,
    ) -> ScheduleResult<()> {
        let url = self.config.endpoint(&item_path(SLOT_TYPES_PATH, &id.0));
        debug!("DELETE {}", url);
        self.execute(self.client.delete(url), cancel).await?;
        Ok(())
    }
}
