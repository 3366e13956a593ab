use crate::errors::Result;
use crate::model::TelemetrySample;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Opaque handle returned by a successful sign-in.
#[derive(Clone)]
pub struct Session {
    pub token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("token", &"***").finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub name: String,
    pub model: String,
    pub id: String,
}

/// The vendor cloud the monitor reports into.
///
/// Every call is read-only, so the fetcher may repeat `fetch_properties`
/// freely.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    async fn authenticate(&self) -> Result<Session>;

    async fn list_devices(&self, session: &Session) -> Result<Vec<DeviceDescriptor>>;

    async fn fetch_properties(
        &self,
        session: &Session,
        device: &DeviceDescriptor,
    ) -> Result<TelemetrySample>;
}

/// Picks the sock monitor out of the account's device list.
///
/// A pinned serial number wins; otherwise the first device that looks like a
/// sock monitor by product name or model.
pub fn select_device<'a>(
    devices: &'a [DeviceDescriptor],
    pinned_id: Option<&str>,
) -> Option<&'a DeviceDescriptor> {
    if let Some(id) = pinned_id {
        return devices.iter().find(|d| d.id == id);
    }

    devices
        .iter()
        .find(|d| d.name.contains("Monitors") || d.model.contains("SS3"))
}
