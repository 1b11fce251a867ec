//! JuiceNet cloud API integration
//!
//! The upstream service exposes account units, paginated session history,
//! per-session power plots and live device state. [`SessionSource`] is the
//! seam the rest of the crate talks to; [`JuicenetClient`] implements it over
//! HTTPS.

pub mod client;
pub mod types;

pub use client::JuicenetClient;
pub use types::{
    ChargingState, Command, DeviceState, HistoryPage, LifetimeState, PowerSample, RawSession,
    Reply, Unit,
};

use crate::error::Result;

/// Anything that can answer the four upstream commands
#[async_trait::async_trait]
pub trait SessionSource: Send + Sync {
    /// Chargers registered to the account
    async fn units(&self) -> Result<Vec<Unit>>;

    /// One page of history, newest first; `None` requests the first page
    async fn history_page(
        &self,
        unit: &Unit,
        continuity_token: Option<&str>,
    ) -> Result<HistoryPage>;

    /// Raw power plot for a session; `intervals` caps the number of samples returned
    async fn power_samples(
        &self,
        unit: &Unit,
        session_id: &str,
        intervals: u32,
    ) -> Result<Vec<PowerSample>>;

    /// Live state snapshot
    async fn device_state(&self, unit: &Unit) -> Result<DeviceState>;
}
