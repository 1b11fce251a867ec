use crate::config::JuicenetConfig;
use crate::error::{JuicesyncError, Result};
use crate::juicenet::SessionSource;
use crate::juicenet::types::{Command, DeviceState, HistoryPage, PowerSample, Reply, Unit};
use crate::logging::{StructuredLogger, get_logger};
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use std::time::Duration;

/// HTTP client for the JuiceNet cloud API
pub struct JuicenetClient {
    http: reqwest::Client,
    config: JuicenetConfig,
    logger: StructuredLogger,
}

impl JuicenetClient {
    /// Create a new client; the API key and base URL come from `config`
    pub fn new(config: &JuicenetConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
            logger: get_logger("juicenet"),
        })
    }

    fn url_for(&self, command: &Command) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            command.endpoint()
        )
    }

    /// Post one command and decode its reply. Non-200 responses are errors.
    pub async fn send(&self, command: &Command) -> Result<Reply> {
        let body = command.to_body(&self.config.client_device_id, &self.config.api_key)?;
        self.logger
            .trace(&format!("POST {} cmd={}", command.endpoint(), command.name()));

        let resp = self
            .http
            .post(self.url_for(command))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, concat!("juicesync/", env!("CARGO_PKG_VERSION")))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let msg = format!("{} failed with HTTP {}", command.name(), status);
            self.logger.error(&msg);
            return Err(JuicesyncError::api(msg));
        }

        let bytes = resp.bytes().await?;
        Reply::decode(command, &bytes)
    }
}

#[async_trait::async_trait]
impl SessionSource for JuicenetClient {
    async fn units(&self) -> Result<Vec<Unit>> {
        self.send(&Command::GetAccountUnits).await?.into_units()
    }

    async fn history_page(
        &self,
        unit: &Unit,
        continuity_token: Option<&str>,
    ) -> Result<HistoryPage> {
        let command = Command::GetHistory {
            token: unit.token.clone(),
            continuity_token: continuity_token.map(str::to_string),
        };
        self.send(&command).await?.into_history()
    }

    async fn power_samples(
        &self,
        unit: &Unit,
        session_id: &str,
        intervals: u32,
    ) -> Result<Vec<PowerSample>> {
        let command = Command::power_plot(&unit.token, session_id, intervals);
        self.send(&command).await?.into_plot()
    }

    async fn device_state(&self, unit: &Unit) -> Result<DeviceState> {
        let command = Command::GetState {
            token: unit.token.clone(),
        };
        self.send(&command).await?.into_state()
    }
}
