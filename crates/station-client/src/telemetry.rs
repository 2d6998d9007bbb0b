use crate::device::StationDevice;
use crate::session::SessionClient;
use crate::types::{ClientConfig, LoginResponse};
use async_trait::async_trait;
use serde_json::Value;
use station_core::Result;
use station_types::TelemetryDocument;
use tracing::info;

pub const STATION_STATUS_ENDPOINT: &str = "sta_status";
pub const DOCSIS_STATUS_ENDPOINT: &str = "sta_docsis_status";
pub const ABOUT_ENDPOINT: &str = "sta_about";
pub const RESTART_ENDPOINT: &str = "sta_restart";

/// 基于 HTTP 会话的设备实现
pub struct StationClient {
    session: SessionClient,
}

impl StationClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            session: SessionClient::new(config)?,
        })
    }

    async fn fetch_document(&self, endpoint: &str) -> Result<TelemetryDocument> {
        let body = self.session.api_get(endpoint).await?;
        Ok(serde_json::from_value(body)?)
    }
}

#[async_trait]
impl StationDevice for StationClient {
    async fn login(&self, base_url: &str, password: &str) -> Result<LoginResponse> {
        self.session.login(base_url, password).await
    }

    async fn get_station_status(&self) -> Result<TelemetryDocument> {
        self.fetch_document(STATION_STATUS_ENDPOINT).await
    }

    async fn get_docsis_status(&self) -> Result<TelemetryDocument> {
        self.fetch_document(DOCSIS_STATUS_ENDPOINT).await
    }

    async fn get_about(&self) -> Result<TelemetryDocument> {
        self.fetch_document(ABOUT_ENDPOINT).await
    }

    async fn restart(&self) -> Result<Value> {
        info!("Requesting station restart");
        self.session.api_post(RESTART_ENDPOINT, &[]).await
    }

    async fn logout(&self) -> Result<()> {
        self.session.logout().await
    }
}
