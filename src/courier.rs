use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{Error, Result};

/// Downstream relay that processes forwarded conversational messages,
/// scoped by channel uuid. Transport failures are errors; HTTP status is
/// returned as-is for the caller to judge.
#[async_trait]
pub trait CourierClient: Send + Sync {
    async fn forward(&self, channel_uuid: &str, payload: &[u8]) -> Result<u16>;
}

#[derive(Clone)]
pub struct HttpCourierClient {
    http: Client,
    base_url: String,
}

impl HttpCourierClient {
    pub fn new(http: Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl CourierClient for HttpCourierClient {
    async fn forward(&self, channel_uuid: &str, payload: &[u8]) -> Result<u16> {
        let url = format!("{}/{}/receive", self.base_url, channel_uuid);
        let resp = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .body(payload.to_vec())
            .send()
            .await
            .map_err(|err| Error::Courier(err.to_string()))?;

        let status = resp.status().as_u16();
        debug!("courier responded {status} for channel {channel_uuid}");
        Ok(status)
    }
}
