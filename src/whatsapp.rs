use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::{Arc, RwLock};
use tokio::time::sleep;
use tracing::{debug, error};

use crate::config::WhatsappConfig;
use crate::db::SqlStore;
use crate::error::{Error, Result};

/// Process-wide provider auth token, refreshed by a background worker and
/// read on every send. Explicitly owned and injected, never a global.
#[derive(Clone, Default)]
pub struct AuthTokenHolder {
    inner: Arc<RwLock<String>>,
}

impl AuthTokenHolder {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial.into())),
        }
    }

    pub fn get(&self) -> String {
        self.inner.read().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn set(&self, token: &str) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = token.to_string();
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub users: Vec<LoginUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    pub token: String,
    #[serde(default)]
    pub expires_after: Option<String>,
}

#[async_trait]
pub trait WhatsappClient: Send + Sync {
    /// Sends an already-serialized message payload. Non-2xx, including
    /// 401, surfaces as an error.
    async fn send_message(&self, payload: &[u8]) -> Result<()>;
    async fn login(&self) -> Result<LoginResponse>;
    async fn health(&self) -> Result<u16>;
}

#[derive(Clone)]
pub struct HttpWhatsappClient {
    http: Client,
    config: WhatsappConfig,
    token: AuthTokenHolder,
}

impl HttpWhatsappClient {
    pub fn new(http: Client, config: WhatsappConfig, token: AuthTokenHolder) -> Self {
        Self {
            http,
            config,
            token,
        }
    }
}

#[async_trait]
impl WhatsappClient for HttpWhatsappClient {
    async fn send_message(&self, payload: &[u8]) -> Result<()> {
        let url = format!("{}/v1/messages", self.config.base_url);
        let resp = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .bearer_auth(self.token.get())
            .body(payload.to_vec())
            .send()
            .await
            .map_err(|err| Error::Whatsapp(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Whatsapp(format!("status {}: {}", status, body)));
        }
        Ok(())
    }

    async fn login(&self) -> Result<LoginResponse> {
        let url = format!("{}/v1/users/login", self.config.base_url);
        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|err| Error::Whatsapp(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Whatsapp(format!("login status {}: {}", status, body)));
        }
        resp.json::<LoginResponse>()
            .await
            .map_err(|err| Error::Whatsapp(err.to_string()))
    }

    async fn health(&self) -> Result<u16> {
        let url = format!("{}/v1/health", self.config.base_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(self.token.get())
            .send()
            .await
            .map_err(|err| Error::Whatsapp(err.to_string()))?;
        Ok(resp.status().as_u16())
    }
}

/// Logs into the provider on an interval, swaps the holder and persists
/// the fresh token so a restart starts authenticated.
pub async fn start_token_refresh_worker(
    client: Arc<dyn WhatsappClient>,
    holder: AuthTokenHolder,
    store: SqlStore,
    interval_seconds: u64,
) {
    loop {
        match client.login().await {
            Ok(login) => {
                if let Some(user) = login.users.first() {
                    holder.set(&user.token);
                    debug!("provider auth token refreshed");
                    if let Err(err) = store.save_auth_token(&user.token).await {
                        error!("unable to persist provider token: {err}");
                    }
                } else {
                    error!("provider login returned no users");
                }
            }
            Err(err) => error!("provider login failed: {err}"),
        }
        sleep(std::time::Duration::from_secs(interval_seconds)).await;
    }
}
