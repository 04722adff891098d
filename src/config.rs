use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub whatsapp: WhatsappConfig,
    pub courier: CourierConfig,
    pub activation: ActivationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9000,
            webhook_path: "/v1/webhook".to_string(),
        }
    }
}

/// Token guarding the administrative routes. The inbound webhook path is
/// unauthenticated; the provider is its sole caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub sqlite_path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            sqlite_path: "~/.whatsapp-router/state.sqlite".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsappConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub token_refresh_seconds: u64,
}

impl Default for WhatsappConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:4040".to_string(),
            username: String::new(),
            password: String::new(),
            token_refresh_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierConfig {
    pub base_url: String,
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/c/wa".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationConfig {
    /// Cheap pre-filter only; the authoritative match is always exact
    /// equality against a stored channel token.
    pub token_prefix: String,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            token_prefix: "weni-demo".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            database: DatabaseConfig::default(),
            whatsapp: WhatsappConfig::default(),
            courier: CourierConfig::default(),
            activation: ActivationConfig::default(),
        }
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn resolve_config_path() -> PathBuf {
    env::var("ROUTER_CONFIG")
        .ok()
        .map(PathBuf::from)
        .unwrap_or_else(|| expand_tilde("~/.whatsapp-router/router.json"))
}

pub fn load_config() -> Config {
    let config_path = resolve_config_path();

    let mut cfg = Config::default();

    if config_path.exists() {
        if let Ok(raw) = fs::read_to_string(&config_path) {
            if let Ok(file_cfg) = serde_json::from_str::<Config>(&raw) {
                cfg = file_cfg;
            }
        }
    }

    // Override from environment
    if let Ok(token) = env::var("ROUTER_AUTH_TOKEN") {
        if !token.trim().is_empty() {
            cfg.auth.token = Some(token);
        }
    }

    if let Ok(url) = env::var("ROUTER_DATABASE_URL") {
        if !url.trim().is_empty() {
            cfg.database.url = Some(url);
        }
    }

    if let Ok(path) = env::var("ROUTER_SQLITE_PATH") {
        if !path.trim().is_empty() {
            cfg.database.sqlite_path = path;
        }
    }

    if let Ok(url) = env::var("ROUTER_WPP_BASE_URL") {
        if !url.trim().is_empty() {
            cfg.whatsapp.base_url = url;
        }
    }

    if let Ok(username) = env::var("ROUTER_WPP_USERNAME") {
        if !username.trim().is_empty() {
            cfg.whatsapp.username = username;
        }
    }

    if let Ok(password) = env::var("ROUTER_WPP_PASSWORD") {
        if !password.trim().is_empty() {
            cfg.whatsapp.password = password;
        }
    }

    if let Ok(url) = env::var("ROUTER_COURIER_BASE_URL") {
        if !url.trim().is_empty() {
            cfg.courier.base_url = url;
        }
    }

    if let Ok(prefix) = env::var("ROUTER_TOKEN_PREFIX") {
        if !prefix.trim().is_empty() {
            cfg.activation.token_prefix = prefix;
        }
    }

    cfg
}

pub fn resolve_database_url(cfg: &Config) -> String {
    if let Some(url) = cfg.database.url.as_ref() {
        return url.to_string();
    }

    let path = expand_tilde(&cfg.database.sqlite_path);
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    format!("sqlite://{}", path.to_string_lossy())
}
