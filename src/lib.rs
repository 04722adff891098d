pub mod config;
pub mod courier;
pub mod db;
pub mod error;
pub mod event;
pub mod menu;
pub mod metrics;
pub mod router;
pub mod store;
pub mod token;
pub mod types;
pub mod whatsapp;

pub use config::Config;
pub use error::{Error, Result};

use self::config::{load_config, resolve_database_url};
use self::courier::{CourierClient, HttpCourierClient};
use self::db::{DbKind, SqlStore};
use self::metrics::{MetricSink, PrometheusSink};
use self::router::{InboundRouter, Outcome};
use self::store::{ChannelStore, ContactStore, FlowStore};
use self::types::{Channel, Flows};
use self::whatsapp::{AuthTokenHolder, HttpWhatsappClient, WhatsappClient};

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::AnyPool;
use tracing::{debug, error};
use uuid::Uuid;

const DEAD_END_NOTE: &str = "contact not found and token not valid";

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pool: AnyPool,
    pub db_kind: DbKind,
    pub router: Arc<InboundRouter>,
    pub channels: Arc<dyn ChannelStore>,
    pub flows: Arc<dyn FlowStore>,
    pub metrics: Arc<dyn MetricSink>,
}

pub async fn create_app() -> anyhow::Result<(AppState, Router)> {
    sqlx::any::install_default_drivers();

    let config = load_config();
    let db_url = resolve_database_url(&config);
    let db_kind = db::db_kind_from_url(&db_url);
    let pool = AnyPool::connect(&db_url).await?;
    db::init_db(&pool, db_kind).await?;

    let sql_store = SqlStore::new(pool.clone(), db_kind);
    let token_holder = AuthTokenHolder::new(
        sql_store.load_auth_token().await?.unwrap_or_default(),
    );

    let http = reqwest::Client::new();
    let whatsapp: Arc<dyn WhatsappClient> = Arc::new(HttpWhatsappClient::new(
        http.clone(),
        config.whatsapp.clone(),
        token_holder.clone(),
    ));
    let courier: Arc<dyn CourierClient> = Arc::new(HttpCourierClient::new(
        http,
        config.courier.base_url.clone(),
    ));

    let contacts: Arc<dyn ContactStore> = Arc::new(sql_store.clone());
    let channels: Arc<dyn ChannelStore> = Arc::new(sql_store.clone());
    let flows: Arc<dyn FlowStore> = Arc::new(sql_store.clone());
    let metrics_sink: Arc<dyn MetricSink> = Arc::new(PrometheusSink);

    let router = Arc::new(InboundRouter::new(
        contacts,
        channels.clone(),
        flows.clone(),
        whatsapp.clone(),
        courier,
        metrics_sink.clone(),
        config.activation.token_prefix.clone(),
    ));

    if config.whatsapp.token_refresh_seconds > 0 {
        tokio::spawn(whatsapp::start_token_refresh_worker(
            whatsapp,
            token_holder,
            sql_store,
            config.whatsapp.token_refresh_seconds,
        ));
    }

    let state = AppState {
        config: config.clone(),
        pool,
        db_kind,
        router,
        channels,
        flows,
        metrics: metrics_sink,
    };

    let admin_routes = Router::new()
        .route("/v1/channels", post(create_channel))
        .route("/v1/flows", post(upsert_flows))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let public_routes = Router::new()
        .route("/v1/health", get(health))
        .route(&config.server.webhook_path, post(webhook));

    let app = Router::new()
        .merge(admin_routes)
        .merge(public_routes)
        .with_state(state.clone());

    Ok((state, app))
}

async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> impl IntoResponse {
    if let Some(token) = state.config.auth.token.as_ref() {
        let header = headers.get("X-Router-Token").and_then(|v| v.to_str().ok());
        if header != Some(token.as_str()) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }
    next.run(req).await
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Inbound provider webhook. Always acknowledges 200 so the provider does
/// not redeliver; request failures are logged and returned as
/// informational body text only.
async fn webhook(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    match state.router.route(&body).await {
        Ok(Outcome::DeadEnd) => (StatusCode::OK, DEAD_END_NOTE.to_string()).into_response(),
        Ok(outcome) => {
            debug!("webhook handled: {outcome:?}");
            StatusCode::OK.into_response()
        }
        Err(err) => {
            error!("webhook error: {err}");
            (StatusCode::OK, err.to_string()).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateChannelRequest {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
}

async fn create_channel(
    State(state): State<AppState>,
    Json(req): Json<CreateChannelRequest>,
) -> impl IntoResponse {
    if req.uuid.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "channel uuid could not be empty"})),
        )
            .into_response();
    }

    let channel = Channel {
        id: Uuid::new_v4().to_string(),
        uuid: req.uuid,
        name: req.name,
        token: token::gen_token(&state.config.activation.token_prefix),
    };

    match state.channels.insert(&channel).await {
        Ok(()) => {
            state.metrics.channel_created(&channel.uuid);
            (StatusCode::CREATED, Json(json!({"token": channel.token}))).into_response()
        }
        Err(err) => {
            error!("channel creation failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": err.to_string()})),
            )
                .into_response()
        }
    }
}

async fn upsert_flows(State(state): State<AppState>, Json(flows): Json<Flows>) -> impl IntoResponse {
    if flows.channel_uuid.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "channel uuid could not be empty"})),
        )
            .into_response();
    }

    match state.flows.upsert(&flows).await {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(err) => {
            error!("flows upsert failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": err.to_string()})),
            )
                .into_response()
        }
    }
}
