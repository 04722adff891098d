use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An end-user identity tracked by URN, with at most one bound channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub urn: String,
    pub name: String,
    pub channel_id: Option<String>,
}

impl Contact {
    pub fn new(urn: &str, name: &str, channel_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            urn: urn.to_string(),
            name: name.to_string(),
            channel_id,
        }
    }
}

/// A logical endpoint owning an activation token and the external uuid
/// used by courier and the flow registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub uuid: String,
    pub name: String,
    pub token: String,
}

/// Per-channel onboarding menu, at most one document per channel uuid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flows {
    pub channel_uuid: String,
    #[serde(default)]
    pub flows: Vec<FlowEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowEntry {
    pub name: String,
    pub uuid: String,
    pub keyword: String,
}
