use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Webhook body as the provider posts it. Kept round-trippable so a parsed
/// payload can be rewritten and re-serialized for keyword translation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPayload {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<EventContact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<EventMessage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventContact {
    #[serde(default)]
    pub profile: EventProfile,
    #[serde(default)]
    pub wa_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventProfile {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<EventText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive: Option<EventInteractive>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventText {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventInteractive {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_reply: Option<ButtonReply>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ButtonReply {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    InteractiveReply,
    Other,
}

/// One normalized inbound event, derived per webhook call and discarded
/// after it completes. The raw body is kept separately by the caller for
/// pass-through forwarding.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub urn: String,
    pub sender_name: String,
    pub kind: MessageKind,
    pub text: String,
    pub message_id: String,
    pub timestamp: String,
}

pub fn parse(raw: &[u8]) -> Result<EventPayload> {
    Ok(serde_json::from_slice(raw)?)
}

/// Returns None for house-keeping callbacks that carry no messages; those
/// are acknowledged and dropped, not treated as errors.
pub fn normalize(payload: &EventPayload) -> Option<InboundEvent> {
    let message = payload.messages.first()?;

    let sender_name = payload
        .contacts
        .first()
        .map(|c| c.profile.name.clone())
        .unwrap_or_default();

    let (kind, text) = match message.kind.as_str() {
        "text" => (
            MessageKind::Text,
            message.text.as_ref().map(|t| t.body.clone()).unwrap_or_default(),
        ),
        "interactive" => (
            MessageKind::InteractiveReply,
            message
                .interactive
                .as_ref()
                .and_then(|i| i.button_reply.as_ref())
                .map(|r| r.title.clone())
                .unwrap_or_default(),
        ),
        _ => (MessageKind::Other, String::new()),
    };

    Some(InboundEvent {
        urn: message.from.clone(),
        sender_name,
        kind,
        text,
        message_id: message.id.clone(),
        timestamp: message.timestamp.clone(),
    })
}
