use serde_json::json;

use crate::error::Result;
use crate::event::{EventPayload, EventText};
use crate::types::{FlowEntry, Flows};

pub const CONFIRMATION_MESSAGE: &str =
    "Token confirmed, your demo channel is ready to use";
pub const MENU_PROMPT: &str = "Choose an option to get started";

/// Plain-text confirmation, sent when the channel has no configured flows.
pub fn confirmation_payload(urn: &str) -> Vec<u8> {
    json!({
        "to": urn,
        "type": "text",
        "text": {"body": CONFIRMATION_MESSAGE},
    })
    .to_string()
    .into_bytes()
}

/// Interactive menu whose reply options are the flow names in stored
/// order. Duplicates produce duplicate buttons; data quality is an
/// upstream concern.
pub fn flow_menu_payload(urn: &str, flows: &Flows) -> Vec<u8> {
    let buttons: Vec<_> = flows
        .flows
        .iter()
        .map(|f| {
            json!({
                "type": "reply",
                "reply": {"id": f.name, "title": f.name},
            })
        })
        .collect();

    json!({
        "to": urn,
        "type": "interactive",
        "interactive": {
            "type": "button",
            "body": {"text": MENU_PROMPT},
            "action": {"buttons": buttons},
        },
    })
    .to_string()
    .into_bytes()
}

/// Exact, case-sensitive match of the message text against a flow name.
/// First match wins when names repeat.
pub fn match_keyword<'a>(flows: &'a Flows, text: &str) -> Option<&'a FlowEntry> {
    if text.is_empty() {
        return None;
    }
    flows.flows.iter().find(|f| f.name == text)
}

/// Rebuilds the provider payload as a synthetic text message carrying the
/// flow keyword. Sender, message id and timestamp are preserved.
pub fn rewrite_with_keyword(payload: &EventPayload, keyword: &str) -> Result<Vec<u8>> {
    let mut rewritten = payload.clone();
    if let Some(message) = rewritten.messages.first_mut() {
        message.kind = "text".to_string();
        message.text = Some(EventText {
            body: keyword.to_string(),
        });
        message.interactive = None;
    }
    Ok(serde_json::to_vec(&rewritten)?)
}
