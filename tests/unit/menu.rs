use whatsapp_router::event::parse;
use whatsapp_router::menu::{
    confirmation_payload, flow_menu_payload, match_keyword, rewrite_with_keyword,
    CONFIRMATION_MESSAGE,
};
use whatsapp_router::types::{FlowEntry, Flows};

fn flows(entries: Vec<(&str, &str)>) -> Flows {
    Flows {
        channel_uuid: "uuid-1".to_string(),
        flows: entries
            .into_iter()
            .enumerate()
            .map(|(i, (name, keyword))| FlowEntry {
                name: name.to_string(),
                uuid: format!("f{i}"),
                keyword: keyword.to_string(),
            })
            .collect(),
    }
}

#[test]
fn test_confirmation_payload_shape() {
    let body: serde_json::Value =
        serde_json::from_slice(&confirmation_payload("5582988887777")).unwrap();
    assert_eq!(body["to"], "5582988887777");
    assert_eq!(body["type"], "text");
    assert_eq!(body["text"]["body"], CONFIRMATION_MESSAGE);
}

#[test]
fn test_flow_menu_buttons_follow_stored_order() {
    let flows = flows(vec![("Support", "support"), ("Sales", "sales"), ("Billing", "billing")]);
    let body: serde_json::Value =
        serde_json::from_slice(&flow_menu_payload("1", &flows)).unwrap();

    assert_eq!(body["type"], "interactive");
    assert_eq!(body["interactive"]["type"], "button");
    let buttons = body["interactive"]["action"]["buttons"].as_array().unwrap();
    assert_eq!(buttons.len(), 3);
    let titles: Vec<&str> = buttons
        .iter()
        .map(|b| b["reply"]["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Support", "Sales", "Billing"]);
    // Options are keyed by their own name.
    assert_eq!(buttons[0]["reply"]["id"], "Support");
}

#[test]
fn test_flow_menu_keeps_duplicate_names() {
    let flows = flows(vec![("Support", "a"), ("Support", "b")]);
    let body: serde_json::Value =
        serde_json::from_slice(&flow_menu_payload("1", &flows)).unwrap();
    let buttons = body["interactive"]["action"]["buttons"].as_array().unwrap();
    assert_eq!(buttons.len(), 2);
}

#[test]
fn test_match_keyword_exact_and_case_sensitive() {
    let flows = flows(vec![("Support", "support_flow")]);
    assert_eq!(
        match_keyword(&flows, "Support").map(|f| f.keyword.as_str()),
        Some("support_flow")
    );
    assert!(match_keyword(&flows, "support").is_none());
    assert!(match_keyword(&flows, "Supp").is_none());
    assert!(match_keyword(&flows, "Support ").is_none());
}

#[test]
fn test_match_keyword_first_match_wins() {
    let flows = flows(vec![("Support", "first"), ("Support", "second")]);
    assert_eq!(
        match_keyword(&flows, "Support").map(|f| f.keyword.as_str()),
        Some("first")
    );
}

#[test]
fn test_match_keyword_ignores_empty_text() {
    let flows = flows(vec![("", "sneaky")]);
    assert!(match_keyword(&flows, "").is_none());
}

#[test]
fn test_rewrite_with_keyword_builds_synthetic_text_event() {
    let payload = parse(
        br#"{
            "contacts": [{"profile": {"name": "Grace"}, "wa_id": "1"}],
            "messages": [{
                "from": "1",
                "id": "wamid.orig",
                "timestamp": "1660000000",
                "type": "interactive",
                "interactive": {"button_reply": {"id": "Support", "title": "Support"}}
            }]
        }"#,
    )
    .unwrap();

    let rewritten = rewrite_with_keyword(&payload, "support_flow").unwrap();
    let body: serde_json::Value = serde_json::from_slice(&rewritten).unwrap();

    assert_eq!(body["messages"][0]["type"], "text");
    assert_eq!(body["messages"][0]["text"]["body"], "support_flow");
    assert_eq!(body["messages"][0]["id"], "wamid.orig");
    assert_eq!(body["messages"][0]["timestamp"], "1660000000");
    assert_eq!(body["messages"][0]["from"], "1");
    assert!(body["messages"][0].get("interactive").is_none());
    assert_eq!(body["contacts"][0]["profile"]["name"], "Grace");
}
