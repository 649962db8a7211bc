use super::types::{TgResponse, TgUpdate};
use super::TelegramChannel;
use streak_core::config::TelegramConfig;

fn test_channel(chat_id: i64, allowed: Vec<i64>) -> TelegramChannel {
    TelegramChannel::new(TelegramConfig {
        enabled: true,
        bot_token: "123:test".to_string(),
        chat_id,
        allowed_users: allowed,
    })
}

#[test]
fn test_base_url_contains_token() {
    let ch = test_channel(1, vec![]);
    assert_eq!(ch.base_url, "https://api.telegram.org/bot123:test");
}

#[test]
fn test_sender_allowed_defaults_to_chat_user() {
    let ch = test_channel(42, vec![]);
    assert!(ch.sender_allowed(42));
    assert!(!ch.sender_allowed(7));
}

#[test]
fn test_sender_allowed_with_allow_list() {
    let ch = test_channel(42, vec![7, 8]);
    assert!(ch.sender_allowed(7));
    assert!(ch.sender_allowed(8));
    // The allow-list replaces the chat-user default.
    assert!(!ch.sender_allowed(42));
}

#[test]
fn test_deserialize_callback_query_update() {
    let json = r#"{
        "ok": true,
        "result": [{
            "update_id": 100,
            "callback_query": {
                "id": "cb1",
                "from": { "id": 42, "first_name": "Mali" },
                "message": {
                    "message_id": 7,
                    "chat": { "id": 42, "type": "private" },
                    "text": "Did you complete today's portion?"
                },
                "data": "night_yes"
            }
        }]
    }"#;
    let body: TgResponse<Vec<TgUpdate>> = serde_json::from_str(json).unwrap();
    assert!(body.ok);
    let updates = body.result.unwrap();
    let q = updates[0].callback_query.as_ref().unwrap();
    assert_eq!(q.data.as_deref(), Some("night_yes"));
    assert_eq!(q.message.as_ref().unwrap().message_id, 7);
}

#[test]
fn test_deserialize_text_update() {
    let json = r#"{
        "ok": true,
        "result": [{
            "update_id": 101,
            "message": {
                "message_id": 8,
                "from": { "id": 42, "first_name": "Mali", "username": "mali" },
                "chat": { "id": 42, "type": "private" },
                "text": "dynamic programming"
            }
        }]
    }"#;
    let body: TgResponse<Vec<TgUpdate>> = serde_json::from_str(json).unwrap();
    let updates = body.result.unwrap();
    let msg = updates[0].message.as_ref().unwrap();
    assert_eq!(msg.text.as_deref(), Some("dynamic programming"));
    assert!(updates[0].callback_query.is_none());
}
