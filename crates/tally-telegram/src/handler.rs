// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update filtering and conversion.
//!
//! Turns Telegram messages and inline-button presses into channel-agnostic
//! [`InboundEvent`]s. Only private chats are handled; group chats are
//! broadcast targets, not conversations.

use tally_core::types::{Choice, EventKind, InboundEvent, SessionId};
use teloxide::prelude::*;
use teloxide::types::{ChatKind, InlineKeyboardButton, InlineKeyboardMarkup};

/// Checks whether the message is from a private (DM) chat.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Extracts the command name from `/name`, `/name@bot` or `/name args`.
///
/// Returns `None` when `text` is not a command. Names are lowercased.
pub fn parse_command(text: &str) -> Option<String> {
    let rest = text.trim().strip_prefix('/')?;
    let word = rest.split_whitespace().next()?;
    let name = word.split('@').next().unwrap_or(word);
    if name.is_empty() {
        return None;
    }
    Some(name.to_lowercase())
}

/// Converts a text message into an event. Non-text messages yield `None`.
pub fn message_to_event(msg: &Message) -> Option<InboundEvent> {
    let text = msg.text()?;
    let kind = match parse_command(text) {
        Some(name) => EventKind::Command(name),
        None => EventKind::TextReply(text.to_string()),
    };
    let sender = msg
        .from
        .as_ref()
        .map(|u| u.id.0.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut event = InboundEvent::new(SessionId::from(msg.chat.id.0), sender, kind);
    event.timestamp = msg.date.to_rfc3339();
    Some(event)
}

/// Converts an inline-button press into a selection event.
///
/// The session is the chat the button was attached to, falling back to the
/// presser's user id (equal to the chat id in private chats).
pub fn callback_to_event(query: &CallbackQuery) -> Option<InboundEvent> {
    let token = query.data.as_deref()?;
    let chat_id = query
        .message
        .as_ref()
        .map(|m| m.chat().id.0)
        .unwrap_or(query.from.id.0 as i64);
    Some(InboundEvent::new(
        SessionId::from(chat_id),
        query.from.id.0.to_string(),
        EventKind::Selection(token.to_string()),
    ))
}

/// One button per row, in order.
pub fn build_keyboard(choices: &[Choice]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(choices.iter().map(|c| {
        vec![InlineKeyboardButton::callback(
            c.label.clone(),
            c.token.clone(),
        )]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn make_message(chat: serde_json::Value, text: &str) -> Message {
        let json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": chat,
            "from": {
                "id": 12345u64,
                "is_bot": false,
                "first_name": "Test",
            },
            "text": text,
        });
        serde_json::from_value(json).expect("failed to deserialize mock message")
    }

    fn private_message(text: &str) -> Message {
        make_message(
            serde_json::json!({"id": 12345i64, "type": "private", "first_name": "Test"}),
            text,
        )
    }

    #[test]
    fn parse_command_variants() {
        assert_eq!(parse_command("/start"), Some("start".into()));
        assert_eq!(parse_command("/START@tally_bot"), Some("start".into()));
        assert_eq!(parse_command("/admin now"), Some("admin".into()));
        assert_eq!(parse_command("hola"), None);
        assert_eq!(parse_command("/"), None);
        assert_eq!(parse_command("/@bot"), None);
    }

    #[test]
    fn is_dm_distinguishes_chats() {
        assert!(is_dm(&private_message("hi")));
        let group = make_message(
            serde_json::json!({"id": -100123i64, "type": "supergroup", "title": "Ventas"}),
            "hi",
        );
        assert!(!is_dm(&group));
    }

    #[test]
    fn text_message_becomes_reply() {
        let event = message_to_event(&private_message("ana")).unwrap();
        assert_eq!(event.session_id, SessionId::from(12345));
        assert_eq!(event.sender_id, "12345");
        assert_eq!(event.kind, EventKind::TextReply("ana".into()));
    }

    #[test]
    fn slash_message_becomes_command() {
        let event = message_to_event(&private_message("/logout")).unwrap();
        assert_eq!(event.kind, EventKind::Command("logout".into()));
    }

    #[test]
    fn callback_becomes_selection() {
        let json = serde_json::json!({
            "id": "cb-1",
            "from": {"id": 12345u64, "is_bot": false, "first_name": "Test"},
            "chat_instance": "abc",
            "data": "product_3",
            "message": {
                "message_id": 9,
                "date": 1700000000i64,
                "chat": {"id": 777i64, "type": "private", "first_name": "Test"},
                "text": "Selecciona el producto vendido:",
            },
        });
        let query: CallbackQuery = serde_json::from_value(json).unwrap();
        let event = callback_to_event(&query).unwrap();
        assert_eq!(event.session_id, SessionId::from(777));
        assert_eq!(event.kind, EventKind::Selection("product_3".into()));
    }

    #[test]
    fn callback_without_data_is_ignored() {
        let json = serde_json::json!({
            "id": "cb-2",
            "from": {"id": 1u64, "is_bot": false, "first_name": "Test"},
            "chat_instance": "abc",
        });
        let query: CallbackQuery = serde_json::from_value(json).unwrap();
        assert!(callback_to_event(&query).is_none());
    }

    #[test]
    fn keyboard_has_one_button_per_row() {
        let kb = build_keyboard(&[Choice::new("Venta", "venta"), Choice::new("Historial", "historial")]);
        assert_eq!(kb.inline_keyboard.len(), 2);
        let button = &kb.inline_keyboard[1][0];
        assert_eq!(button.text, "Historial");
        assert!(matches!(&button.kind, InlineKeyboardButtonKind::CallbackData(d) if d == "historial"));
    }
}
