pub mod onebot;
pub mod telegram;
pub mod yunhu;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// Chat platforms the monitor knows how to read and reply on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Yunhu,
    Telegram,
    OneBot,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Yunhu, Platform::Telegram, Platform::OneBot];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Yunhu => "yunhu",
            Platform::Telegram => "telegram",
            Platform::OneBot => "onebot",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yunhu" => Ok(Platform::Yunhu),
            "telegram" => Ok(Platform::Telegram),
            "onebot" => Ok(Platform::OneBot),
            other => anyhow::bail!("Unknown platform: {}", other),
        }
    }
}

/// Whether a reply goes to a single user or to a group chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    User,
    Group,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::User => "user",
            TargetKind::Group => "group",
        }
    }

    fn from_group_flag(is_group: bool) -> Self {
        if is_group {
            TargetKind::Group
        } else {
            TargetKind::User
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a reply is sent back to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    pub kind: TargetKind,
    /// Platform-specific chat or user ID, rendered as a string
    pub id: String,
}

/// A Yunhu webhook event (`{"event": {"message": ..., "chat": ..., "sender": ...}}`)
#[derive(Debug, Clone)]
pub struct YunhuEvent {
    pub text: String,
    pub instruction_name: String,
    pub chat_type: String,
    pub chat_id: String,
    pub sender_id: String,
}

/// A Telegram update flattened by the host (`{"message": ..., "chat": {...}}`)
#[derive(Debug, Clone)]
pub struct TelegramEvent {
    pub text: String,
    pub chat_type: String,
    pub chat_id: String,
}

/// A OneBot v11 message event (`{"message_type": ..., "message": ...}`)
#[derive(Debug, Clone)]
pub struct OneBotEvent {
    pub message_type: String,
    pub text: String,
    pub raw_message: String,
    pub user_id: String,
    pub group_id: String,
}

/// An inbound event, classified by shape into one of the supported platforms
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Yunhu(YunhuEvent),
    Telegram(TelegramEvent),
    OneBot(OneBotEvent),
}

impl InboundEvent {
    /// Classify a raw event. The first matching shape wins:
    /// Yunhu (`event.message`), then Telegram (`message` + `chat`),
    /// then OneBot (`message_type` + `message`).
    pub fn parse(raw: &Value) -> Option<Self> {
        if !raw.is_object() {
            return None;
        }

        if lookup(raw, &["event", "message"]).is_some() {
            return Some(InboundEvent::Yunhu(YunhuEvent {
                text: text_at(raw, &["event", "message", "content", "text"]),
                instruction_name: text_at(raw, &["event", "message", "instructionName"]),
                chat_type: text_at(raw, &["event", "chat", "chatType"]),
                chat_id: text_at(raw, &["event", "chat", "chatId"]),
                sender_id: text_at(raw, &["event", "sender", "senderId"]),
            }));
        }

        if raw.get("message").is_some() && raw.get("chat").is_some() {
            let text = match raw.get("message") {
                Some(Value::String(s)) => s.clone(),
                Some(message @ Value::Object(_)) => text_at(message, &["text"]),
                _ => String::new(),
            };
            // Hosts that flatten updates put the text at the top level
            let text = if text.trim().is_empty() {
                text_at(raw, &["text"])
            } else {
                text
            };
            return Some(InboundEvent::Telegram(TelegramEvent {
                text,
                chat_type: text_at(raw, &["chat", "type"]),
                chat_id: text_at(raw, &["chat", "id"]),
            }));
        }

        if raw.get("message_type").is_some() && raw.get("message").is_some() {
            // Segment-array messages carry their plain form in alt_message / raw_message
            let text = match raw.get("message") {
                Some(Value::String(s)) => s.clone(),
                _ => {
                    let alt = normalize_alt_text(&text_at(raw, &["alt_message"]));
                    if alt.is_empty() {
                        text_at(raw, &["raw_message"])
                    } else {
                        alt
                    }
                }
            };
            return Some(InboundEvent::OneBot(OneBotEvent {
                message_type: text_at(raw, &["message_type"]),
                text,
                raw_message: text_at(raw, &["raw_message"]),
                user_id: text_at(raw, &["user_id"]),
                group_id: text_at(raw, &["group_id"]),
            }));
        }

        None
    }

    pub fn platform(&self) -> Platform {
        match self {
            InboundEvent::Yunhu(_) => Platform::Yunhu,
            InboundEvent::Telegram(_) => Platform::Telegram,
            InboundEvent::OneBot(_) => Platform::OneBot,
        }
    }

    /// Message text, trimmed
    pub fn trigger_text(&self) -> &str {
        match self {
            InboundEvent::Yunhu(e) => e.text.trim(),
            InboundEvent::Telegram(e) => e.text.trim(),
            InboundEvent::OneBot(e) => e.text.trim(),
        }
    }

    /// Command name carried by a `command` event.
    /// Telegram has no separate command events, so it yields `None`.
    pub fn command_name(&self) -> Option<String> {
        match self {
            InboundEvent::Yunhu(e) => Some(e.instruction_name.trim().to_string()),
            InboundEvent::Telegram(_) => None,
            InboundEvent::OneBot(e) => Some(e.raw_message.replace('/', "").trim().to_string()),
        }
    }

    pub fn reply_target(&self) -> ReplyTarget {
        match self {
            InboundEvent::Yunhu(e) => {
                if e.chat_type == "group" {
                    ReplyTarget {
                        kind: TargetKind::Group,
                        id: e.chat_id.clone(),
                    }
                } else {
                    ReplyTarget {
                        kind: TargetKind::User,
                        id: e.sender_id.clone(),
                    }
                }
            }
            InboundEvent::Telegram(e) => ReplyTarget {
                kind: TargetKind::from_group_flag(e.chat_type == "group"),
                id: e.chat_id.clone(),
            },
            InboundEvent::OneBot(e) => {
                let kind = TargetKind::from_group_flag(e.message_type == "group");
                // The id lives in "{kind}_id"
                let id = match kind {
                    TargetKind::Group => e.group_id.clone(),
                    TargetKind::User => e.user_id.clone(),
                };
                ReplyTarget { kind, id }
            }
        }
    }
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// Scalar at `path` as a string; anything missing or non-scalar becomes "".
fn text_at(value: &Value, path: &[&str]) -> String {
    match lookup(value, path) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Collapse runs of whitespace in an alt-text rendering to single spaces.
fn normalize_alt_text(alt: &str) -> String {
    alt.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_yunhu_group_target() {
        let raw = json!({
            "event": {
                "chat": {"chatType": "group", "chatId": "g1"},
                "sender": {"senderId": "u1"},
                "message": {"content": {"text": "  /服务器状态 "}}
            }
        });
        let event = InboundEvent::parse(&raw).unwrap();
        assert_eq!(event.platform(), Platform::Yunhu);
        assert_eq!(event.trigger_text(), "/服务器状态");
        assert_eq!(
            event.reply_target(),
            ReplyTarget {
                kind: TargetKind::Group,
                id: "g1".to_string()
            }
        );
    }

    #[test]
    fn test_yunhu_private_uses_sender_id() {
        let raw = json!({
            "event": {
                "chat": {"chatType": "bot", "chatId": "bot-chat"},
                "sender": {"senderId": "u1"},
                "message": {"content": {}}
            }
        });
        let event = InboundEvent::parse(&raw).unwrap();
        assert_eq!(event.trigger_text(), "");
        let target = event.reply_target();
        assert_eq!(target.kind, TargetKind::User);
        assert_eq!(target.id, "u1");
    }

    #[test]
    fn test_yunhu_wins_over_other_shapes() {
        let raw = json!({
            "event": {"message": {"content": {"text": "hi"}}},
            "message": "other",
            "chat": {"id": 1},
            "message_type": "group"
        });
        let event = InboundEvent::parse(&raw).unwrap();
        assert_eq!(event.platform(), Platform::Yunhu);
    }

    #[test]
    fn test_telegram_group_and_numeric_id() {
        let raw = json!({
            "message": "/status",
            "chat": {"type": "group", "id": -100123}
        });
        let event = InboundEvent::parse(&raw).unwrap();
        assert_eq!(event.platform(), Platform::Telegram);
        assert_eq!(event.trigger_text(), "/status");
        assert_eq!(
            event.reply_target(),
            ReplyTarget {
                kind: TargetKind::Group,
                id: "-100123".to_string()
            }
        );
    }

    #[test]
    fn test_telegram_private_and_message_object() {
        let raw = json!({
            "message": {"text": "hello"},
            "chat": {"type": "private", "id": 42}
        });
        let event = InboundEvent::parse(&raw).unwrap();
        assert_eq!(event.trigger_text(), "hello");
        assert_eq!(event.reply_target().kind, TargetKind::User);
        assert_eq!(event.reply_target().id, "42");
        assert!(event.command_name().is_none());
    }

    #[test]
    fn test_telegram_top_level_text_when_message_has_none() {
        let raw = json!({
            "message": {"message_id": 5},
            "chat": {"type": "private", "id": 9},
            "text": " /服务器状态 "
        });
        let event = InboundEvent::parse(&raw).unwrap();
        assert_eq!(event.platform(), Platform::Telegram);
        assert_eq!(event.trigger_text(), "/服务器状态");

        let raw = json!({"message": "", "chat": {"id": 9}, "text": "/status"});
        assert_eq!(InboundEvent::parse(&raw).unwrap().trigger_text(), "/status");

        let raw = json!({"message": {"text": "hi"}, "chat": {"id": 9}, "text": "/status"});
        assert_eq!(InboundEvent::parse(&raw).unwrap().trigger_text(), "hi");
    }

    #[test]
    fn test_raw_telegram_update_is_not_recognized() {
        // Adapters must flatten `chat` out of the message before delivery
        let raw = json!({
            "update_id": 1,
            "message": {"text": "/status", "chat": {"type": "private", "id": 9}}
        });
        assert!(InboundEvent::parse(&raw).is_none());
    }

    #[test]
    fn test_onebot_private_target() {
        let raw = json!({"message_type": "private", "message": "/status", "user_id": "u2"});
        let event = InboundEvent::parse(&raw).unwrap();
        assert_eq!(event.platform(), Platform::OneBot);
        assert_eq!(
            event.reply_target(),
            ReplyTarget {
                kind: TargetKind::User,
                id: "u2".to_string()
            }
        );
    }

    #[test]
    fn test_onebot_group_target_reads_group_id() {
        let raw = json!({
            "message_type": "group",
            "message": "x",
            "user_id": 7,
            "group_id": 99
        });
        let target = InboundEvent::parse(&raw).unwrap().reply_target();
        assert_eq!(target.kind, TargetKind::Group);
        assert_eq!(target.id, "99");
    }

    #[test]
    fn test_onebot_segment_message_uses_alt_text() {
        let raw = json!({
            "message_type": "private",
            "message": [{"type": "text", "data": {"text": "/status"}}],
            "alt_message": "  /status\n",
            "raw_message": "ignored",
            "user_id": 1
        });
        let event = InboundEvent::parse(&raw).unwrap();
        assert_eq!(event.trigger_text(), "/status");
    }

    #[test]
    fn test_onebot_command_name_strips_slashes() {
        let raw = json!({
            "message_type": "private",
            "message": "/服务器状态",
            "raw_message": " /服务器状态 ",
            "user_id": 1
        });
        let event = InboundEvent::parse(&raw).unwrap();
        assert_eq!(event.command_name().as_deref(), Some("服务器状态"));
    }

    #[test]
    fn test_unrecognized_shapes() {
        assert!(InboundEvent::parse(&json!({"foo": "bar"})).is_none());
        assert!(InboundEvent::parse(&json!({"message": "only"})).is_none());
        assert!(InboundEvent::parse(&json!({"event": {"chat": {}}})).is_none());
        assert!(InboundEvent::parse(&json!("a string")).is_none());
        assert!(InboundEvent::parse(&json!([1, 2, 3])).is_none());
    }

    #[test]
    fn test_platform_from_str() {
        assert_eq!("OneBot".parse::<Platform>().unwrap(), Platform::OneBot);
        assert_eq!("yunhu".parse::<Platform>().unwrap(), Platform::Yunhu);
        assert!("discord".parse::<Platform>().is_err());
    }
}
