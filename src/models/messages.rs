use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TextMessage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartTimeMessage {
    pub start_time: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FontSizeMessage {
    pub font_size: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UsersMessage {
    pub users: Vec<String>,
}

/// Messages the hub sends to clients
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum SendMessage {
    #[serde(rename = "text")]
    Text(TextMessage),
    #[serde(rename = "startTime")]
    StartTime(StartTimeMessage),
    #[serde(rename = "fontSize")]
    FontSize(FontSizeMessage),
    #[serde(rename = "users")]
    Users(UsersMessage),
}

impl SendMessage {
    pub fn to_json(&self) -> String {
        // Every variant is plain strings and integers, so this cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Inbound `fontSize` payload; any JSON number is accepted and truncated.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedFontSize {
    pub font_size: f64,
}

/// Messages the hub inspects after fanning them out
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ReceivedMessage {
    #[serde(rename = "text")]
    Text(TextMessage),
    #[serde(rename = "fontSize")]
    FontSize(ReceivedFontSize),
}

impl ReceivedMessage {
    /// Parse a raw client frame; None for malformed or unrecognized payloads.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outbound_shapes_match_the_wire_protocol() {
        let text = SendMessage::Text(TextMessage {
            text: "hi".to_string(),
            session_id: Some("s1".to_string()),
        });
        assert_eq!(
            serde_json::to_value(&text).unwrap(),
            json!({"type": "text", "text": "hi", "session_id": "s1"})
        );

        let start = SendMessage::StartTime(StartTimeMessage { start_time: 1700000000 });
        assert_eq!(
            serde_json::to_value(&start).unwrap(),
            json!({"type": "startTime", "startTime": 1700000000})
        );

        let font = SendMessage::FontSize(FontSizeMessage { font_size: 16 });
        assert_eq!(
            serde_json::to_value(&font).unwrap(),
            json!({"type": "fontSize", "fontSize": 16})
        );

        let users = SendMessage::Users(UsersMessage {
            users: vec!["a".to_string(), "b".to_string()],
        });
        assert_eq!(
            serde_json::to_value(&users).unwrap(),
            json!({"type": "users", "users": ["a", "b"]})
        );
    }

    #[test]
    fn parses_inbound_text_with_or_without_session() {
        assert_eq!(
            ReceivedMessage::parse(r#"{"type":"text","text":"hello"}"#),
            Some(ReceivedMessage::Text(TextMessage {
                text: "hello".to_string(),
                session_id: None,
            }))
        );
        assert!(matches!(
            ReceivedMessage::parse(r#"{"type":"text","text":"x","session_id":"abc"}"#),
            Some(ReceivedMessage::Text(TextMessage { session_id: Some(_), .. }))
        ));
    }

    #[test]
    fn parses_fractional_font_size() {
        assert_eq!(
            ReceivedMessage::parse(r#"{"type":"fontSize","fontSize":18.7}"#),
            Some(ReceivedMessage::FontSize(ReceivedFontSize { font_size: 18.7 }))
        );
    }

    #[test]
    fn ignores_unknown_and_malformed_payloads() {
        assert_eq!(ReceivedMessage::parse(r#"{"type":"cursor","pos":3}"#), None);
        assert_eq!(ReceivedMessage::parse(r#"{"type":"text"}"#), None);
        assert_eq!(ReceivedMessage::parse("not json"), None);
    }
}
