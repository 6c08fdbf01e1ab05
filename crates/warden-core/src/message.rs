use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Suffix the platform uses for one-to-one contact identifiers.
pub const CONTACT_SUFFIX: &str = "@c.us";

/// Chat identifier of the platform's status feed. Self-authored posts to it
/// must never reach the command dispatcher.
pub const STATUS_BROADCAST: &str = "status@broadcast";

/// A message as delivered by the platform client.
///
/// Opaque beyond these fields — the dispatcher only needs the body, the
/// routing identifiers, and the quoted-message linkage for `#pp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformMessage {
    /// Platform-assigned message ID.
    pub id: String,
    /// Chat the message belongs to.
    pub chat_id: String,
    /// Text body (may be empty for media-only messages).
    #[serde(default)]
    pub body: String,
    /// Whether the operator account authored this message.
    #[serde(default)]
    pub from_me: bool,
    /// Addressee (for self-authored 1:1 messages: the conversation partner).
    #[serde(default)]
    pub to: String,
    /// Author ID when distinct from the chat (group messages).
    #[serde(default)]
    pub author: Option<String>,
    /// Whether this message quotes another.
    #[serde(default)]
    pub has_quoted: bool,
    /// ID of the quoted message, if any.
    #[serde(default)]
    pub quoted_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// A chat (1:1 conversation or group) as reported by the platform client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

/// A group participant with its admin flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_super_admin: bool,
}

impl Chat {
    /// Count participants flagged admin or super-admin.
    pub fn admin_count(&self) -> usize {
        self.participants
            .iter()
            .filter(|p| p.is_admin || p.is_super_admin)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_count() {
        let chat = Chat {
            participants: vec![
                Participant {
                    id: "a@c.us".into(),
                    is_admin: true,
                    is_super_admin: false,
                },
                Participant {
                    id: "b@c.us".into(),
                    is_admin: false,
                    is_super_admin: true,
                },
                Participant {
                    id: "c@c.us".into(),
                    is_admin: false,
                    is_super_admin: false,
                },
            ],
            ..Default::default()
        };
        assert_eq!(chat.admin_count(), 2);
    }

    #[test]
    fn test_message_deserializes_with_defaults() {
        let msg: PlatformMessage =
            serde_json::from_str(r#"{"id":"m1","chat_id":"123@c.us"}"#).unwrap();
        assert!(!msg.from_me);
        assert!(msg.body.is_empty());
        assert!(msg.quoted_id.is_none());
    }
}
