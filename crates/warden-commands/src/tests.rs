use super::*;
use crate::dispatch::{dispatch, qualify, Outcome};
use crate::status::format_uptime;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use warden_core::{
    error::WardenError,
    message::{Chat, Participant, PlatformMessage},
    session::{shared, Session},
};

/// Scripted platform client that records every outgoing call.
#[derive(Default)]
struct RecordingClient {
    chat: Mutex<Chat>,
    quoted: Mutex<Option<PlatformMessage>>,
    photo_url: Mutex<Option<String>>,
    replies: Mutex<Vec<String>>,
    sent: Mutex<Vec<(String, String, Vec<String>)>>,
    media_replies: Mutex<Vec<String>>,
    fail_get_chat: Mutex<bool>,
}

#[async_trait]
impl warden_core::client::PlatformClient for RecordingClient {
    async fn initialize(&self) -> Result<(), WardenError> {
        Ok(())
    }

    async fn destroy(&self) -> Result<(), WardenError> {
        Ok(())
    }

    async fn get_chat(&self, _chat_id: &str) -> Result<Chat, WardenError> {
        if *self.fail_get_chat.lock().await {
            return Err(WardenError::Client("chat fetch failed".into()));
        }
        Ok(self.chat.lock().await.clone())
    }

    async fn get_quoted_message(
        &self,
        _message_id: &str,
    ) -> Result<Option<PlatformMessage>, WardenError> {
        Ok(self.quoted.lock().await.clone())
    }

    async fn profile_photo_url(&self, _contact_id: &str) -> Result<Option<String>, WardenError> {
        Ok(self.photo_url.lock().await.clone())
    }

    async fn fetch_media(&self, _url: &str) -> Result<Vec<u8>, WardenError> {
        Ok(vec![0x89, 0x50])
    }

    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        mentions: &[String],
    ) -> Result<(), WardenError> {
        self.sent
            .lock()
            .await
            .push((chat_id.to_string(), text.to_string(), mentions.to_vec()));
        Ok(())
    }

    async fn reply(&self, _message: &PlatformMessage, text: &str) -> Result<(), WardenError> {
        self.replies.lock().await.push(text.to_string());
        Ok(())
    }

    async fn reply_media(
        &self,
        _message: &PlatformMessage,
        _media: &[u8],
        caption: &str,
    ) -> Result<(), WardenError> {
        self.media_replies.lock().await.push(caption.to_string());
        Ok(())
    }
}

fn self_message(body: &str) -> PlatformMessage {
    PlatformMessage {
        id: "m1".into(),
        chat_id: "123@c.us".into(),
        body: body.into(),
        from_me: true,
        to: "456@c.us".into(),
        author: None,
        has_quoted: false,
        quoted_id: None,
        timestamp: chrono::Utc::now(),
    }
}

fn context(client: Arc<RecordingClient>) -> CommandContext {
    CommandContext {
        client,
        session: shared(Session::new(3)),
        bot_name: "warden".into(),
        owners: vec!["Alice — https://wa.me/111".into()],
    }
}

#[test]
fn test_parse_all_commands() {
    assert!(matches!(Command::parse("start"), Some(Command::Start)));
    assert!(matches!(Command::parse("ping"), Some(Command::Ping)));
    assert!(matches!(Command::parse("owner"), Some(Command::Owner)));
    assert!(matches!(Command::parse("help"), Some(Command::Help)));
    assert!(matches!(Command::parse("status"), Some(Command::Status)));
    assert!(matches!(Command::parse("tagall"), Some(Command::TagAll)));
    assert!(matches!(Command::parse("pp"), Some(Command::ProfilePhoto)));
    assert!(matches!(Command::parse("info"), Some(Command::Info)));
    assert!(Command::parse("nope").is_none());
}

#[test]
fn test_parse_is_case_insensitive() {
    assert!(matches!(Command::parse("PING"), Some(Command::Ping)));
    assert!(matches!(Command::parse("TagAll"), Some(Command::TagAll)));
}

#[test]
fn test_qualify_requires_marker_and_self_authorship() {
    assert!(qualify(&self_message("#ping")).is_some());
    assert!(qualify(&self_message("  #ping  ")).is_some());
    assert!(qualify(&self_message("ping")).is_none());
    assert!(qualify(&self_message("")).is_none());

    let mut inbound = self_message("#ping");
    inbound.from_me = false;
    assert!(qualify(&inbound).is_none());

    let mut status_post = self_message("#ping");
    status_post.to = "status@broadcast".into();
    assert!(qualify(&status_post).is_none());
}

#[test]
fn test_qualify_splits_name_and_args() {
    let inv = qualify(&self_message("#PP 2250704 extra")).unwrap();
    assert_eq!(inv.name, "pp");
    assert_eq!(inv.args, vec!["2250704".to_string(), "extra".to_string()]);
}

#[tokio::test]
async fn test_ping_yields_exactly_one_reply() {
    let client = Arc::new(RecordingClient::default());
    let ctx = context(client.clone());
    let inv = qualify(&self_message("#ping")).unwrap();

    let outcome = dispatch(&ctx, &inv).await;

    assert_eq!(outcome, Outcome::Handled);
    let replies = client.replies.lock().await;
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("Pong"));
}

#[tokio::test]
async fn test_bare_marker_gets_exactly_one_reply() {
    let client = Arc::new(RecordingClient::default());
    let ctx = context(client.clone());
    let inv = qualify(&self_message("#")).expect("bare marker should qualify");
    assert!(inv.name.is_empty());

    let outcome = dispatch(&ctx, &inv).await;

    assert_eq!(outcome, Outcome::Unknown);
    let replies = client.replies.lock().await;
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("Unknown command"));
}

#[tokio::test]
async fn test_unknown_command_gets_fallback_reply() {
    let client = Arc::new(RecordingClient::default());
    let ctx = context(client.clone());
    let inv = qualify(&self_message("#frobnicate")).unwrap();

    let outcome = dispatch(&ctx, &inv).await;

    assert_eq!(outcome, Outcome::Unknown);
    let replies = client.replies.lock().await;
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("Unknown command"));
}

#[tokio::test]
async fn test_handler_failure_is_isolated() {
    let client = Arc::new(RecordingClient::default());
    *client.fail_get_chat.lock().await = true;
    let ctx = context(client.clone());
    let inv = qualify(&self_message("#info")).unwrap();

    let outcome = dispatch(&ctx, &inv).await;

    assert_eq!(outcome, Outcome::Failed);
    let replies = client.replies.lock().await;
    assert_eq!(replies.len(), 1, "failure must still produce one reply");
}

#[tokio::test]
async fn test_tagall_outside_group_sends_no_group_message() {
    let client = Arc::new(RecordingClient::default());
    *client.chat.lock().await = Chat {
        id: "456@c.us".into(),
        is_group: false,
        ..Default::default()
    };
    let ctx = context(client.clone());
    let inv = qualify(&self_message("#tagall")).unwrap();

    let outcome = dispatch(&ctx, &inv).await;

    assert_eq!(outcome, Outcome::Handled);
    assert!(client.sent.lock().await.is_empty());
    let replies = client.replies.lock().await;
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("only works in groups"));
}

#[tokio::test]
async fn test_tagall_empty_group_is_an_error_reply() {
    let client = Arc::new(RecordingClient::default());
    *client.chat.lock().await = Chat {
        id: "g1@g.us".into(),
        is_group: true,
        ..Default::default()
    };
    let ctx = context(client.clone());
    let inv = qualify(&self_message("#tagall")).unwrap();

    dispatch(&ctx, &inv).await;

    assert!(client.sent.lock().await.is_empty());
    assert_eq!(client.replies.lock().await.len(), 1);
}

#[tokio::test]
async fn test_tagall_mentions_every_participant() {
    let client = Arc::new(RecordingClient::default());
    *client.chat.lock().await = Chat {
        id: "g1@g.us".into(),
        name: "Crew".into(),
        is_group: true,
        description: None,
        participants: vec![
            Participant {
                id: "111@c.us".into(),
                is_admin: true,
                is_super_admin: false,
            },
            Participant {
                id: "222@c.us".into(),
                is_admin: false,
                is_super_admin: false,
            },
        ],
    };
    let ctx = context(client.clone());
    let inv = qualify(&self_message("#tagall")).unwrap();

    let outcome = dispatch(&ctx, &inv).await;

    assert_eq!(outcome, Outcome::Handled);
    let sent = client.sent.lock().await;
    assert_eq!(sent.len(), 1);
    let (chat_id, text, mentions) = &sent[0];
    assert_eq!(chat_id, "g1@g.us");
    assert!(text.contains("@111"));
    assert!(text.contains("@222"));
    assert_eq!(mentions.len(), 2);
}

#[tokio::test]
async fn test_info_reports_group_metadata() {
    let client = Arc::new(RecordingClient::default());
    *client.chat.lock().await = Chat {
        id: "g1@g.us".into(),
        name: "Crew".into(),
        is_group: true,
        description: Some("weekend plans".into()),
        participants: vec![
            Participant {
                id: "111@c.us".into(),
                is_admin: true,
                is_super_admin: false,
            },
            Participant {
                id: "222@c.us".into(),
                is_admin: false,
                is_super_admin: true,
            },
            Participant {
                id: "333@c.us".into(),
                is_admin: false,
                is_super_admin: false,
            },
        ],
    };
    let ctx = context(client.clone());
    let inv = qualify(&self_message("#info")).unwrap();

    dispatch(&ctx, &inv).await;

    let replies = client.replies.lock().await;
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("Crew"));
    assert!(replies[0].contains("Members: 3"));
    assert!(replies[0].contains("Admins: 2"));
    assert!(replies[0].contains("weekend plans"));
}

#[tokio::test]
async fn test_info_without_description_says_none() {
    let client = Arc::new(RecordingClient::default());
    *client.chat.lock().await = Chat {
        id: "g1@g.us".into(),
        name: "Crew".into(),
        is_group: true,
        ..Default::default()
    };
    let ctx = context(client.clone());
    let inv = qualify(&self_message("#info")).unwrap();

    dispatch(&ctx, &inv).await;

    assert!(client.replies.lock().await[0].contains("Description: none"));
}

#[tokio::test]
async fn test_pp_numeric_argument_takes_priority() {
    let client = Arc::new(RecordingClient::default());
    *client.photo_url.lock().await = Some("https://example.test/photo.jpg".into());
    let ctx = context(client.clone());
    let inv = qualify(&self_message("#pp +225 07 04")).unwrap();

    let outcome = dispatch(&ctx, &inv).await;

    assert_eq!(outcome, Outcome::Handled);
    assert_eq!(client.media_replies.lock().await.len(), 1);
}

#[tokio::test]
async fn test_pp_falls_back_to_quoted_author() {
    let client = Arc::new(RecordingClient::default());
    *client.photo_url.lock().await = Some("https://example.test/photo.jpg".into());
    let mut quoted = self_message("hello");
    quoted.author = Some("999@c.us".into());
    *client.quoted.lock().await = Some(quoted);

    let ctx = context(client.clone());
    let mut msg = self_message("#pp");
    msg.has_quoted = true;
    let inv = qualify(&msg).unwrap();

    let outcome = dispatch(&ctx, &inv).await;

    assert_eq!(outcome, Outcome::Handled);
    assert_eq!(client.media_replies.lock().await.len(), 1);
}

#[tokio::test]
async fn test_pp_in_group_without_target_is_refused() {
    let client = Arc::new(RecordingClient::default());
    *client.chat.lock().await = Chat {
        id: "g1@g.us".into(),
        is_group: true,
        ..Default::default()
    };
    let ctx = context(client.clone());
    let inv = qualify(&self_message("#pp")).unwrap();

    dispatch(&ctx, &inv).await;

    assert!(client.media_replies.lock().await.is_empty());
    let replies = client.replies.lock().await;
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("group"));
}

#[tokio::test]
async fn test_pp_without_photo_replies_no_photo() {
    let client = Arc::new(RecordingClient::default());
    let ctx = context(client.clone());
    let inv = qualify(&self_message("#pp")).unwrap();

    dispatch(&ctx, &inv).await;

    assert!(client.media_replies.lock().await.is_empty());
    assert!(client.replies.lock().await[0].contains("no profile photo"));
}

#[tokio::test]
async fn test_status_not_connected() {
    let client = Arc::new(RecordingClient::default());
    let ctx = context(client.clone());
    let inv = qualify(&self_message("#status")).unwrap();

    dispatch(&ctx, &inv).await;

    assert!(client.replies.lock().await[0].contains("Not connected"));
}

#[tokio::test]
async fn test_status_reports_uptime_when_connected() {
    let client = Arc::new(RecordingClient::default());
    let ctx = context(client.clone());
    ctx.session.write().await.mark_ready();
    let inv = qualify(&self_message("#status")).unwrap();

    dispatch(&ctx, &inv).await;

    let replies = client.replies.lock().await;
    assert!(replies[0].contains("Online:"));
}

#[test]
fn test_format_uptime() {
    assert_eq!(format_uptime(0), "0s");
    assert_eq!(format_uptime(59), "59s");
    assert_eq!(format_uptime(61), "1m 1s");
    assert_eq!(format_uptime(3_661), "1h 1m 1s");
    assert_eq!(format_uptime(90_061), "1d 1h 1m 1s");
}
