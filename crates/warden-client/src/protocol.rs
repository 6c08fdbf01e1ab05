//! Wire format of the sidecar bridge — one JSON document per line.
//!
//! Requests flow to the sidecar's stdin; responses and unsolicited
//! lifecycle events come back on its stdout.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use warden_core::event::LifecycleEvent;
use warden_core::message::PlatformMessage;

/// A request to the sidecar.
#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

/// One line from the sidecar's stdout.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    Response {
        id: u64,
        ok: bool,
        #[serde(default)]
        data: Value,
        #[serde(default)]
        error: Option<String>,
    },
    Event {
        #[serde(flatten)]
        payload: EventFrame,
    },
}

/// Lifecycle events as emitted by the sidecar.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum EventFrame {
    Qr(String),
    Authenticated,
    Ready,
    AuthFailure(String),
    Disconnected(String),
    MessageCreated(PlatformMessage),
}

impl From<EventFrame> for LifecycleEvent {
    fn from(frame: EventFrame) -> Self {
        match frame {
            EventFrame::Qr(data) => LifecycleEvent::Qr(data),
            EventFrame::Authenticated => LifecycleEvent::Authenticated,
            EventFrame::Ready => LifecycleEvent::Ready,
            EventFrame::AuthFailure(reason) => LifecycleEvent::AuthFailure(reason),
            EventFrame::Disconnected(reason) => LifecycleEvent::Disconnected(reason),
            EventFrame::MessageCreated(msg) => LifecycleEvent::MessageCreated(msg),
        }
    }
}
