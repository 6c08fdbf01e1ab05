//! Session state — the single authoritative view of the connection
//! lifecycle, derived from client events.
//!
//! Exactly one `Session` exists per process. The lifecycle controller owns
//! all writes; the presentation layer and command handlers read through the
//! shared handle.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Uninitialized,
    Initializing,
    AwaitingScan,
    Authenticating,
    Ready,
    Disconnected,
    Reconnecting,
    /// Attempt ceiling exhausted; requires operator restart.
    Aborted,
}

impl ConnectionState {
    /// Human-readable name for logs and `warden status`.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::AwaitingScan => "awaiting-scan",
            Self::Authenticating => "authenticating",
            Self::Ready => "ready",
            Self::Disconnected => "disconnected",
            Self::Reconnecting => "reconnecting",
            Self::Aborted => "aborted",
        }
    }
}

/// Read-only summary for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub has_session: bool,
    pub file_count: u64,
    pub connected_since: Option<DateTime<Utc>>,
}

/// The singleton connection session.
#[derive(Debug)]
pub struct Session {
    state: ConnectionState,
    /// PNG-encoded pairing QR. Non-null only while awaiting a scan.
    qr_png: Option<Vec<u8>>,
    connected_since: Option<DateTime<Utc>>,
    last_command_at: Option<DateTime<Utc>>,
    /// Completed re-initializations since the last `Ready`.
    attempt: u32,
    max_attempts: u32,
    disconnect_reason: Option<String>,
}

impl Session {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: ConnectionState::Uninitialized,
            qr_png: None,
            connected_since: None,
            last_command_at: None,
            attempt: 0,
            max_attempts,
            disconnect_reason: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Ready
    }

    /// Current QR payload, if a scan is pending.
    pub fn current_qr(&self) -> Option<&[u8]> {
        self.qr_png.as_deref()
    }

    pub fn connected_since(&self) -> Option<DateTime<Utc>> {
        self.connected_since
    }

    pub fn last_command_at(&self) -> Option<DateTime<Utc>> {
        self.last_command_at
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn disconnect_reason(&self) -> Option<&str> {
        self.disconnect_reason.as_deref()
    }

    /// Start requested (or a reconnect fired): client is being constructed.
    pub fn begin_initializing(&mut self) {
        self.state = ConnectionState::Initializing;
        self.qr_png = None;
    }

    /// A QR payload was accepted: waiting for the operator to scan.
    pub fn store_qr(&mut self, png: Vec<u8>) {
        self.state = ConnectionState::AwaitingScan;
        self.qr_png = Some(png);
    }

    /// Credentials accepted; the QR (if any) is no longer valid.
    pub fn mark_authenticated(&mut self) {
        self.state = ConnectionState::Authenticating;
        self.qr_png = None;
    }

    /// Fully connected. Resets the attempt counter.
    pub fn mark_ready(&mut self) {
        self.state = ConnectionState::Ready;
        self.qr_png = None;
        self.connected_since = Some(Utc::now());
        self.disconnect_reason = None;
        self.attempt = 0;
    }

    /// Stored session rejected — back to square one (after a purge).
    pub fn mark_auth_failure(&mut self) {
        self.state = ConnectionState::Uninitialized;
        self.qr_png = None;
        self.connected_since = None;
    }

    /// Connection dropped.
    pub fn record_disconnect(&mut self, reason: &str) {
        self.state = ConnectionState::Disconnected;
        self.qr_png = None;
        self.connected_since = None;
        self.disconnect_reason = Some(reason.to_string());
    }

    /// A reconnect is scheduled for attempt `n`. Returns `false` when the
    /// ceiling is exhausted, in which case the session is aborted instead.
    pub fn begin_reconnecting(&mut self, next_attempt: u32) -> bool {
        if next_attempt > self.max_attempts {
            self.state = ConnectionState::Aborted;
            return false;
        }
        self.state = ConnectionState::Reconnecting;
        true
    }

    /// The scheduled reconnect fired: one more completed attempt.
    pub fn record_attempt(&mut self) {
        self.attempt += 1;
    }

    /// Note the arrival of a command (for `#ping` latency).
    pub fn touch_command(&mut self) {
        self.last_command_at = Some(Utc::now());
    }
}

/// Shared handle to the singleton session.
pub type SharedSession = Arc<RwLock<Session>>;

pub fn shared(session: Session) -> SharedSession {
    Arc::new(RwLock::new(session))
}
