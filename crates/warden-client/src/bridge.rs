//! The sidecar bridge — owns one external client process per generation.
//!
//! Requests are correlated by id through a pending map; unsolicited frames
//! become generation-tagged lifecycle events. When the sidecar's stdout
//! closes, every pending call fails and a synthetic disconnect is reported,
//! so a crashed sidecar takes the normal reconnect path.

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use warden_core::{
    client::{ClientFactory, PlatformClient},
    config::BridgeConfig,
    error::WardenError,
    event::{ClientEvent, LifecycleEvent},
    message::{Chat, PlatformMessage},
};

use crate::chrome::discover_chrome;
use crate::protocol::{Frame, Request};

/// How long `destroy()` waits for the sidecar to acknowledge before killing.
const DESTROY_TIMEOUT: Duration = Duration::from_secs(5);

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, String>>>>>;

/// Spawns one sidecar process per client generation.
pub struct BridgeFactory {
    config: BridgeConfig,
    session_dir: String,
    client_id: String,
}

impl BridgeFactory {
    pub fn new(config: BridgeConfig, session_dir: &str, client_id: &str) -> Self {
        Self {
            config,
            session_dir: session_dir.to_string(),
            client_id: client_id.to_string(),
        }
    }
}

#[async_trait]
impl ClientFactory for BridgeFactory {
    async fn create(
        &self,
        generation: u64,
        events: mpsc::Sender<ClientEvent>,
    ) -> Result<Arc<dyn PlatformClient>, WardenError> {
        let mut cmd = Command::new(&self.config.program);
        cmd.arg(&self.config.script)
            .args(&self.config.extra_args)
            .env("WARDEN_SESSION_DIR", &self.session_dir)
            .env("WARDEN_CLIENT_ID", &self.client_id)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(chrome) = discover_chrome(&self.config.chrome_candidates) {
            cmd.env("WARDEN_CHROME_PATH", chrome);
        }

        let mut child = cmd.spawn().map_err(|e| {
            WardenError::Client(format!(
                "failed to spawn bridge '{} {}': {e}",
                self.config.program, self.config.script
            ))
        })?;

        let stdin = take_pipe(child.stdin.take(), "stdin")?;
        let stdout = take_pipe(child.stdout.take(), "stdout")?;
        let stderr = take_pipe(child.stderr.take(), "stderr")?;

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        tokio::spawn(forward_stderr(stderr, generation));
        tokio::spawn(read_loop(stdout, events, pending.clone(), generation));

        info!("bridge client spawned (generation {generation})");
        Ok(Arc::new(BridgeClient {
            child: Mutex::new(child),
            stdin: Mutex::new(stdin),
            pending,
            next_id: AtomicU64::new(1),
            destroyed: AtomicBool::new(false),
        }))
    }
}

fn take_pipe<T>(pipe: Option<T>, name: &str) -> Result<T, WardenError> {
    pipe.ok_or_else(|| WardenError::Client(format!("bridge {name} not piped")))
}

async fn forward_stderr(stderr: ChildStderr, generation: u64) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!("bridge[{generation}] stderr: {line}");
    }
}

async fn read_loop(
    stdout: ChildStdout,
    events: mpsc::Sender<ClientEvent>,
    pending: Pending,
    generation: u64,
) {
    let mut lines = BufReader::new(stdout).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Frame>(line) {
            Ok(Frame::Response {
                id,
                ok,
                data,
                error,
            }) => {
                let Some(tx) = pending.lock().await.remove(&id) else {
                    warn!("bridge response for unknown request id {id}");
                    continue;
                };
                let result = if ok {
                    Ok(data)
                } else {
                    Err(error.unwrap_or_else(|| "unspecified bridge error".to_string()))
                };
                let _ = tx.send(result);
            }
            Ok(Frame::Event { payload }) => {
                let event = ClientEvent::new(generation, payload.into());
                if events.send(event).await.is_err() {
                    debug!("event receiver dropped, stopping bridge reader");
                    return;
                }
            }
            Err(e) => warn!("unparseable bridge line: {e}"),
        }
    }

    // Stdout closed: the sidecar is gone. Fail callers and report it so the
    // lifecycle takes the reconnect path.
    for (_, tx) in pending.lock().await.drain() {
        let _ = tx.send(Err("bridge closed".to_string()));
    }
    let _ = events
        .send(ClientEvent::new(
            generation,
            LifecycleEvent::Disconnected("bridge exited".to_string()),
        ))
        .await;
}

/// Handle to one running sidecar process.
pub struct BridgeClient {
    child: Mutex<Child>,
    stdin: Mutex<ChildStdin>,
    pending: Pending,
    next_id: AtomicU64,
    destroyed: AtomicBool,
}

impl BridgeClient {
    async fn call(&self, method: &str, params: Value) -> Result<Value, WardenError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let mut line = serde_json::to_string(&Request { id, method, params })?;
        line.push('\n');
        {
            let mut stdin = self.stdin.lock().await;
            if let Err(e) = stdin.write_all(line.as_bytes()).await {
                self.pending.lock().await.remove(&id);
                return Err(WardenError::Client(format!("bridge write failed: {e}")));
            }
            let _ = stdin.flush().await;
        }

        match rx.await {
            Ok(Ok(data)) => Ok(data),
            Ok(Err(msg)) => Err(WardenError::Client(format!("{method}: {msg}"))),
            Err(_) => Err(WardenError::Client(format!(
                "{method}: bridge closed before responding"
            ))),
        }
    }
}

#[async_trait]
impl PlatformClient for BridgeClient {
    async fn initialize(&self) -> Result<(), WardenError> {
        self.call("initialize", json!({})).await?;
        Ok(())
    }

    async fn destroy(&self) -> Result<(), WardenError> {
        // Idempotent: only the first caller tears the process down.
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        // Give the sidecar a chance to close the browser cleanly.
        let _ = tokio::time::timeout(DESTROY_TIMEOUT, self.call("destroy", json!({}))).await;
        if let Err(e) = self.child.lock().await.kill().await {
            debug!("bridge kill after destroy: {e}");
        }
        info!("bridge client destroyed");
        Ok(())
    }

    async fn get_chat(&self, chat_id: &str) -> Result<Chat, WardenError> {
        let data = self.call("getChat", json!({ "chatId": chat_id })).await?;
        Ok(serde_json::from_value(data)?)
    }

    async fn get_quoted_message(
        &self,
        message_id: &str,
    ) -> Result<Option<PlatformMessage>, WardenError> {
        let data = self
            .call("getQuotedMessage", json!({ "messageId": message_id }))
            .await?;
        if data.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(data)?))
    }

    async fn profile_photo_url(&self, contact_id: &str) -> Result<Option<String>, WardenError> {
        let data = self
            .call("getProfilePhotoUrl", json!({ "contactId": contact_id }))
            .await?;
        if data.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(data)?))
    }

    async fn fetch_media(&self, url: &str) -> Result<Vec<u8>, WardenError> {
        let data = self.call("fetchMedia", json!({ "url": url })).await?;
        let encoded: String = serde_json::from_value(data)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| WardenError::Client(format!("media decode failed: {e}")))
    }

    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        mentions: &[String],
    ) -> Result<(), WardenError> {
        self.call(
            "sendMessage",
            json!({ "chatId": chat_id, "text": text, "mentions": mentions }),
        )
        .await?;
        Ok(())
    }

    async fn reply(&self, message: &PlatformMessage, text: &str) -> Result<(), WardenError> {
        self.call(
            "reply",
            json!({ "messageId": message.id, "chatId": message.chat_id, "text": text }),
        )
        .await?;
        Ok(())
    }

    async fn reply_media(
        &self,
        message: &PlatformMessage,
        media: &[u8],
        caption: &str,
    ) -> Result<(), WardenError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(media);
        self.call(
            "replyMedia",
            json!({
                "messageId": message.id,
                "chatId": message.chat_id,
                "media": encoded,
                "caption": caption,
            }),
        )
        .await?;
        Ok(())
    }
}
