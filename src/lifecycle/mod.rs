//! Client lifecycle — owns the single platform client instance and the
//! authoritative connection state.
//!
//! One task consumes the typed event queue; timers (reconnect backoff) are
//! `select!` branches on the same task, so every state transition is
//! sequential with respect to event delivery and no locks guard anything
//! beyond the shared read view. Commands run on a separate worker so an
//! in-flight handler never stalls the state machine, while the worker's
//! single queue keeps invocations strictly in arrival order.

mod backoff;


use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use warden_commands::{dispatch, qualify, CommandContext, Invocation};
use warden_core::{
    client::{ClientFactory, PlatformClient},
    config::Config,
    error::WardenError,
    event::{ClientEvent, LifecycleEvent},
    message::PlatformMessage,
    session::{shared, Session, SharedSession},
};
use warden_store::SessionStore;

use backoff::backoff_delay;

/// A qualified invocation paired with the client it must run against.
/// The client is captured at enqueue time so a reconnect mid-queue cannot
/// swap the handle under a running handler.
struct CommandJob {
    client: Arc<dyn PlatformClient>,
    invocation: Invocation,
}

/// Owns the platform client across its whole lifetime: bootstrap, pairing,
/// disconnects, backoff-driven reconnection, and corrupt-session recovery.
pub struct Controller {
    config: Config,
    store: SessionStore,
    factory: Arc<dyn ClientFactory>,
    session: SharedSession,
    client: Option<Arc<dyn PlatformClient>>,
    /// Tag of the current client instance. Bumped before each (re)create;
    /// events carrying an older tag are stale and discarded.
    generation: u64,
    /// When the last QR payload was accepted, for regeneration debounce.
    qr_accepted_at: Option<Instant>,
    /// Armed reconnect deadline. `None` = no reconnect pending.
    reconnect_at: Option<Instant>,
    cmd_tx: mpsc::Sender<CommandJob>,
    cmd_rx: Option<mpsc::Receiver<CommandJob>>,
}

impl Controller {
    pub fn new(config: Config, store: SessionStore, factory: Arc<dyn ClientFactory>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let session = shared(Session::new(config.reconnect.max_attempts));
        Self {
            config,
            store,
            factory,
            session,
            client: None,
            generation: 0,
            qr_accepted_at: None,
            reconnect_at: None,
            cmd_tx,
            cmd_rx: Some(cmd_rx),
        }
    }

    /// Run the lifecycle until ctrl-c or a terminal error.
    pub async fn run(mut self) -> Result<(), WardenError> {
        let (event_tx, mut event_rx) = mpsc::channel::<ClientEvent>(256);

        if let Some(cmd_rx) = self.cmd_rx.take() {
            let session = self.session.clone();
            let bot_name = self.config.bot.name.clone();
            let owners = self.config.bot.owners.clone();
            tokio::spawn(command_worker(cmd_rx, session, bot_name, owners));
        }

        self.start_client(&event_tx).await?;

        loop {
            let deadline = self.reconnect_at.unwrap_or_else(Instant::now);
            tokio::select! {
                maybe_event = event_rx.recv() => {
                    let Some(event) = maybe_event else { break };
                    if let Err(e) = self.handle_event(event, &event_tx).await {
                        self.teardown().await;
                        return Err(e);
                    }
                }
                _ = tokio::time::sleep_until(deadline), if self.reconnect_at.is_some() => {
                    if let Err(e) = self.reconnect_fired(&event_tx).await {
                        self.teardown().await;
                        return Err(e);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown requested");
                    self.shutdown().await;
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// React to one client event. Stale generations are dropped up front.
    async fn handle_event(
        &mut self,
        event: ClientEvent,
        event_tx: &mpsc::Sender<ClientEvent>,
    ) -> Result<(), WardenError> {
        if event.generation != self.generation {
            debug!(
                "discarding stale event from generation {} (current {})",
                event.generation, self.generation
            );
            return Ok(());
        }

        match event.event {
            LifecycleEvent::Qr(data) => {
                self.handle_qr(&data).await;
                Ok(())
            }
            LifecycleEvent::Authenticated => {
                info!("authenticated — stored session accepted");
                self.session.write().await.mark_authenticated();
                Ok(())
            }
            LifecycleEvent::Ready => {
                self.session.write().await.mark_ready();
                // A pending reconnect is obsolete the moment we're connected.
                self.reconnect_at = None;
                self.qr_accepted_at = None;
                info!("connected and ready");
                Ok(())
            }
            LifecycleEvent::AuthFailure(reason) => {
                warn!("authentication failure: {reason} — purging session and restarting");
                self.recover_corrupt_session(event_tx).await
            }
            LifecycleEvent::Disconnected(reason) => {
                warn!("disconnected: {reason}");
                self.session.write().await.record_disconnect(&reason);
                self.schedule_reconnect().await
            }
            LifecycleEvent::MessageCreated(message) => {
                self.forward_command(message).await;
                Ok(())
            }
        }
    }

    /// Accept a QR payload unless one was accepted within the cooldown.
    /// The platform re-emits duplicates while the previous code is valid;
    /// re-encoding each one spams the presentation layer for nothing.
    async fn handle_qr(&mut self, data: &str) {
        let cooldown = Duration::from_secs(self.config.qr.regen_cooldown_secs);
        if let Some(at) = self.qr_accepted_at {
            if at.elapsed() < cooldown {
                debug!("duplicate QR suppressed (within cooldown)");
                return;
            }
        }

        match crate::qr::generate_qr_image(data) {
            Ok(png) => {
                self.session.write().await.store_qr(png);
                self.qr_accepted_at = Some(Instant::now());
                info!("pairing QR updated — scan with the app");
                if let Ok(term) = crate::qr::generate_qr_terminal(data) {
                    info!("\n{term}");
                }
            }
            Err(e) => warn!("QR encoding failed: {e}"),
        }
    }

    /// Ensure the credential directory, bump the generation, and bring up a
    /// fresh client. Construction/initialize failures take the reconnect
    /// path instead of bubbling.
    async fn start_client(
        &mut self,
        event_tx: &mpsc::Sender<ClientEvent>,
    ) -> Result<(), WardenError> {
        self.store.ensure()?;
        self.generation += 1;
        // The cooldown guards duplicate re-emissions from one client; a
        // replacement client's first QR must always be accepted.
        self.qr_accepted_at = None;
        self.session.write().await.begin_initializing();
        info!("starting platform client (generation {})", self.generation);

        let client = match self.factory.create(self.generation, event_tx.clone()).await {
            Ok(client) => client,
            Err(e) => {
                warn!("client construction failed: {e}");
                self.session
                    .write()
                    .await
                    .record_disconnect("construction failed");
                return self.schedule_reconnect().await;
            }
        };

        if let Err(e) = client.initialize().await {
            warn!("client initialize failed: {e}");
            let _ = client.destroy().await;
            self.session
                .write()
                .await
                .record_disconnect("initialize failed");
            return self.schedule_reconnect().await;
        }

        self.client = Some(client);
        Ok(())
    }

    /// Arm the backoff timer for the next attempt, or abort at the ceiling.
    async fn schedule_reconnect(&mut self) -> Result<(), WardenError> {
        let next = {
            let mut session = self.session.write().await;
            let next = session.attempt() + 1;
            if !session.begin_reconnecting(next) {
                let attempts = session.attempt();
                error!("reconnect ceiling reached after {attempts} attempts — aborting");
                return Err(WardenError::ReconnectExhausted { attempts });
            }
            next
        };

        let delay = backoff_delay(next, self.backoff_step(), self.backoff_cap());
        info!("reconnect attempt {next} scheduled in {delay:?}");
        self.reconnect_at = Some(Instant::now() + delay);
        Ok(())
    }

    /// The armed backoff elapsed: count the attempt and replace the client.
    async fn reconnect_fired(
        &mut self,
        event_tx: &mpsc::Sender<ClientEvent>,
    ) -> Result<(), WardenError> {
        self.reconnect_at = None;
        self.session.write().await.record_attempt();
        if let Some(client) = self.client.take() {
            let _ = client.destroy().await;
        }
        self.start_client(event_tx).await
    }

    /// Auth failure means the stored session is corrupt or revoked: tear the
    /// client down, wait out its file locks, purge, and bootstrap fresh.
    async fn recover_corrupt_session(
        &mut self,
        event_tx: &mpsc::Sender<ClientEvent>,
    ) -> Result<(), WardenError> {
        self.session.write().await.mark_auth_failure();
        if let Some(client) = self.client.take() {
            let _ = client.destroy().await;
        }
        tokio::time::sleep(self.teardown_grace()).await;

        if let Err(e) = self
            .store
            .purge(self.config.session.purge_retries, self.purge_backoff())
            .await
        {
            warn!("credential purge failed after auth failure: {e}");
        }

        self.start_client(event_tx).await
    }

    /// Hand a qualifying self-authored message to the command worker.
    async fn forward_command(&mut self, message: PlatformMessage) {
        let Some(invocation) = qualify(&message) else {
            return;
        };
        let Some(client) = self.client.clone() else {
            warn!("command #{} arrived with no live client", invocation.name);
            return;
        };
        if self
            .cmd_tx
            .send(CommandJob { client, invocation })
            .await
            .is_err()
        {
            warn!("command worker unavailable");
        }
    }

    /// Destroy the client on a terminal error, keeping credentials intact.
    async fn teardown(&mut self) {
        if let Some(client) = self.client.take() {
            let _ = client.destroy().await;
        }
    }

    /// Graceful shutdown. The credential directory survives unless the
    /// purge-on-shutdown policy is enabled.
    async fn shutdown(mut self) {
        if let Some(client) = self.client.take() {
            let _ = client.destroy().await;
        }
        if self.config.session.purge_on_shutdown {
            tokio::time::sleep(self.teardown_grace()).await;
            if let Err(e) = self
                .store
                .purge(self.config.session.purge_retries, self.purge_backoff())
                .await
            {
                warn!("shutdown purge failed: {e}");
            }
        }
        info!("warden stopped");
    }

    fn backoff_step(&self) -> Duration {
        Duration::from_secs(self.config.reconnect.backoff_step_secs)
    }

    fn backoff_cap(&self) -> Duration {
        Duration::from_secs(self.config.reconnect.backoff_cap_secs)
    }

    fn purge_backoff(&self) -> Duration {
        Duration::from_millis(self.config.session.purge_backoff_ms)
    }

    fn teardown_grace(&self) -> Duration {
        Duration::from_millis(self.config.session.teardown_grace_ms)
    }
}

/// Single consumer of the command queue: invocations are handled to
/// completion, one at a time, in arrival order.
async fn command_worker(
    mut rx: mpsc::Receiver<CommandJob>,
    session: SharedSession,
    bot_name: String,
    owners: Vec<String>,
) {
    while let Some(job) = rx.recv().await {
        let ctx = CommandContext {
            client: job.client,
            session: session.clone(),
            bot_name: bot_name.clone(),
            owners: owners.clone(),
        };
        dispatch(&ctx, &job.invocation).await;
    }
    debug!("command worker stopped");
}
