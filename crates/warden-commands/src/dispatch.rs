//! Qualification and dispatch — the boundary between raw platform messages
//! and command handlers.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};
use warden_core::message::{PlatformMessage, STATUS_BROADCAST};

use crate::{handle, Command, CommandContext, COMMAND_MARKER};

/// One parsed command, consumed by exactly one handler.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub name: String,
    pub args: Vec<String>,
    pub message: PlatformMessage,
    pub issued_at: DateTime<Utc>,
}

/// Result of dispatching one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Handled,
    Unknown,
    Failed,
}

/// Decide whether a message is a command.
///
/// Only self-authored text qualifies, never posts to the status feed, and
/// the trimmed body must start with the command marker.
pub fn qualify(message: &PlatformMessage) -> Option<Invocation> {
    if !message.from_me || message.to == STATUS_BROADCAST {
        return None;
    }

    let body = message.body.trim();
    let rest = body.strip_prefix(COMMAND_MARKER)?;

    // A bare marker still qualifies: the empty name falls through to the
    // unknown-command reply, so the operator always gets an answer.
    let mut tokens = rest.split_whitespace();
    let name = tokens.next().unwrap_or("").to_lowercase();
    let args: Vec<String> = tokens.map(str::to_string).collect();

    Some(Invocation {
        name,
        args,
        message: message.clone(),
        issued_at: Utc::now(),
    })
}

/// Route one invocation to its handler.
///
/// Every invocation gets exactly one reply: the handler's, the fixed
/// unknown-command fallback, or the generic apology on handler failure.
pub async fn dispatch(ctx: &CommandContext, invocation: &Invocation) -> Outcome {
    info!("command received: #{} ({} args)", invocation.name, invocation.args.len());
    ctx.session.write().await.touch_command();

    let Some(cmd) = Command::parse(&invocation.name) else {
        let text = format!(
            "Unknown command #{}. Send #help for the full menu.",
            invocation.name
        );
        if let Err(e) = ctx.client.reply(&invocation.message, &text).await {
            error!("failed to send unknown-command reply: {e}");
        }
        return Outcome::Unknown;
    };

    match handle(cmd, ctx, &invocation.message, &invocation.args).await {
        Ok(()) => {
            debug!("command #{} handled", invocation.name);
            Outcome::Handled
        }
        Err(e) => {
            error!("command #{} failed: {e}", invocation.name);
            let text = "Something went wrong running that command.";
            if let Err(e) = ctx.client.reply(&invocation.message, text).await {
                error!("failed to send failure reply: {e}");
            }
            Outcome::Failed
        }
    }
}
