//! `#ping` and `#status` — liveness and uptime replies.

use chrono::Utc;
use warden_core::{error::WardenError, message::PlatformMessage};

use crate::CommandContext;

/// Render a second count as `Nd Nh Nm Ns`, omitting leading zero units.
pub(crate) fn format_uptime(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{days}d "));
    }
    if hours > 0 {
        out.push_str(&format!("{hours}h "));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m "));
    }
    out.push_str(&format!("{seconds}s"));
    out
}

/// Milliseconds elapsed since the invocation was accepted, or "n/a".
async fn latency_ms(ctx: &CommandContext) -> String {
    match ctx.session.read().await.last_command_at() {
        Some(at) => {
            let ms = (Utc::now() - at).num_milliseconds().max(0);
            format!("{ms}ms")
        }
        None => "n/a".to_string(),
    }
}

pub(crate) async fn handle_ping(
    ctx: &CommandContext,
    message: &PlatformMessage,
) -> Result<(), WardenError> {
    let latency = latency_ms(ctx).await;
    let text = format!("*{}*\n\nPong! Latency: {latency}", ctx.bot_name);
    ctx.client.reply(message, &text).await
}

pub(crate) async fn handle_status(
    ctx: &CommandContext,
    message: &PlatformMessage,
) -> Result<(), WardenError> {
    let connected_since = ctx.session.read().await.connected_since();

    let Some(since) = connected_since else {
        let text = format!("*{}*\n\nNot connected.", ctx.bot_name);
        return ctx.client.reply(message, &text).await;
    };

    let uptime_secs = (Utc::now() - since).num_seconds().max(0) as u64;
    let latency = latency_ms(ctx).await;
    let text = format!(
        "*{}* — status\n\nOnline: {}\nLatency: {latency}\nSession: persisted",
        ctx.bot_name,
        format_uptime(uptime_secs),
    );
    ctx.client.reply(message, &text).await
}
