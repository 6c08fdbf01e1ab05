//! # warden-commands
//!
//! Parses operator-issued `#` commands out of self-authored messages and
//! routes them to handlers against the live platform client. Handler
//! failures are isolated per invocation: logged, answered with a generic
//! apology, never allowed to touch the dispatcher or the connection.

mod contact;
mod dispatch;
mod group;
mod status;

#[cfg(test)]
mod tests;

pub use dispatch::{dispatch, qualify, Invocation, Outcome};

use std::sync::Arc;
use warden_core::{
    client::PlatformClient,
    error::WardenError,
    message::PlatformMessage,
    session::SharedSession,
};

/// Leading character that marks a self-authored message as a command.
pub const COMMAND_MARKER: char = '#';

/// Everything a handler needs: the live client, the shared session state,
/// and the bot identity for reply branding.
pub struct CommandContext {
    pub client: Arc<dyn PlatformClient>,
    pub session: SharedSession,
    pub bot_name: String,
    pub owners: Vec<String>,
}

/// Known bot commands. The immutable registry: built into the parse table,
/// never mutated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Ping,
    Owner,
    Help,
    Status,
    TagAll,
    ProfilePhoto,
    Info,
}

impl Command {
    /// Look up a command by its (case-insensitive) name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "start" => Some(Self::Start),
            "ping" => Some(Self::Ping),
            "owner" => Some(Self::Owner),
            "help" => Some(Self::Help),
            "status" => Some(Self::Status),
            "tagall" => Some(Self::TagAll),
            "pp" => Some(Self::ProfilePhoto),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

/// Handle a parsed command against the originating message.
pub async fn handle(
    cmd: Command,
    ctx: &CommandContext,
    message: &PlatformMessage,
    args: &[String],
) -> Result<(), WardenError> {
    match cmd {
        Command::Start => {
            let text = format!(
                "Hi! I'm *{}*, your WhatsApp bot.\nSend #help to see every available command.",
                ctx.bot_name
            );
            ctx.client.reply(message, &text).await
        }
        Command::Help => {
            let text = format!(
                "*{}* — commands\n\n\
                 #start — introduction\n\
                 #ping — round-trip latency\n\
                 #owner — contact the operators\n\
                 #help — this menu\n\
                 #tagall — mention every group member (groups)\n\
                 #pp — profile photo of a contact\n\
                 #info — group information\n\
                 #status — bot status",
                ctx.bot_name
            );
            ctx.client.reply(message, &text).await
        }
        Command::Owner => {
            let text = if ctx.owners.is_empty() {
                format!("*{}* has no configured owners.", ctx.bot_name)
            } else {
                format!("*{}* — operators\n\n{}", ctx.bot_name, ctx.owners.join("\n"))
            };
            ctx.client.reply(message, &text).await
        }
        Command::Ping => status::handle_ping(ctx, message).await,
        Command::Status => status::handle_status(ctx, message).await,
        Command::TagAll => group::handle_tagall(ctx, message).await,
        Command::Info => group::handle_info(ctx, message).await,
        Command::ProfilePhoto => contact::handle_profile_photo(ctx, message, args).await,
    }
}
