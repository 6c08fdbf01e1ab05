//! `#pp` — fetch a contact's profile photo.

use tracing::info;
use warden_core::{
    error::WardenError,
    message::{PlatformMessage, CONTACT_SUFFIX},
};

use crate::CommandContext;

/// Resolve the target contact by priority: explicit numeric argument,
/// quoted message's author, then the 1:1 conversation partner. In a group
/// with none of the above there is no sensible target.
async fn resolve_target(
    ctx: &CommandContext,
    message: &PlatformMessage,
    args: &[String],
) -> Result<Option<String>, WardenError> {
    if let Some(first) = args.first() {
        if first.chars().any(|c| c.is_ascii_digit()) {
            let digits: String = first.chars().filter(char::is_ascii_digit).collect();
            return Ok(Some(format!("{digits}{CONTACT_SUFFIX}")));
        }
    }

    if message.has_quoted {
        if let Some(quoted) = ctx.client.get_quoted_message(&message.id).await? {
            let target = quoted.author.unwrap_or(quoted.chat_id);
            return Ok(Some(target));
        }
    }

    let chat = ctx.client.get_chat(&message.chat_id).await?;
    if chat.is_group {
        Ok(None)
    } else {
        // Self-authored 1:1 messages address the conversation partner.
        Ok(Some(message.to.clone()))
    }
}

pub(crate) async fn handle_profile_photo(
    ctx: &CommandContext,
    message: &PlatformMessage,
    args: &[String],
) -> Result<(), WardenError> {
    let Some(target) = resolve_target(ctx, message, args).await? else {
        return ctx
            .client
            .reply(
                message,
                "In a group, give a number or reply to a message with #pp.",
            )
            .await;
    };

    let Some(url) = ctx.client.profile_photo_url(&target).await? else {
        let text = format!("*{}*\n\nThat contact has no profile photo.", ctx.bot_name);
        return ctx.client.reply(message, &text).await;
    };

    let media = ctx.client.fetch_media(&url).await?;
    let caption = format!("*{}*\n\nProfile photo", ctx.bot_name);
    ctx.client.reply_media(message, &media, &caption).await?;
    info!("profile photo sent for {target}");
    Ok(())
}
