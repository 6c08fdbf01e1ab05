//! Group commands — `#tagall` and `#info`.

use tracing::info;
use warden_core::{error::WardenError, message::PlatformMessage};

use crate::CommandContext;

pub(crate) async fn handle_tagall(
    ctx: &CommandContext,
    message: &PlatformMessage,
) -> Result<(), WardenError> {
    let chat = ctx.client.get_chat(&message.chat_id).await?;

    if !chat.is_group {
        return ctx
            .client
            .reply(message, "This command only works in groups.")
            .await;
    }
    if chat.participants.is_empty() {
        return ctx
            .client
            .reply(message, "No participants in this group.")
            .await;
    }

    let mut text = format!(
        "*{}*\n\nMentioning all {} members:\n\n",
        ctx.bot_name,
        chat.participants.len()
    );
    let mut mentions = Vec::with_capacity(chat.participants.len());
    for participant in &chat.participants {
        let user = participant.id.split('@').next().unwrap_or(&participant.id);
        text.push_str(&format!("@{user} "));
        mentions.push(participant.id.clone());
    }

    ctx.client.send_message(&chat.id, &text, &mentions).await?;
    info!("tagall sent to {} members", mentions.len());
    Ok(())
}

pub(crate) async fn handle_info(
    ctx: &CommandContext,
    message: &PlatformMessage,
) -> Result<(), WardenError> {
    let chat = ctx.client.get_chat(&message.chat_id).await?;

    if !chat.is_group {
        return ctx
            .client
            .reply(message, "This command only works in groups.")
            .await;
    }

    let description = chat
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or("none");
    let text = format!(
        "*{}* — group info\n\nName: {}\nMembers: {}\nAdmins: {}\nDescription: {}",
        ctx.bot_name,
        chat.name,
        chat.participants.len(),
        chat.admin_count(),
        description,
    );
    ctx.client.reply(message, &text).await
}
