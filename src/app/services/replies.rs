use anyhow::Result;

use crate::app::services::{colors, Ctx};
use crate::core::gateway::{OutgoingEmbed, OutgoingMessage, UserRef};

/// Marker embedded in staff confirmation footers so `!re`/`!delete` can
/// find the DM message a reply produced.
pub const REPLY_CODE_TAG: &str = "CCACMsgCode:";

/// Extract the DM message id from a staff confirmation footer.
/// Footers look like "Moderator | CCACMsgCode:1234".
pub fn parse_reply_code(footer: &str) -> Option<i64> {
    footer
        .split(REPLY_CODE_TAG)
        .nth(1)?
        .trim()
        .parse()
        .ok()
}

/// Display name for the staff member's position, from the configured
/// role→name ladder.
pub async fn staff_position(ctx: &Ctx, user_id: i64) -> String {
    let roles = ctx
        .gateway
        .member_role_ids(user_id)
        .await
        .unwrap_or_default();
    ctx.config.staff_position_name(&roles).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Sent,
    /// The channel has no open ticket to resolve the recipient from.
    NoTicketUser,
}

/// `!r`: DM the ticket owner, then post the staff-side confirmation with
/// the reply-code footer.
pub async fn send_staff_reply(
    ctx: &Ctx,
    channel_id: i64,
    staff: &UserRef,
    text: &str,
    image_url: Option<String>,
) -> Result<ReplyOutcome> {
    let Some(ticket) = ctx.db.get_open_ticket_by_channel(channel_id).await? else {
        return Ok(ReplyOutcome::NoTicketUser);
    };

    let user_embed = OutgoingEmbed {
        description: Some(text.to_string()),
        color: Some(colors::ORANGE),
        image_url: image_url.clone(),
        ..Default::default()
    };
    let dm_msg_id = ctx
        .gateway
        .send_dm(ticket.user_id, OutgoingMessage::embed(user_embed))
        .await?;

    let position = staff_position(ctx, staff.id).await;
    let staff_embed = OutgoingEmbed {
        description: Some(format!("STAFF RESPONSE:\n{text}")),
        color: Some(colors::GREEN),
        author_name: Some(staff.name.clone()),
        footer: Some(format!("{position} | {REPLY_CODE_TAG}{dm_msg_id}")),
        image_url,
        ..Default::default()
    };
    ctx.gateway
        .send_message(channel_id, OutgoingMessage::embed(staff_embed))
        .await?;
    Ok(ReplyOutcome::Sent)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroOutcome {
    /// DMed to the ticket owner and confirmed in the channel.
    SentToUser,
    /// Posted in place (not a ticket channel).
    Posted,
    NoSuchKey,
    NoTicketUser,
}

/// Premade response dispatch: inside a ticket channel the body goes to
/// the owner as a DM; elsewhere it is simply posted.
pub async fn send_macro(
    ctx: &Ctx,
    channel_id: i64,
    key: &str,
    staff: &UserRef,
    in_ticket_channel: bool,
) -> Result<MacroOutcome> {
    let Some(response) = ctx.db.get_dx_response(key).await? else {
        return Ok(MacroOutcome::NoSuchKey);
    };

    if !in_ticket_channel {
        let embed = OutgoingEmbed {
            title: Some(format!("Premade Reply `{key}`")),
            description: Some(response),
            color: Some(colors::GREEN),
            author_name: Some(staff.name.clone()),
            ..Default::default()
        };
        ctx.gateway
            .send_message(channel_id, OutgoingMessage::embed(embed))
            .await?;
        return Ok(MacroOutcome::Posted);
    }

    let Some(ticket) = ctx.db.get_open_ticket_by_channel(channel_id).await? else {
        return Ok(MacroOutcome::NoTicketUser);
    };

    let user_embed = OutgoingEmbed {
        description: Some(response.clone()),
        color: Some(colors::ORANGE),
        ..Default::default()
    };
    let dm_msg_id = ctx
        .gateway
        .send_dm(ticket.user_id, OutgoingMessage::embed(user_embed))
        .await?;

    let staff_embed = OutgoingEmbed {
        title: Some(format!("Premade Reply `{key}` Sent")),
        description: Some(response),
        color: Some(colors::GREEN),
        author_name: Some(staff.name.clone()),
        footer: Some(format!("{REPLY_CODE_TAG}{dm_msg_id}")),
        ..Default::default()
    };
    ctx.gateway
        .send_message(channel_id, OutgoingMessage::embed(staff_embed))
        .await?;
    Ok(MacroOutcome::SentToUser)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Edited,
    NoReplyCode,
    NoTicketUser,
}

/// `!re`: rewrite a previously sent staff reply, both the owner's DM copy
/// and the staff confirmation, resolved through the reply-code footer of
/// the replied-to confirmation message.
pub async fn edit_reply(
    ctx: &Ctx,
    channel_id: i64,
    confirmation_msg_id: i64,
    staff: &UserRef,
    new_text: &str,
    image_url: Option<String>,
) -> Result<EditOutcome> {
    let confirmation = ctx.gateway.get_message(channel_id, confirmation_msg_id).await?;
    let Some(code) = confirmation
        .embeds
        .first()
        .and_then(|e| e.footer_text.as_deref())
        .and_then(parse_reply_code)
    else {
        return Ok(EditOutcome::NoReplyCode);
    };

    let Some(ticket) = ctx.db.get_ticket_by_channel(channel_id).await? else {
        return Ok(EditOutcome::NoTicketUser);
    };
    let dm_channel = ctx.gateway.dm_channel_id(ticket.user_id).await?;
    let old_dm = ctx.gateway.get_message(dm_channel, code).await?;
    let old_embed = old_dm.embeds.first().cloned().unwrap_or_default();

    let description = if new_text.trim().is_empty() {
        old_embed.description.clone()
    } else {
        Some(new_text.to_string())
    };
    let image = image_url.or(old_embed.image_url.clone());

    let new_dm_embed = OutgoingEmbed {
        title: old_embed.title.clone(),
        description: description.clone(),
        color: Some(colors::ORANGE),
        footer: old_embed.footer_text.clone(),
        image_url: image.clone(),
        ..Default::default()
    };
    ctx.gateway.edit_message(dm_channel, code, new_dm_embed).await?;

    let position = staff_position(ctx, staff.id).await;
    let old_staff_embed = confirmation.embeds.first().cloned().unwrap_or_default();
    let new_staff_embed = OutgoingEmbed {
        title: old_staff_embed.title,
        description,
        color: Some(colors::GREEN),
        author_name: Some(staff.name.clone()),
        footer: Some(format!("{position} | {REPLY_CODE_TAG}{code}")),
        image_url: image,
        ..Default::default()
    };
    ctx.gateway
        .edit_message(channel_id, confirmation_msg_id, new_staff_embed)
        .await?;
    Ok(EditOutcome::Edited)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { user_id: i64 },
    NoReplyCode,
    NoTicketUser,
}

/// `!delete`: remove a sent staff reply from the owner's DMs along with
/// its confirmation message.
pub async fn delete_reply(
    ctx: &Ctx,
    channel_id: i64,
    confirmation_msg_id: i64,
) -> Result<DeleteOutcome> {
    let confirmation = ctx.gateway.get_message(channel_id, confirmation_msg_id).await?;
    let Some(code) = confirmation
        .embeds
        .first()
        .and_then(|e| e.footer_text.as_deref())
        .and_then(parse_reply_code)
    else {
        return Ok(DeleteOutcome::NoReplyCode);
    };

    let Some(ticket) = ctx.db.get_ticket_by_channel(channel_id).await? else {
        return Ok(DeleteOutcome::NoTicketUser);
    };
    let dm_channel = ctx.gateway.dm_channel_id(ticket.user_id).await?;
    ctx.gateway.delete_message(dm_channel, code).await?;
    ctx.gateway
        .delete_message(channel_id, confirmation_msg_id)
        .await?;
    Ok(DeleteOutcome::Deleted {
        user_id: ticket.user_id,
    })
}

#[cfg(test)]
#[path = "../../../tests/unit/app_replies.rs"]
mod tests;
