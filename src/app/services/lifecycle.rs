use anyhow::Result;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::app::services::{colors, scheduler, transcripts, Ctx};
use crate::core::gateway::{
    AttachmentRef, CategoryOption, OutgoingEmbed, OutgoingMessage, UiComponent, UserRef,
};
use crate::core::types::TimerAction;
use crate::infra::db::tickets::NewTicket;

static TOPIC_USER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d{17,20})\)").expect("valid topic id regex"));

/// Extract the owner's snowflake from a ticket channel topic, e.g.
/// "Ticket for luna (123456789012345678)".
pub fn user_id_from_topic(topic: &str) -> Option<i64> {
    TOPIC_USER_ID_RE
        .captures(topic)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn ticket_channel_name(username: &str) -> String {
    let sanitized: String = username
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();
    format!("dx-{sanitized}")
}

#[derive(Debug, Clone)]
pub struct IncomingDm {
    pub user: UserRef,
    pub dm_channel_id: i64,
    pub content: String,
    pub attachments: Vec<AttachmentRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DmOutcome {
    /// Relayed into the existing ticket channel.
    Forwarded { channel_id: i64 },
    /// No open ticket: the category picker was sent to the user.
    WelcomeSent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OpenOutcome {
    Opened { channel_id: i64 },
    AlreadyOpen { channel_id: i64 },
    UnknownCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed,
    AlreadyClaimed,
    NotATicket,
}

/// Inbound DM router: forward into the open ticket if there is one,
/// otherwise greet with the category picker. A ticket whose channel was
/// deleted out from under us is closed here and the user starts fresh.
pub async fn handle_user_dm(ctx: &Ctx, dm: &IncomingDm) -> Result<DmOutcome> {
    let user_id = dm.user.id;
    if let Some(channel_id) = ctx.cache.open_ticket_for_user(&ctx.db, user_id).await? {
        match ctx.gateway.resolve_channel(channel_id).await? {
            Some(_) => {
                forward_dm(ctx, channel_id, dm).await?;
                return Ok(DmOutcome::Forwarded { channel_id });
            }
            None => {
                tracing::warn!(
                    channel_id,
                    user_id,
                    "open ticket points at a deleted channel; closing stale row"
                );
                ctx.db
                    .close_tickets_for_user(user_id, Utc::now().naive_utc())
                    .await?;
                ctx.db.cancel_all_timers(channel_id).await?;
                ctx.cache.invalidate_channel(channel_id);
            }
        }
    }

    send_welcome(ctx, dm.dm_channel_id).await?;
    Ok(DmOutcome::WelcomeSent)
}

async fn forward_dm(ctx: &Ctx, channel_id: i64, dm: &IncomingDm) -> Result<()> {
    // A reply always defuses a pending suspend.
    ctx.db.cancel_timer(channel_id, TimerAction::Suspend).await?;

    let watchers = ctx.db.get_watchers(channel_id).await?;
    if !watchers.is_empty() {
        let mentions: Vec<String> = watchers.iter().map(|id| format!("<@{id}>")).collect();
        if let Err(e) = ctx
            .gateway
            .send_message(channel_id, OutgoingMessage::text(mentions.join(" ")))
            .await
        {
            tracing::error!(channel_id, error = %e, "Failed to ping watchers");
        }
    }

    let mut embed = OutgoingEmbed {
        title: Some("User Message".to_string()),
        description: Some(dm.content.clone()),
        color: Some(colors::BLUE),
        author_name: Some(dm.user.name.clone()),
        ..Default::default()
    };

    let mut extra: Vec<&AttachmentRef> = Vec::new();
    let mut attachments = dm.attachments.iter();
    if let Some(first) = attachments.next() {
        if first.is_image() {
            embed.image_url = Some(first.url.clone());
        } else {
            extra.push(first);
        }
    }
    extra.extend(attachments);

    ctx.gateway
        .send_message(channel_id, OutgoingMessage::embed(embed))
        .await?;

    if !extra.is_empty() {
        let urls: Vec<String> = extra.iter().map(|a| a.url.clone()).collect();
        let listing = format!("Additional attachments:\n{}", urls.join("\n"));
        if let Err(e) = ctx
            .gateway
            .send_message(channel_id, OutgoingMessage::text(listing))
            .await
        {
            tracing::warn!(channel_id, error = %e, "Failed to forward extra attachments");
        }
    }

    Ok(())
}

async fn send_welcome(ctx: &Ctx, dm_channel_id: i64) -> Result<()> {
    let mut lines = vec!["**Please select the reason for your ticket below:**".to_string()];
    lines.push(String::new());
    for category in &ctx.config.tickets.categories {
        lines.push(category.label.clone());
    }
    lines.push(String::new());
    lines.push(
        "Please do **not spam** staff. Have all necessary materials ready before submitting."
            .to_string(),
    );

    let embed = OutgoingEmbed {
        title: Some("🎟️ Contact Staff!".to_string()),
        description: Some(lines.join("\n")),
        color: Some(colors::PINK),
        ..Default::default()
    };
    let options = ctx
        .config
        .tickets
        .categories
        .iter()
        .map(|c| CategoryOption {
            key: c.key.clone(),
            label: c.label.clone(),
        })
        .collect();

    ctx.gateway
        .send_message(
            dm_channel_id,
            OutgoingMessage {
                embed: Some(embed),
                components: vec![UiComponent::CategorySelect { options }],
                ..Default::default()
            },
        )
        .await?;
    Ok(())
}

/// Open a fresh ticket for a user who picked a category. Rejects if they
/// already have one open (the store decides, not the cache).
pub async fn open_ticket(ctx: &Ctx, user: &UserRef, category_key: &str) -> Result<OpenOutcome> {
    if let Some(channel_id) = ctx.db.get_open_ticket_channel_id(user.id).await? {
        return Ok(OpenOutcome::AlreadyOpen { channel_id });
    }

    let Some(category) = ctx.config.category_by_key(category_key) else {
        return Ok(OpenOutcome::UnknownCategory);
    };
    let category = category.clone();

    let channel_name = ticket_channel_name(&user.name);
    let topic = format!("Ticket for {} ({})", user.name, user.id);
    let channel_id = ctx
        .gateway
        .create_ticket_channel(&channel_name, category.category_id, &topic)
        .await?;

    ctx.db
        .create_ticket(NewTicket {
            channel_id,
            user_id: user.id,
            member_username: &user.name,
            category_id: category.category_id,
            channel_name: &channel_name,
            ticket_type: &category.key,
        })
        .await?;
    if let Some(ticket) = ctx.db.get_open_ticket_by_channel(channel_id).await? {
        ctx.cache.insert(ticket);
    }

    let reminder_at = Utc::now().naive_utc()
        + chrono::Duration::hours(ctx.config.tickets.unclaimed_reminder_hours as i64);
    ctx.db
        .add_timer(channel_id, user.id, TimerAction::Unclaimed, reminder_at)
        .await?;

    post_ticket_header(ctx, channel_id, user, &category.key).await;
    notify_owner_opened(ctx, user).await;

    tracing::info!(
        channel_id,
        user_id = user.id,
        category = %category.key,
        "Ticket opened"
    );
    Ok(OpenOutcome::Opened { channel_id })
}

/// First messages in a fresh ticket channel: who the user is, then the
/// staff ping with the claim button. Both best effort.
async fn post_ticket_header(ctx: &Ctx, channel_id: i64, user: &UserRef, category_key: &str) {
    let info = user_info_embed(ctx, user).await;
    if let Err(e) = ctx
        .gateway
        .send_message(channel_id, OutgoingMessage::embed(info))
        .await
    {
        tracing::error!(channel_id, error = %e, "Failed to post user info");
    }

    let staff_embed = OutgoingEmbed {
        description: Some(
            "A new ticket has been created.\nClick **Claim Ticket** below to take responsibility."
                .to_string(),
        ),
        color: Some(colors::BLURPLE),
        ..Default::default()
    };
    let message = OutgoingMessage {
        content: Some(format!(
            "<@&{}>\nNew ticket from <@{}> (ID: {}) - Category: `{}`",
            ctx.config.discord.staff_ping_role_id, user.id, user.id, category_key
        )),
        embed: Some(staff_embed),
        components: vec![UiComponent::ClaimButton],
        ..Default::default()
    };
    if let Err(e) = ctx.gateway.send_message(channel_id, message).await {
        tracing::error!(channel_id, error = %e, "Failed to post claim prompt");
    }
}

async fn notify_owner_opened(ctx: &Ctx, user: &UserRef) {
    let embed = OutgoingEmbed {
        title: Some("Ticket Created".to_string()),
        description: Some(
            "Your ticket has been opened. Please describe your issue or request here.\n\
             A staff member will be with you shortly, however response times may vary \
             based on volume."
                .to_string(),
        ),
        color: Some(colors::GREEN),
        ..Default::default()
    };
    if let Err(e) = ctx.gateway.send_dm(user.id, OutgoingMessage::embed(embed)).await {
        tracing::warn!(user_id = user.id, error = %e, "Could not DM ticket-created notice");
    }
}

pub async fn user_info_embed(ctx: &Ctx, user: &UserRef) -> OutgoingEmbed {
    let account_age = user.created_at.map_or_else(
        || "unknown".to_string(),
        |created| {
            let delta = Utc::now().naive_utc() - created;
            let days = delta.num_days();
            format!(
                "{}y - {}m - {}d - {}h",
                days / 365,
                (days % 365) / 30,
                (days % 365) % 30,
                delta.num_hours() % 24
            )
        },
    );

    let roles_line = match ctx.gateway.member_role_ids(user.id).await {
        Ok(roles) if roles.is_empty() => "No roles".to_string(),
        Ok(roles) => roles
            .iter()
            .map(|r| format!("<@&{r}>"))
            .collect::<Vec<_>>()
            .join(", "),
        Err(_) => "Not in server".to_string(),
    };

    OutgoingEmbed {
        title: Some("User Information".to_string()),
        color: Some(colors::BLUE),
        fields: vec![
            (
                "User".to_string(),
                format!("**Username | ID:** {} | {}", user.name, user.id),
            ),
            (
                "Account Age".to_string(),
                format!("**Account age:** {account_age}"),
            ),
            ("Roles".to_string(), format!("**Roles:** {roles_line}")),
        ],
        ..Default::default()
    }
}

/// CAS claim. On success the unclaimed reminder is cancelled.
pub async fn claim_ticket(ctx: &Ctx, channel_id: i64, moderator: &UserRef) -> Result<ClaimOutcome> {
    let claimed = ctx
        .db
        .claim_ticket(channel_id, moderator.id, &moderator.name)
        .await?;
    if claimed {
        ctx.db
            .cancel_timer(channel_id, TimerAction::Unclaimed)
            .await?;
        if let Some(ticket) = ctx.db.get_open_ticket_by_channel(channel_id).await? {
            ctx.cache.insert(ticket);
        }
        tracing::info!(channel_id, mod_id = moderator.id, "Ticket claimed");
        return Ok(ClaimOutcome::Claimed);
    }

    match ctx.db.get_open_ticket_by_channel(channel_id).await? {
        Some(_) => Ok(ClaimOutcome::AlreadyClaimed),
        None => Ok(ClaimOutcome::NotATicket),
    }
}

pub async fn transfer_ticket(ctx: &Ctx, channel_id: i64, new_mod: &UserRef) -> Result<bool> {
    let transferred = ctx
        .db
        .transfer_ticket(channel_id, new_mod.id, &new_mod.name)
        .await?;
    if transferred {
        if let Some(ticket) = ctx.db.get_open_ticket_by_channel(channel_id).await? {
            ctx.cache.insert(ticket);
        }
        tracing::info!(channel_id, mod_id = new_mod.id, "Ticket transferred");
    }
    Ok(transferred)
}

/// Full closure flow: notice, store close, transcript to the log
/// channel, owner DM, channel deletion, timer cleanup. Every outbound
/// call is best effort; the store mutation and timer cleanup are not.
pub async fn close_ticket_now(
    ctx: &Ctx,
    channel_id: i64,
    notice: Option<OutgoingEmbed>,
) -> Result<()> {
    let ticket = ctx.db.get_ticket_by_channel(channel_id).await?;
    let channel = ctx.gateway.resolve_channel(channel_id).await.unwrap_or(None);

    if channel.is_some() {
        if let Some(embed) = notice {
            if let Err(e) = ctx
                .gateway
                .send_message(channel_id, OutgoingMessage::embed(embed))
                .await
            {
                tracing::warn!(channel_id, error = %e, "Failed to post closing notice");
            }
        }
    }

    let closed = ctx
        .db
        .close_ticket(channel_id, Utc::now().naive_utc())
        .await?;
    if !closed {
        tracing::debug!(channel_id, "Close requested for a ticket that is not open");
    }

    if channel.is_some() {
        if let Err(e) = transcripts::log_ticket(ctx, channel_id, None).await {
            tracing::error!(channel_id, error = %e, "Failed to archive transcript on close");
        }
    }

    let owner_id = ticket.as_ref().map(|t| t.user_id).or_else(|| {
        channel
            .as_ref()
            .and_then(|c| c.topic.as_deref())
            .and_then(user_id_from_topic)
    });
    if let Some(owner_id) = owner_id {
        notify_owner_closed(ctx, channel_id, owner_id, channel.is_some()).await;
    }

    if channel.is_some() {
        if let Err(e) = ctx.gateway.delete_channel(channel_id).await {
            tracing::error!(channel_id, error = %e, "Failed to delete ticket channel");
        }
    }

    ctx.db.cancel_all_timers(channel_id).await?;
    scheduler::abort_in_process_close(&ctx.delayed, channel_id);
    ctx.cache.invalidate_channel(channel_id);

    tracing::info!(channel_id, "Ticket closed");
    Ok(())
}

async fn notify_owner_closed(ctx: &Ctx, channel_id: i64, owner_id: i64, channel_alive: bool) {
    let embed = OutgoingEmbed {
        title: Some("Your Ticket Has Been Closed".to_string()),
        description: Some(
            "Hello! Your ticket has been closed by our staff.\n\n\
             If you need further assistance, feel free to open a new ticket."
                .to_string(),
        ),
        color: Some(colors::BLUE),
        ..Default::default()
    };
    if let Err(e) = ctx
        .gateway
        .send_dm(owner_id, OutgoingMessage::embed(embed))
        .await
    {
        tracing::warn!(owner_id, error = %e, "Could not DM closure notice");
        if channel_alive {
            let embed = OutgoingEmbed {
                description: Some(format!(
                    "❌ Could not DM <@{owner_id}>. They may have DMs disabled."
                )),
                color: Some(colors::RED),
                ..Default::default()
            };
            let _ = ctx
                .gateway
                .send_message(channel_id, OutgoingMessage::embed(embed))
                .await;
        }
    }
}

/// A ticket channel was deleted outside the bot's control: close the row
/// it backed, recovering the owner from the topic when possible.
pub async fn handle_channel_deleted(ctx: &Ctx, channel_id: i64, topic: Option<&str>) -> Result<()> {
    let closed = ctx
        .db
        .close_ticket(channel_id, Utc::now().naive_utc())
        .await?;
    if !closed {
        if let Some(user_id) = topic.and_then(user_id_from_topic) {
            ctx.db
                .close_tickets_for_user(user_id, Utc::now().naive_utc())
                .await?;
        }
    }
    ctx.db.cancel_all_timers(channel_id).await?;
    scheduler::abort_in_process_close(&ctx.delayed, channel_id);
    ctx.cache.invalidate_channel(channel_id);
    tracing::info!(channel_id, "Ticket row closed after external channel deletion");
    Ok(())
}

/// Staff-initiated contact ticket. Same duplicate-open rule as the DM
/// path; no unclaimed reminder, since a staff member is already on it.
pub async fn open_contact_ticket(
    ctx: &Ctx,
    staff: &UserRef,
    target: &UserRef,
    reason: &str,
) -> Result<OpenOutcome> {
    if let Some(channel_id) = ctx.db.get_open_ticket_channel_id(target.id).await? {
        return Ok(OpenOutcome::AlreadyOpen { channel_id });
    }

    let channel_name = ticket_channel_name(&target.name);
    let topic = format!("Contact ticket with {} ({})", target.name, target.id);
    let category_id = ctx.config.discord.contact_category_id;
    let channel_id = ctx
        .gateway
        .create_ticket_channel(&channel_name, category_id, &topic)
        .await?;

    ctx.db
        .create_ticket(NewTicket {
            channel_id,
            user_id: target.id,
            member_username: &target.name,
            category_id,
            channel_name: &channel_name,
            ticket_type: "contact",
        })
        .await?;
    if let Some(ticket) = ctx.db.get_open_ticket_by_channel(channel_id).await? {
        ctx.cache.insert(ticket);
    }

    let staff_embed = OutgoingEmbed {
        title: Some("Contact Ticket Opened".to_string()),
        description: Some(format!(
            "A new contact ticket has been opened with <@{}>.\nReason: {reason}",
            target.id
        )),
        color: Some(colors::GREEN),
        author_name: Some(staff.name.clone()),
        ..Default::default()
    };
    if let Err(e) = ctx
        .gateway
        .send_message(
            channel_id,
            OutgoingMessage {
                embed: Some(staff_embed),
                components: vec![UiComponent::ClaimButton],
                ..Default::default()
            },
        )
        .await
    {
        tracing::error!(channel_id, error = %e, "Failed to post contact header");
    }

    let user_embed = OutgoingEmbed {
        title: Some("Staff Contact".to_string()),
        description: Some(format!(
            "Our staff has opened a ticket with you:\n\n{reason}"
        )),
        color: Some(colors::ORANGE),
        ..Default::default()
    };
    if let Err(e) = ctx
        .gateway
        .send_dm(target.id, OutgoingMessage::embed(user_embed))
        .await
    {
        tracing::warn!(user_id = target.id, error = %e, "Could not DM contact notice");
        let embed = OutgoingEmbed {
            title: Some("DM Failed".to_string()),
            description: Some(
                "❌ Could not DM the user (they may have DMs disabled).".to_string(),
            ),
            color: Some(colors::RED),
            ..Default::default()
        };
        let _ = ctx
            .gateway
            .send_message(channel_id, OutgoingMessage::embed(embed))
            .await;
    }

    Ok(OpenOutcome::Opened { channel_id })
}

#[cfg(test)]
#[path = "../../../tests/unit/app_lifecycle.rs"]
mod tests;
