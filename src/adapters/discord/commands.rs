use anyhow::Result;
use chrono::Utc;
use serenity::all::Message;

use crate::adapters::discord::embeds::{notice_embed, titled_embed};
use crate::app::services::{
    colors, dx, lifecycle, replies, scheduler, transcripts, watchers, Ctx,
};
use crate::core::duration::parse_duration_secs;
use crate::core::gateway::{ChannelRef, OutgoingEmbed, OutgoingMessage, UserRef};
use crate::core::types::{PermTier, TimerAction};

pub const COMMAND_PREFIX: char = '!';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move { category_key: String },
    NewCategory { name: String },
    Close { duration: Option<String> },
    CancelClose,
    Log,
    Suspend,
    NotifyMe,
    Transfer { target: String },
    Contact { user_id: i64, reason: String },
    Transcript { user_id: Option<i64> },
    DxAdd { key: String, text: String },
    DxRemove { key: String },
    DxList,
    Msg { key: String },
    Reply { text: String },
    EditReply { text: String },
    DeleteReply,
    /// Any other `!word`: candidate premade-response key.
    Bare { key: String },
}

pub fn parse_command(content: &str) -> Option<Command> {
    let rest = content.strip_prefix(COMMAND_PREFIX)?;
    let mut words = rest.split_whitespace();
    let name = words.next()?.to_ascii_lowercase();
    let tail = |n: usize| -> String {
        rest.split_whitespace().skip(n).collect::<Vec<_>>().join(" ")
    };

    let command = match name.as_str() {
        "move" => Command::Move {
            category_key: words.next()?.to_string(),
        },
        "newcc" => {
            let name = tail(1);
            if name.is_empty() {
                return None;
            }
            Command::NewCategory { name }
        }
        "close" => Command::Close {
            duration: words.next().map(str::to_string),
        },
        "cancelclose" => Command::CancelClose,
        "log" => Command::Log,
        "suspend" => Command::Suspend,
        "notifyme" => Command::NotifyMe,
        "transfer" => Command::Transfer {
            target: words.next()?.to_string(),
        },
        "contact" => {
            let user_id = parse_user_id(words.next()?)?;
            let reason = tail(2);
            Command::Contact {
                user_id,
                reason: if reason.is_empty() {
                    "No reason provided".to_string()
                } else {
                    reason
                },
            }
        }
        "transcript" => Command::Transcript {
            user_id: match words.next() {
                Some(arg) => Some(parse_user_id(arg)?),
                None => None,
            },
        },
        "dxadd" => {
            let key = words.next()?.to_string();
            let text = tail(2);
            if text.is_empty() {
                return None;
            }
            Command::DxAdd { key, text }
        }
        "dxremove" => Command::DxRemove {
            key: words.next()?.to_string(),
        },
        "dx" => Command::DxList,
        "msg" => Command::Msg {
            key: words.next()?.to_string(),
        },
        "r" => Command::Reply { text: tail(1) },
        "re" => Command::EditReply { text: tail(1) },
        "delete" => Command::DeleteReply,
        other if !other.is_empty() => Command::Bare {
            key: other.to_string(),
        },
        _ => return None,
    };
    Some(command)
}

/// Accepts a raw snowflake or a `<@123>` / `<@!123>` mention.
pub fn parse_user_id(arg: &str) -> Option<i64> {
    let trimmed = arg
        .trim_start_matches("<@!")
        .trim_start_matches("<@")
        .trim_end_matches('>');
    trimmed.parse().ok()
}

fn required_tier(command: &Command) -> PermTier {
    match command {
        Command::NewCategory { .. }
        | Command::Contact { .. }
        | Command::DxAdd { .. }
        | Command::DxRemove { .. } => PermTier::Admin,
        Command::Move { .. }
        | Command::Close { .. }
        | Command::CancelClose
        | Command::Suspend
        | Command::Transfer { .. }
        | Command::DeleteReply => PermTier::Staff,
        Command::Log
        | Command::NotifyMe
        | Command::Transcript { .. }
        | Command::DxList
        | Command::Msg { .. }
        | Command::Reply { .. }
        | Command::EditReply { .. }
        | Command::Bare { .. } => PermTier::Junior,
    }
}

/// Commands that only make sense inside a ticket channel.
fn requires_ticket_channel(command: &Command) -> bool {
    matches!(
        command,
        Command::Move { .. }
            | Command::Close { .. }
            | Command::CancelClose
            | Command::Log
            | Command::Suspend
            | Command::NotifyMe
            | Command::Transfer { .. }
            | Command::Msg { .. }
            | Command::Reply { .. }
            | Command::EditReply { .. }
            | Command::DeleteReply
    )
}

fn member_tier(ctx: &Ctx, msg: &Message) -> PermTier {
    let user_id = msg.author.id.get() as i64;
    if ctx.config.permissions.admin_user_ids.contains(&user_id) {
        return PermTier::Admin;
    }
    let roles: Vec<i64> = msg
        .member
        .as_deref()
        .map(|m| m.roles.iter().map(|r| r.get() as i64).collect())
        .unwrap_or_default();
    let perms = &ctx.config.permissions;
    if roles.iter().any(|r| perms.staff_role_ids.contains(r)) {
        return PermTier::Staff;
    }
    if roles.iter().any(|r| perms.junior_role_ids.contains(r)) {
        return PermTier::Junior;
    }
    PermTier::None
}

async fn send_notice(ctx: &Ctx, channel_id: i64, embed: OutgoingEmbed) {
    if let Err(e) = ctx
        .gateway
        .send_message(channel_id, OutgoingMessage::embed(embed))
        .await
    {
        tracing::error!(channel_id, error = %e, "Failed to send command feedback");
    }
}

/// Entry point for guild messages starting with the command prefix. A
/// failing command is reported and logged, never propagated.
pub async fn handle_command(ctx: &Ctx, msg: &Message, author: &UserRef) {
    let Some(command) = parse_command(&msg.content) else {
        return;
    };
    let channel_id = msg.channel_id.get() as i64;

    // Bare words are only commands if a premade response exists for them;
    // anything else in chat must stay untouched.
    if let Command::Bare { key } = &command {
        match ctx.db.get_dx_response(key).await {
            Ok(Some(_)) => {}
            Ok(None) => return,
            Err(e) => {
                tracing::error!(key, error = %e, "Premade response lookup failed");
                return;
            }
        }
    }

    if member_tier(ctx, msg) < required_tier(&command) {
        send_notice(
            ctx,
            channel_id,
            notice_embed("🚫 You are not allowed to use this command.", colors::RED),
        )
        .await;
        return;
    }

    let channel = match ctx.gateway.resolve_channel(channel_id).await {
        Ok(channel) => channel,
        Err(e) => {
            tracing::error!(channel_id, error = %e, "Failed to resolve command channel");
            None
        }
    };
    let in_ticket_channel = channel
        .as_ref()
        .is_some_and(|c| ctx.config.is_ticket_category(c.category_id));
    if requires_ticket_channel(&command) && !in_ticket_channel {
        send_notice(
            ctx,
            channel_id,
            notice_embed(
                "This command can only be used in ticket channels.",
                colors::RED,
            ),
        )
        .await;
        return;
    }

    if let Err(e) = run_command(ctx, msg, author, channel.as_ref(), in_ticket_channel, command).await
    {
        tracing::error!(
            channel_id,
            user_id = author.id,
            error = %e,
            "Command failed"
        );
        send_notice(
            ctx,
            channel_id,
            notice_embed("Something went wrong while running that command.", colors::RED),
        )
        .await;
    }
}

async fn run_command(
    ctx: &Ctx,
    msg: &Message,
    author: &UserRef,
    channel: Option<&ChannelRef>,
    in_ticket_channel: bool,
    command: Command,
) -> Result<()> {
    let channel_id = msg.channel_id.get() as i64;
    match command {
        Command::Move { category_key } => move_ticket(ctx, channel_id, &category_key).await,
        Command::NewCategory { name } => new_category(ctx, channel_id, &name).await,
        Command::Close { duration } => close_command(ctx, channel_id, channel, duration).await,
        Command::CancelClose => cancel_close(ctx, channel_id).await,
        Command::Log => log_command(ctx, channel_id, author).await,
        Command::Suspend => suspend_command(ctx, channel_id, channel, author).await,
        Command::NotifyMe => notify_me(ctx, channel_id, author).await,
        Command::Transfer { target } => transfer_command(ctx, channel_id, &target).await,
        Command::Contact { user_id, reason } => {
            contact_command(ctx, channel_id, author, user_id, &reason).await
        }
        Command::Transcript { user_id } => {
            transcript_command(ctx, channel_id, channel, in_ticket_channel, user_id).await
        }
        Command::DxAdd { key, text } => dx_add(ctx, channel_id, &key, &text).await,
        Command::DxRemove { key } => dx_remove(ctx, channel_id, &key).await,
        Command::DxList => dx_list(ctx, channel_id).await,
        Command::Msg { key } => msg_preview(ctx, channel_id, author, &key).await,
        Command::Reply { text } => reply_command(ctx, msg, author, &text).await,
        Command::EditReply { text } => edit_reply_command(ctx, msg, author, &text).await,
        Command::DeleteReply => delete_reply_command(ctx, msg).await,
        Command::Bare { key } => macro_command(ctx, channel_id, author, &key, in_ticket_channel).await,
    }
}

async fn move_ticket(ctx: &Ctx, channel_id: i64, category_key: &str) -> Result<()> {
    let Some(category) = ctx.config.category_by_key(category_key) else {
        send_notice(
            ctx,
            channel_id,
            notice_embed(
                format!("Category '{category_key}' does not exist."),
                colors::RED,
            ),
        )
        .await;
        return Ok(());
    };
    ctx.gateway
        .move_channel(channel_id, category.category_id)
        .await?;
    send_notice(
        ctx,
        channel_id,
        notice_embed(
            format!("Moved ticket to '{category_key}' category."),
            colors::GREEN,
        ),
    )
    .await;
    Ok(())
}

async fn new_category(ctx: &Ctx, channel_id: i64, name: &str) -> Result<()> {
    let category_id = ctx.gateway.create_category(name).await?;
    send_notice(
        ctx,
        channel_id,
        notice_embed(
            format!("Category '{name}' created with ID: {category_id}"),
            colors::GREEN,
        ),
    )
    .await;
    Ok(())
}

/// Resolve the ticket owner: the open row first, the channel topic as a
/// fallback for rows that predate the bot.
async fn ticket_owner_id(ctx: &Ctx, channel_id: i64, channel: Option<&ChannelRef>) -> Option<i64> {
    if let Ok(Some(ticket)) = ctx.db.get_open_ticket_by_channel(channel_id).await {
        return Some(ticket.user_id);
    }
    channel
        .and_then(|c| c.topic.as_deref())
        .and_then(lifecycle::user_id_from_topic)
}

async fn close_command(
    ctx: &Ctx,
    channel_id: i64,
    channel: Option<&ChannelRef>,
    duration: Option<String>,
) -> Result<()> {
    let delay_secs = match duration {
        None => 0,
        Some(raw) => match parse_duration_secs(&raw) {
            Ok(secs) => secs,
            Err(_) => {
                send_notice(
                    ctx,
                    channel_id,
                    notice_embed(
                        "Invalid time format. Try `1:30`, `90m`, `1h30m`, or `15` (minutes).",
                        colors::RED,
                    ),
                )
                .await;
                return Ok(());
            }
        },
    };

    let Some(user_id) = ticket_owner_id(ctx, channel_id, channel).await else {
        send_notice(
            ctx,
            channel_id,
            notice_embed(
                "Could not determine ticket owner (missing user ID).",
                colors::RED,
            ),
        )
        .await;
        return Ok(());
    };

    if delay_secs == 0 {
        send_notice(
            ctx,
            channel_id,
            notice_embed("⏹️ Closing ticket immediately...", colors::ORANGE),
        )
        .await;
        lifecycle::close_ticket_now(ctx, channel_id, None).await?;
        return Ok(());
    }

    let outcome = scheduler::schedule_close(ctx, channel_id, user_id, delay_secs).await?;
    let description = match outcome {
        scheduler::ScheduleOutcome::Persisted { execute_at } => format!(
            "⏲️ Ticket will close at {} UTC unless canceled with `!cancelclose`.",
            execute_at.format("%Y-%m-%d %H:%M:%S")
        ),
        scheduler::ScheduleOutcome::InProcess { .. } => format!(
            "⏲️ Ticket will close in {}h {}m unless canceled with `!cancelclose`.",
            delay_secs / 3600,
            (delay_secs % 3600) / 60
        ),
    };
    send_notice(ctx, channel_id, notice_embed(description, colors::ORANGE)).await;
    Ok(())
}

async fn cancel_close(ctx: &Ctx, channel_id: i64) -> Result<()> {
    let cancelled = scheduler::cancel_scheduled_close(ctx, channel_id).await?;
    let embed = if cancelled {
        notice_embed("❌ Scheduled close canceled.", colors::RED)
    } else {
        notice_embed("No scheduled close found for this channel.", colors::ORANGE)
    };
    send_notice(ctx, channel_id, embed).await;
    Ok(())
}

async fn log_command(ctx: &Ctx, channel_id: i64, author: &UserRef) -> Result<()> {
    match transcripts::log_ticket(ctx, channel_id, Some(author)).await {
        Ok(()) => {
            send_notice(
                ctx,
                channel_id,
                notice_embed("Ticket has been logged with transcript.", colors::GREEN),
            )
            .await;
        }
        Err(e) => {
            tracing::error!(channel_id, error = %e, "Manual transcript log failed");
            send_notice(
                ctx,
                channel_id,
                notice_embed("Failed to log ticket.", colors::RED),
            )
            .await;
        }
    }
    Ok(())
}

async fn suspend_command(
    ctx: &Ctx,
    channel_id: i64,
    channel: Option<&ChannelRef>,
    author: &UserRef,
) -> Result<()> {
    let Some(user_id) = ticket_owner_id(ctx, channel_id, channel).await else {
        send_notice(
            ctx,
            channel_id,
            notice_embed(
                "Could not determine ticket owner (missing user ID in topic).",
                colors::RED,
            ),
        )
        .await;
        return Ok(());
    };

    let hours = ctx.config.tickets.suspend_close_hours;
    let execute_at = Utc::now().naive_utc() + chrono::Duration::hours(hours as i64);
    // Supersede any previous suspend window.
    ctx.db.cancel_timer(channel_id, TimerAction::Suspend).await?;
    ctx.db
        .add_timer(channel_id, user_id, TimerAction::Suspend, execute_at)
        .await?;

    send_notice(
        ctx,
        channel_id,
        notice_embed(
            format!("🚫 Ticket suspended. Will close in {hours} hours if user does not reply."),
            colors::ORANGE,
        ),
    )
    .await;

    if let Err(e) = transcripts::log_ticket(ctx, channel_id, Some(author)).await {
        tracing::error!(channel_id, error = %e, "Failed to log ticket during suspend");
    }
    Ok(())
}

async fn notify_me(ctx: &Ctx, channel_id: i64, author: &UserRef) -> Result<()> {
    let embed = match watchers::notify_me(&ctx.db, channel_id, author.id).await? {
        watchers::WatchOutcome::Subscribed => notice_embed(
            "✅ You'll be notified when the user responds.",
            colors::GREEN,
        ),
        watchers::WatchOutcome::AlreadySubscribed => notice_embed(
            "You already have subscribed to this channel.",
            colors::ORANGE,
        ),
    };
    send_notice(ctx, channel_id, embed).await;
    Ok(())
}

async fn transfer_command(ctx: &Ctx, channel_id: i64, target: &str) -> Result<()> {
    let Some(target_id) = parse_user_id(target) else {
        send_notice(
            ctx,
            channel_id,
            notice_embed("Could not resolve that staff member.", colors::RED),
        )
        .await;
        return Ok(());
    };
    let Some(new_mod) = ctx.gateway.fetch_user(target_id).await? else {
        send_notice(
            ctx,
            channel_id,
            notice_embed("Could not resolve that staff member.", colors::RED),
        )
        .await;
        return Ok(());
    };

    if lifecycle::transfer_ticket(ctx, channel_id, &new_mod).await? {
        send_notice(
            ctx,
            channel_id,
            notice_embed(
                format!(
                    "✅ Ticket has been transferred to <@{}>.\nThey are now responsible for this ticket.",
                    new_mod.id
                ),
                colors::GREEN,
            ),
        )
        .await;
    } else {
        send_notice(
            ctx,
            channel_id,
            notice_embed("No open ticket in this channel.", colors::RED),
        )
        .await;
    }
    Ok(())
}

async fn contact_command(
    ctx: &Ctx,
    channel_id: i64,
    author: &UserRef,
    user_id: i64,
    reason: &str,
) -> Result<()> {
    let Some(target) = ctx.gateway.fetch_user(user_id).await? else {
        send_notice(
            ctx,
            channel_id,
            titled_embed(
                "Contact Failed",
                format!("User with ID `{user_id}` could not be found."),
                colors::RED,
            ),
        )
        .await;
        return Ok(());
    };

    match lifecycle::open_contact_ticket(ctx, author, &target, reason).await? {
        lifecycle::OpenOutcome::Opened { channel_id: ticket_channel } => {
            send_notice(
                ctx,
                channel_id,
                titled_embed(
                    "Success",
                    format!("Ticket opened with <@{user_id}> in <#{ticket_channel}>."),
                    colors::GREEN,
                ),
            )
            .await;
        }
        lifecycle::OpenOutcome::AlreadyOpen { channel_id: existing } => {
            send_notice(
                ctx,
                channel_id,
                titled_embed(
                    "Contact Failed",
                    format!("<@{user_id}> already has an open ticket in <#{existing}>."),
                    colors::ORANGE,
                ),
            )
            .await;
        }
        lifecycle::OpenOutcome::UnknownCategory => {}
    }
    Ok(())
}

async fn transcript_command(
    ctx: &Ctx,
    channel_id: i64,
    channel: Option<&ChannelRef>,
    in_ticket_channel: bool,
    user_id: Option<i64>,
) -> Result<()> {
    if let Some(user_id) = user_id {
        return send_saved_transcripts(ctx, channel_id, user_id).await;
    }

    if !in_ticket_channel {
        send_notice(
            ctx,
            channel_id,
            notice_embed(
                "This category is not configured for transcript saving.",
                colors::RED,
            ),
        )
        .await;
        return Ok(());
    }
    let Some(owner_id) = ticket_owner_id(ctx, channel_id, channel).await else {
        send_notice(
            ctx,
            channel_id,
            notice_embed(
                "User could not be resolved from the channel topic.",
                colors::RED,
            ),
        )
        .await;
        return Ok(());
    };

    let history = ctx.gateway.channel_history(channel_id).await?;
    let channel_name = channel.map_or_else(|| channel_id.to_string(), |c| c.name.clone());
    let category_id = channel.and_then(|c| c.category_id);
    transcripts::save_user_transcript(ctx, owner_id, &channel_name, category_id, &history).await?;

    let url = transcripts::transcript_url(&ctx.config, owner_id);
    send_notice(
        ctx,
        channel_id,
        notice_embed(
            format!("Transcript has been saved.\n[View Transcript]({url})"),
            colors::BLUE,
        ),
    )
    .await;
    Ok(())
}

async fn send_saved_transcripts(ctx: &Ctx, channel_id: i64, user_id: i64) -> Result<()> {
    let entries = transcripts::load_user_transcripts(&ctx.config, user_id)?;
    if entries.is_empty() {
        send_notice(
            ctx,
            channel_id,
            notice_embed(
                format!("No transcripts found for user ID `{user_id}`."),
                colors::ORANGE,
            ),
        )
        .await;
        return Ok(());
    }

    let url = transcripts::transcript_url(&ctx.config, user_id);
    for (i, entry) in entries.iter().enumerate() {
        let content: String = entry
            .messages
            .iter()
            .map(|m| format!("[{}] {} ({}): {}\n", m.timestamp, m.role, m.author, m.content))
            .collect();
        let embed = titled_embed(
            "Transcript Available",
            format!(
                "Transcript from `{}` saved on `{}`.\n[View Transcript]({url})",
                entry.channel, entry.saved_at
            ),
            colors::BLUE,
        );
        ctx.gateway
            .send_message(
                ctx.config.discord.log_channel_id,
                OutgoingMessage {
                    embed: Some(embed),
                    file: Some((format!("ticket_{}.txt", i + 1), content.into_bytes())),
                    ..Default::default()
                },
            )
            .await?;
    }
    Ok(())
}

async fn dx_add(ctx: &Ctx, channel_id: i64, key: &str, text: &str) -> Result<()> {
    let embed = match dx::add_response(&ctx.db, key, text).await? {
        dx::DxAddOutcome::Added => titled_embed(
            "Premade Response Added",
            format!("Key `{key}` added with response:\n{text}"),
            colors::GREEN,
        ),
        dx::DxAddOutcome::KeyExists => titled_embed(
            "Add Failed",
            format!("Response with key `{key}` already exists."),
            colors::RED,
        ),
    };
    send_notice(ctx, channel_id, embed).await;
    Ok(())
}

async fn dx_remove(ctx: &Ctx, channel_id: i64, key: &str) -> Result<()> {
    let embed = if dx::remove_response(&ctx.db, key).await? {
        notice_embed(format!("Premade response `{key}` removed."), colors::GREEN)
    } else {
        notice_embed(
            format!("No premade response found for key `{key}`."),
            colors::RED,
        )
    };
    send_notice(ctx, channel_id, embed).await;
    Ok(())
}

async fn dx_list(ctx: &Ctx, channel_id: i64) -> Result<()> {
    let responses = dx::list_responses(&ctx.db).await?;
    let embed = if responses.is_empty() {
        titled_embed(
            "No Premade Responses",
            "No premade responses found in the database.",
            colors::RED,
        )
    } else {
        let keys: Vec<String> = responses.iter().map(|r| format!("`{}`", r.key)).collect();
        titled_embed(
            "Available Premade Response Keys",
            keys.join("\n"),
            colors::PURPLE,
        )
    };
    send_notice(ctx, channel_id, embed).await;
    Ok(())
}

async fn msg_preview(ctx: &Ctx, channel_id: i64, author: &UserRef, key: &str) -> Result<()> {
    let Some(response) = dx::get_response(&ctx.db, key).await? else {
        send_notice(
            ctx,
            channel_id,
            titled_embed(
                "Preview Failed",
                format!("No premade response found for key `{key}`."),
                colors::RED,
            ),
        )
        .await;
        return Ok(());
    };

    let embed = OutgoingEmbed {
        title: Some(format!("Preview of `{key}`")),
        description: Some(response),
        color: Some(colors::ORANGE),
        author_name: Some(author.name.clone()),
        footer: Some("(This is only a preview, not sent to the user.)".to_string()),
        ..Default::default()
    };
    send_notice(ctx, channel_id, embed).await;
    Ok(())
}

fn first_image_url(msg: &Message) -> Option<String> {
    msg.attachments
        .iter()
        .find(|a| {
            a.content_type
                .as_deref()
                .is_some_and(|ct| ct.starts_with("image/"))
        })
        .map(|a| a.url.clone())
}

async fn reply_command(ctx: &Ctx, msg: &Message, author: &UserRef, text: &str) -> Result<()> {
    let channel_id = msg.channel_id.get() as i64;
    match replies::send_staff_reply(ctx, channel_id, author, text, first_image_url(msg)).await? {
        replies::ReplyOutcome::Sent => {
            // The raw `!r` invocation is noise once the embed is posted.
            if let Err(e) = ctx
                .gateway
                .delete_message(channel_id, msg.id.get() as i64)
                .await
            {
                tracing::warn!(channel_id, error = %e, "Failed to delete reply invocation");
            }
        }
        replies::ReplyOutcome::NoTicketUser => {
            send_notice(
                ctx,
                channel_id,
                notice_embed(
                    "Unable to find the user from this ticket channel.",
                    colors::RED,
                ),
            )
            .await;
        }
    }
    Ok(())
}

async fn edit_reply_command(ctx: &Ctx, msg: &Message, author: &UserRef, text: &str) -> Result<()> {
    let channel_id = msg.channel_id.get() as i64;
    let Some(referenced) = msg.referenced_message.as_deref() else {
        send_notice(
            ctx,
            channel_id,
            titled_embed(
                "Error",
                "You must reply to the old bot message containing the CCACMsgCode.",
                colors::RED,
            ),
        )
        .await;
        return Ok(());
    };

    let outcome = replies::edit_reply(
        ctx,
        channel_id,
        referenced.id.get() as i64,
        author,
        text,
        first_image_url(msg),
    )
    .await?;
    match outcome {
        replies::EditOutcome::Edited => {
            if let Err(e) = ctx
                .gateway
                .delete_message(channel_id, msg.id.get() as i64)
                .await
            {
                tracing::warn!(channel_id, error = %e, "Failed to delete edit invocation");
            }
        }
        replies::EditOutcome::NoReplyCode => {
            send_notice(
                ctx,
                channel_id,
                titled_embed(
                    "Edit Failed",
                    "The replied-to message has no CCACMsgCode footer.",
                    colors::RED,
                ),
            )
            .await;
        }
        replies::EditOutcome::NoTicketUser => {
            send_notice(
                ctx,
                channel_id,
                titled_embed(
                    "Edit Failed",
                    "Unable to find the user from this ticket channel.",
                    colors::RED,
                ),
            )
            .await;
        }
    }
    Ok(())
}

async fn delete_reply_command(ctx: &Ctx, msg: &Message) -> Result<()> {
    let channel_id = msg.channel_id.get() as i64;
    let Some(referenced) = msg.referenced_message.as_deref() else {
        send_notice(
            ctx,
            channel_id,
            titled_embed(
                "Error",
                "You must reply to the staff confirmation message containing CCACMsgCode.",
                colors::RED,
            ),
        )
        .await;
        return Ok(());
    };

    match replies::delete_reply(ctx, channel_id, referenced.id.get() as i64).await? {
        replies::DeleteOutcome::Deleted { user_id } => {
            if let Err(e) = ctx
                .gateway
                .delete_message(channel_id, msg.id.get() as i64)
                .await
            {
                tracing::warn!(channel_id, error = %e, "Failed to delete delete invocation");
            }
            send_notice(
                ctx,
                channel_id,
                titled_embed(
                    "Success",
                    format!("Deleted message sent to <@{user_id}>."),
                    colors::GREEN,
                ),
            )
            .await;
        }
        replies::DeleteOutcome::NoReplyCode => {
            send_notice(
                ctx,
                channel_id,
                titled_embed(
                    "Delete Failed",
                    "The replied-to message has no CCACMsgCode footer.",
                    colors::RED,
                ),
            )
            .await;
        }
        replies::DeleteOutcome::NoTicketUser => {
            send_notice(
                ctx,
                channel_id,
                titled_embed(
                    "Delete Failed",
                    "Unable to find the user from this ticket channel.",
                    colors::RED,
                ),
            )
            .await;
        }
    }
    Ok(())
}

async fn macro_command(
    ctx: &Ctx,
    channel_id: i64,
    author: &UserRef,
    key: &str,
    in_ticket_channel: bool,
) -> Result<()> {
    match replies::send_macro(ctx, channel_id, key, author, in_ticket_channel).await? {
        replies::MacroOutcome::SentToUser | replies::MacroOutcome::Posted => {}
        replies::MacroOutcome::NoSuchKey => {}
        replies::MacroOutcome::NoTicketUser => {
            send_notice(
                ctx,
                channel_id,
                notice_embed(
                    "Unable to find the user from this ticket channel.",
                    colors::RED,
                ),
            )
            .await;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../../tests/unit/discord_commands.rs"]
mod tests;
