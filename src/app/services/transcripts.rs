use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::app::services::{colors, Ctx};
use crate::bootstrap::config::Config;
use crate::core::gateway::{ChannelMessage, OutgoingEmbed, OutgoingMessage, UserRef};

const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Render the full channel history into a flat text transcript on disk.
/// Image attachments are downloaded next to it; a failed download
/// degrades to the URL marker and never aborts the transcript.
pub async fn generate_transcript(ctx: &Ctx, channel_id: i64) -> Result<(PathBuf, String)> {
    let history = ctx.gateway.channel_history(channel_id).await?;

    tokio::fs::create_dir_all(&ctx.config.transcripts.transcript_dir).await?;
    tokio::fs::create_dir_all(&ctx.config.transcripts.image_dir).await?;

    let mut transcript = String::new();
    for msg in &history {
        transcript.push_str(&format!(
            "[{}] {}: {}\n",
            msg.timestamp.format(TIMESTAMP_FMT),
            msg.author.name,
            msg.content
        ));
        for attachment in &msg.attachments {
            if attachment.is_image() {
                let image_path = Path::new(&ctx.config.transcripts.image_dir).join(format!(
                    "{}_{}_{}",
                    channel_id, attachment.id, attachment.filename
                ));
                match save_attachment(ctx, &attachment.url, &image_path).await {
                    Ok(()) => {
                        transcript
                            .push_str(&format!("[Image saved: {}]\n", image_path.display()));
                    }
                    Err(e) => {
                        tracing::warn!(
                            channel_id,
                            attachment_id = attachment.id,
                            error = %e,
                            "Image download failed; keeping URL marker"
                        );
                        transcript.push_str(&format!("[Attachment: {}]\n", attachment.url));
                    }
                }
            } else {
                transcript.push_str(&format!("[Attachment: {}]\n", attachment.url));
            }
        }
        transcript.push('\n');
    }

    let transcript_path =
        Path::new(&ctx.config.transcripts.transcript_dir).join(format!("{channel_id}.txt"));
    tokio::fs::write(&transcript_path, &transcript).await?;
    Ok((transcript_path, transcript))
}

async fn save_attachment(ctx: &Ctx, url: &str, path: &Path) -> Result<()> {
    let bytes = ctx.gateway.download_attachment(url).await?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

/// Generate a transcript and post it to the configured log channel.
pub async fn log_ticket(ctx: &Ctx, channel_id: i64, author: Option<&UserRef>) -> Result<()> {
    let (_, transcript) = generate_transcript(ctx, channel_id).await?;

    let channel_name = match ctx.gateway.resolve_channel(channel_id).await {
        Ok(Some(channel)) => channel.name,
        _ => channel_id.to_string(),
    };
    let by = author.map_or(String::new(), |a| format!(" by <@{}>", a.id));
    let embed = OutgoingEmbed {
        title: Some("Transcript generated".to_string()),
        description: Some(format!("Ticket logged: `{channel_name}`{by}")),
        color: Some(colors::GREEN),
        ..Default::default()
    };
    ctx.gateway
        .send_message(
            ctx.config.discord.log_channel_id,
            OutgoingMessage {
                embed: Some(embed),
                file: Some(("transcript.txt".to_string(), transcript.into_bytes())),
                ..Default::default()
            },
        )
        .await?;
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptMessage {
    pub timestamp: String,
    pub author: String,
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    pub channel: String,
    pub category_id: Option<i64>,
    pub saved_at: String,
    pub messages: Vec<TranscriptMessage>,
}

/// Append a structured transcript entry to the per-user JSON log. Only
/// messages from the ticket owner and staff members make it in; bot
/// messages and bystanders are filtered out.
pub async fn save_user_transcript(
    ctx: &Ctx,
    user_id: i64,
    channel_name: &str,
    category_id: Option<i64>,
    history: &[ChannelMessage],
) -> Result<usize> {
    let mut staff_memo: HashMap<i64, bool> = HashMap::new();
    let mut messages = Vec::new();

    for msg in history {
        if msg.author.bot {
            continue;
        }
        let is_user = msg.author.id == user_id;
        let is_staff = if is_user {
            false
        } else {
            is_staff_author(ctx, &mut staff_memo, msg.author.id).await
        };
        if !(is_user || is_staff) {
            continue;
        }

        let mut content = msg.content.clone();
        for embed in &msg.embeds {
            if let Some(title) = &embed.title {
                content.push_str(&format!("\n[Embed Title] {title}"));
            }
            if let Some(description) = &embed.description {
                content.push_str(&format!("\n{description}"));
            }
            for (name, value) in &embed.fields {
                content.push_str(&format!("\n{name}: {value}"));
            }
        }
        for attachment in &msg.attachments {
            if attachment.is_image() {
                content.push_str(&format!("\n[Image] {}", attachment.url));
            } else {
                content.push_str(&format!("\n[File] {}", attachment.url));
            }
        }
        if content.trim().is_empty() {
            content = "[no text]".to_string();
        }

        messages.push(TranscriptMessage {
            timestamp: msg.timestamp.format(TIMESTAMP_FMT).to_string(),
            author: msg.author.name.clone(),
            role: if is_user {
                "USER MESSAGE".to_string()
            } else {
                "STAFF RESPONSE".to_string()
            },
            content,
        });
    }

    let count = messages.len();
    let entry = TranscriptEntry {
        channel: channel_name.to_string(),
        category_id,
        saved_at: Utc::now().naive_utc().format(TIMESTAMP_FMT).to_string(),
        messages,
    };

    tokio::fs::create_dir_all(&ctx.config.transcripts.transcript_dir).await?;
    let path = user_transcript_path(&ctx.config, user_id);
    let mut entries = load_user_transcripts(&ctx.config, user_id).unwrap_or_default();
    entries.push(entry);
    tokio::fs::write(&path, serde_json::to_string_pretty(&entries)?).await?;
    Ok(count)
}

async fn is_staff_author(ctx: &Ctx, memo: &mut HashMap<i64, bool>, author_id: i64) -> bool {
    if let Some(&cached) = memo.get(&author_id) {
        return cached;
    }
    let roles = ctx
        .gateway
        .member_role_ids(author_id)
        .await
        .unwrap_or_default();
    let perms = &ctx.config.permissions;
    let is_staff = roles
        .iter()
        .any(|r| perms.staff_role_ids.contains(r) || perms.junior_role_ids.contains(r));
    memo.insert(author_id, is_staff);
    is_staff
}

pub fn user_transcript_path(config: &Config, user_id: i64) -> PathBuf {
    Path::new(&config.transcripts.transcript_dir).join(format!("{user_id}.json"))
}

pub fn load_user_transcripts(config: &Config, user_id: i64) -> Result<Vec<TranscriptEntry>> {
    let path = user_transcript_path(config, user_id);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Link into the companion transcript file server.
pub fn transcript_url(config: &Config, user_id: i64) -> String {
    format!(
        "{}/index.html?ticket={user_id}",
        config.transcripts.base_url.trim_end_matches('/')
    )
}

#[cfg(test)]
#[path = "../../../tests/unit/app_transcripts.rs"]
mod tests;
