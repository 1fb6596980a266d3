pub mod commands;
pub mod embeds;
pub mod gateway;

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use serenity::all::{
    Client, ComponentInteraction, ComponentInteractionDataKind, Context, CreateActionRow,
    CreateInteractionResponse, CreateInteractionResponseFollowup, CreateInteractionResponseMessage,
    EditMessage, EventHandler, GatewayIntents, GuildChannel, Interaction, Message, Ready,
    TypingStartEvent,
};
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::adapters::discord::embeds::{
    category_select, claim_button, notice_embed, to_create_embed,
};
use crate::adapters::discord::gateway::{to_channel_message, to_user_ref};
use crate::app::services::{colors, lifecycle, scheduler, Ctx};
use crate::core::callbacks::UiAction;
use crate::core::gateway::{CategoryOption, OutgoingMessage};

pub struct DiscordRunArgs {
    pub ctx: Ctx,
    pub cancel_token: CancellationToken,
}

/// Connect the Discord gateway and dispatch events until shutdown.
pub async fn run_discord_bot(args: DiscordRunArgs) -> Result<()> {
    let token = args.ctx.config.discord.token.clone();
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGE_TYPING
        | GatewayIntents::DIRECT_MESSAGE_TYPING;

    let handler = Handler {
        ctx: args.ctx,
        cancel_token: args.cancel_token.clone(),
        poll_started: AtomicBool::new(false),
    };
    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await?;

    let shard_manager = client.shard_manager.clone();
    let cancel = args.cancel_token;
    tokio::spawn(async move {
        cancel.cancelled().await;
        shard_manager.shutdown_all().await;
    });

    client.start().await?;
    Ok(())
}

struct Handler {
    ctx: Ctx,
    cancel_token: CancellationToken,
    poll_started: AtomicBool,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, data_about_bot: Ready) {
        tracing::info!(user = %data_about_bot.user.name, "Discord gateway ready");
        // Ready fires again on reconnects; the poll loop runs once per
        // process lifetime.
        if self
            .poll_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            scheduler::spawn_timer_poll_task(self.ctx.clone(), self.cancel_token.clone());
            tracing::info!("Timer poll loop started");
        }
    }

    async fn message(&self, ctx: Context, new_message: Message) {
        if new_message.author.bot {
            return;
        }

        if new_message.guild_id.is_none() {
            if let Err(e) = new_message.react(&ctx.http, '✅').await {
                tracing::debug!(error = %e, "Failed to react to DM");
            }
            let parsed = to_channel_message(&new_message);
            let dm = lifecycle::IncomingDm {
                user: parsed.author,
                dm_channel_id: new_message.channel_id.get() as i64,
                content: parsed.content,
                attachments: parsed.attachments,
            };
            if let Err(e) = lifecycle::handle_user_dm(&self.ctx, &dm).await {
                tracing::error!(
                    user_id = new_message.author.id.get(),
                    error = %e,
                    "Failed to handle user DM"
                );
            }
            return;
        }

        if new_message.content.starts_with(commands::COMMAND_PREFIX) {
            let author = to_user_ref(&new_message.author);
            commands::handle_command(&self.ctx, &new_message, &author).await;
        }
    }

    async fn typing_start(&self, _ctx: Context, event: TypingStartEvent) {
        if event.guild_id.is_some() {
            return;
        }
        let user_id = event.user_id.get() as i64;
        let channel_id = match self.ctx.cache.open_ticket_for_user(&self.ctx.db, user_id).await {
            Ok(Some(channel_id)) => channel_id,
            _ => return,
        };
        let name = match self.ctx.gateway.fetch_user(user_id).await {
            Ok(Some(user)) if !user.bot => user.name,
            _ => return,
        };

        match self
            .ctx
            .gateway
            .send_message(channel_id, OutgoingMessage::text(format!("**{name} is typing...**")))
            .await
        {
            Ok(notice_id) => {
                let gateway = self.ctx.gateway.clone();
                let ttl = self.ctx.config.operational_parameters.typing_notice_ttl_secs;
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_secs(ttl)).await;
                    if let Err(e) = gateway.delete_message(channel_id, notice_id).await {
                        tracing::debug!(channel_id, error = %e, "Failed to delete typing notice");
                    }
                });
            }
            Err(e) => {
                tracing::debug!(channel_id, error = %e, "Failed to post typing notice");
            }
        }
    }

    async fn channel_delete(
        &self,
        _ctx: Context,
        channel: GuildChannel,
        _messages: Option<Vec<Message>>,
    ) {
        let category_id = channel.parent_id.map(|p| p.get() as i64);
        if !self.ctx.config.is_ticket_category(category_id) {
            return;
        }
        if let Err(e) = lifecycle::handle_channel_deleted(
            &self.ctx,
            channel.id.get() as i64,
            channel.topic.as_deref(),
        )
        .await
        {
            tracing::error!(
                channel_id = channel.id.get(),
                error = %e,
                "Failed to close ticket after external channel deletion"
            );
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Component(component) = interaction else {
            return;
        };

        let selected = match &component.data.kind {
            ComponentInteractionDataKind::StringSelect { values } => {
                values.first().map(String::as_str)
            }
            _ => None,
        };
        let action = match UiAction::from_interaction(&component.data.custom_id, selected) {
            Ok(action) => action,
            Err(e) => {
                tracing::warn!(custom_id = %component.data.custom_id, error = %e, "Unroutable component interaction");
                return;
            }
        };

        let result = match action {
            UiAction::CategorySelected { key } => {
                self.on_category_selected(&ctx, &component, &key).await
            }
            UiAction::TicketClaimed => self.on_ticket_claimed(&ctx, &component).await,
        };
        if let Err(e) = result {
            tracing::error!(
                user_id = component.user.id.get(),
                error = %e,
                "Component interaction failed"
            );
        }
    }
}

impl Handler {
    async fn on_category_selected(
        &self,
        ctx: &Context,
        component: &ComponentInteraction,
        key: &str,
    ) -> Result<()> {
        let user = to_user_ref(&component.user);

        // Answer inside the interaction window before the heavier channel
        // creation work.
        if let Some(existing) = self.ctx.db.get_open_ticket_channel_id(user.id).await? {
            tracing::debug!(user_id = user.id, existing, "Duplicate ticket open rejected");
            respond_ephemeral(
                ctx,
                component,
                "⚠️ You already have an open ticket. You cannot open another one.",
            )
            .await?;
            self.disable_category_select(ctx, component).await;
            return Ok(());
        }

        let details = self
            .ctx
            .config
            .category_by_key(key)
            .map(|c| c.details.clone())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "Opening your ticket...".to_string());
        component
            .create_response(
                &ctx.http,
                CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new().embed(to_create_embed(
                        &crate::adapters::discord::embeds::titled_embed(
                            "Category Info",
                            details,
                            colors::PURPLE,
                        ),
                    )),
                ),
            )
            .await?;
        self.disable_category_select(ctx, component).await;

        match lifecycle::open_ticket(&self.ctx, &user, key).await? {
            lifecycle::OpenOutcome::Opened { channel_id } => {
                tracing::info!(user_id = user.id, channel_id, "Ticket opened via category select");
            }
            lifecycle::OpenOutcome::AlreadyOpen { .. } => {
                followup_embed(
                    ctx,
                    component,
                    notice_embed(
                        "⚠️ You already have an open ticket. You cannot open another one.",
                        colors::ORANGE,
                    ),
                )
                .await?;
            }
            lifecycle::OpenOutcome::UnknownCategory => {
                followup_embed(
                    ctx,
                    component,
                    notice_embed("⚠️ That category is not available.", colors::RED),
                )
                .await?;
            }
        }
        Ok(())
    }

    async fn on_ticket_claimed(
        &self,
        ctx: &Context,
        component: &ComponentInteraction,
    ) -> Result<()> {
        let moderator = to_user_ref(&component.user);
        let channel_id = component.channel_id.get() as i64;

        match lifecycle::claim_ticket(&self.ctx, channel_id, &moderator).await? {
            lifecycle::ClaimOutcome::Claimed => {
                respond_ephemeral(ctx, component, "✅ You have claimed this ticket.").await?;
                followup_embed(
                    ctx,
                    component,
                    notice_embed(
                        format!("Ticket claimed by <@{}>.", moderator.id),
                        colors::ORANGE,
                    ),
                )
                .await?;
                let disabled =
                    vec![CreateActionRow::Buttons(vec![claim_button(true)])];
                if let Err(e) = component
                    .channel_id
                    .edit_message(
                        &ctx.http,
                        component.message.id,
                        EditMessage::new().components(disabled),
                    )
                    .await
                {
                    tracing::warn!(channel_id, error = %e, "Failed to disable claim button");
                }
            }
            lifecycle::ClaimOutcome::AlreadyClaimed => {
                respond_ephemeral(ctx, component, "This ticket has already been claimed.").await?;
            }
            lifecycle::ClaimOutcome::NotATicket => {
                respond_ephemeral(ctx, component, "This channel is not an open ticket.").await?;
            }
        }
        Ok(())
    }

    async fn disable_category_select(&self, ctx: &Context, component: &ComponentInteraction) {
        let options: Vec<CategoryOption> = self
            .ctx
            .config
            .tickets
            .categories
            .iter()
            .map(|c| CategoryOption {
                key: c.key.clone(),
                label: c.label.clone(),
            })
            .collect();
        let disabled = vec![CreateActionRow::SelectMenu(category_select(&options, true))];
        if let Err(e) = component
            .channel_id
            .edit_message(
                &ctx.http,
                component.message.id,
                EditMessage::new().components(disabled),
            )
            .await
        {
            tracing::warn!(error = %e, "Failed to disable category select");
        }
    }
}

async fn respond_ephemeral(
    ctx: &Context,
    component: &ComponentInteraction,
    content: &str,
) -> Result<()> {
    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

async fn followup_embed(
    ctx: &Context,
    component: &ComponentInteraction,
    embed: crate::core::gateway::OutgoingEmbed,
) -> Result<()> {
    component
        .create_followup(
            &ctx.http,
            CreateInteractionResponseFollowup::new().embed(to_create_embed(&embed)),
        )
        .await?;
    Ok(())
}
