use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use serenity::all::{
    Channel, ChannelId, ChannelType, CreateChannel, EditChannel, EditMessage, GetMessages,
    GuildId, Message, MessageId, User, UserId,
};
use serenity::http::{Http, HttpError};

use crate::adapters::discord::embeds::{to_create_embed, to_create_message};
use crate::core::gateway::{
    AttachmentRef, ChannelMessage, ChannelRef, EmbedRef, Gateway, OutgoingEmbed, OutgoingMessage,
    UserRef,
};

/// Discord REST implementation of the platform gateway. One instance is
/// shared by the services and the event handler.
pub struct SerenityGateway {
    http: Arc<Http>,
    guild_id: GuildId,
    download: reqwest::Client,
}

impl SerenityGateway {
    pub fn new(token: &str, guild_id: i64) -> Self {
        Self {
            http: Arc::new(Http::new(token)),
            guild_id: GuildId::new(guild_id as u64),
            download: reqwest::Client::new(),
        }
    }
}

/// Discord JSON error codes the gateway treats as "target gone" rather
/// than transport failures.
const UNKNOWN_CHANNEL: isize = 10003;
const UNKNOWN_USER: isize = 10013;

fn api_error_code(err: &serenity::Error) -> Option<isize> {
    match err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(resp)) => Some(resp.error.code),
        _ => None,
    }
}

pub fn to_user_ref(user: &User) -> UserRef {
    UserRef {
        id: user.id.get() as i64,
        name: user.name.clone(),
        bot: user.bot,
        created_at: DateTime::from_timestamp(user.id.created_at().unix_timestamp(), 0)
            .map(|dt| dt.naive_utc()),
    }
}

pub fn to_channel_message(msg: &Message) -> ChannelMessage {
    ChannelMessage {
        id: msg.id.get() as i64,
        author: to_user_ref(&msg.author),
        content: msg.content.clone(),
        timestamp: DateTime::from_timestamp(msg.timestamp.unix_timestamp(), 0)
            .map(|dt| dt.naive_utc())
            .unwrap_or_default(),
        attachments: msg
            .attachments
            .iter()
            .map(|a| AttachmentRef {
                id: a.id.get() as i64,
                filename: a.filename.clone(),
                url: a.url.clone(),
                content_type: a.content_type.clone(),
            })
            .collect(),
        embeds: msg
            .embeds
            .iter()
            .map(|e| EmbedRef {
                title: e.title.clone(),
                description: e.description.clone(),
                footer_text: e.footer.as_ref().map(|f| f.text.clone()),
                image_url: e.image.as_ref().map(|i| i.url.clone()),
                fields: e
                    .fields
                    .iter()
                    .map(|f| (f.name.clone(), f.value.clone()))
                    .collect(),
            })
            .collect(),
    }
}

#[async_trait]
impl Gateway for SerenityGateway {
    async fn send_message(&self, channel_id: i64, message: OutgoingMessage) -> Result<i64> {
        let sent = ChannelId::new(channel_id as u64)
            .send_message(&self.http, to_create_message(message))
            .await?;
        Ok(sent.id.get() as i64)
    }

    async fn send_dm(&self, user_id: i64, message: OutgoingMessage) -> Result<i64> {
        let dm = UserId::new(user_id as u64)
            .create_dm_channel(&self.http)
            .await?;
        let sent = dm
            .id
            .send_message(&self.http, to_create_message(message))
            .await?;
        Ok(sent.id.get() as i64)
    }

    async fn create_ticket_channel(
        &self,
        name: &str,
        category_id: i64,
        topic: &str,
    ) -> Result<i64> {
        let channel = self
            .guild_id
            .create_channel(
                &self.http,
                CreateChannel::new(name)
                    .kind(ChannelType::Text)
                    .category(ChannelId::new(category_id as u64))
                    .topic(topic),
            )
            .await?;
        Ok(channel.id.get() as i64)
    }

    async fn delete_channel(&self, channel_id: i64) -> Result<()> {
        ChannelId::new(channel_id as u64).delete(&self.http).await?;
        Ok(())
    }

    async fn resolve_channel(&self, channel_id: i64) -> Result<Option<ChannelRef>> {
        match ChannelId::new(channel_id as u64).to_channel(&self.http).await {
            Ok(Channel::Guild(channel)) => Ok(Some(ChannelRef {
                id: channel.id.get() as i64,
                name: channel.name.clone(),
                topic: channel.topic.clone(),
                category_id: channel.parent_id.map(|p| p.get() as i64),
            })),
            Ok(_) => Ok(None),
            Err(e) if api_error_code(&e) == Some(UNKNOWN_CHANNEL) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn move_channel(&self, channel_id: i64, category_id: i64) -> Result<()> {
        ChannelId::new(channel_id as u64)
            .edit(
                &self.http,
                EditChannel::new().category(Some(ChannelId::new(category_id as u64))),
            )
            .await?;
        Ok(())
    }

    async fn create_category(&self, name: &str) -> Result<i64> {
        let category = self
            .guild_id
            .create_channel(
                &self.http,
                CreateChannel::new(name).kind(ChannelType::Category),
            )
            .await?;
        Ok(category.id.get() as i64)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<UserRef>> {
        match UserId::new(user_id as u64).to_user(&self.http).await {
            Ok(user) => Ok(Some(to_user_ref(&user))),
            Err(e) if api_error_code(&e) == Some(UNKNOWN_USER) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn member_role_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        match self
            .guild_id
            .member(&self.http, UserId::new(user_id as u64))
            .await
        {
            Ok(member) => Ok(member.roles.iter().map(|r| r.get() as i64).collect()),
            // Not in the guild (anymore): no roles rather than an error.
            Err(e) if api_error_code(&e).is_some() => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn channel_history(&self, channel_id: i64) -> Result<Vec<ChannelMessage>> {
        let channel = ChannelId::new(channel_id as u64);
        let mut collected: Vec<Message> = Vec::new();
        let mut cursor: Option<MessageId> = None;

        loop {
            let mut filter = GetMessages::new().limit(100);
            if let Some(before) = cursor {
                filter = filter.before(before);
            }
            let batch = channel.messages(&self.http, filter).await?;
            if batch.is_empty() {
                break;
            }
            // Batches arrive newest first; the last entry is the cursor.
            cursor = batch.last().map(|m| m.id);
            collected.extend(batch);
        }

        collected.sort_by_key(|m| m.id);
        Ok(collected.iter().map(to_channel_message).collect())
    }

    async fn get_message(&self, channel_id: i64, message_id: i64) -> Result<ChannelMessage> {
        let msg = ChannelId::new(channel_id as u64)
            .message(&self.http, MessageId::new(message_id as u64))
            .await?;
        Ok(to_channel_message(&msg))
    }

    async fn edit_message(
        &self,
        channel_id: i64,
        message_id: i64,
        embed: OutgoingEmbed,
    ) -> Result<()> {
        ChannelId::new(channel_id as u64)
            .edit_message(
                &self.http,
                MessageId::new(message_id as u64),
                EditMessage::new().embed(to_create_embed(&embed)),
            )
            .await?;
        Ok(())
    }

    async fn delete_message(&self, channel_id: i64, message_id: i64) -> Result<()> {
        ChannelId::new(channel_id as u64)
            .delete_message(&self.http, MessageId::new(message_id as u64))
            .await?;
        Ok(())
    }

    async fn dm_channel_id(&self, user_id: i64) -> Result<i64> {
        let dm = UserId::new(user_id as u64)
            .create_dm_channel(&self.http)
            .await?;
        Ok(dm.id.get() as i64)
    }

    async fn download_attachment(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .download
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}
