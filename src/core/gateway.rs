use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;

/// Outbound embed, platform-neutral. The Discord adapter renders it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutgoingEmbed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<u32>,
    pub author_name: Option<String>,
    pub footer: Option<String>,
    pub image_url: Option<String>,
    pub fields: Vec<(String, String)>,
}

/// Interactive components the core can attach to a message.
#[derive(Debug, Clone, PartialEq)]
pub enum UiComponent {
    CategorySelect { options: Vec<CategoryOption> },
    ClaimButton,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryOption {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embed: Option<OutgoingEmbed>,
    pub components: Vec<UiComponent>,
    /// Inline file upload: (filename, bytes).
    pub file: Option<(String, Vec<u8>)>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        OutgoingMessage {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn embed(embed: OutgoingEmbed) -> Self {
        OutgoingMessage {
            embed: Some(embed),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserRef {
    pub id: i64,
    pub name: String,
    pub bot: bool,
    /// Account creation time, where the platform exposes it.
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRef {
    pub id: i64,
    pub name: String,
    pub topic: Option<String>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentRef {
    pub id: i64,
    pub filename: String,
    pub url: String,
    pub content_type: Option<String>,
}

impl AttachmentRef {
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
    }
}

/// Embed data on a fetched message, reduced to what the bot reads back
/// (transcript flattening, reply-code footers).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbedRef {
    pub title: Option<String>,
    pub description: Option<String>,
    pub footer_text: Option<String>,
    pub image_url: Option<String>,
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMessage {
    pub id: i64,
    pub author: UserRef,
    pub content: String,
    pub timestamp: NaiveDateTime,
    pub attachments: Vec<AttachmentRef>,
    pub embeds: Vec<EmbedRef>,
}

/// The chat-platform surface the core calls into. Everything here is a
/// black-box collaborator: implementations live in `adapters/`, tests use
/// an in-memory fake.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Send into a channel; returns the new message id.
    async fn send_message(&self, channel_id: i64, message: OutgoingMessage) -> Result<i64>;

    /// Direct-message a user; returns the new message id. Errors cover
    /// both transport failures and closed DMs; callers treat any error
    /// as "could not DM".
    async fn send_dm(&self, user_id: i64, message: OutgoingMessage) -> Result<i64>;

    /// Create a text channel under a category; returns the channel id.
    async fn create_ticket_channel(
        &self,
        name: &str,
        category_id: i64,
        topic: &str,
    ) -> Result<i64>;

    async fn delete_channel(&self, channel_id: i64) -> Result<()>;

    /// `Ok(None)` means the channel no longer exists; transport errors
    /// are surfaced as `Err`.
    async fn resolve_channel(&self, channel_id: i64) -> Result<Option<ChannelRef>>;

    async fn move_channel(&self, channel_id: i64, category_id: i64) -> Result<()>;

    /// Create a new channel category; returns its id.
    async fn create_category(&self, name: &str) -> Result<i64>;

    async fn fetch_user(&self, user_id: i64) -> Result<Option<UserRef>>;

    /// Guild role ids held by the user; empty if they left the guild.
    async fn member_role_ids(&self, user_id: i64) -> Result<Vec<i64>>;

    /// Full channel history, oldest first.
    async fn channel_history(&self, channel_id: i64) -> Result<Vec<ChannelMessage>>;

    async fn get_message(&self, channel_id: i64, message_id: i64) -> Result<ChannelMessage>;

    async fn edit_message(
        &self,
        channel_id: i64,
        message_id: i64,
        embed: OutgoingEmbed,
    ) -> Result<()>;

    async fn delete_message(&self, channel_id: i64, message_id: i64) -> Result<()>;

    /// Id of the DM channel with the user (opens one if needed).
    async fn dm_channel_id(&self, user_id: i64) -> Result<i64>;

    async fn download_attachment(&self, url: &str) -> Result<Vec<u8>>;
}
