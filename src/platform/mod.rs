use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub mod rest;

/// Milliseconds since the Unix epoch of the platform's snowflake epoch.
const SNOWFLAKE_EPOCH_MS: i64 = 1_420_070_400_000;

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error [{status}]: {message}")]
    Api { status: u16, message: String },
    #[error("rate limited, retry after {retry_after:?} seconds")]
    RateLimited { retry_after: Option<u64> },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Text,
    Category,
    Other(u8),
}

impl From<u8> for ChannelKind {
    fn from(raw: u8) -> Self {
        match raw {
            0 => Self::Text,
            4 => Self::Category,
            other => Self::Other(other),
        }
    }
}

impl ChannelKind {
    pub fn wire_value(self) -> u8 {
        match self {
            Self::Text => 0,
            Self::Category => 4,
            Self::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub kind: ChannelKind,
    pub parent_id: Option<String>,
    pub topic: Option<String>,
}

impl Channel {
    pub fn is_text(&self) -> bool {
        self.kind == ChannelKind::Text
    }

    pub fn is_category(&self) -> bool {
        self.kind == ChannelKind::Category
    }

    /// Creation time encoded in the snowflake id, when the id is one.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        snowflake_timestamp(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub bot: bool,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }

    /// Mention markup understood by the platform.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

#[derive(Debug, Clone)]
pub struct Member {
    pub user: User,
    /// Role ids held by the member in the guild.
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewChannel,
    SendMessages,
    ReadMessageHistory,
    AttachFiles,
    EmbedLinks,
    ManageMessages,
    ManageChannels,
}

impl Permission {
    pub fn bit(self) -> u64 {
        match self {
            Self::ManageChannels => 1 << 4,
            Self::ViewChannel => 1 << 10,
            Self::SendMessages => 1 << 11,
            Self::ManageMessages => 1 << 13,
            Self::EmbedLinks => 1 << 14,
            Self::AttachFiles => 1 << 15,
            Self::ReadMessageHistory => 1 << 16,
        }
    }

    pub fn all() -> [Permission; 7] {
        [
            Self::ViewChannel,
            Self::SendMessages,
            Self::ReadMessageHistory,
            Self::AttachFiles,
            Self::EmbedLinks,
            Self::ManageMessages,
            Self::ManageChannels,
        ]
    }

    pub fn mask(perms: &[Permission]) -> u64 {
        perms.iter().fold(0, |acc, p| acc | p.bit())
    }

    pub fn from_mask(mask: u64) -> Vec<Permission> {
        Self::all()
            .into_iter()
            .filter(|p| mask & p.bit() != 0)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverwriteTarget {
    Role(String),
    Member(String),
}

impl OverwriteTarget {
    pub fn id(&self) -> &str {
        match self {
            Self::Role(id) | Self::Member(id) => id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PermissionOverwrite {
    pub target: OverwriteTarget,
    pub allow: Vec<Permission>,
    pub deny: Vec<Permission>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
    pub content_type: Option<String>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub author: User,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub embeds: Vec<Embed>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputStyle {
    Short,
    Paragraph,
}

#[derive(Debug, Clone)]
pub struct TextInput {
    pub custom_id: String,
    pub label: String,
    pub style: TextInputStyle,
    pub placeholder: Option<String>,
    pub required: bool,
    pub max_length: Option<u16>,
}

/// A modal form the platform shows to the user; submitted values come back as
/// a `ModalSubmit` interaction carrying the same custom id.
#[derive(Debug, Clone)]
pub struct ModalDefinition {
    pub custom_id: String,
    pub title: String,
    pub inputs: Vec<TextInput>,
}

#[derive(Debug, Clone)]
pub struct OutboundFile {
    pub filename: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct OutboundMessage {
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    pub buttons: Vec<Button>,
    pub files: Vec<OutboundFile>,
}

#[derive(Debug, Clone)]
pub struct CreateChannel {
    pub name: String,
    pub kind: ChannelKind,
    pub parent_id: Option<String>,
    pub topic: Option<String>,
    pub overwrites: Vec<PermissionOverwrite>,
}

/// Narrow boundary to the chat platform. Everything the ticket system needs
/// from the SDK goes through here, so core logic can run against an
/// in-memory fake in tests.
#[async_trait::async_trait]
pub trait PlatformClient: Send + Sync {
    async fn create_channel(
        &self,
        guild_id: &str,
        req: CreateChannel,
    ) -> Result<Channel, PlatformError>;

    async fn delete_channel(
        &self,
        channel_id: &str,
        audit_reason: &str,
    ) -> Result<(), PlatformError>;

    async fn guild(&self, guild_id: &str) -> Result<Guild, PlatformError>;

    async fn list_channels(&self, guild_id: &str) -> Result<Vec<Channel>, PlatformError>;

    async fn guild_roles(&self, guild_id: &str) -> Result<Vec<Role>, PlatformError>;

    async fn member(&self, guild_id: &str, user_id: &str) -> Result<Member, PlatformError>;

    /// Effective permissions of a member in a specific channel.
    async fn member_permissions(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> Result<Vec<Permission>, PlatformError>;

    /// Fetch up to `limit` messages, newest first, strictly older than
    /// `before` when given.
    async fn fetch_messages(
        &self,
        channel_id: &str,
        limit: u8,
        before: Option<&str>,
    ) -> Result<Vec<Message>, PlatformError>;

    async fn send_message(
        &self,
        channel_id: &str,
        message: OutboundMessage,
    ) -> Result<Message, PlatformError>;

    async fn create_overwrite(
        &self,
        channel_id: &str,
        overwrite: PermissionOverwrite,
    ) -> Result<(), PlatformError>;

    async fn delete_overwrite(
        &self,
        channel_id: &str,
        target: &OverwriteTarget,
    ) -> Result<(), PlatformError>;
}

pub fn snowflake_timestamp(id: &str) -> Option<DateTime<Utc>> {
    let raw: u64 = id.parse().ok()?;
    let ms = (raw >> 22) as i64 + SNOWFLAKE_EPOCH_MS;
    Utc.timestamp_millis_opt(ms).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_mask_round_trip() {
        let perms = vec![Permission::ViewChannel, Permission::ManageChannels];
        let mask = Permission::mask(&perms);
        assert_eq!(mask, (1 << 10) | (1 << 4));
        let back = Permission::from_mask(mask);
        assert!(back.contains(&Permission::ViewChannel));
        assert!(back.contains(&Permission::ManageChannels));
        assert_eq!(back.len(), 2);
    }

    #[test]
    fn snowflake_decodes_to_creation_time() {
        // 175928847299117063 is the documented example snowflake.
        let ts = snowflake_timestamp("175928847299117063").unwrap();
        assert_eq!(ts.timestamp(), 1_462_015_105);
        assert!(snowflake_timestamp("not-a-number").is_none());
    }

    #[test]
    fn channel_kind_maps_wire_values() {
        assert_eq!(ChannelKind::from(0), ChannelKind::Text);
        assert_eq!(ChannelKind::from(4), ChannelKind::Category);
        assert_eq!(ChannelKind::from(2).wire_value(), 2);
    }
}
