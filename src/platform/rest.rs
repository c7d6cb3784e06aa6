use super::{
    Button, ButtonStyle, Channel, CreateChannel, Embed, EmbedField, Member, Message,
    OutboundMessage, OverwriteTarget, Permission, PermissionOverwrite, PlatformError, Role, User,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://discord.com/api/v10";

/// REST-backed `PlatformClient`. All requests authenticate with the bot token;
/// destructive calls carry an audit-log reason header.
pub struct RestProvider {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.token)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, PlatformError> {
        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok());
            return Err(PlatformError::RateLimited { retry_after });
        }

        if status.as_u16() == 401 || status.as_u16() == 403 {
            let message = response.text().await.unwrap_or_default();
            return Err(PlatformError::AuthenticationFailed(message));
        }

        if status.as_u16() == 404 {
            let message = response.text().await.unwrap_or_default();
            return Err(PlatformError::NotFound(message));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
    ) -> Result<T, PlatformError> {
        let response = self
            .client
            .get(url)
            .header("Authorization", self.auth())
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;

        Self::check(response)
            .await?
            .json::<T>()
            .await
            .map_err(|e| PlatformError::Api {
                status: 0,
                message: e.to_string(),
            })
    }
}

#[async_trait::async_trait]
impl super::PlatformClient for RestProvider {
    async fn create_channel(
        &self,
        guild_id: &str,
        req: CreateChannel,
    ) -> Result<Channel, PlatformError> {
        let body = CreateChannelBody {
            name: req.name,
            kind: req.kind.wire_value(),
            parent_id: req.parent_id,
            topic: req.topic,
            permission_overwrites: req.overwrites.iter().map(WireOverwrite::from).collect(),
        };

        let response = self
            .client
            .post(format!("{}/guilds/{}/channels", self.base_url, guild_id))
            .header("Authorization", self.auth())
            .json(&body)
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;

        let channel: WireChannel =
            Self::check(response)
                .await?
                .json()
                .await
                .map_err(|e| PlatformError::Api {
                    status: 0,
                    message: e.to_string(),
                })?;

        Ok(channel.into())
    }

    async fn delete_channel(
        &self,
        channel_id: &str,
        audit_reason: &str,
    ) -> Result<(), PlatformError> {
        let response = self
            .client
            .delete(format!("{}/channels/{}", self.base_url, channel_id))
            .header("Authorization", self.auth())
            .header("X-Audit-Log-Reason", urlencoding::encode(audit_reason).into_owned())
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn guild(&self, guild_id: &str) -> Result<super::Guild, PlatformError> {
        let guild: WireGuild = self
            .get_json(format!("{}/guilds/{}", self.base_url, guild_id))
            .await?;
        Ok(super::Guild {
            id: guild.id,
            name: guild.name,
        })
    }

    async fn list_channels(&self, guild_id: &str) -> Result<Vec<Channel>, PlatformError> {
        let channels: Vec<WireChannel> = self
            .get_json(format!("{}/guilds/{}/channels", self.base_url, guild_id))
            .await?;
        Ok(channels.into_iter().map(Channel::from).collect())
    }

    async fn guild_roles(&self, guild_id: &str) -> Result<Vec<Role>, PlatformError> {
        let roles: Vec<WireRole> = self
            .get_json(format!("{}/guilds/{}/roles", self.base_url, guild_id))
            .await?;
        Ok(roles
            .into_iter()
            .map(|r| Role {
                id: r.id,
                name: r.name,
            })
            .collect())
    }

    async fn member(&self, guild_id: &str, user_id: &str) -> Result<Member, PlatformError> {
        let member: WireMember = self
            .get_json(format!(
                "{}/guilds/{}/members/{}",
                self.base_url, guild_id, user_id
            ))
            .await?;
        Ok(member.into())
    }

    async fn member_permissions(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> Result<Vec<Permission>, PlatformError> {
        // The REST API has no effective-permission endpoint; compute the set
        // the way the platform does. Base mask is the union of the permission
        // bits of @everyone and the member's roles, then channel overwrites
        // apply in order: everyone, aggregated role denies/allows, member.
        let channel: WireChannel = self
            .get_json(format!("{}/channels/{}", self.base_url, channel_id))
            .await?;

        let guild_id = channel
            .guild_id
            .clone()
            .ok_or_else(|| PlatformError::NotFound("channel has no guild".to_string()))?;

        let member: WireMember = self
            .get_json(format!(
                "{}/guilds/{}/members/{}",
                self.base_url, guild_id, user_id
            ))
            .await?;

        let roles: Vec<WireRole> = self
            .get_json(format!("{}/guilds/{}/roles", self.base_url, guild_id))
            .await?;

        let mut mask = 0u64;
        for role in &roles {
            if role.id == guild_id || member.roles.contains(&role.id) {
                mask |= role.permissions.parse::<u64>().unwrap_or(0);
            }
        }

        let overwrites = channel.permission_overwrites.unwrap_or_default();

        if let Some(ow) = overwrites.iter().find(|o| o.kind == 0 && o.id == guild_id) {
            mask &= !ow.deny.parse::<u64>().unwrap_or(0);
            mask |= ow.allow.parse::<u64>().unwrap_or(0);
        }

        let mut role_allow = 0u64;
        let mut role_deny = 0u64;
        for ow in overwrites
            .iter()
            .filter(|o| o.kind == 0 && o.id != guild_id && member.roles.contains(&o.id))
        {
            role_allow |= ow.allow.parse::<u64>().unwrap_or(0);
            role_deny |= ow.deny.parse::<u64>().unwrap_or(0);
        }
        mask &= !role_deny;
        mask |= role_allow;

        if let Some(ow) = overwrites.iter().find(|o| o.kind == 1 && o.id == user_id) {
            mask &= !ow.deny.parse::<u64>().unwrap_or(0);
            mask |= ow.allow.parse::<u64>().unwrap_or(0);
        }

        Ok(Permission::from_mask(mask))
    }

    async fn fetch_messages(
        &self,
        channel_id: &str,
        limit: u8,
        before: Option<&str>,
    ) -> Result<Vec<Message>, PlatformError> {
        let mut url = format!(
            "{}/channels/{}/messages?limit={}",
            self.base_url, channel_id, limit
        );
        if let Some(before) = before {
            url.push_str(&format!("&before={before}"));
        }

        let messages: Vec<WireMessage> = self.get_json(url).await?;
        Ok(messages.into_iter().map(Message::from).collect())
    }

    async fn send_message(
        &self,
        channel_id: &str,
        message: OutboundMessage,
    ) -> Result<Message, PlatformError> {
        let body = MessageBody::from(&message);
        let url = format!("{}/channels/{}/messages", self.base_url, channel_id);

        let request = self.client.post(url).header("Authorization", self.auth());

        let response = if message.files.is_empty() {
            request.json(&body).send().await
        } else {
            let payload = serde_json::to_string(&body).map_err(|e| PlatformError::Api {
                status: 0,
                message: e.to_string(),
            })?;
            let mut form = reqwest::multipart::Form::new().text("payload_json", payload);
            for (idx, file) in message.files.into_iter().enumerate() {
                form = form.part(
                    format!("files[{idx}]"),
                    reqwest::multipart::Part::bytes(file.data).file_name(file.filename),
                );
            }
            request.multipart(form).send().await
        }
        .map_err(|e| PlatformError::Network(e.to_string()))?;

        let sent: WireMessage =
            Self::check(response)
                .await?
                .json()
                .await
                .map_err(|e| PlatformError::Api {
                    status: 0,
                    message: e.to_string(),
                })?;

        Ok(sent.into())
    }

    async fn create_overwrite(
        &self,
        channel_id: &str,
        overwrite: PermissionOverwrite,
    ) -> Result<(), PlatformError> {
        let wire = WireOverwrite::from(&overwrite);
        let response = self
            .client
            .put(format!(
                "{}/channels/{}/permissions/{}",
                self.base_url,
                channel_id,
                overwrite.target.id()
            ))
            .header("Authorization", self.auth())
            .json(&wire)
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn delete_overwrite(
        &self,
        channel_id: &str,
        target: &OverwriteTarget,
    ) -> Result<(), PlatformError> {
        let response = self
            .client
            .delete(format!(
                "{}/channels/{}/permissions/{}",
                self.base_url,
                channel_id,
                target.id()
            ))
            .header("Authorization", self.auth())
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CreateChannelBody {
    name: String,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    permission_overwrites: Vec<WireOverwrite>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireOverwrite {
    id: String,
    #[serde(rename = "type")]
    kind: u8,
    allow: String,
    deny: String,
}

impl From<&PermissionOverwrite> for WireOverwrite {
    fn from(ow: &PermissionOverwrite) -> Self {
        let (id, kind) = match &ow.target {
            OverwriteTarget::Role(id) => (id.clone(), 0),
            OverwriteTarget::Member(id) => (id.clone(), 1),
        };
        Self {
            id,
            kind,
            allow: Permission::mask(&ow.allow).to_string(),
            deny: Permission::mask(&ow.deny).to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireChannel {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    guild_id: Option<String>,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    permission_overwrites: Option<Vec<WireOverwrite>>,
}

impl From<WireChannel> for Channel {
    fn from(wire: WireChannel) -> Self {
        Self {
            id: wire.id,
            name: wire.name.unwrap_or_default(),
            kind: wire.kind.into(),
            parent_id: wire.parent_id,
            topic: wire.topic,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireGuild {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct WireRole {
    id: String,
    name: String,
    /// Guild-wide permission bits, serialized as a decimal string.
    #[serde(default)]
    permissions: String,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    username: String,
    #[serde(default)]
    global_name: Option<String>,
    #[serde(default)]
    bot: bool,
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        Self {
            id: wire.id,
            username: wire.username,
            display_name: wire.global_name,
            bot: wire.bot,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireMember {
    user: WireUser,
    #[serde(default)]
    roles: Vec<String>,
}

impl From<WireMember> for Member {
    fn from(wire: WireMember) -> Self {
        Self {
            user: wire.user.into(),
            roles: wire.roles,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireAttachment {
    filename: String,
    url: String,
    #[serde(default)]
    content_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireEmbedField {
    name: String,
    value: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    inline: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireEmbedFooter {
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireEmbedImage {
    url: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireEmbed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    fields: Vec<WireEmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    footer: Option<WireEmbedFooter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<WireEmbedImage>,
}

impl From<WireEmbed> for Embed {
    fn from(wire: WireEmbed) -> Self {
        Self {
            title: wire.title,
            description: wire.description,
            color: wire.color,
            fields: wire
                .fields
                .into_iter()
                .map(|f| EmbedField {
                    name: f.name,
                    value: f.value,
                    inline: f.inline,
                })
                .collect(),
            footer: wire.footer.map(|f| f.text),
            image_url: wire.image.map(|i| i.url),
        }
    }
}

impl From<&Embed> for WireEmbed {
    fn from(embed: &Embed) -> Self {
        Self {
            title: embed.title.clone(),
            description: embed.description.clone(),
            color: embed.color,
            fields: embed
                .fields
                .iter()
                .map(|f| WireEmbedField {
                    name: f.name.clone(),
                    value: f.value.clone(),
                    inline: f.inline,
                })
                .collect(),
            footer: embed.footer.clone().map(|text| WireEmbedFooter { text }),
            image: embed
                .image_url
                .clone()
                .map(|url| WireEmbedImage { url }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    id: String,
    author: WireUser,
    #[serde(default)]
    content: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    embeds: Vec<WireEmbed>,
    #[serde(default)]
    attachments: Vec<WireAttachment>,
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        Self {
            id: wire.id,
            author: wire.author.into(),
            content: wire.content,
            timestamp: wire.timestamp,
            embeds: wire.embeds.into_iter().map(Embed::from).collect(),
            attachments: wire
                .attachments
                .into_iter()
                .map(|a| super::Attachment {
                    filename: a.filename,
                    url: a.url,
                    content_type: a.content_type,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireButton {
    #[serde(rename = "type")]
    kind: u8,
    style: u8,
    label: String,
    custom_id: String,
}

impl From<&Button> for WireButton {
    fn from(button: &Button) -> Self {
        Self {
            kind: 2,
            style: match button.style {
                ButtonStyle::Primary => 1,
                ButtonStyle::Danger => 4,
            },
            label: button.label.clone(),
            custom_id: button.custom_id.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireActionRow {
    #[serde(rename = "type")]
    kind: u8,
    components: Vec<WireButton>,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeds: Vec<WireEmbed>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    components: Vec<WireActionRow>,
}

impl From<&OutboundMessage> for MessageBody {
    fn from(message: &OutboundMessage) -> Self {
        let components = if message.buttons.is_empty() {
            Vec::new()
        } else {
            vec![WireActionRow {
                kind: 1,
                components: message.buttons.iter().map(WireButton::from).collect(),
            }]
        };
        Self {
            content: message.content.clone(),
            embeds: message.embeds.iter().map(WireEmbed::from).collect(),
            components,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{ChannelKind, PlatformClient};

    #[tokio::test]
    async fn create_channel_posts_overwrites_and_parses_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/guilds/42/channels")
            .match_header("authorization", "Bot tkn")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "name": "seg-alice",
                "type": 0,
                "parent_id": "99",
            })))
            .with_status(201)
            .with_body(
                r#"{"id":"1001","name":"seg-alice","type":0,"guild_id":"42","parent_id":"99","topic":"Ticket #7"}"#,
            )
            .create_async()
            .await;

        let provider = RestProvider::with_base_url("tkn", server.url());
        let channel = provider
            .create_channel(
                "42",
                CreateChannel {
                    name: "seg-alice".to_string(),
                    kind: ChannelKind::Text,
                    parent_id: Some("99".to_string()),
                    topic: Some("Ticket #7".to_string()),
                    overwrites: vec![PermissionOverwrite {
                        target: OverwriteTarget::Role("42".to_string()),
                        allow: vec![],
                        deny: vec![Permission::ViewChannel],
                    }],
                },
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(channel.id, "1001");
        assert_eq!(channel.kind, ChannelKind::Text);
        assert_eq!(channel.parent_id.as_deref(), Some("99"));
    }

    #[tokio::test]
    async fn fetch_messages_passes_before_cursor() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/channels/7/messages?limit=100&before=555")
            .with_body(
                r#"[{"id":"554","author":{"id":"1","username":"alice"},"content":"hi","timestamp":"2024-05-01T10:00:00.000000+00:00"}]"#,
            )
            .create_async()
            .await;

        let provider = RestProvider::with_base_url("tkn", server.url());
        let messages = provider.fetch_messages("7", 100, Some("555")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].author.username, "alice");
    }

    #[tokio::test]
    async fn rate_limit_surfaces_retry_after() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/guilds/42/roles")
            .with_status(429)
            .with_header("retry-after", "7")
            .create_async()
            .await;

        let provider = RestProvider::with_base_url("tkn", server.url());
        match provider.guild_roles("42").await {
            Err(PlatformError::RateLimited { retry_after }) => {
                assert_eq!(retry_after, Some(7));
            }
            other => panic!("expected rate limit error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn member_permissions_include_guild_level_role_bits() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/channels/7")
            .with_body(r#"{"id":"7","name":"seg-alice","type":0,"guild_id":"42"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/guilds/42/members/9")
            .with_body(r#"{"user":{"id":"9","username":"admin"},"roles":["r1"]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/guilds/42/roles")
            .with_body(
                r#"[{"id":"42","name":"@everyone","permissions":"1024"},{"id":"r1","name":"Admin","permissions":"16"}]"#,
            )
            .create_async()
            .await;

        let provider = RestProvider::with_base_url("tkn", server.url());
        let perms = provider.member_permissions("7", "9").await.unwrap();

        // No channel overwrites: guild-level role bits alone must apply.
        assert!(perms.contains(&Permission::ManageChannels));
        assert!(perms.contains(&Permission::ViewChannel));
    }

    #[tokio::test]
    async fn member_overwrite_deny_wins_over_role_bits() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/channels/7")
            .with_body(
                r#"{"id":"7","name":"seg-alice","type":0,"guild_id":"42","permission_overwrites":[{"id":"9","type":1,"allow":"0","deny":"1024"}]}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/guilds/42/members/9")
            .with_body(r#"{"user":{"id":"9","username":"admin"},"roles":["r1"]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/guilds/42/roles")
            .with_body(
                r#"[{"id":"42","name":"@everyone","permissions":"1024"},{"id":"r1","name":"Admin","permissions":"16"}]"#,
            )
            .create_async()
            .await;

        let provider = RestProvider::with_base_url("tkn", server.url());
        let perms = provider.member_permissions("7", "9").await.unwrap();

        assert!(perms.contains(&Permission::ManageChannels));
        assert!(!perms.contains(&Permission::ViewChannel));
    }

    #[tokio::test]
    async fn delete_channel_sends_audit_reason() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/channels/7")
            .match_header("x-audit-log-reason", mockito::Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let provider = RestProvider::with_base_url("tkn", server.url());
        provider
            .delete_channel("7", "Ticket closed by staff#1 - Reason: resolved")
            .await
            .unwrap();
        mock.assert_async().await;
    }
}
