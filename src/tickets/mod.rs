use crate::config::AppConfig;
use crate::counter::CounterStore;
use crate::platform::{
    Channel, ChannelKind, CreateChannel, Member, OutboundFile, OutboundMessage, OverwriteTarget,
    Permission, PermissionOverwrite, PlatformClient, PlatformError, User,
};
use crate::transcript::TranscriptGenerator;
use chrono::Utc;
use log::{error, info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub mod ui;

/// Prefix identifying ticket channels.
pub const TICKET_PREFIX: &str = "seg-";

/// Default inactivity threshold for the stale-ticket sweep (7 days).
pub const DEFAULT_MAX_AGE_HOURS: i64 = 168;

/// Deterministic channel name for a requester. The handle is
/// lowercase-normalized so `Alice` and `alice` map to the same ticket.
pub fn channel_name_for(username: &str) -> String {
    format!("{TICKET_PREFIX}{}", username.to_lowercase())
}

pub fn is_ticket_channel(name: &str) -> bool {
    name.starts_with(TICKET_PREFIX)
}

/// Lifecycle of a ticket. Each edge has exactly one transition method on
/// [`TicketManager`]:
///
/// `None -> Requested`   [`TicketManager::request_open`]
/// `Requested -> Open`   [`TicketManager::open`]
/// `Open -> Closing`     [`TicketManager::close`]
/// `Closing -> Deleted`  scheduled by `close`, cancellable via
///                       [`TicketManager::cancel_pending_delete`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketState {
    None,
    Requested,
    Open,
    Closing,
    Deleted,
}

#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("you already have an open ticket: <#{0}>")]
    DuplicateTicket(String),
    #[error("reason is too long ({len} characters, max {max})")]
    ReasonTooLong { len: usize, max: usize },
    #[error("category {0} not found or is not a category")]
    MissingCategory(String),
    #[error("this action can only be used in ticket channels")]
    WrongChannelType,
    #[error("only staff members can manage security tickets")]
    NotStaff,
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl TicketError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateTicket(_)
                | Self::ReasonTooLong { .. }
                | Self::MissingCategory(_)
                | Self::WrongChannelType
        )
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::NotStaff)
    }
}

#[derive(Debug)]
pub struct OpenedTicket {
    pub channel: Channel,
    pub number: u64,
    pub state: TicketState,
}

const MEMBER_ALLOWS: [Permission; 5] = [
    Permission::ViewChannel,
    Permission::SendMessages,
    Permission::ReadMessageHistory,
    Permission::AttachFiles,
    Permission::EmbedLinks,
];

fn staff_allows() -> Vec<Permission> {
    let mut allows = MEMBER_ALLOWS.to_vec();
    allows.push(Permission::ManageMessages);
    allows.push(Permission::ManageChannels);
    allows
}

/// Drives the ticket lifecycle against the platform boundary. Cheap to clone;
/// clones share the pending-deletion table.
#[derive(Clone)]
pub struct TicketManager {
    platform: Arc<dyn PlatformClient>,
    config: Arc<AppConfig>,
    counter: CounterStore,
    transcripts: Arc<TranscriptGenerator>,
    pending_deletes: Arc<Mutex<HashMap<String, tokio::task::JoinHandle<()>>>>,
}

impl TicketManager {
    pub fn new(platform: Arc<dyn PlatformClient>, config: Arc<AppConfig>) -> Self {
        let counter = CounterStore::new(&config.counter_file);
        let transcripts = Arc::new(TranscriptGenerator::new(
            Arc::clone(&platform),
            &config.transcript_dir,
        ));
        Self {
            platform,
            config,
            counter,
            transcripts,
            pending_deletes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn find_existing(
        &self,
        guild_id: &str,
        user: &User,
    ) -> Result<Option<Channel>, PlatformError> {
        let name = channel_name_for(&user.username);
        let channels = self.platform.list_channels(guild_id).await?;
        Ok(channels
            .into_iter()
            .find(|c| c.is_text() && c.name == name))
    }

    /// `None -> Requested`. Idempotent no-op refusal when the user already
    /// has an open ticket: the error carries the existing channel id so the
    /// caller can point the user at it.
    pub async fn request_open(&self, guild_id: &str, user: &User) -> Result<TicketState, TicketError> {
        if let Some(existing) = self.find_existing(guild_id, user).await? {
            return Err(TicketError::DuplicateTicket(existing.id));
        }
        Ok(TicketState::Requested)
    }

    /// `Requested -> Open`. Creates the channel under the configured
    /// category with the full overwrite set and posts the welcome message.
    ///
    /// The duplicate check is re-run here as close to the create as
    /// possible; two near-simultaneous opens for the same handle can still
    /// race past it (check-then-create, no cross-task lock).
    pub async fn open(
        &self,
        guild_id: &str,
        user: &User,
        reason: &str,
        max_reason: usize,
    ) -> Result<OpenedTicket, TicketError> {
        let len = reason.chars().count();
        if len > max_reason {
            return Err(TicketError::ReasonTooLong {
                len,
                max: max_reason,
            });
        }

        let name = channel_name_for(&user.username);
        let channels = self.platform.list_channels(guild_id).await?;
        if let Some(existing) = channels.iter().find(|c| c.is_text() && c.name == name) {
            return Err(TicketError::DuplicateTicket(existing.id.clone()));
        }

        let category_ok = channels
            .iter()
            .any(|c| c.id == self.config.category_id && c.is_category());
        if !category_ok {
            return Err(TicketError::MissingCategory(self.config.category_id.clone()));
        }

        let number = self.counter.next().await;
        let overwrites = self.build_overwrites(guild_id, user).await?;

        let channel = self
            .platform
            .create_channel(
                guild_id,
                CreateChannel {
                    name,
                    kind: ChannelKind::Text,
                    parent_id: Some(self.config.category_id.clone()),
                    topic: Some(format!(
                        "Security Ticket #{number} | {} | {reason}",
                        user.username
                    )),
                    overwrites,
                },
            )
            .await?;

        info!(
            "created ticket #{number} ({}) for user {}",
            channel.name, user.username
        );

        self.platform
            .send_message(&channel.id, ui::welcome_message(user, number, reason))
            .await?;

        Ok(OpenedTicket {
            channel,
            number,
            state: TicketState::Open,
        })
    }

    async fn build_overwrites(
        &self,
        guild_id: &str,
        user: &User,
    ) -> Result<Vec<PermissionOverwrite>, PlatformError> {
        // The everyone role shares the guild's id.
        let mut overwrites = vec![
            PermissionOverwrite {
                target: OverwriteTarget::Role(guild_id.to_string()),
                allow: vec![],
                deny: vec![Permission::ViewChannel],
            },
            PermissionOverwrite {
                target: OverwriteTarget::Member(user.id.clone()),
                allow: MEMBER_ALLOWS.to_vec(),
                deny: vec![],
            },
        ];

        let roles = self.platform.guild_roles(guild_id).await?;

        if roles.iter().any(|r| r.id == self.config.staff_role_id) {
            overwrites.push(PermissionOverwrite {
                target: OverwriteTarget::Role(self.config.staff_role_id.clone()),
                allow: staff_allows(),
                deny: vec![],
            });
        } else if !self.config.staff_role_id.is_empty() {
            warn!(
                "configured staff role {} not present in guild {guild_id}",
                self.config.staff_role_id
            );
        }

        for role in roles {
            if role.id != self.config.staff_role_id
                && self.config.support_roles.contains(&role.name)
            {
                overwrites.push(PermissionOverwrite {
                    target: OverwriteTarget::Role(role.id),
                    allow: staff_allows(),
                    deny: vec![],
                });
            }
        }

        Ok(overwrites)
    }

    /// Staff predicate: configured staff role, a configured support-role
    /// name, or channel-level manage-channels permission.
    pub async fn is_staff(
        &self,
        guild_id: &str,
        channel_id: &str,
        member: &Member,
    ) -> Result<bool, PlatformError> {
        if member.roles.iter().any(|r| *r == self.config.staff_role_id) {
            return Ok(true);
        }

        let roles = self.platform.guild_roles(guild_id).await?;
        let has_support_role = roles
            .iter()
            .any(|r| self.config.support_roles.contains(&r.name) && member.roles.contains(&r.id));
        if has_support_role {
            return Ok(true);
        }

        let perms = self
            .platform
            .member_permissions(channel_id, &member.user.id)
            .await?;
        Ok(perms.contains(&Permission::ManageChannels))
    }

    /// `Open -> Closing`. Validates and authorizes, posts the closing
    /// confirmation, then finishes asynchronously: transcript, close log,
    /// deferred deletion. Failures past this point are best-effort and do
    /// not roll the closure back.
    pub async fn close(
        &self,
        guild_id: &str,
        channel: &Channel,
        closed_by: &Member,
        reason: &str,
    ) -> Result<TicketState, TicketError> {
        if !is_ticket_channel(&channel.name) {
            return Err(TicketError::WrongChannelType);
        }
        if !self.is_staff(guild_id, &channel.id, closed_by).await? {
            return Err(TicketError::NotStaff);
        }

        self.platform
            .send_message(
                &channel.id,
                OutboundMessage {
                    embeds: vec![ui::closing_confirmation(reason)],
                    ..Default::default()
                },
            )
            .await?;

        let manager = self.clone();
        let guild_id = guild_id.to_string();
        let channel = channel.clone();
        let closed_by = closed_by.user.clone();
        let reason = reason.to_string();
        tokio::spawn(async move {
            manager
                .finalize_close(&guild_id, &channel, &closed_by, &reason)
                .await;
        });

        Ok(TicketState::Closing)
    }

    async fn finalize_close(
        &self,
        guild_id: &str,
        channel: &Channel,
        closed_by: &User,
        reason: &str,
    ) {
        let guild_name = match self.platform.guild(guild_id).await {
            Ok(guild) => guild.name,
            Err(e) => {
                warn!("could not resolve guild {guild_id} name: {e}");
                guild_id.to_string()
            }
        };

        match self.transcripts.generate(channel, &guild_name, closed_by).await {
            Ok(html) => match self.transcripts.save(&html, &channel.name).await {
                Ok(path) => {
                    self.post_close_log(channel, closed_by, reason, &path).await;
                }
                Err(e) => error!("error saving transcript for #{}: {e}", channel.name),
            },
            Err(e) => error!("error generating transcript for #{}: {e}", channel.name),
        }

        self.schedule_delete(
            channel.id.clone(),
            format!(
                "Ticket closed by {} - Reason: {reason}",
                closed_by.username
            ),
        );
    }

    async fn post_close_log(
        &self,
        channel: &Channel,
        closed_by: &User,
        reason: &str,
        transcript_path: &Path,
    ) {
        let data = match tokio::fs::read(transcript_path).await {
            Ok(data) => data,
            Err(e) => {
                error!("error reading transcript {}: {e}", transcript_path.display());
                return;
            }
        };

        let message = OutboundMessage {
            embeds: vec![ui::close_log_embed(
                &channel.name,
                closed_by,
                reason,
                Utc::now(),
            )],
            files: vec![OutboundFile {
                filename: format!("transcript-{}.html", channel.name),
                data,
            }],
            ..Default::default()
        };

        if let Err(e) = self
            .platform
            .send_message(&self.config.log_channel_id, message)
            .await
        {
            error!(
                "log channel {} unavailable, skipping close log: {e}",
                self.config.log_channel_id
            );
        }
    }

    /// `Closing -> Deleted`, after the configured delay. The task handle is
    /// retained so an out-of-band deletion can cancel it.
    pub fn schedule_delete(&self, channel_id: String, audit_reason: String) {
        let delay = Duration::from_secs(self.config.delete_delay_secs);
        let platform = Arc::clone(&self.platform);
        let pending = Arc::clone(&self.pending_deletes);
        let id = channel_id.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = platform.delete_channel(&id, &audit_reason).await {
                error!("error deleting ticket channel {id}: {e}");
            }
            pending.lock().unwrap_or_else(|p| p.into_inner()).remove(&id);
        });

        self.pending_deletes
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(channel_id, handle);
    }

    /// Cancel a scheduled deletion, e.g. when the channel disappeared
    /// out-of-band before the timer fired. Returns whether one was pending.
    pub fn cancel_pending_delete(&self, channel_id: &str) -> bool {
        let handle = self
            .pending_deletes
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(channel_id);
        match handle {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn has_pending_delete(&self, channel_id: &str) -> bool {
        self.pending_deletes
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(channel_id)
    }

    /// Grant an extra user access to an existing ticket channel. Staff only.
    pub async fn add_user(
        &self,
        guild_id: &str,
        channel: &Channel,
        acting: &Member,
        target: &User,
    ) -> Result<(), TicketError> {
        if !is_ticket_channel(&channel.name) {
            return Err(TicketError::WrongChannelType);
        }
        if !self.is_staff(guild_id, &channel.id, acting).await? {
            return Err(TicketError::NotStaff);
        }

        self.platform
            .create_overwrite(
                &channel.id,
                PermissionOverwrite {
                    target: OverwriteTarget::Member(target.id.clone()),
                    allow: vec![
                        Permission::ViewChannel,
                        Permission::SendMessages,
                        Permission::ReadMessageHistory,
                    ],
                    deny: vec![],
                },
            )
            .await?;
        info!("added user {} to ticket #{}", target.username, channel.name);
        Ok(())
    }

    /// Revoke a user's access to a ticket channel. Staff only.
    pub async fn remove_user(
        &self,
        guild_id: &str,
        channel: &Channel,
        acting: &Member,
        target: &User,
    ) -> Result<(), TicketError> {
        if !is_ticket_channel(&channel.name) {
            return Err(TicketError::WrongChannelType);
        }
        if !self.is_staff(guild_id, &channel.id, acting).await? {
            return Err(TicketError::NotStaff);
        }

        self.platform
            .delete_overwrite(&channel.id, &OverwriteTarget::Member(target.id.clone()))
            .await?;
        info!(
            "removed user {} from ticket #{}",
            target.username, channel.name
        );
        Ok(())
    }

    /// Delete ticket channels whose latest message is older than
    /// `max_age_hours`. Channels with no messages are skipped; per-channel
    /// failures are logged and the sweep continues.
    pub async fn cleanup_stale(
        &self,
        guild_id: &str,
        max_age_hours: i64,
    ) -> Result<usize, PlatformError> {
        let now = Utc::now();
        let max_age = chrono::Duration::hours(max_age_hours);
        let channels = self.platform.list_channels(guild_id).await?;
        let mut deleted = 0;

        for channel in channels
            .into_iter()
            .filter(|c| c.is_text() && is_ticket_channel(&c.name))
        {
            match self.platform.fetch_messages(&channel.id, 1, None).await {
                Ok(batch) => {
                    let Some(latest) = batch.first() else {
                        continue;
                    };
                    if now - latest.timestamp > max_age {
                        info!("cleaning up stale ticket #{}", channel.name);
                        match self
                            .platform
                            .delete_channel(&channel.id, "Automatic cleanup - inactive ticket")
                            .await
                        {
                            Ok(()) => deleted += 1,
                            Err(e) => {
                                error!("error cleaning up ticket #{}: {e}", channel.name);
                            }
                        }
                    }
                }
                Err(e) => error!("error checking ticket #{}: {e}", channel.name),
            }
        }

        Ok(deleted)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn transcripts(&self) -> &TranscriptGenerator {
        &self.transcripts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fake::{test_config, FakePlatform};
    use crate::{assert_err, assert_ok};

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.to_string(),
            username: name.to_string(),
            display_name: None,
            bot: false,
        }
    }

    fn member(u: User, roles: &[&str]) -> Member {
        Member {
            user: u,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn manager(platform: &Arc<FakePlatform>) -> (TicketManager, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.counter_file = dir.path().join("counter.json");
        config.transcript_dir = dir.path().join("transcripts");
        let manager = TicketManager::new(
            Arc::clone(platform) as Arc<dyn PlatformClient>,
            Arc::new(config),
        );
        (manager, dir)
    }

    #[test]
    fn channel_names_are_lowercase_normalized() {
        assert_eq!(channel_name_for("Alice"), "seg-alice");
        assert_eq!(channel_name_for("BOB"), "seg-bob");
        assert!(is_ticket_channel("seg-alice"));
        assert!(!is_ticket_channel("general"));
    }

    #[tokio::test]
    async fn duplicate_open_is_rejected_with_existing_channel() {
        let platform = FakePlatform::with_guild();
        platform.add_text_channel("seg-alice", None).await;
        let (manager, _dir) = manager(&platform);

        let err = assert_err!(manager.request_open("guild", &user("10", "Alice")).await);
        match err {
            TicketError::DuplicateTicket(id) => {
                assert!(!id.is_empty());
            }
            other => panic!("expected duplicate error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn open_without_category_fails_validation() {
        let platform = FakePlatform::with_guild();
        let (manager, _dir) = manager(&platform);

        let err = assert_err!(manager.open("guild", &user("10", "alice"), "help", 500).await);
        assert!(matches!(err, TicketError::MissingCategory(_)));
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn open_creates_channel_with_overwrites_and_welcome() {
        let platform = FakePlatform::with_guild();
        platform.add_category("cat-1").await;
        platform.add_role("staff-1", "Staff").await;
        platform.add_role("200", "Security").await;
        let (manager, _dir) = manager(&platform);

        let opened = assert_ok!(
            manager
                .open("guild", &user("10", "Alice"), "spam report", 500)
                .await
        );

        assert_eq!(opened.state, TicketState::Open);
        assert_eq!(opened.channel.name, "seg-alice");
        assert_eq!(opened.channel.parent_id.as_deref(), Some("cat-1"));
        let topic = opened.channel.topic.clone().unwrap();
        assert!(topic.contains(&format!("#{}", opened.number)));
        assert!(topic.contains("Alice"));
        assert!(topic.contains("spam report"));

        let overwrites = platform.channel_overwrites(&opened.channel.id).await;
        let everyone = overwrites
            .iter()
            .find(|o| o.target == OverwriteTarget::Role("guild".to_string()))
            .expect("everyone overwrite");
        assert!(everyone.deny.contains(&Permission::ViewChannel));

        let requester = overwrites
            .iter()
            .find(|o| o.target == OverwriteTarget::Member("10".to_string()))
            .expect("requester overwrite");
        assert!(requester.allow.contains(&Permission::SendMessages));
        assert!(!requester.allow.contains(&Permission::ManageChannels));

        let staff = overwrites
            .iter()
            .find(|o| o.target == OverwriteTarget::Role("staff-1".to_string()))
            .expect("staff overwrite");
        assert!(staff.allow.contains(&Permission::ManageChannels));

        assert!(overwrites
            .iter()
            .any(|o| o.target == OverwriteTarget::Role("200".to_string())));

        let messages = platform.channel_messages(&opened.channel.id).await;
        assert_eq!(messages.len(), 1);
        let welcome = &messages[0];
        assert!(welcome.content.as_deref().unwrap_or("").contains("<@10>"));
        assert!(welcome.embeds[0]
            .fields
            .iter()
            .any(|f| f.value == "spam report"));
        assert_eq!(welcome.buttons[0].custom_id, ui::CLOSE_BUTTON_ID);
    }

    #[tokio::test]
    async fn reason_length_is_capped() {
        let platform = FakePlatform::with_guild();
        platform.add_category("cat-1").await;
        let (manager, _dir) = manager(&platform);

        let long = "x".repeat(201);
        let err = assert_err!(manager.open("guild", &user("10", "alice"), &long, 200).await);
        assert!(matches!(err, TicketError::ReasonTooLong { len: 201, max: 200 }));
    }

    #[tokio::test]
    async fn staff_predicate_accepts_any_of_the_three_grounds() {
        let platform = FakePlatform::with_guild();
        platform.add_role("sup-1", "Security").await;
        let channel = platform.add_text_channel("seg-alice", None).await;
        let (manager, _dir) = manager(&platform);

        // Configured staff role id.
        assert!(manager
            .is_staff("guild", &channel.id, &member(user("1", "a"), &["staff-1"]))
            .await
            .unwrap());

        // Support role by name.
        assert!(manager
            .is_staff("guild", &channel.id, &member(user("2", "b"), &["sup-1"]))
            .await
            .unwrap());

        // Channel-level manage-channels permission.
        platform
            .grant_channel_permission(&channel.id, "3", Permission::ManageChannels)
            .await;
        assert!(manager
            .is_staff("guild", &channel.id, &member(user("3", "c"), &[]))
            .await
            .unwrap());

        // None of the three.
        assert!(!manager
            .is_staff("guild", &channel.id, &member(user("4", "d"), &["other"]))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn close_by_non_staff_is_rejected() {
        let platform = FakePlatform::with_guild();
        let channel = platform.add_text_channel("seg-alice", None).await;
        let (manager, _dir) = manager(&platform);

        let err = assert_err!(
            manager
                .close("guild", &channel, &member(user("4", "d"), &[]), "done")
                .await
        );
        assert!(err.is_authorization());
        assert!(platform.channel_messages(&channel.id).await.is_empty());
        assert!(platform.deleted_channels().await.is_empty());
    }

    #[tokio::test]
    async fn close_outside_ticket_channel_is_wrong_channel_type() {
        let platform = FakePlatform::with_guild();
        let channel = platform.add_text_channel("general", None).await;
        let (manager, _dir) = manager(&platform);

        let err = assert_err!(
            manager
                .close("guild", &channel, &member(user("1", "a"), &["staff-1"]), "x")
                .await
        );
        assert!(matches!(err, TicketError::WrongChannelType));
    }

    #[tokio::test]
    async fn cancel_pending_delete_aborts_the_timer() {
        let platform = FakePlatform::with_guild();
        let (manager, _dir) = manager(&platform);

        manager.schedule_delete("77".to_string(), "test".to_string());
        assert!(manager.has_pending_delete("77"));
        assert!(manager.cancel_pending_delete("77"));
        assert!(!manager.has_pending_delete("77"));
        assert!(!manager.cancel_pending_delete("77"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(platform.deleted_channels().await.is_empty());
    }

    #[tokio::test]
    async fn cleanup_deletes_only_stale_ticket_channels() {
        let platform = FakePlatform::with_guild();
        let stale = platform.add_text_channel("seg-old", None).await;
        let fresh = platform.add_text_channel("seg-new", None).await;
        let empty = platform.add_text_channel("seg-empty", None).await;
        let other = platform.add_text_channel("general", None).await;

        let (manager, _dir) = manager(&platform);
        platform
            .add_message_at(&stale.id, "bye", Utc::now() - chrono::Duration::hours(200))
            .await;
        platform
            .add_message_at(&fresh.id, "hi", Utc::now() - chrono::Duration::hours(2))
            .await;
        platform
            .add_message_at(&other.id, "hello", Utc::now() - chrono::Duration::hours(500))
            .await;

        let deleted = manager
            .cleanup_stale("guild", DEFAULT_MAX_AGE_HOURS)
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        let deleted_ids: Vec<String> = platform
            .deleted_channels()
            .await
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(deleted_ids, vec![stale.id.clone()]);
        assert!(!deleted_ids.contains(&fresh.id));
        assert!(!deleted_ids.contains(&empty.id));
        assert!(!deleted_ids.contains(&other.id));
    }
}
