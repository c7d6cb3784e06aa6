//! Interaction dispatch. Gateway adapters translate platform events into
//! [`Interaction`] values; the handler routes them to the ticket manager and
//! returns an [`InteractionResponse`] for the adapter to render.

use crate::config::AppConfig;
use crate::platform::{Channel, Embed, Member, ModalDefinition, PlatformClient};
use crate::rate_limit::InteractionLimiter;
use crate::tickets::{self, ui, TicketError, TicketManager};
use log::{error, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

pub const PANEL_COMMAND: &str = "panel";
pub const TICKET_COMMAND: &str = "ticket";

const DEFAULT_CLOSE_REASON: &str = "No reason provided";

/// Where an interaction happened and who triggered it.
#[derive(Debug, Clone)]
pub struct InteractionContext {
    pub guild_id: String,
    pub channel: Channel,
    pub member: Member,
}

#[derive(Debug, Clone)]
pub enum Interaction {
    /// Slash command, optionally with a subcommand and named options.
    Command {
        name: String,
        sub: Option<String>,
        options: HashMap<String, String>,
        ctx: InteractionContext,
    },
    Button {
        custom_id: String,
        ctx: InteractionContext,
    },
    ModalSubmit {
        custom_id: String,
        values: HashMap<String, String>,
        ctx: InteractionContext,
    },
}

impl Interaction {
    fn ctx(&self) -> &InteractionContext {
        match self {
            Self::Command { ctx, .. } | Self::Button { ctx, .. } | Self::ModalSubmit { ctx, .. } => {
                ctx
            }
        }
    }
}

#[derive(Debug)]
pub enum InteractionResponse {
    Reply { embeds: Vec<Embed>, ephemeral: bool },
    Modal(ModalDefinition),
    None,
}

impl InteractionResponse {
    fn ephemeral(embed: Embed) -> Self {
        Self::Reply {
            embeds: vec![embed],
            ephemeral: true,
        }
    }
}

/// Routes interactions to the ticket lifecycle. Buttons and modal submits go
/// through the per-user limiter; top-level commands do not.
///
/// Construction starts the limiter's periodic sweep; the task is aborted
/// when the handler is dropped.
pub struct BotHandler {
    platform: Arc<dyn PlatformClient>,
    manager: TicketManager,
    limiter: Arc<InteractionLimiter>,
    config: Arc<AppConfig>,
    sweeper: tokio::task::JoinHandle<()>,
}

impl BotHandler {
    /// Must be called from within a tokio runtime.
    pub fn new(
        platform: Arc<dyn PlatformClient>,
        manager: TicketManager,
        limiter: Arc<InteractionLimiter>,
        config: Arc<AppConfig>,
    ) -> Self {
        let sweeper = limiter.spawn_sweeper();
        Self {
            platform,
            manager,
            limiter,
            config,
            sweeper,
        }
    }

    pub async fn handle(&self, interaction: Interaction) -> InteractionResponse {
        if matches!(
            interaction,
            Interaction::Button { .. } | Interaction::ModalSubmit { .. }
        ) {
            let user_id = &interaction.ctx().member.user.id;
            if !self.limiter.admit(user_id).await {
                info!("rate limited interaction from user {user_id}");
                return InteractionResponse::ephemeral(ui::rate_limited_embed());
            }
        }

        match interaction {
            Interaction::Command {
                name,
                sub,
                options,
                ctx,
            } => self.handle_command(&name, sub.as_deref(), &options, &ctx).await,
            Interaction::Button { custom_id, ctx } => self.handle_button(&custom_id, &ctx).await,
            Interaction::ModalSubmit {
                custom_id,
                values,
                ctx,
            } => self.handle_modal(&custom_id, &values, &ctx).await,
        }
    }

    async fn handle_command(
        &self,
        name: &str,
        sub: Option<&str>,
        options: &HashMap<String, String>,
        ctx: &InteractionContext,
    ) -> InteractionResponse {
        match (name, sub) {
            (PANEL_COMMAND, _) => self.post_panel(ctx).await,
            (TICKET_COMMAND, Some("create")) => {
                // The create reason is a required option; only closes have a
                // fallback reason.
                let Some(reason) = options.get("reason") else {
                    return InteractionResponse::ephemeral(ui::error_embed(
                        "Missing Reason",
                        "Please describe what you want to report.",
                    ));
                };
                self.open_ticket(ctx, reason, ui::COMMAND_REASON_MAX).await
            }
            (TICKET_COMMAND, Some("close")) => {
                let reason = options
                    .get("reason")
                    .map(String::as_str)
                    .unwrap_or(DEFAULT_CLOSE_REASON);
                self.close_ticket(ctx, reason).await
            }
            (TICKET_COMMAND, Some("add")) => self.change_access(ctx, options, true).await,
            (TICKET_COMMAND, Some("remove")) => self.change_access(ctx, options, false).await,
            _ => {
                warn!("unhandled command {name} (sub: {sub:?})");
                InteractionResponse::None
            }
        }
    }

    async fn handle_button(&self, custom_id: &str, ctx: &InteractionContext) -> InteractionResponse {
        match custom_id {
            ui::PANEL_BUTTON_ID => {
                match self
                    .manager
                    .request_open(&ctx.guild_id, &ctx.member.user)
                    .await
                {
                    Ok(_) => InteractionResponse::Modal(ui::ticket_reason_modal()),
                    Err(err) => self.error_response(err),
                }
            }
            ui::CLOSE_BUTTON_ID => {
                if !tickets::is_ticket_channel(&ctx.channel.name) {
                    return self.error_response(TicketError::WrongChannelType);
                }
                match self
                    .manager
                    .is_staff(&ctx.guild_id, &ctx.channel.id, &ctx.member)
                    .await
                {
                    Ok(true) => InteractionResponse::Modal(ui::close_reason_modal()),
                    Ok(false) => self.error_response(TicketError::NotStaff),
                    Err(err) => self.error_response(err.into()),
                }
            }
            other => {
                warn!("unhandled button {other}");
                InteractionResponse::None
            }
        }
    }

    async fn handle_modal(
        &self,
        custom_id: &str,
        values: &HashMap<String, String>,
        ctx: &InteractionContext,
    ) -> InteractionResponse {
        match custom_id {
            ui::TICKET_MODAL_ID => {
                let Some(reason) = values.get(ui::TICKET_REASON_INPUT) else {
                    return InteractionResponse::ephemeral(ui::error_embed(
                        "Missing Reason",
                        "Please describe what you want to report.",
                    ));
                };
                self.open_ticket(ctx, reason, ui::MODAL_REASON_MAX).await
            }
            ui::CLOSE_MODAL_ID => {
                let reason = values
                    .get(ui::CLOSE_REASON_INPUT)
                    .map(String::as_str)
                    .unwrap_or(DEFAULT_CLOSE_REASON);
                self.close_ticket(ctx, reason).await
            }
            other => {
                warn!("unhandled modal {other}");
                InteractionResponse::None
            }
        }
    }

    /// Post the ticket panel into the invoking channel. Only allowed in the
    /// configured panel channel or inside a recognized security category.
    async fn post_panel(&self, ctx: &InteractionContext) -> InteractionResponse {
        let in_panel_channel = ctx.channel.id == self.config.panel_channel_id;
        let in_security_category = ctx
            .channel
            .parent_id
            .as_ref()
            .is_some_and(|parent| self.config.security_categories.contains(parent));
        if !in_panel_channel && !in_security_category {
            return InteractionResponse::ephemeral(ui::error_embed(
                "Wrong Channel",
                &format!(
                    "The panel can only be posted in <#{}> or a security category.",
                    self.config.panel_channel_id
                ),
            ));
        }

        match self
            .platform
            .send_message(&ctx.channel.id, ui::panel_message())
            .await
        {
            Ok(_) => {
                info!("panel posted in channel {}", ctx.channel.id);
                InteractionResponse::ephemeral(Embed {
                    title: Some("Panel Posted".to_string()),
                    description: Some("The ticket panel is live in this channel.".to_string()),
                    color: Some(ui::COLOR_SUCCESS),
                    ..Default::default()
                })
            }
            Err(err) => self.error_response(err.into()),
        }
    }

    async fn open_ticket(
        &self,
        ctx: &InteractionContext,
        reason: &str,
        max_reason: usize,
    ) -> InteractionResponse {
        match self
            .manager
            .open(&ctx.guild_id, &ctx.member.user, reason, max_reason)
            .await
        {
            Ok(opened) => InteractionResponse::ephemeral(ui::open_confirmation(
                &opened.channel,
                opened.number,
                reason,
            )),
            Err(err) => self.error_response(err),
        }
    }

    async fn close_ticket(&self, ctx: &InteractionContext, reason: &str) -> InteractionResponse {
        match self
            .manager
            .close(&ctx.guild_id, &ctx.channel, &ctx.member, reason)
            .await
        {
            Ok(_) => InteractionResponse::ephemeral(ui::closing_confirmation(reason)),
            Err(err) => self.error_response(err),
        }
    }

    async fn change_access(
        &self,
        ctx: &InteractionContext,
        options: &HashMap<String, String>,
        add: bool,
    ) -> InteractionResponse {
        let Some(target_id) = options.get("user") else {
            return InteractionResponse::ephemeral(ui::error_embed(
                "Missing User",
                "Please specify which user to update.",
            ));
        };

        let target = match self.platform.member(&ctx.guild_id, target_id).await {
            Ok(member) => member.user,
            Err(err) => return self.error_response(err.into()),
        };

        let result = if add {
            self.manager
                .add_user(&ctx.guild_id, &ctx.channel, &ctx.member, &target)
                .await
        } else {
            self.manager
                .remove_user(&ctx.guild_id, &ctx.channel, &ctx.member, &target)
                .await
        };

        match result {
            Ok(()) => {
                let embed = if add {
                    ui::user_added(&target)
                } else {
                    ui::user_removed(&target)
                };
                InteractionResponse::Reply {
                    embeds: vec![embed],
                    ephemeral: false,
                }
            }
            Err(err) => self.error_response(err),
        }
    }

    fn error_response(&self, err: TicketError) -> InteractionResponse {
        let embed = match &err {
            TicketError::DuplicateTicket(channel_id) => ui::error_embed(
                "Ticket Already Open",
                &format!("You already have an open ticket: <#{channel_id}>"),
            ),
            TicketError::ReasonTooLong { len, max } => ui::error_embed(
                "Reason Too Long",
                &format!("Your reason is {len} characters; the maximum is {max}."),
            ),
            TicketError::MissingCategory(_) => ui::error_embed(
                "Configuration Error",
                "The ticket category is missing. Please contact an administrator.",
            ),
            TicketError::WrongChannelType => ui::error_embed(
                "Wrong Channel",
                "This action can only be used in ticket channels.",
            ),
            TicketError::NotStaff => ui::error_embed(
                "Staff Only",
                "Only staff members can manage security tickets.",
            ),
            TicketError::Platform(platform_err) => {
                error!("platform error during interaction: {platform_err}");
                ui::error_embed(
                    "Something Went Wrong",
                    "The request could not be completed. Please try again later.",
                )
            }
        };
        InteractionResponse::ephemeral(embed)
    }
}

impl Drop for BotHandler {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}
