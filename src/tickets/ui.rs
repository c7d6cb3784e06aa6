//! Embeds, buttons and modal forms for the ticket flows. Component ids here
//! are the contract between what the bot posts and what the dispatch layer
//! receives back.

use crate::platform::{
    Button, ButtonStyle, Channel, Embed, EmbedField, ModalDefinition, OutboundMessage, TextInput,
    TextInputStyle, User,
};
use chrono::{DateTime, Utc};

pub const PANEL_BUTTON_ID: &str = "create_ticket_panel";
pub const CLOSE_BUTTON_ID: &str = "close_ticket";
pub const TICKET_MODAL_ID: &str = "ticket_reason_modal";
pub const TICKET_REASON_INPUT: &str = "ticket_reason";
pub const CLOSE_MODAL_ID: &str = "close_ticket_modal";
pub const CLOSE_REASON_INPUT: &str = "close_reason";

/// Reason length cap for the modal flow.
pub const MODAL_REASON_MAX: usize = 500;
/// Reason length cap for the slash-command flow.
pub const COMMAND_REASON_MAX: usize = 200;

pub const COLOR_ERROR: u32 = 0xFF0000;
pub const COLOR_SUCCESS: u32 = 0x00FF00;
pub const COLOR_CLOSING: u32 = 0xFFA500;
pub const COLOR_PANEL: u32 = 0xFF6B35;
pub const COLOR_LOG: u32 = 0xFF6B6B;

pub fn panel_message() -> OutboundMessage {
    OutboundMessage {
        embeds: vec![Embed {
            title: Some("Security Desk".to_string()),
            description: Some(
                "Need to report something to the security team? Click the \
                 button below.\n\n**How it works:**\n- Click \"Open Ticket\"\n\
                 - Describe the issue and wait, the team will get back to you\n\
                 - Only the security team can see your ticket"
                    .to_string(),
            ),
            color: Some(COLOR_PANEL),
            fields: vec![
                EmbedField {
                    name: "Access".to_string(),
                    value: "Staff only".to_string(),
                    inline: true,
                },
                EmbedField {
                    name: "Category".to_string(),
                    value: "Security".to_string(),
                    inline: true,
                },
            ],
            footer: Some("Security desk - confidential".to_string()),
            ..Default::default()
        }],
        buttons: vec![Button {
            custom_id: PANEL_BUTTON_ID.to_string(),
            label: "Open Ticket".to_string(),
            style: ButtonStyle::Danger,
        }],
        ..Default::default()
    }
}

pub fn ticket_reason_modal() -> ModalDefinition {
    ModalDefinition {
        custom_id: TICKET_MODAL_ID.to_string(),
        title: "Open Security Ticket".to_string(),
        inputs: vec![TextInput {
            custom_id: TICKET_REASON_INPUT.to_string(),
            label: "Reason".to_string(),
            style: TextInputStyle::Paragraph,
            placeholder: Some("Describe what you want to report...".to_string()),
            required: true,
            max_length: Some(MODAL_REASON_MAX as u16),
        }],
    }
}

pub fn close_reason_modal() -> ModalDefinition {
    ModalDefinition {
        custom_id: CLOSE_MODAL_ID.to_string(),
        title: "Close Ticket".to_string(),
        inputs: vec![TextInput {
            custom_id: CLOSE_REASON_INPUT.to_string(),
            label: "Close reason".to_string(),
            style: TextInputStyle::Paragraph,
            placeholder: Some("Why is this ticket being closed?".to_string()),
            required: true,
            max_length: Some(MODAL_REASON_MAX as u16),
        }],
    }
}

pub fn welcome_message(user: &User, ticket_number: u64, reason: &str) -> OutboundMessage {
    OutboundMessage {
        content: Some(user.mention()),
        embeds: vec![Embed {
            title: Some(format!("Security Ticket #{ticket_number}")),
            description: Some(format!(
                "Hello {}! Your ticket has been created.",
                user.mention()
            )),
            color: Some(COLOR_PANEL),
            fields: vec![
                EmbedField {
                    name: "Report".to_string(),
                    value: reason.to_string(),
                    inline: false,
                },
                EmbedField {
                    name: "Confidentiality".to_string(),
                    value: "This channel is private. Only you and the security team have access."
                        .to_string(),
                    inline: false,
                },
                EmbedField {
                    name: "Important".to_string(),
                    value: "Only staff members can close this ticket.".to_string(),
                    inline: false,
                },
            ],
            footer: Some("The security team has been notified".to_string()),
            ..Default::default()
        }],
        buttons: vec![Button {
            custom_id: CLOSE_BUTTON_ID.to_string(),
            label: "Close Ticket (Staff Only)".to_string(),
            style: ButtonStyle::Danger,
        }],
        ..Default::default()
    }
}

pub fn open_confirmation(channel: &Channel, ticket_number: u64, reason: &str) -> Embed {
    Embed {
        title: Some("Ticket Created".to_string()),
        description: Some(format!("Your ticket has been created: <#{}>", channel.id)),
        color: Some(COLOR_SUCCESS),
        fields: vec![
            EmbedField {
                name: "Ticket Number".to_string(),
                value: format!("#{ticket_number}"),
                inline: true,
            },
            EmbedField {
                name: "Reason".to_string(),
                value: reason.to_string(),
                inline: true,
            },
        ],
        ..Default::default()
    }
}

pub fn closing_confirmation(reason: &str) -> Embed {
    Embed {
        title: Some("Closing Ticket".to_string()),
        description: Some("Generating transcript and closing this ticket...".to_string()),
        color: Some(COLOR_CLOSING),
        fields: vec![EmbedField {
            name: "Close Reason".to_string(),
            value: reason.to_string(),
            inline: false,
        }],
        ..Default::default()
    }
}

pub fn close_log_embed(
    channel_name: &str,
    closed_by: &User,
    reason: &str,
    closed_at: DateTime<Utc>,
) -> Embed {
    Embed {
        title: Some("Security Ticket Closed".to_string()),
        description: Some(format!("Ticket **{channel_name}** was closed")),
        color: Some(COLOR_LOG),
        fields: vec![
            EmbedField {
                name: "Closed by".to_string(),
                value: closed_by.mention(),
                inline: true,
            },
            EmbedField {
                name: "Date".to_string(),
                value: format!("<t:{}:F>", closed_at.timestamp()),
                inline: true,
            },
            EmbedField {
                name: "Channel".to_string(),
                value: format!("#{channel_name}"),
                inline: true,
            },
            EmbedField {
                name: "Close Reason".to_string(),
                value: reason.to_string(),
                inline: false,
            },
        ],
        ..Default::default()
    }
}

pub fn user_added(user: &User) -> Embed {
    Embed {
        title: Some("User Added".to_string()),
        description: Some(format!("{} has been added to this ticket.", user.mention())),
        color: Some(COLOR_SUCCESS),
        ..Default::default()
    }
}

pub fn user_removed(user: &User) -> Embed {
    Embed {
        title: Some("User Removed".to_string()),
        description: Some(format!(
            "{} has been removed from this ticket.",
            user.mention()
        )),
        color: Some(COLOR_SUCCESS),
        ..Default::default()
    }
}

pub fn error_embed(title: &str, description: &str) -> Embed {
    Embed {
        title: Some(title.to_string()),
        description: Some(description.to_string()),
        color: Some(COLOR_ERROR),
        ..Default::default()
    }
}

pub fn rate_limited_embed() -> Embed {
    error_embed(
        "Slow Down",
        "You are doing that too often. Please wait a moment and try again.",
    )
}
