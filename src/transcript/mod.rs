use crate::platform::{Channel, Message, PlatformClient, PlatformError, User};
use chrono::{DateTime, Utc};
use log::debug;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Messages per history page.
const MESSAGES_PER_FETCH: u8 = 100;
/// Hard cap on history pages, bounding a transcript to 5000 messages.
const MAX_FETCHES: usize = 50;
/// Pause inserted after every 10th page to stay under platform rate limits.
const FETCH_PAUSE: Duration = Duration::from_millis(100);

const DEFAULT_EMBED_BORDER: &str = "#202225";
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Collects a ticket channel's full history and renders it as a single
/// self-contained HTML document.
pub struct TranscriptGenerator {
    platform: Arc<dyn PlatformClient>,
    out_dir: PathBuf,
}

impl TranscriptGenerator {
    pub fn new(platform: Arc<dyn PlatformClient>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            platform,
            out_dir: out_dir.into(),
        }
    }

    /// Page backward through the channel history, then render. The returned
    /// document is deterministic for a given message list and close time.
    pub async fn generate(
        &self,
        channel: &Channel,
        guild_name: &str,
        closed_by: &User,
    ) -> Result<String, PlatformError> {
        let messages = self.collect_messages(&channel.id).await?;
        debug!(
            "rendering transcript for #{} ({} messages)",
            channel.name,
            messages.len()
        );
        Ok(render(channel, guild_name, &messages, closed_by, Utc::now()))
    }

    async fn collect_messages(&self, channel_id: &str) -> Result<Vec<Message>, PlatformError> {
        let mut messages: Vec<Message> = Vec::new();
        let mut before: Option<String> = None;

        for fetch_count in 1..=MAX_FETCHES {
            let batch = self
                .platform
                .fetch_messages(channel_id, MESSAGES_PER_FETCH, before.as_deref())
                .await?;
            if batch.is_empty() {
                break;
            }

            // Batches arrive newest first; the last entry is the oldest and
            // becomes the exclusive cursor for the next page.
            before = batch.last().map(|m| m.id.clone());
            messages.extend(batch);

            if fetch_count % 10 == 0 {
                tokio::time::sleep(FETCH_PAUSE).await;
            }
        }

        // Stable sort: source order is batch-reversed.
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    /// Write the document under the transcript directory, creating it if
    /// needed. The file name embeds the channel name and a millisecond
    /// timestamp, so concurrent saves do not collide.
    pub async fn save(&self, html: &str, channel_name: &str) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.out_dir).await?;
        let file_name = format!(
            "transcript-{}-{}.html",
            channel_name,
            Utc::now().timestamp_millis()
        );
        let path = self.out_dir.join(file_name);
        tokio::fs::write(&path, html).await?;
        Ok(path)
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

/// Escape the five HTML-significant characters. Applied to every piece of
/// user-supplied text before insertion; nothing else in the document is
/// escaped.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn render_message(out: &mut String, message: &Message) {
    let author_name = escape_html(message.author.display_name());
    let timestamp = message.timestamp.format(TIMESTAMP_FORMAT);
    let class = if message.author.bot {
        "bot-message"
    } else {
        "user-message"
    };

    let _ = write!(out, "\n        <div class=\"message {class}\">");
    let _ = write!(out, "\n            <div class=\"message-header\">");
    let _ = write!(out, "<span class=\"author-name\">{author_name}</span>");
    if message.author.bot {
        out.push_str("<span class=\"bot-tag\">BOT</span>");
    }
    let _ = write!(out, "<span class=\"timestamp\">{timestamp}</span></div>");

    if !message.content.is_empty() {
        let _ = write!(
            out,
            "\n            <div class=\"message-content\">{}</div>",
            escape_html(&message.content)
        );
    }

    for embed in &message.embeds {
        let border = embed
            .color
            .map(|c| format!("#{:06x}", c & 0xFF_FF_FF))
            .unwrap_or_else(|| DEFAULT_EMBED_BORDER.to_string());
        let _ = write!(
            out,
            "\n            <div class=\"embed\" style=\"border-left-color: {border};\">"
        );
        if let Some(title) = &embed.title {
            let _ = write!(
                out,
                "<div class=\"embed-title\">{}</div>",
                escape_html(title)
            );
        }
        if let Some(description) = &embed.description {
            let _ = write!(
                out,
                "<div class=\"embed-description\">{}</div>",
                escape_html(description)
            );
        }
        for field in &embed.fields {
            let _ = write!(
                out,
                "<div class=\"embed-field\"><div class=\"embed-field-name\">{}</div><div class=\"embed-field-value\">{}</div></div>",
                escape_html(&field.name),
                escape_html(&field.value)
            );
        }
        out.push_str("</div>");
    }

    for attachment in &message.attachments {
        if attachment.is_image() {
            let _ = write!(
                out,
                "\n            <div class=\"attachment\"><img src=\"{}\" alt=\"{}\"></div>",
                escape_html(&attachment.url),
                escape_html(&attachment.filename)
            );
        } else {
            let _ = write!(
                out,
                "\n            <div class=\"attachment attachment-file\"><a href=\"{}\">{}</a></div>",
                escape_html(&attachment.url),
                escape_html(&attachment.filename)
            );
        }
    }

    out.push_str("\n        </div>");
}

/// Pure renderer. Output is byte-identical for identical inputs; only the
/// `closed_at` argument and the channel creation time feed wall-clock text.
pub fn render(
    channel: &Channel,
    guild_name: &str,
    messages: &[Message],
    closed_by: &User,
    closed_at: DateTime<Utc>,
) -> String {
    let channel_name = escape_html(&channel.name);
    let guild = escape_html(guild_name);
    let created_at = channel
        .created_at()
        .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string());
    let closed_at = closed_at.format(TIMESTAMP_FORMAT).to_string();
    let closed_by_name = escape_html(closed_by.display_name());

    let mut body = String::new();
    for message in messages {
        render_message(&mut body, message);
    }
    if body.is_empty() {
        body.push_str("\n        <div class=\"empty\">No messages found</div>");
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Transcript - {channel_name}</title>
    <style>
        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            background-color: #36393f;
            color: #dcddde;
            margin: 0;
            padding: 20px;
            line-height: 1.6;
        }}
        .container {{
            max-width: 800px;
            margin: 0 auto;
            background: #2f3136;
            border-radius: 8px;
            overflow: hidden;
        }}
        .header {{
            background: linear-gradient(90deg, #5865f2, #3ba55c);
            padding: 24px;
            text-align: center;
        }}
        .header h1 {{
            margin: 0;
            color: white;
            font-size: 24px;
        }}
        .header .info {{
            margin-top: 12px;
            color: rgba(255, 255, 255, 0.8);
            font-size: 14px;
        }}
        .content {{
            padding: 24px;
        }}
        .ticket-info {{
            background: #40444b;
            padding: 16px;
            border-radius: 8px;
            margin-bottom: 24px;
            border-left: 4px solid #5865f2;
        }}
        .ticket-info h3 {{
            margin: 0 0 12px 0;
            color: #ffffff;
        }}
        .info-grid {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
            gap: 12px;
        }}
        .info-item {{
            background: #36393f;
            padding: 12px;
            border-radius: 4px;
        }}
        .info-label {{
            font-size: 12px;
            color: #72767d;
            text-transform: uppercase;
            font-weight: bold;
            margin-bottom: 4px;
        }}
        .info-value {{
            color: #ffffff;
            font-weight: 500;
        }}
        .messages {{
            background: #40444b;
            border-radius: 8px;
            padding: 16px;
        }}
        .messages h3 {{
            margin: 0 0 16px 0;
            color: #ffffff;
            border-bottom: 2px solid #5865f2;
            padding-bottom: 8px;
        }}
        .message {{
            border-bottom: 1px solid #2f3136;
            padding: 12px 0;
        }}
        .message:last-child {{
            border-bottom: none;
        }}
        .message-header {{
            display: flex;
            align-items: center;
            margin-bottom: 4px;
        }}
        .author-name {{
            font-weight: bold;
            color: #ffffff;
            margin-right: 8px;
        }}
        .bot-message .author-name {{
            color: #5865f2;
        }}
        .bot-tag {{
            background: #5865f2;
            color: white;
            font-size: 10px;
            padding: 2px 4px;
            border-radius: 3px;
            margin-right: 8px;
        }}
        .timestamp {{
            color: #72767d;
            font-size: 12px;
        }}
        .message-content {{
            color: #dcddde;
            white-space: pre-wrap;
            word-wrap: break-word;
            margin-top: 4px;
        }}
        .embed {{
            border-left: 4px solid #202225;
            background: #2f3136;
            padding: 12px;
            margin: 8px 0;
            border-radius: 4px;
        }}
        .embed-title {{
            font-weight: bold;
            color: #ffffff;
            margin-bottom: 8px;
        }}
        .embed-description {{
            color: #dcddde;
        }}
        .embed-field {{
            margin: 8px 0;
        }}
        .embed-field-name {{
            font-weight: bold;
            color: #ffffff;
            font-size: 14px;
        }}
        .embed-field-value {{
            color: #dcddde;
        }}
        .attachment img {{
            max-width: 400px;
            border-radius: 4px;
            margin: 8px 0;
        }}
        .attachment-file {{
            background: #2f3136;
            padding: 8px;
            border-radius: 4px;
            margin: 8px 0;
        }}
        .attachment-file a {{
            color: #00b0f4;
            text-decoration: none;
        }}
        .empty {{
            color: #72767d;
            text-align: center;
            padding: 20px;
        }}
        .footer {{
            background: #2f3136;
            padding: 16px 24px;
            text-align: center;
            border-top: 1px solid #40444b;
            color: #72767d;
            font-size: 12px;
        }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Ticket Transcript</h1>
            <div class="info">Server: {guild} &bull; Channel: #{channel_name}</div>
        </div>
        <div class="content">
            <div class="ticket-info">
                <h3>Ticket Information</h3>
                <div class="info-grid">
                    <div class="info-item">
                        <div class="info-label">Channel</div>
                        <div class="info-value">#{channel_name}</div>
                    </div>
                    <div class="info-item">
                        <div class="info-label">Server</div>
                        <div class="info-value">{guild}</div>
                    </div>
                    <div class="info-item">
                        <div class="info-label">Created at</div>
                        <div class="info-value">{created_at}</div>
                    </div>
                    <div class="info-item">
                        <div class="info-label">Closed at</div>
                        <div class="info-value">{closed_at}</div>
                    </div>
                    <div class="info-item">
                        <div class="info-label">Closed by</div>
                        <div class="info-value">{closed_by_name}</div>
                    </div>
                    <div class="info-item">
                        <div class="info-label">Total messages</div>
                        <div class="info-value">{message_count}</div>
                    </div>
                </div>
            </div>
            <div class="messages">
                <h3>Conversation</h3>{body}
            </div>
        </div>
        <div class="footer">
            Transcript generated automatically by the ticket system &bull; {closed_at}
        </div>
    </div>
</body>
</html>"#,
        message_count = messages.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Attachment, Embed, EmbedField};
    use chrono::TimeZone;

    fn user(name: &str, bot: bool) -> User {
        User {
            id: "1".to_string(),
            username: name.to_string(),
            display_name: None,
            bot,
        }
    }

    fn message(id: &str, author: &str, content: &str, secs: i64) -> Message {
        Message {
            id: id.to_string(),
            author: user(author, false),
            content: content.to_string(),
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            embeds: vec![],
            attachments: vec![],
        }
    }

    fn channel() -> Channel {
        Channel {
            id: "175928847299117063".to_string(),
            name: "seg-alice".to_string(),
            kind: crate::platform::ChannelKind::Text,
            parent_id: None,
            topic: None,
        }
    }

    #[test]
    fn escapes_exactly_the_five_characters() {
        assert_eq!(
            escape_html(r#"<script>&"'"#),
            "&lt;script&gt;&amp;&quot;&#039;"
        );
        assert_eq!(escape_html("plain / text %"), "plain / text %");
    }

    #[test]
    fn render_is_deterministic() {
        let messages = vec![
            message("1", "alice", "hello", 100),
            message("2", "bob", "hi there", 200),
        ];
        let closed_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let a = render(&channel(), "Guild", &messages, &user("staff", false), closed_at);
        let b = render(&channel(), "Guild", &messages, &user("staff", false), closed_at);
        assert_eq!(a, b);
    }

    #[test]
    fn messages_appear_in_ascending_timestamp_order() {
        let messages = vec![
            message("1", "first", "m1", 100),
            message("2", "second", "m2", 200),
            message("3", "third", "m3", 300),
        ];
        let closed_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let html = render(&channel(), "Guild", &messages, &user("staff", false), closed_at);

        let p1 = html.find("first").unwrap();
        let p2 = html.find("second").unwrap();
        let p3 = html.find("third").unwrap();
        assert!(p1 < p2 && p2 < p3);
    }

    #[test]
    fn malicious_content_cannot_inject_markup() {
        let messages = vec![message("1", "alice", r#"<script>alert('x')&"</script>"#, 100)];
        let closed_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let html = render(&channel(), "Guild", &messages, &user("staff", false), closed_at);

        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;alert(&#039;x&#039;)&amp;&quot;&lt;/script&gt;"));
    }

    #[test]
    fn bot_authors_get_the_bot_tag() {
        let mut msg = message("1", "helper", "automated notice", 100);
        msg.author = user("helper", true);
        let closed_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let html = render(&channel(), "Guild", &[msg], &user("staff", false), closed_at);

        assert!(html.contains("bot-message"));
        assert!(html.contains("<span class=\"bot-tag\">BOT</span>"));
    }

    #[test]
    fn embeds_and_attachments_are_rendered() {
        let mut msg = message("1", "alice", "", 100);
        msg.embeds.push(Embed {
            title: Some("Report".to_string()),
            description: Some("details & more".to_string()),
            color: Some(0xFF6B35),
            fields: vec![EmbedField {
                name: "Reason".to_string(),
                value: "spam".to_string(),
                inline: false,
            }],
            ..Default::default()
        });
        msg.attachments.push(Attachment {
            filename: "shot.png".to_string(),
            url: "https://cdn.example/shot.png".to_string(),
            content_type: Some("image/png".to_string()),
        });
        msg.attachments.push(Attachment {
            filename: "log.txt".to_string(),
            url: "https://cdn.example/log.txt".to_string(),
            content_type: Some("text/plain".to_string()),
        });

        let closed_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let html = render(&channel(), "Guild", &[msg], &user("staff", false), closed_at);

        assert!(html.contains("border-left-color: #ff6b35"));
        assert!(html.contains("details &amp; more"));
        assert!(html.contains("<img src=\"https://cdn.example/shot.png\""));
        assert!(html.contains("<a href=\"https://cdn.example/log.txt\">log.txt</a>"));
    }

    #[test]
    fn empty_history_renders_placeholder() {
        let closed_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let html = render(&channel(), "Guild", &[], &user("staff", false), closed_at);
        assert!(html.contains("No messages found"));
        assert!(html.contains(">0<"));
    }
}
