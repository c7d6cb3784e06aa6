use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;
use std::path::PathBuf;

/// Runtime configuration, loaded once at startup and shared read-only by all
/// components. Values come from `ticketbot.toml` layered with
/// `TICKETBOT_`-prefixed environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Bot token for the platform REST API.
    pub token: String,
    /// Guild the bot operates in.
    pub guild_id: String,
    /// Parent category for ticket channels.
    pub category_id: String,
    /// Role id whose holders are always staff.
    pub staff_role_id: String,
    /// Role names that also count as staff when present in the guild.
    #[serde(default)]
    pub support_roles: Vec<String>,
    /// Channel receiving close logs and transcripts.
    pub log_channel_id: String,
    /// Category ids recognized as security areas; panels may also be posted
    /// into channels under one of these.
    #[serde(default)]
    pub security_categories: Vec<String>,
    /// Channel the panel command is allowed to post into.
    pub panel_channel_id: String,
    #[serde(default = "default_counter_file")]
    pub counter_file: PathBuf,
    #[serde(default = "default_transcript_dir")]
    pub transcript_dir: PathBuf,
    /// Seconds between the closing confirmation and channel deletion.
    #[serde(default = "default_delete_delay")]
    pub delete_delay_secs: u64,
}

fn default_counter_file() -> PathBuf {
    PathBuf::from("ticket-counter.json")
}

fn default_transcript_dir() -> PathBuf {
    PathBuf::from("transcripts")
}

fn default_delete_delay() -> u64 {
    3
}

impl AppConfig {
    pub fn load() -> Result<Self, figment::Error> {
        Self::from_file("ticketbot.toml")
    }

    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("TICKETBOT_"))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_from_toml_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ticketbot.toml");
        std::fs::write(
            &path,
            r#"
token = "secret"
guild_id = "1"
category_id = "2"
staff_role_id = "3"
log_channel_id = "4"
panel_channel_id = "5"
support_roles = ["Moderator", "Security"]
"#,
        )
        .unwrap();

        let cfg = AppConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.token, "secret");
        assert_eq!(cfg.support_roles, vec!["Moderator", "Security"]);
        assert_eq!(cfg.counter_file, PathBuf::from("ticket-counter.json"));
        assert_eq!(cfg.transcript_dir, PathBuf::from("transcripts"));
        assert_eq!(cfg.delete_delay_secs, 3);
        assert!(cfg.security_categories.is_empty());
    }

    #[test]
    fn missing_required_key_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ticketbot.toml");
        std::fs::write(&path, "token = \"secret\"\n").unwrap();
        assert!(AppConfig::from_file(path.to_str().unwrap()).is_err());
    }
}
