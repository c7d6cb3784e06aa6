use anyhow::bail;
use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;

use ticketbot::config::AppConfig;
use ticketbot::platform::rest::RestProvider;
use ticketbot::platform::PlatformClient;
use ticketbot::tickets::{ui, TicketManager, DEFAULT_MAX_AGE_HOURS};

const CLEANUP_INTERVAL_SECS: u64 = 60 * 60;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("run");
    if let "--help" | "-h" = command {
        eprintln!("Usage: ticketbot [run|panel|cleanup]");
        eprintln!("  run      start the ticket service (default)");
        eprintln!("  panel    post the ticket panel into the configured channel and exit");
        eprintln!("  cleanup  delete stale ticket channels once and exit");
        return Ok(());
    }

    let config = match AppConfig::load() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            eprintln!("Provide ticketbot.toml or TICKETBOT_-prefixed environment variables.");
            std::process::exit(1);
        }
    };
    if config.token.is_empty() {
        eprintln!("Configuration error: bot token is empty");
        std::process::exit(1);
    }

    let platform: Arc<dyn PlatformClient> = Arc::new(RestProvider::new(&config.token));
    let manager = TicketManager::new(Arc::clone(&platform), Arc::clone(&config));

    match command {
        "panel" => {
            platform
                .send_message(&config.panel_channel_id, ui::panel_message())
                .await?;
            info!("panel posted in channel {}", config.panel_channel_id);
            return Ok(());
        }
        "cleanup" => {
            let removed = manager
                .cleanup_stale(&config.guild_id, DEFAULT_MAX_AGE_HOURS)
                .await?;
            info!("stale-ticket sweep removed {removed} channel(s)");
            return Ok(());
        }
        "run" => {}
        other => {
            eprintln!("Run 'ticketbot --help' for usage information");
            bail!("unknown command: {other}");
        }
    }

    info!(
        "ticketbot starting for guild {} (category {})",
        config.guild_id, config.category_id
    );

    let cleanup_manager = manager.clone();
    let cleanup_guild = config.guild_id.clone();
    let _cleanup = tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(CLEANUP_INTERVAL_SECS));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match cleanup_manager
                .cleanup_stale(&cleanup_guild, DEFAULT_MAX_AGE_HOURS)
                .await
            {
                Ok(0) => {}
                Ok(n) => info!("stale-ticket sweep removed {n} channel(s)"),
                Err(e) => error!("stale-ticket sweep failed: {e}"),
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}
