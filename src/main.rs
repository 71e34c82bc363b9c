mod command;
mod config;
mod dispatch;
mod platform;
mod plugin;
mod server;
mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::command::CommandMatcher;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::platform::onebot::OneBotSender;
use crate::platform::telegram::TelegramSender;
use crate::platform::yunhu::YunhuSender;
use crate::platform::Platform;
use crate::plugin::StatusMonitor;
use crate::status::SystemStatus;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,status_monitor=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Platforms: {:?}", config.enabled_platforms());
    info!("  Status phrases: {:?}", config.commands.phrases);
    info!("  Listen: {}", config.server.listen);

    // Register a send binding for every configured platform
    let mut dispatcher = Dispatcher::new();
    if let Some(yunhu) = &config.yunhu {
        dispatcher.register(Platform::Yunhu, Arc::new(YunhuSender::new(yunhu.clone())));
    }
    if let Some(telegram) = &config.telegram {
        dispatcher.register(Platform::Telegram, Arc::new(TelegramSender::new(telegram)));
    }
    if let Some(onebot) = &config.onebot {
        dispatcher.register(Platform::OneBot, Arc::new(OneBotSender::new(onebot.clone())));
    }

    let monitor = Arc::new(StatusMonitor::new(
        Arc::new(SystemStatus::new(&config.status)),
        CommandMatcher::from_config(&config.commands),
        dispatcher,
        config.reply.apology_on_failure,
    ));

    server::run(monitor, config.server.listen).await?;

    Ok(())
}
