use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::command::CommandMatcher;
use crate::dispatch::{DispatchError, Dispatcher, ReplyFormat};
use crate::platform::{InboundEvent, Platform};
use crate::status::format::{self, FALLBACK_REPORT};
use crate::status::StatusProvider;

/// Static description of this plugin
#[derive(Debug, Clone, Copy)]
pub struct ModuleInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub license: &'static str,
    /// Collaborators that must be present for the plugin to load
    pub requires: &'static [&'static str],
}

pub const MODULE_INFO: ModuleInfo = ModuleInfo {
    name: "ServerStatusMonitor",
    version: env!("CARGO_PKG_VERSION"),
    description: "全平台系统信息查询模块",
    license: "MIT",
    requires: &["SystemStatus"],
};

/// Sent as plain text when the status reply itself could not be delivered
pub const APOLOGY_TEXT: &str = "获取服务器状态失败，请稍后再试";

/// Event types the plugin subscribes to on each adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Message,
    Command,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Message => f.write_str("message"),
            EventKind::Command => f.write_str("command"),
        }
    }
}

impl FromStr for EventKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(EventKind::Message),
            "command" => Ok(EventKind::Command),
            other => anyhow::bail!("Unknown event kind: {}", other),
        }
    }
}

/// How handling one event ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Unrecognized shape, or not a status request
    Ignored,
    Replied(ReplyFormat),
    /// The reply could not be sent; already logged
    Failed,
}

/// The status plugin. Holds everything a handler needs, so each event is
/// processed independently with no shared mutable state.
pub struct StatusMonitor {
    provider: Arc<dyn StatusProvider>,
    matcher: CommandMatcher,
    dispatcher: Dispatcher,
    apology_on_failure: bool,
}

impl StatusMonitor {
    pub fn new(
        provider: Arc<dyn StatusProvider>,
        matcher: CommandMatcher,
        dispatcher: Dispatcher,
        apology_on_failure: bool,
    ) -> Self {
        info!(
            "{} v{} loaded: {} (license {}, requires {:?})",
            MODULE_INFO.name,
            MODULE_INFO.version,
            MODULE_INFO.description,
            MODULE_INFO.license,
            MODULE_INFO.requires
        );
        Self {
            provider,
            matcher,
            dispatcher,
            apology_on_failure,
        }
    }

    /// One `message` and one `command` subscription per platform with a sender
    pub fn subscriptions(&self) -> Vec<(Platform, EventKind)> {
        self.dispatcher
            .platforms()
            .into_iter()
            .flat_map(|p| [(p, EventKind::Message), (p, EventKind::Command)])
            .collect()
    }

    pub fn is_subscribed(&self, platform: Platform, kind: EventKind) -> bool {
        self.subscriptions().contains(&(platform, kind))
    }

    /// Handle an event delivered by `adapter`. Events whose shape belongs to
    /// another platform are ignored, so only subscribed platforms get replies.
    pub async fn handle_from(&self, adapter: Platform, kind: EventKind, raw: &Value) -> Outcome {
        match InboundEvent::parse(raw) {
            Some(event) if event.platform() == adapter => self.handle(kind, raw).await,
            Some(event) => {
                debug!(
                    "Ignoring {}-shaped event delivered by {} adapter",
                    event.platform(),
                    adapter
                );
                Outcome::Ignored
            }
            None => Outcome::Ignored,
        }
    }

    /// Handle one inbound event. Never fails: every error is logged here.
    pub async fn handle(&self, kind: EventKind, raw: &Value) -> Outcome {
        let span = info_span!("event", id = %Uuid::new_v4(), kind = %kind);
        async {
            let Some(event) = InboundEvent::parse(raw) else {
                return Outcome::Ignored;
            };

            let requested = match kind {
                EventKind::Message => self.matcher.is_status_request(event.trigger_text()),
                EventKind::Command => match event.command_name() {
                    Some(name) => self.matcher.is_status_command(&name),
                    None => false,
                },
            };
            if !requested {
                return Outcome::Ignored;
            }

            self.send_status(&event).await
        }
        .instrument(span)
        .await
    }

    async fn send_status(&self, event: &InboundEvent) -> Outcome {
        let platform = event.platform();
        let target = event.reply_target();
        info!(
            "Status requested on {} by {} {}",
            platform, target.kind, target.id
        );

        let report = self.build_report().await;

        match self.dispatcher.dispatch(platform, &target, &report).await {
            Ok(format) => {
                debug!("Status report sent as {:?}", format);
                Outcome::Replied(format)
            }
            Err(e) => {
                error!("Failed to send server status: {}", e);
                if self.apology_on_failure && matches!(e, DispatchError::Send { .. }) {
                    if let Err(e) = self
                        .dispatcher
                        .dispatch_text(platform, &target, APOLOGY_TEXT)
                        .await
                    {
                        warn!("Failed to send apology: {}", e);
                    }
                }
                Outcome::Failed
            }
        }
    }

    /// Fetch a fresh snapshot and render it; any failure yields the fallback report
    async fn build_report(&self) -> String {
        let provider = Arc::clone(&self.provider);
        match tokio::task::spawn_blocking(move || provider.snapshot()).await {
            Ok(Ok(snapshot)) => format::render(&snapshot),
            Ok(Err(e)) => {
                error!("Failed to fetch status snapshot: {:#}", e);
                FALLBACK_REPORT.to_string()
            }
            Err(e) => {
                error!("Status snapshot task failed: {}", e);
                FALLBACK_REPORT.to_string()
            }
        }
    }
}
