use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::platform::{Platform, ReplyTarget};

/// What a platform's send binding can deliver, declared at registration time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub rich_text: bool,
    pub plain_text: bool,
}

impl Capabilities {
    pub const RICH_AND_PLAIN: Capabilities = Capabilities {
        rich_text: true,
        plain_text: true,
    };

    pub const PLAIN_ONLY: Capabilities = Capabilities {
        rich_text: false,
        plain_text: true,
    };
}

/// Message format actually used for a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFormat {
    RichText,
    PlainText,
}

/// Outbound side of a platform adapter.
/// Each call sends exactly one message and never retries.
#[async_trait]
pub trait ReplySender: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    async fn send_rich_text(&self, target: &ReplyTarget, content: &str) -> anyhow::Result<()>;

    async fn send_text(&self, target: &ReplyTarget, content: &str) -> anyhow::Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no sender registered for platform {0}")]
    NoSender(Platform),
    #[error("platform {0} supports neither rich text nor plain text")]
    Unsupported(Platform),
    #[error("sending {format:?} reply on {platform} failed: {source:#}")]
    Send {
        platform: Platform,
        format: ReplyFormat,
        #[source]
        source: anyhow::Error,
    },
}

/// Routes rendered replies to the per-platform send bindings
#[derive(Clone, Default)]
pub struct Dispatcher {
    senders: HashMap<Platform, Arc<dyn ReplySender>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the send binding for a platform, replacing any previous one
    pub fn register(&mut self, platform: Platform, sender: Arc<dyn ReplySender>) {
        let caps = sender.capabilities();
        info!(
            "Registered {} sender (rich_text: {}, plain_text: {})",
            platform, caps.rich_text, caps.plain_text
        );
        self.senders.insert(platform, sender);
    }

    pub fn platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.senders.contains_key(p))
            .collect()
    }

    /// Send `content`, preferring rich text and falling back to plain text
    pub async fn dispatch(
        &self,
        platform: Platform,
        target: &ReplyTarget,
        content: &str,
    ) -> Result<ReplyFormat, DispatchError> {
        let sender = self
            .senders
            .get(&platform)
            .ok_or(DispatchError::NoSender(platform))?;
        let caps = sender.capabilities();

        let format = if caps.rich_text {
            ReplyFormat::RichText
        } else if caps.plain_text {
            ReplyFormat::PlainText
        } else {
            return Err(DispatchError::Unsupported(platform));
        };

        debug!(
            "Dispatching {:?} reply to {} {}:{}",
            format, platform, target.kind, target.id
        );

        let result = match format {
            ReplyFormat::RichText => sender.send_rich_text(target, content).await,
            ReplyFormat::PlainText => sender.send_text(target, content).await,
        };

        result.map(|()| format).map_err(|source| DispatchError::Send {
            platform,
            format,
            source,
        })
    }

    /// Plain-text only send, used for short notices such as apologies
    pub async fn dispatch_text(
        &self,
        platform: Platform,
        target: &ReplyTarget,
        content: &str,
    ) -> Result<(), DispatchError> {
        let sender = self
            .senders
            .get(&platform)
            .ok_or(DispatchError::NoSender(platform))?;
        if !sender.capabilities().plain_text {
            return Err(DispatchError::Unsupported(platform));
        }
        sender
            .send_text(target, content)
            .await
            .map_err(|source| DispatchError::Send {
                platform,
                format: ReplyFormat::PlainText,
                source,
            })
    }
}
