use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::OneBotConfig;
use crate::dispatch::{Capabilities, ReplySender};
use crate::platform::{ReplyTarget, TargetKind};

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    retcode: i64,
}

/// OneBot v11 HTTP API sender. Plain text only.
pub struct OneBotSender {
    client: reqwest::Client,
    config: OneBotConfig,
}

impl OneBotSender {
    pub fn new(config: OneBotConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

/// Endpoint and body for a message to `target`
fn build_request(target: &ReplyTarget, message: &str) -> (&'static str, Value) {
    // OneBot ids are integers; pass anything unparsable through verbatim
    let id = target
        .id
        .parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(target.id.clone()));
    match target.kind {
        TargetKind::Group => ("send_group_msg", json!({"group_id": id, "message": message})),
        TargetKind::User => ("send_private_msg", json!({"user_id": id, "message": message})),
    }
}

#[async_trait]
impl ReplySender for OneBotSender {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PLAIN_ONLY
    }

    async fn send_rich_text(&self, _target: &ReplyTarget, _content: &str) -> Result<()> {
        anyhow::bail!("OneBot does not support rich text")
    }

    async fn send_text(&self, target: &ReplyTarget, content: &str) -> Result<()> {
        let (action, body) = build_request(target, content);
        let url = format!("{}/{}", self.config.api_url.trim_end_matches('/'), action);
        debug!("Calling OneBot {} for {}", action, target.id);

        let mut request = self.client.post(&url).json(&body);
        if let Some(token) = &self.config.access_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .context("Failed to send request to OneBot")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("OneBot API error ({}): {}", status, error_body);
        }

        let reply: ApiResponse = response
            .json()
            .await
            .context("Failed to parse OneBot response")?;
        if reply.status == "failed" || reply.retcode != 0 {
            anyhow::bail!(
                "OneBot {} failed (status {}, retcode {})",
                action,
                reply.status,
                reply.retcode
            );
        }
        Ok(())
    }
}
