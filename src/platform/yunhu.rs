use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::YunhuConfig;
use crate::dispatch::{Capabilities, ReplySender};
use crate::platform::ReplyTarget;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    recv_id: &'a str,
    recv_type: &'a str,
    content_type: &'a str,
    content: SendContent<'a>,
}

#[derive(Debug, Serialize)]
struct SendContent<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    code: i64,
    #[serde(default)]
    msg: String,
}

/// Yunhu open API sender. Supports markdown and plain text.
pub struct YunhuSender {
    client: reqwest::Client,
    config: YunhuConfig,
}

impl YunhuSender {
    pub fn new(config: YunhuConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn send(&self, target: &ReplyTarget, content_type: &str, text: &str) -> Result<()> {
        let request = SendRequest {
            recv_id: &target.id,
            recv_type: target.kind.as_str(),
            content_type,
            content: SendContent { text },
        };

        let url = format!("{}/bot/send", self.config.base_url.trim_end_matches('/'));
        debug!("Sending {} message to Yunhu {}", content_type, target.id);

        let response = self
            .client
            .post(&url)
            .query(&[("token", self.config.token.as_str())])
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Yunhu")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Yunhu API error ({}): {}", status, error_body);
        }

        let body: SendResponse = response
            .json()
            .await
            .context("Failed to parse Yunhu response")?;
        if body.code != 1 {
            anyhow::bail!("Yunhu rejected message (code {}): {}", body.code, body.msg);
        }
        Ok(())
    }
}

#[async_trait]
impl ReplySender for YunhuSender {
    fn capabilities(&self) -> Capabilities {
        Capabilities::RICH_AND_PLAIN
    }

    async fn send_rich_text(&self, target: &ReplyTarget, content: &str) -> Result<()> {
        self.send(target, "markdown", content).await
    }

    async fn send_text(&self, target: &ReplyTarget, content: &str) -> Result<()> {
        self.send(target, "text", content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::TargetKind;

    #[test]
    fn test_request_shape() {
        let request = SendRequest {
            recv_id: "g1",
            recv_type: TargetKind::Group.as_str(),
            content_type: "markdown",
            content: SendContent { text: "**hi**" },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "recvId": "g1",
                "recvType": "group",
                "contentType": "markdown",
                "content": {"text": "**hi**"}
            })
        );
    }

    #[test]
    fn test_response_parsing() {
        let ok: SendResponse = serde_json::from_str(r#"{"code":1,"msg":"success"}"#).unwrap();
        assert_eq!(ok.code, 1);
        let err: SendResponse = serde_json::from_str(r#"{"code":1002}"#).unwrap();
        assert_eq!(err.code, 1002);
        assert!(err.msg.is_empty());
    }
}
