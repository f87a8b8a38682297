use std::time::Duration;

use application::{FanoutPublisher, PublishError};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use tracing::debug;

/// 通过 Centrifugo HTTP API 发布
#[derive(Debug, Clone)]
pub struct CentrifugoPublisher {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct PublishRequest<'a> {
    channel: &'a str,
    data: serde_json::Value,
}

impl CentrifugoPublisher {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| PublishError::transport(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/publish", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl FanoutPublisher for CentrifugoPublisher {
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<(), PublishError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("apikey {}", self.api_key))
            .json(&PublishRequest {
                channel,
                data: payload,
            })
            .send()
            .await
            .map_err(|err| PublishError::transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| PublishError::transport(err.to_string()))?;

        if !status.is_success() {
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        // 2xx 也可能在响应体中携带错误
        if let Ok(reply) = serde_json::from_str::<serde_json::Value>(&body) {
            if let Some(error) = reply.get("error").filter(|e| !e.is_null()) {
                return Err(PublishError::Broker(error.to_string()));
            }
        }

        debug!(channel, "published to centrifugo");
        Ok(())
    }
}
