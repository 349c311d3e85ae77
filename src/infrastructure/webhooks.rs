use crate::config::AppConfig;
use crate::infrastructure::traits::{WebhookError, WebhookSender};
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use log::warn;

/// Posts JSON payloads to user-registered URLs.
pub struct HttpWebhookSender {
    http: reqwest::Client,
}

#[injectable(WebhookSender)]
impl HttpWebhookSender {
    #[inject]
    pub fn create(config: Ref<AppConfig>) -> HttpWebhookSender {
        HttpWebhookSender::new(&config)
    }
}

impl HttpWebhookSender {
    pub fn new(config: &AppConfig) -> HttpWebhookSender {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("falling back to a default HTTP client: {e}");
                reqwest::Client::new()
            });
        HttpWebhookSender { http }
    }
}

#[async_trait]
impl WebhookSender for HttpWebhookSender {
    async fn post_json(&self, url: &str, payload: &serde_json::Value) -> Result<(), WebhookError> {
        let response = self.http.post(url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
