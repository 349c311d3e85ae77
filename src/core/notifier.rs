//! Webhook fan-out.
//!
//! Every active webhook of a user gets the same JSON payload, all requests in
//! flight at once. Delivery is best effort: a failing endpoint is logged and
//! counted, never retried, and never affects its siblings or the caller.

use crate::core::traits::NotificationService;
use crate::infrastructure::traits::{IntegrationRepository, WebhookSender};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use di::{Ref, injectable};
use futures_util::future::join_all;
use log::{debug, warn};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

impl WebhookPayload {
    pub fn new(message: impl Into<String>, conversation_id: Option<i64>) -> Self {
        WebhookPayload {
            message: message.into(),
            conversation_id,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub attempted: usize,
    pub delivered: usize,
}

#[injectable(NotificationService)]
pub struct DefaultNotificationService {
    repo: Ref<dyn IntegrationRepository>,
    sender: Ref<dyn WebhookSender>,
}

impl DefaultNotificationService {
    pub fn new(repo: Ref<dyn IntegrationRepository>, sender: Ref<dyn WebhookSender>) -> Self {
        Self { repo, sender }
    }
}

#[async_trait]
impl NotificationService for DefaultNotificationService {
    async fn notify(&self, user_id: i64, payload: &WebhookPayload) -> DeliveryReport {
        let Ok(webhooks) = self.repo.list_webhooks(user_id).await else {
            warn!("could not load webhooks for user {user_id}");
            return DeliveryReport::default();
        };

        let body = match serde_json::to_value(payload) {
            Ok(body) => body,
            Err(e) => {
                warn!("could not serialize webhook payload: {e}");
                return DeliveryReport::default();
            }
        };

        let deliveries = webhooks
            .iter()
            .filter(|webhook| webhook.active)
            .map(|webhook| {
                let body = &body;
                async move {
                    match self.sender.post_json(&webhook.url, body).await {
                        Ok(()) => {
                            debug!("webhook {} delivered", webhook.id);
                            true
                        }
                        Err(e) => {
                            warn!("webhook to {} failed: {e}", webhook.url);
                            false
                        }
                    }
                }
            });

        let results = join_all(deliveries).await;

        DeliveryReport {
            attempted: results.len(),
            delivered: results.into_iter().filter(|delivered| *delivered).count(),
        }
    }
}
