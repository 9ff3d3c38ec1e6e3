//! Push notifications through an HTTP push gateway

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::{
    config::PushConfig,
    error::{AppError, AppResult},
    models::{
        notification::{Audience, DispatchNotification, DispatchResult, RegisterPushToken},
        PushToken,
    },
    repository::Repository,
};

/// One message as accepted by the gateway
#[derive(Debug, Serialize)]
struct PushMessage<'a> {
    to: &'a str,
    title: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    sound: &'static str,
}

#[derive(Debug, Deserialize)]
struct PushTicket {
    status: String,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    #[serde(default)]
    data: Vec<PushTicket>,
}

#[derive(Clone)]
pub struct NotificationsService {
    repository: Repository,
    config: PushConfig,
    admin_uids: Vec<String>,
    client: reqwest::Client,
}

impl NotificationsService {
    pub fn new(repository: Repository, config: PushConfig, admin_uids: Vec<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build push client: {}", e)))?;
        Ok(Self {
            repository,
            config,
            admin_uids,
            client,
        })
    }

    /// Store a device token for the calling user
    pub async fn register_token(&self, uid: &str, data: &RegisterPushToken) -> AppResult<PushToken> {
        data.validate()?;
        let token = PushToken {
            id: data.token.trim().to_string(),
            uid: uid.to_string(),
            platform: data.platform.clone(),
            created_at: Utc::now(),
        };
        self.repository.put(&token).await?;
        tracing::debug!(uid, "Push token registered");
        Ok(token)
    }

    async fn audience_uids(&self, audience: &Audience) -> AppResult<Vec<String>> {
        let mut uids = match audience {
            Audience::Admins => {
                let mut uids = self.admin_uids.clone();
                uids.extend(self.repository.users_admin_uids().await?);
                uids
            }
            Audience::Operator { operator_id } => self
                .repository
                .users_for_operator(operator_id)
                .await?
                .into_iter()
                .map(|profile| profile.id)
                .collect(),
        };
        uids.sort();
        uids.dedup();
        Ok(uids)
    }

    async fn audience_tokens(&self, audience: &Audience) -> AppResult<Vec<String>> {
        let mut tokens = Vec::new();
        for uid in self.audience_uids(audience).await? {
            tokens.extend(
                self.repository
                    .push_tokens_for_uid(&uid)
                    .await?
                    .into_iter()
                    .map(|t| t.id),
            );
        }
        Ok(tokens)
    }

    /// Send a notification to every device of the audience
    pub async fn dispatch(&self, notification: &DispatchNotification) -> AppResult<DispatchResult> {
        notification.validate()?;
        let tokens = self.audience_tokens(&notification.audience).await?;

        if tokens.is_empty() {
            tracing::debug!(audience = ?notification.audience, "No push tokens for audience");
            return Ok(DispatchResult { success: true, ..Default::default() });
        }
        if !self.config.enabled {
            tracing::info!(
                audience = ?notification.audience,
                title = %notification.title,
                devices = tokens.len(),
                "Push disabled, not sending"
            );
            return Ok(DispatchResult { success: true, ..Default::default() });
        }

        let messages: Vec<PushMessage> = tokens
            .iter()
            .map(|to| PushMessage {
                to,
                title: &notification.title,
                body: &notification.body,
                data: notification.data.as_ref(),
                sound: "default",
            })
            .collect();

        let mut request = self.client.post(&self.config.endpoint).json(&messages);
        if let Some(ref token) = self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Delivery(format!("Push gateway unreachable: {}", e)))?;
        if !response.status().is_success() {
            return Err(AppError::Delivery(format!(
                "Push gateway returned {}",
                response.status()
            )));
        }

        // Gateways that do not return tickets are taken as accepting everything
        let result = match response.json::<PushResponse>().await {
            Ok(body) if !body.data.is_empty() => {
                let sent = body.data.iter().filter(|t| t.status == "ok").count();
                DispatchResult {
                    success: sent == body.data.len(),
                    sent,
                    failed: body.data.len() - sent,
                }
            }
            _ => DispatchResult {
                success: true,
                sent: tokens.len(),
                failed: 0,
            },
        };

        tracing::info!(
            audience = ?notification.audience,
            sent = result.sent,
            failed = result.failed,
            "Push notification dispatched"
        );
        Ok(result)
    }

    /// Dispatch without waiting; failures are only logged
    pub fn notify_in_background(&self, notification: DispatchNotification) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.dispatch(&notification).await {
                tracing::warn!(audience = ?notification.audience, "Push notification failed: {}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserProfile;

    fn service(admin_uids: Vec<String>) -> (Repository, NotificationsService) {
        let repository = Repository::in_memory();
        let service =
            NotificationsService::new(repository.clone(), PushConfig::default(), admin_uids).unwrap();
        (repository, service)
    }

    #[tokio::test]
    async fn test_register_and_resolve_operator_audience() {
        let (repository, service) = service(Vec::new());
        repository
            .put(&UserProfile {
                id: "uid-1".to_string(),
                email: None,
                display_name: None,
                operator_id: Some("OP-1".to_string()),
                active: true,
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
        service
            .register_token(
                "uid-1",
                &RegisterPushToken { token: "ExponentPushToken[abc]".to_string(), platform: None },
            )
            .await
            .unwrap();

        let tokens = service
            .audience_tokens(&Audience::Operator { operator_id: "OP-1".to_string() })
            .await
            .unwrap();
        assert_eq!(tokens, vec!["ExponentPushToken[abc]".to_string()]);

        let none = service
            .audience_tokens(&Audience::Operator { operator_id: "OP-2".to_string() })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_gateway_reports_success_without_sending() {
        let (_, service) = service(vec!["admin-1".to_string()]);
        service
            .register_token(
                "admin-1",
                &RegisterPushToken { token: "ExponentPushToken[admin]".to_string(), platform: None },
            )
            .await
            .unwrap();

        let result = service
            .dispatch(&DispatchNotification {
                audience: Audience::Admins,
                title: "New request".to_string(),
                body: "A request is waiting".to_string(),
                data: None,
            })
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.sent, 0);
    }

    #[tokio::test]
    async fn test_short_token_is_rejected() {
        let (_, service) = service(Vec::new());
        let result = service
            .register_token("uid", &RegisterPushToken { token: "x".to_string(), platform: None })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
