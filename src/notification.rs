//! Owner notifications
//!
//! Forwards a short titled message to the notification service so the
//! application owner is alerted out of band.

use std::time::Duration;

use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::responses::ResponseBuilder;

pub const TITLE_MAX_LENGTH: usize = 1200;
pub const CONTENT_MAX_LENGTH: usize = 20000;

const SEND_NOTIFICATION_PATH: &str = "webdevtoken.v1.WebDevService/SendNotification";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotificationError {
    #[error("{0}")]
    InvalidPayload(String),
    #[error("{0}")]
    NotConfigured(&'static str),
}

impl ResponseError for NotificationError {
    fn error_response(&self) -> HttpResponse {
        match self {
            NotificationError::InvalidPayload(message) => ResponseBuilder::bad_request()
                .with_error_code("invalid_notification")
                .with_message(message)
                .build(),
            NotificationError::NotConfigured(message) => {
                log::error!("Owner notification unavailable: {message}");
                ResponseBuilder::internal_server_error().build()
            }
        }
    }
}

/// Validated notification body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub content: String,
}

/// Trim and bound-check a notification
///
/// Lengths are counted in characters after trimming.
///
/// # Errors
///
/// Returns [`NotificationError::InvalidPayload`] for empty or oversized fields
pub fn validate_payload(title: &str, content: &str) -> Result<NotificationPayload, NotificationError> {
    let title = title.trim();
    let content = content.trim();

    if title.is_empty() {
        return Err(NotificationError::InvalidPayload(
            "Notification title is required.".to_string(),
        ));
    }
    if content.is_empty() {
        return Err(NotificationError::InvalidPayload(
            "Notification content is required.".to_string(),
        ));
    }
    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err(NotificationError::InvalidPayload(format!(
            "Notification title must be at most {TITLE_MAX_LENGTH} characters."
        )));
    }
    if content.chars().count() > CONTENT_MAX_LENGTH {
        return Err(NotificationError::InvalidPayload(format!(
            "Notification content must be at most {CONTENT_MAX_LENGTH} characters."
        )));
    }

    Ok(NotificationPayload {
        title: title.to_string(),
        content: content.to_string(),
    })
}

/// Client for the owner notification endpoint
#[derive(Debug, Clone)]
pub struct OwnerNotifier {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl OwnerNotifier {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(api_url: &str, api_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            api_url: api_url.trim().to_string(),
            api_key: api_key.trim().to_string(),
        })
    }

    /// Endpoint URL derived from the configured API base
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/{SEND_NOTIFICATION_PATH}", self.api_url.trim_end_matches('/'))
    }

    /// Send a notification to the owner
    ///
    /// Returns `Ok(false)` when the service could not be reached or refused the
    /// message; delivery is best-effort.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is invalid or the notifier is not configured
    pub async fn notify_owner(&self, title: &str, content: &str) -> Result<bool, NotificationError> {
        let payload = validate_payload(title, content)?;

        if self.api_url.is_empty() {
            return Err(NotificationError::NotConfigured(
                "Notification service URL is not configured.",
            ));
        }
        if self.api_key.is_empty() {
            return Err(NotificationError::NotConfigured(
                "Notification service API key is not configured.",
            ));
        }

        let response = self
            .http
            .post(self.endpoint())
            .header(reqwest::header::ACCEPT, "application/json")
            .bearer_auth(&self.api_key)
            .header("connect-protocol-version", "1")
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => Ok(true),
            Ok(response) => {
                let status = response.status();
                let detail = response.text().await.unwrap_or_default();
                log::warn!("Failed to notify owner ({status}): {detail}");
                Ok(false)
            }
            Err(e) => {
                log::warn!("Error calling notification service: {e}");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{web, App, HttpRequest, HttpServer};
    use serde_json::Value;

    fn start_notification_stub() -> String {
        let server = HttpServer::new(|| {
            App::new().route(
                "/api/webdevtoken.v1.WebDevService/SendNotification",
                web::post().to(|req: HttpRequest, body: web::Json<Value>| async move {
                    let auth = req
                        .headers()
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default();
                    let protocol = req
                        .headers()
                        .get("connect-protocol-version")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default();
                    if auth != "Bearer key-1" || protocol != "1" {
                        return HttpResponse::Unauthorized().finish();
                    }
                    if body["title"] == "reject" {
                        return HttpResponse::ServiceUnavailable().body("down");
                    }
                    HttpResponse::Ok().json(serde_json::json!({}))
                }),
            )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        format!("http://{addr}/api/")
    }

    #[test]
    fn test_validate_trims_and_accepts_limits() {
        let payload = validate_payload("  Title  ", "\nBody\n").unwrap();
        assert_eq!(payload.title, "Title");
        assert_eq!(payload.content, "Body");

        let title = "t".repeat(TITLE_MAX_LENGTH);
        let content = "c".repeat(CONTENT_MAX_LENGTH);
        assert!(validate_payload(&title, &content).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_and_oversized() {
        assert!(validate_payload("   ", "body").is_err());
        assert!(validate_payload("title", "").is_err());
        assert!(validate_payload(&"t".repeat(TITLE_MAX_LENGTH + 1), "body").is_err());
        assert!(validate_payload("title", &"c".repeat(CONTENT_MAX_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_endpoint_joins_base() {
        let notifier =
            OwnerNotifier::new("https://forge.example.com/api/", "k", Duration::from_secs(1)).unwrap();
        assert_eq!(
            notifier.endpoint(),
            "https://forge.example.com/api/webdevtoken.v1.WebDevService/SendNotification"
        );
    }

    #[actix_web::test]
    async fn test_unconfigured_notifier_errors_after_validation() {
        let notifier = OwnerNotifier::new("", "", Duration::from_secs(1)).unwrap();
        assert!(matches!(
            notifier.notify_owner("", "body").await,
            Err(NotificationError::InvalidPayload(_))
        ));
        assert!(matches!(
            notifier.notify_owner("title", "body").await,
            Err(NotificationError::NotConfigured(_))
        ));
    }

    #[actix_web::test]
    async fn test_delivery_outcomes() {
        let base = start_notification_stub();
        let notifier = OwnerNotifier::new(&base, "key-1", Duration::from_secs(5)).unwrap();
        assert_eq!(notifier.notify_owner("Hello", "World").await, Ok(true));
        assert_eq!(notifier.notify_owner("reject", "World").await, Ok(false));

        let wrong_key = OwnerNotifier::new(&base, "key-2", Duration::from_secs(5)).unwrap();
        assert_eq!(wrong_key.notify_owner("Hello", "World").await, Ok(false));
    }
}
