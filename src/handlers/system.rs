// System handlers: health check and owner notification
use actix_web::{web, HttpRequest, HttpResponse, Result};
use serde::{Deserialize, Serialize};

use crate::authentication::require_admin;
use crate::notification::OwnerNotifier;
use crate::session::SessionManager;
use crate::utils::responses::ResponseBuilder;

#[derive(Debug, Deserialize)]
pub struct HealthInput {
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthOutput {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct NotifyOwnerInput {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotifyOwnerOutput {
    pub success: bool,
}

/// Liveness probe
///
/// # Errors
/// Never fails; invalid input is answered with 400
pub async fn health(body: web::Json<HealthInput>) -> Result<HttpResponse> {
    if body.timestamp < 0 {
        return Ok(ResponseBuilder::invalid_field(
            "timestamp",
            "timestamp cannot be negative",
        ));
    }
    Ok(ResponseBuilder::ok().json(&HealthOutput { ok: true }))
}

/// Forward a message to the application owner (admin only)
///
/// # Errors
/// Returns an error if the caller is not an admin, the payload is invalid,
/// or the notifier is not configured
pub async fn notify_owner(
    req: HttpRequest,
    body: web::Json<NotifyOwnerInput>,
    session_manager: web::Data<SessionManager>,
    notifier: web::Data<OwnerNotifier>,
) -> Result<HttpResponse> {
    let admin = require_admin(&req, &session_manager).await?;
    let delivered = notifier.notify_owner(&body.title, &body.content).await?;

    log::info!(
        "Owner notification from {} {}",
        admin.open_id,
        if delivered { "delivered" } else { "not delivered" }
    );
    Ok(ResponseBuilder::ok().json(&NotifyOwnerOutput { success: delivered }))
}
