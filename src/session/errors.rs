use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::utils::responses::ResponseBuilder;

/// Failure to establish who is calling, or what they may do
///
/// Token decode failures, missing users and remote sync failures all collapse to
/// [`SessionError::Unauthenticated`] so clients cannot tell them apart.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no valid session")]
    Unauthenticated,
    #[error("insufficient privilege")]
    Forbidden,
    #[error("session processing failed: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ResponseError for SessionError {
    fn error_response(&self) -> HttpResponse {
        match self {
            SessionError::Unauthenticated => ResponseBuilder::unauthorized().build(),
            SessionError::Forbidden => ResponseBuilder::forbidden().build(),
            SessionError::Internal(e) => {
                log::error!("Session processing failed: {e:#}");
                ResponseBuilder::internal_server_error().build()
            }
        }
    }
}
