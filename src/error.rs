use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::header::{RETRY_AFTER, WWW_AUTHENTICATE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::metrics::PROVIDER_ERRORS;
use crate::provider::ProviderError;

pub mod codes {
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const AI_UNAVAILABLE: &str = "ai_unavailable";
    pub const AI_AUTH: &str = "ai_auth";
    pub const AI_QUOTA: &str = "ai_quota";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("rate limit exceeded")]
    RateLimited { retry_after: u64 },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) | ApiError::InvalidBody(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Provider(ProviderError::QuotaExceeded(_)) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Provider(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) | ApiError::InvalidBody(_) => codes::INVALID_INPUT,
            ApiError::Unauthorized(_) => codes::UNAUTHORIZED,
            ApiError::RateLimited { .. } => codes::RATE_LIMITED,
            ApiError::Provider(ProviderError::Auth(_)) => codes::AI_AUTH,
            ApiError::Provider(ProviderError::QuotaExceeded(_)) => codes::AI_QUOTA,
            ApiError::Provider(_) => codes::AI_UNAVAILABLE,
        }
    }

    // Text shown to the caller; provider details stay in the logs
    fn public_message(&self) -> String {
        match self {
            ApiError::InvalidInput(msg) => msg.clone(),
            ApiError::InvalidBody(rejection) => rejection.body_text(),
            ApiError::Unauthorized(AuthError::Expired) => "Token expired".to_string(),
            ApiError::Unauthorized(_) => "Invalid or missing token".to_string(),
            ApiError::RateLimited { retry_after } => {
                format!("Too many strategy requests, retry in {retry_after} seconds")
            }
            ApiError::Provider(ProviderError::NotConfigured) => {
                "AI service temporarily unavailable - API key not configured".to_string()
            }
            ApiError::Provider(ProviderError::Auth(_)) => {
                "Authentication error with the AI service".to_string()
            }
            ApiError::Provider(ProviderError::QuotaExceeded(_)) => {
                "AI usage limit reached - try again in a few minutes".to_string()
            }
            ApiError::Provider(ProviderError::EmptyResponse) => {
                "Strategy generation failed - empty response from the AI".to_string()
            }
            ApiError::Provider(_) => "Internal AI service error - try again".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            ApiError::Provider(err) => {
                PROVIDER_ERRORS.inc();
                error!(error = %err, "strategy generation failed");
            }
            ApiError::Unauthorized(err) => warn!(error = %err, "rejected request"),
            _ => {}
        }

        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code(),
                message: self.public_message(),
            },
        };
        let mut response = (status, Json(body)).into_response();

        match self {
            ApiError::Unauthorized(_) => {
                response
                    .headers_mut()
                    .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            ApiError::RateLimited { retry_after } => {
                if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                    response.headers_mut().insert(RETRY_AFTER, value);
                }
            }
            _ => {}
        }
        response
    }
}
