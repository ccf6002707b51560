// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Errors raised after a request has been admitted by the gate.

use crate::email::EmailError;
use crate::forms::FormError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Downstream failures of the contact and newsletter flows.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request body")]
    InvalidBody,

    #[error("{0}")]
    Validation(#[from] FormError),

    #[error("reCAPTCHA verification failed. Please try again.")]
    CaptchaFailed,

    #[error("Email service not configured. Please try again later.")]
    EmailNotConfigured,

    #[error("Failed to send email. Please try again later.")]
    ContactDelivery(#[source] EmailError),

    #[error("Failed to subscribe. Please try again later.")]
    SubscribeDelivery(#[source] EmailError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidBody | AppError::Validation(_) | AppError::CaptchaFailed => {
                StatusCode::BAD_REQUEST
            }
            AppError::EmailNotConfigured
            | AppError::ContactDelivery(_)
            | AppError::SubscribeDelivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
