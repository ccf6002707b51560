// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact and newsletter endpoints.
//!
//! Every write handler runs the gate before touching the body. Admitted
//! responses carry the caller's remaining quota.

use crate::captcha::CaptchaVerifier;
use crate::config::{Config, ConfigError};
use crate::email::templates::{self, Branding};
use crate::email::{EmailMessage, Mailer};
use crate::error::{AppError, Result};
use crate::forms::{ContactSubmission, NewsletterSubmission};
use crate::gate::{Operation, RequestGate};
use crate::metrics::GateMetrics;
use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Shared application state.
pub struct AppState {
    pub gate: RequestGate,
    pub captcha: Arc<dyn CaptchaVerifier>,
    pub mailer: Arc<dyn Mailer>,
    pub metrics: Arc<GateMetrics>,
    pub branding: Branding,
    pub config: Config,
}

impl AppState {
    pub fn new(
        config: Config,
        captcha: Arc<dyn CaptchaVerifier>,
        mailer: Arc<dyn Mailer>,
        metrics: Arc<GateMetrics>,
    ) -> std::result::Result<Self, ConfigError> {
        let gate = RequestGate::from_config(&config, metrics.clone())?;
        let branding = Branding {
            site_name: config.site.name.clone(),
            site_url: config.site_url().to_string(),
        };
        Ok(Self {
            gate,
            captcha,
            mailer,
            metrics,
            branding,
            config,
        })
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "site-request-gate",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.encode() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `POST /api/contact`
pub async fn contact(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let peer = peer.map(|ConnectInfo(addr)| addr.ip());
    let admission = match state.gate.admit(Operation::Contact, &headers, peer) {
        Ok(admission) => admission,
        Err(rejection) => return rejection.into_response(),
    };
    let quota = admission.quota.headers();

    match submit_contact(&state, &body).await {
        Ok(()) => (StatusCode::OK, quota, Json(SuccessResponse { success: true })).into_response(),
        Err(err) => {
            debug!(client = %admission.client_id, error = %err, "Contact submission failed");
            (quota, err).into_response()
        }
    }
}

/// `POST /api/newsletter`
pub async fn newsletter(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let peer = peer.map(|ConnectInfo(addr)| addr.ip());
    let admission = match state.gate.admit(Operation::Newsletter, &headers, peer) {
        Ok(admission) => admission,
        Err(rejection) => return rejection.into_response(),
    };
    let quota = admission.quota.headers();

    match subscribe(&state, &body).await {
        Ok(()) => (StatusCode::OK, quota, Json(SuccessResponse { success: true })).into_response(),
        Err(err) => {
            debug!(client = %admission.client_id, error = %err, "Newsletter signup failed");
            (quota, err).into_response()
        }
    }
}

async fn submit_contact(state: &AppState, body: &[u8]) -> Result<()> {
    let submission: ContactSubmission =
        serde_json::from_slice(body).map_err(|_| AppError::InvalidBody)?;
    let form = submission.validate()?;

    let verdict = state
        .captcha
        .verify(form.recaptcha_token.as_deref())
        .await
        .map_err(|err| {
            warn!(error = %err, "CAPTCHA verification unavailable, rejecting");
            AppError::CaptchaFailed
        })?;
    if !verdict.is_pass() {
        return Err(AppError::CaptchaFailed);
    }

    if !state.mailer.is_configured() {
        error!("Email service not configured, cannot deliver contact form");
        return Err(AppError::EmailNotConfigured);
    }

    let now = Utc::now();
    let notification = templates::contact_notification(&state.branding, &form, now);
    state
        .mailer
        .send(EmailMessage {
            to: vec![state.config.email.contact_email.clone()],
            subject: notification.subject,
            html: notification.html,
            text: notification.text,
            reply_to: Some(form.email.clone()),
        })
        .await
        .map_err(|err| {
            error!(error = %err, "Failed to deliver contact notification");
            AppError::ContactDelivery(err)
        })?;

    let confirmation = templates::contact_confirmation(&state.branding, &form.name, form.kind, now);
    if let Err(err) = state
        .mailer
        .send(EmailMessage {
            to: vec![form.email.clone()],
            subject: confirmation.subject,
            html: confirmation.html,
            text: confirmation.text,
            reply_to: None,
        })
        .await
    {
        warn!(error = %err, "Failed to send contact confirmation");
    }

    Ok(())
}

async fn subscribe(state: &AppState, body: &[u8]) -> Result<()> {
    let submission: NewsletterSubmission =
        serde_json::from_slice(body).map_err(|_| AppError::InvalidBody)?;
    let email = submission.validate()?;

    let now = Utc::now();
    let notification = templates::newsletter_notification(&state.branding, &email, now);
    let welcome = templates::newsletter_welcome(&state.branding, now);

    let mut results = state
        .mailer
        .send_many(vec![
            EmailMessage {
                to: vec![state.config.email.contact_email.clone()],
                subject: notification.subject,
                html: notification.html,
                text: notification.text,
                reply_to: None,
            },
            EmailMessage {
                to: vec![email],
                subject: welcome.subject,
                html: welcome.html,
                text: welcome.text,
                reply_to: None,
            },
        ])
        .await
        .into_iter();

    if let Some(Err(err)) = results.next() {
        error!(error = %err, "Failed to send newsletter notification");
        return Err(AppError::SubscribeDelivery(err));
    }
    if let Some(Err(err)) = results.next() {
        warn!(error = %err, "Failed to send welcome email");
    }

    Ok(())
}
