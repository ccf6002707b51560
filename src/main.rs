// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Site Request Gate Service
//!
//! Serves `POST /api/contact` and `POST /api/newsletter` behind origin
//! validation and per-client rate limiting.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (and `.env`):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `SITE_BASE_URLS`: Comma-separated site origins (default: https://nostr-wot.com)
//! - `CONTACT_RATE_LIMIT` / `CONTACT_WINDOW_MS`: Contact policy (default: 5 per 60000 ms)
//! - `NEWSLETTER_RATE_LIMIT` / `NEWSLETTER_WINDOW_MS`: Newsletter policy (default: 3 per 60000 ms)
//! - `RECAPTCHA_SECRET_KEY`: Enables CAPTCHA enforcement when set
//! - `RESEND_API_KEY`: Enables email delivery when set

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use site_request_gate::{
    captcha::{CaptchaMode, CaptchaVerifier, RecaptchaVerifier},
    config::Config,
    email::{Mailer, ResendMailer, UnconfiguredMailer},
    handlers::AppState,
    metrics::GateMetrics,
    server,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env();
    config.validate()?;
    info!(
        bind_addr = %config.bind_addr,
        base_urls = ?config.site.base_urls,
        contact_limit = config.policies.contact.limit,
        contact_window_ms = config.policies.contact.window_ms,
        newsletter_limit = config.policies.newsletter.limit,
        newsletter_window_ms = config.policies.newsletter.window_ms,
        "Starting site request gate"
    );

    let captcha_mode = config.captcha.mode();
    if captcha_mode == CaptchaMode::Disabled {
        warn!("RECAPTCHA_SECRET_KEY not configured, CAPTCHA verification disabled");
    }
    let captcha: Arc<dyn CaptchaVerifier> = Arc::new(RecaptchaVerifier::new(
        captcha_mode,
        config.captcha.verify_url.clone(),
    ));

    let mailer: Arc<dyn Mailer> = match &config.email.api_key {
        Some(key) => Arc::new(ResendMailer::new(
            config.email.api_url.clone(),
            key.clone(),
            config.email.from.clone(),
        )),
        None => {
            warn!("RESEND_API_KEY not configured, email delivery disabled");
            Arc::new(UnconfiguredMailer)
        }
    };

    let metrics = Arc::new(GateMetrics::new()?);
    let state = Arc::new(AppState::new(config.clone(), captcha, mailer, metrics)?);

    server::spawn_sweeper(state.clone());

    let app = server::router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
