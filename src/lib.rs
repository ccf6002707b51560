// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Site Request Gate
//!
//! Server-side gating for the site's public write endpoints (contact form
//! and newsletter signup):
//!
//! - Origin / CSRF validation against the site's own base URLs
//! - Client identification from forwarding headers
//! - Per-operation, per-client fixed-window rate limiting
//! - `Retry-After` and `X-RateLimit-*` response headers
//!
//! Admitted requests continue to form validation, CAPTCHA verification and
//! email delivery.

pub mod captcha;
pub mod client_id;
pub mod config;
pub mod email;
pub mod error;
pub mod forms;
pub mod gate;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod origin;
pub mod server;

pub use config::Config;
pub use gate::{GateRejection, Operation, RequestGate};
pub use limiter::{RateLimitDecision, RateLimitPolicy, RateLimiter};
pub use origin::{OriginAllowList, OriginValidator};
