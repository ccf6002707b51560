// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Request gate: origin check, client identification and rate limiting
//! for the protected write endpoints.
//!
//! Origin failures are refused before the limiter is consulted, so forged
//! cross-site posts never consume a legitimate client's quota.

use crate::client_id;
use crate::config::{Config, ConfigError};
use crate::limiter::{RateLimitPolicy, RateLimiter};
use crate::metrics::GateMetrics;
use crate::origin::{OriginError, OriginValidator};
use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// A protected operation. Each has its own quota per client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Contact,
    Newsletter,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Newsletter => "newsletter",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policies for every protected operation.
#[derive(Debug, Clone, Copy)]
pub struct GatePolicies {
    pub contact: RateLimitPolicy,
    pub newsletter: RateLimitPolicy,
}

impl GatePolicies {
    pub fn for_operation(&self, operation: Operation) -> &RateLimitPolicy {
        match operation {
            Operation::Contact => &self.contact,
            Operation::Newsletter => &self.newsletter,
        }
    }
}

/// Quota state reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaInfo {
    pub limit: u32,
    pub remaining: u32,
    pub reset_in: u64,
}

impl QuotaInfo {
    /// `X-RateLimit-*` headers.
    pub fn headers(&self) -> [(&'static str, String); 3] {
        [
            ("X-RateLimit-Limit", self.limit.to_string()),
            ("X-RateLimit-Remaining", self.remaining.to_string()),
            ("X-RateLimit-Reset", self.reset_in.to_string()),
        ]
    }
}

/// An admitted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub client_id: String,
    pub quota: QuotaInfo,
}

/// Why a request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateRejection {
    /// Cross-site or origin-less request
    OriginRejected(OriginError),
    /// Quota for this window is spent
    RateLimited(QuotaInfo),
}

#[derive(Serialize)]
struct RejectionBody {
    error: &'static str,
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        match self {
            GateRejection::OriginRejected(_) => (
                StatusCode::FORBIDDEN,
                Json(RejectionBody {
                    error: "Invalid request origin",
                }),
            )
                .into_response(),
            GateRejection::RateLimited(quota) => {
                let [limit, remaining, reset] = quota.headers();
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [
                        ("Retry-After", quota.reset_in.to_string()),
                        limit,
                        remaining,
                        reset,
                    ],
                    Json(RejectionBody {
                        error: "Too many requests. Please try again later.",
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// Composes origin validation, client identification and rate limiting.
pub struct RequestGate {
    origin: OriginValidator,
    limiter: Arc<RateLimiter>,
    policies: GatePolicies,
    metrics: Arc<GateMetrics>,
}

impl RequestGate {
    pub fn new(
        origin: OriginValidator,
        limiter: Arc<RateLimiter>,
        policies: GatePolicies,
        metrics: Arc<GateMetrics>,
    ) -> Self {
        Self {
            origin,
            limiter,
            policies,
            metrics,
        }
    }

    /// Build a gate and its limiter from validated configuration.
    pub fn from_config(config: &Config, metrics: Arc<GateMetrics>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            OriginValidator::from_config(&config.site)?,
            Arc::new(RateLimiter::new(config.limiter.clone())),
            GatePolicies {
                contact: config.policies.contact.to_policy(),
                newsletter: config.policies.newsletter.to_policy(),
            },
            metrics,
        ))
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn policies(&self) -> &GatePolicies {
        &self.policies
    }

    /// Decide whether a request for `operation` may proceed.
    pub fn admit(
        &self,
        operation: Operation,
        headers: &HeaderMap,
        peer: Option<IpAddr>,
    ) -> Result<Admission, GateRejection> {
        if let Err(err) = self.origin.check(headers) {
            info!(%operation, error = %err, "Request origin rejected");
            self.metrics.record_decision(operation.as_str(), "origin_rejected");
            return Err(GateRejection::OriginRejected(err));
        }

        let client_id = client_id::identify(headers, peer);
        let key = format!("{}:{}", operation.as_str(), client_id);
        let policy = self.policies.for_operation(operation);
        let decision = self.limiter.check(&key, policy);
        self.metrics.record_evictions(self.limiter.take_inline_evictions());
        self.metrics.set_limiter_entries(self.limiter.len());

        let quota = QuotaInfo {
            limit: policy.limit,
            remaining: decision.remaining,
            reset_in: decision.reset_in,
        };

        if !decision.allowed {
            info!(
                %operation,
                client = %client_id,
                retry_after_secs = decision.reset_in,
                "Request rate limited"
            );
            self.metrics.record_decision(operation.as_str(), "rate_limited");
            return Err(GateRejection::RateLimited(quota));
        }

        debug!(%operation, client = %client_id, remaining = decision.remaining, "Request admitted");
        self.metrics.record_decision(operation.as_str(), "admitted");
        Ok(Admission { client_id, quota })
    }

    /// Evict stale limiter entries and refresh the gauges.
    pub fn sweep(&self) -> usize {
        let evicted = self.limiter.sweep();
        self.metrics.record_evictions(evicted);
        self.metrics.set_limiter_entries(self.limiter.len());
        evicted
    }
}
