// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! CAPTCHA verification for form submissions.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Whether submissions must carry a verified CAPTCHA token.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptchaMode {
    /// Every token passes. Used where no provider secret is provisioned.
    Disabled,
    /// Tokens are checked with the provider and must reach `min_score`.
    Enforced { secret: String, min_score: f64 },
}

/// Result of a verification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptchaVerdict {
    Passed,
    /// Provider said no, or the score was too low
    Failed { score: Option<f64> },
    /// Verification is disabled
    Skipped,
}

impl CaptchaVerdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, CaptchaVerdict::Passed | CaptchaVerdict::Skipped)
    }
}

#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("CAPTCHA provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("CAPTCHA provider returned status {0}")]
    Status(u16),
}

/// Verifies CAPTCHA tokens.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, token: Option<&str>) -> Result<CaptchaVerdict, CaptchaError>;
}

/// Provider response from the siteverify endpoint.
#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// reCAPTCHA v3 client.
pub struct RecaptchaVerifier {
    mode: CaptchaMode,
    verify_url: String,
    client: reqwest::Client,
}

impl RecaptchaVerifier {
    pub fn new(mode: CaptchaMode, verify_url: String) -> Self {
        Self {
            mode,
            verify_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn mode(&self) -> &CaptchaMode {
        &self.mode
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaVerifier {
    async fn verify(&self, token: Option<&str>) -> Result<CaptchaVerdict, CaptchaError> {
        let (secret, min_score) = match &self.mode {
            CaptchaMode::Disabled => return Ok(CaptchaVerdict::Skipped),
            CaptchaMode::Enforced { secret, min_score } => (secret, *min_score),
        };

        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(CaptchaVerdict::Failed { score: None }),
        };

        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", secret.as_str()), ("response", token)])
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "CAPTCHA provider error");
            return Err(CaptchaError::Status(response.status().as_u16()));
        }

        let body: SiteVerifyResponse = response.json().await?;
        Ok(judge(&body, min_score))
    }
}

fn judge(body: &SiteVerifyResponse, min_score: f64) -> CaptchaVerdict {
    // Tokens without a score (v2 checkbox) are judged on success alone.
    let score_ok = body.score.map_or(true, |s| s >= min_score);
    if body.success && score_ok {
        CaptchaVerdict::Passed
    } else {
        debug!(
            success = body.success,
            score = ?body.score,
            errors = ?body.error_codes,
            "CAPTCHA rejected"
        );
        CaptchaVerdict::Failed { score: body.score }
    }
}
