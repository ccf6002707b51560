// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the request gate service.
//!
//! Defaults mirror the limits the site has always shipped with: five contact
//! submissions and three newsletter signups per client per minute.

use crate::captcha::CaptchaMode;
use crate::limiter::RateLimitPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Configuration errors detected at startup.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Rate limit for {operation} must be greater than zero")]
    ZeroLimit { operation: &'static str },

    #[error("Rate limit window for {operation} must be greater than zero")]
    ZeroWindow { operation: &'static str },

    #[error("At least one site base URL is required")]
    NoBaseUrls,

    #[error("Invalid site base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Limiter retention must be at least one window")]
    ZeroRetention,

    #[error("Metrics path {0:?} must start with '/' and not shadow another route")]
    InvalidMetricsPath(String),
}

/// Paths served by the router regardless of configuration.
pub const RESERVED_PATHS: &[&str] = &["/health", "/healthz", "/api/contact", "/api/newsletter"];

/// Configuration for the request gate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Site identity and origin allow-list seed
    #[serde(default)]
    pub site: SiteConfig,

    /// Per-operation rate limit policies
    #[serde(default)]
    pub policies: PoliciesConfig,

    /// Limiter table housekeeping
    #[serde(default)]
    pub limiter: LimiterConfig,

    /// CAPTCHA verification
    #[serde(default)]
    pub captcha: CaptchaConfig,

    /// Outbound email
    #[serde(default)]
    pub email: EmailConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Site identity. The base URLs seed the origin allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Display name used in outgoing emails
    #[serde(default = "default_site_name")]
    pub name: String,

    /// Canonical base URL(s) of the site (default: https://nostr-wot.com)
    #[serde(default = "default_base_urls")]
    pub base_urls: Vec<String>,

    /// Derive the origin from Referer when Origin is absent (default: true)
    #[serde(default = "default_true")]
    pub allow_referer_fallback: bool,
}

/// Rate limit policies, one per protected operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoliciesConfig {
    #[serde(default = "default_contact_policy")]
    pub contact: PolicyConfig,

    #[serde(default = "default_newsletter_policy")]
    pub newsletter: PolicyConfig,
}

/// A single `{limit, window_ms}` pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyConfig {
    /// Maximum admitted requests per window
    pub limit: u32,

    /// Window length in milliseconds
    pub window_ms: u64,
}

/// Housekeeping for the in-memory limiter table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Entries idle for this many of their own windows are evicted (default: 5)
    #[serde(default = "default_retention_windows")]
    pub retention_windows: u32,

    /// Interval between background sweeps in seconds (default: 60)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Table size that triggers an inline sweep before inserting a new key
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

/// CAPTCHA verification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaConfig {
    /// Provider secret. Verification is disabled when unset.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Minimum acceptable score (default: 0.5)
    #[serde(default = "default_min_score")]
    pub min_score: f64,

    /// Provider verification endpoint
    #[serde(default = "default_captcha_verify_url")]
    pub verify_url: String,
}

/// Outbound email settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Provider API key. Email is reported as not configured when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Provider send endpoint
    #[serde(default = "default_email_api_url")]
    pub api_url: String,

    /// Sender address
    #[serde(default = "default_email_from")]
    pub from: String,

    /// Inbox receiving contact and signup notifications
    #[serde(default = "default_contact_email")]
    pub contact_email: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_site_name() -> String {
    "Nostr WoT".to_string()
}

fn default_base_urls() -> Vec<String> {
    vec!["https://nostr-wot.com".to_string()]
}

fn default_contact_policy() -> PolicyConfig {
    PolicyConfig {
        limit: 5,
        window_ms: 60_000,
    }
}

fn default_newsletter_policy() -> PolicyConfig {
    PolicyConfig {
        limit: 3,
        window_ms: 60_000,
    }
}

fn default_retention_windows() -> u32 {
    5
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_max_entries() -> usize {
    100_000
}

fn default_min_score() -> f64 {
    0.5
}

fn default_captcha_verify_url() -> String {
    "https://www.google.com/recaptcha/api/siteverify".to_string()
}

fn default_email_api_url() -> String {
    "https://api.resend.com/emails".to_string()
}

fn default_email_from() -> String {
    "Nostr WoT <noreply@nostr-wot.com>".to_string()
}

fn default_contact_email() -> String {
    "contact@nostr-wot.com".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            site: SiteConfig::default(),
            policies: PoliciesConfig::default(),
            limiter: LimiterConfig::default(),
            captcha: CaptchaConfig::default(),
            email: EmailConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            base_urls: default_base_urls(),
            allow_referer_fallback: default_true(),
        }
    }
}

impl Default for PoliciesConfig {
    fn default() -> Self {
        Self {
            contact: default_contact_policy(),
            newsletter: default_newsletter_policy(),
        }
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            retention_windows: default_retention_windows(),
            sweep_interval_secs: default_sweep_interval_secs(),
            max_entries: default_max_entries(),
        }
    }
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            min_score: default_min_score(),
            verify_url: default_captcha_verify_url(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_email_api_url(),
            from: default_email_from(),
            contact_email: default_contact_email(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source, starting from
    /// defaults and overriding whatever the source provides.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Some(urls) = lookup("SITE_BASE_URLS") {
            config.site.base_urls = split_list(&urls);
        }
        if let Some(url) = lookup("NEXT_PUBLIC_BASE_URL") {
            let url = url.trim().to_string();
            if !url.is_empty() && !config.site.base_urls.contains(&url) {
                config.site.base_urls.push(url);
            }
        }
        if let Some(name) = lookup("SITE_NAME") {
            config.site.name = name;
        }
        if let Some(fallback) = parse_var(&lookup, "ALLOW_REFERER_FALLBACK") {
            config.site.allow_referer_fallback = fallback;
        }

        if let Some(limit) = parse_var(&lookup, "CONTACT_RATE_LIMIT") {
            config.policies.contact.limit = limit;
        }
        if let Some(window) = parse_var(&lookup, "CONTACT_WINDOW_MS") {
            config.policies.contact.window_ms = window;
        }
        if let Some(limit) = parse_var(&lookup, "NEWSLETTER_RATE_LIMIT") {
            config.policies.newsletter.limit = limit;
        }
        if let Some(window) = parse_var(&lookup, "NEWSLETTER_WINDOW_MS") {
            config.policies.newsletter.window_ms = window;
        }

        if let Some(retention) = parse_var(&lookup, "RATE_LIMIT_RETENTION_WINDOWS") {
            config.limiter.retention_windows = retention;
        }
        if let Some(secs) = parse_var(&lookup, "RATE_LIMIT_SWEEP_SECS") {
            config.limiter.sweep_interval_secs = secs;
        }
        if let Some(max) = parse_var(&lookup, "RATE_LIMIT_MAX_ENTRIES") {
            config.limiter.max_entries = max;
        }

        config.captcha.secret_key = lookup("RECAPTCHA_SECRET_KEY").filter(|s| !s.trim().is_empty());
        if let Some(score) = parse_var(&lookup, "RECAPTCHA_MIN_SCORE") {
            config.captcha.min_score = score;
        }

        config.email.api_key = lookup("RESEND_API_KEY").filter(|s| !s.trim().is_empty());
        if let Some(from) = lookup("EMAIL_FROM") {
            config.email.from = from;
        }
        if let Some(to) = lookup("CONTACT_EMAIL") {
            config.email.contact_email = to;
        }

        if let Some(enabled) = parse_var(&lookup, "METRICS_ENABLED") {
            config.metrics.enabled = enabled;
        }
        if let Some(path) = lookup("METRICS_PATH") {
            config.metrics.path = path;
        }

        config
    }

    /// Reject configurations the gate cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policies.contact.check("contact")?;
        self.policies.newsletter.check("newsletter")?;

        if self.limiter.retention_windows == 0 {
            return Err(ConfigError::ZeroRetention);
        }

        if self.metrics.enabled {
            let path = self.metrics.path.as_str();
            if !path.starts_with('/') || path.len() < 2 || RESERVED_PATHS.contains(&path) {
                return Err(ConfigError::InvalidMetricsPath(path.to_string()));
            }
        }

        if self.site.base_urls.is_empty() {
            return Err(ConfigError::NoBaseUrls);
        }
        for raw in &self.site.base_urls {
            match Url::parse(raw) {
                Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {}
                _ => return Err(ConfigError::InvalidBaseUrl(raw.clone())),
            }
        }

        Ok(())
    }

    /// Public URL used for links in outgoing emails.
    pub fn site_url(&self) -> &str {
        self.site
            .base_urls
            .first()
            .map(|s| s.trim_end_matches('/'))
            .unwrap_or("")
    }
}

impl PolicyConfig {
    fn check(&self, operation: &'static str) -> Result<(), ConfigError> {
        if self.limit == 0 {
            return Err(ConfigError::ZeroLimit { operation });
        }
        if self.window_ms == 0 {
            return Err(ConfigError::ZeroWindow { operation });
        }
        Ok(())
    }

    /// Convert into the limiter's policy type.
    pub fn to_policy(self) -> RateLimitPolicy {
        RateLimitPolicy::new(self.limit, Duration::from_millis(self.window_ms))
    }
}

impl LimiterConfig {
    /// Get the background sweep interval
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl CaptchaConfig {
    /// Resolve the verification mode. A missing secret disables checks.
    pub fn mode(&self) -> CaptchaMode {
        match &self.secret_key {
            Some(secret) => CaptchaMode::Enforced {
                secret: secret.clone(),
                min_score: self.min_score,
            },
            None => CaptchaMode::Disabled,
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
