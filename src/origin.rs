// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Origin validation for state-changing requests.
//!
//! A CSRF guard, not authentication: browsers attach `Origin` to cross-site
//! form posts, so anything that does not name one of the site's own origins
//! is refused before it reaches the rate limiter.

use crate::config::{ConfigError, SiteConfig};
use axum::http::{header, HeaderMap};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Why an origin was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OriginError {
    #[error("Missing Origin header")]
    Missing,

    #[error("Malformed origin: {0}")]
    Malformed(String),

    #[error("Origin not allowed: {0}")]
    NotAllowed(String),
}

/// Set of acceptable origins, serialized as `scheme://host[:port]`.
#[derive(Debug, Clone, Default)]
pub struct OriginAllowList {
    origins: HashSet<String>,
}

impl OriginAllowList {
    /// Build from the site's configured base URLs.
    pub fn from_base_urls<S: AsRef<str>>(base_urls: &[S]) -> Result<Self, ConfigError> {
        let mut origins = HashSet::new();
        for raw in base_urls {
            let raw = raw.as_ref();
            let origin = Url::parse(raw)
                .ok()
                .and_then(|url| web_origin(&url))
                .ok_or_else(|| ConfigError::InvalidBaseUrl(raw.to_string()))?;
            origins.insert(origin);
        }
        if origins.is_empty() {
            return Err(ConfigError::NoBaseUrls);
        }
        Ok(Self { origins })
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.origins.contains(origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.origins.iter().map(String::as_str)
    }
}

/// Origin validator for the protected endpoints.
#[derive(Debug, Clone)]
pub struct OriginValidator {
    allow_list: OriginAllowList,
    allow_referer_fallback: bool,
}

impl OriginValidator {
    pub fn new(allow_list: OriginAllowList, allow_referer_fallback: bool) -> Self {
        Self {
            allow_list,
            allow_referer_fallback,
        }
    }

    pub fn from_config(site: &SiteConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            OriginAllowList::from_base_urls(site.base_urls.as_slice())?,
            site.allow_referer_fallback,
        ))
    }

    pub fn allow_list(&self) -> &OriginAllowList {
        &self.allow_list
    }

    /// `true` only when the request's origin is on the allow-list.
    pub fn validate(&self, headers: &HeaderMap) -> bool {
        self.check(headers).is_ok()
    }

    /// Validate and report the reason for a refusal.
    pub fn check(&self, headers: &HeaderMap) -> Result<(), OriginError> {
        let origin = self.declared_origin(headers)?;
        if self.allow_list.contains(&origin) {
            Ok(())
        } else {
            debug!(%origin, "Origin not on allow-list");
            Err(OriginError::NotAllowed(origin))
        }
    }

    fn declared_origin(&self, headers: &HeaderMap) -> Result<String, OriginError> {
        if let Some(value) = headers.get(header::ORIGIN) {
            let raw = value
                .to_str()
                .map_err(|_| OriginError::Malformed("<non-ascii>".to_string()))?
                .trim();
            if raw.is_empty() {
                return Err(OriginError::Missing);
            }
            return parse_origin_header(raw);
        }

        if !self.allow_referer_fallback {
            return Err(OriginError::Missing);
        }

        let referer = headers
            .get(header::REFERER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(OriginError::Missing)?;

        Url::parse(referer)
            .ok()
            .and_then(|url| web_origin(&url))
            .ok_or_else(|| OriginError::Malformed(referer.to_string()))
    }
}

/// An `Origin` header carries nothing but scheme, host and port.
fn parse_origin_header(raw: &str) -> Result<String, OriginError> {
    let malformed = || OriginError::Malformed(raw.to_string());
    if raw.eq_ignore_ascii_case("null") {
        return Err(malformed());
    }

    let url = Url::parse(raw).map_err(|_| malformed())?;
    let bare = url.path() == "/"
        && !raw.ends_with('/')
        && url.query().is_none()
        && url.fragment().is_none()
        && url.username().is_empty()
        && url.password().is_none();
    if !bare {
        return Err(malformed());
    }

    web_origin(&url).ok_or_else(malformed)
}

/// Tuple origin of an http(s) URL with a host.
fn web_origin(url: &Url) -> Option<String> {
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    Some(url.origin().ascii_serialization())
}
