// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact and newsletter form payloads.
//!
//! Bodies are deserialized leniently (every field optional) and then
//! validated, so a missing field produces a form error instead of a
//! deserialization failure.

use serde::Deserialize;
use thiserror::Error;

/// Maximum address length per RFC 5321.
pub const MAX_EMAIL_LENGTH: usize = 254;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid inquiry type")]
    InvalidKind,

    #[error("Email is required")]
    EmailRequired,

    #[error("Email must be 254 characters or less")]
    EmailTooLong,

    #[error("Invalid email format")]
    InvalidEmail,
}

/// Kind of contact inquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Support,
    Media,
}

impl ContactKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "support" => Some(Self::Support),
            "media" => Some(Self::Media),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Support => "Support Request",
            Self::Media => "Media Inquiry",
        }
    }

    /// Subject-line tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Support => "SUPPORT",
            Self::Media => "MEDIA",
        }
    }
}

/// Contact form body as posted by the site.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub organization: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub recaptcha_token: Option<String>,
}

/// A validated contact submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactForm {
    pub kind: ContactKind,
    pub name: String,
    pub email: String,
    pub organization: Option<String>,
    pub subject: String,
    pub message: String,
    pub recaptcha_token: Option<String>,
}

impl ContactSubmission {
    pub fn validate(self) -> Result<ContactForm, FormError> {
        let (kind, name, email, subject, message) = match (
            required(self.kind),
            required(self.name),
            required(self.email),
            required(self.subject),
            required(self.message),
        ) {
            (Some(k), Some(n), Some(e), Some(s), Some(m)) => (k, n, e, s, m),
            _ => return Err(FormError::MissingFields),
        };

        // Unknown kinds are refused, not filed as media inquiries.
        let kind = ContactKind::parse(&kind).ok_or(FormError::InvalidKind)?;
        let email = email.trim().to_string();
        if !is_plausible_email(&email) {
            return Err(FormError::InvalidEmail);
        }

        Ok(ContactForm {
            kind,
            name: name.trim().to_string(),
            email,
            organization: self.organization.filter(|o| !o.trim().is_empty()),
            subject: subject.trim().to_string(),
            message,
            recaptcha_token: self.recaptcha_token,
        })
    }
}

/// Newsletter signup body.
#[derive(Debug, Default, Deserialize)]
pub struct NewsletterSubmission {
    pub email: Option<String>,
}

impl NewsletterSubmission {
    /// Returns the normalized subscriber address.
    pub fn validate(self) -> Result<String, FormError> {
        let email = required(self.email).ok_or(FormError::EmailRequired)?;
        let email = email.trim();
        if email.len() > MAX_EMAIL_LENGTH {
            return Err(FormError::EmailTooLong);
        }
        if !is_valid_subscriber_email(email) {
            return Err(FormError::InvalidEmail);
        }
        Ok(email.to_string())
    }
}

fn required(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

/// Loose shape check: `local@domain.tld`, no whitespace, one `@`.
pub fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Stricter check for subscriber addresses: RFC 5322 atext local part and
/// a hostname-shaped domain.
pub fn is_valid_subscriber_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || !local.chars().all(is_local_char) {
        return false;
    }
    !domain.is_empty() && domain.split('.').all(is_domain_label)
}

fn is_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ".!#$%&'*+/=?^_`{|}~-".contains(c)
}

fn is_domain_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    bytes.len() <= 63
        && first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
}
