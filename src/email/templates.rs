// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Email bodies for contact and newsletter flows.
//!
//! Every user-supplied value is HTML-escaped before it is placed in markup.
//! Plain-text bodies carry the raw values.

use crate::forms::{ContactForm, ContactKind};
use chrono::{DateTime, Utc};

/// Rendered subject and bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Site identity stamped into every email.
#[derive(Debug, Clone)]
pub struct Branding {
    pub site_name: String,
    pub site_url: String,
}

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

fn base_layout(brand: &Branding, content: &str, now: DateTime<Utc>) -> String {
    let name = escape_html(&brand.site_name);
    let url = escape_html(&brand.site_url);
    let host = brand
        .site_url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{name}</title>
</head>
<body style="margin: 0; padding: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Arial, sans-serif; background-color: #f5f5f5;">
  <table role="presentation" style="width: 100%; border-collapse: collapse;">
    <tr>
      <td style="padding: 40px 20px;">
        <table role="presentation" style="max-width: 600px; margin: 0 auto; background-color: #ffffff; border-radius: 12px;">
          <tr>
            <td style="padding: 32px 40px; background: linear-gradient(135deg, #8b5cf6 0%, #6366f1 100%); text-align: center;">
              <h1 style="margin: 0; color: #ffffff; font-size: 24px;">{name}</h1>
            </td>
          </tr>
          <tr>
            <td style="padding: 40px;">
              {content}
            </td>
          </tr>
          <tr>
            <td style="padding: 24px 40px; background-color: #f9fafb; border-top: 1px solid #e5e7eb;">
              <p style="margin: 0; font-size: 12px; color: #6b7280; text-align: center;">&copy; {year} {name}. All rights reserved.</p>
              <p style="margin: 8px 0 0; font-size: 12px; text-align: center;"><a href="{url}" style="color: #8b5cf6; text-decoration: none;">{host}</a></p>
            </td>
          </tr>
        </table>
      </td>
    </tr>
  </table>
</body>
</html>"#,
        year = now.format("%Y"),
        host = escape_html(host),
    )
}

fn detail_row(label: &str, value: &str) -> String {
    format!(
        r#"<tr><td style="padding: 12px 0; border-bottom: 1px solid #e5e7eb;"><strong style="color: #6b7280;">{label}:</strong> <span style="color: #111827; margin-left: 8px;">{value}</span></td></tr>"#
    )
}

/// Notification to the site inbox about a contact submission.
pub fn contact_notification(
    brand: &Branding,
    form: &ContactForm,
    now: DateTime<Utc>,
) -> RenderedEmail {
    let label = form.kind.label();
    let organization = form
        .organization
        .as_deref()
        .map(str::trim)
        .filter(|o| !o.is_empty());

    let mut rows = detail_row(
        "From",
        &format!("{} ({})", escape_html(&form.name), escape_html(&form.email)),
    );
    if let Some(org) = organization {
        rows.push_str(&detail_row("Organization", &escape_html(org)));
    }
    rows.push_str(&detail_row("Subject", &escape_html(&form.subject)));
    rows.push_str(&detail_row("Type", label));

    let content = format!(
        r#"<h2 style="margin: 0 0 24px; color: #111827; font-size: 20px;">New {label}</h2>
<table role="presentation" style="width: 100%; border-collapse: collapse; margin-bottom: 24px;">{rows}</table>
<div style="background-color: #f9fafb; padding: 20px; border-radius: 8px; margin-bottom: 24px;">
  <h3 style="margin: 0 0 12px; color: #374151; font-size: 14px;">Message:</h3>
  <p style="margin: 0; color: #4b5563; white-space: pre-wrap; line-height: 1.6;">{message}</p>
</div>
<p style="margin: 0; font-size: 12px; color: #9ca3af;">Sent from the {site} contact form on {date}</p>"#,
        message = escape_html(&form.message),
        site = escape_html(&brand.site_name),
        date = now.format("%A, %B %-d, %Y at %H:%M UTC"),
    );

    let mut text = format!("New {label}\n\nFrom: {} ({})\n", form.name, form.email);
    if let Some(org) = organization {
        text.push_str(&format!("Organization: {org}\n"));
    }
    text.push_str(&format!(
        "Subject: {}\n\nMessage:\n{}\n\n---\nSent from the {} contact form on {}",
        form.subject,
        form.message,
        brand.site_name,
        now.to_rfc3339(),
    ));

    RenderedEmail {
        subject: format!("[{}] {}", form.kind.tag(), form.subject),
        html: base_layout(brand, &content, now),
        text,
    }
}

/// Acknowledgement sent back to whoever submitted the contact form.
pub fn contact_confirmation(
    brand: &Branding,
    name: &str,
    kind: ContactKind,
    now: DateTime<Utc>,
) -> RenderedEmail {
    let what = kind.label().to_lowercase();
    let docs = format!("{}/docs", brand.site_url);
    let content = format!(
        r#"<h2 style="margin: 0 0 24px; color: #111827; font-size: 20px;">We received your message!</h2>
<p style="margin: 0 0 16px; color: #4b5563; line-height: 1.6;">Hi {name},</p>
<p style="margin: 0 0 16px; color: #4b5563; line-height: 1.6;">Thank you for reaching out to us. We've received your {what} and our team will review it shortly.</p>
<p style="margin: 0 0 24px; color: #4b5563; line-height: 1.6;">We typically respond within <strong>24-48 hours</strong>. In the meantime, feel free to explore our <a href="{docs}" style="color: #8b5cf6;">documentation</a>.</p>
<p style="margin: 24px 0 0; color: #6b7280; font-size: 14px;">Best regards,<br><strong style="color: #111827;">The {site} Team</strong></p>"#,
        name = escape_html(name),
        docs = escape_html(&docs),
        site = escape_html(&brand.site_name),
    );

    let text = format!(
        "Hi {name},\n\nThank you for reaching out to us. We've received your {what} and our team will review it shortly.\n\nWe typically respond within 24-48 hours. In the meantime, feel free to explore our documentation at {docs}\n\nBest regards,\nThe {} Team",
        brand.site_name,
    );

    RenderedEmail {
        subject: format!("We received your message - {}", brand.site_name),
        html: base_layout(brand, &content, now),
        text,
    }
}

/// Notification to the site inbox about a new subscriber.
pub fn newsletter_notification(brand: &Branding, email: &str, now: DateTime<Utc>) -> RenderedEmail {
    let date = now.format("%A, %B %-d, %Y at %H:%M UTC").to_string();
    let content = format!(
        r#"<h2 style="margin: 0 0 24px; color: #111827; font-size: 20px;">New Newsletter Subscriber</h2>
<table role="presentation" style="width: 100%; border-collapse: collapse; margin-bottom: 24px;">{rows}</table>
<p style="margin: 0; font-size: 12px; color: #9ca3af;">Subscribed via the {site} website.</p>"#,
        rows = detail_row("Email", &escape_html(email)) + &detail_row("Date", &date),
        site = escape_html(&brand.site_name),
    );

    let text = format!(
        "New Newsletter Subscriber\n\nEmail: {email}\nDate: {}\n\n---\nSubscribed via the {} website.",
        now.to_rfc3339(),
        brand.site_name,
    );

    RenderedEmail {
        subject: "[Newsletter] New Subscriber".to_string(),
        html: base_layout(brand, &content, now),
        text,
    }
}

/// Welcome email sent to a new subscriber.
pub fn newsletter_welcome(brand: &Branding, now: DateTime<Utc>) -> RenderedEmail {
    let download = format!("{}/download", brand.site_url);
    let features = format!("{}/features", brand.site_url);
    let content = format!(
        r#"<h2 style="margin: 0 0 24px; color: #111827; font-size: 20px;">Welcome to the {site} Newsletter!</h2>
<p style="margin: 0 0 16px; color: #4b5563; line-height: 1.6;">Thanks for subscribing! You're now part of our community.</p>
<p style="margin: 0 0 16px; color: #4b5563; line-height: 1.6;">We'll keep you updated on:</p>
<ul style="margin: 0 0 24px; padding-left: 24px; color: #4b5563; line-height: 1.8;">
  <li><strong>New features</strong> and improvements to the extension</li>
  <li><strong>Integration guides</strong> for Nostr app developers</li>
  <li><strong>Web of Trust insights</strong> and best practices</li>
  <li><strong>Community highlights</strong> and ecosystem updates</li>
</ul>
<p style="margin: 0 0 24px; color: #4b5563; line-height: 1.6;">We respect your inbox and only send relevant updates. No spam, ever.</p>
<p style="margin: 0 0 24px; color: #166534; font-size: 14px;"><strong>Get started:</strong> If you haven't already, <a href="{download}" style="color: #15803d;">download the extension</a>.</p>
<p style="text-align: center;"><a href="{features}" style="display: inline-block; padding: 12px 24px; background: #6366f1; color: #ffffff; text-decoration: none; border-radius: 8px; font-weight: 600;">Explore Features</a></p>
<p style="margin: 24px 0 0; color: #6b7280; font-size: 14px;">Welcome aboard!<br><strong style="color: #111827;">The {site} Team</strong></p>"#,
        site = escape_html(&brand.site_name),
        download = escape_html(&download),
        features = escape_html(&features),
    );

    let text = format!(
        "Welcome to the {site} Newsletter!\n\nThanks for subscribing! You're now part of our community.\n\nWe'll keep you updated on:\n- New features and improvements to the extension\n- Integration guides for Nostr app developers\n- Web of Trust insights and best practices\n- Community highlights and ecosystem updates\n\nWe respect your inbox and only send relevant updates. No spam, ever.\n\nGet started: If you haven't already, download the extension at {download}\n\nWelcome aboard!\nThe {site} Team",
        site = brand.site_name,
    );

    RenderedEmail {
        subject: format!("Welcome to {} - You're subscribed!", brand.site_name),
        html: base_layout(brand, &content, now),
        text,
    }
}
