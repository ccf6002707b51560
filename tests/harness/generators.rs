// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for attack simulation.

use axum::http::{HeaderMap, HeaderValue};
use std::net::{IpAddr, Ipv4Addr};

pub const SITE: &str = "https://nostr-wot.com";

/// Generate a pool of IP addresses for testing.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// Origins of sites that must never be allowed to post.
pub fn generate_forged_origins() -> Vec<&'static str> {
    vec![
        "https://evil.example",
        "https://nostr-wot.com.evil.example",
        "https://evil-nostr-wot.com",
        "http://nostr-wot.com",
        "https://nostr-wot.com:8443",
        "https://sub.nostr-wot.com",
    ]
}

/// Origin header values that are not a bare origin at all.
pub fn generate_malformed_origins() -> Vec<&'static str> {
    vec![
        "",
        "   ",
        "null",
        "nostr-wot.com",
        "https://nostr-wot.com/",
        "https://nostr-wot.com/contact",
        "https://user@nostr-wot.com",
        "javascript:alert(1)",
        "file:///etc/passwd",
    ]
}

/// Spellings of the site origin that must still match.
pub fn generate_equivalent_origins() -> Vec<&'static str> {
    vec![
        "https://nostr-wot.com",
        "HTTPS://NOSTR-WOT.COM",
        "https://Nostr-WoT.com:443",
    ]
}

/// Headers for one simulated request.
pub fn request_headers(origin: Option<&str>, referer: Option<&str>, forwarded_for: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(origin) = origin {
        headers.insert("origin", HeaderValue::from_str(origin).unwrap());
    }
    if let Some(referer) = referer {
        headers.insert("referer", HeaderValue::from_str(referer).unwrap());
    }
    headers.insert("x-forwarded-for", HeaderValue::from_str(forwarded_for).unwrap());
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ips() {
        let ips = generate_ips(256);
        assert_eq!(ips.len(), 256);
        // All should be unique
        let unique: std::collections::HashSet<_> = ips.iter().collect();
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_request_headers() {
        let headers = request_headers(Some(SITE), None, "10.0.0.1");
        assert_eq!(headers["origin"], SITE);
        assert!(headers.get("referer").is_none());
    }
}
