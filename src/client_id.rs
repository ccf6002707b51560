// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client identification for rate limit keys.
//!
//! The identity is best-effort: it is only used to shape abuse, never to
//! authenticate. Clients behind a shared proxy share a bucket.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Identity used when no address information is usable.
pub const UNKNOWN_CLIENT: &str = "unknown";

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

/// Derive an identity string for a request.
///
/// Tries the first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// transport peer. Values that are not IP addresses are skipped.
pub fn identify(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    let forwarded = header_str(headers, FORWARDED_FOR)
        .and_then(|v| v.split(',').next())
        .and_then(parse_addr);

    forwarded
        .or_else(|| header_str(headers, REAL_IP).and_then(parse_addr))
        .or(peer)
        .map(|ip| canonical(ip).to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Accepts a bare address or a `host:port` / `[v6]:port` socket address.
fn parse_addr(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<SocketAddr>().ok().map(|s| s.ip()))
}

/// Fold IPv4-mapped IPv6 addresses onto their IPv4 form so dual-stack
/// listeners do not split one client across two buckets.
fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map(IpAddr::V4)
            .unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    }
}
