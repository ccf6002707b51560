// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Attack simulation patterns for security testing.

use site_request_gate::gate::Operation;

/// How the attacker fills in the Origin and Referer headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginStyle {
    /// Origin of the site itself
    SameSite,
    /// Origin of a third-party site
    Forged,
    /// Neither Origin nor Referer
    Missing,
    /// Same-site Referer without Origin
    RefererOnly,
}

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of requests to send
    pub total_requests: usize,
    /// Number of distinct client addresses
    pub unique_clients: usize,
    /// Operation under attack
    pub operation: Operation,
    /// Origin header strategy
    pub origin: OriginStyle,
    /// Put a fresh address in X-Forwarded-For on every request
    pub rotate_forwarded_for: bool,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            unique_clients: 1,
            operation: Operation::Contact,
            origin: OriginStyle::SameSite,
            rotate_forwarded_for: false,
        }
    }
}

/// Predefined attack patterns.
impl AttackConfig {
    /// Single client flood of the contact form.
    pub fn single_client_flood() -> Self {
        Self {
            total_requests: 200,
            ..Default::default()
        }
    }

    /// Distributed flood - many clients, a handful of requests each.
    pub fn distributed_flood() -> Self {
        Self {
            total_requests: 500,
            unique_clients: 100,
            ..Default::default()
        }
    }

    /// Newsletter signup spam from one client.
    pub fn newsletter_spam() -> Self {
        Self {
            total_requests: 50,
            operation: Operation::Newsletter,
            ..Default::default()
        }
    }

    /// Cross-site form posts riding on a visitor's browser.
    pub fn cross_site_forgery() -> Self {
        Self {
            total_requests: 100,
            unique_clients: 10,
            origin: OriginStyle::Forged,
            ..Default::default()
        }
    }

    /// Scripted posts that send no browser headers at all.
    pub fn headless_script() -> Self {
        Self {
            total_requests: 50,
            unique_clients: 5,
            origin: OriginStyle::Missing,
            ..Default::default()
        }
    }

    /// Same-site Referer from a browser that strips Origin.
    pub fn referer_only() -> Self {
        Self {
            total_requests: 20,
            origin: OriginStyle::RefererOnly,
            ..Default::default()
        }
    }

    /// One attacker rotating X-Forwarded-For to dodge the per-client key.
    pub fn forwarded_for_churn() -> Self {
        Self {
            total_requests: 300,
            rotate_forwarded_for: true,
            ..Default::default()
        }
    }

    /// Number of distinct limiter keys the attack can touch.
    pub fn distinct_clients(&self) -> usize {
        if self.rotate_forwarded_for {
            self.total_requests
        } else {
            self.unique_clients
        }
    }
}

/// Expected outcomes for an attack pattern.
pub struct AttackExpectations {
    /// Exact number of requests the gate should admit
    pub admitted: usize,
    /// Description of expected behavior
    pub description: &'static str,
}

impl AttackConfig {
    /// Expected outcomes when every request lands inside one window.
    pub fn expectations(&self, limit: u32) -> AttackExpectations {
        let limit = limit as usize;
        match self.origin {
            OriginStyle::Forged | OriginStyle::Missing => AttackExpectations {
                admitted: 0,
                description: "Every request should fail the origin check",
            },
            OriginStyle::SameSite | OriginStyle::RefererOnly => {
                let clients = self.distinct_clients();
                let per_client = self.total_requests / clients;
                let extra = self.total_requests % clients;
                // Round-robin: `extra` clients send one more request.
                let admitted = extra * (per_client + 1).min(limit)
                    + (clients - extra) * per_client.min(limit);
                AttackExpectations {
                    admitted,
                    description: "Each client should be capped at the policy limit",
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expectations() {
        assert_eq!(AttackConfig::single_client_flood().expectations(5).admitted, 5);
        assert_eq!(AttackConfig::distributed_flood().expectations(5).admitted, 500);
        assert_eq!(AttackConfig::distributed_flood().expectations(3).admitted, 300);
        assert_eq!(AttackConfig::cross_site_forgery().expectations(5).admitted, 0);
        assert_eq!(AttackConfig::forwarded_for_churn().expectations(5).admitted, 300);
    }
}
