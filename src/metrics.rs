// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for gate decisions and limiter housekeeping.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Metrics owned by one gate instance.
pub struct GateMetrics {
    registry: Registry,
    decisions: IntCounterVec,
    limiter_entries: IntGauge,
    evictions: IntCounter,
}

impl GateMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let decisions = IntCounterVec::new(
            Opts::new("gate_decisions_total", "Gate decisions by operation and outcome"),
            &["operation", "outcome"],
        )?;
        let limiter_entries =
            IntGauge::new("gate_limiter_entries", "Keys tracked by the rate limiter")?;
        let evictions = IntCounter::new(
            "gate_limiter_evictions_total",
            "Stale rate limit entries evicted",
        )?;

        registry.register(Box::new(decisions.clone()))?;
        registry.register(Box::new(limiter_entries.clone()))?;
        registry.register(Box::new(evictions.clone()))?;

        Ok(Self {
            registry,
            decisions,
            limiter_entries,
            evictions,
        })
    }

    pub fn record_decision(&self, operation: &str, outcome: &str) {
        self.decisions.with_label_values(&[operation, outcome]).inc();
    }

    pub fn decision_count(&self, operation: &str, outcome: &str) -> u64 {
        self.decisions.with_label_values(&[operation, outcome]).get()
    }

    pub fn set_limiter_entries(&self, entries: usize) {
        self.limiter_entries.set(entries as i64);
    }

    pub fn record_evictions(&self, evicted: usize) {
        self.evictions.inc_by(evicted as u64);
    }

    /// Render in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
