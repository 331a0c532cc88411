//! Screening metrics
//!
//! Decision counts and per-rule trigger counts across evaluations. All
//! counters live behind one lock so every snapshot satisfies
//! `total_screened == approved + review + blocked`.
//!
//! # Prometheus
//!
//! - `kyc_screenings_total{decision}` - screenings per decision outcome
//! - `kyc_rule_triggers_total{rule}` - evaluations decided by each rule

use crate::error::Result;
use crate::types::Decision;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct Counters {
    total_screened: u64,
    approved: u64,
    review: u64,
    blocked: u64,
    by_rule: BTreeMap<String, u64>,
    last_updated: Option<DateTime<Utc>>,
}

/// Share of each decision over all screenings, in percent (one decimal)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionPercentages {
    pub approved: f64,
    pub review: f64,
    pub blocked: f64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_screened: u64,
    pub approved: u64,
    pub review: u64,
    pub blocked: u64,
    pub by_rule: BTreeMap<String, u64>,
    pub last_updated: Option<DateTime<Utc>>,
    pub percentages: DecisionPercentages,
}

fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Thread-safe metrics aggregator
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    counters: Mutex<Counters>,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one evaluation
    pub fn record(&self, decision: Decision, rule_id: &str) {
        let mut counters = self.counters.lock();
        counters.total_screened += 1;
        match decision {
            Decision::Approve => counters.approved += 1,
            Decision::Review => counters.review += 1,
            Decision::Block => counters.blocked += 1,
        }
        *counters.by_rule.entry(rule_id.to_string()).or_insert(0) += 1;
        counters.last_updated = Some(Utc::now());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self.counters.lock();
        let total = counters.total_screened;
        MetricsSnapshot {
            total_screened: total,
            approved: counters.approved,
            review: counters.review,
            blocked: counters.blocked,
            by_rule: counters.by_rule.clone(),
            last_updated: counters.last_updated,
            percentages: DecisionPercentages {
                approved: percentage(counters.approved, total),
                review: percentage(counters.review, total),
                blocked: percentage(counters.blocked, total),
            },
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        *self.counters.lock() = Counters::default();
    }

    /// Render the current counters in Prometheus text format
    pub fn render_prometheus(&self) -> Result<String> {
        let snapshot = self.snapshot();
        let registry = Registry::new();

        let screenings = IntCounterVec::new(
            Opts::new("kyc_screenings_total", "Screenings by decision outcome"),
            &["decision"],
        )?;
        registry.register(Box::new(screenings.clone()))?;

        let rule_triggers = IntCounterVec::new(
            Opts::new("kyc_rule_triggers_total", "Evaluations decided by each rule"),
            &["rule"],
        )?;
        registry.register(Box::new(rule_triggers.clone()))?;

        for (decision, count) in [
            (Decision::Approve, snapshot.approved),
            (Decision::Review, snapshot.review),
            (Decision::Block, snapshot.blocked),
        ] {
            screenings
                .with_label_values(&[decision.as_str()])
                .inc_by(count);
        }
        for (rule, count) in &snapshot.by_rule {
            rule_triggers.with_label_values(&[rule.as_str()]).inc_by(*count);
        }

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| crate::Error::Metrics(e.to_string()))
    }
}
