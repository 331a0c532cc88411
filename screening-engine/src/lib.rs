//! KYC screening engine
//!
//! Screens applicant identity attributes against a sanctions/PEP watchlist
//! and operator-editable decision rules, producing an auditable
//! APPROVE / REVIEW / BLOCK decision plus running metrics.
//!
//! # Invariants
//!
//! - Exactly one rule (or none, yielding REVIEW) decides each evaluation
//! - Rule order is total and stable: priority, then stored order
//! - `total_screened == approved + review + blocked` in every snapshot
//! - Readers see whole rule/watchlist snapshots, never a partial reload

#![forbid(unsafe_code)]

pub mod adverse_media;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod matcher;
pub mod metrics;
pub mod rules;
pub mod service;
pub mod types;
pub mod value;
pub mod watchlist;

pub use adverse_media::{AdverseMediaProvider, AdverseMediaSummary, NoAdverseMedia, Severity};
pub use config::Config;
pub use error::{Error, Result};
pub use evaluator::{EnrichedAttributes, EvaluationResult, RuleEvaluator};
pub use metrics::{MetricsAggregator, MetricsSnapshot};
pub use rules::{RuleStore, UpsertOutcome};
pub use service::{ScreeningOutcome, ScreeningService};
pub use types::{
    Condition, Decision, ListType, MatchResult, Operator, Rule, RuleConfig, WatchlistEntry,
};
pub use value::{Attributes, Value};
pub use watchlist::WatchlistStore;
