//! Rule evaluation
//!
//! An evaluation runs in four steps against the currently loaded snapshots:
//! fuzzy-match the applicant name, enrich the raw attributes with match and
//! adverse-media signals, scan enabled rules in priority order for the first
//! whose conditions all hold, and record the outcome in the metrics
//! aggregator. When no rule holds the decision falls back to REVIEW.

use crate::matcher::best_match;
use crate::metrics::MetricsAggregator;
use crate::rules::RuleStore;
use crate::types::{
    Condition, Decision, ListType, MatchResult, Operator, Rule, FUZZY_MATCH_THRESHOLD,
};
use crate::value::{Attributes, Value};
use crate::watchlist::WatchlistStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Applicant field holding the name to screen
pub const NAME: &str = "name";
/// Derived: best watchlist score
pub const SANCTIONS_MATCH_SCORE: &str = "sanctions_match_score";
/// Derived: accepted match on a PEP list
pub const PEP_MATCH: &str = "pep_match";
/// Derived: accepted match on a sanctions list
pub const SANCTIONS_MATCH: &str = "sanctions_match";
/// Caller-supplied adverse-media hit count
pub const ADVERSE_MEDIA_COUNT: &str = "adverse_media_count";
/// Rule id recorded when no rule triggered
pub const UNKNOWN_RULE: &str = "unknown";

impl Condition {
    /// Test this condition against a single attribute value.
    ///
    /// Comparisons between incompatible variants are false.
    pub fn holds(&self, actual: &Value) -> bool {
        let ordering = || actual.compare(&self.value);
        match &self.op {
            Operator::Equals => *actual == self.value,
            Operator::Gte => matches!(ordering(), Some(Ordering::Greater | Ordering::Equal)),
            Operator::Gt => matches!(ordering(), Some(Ordering::Greater)),
            Operator::Lte => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
            Operator::Lt => matches!(ordering(), Some(Ordering::Less)),
            Operator::In => self
                .value
                .as_list()
                .map_or(false, |items| items.contains(actual)),
            Operator::Contains => self
                .value
                .as_str()
                .map_or(false, |needle| actual.to_string().contains(needle)),
            Operator::Unsupported(_) => false,
        }
    }

    /// Evaluate against enriched attributes; a missing field is false
    pub fn evaluate(&self, attributes: &EnrichedAttributes) -> bool {
        attributes
            .field(&self.field)
            .map_or(false, |actual| self.holds(&actual))
    }
}

/// Raw applicant attributes plus derived screening signals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedAttributes {
    #[serde(flatten)]
    pub raw: Attributes,
    pub sanctions_match_score: u8,
    pub pep_match: bool,
    pub sanctions_match: bool,
    pub adverse_media_count: f64,
    pub match_details: MatchResult,
}

impl EnrichedAttributes {
    /// Layer match-derived signals over the raw attributes. Derived fields
    /// shadow raw fields of the same name.
    pub fn new(mut raw: Attributes, match_result: MatchResult) -> Self {
        let adverse_media_count = raw
            .remove(ADVERSE_MEDIA_COUNT)
            .and_then(|v| v.as_f64())
            .filter(|n| n.is_finite() && *n >= 0.0)
            .unwrap_or(0.0);

        for derived in [SANCTIONS_MATCH_SCORE, PEP_MATCH, SANCTIONS_MATCH, "match_details"] {
            raw.remove(derived);
        }

        Self {
            raw,
            sanctions_match_score: match_result.match_score,
            pep_match: match_result.is_match_on(&ListType::Pep),
            sanctions_match: match_result.is_match_on(&ListType::Sanctions),
            adverse_media_count,
            match_details: match_result,
        }
    }

    /// Look up a field by name, derived fields first
    pub fn field(&self, name: &str) -> Option<Cow<'_, Value>> {
        let derived = match name {
            SANCTIONS_MATCH_SCORE => Value::from(self.sanctions_match_score),
            PEP_MATCH => Value::from(self.pep_match),
            SANCTIONS_MATCH => Value::from(self.sanctions_match),
            ADVERSE_MEDIA_COUNT => Value::from(self.adverse_media_count),
            _ => return self.raw.get(name).map(Cow::Borrowed),
        };
        Some(Cow::Owned(derived))
    }
}

/// First enabled rule whose conditions all hold. `rules` must already be
/// in priority order; an empty condition list always holds.
pub fn select_rule<'a>(
    rules: &'a [Rule],
    attributes: &EnrichedAttributes,
) -> Option<&'a Rule> {
    rules
        .iter()
        .filter(|rule| rule.enabled)
        .find(|rule| rule.conditions.iter().all(|c| c.evaluate(attributes)))
}

/// Outcome of one evaluation
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub evaluation_id: Uuid,
    pub decision: Decision,
    pub triggered_rule: Option<Rule>,
    pub match_result: MatchResult,
    pub enriched: EnrichedAttributes,
    pub timestamp: DateTime<Utc>,
}

impl EvaluationResult {
    pub fn triggered_rule_id(&self) -> &str {
        self.triggered_rule
            .as_ref()
            .map_or(UNKNOWN_RULE, |rule| rule.id.as_str())
    }
}

/// Evaluates applicants against the current watchlist and rule snapshots
pub struct RuleEvaluator {
    watchlist: Arc<WatchlistStore>,
    rules: Arc<RuleStore>,
    metrics: Arc<MetricsAggregator>,
    default_threshold: f64,
}

impl RuleEvaluator {
    pub fn new(
        watchlist: Arc<WatchlistStore>,
        rules: Arc<RuleStore>,
        metrics: Arc<MetricsAggregator>,
        default_threshold: f64,
    ) -> Self {
        Self {
            watchlist,
            rules,
            metrics,
            default_threshold,
        }
    }

    /// Fuzzy threshold in effect for the given rule snapshot
    fn threshold(&self, rules: &crate::types::RuleConfig) -> f64 {
        rules
            .threshold(FUZZY_MATCH_THRESHOLD)
            .unwrap_or(self.default_threshold)
    }

    /// Screen one applicant. Never fails: no match and no triggered rule
    /// are ordinary outcomes.
    pub fn evaluate(&self, attributes: &Attributes) -> EvaluationResult {
        let rules = self.rules.snapshot();
        let watchlist = self.watchlist.snapshot();

        let name = attributes.get(NAME).and_then(Value::as_str).unwrap_or("");
        let match_result = best_match(name, &watchlist, self.threshold(&rules));

        let enriched = EnrichedAttributes::new(attributes.clone(), match_result.clone());
        let triggered_rule = select_rule(&rules.rules, &enriched).cloned();
        let decision = triggered_rule
            .as_ref()
            .map_or(Decision::Review, |rule| rule.outcome);

        let result = EvaluationResult {
            evaluation_id: Uuid::new_v4(),
            decision,
            triggered_rule,
            match_result,
            enriched,
            timestamp: Utc::now(),
        };

        self.metrics.record(decision, result.triggered_rule_id());

        if decision != Decision::Approve {
            info!(
                "Screening {} for {} (rule: {}, score: {}, id: {})",
                decision.as_str(),
                name,
                result.triggered_rule_id(),
                result.match_result.match_score,
                result.evaluation_id
            );
        }

        result
    }
}
