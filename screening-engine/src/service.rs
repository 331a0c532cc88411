use crate::adverse_media::{AdverseMediaProvider, AdverseMediaSummary};
use crate::config::Config;
use crate::error::Result;
use crate::evaluator::{EvaluationResult, RuleEvaluator, ADVERSE_MEDIA_COUNT, NAME};
use crate::metrics::{MetricsAggregator, MetricsSnapshot};
use crate::rules::RuleStore;
use crate::types::{Decision, MatchResult, Rule, RuleConfig};
use crate::value::{Attributes, Value};
use crate::watchlist::WatchlistStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Identity fields echoed back with a screening outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplicantSummary {
    pub name: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub dob: Option<String>,
}

impl ApplicantSummary {
    fn from_attributes(attributes: &Attributes) -> Self {
        let text = |field: &str| match attributes.get(field) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.to_string()),
        };
        Self {
            name: text(NAME),
            email: text("email"),
            country: text("country"),
            dob: text("dob"),
        }
    }
}

/// Full result of screening one applicant
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningOutcome {
    pub evaluation_id: Uuid,
    pub applicant: ApplicantSummary,
    pub decision: Decision,
    pub triggered_rule: Option<Rule>,
    pub match_result: MatchResult,
    pub adverse_media: AdverseMediaSummary,
    pub timestamp: DateTime<Utc>,
}

/// ScreeningService exposes the engine's boundary operations: evaluation,
/// metrics, and live rule and threshold editing.
pub struct ScreeningService {
    watchlist: Arc<WatchlistStore>,
    rules: Arc<RuleStore>,
    metrics: Arc<MetricsAggregator>,
    evaluator: RuleEvaluator,
    adverse_media: Arc<dyn AdverseMediaProvider>,
}

impl ScreeningService {
    pub fn new(
        watchlist: Arc<WatchlistStore>,
        rules: Arc<RuleStore>,
        adverse_media: Arc<dyn AdverseMediaProvider>,
        default_threshold: f64,
    ) -> Self {
        let metrics = Arc::new(MetricsAggregator::new());
        let evaluator = RuleEvaluator::new(
            watchlist.clone(),
            rules.clone(),
            metrics.clone(),
            default_threshold,
        );
        Self {
            watchlist,
            rules,
            metrics,
            evaluator,
            adverse_media,
        }
    }

    /// Build from configuration, loading the watchlist and rule document.
    /// Load failures leave the corresponding store empty.
    pub fn from_config(config: &Config, adverse_media: Arc<dyn AdverseMediaProvider>) -> Self {
        let watchlist = Arc::new(WatchlistStore::open(
            config.watchlist_path.clone(),
            config.alias_delimiter,
        ));
        let rules = Arc::new(RuleStore::with_path(config.rules_path.clone()));
        let service = Self::new(
            watchlist,
            rules,
            adverse_media,
            config.default_fuzzy_threshold,
        );
        service.reload_rules();
        service
    }

    /// Evaluate pre-enriched attributes (`adverse_media_count` supplied by
    /// the caller)
    pub fn evaluate(&self, attributes: &Attributes) -> EvaluationResult {
        self.evaluator.evaluate(attributes)
    }

    /// Look up adverse media for the applicant, then evaluate
    pub async fn screen_applicant(&self, mut attributes: Attributes) -> ScreeningOutcome {
        let name = attributes
            .get(NAME)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        let adverse_media = match self.adverse_media.lookup(&name).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Adverse media lookup failed for {}, assuming no hits: {}", name, e);
                AdverseMediaSummary::default()
            }
        };
        attributes.insert(
            ADVERSE_MEDIA_COUNT.to_string(),
            Value::from(adverse_media.total_hits),
        );

        let result = self.evaluate(&attributes);

        ScreeningOutcome {
            evaluation_id: result.evaluation_id,
            applicant: ApplicantSummary::from_attributes(&attributes),
            decision: result.decision,
            triggered_rule: result.triggered_rule,
            match_result: result.match_result,
            adverse_media,
            timestamp: result.timestamp,
        }
    }

    /// Screen several applicants in order
    pub async fn screen_batch(&self, applicants: Vec<Attributes>) -> Vec<ScreeningOutcome> {
        let mut outcomes = Vec::with_capacity(applicants.len());
        for applicant in applicants {
            outcomes.push(self.screen_applicant(applicant).await);
        }
        outcomes
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Prometheus text exposition of the metrics
    pub fn render_metrics(&self) -> Result<String> {
        self.metrics.render_prometheus()
    }

    /// Operator action: zero all counters
    pub fn reset_metrics(&self) {
        self.metrics.reset();
        info!("Screening metrics reset");
    }

    pub fn get_rules(&self) -> Arc<RuleConfig> {
        self.rules.snapshot()
    }

    /// Add a rule, or replace the one with the same id. On error the
    /// document may be partially applied; re-fetch with `get_rules`. A
    /// broken backing document blocks writes with a persistence failure.
    pub fn upsert_rule(&self, rule: Rule) -> Result<Arc<RuleConfig>> {
        let rule_id = rule.id.clone();
        let (outcome, config) = self.rules.upsert(rule)?;
        info!(
            "Rule '{}' {} ({} rules active)",
            rule_id,
            outcome.as_str(),
            config.rules.len()
        );
        Ok(config)
    }

    /// Update an existing named threshold. Unknown names fail with
    /// [`crate::Error::UnknownThreshold`].
    pub fn update_threshold(&self, name: &str, value: f64) -> Result<()> {
        self.rules.set_threshold(name, value)?;
        info!("Threshold '{}' updated to {}", name, value);
        Ok(())
    }

    /// Re-read the rule document. A failure leaves an empty ruleset in
    /// place (every applicant falls back to REVIEW) and is logged.
    pub fn reload_rules(&self) {
        if let Err(e) = self.rules.reload() {
            warn!("Could not load rules, continuing with empty ruleset: {}", e);
        }
    }

    /// Re-read the watchlist source; returns the number of entries loaded
    pub fn reload_watchlist(&self) -> usize {
        self.watchlist.reload()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adverse_media::{NoAdverseMedia, Severity};
    use crate::error::Error;
    use crate::types::{Condition, ListType, Operator, WatchlistEntry, FUZZY_MATCH_THRESHOLD};
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    struct FixedAdverseMedia(u32);

    #[async_trait]
    impl AdverseMediaProvider for FixedAdverseMedia {
        async fn lookup(&self, _name: &str) -> Result<AdverseMediaSummary> {
            Ok(AdverseMediaSummary {
                total_hits: self.0,
                max_severity: Severity::High,
            })
        }
    }

    struct FailingAdverseMedia;

    #[async_trait]
    impl AdverseMediaProvider for FailingAdverseMedia {
        async fn lookup(&self, _name: &str) -> Result<AdverseMediaSummary> {
            Err(Error::AdverseMedia("provider unavailable".to_string()))
        }
    }

    fn create_test_service(adverse_media: Arc<dyn AdverseMediaProvider>) -> ScreeningService {
        let watchlist = WatchlistStore::new(vec![WatchlistEntry {
            id: "PEP-001".to_string(),
            name: "Maria Santos".to_string(),
            aliases: vec![],
            country: Some("Brazil".to_string()),
            source: Some("Local".to_string()),
            list_type: ListType::Pep,
        }]);

        let mut thresholds = BTreeMap::new();
        thresholds.insert(FUZZY_MATCH_THRESHOLD.to_string(), 85.0);
        let rules = RuleConfig {
            thresholds,
            rules: vec![
                Rule {
                    id: "adverse_media_review".to_string(),
                    description: "Review heavy adverse media".to_string(),
                    enabled: true,
                    priority: 20,
                    conditions: vec![Condition::new(ADVERSE_MEDIA_COUNT, Operator::Gte, 2u32)],
                    outcome: Decision::Review,
                },
                Rule {
                    id: "pep_review".to_string(),
                    description: "Review PEPs".to_string(),
                    enabled: true,
                    priority: 10,
                    conditions: vec![Condition::new("pep_match", Operator::Equals, true)],
                    outcome: Decision::Review,
                },
                Rule {
                    id: "default_approve".to_string(),
                    description: String::new(),
                    enabled: true,
                    priority: 999,
                    conditions: vec![],
                    outcome: Decision::Approve,
                },
            ],
        };

        ScreeningService::new(
            Arc::new(watchlist),
            Arc::new(RuleStore::new(rules)),
            adverse_media,
            85.0,
        )
    }

    fn applicant(name: &str) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert("name".to_string(), Value::from(name));
        attributes.insert("email".to_string(), Value::from("someone@example.com"));
        attributes.insert("country".to_string(), Value::from("Brazil"));
        attributes
    }

    #[tokio::test]
    async fn test_pep_review() {
        let service = create_test_service(Arc::new(NoAdverseMedia));
        let outcome = service.screen_applicant(applicant("Maria Santos")).await;
        assert_eq!(outcome.decision, Decision::Review);
        assert_eq!(outcome.triggered_rule.unwrap().id, "pep_review");
        assert_eq!(outcome.applicant.email.as_deref(), Some("someone@example.com"));
        assert!(outcome.applicant.dob.is_none());
    }

    #[tokio::test]
    async fn test_adverse_media_drives_rule() {
        let service = create_test_service(Arc::new(FixedAdverseMedia(3)));
        let outcome = service.screen_applicant(applicant("John Smith")).await;
        assert_eq!(outcome.decision, Decision::Review);
        assert_eq!(outcome.triggered_rule.unwrap().id, "adverse_media_review");
        assert_eq!(outcome.adverse_media.total_hits, 3);
    }

    #[tokio::test]
    async fn test_adverse_media_failure_fails_open() {
        let service = create_test_service(Arc::new(FailingAdverseMedia));
        let outcome = service.screen_applicant(applicant("John Smith")).await;
        assert_eq!(outcome.decision, Decision::Approve);
        assert_eq!(outcome.adverse_media.total_hits, 0);
    }

    #[tokio::test]
    async fn test_batch_updates_metrics() {
        let service = create_test_service(Arc::new(NoAdverseMedia));
        let outcomes = service
            .screen_batch(vec![applicant("Maria Santos"), applicant("Jane Doe")])
            .await;
        assert_eq!(outcomes.len(), 2);

        let metrics = service.get_metrics();
        assert_eq!(metrics.total_screened, 2);
        assert_eq!(metrics.review, 1);
        assert_eq!(metrics.approved, 1);
        assert_eq!(metrics.percentages.approved, 50.0);

        service.reset_metrics();
        assert_eq!(service.get_metrics().total_screened, 0);
    }

    #[test]
    fn test_update_unknown_threshold() {
        let service = create_test_service(Arc::new(NoAdverseMedia));
        let err = service.update_threshold("velocity_limit", 3.0).unwrap_err();
        assert!(err.is_not_found());
        assert!(service.update_threshold(FUZZY_MATCH_THRESHOLD, 90.0).is_ok());
        assert_eq!(service.get_rules().threshold(FUZZY_MATCH_THRESHOLD), Some(90.0));
    }

    #[test]
    fn test_from_config_with_missing_sources() {
        let config = Config {
            rules_path: "/nonexistent/rules.yaml".into(),
            watchlist_path: "/nonexistent/watchlist.csv".into(),
            ..Config::default()
        };
        let service = ScreeningService::from_config(&config, Arc::new(NoAdverseMedia));
        assert!(service.get_rules().rules.is_empty());

        let result = service.evaluate(&applicant("Anyone"));
        assert_eq!(result.decision, Decision::Review);
        assert_eq!(result.match_result.match_score, 0);
    }
}
