//! Property-based tests for screening invariants
//!
//! - Identity: a name always scores 100 against itself
//! - Symmetry: score(a, b) == score(b, a)
//! - Empty watchlist: never matches, score 0
//! - Precedence: lowest priority wins, stored order breaks ties
//! - Determinism: same input and snapshot → same decision

use proptest::prelude::*;
use screening_engine::evaluator::select_rule;
use screening_engine::matcher::{best_match, similarity};
use screening_engine::{
    Attributes, Decision, EnrichedAttributes, ListType, MatchResult, MetricsAggregator, Rule,
    RuleConfig, RuleEvaluator, RuleStore, Value, WatchlistEntry, WatchlistStore,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Strategy for generating non-blank names
fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z .'-]{0,24}"
}

/// Strategy for generating decisions
fn decision_strategy() -> impl Strategy<Value = Decision> {
    prop_oneof![
        Just(Decision::Approve),
        Just(Decision::Review),
        Just(Decision::Block),
    ]
}

fn entry(id: usize, name: &str, list_type: ListType) -> WatchlistEntry {
    WatchlistEntry {
        id: format!("E{}", id),
        name: name.to_string(),
        aliases: vec![],
        country: None,
        source: None,
        list_type,
    }
}

fn catch_all(id: usize, priority: i64, outcome: Decision) -> Rule {
    Rule {
        id: format!("rule-{}", id),
        description: String::new(),
        enabled: true,
        priority,
        conditions: vec![],
        outcome,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: identical names score 100 and match for any threshold <= 100
    #[test]
    fn prop_identical_names_match(name in name_strategy(), threshold in 0.0f64..=100.0) {
        prop_assert_eq!(similarity(&name, &name), 100);

        let entries = vec![entry(0, &name, ListType::Sanctions)];
        let result = best_match(&name, &entries, threshold);
        prop_assert!(result.matched);
        prop_assert_eq!(result.match_score, 100);
    }

    /// Property: case folding does not change the score
    #[test]
    fn prop_case_insensitive(name in name_strategy()) {
        prop_assert_eq!(similarity(&name.to_uppercase(), &name.to_lowercase()), 100);
    }

    /// Property: similarity is symmetric and bounded
    #[test]
    fn prop_similarity_symmetric(a in "[A-Za-z ]{0,20}", b in "[A-Za-z ]{0,20}") {
        let ab = similarity(&a, &b);
        prop_assert_eq!(ab, similarity(&b, &a));
        prop_assert!(ab <= 100);
    }

    /// Property: an empty watchlist never matches
    #[test]
    fn prop_empty_watchlist(name in ".{0,30}", threshold in -10.0f64..=110.0) {
        let result = best_match(&name, &[], threshold);
        prop_assert!(!result.matched);
        prop_assert_eq!(result.match_score, 0);
        prop_assert!(result.matched_entity.is_none());
    }

    /// Property: the best match never scores below any single entry
    #[test]
    fn prop_best_match_is_maximum(
        candidate in name_strategy(),
        names in prop::collection::vec(name_strategy(), 1..8),
    ) {
        let entries: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, n)| entry(i, n, ListType::Pep))
            .collect();
        let result = best_match(&candidate, &entries, 85.0);
        for name in &names {
            prop_assert!(result.match_score >= similarity(&candidate, name));
        }
    }

    /// Property: lowest priority wins; equal priorities keep stored order
    #[test]
    fn prop_priority_precedence(
        rules in prop::collection::vec((0i64..5, decision_strategy()), 1..12),
    ) {
        let stored: Vec<_> = rules
            .iter()
            .enumerate()
            .map(|(i, (priority, outcome))| catch_all(i, *priority, *outcome))
            .collect();

        let min_priority = stored.iter().map(|r| r.priority).min().unwrap();
        let expected = stored.iter().find(|r| r.priority == min_priority).unwrap().id.clone();

        let store = RuleStore::new(RuleConfig {
            thresholds: BTreeMap::new(),
            rules: stored,
        });
        let config = store.snapshot();
        let attributes = EnrichedAttributes::new(Attributes::new(), MatchResult::default());

        let selected = select_rule(&config.rules, &attributes).unwrap();
        prop_assert_eq!(&selected.id, &expected);
    }

    /// Property: re-evaluating the same applicant gives the same decision
    #[test]
    fn prop_evaluation_deterministic(
        candidate in name_strategy(),
        names in prop::collection::vec(name_strategy(), 0..6),
        adverse in 0u32..5,
    ) {
        let entries = names
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let list_type = if i % 2 == 0 { ListType::Sanctions } else { ListType::Pep };
                entry(i, n, list_type)
            })
            .collect();
        let rules: RuleConfig = serde_yaml::from_str(
            r#"
thresholds:
  fuzzy_match_threshold: 80
rules:
  - id: block
    priority: 1
    conditions: [{ field: sanctions_match, op: equals, value: true }]
    outcome: BLOCK
  - id: media
    priority: 5
    conditions: [{ field: adverse_media_count, op: gt, value: 2 }]
    outcome: REVIEW
  - id: approve
    priority: 999
    outcome: APPROVE
"#,
        )
        .unwrap();

        let evaluator = RuleEvaluator::new(
            Arc::new(WatchlistStore::new(entries)),
            Arc::new(RuleStore::new(rules)),
            Arc::new(MetricsAggregator::new()),
            85.0,
        );

        let mut attributes = Attributes::new();
        attributes.insert("name".to_string(), Value::from(candidate));
        attributes.insert("adverse_media_count".to_string(), Value::from(adverse));

        let first = evaluator.evaluate(&attributes);
        let second = evaluator.evaluate(&attributes);
        prop_assert_eq!(first.decision, second.decision);
        prop_assert_eq!(first.triggered_rule, second.triggered_rule);
        prop_assert_eq!(first.match_result, second.match_result);
        prop_assert_eq!(first.enriched, second.enriched);
    }
}
