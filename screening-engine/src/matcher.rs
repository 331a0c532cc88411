//! Fuzzy name matching against the watchlist

use crate::types::{MatchResult, WatchlistEntry};
use strsim::normalized_levenshtein;
use tracing::debug;

/// Case-insensitive similarity on a 0-100 scale (100 = identical).
///
/// Normalized Levenshtein ratio, rounded to a whole score. Symmetric and
/// deterministic. Only case-insensitively equal strings score 100; any
/// other pair is capped at 99.
pub fn similarity(a: &str, b: &str) -> u8 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a == b {
        return 100;
    }
    let ratio = normalized_levenshtein(&a, &b);
    (ratio * 100.0).round().clamp(0.0, 99.0) as u8
}

/// Score of one entry: the best over its canonical name and every alias.
/// Empty names are skipped.
fn entry_score(candidate: &str, entry: &WatchlistEntry) -> u8 {
    std::iter::once(entry.name.as_str())
        .chain(entry.aliases.iter().map(String::as_str))
        .filter(|name| !name.trim().is_empty())
        .map(|name| similarity(candidate, name))
        .max()
        .unwrap_or(0)
}

/// Find the best-scoring watchlist entry for `candidate`.
///
/// The first entry reaching the best score wins ties. `matched` is set only
/// when the best score meets `threshold`; the score itself is always
/// reported so near-misses stay visible.
pub fn best_match(candidate: &str, entries: &[WatchlistEntry], threshold: f64) -> MatchResult {
    let mut best = MatchResult::default();

    if entries.is_empty() {
        return best;
    }

    for entry in entries {
        let score = entry_score(candidate, entry);
        if score > best.match_score {
            best = MatchResult {
                matched: f64::from(score) >= threshold,
                match_score: score,
                matched_entity: Some(entry.name.clone()),
                entity_id: Some(entry.id.clone()),
                list_type: Some(entry.list_type.clone()),
                source: entry.source.clone(),
                country: entry.country.clone(),
            };
        }
    }

    if best.matched {
        debug!(
            "Watchlist match for {}: {:?} ({}, score {})",
            candidate,
            best.matched_entity,
            best.list_type.as_ref().map(|l| l.as_str()).unwrap_or("UNKNOWN"),
            best.match_score
        );
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ListType;

    fn entry(id: &str, name: &str, aliases: &[&str], list_type: ListType) -> WatchlistEntry {
        WatchlistEntry {
            id: id.to_string(),
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            country: Some("Russia".to_string()),
            source: Some("OFAC".to_string()),
            list_type,
        }
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("John Smith", "john smith"), 100);
        assert_eq!(similarity("John Smith", "Jon Smith"), 90);
        assert!(similarity("John Smith", "Jane Doe") < 50);
        assert_eq!(similarity("", ""), 100);
    }

    #[test]
    fn test_exact_match() {
        let entries = vec![entry("S1", "Vladimir Petrov", &[], ListType::Sanctions)];
        let result = best_match("Vladimir Petrov", &entries, 85.0);
        assert!(result.matched);
        assert_eq!(result.match_score, 100);
        assert_eq!(result.list_type, Some(ListType::Sanctions));
        assert_eq!(result.country.as_deref(), Some("Russia"));
    }

    #[test]
    fn test_alias_match() {
        let entries = vec![entry(
            "S1",
            "Vladimir Petrov",
            &["Vlad Petrov"],
            ListType::Sanctions,
        )];
        let result = best_match("vlad petrov", &entries, 85.0);
        assert!(result.matched);
        assert_eq!(result.match_score, 100);
        assert_eq!(result.matched_entity.as_deref(), Some("Vladimir Petrov"));
    }

    #[test]
    fn test_near_miss_reports_score() {
        let entries = vec![entry("S1", "Vladimir Petrov", &[], ListType::Sanctions)];
        let result = best_match("Vladimir Petrova", &entries, 99.0);
        assert!(!result.matched);
        assert_eq!(result.match_score, 94);
        assert!(result.matched_entity.is_some());
    }

    #[test]
    fn test_long_names_differing_by_one_char_below_exact() {
        let name = "a".repeat(250);
        let other = format!("b{}", "a".repeat(249));
        assert_eq!(similarity(&name, &other), 99);

        let entries = vec![entry("S1", &name, &[], ListType::Sanctions)];
        let result = best_match(&other, &entries, 100.0);
        assert!(!result.matched);
        assert_eq!(result.match_score, 99);
    }

    #[test]
    fn test_first_entry_wins_ties() {
        let entries = vec![
            entry("A", "Maria Santos", &[], ListType::Pep),
            entry("B", "Maria Santos", &[], ListType::Sanctions),
        ];
        let result = best_match("Maria Santos", &entries, 85.0);
        assert_eq!(result.entity_id.as_deref(), Some("A"));
        assert_eq!(result.list_type, Some(ListType::Pep));
    }

    #[test]
    fn test_empty_watchlist() {
        let result = best_match("Anyone", &[], 0.0);
        assert!(!result.matched);
        assert_eq!(result.match_score, 0);
        assert!(result.matched_entity.is_none());
    }

    #[test]
    fn test_empty_names_skipped() {
        let entries = vec![entry("E", "", &["", "  "], ListType::Sanctions)];
        let result = best_match("", &entries, 0.0);
        assert!(!result.matched);
        assert_eq!(result.match_score, 0);
    }
}
