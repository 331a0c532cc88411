use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Threshold key consulted by the fuzzy matcher
pub const FUZZY_MATCH_THRESHOLD: &str = "fuzzy_match_threshold";

/// Acceptance threshold used when the rule document does not set one
pub const DEFAULT_FUZZY_MATCH_THRESHOLD: f64 = 85.0;

/// Priority assigned to rules stored without one
pub const DEFAULT_PRIORITY: i64 = 999;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Approve,
    Review,
    Block,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approve => "APPROVE",
            Decision::Review => "REVIEW",
            Decision::Block => "BLOCK",
        }
    }
}

/// Watchlist classification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ListType {
    Sanctions,
    Pep,
    Other(String), // operator-defined tag
}

impl ListType {
    pub fn as_str(&self) -> &str {
        match self {
            ListType::Sanctions => "SANCTIONS",
            ListType::Pep => "PEP",
            ListType::Other(tag) => tag,
        }
    }
}

impl Default for ListType {
    fn default() -> Self {
        ListType::Other("UNKNOWN".to_string())
    }
}

impl From<String> for ListType {
    fn from(tag: String) -> Self {
        match tag.trim().to_uppercase().as_str() {
            "SANCTIONS" => ListType::Sanctions,
            "PEP" => ListType::Pep,
            "" => ListType::default(),
            _ => ListType::Other(tag.trim().to_string()),
        }
    }
}

impl From<ListType> for String {
    fn from(list_type: ListType) -> Self {
        list_type.as_str().to_string()
    }
}

/// Reference entity on a sanctions/PEP list. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub id: String,
    pub name: String,
    pub aliases: Vec<String>,
    pub country: Option<String>,
    pub source: Option<String>,
    pub list_type: ListType,
}

/// Best watchlist match for one candidate name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub matched: bool,
    pub match_score: u8, // 0-100, populated on near-misses too
    pub matched_entity: Option<String>,
    pub entity_id: Option<String>,
    pub list_type: Option<ListType>,
    pub source: Option<String>,
    pub country: Option<String>,
}

impl MatchResult {
    /// True when the match is accepted and classified as `list_type`
    pub fn is_match_on(&self, list_type: &ListType) -> bool {
        self.matched && self.list_type.as_ref() == Some(list_type)
    }
}

/// Comparison operator of a rule condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Equals,
    Gte,
    Gt,
    Lte,
    Lt,
    In,
    Contains,
    /// Kept verbatim so the document round-trips; never holds
    Unsupported(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::Gte => "gte",
            Operator::Gt => "gt",
            Operator::Lte => "lte",
            Operator::Lt => "lt",
            Operator::In => "in",
            Operator::Contains => "contains",
            Operator::Unsupported(op) => op,
        }
    }
}

impl From<String> for Operator {
    fn from(op: String) -> Self {
        match op.as_str() {
            "equals" => Operator::Equals,
            "gte" => Operator::Gte,
            "gt" => Operator::Gt,
            "lte" => Operator::Lte,
            "lt" => Operator::Lt,
            "in" => Operator::In,
            "contains" => Operator::Contains,
            _ => Operator::Unsupported(op),
        }
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub op: Operator,
    #[serde(default = "null_value")]
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
}

fn null_value() -> Value {
    Value::Null
}

/// Operator-defined decision rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_priority")]
    pub priority: i64,
    /// Conjunctive; empty means catch-all
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub outcome: Decision,
}

fn default_enabled() -> bool {
    true
}

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}

/// Persisted rule document: named thresholds plus priority-ordered rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default)]
    pub thresholds: BTreeMap<String, f64>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleConfig {
    /// Stable sort by ascending priority; equal priorities keep stored order
    pub fn sort_rules(&mut self) {
        self.rules.sort_by_key(|rule| rule.priority);
    }

    pub fn threshold(&self, name: &str) -> Option<f64> {
        self.thresholds.get(name).copied()
    }

    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }
}
