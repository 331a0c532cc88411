//! Adverse-media provider seam
//!
//! The engine only needs a hit count (and the worst severity for reporting)
//! per applicant name. Any name-indexed news or risk-intelligence source can
//! sit behind [`AdverseMediaProvider`].

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Severity of an adverse-media hit, ordered from none to critical
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Worst severity in a set of hits (`None` for no hits)
    pub fn highest(severities: impl IntoIterator<Item = Severity>) -> Severity {
        severities.into_iter().max().unwrap_or(Severity::None)
    }
}

/// Adverse-media lookup result for one name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdverseMediaSummary {
    pub total_hits: u32,
    pub max_severity: Severity,
}

#[async_trait]
pub trait AdverseMediaProvider: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<AdverseMediaSummary>;
}

/// Provider that never reports hits
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdverseMedia;

#[async_trait]
impl AdverseMediaProvider for NoAdverseMedia {
    async fn lookup(&self, _name: &str) -> Result<AdverseMediaSummary> {
        Ok(AdverseMediaSummary::default())
    }
}
