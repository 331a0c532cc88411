//! Rule store
//!
//! Loads, persists and hot-reloads the rule document (named thresholds plus
//! priority-ordered rules). Readers take an immutable snapshot; writers
//! build a new document under an exclusive lock, persist it, then swap it
//! in. Load failures fall back to an empty document and are returned to the
//! caller for logging.

use crate::error::{Error, Result};
use crate::types::{Rule, RuleConfig};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Whether an upsert inserted a new rule or replaced an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Added,
    Updated,
}

impl UpsertOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertOutcome::Added => "added",
            UpsertOutcome::Updated => "updated",
        }
    }
}

pub struct RuleStore {
    path: Option<PathBuf>,
    config: ArcSwap<RuleConfig>,
    write_lock: Mutex<()>,
}

impl RuleStore {
    /// In-memory store; writes never touch disk
    pub fn new(mut config: RuleConfig) -> Self {
        config.sort_rules();
        Self {
            path: None,
            config: ArcSwap::from_pointee(config),
            write_lock: Mutex::new(()),
        }
    }

    /// File-backed store. Starts empty; call [`RuleStore::reload`] to load.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: ArcSwap::from_pointee(RuleConfig::default()),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read and parse a rule document, sorted by priority
    pub fn load(path: &Path) -> Result<RuleConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::LoadFailure(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parse a YAML rule document, sorted by priority
    pub fn parse(content: &str) -> Result<RuleConfig> {
        let mut config: RuleConfig = serde_yaml::from_str(content)
            .map_err(|e| Error::LoadFailure(format!("malformed rule document: {}", e)))?;
        config.sort_rules();
        Ok(config)
    }

    /// Write to a sibling file and rename it over the target, so readers of
    /// the path never see a truncated document. Callers hold `write_lock`.
    fn persist(path: &Path, config: &RuleConfig) -> Result<()> {
        let content = serde_yaml::to_string(config)
            .map_err(|e| Error::PersistenceFailure(e.to_string()))?;

        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        std::fs::write(&staging, content)
            .and_then(|()| std::fs::rename(&staging, path))
            .map_err(|e| Error::PersistenceFailure(format!("{}: {}", path.display(), e)))
    }

    /// Re-read the backing document and swap it in.
    ///
    /// On failure the store holds an empty document and the error is
    /// returned so the caller can report it.
    pub fn reload(&self) -> Result<Arc<RuleConfig>> {
        let Some(path) = &self.path else {
            return Ok(self.snapshot());
        };

        let _guard = self.write_lock.lock();
        match Self::load(path) {
            Ok(config) => {
                let config = Arc::new(config);
                self.config.store(config.clone());
                info!(
                    "Loaded {} rules and {} thresholds from {}",
                    config.rules.len(),
                    config.thresholds.len(),
                    path.display()
                );
                Ok(config)
            }
            Err(e) => {
                self.config.store(Arc::new(RuleConfig::default()));
                Err(e)
            }
        }
    }

    /// Current document (lock-free)
    pub fn snapshot(&self) -> Arc<RuleConfig> {
        self.config.load_full()
    }

    /// Load-modify-persist-swap under the write lock. An unreadable backing
    /// document blocks the write and is reported as a persistence failure.
    fn modify<T>(
        &self,
        f: impl FnOnce(&mut RuleConfig) -> Result<T>,
    ) -> Result<(T, Arc<RuleConfig>)> {
        let _guard = self.write_lock.lock();

        let mut config = match &self.path {
            Some(path) => Self::load(path).map_err(|e| {
                Error::PersistenceFailure(format!("cannot read current rule document: {}", e))
            })?,
            None => (*self.snapshot()).clone(),
        };

        let out = f(&mut config)?;
        config.sort_rules();

        if let Some(path) = &self.path {
            Self::persist(path, &config)?;
        }

        let config = Arc::new(config);
        self.config.store(config.clone());
        Ok((out, config))
    }

    /// Insert a rule, or replace the rule sharing its id in place, then
    /// re-sort by priority and persist.
    pub fn upsert(&self, rule: Rule) -> Result<(UpsertOutcome, Arc<RuleConfig>)> {
        self.modify(|config| {
            match config.rules.iter_mut().find(|r| r.id == rule.id) {
                Some(existing) => {
                    *existing = rule;
                    Ok(UpsertOutcome::Updated)
                }
                None => {
                    config.rules.push(rule);
                    Ok(UpsertOutcome::Added)
                }
            }
        })
    }

    /// Update an existing named threshold and persist
    pub fn set_threshold(&self, name: &str, value: f64) -> Result<Arc<RuleConfig>> {
        let ((), config) = self.modify(|config| match config.thresholds.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::UnknownThreshold(name.to_string())),
        })?;
        Ok(config)
    }
}
