//! Explicit configuration injected into every component.
//!
//! Nothing in the crate reads paths or settings from ambient state; a
//! [`ReasoningConfig`] is built once and handed to the session, which passes
//! the relevant pieces down to the stores it constructs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default advisory generation budget (max tokens).
pub const DEFAULT_GENERATION_BUDGET: u32 = 100;

/// Default age at which a dialog entry is classified long-term.
pub const DEFAULT_PROMOTION_THRESHOLD_SECS: u64 = 30;

/// How the truth-table gate answers when no logic configuration is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsetLogicPolicy {
    /// Every conclusion is marked invalid
    #[default]
    Reject,
    /// Every conclusion is marked valid
    Accept,
}

/// Names of the memory partitions under the memory root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionNames {
    pub short_term: String,
    pub long_term: String,
    pub episodic: String,
    pub truth: String,
}

impl Default for PartitionNames {
    fn default() -> Self {
        Self {
            short_term: "short_term".to_string(),
            long_term: "long_term".to_string(),
            episodic: "episodic".to_string(),
            truth: "truth".to_string(),
        }
    }
}

/// Storage layout for the premise snapshot, journal and memory partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding premise/conclusion snapshots, the rejection journal
    /// and the persisted logic configuration
    pub state_dir: PathBuf,
    /// Root directory for memory partitions
    pub memory_dir: PathBuf,
    pub partitions: PartitionNames,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("./mindx"),
            memory_dir: PathBuf::from("./memory"),
            partitions: PartitionNames::default(),
        }
    }
}

impl StorageConfig {
    /// Put both roots under a single base directory.
    pub fn under(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            state_dir: base.join("state"),
            memory_dir: base.join("memory"),
            partitions: PartitionNames::default(),
        }
    }

    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }

    pub fn with_memory_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.memory_dir = dir.into();
        self
    }

    pub fn with_partitions(mut self, partitions: PartitionNames) -> Self {
        self.partitions = partitions;
        self
    }

    /// Expand `~` and environment variables in both roots.
    pub fn expanded(&self) -> Result<Self> {
        Ok(Self {
            state_dir: expand_path(&self.state_dir)?,
            memory_dir: expand_path(&self.memory_dir)?,
            partitions: self.partitions.clone(),
        })
    }

    pub fn premises_path(&self) -> PathBuf {
        self.state_dir.join("premises.json")
    }

    pub fn conclusion_path(&self) -> PathBuf {
        self.state_dir.join("conclusion.json")
    }

    pub fn journal_path(&self) -> PathBuf {
        self.state_dir.join("rejections.json")
    }

    pub fn logic_path(&self) -> PathBuf {
        self.state_dir.join("logic.json")
    }
}

/// Top-level configuration for a reasoning session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    pub storage: StorageConfig,
    /// Advisory length hint passed through to the generation backend
    pub generation_budget: u32,
    /// Dialog entries at least this old are classified long-term
    pub promotion_threshold_secs: u64,
    pub unset_logic_policy: UnsetLogicPolicy,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            generation_budget: DEFAULT_GENERATION_BUDGET,
            promotion_threshold_secs: DEFAULT_PROMOTION_THRESHOLD_SECS,
            unset_logic_policy: UnsetLogicPolicy::default(),
        }
    }
}

impl ReasoningConfig {
    pub fn new(storage: StorageConfig) -> Self {
        Self {
            storage,
            ..Default::default()
        }
    }

    pub fn with_generation_budget(mut self, budget: u32) -> Self {
        self.generation_budget = budget;
        self
    }

    pub fn with_promotion_threshold_secs(mut self, secs: u64) -> Self {
        self.promotion_threshold_secs = secs;
        self
    }

    pub fn with_unset_logic_policy(mut self, policy: UnsetLogicPolicy) -> Self {
        self.unset_logic_policy = policy;
        self
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            Error::Config(format!(
                "invalid config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .map_err(|e| Error::Config(format!("failed to expand path '{}': {}", raw, e)))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = ReasoningConfig::default();
        assert_eq!(config.generation_budget, 100);
        assert_eq!(config.promotion_threshold_secs, 30);
        assert_eq!(config.unset_logic_policy, UnsetLogicPolicy::Reject);
        assert_eq!(config.storage.partitions.episodic, "episodic");
    }

    #[test]
    fn test_builder() {
        let dir = tempdir().unwrap();
        let config = ReasoningConfig::new(StorageConfig::under(dir.path()))
            .with_generation_budget(256)
            .with_promotion_threshold_secs(5)
            .with_unset_logic_policy(UnsetLogicPolicy::Accept);

        assert_eq!(config.generation_budget, 256);
        assert_eq!(config.promotion_threshold_secs, 5);
        assert_eq!(config.unset_logic_policy, UnsetLogicPolicy::Accept);
        assert_eq!(
            config.storage.premises_path(),
            dir.path().join("state").join("premises.json")
        );
    }

    #[test]
    fn test_from_json_file_partial() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"generation_budget": 42, "unset_logic_policy": "accept"}"#,
        )
        .unwrap();

        let config = ReasoningConfig::from_json_file(&path).unwrap();
        assert_eq!(config.generation_budget, 42);
        assert_eq!(config.unset_logic_policy, UnsetLogicPolicy::Accept);
        assert_eq!(config.promotion_threshold_secs, 30);
    }

    #[test]
    fn test_from_json_file_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let result = ReasoningConfig::from_json_file(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_expanded_leaves_plain_paths() {
        let storage = StorageConfig::default()
            .with_state_dir("/var/lib/socratic/state")
            .with_memory_dir("/var/lib/socratic/memory");
        let expanded = storage.expanded().unwrap();
        assert_eq!(expanded, storage);
    }
}
