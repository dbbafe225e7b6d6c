//! File-backed tiered memory store.
//!
//! Directory layout:
//! ```text
//! <memory_dir>/
//! ├── short_term/<time>-<id>.json
//! ├── long_term/<time>-<id>.json
//! ├── episodic/<time>-<id>.json
//! └── truth/<time>-<id>.json
//! ```
//!
//! One record per file, each written whole and never rewritten. There is no
//! locking: a single writer per partition is assumed.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::config::{PartitionNames, DEFAULT_PROMOTION_THRESHOLD_SECS};
use crate::error::{Error, Result};
use crate::storage::{ensure_dir, read_json, write_json};

use super::types::{DialogEntry, MemoryPayload, MemoryRecord, Tier, ValidTruth};

/// Result of classifying and storing a dialog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    /// Tier the entry was classified into (short- or long-term)
    pub tier: Tier,
    pub age: Duration,
    pub tier_record: MemoryRecord,
    /// Tier-agnostic copy kept for replay
    pub episodic_record: MemoryRecord,
}

/// Statistics about persisted memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub total_records: usize,
    pub records_by_tier: BTreeMap<Tier, usize>,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

/// Classify a dialog entry by age.
pub fn classify(age: Duration, threshold: Duration) -> Tier {
    if age >= threshold {
        Tier::LongTerm
    } else {
        Tier::ShortTerm
    }
}

/// Tiered memory over a directory of partitions.
#[derive(Debug, Clone)]
pub struct TieredMemory {
    root: PathBuf,
    partitions: PartitionNames,
    threshold: Duration,
}

impl TieredMemory {
    /// Create the store and its partition directories.
    pub fn open(root: impl Into<PathBuf>, partitions: PartitionNames) -> Result<Self> {
        let memory = Self {
            root: root.into(),
            partitions,
            threshold: Duration::from_secs(DEFAULT_PROMOTION_THRESHOLD_SECS),
        };
        for tier in Tier::ALL {
            ensure_dir(&memory.partition_dir(tier))?;
        }
        Ok(memory)
    }

    /// Set the default age threshold used by [`promote`](Self::promote).
    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn partition_dir(&self, tier: Tier) -> PathBuf {
        let name = match tier {
            Tier::ShortTerm => &self.partitions.short_term,
            Tier::LongTerm => &self.partitions.long_term,
            Tier::Episodic => &self.partitions.episodic,
            Tier::Truth => &self.partitions.truth,
        };
        self.root.join(name)
    }

    fn write_record(&self, record: &MemoryRecord) -> Result<PathBuf> {
        let dir = self.partition_dir(record.tier());
        ensure_dir(&dir)?;
        let path = dir.join(record.file_name());
        write_json(&path, record)?;
        debug!(tier = %record.tier(), path = %path.display(), "memory record written");
        Ok(path)
    }

    /// Write one short-term record for `entry`.
    pub fn record_short_term(&self, entry: &DialogEntry) -> Result<MemoryRecord> {
        let record = MemoryRecord::new(MemoryPayload::ShortTerm(entry.clone()), Utc::now());
        self.write_record(&record)?;
        Ok(record)
    }

    /// Classify `entry` against the store's threshold and write it to its
    /// tier and to the episodic partition.
    pub fn promote(&self, entry: &DialogEntry) -> Result<Promotion> {
        self.promote_at(entry, self.threshold, Utc::now())
    }

    /// [`promote`](Self::promote) with an explicit threshold and clock.
    #[instrument(skip(self, entry), fields(entry_time = %entry.timestamp))]
    pub fn promote_at(
        &self,
        entry: &DialogEntry,
        threshold: Duration,
        now: DateTime<Utc>,
    ) -> Result<Promotion> {
        // Entries stamped in the future count as brand new.
        let age = (now - entry.timestamp).to_std().unwrap_or(Duration::ZERO);
        let tier = classify(age, threshold);

        let payload = MemoryPayload::dialog(tier, entry.clone())
            .ok_or_else(|| Error::Internal(format!("{} is not a dialog tier", tier)))?;
        let tier_record = MemoryRecord::new(payload, now);
        self.write_record(&tier_record)?;

        let episodic_record = MemoryRecord::new(MemoryPayload::Episodic(entry.clone()), now);
        self.write_record(&episodic_record)?;

        info!(tier = %tier, age_secs = age.as_secs(), "dialog entry promoted");
        Ok(Promotion {
            tier,
            age,
            tier_record,
            episodic_record,
        })
    }

    /// Append a validated truth to the truth partition.
    pub fn record_truth(&self, truth: ValidTruth) -> Result<MemoryRecord> {
        let record = MemoryRecord::new(MemoryPayload::Truth(truth), Utc::now());
        self.write_record(&record)?;
        Ok(record)
    }

    fn record_paths(&self, pattern: &Path) -> Result<Vec<PathBuf>> {
        let pattern = pattern.to_string_lossy().to_string();
        let paths = glob::glob(&pattern).map_err(|e| Error::persistence(&self.root, e))?;
        paths
            .map(|entry| entry.map_err(|e| Error::persistence(e.path().to_path_buf(), e.error())))
            .filter(|entry| entry.as_ref().map_or(true, |p| p.is_file()))
            .collect()
    }

    fn escaped_root(&self) -> PathBuf {
        PathBuf::from(glob::Pattern::escape(&self.root.to_string_lossy()))
    }

    fn read_records(&self, paths: Vec<PathBuf>) -> Result<Vec<MemoryRecord>> {
        paths
            .into_iter()
            .filter_map(|path| read_json::<MemoryRecord>(&path).transpose())
            .collect()
    }

    /// Every record under the memory root, in no particular order.
    pub fn load(&self) -> Result<Vec<MemoryRecord>> {
        let paths = self.record_paths(&self.escaped_root().join("*").join("*.json"))?;
        self.read_records(paths)
    }

    /// Records of one partition, in no particular order.
    pub fn load_partition(&self, tier: Tier) -> Result<Vec<MemoryRecord>> {
        let dir = PathBuf::from(glob::Pattern::escape(
            &self.partition_dir(tier).to_string_lossy(),
        ));
        let paths = self.record_paths(&dir.join("*.json"))?;
        self.read_records(paths)
    }

    pub fn stats(&self) -> Result<MemoryStats> {
        let records = self.load()?;
        let mut stats = MemoryStats {
            total_records: records.len(),
            ..Default::default()
        };
        for record in &records {
            *stats.records_by_tier.entry(record.tier()).or_insert(0) += 1;
            stats.oldest = Some(stats.oldest.map_or(record.timestamp, |t| t.min(record.timestamp)));
            stats.newest = Some(stats.newest.map_or(record.timestamp, |t| t.max(record.timestamp)));
        }
        Ok(stats)
    }

    /// Irreversibly remove every file under the memory root.
    ///
    /// Returns the number of files removed. Partition directories are kept.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn delete(&self) -> Result<usize> {
        let paths = self.record_paths(&self.escaped_root().join("**").join("*"))?;
        let mut removed = 0;
        for path in paths {
            fs::remove_file(&path).map_err(|e| Error::persistence(&path, e))?;
            removed += 1;
        }
        warn!(removed, "memory deleted");
        Ok(removed)
    }
}
