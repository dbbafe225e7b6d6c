//! Ordered, semantically deduplicated premise list with durable snapshots.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::error::{Error, Result};
use crate::journal::RejectionJournal;
use crate::logic::UnificationEngine;
use crate::storage::{read_json, write_json};

use super::types::{AddOutcome, ChallengeOutcome, Premise};

/// Premise store.
///
/// Every successful mutation rewrites the whole snapshot file. A failed
/// write is returned to the caller but the in-memory list is kept.
pub struct PremiseStore {
    premises: Vec<Premise>,
    next_index: u64,
    engine: UnificationEngine,
    journal: RejectionJournal,
    snapshot_path: PathBuf,
}

impl PremiseStore {
    /// Create an empty store. Nothing is written until the first mutation.
    pub fn new(
        snapshot_path: impl Into<PathBuf>,
        engine: UnificationEngine,
        journal: RejectionJournal,
    ) -> Self {
        Self {
            premises: Vec::new(),
            next_index: 0,
            engine,
            journal,
            snapshot_path: snapshot_path.into(),
        }
    }

    /// Create a store restored from the snapshot at `snapshot_path`, if any.
    pub fn open(
        snapshot_path: impl Into<PathBuf>,
        engine: UnificationEngine,
        journal: RejectionJournal,
    ) -> Result<Self> {
        let mut store = Self::new(snapshot_path, engine, journal);
        let restored: Vec<String> = read_json(&store.snapshot_path)?.unwrap_or_default();
        store.premises = restored
            .into_iter()
            .enumerate()
            .map(|(i, text)| Premise::new(text, i as u64))
            .collect();
        store.next_index = store.premises.len() as u64;
        debug!(count = store.premises.len(), "restored premise snapshot");

        store.reconcile()?;
        Ok(store)
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn journal(&self) -> &RejectionJournal {
        &self.journal
    }

    pub fn engine(&self) -> &UnificationEngine {
        &self.engine
    }

    /// Surviving premises in insertion order.
    pub fn list(&self) -> &[Premise] {
        &self.premises
    }

    pub fn texts(&self) -> Vec<String> {
        self.premises.iter().map(|p| p.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.premises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.premises.is_empty()
    }

    /// Append a premise. Empty text and premises equivalent to one already
    /// stored are journaled and leave the store unchanged.
    #[instrument(skip(self), fields(store = %self.snapshot_path.display()))]
    pub fn add(&mut self, text: &str) -> Result<AddOutcome> {
        let text = text.trim();
        if text.is_empty() {
            let entry = self
                .journal
                .record(&Error::Validation("premise text is empty".to_string()))?;
            return Ok(AddOutcome::Rejected(entry));
        }

        if let Some(existing) = self.premises.iter().find(|p| self.engine.unify(&p.text, text)) {
            let entry = self.journal.record(&Error::Validation(format!(
                "'{}' is equivalent to existing premise '{}'",
                text, existing.text
            )))?;
            return Ok(AddOutcome::Rejected(entry));
        }

        let premise = Premise::new(text, self.next_index);
        self.next_index += 1;
        self.premises.push(premise.clone());
        info!(index = premise.index, "added premise: {}", premise.text);

        self.persist()?;
        Ok(AddOutcome::Added(premise))
    }

    /// Remove a premise and every premise equivalent to it.
    ///
    /// The sweep compares against a snapshot of the list taken after the
    /// direct removal, so cascade removals cannot influence each other.
    #[instrument(skip(self), fields(store = %self.snapshot_path.display()))]
    pub fn remove(&mut self, text: &str) -> Result<ChallengeOutcome> {
        let text = text.trim();
        let Some(position) = self.premises.iter().position(|p| p.text == text) else {
            let entry = self.journal.record(&Error::NotFound(text.to_string()))?;
            return Ok(ChallengeOutcome::NotFound(entry));
        };

        let premise = self.premises.remove(position);
        info!(index = premise.index, "challenged and removed premise: {}", premise.text);

        let snapshot = self.premises.clone();
        let cascaded: Vec<Premise> = snapshot
            .into_iter()
            .filter(|p| self.engine.unify(&premise.text, &p.text))
            .collect();
        for swept in &cascaded {
            self.premises.retain(|p| p.index != swept.index);
            info!(
                index = swept.index,
                challenged = %premise.text,
                "removed equivalent premise: {}",
                swept.text
            );
        }

        self.persist()?;
        Ok(ChallengeOutcome::Removed { premise, cascaded })
    }

    /// Drop later premises that unify with an earlier survivor.
    ///
    /// Needed after the logic configuration changes, since a new
    /// configuration can make previously distinct premises equivalent.
    pub fn reconcile(&mut self) -> Result<Vec<Premise>> {
        let mut survivors: Vec<Premise> = Vec::with_capacity(self.premises.len());
        let mut dropped = Vec::new();

        for premise in std::mem::take(&mut self.premises) {
            let duplicate_of = survivors
                .iter()
                .find(|kept| self.engine.unify(&kept.text, &premise.text))
                .map(|kept| kept.text.clone());
            match duplicate_of {
                Some(kept) => {
                    info!(
                        index = premise.index,
                        kept = %kept,
                        "removed equivalent premise: {}",
                        premise.text
                    );
                    dropped.push(premise);
                }
                None => survivors.push(premise),
            }
        }
        self.premises = survivors;

        if !dropped.is_empty() {
            self.persist()?;
        }
        Ok(dropped)
    }

    /// Overwrite the snapshot with the complete current list.
    pub fn persist(&self) -> Result<()> {
        write_json(&self.snapshot_path, &self.texts())?;
        debug!(count = self.premises.len(), "premise snapshot written");
        Ok(())
    }
}
