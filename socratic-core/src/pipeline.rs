//! Conclusion pipeline: premises in, gated conclusion out.
//!
//! One `draw` walks the state machine
//! `Idle → Collecting → Generating → Validating → Concluded{valid}`:
//!
//! 1. COLLECT: take the premise list in order (empty list stops here)
//! 2. GENERATE: hand the joined premises to the generation capability
//! 3. VALIDATE: run the draft through the tautology gate
//! 4. PERSIST: overwrite the conclusion snapshot
//!
//! The gate annotates, it never blocks: a conclusion that fails validation
//! is still returned, with an entry in the rejection journal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::DEFAULT_GENERATION_BUDGET;
use crate::error::{Error, Result};
use crate::journal::{RejectionEntry, RejectionJournal};
use crate::llm::{GenerationCapability, GenerationRequest};
use crate::logic::TruthTableValidator;
use crate::storage::write_json;

/// Returned instead of a conclusion when there are no premises.
pub const NO_PREMISES_MESSAGE: &str = "No premises available for logic as conclusion.";

/// Where the pipeline is within a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum PipelineState {
    Idle,
    Collecting { premises: usize },
    Generating,
    Validating,
    Concluded { valid: bool },
}

/// A drawn conclusion. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conclusion {
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Premises at the time of generation
    pub premises: Vec<String>,
    pub valid: bool,
    /// Gate explanation for the verdict
    pub reason: String,
}

/// Result of a draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome {
    Concluded(Conclusion),
    /// Nothing to reason from; journaled, generator not called
    NoPremises {
        message: String,
        entry: RejectionEntry,
    },
}

impl DrawOutcome {
    /// Text handed back to the caller: the conclusion or the sentinel.
    pub fn text(&self) -> &str {
        match self {
            Self::Concluded(conclusion) => &conclusion.text,
            Self::NoPremises { message, .. } => message,
        }
    }

    pub fn conclusion(&self) -> Option<&Conclusion> {
        match self {
            Self::Concluded(conclusion) => Some(conclusion),
            Self::NoPremises { .. } => None,
        }
    }
}

/// On-disk conclusion snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConclusionSnapshot {
    pub premises: Vec<String>,
    pub conclusion: String,
}

/// Join premises into the context handed to the generator.
pub fn build_prompt(premises: &[String]) -> String {
    let mut prompt = String::from("Based on the premises:\n");
    for premise in premises {
        prompt.push_str("- ");
        prompt.push_str(premise);
        prompt.push('\n');
    }
    prompt.push_str("Provide a logical conclusion.");
    prompt
}

/// Orchestrates generation, validation and persistence of conclusions.
pub struct ConclusionPipeline {
    generator: Arc<dyn GenerationCapability>,
    validator: TruthTableValidator,
    journal: RejectionJournal,
    snapshot_path: PathBuf,
    budget: u32,
    state: PipelineState,
    current: Option<Conclusion>,
}

impl ConclusionPipeline {
    pub fn new(
        generator: Arc<dyn GenerationCapability>,
        validator: TruthTableValidator,
        journal: RejectionJournal,
        snapshot_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            generator,
            validator,
            journal,
            snapshot_path: snapshot_path.into(),
            budget: DEFAULT_GENERATION_BUDGET,
            state: PipelineState::Idle,
            current: None,
        }
    }

    pub fn with_generation_budget(mut self, budget: u32) -> Self {
        self.budget = budget;
        self
    }

    /// Advisory size hint passed through to the generator.
    pub fn set_generation_budget(&mut self, budget: u32) {
        info!(budget, "generation budget set");
        self.budget = budget;
    }

    pub fn generation_budget(&self) -> u32 {
        self.budget
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Most recent conclusion, if any draw has completed generation.
    pub fn current(&self) -> Option<&Conclusion> {
        self.current.as_ref()
    }

    pub fn validator(&self) -> &TruthTableValidator {
        &self.validator
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Draw a conclusion from `premises`.
    ///
    /// Generation and persistence failures are returned as errors. A
    /// generation failure leaves the pipeline `Idle` with the previous
    /// conclusion untouched; a persistence failure keeps the new one.
    #[instrument(skip(self, premises), fields(premises = premises.len(), budget = self.budget))]
    pub async fn draw(&mut self, premises: Vec<String>) -> Result<DrawOutcome> {
        self.state = PipelineState::Collecting {
            premises: premises.len(),
        };
        if premises.is_empty() {
            self.state = PipelineState::Idle;
            let entry = self.annotate(&Error::EmptyState(NO_PREMISES_MESSAGE.to_string()));
            return Ok(DrawOutcome::NoPremises {
                message: NO_PREMISES_MESSAGE.to_string(),
                entry,
            });
        }

        self.state = PipelineState::Generating;
        let request = GenerationRequest::new(build_prompt(&premises)).with_max_tokens(self.budget);
        let draft = match self.generator.generate(request).await {
            Ok(draft) => draft,
            Err(e) => {
                self.state = PipelineState::Idle;
                warn!(backend = %self.generator.backend(), error = %e, "generation failed");
                return Err(e);
            }
        };
        let text = draft.trim().to_string();
        debug!(backend = %self.generator.backend(), "draft received: {}", text);

        self.state = PipelineState::Validating;
        let decision = self.validator.evaluate(&text);
        let conclusion = Conclusion {
            text,
            timestamp: Utc::now(),
            premises,
            valid: decision.valid,
            reason: decision.reason,
        };
        self.current = Some(conclusion.clone());
        self.state = PipelineState::Concluded {
            valid: conclusion.valid,
        };
        info!(
            valid = conclusion.valid,
            reason = %conclusion.reason,
            "conclusion: {}",
            conclusion.text
        );

        write_json(
            &self.snapshot_path,
            &ConclusionSnapshot {
                premises: conclusion.premises.clone(),
                conclusion: conclusion.text.clone(),
            },
        )?;

        if !conclusion.valid {
            self.annotate(&Error::InvalidConclusion(format!(
                "'{}' failed validation: {}",
                conclusion.text, conclusion.reason
            )));
        }

        Ok(DrawOutcome::Concluded(conclusion))
    }

    /// Journal a recovered condition. A failed journal write is logged and
    /// never changes the outcome of the draw.
    fn annotate(&self, error: &Error) -> RejectionEntry {
        match self.journal.record(error) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(
                    journal = %self.journal.path().display(),
                    error = %e,
                    "rejection journal write failed"
                );
                RejectionEntry::from_error(error)
            }
        }
    }
}
