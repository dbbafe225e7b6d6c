//! Reasoning session: the command surface over the core.
//!
//! A [`ReasoningSession`] wires one logic configuration into the premise
//! store, the validation gate and the conclusion pipeline, and mirrors
//! exchanges into tiered memory. Outer shells (CLI, service, UI) need only
//! the five commands:
//!
//! - [`add_premise`](ReasoningSession::add_premise)
//! - [`challenge_premise`](ReasoningSession::challenge_premise)
//! - [`draw_conclusion`](ReasoningSession::draw_conclusion)
//! - [`configure_logic`](ReasoningSession::configure_logic)
//! - [`set_generation_budget`](ReasoningSession::set_generation_budget)

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::config::ReasoningConfig;
use crate::error::Result;
use crate::journal::RejectionJournal;
use crate::llm::GenerationCapability;
use crate::logic::{LogicConfiguration, TruthRow, TruthTableValidator, UnificationEngine};
use crate::memory::{DialogEntry, Promotion, TieredMemory, ValidTruth};
use crate::pipeline::{ConclusionPipeline, DrawOutcome};
use crate::premise::{AddOutcome, ChallengeOutcome, Premise, PremiseStore};
use crate::storage::{ensure_dir, read_json, write_json};

/// Separator between propositions in conversational input.
pub const PROPOSITION_SEPARATOR: char = ';';

/// A single-writer reasoning session over one state directory.
pub struct ReasoningSession {
    config: ReasoningConfig,
    validator: TruthTableValidator,
    premises: PremiseStore,
    pipeline: ConclusionPipeline,
    memory: TieredMemory,
}

impl ReasoningSession {
    /// Open a session, restoring the logic configuration and premises
    /// persisted under the configured state directory.
    pub fn open(config: ReasoningConfig, generator: Arc<dyn GenerationCapability>) -> Result<Self> {
        let config = ReasoningConfig {
            storage: config.storage.expanded()?,
            ..config
        };
        let storage = &config.storage;
        ensure_dir(&storage.state_dir)?;

        let validator = TruthTableValidator::new(config.unset_logic_policy);
        if let Some(logic) = read_json::<LogicConfiguration>(&storage.logic_path())? {
            validator.configure_with(logic)?;
        }

        let journal = RejectionJournal::new(storage.journal_path());
        let premises = PremiseStore::open(
            storage.premises_path(),
            UnificationEngine::new(validator.shared()),
            journal.clone(),
        )?;
        let pipeline = ConclusionPipeline::new(
            generator,
            validator.clone(),
            journal,
            storage.conclusion_path(),
        )
        .with_generation_budget(config.generation_budget);
        let memory = TieredMemory::open(&storage.memory_dir, storage.partitions.clone())?
            .with_threshold(Duration::from_secs(config.promotion_threshold_secs));

        info!(
            state_dir = %storage.state_dir.display(),
            memory_dir = %storage.memory_dir.display(),
            premises = premises.len(),
            "reasoning session opened"
        );

        Ok(Self {
            config,
            validator,
            premises,
            pipeline,
            memory,
        })
    }

    /// Configuration with paths expanded.
    pub fn config(&self) -> &ReasoningConfig {
        &self.config
    }

    pub fn premises(&self) -> &PremiseStore {
        &self.premises
    }

    pub fn validator(&self) -> &TruthTableValidator {
        &self.validator
    }

    pub fn pipeline(&self) -> &ConclusionPipeline {
        &self.pipeline
    }

    pub fn memory(&self) -> &TieredMemory {
        &self.memory
    }

    pub fn journal(&self) -> &RejectionJournal {
        self.premises.journal()
    }

    pub fn add_premise(&mut self, text: &str) -> Result<AddOutcome> {
        self.premises.add(text)
    }

    pub fn challenge_premise(&mut self, text: &str) -> Result<ChallengeOutcome> {
        self.premises.remove(text)
    }

    /// Draw a conclusion from the current premises. Valid conclusions are
    /// also recorded in the truth partition.
    pub async fn draw_conclusion(&mut self) -> Result<DrawOutcome> {
        let outcome = self.pipeline.draw(self.premises.texts()).await?;
        if let DrawOutcome::Concluded(conclusion) = &outcome {
            if conclusion.valid {
                self.memory.record_truth(ValidTruth::new(
                    conclusion.text.clone(),
                    conclusion.premises.clone(),
                ))?;
            }
        }
        Ok(outcome)
    }

    /// Replace the logic configuration, drop premises the new configuration
    /// makes equivalent to an earlier one, then persist it.
    ///
    /// An unparseable expression leaves everything unchanged. Premises are
    /// reconciled even when writing `logic.json` fails.
    pub fn configure_logic<V, E>(
        &mut self,
        variables: impl IntoIterator<Item = V>,
        expressions: impl IntoIterator<Item = E>,
        valid_truths: Vec<TruthRow>,
    ) -> Result<Vec<Premise>>
    where
        V: Into<String>,
        E: Into<String>,
    {
        let logic = LogicConfiguration::new(variables, expressions, valid_truths);
        self.validator.configure_with(logic.clone())?;
        let reconciled = self.premises.reconcile();
        let persisted = write_json(&self.config.storage.logic_path(), &logic);
        let dropped = reconciled?;
        persisted?;
        Ok(dropped)
    }

    pub fn set_generation_budget(&mut self, budget: u32) {
        self.config.generation_budget = budget;
        self.pipeline.set_generation_budget(budget);
    }

    /// Split conversational input on `;` and add each proposition.
    #[instrument(skip(self, data))]
    pub fn learn_from_data(&mut self, data: &str) -> Result<Vec<AddOutcome>> {
        let mut outcomes = Vec::new();
        for proposition in data
            .split(PROPOSITION_SEPARATOR)
            .map(str::trim)
            .filter(|p| !p.is_empty())
        {
            outcomes.push(self.premises.add(proposition)?);
        }
        debug!(propositions = outcomes.len(), "learned from input");
        Ok(outcomes)
    }

    /// Record an instruction/response exchange through tier promotion.
    pub fn record_exchange(&self, instruction: &str, response: &str) -> Result<Promotion> {
        self.memory.promote(&DialogEntry::new(instruction, response))
    }

    /// Take conversational input, reason over it, and remember the exchange.
    pub async fn reason_about(&mut self, input: &str) -> Result<DrawOutcome> {
        self.learn_from_data(input)?;
        let outcome = self.draw_conclusion().await?;
        self.record_exchange(input, outcome.text())?;
        Ok(outcome)
    }
}

/// Session handle shareable across tasks.
pub type SharedSession = Arc<tokio::sync::Mutex<ReasoningSession>>;

/// Run a draw on the runtime so the caller's loop stays responsive. The
/// returned handle completes with the outcome.
#[cfg(feature = "tokio-runtime")]
pub fn spawn_draw(session: SharedSession) -> tokio::task::JoinHandle<Result<DrawOutcome>> {
    tokio::spawn(async move { session.lock().await.draw_conclusion().await })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StorageConfig, UnsetLogicPolicy};
    use crate::error::Error;
    use crate::llm::MockGenerator;
    use crate::memory::Tier;
    use crate::pipeline::{ConclusionSnapshot, NO_PREMISES_MESSAGE};
    use pretty_assertions::assert_eq;
    use tempfile::{tempdir, TempDir};

    fn config(dir: &TempDir) -> ReasoningConfig {
        ReasoningConfig::new(StorageConfig::under(dir.path()))
    }

    fn open(dir: &TempDir, mock: &Arc<MockGenerator>) -> ReasoningSession {
        ReasoningSession::open(config(dir), mock.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_add_then_conclude_round_trip() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockGenerator::new().with_responses(["R"]));
        let mut session = open(&dir, &mock);

        session.add_premise("P").unwrap();
        session.add_premise("Q").unwrap();
        let outcome = session.draw_conclusion().await.unwrap();

        assert_eq!(outcome.text(), "R");
        let snapshot: ConclusionSnapshot = read_json(&session.config().storage.conclusion_path())
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.premises, vec!["P", "Q"]);
        assert_eq!(snapshot.conclusion, "R");
    }

    #[tokio::test]
    async fn test_empty_store_returns_sentinel_without_generating() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockGenerator::new());
        let mut session = open(&dir, &mock);

        let outcome = session.draw_conclusion().await.unwrap();

        assert_eq!(outcome.text(), NO_PREMISES_MESSAGE);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_valid_conclusion_recorded_as_truth() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockGenerator::new().with_responses(["A & B -> C"]));
        let mut session = open(&dir, &mock);
        session
            .configure_logic(
                ["A", "B", "C"],
                ["A & B -> C"],
                vec![TruthRow::accepted([("A", true), ("B", true), ("C", true)])],
            )
            .unwrap();

        session.add_premise("A").unwrap();
        let outcome = session.draw_conclusion().await.unwrap();

        assert!(outcome.conclusion().unwrap().valid);
        let truths = session.memory().load_partition(Tier::Truth).unwrap();
        assert_eq!(truths.len(), 1);
    }

    #[test]
    fn test_configure_logic_persists_and_restores() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockGenerator::new());
        {
            let mut session = open(&dir, &mock);
            session
                .configure_logic(
                    ["A", "B"],
                    ["A -> B"],
                    vec![TruthRow::accepted([("A", true), ("B", true)])],
                )
                .unwrap();
            session.add_premise("A -> B").unwrap();
        }

        let mut reopened = open(&dir, &mock);

        assert_eq!(reopened.premises().texts(), vec!["A -> B"]);
        assert!(reopened.validator().is_tautology("A -> B"));
        assert!(!reopened.add_premise("!A | B").unwrap().is_added());
    }

    #[test]
    fn test_bad_configuration_keeps_previous() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockGenerator::new());
        let mut session = open(&dir, &mock);
        session
            .configure_logic(["A"], ["A"], vec![TruthRow::accepted([("A", true)])])
            .unwrap();

        let result = session.configure_logic(["A"], ["A &"], vec![]);

        assert!(result.is_err());
        assert!(session.validator().is_tautology("A"));
        let stored: LogicConfiguration = read_json(&session.config().storage.logic_path())
            .unwrap()
            .unwrap();
        assert!(stored.expressions.contains("A"));
    }

    #[test]
    fn test_configure_logic_reconciles_premises() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockGenerator::new());
        let mut session = open(&dir, &mock);
        session
            .configure_logic(["A"], Vec::<String>::new(), vec![TruthRow::accepted([("A", true)])])
            .unwrap();
        session.add_premise("A -> Z").unwrap();
        session.add_premise("!A | Z").unwrap();

        let dropped = session
            .configure_logic(
                ["A", "Z"],
                Vec::<String>::new(),
                vec![TruthRow::accepted([("A", true)])],
            )
            .unwrap();

        assert_eq!(dropped.len(), 1);
        assert_eq!(session.premises().texts(), vec!["A -> Z"]);
    }

    #[test]
    fn test_unwritable_logic_file_still_reconciles() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockGenerator::new());
        let mut session = open(&dir, &mock);
        session
            .configure_logic(["A"], Vec::<String>::new(), vec![TruthRow::accepted([("A", true)])])
            .unwrap();
        session.add_premise("A -> Z").unwrap();
        session.add_premise("!A | Z").unwrap();

        let logic_path = config(&dir).storage.logic_path();
        std::fs::remove_file(&logic_path).unwrap();
        std::fs::create_dir(&logic_path).unwrap();

        let err = session
            .configure_logic(
                ["A", "Z"],
                Vec::<String>::new(),
                vec![TruthRow::accepted([("A", true)])],
            )
            .unwrap_err();

        assert!(matches!(err, Error::Persistence { .. }));
        assert_eq!(session.premises().texts(), vec!["A -> Z"]);
    }

    #[test]
    fn test_learn_from_data_splits_propositions() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockGenerator::new());
        let mut session = open(&dir, &mock);

        let outcomes = session
            .learn_from_data("All men are mortal; Socrates is a man;; ")
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(
            session.premises().texts(),
            vec!["All men are mortal", "Socrates is a man"]
        );
    }

    #[tokio::test]
    async fn test_reason_about_records_exchange() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockGenerator::new().with_responses(["Socrates is mortal"]));
        let mut session = open(&dir, &mock);

        let outcome = session
            .reason_about("All men are mortal; Socrates is a man")
            .await
            .unwrap();

        assert_eq!(outcome.text(), "Socrates is mortal");
        let episodes = session.memory().load_partition(Tier::Episodic).unwrap();
        assert_eq!(episodes.len(), 1);
        let entry = episodes[0].payload.dialog_entry().unwrap();
        assert_eq!(entry.response, "Socrates is mortal");
        assert_eq!(session.memory().load_partition(Tier::ShortTerm).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_generation_budget_reaches_generator() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockGenerator::new());
        let mut session = ReasoningSession::open(
            config(&dir).with_unset_logic_policy(UnsetLogicPolicy::Accept),
            mock.clone(),
        )
        .unwrap();

        session.set_generation_budget(250);
        session.add_premise("P").unwrap();
        session.draw_conclusion().await.unwrap();

        assert_eq!(mock.requests()[0].max_tokens, 250);
        assert_eq!(session.config().generation_budget, 250);
    }

    #[cfg(feature = "tokio-runtime")]
    #[tokio::test]
    async fn test_spawn_draw_delivers_outcome() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockGenerator::new().with_responses(["Q"]));
        let mut session = open(&dir, &mock);
        session.add_premise("P").unwrap();
        let shared: SharedSession = Arc::new(tokio::sync::Mutex::new(session));

        let outcome = spawn_draw(shared.clone()).await.unwrap().unwrap();

        assert_eq!(outcome.text(), "Q");
        assert_eq!(mock.calls(), 1);
    }
}
