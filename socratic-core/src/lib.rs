//! # socratic-core
//!
//! A small reasoning core: premises in, gated conclusions out, everything
//! mirrored into tiered memory.
//!
//! ## Core Components
//!
//! - **Premise**: ordered premise store with equivalence-based dedup
//! - **Logic**: expression language, truth-table gate, premise unification
//! - **Pipeline**: generation, validation and persistence of conclusions
//! - **Memory**: short-term, long-term, episodic and truth partitions
//! - **LLM**: the generation capability and its hosted backends
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use socratic_core::{
//!     ChatCompletionsClient, ClientConfig, ReasoningConfig, ReasoningSession, TruthRow,
//! };
//!
//! let generator = Arc::new(ChatCompletionsClient::openai(ClientConfig::new(api_key))?);
//! let mut session = ReasoningSession::open(ReasoningConfig::default(), generator)?;
//!
//! session.configure_logic(
//!     ["A", "B", "C"],
//!     ["A & B -> C"],
//!     vec![TruthRow::accepted([("A", true), ("B", true), ("C", true)])],
//! )?;
//! session.add_premise("A")?;
//! session.add_premise("B")?;
//!
//! let outcome = session.draw_conclusion().await?;
//! println!("{}", outcome.text());
//! ```

pub mod config;
pub mod error;
pub mod journal;
pub mod llm;
pub mod logic;
pub mod memory;
pub mod pipeline;
pub mod premise;
pub mod session;
pub mod storage;

mod proptest;

// Re-exports for convenience
pub use config::{
    PartitionNames, ReasoningConfig, StorageConfig, UnsetLogicPolicy, DEFAULT_GENERATION_BUDGET,
    DEFAULT_PROMOTION_THRESHOLD_SECS,
};
pub use error::{Error, Result};
pub use journal::{JournalLevel, RejectionEntry, RejectionJournal};
pub use llm::{
    AnthropicClient, Backend, ChatCompletionsClient, ClientConfig, GenerationCapability,
    GenerationRequest,
};
pub use logic::{
    Expr, GateDecision, LogicConfiguration, SharedLogic, TruthRow, TruthTableValidator,
    UnificationEngine,
};
pub use memory::{DialogEntry, MemoryRecord, MemoryStats, Promotion, Tier, TieredMemory, ValidTruth};
pub use pipeline::{Conclusion, ConclusionPipeline, DrawOutcome, PipelineState, NO_PREMISES_MESSAGE};
pub use premise::{AddOutcome, ChallengeOutcome, Premise, PremiseStore};
#[cfg(feature = "tokio-runtime")]
pub use session::spawn_draw;
pub use session::{ReasoningSession, SharedSession};
