//! Premise types and mutation outcomes.

use serde::{Deserialize, Serialize};

use crate::journal::RejectionEntry;

/// A non-empty statement accepted into the reasoning context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Premise {
    pub text: String,
    /// Monotonic insertion index; never reused within a store
    pub index: u64,
}

impl Premise {
    pub fn new(text: impl Into<String>, index: u64) -> Self {
        Self {
            text: text.into(),
            index,
        }
    }
}

impl std::fmt::Display for Premise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Result of `add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added(Premise),
    /// Empty text or a duplicate of an existing premise; journaled
    Rejected(RejectionEntry),
}

impl AddOutcome {
    pub fn is_added(&self) -> bool {
        matches!(self, Self::Added(_))
    }
}

/// Result of `remove` (challenge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeOutcome {
    Removed {
        premise: Premise,
        /// Premises swept because they unify with the challenged one
        cascaded: Vec<Premise>,
    },
    /// The text was not in the store; journaled
    NotFound(RejectionEntry),
}

impl ChallengeOutcome {
    pub fn is_removed(&self) -> bool {
        matches!(self, Self::Removed { .. })
    }
}
