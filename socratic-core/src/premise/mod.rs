//! The premise store.
//!
//! Premises are kept in insertion order. Uniqueness is semantic: two texts
//! the [`UnificationEngine`](crate::logic::UnificationEngine) judges
//! equivalent never survive side by side. Challenging a premise removes it
//! together with everything equivalent to it.

mod store;
mod types;

pub use store::PremiseStore;
pub use types::{AddOutcome, ChallengeOutcome, Premise};
