//! Propositional logic layer: expressions, the truth-table gate and
//! premise unification.
//!
//! A [`LogicConfiguration`] (variables, expressions, accepted truth rows) is
//! compiled once and installed into a [`SharedLogic`] handle. Both the
//! [`TruthTableValidator`] and the [`UnificationEngine`] read the handle on
//! every call, so a replacement is visible to the next verdict.
//!
//! ## Example
//!
//! ```rust,ignore
//! use socratic_core::logic::{TruthRow, TruthTableValidator, UnificationEngine};
//! use socratic_core::UnsetLogicPolicy;
//!
//! let validator = TruthTableValidator::new(UnsetLogicPolicy::Reject);
//! validator.configure(
//!     ["A", "B", "C"],
//!     ["A & B -> C"],
//!     vec![TruthRow::accepted([("A", true), ("B", true), ("C", true)])],
//! )?;
//! assert!(validator.is_tautology("A & B -> C"));
//!
//! let engine = UnificationEngine::new(validator.shared());
//! assert!(engine.unify("If A and B, then C", "!(A & B) | C"));
//! ```

mod expr;
mod tables;
mod unify;

pub use expr::{search_tokens, Expr, Token};
pub use tables::{
    CompiledLogic, GateDecision, LogicConfiguration, SharedLogic, TruthRow, TruthTableValidator,
};
pub use unify::{normalize_premise, UnificationEngine, DEFAULT_MAX_ATOMS};
