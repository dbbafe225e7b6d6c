//! Equivalence test between two premise texts.

use std::sync::LazyLock;

use regex::Regex;

use super::expr::Expr;
use super::tables::{CompiledLogic, SharedLogic};

/// Largest atom count for which equivalence is decided by full truth table.
pub const DEFAULT_MAX_ATOMS: usize = 16;

/// Leading labels such as `Premise 2:` or `premise:`.
static PREMISE_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*premise\s*\d*\s*[:.)\-]\s*").expect("Invalid regex")
});

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

static TRAILING_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?;]+$").expect("Invalid regex"));

/// Strip labels, collapse whitespace and drop trailing sentence punctuation.
pub fn normalize_premise(text: &str) -> String {
    let unlabeled = PREMISE_LABEL_RE.replace(text, "");
    let collapsed = WHITESPACE_RE.replace_all(unlabeled.trim(), " ");
    TRAILING_PUNCT_RE
        .replace(&collapsed, "")
        .trim_end()
        .to_string()
}

/// Decides whether two premises say the same thing under the active
/// configuration. Never touches the premise store.
#[derive(Debug, Clone)]
pub struct UnificationEngine {
    logic: SharedLogic,
    max_atoms: usize,
}

impl UnificationEngine {
    pub fn new(logic: SharedLogic) -> Self {
        Self {
            logic,
            max_atoms: DEFAULT_MAX_ATOMS,
        }
    }

    pub fn with_max_atoms(mut self, max_atoms: usize) -> Self {
        self.max_atoms = max_atoms;
        self
    }

    /// Reflexive and symmetric equivalence predicate.
    pub fn unify(&self, a: &str, b: &str) -> bool {
        let logic = self.logic.current();
        let a = normalize_premise(a);
        let b = normalize_premise(b);

        match (
            formula(&a, logic.as_deref()),
            formula(&b, logic.as_deref()),
        ) {
            (Some(fa), Some(fb)) => fa.equivalent(&fb, self.max_atoms),
            _ => a.to_lowercase() == b.to_lowercase(),
        }
    }
}

/// The formula a normalized premise denotes, if it parses and only mentions
/// configured variables. Configured variable names are case-sensitive.
fn formula(text: &str, logic: Option<&CompiledLogic>) -> Option<Expr> {
    let expr = Expr::parse(text).ok()?;
    match logic {
        Some(logic) if !logic.variables().is_empty() => expr
            .atoms()
            .iter()
            .all(|atom| logic.variables().contains(atom))
            .then_some(expr),
        // Without configured variables atoms are plain words, compared
        // case-insensitively like prose.
        _ => Some(expr.with_lowercase_atoms()),
    }
}
