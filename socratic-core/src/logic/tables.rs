//! Logic configuration and the truth-table acceptance gate.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::UnsetLogicPolicy;
use crate::error::Result;

use super::expr::{search_tokens, Expr};

fn default_accepted() -> bool {
    true
}

/// One variable-assignment row of the truth table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruthRow {
    pub assignment: BTreeMap<String, bool>,
    /// Whether this row is marked acceptable
    #[serde(default = "default_accepted")]
    pub accepted: bool,
}

impl TruthRow {
    /// An acceptable row built from `(variable, value)` pairs.
    pub fn accepted<K: Into<String>>(pairs: impl IntoIterator<Item = (K, bool)>) -> Self {
        Self {
            assignment: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            accepted: true,
        }
    }

    /// A row explicitly marked unacceptable.
    pub fn rejected<K: Into<String>>(pairs: impl IntoIterator<Item = (K, bool)>) -> Self {
        Self {
            accepted: false,
            ..Self::accepted(pairs)
        }
    }

    /// Whether `context` agrees with this row on every key in `variables`
    /// (or on the row's own keys when `variables` is empty).
    fn matches(&self, context: &BTreeMap<String, bool>, variables: &BTreeSet<String>) -> bool {
        let agree = |name: &String| {
            context.get(name).copied().unwrap_or(false)
                == self.assignment.get(name).copied().unwrap_or(false)
        };
        if variables.is_empty() {
            self.assignment.keys().all(agree)
        } else {
            variables.iter().all(agree)
        }
    }
}

/// The replaceable logic configuration: variables, expressions and rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicConfiguration {
    pub variables: BTreeSet<String>,
    pub expressions: BTreeSet<String>,
    pub valid_truths: Vec<TruthRow>,
}

impl LogicConfiguration {
    pub fn new<V, E>(
        variables: impl IntoIterator<Item = V>,
        expressions: impl IntoIterator<Item = E>,
        valid_truths: Vec<TruthRow>,
    ) -> Self
    where
        V: Into<String>,
        E: Into<String>,
    {
        Self {
            variables: variables.into_iter().map(Into::into).collect(),
            expressions: expressions.into_iter().map(Into::into).collect(),
            valid_truths,
        }
    }

    /// Parse every expression once.
    pub fn compile(self) -> Result<CompiledLogic> {
        let formulas = self
            .expressions
            .iter()
            .map(|source| Expr::parse(source))
            .collect::<Result<Vec<_>>>()?;
        Ok(CompiledLogic {
            config: self,
            formulas,
        })
    }
}

/// A configuration with its expressions parsed.
#[derive(Debug, Clone)]
pub struct CompiledLogic {
    config: LogicConfiguration,
    formulas: Vec<Expr>,
}

impl CompiledLogic {
    pub fn config(&self) -> &LogicConfiguration {
        &self.config
    }

    pub fn formulas(&self) -> &[Expr] {
        &self.formulas
    }

    pub fn variables(&self) -> &BTreeSet<String> {
        &self.config.variables
    }

    fn accepted_rows(&self) -> impl Iterator<Item = &TruthRow> {
        self.config.valid_truths.iter().filter(|row| row.accepted)
    }

    /// Formulas a text stands for: the text itself when it parses to a
    /// formula over configured variables, otherwise every configured formula
    /// that occurs in it.
    fn candidates(&self, text: &str) -> Vec<Expr> {
        if let Ok(expr) = Expr::parse(text.trim()) {
            let atoms = expr.atoms();
            if !atoms.is_empty() && atoms.iter().all(|atom| self.variables().contains(atom)) {
                return vec![expr];
            }
        }

        let haystack = search_tokens(text);
        self.formulas
            .iter()
            .filter(|formula| {
                let needle = search_tokens(&formula.to_string());
                !needle.is_empty()
                    && haystack
                        .windows(needle.len())
                        .any(|window| window == needle.as_slice())
            })
            .cloned()
            .collect()
    }
}

/// Handle on the active configuration, shared by the gate and the
/// unification engine. Replacement swaps the whole value at once.
#[derive(Debug, Clone, Default)]
pub struct SharedLogic {
    inner: Arc<RwLock<Option<Arc<CompiledLogic>>>>,
}

impl SharedLogic {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration active right now.
    pub fn current(&self) -> Option<Arc<CompiledLogic>> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn replace(&self, logic: CompiledLogic) {
        let logic = Some(Arc::new(logic));
        match self.inner.write() {
            Ok(mut guard) => *guard = logic,
            Err(poisoned) => *poisoned.into_inner() = logic,
        }
    }
}

/// Outcome of running a text through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    pub valid: bool,
    pub reason: String,
}

impl GateDecision {
    fn accept(reason: impl Into<String>) -> Self {
        Self {
            valid: true,
            reason: reason.into(),
        }
    }

    fn reject(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: reason.into(),
        }
    }
}

/// Tautology-style acceptance gate over the active logic configuration.
#[derive(Debug, Clone)]
pub struct TruthTableValidator {
    logic: SharedLogic,
    unset_policy: UnsetLogicPolicy,
}

impl TruthTableValidator {
    pub fn new(unset_policy: UnsetLogicPolicy) -> Self {
        Self::with_shared(SharedLogic::new(), unset_policy)
    }

    pub fn with_shared(logic: SharedLogic, unset_policy: UnsetLogicPolicy) -> Self {
        Self {
            logic,
            unset_policy,
        }
    }

    /// Handle for components that must see the same configuration.
    pub fn shared(&self) -> SharedLogic {
        self.logic.clone()
    }

    /// Replace the whole configuration. On a parse failure the previous
    /// configuration stays active.
    pub fn configure<V, E>(
        &self,
        variables: impl IntoIterator<Item = V>,
        expressions: impl IntoIterator<Item = E>,
        valid_truths: Vec<TruthRow>,
    ) -> Result<()>
    where
        V: Into<String>,
        E: Into<String>,
    {
        self.configure_with(LogicConfiguration::new(
            variables,
            expressions,
            valid_truths,
        ))
    }

    pub fn configure_with(&self, config: LogicConfiguration) -> Result<()> {
        let compiled = config.compile()?;
        info!(
            variables = compiled.config().variables.len(),
            expressions = compiled.formulas().len(),
            rows = compiled.config().valid_truths.len(),
            "logic configuration replaced"
        );
        self.logic.replace(compiled);
        Ok(())
    }

    pub fn configuration(&self) -> Option<LogicConfiguration> {
        self.logic.current().map(|logic| logic.config().clone())
    }

    /// Whether `text` holds under every accepted row.
    pub fn is_tautology(&self, text: &str) -> bool {
        self.evaluate(text).valid
    }

    /// Whether `text` holds under `context`, given that `context` is an
    /// accepted row.
    pub fn is_tautology_under(&self, text: &str, context: &BTreeMap<String, bool>) -> bool {
        self.evaluate_under(text, context).valid
    }

    pub fn evaluate(&self, text: &str) -> GateDecision {
        let Some(logic) = self.logic.current() else {
            return self.unset_decision();
        };

        let candidates = logic.candidates(text);
        if candidates.is_empty() {
            return GateDecision::reject("no configured expression found in text");
        }

        let rows: Vec<&TruthRow> = logic.accepted_rows().collect();
        if rows.is_empty() {
            return GateDecision::reject("no accepted truth rows configured");
        }

        for formula in &candidates {
            if let Some(row) = rows.iter().find(|row| !formula.eval(&row.assignment)) {
                debug!(formula = %formula, row = ?row.assignment, "formula fails accepted row");
                return GateDecision::reject(format!(
                    "'{}' is false under an accepted row",
                    formula
                ));
            }
        }

        GateDecision::accept(format!(
            "{} expression(s) hold under {} accepted row(s)",
            candidates.len(),
            rows.len()
        ))
    }

    pub fn evaluate_under(&self, text: &str, context: &BTreeMap<String, bool>) -> GateDecision {
        let Some(logic) = self.logic.current() else {
            return self.unset_decision();
        };

        let variables = logic.variables();
        if !logic
            .accepted_rows()
            .any(|row| row.matches(context, variables))
        {
            return GateDecision::reject("context matches no accepted truth row");
        }

        let candidates = logic.candidates(text);
        if candidates.is_empty() {
            return GateDecision::reject("no configured expression found in text");
        }

        match candidates.iter().find(|formula| !formula.eval(context)) {
            Some(formula) => GateDecision::reject(format!("'{}' is false in context", formula)),
            None => GateDecision::accept("context is accepted and every expression holds"),
        }
    }

    fn unset_decision(&self) -> GateDecision {
        match self.unset_policy {
            UnsetLogicPolicy::Reject => GateDecision::reject("no logic configuration set"),
            UnsetLogicPolicy::Accept => {
                GateDecision::accept("no logic configuration set; permissive policy")
            }
        }
    }
}
