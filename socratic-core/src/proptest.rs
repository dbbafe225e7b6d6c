//! Property-based tests for premise unification using proptest.
//!
//! These tests check the invariants the premise store relies on:
//!
//! - Unification is reflexive and symmetric
//! - Canonical rendering preserves meaning
//! - After any sequence of adds and challenges, surviving premises are
//!   pairwise non-equivalent and the snapshot matches memory

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::journal::RejectionJournal;
    use crate::logic::{Expr, SharedLogic, TruthRow, TruthTableValidator, UnificationEngine};
    use crate::premise::PremiseStore;
    use crate::storage::read_json;
    use crate::UnsetLogicPolicy;

    const ATOMS: [&str; 3] = ["A", "B", "C"];

    // Strategy for small formulas over a fixed alphabet
    fn formula() -> impl Strategy<Value = Expr> {
        let leaf = prop_oneof![
            (0..ATOMS.len()).prop_map(|i| Expr::var(ATOMS[i])),
            any::<bool>().prop_map(Expr::Const),
        ];
        leaf.prop_recursive(3, 12, 2, |inner| {
            prop_oneof![
                inner.clone().prop_map(Expr::not),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::and(a, b)),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::or(a, b)),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::implies(a, b)),
                (inner.clone(), inner).prop_map(|(a, b)| Expr::iff(a, b)),
            ]
        })
    }

    // Premise text: either a rendered formula or short prose
    fn premise_text() -> impl Strategy<Value = String> {
        prop_oneof![
            formula().prop_map(|f| f.to_string()),
            "[a-z]{1,6}( [a-z]{1,6}){0,2}",
        ]
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(String),
        Challenge(usize),
    }

    fn ops() -> impl Strategy<Value = Vec<Op>> {
        prop::collection::vec(
            prop_oneof![
                3 => premise_text().prop_map(Op::Add),
                1 => (0usize..8).prop_map(Op::Challenge),
            ],
            1..20,
        )
    }

    fn engine() -> UnificationEngine {
        UnificationEngine::new(SharedLogic::new())
    }

    // =========================================================================
    // Unification Properties
    // =========================================================================

    proptest! {
        /// Every text unifies with itself.
        #[test]
        fn unify_is_reflexive(text in premise_text()) {
            prop_assert!(engine().unify(&text, &text));
        }

        /// Argument order never changes the verdict.
        #[test]
        fn unify_is_symmetric(a in premise_text(), b in premise_text()) {
            let engine = engine();
            prop_assert_eq!(engine.unify(&a, &b), engine.unify(&b, &a));
        }

        /// Rendering then reparsing yields an equivalent formula.
        #[test]
        fn canonical_rendering_round_trips(f in formula()) {
            let reparsed = Expr::parse(&f.to_string()).unwrap();
            prop_assert!(f.equivalent(&reparsed, 16));
        }

        /// A formula unifies with its double negation.
        #[test]
        fn double_negation_unifies(f in formula()) {
            let doubled = Expr::not(Expr::not(f.clone()));
            prop_assert!(engine().unify(&f.to_string(), &doubled.to_string()));
        }
    }

    // =========================================================================
    // Premise Store Properties
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Survivors are pairwise non-equivalent and match the snapshot.
        #[test]
        fn survivors_are_pairwise_distinct(ops in ops()) {
            let dir = tempfile::tempdir().unwrap();
            let mut store = PremiseStore::new(
                dir.path().join("premises.json"),
                engine(),
                RejectionJournal::new(dir.path().join("rejections.json")),
            );

            for op in ops {
                match op {
                    Op::Add(text) => {
                        store.add(&text).unwrap();
                    }
                    Op::Challenge(i) => {
                        let texts = store.texts();
                        let target = if texts.is_empty() {
                            "absent".to_string()
                        } else {
                            texts[i % texts.len()].clone()
                        };
                        store.remove(&target).unwrap();
                    }
                }
            }

            let survivors = store.texts();
            for (i, a) in survivors.iter().enumerate() {
                for b in &survivors[i + 1..] {
                    prop_assert!(!store.engine().unify(a, b), "'{}' ~ '{}'", a, b);
                }
            }

            let indices: Vec<u64> = store.list().iter().map(|p| p.index).collect();
            prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));

            if let Some(on_disk) = read_json::<Vec<String>>(store.snapshot_path()).unwrap() {
                prop_assert_eq!(on_disk, survivors);
            }
        }

        /// The gate gives the same verdict for the same input.
        #[test]
        fn gate_is_deterministic(f in formula()) {
            let validator = TruthTableValidator::new(UnsetLogicPolicy::Reject);
            validator
                .configure(
                    ATOMS,
                    Vec::<String>::new(),
                    vec![
                        TruthRow::accepted([("A", true), ("B", false), ("C", true)]),
                        TruthRow::accepted([("A", false), ("B", true), ("C", true)]),
                    ],
                )
                .unwrap();
            let text = f.to_string();
            prop_assert_eq!(validator.is_tautology(&text), validator.is_tautology(&text));
        }
    }
}
