//! euclid-kernel: the trusted core.
//!
//! Expressions, typing contexts, the declaration environment, the
//! bidirectional checker and the normalizer. Everything above this crate
//! (tactics, geometric compilation, sessions) produces terms; this crate
//! is the sole judge of whether they typecheck.
//!
//! Type compatibility is hash-accelerated: every [`Type`] carries a
//! content hash of its alpha-canonical form, and equal hashes decide
//! compatibility in O(1). The fast path is sound up to Sha256-prefix
//! collisions; goal discharge re-verifies the final composed proof term
//! structurally, so a collision cannot smuggle an invalid proof past the
//! kernel.

pub mod checker;
pub mod context;
pub mod env;
pub mod expr;
pub mod name;
pub mod normalize;
pub mod pretty;
pub mod ty;

pub use checker::{TypeChecker, TypeError};
pub use context::Context;
pub use env::{Constructor, DeclKind, Declaration, EnvError, Environment, InductiveDecl};
pub use expr::{Expr, Literal};
pub use name::Name;
pub use normalize::{normalize, reduce, whnf, Strategy};
pub use ty::{classify, Type, TypeCategory, TypeSignature};

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use proptest::strategy::Strategy;

    /// Small closed-ish expression generator. Variables draw from a fixed
    /// pool so substitution and binding actually interact.
    fn arb_expr() -> impl Strategy<Value = Expr> {
        let leaf = prop_oneof![
            prop_oneof![Just("x"), Just("y"), Just("z")].prop_map(Expr::var),
            prop_oneof![Just("Nat"), Just("Bool")].prop_map(Expr::const_),
            (0u32..3).prop_map(Expr::sort),
            (0u64..10).prop_map(Expr::nat_lit),
        ];
        leaf.prop_recursive(4, 32, 2, |inner| {
            prop_oneof![
                (inner.clone(), inner.clone()).prop_map(|(f, a)| Expr::app(f, a)),
                (
                    prop_oneof![Just("x"), Just("y")],
                    inner.clone(),
                    inner.clone()
                )
                    .prop_map(|(b, t, e)| Expr::lam(b, t, e)),
                (
                    prop_oneof![Just("x"), Just("y")],
                    inner.clone(),
                    inner.clone()
                )
                    .prop_map(|(b, d, c)| Expr::pi(b, d, c)),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::pair(a, b)),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::sum(a, b)),
                (inner.clone(), inner.clone(), inner)
                    .prop_map(|(t, l, r)| Expr::path(t, l, r)),
            ]
        })
    }

    proptest! {
        #[test]
        fn alpha_eq_is_reflexive(e in arb_expr()) {
            prop_assert!(e.alpha_eq(&e));
        }

        #[test]
        fn subst_of_absent_variable_is_identity(e in arb_expr()) {
            let fresh: Name = "never_used".into();
            prop_assert!(e.subst(&fresh, &Expr::const_("Nat")).alpha_eq(&e));
        }

        #[test]
        fn canonical_form_agrees_with_alpha_eq(a in arb_expr(), b in arb_expr()) {
            // Equal canonical renderings must mean alpha-equal terms, and
            // alpha-equal terms must render identically.
            prop_assert_eq!(
                a.alpha_canonical() == b.alpha_canonical(),
                a.alpha_eq(&b)
            );
        }

        #[test]
        fn signature_hash_respects_alpha_eq(a in arb_expr(), b in arb_expr()) {
            if a.alpha_eq(&b) {
                prop_assert_eq!(Type::new(a).hash(), Type::new(b).hash());
            }
        }

        #[test]
        fn subst_eliminates_the_variable(e in arb_expr()) {
            // After substituting a closed term for x, x is no longer free.
            let x: Name = "x".into();
            let result = e.subst(&x, &Expr::const_("Nat"));
            prop_assert!(!result.free_vars().contains(&x));
        }
    }
}
