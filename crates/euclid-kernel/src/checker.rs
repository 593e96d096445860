//! Bidirectional type checker.
//!
//! [`TypeChecker::infer`] synthesizes a type, [`TypeChecker::check`]
//! verifies a term against an expected type, and
//! [`TypeChecker::compatible`] decides interchangeability of two types.
//!
//! Compatibility is layered: equal content hashes short-circuit to `true`
//! in O(1), differing categories short-circuit to `false`, and only
//! same-category hash misses pay for definitional equality (normalize
//! both sides, compare up to alpha).
//!
//! Universes are cumulative in the checking direction: a term of
//! `Type i` checks against `Type j` whenever `i <= j`. Compatibility,
//! being symmetric, has no such slack: two universes are compatible
//! only when definitionally equal, so `Type 0` and `Type 1` are not
//! interchangeable even though one checks against the other.

use crate::context::Context;
use crate::env::Environment;
use crate::expr::{Expr, MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE};
use crate::normalize::{normalize, whnf};
use crate::ty::Type;
use thiserror::Error;

/// Errors produced by inference and checking.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown variable: {0}")]
    UnknownVariable(String),
    #[error("unknown constant: {0}")]
    UnknownConstant(String),
    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    Mismatch { expected: String, found: String },
    #[error("universe violation: `Type {found}` does not fit in `Type {expected}`")]
    UniverseViolation { expected: u32, found: u32 },
    #[error("expected a function type, found `{0}`")]
    NotAFunction(String),
    #[error("expected a product type, found `{0}`")]
    NotAProduct(String),
    #[error("expected a sum type, found `{0}`")]
    NotASum(String),
    #[error("expected a path type, found `{0}`")]
    NotAPath(String),
    #[error("expected a universe, found `{0}`")]
    NotAUniverse(String),
    #[error("cannot infer a type for `{0}`; an expected type is required")]
    CannotInfer(String),
}

/// The type checker. Cheap to construct; borrows the environment.
pub struct TypeChecker<'e> {
    env: &'e Environment,
}

impl<'e> TypeChecker<'e> {
    pub fn new(env: &'e Environment) -> Self {
        TypeChecker { env }
    }

    pub fn env(&self) -> &Environment {
        self.env
    }

    /// Synthesize the type of `expr` in `ctx`.
    pub fn infer(&self, ctx: &Context, expr: &Expr) -> Result<Type, TypeError> {
        stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
            self.infer_inner(ctx, expr)
        })
    }

    fn infer_inner(&self, ctx: &Context, expr: &Expr) -> Result<Type, TypeError> {
        match expr {
            Expr::Var(name) => ctx
                .lookup(name)
                .cloned()
                .ok_or_else(|| TypeError::UnknownVariable(name.to_string())),
            Expr::Const(name) => self
                .env
                .get_decl(name)
                .map(|d| Type::new(d.ty.clone()))
                .ok_or_else(|| TypeError::UnknownConstant(name.to_string())),
            Expr::Sort(i) => Ok(Type::new(Expr::sort(i + 1))),
            Expr::Lit(lit) => Ok(Type::new(Expr::const_(match lit {
                crate::expr::Literal::Nat(_) => "Nat",
                crate::expr::Literal::Bool(_) => "Bool",
            }))),
            Expr::App(f, a) => {
                let f_ty = self.infer(ctx, f)?;
                let f_ty_whnf = whnf(self.env, f_ty.expr());
                let Expr::Pi {
                    binder,
                    domain,
                    codomain,
                } = &f_ty_whnf
                else {
                    return Err(TypeError::NotAFunction(f_ty.to_string()));
                };
                self.check(ctx, a, &Type::new((**domain).clone()))?;
                Ok(Type::new(codomain.subst(binder, a)))
            }
            Expr::Lam { binder, ty, body } => {
                self.infer_universe(ctx, ty)?;
                let domain = Type::new((**ty).clone());
                let (inner, used) = ctx.extended(binder.clone(), domain);
                let body = if &used == binder {
                    (**body).clone()
                } else {
                    body.subst(binder, &Expr::var(used.clone()))
                };
                let body_ty = self.infer(&inner, &body)?;
                Ok(Type::new(Expr::pi(
                    used,
                    (**ty).clone(),
                    body_ty.expr().clone(),
                )))
            }
            Expr::Pi {
                binder,
                domain,
                codomain,
            } => {
                let i = self.infer_universe(ctx, domain)?;
                let dom = Type::new((**domain).clone());
                let (inner, used) = ctx.extended(binder.clone(), dom);
                let codomain = if &used == binder {
                    (**codomain).clone()
                } else {
                    codomain.subst(binder, &Expr::var(used))
                };
                let j = self.infer_universe(&inner, &codomain)?;
                Ok(Type::new(Expr::sort(i.max(j))))
            }
            Expr::Sigma {
                binder,
                fst_ty,
                snd_ty,
            } => {
                let i = self.infer_universe(ctx, fst_ty)?;
                let fst = Type::new((**fst_ty).clone());
                let (inner, used) = ctx.extended(binder.clone(), fst);
                let snd_ty = if &used == binder {
                    (**snd_ty).clone()
                } else {
                    snd_ty.subst(binder, &Expr::var(used))
                };
                let j = self.infer_universe(&inner, &snd_ty)?;
                Ok(Type::new(Expr::sort(i.max(j))))
            }
            Expr::Pair(a, b) => {
                // Without an expected type a pair infers to a
                // non-dependent product; dependent pairs go through check.
                let a_ty = self.infer(ctx, a)?;
                let b_ty = self.infer(ctx, b)?;
                Ok(Type::new(Expr::sigma(
                    "_",
                    a_ty.expr().clone(),
                    b_ty.expr().clone(),
                )))
            }
            Expr::Fst(e) => {
                let (fst_ty, _, _) = self.infer_sigma(ctx, e)?;
                Ok(Type::new(fst_ty))
            }
            Expr::Snd(e) => {
                let (_, binder, snd_ty) = self.infer_sigma(ctx, e)?;
                Ok(Type::new(snd_ty.subst(&binder, &Expr::Fst(e.clone()))))
            }
            Expr::Sum(a, b) => {
                let i = self.infer_universe(ctx, a)?;
                let j = self.infer_universe(ctx, b)?;
                Ok(Type::new(Expr::sort(i.max(j))))
            }
            Expr::Inl(_) | Expr::Inr(_) => {
                // The other summand is unknowable without annotation.
                Err(TypeError::CannotInfer(expr.to_string()))
            }
            Expr::Case {
                scrut,
                left_binder,
                left,
                right_binder,
                right,
            } => {
                let scrut_ty = self.infer(ctx, scrut)?;
                let scrut_whnf = whnf(self.env, scrut_ty.expr());
                let Expr::Sum(l_ty, r_ty) = &scrut_whnf else {
                    return Err(TypeError::NotASum(scrut_ty.to_string()));
                };
                let (l_ctx, l_used) =
                    ctx.extended(left_binder.clone(), Type::new((**l_ty).clone()));
                let left = if &l_used == left_binder {
                    (**left).clone()
                } else {
                    left.subst(left_binder, &Expr::var(l_used))
                };
                let left_ty = self.infer(&l_ctx, &left)?;

                let (r_ctx, r_used) =
                    ctx.extended(right_binder.clone(), Type::new((**r_ty).clone()));
                let right = if &r_used == right_binder {
                    (**right).clone()
                } else {
                    right.subst(right_binder, &Expr::var(r_used))
                };
                let right_ty = self.infer(&r_ctx, &right)?;

                if !self.compatible(&left_ty, &right_ty) {
                    return Err(TypeError::Mismatch {
                        expected: left_ty.to_string(),
                        found: right_ty.to_string(),
                    });
                }
                Ok(left_ty)
            }
            Expr::Path { ty, lhs, rhs } => {
                let i = self.infer_universe(ctx, ty)?;
                let carrier = Type::new((**ty).clone());
                self.check(ctx, lhs, &carrier)?;
                self.check(ctx, rhs, &carrier)?;
                Ok(Type::new(Expr::sort(i)))
            }
            Expr::Refl(e) => {
                let ty = self.infer(ctx, e)?;
                Ok(Type::new(Expr::path(
                    ty.expr().clone(),
                    (**e).clone(),
                    (**e).clone(),
                )))
            }
            Expr::Transport { motive, path, body } => {
                let path_ty = self.infer(ctx, path)?;
                let path_whnf = whnf(self.env, path_ty.expr());
                let Expr::Path { ty, lhs, rhs } = &path_whnf else {
                    return Err(TypeError::NotAPath(path_ty.to_string()));
                };
                // motive : A → Type
                self.check(
                    ctx,
                    motive,
                    &Type::new(Expr::arrow((**ty).clone(), Expr::type_())),
                )?;
                // body : motive lhs
                let at_lhs = normalize(
                    self.env,
                    &Expr::app((**motive).clone(), (**lhs).clone()),
                );
                self.check(ctx, body, &Type::new(at_lhs))?;
                let at_rhs = normalize(
                    self.env,
                    &Expr::app((**motive).clone(), (**rhs).clone()),
                );
                Ok(Type::new(at_rhs))
            }
        }
    }

    /// Verify `expr` against `expected` in `ctx`.
    pub fn check(&self, ctx: &Context, expr: &Expr, expected: &Type) -> Result<(), TypeError> {
        stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
            self.check_inner(ctx, expr, expected)
        })
    }

    fn check_inner(&self, ctx: &Context, expr: &Expr, expected: &Type) -> Result<(), TypeError> {
        let expected_whnf = whnf(self.env, expected.expr());
        match (expr, &expected_whnf) {
            (
                Expr::Lam { binder, ty, body },
                Expr::Pi {
                    binder: pi_binder,
                    domain,
                    codomain,
                },
            ) => {
                self.infer_universe(ctx, ty)?;
                let annotated = Type::new((**ty).clone());
                let dom = Type::new((**domain).clone());
                if !self.compatible(&annotated, &dom) {
                    return Err(TypeError::Mismatch {
                        expected: dom.to_string(),
                        found: annotated.to_string(),
                    });
                }
                let (inner, used) = ctx.extended(binder.clone(), dom);
                let body = if &used == binder {
                    (**body).clone()
                } else {
                    body.subst(binder, &Expr::var(used.clone()))
                };
                let codomain = codomain.subst(pi_binder, &Expr::var(used));
                self.check(&inner, &body, &Type::new(codomain))
            }
            (
                Expr::Pair(a, b),
                Expr::Sigma {
                    binder,
                    fst_ty,
                    snd_ty,
                },
            ) => {
                self.check(ctx, a, &Type::new((**fst_ty).clone()))?;
                let snd = snd_ty.subst(binder, a);
                self.check(ctx, b, &Type::new(snd))
            }
            (Expr::Inl(e), Expr::Sum(l, _)) => self.check(ctx, e, &Type::new((**l).clone())),
            (Expr::Inr(e), Expr::Sum(_, r)) => self.check(ctx, e, &Type::new((**r).clone())),
            // Non-dependent sum elimination checks each branch against the
            // expected type, so branches may themselves be injections.
            (
                Expr::Case {
                    scrut,
                    left_binder,
                    left,
                    right_binder,
                    right,
                },
                _,
            ) => {
                let scrut_ty = self.infer(ctx, scrut)?;
                let scrut_whnf = whnf(self.env, scrut_ty.expr());
                let Expr::Sum(l_ty, r_ty) = &scrut_whnf else {
                    return Err(TypeError::NotASum(scrut_ty.to_string()));
                };
                let (l_ctx, l_used) =
                    ctx.extended(left_binder.clone(), Type::new((**l_ty).clone()));
                let left = if &l_used == left_binder {
                    (**left).clone()
                } else {
                    left.subst(left_binder, &Expr::var(l_used))
                };
                self.check(&l_ctx, &left, expected)?;
                let (r_ctx, r_used) =
                    ctx.extended(right_binder.clone(), Type::new((**r_ty).clone()));
                let right = if &r_used == right_binder {
                    (**right).clone()
                } else {
                    right.subst(right_binder, &Expr::var(r_used))
                };
                self.check(&r_ctx, &right, expected)
            }
            _ => {
                let found = self.infer(ctx, expr)?;
                let found_whnf = whnf(self.env, found.expr());
                // Cumulativity: Type i fits in Type j for i <= j.
                if let (Expr::Sort(i), Expr::Sort(j)) = (&found_whnf, &expected_whnf) {
                    if i <= j {
                        return Ok(());
                    }
                    return Err(TypeError::UniverseViolation {
                        expected: *j,
                        found: *i,
                    });
                }
                if self.compatible(&found, expected) {
                    Ok(())
                } else {
                    Err(TypeError::Mismatch {
                        expected: expected.to_string(),
                        found: found.to_string(),
                    })
                }
            }
        }
    }

    /// Are two types interchangeable?
    ///
    /// Symmetric. Equal hashes answer in O(1); a category mismatch answers
    /// `false` without normalizing; same-category hash misses fall back to
    /// definitional equality.
    pub fn compatible(&self, a: &Type, b: &Type) -> bool {
        if a.hash() == b.hash() {
            return true;
        }
        if a.category() != b.category() {
            // Categories can only converge through delta (a definition
            // unfolding to a different type former), so Base is the one
            // category that still needs the structural fallback.
            use crate::ty::TypeCategory::Base;
            if a.category() != Base && b.category() != Base {
                return false;
            }
        }
        self.def_eq(a.expr(), b.expr())
    }

    /// Definitional equality: full normalization followed by
    /// alpha-comparison.
    pub fn def_eq(&self, a: &Expr, b: &Expr) -> bool {
        if a.alpha_eq(b) {
            return true;
        }
        normalize(self.env, a).alpha_eq(&normalize(self.env, b))
    }

    /// Infer and require a universe; returns the level.
    fn infer_universe(&self, ctx: &Context, expr: &Expr) -> Result<u32, TypeError> {
        let ty = self.infer(ctx, expr)?;
        match whnf(self.env, ty.expr()) {
            Expr::Sort(i) => Ok(i),
            _ => Err(TypeError::NotAUniverse(ty.to_string())),
        }
    }

    /// Infer and require a Sigma; returns `(fst_ty, binder, snd_ty)`.
    fn infer_sigma(
        &self,
        ctx: &Context,
        expr: &Expr,
    ) -> Result<(Expr, crate::name::Name, Expr), TypeError> {
        let ty = self.infer(ctx, expr)?;
        match whnf(self.env, ty.expr()) {
            Expr::Sigma {
                binder,
                fst_ty,
                snd_ty,
            } => Ok(((*fst_ty).clone(), binder, (*snd_ty).clone())),
            _ => Err(TypeError::NotAProduct(ty.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Environment, Context) {
        (Environment::with_builtins(), Context::new())
    }

    #[test]
    fn test_infer_variable_and_constant() {
        let (env, mut ctx) = setup();
        ctx.push("n".into(), Type::new(Expr::const_("Nat")));
        let tc = TypeChecker::new(&env);

        let ty = tc.infer(&ctx, &Expr::var("n")).unwrap();
        assert_eq!(ty.description(), "Nat");

        let err = tc.infer(&ctx, &Expr::var("m")).unwrap_err();
        assert!(matches!(err, TypeError::UnknownVariable(_)));

        let zero = tc.infer(&ctx, &Expr::const_("Nat.zero")).unwrap();
        assert_eq!(zero.description(), "Nat");
    }

    #[test]
    fn test_infer_lambda_and_application() {
        let (env, ctx) = setup();
        let tc = TypeChecker::new(&env);

        let lam = Expr::lam("x", Expr::const_("Nat"), Expr::var("x"));
        let ty = tc.infer(&ctx, &lam).unwrap();
        assert_eq!(ty.description(), "Nat → Nat");

        let app = Expr::app(lam, Expr::const_("Nat.zero"));
        assert_eq!(tc.infer(&ctx, &app).unwrap().description(), "Nat");
    }

    #[test]
    fn test_dependent_application_substitutes() {
        let (env, mut ctx) = setup();
        ctx.push(
            "f".into(),
            Type::new(Expr::pi(
                "n",
                Expr::const_("Nat"),
                Expr::path(Expr::const_("Nat"), Expr::var("n"), Expr::var("n")),
            )),
        );
        let tc = TypeChecker::new(&env);
        let app = Expr::app(Expr::var("f"), Expr::const_("Nat.zero"));
        assert_eq!(
            tc.infer(&ctx, &app).unwrap().description(),
            "Path Nat Nat.zero Nat.zero"
        );
    }

    #[test]
    fn test_application_argument_mismatch() {
        let (env, ctx) = setup();
        let tc = TypeChecker::new(&env);
        let lam = Expr::lam("x", Expr::const_("Nat"), Expr::var("x"));
        let err = tc
            .infer(&ctx, &Expr::app(lam, Expr::const_("Bool.true")))
            .unwrap_err();
        assert!(matches!(err, TypeError::Mismatch { .. }));
    }

    #[test]
    fn test_refl_and_path() {
        let (env, ctx) = setup();
        let tc = TypeChecker::new(&env);
        let refl = Expr::refl(Expr::const_("Nat.zero"));
        assert_eq!(
            tc.infer(&ctx, &refl).unwrap().description(),
            "Path Nat Nat.zero Nat.zero"
        );
    }

    #[test]
    fn test_injections_check_but_do_not_infer() {
        let (env, ctx) = setup();
        let tc = TypeChecker::new(&env);
        let inl = Expr::Inl(Expr::const_("Nat.zero").into());
        assert!(matches!(
            tc.infer(&ctx, &inl),
            Err(TypeError::CannotInfer(_))
        ));
        let sum = Type::new(Expr::sum(Expr::const_("Nat"), Expr::const_("Bool")));
        tc.check(&ctx, &inl, &sum).unwrap();
    }

    #[test]
    fn test_pair_against_dependent_sigma() {
        let (env, ctx) = setup();
        let tc = TypeChecker::new(&env);
        // Σ(A : Type). A, witnessed by (Nat, Nat.zero).
        let sig = Type::new(Expr::sigma("A", Expr::type_(), Expr::var("A")));
        let pair = Expr::pair(Expr::const_("Nat"), Expr::const_("Nat.zero"));
        tc.check(&ctx, &pair, &sig).unwrap();

        let bad = Expr::pair(Expr::const_("Bool"), Expr::const_("Nat.zero"));
        assert!(tc.check(&ctx, &bad, &sig).is_err());
    }

    #[test]
    fn test_universe_cumulativity_is_directional() {
        let (env, ctx) = setup();
        let tc = TypeChecker::new(&env);
        // Type : Type 1 and also Type : Type 2, but Type 2 is not : Type 1.
        tc.check(&ctx, &Expr::type_(), &Type::new(Expr::sort(1)))
            .unwrap();
        tc.check(&ctx, &Expr::type_(), &Type::new(Expr::sort(2)))
            .unwrap();
        let err = tc
            .check(&ctx, &Expr::sort(2), &Type::new(Expr::sort(1)))
            .unwrap_err();
        assert!(matches!(err, TypeError::UniverseViolation { .. }));
        // compatible has no such slack: distinct universes never
        // interchange, in either order.
        assert!(!tc.compatible(&Type::new(Expr::sort(0)), &Type::new(Expr::sort(1))));
        assert!(!tc.compatible(&Type::new(Expr::sort(1)), &Type::new(Expr::sort(0))));
    }

    #[test]
    fn test_compatible_through_definitions() {
        let (mut env, ctx) = setup();
        env.add_decl(crate::env::Declaration {
            name: "MyNat".into(),
            ty: Expr::type_(),
            value: Some(Expr::const_("Nat")),
            kind: crate::env::DeclKind::Definition,
        })
        .unwrap();
        let tc = TypeChecker::new(&env);

        let a = Type::new(Expr::const_("MyNat"));
        let b = Type::new(Expr::const_("Nat"));
        // Hashes differ, categories agree (both Base), delta closes the gap.
        assert_ne!(a.hash(), b.hash());
        assert!(tc.compatible(&a, &b));
        assert!(tc.compatible(&b, &a));

        // And checking uses the same equality.
        tc.check(&ctx, &Expr::const_("Nat.zero"), &a).unwrap();
    }

    #[test]
    fn test_compatible_rejects_category_mismatch() {
        let (env, _) = setup();
        let tc = TypeChecker::new(&env);
        let fun = Type::new(Expr::arrow(Expr::const_("Nat"), Expr::const_("Nat")));
        let sum = Type::new(Expr::sum(Expr::const_("Nat"), Expr::const_("Bool")));
        assert!(!tc.compatible(&fun, &sum));
    }

    #[test]
    fn test_compatible_alpha_renamed_fast_path() {
        let (env, _) = setup();
        let tc = TypeChecker::new(&env);
        let a = Type::new(Expr::pi(
            "x",
            Expr::const_("Nat"),
            Expr::path(Expr::const_("Nat"), Expr::var("x"), Expr::var("x")),
        ));
        let b = Type::new(Expr::pi(
            "y",
            Expr::const_("Nat"),
            Expr::path(Expr::const_("Nat"), Expr::var("y"), Expr::var("y")),
        ));
        assert_eq!(a.hash(), b.hash());
        assert!(tc.compatible(&a, &b));
    }

    #[test]
    fn test_case_branches_must_agree() {
        let (env, mut ctx) = setup();
        ctx.push(
            "s".into(),
            Type::new(Expr::sum(Expr::const_("Nat"), Expr::const_("Bool"))),
        );
        let tc = TypeChecker::new(&env);

        let ok = Expr::Case {
            scrut: Expr::var("s").into(),
            left_binder: "a".into(),
            left: Expr::const_("Nat.zero").into(),
            right_binder: "b".into(),
            right: Expr::const_("Nat.zero").into(),
        };
        assert_eq!(tc.infer(&ctx, &ok).unwrap().description(), "Nat");

        let bad = Expr::Case {
            scrut: Expr::var("s").into(),
            left_binder: "a".into(),
            left: Expr::const_("Nat.zero").into(),
            right_binder: "b".into(),
            right: Expr::var("b").into(),
        };
        assert!(tc.infer(&ctx, &bad).is_err());
    }

    #[test]
    fn test_transport_endpoints() {
        let (env, mut ctx) = setup();
        ctx.push("a".into(), Type::new(Expr::const_("Nat")));
        ctx.push("b".into(), Type::new(Expr::const_("Nat")));
        ctx.push(
            "p".into(),
            Type::new(Expr::path(
                Expr::const_("Nat"),
                Expr::var("a"),
                Expr::var("b"),
            )),
        );
        ctx.push(
            "P".into(),
            Type::new(Expr::arrow(Expr::const_("Nat"), Expr::type_())),
        );
        ctx.push(
            "h".into(),
            Type::new(Expr::app(Expr::var("P"), Expr::var("a"))),
        );
        let tc = TypeChecker::new(&env);
        let tr = Expr::transport(
            Expr::lam("x", Expr::const_("Nat"), Expr::app(Expr::var("P"), Expr::var("x"))),
            Expr::var("p"),
            Expr::var("h"),
        );
        assert_eq!(tc.infer(&ctx, &tr).unwrap().description(), "P b");
    }
}
