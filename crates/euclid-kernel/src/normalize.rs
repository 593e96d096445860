//! Reduction and normalization.
//!
//! Reduction rules:
//! - beta:      `(λ(x : A). b) a` reduces to `b[x := a]`
//! - projection: `fst (a, b)` / `snd (a, b)` reduce to `a` / `b`
//! - case:      `case (inl v) of ...` selects the matching branch
//! - transport: `transport C (refl a) b` reduces to `b`
//! - delta:     a `Const` naming a definition unfolds to its value
//!
//! Delta applies to definitions only; theorems, axioms, inductives and
//! constructors are opaque.

use crate::env::{DeclKind, Environment};
use crate::expr::{Expr, MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE};
use serde::{Deserialize, Serialize};

/// How far to normalize.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Weak head normal form: reduce at the head until a constructor,
    /// binder or neutral term surfaces.
    Whnf,
    /// Full normal form: reduce everywhere, including under binders.
    Full,
    /// Normalization by evaluation. Currently an alias for [`Strategy::Full`];
    /// both produce full normal forms.
    Nbe,
}

/// Normalize under the requested strategy.
pub fn reduce(env: &Environment, expr: &Expr, strategy: Strategy) -> Expr {
    match strategy {
        Strategy::Whnf => whnf(env, expr),
        Strategy::Full | Strategy::Nbe => normalize(env, expr),
    }
}

/// Weak head normal form.
pub fn whnf(env: &Environment, expr: &Expr) -> Expr {
    let mut cur = expr.clone();
    loop {
        match step_head(env, &cur) {
            Some(next) => cur = next,
            None => return cur,
        }
    }
}

/// Full normal form: normalize the head, then recurse into every subterm,
/// including binder bodies.
pub fn normalize(env: &Environment, expr: &Expr) -> Expr {
    stacker::maybe_grow(MIN_STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
        let head = whnf(env, expr);
        match head {
            Expr::Var(_) | Expr::Const(_) | Expr::Sort(_) | Expr::Lit(_) => head,
            Expr::App(f, a) => Expr::app(normalize(env, &f), normalize(env, &a)),
            Expr::Lam { binder, ty, body } => {
                Expr::lam(binder, normalize(env, &ty), normalize(env, &body))
            }
            Expr::Pi {
                binder,
                domain,
                codomain,
            } => Expr::pi(binder, normalize(env, &domain), normalize(env, &codomain)),
            Expr::Sigma {
                binder,
                fst_ty,
                snd_ty,
            } => Expr::sigma(binder, normalize(env, &fst_ty), normalize(env, &snd_ty)),
            Expr::Pair(a, b) => Expr::pair(normalize(env, &a), normalize(env, &b)),
            Expr::Fst(e) => Expr::Fst(normalize(env, &e).into()),
            Expr::Snd(e) => Expr::Snd(normalize(env, &e).into()),
            Expr::Sum(a, b) => Expr::sum(normalize(env, &a), normalize(env, &b)),
            Expr::Inl(e) => Expr::Inl(normalize(env, &e).into()),
            Expr::Inr(e) => Expr::Inr(normalize(env, &e).into()),
            Expr::Case {
                scrut,
                left_binder,
                left,
                right_binder,
                right,
            } => Expr::Case {
                scrut: normalize(env, &scrut).into(),
                left_binder,
                left: normalize(env, &left).into(),
                right_binder,
                right: normalize(env, &right).into(),
            },
            Expr::Path { ty, lhs, rhs } => Expr::path(
                normalize(env, &ty),
                normalize(env, &lhs),
                normalize(env, &rhs),
            ),
            Expr::Refl(e) => Expr::refl(normalize(env, &e)),
            Expr::Transport { motive, path, body } => Expr::transport(
                normalize(env, &motive),
                normalize(env, &path),
                normalize(env, &body),
            ),
        }
    })
}

/// One head reduction step, or `None` if the head is already stuck.
fn step_head(env: &Environment, expr: &Expr) -> Option<Expr> {
    match expr {
        Expr::Const(name) => {
            let decl = env.get_decl(name)?;
            if decl.kind == DeclKind::Definition {
                decl.value.clone()
            } else {
                None
            }
        }
        Expr::App(f, a) => {
            let f_whnf = whnf(env, f);
            if let Expr::Lam { binder, body, .. } = &f_whnf {
                return Some(body.subst(binder, a));
            }
            if !f_whnf.alpha_eq(f) {
                return Some(Expr::app(f_whnf, (**a).clone()));
            }
            None
        }
        Expr::Fst(e) => {
            let e_whnf = whnf(env, e);
            if let Expr::Pair(a, _) = &e_whnf {
                return Some((**a).clone());
            }
            if !e_whnf.alpha_eq(e) {
                return Some(Expr::Fst(e_whnf.into()));
            }
            None
        }
        Expr::Snd(e) => {
            let e_whnf = whnf(env, e);
            if let Expr::Pair(_, b) = &e_whnf {
                return Some((**b).clone());
            }
            if !e_whnf.alpha_eq(e) {
                return Some(Expr::Snd(e_whnf.into()));
            }
            None
        }
        Expr::Case {
            scrut,
            left_binder,
            left,
            right_binder,
            right,
        } => {
            let scrut_whnf = whnf(env, scrut);
            match &scrut_whnf {
                Expr::Inl(v) => return Some(left.subst(left_binder, v)),
                Expr::Inr(v) => return Some(right.subst(right_binder, v)),
                _ => {}
            }
            if !scrut_whnf.alpha_eq(scrut) {
                return Some(Expr::Case {
                    scrut: scrut_whnf.into(),
                    left_binder: left_binder.clone(),
                    left: left.clone(),
                    right_binder: right_binder.clone(),
                    right: right.clone(),
                });
            }
            None
        }
        Expr::Transport { motive, path, body } => {
            let path_whnf = whnf(env, path);
            if matches!(path_whnf, Expr::Refl(_)) {
                return Some((**body).clone());
            }
            if !path_whnf.alpha_eq(path) {
                return Some(Expr::transport(
                    (**motive).clone(),
                    path_whnf,
                    (**body).clone(),
                ));
            }
            None
        }
        _ => None,
    }
}
