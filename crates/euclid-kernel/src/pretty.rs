//! Pretty printer for expressions.
//!
//! Produces the surface syntax the parser accepts, so printed statements
//! and proof terms round-trip through persistence. Used for:
//! - type signature descriptions
//! - the persisted proof schema (statements are stored as text)
//! - CLI output

use crate::expr::{Expr, Literal};
use std::fmt;

/// Precedence levels, loosest to tightest.
const PREC_EXPR: u8 = 0; // binders, arrows, case
const PREC_SUM: u8 = 1; // A + B
const PREC_APP: u8 = 2; // f a, Path A a b, fst e
const PREC_ATOM: u8 = 3; // identifiers, literals, parenthesized

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_prec(self, f, PREC_EXPR)
    }
}

fn fmt_prec(e: &Expr, f: &mut fmt::Formatter<'_>, prec: u8) -> fmt::Result {
    let level = level_of(e);
    if level < prec {
        write!(f, "(")?;
    }
    fmt_open(e, f)?;
    if level < prec {
        write!(f, ")")?;
    }
    Ok(())
}

fn level_of(e: &Expr) -> u8 {
    match e {
        Expr::Var(_) | Expr::Const(_) | Expr::Lit(_) | Expr::Pair(_, _) => PREC_ATOM,
        Expr::Sort(0) => PREC_ATOM,
        Expr::Sort(_) => PREC_APP,
        Expr::App(_, _)
        | Expr::Fst(_)
        | Expr::Snd(_)
        | Expr::Inl(_)
        | Expr::Inr(_)
        | Expr::Refl(_)
        | Expr::Path { .. }
        | Expr::Transport { .. } => PREC_APP,
        Expr::Sum(_, _) => PREC_SUM,
        Expr::Lam { .. } | Expr::Pi { .. } | Expr::Sigma { .. } | Expr::Case { .. } => PREC_EXPR,
    }
}

fn fmt_open(e: &Expr, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match e {
        Expr::Var(n) | Expr::Const(n) => write!(f, "{n}"),
        Expr::Sort(0) => write!(f, "Type"),
        Expr::Sort(i) => write!(f, "Type {i}"),
        Expr::Lit(Literal::Nat(n)) => write!(f, "{n}"),
        Expr::Lit(Literal::Bool(b)) => write!(f, "{b}"),
        Expr::App(func, arg) => {
            fmt_prec(func, f, PREC_APP)?;
            write!(f, " ")?;
            fmt_prec(arg, f, PREC_ATOM)
        }
        Expr::Lam { binder, ty, body } => {
            write!(f, "λ({binder} : ")?;
            fmt_prec(ty, f, PREC_EXPR)?;
            write!(f, "). ")?;
            fmt_prec(body, f, PREC_EXPR)
        }
        Expr::Pi {
            binder,
            domain,
            codomain,
        } => {
            if codomain.free_vars().contains(binder) {
                write!(f, "∀({binder} : ")?;
                fmt_prec(domain, f, PREC_EXPR)?;
                write!(f, "). ")?;
                fmt_prec(codomain, f, PREC_EXPR)
            } else {
                // Non-dependent: arrow notation, right-associative.
                fmt_prec(domain, f, PREC_SUM)?;
                write!(f, " → ")?;
                fmt_prec(codomain, f, PREC_EXPR)
            }
        }
        Expr::Sigma {
            binder,
            fst_ty,
            snd_ty,
        } => {
            write!(f, "Σ({binder} : ")?;
            fmt_prec(fst_ty, f, PREC_EXPR)?;
            write!(f, "). ")?;
            fmt_prec(snd_ty, f, PREC_EXPR)
        }
        Expr::Pair(a, b) => {
            write!(f, "(")?;
            fmt_prec(a, f, PREC_EXPR)?;
            write!(f, ", ")?;
            fmt_prec(b, f, PREC_EXPR)?;
            write!(f, ")")
        }
        Expr::Fst(e) => {
            write!(f, "fst ")?;
            fmt_prec(e, f, PREC_ATOM)
        }
        Expr::Snd(e) => {
            write!(f, "snd ")?;
            fmt_prec(e, f, PREC_ATOM)
        }
        Expr::Sum(a, b) => {
            fmt_prec(a, f, PREC_APP)?;
            write!(f, " + ")?;
            fmt_prec(b, f, PREC_SUM)
        }
        Expr::Inl(e) => {
            write!(f, "inl ")?;
            fmt_prec(e, f, PREC_ATOM)
        }
        Expr::Inr(e) => {
            write!(f, "inr ")?;
            fmt_prec(e, f, PREC_ATOM)
        }
        Expr::Case {
            scrut,
            left_binder,
            left,
            right_binder,
            right,
        } => {
            write!(f, "case ")?;
            fmt_prec(scrut, f, PREC_SUM)?;
            write!(f, " of inl {left_binder} => ")?;
            fmt_prec(left, f, PREC_SUM)?;
            write!(f, " | inr {right_binder} => ")?;
            fmt_prec(right, f, PREC_EXPR)
        }
        Expr::Path { ty, lhs, rhs } => {
            write!(f, "Path ")?;
            fmt_prec(ty, f, PREC_ATOM)?;
            write!(f, " ")?;
            fmt_prec(lhs, f, PREC_ATOM)?;
            write!(f, " ")?;
            fmt_prec(rhs, f, PREC_ATOM)
        }
        Expr::Refl(e) => {
            write!(f, "refl ")?;
            fmt_prec(e, f, PREC_ATOM)
        }
        Expr::Transport { motive, path, body } => {
            write!(f, "transport ")?;
            fmt_prec(motive, f, PREC_ATOM)?;
            write!(f, " ")?;
            fmt_prec(path, f, PREC_ATOM)?;
            write!(f, " ")?;
            fmt_prec(body, f, PREC_ATOM)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_and_forall() {
        let arrow = Expr::arrow(Expr::const_("Nat"), Expr::const_("Nat"));
        assert_eq!(arrow.to_string(), "Nat → Nat");

        let dep = Expr::pi(
            "n",
            Expr::const_("Nat"),
            Expr::path(Expr::const_("Nat"), Expr::var("n"), Expr::var("n")),
        );
        assert_eq!(dep.to_string(), "∀(n : Nat). Path Nat n n");
    }

    #[test]
    fn test_arrow_right_associativity() {
        let e = Expr::arrow(
            Expr::var("P"),
            Expr::arrow(Expr::var("Q"), Expr::var("R")),
        );
        assert_eq!(e.to_string(), "P → Q → R");

        let l = Expr::arrow(
            Expr::arrow(Expr::var("P"), Expr::var("Q")),
            Expr::var("R"),
        );
        assert_eq!(l.to_string(), "(P → Q) → R");
    }

    #[test]
    fn test_lambda_and_application() {
        let lam = Expr::lam("x", Expr::const_("Nat"), Expr::var("x"));
        assert_eq!(lam.to_string(), "λ(x : Nat). x");

        let app = Expr::app(Expr::var("f"), Expr::app(Expr::var("g"), Expr::var("x")));
        assert_eq!(app.to_string(), "f (g x)");
    }

    #[test]
    fn test_sum_and_case() {
        let sum = Expr::sum(Expr::var("P"), Expr::var("Q"));
        assert_eq!(sum.to_string(), "P + Q");

        let case = Expr::Case {
            scrut: Expr::var("s").into(),
            left_binder: "a".into(),
            left: Expr::var("a").into(),
            right_binder: "b".into(),
            right: Expr::var("b").into(),
        };
        assert_eq!(case.to_string(), "case s of inl a => a | inr b => b");
    }

    #[test]
    fn test_universe_levels() {
        assert_eq!(Expr::sort(0).to_string(), "Type");
        assert_eq!(Expr::sort(2).to_string(), "Type 2");
    }
}
