//! The tactic catalog and dispatcher.
//!
//! Every tactic has the same shape: inspect the targeted goal, build a
//! witness term (usually containing fresh placeholders), and call
//! [`ProofState::assign`]. [`apply_tactic`] wraps the dispatch in a
//! clone-and-commit so failures cannot corrupt the state.

use crate::{Goal, GoalId, ProofState};
use euclid_kernel::{whnf, Environment, Expr, Name, Type, TypeChecker, TypeError};
use euclid_parser::{parse_resolved, ParseError};
use hashbrown::HashMap;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

mod auto;
mod cases;
mod rewrite;

pub use auto::auto;
pub use cases::{destruct, induction};
pub use rewrite::{rewrite, unfold};

/// Why a tactic did not apply. The proof state is untouched whenever one
/// of these is returned.
#[derive(Debug, Error)]
pub enum TacticError {
    #[error("no open goals")]
    NoGoals,
    #[error("unknown tactic `{0}`")]
    UnknownTactic(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("{tactic}: {message}")]
    Failed {
        tactic: &'static str,
        message: String,
    },
    #[error("{tactic}: {source}")]
    Type {
        tactic: &'static str,
        #[source]
        source: TypeError,
    },
    #[error("invalid term argument: {0}")]
    Parse(#[from] ParseError),
    #[error("composed proof failed verification: {0}")]
    FinalCheck(#[source] TypeError),
}

fn fail(tactic: &'static str, message: impl Into<String>) -> TacticError {
    TacticError::Failed {
        tactic,
        message: message.into(),
    }
}

/// A parsed tactic invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tactic {
    /// `intro [name]`
    Intro { name: Option<Name> },
    /// `exact <term>`
    Exact { term: String },
    /// `apply <theorem-or-hypothesis> [args]`
    Apply { name: Name, args: Vec<String> },
    /// `refl`
    Refl,
    /// `rewrite [<-] <equation>`
    Rewrite { equation: Name, reversed: bool },
    /// `induction <var>`
    Induction { var: Name },
    /// `destruct <hypothesis>`
    Destruct { hyp: Name },
    /// `unfold <definition>`
    Unfold { name: Name },
    /// `auto [depth]`
    Auto { depth: Option<u32> },
}

impl Tactic {
    /// Parse a command line such as `apply Path.trans` or `rewrite <- h`.
    pub fn parse(input: &str) -> Result<Tactic, TacticError> {
        let mut words = input.split_whitespace();
        let head = words.next().ok_or(TacticError::UnknownTactic(String::new()))?;
        let rest: Vec<&str> = words.collect();
        match head {
            "intro" => match rest.as_slice() {
                [] => Ok(Tactic::Intro { name: None }),
                [name] => Ok(Tactic::Intro {
                    name: Some(Name::new(*name)),
                }),
                _ => Err(TacticError::Usage("intro [name]")),
            },
            "exact" => {
                if rest.is_empty() {
                    return Err(TacticError::Usage("exact <term>"));
                }
                Ok(Tactic::Exact {
                    term: rest.join(" "),
                })
            }
            "apply" => match rest.as_slice() {
                [name, args @ ..] => Ok(Tactic::Apply {
                    name: Name::new(*name),
                    args: args.iter().map(|a| (*a).to_owned()).collect(),
                }),
                [] => Err(TacticError::Usage("apply <theorem> [args]")),
            },
            "refl" => match rest.as_slice() {
                [] => Ok(Tactic::Refl),
                _ => Err(TacticError::Usage("refl")),
            },
            "rewrite" => match rest.as_slice() {
                [eq] => Ok(Tactic::Rewrite {
                    equation: Name::new(*eq),
                    reversed: false,
                }),
                ["<-", eq] | ["←", eq] => Ok(Tactic::Rewrite {
                    equation: Name::new(*eq),
                    reversed: true,
                }),
                _ => Err(TacticError::Usage("rewrite [<-] <equation>")),
            },
            "induction" => match rest.as_slice() {
                [var] => Ok(Tactic::Induction {
                    var: Name::new(*var),
                }),
                _ => Err(TacticError::Usage("induction <var>")),
            },
            "destruct" => match rest.as_slice() {
                [hyp] => Ok(Tactic::Destruct {
                    hyp: Name::new(*hyp),
                }),
                _ => Err(TacticError::Usage("destruct <hypothesis>")),
            },
            "unfold" => match rest.as_slice() {
                [name] => Ok(Tactic::Unfold {
                    name: Name::new(*name),
                }),
                _ => Err(TacticError::Usage("unfold <definition>")),
            },
            "auto" => match rest.as_slice() {
                [] => Ok(Tactic::Auto { depth: None }),
                [d] => d
                    .parse::<u32>()
                    .map(|depth| Tactic::Auto { depth: Some(depth) })
                    .map_err(|_| TacticError::Usage("auto [depth]")),
                _ => Err(TacticError::Usage("auto [depth]")),
            },
            other => Err(TacticError::UnknownTactic(other.to_owned())),
        }
    }
}

/// One catalog entry for `list_tactics`.
#[derive(Clone, Copy, Debug, serde::Serialize)]
pub struct TacticInfo {
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
}

/// The tactic catalog, in the order tactics are usually reached for.
pub fn list_tactics() -> &'static [TacticInfo] {
    &[
        TacticInfo {
            name: "intro",
            usage: "intro [name]",
            summary: "move the antecedent of an implication (or the binder of a ∀) into the hypotheses",
        },
        TacticInfo {
            name: "exact",
            usage: "exact <term>",
            summary: "close the goal with an explicit proof term",
        },
        TacticInfo {
            name: "apply",
            usage: "apply <theorem> [args]",
            summary: "match the goal against a theorem's conclusion, opening goals for its premises",
        },
        TacticInfo {
            name: "refl",
            usage: "refl",
            summary: "close a path goal whose endpoints are definitionally equal",
        },
        TacticInfo {
            name: "rewrite",
            usage: "rewrite [<-] <equation>",
            summary: "replace one side of a path equation by the other throughout the goal",
        },
        TacticInfo {
            name: "induction",
            usage: "induction <var>",
            summary: "case-analyse an inductively typed hypothesis, one goal per constructor",
        },
        TacticInfo {
            name: "destruct",
            usage: "destruct <hypothesis>",
            summary: "split a sum hypothesis into cases, or a pair into its components",
        },
        TacticInfo {
            name: "unfold",
            usage: "unfold <definition>",
            summary: "replace a definition by its body in the goal",
        },
        TacticInfo {
            name: "auto",
            usage: "auto [depth]",
            summary: "bounded search over intro, refl, hypotheses and their applications",
        },
    ]
}

/// Apply a tactic to the head goal, or to the goal named by `goal`.
/// Replacement goals take the discharged goal's place in the worklist;
/// goals the tactic does not touch keep their relative order.
/// All-or-nothing: on error the state is exactly what it was before the
/// call, including across the final kernel verification of a
/// just-completed proof.
pub fn apply_tactic(
    env: &Environment,
    state: &mut ProofState,
    tactic: &Tactic,
    goal: Option<GoalId>,
) -> Result<(), TacticError> {
    let id = goal
        .or_else(|| state.current_goal().map(|g| g.id))
        .ok_or(TacticError::NoGoals)?;
    let mut next = state.clone();
    dispatch(env, &mut next, id, tactic)?;
    next.refresh_completion(env).map_err(TacticError::FinalCheck)?;
    debug!(goals = next.goals().len(), complete = next.is_complete(), "tactic applied");
    *state = next;
    Ok(())
}

fn dispatch(
    env: &Environment,
    state: &mut ProofState,
    id: GoalId,
    tactic: &Tactic,
) -> Result<(), TacticError> {
    match tactic {
        Tactic::Intro { name } => intro(env, state, id, name.clone()),
        Tactic::Exact { term } => exact(env, state, id, term),
        Tactic::Apply { name, args } => apply(env, state, id, name, args),
        Tactic::Refl => refl(env, state, id),
        Tactic::Rewrite { equation, reversed } => {
            rewrite(env, state, id, equation, *reversed)
        }
        Tactic::Induction { var } => induction(env, state, id, var),
        Tactic::Destruct { hyp } => destruct(env, state, id, hyp),
        Tactic::Unfold { name } => unfold(env, state, id, name),
        Tactic::Auto { depth } => {
            auto(env, state, id, depth.unwrap_or(auto::DEFAULT_DEPTH))
        }
    }
}

pub(crate) fn goal_at(state: &ProofState, id: GoalId) -> Result<Goal, TacticError> {
    state.goal(id).cloned().ok_or(TacticError::NoGoals)
}

/// `intro`: goal `∀(x : A). B` becomes `B[x := h]` under a new
/// hypothesis `h : A`. For a non-dependent goal `A → B` the hypothesis
/// name defaults to `h`; for a dependent one it defaults to the binder.
pub fn intro(
    env: &Environment,
    state: &mut ProofState,
    id: GoalId,
    name: Option<Name>,
) -> Result<(), TacticError> {
    let goal = goal_at(state, id)?;
    let target = whnf(env, goal.target.expr());
    let Expr::Pi {
        binder,
        domain,
        codomain,
    } = &target
    else {
        return Err(fail(
            "intro",
            format!("goal `{}` is not an implication or ∀", goal.target),
        ));
    };
    let dependent = codomain.free_vars().contains(binder);
    let base = name.unwrap_or_else(|| {
        if dependent {
            binder.clone()
        } else {
            Name::new("h")
        }
    });
    let hyp = goal.hypotheses.fresh_name(&base);

    let new_target = codomain.subst(binder, &Expr::var(hyp.clone()));
    let mut hypotheses = goal.hypotheses.clone();
    hypotheses.push(hyp.clone(), Type::new((**domain).clone()));

    let sub = state.fresh_goal_id();
    let witness = Expr::lam(
        hyp,
        (**domain).clone(),
        Expr::var(sub.placeholder()),
    );
    state.assign(
        goal.id,
        witness,
        vec![Goal {
            id: sub,
            target: Type::new(new_target),
            hypotheses,
        }],
    );
    Ok(())
}

/// `exact`: parse the term, check it against the goal, done.
pub fn exact(
    env: &Environment,
    state: &mut ProofState,
    id: GoalId,
    term: &str,
) -> Result<(), TacticError> {
    let goal = goal_at(state, id)?;
    let term = parse_resolved(env, term)?;
    TypeChecker::new(env)
        .check(&goal.hypotheses, &term, &goal.target)
        .map_err(|source| TacticError::Type {
            tactic: "exact",
            source,
        })?;
    state.assign(goal.id, term, vec![]);
    Ok(())
}

/// `refl`: close `Path A a b` when `a` and `b` are definitionally equal.
pub fn refl(
    env: &Environment,
    state: &mut ProofState,
    id: GoalId,
) -> Result<(), TacticError> {
    let goal = goal_at(state, id)?;
    let target = whnf(env, goal.target.expr());
    let Expr::Path { lhs, rhs, .. } = &target else {
        return Err(fail(
            "refl",
            format!("goal `{}` is not a path", goal.target),
        ));
    };
    if !TypeChecker::new(env).def_eq(lhs, rhs) {
        return Err(fail(
            "refl",
            format!("`{lhs}` and `{rhs}` are not definitionally equal"),
        ));
    }
    state.assign(goal.id, Expr::refl((**lhs).clone()), vec![]);
    Ok(())
}

/// `apply`: match the goal against the conclusion of a theorem (or a
/// hypothesis), instantiating the theorem's binders. Explicit arguments
/// fill the leading binders first; binders determined by the match
/// become arguments immediately; the rest become new goals, in binder
/// order.
pub fn apply(
    env: &Environment,
    state: &mut ProofState,
    id: GoalId,
    name: &Name,
    explicit: &[String],
) -> Result<(), TacticError> {
    let goal = goal_at(state, id)?;

    // A hypothesis shadows an environment declaration of the same name.
    let (mut head, mut thm_ty) = if let Some(ty) = goal.hypotheses.lookup(name) {
        (Expr::var(name.clone()), ty.expr().clone())
    } else if let Some(decl) = env.get_decl(name) {
        (Expr::const_(name.clone()), decl.ty.clone())
    } else {
        return Err(fail("apply", format!("unknown theorem `{name}`")));
    };

    let tc = TypeChecker::new(env);

    // Explicit arguments consume the leading binders.
    for text in explicit {
        let arg = parse_resolved(env, text)?;
        let whnf_ty = whnf(env, &thm_ty);
        let Expr::Pi {
            binder,
            domain,
            codomain,
        } = &whnf_ty
        else {
            return Err(fail(
                "apply",
                format!("`{name}` does not take an argument `{text}`"),
            ));
        };
        tc.check(&goal.hypotheses, &arg, &Type::new((**domain).clone()))
            .map_err(|source| TacticError::Type {
                tactic: "apply",
                source,
            })?;
        thm_ty = codomain.subst(binder, &arg);
        head = Expr::app(head, arg);
    }

    // Peel the remaining telescope, replacing each binder with a fresh
    // pattern variable, until the remainder matches the goal.
    let mut binders: Vec<(Name, Expr)> = Vec::new(); // (pattern var, domain)
    let mut metas: HashSet<Name> = HashSet::new();
    loop {
        let mut bindings: HashMap<Name, Expr> = HashMap::new();
        if match_pattern(&tc, &thm_ty, goal.target.expr(), &metas, &mut bindings) {
            // Arguments in binder order; unmatched binders become goals.
            let mut args = Vec::with_capacity(binders.len());
            let mut new_goals = Vec::new();
            for (pat, domain) in &binders {
                // Premise types may mention earlier binders.
                let mut domain = domain.clone();
                for (prev, arg) in binders.iter().map(|(p, _)| p).zip(args.iter()) {
                    domain = domain.subst(prev, arg);
                }
                if let Some(term) = bindings.get(pat) {
                    args.push(term.clone());
                } else {
                    let sub = state.fresh_goal_id();
                    new_goals.push(Goal {
                        id: sub,
                        target: Type::new(domain),
                        hypotheses: goal.hypotheses.clone(),
                    });
                    args.push(Expr::var(sub.placeholder()));
                }
            }
            let witness = Expr::app_many(head, args);
            state.assign(goal.id, witness, new_goals);
            return Ok(());
        }
        let whnf_ty = whnf(env, &thm_ty);
        let Expr::Pi {
            binder,
            domain,
            codomain,
        } = &whnf_ty
        else {
            return Err(fail(
                "apply",
                format!(
                    "conclusion of `{name}` does not match goal `{}`",
                    goal.target
                ),
            ));
        };
        let pat = Name::new(format!("?a{}", binders.len()));
        metas.insert(pat.clone());
        binders.push((pat.clone(), (**domain).clone()));
        thm_ty = codomain.subst(binder, &Expr::var(pat));
    }
}

/// First-order matching of `pattern` (containing `metas`) against
/// `target`. Meta occurrences bind greedily and must bind consistently;
/// meta-free mismatches fall back to definitional equality.
pub(crate) fn match_pattern(
    tc: &TypeChecker<'_>,
    pattern: &Expr,
    target: &Expr,
    metas: &HashSet<Name>,
    bindings: &mut HashMap<Name, Expr>,
) -> bool {
    if let Expr::Var(v) = pattern {
        if metas.contains(v) {
            return match bindings.get(v) {
                Some(prev) => prev.alpha_eq(target),
                None => {
                    bindings.insert(v.clone(), target.clone());
                    true
                }
            };
        }
    }
    let structural = match (pattern, target) {
        (Expr::Var(a), Expr::Var(b)) => a == b,
        (Expr::Const(a), Expr::Const(b)) => a == b,
        (Expr::Sort(a), Expr::Sort(b)) => a == b,
        (Expr::Lit(a), Expr::Lit(b)) => a == b,
        (Expr::App(f1, a1), Expr::App(f2, a2)) => {
            match_pattern(tc, f1, f2, metas, bindings)
                && match_pattern(tc, a1, a2, metas, bindings)
        }
        (Expr::Sum(a1, b1), Expr::Sum(a2, b2)) => {
            match_pattern(tc, a1, a2, metas, bindings)
                && match_pattern(tc, b1, b2, metas, bindings)
        }
        (
            Expr::Path {
                ty: t1,
                lhs: l1,
                rhs: r1,
            },
            Expr::Path {
                ty: t2,
                lhs: l2,
                rhs: r2,
            },
        ) => {
            match_pattern(tc, t1, t2, metas, bindings)
                && match_pattern(tc, l1, l2, metas, bindings)
                && match_pattern(tc, r1, r2, metas, bindings)
        }
        (
            Expr::Pi {
                binder: b1,
                domain: d1,
                codomain: c1,
            },
            Expr::Pi {
                binder: b2,
                domain: d2,
                codomain: c2,
            },
        ) => {
            // Binders are matched up to renaming; metas never bind to a
            // bound variable this way, which keeps bindings well-scoped.
            match_pattern(tc, d1, d2, metas, bindings) && {
                let c1 = c1.subst(b1, &Expr::var(b2.clone()));
                match_pattern(tc, &c1, c2, metas, bindings)
            }
        }
        _ => false,
    };
    if structural {
        return true;
    }
    // Meta-free corners may still agree definitionally (`MyNat` vs `Nat`).
    let has_meta = pattern.free_vars().iter().any(|v| metas.contains(v));
    !has_meta && tc.def_eq(pattern, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Environment {
        Environment::with_builtins()
    }

    fn prove(statement: &str) -> (Environment, ProofState) {
        let env = env();
        let stmt = parse_resolved(&env, statement).unwrap();
        (env, ProofState::new(Type::new(stmt)))
    }

    fn run(env: &Environment, state: &mut ProofState, script: &[&str]) {
        for line in script {
            let tactic = Tactic::parse(line).unwrap();
            apply_tactic(env, state, &tactic, None)
                .unwrap_or_else(|e| panic!("`{line}` failed: {e}"));
        }
    }

    #[test]
    fn test_parse_tactics() {
        assert_eq!(
            Tactic::parse("intro h").unwrap(),
            Tactic::Intro {
                name: Some("h".into())
            }
        );
        assert_eq!(Tactic::parse("refl").unwrap(), Tactic::Refl);
        assert_eq!(
            Tactic::parse("rewrite <- h").unwrap(),
            Tactic::Rewrite {
                equation: "h".into(),
                reversed: true
            }
        );
        assert_eq!(
            Tactic::parse("apply f x y").unwrap(),
            Tactic::Apply {
                name: "f".into(),
                args: vec!["x".to_owned(), "y".to_owned()]
            }
        );
        assert!(matches!(
            Tactic::parse("frobnicate"),
            Err(TacticError::UnknownTactic(_))
        ));
        assert!(matches!(
            Tactic::parse("apply"),
            Err(TacticError::Usage(_))
        ));
    }

    #[test]
    fn test_identity_proof() {
        // P → P by intro; exact.
        let (env, mut state) = prove("P -> P");
        run(&env, &mut state, &["intro h", "exact h"]);
        assert!(state.is_complete());
        assert_eq!(state.proof().to_string(), "λ(h : P). h");
    }

    #[test]
    fn test_modus_ponens_via_apply() {
        // (P → Q) → P → Q
        let (env, mut state) = prove("(P -> Q) -> P -> Q");
        run(
            &env,
            &mut state,
            &["intro f", "intro p", "apply f", "exact p"],
        );
        assert!(state.is_complete());
        assert_eq!(
            state.proof().to_string(),
            "λ(f : P → Q). λ(p : P). f p"
        );
    }

    #[test]
    fn test_refl_on_definitional_equality() {
        // id Nat Nat.zero normalizes to Nat.zero.
        let (env, mut state) = prove("Path Nat (id Nat Nat.zero) Nat.zero");
        run(&env, &mut state, &["refl"]);
        assert!(state.is_complete());
    }

    #[test]
    fn test_refl_rejects_distinct_endpoints() {
        let (env, mut state) = prove("forall (n : Nat). Path Nat n Nat.zero");
        run(&env, &mut state, &["intro n"]);
        let err = apply_tactic(&env, &mut state, &Tactic::Refl, None).unwrap_err();
        assert!(matches!(err, TacticError::Failed { tactic: "refl", .. }));
        // Atomicity: the goal is still open and unchanged.
        assert_eq!(state.goals().len(), 1);
    }

    #[test]
    fn test_apply_transitivity_opens_premise_goals() {
        let (env, mut state) =
            prove("forall (a : Nat). forall (b : Nat). forall (c : Nat). Path Nat a b -> Path Nat b c -> Path Nat a c");
        run(
            &env,
            &mut state,
            &["intro a", "intro b", "intro c", "intro p", "intro q"],
        );
        // Path.trans leaves its `b` binder and both path premises open;
        // the endpoint binders are fixed by matching `Path Nat a c`.
        apply_tactic(
            &env,
            &mut state,
            &Tactic::Apply {
                name: "Path.trans".into(),
                args: vec![],
            },
            None,
        )
        .unwrap();
        assert_eq!(state.goals().len(), 3);
        run(&env, &mut state, &["exact b", "exact p", "exact q"]);
        assert!(state.is_complete());
    }

    #[test]
    fn test_apply_with_explicit_arguments() {
        // `apply f p` supplies the premise directly, closing the goal.
        let (env, mut state) = prove("(P -> Q) -> P -> Q");
        run(&env, &mut state, &["intro f", "intro p", "apply f p"]);
        assert!(state.is_complete());
        assert_eq!(
            state.proof().to_string(),
            "λ(f : P → Q). λ(p : P). f p"
        );
    }

    #[test]
    fn test_apply_rejects_ill_typed_argument() {
        let (env, mut state) = prove("(P -> Q) -> P -> Q");
        run(&env, &mut state, &["intro f", "intro p"]);
        let err = apply_tactic(
            &env,
            &mut state,
            &Tactic::Apply {
                name: "f".into(),
                args: vec!["Nat.zero".to_owned()],
            },
            None,
        )
        .unwrap_err();
        assert!(matches!(err, TacticError::Type { tactic: "apply", .. }));
        assert_eq!(state.goals().len(), 1);
    }

    #[test]
    fn test_targeted_tactic_keeps_goal_order() {
        // Two open goals; working the second must not move the first.
        let (env, mut state) = prove("P + P -> P -> P");
        run(&env, &mut state, &["intro s", "destruct s"]);
        let first = state.goals()[0].id;
        let second = state.goals()[1].id;

        apply_tactic(
            &env,
            &mut state,
            &Tactic::Intro {
                name: Some("p".into()),
            },
            Some(second),
        )
        .unwrap();
        // The replacement goal takes the second slot; the untouched goal
        // keeps the head.
        assert_eq!(state.goals().len(), 2);
        assert_eq!(state.goals()[0].id, first);
        assert_ne!(state.goals()[1].id, second);

        run(&env, &mut state, &["intro q", "exact q"]);
        run(&env, &mut state, &["exact p"]);
        assert!(state.is_complete());
    }

    #[test]
    fn test_failed_tactic_leaves_state_untouched() {
        let (env, mut state) = prove("P -> Q");
        run(&env, &mut state, &["intro h"]);
        let before = state.proof().clone();
        let goals_before = state.goals().len();

        let err = apply_tactic(
            &env,
            &mut state,
            &Tactic::Exact {
                term: "h".to_owned(),
            },
            None,
        )
        .unwrap_err();
        assert!(matches!(err, TacticError::Type { tactic: "exact", .. }));
        assert_eq!(state.proof(), &before);
        assert_eq!(state.goals().len(), goals_before);
        assert!(!state.is_complete());
    }

    #[test]
    fn test_intro_freshens_hypothesis_names() {
        let (env, mut state) = prove("P -> P -> P");
        run(&env, &mut state, &["intro h", "intro h"]);
        let goal = state.current_goal().unwrap();
        assert!(goal.hypotheses.contains(&"h".into()));
        assert!(goal.hypotheses.contains(&"h'".into()));
        run(&env, &mut state, &["exact h'"]);
        assert!(state.is_complete());
    }

    #[test]
    fn test_intro_on_non_implication_fails() {
        let (env, mut state) = prove("Path Nat Nat.zero Nat.zero");
        let err = apply_tactic(
            &env,
            &mut state,
            &Tactic::Intro { name: None },
            None,
        )
        .unwrap_err();
        assert!(matches!(err, TacticError::Failed { tactic: "intro", .. }));
    }

    #[test]
    fn test_list_tactics_catalog() {
        let names: Vec<_> = list_tactics().iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            [
                "intro",
                "exact",
                "apply",
                "refl",
                "rewrite",
                "induction",
                "destruct",
                "unfold",
                "auto"
            ]
        );
    }
}
