//! Equational tactics: `rewrite` and `unfold`.

use super::{fail, goal_at, TacticError};
use crate::{Goal, GoalId, ProofState};
use euclid_kernel::{whnf, DeclKind, Environment, Expr, Name, Type, TypeChecker, TypeError};

/// `rewrite [<-] eq`: given `eq : Path A a b`, replace every occurrence
/// of `a` in the goal by `b` (or `b` by `a` when reversed).
///
/// The witness is a transport along the equation: with motive
/// `C = λx. goal[a → x]`, the rewritten goal is `C b` and
/// `transport C (Path.symm A a b eq) ?new : C a` recovers the original.
/// In the reversed direction the equation is used as-is, no symm needed.
pub fn rewrite(
    env: &Environment,
    state: &mut ProofState,
    id: GoalId,
    equation: &Name,
    reversed: bool,
) -> Result<(), TacticError> {
    let goal = goal_at(state, id)?;

    let (eq_term, eq_ty) = if let Some(ty) = goal.hypotheses.lookup(equation) {
        (Expr::var(equation.clone()), ty.expr().clone())
    } else if let Some(decl) = env.get_decl(equation) {
        (Expr::const_(equation.clone()), decl.ty.clone())
    } else {
        return Err(fail("rewrite", format!("unknown equation `{equation}`")));
    };

    let eq_whnf = whnf(env, &eq_ty);
    let Expr::Path { ty, lhs, rhs } = &eq_whnf else {
        return Err(fail(
            "rewrite",
            format!("`{equation} : {eq_ty}` is not a path equation"),
        ));
    };

    let (from, to) = if reversed {
        ((**rhs).clone(), (**lhs).clone())
    } else {
        ((**lhs).clone(), (**rhs).clone())
    };

    let target = goal.target.expr();
    if !target.contains_subterm(&from) {
        return Err(fail(
            "rewrite",
            format!("`{from}` does not occur in goal `{target}`"),
        ));
    }

    let x = goal.hypotheses.fresh_name(&Name::new("x"));
    let motive_body = target.replace_subterm(&from, &Expr::var(x.clone()));
    let motive = Expr::lam(x.clone(), (**ty).clone(), motive_body.clone());
    let new_target = motive_body.subst(&x, &to);

    let path = if reversed {
        // eq : Path A a b carries C a to C b; the new goal is C a.
        eq_term
    } else {
        // Flip the equation so transport lands on C a (the original goal).
        Expr::app_many(
            Expr::const_("Path.symm"),
            [
                (**ty).clone(),
                (**lhs).clone(),
                (**rhs).clone(),
                eq_term,
            ],
        )
    };

    let sub = state.fresh_goal_id();
    let witness = Expr::transport(motive, path, Expr::var(sub.placeholder()));
    state.assign(
        goal.id,
        witness,
        vec![Goal {
            id: sub,
            target: Type::new(new_target),
            hypotheses: goal.hypotheses.clone(),
        }],
    );
    Ok(())
}

/// `unfold name`: replace a definition by its body throughout the goal.
/// The goal keeps its id and its place in the proof term: unfolding is
/// definitional, so no witness is owed for it.
pub fn unfold(
    env: &Environment,
    state: &mut ProofState,
    id: GoalId,
    name: &Name,
) -> Result<(), TacticError> {
    let goal = goal_at(state, id)?;

    let Some(decl) = env.get_decl(name) else {
        return Err(fail("unfold", format!("unknown name `{name}`")));
    };
    if decl.kind != DeclKind::Definition {
        return Err(fail("unfold", format!("`{name}` is not a definition")));
    }
    let Some(value) = &decl.value else {
        return Err(fail("unfold", format!("`{name}` has no body")));
    };

    let needle = Expr::const_(name.clone());
    let target = goal.target.expr();
    if !target.contains_subterm(&needle) {
        return Err(fail(
            "unfold",
            format!("`{name}` does not occur in goal `{target}`"),
        ));
    }

    let new_target = target.replace_subterm(&needle, value);
    // The unfolded goal must still be a well-formed type under the same
    // hypotheses; a failure here means the definition was ill-kinded.
    TypeChecker::new(env)
        .infer(&goal.hypotheses, &new_target)
        .map_err(|source| TacticError::Type {
            tactic: "unfold",
            source,
        })?;

    if let Some(slot) = state.goal_mut(goal.id) {
        slot.target = Type::new(new_target);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::tactic::{apply_tactic, Tactic, TacticError};
    use crate::ProofState;
    use euclid_kernel::{Environment, Type};
    use euclid_parser::parse_resolved;

    fn prove(env: &Environment, statement: &str) -> ProofState {
        ProofState::new(Type::new(parse_resolved(env, statement).unwrap()))
    }

    fn run(env: &Environment, state: &mut ProofState, script: &[&str]) {
        for line in script {
            let tactic = Tactic::parse(line).unwrap();
            apply_tactic(env, state, &tactic, None)
                .unwrap_or_else(|e| panic!("`{line}` failed: {e}"));
        }
    }

    #[test]
    fn test_rewrite_forward() {
        let env = Environment::with_builtins();
        // h : Path Nat a b turns `Path Nat a a` into `Path Nat b b`...
        let mut state = prove(
            &env,
            "forall (a : Nat). forall (b : Nat). Path Nat a b -> Path Nat a a -> Path Nat b b",
        );
        run(
            &env,
            &mut state,
            &["intro a", "intro b", "intro h", "intro p", "rewrite <- h"],
        );
        // ...reversed rewrites b back to a, closing with the hypothesis.
        assert_eq!(
            state.current_goal().unwrap().target.to_string(),
            "Path Nat a a"
        );
        run(&env, &mut state, &["exact p"]);
        assert!(state.is_complete());
    }

    #[test]
    fn test_rewrite_then_refl() {
        let env = Environment::with_builtins();
        let mut state = prove(
            &env,
            "forall (a : Nat). forall (b : Nat). Path Nat a b -> Path Nat a b",
        );
        run(
            &env,
            &mut state,
            &["intro a", "intro b", "intro h", "rewrite h"],
        );
        // a became b; the goal is now reflexive.
        assert_eq!(
            state.current_goal().unwrap().target.to_string(),
            "Path Nat b b"
        );
        run(&env, &mut state, &["refl"]);
        assert!(state.is_complete());
    }

    #[test]
    fn test_rewrite_requires_occurrence() {
        let env = Environment::with_builtins();
        let mut state = prove(
            &env,
            "forall (a : Nat). forall (b : Nat). Path Nat a b -> Path Nat Nat.zero Nat.zero",
        );
        run(&env, &mut state, &["intro a", "intro b", "intro h"]);
        // Reversed direction looks for `b`, which the goal does not mention.
        let err = apply_tactic(
            &env,
            &mut state,
            &Tactic::Rewrite {
                equation: "h".into(),
                reversed: true,
            },
            None,
        )
        .unwrap_err();
        assert!(matches!(err, TacticError::Failed { tactic: "rewrite", .. }));
    }

    #[test]
    fn test_unfold_definition() {
        let env = Environment::with_builtins();
        let mut state = prove(&env, "Path Nat (id Nat Nat.zero) Nat.zero");
        let goal_id = state.current_goal().unwrap().id;
        run(&env, &mut state, &["unfold id"]);
        // Same goal, new target.
        let goal = state.current_goal().unwrap();
        assert_eq!(goal.id, goal_id);
        assert_eq!(
            goal.target.to_string(),
            "Path Nat ((λ(A : Type). λ(x : A). x) Nat Nat.zero) Nat.zero"
        );
        run(&env, &mut state, &["refl"]);
        assert!(state.is_complete());
    }

    #[test]
    fn test_unfold_rejects_non_definitions() {
        let env = Environment::with_builtins();
        let mut state = prove(&env, "Path Nat Nat.zero Nat.zero");
        let err = apply_tactic(
            &env,
            &mut state,
            &Tactic::Unfold {
                name: "Nat.zero".into(),
            },
            None,
        )
        .unwrap_err();
        assert!(matches!(err, TacticError::Failed { tactic: "unfold", .. }));
    }
}
