//! Structural tactics: `induction` and `destruct`.

use super::{fail, goal_at, TacticError};
use crate::{Goal, GoalId, ProofState};
use euclid_kernel::{whnf, Environment, Expr, Name, Type};

/// `induction var`: case-analyse a hypothesis of inductive type via the
/// type's generated eliminator. One goal opens per constructor, with the
/// constructor's fields already bound in its hypotheses and the target
/// instantiated at the constructed value.
///
/// The witness is the fully applied eliminator, each branch a lambda
/// over its fields: `I.cases (λ(x : I). goal[var := x]) (λfields. ?g).. var`.
pub fn induction(
    env: &Environment,
    state: &mut ProofState,
    id: GoalId,
    var: &Name,
) -> Result<(), TacticError> {
    let goal = goal_at(state, id)?;

    let Some(var_ty) = goal.hypotheses.lookup(var) else {
        return Err(fail("induction", format!("unknown hypothesis `{var}`")));
    };
    let ty_whnf = whnf(env, var_ty.expr());
    let Expr::Const(ind_name) = &ty_whnf else {
        return Err(fail(
            "induction",
            format!("`{var} : {var_ty}` is not of inductive type"),
        ));
    };
    let Some(ind) = env.get_inductive(ind_name) else {
        return Err(fail(
            "induction",
            format!("`{ind_name}` is not an inductive type"),
        ));
    };

    let target = goal.target.expr();
    let x = goal.hypotheses.fresh_name(&Name::new("x"));
    let motive = Expr::lam(
        x.clone(),
        ty_whnf.clone(),
        target.subst(var, &Expr::var(x)),
    );

    let mut args = vec![motive];
    let mut new_goals = Vec::with_capacity(ind.constructors.len());
    for ctor in &ind.constructors {
        // Freshen field binders against the hypotheses and bind them in
        // the branch goal's context. Later field types may mention
        // earlier fields, so renames are carried forward.
        let mut hypotheses = goal.hypotheses.clone();
        let mut fields: Vec<(Name, Expr)> = Vec::with_capacity(ctor.fields.len());
        for (idx, (field, field_ty)) in ctor.fields.iter().enumerate() {
            let mut ty = field_ty.clone();
            for ((orig, _), (fresh, _)) in ctor.fields[..idx].iter().zip(fields.iter()) {
                ty = ty.subst(orig, &Expr::var(fresh.clone()));
            }
            let fresh = hypotheses.fresh_name(field);
            hypotheses.push(fresh.clone(), Type::new(ty.clone()));
            fields.push((fresh, ty));
        }
        let applied = Expr::app_many(
            Expr::const_(ctor.name.clone()),
            fields.iter().map(|(f, _)| Expr::var(f.clone())),
        );
        let branch_target = target.subst(var, &applied);

        let sub = state.fresh_goal_id();
        let mut branch = Expr::var(sub.placeholder());
        for (field, field_ty) in fields.into_iter().rev() {
            branch = Expr::lam(field, field_ty, branch);
        }
        args.push(branch);
        new_goals.push(Goal {
            id: sub,
            target: Type::new(branch_target),
            hypotheses,
        });
    }
    args.push(Expr::var(var.clone()));

    let witness = Expr::app_many(Expr::const_(ind.cases_name()), args);
    state.assign(goal.id, witness, new_goals);
    Ok(())
}

/// `destruct hyp`: split a hypothesis.
///
/// - `hyp : A + B` opens two goals, one with a fresh hypothesis of type
///   `A`, one of type `B`; the witness is a `case` on `hyp`.
/// - `hyp : Σ(x : A). B` opens one goal with fresh hypotheses for both
///   components; the witness applies a two-argument lambda to
///   `fst hyp` and `snd hyp`.
pub fn destruct(
    env: &Environment,
    state: &mut ProofState,
    id: GoalId,
    hyp: &Name,
) -> Result<(), TacticError> {
    let goal = goal_at(state, id)?;

    let Some(hyp_ty) = goal.hypotheses.lookup(hyp) else {
        return Err(fail("destruct", format!("unknown hypothesis `{hyp}`")));
    };
    match whnf(env, hyp_ty.expr()) {
        Expr::Sum(left_ty, right_ty) => {
            let l = goal.hypotheses.fresh_name(hyp);
            let mut l_hyps = goal.hypotheses.clone();
            l_hyps.push(l.clone(), Type::new((*left_ty).clone()));

            let r = goal.hypotheses.fresh_name(hyp);
            let mut r_hyps = goal.hypotheses.clone();
            r_hyps.push(r.clone(), Type::new((*right_ty).clone()));

            let left_goal = state.fresh_goal_id();
            let right_goal = state.fresh_goal_id();
            let witness = Expr::Case {
                scrut: Expr::var(hyp.clone()).into(),
                left_binder: l,
                left: Expr::var(left_goal.placeholder()).into(),
                right_binder: r,
                right: Expr::var(right_goal.placeholder()).into(),
            };
            state.assign(
                goal.id,
                witness,
                vec![
                    Goal {
                        id: left_goal,
                        target: goal.target.clone(),
                        hypotheses: l_hyps,
                    },
                    Goal {
                        id: right_goal,
                        target: goal.target.clone(),
                        hypotheses: r_hyps,
                    },
                ],
            );
            Ok(())
        }
        Expr::Sigma {
            binder,
            fst_ty,
            snd_ty,
        } => {
            let a = goal.hypotheses.fresh_name(&binder);
            let snd_at_a = snd_ty.subst(&binder, &Expr::var(a.clone()));
            let mut hyps = goal.hypotheses.clone();
            hyps.push(a.clone(), Type::new((*fst_ty).clone()));
            let b = hyps.fresh_name(hyp);
            hyps.push(b.clone(), Type::new(snd_at_a.clone()));

            let sub = state.fresh_goal_id();
            let inner = Expr::lam(
                a.clone(),
                (*fst_ty).clone(),
                Expr::lam(b, snd_at_a, Expr::var(sub.placeholder())),
            );
            let witness = Expr::app_many(
                inner,
                [
                    Expr::Fst(Expr::var(hyp.clone()).into()),
                    Expr::Snd(Expr::var(hyp.clone()).into()),
                ],
            );
            state.assign(
                goal.id,
                witness,
                vec![Goal {
                    id: sub,
                    target: goal.target.clone(),
                    hypotheses: hyps,
                }],
            );
            Ok(())
        }
        other => Err(fail(
            "destruct",
            format!("`{hyp} : {other}` is neither a sum nor a pair"),
        )),
    }
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
    fn test_induction_on_nat_opens_constructor_goals() {
        let env = Environment::with_builtins();
        let mut state = prove(&env, "forall (n : Nat). Path Nat n n");
        run(&env, &mut state, &["intro n", "induction n"]);

        let targets: Vec<String> = state
            .goals()
            .iter()
            .map(|g| g.target.to_string())
            .collect();
        assert_eq!(
            targets,
            [
                "Path Nat Nat.zero Nat.zero",
                "Path Nat (Nat.succ n') (Nat.succ n')"
            ]
        );
        // The successor branch binds its field in the context rather
        // than quantifying the target over it.
        assert!(state.goals()[1].hypotheses.lookup(&"n'".into()).is_some());

        run(&env, &mut state, &["refl", "refl"]);
        assert!(state.is_complete());
    }

    #[test]
    fn test_induction_requires_inductive_hypothesis() {
        let env = Environment::with_builtins();
        let mut state = prove(&env, "P -> P");
        run(&env, &mut state, &["intro h"]);
        let err = apply_tactic(
            &env,
            &mut state,
            &Tactic::Induction { var: "h".into() },
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TacticError::Failed {
                tactic: "induction",
                ..
            }
        ));
    }

    #[test]
    fn test_destruct_sum_commutativity() {
        let env = Environment::with_builtins();
        let mut state = prove(&env, "P + Q -> Q + P");
        run(&env, &mut state, &["intro s", "destruct s"]);
        assert_eq!(state.goals().len(), 2);

        // Left case holds a proof of P, right case a proof of Q.
        run(
            &env,
            &mut state,
            &["exact inr s'", "exact inl s'"],
        );
        assert!(state.is_complete());
    }

    #[test]
    fn test_destruct_pair_projects_components() {
        let env = Environment::with_builtins();
        let mut state = prove(&env, "(Sigma (x : P). Q) -> P");
        run(&env, &mut state, &["intro p", "destruct p", "exact x"]);
        assert!(state.is_complete());
    }

    #[test]
    fn test_destruct_rejects_other_shapes() {
        let env = Environment::with_builtins();
        let mut state = prove(&env, "Nat -> Nat");
        run(&env, &mut state, &["intro n"]);
        let err = apply_tactic(
            &env,
            &mut state,
            &Tactic::Destruct { hyp: "n".into() },
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TacticError::Failed {
                tactic: "destruct",
                ..
            }
        ));
    }
}
