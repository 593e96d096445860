//! `auto`: bounded depth-first proof search.
//!
//! The search works one goal at a time: it tries closing the targeted
//! goal by reflexivity, closing it with a hypothesis, introducing a
//! binder, and applying each hypothesis backward, then recurses into
//! whatever subgoals the move spawned. Search succeeds only if the
//! targeted goal is fully discharged within the depth bound; sibling
//! goals are left alone.

use super::{apply, fail, intro, refl, TacticError};
use crate::{GoalId, ProofState};
use euclid_kernel::{Environment, Expr, Name, TypeChecker};
use tracing::trace;

pub(crate) const DEFAULT_DEPTH: u32 = 5;

pub fn auto(
    env: &Environment,
    state: &mut ProofState,
    id: GoalId,
    depth: u32,
) -> Result<(), TacticError> {
    if state.goal(id).is_none() {
        return Err(TacticError::NoGoals);
    }
    if solve(env, state, id, depth) {
        Ok(())
    } else {
        Err(fail(
            "auto",
            format!("no proof found within depth {depth}"),
        ))
    }
}

fn solve(env: &Environment, state: &mut ProofState, id: GoalId, depth: u32) -> bool {
    let Some(goal) = state.goal(id).cloned() else {
        // Discharged along the way by a sibling's witness.
        return true;
    };
    trace!(goal = %goal.target, depth, "auto search");

    // Reflexivity closes outright.
    let mut next = state.clone();
    if refl(env, &mut next, id).is_ok() {
        *state = next;
        return true;
    }

    // A hypothesis that already proves the goal.
    let tc = TypeChecker::new(env);
    let hyps: Vec<Name> = goal.hypotheses.iter().map(|(n, _)| n.clone()).collect();
    for name in &hyps {
        let candidate = Expr::var(name.clone());
        if tc.check(&goal.hypotheses, &candidate, &goal.target).is_ok() {
            state.assign(goal.id, candidate, vec![]);
            return true;
        }
    }

    // The closing moves above are always allowed; only goal-expanding
    // moves consume depth.
    if depth == 0 {
        return false;
    }

    let before: Vec<GoalId> = state.goals().iter().map(|g| g.id).collect();

    // Introduce and recurse into the replacement goal.
    let mut next = state.clone();
    if intro(env, &mut next, id, None).is_ok()
        && close_spawned(env, &mut next, &before, depth - 1)
    {
        *state = next;
        return true;
    }

    // Backward chaining through each hypothesis.
    for name in &hyps {
        let mut next = state.clone();
        if apply(env, &mut next, id, name, &[]).is_ok()
            && close_spawned(env, &mut next, &before, depth - 1)
        {
            *state = next;
            return true;
        }
    }

    false
}

/// Solve every goal the last move spawned, i.e. every open goal whose id
/// was not in the worklist before the move.
fn close_spawned(
    env: &Environment,
    state: &mut ProofState,
    before: &[GoalId],
    depth: u32,
) -> bool {
    let spawned: Vec<GoalId> = state
        .goals()
        .iter()
        .map(|g| g.id)
        .filter(|id| !before.contains(id))
        .collect();
    spawned.into_iter().all(|id| solve(env, state, id, depth))
}
