//! Goal-directed proof construction.
//!
//! A [`ProofState`] tracks the open goals of an in-progress proof together
//! with the partial proof term. Each open goal owns a placeholder variable
//! (`?g1`, `?g2`, ...) inside that term; discharging a goal substitutes the
//! tactic's witness for the placeholder. When the last goal closes, the
//! fully composed term is checked against the original statement by the
//! kernel — a proof is never reported complete on the tactics' say-so
//! alone.
//!
//! Tactics are all-or-nothing: [`tactic::apply_tactic`] works on a copy of
//! the state and commits only on success, so a failed tactic leaves the
//! proof exactly as it was.

use euclid_kernel::{Context, Environment, Expr, Name, Type, TypeChecker, TypeError};
use serde::{Deserialize, Serialize};

pub mod tactic;

pub use tactic::{apply_tactic, list_tactics, Tactic, TacticError, TacticInfo};

/// Identifier of an open goal; also the index of its placeholder
/// variable in the partial proof term.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GoalId(pub u64);

impl GoalId {
    /// The placeholder variable standing for this goal in the proof term.
    pub fn placeholder(self) -> Name {
        Name::meta(self.0)
    }
}

impl std::fmt::Display for GoalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "?g{}", self.0)
    }
}

/// A single open proof obligation: a target type under hypotheses.
#[derive(Clone, Debug)]
pub struct Goal {
    pub id: GoalId,
    pub target: Type,
    pub hypotheses: Context,
}

/// The state of one in-progress proof.
#[derive(Clone, Debug)]
pub struct ProofState {
    statement: Type,
    goals: Vec<Goal>,
    proof: Expr,
    next_goal: u64,
    complete: bool,
}

impl ProofState {
    /// Begin a proof of `statement`. Free variables of the statement are
    /// read as ambient propositions: each becomes a hypothesis of type
    /// `Type`, available to every goal.
    pub fn new(statement: Type) -> Self {
        let mut ambient = Context::new();
        let mut free: Vec<Name> = statement.expr().free_vars().into_iter().collect();
        free.sort();
        for name in free {
            ambient.push(name, Type::new(Expr::type_()));
        }
        let root = GoalId(1);
        ProofState {
            goals: vec![Goal {
                id: root,
                target: statement.clone(),
                hypotheses: ambient,
            }],
            statement,
            proof: Expr::var(root.placeholder()),
            next_goal: 2,
            complete: false,
        }
    }

    /// Rebuild a state from persisted parts. The caller is responsible for
    /// the parts being mutually consistent; [`ProofState::verify`] is the
    /// way to find out.
    pub fn from_parts(
        statement: Type,
        goals: Vec<Goal>,
        proof: Expr,
        complete: bool,
    ) -> Self {
        let next_goal = goals.iter().map(|g| g.id.0 + 1).max().unwrap_or(0);
        ProofState {
            statement,
            goals,
            proof,
            next_goal,
            complete,
        }
    }

    /// The statement being proved.
    pub fn statement(&self) -> &Type {
        &self.statement
    }

    /// All open goals, in worklist order.
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// The head of the worklist, the goal tactics operate on by default.
    pub fn current_goal(&self) -> Option<&Goal> {
        self.goals.first()
    }

    /// The partial (or, once complete, final) proof term.
    pub fn proof(&self) -> &Expr {
        &self.proof
    }

    /// Whether the proof has been composed and kernel-verified.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Mint a fresh goal id.
    pub fn fresh_goal_id(&mut self) -> GoalId {
        let id = GoalId(self.next_goal);
        self.next_goal += 1;
        id
    }

    /// Look up an open goal.
    pub fn goal(&self, id: GoalId) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    /// Mutable access to an open goal's slot (used by `unfold`, which
    /// changes a goal's target without discharging it).
    pub(crate) fn goal_mut(&mut self, id: GoalId) -> Option<&mut Goal> {
        self.goals.iter_mut().find(|g| g.id == id)
    }

    /// Discharge `id` with `witness`, opening `new_goals` in its place.
    /// The witness may mention the placeholders of the new goals. Sibling
    /// goals whose targets mention this goal's placeholder (a dependency
    /// created by `apply` instantiating a binder with a goal) are updated
    /// in place.
    pub(crate) fn assign(&mut self, id: GoalId, witness: Expr, new_goals: Vec<Goal>) {
        let Some(pos) = self.goals.iter().position(|g| g.id == id) else {
            return;
        };
        self.goals.splice(pos..=pos, new_goals);
        let placeholder = id.placeholder();
        self.proof = self.proof.subst(&placeholder, &witness);
        for goal in &mut self.goals {
            if goal.target.expr().free_vars().contains(&placeholder) {
                goal.target = Type::new(goal.target.expr().subst(&placeholder, &witness));
            }
        }
    }

    /// If no goals remain, verify the composed proof term against the
    /// statement and mark the proof complete. The placeholder-free term
    /// goes through the kernel checker in the ambient context, so tactic
    /// bugs surface here rather than in a falsely "complete" proof.
    pub(crate) fn refresh_completion(
        &mut self,
        env: &Environment,
    ) -> Result<(), TypeError> {
        if !self.goals.is_empty() {
            return Ok(());
        }
        self.verify(env)?;
        self.complete = true;
        Ok(())
    }

    /// Check the proof term against the statement in the ambient context.
    pub fn verify(&self, env: &Environment) -> Result<(), TypeError> {
        let mut ambient = Context::new();
        let mut free: Vec<Name> = self.statement.expr().free_vars().into_iter().collect();
        free.sort();
        for name in free {
            ambient.push(name, Type::new(Expr::type_()));
        }
        TypeChecker::new(env).check(&ambient, &self.proof, &self.statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_has_root_goal() {
        let state = ProofState::new(Type::new(Expr::arrow(Expr::var("P"), Expr::var("P"))));
        assert_eq!(state.goals().len(), 1);
        assert_eq!(state.current_goal().unwrap().id, GoalId(1));
        assert_eq!(state.proof(), &Expr::var(Name::meta(1)));
        assert!(!state.is_complete());
        // The free proposition is ambient.
        assert!(state
            .current_goal()
            .unwrap()
            .hypotheses
            .contains(&"P".into()));
    }

    #[test]
    fn test_assign_substitutes_placeholder() {
        let mut state =
            ProofState::new(Type::new(Expr::arrow(Expr::var("P"), Expr::var("P"))));
        let g1 = state.fresh_goal_id();
        let witness = Expr::lam("h", Expr::var("P"), Expr::var(g1.placeholder()));
        let hyps = {
            let mut ctx = state.current_goal().unwrap().hypotheses.clone();
            ctx.push("h".into(), Type::new(Expr::var("P")));
            ctx
        };
        state.assign(
            GoalId(1),
            witness,
            vec![Goal {
                id: g1,
                target: Type::new(Expr::var("P")),
                hypotheses: hyps,
            }],
        );
        assert_eq!(state.goals().len(), 1);
        assert_eq!(state.current_goal().unwrap().id, g1);
        assert_eq!(
            state.proof(),
            &Expr::lam("h", Expr::var("P"), Expr::var(g1.placeholder()))
        );
    }

    #[test]
    fn test_assign_splices_replacements_in_place() {
        let mut state =
            ProofState::new(Type::new(Expr::arrow(Expr::var("P"), Expr::var("P"))));
        let hyps = state.current_goal().unwrap().hypotheses.clone();
        let goal = |id: GoalId| Goal {
            id,
            target: Type::new(Expr::var("P")),
            hypotheses: hyps.clone(),
        };

        let a = state.fresh_goal_id();
        let b = state.fresh_goal_id();
        let c = state.fresh_goal_id();
        state.assign(
            GoalId(1),
            Expr::var(a.placeholder()),
            vec![goal(a), goal(b), goal(c)],
        );

        // Discharging the middle goal leaves its replacements in its
        // slot; the siblings keep their relative order.
        let d = state.fresh_goal_id();
        let e = state.fresh_goal_id();
        state.assign(b, Expr::var(d.placeholder()), vec![goal(d), goal(e)]);
        let order: Vec<GoalId> = state.goals().iter().map(|g| g.id).collect();
        assert_eq!(order, [a, d, e, c]);
    }

    #[test]
    fn test_refresh_completion_runs_the_kernel() {
        let env = Environment::with_builtins();
        let mut state =
            ProofState::new(Type::new(Expr::arrow(Expr::var("P"), Expr::var("P"))));
        // A bogus witness must be rejected at completion time.
        state.assign(GoalId(1), Expr::const_("Nat.zero"), vec![]);
        assert!(state.refresh_completion(&env).is_err());
        assert!(!state.is_complete());

        let mut state =
            ProofState::new(Type::new(Expr::arrow(Expr::var("P"), Expr::var("P"))));
        state.assign(
            GoalId(1),
            Expr::lam("h", Expr::var("P"), Expr::var("h")),
            vec![],
        );
        state.refresh_completion(&env).unwrap();
        assert!(state.is_complete());
    }
}
