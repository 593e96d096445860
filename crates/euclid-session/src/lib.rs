//! Proof sessions: the command surface over the kernel.
//!
//! A [`ProofSession`] owns the declaration environment and at most one
//! active [`ProofState`]. The lifecycle is `Idle` → `InProgress` (on
//! [`ProofSession::start_proof`]) → `Complete` (when the worklist empties
//! and the composed term verifies); starting a new proof or loading a file
//! discards the previous state. All views returned by session methods are
//! plain serializable values, so a transport layer can forward them
//! without touching kernel types.

use euclid_geo::{extract, GeometricConstruction, GeometricError};
use euclid_kernel::{
    reduce, whnf, Context, DeclKind, Environment, Expr, Name, Strategy, Type, TypeChecker,
    TypeError,
};
use euclid_parser::{parse_resolved, ParseError};
use euclid_tactic::{apply_tactic, GoalId, ProofState, Tactic, TacticError, TacticInfo};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};

pub mod persist;

pub use persist::{PersistenceError, SaveFormat};

/// Anything a session command can fail with.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no active proof")]
    NoActiveProof,
    #[error("no open goal with id {0}")]
    UnknownGoal(u64),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Tactic(#[from] TacticError),
    #[error(transparent)]
    Geometric(#[from] GeometricError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Lifecycle of the session's proof slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Idle,
    InProgress,
    Complete,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AssumptionView {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GoalView {
    pub id: u64,
    pub statement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<Vec<AssumptionView>>,
}

/// Snapshot of the proof state, the payload of most commands.
#[derive(Clone, Debug, Serialize)]
pub struct ProofStateView {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theorem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    pub goals: Vec<GoalView>,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_term: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CheckView {
    pub expression: String,
    pub inferred_type: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct NormalizeView {
    pub expression: String,
    pub normal_form: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct GeometricView {
    pub statement: String,
    pub proof_term: String,
    pub assumptions: Vec<String>,
    pub goal: String,
    /// Whether the result was installed into the active proof.
    pub installed: bool,
}

/// Filter for [`ProofSession::query_theorem`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum QueryFilter {
    #[default]
    All,
    Theorems,
    Definitions,
    Tactics,
}

impl std::str::FromStr for QueryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(QueryFilter::All),
            "theorems" => Ok(QueryFilter::Theorems),
            "definitions" => Ok(QueryFilter::Definitions),
            "tactics" => Ok(QueryFilter::Tactics),
            other => Err(format!("unknown filter `{other}`")),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct QueryItem {
    pub name: String,
    pub signature: String,
    pub kind: &'static str,
}

/// One interactive proof session.
pub struct ProofSession {
    env: Environment,
    state: Option<ProofState>,
    theorem_name: Option<String>,
    root: PathBuf,
}

impl ProofSession {
    /// A session over the builtin library, resolving relative proof
    /// filenames against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ProofSession {
            env: Environment::with_builtins(),
            state: None,
            theorem_name: None,
            root: root.into(),
        }
    }

    /// The session's declaration environment.
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Type-check an expression, optionally under named assumptions.
    /// Remaining free variables are treated as ambient propositions.
    #[instrument(skip(self, context))]
    pub fn check(
        &self,
        expression: &str,
        context: &[(String, String)],
    ) -> Result<CheckView, SessionError> {
        let expr = parse_resolved(&self.env, expression)?;
        let ctx = self.ambient_context(&expr, context)?;
        let ty = TypeChecker::new(&self.env).infer(&ctx, &expr)?;
        debug!(%expr, %ty, "checked");
        Ok(CheckView {
            expression: expr.to_string(),
            inferred_type: ty.to_string(),
        })
    }

    /// Start proving `goal`, discarding any previous proof.
    #[instrument(skip(self))]
    pub fn start_proof(
        &mut self,
        goal: &str,
        name: Option<&str>,
    ) -> Result<ProofStateView, SessionError> {
        let statement = parse_resolved(&self.env, goal)?;
        let ctx = self.ambient_context(&statement, &[])?;
        // The statement must itself be a type.
        let sort = TypeChecker::new(&self.env).infer(&ctx, &statement)?;
        if !whnf(&self.env, sort.expr()).is_sort() {
            return Err(SessionError::Type(TypeError::Mismatch {
                expected: "Type".to_owned(),
                found: sort.to_string(),
            }));
        }
        info!(statement = %statement, "proof started");
        self.state = Some(ProofState::new(Type::new(statement)));
        self.theorem_name = name.map(str::to_owned);
        Ok(self.get_proof_state(false))
    }

    /// Apply one tactic to the head goal, or to the goal named by
    /// `goal_id`; subgoals replace the targeted goal in place, so the
    /// rest of the worklist keeps its order. All-or-nothing: on error
    /// the state is unchanged.
    #[instrument(skip(self))]
    pub fn apply_tactic(
        &mut self,
        tactic: &str,
        goal_id: Option<u64>,
    ) -> Result<ProofStateView, SessionError> {
        let tactic = Tactic::parse(tactic)?;
        let state = self.state.as_mut().ok_or(SessionError::NoActiveProof)?;
        if let Some(id) = goal_id {
            if state.goal(GoalId(id)).is_none() {
                return Err(SessionError::UnknownGoal(id));
            }
        }
        apply_tactic(&self.env, state, &tactic, goal_id.map(GoalId))?;
        Ok(self.get_proof_state(false))
    }

    /// Pure read of the current state. `verbose` adds per-goal
    /// assumptions and the partial proof term.
    pub fn get_proof_state(&self, verbose: bool) -> ProofStateView {
        match &self.state {
            None => ProofStateView {
                status: Status::Idle,
                theorem: None,
                statement: None,
                goals: vec![],
                complete: false,
                proof_term: None,
            },
            Some(state) => ProofStateView {
                status: if state.is_complete() {
                    Status::Complete
                } else {
                    Status::InProgress
                },
                theorem: self.theorem_name.clone(),
                statement: Some(state.statement().to_string()),
                goals: state
                    .goals()
                    .iter()
                    .map(|g| GoalView {
                        id: g.id.0,
                        statement: g.target.to_string(),
                        assumptions: verbose.then(|| {
                            g.hypotheses
                                .iter()
                                .map(|(name, ty)| AssumptionView {
                                    name: name.to_string(),
                                    ty: ty.to_string(),
                                })
                                .collect()
                        }),
                    })
                    .collect(),
                complete: state.is_complete(),
                proof_term: verbose.then(|| state.proof().to_string()),
            },
        }
    }

    /// Save the active proof to `filename` (resolved against the session
    /// root if relative).
    pub fn save_proof(
        &self,
        filename: &str,
        format: SaveFormat,
    ) -> Result<PathBuf, SessionError> {
        let state = self.state.as_ref().ok_or(SessionError::NoActiveProof)?;
        let path = self.resolve(filename);
        persist::save_proof(state, &path, format)?;
        Ok(path)
    }

    /// Load a proof saved in the JSON format, replacing any active state.
    pub fn load_proof(&mut self, filename: &str) -> Result<ProofStateView, SessionError> {
        let path = self.resolve(filename);
        let state = persist::load_proof(&self.env, &path)?;
        self.state = Some(state);
        self.theorem_name = None;
        Ok(self.get_proof_state(false))
    }

    /// Compile a geometric construction. When `install` is set and the
    /// extracted statement matches the active goal, the result becomes
    /// the active (complete) proof.
    #[instrument(skip(self, construction))]
    pub fn construct_geometric_proof(
        &mut self,
        construction: &GeometricConstruction,
        install: bool,
    ) -> Result<GeometricView, SessionError> {
        let proof = extract(&self.env, construction)?;
        let installed = install
            && match &self.state {
                Some(state) => {
                    !state.is_complete() && state.statement() == &proof.statement
                }
                None => false,
            };
        if installed {
            let state = ProofState::from_parts(
                proof.statement.clone(),
                vec![],
                proof.proof.clone(),
                true,
            );
            info!(statement = %proof.statement, "geometric proof installed");
            self.state = Some(state);
        }
        Ok(GeometricView {
            statement: proof.statement.to_string(),
            proof_term: proof.proof.to_string(),
            assumptions: proof.assumptions,
            goal: proof.goal,
            installed,
        })
    }

    /// Search the theorem library (and the tactic catalog) by substring.
    pub fn query_theorem(&self, query: &str, filter: QueryFilter) -> Vec<QueryItem> {
        let needle = query.to_lowercase();
        let mut items = Vec::new();
        if !matches!(filter, QueryFilter::Tactics) {
            for decl in self.env.iter_decls() {
                let kind = match decl.kind {
                    DeclKind::Definition => "definition",
                    DeclKind::Theorem => "theorem",
                    DeclKind::Axiom => "axiom",
                    DeclKind::Inductive => "inductive",
                    DeclKind::Constructor => "constructor",
                };
                let keep = match filter {
                    QueryFilter::All => true,
                    QueryFilter::Theorems => {
                        matches!(decl.kind, DeclKind::Theorem | DeclKind::Axiom)
                    }
                    QueryFilter::Definitions => matches!(
                        decl.kind,
                        DeclKind::Definition | DeclKind::Inductive | DeclKind::Constructor
                    ),
                    QueryFilter::Tactics => false,
                };
                if keep && decl.name.as_str().to_lowercase().contains(&needle) {
                    items.push(QueryItem {
                        name: decl.name.to_string(),
                        signature: decl.ty.to_string(),
                        kind,
                    });
                }
            }
        }
        if matches!(filter, QueryFilter::All | QueryFilter::Tactics) {
            for info in euclid_tactic::list_tactics() {
                if info.name.contains(&needle) {
                    items.push(QueryItem {
                        name: info.name.to_owned(),
                        signature: info.usage.to_owned(),
                        kind: "tactic",
                    });
                }
            }
        }
        items
    }

    /// Normalize an expression under the given strategy. The expression
    /// is type-checked first; normalization of ill-typed terms is not
    /// attempted.
    #[instrument(skip(self))]
    pub fn normalize_expression(
        &self,
        expression: &str,
        strategy: Strategy,
    ) -> Result<NormalizeView, SessionError> {
        let expr = parse_resolved(&self.env, expression)?;
        let ctx = self.ambient_context(&expr, &[])?;
        TypeChecker::new(&self.env).infer(&ctx, &expr)?;
        let normal = reduce(&self.env, &expr, strategy);
        Ok(NormalizeView {
            expression: expr.to_string(),
            normal_form: normal.to_string(),
        })
    }

    /// The tactic catalog.
    pub fn list_tactics(&self) -> &'static [TacticInfo] {
        euclid_tactic::list_tactics()
    }

    /// Add a theorem proved elsewhere to the library.
    pub fn add_theorem(
        &mut self,
        name: &str,
        ty: Expr,
        value: Option<Expr>,
    ) -> Result<(), SessionError> {
        self.env
            .add_decl(euclid_kernel::Declaration {
                name: name.into(),
                ty,
                value,
                kind: DeclKind::Theorem,
            })
            .map_err(|e| {
                SessionError::Persistence(PersistenceError::MalformedContent(e.to_string()))
            })
    }

    fn resolve(&self, filename: &str) -> PathBuf {
        let path = Path::new(filename);
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.root.join(path)
        }
    }

    /// A context binding the supplied assumptions, then any remaining
    /// free variables of `expr` as propositions of type `Type`.
    fn ambient_context(
        &self,
        expr: &Expr,
        supplied: &[(String, String)],
    ) -> Result<Context, SessionError> {
        let mut ctx = Context::new();
        for (name, ty_text) in supplied {
            let ty = Type::new(parse_resolved(&self.env, ty_text)?);
            ctx.push(name.as_str().into(), ty);
        }
        let mut free: Vec<Name> = expr.free_vars().into_iter().collect();
        free.sort();
        for name in free {
            if !ctx.contains(&name) && !name.is_meta() {
                ctx.push(name, Type::new(Expr::type_()));
            }
        }
        Ok(ctx)
    }
}
