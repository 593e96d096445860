//! Proof persistence.
//!
//! The JSON schema, version `"1"`:
//!
//! ```json
//! {
//!   "version": "1",
//!   "statement": "∀(n : Nat). Path Nat n n",
//!   "goals": [
//!     {
//!       "id": 2,
//!       "statement": "Path Nat n n",
//!       "type": "path",
//!       "assumptions": [{"name": "n", "type": "Nat"}]
//!     }
//!   ],
//!   "assumptions": [{"name": "n", "type": "Nat"}],
//!   "proofTerm": "λ(n : Nat). ?g2",
//!   "complete": false
//! }
//! ```
//!
//! `assumptions` at the top level mirrors the head goal's context;
//! the per-goal copies are what `load_proof` reconstructs contexts from.
//! Partial proof terms are persisted with their `?gN` placeholders, which
//! the parser accepts back as variables, so a half-finished proof
//! round-trips exactly.

use euclid_kernel::{Context, Environment, Type};
use euclid_parser::parse_resolved;
use euclid_tactic::{Goal, GoalId, ProofState};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// The only schema version this build reads and writes.
pub const SCHEMA_VERSION: &str = "1";

/// Output formats for `save_proof`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaveFormat {
    /// The round-trippable schema above.
    Json,
    /// Just the proof term, one line.
    ProofTerm,
    /// A self-contained LaTeX fragment.
    Latex,
}

impl std::str::FromStr for SaveFormat {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(SaveFormat::Json),
            "proof-term" => Ok(SaveFormat::ProofTerm),
            "latex" => Ok(SaveFormat::Latex),
            other => Err(PersistenceError::MalformedContent(format!(
                "unknown save format `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("proof file not found: {0}")]
    NotFound(String),
    #[error("malformed proof file: {0}")]
    MalformedContent(String),
    #[error("unsupported proof file version `{0}` (this build reads version {SCHEMA_VERSION})")]
    UnsupportedVersion(String),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct ProofFile {
    version: String,
    statement: String,
    goals: Vec<GoalRecord>,
    assumptions: Vec<AssumptionRecord>,
    #[serde(rename = "proofTerm")]
    proof_term: Option<String>,
    complete: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct GoalRecord {
    id: u64,
    statement: String,
    #[serde(rename = "type")]
    category: String,
    #[serde(default)]
    assumptions: Vec<AssumptionRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AssumptionRecord {
    name: String,
    #[serde(rename = "type")]
    ty: String,
}

fn assumptions_of(ctx: &Context) -> Vec<AssumptionRecord> {
    ctx.iter()
        .map(|(name, ty)| AssumptionRecord {
            name: name.to_string(),
            ty: ty.to_string(),
        })
        .collect()
}

fn to_file(state: &ProofState) -> ProofFile {
    ProofFile {
        version: SCHEMA_VERSION.to_owned(),
        statement: state.statement().to_string(),
        goals: state
            .goals()
            .iter()
            .map(|g| GoalRecord {
                id: g.id.0,
                statement: g.target.to_string(),
                category: g.target.category().to_string(),
                assumptions: assumptions_of(&g.hypotheses),
            })
            .collect(),
        assumptions: state
            .current_goal()
            .map(|g| assumptions_of(&g.hypotheses))
            .unwrap_or_default(),
        proof_term: Some(state.proof().to_string()),
        complete: state.is_complete(),
    }
}

/// Serialize `state` to `path` in the requested format.
pub fn save_proof(
    state: &ProofState,
    path: &Path,
    format: SaveFormat,
) -> Result<(), PersistenceError> {
    let rendered = match format {
        SaveFormat::Json => {
            let file = to_file(state);
            serde_json::to_string_pretty(&file)
                .map_err(|e| PersistenceError::MalformedContent(e.to_string()))?
        }
        SaveFormat::ProofTerm => format!("{}\n", state.proof()),
        SaveFormat::Latex => render_latex(state),
    };
    fs::write(path, rendered)?;
    debug!(path = %path.display(), ?format, "proof saved");
    Ok(())
}

/// Deserialize a proof state from the JSON schema at `path`.
pub fn load_proof(env: &Environment, path: &Path) -> Result<ProofState, PersistenceError> {
    let bytes = match fs::read_to_string(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(PersistenceError::NotFound(path.display().to_string()));
        }
        Err(e) => return Err(PersistenceError::Io(e)),
    };
    let file: ProofFile = serde_json::from_str(&bytes)
        .map_err(|e| PersistenceError::MalformedContent(e.to_string()))?;
    if file.version != SCHEMA_VERSION {
        return Err(PersistenceError::UnsupportedVersion(file.version));
    }

    let parse = |text: &str| {
        parse_resolved(env, text).map_err(|e| {
            PersistenceError::MalformedContent(format!("`{text}`: {e}"))
        })
    };

    let statement = Type::new(parse(&file.statement)?);
    let mut goals = Vec::with_capacity(file.goals.len());
    for record in &file.goals {
        let mut hypotheses = Context::new();
        for assumption in &record.assumptions {
            let ty = Type::new(parse(&assumption.ty)?);
            if !hypotheses.push(assumption.name.as_str().into(), ty) {
                return Err(PersistenceError::MalformedContent(format!(
                    "duplicate assumption `{}` in goal {}",
                    assumption.name, record.id
                )));
            }
        }
        goals.push(Goal {
            id: GoalId(record.id),
            target: Type::new(parse(&record.statement)?),
            hypotheses,
        });
    }

    let proof = match &file.proof_term {
        Some(text) => parse(text)?,
        None => {
            return Err(PersistenceError::MalformedContent(
                "missing proofTerm".to_owned(),
            ));
        }
    };

    // The flag is never taken on trust: a file claiming completion with
    // goals remaining is rejected, and a goal-free file is only accepted
    // once its proof term re-checks against the statement.
    let complete = goals.is_empty();
    if file.complete && !complete {
        return Err(PersistenceError::MalformedContent(
            "complete flag set but goals remain".to_owned(),
        ));
    }
    let state = ProofState::from_parts(statement, goals, proof, complete);
    if complete {
        state.verify(env).map_err(|e| {
            PersistenceError::MalformedContent(format!(
                "proof term does not prove the statement: {e}"
            ))
        })?;
    }

    debug!(path = %path.display(), goals = state.goals().len(), "proof loaded");
    Ok(state)
}

/// LaTeX rendering of a (usually complete) proof.
fn render_latex(state: &ProofState) -> String {
    let mut out = String::new();
    out.push_str("\\begin{theorem}\n");
    out.push_str(&format!("  ${}$\n", latex_math(&state.statement().to_string())));
    out.push_str("\\end{theorem}\n");
    out.push_str("\\begin{proof}\n");
    if state.is_complete() {
        out.push_str(&format!(
            "  Witnessed by the term ${}$.\n",
            latex_math(&state.proof().to_string())
        ));
    } else {
        out.push_str("  Incomplete; open goals:\n  \\begin{itemize}\n");
        for goal in state.goals() {
            out.push_str(&format!(
                "    \\item ${}$\n",
                latex_math(&goal.target.to_string())
            ));
        }
        out.push_str("  \\end{itemize}\n");
    }
    out.push_str("\\end{proof}\n");
    out
}

fn latex_math(text: &str) -> String {
    text.replace('∀', "\\forall ")
        .replace('λ', "\\lambda ")
        .replace('Σ', "\\Sigma ")
        .replace('→', "\\to ")
        .replace('Π', "\\Pi ")
        .replace('_', "\\_")
}
