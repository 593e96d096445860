//! Geometric proof construction.
//!
//! A construction is a directed graph: points carry propositions, lines
//! carry implications. Compiling a construction walks the graph from an
//! assumption point to the goal point and composes the implications along
//! the way into a single proof term, which the kernel then verifies.
//!
//! A line's implication can be given three ways:
//! - a term whose type is `from → to` (a theorem name, a lambda, ...),
//!   used directly;
//! - the implication *type* `from → to` itself, in which case a
//!   hypothesis of that type is synthesized and quantified over in the
//!   resulting statement;
//! - omitted, which is shorthand for the previous case.

use euclid_kernel::{
    Context, Environment, Expr, Name, Type, TypeChecker, TypeError,
};
use euclid_parser::{parse_resolved, ParseError};
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// A labelled proposition in the construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Point {
    /// Unique id, referenced by lines.
    pub id: String,
    /// Display label; defaults to the id.
    #[serde(default)]
    pub label: Option<String>,
    /// The proposition at this point, in surface syntax.
    pub proposition: String,
    /// Marks this point as the conclusion. At most one point may carry
    /// the mark; without it the unique sink is the goal.
    #[serde(default)]
    pub is_goal: bool,
}

/// A directed implication between two points.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Line {
    pub from: String,
    pub to: String,
    /// Implication witness or type, in surface syntax. `None` synthesizes
    /// a hypothesis of type `from → to`.
    #[serde(default)]
    pub implication: Option<String>,
}

/// A complete construction: the JSON surface of the geometric mode.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeometricConstruction {
    pub points: Vec<Point>,
    pub lines: Vec<Line>,
}

/// The compiled result: a kernel-verified statement and proof term.
#[derive(Clone, Debug)]
pub struct GeometricProof {
    /// The proved statement, including any synthesized edge hypotheses.
    pub statement: Type,
    /// The verified proof term.
    pub proof: Expr,
    /// Point ids of the assumptions, lexically ordered.
    pub assumptions: Vec<String>,
    /// Point id of the goal.
    pub goal: String,
}

#[derive(Debug, Error)]
pub enum GeometricError {
    #[error("construction has no points")]
    Empty,
    #[error("duplicate point id `{0}`")]
    DuplicatePoint(String),
    #[error("line references unknown point `{0}`")]
    UnknownPoint(String),
    #[error("construction contains a cycle through `{0}`")]
    Cycle(String),
    #[error("more than one point is marked as the goal")]
    MultipleGoals,
    #[error("no unique goal: points {0:?} are all sinks")]
    AmbiguousGoal(Vec<String>),
    #[error("assumption `{0}` cannot reach the goal")]
    Unreachable(String),
    #[error("implication on line {from} → {to} proves neither `{expected}` nor is it that type")]
    BadImplication {
        from: String,
        to: String,
        expected: String,
    },
    #[error("invalid proposition: {0}")]
    Parse(#[from] ParseError),
    #[error("compiled proof failed verification: {0}")]
    Type(#[from] TypeError),
}

/// How a line discharges its implication.
#[derive(Clone, Debug)]
enum EdgeWitness {
    /// A term already proving `from → to`.
    Term(Expr),
    /// A synthesized hypothesis, quantified over in the statement.
    Hypothesis(Name, Expr),
}

/// Compile a construction into a verified proof.
pub fn extract(
    env: &Environment,
    construction: &GeometricConstruction,
) -> Result<GeometricProof, GeometricError> {
    if construction.points.is_empty() {
        return Err(GeometricError::Empty);
    }

    // Parse every proposition and index the points.
    let mut props: HashMap<&str, Expr> = HashMap::new();
    for point in &construction.points {
        if props.contains_key(point.id.as_str()) {
            return Err(GeometricError::DuplicatePoint(point.id.clone()));
        }
        props.insert(&point.id, parse_resolved(env, &point.proposition)?);
    }
    for line in &construction.lines {
        for id in [&line.from, &line.to] {
            if !props.contains_key(id.as_str()) {
                return Err(GeometricError::UnknownPoint(id.clone()));
            }
        }
    }

    topo_check(construction)?;
    let goal = find_goal(construction)?;

    // Free proposition variables become an ambient context of `Type`.
    let mut ambient = Context::new();
    let mut free: Vec<Name> = props
        .values()
        .flat_map(|e| e.free_vars())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    free.sort();
    for name in free {
        ambient.push(name, Type::new(Expr::type_()));
    }

    // Resolve each line's witness.
    let tc = TypeChecker::new(env);
    let mut witnesses: Vec<EdgeWitness> = Vec::with_capacity(construction.lines.len());
    let mut hyp_count = 0usize;
    for line in &construction.lines {
        let from = props[line.from.as_str()].clone();
        let to = props[line.to.as_str()].clone();
        let arrow = Expr::arrow(from, to);
        let witness = match &line.implication {
            None => synth_hyp(&mut hyp_count, arrow),
            Some(text) => {
                let expr = parse_resolved(env, text)?;
                let as_term = tc
                    .check(&ambient, &expr, &Type::new(arrow.clone()))
                    .is_ok();
                if as_term {
                    EdgeWitness::Term(expr)
                } else if tc.def_eq(&expr, &arrow) {
                    // The line names the implication type itself.
                    synth_hyp(&mut hyp_count, arrow)
                } else {
                    return Err(GeometricError::BadImplication {
                        from: line.from.clone(),
                        to: line.to.clone(),
                        expected: arrow.to_string(),
                    });
                }
            }
        };
        witnesses.push(witness);
    }

    // Assumptions: sources of the graph, minus the goal.
    let incoming: HashSet<&str> = construction
        .lines
        .iter()
        .map(|l| l.to.as_str())
        .collect();
    let mut assumptions: Vec<String> = construction
        .points
        .iter()
        .filter(|p| !incoming.contains(p.id.as_str()) && p.id != goal)
        .map(|p| p.id.clone())
        .collect();
    assumptions.sort();

    // Every assumption must have a path to the goal.
    for assumption in &assumptions {
        if path_to(construction, assumption, &goal).is_none() {
            return Err(GeometricError::Unreachable(assumption.clone()));
        }
    }

    // Compose along the lexically first assumption's path (or prove the
    // goal outright when it has no assumptions feeding it).
    let (inner_statement, inner_proof) = match assumptions.first() {
        Some(start) => {
            let path = path_to(construction, start, &goal)
                .unwrap_or_default();
            let h = Name::new("h");
            let mut term = Expr::var(h.clone());
            for line_idx in &path {
                let applied = match &witnesses[*line_idx] {
                    EdgeWitness::Term(t) => t.clone(),
                    EdgeWitness::Hypothesis(name, _) => Expr::var(name.clone()),
                };
                term = Expr::app(applied, term);
            }
            let start_prop = props[start.as_str()].clone();
            let goal_prop = props[goal.as_str()].clone();
            (
                Expr::arrow(start_prop.clone(), goal_prop),
                Expr::lam(h, start_prop, term),
            )
        }
        None => {
            // No assumptions: the goal must be proved by the implications
            // alone, which only works when a line targets it from a point
            // that is itself the goal of a sub-derivation. Not expressible
            // without a source, so require at least one.
            return Err(GeometricError::Unreachable(goal));
        }
    };

    // Quantify over synthesized hypotheses, in line order.
    let mut statement = inner_statement;
    let mut proof = inner_proof;
    for witness in witnesses.iter().rev() {
        if let EdgeWitness::Hypothesis(name, ty) = witness {
            statement = Expr::pi(name.clone(), ty.clone(), statement);
            proof = Expr::lam(name.clone(), ty.clone(), proof);
        }
    }

    let statement = Type::new(statement);
    tc.check(&ambient, &proof, &statement)?;
    debug!(%statement, "geometric proof verified");

    Ok(GeometricProof {
        statement,
        proof,
        assumptions,
        goal,
    })
}

fn synth_hyp(count: &mut usize, arrow: Expr) -> EdgeWitness {
    let name = Name::new(format!("imp{count}"));
    *count += 1;
    EdgeWitness::Hypothesis(name, arrow)
}

/// Kahn's algorithm; errors with a point on a cycle if one exists.
fn topo_check(construction: &GeometricConstruction) -> Result<(), GeometricError> {
    let mut indegree: HashMap<&str, usize> = construction
        .points
        .iter()
        .map(|p| (p.id.as_str(), 0))
        .collect();
    for line in &construction.lines {
        *indegree.entry(line.to.as_str()).or_insert(0) += 1;
    }
    let mut queue: Vec<&str> = construction
        .points
        .iter()
        .map(|p| p.id.as_str())
        .filter(|id| indegree[id] == 0)
        .collect();
    let mut seen = 0;
    while let Some(id) = queue.pop() {
        seen += 1;
        for line in &construction.lines {
            if line.from != id {
                continue;
            }
            if let Some(d) = indegree.get_mut(line.to.as_str()) {
                *d -= 1;
                if *d == 0 {
                    queue.push(line.to.as_str());
                }
            }
        }
    }
    if seen < construction.points.len() {
        let on_cycle = construction
            .points
            .iter()
            .find(|p| indegree[p.id.as_str()] > 0)
            .map(|p| p.id.clone())
            .unwrap_or_default();
        return Err(GeometricError::Cycle(on_cycle));
    }
    Ok(())
}

/// The goal: the explicitly marked point, or the unique sink.
fn find_goal(construction: &GeometricConstruction) -> Result<String, GeometricError> {
    let marked: Vec<&Point> = construction.points.iter().filter(|p| p.is_goal).collect();
    match marked.as_slice() {
        [only] => return Ok(only.id.clone()),
        [] => {}
        _ => return Err(GeometricError::MultipleGoals),
    }
    let outgoing: HashSet<&str> = construction
        .lines
        .iter()
        .map(|l| l.from.as_str())
        .collect();
    let sinks: Vec<String> = construction
        .points
        .iter()
        .filter(|p| !outgoing.contains(p.id.as_str()))
        .map(|p| p.id.clone())
        .collect();
    match sinks.as_slice() {
        [only] => Ok(only.clone()),
        _ => Err(GeometricError::AmbiguousGoal(sinks)),
    }
}

/// Depth-first path from `start` to `goal`, returning line indices in
/// traversal order. Lines are tried in their supplied order, which makes
/// the composed proof deterministic.
fn path_to(
    construction: &GeometricConstruction,
    start: &str,
    goal: &str,
) -> Option<Vec<usize>> {
    fn dfs(
        construction: &GeometricConstruction,
        at: &str,
        goal: &str,
        visited: &mut HashSet<String>,
        path: &mut Vec<usize>,
    ) -> bool {
        if at == goal {
            return true;
        }
        for (idx, line) in construction.lines.iter().enumerate() {
            if line.from == at && visited.insert(line.to.clone()) {
                path.push(idx);
                if dfs(construction, &line.to, goal, visited, path) {
                    return true;
                }
                path.pop();
            }
        }
        false
    }
    let mut visited = HashSet::new();
    visited.insert(start.to_owned());
    let mut path = Vec::new();
    dfs(construction, start, goal, &mut visited, &mut path).then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, proposition: &str) -> Point {
        Point {
            id: id.to_owned(),
            label: None,
            proposition: proposition.to_owned(),
            is_goal: false,
        }
    }

    fn line(from: &str, to: &str, implication: Option<&str>) -> Line {
        Line {
            from: from.to_owned(),
            to: to.to_owned(),
            implication: implication.map(str::to_owned),
        }
    }

    #[test]
    fn test_two_step_composition() {
        // P → Q → R via implication types on the lines.
        let env = Environment::with_builtins();
        let construction = GeometricConstruction {
            points: vec![point("p", "P"), point("q", "Q"), point("r", "R")],
            lines: vec![
                line("p", "q", Some("P -> Q")),
                line("q", "r", Some("Q -> R")),
            ],
        };
        let proof = extract(&env, &construction).unwrap();
        assert_eq!(proof.assumptions, ["p"]);
        assert_eq!(proof.goal, "r");
        assert_eq!(
            proof.statement.to_string(),
            "(P → Q) → (Q → R) → P → R"
        );
        assert_eq!(
            proof.proof.to_string(),
            "λ(imp0 : P → Q). λ(imp1 : Q → R). λ(h : P). imp1 (imp0 h)"
        );
    }

    #[test]
    fn test_term_implications_need_no_hypotheses() {
        // Lines carrying actual proof terms produce an unconditional
        // implication.
        let env = Environment::with_builtins();
        let construction = GeometricConstruction {
            points: vec![point("a", "Nat"), point("b", "Nat")],
            lines: vec![line("a", "b", Some("Nat.succ"))],
        };
        let proof = extract(&env, &construction).unwrap();
        assert_eq!(proof.statement.to_string(), "Nat → Nat");
        assert_eq!(proof.proof.to_string(), "λ(h : Nat). Nat.succ h");
    }

    #[test]
    fn test_cycle_detected() {
        let env = Environment::with_builtins();
        let construction = GeometricConstruction {
            points: vec![point("a", "P"), point("b", "Q"), point("c", "R")],
            lines: vec![
                line("a", "b", None),
                line("b", "c", None),
                line("c", "a", None),
            ],
        };
        assert!(matches!(
            extract(&env, &construction),
            Err(GeometricError::Cycle(_))
        ));
    }

    #[test]
    fn test_unreachable_assumption() {
        let env = Environment::with_builtins();
        let construction = GeometricConstruction {
            points: vec![
                point("a", "P"),
                point("b", "Q"),
                {
                    let mut g = point("g", "R");
                    g.is_goal = true;
                    g
                },
            ],
            lines: vec![line("a", "g", None)],
        };
        let err = extract(&env, &construction).unwrap_err();
        assert!(matches!(err, GeometricError::Unreachable(id) if id == "b"));
    }

    #[test]
    fn test_explicit_goal_overrides_sink() {
        let env = Environment::with_builtins();
        // Two sinks, but `q` is marked.
        let construction = GeometricConstruction {
            points: vec![
                point("p", "P"),
                {
                    let mut q = point("q", "Q");
                    q.is_goal = true;
                    q
                },
                point("r", "R"),
            ],
            lines: vec![line("p", "q", None), line("p", "r", None)],
        };
        let proof = extract(&env, &construction).unwrap();
        assert_eq!(proof.goal, "q");
        assert_eq!(proof.statement.to_string(), "(P → Q) → (P → R) → P → Q");
    }

    #[test]
    fn test_ambiguous_goal_without_mark() {
        let env = Environment::with_builtins();
        let construction = GeometricConstruction {
            points: vec![point("p", "P"), point("q", "Q"), point("r", "R")],
            lines: vec![line("p", "q", None), line("p", "r", None)],
        };
        assert!(matches!(
            extract(&env, &construction),
            Err(GeometricError::AmbiguousGoal(_))
        ));
    }

    #[test]
    fn test_bad_implication_rejected() {
        let env = Environment::with_builtins();
        let construction = GeometricConstruction {
            points: vec![point("p", "P"), point("q", "Q")],
            lines: vec![line("p", "q", Some("Nat.zero"))],
        };
        assert!(matches!(
            extract(&env, &construction),
            Err(GeometricError::BadImplication { .. })
        ));
    }

    #[test]
    fn test_construction_deserializes_from_json() {
        let json = r#"{
            "points": [
                {"id": "p", "proposition": "P"},
                {"id": "q", "proposition": "Q", "is_goal": true}
            ],
            "lines": [
                {"from": "p", "to": "q"}
            ]
        }"#;
        let construction: GeometricConstruction = serde_json::from_str(json).unwrap();
        assert_eq!(construction.points.len(), 2);
        assert!(construction.points[1].is_goal);
        assert!(construction.lines[0].implication.is_none());

        let env = Environment::with_builtins();
        let proof = extract(&env, &construction).unwrap();
        assert_eq!(proof.statement.to_string(), "(P → Q) → P → Q");
    }
}
