//! euclid CLI
//!
//! Command-line interface for the euclid proof assistant.
//!
//! # Commands
//!
//! - `euclid check <expr>` - Type-check an expression
//! - `euclid normalize <expr>` - Normalize an expression
//! - `euclid prove <goal>` - Start a proof and run a tactic script
//! - `euclid geometric <file>` - Compile a geometric construction
//! - `euclid load <file>` - Load and display a saved proof
//! - `euclid theorems <query>` - Search the theorem library
//! - `euclid tactics` - List the tactic catalog

use clap::{Parser, Subcommand};
use euclid_geo::GeometricConstruction;
use euclid_kernel::Strategy;
use euclid_session::{ProofSession, ProofStateView, QueryFilter, SaveFormat, Status};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "euclid")]
#[command(about = "A dependently typed proof assistant with a geometric front end")]
#[command(version)]
struct Cli {
    /// Enable debug logging (respects EUCLID_LOG for finer control)
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Type-check an expression and show its type
    Check {
        /// Expression to check
        expr: String,
        /// Assumption of the form `name:type` (repeatable)
        #[arg(short, long = "assume")]
        assume: Vec<String>,
    },
    /// Normalize an expression
    Normalize {
        /// Expression to normalize
        expr: String,
        /// Reduction strategy: whnf, full, or nbe
        #[arg(short, long, default_value = "full")]
        strategy: String,
    },
    /// Start a proof and run tactics against it
    Prove {
        /// The statement to prove
        goal: String,
        /// Name to record the theorem under
        #[arg(short, long)]
        name: Option<String>,
        /// Tactic to apply, in order (repeatable)
        #[arg(short, long = "tactic")]
        tactics: Vec<String>,
        /// Save the resulting state to this file
        #[arg(long)]
        save: Option<String>,
        /// Save format: json, proof-term, or latex
        #[arg(long, default_value = "json")]
        format: String,
    },
    /// Compile a geometric construction (JSON) into a verified proof
    Geometric {
        /// Construction file
        file: PathBuf,
        /// Statement to prove with the construction; when the compiled
        /// statement matches, the proof is installed and can be saved
        #[arg(short, long)]
        goal: Option<String>,
        /// Save the installed proof to this file (requires --goal)
        #[arg(long)]
        save: Option<String>,
    },
    /// Load a saved proof and display its state
    Load {
        /// Proof file (JSON format)
        file: String,
    },
    /// Search the theorem library
    Theorems {
        /// Substring to search for (empty lists everything)
        #[arg(default_value = "")]
        query: String,
        /// Restrict results: all, theorems, definitions, or tactics
        #[arg(short, long, default_value = "all")]
        filter: String,
    },
    /// List available tactics
    Tactics,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::try_from_env("EUCLID_LOG")
            .unwrap_or_else(|_| EnvFilter::new("euclid=debug"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let result = match cli.command {
        Commands::Check { expr, assume } => check(&expr, &assume),
        Commands::Normalize { expr, strategy } => normalize(&expr, &strategy),
        Commands::Prove {
            goal,
            name,
            tactics,
            save,
            format,
        } => prove(&goal, name.as_deref(), &tactics, save.as_deref(), &format),
        Commands::Geometric { file, goal, save } => {
            geometric(&file, goal.as_deref(), save.as_deref())
        }
        Commands::Load { file } => load(&file),
        Commands::Theorems { query, filter } => theorems(&query, &filter),
        Commands::Tactics => tactics(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn session() -> anyhow::Result<ProofSession> {
    Ok(ProofSession::new(std::env::current_dir()?))
}

fn parse_assumptions(assume: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    assume
        .iter()
        .map(|entry| {
            entry
                .split_once(':')
                .map(|(name, ty)| (name.trim().to_owned(), ty.trim().to_owned()))
                .ok_or_else(|| anyhow::anyhow!("assumption `{entry}` is not of the form name:type"))
        })
        .collect()
}

fn parse_strategy(s: &str) -> anyhow::Result<Strategy> {
    match s {
        "whnf" => Ok(Strategy::Whnf),
        "full" => Ok(Strategy::Full),
        "nbe" => Ok(Strategy::Nbe),
        other => anyhow::bail!("unknown strategy `{other}` (expected whnf, full, or nbe)"),
    }
}

fn check(expr: &str, assume: &[String]) -> anyhow::Result<()> {
    let session = session()?;
    let context = parse_assumptions(assume)?;
    let view = session.check(expr, &context)?;
    println!("Expression: {}", view.expression);
    println!("Type: {}", view.inferred_type);
    Ok(())
}

fn normalize(expr: &str, strategy: &str) -> anyhow::Result<()> {
    let session = session()?;
    let strategy = parse_strategy(strategy)?;
    let view = session.normalize_expression(expr, strategy)?;
    println!("Expression: {}", view.expression);
    println!("Normal form: {}", view.normal_form);
    Ok(())
}

fn prove(
    goal: &str,
    name: Option<&str>,
    tactics: &[String],
    save: Option<&str>,
    format: &str,
) -> anyhow::Result<()> {
    let mut session = session()?;
    session.start_proof(goal, name)?;

    for tactic in tactics {
        let view = session.apply_tactic(tactic, None)?;
        println!("{tactic}: {} goal(s) remaining", view.goals.len());
    }

    let view = session.get_proof_state(true);
    print_state(&view);

    if let Some(filename) = save {
        let format: SaveFormat = format.parse()?;
        let path = session.save_proof(filename, format)?;
        println!("Saved to {}", path.display());
    }

    if view.status != Status::Complete && !tactics.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn geometric(file: &PathBuf, goal: Option<&str>, save: Option<&str>) -> anyhow::Result<()> {
    let mut session = session()?;
    let content = std::fs::read_to_string(file)?;
    let construction: GeometricConstruction = serde_json::from_str(&content)?;

    if let Some(goal) = goal {
        session.start_proof(goal, None)?;
    }
    let view = session.construct_geometric_proof(&construction, goal.is_some())?;

    println!("Statement: {}", view.statement);
    println!("Proof: {}", view.proof_term);
    println!("Assumptions: {}", view.assumptions.join(", "));
    println!("Goal: {}", view.goal);
    if goal.is_some() && !view.installed {
        anyhow::bail!("compiled statement does not match the requested goal");
    }

    if let Some(filename) = save {
        if !view.installed {
            anyhow::bail!("nothing to save: pass --goal to install the proof first");
        }
        let path = session.save_proof(filename, SaveFormat::Json)?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}

fn load(file: &str) -> anyhow::Result<()> {
    let mut session = session()?;
    session.load_proof(file)?;
    print_state(&session.get_proof_state(true));
    Ok(())
}

fn theorems(query: &str, filter: &str) -> anyhow::Result<()> {
    let session = session()?;
    let filter: QueryFilter = filter
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let items = session.query_theorem(query, filter);
    if items.is_empty() {
        println!("No matches for `{query}`.");
        return Ok(());
    }
    for item in items {
        println!("{} ({}): {}", item.name, item.kind, item.signature);
    }
    Ok(())
}

fn tactics() -> anyhow::Result<()> {
    let session = session()?;
    for info in session.list_tactics() {
        println!("{:<12} {}", info.usage, info.summary);
    }
    Ok(())
}

fn print_state(view: &ProofStateView) {
    match view.status {
        Status::Idle => println!("No active proof."),
        Status::Complete => {
            println!("Proof complete.");
            if let Some(statement) = &view.statement {
                println!("Statement: {statement}");
            }
            if let Some(term) = &view.proof_term {
                println!("Proof: {term}");
            }
        }
        Status::InProgress => {
            if let Some(statement) = &view.statement {
                println!("Proving: {statement}");
            }
            println!("{} open goal(s):", view.goals.len());
            for goal in &view.goals {
                println!("  ?g{}: {}", goal.id, goal.statement);
                if let Some(assumptions) = &goal.assumptions {
                    for a in assumptions {
                        println!("      {} : {}", a.name, a.ty);
                    }
                }
            }
            if let Some(term) = &view.proof_term {
                println!("Partial proof: {term}");
            }
        }
    }
}
