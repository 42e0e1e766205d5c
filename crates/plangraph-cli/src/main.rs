//! plangraph CLI: validate, explain and optimize YAML plan documents.

use clap::{Parser, Subcommand};
use plangraph_core::config::OptimizerConfig;
use plangraph_core::render::PlanSnapshot;
use plangraph_core::{Operator, OperatorKey};
use plangraph_rewrite::dsl::yaml::BuiltDocument;
use plangraph_rewrite::parse_plan_document;
use plangraph_walk::{visit, DependencyOrderWalker, PlanPrinter, PlanWalker, WalkerKind};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "plangraph")]
#[command(about = "Operator-plan graphs and rule-driven rewrites", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a plan document builds into a valid acyclic plan
    Validate {
        /// Path to the plan YAML file
        #[arg(short, long)]
        plan: PathBuf,
    },

    /// Print the operators of a plan in walker order (EXPLAIN)
    Explain {
        /// Path to the plan YAML file
        #[arg(short, long)]
        plan: PathBuf,

        /// Traversal: depth-first, dependency or reverse-dependency
        #[arg(long)]
        walker: Option<WalkerKind>,

        /// Emit a JSON snapshot instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run the document's rules until the plan stops changing
    Optimize {
        /// Path to the plan YAML file
        #[arg(short, long)]
        plan: PathBuf,

        /// Pass limit (overrides document and environment)
        #[arg(long)]
        max_passes: Option<usize>,

        /// Record before/after renderings of every rewrite
        #[arg(long)]
        trace: bool,
    },
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { plan } => match validate_plan(&plan) {
            Ok(summary) => println!("✓ Plan is valid ({summary})"),
            Err(e) => {
                eprintln!("Validation failed: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Explain { plan, walker, json } => {
            if let Err(e) = explain_plan(&plan, walker, json) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Optimize {
            plan,
            max_passes,
            trace,
        } => {
            if let Err(e) = optimize_plan(&plan, max_passes, trace) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (warnings only by default).
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load(path: &Path, config: OptimizerConfig) -> Result<BuiltDocument, Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(path)?;
    let doc = parse_plan_document(&yaml_content)?;
    Ok(doc.build(config)?)
}

fn validate_plan(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let built = load(path, OptimizerConfig::from_env())?;
    built.plan.check_invariants()?;
    // Fails on a cycle.
    DependencyOrderWalker.walk(&built.plan)?;
    Ok(format!(
        "{} operators, {} edges, {} rules",
        built.plan.len(),
        built.plan.edge_count(),
        built.rules.len()
    ))
}

#[derive(Serialize)]
struct ExplainJson {
    walker: WalkerKind,
    order: Vec<String>,
    fingerprint: String,
    snapshot: PlanSnapshot,
}

fn explain_plan(
    path: &Path,
    walker: Option<WalkerKind>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let built = load(path, OptimizerConfig::from_env())?;
    let walker_kind = walker.unwrap_or(built.walker);
    let walker = walker_kind.walker();

    if json {
        let order = walker
            .walk(&built.plan)?
            .iter()
            .filter_map(|k| built.plan.operator(k))
            .map(|op| op.name().to_string())
            .collect();
        let out = ExplainJson {
            walker: walker_kind,
            order,
            fingerprint: built.plan.fingerprint()?,
            snapshot: built.plan.snapshot(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let mut printer = PlanPrinter::new();
    visit(&built.plan, walker.as_ref(), &mut printer)?;

    println!("Plan ({walker_kind} order)");
    println!("======================");
    print!("{}", printer.into_string());
    println!();
    println!("Operators: {}", built.plan.len());
    println!("Edges: {}", built.plan.edge_count());
    println!("Roots: {}", names(&built, &built.plan.roots()));
    println!("Leaves: {}", names(&built, &built.plan.leaves()));
    println!("Fingerprint: {}", built.plan.fingerprint()?);
    Ok(())
}

fn names(built: &BuiltDocument, keys: &[OperatorKey]) -> String {
    keys.iter()
        .filter_map(|k| built.plan.operator(k))
        .map(|op| op.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn optimize_plan(
    path: &Path,
    max_passes: Option<usize>,
    trace: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let built = load(path, OptimizerConfig::from_env())?;
    let config = apply_cli_overrides(built.config.clone(), max_passes, trace);
    let mut optimizer = BuiltDocument { config, ..built }.into_optimizer();

    let report = optimizer.optimize_until_stable()?;

    println!("✓ Optimized");
    print!("{}", report.format_trace());
    println!("Result: {}", optimizer.plan());
    Ok(())
}

/// CLI flags win over the document and the environment.
fn apply_cli_overrides(
    mut cfg: OptimizerConfig,
    max_passes: Option<usize>,
    trace: bool,
) -> OptimizerConfig {
    if let Some(n) = max_passes {
        cfg.max_passes = n;
    }
    if trace {
        cfg.trace_rewrites = true;
    }
    cfg
}

#[cfg(test)]
mod tests {
    use super::apply_cli_overrides;
    use plangraph_core::config::OptimizerConfig;
    use plangraph_rewrite::dsl::yaml::DocConfig;

    #[test]
    fn document_config_overrides_env_defaults() {
        let env = OptimizerConfig::default();
        let doc = DocConfig {
            max_passes: Some(3),
            trace_rewrites: Some(true),
        };
        let cfg = doc.apply(env);
        assert_eq!(cfg.max_passes, 3);
        assert!(cfg.trace_rewrites);
    }

    #[test]
    fn cli_overrides_higher_priority_than_document() {
        let doc = DocConfig {
            max_passes: Some(3),
            trace_rewrites: None,
        };
        let cfg = apply_cli_overrides(doc.apply(OptimizerConfig::default()), Some(7), true);
        assert_eq!(cfg.max_passes, 7);
        assert!(cfg.trace_rewrites);

        let untouched = apply_cli_overrides(doc.apply(OptimizerConfig::default()), None, false);
        assert_eq!(untouched.max_passes, 3);
        assert!(!untouched.trace_rewrites);
    }
}
