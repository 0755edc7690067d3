//! memprobe: command-line front end for the factor-graph memory
//! type-inference engine in `memprobe-core`.
//!
//! Loads a JSON fixture describing a type repository and a process state
//! (memprobe-core has no concrete implementation of either -- the real ones
//! are the minidump parser and type database this repository doesn't own),
//! runs `memprobe_core::run_analysis`, and reports the resulting marginals.

mod fixture;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use memprobe_core::{CoreError, FactorGraph, Hypothesis, HypothesisKind, InferenceOutcome};

#[derive(Parser)]
#[command(name = "memprobe", about = "Probabilistic memory type-inference engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the factor graph for a fixture and run belief propagation.
    Analyze {
        /// Path to a JSON fixture file (types, typed blocks, readable
        /// ranges, pointer values).
        #[arg(short, long)]
        fixture: PathBuf,

        /// Report format.
        #[arg(short = 'F', long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Fixture(#[from] fixture::FixtureError),
    #[error("analysis could not be started: {0}")]
    Core(#[from] CoreError),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let exit_code = match cli.command {
        Commands::Analyze { fixture, format } => run_analyze(&fixture, format),
    };
    process::exit(exit_code);
}

/// Exit codes: 0 success, 1 fixture I/O error, 2 fixture parse error,
/// 3 construction-fatal core error (`NoTypedBlockLayer`/`UnknownTypeId`).
fn run_analyze(fixture_path: &PathBuf, format: OutputFormat) -> i32 {
    match analyze(fixture_path) {
        Ok((graph, outcome)) => {
            print_report(&graph, outcome, format);
            0
        }
        Err(err @ CliError::Fixture(fixture::FixtureError::Io { .. })) => {
            eprintln!("{err}");
            1
        }
        Err(err @ CliError::Fixture(fixture::FixtureError::Parse { .. })) => {
            eprintln!("{err}");
            2
        }
        Err(err @ CliError::Core(_)) => {
            eprintln!("{err}");
            3
        }
    }
}

fn analyze(fixture_path: &PathBuf) -> Result<(FactorGraph, InferenceOutcome), CliError> {
    let fixture = fixture::load(fixture_path)?;
    let (types, process) = fixture::into_repository(fixture);
    let (graph, outcome) = memprobe_core::run_analysis(&types, &process)?;
    Ok((graph, outcome))
}

fn print_report(graph: &FactorGraph, outcome: InferenceOutcome, format: OutputFormat) {
    match format {
        OutputFormat::Human => print_human(graph, outcome),
        OutputFormat::Json => print_json(graph, outcome),
    }
}

fn print_human(graph: &FactorGraph, outcome: InferenceOutcome) {
    match outcome {
        InferenceOutcome::Converged { iterations } => {
            println!("converged after {iterations} iteration(s)");
        }
        InferenceOutcome::NotConverged => {
            println!("did not converge within {} iterations; marginals are undefined", memprobe_core::MAX_ITERATIONS);
        }
    }
    println!(
        "{} hypotheses, {} factors, {} edges",
        graph.hypothesis_count(),
        graph.factor_count(),
        graph.edge_count()
    );
    for id in graph.hypothesis_ids() {
        let h = graph.hypothesis(id);
        let marginal = h
            .marginal()
            .map(|m| format!("{m:.4}"))
            .unwrap_or_else(|| "undefined".to_string());
        match h.kind() {
            HypothesisKind::Observation => {
                println!("  {id} Observation marginal={marginal}");
            }
            _ => {
                let (range, type_id) = h.range_and_type().expect("type hypothesis has range/type");
                println!(
                    "  {id} {:?} range=[{:#x}, {:#x}) type={} marginal={marginal}",
                    h.kind(),
                    range.start,
                    range.end(),
                    type_id
                );
            }
        }
    }
}

#[derive(serde::Serialize)]
struct JsonReport {
    status: &'static str,
    iterations: Option<usize>,
    hypothesis_count: usize,
    factor_count: usize,
    edge_count: usize,
    hypotheses: Vec<JsonHypothesis>,
}

#[derive(serde::Serialize)]
struct JsonHypothesis {
    id: String,
    kind: String,
    range_start: Option<u64>,
    range_size: Option<u64>,
    type_id: Option<u64>,
    marginal: Option<f64>,
}

fn print_json(graph: &FactorGraph, outcome: InferenceOutcome) {
    let (status, iterations) = match outcome {
        InferenceOutcome::Converged { iterations } => ("converged", Some(iterations)),
        InferenceOutcome::NotConverged => ("not_converged", None),
    };
    let hypotheses = graph
        .hypothesis_ids()
        .map(|id| {
            let h = graph.hypothesis(id);
            let (range_start, range_size, type_id) = match h {
                Hypothesis::DeclaredType { range, type_id, .. }
                | Hypothesis::ContentType { range, type_id, .. } => {
                    (Some(range.start), Some(range.size), Some(type_id.0))
                }
                Hypothesis::Observation { .. } => (None, None, None),
            };
            JsonHypothesis {
                id: id.to_string(),
                kind: format!("{:?}", h.kind()),
                range_start,
                range_size,
                type_id,
                marginal: h.marginal(),
            }
        })
        .collect();

    let report = JsonReport {
        status,
        iterations,
        hypothesis_count: graph.hypothesis_count(),
        factor_count: graph.factor_count(),
        edge_count: graph.edge_count(),
        hypotheses,
    };
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to serialize report: {e}"),
    }
}
