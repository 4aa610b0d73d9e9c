use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use wordeq::solver::{self, HistoryExport, SolverConfig, DEFAULT_MAX_ITERATIONS};

/// Word equation solver based on recompression
#[derive(Parser, Debug)]
#[command(author, version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"), about, long_about = None)]
struct Cli {
    /// The equation to solve (e.g., "{A, B}, {x, y}, ABxy = xBAy")
    equation: String,

    /// Maximum number of solver iterations
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Stop at the first dead end instead of backtracking
    #[arg(long)]
    no_revert: bool,

    /// Do not keep the search graph (disables backtracking)
    #[arg(long)]
    no_history: bool,

    /// Do not remember reached equations
    #[arg(long)]
    no_equations: bool,

    /// Skip guesses already ruled out for the same variable end
    #[arg(long)]
    neg_rest: bool,

    /// Keep searching for a shorter solution after the first one
    #[arg(long)]
    full_traversal: bool,

    /// Guess whole letter blocks during crossing compression
    #[arg(long)]
    block_comp_cr: bool,

    /// Write the search graph in Graphviz DOT format to this file
    #[arg(long, value_name = "PATH")]
    dot: Option<PathBuf>,

    /// Leave ignored revisits out of the DOT output
    #[arg(long, requires = "dot")]
    no_ignored: bool,
}

impl Cli {
    fn config(&self) -> SolverConfig {
        SolverConfig {
            allow_revert: !self.no_revert,
            allow_block_comp_cr: self.block_comp_cr,
            store_history: !self.no_history,
            store_equations: !self.no_equations,
            heur_ext_neg_rest: self.neg_rest,
            full_traversal: self.full_traversal,
            max_iterations_count: self.max_iterations,
            history_export: HistoryExport { enabled: self.dot.is_some(), include_ignored: !self.no_ignored },
        }
    }
}

/// Entry point of the wordeq CLI.
///
/// Delegates to [`try_main`]. Exits with 0 when a solution was found, 1 when
/// none was (or an error occurred).
fn main() -> ExitCode {
    wordeq::log::init_logger(wordeq::log::debug_requested());

    match try_main() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            if let Some(solver_err) = e.downcast_ref::<solver::SolverError>() {
                eprintln!("Error: {}", solver_err.display_detailed());
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Core application logic.
///
/// Steps:
/// 1. Parse CLI arguments with Clap.
/// 2. Solve the equation.
/// 3. Print the solution (one `var = value` per line) on stdout.
/// 4. Print the outcome and timing on stderr, and write the DOT file if requested.
///
/// Returns whether a solution was found.
fn try_main() -> Result<bool, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let result = solver::solve_equation(&cli.equation, &cli.config())?;

    match &result.solution {
        Some(solution) => {
            for (var, letters) in solution.iter() {
                println!("{var} = {}", letters.concat());
            }
            eprintln!("✓ Solved ({})", result.state);
        }
        None => eprintln!("✗ Not solved ({})", result.state),
    }

    if let Some(path) = &cli.dot {
        match result.to_dot() {
            Some(dot) => {
                std::fs::write(path, dot)?;
                eprintln!("Search graph written to {}", path.display());
            }
            None => eprintln!("⚠️  No search graph to write (history was not stored)"),
        }
    }

    eprintln!("{} iterations in {:.3}s.", result.iterations, result.elapsed.as_secs_f64());

    Ok(result.state.is_found())
}
