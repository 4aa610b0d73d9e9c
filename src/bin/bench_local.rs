//! `bench_local.rs`: quick local timing runner (no Criterion)
//!
//! PURPOSE
//! -------
//! - Fast, ad-hoc timing for a handful of equations on *your* machine.
//! - Runs each equation several times and reports the median.
//!
//! HOW TO RUN
//! ----------
//! - Optimized build:                `cargo run --bin bench_local --release`
//! - Multiple repeats:               `cargo run --bin bench_local --release -- -r 5`
//! - Print the solutions:            `cargo run --bin bench_local --release -- -p`
//! - See all flags:                  `cargo run --bin bench_local -- --help`
//!
//! NOTES
//! -----
//! - This is *not* Criterion. It's quick and convenient, not statistically rigorous.
//! - Equations live in `get_cases()` below.
//! - One warm-up run per equation is done (not included in timing).

use clap::Parser;
use std::hint::black_box;
use wordeq::solver::{self, SolverConfig, DEFAULT_MAX_ITERATIONS};

/// Simple local benchmark runner: time several equations.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of repeats per equation (use >1 to reduce noise; median is reported)
    #[arg(short = 'r', long = "repeats", default_value_t = 1)]
    num_repeats: usize,

    /// Print the solution of each equation
    #[arg(short = 'p', long = "print")]
    print: bool,

    /// Iteration budget per solve
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Search for minimal solutions
    #[arg(long)]
    full_traversal: bool,
}

fn get_cases() -> Vec<&'static str> {
    vec![
        "{}, {x, y}, x = y",
        "{A, B}, {x}, Ax = AB",
        "{A, B}, {x, y}, ABxy = xBAy",
        "{A}, {x}, x = Ax",
        "{A, B}, {x}, xAB = ABx",
        "{A, B, C}, {x, y}, xAyB = AxBy",
        "{A, B}, {x, y}, xxAB = ABxx",
        "{A, B}, {x}, AAAxB = xAAAB",
    ]
}

/// Small helper: robust central tendency for small samples.
fn median(mut xs: Vec<f64>) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.sort_by(f64::total_cmp);
    let n = xs.len();
    if n % 2 == 1 {
        xs[n / 2]
    } else {
        0.5 * (xs[n / 2 - 1] + xs[n / 2])
    }
}

const MAX_EQUATION_LEN: usize = 36;

fn main() {
    /// One row in the summary: (equation, median seconds, outcome, iterations).
    type SummaryRow = (String, f64, String, usize);

    wordeq::log::init_logger(wordeq::log::debug_requested());
    let cli = Cli::parse();
    let config = SolverConfig {
        max_iterations_count: cli.max_iterations,
        full_traversal: cli.full_traversal,
        ..SolverConfig::default()
    };

    let cases = get_cases();
    let mut summary: Vec<SummaryRow> = Vec::with_capacity(cases.len());

    for (idx, equation) in cases.iter().enumerate() {
        eprintln!("\n[{:02}] {}", idx + 1, equation);

        if let Err(e) = solver::solve_equation(equation, &config) {
            eprintln!("  ✗ Warm-up failed: {}", e.display_detailed());
            continue;
        }

        let mut times = Vec::with_capacity(cli.num_repeats);
        let mut last = None;
        for rep in 0..cli.num_repeats {
            let result = match solver::solve_equation(black_box(equation), &config) {
                Ok(result) => result,
                Err(e) => {
                    eprintln!("  ✗ Run {}/{} failed: {e}", rep + 1, cli.num_repeats);
                    continue;
                }
            };
            let secs = result.elapsed.as_secs_f64();
            times.push(secs);
            eprintln!("  run {:>2}/{:>2}: {secs:.6}s ({})", rep + 1, cli.num_repeats, result.state);
            last = Some(result);
        }

        let med = median(times);
        let Some(result) = last else { continue };
        if cli.print {
            if let Some(solution) = &result.solution {
                println!("{solution}");
            }
        }
        eprintln!(
            "  → median {med:.6}s over {} run(s); {} {}",
            cli.num_repeats,
            result.iterations,
            pluralizer(result.iterations, "iteration".into(), None)
        );
        summary.push((equation.to_string(), med, result.state.to_string(), result.iterations));
    }

    eprintln!("\n==== Summary ====");
    eprintln!("{:<MAX_EQUATION_LEN$} | {:>10} | {:>28} | {:>10}", "equation", "median (s)", "outcome", "iterations");
    eprintln!("{:-<MAX_EQUATION_LEN$}-+-{:-<10}-+-{:-<28}-+-{:-<10}", "", "", "", "");
    for (equation, med, outcome, iterations) in &summary {
        let display = if equation.len() > MAX_EQUATION_LEN {
            format!("{}…", equation.chars().take(MAX_EQUATION_LEN - 1).collect::<String>())
        } else {
            equation.clone()
        };
        eprintln!("{display:<MAX_EQUATION_LEN$} | {med:>10.6} | {outcome:>28} | {iterations:>10}");
    }
}

fn pluralizer(count: usize, singular: String, plural: Option<String>) -> String {
    if count == 1 {
        singular
    } else {
        plural.unwrap_or_else(|| singular + "s")
    }
}
