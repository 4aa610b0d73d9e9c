//! The search controller.
//!
//! # Error Handling
//!
//! The solver uses [`SolverError`] with two variants:
//!
//! - S001: `ParseFailure` (Equation parsing failed (wraps [`ParseError`]))
//! - S002: `InvalidConfig` (Solver configuration is unusable)
//!
//! Failing to find a solution is not an error: it is reported through
//! [`SolutionState::NotFound`] on an otherwise successful [`SolveResult`].
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```
//! use wordeq::solver::{self, SolverConfig};
//!
//! let result = solver::solve_equation("{A, B}, {x}, Ax = AB", &SolverConfig::default())?;
//! assert!(result.state.is_found());
//! assert_eq!(result.solution.unwrap().get("x").as_deref(), Some("B"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Handling Errors with Detailed Messages
//!
//! ```
//! use wordeq::solver::{self, SolverConfig};
//!
//! match solver::solve_equation("{A}, {x}, x", &SolverConfig::default()) {
//!     Ok(result) => println!("{}", result.state),
//!     Err(e) => {
//!         // Error code: S001, caused by E004
//!         eprintln!("{}", e.display_detailed());
//!     }
//! }
//! ```
//!
//! ## Checking the Outcome
//!
//! ```
//! use wordeq::solver::{self, NotFound, SolutionState, SolverConfig};
//!
//! let result = solver::solve_equation("{A}, {x}, x = Ax", &SolverConfig::default())?;
//! match result.state {
//!     SolutionState::Found(kind) => println!("found ({kind:?})"),
//!     SolutionState::NotFound(NotFound::NoSolution) => println!("no solution exists"),
//!     SolutionState::NotFound(reason) => println!("gave up: {reason:?}"),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::actions::Action;
use crate::equation::Equation;
use crate::errors::ParseError;
use crate::heuristics::{self, Check};
use crate::history::History;
use crate::parser::ParsedEquation;
use crate::sigma::Solution;
use crate::state::State;
use instant::Instant;
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Iteration budget used when none is given.
///
/// Every reached equation stays in memory, and on equations that grow with
/// each guess that footprint is quadratic in the number of iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 2_000;

/// Whether (and how) the search graph is handed back with the result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryExport {
    pub enabled: bool,
    /// Also draw actions that led to an already known equation.
    pub include_ignored: bool,
}

impl Default for HistoryExport {
    fn default() -> Self {
        Self { enabled: false, include_ignored: true }
    }
}

/// Switches for one solve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    /// Backtrack out of dead ends. Without it the first dead end after a guess ends the search.
    pub allow_revert: bool,
    /// Offer `x → a^+·x` block guesses during crossing compression.
    pub allow_block_comp_cr: bool,
    /// Keep the search graph. Backtracking needs it.
    pub store_history: bool,
    /// Remember every reached equation and refuse to reach one twice.
    pub store_equations: bool,
    /// Refuse to guess a letter that was ruled out for the same variable end.
    pub heur_ext_neg_rest: bool,
    /// Keep searching after a solution for a shorter one.
    pub full_traversal: bool,
    pub max_iterations_count: usize,
    pub history_export: HistoryExport,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            allow_revert: true,
            allow_block_comp_cr: false,
            store_history: true,
            store_equations: true,
            heur_ext_neg_rest: false,
            full_traversal: false,
            max_iterations_count: DEFAULT_MAX_ITERATIONS,
            history_export: HistoryExport::default(),
        }
    }
}

impl SolverConfig {
    /// Reject settings that cannot run.
    pub fn validate(&self) -> Result<(), SolverError> {
        if self.max_iterations_count == 0 {
            return Err(SolverError::InvalidConfig { reason: "max_iterations_count must be at least 1".to_string() });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Found {
    /// No shorter substitution exists (empty, or proven by full traversal).
    Minimal,
    Arbitrary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum NotFound {
    /// The whole search space was exhausted.
    NoSolution,
    NotEnoughIterations,
    /// A dead end needed backtracking but no history was kept.
    HistoryNotStored,
    RevertNotAllowed,
    /// Exhausted, but the negative-substitution filter pruned guesses along the way.
    HeurExtNegRestDamage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SolutionState {
    Found(Found),
    NotFound(NotFound),
}

impl SolutionState {
    #[must_use]
    pub fn is_found(self) -> bool {
        matches!(self, SolutionState::Found(_))
    }
}

impl fmt::Display for SolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionState::Found(kind) => write!(f, "Found.{kind:?}"),
            SolutionState::NotFound(reason) => write!(f, "NotFound.{reason:?}"),
        }
    }
}

/// Outcome of a finished solve.
#[derive(Debug)]
pub struct SolveResult {
    pub state: SolutionState,
    /// Values for every declared variable, when a solution was found.
    pub solution: Option<Solution>,
    pub iterations: usize,
    pub elapsed: Duration,
    /// The search graph, when export was requested and history was stored.
    pub history: Option<History>,
    include_ignored: bool,
}

impl SolveResult {
    /// The exported search graph in DOT format.
    #[must_use]
    pub fn to_dot(&self) -> Option<String> {
        self.history.as_ref().map(|history| history.to_dot(self.include_ignored))
    }
}

/// Errors that prevent a solve from starting.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// The textual equation could not be parsed.
    #[error("parse failure: {0}")]
    ParseFailure(#[from] Box<ParseError>),

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl SolverError {
    /// Returns the error code for this error variant
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            SolverError::ParseFailure(_) => "S001",
            SolverError::InvalidConfig { .. } => "S002",
        }
    }

    /// Returns a short description of this error type (for documentation)
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            SolverError::ParseFailure(_) => "Equation parsing failed",
            SolverError::InvalidConfig { .. } => "Solver configuration is unusable",
        }
    }

    /// Returns detailed explanation of this error type (for documentation)
    #[must_use]
    pub fn details(&self) -> &'static str {
        match self {
            SolverError::ParseFailure(_) => {
                "The input equation could not be parsed. \
                 This wraps an underlying ParseError (see Parse Errors section for specific error codes)."
            }
            SolverError::InvalidConfig { .. } => {
                "A setting makes the search impossible to run, such as an iteration budget of zero."
            }
        }
    }

    /// Returns a helpful suggestion for this error
    #[must_use]
    pub fn help(&self) -> Option<&'static str> {
        match self {
            SolverError::InvalidConfig { .. } => {
                Some("Use an iteration budget of at least 1 (the default is 2000).")
            }
            SolverError::ParseFailure(_) => None, // ParseError has its own help
        }
    }

    /// Formats the error with code and optional help text
    #[must_use]
    pub fn display_detailed(&self) -> String {
        match self {
            SolverError::ParseFailure(pe) => {
                format!("{}\n  caused by: {}", self.code(), pe.display_detailed())
            }
            SolverError::InvalidConfig { .. } => {
                crate::errors::format_error_with_code_and_help(&self.to_string(), self.code(), self.help())
            }
        }
    }
}

/// Where one iteration left the search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Searching,
    Solved,
    Contradicted,
    ExhaustedIterations,
    /// No heuristic could do anything.
    Stuck,
}

fn settled(check: Check) -> Option<Phase> {
    match check {
        Check::Continue => None,
        Check::Solved => Some(Phase::Solved),
        Check::DeadEnd => Some(Phase::Contradicted),
    }
}

type Outcome = (SolutionState, Option<Solution>);

/// One solve in progress.
#[derive(Debug)]
pub struct Solver {
    state: State,
    config: SolverConfig,
    original: Equation,
    variables: Vec<Rc<str>>,
    iterations: usize,
    /// Set after backtracking: the next iteration continues with the remaining guesses.
    resume_branching: bool,
    best: Option<Solution>,
}

impl Solver {
    /// `variables` are the names reported in the solution, in order.
    pub fn new(equation: Equation, variables: Vec<Rc<str>>, config: &SolverConfig) -> Result<Self, SolverError> {
        config.validate()?;
        Ok(Self {
            state: State::new(equation.clone(), config),
            config: config.clone(),
            original: equation,
            variables,
            iterations: 0,
            resume_branching: false,
            best: None,
        })
    }

    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Run one iteration of the heuristic pipeline.
    pub fn step(&mut self) -> Phase {
        if self.iterations >= self.config.max_iterations_count {
            return Phase::ExhaustedIterations;
        }
        self.iterations += 1;

        let mut progress = false;
        if !std::mem::take(&mut self.resume_branching) {
            if let Some(phase) = settled(heuristics::checkpoint(&mut self.state)) {
                return phase;
            }
            if heuristics::block_compress(&mut self.state) {
                progress = true;
                if let Some(phase) = settled(heuristics::checkpoint(&mut self.state)) {
                    return phase;
                }
            }
            let step = heuristics::non_crossing_compress(&mut self.state);
            progress |= step.progress;
            if let Some(phase) = settled(step.check) {
                return phase;
            }
        }

        let step = heuristics::crossing_compress(&mut self.state, &self.config, !progress);
        if let Some(phase) = settled(step.check) {
            return phase;
        }
        if progress || step.progress {
            Phase::Searching
        } else {
            Phase::Stuck
        }
    }

    /// Iterate until the search settles.
    #[must_use]
    pub fn run(mut self) -> SolveResult {
        let start = Instant::now();
        debug!("solving {}", self.original);
        let (state, solution) = loop {
            let outcome = match self.step() {
                Phase::Searching => None,
                Phase::Solved => self.on_solved(),
                Phase::Contradicted | Phase::Stuck => self.on_dead_end(),
                Phase::ExhaustedIterations => Some(self.out_of_iterations()),
            };
            if let Some(outcome) = outcome {
                break outcome;
            }
        };
        let elapsed = start.elapsed();
        info!("{state} after {} iterations ({elapsed:?})", self.iterations);

        let export = self.config.history_export;
        let history = (export.enabled && self.config.store_history).then(|| self.state.into_history());
        SolveResult {
            state,
            solution,
            iterations: self.iterations,
            elapsed,
            history,
            include_ignored: export.include_ignored,
        }
    }

    fn on_solved(&mut self) -> Option<Outcome> {
        Action::DropVariablesAndBlocks.apply(&mut self.state);
        self.state.history.mark_solution();
        let solution = self.state.materialize(&self.variables);
        debug_assert!(verify_solution(&self.original, &solution), "invalid solution:\n{solution}");
        debug!("solution at iteration {}:\n{solution}", self.iterations);

        if solution.total_len() == 0 {
            return Some((SolutionState::Found(Found::Minimal), Some(solution)));
        }
        if !self.config.full_traversal {
            return Some((SolutionState::Found(Found::Arbitrary), Some(solution)));
        }
        if self.best.as_ref().map_or(true, |best| solution.total_len() < best.total_len()) {
            self.best = Some(solution);
        }
        self.on_dead_end()
    }

    /// Backtrack to the last branch point, or end the search.
    fn on_dead_end(&mut self) -> Option<Outcome> {
        if self.state.history.branch_depth() > 0 {
            if !self.config.allow_revert {
                return Some(self.give_up(NotFound::RevertNotAllowed));
            }
            if !self.state.history.is_storing() {
                return Some(self.give_up(NotFound::HistoryNotStored));
            }
            if self.state.revert_to_branch() {
                self.resume_branching = true;
                return None;
            }
        }
        Some(self.exhausted())
    }

    fn give_up(&mut self, reason: NotFound) -> Outcome {
        match self.best.take() {
            Some(best) => (SolutionState::Found(Found::Arbitrary), Some(best)),
            None => (SolutionState::NotFound(reason), None),
        }
    }

    fn exhausted(&mut self) -> Outcome {
        match self.best.take() {
            Some(best) => (SolutionState::Found(Found::Minimal), Some(best)),
            None if self.state.neg_rest_rejections() > 0 => {
                (SolutionState::NotFound(NotFound::HeurExtNegRestDamage), None)
            }
            None => (SolutionState::NotFound(NotFound::NoSolution), None),
        }
    }

    fn out_of_iterations(&mut self) -> Outcome {
        warn!("iteration budget of {} exhausted", self.config.max_iterations_count);
        self.give_up(NotFound::NotEnoughIterations)
    }
}

/// Solve a parsed equation.
pub fn solve(parsed: &ParsedEquation, config: &SolverConfig) -> Result<SolveResult, SolverError> {
    let solver = Solver::new(parsed.equation.clone(), parsed.variables.clone(), config)?;
    Ok(solver.run())
}

/// Parse `input` and solve it.
pub fn solve_equation(input: &str, config: &SolverConfig) -> Result<SolveResult, SolverError> {
    config.validate()?;
    let parsed = input.parse::<ParsedEquation>()?;
    debug!("parsed: {}", parsed.equation);
    solve(&parsed, config)
}

/// Substitute `solution` into `equation` and compare the sides letter by letter.
#[must_use]
pub fn verify_solution(equation: &Equation, solution: &Solution) -> bool {
    equation.substitute(solution).is_some_and(|(lhs, rhs)| lhs == rhs)
}
