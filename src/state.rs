//! The single mutable state of one solve attempt.

use crate::actions::Action;
use crate::equation::Equation;
use crate::history::History;
use crate::interner::SymbolFactory;
use crate::sigma::{NegativeSigma, Sigma, Solution};
use crate::solver::SolverConfig;
use indexmap::IndexSet;
use log::debug;
use std::rc::Rc;

/// Current equation plus everything needed to explain and undo how it was reached.
///
/// Only [`Action`]s mutate a `State`.
#[derive(Debug)]
pub struct State {
    pub(crate) equation: Equation,
    pub(crate) sigma: Sigma,
    pub(crate) negative_sigma: NegativeSigma,
    pub(crate) factory: SymbolFactory,
    pub(crate) empty_variables: IndexSet<Rc<str>>,
    pub(crate) history: History,
    pub(crate) neg_rest: bool,
    pub(crate) neg_rest_rejections: usize,
}

impl State {
    #[must_use]
    pub fn new(equation: Equation, config: &SolverConfig) -> Self {
        let mut history = History::new(equation.clone(), config.store_history, config.store_equations);
        if config.full_traversal {
            history.revisit_when_cheaper();
        }
        Self {
            history,
            equation,
            sigma: Sigma::new(),
            negative_sigma: NegativeSigma::default(),
            factory: SymbolFactory::new(),
            empty_variables: IndexSet::new(),
            neg_rest: config.heur_ext_neg_rest,
            neg_rest_rejections: 0,
        }
    }

    #[must_use]
    pub fn equation(&self) -> &Equation {
        &self.equation
    }

    #[must_use]
    pub fn sigma(&self) -> &Sigma {
        &self.sigma
    }

    #[must_use]
    pub fn negative_sigma(&self) -> &NegativeSigma {
        &self.negative_sigma
    }

    #[must_use]
    pub fn factory(&self) -> &SymbolFactory {
        &self.factory
    }

    /// Variables already forced to the empty word.
    #[must_use]
    pub fn empty_variables(&self) -> &IndexSet<Rc<str>> {
        &self.empty_variables
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Guesses refused because the negative substitution ruled them out.
    #[must_use]
    pub fn neg_rest_rejections(&self) -> usize {
        self.neg_rest_rejections
    }

    #[must_use]
    pub fn materialize(&self, variables: &[Rc<str>]) -> Solution {
        self.sigma.materialize(variables)
    }

    /// Undo the most recent action; `None` at the root or without stored history.
    ///
    /// # Panics
    /// If the undo record no longer matches the state.
    pub fn revert_last(&mut self) -> Option<Action> {
        let (action, undo) = self.history.pop()?;
        if !undo.revert(&action, self) {
            panic!("internal inconsistency: could not revert {action}");
        }
        debug_assert_eq!(&self.equation, self.history.current_equation(), "revert of {action} diverged");
        debug!("revert {action}: {}", self.equation);
        Some(action)
    }

    /// Undo actions until a branch point has been undone; `false` if none was left.
    pub fn revert_to_branch(&mut self) -> bool {
        while let Some(action) = self.revert_last() {
            if action.is_branch() {
                return true;
            }
        }
        false
    }

    pub(crate) fn into_history(self) -> History {
        self.history
    }
}
