//! Actions: the only way the solve state changes.
//!
//! Each [`Action`] is a value (hashable, so a history node can remember which
//! children it already tried) that knows how to apply itself to a [`State`].
//! Applying records an [`Undo`] next to the new history node; reverting pops
//! that node and replays the undo record, restoring the equation, the
//! substitution and the symbol table exactly.
//!
//! Applying is refused, without touching the state, when:
//! - the action has nothing to rewrite or would be a no-op,
//! - it was already tried from the current node,
//! - it guesses a boundary letter the negative substitution rules out,
//! - its result is an equation the search already reached (recorded as ignored).
//!
//! # Example
//! ```
//! use wordeq::actions::{Action, ReplaceVariables};
//! use wordeq::equation::Boundary;
//! use wordeq::parser::ParsedEquation;
//! use wordeq::solver::SolverConfig;
//! use wordeq::state::State;
//!
//! let parsed: ParsedEquation = "{A, B}, {x}, Ax = AB".parse()?;
//! let mut state = State::new(parsed.equation.clone(), &SolverConfig::default());
//! let x = parsed.variables[0].clone();
//! let b = wordeq::symbol::Symbol::letter("B");
//!
//! let peel = Action::ReplaceVariables(ReplaceVariables::peel(&x, Boundary::Left, vec![b]));
//! assert!(peel.apply(&mut state));
//! assert_eq!(state.equation().render(), "ABx = AB");
//! assert!(peel.revert(&mut state));
//! assert_eq!(state.equation(), &parsed.equation);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::equation::{Boundary, Equation, Rewrite};
use crate::sigma::{letter_items, SigmaItem};
use crate::state::State;
use crate::symbol::{PowerIndex, Symbol};
use log::debug;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

/// Compress fixed constant sequences into single generated symbols.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReplaceConstants {
    patterns: Vec<Vec<Symbol>>,
}

impl ReplaceConstants {
    #[must_use]
    pub fn new(patterns: Vec<Vec<Symbol>>) -> Self {
        Self { patterns }
    }

    /// `ab → c`
    #[must_use]
    pub fn pair(a: Symbol, b: Symbol) -> Self {
        Self::new(vec![vec![a, b]])
    }

    /// `a^k → c`, matching maximal runs only.
    #[must_use]
    pub fn block(a: Symbol, k: usize) -> Self {
        Self::new(vec![vec![a; k]])
    }

    #[must_use]
    pub fn patterns(&self) -> &[Vec<Symbol>] {
        &self.patterns
    }
}

/// What a variable gives up at one boundary.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Peel {
    /// Concrete constants, in reading order.
    Letters(Vec<Symbol>),
    /// A run `base^(p+1)` of unknown length.
    Block(Symbol),
}

impl Peel {
    fn is_valid(&self) -> bool {
        match self {
            Peel::Letters(letters) => !letters.is_empty() && letters.iter().all(Symbol::is_constant),
            Peel::Block(base) => base.is_constant(),
        }
    }

    /// The guessed constant adjacent to the rest of the variable.
    fn guessed(&self, boundary: Boundary) -> Option<&Symbol> {
        match (self, boundary) {
            (Peel::Letters(letters), Boundary::Left) => letters.first(),
            (Peel::Letters(letters), Boundary::Right) => letters.last(),
            (Peel::Block(_), _) => None,
        }
    }
}

impl fmt::Display for Peel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Peel::Letters(letters) => letters.iter().try_for_each(|l| write!(f, "{l}")),
            Peel::Block(base) => write!(f, "{base}^+"),
        }
    }
}

/// `x → L·x·R` on every occurrence of `x`; with `keep` off, `x → L·R`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReplaceVariables {
    var: Rc<str>,
    left: Option<Peel>,
    right: Option<Peel>,
    keep: bool,
}

impl ReplaceVariables {
    #[must_use]
    pub fn new(var: &Rc<str>, left: Option<Peel>, right: Option<Peel>, keep: bool) -> Self {
        Self { var: Rc::clone(var), left, right, keep }
    }

    /// `x → ε`
    #[must_use]
    pub fn erase(var: &Rc<str>) -> Self {
        Self::new(var, None, None, false)
    }

    /// `x → L·x` or `x → x·R`
    #[must_use]
    pub fn peel(var: &Rc<str>, boundary: Boundary, letters: Vec<Symbol>) -> Self {
        Self::at(var, boundary, Peel::Letters(letters))
    }

    /// `x → a^(p+1)·x` or `x → x·a^(p+1)` with a fresh power `p`
    #[must_use]
    pub fn pop_block(var: &Rc<str>, boundary: Boundary, base: Symbol) -> Self {
        Self::at(var, boundary, Peel::Block(base))
    }

    fn at(var: &Rc<str>, boundary: Boundary, peel: Peel) -> Self {
        match boundary {
            Boundary::Left => Self::new(var, Some(peel), None, true),
            Boundary::Right => Self::new(var, None, Some(peel), true),
        }
    }

    #[must_use]
    pub fn var(&self) -> &Rc<str> {
        &self.var
    }

    #[must_use]
    pub fn is_erase(&self) -> bool {
        !self.keep && self.left.is_none() && self.right.is_none()
    }

    fn peels(&self) -> [(Boundary, Option<&Peel>); 2] {
        [(Boundary::Left, self.left.as_ref()), (Boundary::Right, self.right.as_ref())]
    }
}

/// Fix a block marker's symbolic power to a concrete value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssignPower {
    index: PowerIndex,
    value: usize,
}

impl AssignPower {
    #[must_use]
    pub fn new(index: PowerIndex, value: usize) -> Self {
        Self { index, value }
    }
}

/// Drop a common prefix and suffix from both sides.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Crop {
    prefix: Vec<Symbol>,
    suffix: Vec<Symbol>,
}

impl Crop {
    #[must_use]
    pub fn new(prefix: Vec<Symbol>, suffix: Vec<Symbol>) -> Self {
        Self { prefix, suffix }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    ReplaceConstants(ReplaceConstants),
    ReplaceVariables(ReplaceVariables),
    AssignPower(AssignPower),
    Crop(Crop),
    /// Remove every remaining variable and resolve block markers to `base^offset`.
    DropVariablesAndBlocks,
}

/// Why [`Action::try_apply`] did or did not change the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    NotApplicable,
    AlreadyTried,
    Excluded,
    Known,
}

impl ApplyOutcome {
    #[must_use]
    pub fn is_applied(self) -> bool {
        self == ApplyOutcome::Applied
    }
}

/// Everything needed to take one applied action back.
#[derive(Debug)]
pub struct Undo {
    rewrites: Vec<Rewrite>,
    effects: Effects,
}

#[derive(Debug)]
enum Effects {
    Constants {
        created: Vec<Symbol>,
        had_block: bool,
    },
    Variables {
        markers: Vec<Symbol>,
        left_items: usize,
        right_items: usize,
        negative: Vec<(Boundary, Option<Symbol>)>,
        newly_empty: bool,
    },
    Power {
        previous: Option<usize>,
    },
    Crop,
    Drop {
        newly_empty: Vec<Rc<str>>,
    },
}

impl Undo {
    #[cfg(test)]
    pub(crate) fn for_test() -> Self {
        Undo { rewrites: Vec::new(), effects: Effects::Crop }
    }

    /// Give back symbols minted while planning an action that is not committed.
    fn rollback(&self, state: &mut State) {
        match &self.effects {
            Effects::Constants { created, .. } => {
                for symbol in created.iter().rev() {
                    state.factory.remove(symbol);
                }
            }
            Effects::Variables { markers, .. } => {
                for marker in markers.iter().rev() {
                    state.factory.release_block_marker(marker);
                }
            }
            _ => {}
        }
    }

    /// Restore `state` to before `action`; `false` on an inconsistency.
    pub(crate) fn revert(self, action: &Action, state: &mut State) -> bool {
        for rewrite in self.rewrites.iter().rev() {
            state.equation.undo(rewrite);
        }
        match (self.effects, action) {
            (Effects::Constants { created, had_block }, Action::ReplaceConstants(_)) => {
                for symbol in created.iter().rev() {
                    if !state.factory.remove(symbol) {
                        return false;
                    }
                }
                if had_block {
                    state.negative_sigma.clear();
                }
            }
            (
                Effects::Variables { markers, left_items, right_items, negative, newly_empty },
                Action::ReplaceVariables(rv),
            ) => {
                state.sigma.pop(&rv.var, Boundary::Right, right_items);
                state.sigma.pop(&rv.var, Boundary::Left, left_items);
                for marker in markers.iter().rev() {
                    if !state.factory.release_block_marker(marker) {
                        return false;
                    }
                }
                if state.neg_rest {
                    for (boundary, previous) in negative.into_iter().rev() {
                        state.negative_sigma.set(&rv.var, boundary, previous);
                    }
                    if rv.keep {
                        for (boundary, peel) in rv.peels() {
                            if let Some(guessed) = peel.and_then(|p| p.guessed(boundary)) {
                                state.negative_sigma.set(&rv.var, boundary, Some(guessed.clone()));
                            }
                        }
                    }
                }
                if newly_empty {
                    state.empty_variables.shift_remove(&rv.var);
                }
            }
            (Effects::Power { previous }, Action::AssignPower(assign)) => match previous {
                Some(value) => {
                    state.sigma.assign_power(assign.index, value);
                }
                None => {
                    state.sigma.unassign_power(assign.index);
                }
            },
            (Effects::Crop, Action::Crop(_)) => {}
            (Effects::Drop { newly_empty }, Action::DropVariablesAndBlocks) => {
                for var in &newly_empty {
                    state.empty_variables.shift_remove(var);
                }
            }
            _ => return false,
        }
        true
    }
}

impl Action {
    /// Apply to `state`; `true` if the state changed.
    pub fn apply(&self, state: &mut State) -> bool {
        self.try_apply(state).is_applied()
    }

    /// Revert this action, which must be the most recent one still applied.
    pub fn revert(&self, state: &mut State) -> bool {
        let current = state.history.current();
        if state.history.node(current).action() != Some(self) {
            return false;
        }
        state.revert_last().is_some()
    }

    /// Branch points: the actions backtracking stops at.
    #[must_use]
    pub fn is_branch(&self) -> bool {
        matches!(self, Action::ReplaceVariables(_) | Action::AssignPower(_))
    }

    pub fn try_apply(&self, state: &mut State) -> ApplyOutcome {
        if state.history.is_tried(self) {
            return ApplyOutcome::AlreadyTried;
        }
        if self.is_excluded(state) {
            state.neg_rest_rejections += 1;
            debug!("{self}: excluded by negative substitution");
            return ApplyOutcome::Excluded;
        }

        let mut next = state.equation.clone();
        let Some(mut undo) = self.plan(&mut next, state) else {
            return ApplyOutcome::NotApplicable;
        };

        let weight = state.sigma.weight() + self.weight_gain(state);
        if !matches!(self, Action::DropVariablesAndBlocks) && state.history.is_known(&next, weight) {
            undo.rollback(state);
            debug!("{self}: ignored, {next} already reached");
            state.history.record_ignored(self.clone(), &next);
            return ApplyOutcome::Known;
        }

        self.commit(state, &mut undo);
        state.equation = next;
        debug!("{self}: {}", state.equation);
        state.history.record_applied(self.clone(), undo, &state.equation, weight);
        ApplyOutcome::Applied
    }

    /// Letters this action adds to the substitution.
    fn weight_gain(&self, state: &State) -> usize {
        match self {
            Action::ReplaceVariables(rv) => rv
                .peels()
                .into_iter()
                .filter_map(|(_, peel)| peel)
                .map(|peel| match peel {
                    Peel::Letters(letters) => letters.iter().map(|l| l.letters().len()).sum::<usize>(),
                    Peel::Block(base) => base.letters().len(),
                })
                .sum(),
            Action::AssignPower(assign) => assign.value * state.sigma.power_weight(assign.index),
            _ => 0,
        }
    }

    fn is_excluded(&self, state: &State) -> bool {
        let Action::ReplaceVariables(rv) = self else {
            return false;
        };
        state.neg_rest
            && rv.keep
            && rv.peels().into_iter().any(|(boundary, peel)| {
                peel.and_then(|p| p.guessed(boundary))
                    .is_some_and(|letter| state.negative_sigma.excludes(&rv.var, boundary, letter))
            })
    }

    /// Rewrite `next`, minting any symbols the rewrite needs.
    fn plan(&self, next: &mut Equation, state: &mut State) -> Option<Undo> {
        match self {
            Action::ReplaceConstants(rc) => plan_constants(rc, next, state),
            Action::ReplaceVariables(rv) => plan_variables(rv, next, state),
            Action::AssignPower(assign) => plan_power(assign, next, state),
            Action::Crop(crop) => plan_crop(crop, next),
            Action::DropVariablesAndBlocks => plan_drop(next),
        }
    }

    /// Update everything but the equation for an action about to be recorded.
    fn commit(&self, state: &mut State, undo: &mut Undo) {
        match (self, &mut undo.effects) {
            (
                Action::ReplaceVariables(rv),
                Effects::Variables { markers, left_items, right_items, negative, newly_empty },
            ) => {
                let mut markers = markers.iter();
                for (boundary, peel) in rv.peels() {
                    let items = match peel {
                        None => Vec::new(),
                        Some(Peel::Letters(letters)) => letter_items(letters),
                        Some(Peel::Block(base)) => {
                            let index = markers.next().and_then(Symbol::as_block).map_or(0, |b| b.powers()[0]);
                            vec![SigmaItem::Power { index, base: base.letters(), offset: 1 }]
                        }
                    };
                    match boundary {
                        Boundary::Left => *left_items = items.len(),
                        Boundary::Right => *right_items = items.len(),
                    }
                    state.sigma.append(&rv.var, boundary, items);

                    if state.neg_rest && (peel.is_some() || !rv.keep) {
                        let excluded = match peel {
                            Some(Peel::Block(base)) => Some(base.clone()),
                            _ => None,
                        };
                        negative.push((boundary, state.negative_sigma.set(&rv.var, boundary, excluded)));
                    }
                }
                if !rv.keep {
                    *newly_empty = state.empty_variables.insert(Rc::clone(&rv.var));
                }
            }
            (Action::AssignPower(assign), Effects::Power { previous }) => {
                *previous = state.sigma.assign_power(assign.index, assign.value);
            }
            (Action::DropVariablesAndBlocks, Effects::Drop { newly_empty }) => {
                for var in state.equation.variables().iter().filter_map(Symbol::variable_name) {
                    if state.empty_variables.insert(Rc::clone(var)) {
                        newly_empty.push(Rc::clone(var));
                    }
                }
            }
            _ => {}
        }
    }
}

/// Non-overlapping left-to-right matches of `pattern`; a block pattern only matches maximal runs.
fn occurrences(symbols: &[Symbol], pattern: &[Symbol]) -> Vec<Range<usize>> {
    let n = pattern.len();
    let is_block = pattern.iter().all(|s| *s == pattern[0]);
    let mut found = Vec::new();
    let mut i = 0;
    while i + n <= symbols.len() {
        let matches = symbols[i..i + n] == *pattern
            && (!is_block || ((i == 0 || symbols[i - 1] != pattern[0]) && symbols.get(i + n) != Some(&pattern[0])));
        if matches {
            found.push(i..i + n);
            i += n;
        } else {
            i += 1;
        }
    }
    found
}

fn plan_constants(rc: &ReplaceConstants, next: &mut Equation, state: &mut State) -> Option<Undo> {
    let mut rewrites = Vec::new();
    let mut created = Vec::new();
    let mut had_block = false;
    for pattern in &rc.patterns {
        if pattern.len() < 2 || !pattern.iter().all(Symbol::is_constant) {
            continue;
        }
        if occurrences(next.lhs().symbols(), pattern).is_empty()
            && occurrences(next.rhs().symbols(), pattern).is_empty()
        {
            continue;
        }
        let (symbol, is_new) = state.factory.intern_or_create(pattern);
        if is_new {
            created.push(symbol.clone());
        }
        had_block |= pattern.iter().all(|s| *s == pattern[0]);
        rewrites.push(next.rewrite(|side| {
            occurrences(side, pattern).into_iter().map(|range| (range, vec![symbol.clone()])).collect()
        }));
    }
    if rewrites.is_empty() {
        return None;
    }
    Some(Undo { rewrites, effects: Effects::Constants { created, had_block } })
}

fn plan_variables(rv: &ReplaceVariables, next: &mut Equation, state: &mut State) -> Option<Undo> {
    let occurrence = Symbol::Variable(Rc::clone(&rv.var));
    if !next.symbols().any(|s| *s == occurrence) {
        return None;
    }
    if rv.keep && rv.left.is_none() && rv.right.is_none() {
        return None;
    }
    if rv.peels().into_iter().any(|(_, peel)| peel.is_some_and(|p| !p.is_valid())) {
        return None;
    }

    let mut markers = Vec::new();
    let mut expand = |peel: Option<&Peel>| -> Vec<Symbol> {
        match peel {
            None => Vec::new(),
            Some(Peel::Letters(letters)) => letters.clone(),
            Some(Peel::Block(base)) => {
                let marker = state.factory.generate_block_marker(base, 1);
                markers.push(marker.clone());
                vec![marker]
            }
        }
    };
    let mut replacement = expand(rv.left.as_ref());
    if rv.keep {
        replacement.push(occurrence.clone());
    }
    replacement.extend(expand(rv.right.as_ref()));

    let rewrite = next.rewrite(|side| {
        side.iter()
            .enumerate()
            .filter(|(_, s)| **s == occurrence)
            .map(|(i, _)| (i..i + 1, replacement.clone()))
            .collect()
    });
    Some(Undo {
        rewrites: vec![rewrite],
        effects: Effects::Variables {
            markers,
            left_items: 0,
            right_items: 0,
            negative: Vec::new(),
            newly_empty: false,
        },
    })
}

fn plan_power(assign: &AssignPower, next: &mut Equation, state: &State) -> Option<Undo> {
    if state.sigma.power(assign.index).is_some() {
        return None;
    }
    let carries = |s: &Symbol| s.as_block().is_some_and(|b| b.powers().contains(&assign.index));
    if !next.symbols().any(carries) {
        return None;
    }
    let rewrite = next.rewrite(|side| {
        side.iter()
            .enumerate()
            .filter_map(|(i, s)| {
                let block = s.as_block().filter(|b| b.powers().contains(&assign.index))?;
                let replacement = match block.assign(assign.index, assign.value) {
                    Some(rest) => vec![Symbol::Block(Rc::new(rest))],
                    None => vec![block.base().clone(); block.offset() + assign.value],
                };
                Some((i..i + 1, replacement))
            })
            .collect()
    });
    Some(Undo { rewrites: vec![rewrite], effects: Effects::Power { previous: None } })
}

fn plan_crop(crop: &Crop, next: &mut Equation) -> Option<Undo> {
    let (p, s) = (crop.prefix.len(), crop.suffix.len());
    if p == 0 && s == 0 {
        return None;
    }
    let fits = |side: &[Symbol]| side.len() >= p + s && side.starts_with(&crop.prefix) && side.ends_with(&crop.suffix);
    if !fits(next.lhs().symbols()) || !fits(next.rhs().symbols()) {
        return None;
    }
    let rewrite = next.rewrite(|side| {
        let mut edits = Vec::new();
        if p > 0 {
            edits.push((0..p, Vec::new()));
        }
        if s > 0 {
            edits.push((side.len() - s..side.len(), Vec::new()));
        }
        edits
    });
    Some(Undo { rewrites: vec![rewrite], effects: Effects::Crop })
}

fn plan_drop(next: &mut Equation) -> Option<Undo> {
    if !next.has_unknowns() {
        return None;
    }
    let rewrite = next.rewrite(|side| {
        side.iter()
            .enumerate()
            .filter_map(|(i, s)| match s {
                Symbol::Variable(_) => Some((i..i + 1, Vec::new())),
                Symbol::Block(block) => Some((i..i + 1, vec![block.base().clone(); block.offset()])),
                _ => None,
            })
            .collect()
    });
    Some(Undo { rewrites: vec![rewrite], effects: Effects::Drop { newly_empty: Vec::new() } })
}

fn write_symbols(f: &mut fmt::Formatter<'_>, symbols: &[Symbol]) -> fmt::Result {
    if symbols.is_empty() {
        return write!(f, "ε");
    }
    symbols.iter().try_for_each(|s| write!(f, "{s}"))
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::ReplaceConstants(rc) => {
                write!(f, "compress ")?;
                for (i, pattern) in rc.patterns.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_symbols(f, pattern)?;
                }
                Ok(())
            }
            Action::ReplaceVariables(rv) => {
                write!(f, "{} → ", rv.var)?;
                if rv.is_erase() {
                    return write!(f, "ε");
                }
                if let Some(left) = &rv.left {
                    write!(f, "{left}")?;
                }
                if rv.keep {
                    write!(f, "{}", rv.var)?;
                }
                if let Some(right) = &rv.right {
                    write!(f, "{right}")?;
                }
                Ok(())
            }
            Action::AssignPower(assign) => write!(f, "p{} := {}", assign.index, assign.value),
            Action::Crop(crop) => {
                write!(f, "crop ")?;
                write_symbols(f, &crop.prefix)?;
                write!(f, "|")?;
                write_symbols(f, &crop.suffix)
            }
            Action::DropVariablesAndBlocks => write!(f, "drop unknowns"),
        }
    }
}
