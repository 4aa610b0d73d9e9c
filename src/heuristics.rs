//! Recompression heuristics.
//!
//! Each heuristic inspects the current equation and proposes [`Action`]s; it
//! never edits the equation itself. In order of use by the controller:
//!
//! 1. [`shorten`]: crop the longest common prefix and suffix.
//! 2. [`is_empty_solution`] / [`is_contradiction`]: decide whether the current
//!    node is solved or dead.
//! 3. [`block_compress`]: replace maximal runs `a^k` of non-crossing letters.
//! 4. [`non_crossing_compress`]: replace pairs `ab` that no variable can split.
//! 5. [`crossing_compress`]: guess the first or last letter of a variable
//!    facing a constant, so that crossing pairs become non-crossing.
//!
//! Steps 4 and 5 run [`checkpoint`] after every successful action and stop
//! as soon as the equation is solved or contradictory.
//!
//! Steps 3 and 4 are not branch points, so they only run while no two
//! unknowns stand side by side (see [`unknowns_touch`]). Otherwise a letter
//! run or pair could be split between two variables, and compressing it would
//! lose the solutions that split it.

use crate::actions::{Action, ApplyOutcome, AssignPower, Crop, ReplaceConstants, ReplaceVariables};
use crate::equation::{Boundary, Equation, EquationSide, SideId};
use crate::solver::SolverConfig;
use crate::state::State;
use crate::symbol::Symbol;
use indexmap::IndexSet;
use log::debug;
use std::collections::HashSet;

/// Verdict on the current node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Check {
    Continue,
    Solved,
    DeadEnd,
}

/// Result of a heuristic that may apply several actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub progress: bool,
    pub check: Check,
}

impl Step {
    fn idle() -> Self {
        Step { progress: false, check: Check::Continue }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShortenOutcome {
    Unchanged,
    Shortened,
    /// The cropped equation was already reached elsewhere.
    Revisit,
}

/// Lengths of the longest common prefix and (non-overlapping) suffix of both sides.
#[must_use]
pub fn common_affixes(equation: &Equation) -> (usize, usize) {
    let (u, v) = (equation.lhs().symbols(), equation.rhs().symbols());
    let prefix = u.iter().zip(v).take_while(|(a, b)| a == b).count();
    let suffix = u[prefix..]
        .iter()
        .rev()
        .zip(v[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    (prefix, suffix)
}

/// Crop common affixes until there are none left.
pub fn shorten(state: &mut State) -> ShortenOutcome {
    let mut outcome = ShortenOutcome::Unchanged;
    loop {
        let (prefix, suffix) = common_affixes(&state.equation);
        if prefix == 0 && suffix == 0 {
            return outcome;
        }
        let lhs = state.equation.lhs().symbols();
        let crop = Crop::new(lhs[..prefix].to_vec(), lhs[lhs.len() - suffix..].to_vec());
        match Action::Crop(crop).try_apply(state) {
            ApplyOutcome::Applied => outcome = ShortenOutcome::Shortened,
            ApplyOutcome::Known | ApplyOutcome::AlreadyTried => return ShortenOutcome::Revisit,
            ApplyOutcome::NotApplicable | ApplyOutcome::Excluded => return outcome,
        }
    }
}

/// Both sides agree once every variable is erased and every block marker takes its least value.
#[must_use]
pub fn is_empty_solution(equation: &Equation) -> bool {
    equation.lhs().constant_projection() == equation.rhs().constant_projection()
}

/// No substitution can make the sides equal.
#[must_use]
pub fn is_contradiction(equation: &Equation) -> bool {
    let (u, v) = (equation.lhs(), equation.rhs());
    if u.is_empty() != v.is_empty() {
        let other = if u.is_empty() { v } else { u };
        return !other.constant_projection().is_empty();
    }
    Boundary::BOTH.into_iter().any(|boundary| {
        let ends = (
            u.end(boundary).and_then(Symbol::boundary_constant),
            v.end(boundary).and_then(Symbol::boundary_constant),
        );
        matches!(ends, (Some(a), Some(b)) if a != b)
    })
}

/// Shorten, then classify the node.
pub fn checkpoint(state: &mut State) -> Check {
    if shorten(state) == ShortenOutcome::Revisit {
        debug!("revisit of a known equation");
        return Check::DeadEnd;
    }
    if is_empty_solution(&state.equation) {
        Check::Solved
    } else if is_contradiction(&state.equation) {
        debug!("contradiction: {}", state.equation);
        Check::DeadEnd
    } else {
        Check::Continue
    }
}

/// Constants classified by their neighbors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SideLetters {
    /// No occurrence has an unknown as its left neighbor.
    pub left_safe: IndexSet<Symbol>,
    /// No occurrence has an unknown as its right neighbor.
    pub right_safe: IndexSet<Symbol>,
}

#[must_use]
pub fn side_letters(equation: &Equation) -> SideLetters {
    let mut left_unsafe = HashSet::new();
    let mut right_unsafe = HashSet::new();
    let mut constants = IndexSet::new();
    for side in SideId::BOTH.map(|id| equation.side(id)) {
        let symbols = side.symbols();
        for (i, symbol) in symbols.iter().enumerate() {
            if !symbol.is_constant() {
                continue;
            }
            constants.insert(symbol.clone());
            if i > 0 && symbols[i - 1].is_unknown() {
                left_unsafe.insert(symbol.clone());
            }
            if symbols.get(i + 1).is_some_and(Symbol::is_unknown) {
                right_unsafe.insert(symbol.clone());
            }
        }
    }
    SideLetters {
        left_safe: constants.iter().filter(|c| !left_unsafe.contains(*c)).cloned().collect(),
        right_safe: constants.iter().filter(|c| !right_unsafe.contains(*c)).cloned().collect(),
    }
}

/// Whether two unknowns are adjacent on either side.
#[must_use]
pub fn unknowns_touch(equation: &Equation) -> bool {
    [equation.lhs(), equation.rhs()]
        .into_iter()
        .any(|side| side.symbols().windows(2).any(|pair| pair[0].is_unknown() && pair[1].is_unknown()))
}

/// Distinct maximal runs `(a, k)`, `k >= 2`, of letters none of whose runs touch an unknown.
///
/// A letter that is the base of a block marker never qualifies either: the
/// marker stands for more of it.
#[must_use]
pub fn maximal_blocks(equation: &Equation) -> IndexSet<(Symbol, usize)> {
    let mut crossing = HashSet::new();
    let mut blocks = IndexSet::new();
    for side in [equation.lhs(), equation.rhs()] {
        let symbols = side.symbols();
        let mut i = 0;
        while i < symbols.len() {
            let symbol = &symbols[i];
            let run = symbols[i..].iter().take_while(|s| *s == symbol).count();
            if let Some(block) = symbol.as_block() {
                crossing.insert(block.base().clone());
            }
            if symbol.is_constant() {
                let before = i.checked_sub(1).map(|j| &symbols[j]);
                let after = symbols.get(i + run);
                if before.is_some_and(Symbol::is_unknown) || after.is_some_and(Symbol::is_unknown) {
                    crossing.insert(symbol.clone());
                } else if run >= 2 {
                    blocks.insert((symbol.clone(), run));
                }
            }
            i += run;
        }
    }
    blocks.retain(|(symbol, _)| !crossing.contains(symbol));
    blocks
}

/// Compress every non-crossing block; `true` if anything changed.
pub fn block_compress(state: &mut State) -> bool {
    if unknowns_touch(&state.equation) {
        return false;
    }
    let mut progress = false;
    for (symbol, k) in maximal_blocks(&state.equation) {
        progress |= Action::ReplaceConstants(ReplaceConstants::block(symbol, k)).apply(state);
    }
    progress
}

/// Compress pairs `ab`, `a != b`, where `a` is never followed and `b` never preceded by an unknown.
pub fn non_crossing_compress(state: &mut State) -> Step {
    if unknowns_touch(&state.equation) {
        return Step::idle();
    }
    let SideLetters { left_safe, right_safe } = side_letters(&state.equation);
    let mut step = Step::idle();
    for a in &right_safe {
        for b in &left_safe {
            if a == b {
                continue;
            }
            let action = Action::ReplaceConstants(ReplaceConstants::pair(a.clone(), b.clone()));
            if action.apply(state) {
                step.progress = true;
                step.check = checkpoint(state);
                if step.check != Check::Continue {
                    return step;
                }
            }
        }
    }
    step
}

/// Alternatives at one boundary of the equation, most promising first.
#[must_use]
pub fn boundary_guesses(equation: &Equation, boundary: Boundary, allow_block: bool) -> Vec<Action> {
    for id in SideId::BOTH {
        let (this, other) = (equation.side(id), equation.side(id.other()));
        let (Some(end), Some(facing)) = (this.end(boundary), other.end(boundary)) else {
            return Vec::new();
        };
        if let (Some(var), Some(letter)) = (end.variable_name(), facing.boundary_constant()) {
            let run = if facing.is_constant() { other.run_at(boundary, letter) } else { 1 };
            let mut guesses = vec![Action::ReplaceVariables(ReplaceVariables::erase(var))];
            if allow_block && run >= 2 {
                guesses.push(Action::ReplaceVariables(ReplaceVariables::pop_block(var, boundary, letter.clone())));
            }
            guesses.push(Action::ReplaceVariables(ReplaceVariables::peel(var, boundary, vec![letter.clone()])));
            return guesses;
        }
    }
    for id in SideId::BOTH {
        let (this, other) = (equation.side(id), equation.side(id.other()));
        if let (Some(block), Some(facing)) = (this.end(boundary).and_then(Symbol::as_block), other.end(boundary)) {
            if facing.is_constant() && facing == block.base() {
                return power_guesses(block.powers()[0], block.offset(), other, boundary, facing);
            }
        }
    }
    Vec::new()
}

/// Longest alignment first: the marker absorbs as much of the facing run as it can.
fn power_guesses(
    index: u32,
    offset: usize,
    facing_side: &EquationSide,
    boundary: Boundary,
    base: &Symbol,
) -> Vec<Action> {
    let run = facing_side.run_at(boundary, base);
    let top = run.saturating_sub(offset);
    (0..=top).rev().map(|value| Action::AssignPower(AssignPower::new(index, value))).collect()
}

/// Every erase, every single-letter peel and every zero power, for when nothing else applies.
#[must_use]
pub fn exhaustive_guesses(equation: &Equation) -> Vec<Action> {
    let constants = equation.constants();
    let mut guesses = Vec::new();
    for var in equation.variables().iter().filter_map(Symbol::variable_name) {
        guesses.push(Action::ReplaceVariables(ReplaceVariables::erase(var)));
        for letter in &constants {
            for boundary in Boundary::BOTH {
                guesses.push(Action::ReplaceVariables(ReplaceVariables::peel(var, boundary, vec![letter.clone()])));
            }
        }
    }
    let powers: IndexSet<u32> = equation
        .symbols()
        .filter_map(Symbol::as_block)
        .flat_map(|block| block.powers().iter().copied())
        .collect();
    guesses.extend(powers.into_iter().map(|index| Action::AssignPower(AssignPower::new(index, 0))));
    guesses
}

/// Guess at the leading, then the trailing boundary.
///
/// With `necessary` set (nothing else made progress this iteration) and full
/// traversal enabled, falls back to [`exhaustive_guesses`].
pub fn crossing_compress(state: &mut State, config: &SolverConfig, necessary: bool) -> Step {
    let mut step = Step::idle();
    for boundary in Boundary::BOTH {
        for action in boundary_guesses(&state.equation, boundary, config.allow_block_comp_cr) {
            if action.apply(state) {
                step.progress = true;
                step.check = checkpoint(state);
                if step.check != Check::Continue {
                    return step;
                }
                break;
            }
        }
    }
    if !step.progress && necessary && config.full_traversal {
        for action in exhaustive_guesses(&state.equation) {
            if action.apply(state) {
                debug!("fallback guess {action}");
                step.progress = true;
                step.check = checkpoint(state);
                return step;
            }
        }
    }
    step
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syms(text: &str) -> Vec<Symbol> {
        text.chars()
            .map(|c| {
                let name = c.to_string();
                if c.is_uppercase() {
                    Symbol::letter(&name)
                } else {
                    Symbol::variable(&name)
                }
            })
            .collect()
    }

    fn eq(lhs: &str, rhs: &str) -> Equation {
        Equation::new(syms(lhs), syms(rhs))
    }

    fn names(set: &IndexSet<Symbol>) -> Vec<String> {
        set.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_common_affixes() {
        assert_eq!(common_affixes(&eq("ABxy", "xBAy")), (0, 1));
        assert_eq!(common_affixes(&eq("Ax", "AB")), (1, 0));
        assert_eq!(common_affixes(&eq("AA", "AAA")), (2, 0));
        assert_eq!(common_affixes(&eq("AB", "AB")), (2, 0));
    }

    #[test]
    fn test_shorten() {
        let mut state = State::new(eq("ABxy", "xBAy"), &SolverConfig::default());
        assert_eq!(shorten(&mut state), ShortenOutcome::Shortened);
        assert_eq!(state.equation(), &eq("ABx", "xBA"));
        assert_eq!(shorten(&mut state), ShortenOutcome::Unchanged);
    }

    #[test]
    fn test_empty_solution() {
        assert!(is_empty_solution(&eq("x", "y")));
        assert!(is_empty_solution(&eq("AxB", "yAB")));
        assert!(!is_empty_solution(&eq("ABx", "xBA")));
    }

    #[test]
    fn test_contradiction() {
        assert!(is_contradiction(&eq("A", "B")));
        assert!(is_contradiction(&eq("", "A")));
        assert!(is_contradiction(&eq("xA", "yB")));
        assert!(!is_contradiction(&eq("", "xy")));
        assert!(!is_contradiction(&eq("Ax", "xA")));
    }

    #[test]
    fn test_side_letters() {
        let letters = side_letters(&eq("ABx", "xBA"));
        assert_eq!(names(&letters.left_safe), ["A"]);
        assert_eq!(names(&letters.right_safe), ["A"]);

        let letters = side_letters(&eq("xA", "Bx"));
        assert_eq!(names(&letters.left_safe), ["B"]);
        assert_eq!(names(&letters.right_safe), ["A"]);
    }

    #[test]
    fn test_maximal_blocks_skip_crossing_letters() {
        let blocks = maximal_blocks(&eq("AAB", "BBBAAx"));
        let blocks: Vec<(String, usize)> = blocks.iter().map(|(s, k)| (s.to_string(), *k)).collect();
        assert_eq!(blocks, [("B".to_string(), 3)]);
    }

    #[test]
    fn test_maximal_blocks_skip_marker_bases() {
        let mut state = State::new(eq("xB", "CAAB"), &SolverConfig::default());
        let x = "x".into();
        let pop = Action::ReplaceVariables(ReplaceVariables::pop_block(&x, Boundary::Left, Symbol::letter("A")));
        assert!(pop.apply(&mut state));
        assert!(maximal_blocks(state.equation()).is_empty());
    }

    #[test]
    fn test_non_crossing_compress() {
        let mut state = State::new(eq("xABC", "ABCx"), &SolverConfig::default());
        let step = non_crossing_compress(&mut state);
        assert!(step.progress);
        assert_eq!(state.equation().render(), "x[G1]C = [G1]Cx");
    }

    #[test]
    fn test_no_compression_while_unknowns_touch() {
        assert!(unknowns_touch(&eq("AA", "xx")));
        assert!(unknowns_touch(&eq("xyA", "B")));
        assert!(!unknowns_touch(&eq("xAy", "AxBy")));

        let mut state = State::new(eq("AA", "xx"), &SolverConfig::default());
        assert!(!maximal_blocks(state.equation()).is_empty());
        assert!(!block_compress(&mut state));
        assert_eq!(state.equation(), &eq("AA", "xx"));

        let mut state = State::new(eq("ABxy", "yxAB"), &SolverConfig::default());
        assert_eq!(non_crossing_compress(&mut state), Step::idle());
        assert_eq!(state.history().depth(), 0);
    }

    #[test]
    fn test_boundary_guesses_order() {
        let guesses = boundary_guesses(&eq("xB", "AAB"), Boundary::Left, true);
        let rendered: Vec<String> = guesses.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["x → ε", "x → A^+x", "x → Ax"]);

        let guesses = boundary_guesses(&eq("xB", "AAB"), Boundary::Left, false);
        assert_eq!(guesses.len(), 2);
        assert!(boundary_guesses(&eq("AxB", "AyB"), Boundary::Left, false).is_empty());
    }

    #[test]
    fn test_crossing_compress_guesses_erase_first() {
        let mut state = State::new(eq("x", "B"), &SolverConfig::default());
        let step = crossing_compress(&mut state, &SolverConfig::default(), true);
        assert!(step.progress);
        assert_eq!(step.check, Check::DeadEnd);
        assert_eq!(state.equation().render(), "ε = B");
    }

    mod edge_cases {
        use super::*;

        #[test]
        fn test_marker_facing_its_base_gets_power_guesses() {
            let mut state = State::new(eq("xB", "AAAB"), &SolverConfig::default());
            let x = "x".into();
            let pop = Action::ReplaceVariables(ReplaceVariables::pop_block(&x, Boundary::Left, Symbol::letter("A")));
            assert!(pop.apply(&mut state));
            let guesses = boundary_guesses(state.equation(), Boundary::Left, false);
            let rendered: Vec<String> = guesses.iter().map(ToString::to_string).collect();
            assert_eq!(rendered, ["p1 := 2", "p1 := 1", "p1 := 0"]);
        }

        #[test]
        fn test_exhaustive_guesses() {
            let guesses = exhaustive_guesses(&eq("xA", "yB"));
            // per variable: erase + 2 letters * 2 boundaries
            assert_eq!(guesses.len(), 10);
            assert_eq!(guesses[0].to_string(), "x → ε");
        }

        #[test]
        fn test_checkpoint_on_trivial_equation() {
            let mut state = State::new(eq("", ""), &SolverConfig::default());
            assert_eq!(checkpoint(&mut state), Check::Solved);
        }

        #[test]
        fn test_marker_counts_as_boundary_constant() {
            let mut state = State::new(eq("xB", "CB"), &SolverConfig::default());
            let x = "x".into();
            let pop = Action::ReplaceVariables(ReplaceVariables::pop_block(&x, Boundary::Left, Symbol::letter("A")));
            assert!(pop.apply(&mut state));
            assert!(is_contradiction(state.equation()));
        }
    }
}
