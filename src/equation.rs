//! Word equations `lhs = rhs` over [`Symbol`]s.
//!
//! Equality and hashing are structural and order-sensitive, so an [`Equation`]
//! can key the search deduplication table directly.
//!
//! All in-place rewriting goes through [`Equation::rewrite`], which records
//! every replaced span as a [`Splice`] so that [`Equation::undo`] restores the
//! exact previous sequence.

use crate::sigma::Solution;
use crate::symbol::{Letter, Symbol};
use indexmap::IndexSet;
use std::fmt;
use std::fmt::Write as _;
use std::ops::Range;

/// One of the two sides of an equation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SideId {
    Lhs,
    Rhs,
}

impl SideId {
    pub const BOTH: [SideId; 2] = [SideId::Lhs, SideId::Rhs];

    #[must_use]
    pub fn other(self) -> SideId {
        match self {
            SideId::Lhs => SideId::Rhs,
            SideId::Rhs => SideId::Lhs,
        }
    }
}

/// One end of a word: where letters are peeled off a variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Boundary {
    Left,
    Right,
}

impl Boundary {
    pub const BOTH: [Boundary; 2] = [Boundary::Left, Boundary::Right];
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Boundary::Left => "left",
            Boundary::Right => "right",
        })
    }
}

/// A recorded replacement of `len` symbols at `at` (post-edit coordinates).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Splice {
    at: usize,
    len: usize,
    removed: Vec<Symbol>,
}

/// An ordered sequence of symbols.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct EquationSide(Vec<Symbol>);

impl EquationSide {
    #[must_use]
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self(symbols)
    }

    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First (left) or last (right) symbol.
    #[must_use]
    pub fn end(&self, boundary: Boundary) -> Option<&Symbol> {
        match boundary {
            Boundary::Left => self.0.first(),
            Boundary::Right => self.0.last(),
        }
    }

    /// Number of consecutive copies of `symbol` at `boundary`.
    #[must_use]
    pub fn run_at(&self, boundary: Boundary, symbol: &Symbol) -> usize {
        match boundary {
            Boundary::Left => self.0.iter().take_while(|s| *s == symbol).count(),
            Boundary::Right => self.0.iter().rev().take_while(|s| *s == symbol).count(),
        }
    }

    /// Position of the first linear match of `pattern`.
    #[must_use]
    pub fn find(&self, pattern: &[Symbol]) -> Option<usize> {
        if pattern.is_empty() || pattern.len() > self.0.len() {
            return None;
        }
        self.0.windows(pattern.len()).position(|w| w == pattern)
    }

    /// Replace the first match of `pattern`; returns whether anything changed.
    pub fn replace_first(&mut self, pattern: &[Symbol], replacement: &[Symbol]) -> bool {
        match self.find(pattern) {
            Some(at) => {
                self.0.splice(at..at + pattern.len(), replacement.iter().cloned());
                true
            }
            None => false,
        }
    }

    /// Constants only; block markers count as `base^offset`.
    #[must_use]
    pub fn constant_projection(&self) -> Vec<Symbol> {
        let mut out = Vec::with_capacity(self.0.len());
        for symbol in &self.0 {
            match symbol {
                Symbol::Letter(_) | Symbol::Generated(_) => out.push(symbol.clone()),
                Symbol::Block(block) => {
                    out.extend(std::iter::repeat(block.base().clone()).take(block.offset()));
                }
                Symbol::Variable(_) => {}
            }
        }
        out
    }

    /// Apply disjoint edits given in ascending order of their (current) ranges.
    fn splice(&mut self, edits: Vec<(Range<usize>, Vec<Symbol>)>) -> Vec<Splice> {
        if edits.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(self.0.len());
        let mut splices = Vec::with_capacity(edits.len());
        let mut cursor = 0;
        for (range, replacement) in edits {
            debug_assert!(cursor <= range.start && range.end <= self.0.len(), "overlapping or unsorted edits");
            out.extend_from_slice(&self.0[cursor..range.start]);
            splices.push(Splice {
                at: out.len(),
                len: replacement.len(),
                removed: self.0[range.clone()].to_vec(),
            });
            out.extend(replacement);
            cursor = range.end;
        }
        out.extend_from_slice(&self.0[cursor..]);
        self.0 = out;
        splices
    }

    fn unsplice(&mut self, splices: &[Splice]) {
        for splice in splices.iter().rev() {
            self.0.splice(splice.at..splice.at + splice.len, splice.removed.iter().cloned());
        }
    }

    #[must_use]
    pub fn render(&self) -> String {
        if self.0.is_empty() {
            return "ε".to_string();
        }
        self.0.iter().map(ToString::to_string).collect()
    }

    /// Like [`render`](Self::render) but runs of one symbol are shown as `A^k`.
    #[must_use]
    pub fn render_collapsed(&self) -> String {
        if self.0.is_empty() {
            return "ε".to_string();
        }
        let mut out = String::new();
        let mut i = 0;
        while i < self.0.len() {
            let run = self.0[i..].iter().take_while(|s| **s == self.0[i]).count();
            if run > 1 {
                let _ = write!(out, "{}^{run}", self.0[i]);
            } else {
                let _ = write!(out, "{}", self.0[i]);
            }
            i += run;
        }
        out
    }
}

impl From<Vec<Symbol>> for EquationSide {
    fn from(symbols: Vec<Symbol>) -> Self {
        Self(symbols)
    }
}

/// Undo record for one [`Equation::rewrite`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rewrite {
    lhs: Vec<Splice>,
    rhs: Vec<Splice>,
}

impl Rewrite {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lhs.is_empty() && self.rhs.is_empty()
    }
}

/// A word equation `lhs = rhs`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Equation {
    lhs: EquationSide,
    rhs: EquationSide,
}

impl Equation {
    #[must_use]
    pub fn new(lhs: Vec<Symbol>, rhs: Vec<Symbol>) -> Self {
        Self { lhs: EquationSide(lhs), rhs: EquationSide(rhs) }
    }

    #[must_use]
    pub fn lhs(&self) -> &EquationSide {
        &self.lhs
    }

    #[must_use]
    pub fn rhs(&self) -> &EquationSide {
        &self.rhs
    }

    #[must_use]
    pub fn side(&self, id: SideId) -> &EquationSide {
        match id {
            SideId::Lhs => &self.lhs,
            SideId::Rhs => &self.rhs,
        }
    }

    /// `ε = ε`
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.lhs.is_empty() && self.rhs.is_empty()
    }

    /// Total number of symbols on both sides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lhs.len() + self.rhs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_trivial()
    }

    /// All symbols, lhs first.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.lhs.0.iter().chain(self.rhs.0.iter())
    }

    /// Distinct constants in order of first occurrence.
    #[must_use]
    pub fn constants(&self) -> IndexSet<Symbol> {
        self.symbols().filter(|s| s.is_constant()).cloned().collect()
    }

    /// Distinct variables in order of first occurrence.
    #[must_use]
    pub fn variables(&self) -> IndexSet<Symbol> {
        self.symbols().filter(|s| s.is_variable()).cloned().collect()
    }

    /// Whether any variable or block marker remains.
    #[must_use]
    pub fn has_unknowns(&self) -> bool {
        self.symbols().any(Symbol::is_unknown)
    }

    /// Rewrite both sides with the edits `plan` computes for each; see [`EquationSide`] edit order.
    pub(crate) fn rewrite<F>(&mut self, mut plan: F) -> Rewrite
    where
        F: FnMut(&[Symbol]) -> Vec<(Range<usize>, Vec<Symbol>)>,
    {
        let lhs_edits = plan(&self.lhs.0);
        let rhs_edits = plan(&self.rhs.0);
        Rewrite { lhs: self.lhs.splice(lhs_edits), rhs: self.rhs.splice(rhs_edits) }
    }

    pub(crate) fn undo(&mut self, rewrite: &Rewrite) {
        self.rhs.unsplice(&rewrite.rhs);
        self.lhs.unsplice(&rewrite.lhs);
    }

    /// Instantiate both sides with `solution`; `None` if a block marker remains.
    #[must_use]
    pub fn substitute(&self, solution: &Solution) -> Option<(Vec<Letter>, Vec<Letter>)> {
        let instantiate = |side: &EquationSide| -> Option<Vec<Letter>> {
            let mut out = Vec::new();
            for symbol in side.symbols() {
                match symbol {
                    Symbol::Variable(name) => {
                        if let Some(value) = solution.letters(name) {
                            out.extend(value.iter().cloned());
                        }
                    }
                    Symbol::Block(_) => return None,
                    _ => {
                        symbol.flatten_into(&mut out);
                    }
                }
            }
            Some(out)
        };
        Some((instantiate(&self.lhs)?, instantiate(&self.rhs)?))
    }

    #[must_use]
    pub fn render(&self) -> String {
        format!("{} = {}", self.lhs.render(), self.rhs.render())
    }

    #[must_use]
    pub fn render_collapsed(&self) -> String {
        format!("{} = {}", self.lhs.render_collapsed(), self.rhs.render_collapsed())
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
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

    #[test]
    fn test_structural_equality() {
        assert_eq!(eq("ABx", "xBA"), eq("ABx", "xBA"));
        assert_ne!(eq("ABx", "xBA"), eq("xBA", "ABx"));
        assert_ne!(eq("AB", ""), eq("A", "B"));
    }

    #[test]
    fn test_constants_and_variables_are_insertion_ordered() {
        let e = eq("BxA", "yAB");
        let constants: Vec<String> = e.constants().iter().map(ToString::to_string).collect();
        let variables: Vec<String> = e.variables().iter().map(ToString::to_string).collect();
        assert_eq!(constants, ["B", "A"]);
        assert_eq!(variables, ["x", "y"]);
    }

    #[test]
    fn test_replace_first() {
        let mut side = EquationSide::new(syms("ABAB"));
        assert!(side.replace_first(&syms("AB"), &syms("C")));
        assert_eq!(side.render(), "CAB");
        assert!(!side.replace_first(&syms("BB"), &syms("C")));
    }

    #[test]
    fn test_rewrite_and_undo_restore_exactly() {
        let original = eq("xABxA", "AxB");
        let x = Symbol::variable("x");
        let mut e = original.clone();
        let rewrite = e.rewrite(|side| {
            side.iter()
                .enumerate()
                .filter(|(_, s)| **s == x)
                .map(|(i, _)| (i..i + 1, syms("Ax")))
                .collect()
        });
        assert_eq!(e, eq("AxABAxA", "AAxB"));
        e.undo(&rewrite);
        assert_eq!(e, original);
    }

    #[test]
    fn test_rewrite_that_shrinks() {
        let original = eq("AABAA", "BAA");
        let mut e = original.clone();
        let rewrite = e.rewrite(|side| {
            side.windows(2)
                .enumerate()
                .filter(|(_, w)| *w == syms("AA").as_slice())
                .map(|(i, _)| (i..i + 2, Vec::new()))
                .fold(Vec::new(), |mut acc: Vec<(Range<usize>, Vec<Symbol>)>, edit| {
                    if acc.last().map_or(true, |(r, _)| r.end <= edit.0.start) {
                        acc.push(edit);
                    }
                    acc
                })
        });
        assert_eq!(e, eq("B", "B"));
        e.undo(&rewrite);
        assert_eq!(e, original);
    }

    #[test]
    fn test_constant_projection() {
        let side = EquationSide::new(syms("AxBy"));
        assert_eq!(side.constant_projection(), syms("AB"));
    }

    #[test]
    fn test_render() {
        let e = eq("AAAx", "");
        assert_eq!(e.render(), "AAAx = ε");
        assert_eq!(e.render_collapsed(), "A^3x = ε");
    }

    mod edge_cases {
        use super::*;

        #[test]
        fn test_run_at() {
            let side = EquationSide::new(syms("AAxAAA"));
            assert_eq!(side.run_at(Boundary::Left, &Symbol::letter("A")), 2);
            assert_eq!(side.run_at(Boundary::Right, &Symbol::letter("A")), 3);
            assert_eq!(side.run_at(Boundary::Left, &Symbol::letter("B")), 0);
        }

        #[test]
        fn test_find_longer_pattern_than_side() {
            let side = EquationSide::new(syms("A"));
            assert_eq!(side.find(&syms("AB")), None);
            assert_eq!(side.find(&[]), None);
        }

        #[test]
        fn test_empty_rewrite() {
            let mut e = eq("AB", "BA");
            let rewrite = e.rewrite(|_| Vec::new());
            assert!(rewrite.is_empty());
            assert_eq!(e, eq("AB", "BA"));
        }
    }
}
