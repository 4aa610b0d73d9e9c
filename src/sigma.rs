//! The substitution accumulated while solving.
//!
//! Every time a letter is peeled off a variable (`x → A·x` or `x → x·B`) the
//! letter is appended to that variable's left or right half. The final value
//! of a variable is `left ++ reverse(right)`: the right half is stored in
//! peel order, which is the reverse of reading order.
//!
//! Popping a block marker from a variable appends a symbolic power item whose
//! length is only fixed later by an `AssignPower` action (unassigned powers
//! resolve to 0 when the solution is materialized).
//!
//! [`NegativeSigma`] is the optional companion that remembers, per variable
//! and boundary, the one letter that a failed guess ruled out.

use crate::equation::Boundary;
use crate::symbol::{Letter, PowerIndex, Symbol};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// One accumulated piece of a variable's value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SigmaItem {
    Letter(Letter),
    /// `base^(p + offset)`, resolved from the recorded power assignments.
    Power { index: PowerIndex, base: Vec<Letter>, offset: usize },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sigma {
    left: HashMap<Rc<str>, Vec<SigmaItem>>,
    right: HashMap<Rc<str>, Vec<SigmaItem>>,
    powers: HashMap<PowerIndex, usize>,
}

impl Sigma {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn half_mut(&mut self, boundary: Boundary) -> &mut HashMap<Rc<str>, Vec<SigmaItem>> {
        match boundary {
            Boundary::Left => &mut self.left,
            Boundary::Right => &mut self.right,
        }
    }

    /// Items accumulated on one side, in peel order.
    #[must_use]
    pub fn half(&self, var: &str, boundary: Boundary) -> &[SigmaItem] {
        let half = match boundary {
            Boundary::Left => &self.left,
            Boundary::Right => &self.right,
        };
        half.get(var).map(Vec::as_slice).unwrap_or_default()
    }

    /// Append `items` (given in reading order) to the `boundary` half of `var`.
    pub fn append(&mut self, var: &Rc<str>, boundary: Boundary, items: Vec<SigmaItem>) {
        if items.is_empty() {
            return;
        }
        let half = self.half_mut(boundary).entry(Rc::clone(var)).or_default();
        match boundary {
            Boundary::Left => half.extend(items),
            Boundary::Right => half.extend(items.into_iter().rev()),
        }
    }

    pub fn append_left(&mut self, var: &Rc<str>, items: Vec<SigmaItem>) {
        self.append(var, Boundary::Left, items);
    }

    pub fn append_right(&mut self, var: &Rc<str>, items: Vec<SigmaItem>) {
        self.append(var, Boundary::Right, items);
    }

    /// Remove the last `count` items appended to the `boundary` half of `var`.
    ///
    /// # Panics
    /// If fewer than `count` items were accumulated.
    pub fn pop(&mut self, var: &str, boundary: Boundary, count: usize) -> Vec<SigmaItem> {
        if count == 0 {
            return Vec::new();
        }
        let half = self.half_mut(boundary);
        let Some(items) = half.get_mut(var) else {
            panic!("nothing accumulated for {var} on the {boundary}");
        };
        assert!(items.len() >= count, "popping {count} items from {var} holding {}", items.len());
        let popped = items.split_off(items.len() - count);
        if items.is_empty() {
            half.remove(var);
        }
        popped
    }

    pub fn pop_left(&mut self, var: &str, count: usize) -> Vec<SigmaItem> {
        self.pop(var, Boundary::Left, count)
    }

    pub fn pop_right(&mut self, var: &str, count: usize) -> Vec<SigmaItem> {
        self.pop(var, Boundary::Right, count)
    }

    /// Record `index := value`; returns the previous assignment.
    pub fn assign_power(&mut self, index: PowerIndex, value: usize) -> Option<usize> {
        self.powers.insert(index, value)
    }

    pub fn unassign_power(&mut self, index: PowerIndex) -> Option<usize> {
        self.powers.remove(&index)
    }

    #[must_use]
    pub fn power(&self, index: PowerIndex) -> Option<usize> {
        self.powers.get(&index).copied()
    }

    /// Number of accumulated items over all variables.
    #[must_use]
    pub fn accumulated_len(&self) -> usize {
        self.left.values().chain(self.right.values()).map(Vec::len).sum()
    }

    /// Letters in all accumulated values, unassigned powers counting as 0.
    #[must_use]
    pub fn weight(&self) -> usize {
        self.items().map(|item| self.item_weight(item)).sum()
    }

    /// Letters one more unit of power `index` would add.
    #[must_use]
    pub fn power_weight(&self, index: PowerIndex) -> usize {
        self.items()
            .map(|item| match item {
                SigmaItem::Power { index: i, base, .. } if *i == index => base.len(),
                _ => 0,
            })
            .sum()
    }

    fn items(&self) -> impl Iterator<Item = &SigmaItem> {
        self.left.values().chain(self.right.values()).flatten()
    }

    fn item_weight(&self, item: &SigmaItem) -> usize {
        match item {
            SigmaItem::Letter(_) => 1,
            SigmaItem::Power { index, base, offset } => base.len() * (offset + self.power(*index).unwrap_or(0)),
        }
    }

    fn expand(&self, item: &SigmaItem, out: &mut Vec<Letter>) {
        match item {
            SigmaItem::Letter(l) => out.push(Rc::clone(l)),
            SigmaItem::Power { index, base, offset } => {
                let times = offset + self.power(*index).unwrap_or(0);
                for _ in 0..times {
                    out.extend(base.iter().cloned());
                }
            }
        }
    }

    /// Current value of `var` as source letters.
    #[must_use]
    pub fn value(&self, var: &str) -> Vec<Letter> {
        let mut out = Vec::new();
        for item in self.half(var, Boundary::Left) {
            self.expand(item, &mut out);
        }
        for item in self.half(var, Boundary::Right).iter().rev() {
            self.expand(item, &mut out);
        }
        out
    }

    /// Values for `variables`, in that order; unbound variables map to the empty word.
    #[must_use]
    pub fn materialize(&self, variables: &[Rc<str>]) -> Solution {
        Solution {
            values: variables.iter().map(|v| (Rc::clone(v), self.value(v))).collect(),
        }
    }
}

/// Letters of a constant symbol, as sigma items.
pub(crate) fn letter_items(symbols: &[Symbol]) -> Vec<SigmaItem> {
    let mut letters = Vec::new();
    for symbol in symbols {
        symbol.flatten_into(&mut letters);
    }
    letters.into_iter().map(SigmaItem::Letter).collect()
}

/// A concrete assignment of letter strings to variables, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Solution {
    values: IndexMap<Rc<str>, Vec<Letter>>,
}

impl Solution {
    /// Letters bound to `var`.
    #[must_use]
    pub fn letters(&self, var: &str) -> Option<&[Letter]> {
        self.values.get(var).map(Vec::as_slice)
    }

    /// Value of `var` as a string (letter names concatenated).
    #[must_use]
    pub fn get(&self, var: &str) -> Option<String> {
        self.letters(var).map(|letters| letters.concat())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Rc<str>, &[Letter])> {
        self.values.iter().map(|(k, v)| (k, v.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Total number of letters over all variables.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.values.values().map(Vec::len).sum()
    }

    /// `(variable, value)` pairs with string values, for serialization.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<SolutionEntry> {
        self.values
            .iter()
            .map(|(k, v)| SolutionEntry { variable: k.to_string(), value: v.concat() })
            .collect()
    }
}

impl FromIterator<(Rc<str>, Vec<Letter>)> for Solution {
    fn from_iter<T: IntoIterator<Item = (Rc<str>, Vec<Letter>)>>(iter: T) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SolutionEntry {
    pub variable: String,
    pub value: String,
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (var, letters)) in self.values.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{var} = {}", letters.concat())?;
        }
        Ok(())
    }
}

/// Per variable and boundary, the one boundary letter currently ruled out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NegativeSigma {
    excluded: HashMap<(Rc<str>, Boundary), Symbol>,
}

impl NegativeSigma {
    #[must_use]
    pub fn get(&self, var: &Rc<str>, boundary: Boundary) -> Option<&Symbol> {
        self.excluded.get(&(Rc::clone(var), boundary))
    }

    #[must_use]
    pub fn excludes(&self, var: &Rc<str>, boundary: Boundary, letter: &Symbol) -> bool {
        self.get(var, boundary) == Some(letter)
    }

    /// Replace the entry; returns the previous one.
    pub fn set(&mut self, var: &Rc<str>, boundary: Boundary, letter: Option<Symbol>) -> Option<Symbol> {
        let key = (Rc::clone(var), boundary);
        match letter {
            Some(letter) => self.excluded.insert(key, letter),
            None => self.excluded.remove(&key),
        }
    }

    pub fn clear(&mut self) {
        self.excluded.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.excluded.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(letters: &str) -> Vec<SigmaItem> {
        letters.chars().map(|c| SigmaItem::Letter(Rc::from(c.to_string()))).collect()
    }

    fn value_of(sigma: &Sigma, var: &str) -> String {
        sigma.value(var).concat()
    }

    #[test]
    fn test_left_and_right_halves_concatenate() {
        let x: Rc<str> = Rc::from("x");
        let mut sigma = Sigma::new();
        sigma.append_left(&x, items("A"));
        sigma.append_right(&x, items("C"));
        sigma.append_left(&x, items("B"));
        sigma.append_right(&x, items("DE"));
        assert_eq!(value_of(&sigma, "x"), "ABDEC");
        assert_eq!(sigma.accumulated_len(), 5);
    }

    #[test]
    fn test_pop_is_exact_inverse() {
        let x: Rc<str> = Rc::from("x");
        let mut sigma = Sigma::new();
        sigma.append_left(&x, items("A"));
        let before = sigma.clone();

        sigma.append_left(&x, items("BC"));
        sigma.append_right(&x, items("DE"));
        assert_eq!(sigma.pop_right("x", 2), items("ED"));
        assert_eq!(sigma.pop_left("x", 2), items("BC"));
        assert_eq!(sigma, before);

        sigma.pop_left("x", 1);
        assert_eq!(sigma, Sigma::new());
    }

    #[test]
    fn test_power_items() {
        let x: Rc<str> = Rc::from("x");
        let mut sigma = Sigma::new();
        let power = SigmaItem::Power { index: 1, base: vec![Rc::from("A"), Rc::from("B")], offset: 1 };
        sigma.append_left(&x, vec![power]);
        assert_eq!(value_of(&sigma, "x"), "AB");
        sigma.append_right(&x, items("C"));
        assert_eq!(sigma.weight(), 3);
        assert_eq!(sigma.power_weight(1), 2);
        assert_eq!(sigma.power_weight(2), 0);
        sigma.pop_right("x", 1);
        sigma.assign_power(1, 2);
        assert_eq!(value_of(&sigma, "x"), "ABABAB");
        assert_eq!(sigma.weight(), 6);
        sigma.unassign_power(1);
        assert_eq!(value_of(&sigma, "x"), "AB");
    }

    #[test]
    fn test_materialize_keeps_declaration_order() {
        let x: Rc<str> = Rc::from("x");
        let y: Rc<str> = Rc::from("y");
        let mut sigma = Sigma::new();
        sigma.append_left(&x, items("A"));
        let solution = sigma.materialize(&[Rc::clone(&y), Rc::clone(&x)]);
        assert_eq!(solution.to_string(), "y = \nx = A");
        assert_eq!(solution.get("y").as_deref(), Some(""));
        assert_eq!(solution.total_len(), 1);
    }

    #[test]
    fn test_negative_sigma() {
        let x: Rc<str> = Rc::from("x");
        let a = Symbol::letter("A");
        let mut neg = NegativeSigma::default();
        assert_eq!(neg.set(&x, Boundary::Left, Some(a.clone())), None);
        assert!(neg.excludes(&x, Boundary::Left, &a));
        assert!(!neg.excludes(&x, Boundary::Right, &a));

        assert_eq!(neg.set(&x, Boundary::Left, None), Some(a.clone()));
        assert!(neg.is_empty());

        neg.set(&x, Boundary::Left, Some(a.clone()));
        neg.set(&x, Boundary::Right, Some(a));
        assert_eq!(neg.len(), 2);
        neg.clear();
        assert!(neg.is_empty());
    }

    mod edge_cases {
        use super::*;

        #[test]
        fn test_unbound_variable_is_empty() {
            let sigma = Sigma::new();
            assert!(sigma.value("z").is_empty());
        }

        #[test]
        #[should_panic(expected = "popping 2 items")]
        fn test_pop_too_many_panics() {
            let x: Rc<str> = Rc::from("x");
            let mut sigma = Sigma::new();
            sigma.append_left(&x, items("A"));
            sigma.pop_left("x", 2);
        }

        #[test]
        fn test_letter_items_flatten_generated() {
            let symbols = [Symbol::letter("A"), Symbol::letter("B")];
            assert_eq!(letter_items(&symbols), items("AB"));
        }
    }
}
