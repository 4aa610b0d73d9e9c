//! The closed set of symbols an equation side is built from.
//!
//! A [`Symbol`] is one of:
//!
//! - a source [`Letter`] declared in the alphabet (`A`, `B`, `Cat`),
//! - a [`GeneratedSymbol`] standing for a compressed run of constants,
//! - a [`GeneratedBlock`] marker standing for an as-yet-unknown power of a constant,
//! - a variable declared by the user (`x`, `y1`).
//!
//! Letters and generated symbols are *constants*. Variables and block markers
//! are *unknowns*: every heuristic treats them as opaque.
//!
//! Generated symbols compare by their flattened source-letter content, so two
//! independently created symbols for `AB` are the same symbol. This is what
//! makes structural equality of equations meaningful across search branches.
//!
//! # Example
//! ```
//! use wordeq::symbol::Symbol;
//!
//! let a = Symbol::letter("A");
//! let x = Symbol::variable("x");
//! assert!(a.is_constant());
//! assert!(x.is_unknown());
//! assert_eq!(a.to_string(), "A");
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A source letter name.
pub type Letter = Rc<str>;

/// Index of a symbolic power carried by a block marker.
pub type PowerIndex = u32;

/// Display id of a generated symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolId {
    /// Issued by the counter for non-block symbols.
    Pair(u64),
    /// Issued by the counter for blocks.
    Block(u64),
    /// Derived from a nested block's id times the repetition count.
    NestedBlock(u64),
}

impl SymbolId {
    #[must_use]
    pub fn value(self) -> u64 {
        match self {
            SymbolId::Pair(n) | SymbolId::Block(n) | SymbolId::NestedBlock(n) => n,
        }
    }

    #[must_use]
    pub fn is_block(self) -> bool {
        !matches!(self, SymbolId::Pair(_))
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolId::Pair(n) => write!(f, "G{n}"),
            SymbolId::Block(n) | SymbolId::NestedBlock(n) => write!(f, "B{n}"),
        }
    }
}

/// A constant created by compression.
#[derive(Debug)]
pub struct GeneratedSymbol {
    constituents: Vec<Symbol>,
    content: Vec<Letter>,
    id: SymbolId,
}

impl GeneratedSymbol {
    pub(crate) fn new(constituents: Vec<Symbol>, content: Vec<Letter>, id: SymbolId) -> Self {
        debug_assert!(constituents.iter().all(Symbol::is_constant));
        Self { constituents, content, id }
    }

    /// The symbols this one replaced, in order.
    #[must_use]
    pub fn constituents(&self) -> &[Symbol] {
        &self.constituents
    }

    /// Flattened source letters; the identity of the symbol.
    #[must_use]
    pub fn content(&self) -> &[Letter] {
        &self.content
    }

    #[must_use]
    pub fn id(&self) -> SymbolId {
        self.id
    }

    /// A block is a generated symbol whose constituents are all identical.
    #[must_use]
    pub fn is_block(&self) -> bool {
        self.id.is_block()
    }
}

impl PartialEq for GeneratedSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
    }
}

impl Eq for GeneratedSymbol {}

/// An unresolved power `base^(p1 + ... + pn + offset)` with every `pi >= 0`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GeneratedBlock {
    base: Symbol,
    powers: Vec<PowerIndex>,
    offset: usize,
}

impl GeneratedBlock {
    pub(crate) fn new(base: Symbol, powers: Vec<PowerIndex>, offset: usize) -> Self {
        debug_assert!(base.is_constant(), "block marker over unknown {base}");
        Self { base, powers, offset }
    }

    #[must_use]
    pub fn base(&self) -> &Symbol {
        &self.base
    }

    #[must_use]
    pub fn powers(&self) -> &[PowerIndex] {
        &self.powers
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The marker left after fixing `index` to `value`, or `None` when no symbolic power remains.
    pub(crate) fn assign(&self, index: PowerIndex, value: usize) -> Option<GeneratedBlock> {
        let powers: Vec<PowerIndex> = self.powers.iter().copied().filter(|&p| p != index).collect();
        if powers.is_empty() {
            None
        } else {
            Some(GeneratedBlock::new(self.base.clone(), powers, self.offset + value))
        }
    }
}

impl fmt::Display for GeneratedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}^(", self.base)?;
        for (i, p) in self.powers.iter().enumerate() {
            if i > 0 {
                write!(f, "+")?;
            }
            write!(f, "p{p}")?;
        }
        if self.offset > 0 {
            write!(f, "+{}", self.offset)?;
        }
        write!(f, ")]")
    }
}

/// One position of an equation side.
#[derive(Clone, Debug)]
pub enum Symbol {
    Letter(Letter),
    Generated(Rc<GeneratedSymbol>),
    Block(Rc<GeneratedBlock>),
    Variable(Rc<str>),
}

impl Symbol {
    #[must_use]
    pub fn letter(name: &str) -> Self {
        Symbol::Letter(Rc::from(name))
    }

    #[must_use]
    pub fn variable(name: &str) -> Self {
        Symbol::Variable(Rc::from(name))
    }

    #[must_use]
    pub fn is_constant(&self) -> bool {
        matches!(self, Symbol::Letter(_) | Symbol::Generated(_))
    }

    #[must_use]
    pub fn is_variable(&self) -> bool {
        matches!(self, Symbol::Variable(_))
    }

    /// Variables and block markers.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        !self.is_constant()
    }

    #[must_use]
    pub fn variable_name(&self) -> Option<&Rc<str>> {
        match self {
            Symbol::Variable(name) => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_block(&self) -> Option<&GeneratedBlock> {
        match self {
            Symbol::Block(block) => Some(block),
            _ => None,
        }
    }

    /// The constant this symbol is known to start and end with, if any.
    ///
    /// A block marker with a positive offset is known to start and end with its base.
    #[must_use]
    pub fn boundary_constant(&self) -> Option<&Symbol> {
        match self {
            Symbol::Letter(_) | Symbol::Generated(_) => Some(self),
            Symbol::Block(block) if block.offset > 0 => Some(&block.base),
            _ => None,
        }
    }

    /// Push the source letters of a constant; returns `false` for unknowns.
    pub fn flatten_into(&self, out: &mut Vec<Letter>) -> bool {
        match self {
            Symbol::Letter(l) => {
                out.push(Rc::clone(l));
                true
            }
            Symbol::Generated(g) => {
                out.extend(g.content.iter().cloned());
                true
            }
            Symbol::Block(_) | Symbol::Variable(_) => false,
        }
    }

    /// Source letters of a constant (empty for unknowns).
    #[must_use]
    pub fn letters(&self) -> Vec<Letter> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Symbol::Letter(a), Symbol::Letter(b)) | (Symbol::Variable(a), Symbol::Variable(b)) => a == b,
            (Symbol::Generated(a), Symbol::Generated(b)) => Rc::ptr_eq(a, b) || a.content == b.content,
            (Symbol::Block(a), Symbol::Block(b)) => Rc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Symbol::Letter(name) | Symbol::Variable(name) => name.hash(state),
            Symbol::Generated(g) => g.content.hash(state),
            Symbol::Block(b) => b.hash(state),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Letter(name) | Symbol::Variable(name) => write!(f, "{name}"),
            Symbol::Generated(g) => write!(f, "[{}]", g.id),
            Symbol::Block(b) => write!(f, "{b}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn generated(letters: &[&str], id: SymbolId) -> Symbol {
        let constituents: Vec<Symbol> = letters.iter().map(|l| Symbol::letter(l)).collect();
        let content = letters.iter().map(|l| Rc::from(*l)).collect();
        Symbol::Generated(Rc::new(GeneratedSymbol::new(constituents, content, id)))
    }

    #[test]
    fn test_generated_equality_is_by_content() {
        let g1 = generated(&["A", "B"], SymbolId::Pair(1));
        let g2 = generated(&["A", "B"], SymbolId::Pair(7));
        let g3 = generated(&["B", "A"], SymbolId::Pair(1));
        assert_eq!(g1, g2);
        assert_ne!(g1, g3);

        let set: HashSet<Symbol> = [g1, g2, g3].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_classification() {
        let a = Symbol::letter("A");
        let x = Symbol::variable("x");
        let marker = Symbol::Block(Rc::new(GeneratedBlock::new(a.clone(), vec![1], 1)));

        assert!(a.is_constant());
        assert!(x.is_unknown() && x.is_variable());
        assert!(marker.is_unknown() && !marker.is_variable());
        assert_eq!(marker.boundary_constant(), Some(&a));
        assert_eq!(x.boundary_constant(), None);
    }

    #[test]
    fn test_display() {
        let a = Symbol::letter("A");
        assert_eq!(generated(&["A", "B"], SymbolId::Pair(3)).to_string(), "[G3]");
        assert_eq!(generated(&["A", "A"], SymbolId::Block(2)).to_string(), "[B2]");
        let marker = GeneratedBlock::new(a, vec![1, 4], 1);
        assert_eq!(marker.to_string(), "[A^(p1+p4+1)]");
    }

    #[test]
    fn test_assign_power() {
        let marker = GeneratedBlock::new(Symbol::letter("A"), vec![1, 2], 1);
        let partial = marker.assign(1, 3).unwrap();
        assert_eq!(partial.powers(), &[2]);
        assert_eq!(partial.offset(), 4);
        assert!(partial.assign(2, 0).is_none());
    }

    mod edge_cases {
        use super::*;

        #[test]
        fn test_letter_and_variable_with_same_name_differ() {
            assert_ne!(Symbol::letter("a"), Symbol::variable("a"));
        }

        #[test]
        fn test_zero_offset_marker_has_no_boundary_constant() {
            let marker = Symbol::Block(Rc::new(GeneratedBlock::new(Symbol::letter("A"), vec![1], 0)));
            assert_eq!(marker.boundary_constant(), None);
            assert!(marker.letters().is_empty());
        }

        #[test]
        fn test_flatten_generated() {
            let g = generated(&["A", "B", "A"], SymbolId::Pair(1));
            let letters: Vec<String> = g.letters().iter().map(|l| l.to_string()).collect();
            assert_eq!(letters, ["A", "B", "A"]);
        }
    }
}
