//! Content-addressed interning of generated symbols.
//!
//! Compression replaces a run of constants by one fresh symbol. The same
//! content must always map to the same symbol, whichever branch of the search
//! creates it, so symbols are interned by their flattened source letters.
//! Ids come from monotonically increasing counters that roll back when the
//! most recently issued symbol is removed again; replaying an action sequence
//! therefore reproduces the same ids.

use crate::symbol::{GeneratedBlock, GeneratedSymbol, Letter, PowerIndex, Symbol, SymbolId};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SymbolFactory {
    table: HashMap<Vec<Letter>, Rc<GeneratedSymbol>>,
    last_pair_id: u64,
    last_block_id: u64,
    last_power: PowerIndex,
}

impl SymbolFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered generated symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The registered symbol for the content of `sequence`, if any.
    #[must_use]
    pub fn lookup(&self, sequence: &[Symbol]) -> Option<Symbol> {
        let content = flatten(sequence)?;
        self.table.get(&content).map(|g| Symbol::Generated(Rc::clone(g)))
    }

    #[must_use]
    pub fn contains(&self, symbol: &Symbol) -> bool {
        match symbol {
            Symbol::Generated(g) => self.table.contains_key(g.content()),
            _ => false,
        }
    }

    /// Return the symbol for `sequence`, creating and registering it if needed.
    ///
    /// The second value tells whether the symbol was created by this call.
    ///
    /// # Panics
    /// If `sequence` holds fewer than two symbols or any unknown.
    pub fn intern_or_create(&mut self, sequence: &[Symbol]) -> (Symbol, bool) {
        assert!(sequence.len() >= 2, "cannot compress fewer than two symbols");
        let Some(content) = flatten(sequence) else {
            panic!("cannot compress unknowns");
        };
        if let Some(existing) = self.table.get(&content) {
            return (Symbol::Generated(Rc::clone(existing)), false);
        }

        let id = self.next_id(sequence);
        let generated = Rc::new(GeneratedSymbol::new(sequence.to_vec(), content.clone(), id));
        self.table.insert(content, Rc::clone(&generated));
        (Symbol::Generated(generated), true)
    }

    fn next_id(&mut self, sequence: &[Symbol]) -> SymbolId {
        let is_block = sequence.iter().all(|s| *s == sequence[0]);
        if !is_block {
            self.last_pair_id += 1;
            return SymbolId::Pair(self.last_pair_id);
        }
        match &sequence[0] {
            Symbol::Generated(inner) if inner.is_block() => {
                SymbolId::NestedBlock(inner.id().value() * sequence.len() as u64)
            }
            _ => {
                self.last_block_id += 1;
                SymbolId::Block(self.last_block_id)
            }
        }
    }

    /// Unregister `symbol`; `false` if it was not registered.
    pub fn remove(&mut self, symbol: &Symbol) -> bool {
        let Symbol::Generated(g) = symbol else {
            return false;
        };
        if self.table.remove(g.content()).is_none() {
            return false;
        }
        match g.id() {
            SymbolId::Pair(n) if n == self.last_pair_id => self.last_pair_id -= 1,
            SymbolId::Block(n) if n == self.last_block_id => self.last_block_id -= 1,
            _ => {}
        }
        true
    }

    /// Mint a marker `base^(p + offset)` with a fresh power index `p`.
    pub fn generate_block_marker(&mut self, base: &Symbol, offset: usize) -> Symbol {
        self.last_power += 1;
        Symbol::Block(Rc::new(GeneratedBlock::new(base.clone(), vec![self.last_power], offset)))
    }

    /// Inverse of [`generate_block_marker`](Self::generate_block_marker); `false` unless
    /// `marker` carries the most recently minted power.
    pub fn release_block_marker(&mut self, marker: &Symbol) -> bool {
        match marker.as_block() {
            Some(block) if block.powers() == [self.last_power] && self.last_power > 0 => {
                self.last_power -= 1;
                true
            }
            _ => false,
        }
    }
}

fn flatten(sequence: &[Symbol]) -> Option<Vec<Letter>> {
    let mut content = Vec::new();
    for symbol in sequence {
        if !symbol.flatten_into(&mut content) {
            return None;
        }
    }
    Some(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters(names: &str) -> Vec<Symbol> {
        names.chars().map(|c| Symbol::letter(&c.to_string())).collect()
    }

    fn id_of(symbol: &Symbol) -> SymbolId {
        match symbol {
            Symbol::Generated(g) => g.id(),
            other => panic!("not generated: {other}"),
        }
    }

    #[test]
    fn test_interning_is_idempotent() {
        let mut factory = SymbolFactory::new();
        let (ab1, created1) = factory.intern_or_create(&letters("AB"));
        let (ab2, created2) = factory.intern_or_create(&letters("AB"));
        assert!(created1);
        assert!(!created2);
        assert_eq!(ab1, ab2);
        assert_eq!(factory.len(), 1);

        assert!(factory.remove(&ab1));
        assert!(!factory.contains(&ab1));
        assert!(!factory.remove(&ab2));
        assert!(factory.is_empty());
    }

    #[test]
    fn test_same_content_from_different_constituents() {
        let mut factory = SymbolFactory::new();
        let (ab, _) = factory.intern_or_create(&letters("AB"));
        let (abc1, _) = factory.intern_or_create(&[ab, Symbol::letter("C")]);
        let (abc2, created) = factory.intern_or_create(&letters("ABC"));
        assert!(!created);
        assert_eq!(abc1, abc2);
    }

    #[test]
    fn test_ids_use_independent_counters() {
        let mut factory = SymbolFactory::new();
        let (ab, _) = factory.intern_or_create(&letters("AB"));
        let (aa, _) = factory.intern_or_create(&letters("AA"));
        let (ba, _) = factory.intern_or_create(&letters("BA"));
        assert_eq!(id_of(&ab), SymbolId::Pair(1));
        assert_eq!(id_of(&aa), SymbolId::Block(1));
        assert_eq!(id_of(&ba), SymbolId::Pair(2));

        let (aaaaaa, _) = factory.intern_or_create(&[aa.clone(), aa.clone(), aa]);
        assert_eq!(id_of(&aaaaaa), SymbolId::NestedBlock(3));
    }

    #[test]
    fn test_counter_rolls_back_on_last_removal() {
        let mut factory = SymbolFactory::new();
        let (ab, _) = factory.intern_or_create(&letters("AB"));
        assert!(factory.remove(&ab));
        let (ba, _) = factory.intern_or_create(&letters("BA"));
        assert_eq!(id_of(&ba), SymbolId::Pair(1));
        assert_eq!(factory, {
            let mut fresh = SymbolFactory::new();
            fresh.intern_or_create(&letters("BA"));
            fresh
        });
    }

    #[test]
    fn test_block_markers() {
        let mut factory = SymbolFactory::new();
        let a = Symbol::letter("A");
        let m1 = factory.generate_block_marker(&a, 1);
        let m2 = factory.generate_block_marker(&a, 1);
        assert_ne!(m1, m2);
        assert!(!factory.release_block_marker(&m1));
        assert!(factory.release_block_marker(&m2));
        assert!(factory.release_block_marker(&m1));
        assert_eq!(factory, SymbolFactory::new());
    }

    mod edge_cases {
        use super::*;

        #[test]
        #[should_panic(expected = "fewer than two")]
        fn test_single_symbol_panics() {
            SymbolFactory::new().intern_or_create(&letters("A"));
        }

        #[test]
        fn test_lookup_without_registering() {
            let mut factory = SymbolFactory::new();
            assert!(factory.lookup(&letters("AB")).is_none());
            factory.intern_or_create(&letters("AB"));
            assert!(factory.lookup(&letters("AB")).is_some());
            assert!(factory.lookup(&[Symbol::variable("x"), Symbol::letter("A")]).is_none());
        }

        #[test]
        fn test_removing_older_symbol_keeps_counter() {
            let mut factory = SymbolFactory::new();
            let (ab, _) = factory.intern_or_create(&letters("AB"));
            factory.intern_or_create(&letters("BA"));
            assert!(factory.remove(&ab));
            let (ac, _) = factory.intern_or_create(&letters("AC"));
            assert_eq!(id_of(&ac), SymbolId::Pair(3));
        }
    }
}
