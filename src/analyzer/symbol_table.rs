use std::collections::HashMap;

use crate::ir::SlotId;
use crate::parser::DeclKind;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Symbol {
    pub slot: SlotId,
    pub kind: DeclKind,
}

/// Name to storage binding used by the generator. There is a single flat
/// scope; a second `declare` of the same name replaces the first binding.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    table: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: &str, slot: SlotId, kind: DeclKind) {
        self.table.insert(name.to_string(), Symbol { slot, kind });
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.table.get(name)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn reset(&mut self) {
        self.table.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_lookup_and_reset() {
        let mut table = SymbolTable::new();
        assert!(table.lookup("x").is_none());

        table.declare("x", SlotId(0), DeclKind::Number);
        table.declare("x", SlotId(3), DeclKind::String);
        assert_eq!(
            table.lookup("x"),
            Some(&Symbol {
                slot: SlotId(3),
                kind: DeclKind::String
            })
        );
        assert_eq!(table.len(), 1);

        table.reset();
        assert!(table.is_empty());
    }
}
