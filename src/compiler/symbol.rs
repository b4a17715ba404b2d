use crate::error::{JackError, Result};

use std::collections::HashMap;
use std::fmt;

use itertools::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Static,
    Field,
    Argument,
    Local,
}

impl Kind {
    fn is_class_scope(self) -> bool {
        match self {
            Kind::Static | Kind::Field => true,
            Kind::Argument | Kind::Local => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub ty: String,
    pub kind: Kind,
    pub index: u16,
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {:?}, {})", self.ty, self.kind, self.index)
    }
}

/// Two tier symbol table: class scope holds statics and fields for the whole
/// class, subroutine scope holds arguments and locals of the current
/// subroutine only.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    class_scope: HashMap<String, Symbol>,
    subroutine_scope: HashMap<String, Symbol>,
    counts: [u16; 4],
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    pub fn start_subroutine(&mut self) {
        self.subroutine_scope.clear();
        self.counts[Kind::Argument as usize] = 0;
        self.counts[Kind::Local as usize] = 0;
    }

    /// Defines `name` with the next free index of `kind`. A name may only be
    /// declared once per scope tier.
    pub fn define(&mut self, name: &str, ty: &str, kind: Kind) -> Result<&Symbol> {
        let scope = if kind.is_class_scope() {
            &mut self.class_scope
        } else {
            &mut self.subroutine_scope
        };

        if scope.contains_key(name) {
            return Err(JackError::duplicate_name(name));
        }

        let count = &mut self.counts[kind as usize];
        let symbol = Symbol {
            name: name.to_string(),
            ty: ty.to_string(),
            kind,
            index: *count,
        };
        *count += 1;

        Ok(scope.entry(name.to_string()).or_insert(symbol))
    }

    pub fn var_count(&self, kind: Kind) -> u16 {
        self.counts[kind as usize]
    }

    /// Looks up `name`, subroutine scope first. `None` means the name is not
    /// a variable and has to be a class name.
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    pub fn kind_of(&self, name: &str) -> Option<Kind> {
        self.resolve(name).map(|symbol| symbol.kind)
    }

    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.resolve(name).map(|symbol| symbol.ty.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.resolve(name).map(|symbol| symbol.index)
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.class_scope
                .iter()
                .chain(self.subroutine_scope.iter())
                .sorted_by_key(|(_, symbol)| (symbol.kind as usize, symbol.index))
                .map(|(key, value)| format!("{} -> {}", key, value))
                .join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(name: &str, ty: &str, kind: Kind, index: u16) -> Symbol {
        Symbol {
            name: name.to_string(),
            ty: ty.to_string(),
            kind,
            index,
        }
    }

    #[test]
    fn define_resolve_0() {
        let mut tbl = SymbolTable::new();
        let a0 = tbl.define("a", "int", Kind::Static).unwrap().clone();
        let b0 = tbl.define("b", "Point", Kind::Field).unwrap().clone();
        let c0 = tbl.define("c", "boolean", Kind::Field).unwrap().clone();
        let d0 = tbl.define("d", "char", Kind::Static).unwrap().clone();

        let a = symbol("a", "int", Kind::Static, 0);
        let b = symbol("b", "Point", Kind::Field, 0);
        let c = symbol("c", "boolean", Kind::Field, 1);
        let d = symbol("d", "char", Kind::Static, 1);

        assert_eq!(a0, a);
        assert_eq!(b0, b);
        assert_eq!(c0, c);
        assert_eq!(d0, d);
        assert_eq!(tbl.resolve("a"), Some(&a));
        assert_eq!(tbl.resolve("b"), Some(&b));
        assert_eq!(tbl.resolve("c"), Some(&c));
        assert_eq!(tbl.resolve("d"), Some(&d));
        assert_eq!(tbl.var_count(Kind::Static) + tbl.var_count(Kind::Field), 4);
    }

    #[test]
    fn define_resolve_1() {
        let mut tbl = SymbolTable::new();
        tbl.define("x", "int", Kind::Field).unwrap();

        tbl.start_subroutine();
        tbl.define("this", "Point", Kind::Argument).unwrap();
        tbl.define("dx", "int", Kind::Argument).unwrap();
        tbl.define("i", "int", Kind::Local).unwrap();
        tbl.define("j", "Array", Kind::Local).unwrap();

        assert_eq!(tbl.kind_of("x"), Some(Kind::Field));
        assert_eq!(tbl.index_of("dx"), Some(1));
        assert_eq!(tbl.type_of("this"), Some("Point"));
        assert_eq!(tbl.kind_of("j"), Some(Kind::Local));
        assert_eq!(tbl.index_of("j"), Some(1));
        assert_eq!(tbl.type_of("j"), Some("Array"));
        assert_eq!(tbl.var_count(Kind::Argument), 2);
        assert_eq!(tbl.var_count(Kind::Local), 2);
    }

    #[test]
    fn unknown_names_are_not_found() {
        let mut tbl = SymbolTable::new();
        tbl.define("x", "int", Kind::Static).unwrap();

        assert_eq!(tbl.resolve("Output"), None);
        assert_eq!(tbl.kind_of("Output"), None);
        assert_eq!(tbl.type_of("Output"), None);
        assert_eq!(tbl.index_of("Output"), None);
    }

    #[test]
    fn start_subroutine_discards_subroutine_scope() {
        let mut tbl = SymbolTable::new();
        tbl.define("count", "int", Kind::Static).unwrap();
        tbl.define("size", "int", Kind::Field).unwrap();

        tbl.start_subroutine();
        tbl.define("a", "int", Kind::Argument).unwrap();
        tbl.define("b", "int", Kind::Argument).unwrap();
        tbl.define("c", "int", Kind::Argument).unwrap();
        tbl.define("t", "int", Kind::Local).unwrap();

        tbl.start_subroutine();

        assert_eq!(tbl.var_count(Kind::Argument), 0);
        assert_eq!(tbl.var_count(Kind::Local), 0);
        assert_eq!(tbl.var_count(Kind::Static), 1);
        assert_eq!(tbl.var_count(Kind::Field), 1);
        assert_eq!(tbl.resolve("a"), None);
        assert_eq!(tbl.resolve("t"), None);
        assert!(tbl.resolve("count").is_some());

        tbl.define("z", "int", Kind::Argument).unwrap();
        assert_eq!(tbl.index_of("z"), Some(0));
    }

    #[test]
    fn subroutine_scope_shadows_class_scope() {
        let mut tbl = SymbolTable::new();
        tbl.define("x", "int", Kind::Field).unwrap();

        tbl.start_subroutine();
        tbl.define("x", "char", Kind::Local).unwrap();

        assert_eq!(tbl.resolve("x"), Some(&symbol("x", "char", Kind::Local, 0)));

        tbl.start_subroutine();

        assert_eq!(tbl.resolve("x"), Some(&symbol("x", "int", Kind::Field, 0)));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut tbl = SymbolTable::new();
        tbl.define("x", "int", Kind::Field).unwrap();

        assert_eq!(
            tbl.define("x", "int", Kind::Static),
            Err(JackError::duplicate_name("x"))
        );
        assert_eq!(tbl.var_count(Kind::Static), 0);

        tbl.start_subroutine();
        tbl.define("y", "int", Kind::Argument).unwrap();

        assert!(tbl.define("y", "int", Kind::Local).is_err());
        assert_eq!(tbl.var_count(Kind::Local), 0);
    }

    #[test]
    fn display_orders_by_kind_and_index() {
        let mut tbl = SymbolTable::new();
        tbl.define("b", "int", Kind::Field).unwrap();
        tbl.define("a", "int", Kind::Static).unwrap();
        tbl.start_subroutine();
        tbl.define("c", "char", Kind::Local).unwrap();

        assert_eq!(
            tbl.to_string(),
            "{a -> (int, Static, 0), b -> (int, Field, 0), c -> (char, Local, 0)}"
        );
    }
}
