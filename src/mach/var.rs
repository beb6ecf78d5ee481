use super::{Precision, Val};
use crate::error;
use crate::lang::Error;
use std::collections::HashMap;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Longest variable name kept. Longer names are truncated.
pub const MAX_NAME_LEN: usize = 31;

/// ## Variable memory
///
/// Names are case insensitive and keep the spelling of their first
/// assignment. Each entry remembers the evaluation frame in which it
/// was last announced to the host.

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: Rc<str>,
    pub val: Val,
    pub frame: usize,
}

#[derive(Debug, Default)]
pub struct Var {
    vars: HashMap<String, Entry>,
}

fn truncate(name: &str) -> &str {
    match name.char_indices().nth(MAX_NAME_LEN) {
        Some((at, _)) => &name[..at],
        None => name,
    }
}

fn key(name: &str) -> String {
    truncate(name).to_ascii_lowercase()
}

/// Values which would print the same. Floats compare within 1e-5.
pub fn same_value(lhs: &Val, rhs: &Val) -> bool {
    const EPSILON: f64 = 0.00001;
    match (lhs, rhs) {
        (Val::Int(a), Val::Int(b)) => a == b,
        (Val::Int32(a), Val::Int32(b)) => a == b,
        (Val::Double(a), Val::Double(b)) => (a - b).abs() < EPSILON,
        (Val::Float(a), Val::Float(b)) => ((a - b).abs() as f64) < EPSILON,
        (Val::Measure(a, x), Val::Measure(b, y)) => x == y && (a - b).abs() < EPSILON,
        (Val::Str(a), Val::Str(b)) => a == b,
        _ => false,
    }
}

impl Var {
    pub fn new() -> Var {
        Var::default()
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<&Val> {
        self.vars.get(&key(name)).map(|entry| &entry.val)
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Val> {
        self.vars.get_mut(&key(name)).map(|entry| &mut entry.val)
    }

    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.vars.get(&key(name))
    }

    /// A variable never assigned reads as integer zero.
    pub fn fetch(&self, name: &str, precision: Precision) -> Val {
        match self.lookup(name) {
            Some(val) => val.clone(),
            None => Val::int(0, precision),
        }
    }

    pub fn upsert(&mut self, name: &str, val: Val) -> Result<()> {
        let key = key(name);
        match self.vars.get_mut(&key) {
            Some(entry) => entry.val = val,
            None => {
                if self.vars.len() >= u16::max_value() as usize {
                    return Err(error!(NoMem; "TOO MANY VARIABLES"));
                }
                let entry = Entry {
                    name: truncate(name).into(),
                    val,
                    frame: 0,
                };
                self.vars.insert(key, entry);
            }
        }
        Ok(())
    }

    /// Record that the variable was shown in `frame`.
    pub fn mark(&mut self, name: &str, frame: usize) {
        if let Some(entry) = self.vars.get_mut(&key(name)) {
            entry.frame = frame;
        }
    }

    /// A variable holding the same value. When several do, the one
    /// with the lowest name wins so results are stable.
    pub fn find_by_value(&self, val: &Val) -> Option<&Entry> {
        self.vars
            .iter()
            .filter(|(_, entry)| same_value(&entry.val, val))
            .min_by(|a, b| a.0.cmp(b.0))
            .map(|(_, entry)| entry)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.vars.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive() {
        let mut var = Var::new();
        var.upsert("Speed", Val::Int(3)).unwrap();
        var.upsert("SPEED", Val::Int(4)).unwrap();
        assert_eq!(var.len(), 1);
        assert_eq!(var.lookup("speed"), Some(&Val::Int(4)));
        assert_eq!(&*var.entry("speed").unwrap().name, "Speed");
    }

    #[test]
    fn test_default_zero() {
        let var = Var::new();
        assert_eq!(var.fetch("x", Precision::Bits64), Val::Int(0));
        assert_eq!(var.fetch("x", Precision::Bits32), Val::Int32(0));
    }

    #[test]
    fn test_long_names() {
        let mut var = Var::new();
        let long = "a".repeat(40);
        var.upsert(&long, Val::Int(1)).unwrap();
        assert_eq!(var.lookup(&"A".repeat(31)), Some(&Val::Int(1)));
        assert_eq!(var.entry(&long).unwrap().name.len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_find_by_value() {
        let mut var = Var::new();
        var.upsert("b", Val::Double(0.5)).unwrap();
        var.upsert("a", Val::Double(0.500001)).unwrap();
        var.upsert("c", Val::Str("x".into())).unwrap();
        assert_eq!(&*var.find_by_value(&Val::Double(0.5)).unwrap().name, "a");
        assert_eq!(&*var.find_by_value(&Val::Str("x".into())).unwrap().name, "c");
        assert!(var.find_by_value(&Val::Float(0.5)).is_none());
        assert!(var.find_by_value(&Val::Double(0.6)).is_none());
        var.clear();
        assert!(var.is_empty());
    }

    #[test]
    fn test_mark() {
        let mut var = Var::new();
        var.upsert("a", Val::Int(1)).unwrap();
        var.mark("A", 7);
        assert_eq!(var.entry("a").unwrap().frame, 7);
        assert_eq!(var.lookup("A"), Some(&Val::Int(1)));
    }
}
