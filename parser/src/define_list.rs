//! Macro define table

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name to integer table shared by `@set` and `@if` directives.
/// Names that were never defined read as `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefineList {
    values: BTreeMap<String, i64>,
}

impl DefineList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> i64 {
        self.values.get(name).copied().unwrap_or(0)
    }

    pub fn set(&mut self, name: impl Into<String>, value: i64) {
        self.values.insert(name.into(), value);
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Merge `other` into this table; entries from `other` win
    pub fn concat(&mut self, other: &DefineList) {
        for (name, value) in &other.values {
            self.values.insert(name.clone(), *value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for DefineList {
    fn from_iter<T: IntoIterator<Item = (S, i64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(name, value)| (name.into(), value)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_reads_zero() {
        let defines = DefineList::new();
        assert_eq!(defines.get("missing"), 0);
        assert!(!defines.is_defined("missing"));
    }

    #[test]
    fn test_concat_overrides() {
        let mut base: DefineList = [("a", 1), ("b", 2)].into_iter().collect();
        let extra: DefineList = [("b", 5), ("c", 3)].into_iter().collect();
        base.concat(&extra);
        assert_eq!(base.get("a"), 1);
        assert_eq!(base.get("b"), 5);
        assert_eq!(base.get("c"), 3);
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn test_clone_is_isolated() {
        let mut base = DefineList::new();
        base.set("x", 1);
        let mut copy = base.clone();
        copy.set("x", 2);
        assert_eq!(base.get("x"), 1);
    }
}
