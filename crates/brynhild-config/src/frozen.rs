//! Read-only views returned by [`crate::DeepChainMap`] reads.
//!
//! Any value read out of a `DeepChainMap` is wrapped in one of these. They
//! are not hashable (matching the source's container), and nested reads
//! through them return frozen views recursively.

use crate::value::Value;

/// A read-only view over a mapping-typed configuration value.
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenMapping(Value);

/// A read-only view over a sequence-typed configuration value.
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenSequence(Value);

/// Any frozen configuration value: a scalar, a [`FrozenMapping`], or a
/// [`FrozenSequence`].
#[derive(Debug, Clone, PartialEq)]
pub enum Frozen {
    /// A scalar leaf (string, number, bool, null).
    Scalar(Value),
    /// A frozen mapping.
    Mapping(FrozenMapping),
    /// A frozen sequence.
    Sequence(FrozenSequence),
}

impl Frozen {
    /// Freeze a raw value (recursively, though the wrapping is lazy — child
    /// access re-wraps on demand via [`FrozenMapping::get`] /
    /// [`FrozenSequence::get`]).
    #[must_use]
    pub fn new(value: Value) -> Self {
        match value.unwrap_marker() {
            Value::Map(_) => Frozen::Mapping(FrozenMapping(value)),
            Value::List(_) => Frozen::Sequence(FrozenSequence(value)),
            _ => Frozen::Scalar(value),
        }
    }

    /// Unwrap to a plain [`Value`], discarding the frozen wrapper
    /// (recursively plain — used by `to_dict()`).
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Frozen::Scalar(v) => v,
            Frozen::Mapping(m) => m.0,
            Frozen::Sequence(s) => s.0,
        }
    }
}

impl FrozenMapping {
    /// Wrap a map-typed value.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Look up a key, returning a frozen view of the value if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Frozen> {
        self.0.as_map()?.get(key).cloned().map(Frozen::new)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.as_map().is_some_and(|m| m.contains_key(key))
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.as_map().map_or(0, BTreeMapExt::len)
    }

    /// Whether the mapping has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over keys.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.as_map().into_iter().flat_map(|m| m.keys())
    }

    /// Attempting to mutate a frozen mapping always fails; this method
    /// exists to document and exercise that boundary in tests.
    ///
    /// # Errors
    /// Always returns [`crate::ConfigError::Frozen`].
    pub fn set(&mut self, _key: &str, _value: Value) -> Result<(), crate::ConfigError> {
        Err(crate::ConfigError::Frozen { kind: "mapping" })
    }
}

trait BTreeMapExt {
    fn len(&self) -> usize;
}
impl BTreeMapExt for std::collections::BTreeMap<String, Value> {
    fn len(&self) -> usize {
        std::collections::BTreeMap::len(self)
    }
}

impl FrozenSequence {
    /// Wrap a list-typed value.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Look up an index, returning a frozen view of the value if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Frozen> {
        self.0.as_list()?.get(index).cloned().map(Frozen::new)
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.as_list().map_or(0, Vec::len)
    }

    /// Whether the sequence has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attempting to mutate a frozen sequence always fails.
    ///
    /// # Errors
    /// Always returns [`crate::ConfigError::Frozen`].
    pub fn push(&mut self, _value: Value) -> Result<(), crate::ConfigError> {
        Err(crate::ConfigError::Frozen { kind: "sequence" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_map() -> Value {
        let mut inner = BTreeMap::new();
        inner.insert("x".to_string(), Value::Int(1));
        let mut outer = BTreeMap::new();
        outer.insert("a".to_string(), Value::Map(inner));
        outer.insert("b".to_string(), Value::List(vec![Value::Int(1), Value::Int(2)]));
        Value::Map(outer)
    }

    #[test]
    fn nested_reads_stay_frozen() {
        let frozen = Frozen::new(sample_map());
        let Frozen::Mapping(m) = frozen else { panic!("expected mapping") };
        let nested = m.get("a").expect("present");
        assert!(matches!(nested, Frozen::Mapping(_)));
        let seq = m.get("b").expect("present");
        assert!(matches!(seq, Frozen::Sequence(_)));
    }

    #[test]
    fn mutation_always_errors() {
        let mut m = FrozenMapping::new(sample_map());
        assert!(m.set("x", Value::Int(1)).is_err());
        let mut s = FrozenSequence::new(Value::List(vec![]));
        assert!(s.push(Value::Int(1)).is_err());
    }
}
