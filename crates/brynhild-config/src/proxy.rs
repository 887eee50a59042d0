//! [`MutableProxy`]: explicit write access into a nested path of a
//! [`crate::DeepChainMap`].

use crate::map::DeepChainMap;
use crate::value::Value;

/// A handle for writing to a nested path under a [`DeepChainMap`].
///
/// Obtained via [`DeepChainMap::mutable`]. All writes route into
/// `front_layer` at the proxy's path prefix and invalidate only the
/// top-level cache key of that prefix — never the whole cache.
pub struct MutableProxy<'a> {
    map: &'a mut DeepChainMap,
    path: Vec<String>,
}

impl<'a> MutableProxy<'a> {
    pub(crate) fn new(map: &'a mut DeepChainMap, path: Vec<String>) -> Self {
        Self { map, path }
    }

    /// Descend into a child key, returning a proxy scoped one level deeper.
    #[must_use]
    pub fn child(&mut self, key: &str) -> MutableProxy<'_> {
        let mut path = self.path.clone();
        path.push(key.to_string());
        MutableProxy::new(self.map, path)
    }

    /// Write `value` at `key` under this proxy's path.
    pub fn set(&mut self, key: &str, value: Value) {
        let mut path = self.path.clone();
        path.push(key.to_string());
        self.map.write_front_path(&path, value);
    }

    /// Delete `key` under this proxy's path.
    pub fn delete(&mut self, key: &str) {
        let mut path = self.path.clone();
        path.push(key.to_string());
        self.map.delete_front_path(&path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::collections::BTreeMap;

    #[test]
    fn nested_proxy_write_invalidates_only_top_key() {
        let mut outer = BTreeMap::new();
        outer.insert("x".to_string(), Value::Int(1));
        let mut top = BTreeMap::new();
        top.insert("a".to_string(), Value::Map(outer));
        top.insert("b".to_string(), Value::Int(5));
        let mut dcm = DeepChainMap::new(vec![Value::Map(top)]);

        let b_before = dcm.get("b").unwrap();
        {
            let mut proxy = dcm.mutable("a");
            let mut child = proxy.child("deep");
            child.set("y", Value::Int(2));
        }
        let b_after = dcm.get("b").unwrap();
        assert_eq!(b_before, b_after);
    }
}
