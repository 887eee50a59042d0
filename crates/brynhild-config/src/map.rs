//! [`DeepChainMap`]: the layered deep-merge configuration mapping.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::error::{ConfigError, ConfigResult};
use crate::frozen::Frozen;
use crate::merge::{merge_candidates, merge_candidates_tracking, Provenance};
use crate::proxy::MutableProxy;
use crate::value::Value;

/// A single registered list operation against a dotted path.
#[derive(Debug, Clone, PartialEq)]
pub enum ListOp {
    /// Append a value to the end.
    Append(Value),
    /// Prepend a value to the start.
    Prepend(Value),
    /// Extend with another list's elements.
    Extend(Vec<Value>),
    /// Insert a value at an index.
    Insert(usize, Value),
    /// Remove the first element equal to a value.
    Remove(Value),
    /// Clear the list.
    Clear,
}

/// The layered deep-merge mapping described in spec §3/§4.1.
///
/// Holds a stack of immutable source layers `L0..Ln` (priority descending,
/// `L0` highest), a mutable `front_layer` overlay that absorbs all writes,
/// a set of deleted top-level keys, and a keyed list of registered list
/// operations. Reads are cached per top-level key; any structural change
/// (layer add/remove, list-op registration, front/delete-layer writes)
/// drops the relevant cache entries.
pub struct DeepChainMap {
    front_layer: Value,
    delete_layer: HashSet<String>,
    layers: Vec<Value>,
    list_ops: HashMap<Vec<String>, Vec<ListOp>>,
    cache: RefCell<HashMap<String, Value>>,
    track_provenance: bool,
}

impl DeepChainMap {
    /// Construct from ordered source layers, highest priority first.
    #[must_use]
    pub fn new(layers: Vec<Value>) -> Self {
        Self::with_provenance(layers, false)
    }

    /// Like [`DeepChainMap::new`], with provenance tracking enabled.
    /// Provenance tracking only costs an extra pass on explicit
    /// `get_with_provenance` calls — it is not part of the normal read
    /// hot path.
    #[must_use]
    pub fn with_provenance(layers: Vec<Value>, track_provenance: bool) -> Self {
        Self {
            front_layer: Value::empty_map(),
            delete_layer: HashSet::new(),
            layers,
            list_ops: HashMap::new(),
            cache: RefCell::new(HashMap::new()),
            track_provenance,
        }
    }

    fn invalidate_all(&self) {
        self.cache.borrow_mut().clear();
    }

    fn invalidate(&self, key: &str) {
        self.cache.borrow_mut().remove(key);
    }

    /// Insert a new source layer at `index` (0 = highest priority among
    /// source layers). Drops the whole cache.
    pub fn add_layer(&mut self, index: usize, data: Value) {
        let index = index.min(self.layers.len());
        self.layers.insert(index, data);
        self.invalidate_all();
    }

    /// Append a layer at the lowest priority.
    pub fn push_layer(&mut self, data: Value) {
        let idx = self.layers.len();
        self.add_layer(idx, data);
    }

    /// Remove and return the layer at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn remove_layer(&mut self, index: usize) -> Value {
        let removed = self.layers.remove(index);
        self.invalidate_all();
        removed
    }

    /// The current source layers, outermost (highest priority) first.
    #[must_use]
    pub fn layers(&self) -> &[Value] {
        &self.layers
    }

    /// Register a list operation against `path` (a sequence of map keys
    /// from the top level down to — but not including — the list itself).
    /// Operations apply in registration order, after the deep-merge step.
    pub fn register_list_op(&mut self, path: Vec<String>, op: ListOp) {
        let top = path.first().cloned();
        self.list_ops.entry(path).or_default().push(op);
        if let Some(top) = top {
            self.invalidate(&top);
        } else {
            self.invalidate_all();
        }
    }

    fn candidates_for<'a>(&'a self, key: &str) -> Vec<&'a Value> {
        let mut out = Vec::new();
        if let Some(m) = self.front_layer.as_map() {
            if let Some(v) = m.get(key) {
                out.push(v);
            }
        }
        if !self.delete_layer.contains(key) {
            for layer in &self.layers {
                if let Some(m) = layer.as_map() {
                    if let Some(v) = m.get(key) {
                        out.push(v);
                    }
                }
            }
        }
        out
    }

    fn apply_list_ops_at_key(&self, key: &str, value: Value) -> Value {
        let mut value = value;
        for (path, ops) in &self.list_ops {
            if path.first().map(String::as_str) != Some(key) {
                continue;
            }
            apply_ops_at_path(&mut value, &path[1..], ops);
        }
        value
    }

    /// Read the merged value at top-level key `key`.
    ///
    /// # Errors
    /// Returns [`ConfigError::KeyNotFound`] if `key` is not visible in any
    /// layer.
    pub fn get(&self, key: &str) -> ConfigResult<Frozen> {
        if let Some(cached) = self.cache.borrow().get(key) {
            return Ok(Frozen::new(cached.clone()));
        }
        let candidates = self.candidates_for(key);
        if candidates.is_empty() {
            return Err(ConfigError::KeyNotFound(key.to_string()));
        }
        let merged = merge_candidates(&candidates);
        let merged = self.apply_list_ops_at_key(key, merged);
        self.cache.borrow_mut().insert(key.to_string(), merged.clone());
        Ok(Frozen::new(merged))
    }

    /// `true` if `key` is visible (present in the front layer or any
    /// source layer, and not deleted).
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        !self.candidates_for(key).is_empty()
    }

    /// All visible top-level keys (front layer keys ∪ every source layer's
    /// keys, minus deleted keys).
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut push = |k: &String| {
            if !self.delete_layer.contains(k) && seen.insert(k.clone()) {
                out.push(k.clone());
            }
        };
        if let Some(m) = self.front_layer.as_map() {
            for k in m.keys() {
                push(k);
            }
        }
        for layer in &self.layers {
            if let Some(m) = layer.as_map() {
                for k in m.keys() {
                    push(k);
                }
            }
        }
        out
    }

    /// Number of visible top-level keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys().len()
    }

    /// Whether there are no visible keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `dcm[k] = v`: write to the front layer, clearing the delete marker
    /// and the per-key cache entry.
    pub fn set(&mut self, key: &str, value: Value) {
        if let Some(m) = self.front_layer.as_map_mut() {
            m.insert(key.to_string(), value);
        }
        self.delete_layer.remove(key);
        self.invalidate(key);
    }

    /// `del dcm[k]`: mark `key` deleted.
    ///
    /// # Errors
    /// [`ConfigError::KeyNotFound`] if `key` is not currently visible.
    pub fn delete(&mut self, key: &str) -> ConfigResult<()> {
        if !self.contains(key) {
            return Err(ConfigError::KeyNotFound(key.to_string()));
        }
        self.delete_layer.insert(key.to_string());
        if let Some(m) = self.front_layer.as_map_mut() {
            m.remove(key);
        }
        self.invalidate(key);
        Ok(())
    }

    /// Obtain a [`MutableProxy`] for nested writes under `key`. Writes
    /// through the proxy route into `front_layer` and invalidate only
    /// `key`'s cache entry.
    pub fn mutable(&mut self, key: &str) -> MutableProxy<'_> {
        MutableProxy::new(self, vec![key.to_string()])
    }

    pub(crate) fn write_front_path(&mut self, path: &[String], value: Value) {
        if path.is_empty() {
            return;
        }
        ensure_map_path(&mut self.front_layer, &path[..path.len() - 1]);
        if let Some(parent) = navigate_mut(&mut self.front_layer, &path[..path.len() - 1]) {
            if let Some(m) = parent.as_map_mut() {
                m.insert(path[path.len() - 1].clone(), value);
            }
        }
        self.invalidate(&path[0]);
    }

    pub(crate) fn delete_front_path(&mut self, path: &[String]) {
        if path.is_empty() {
            return;
        }
        if let Some(parent) = navigate_mut(&mut self.front_layer, &path[..path.len() - 1]) {
            if let Some(m) = parent.as_map_mut() {
                m.remove(&path[path.len() - 1]);
            }
        }
        self.invalidate(&path[0]);
    }

    /// `own_list(path)`: copy the currently-visible list at a dotted
    /// `path` (top-level key first) into `front_layer` as a plain mutable
    /// list, so subsequent in-place mutation is local.
    ///
    /// # Errors
    /// [`ConfigError::KeyNotFound`] if the path does not resolve to a
    /// list.
    pub fn own_list(&mut self, path: &[&str]) -> ConfigResult<()> {
        let Some((top, rest)) = path.split_first() else {
            return Err(ConfigError::KeyNotFound(String::new()));
        };
        let frozen = self.get(top)?;
        let mut current = frozen.into_value();
        for part in rest {
            current = current
                .as_map()
                .and_then(|m| m.get(*part))
                .cloned()
                .ok_or_else(|| ConfigError::KeyNotFound(path.join(".")))?;
        }
        if current.as_list().is_none() {
            return Err(ConfigError::KeyNotFound(path.join(".")));
        }
        let owned_path: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        self.write_front_path(&owned_path, current);
        Ok(())
    }

    /// Fully-merged deep copy of every visible key, as a plain [`Value`].
    #[must_use]
    pub fn to_dict(&self) -> Value {
        let mut out = std::collections::BTreeMap::new();
        for k in self.keys() {
            if let Ok(v) = self.get(&k) {
                out.insert(k, v.into_value());
            }
        }
        Value::Map(out)
    }

    /// Drop all cached merges. Does not change observable reads unless the
    /// underlying layers have been mutated out from under this map (e.g.
    /// via external file changes re-read by a caller before calling this).
    pub fn reload(&mut self) {
        self.invalidate_all();
    }

    /// Read a key along with a provenance tree recording which layer each
    /// leaf came from (`-1` = front layer, `n` = `Lₙ`).
    ///
    /// # Errors
    /// [`ConfigError::ProvenanceDisabled`] if this map was not constructed
    /// with provenance tracking enabled; [`ConfigError::KeyNotFound`] if
    /// the key is not visible.
    pub fn get_with_provenance(&self, key: &str) -> ConfigResult<(Frozen, Provenance)> {
        if !self.track_provenance {
            return Err(ConfigError::ProvenanceDisabled);
        }
        let mut candidates: Vec<(i64, &Value)> = Vec::new();
        if let Some(m) = self.front_layer.as_map() {
            if let Some(v) = m.get(key) {
                candidates.push((-1, v));
            }
        }
        if !self.delete_layer.contains(key) {
            for (i, layer) in self.layers.iter().enumerate() {
                if let Some(m) = layer.as_map() {
                    if let Some(v) = m.get(key) {
                        candidates.push((i as i64, v));
                    }
                }
            }
        }
        if candidates.is_empty() {
            return Err(ConfigError::KeyNotFound(key.to_string()));
        }
        let (value, prov) = merge_candidates_tracking(&candidates);
        let value = self.apply_list_ops_at_key(key, value);
        Ok((Frozen::new(value), prov))
    }
}

fn apply_ops_at_path(value: &mut Value, path: &[String], ops: &[ListOp]) {
    if path.is_empty() {
        if let Value::List(list) = value {
            for op in ops {
                match op {
                    ListOp::Append(v) => list.push(v.clone()),
                    ListOp::Prepend(v) => list.insert(0, v.clone()),
                    ListOp::Extend(vs) => list.extend(vs.iter().cloned()),
                    ListOp::Insert(i, v) => {
                        let i = (*i).min(list.len());
                        list.insert(i, v.clone());
                    }
                    ListOp::Remove(v) => {
                        if let Some(pos) = list.iter().position(|x| x == v) {
                            list.remove(pos);
                        }
                    }
                    ListOp::Clear => list.clear(),
                }
            }
        }
        return;
    }
    if let Value::Map(m) = value {
        if let Some(child) = m.get_mut(&path[0]) {
            apply_ops_at_path(child, &path[1..], ops);
        }
    }
}

fn navigate_mut<'a>(value: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    let mut current = value;
    for part in path {
        current = current.as_map_mut()?.get_mut(part)?;
    }
    Some(current)
}

fn ensure_map_path(value: &mut Value, path: &[String]) {
    let mut current = value;
    for part in path {
        if current.as_map_mut().is_none() {
            *current = Value::empty_map();
        }
        let map = current.as_map_mut().expect("just ensured");
        current = map.entry(part.clone()).or_insert_with(Value::empty_map);
    }
    if current.as_map_mut().is_none() {
        *current = Value::empty_map();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn map_value(pairs: &[(&str, Value)]) -> Value {
        Value::Map(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    #[test]
    fn missing_key_is_key_not_found() {
        let dcm = DeepChainMap::new(vec![map_value(&[("a", Value::Int(1))])]);
        assert!(dcm.get("missing").is_err());
        assert!(!dcm.contains("missing"));
    }

    #[test]
    fn layer_priority_l0_is_highest() {
        let l0 = map_value(&[("a", Value::Int(1))]);
        let l1 = map_value(&[("a", Value::Int(2)), ("b", Value::Int(3))]);
        let dcm = DeepChainMap::new(vec![l0, l1]);
        let Frozen::Scalar(Value::Int(a)) = dcm.get("a").unwrap() else { panic!() };
        assert_eq!(a, 1);
        let Frozen::Scalar(Value::Int(b)) = dcm.get("b").unwrap() else { panic!() };
        assert_eq!(b, 3);
    }

    #[test]
    fn set_writes_front_layer_only() {
        let l0 = map_value(&[("a", Value::Int(1))]);
        let mut dcm = DeepChainMap::new(vec![l0]);
        dcm.set("a", Value::Int(42));
        let Frozen::Scalar(Value::Int(a)) = dcm.get("a").unwrap() else { panic!() };
        assert_eq!(a, 42);
        // the source layer itself is untouched
        assert_eq!(dcm.layers()[0], map_value(&[("a", Value::Int(1))]));
    }

    #[test]
    fn delete_marks_delete_layer_without_touching_source() {
        let l0 = map_value(&[("a", Value::Int(1))]);
        let mut dcm = DeepChainMap::new(vec![l0]);
        dcm.delete("a").unwrap();
        assert!(!dcm.contains("a"));
        assert_eq!(dcm.layers()[0], map_value(&[("a", Value::Int(1))]));
        assert!(dcm.delete("a").is_err());
    }

    #[test]
    fn repeated_reads_are_cached_and_equal() {
        let dcm = DeepChainMap::new(vec![map_value(&[("a", Value::Int(1))])]);
        let first = dcm.get("a").unwrap();
        let second = dcm.get("a").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn list_append_op_applies_after_merge() {
        let l0 = map_value(&[("items", Value::List(vec![Value::Int(1)]))]);
        let mut dcm = DeepChainMap::new(vec![l0]);
        dcm.register_list_op(vec!["items".to_string()], ListOp::Append(Value::Int(2)));
        let Frozen::Sequence(seq) = dcm.get("items").unwrap() else { panic!() };
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn add_and_remove_layer() {
        let mut dcm = DeepChainMap::new(vec![map_value(&[("a", Value::Int(1))])]);
        dcm.add_layer(0, map_value(&[("a", Value::Int(99))]));
        let Frozen::Scalar(Value::Int(a)) = dcm.get("a").unwrap() else { panic!() };
        assert_eq!(a, 99);
        let removed = dcm.remove_layer(0);
        assert_eq!(removed, map_value(&[("a", Value::Int(99))]));
        let Frozen::Scalar(Value::Int(a)) = dcm.get("a").unwrap() else { panic!() };
        assert_eq!(a, 1);
    }

    #[test]
    fn to_dict_is_plain_merged_map() {
        let dcm = DeepChainMap::new(vec![map_value(&[("a", Value::Int(1)), ("b", Value::Int(2))])]);
        let dict = dcm.to_dict();
        let Value::Map(m) = dict else { panic!() };
        let mut expected = BTreeMap::new();
        expected.insert("a".to_string(), Value::Int(1));
        expected.insert("b".to_string(), Value::Int(2));
        assert_eq!(m, expected);
    }

    #[test]
    fn reload_does_not_change_reads_when_layers_unchanged() {
        let mut dcm = DeepChainMap::new(vec![map_value(&[("a", Value::Int(1))])]);
        let before = dcm.get("a").unwrap();
        dcm.reload();
        let after = dcm.get("a").unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn provenance_disabled_by_default() {
        let dcm = DeepChainMap::new(vec![map_value(&[("a", Value::Int(1))])]);
        assert!(matches!(dcm.get_with_provenance("a"), Err(ConfigError::ProvenanceDisabled)));
    }

    #[test]
    fn provenance_enabled_reports_front_layer_as_minus_one() {
        let mut dcm = DeepChainMap::with_provenance(vec![map_value(&[("a", Value::Int(1))])], true);
        dcm.set("a", Value::Int(2));
        let (_value, prov) = dcm.get_with_provenance("a").unwrap();
        assert_eq!(prov, Provenance::Leaf(-1));
    }

    #[test]
    fn mutable_proxy_writes_front_layer() {
        let l0 = map_value(&[("a", map_value(&[("nested", Value::Int(1))]))]);
        let mut dcm = DeepChainMap::new(vec![l0]);
        {
            let mut proxy = dcm.mutable("a");
            proxy.set("nested", Value::Int(2));
        }
        let Frozen::Mapping(m) = dcm.get("a").unwrap() else { panic!() };
        let Frozen::Scalar(Value::Int(n)) = m.get("nested").unwrap() else { panic!() };
        assert_eq!(n, 2);
    }
}
