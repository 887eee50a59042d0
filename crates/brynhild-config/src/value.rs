//! The dynamically-typed value carried by a [`crate::DeepChainMap`] layer.

use std::collections::BTreeMap;

/// A configuration value.
///
/// This mirrors the shape of `serde_json::Value`/`serde_yaml::Value` but
/// adds [`Value::Replace`], the `ReplaceMarker` sentinel from spec §3: when
/// present at a node during merge, it stops the merge from descending into
/// lower-priority layers at that node and substitutes its inner value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The JSON/YAML null value.
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
    /// An ordered list. Lists replace rather than concatenate under default
    /// merge semantics (spec §3).
    List(Vec<Value>),
    /// A mapping. Mappings merge recursively.
    Map(BTreeMap<String, Value>),
    /// A `ReplaceMarker(v)`: halts merge descent at this node. Unhashable
    /// by design — callers must not use a `Value::Replace` as a map key.
    Replace(Box<Value>),
}

impl Value {
    /// Construct an empty map value.
    #[must_use]
    pub fn empty_map() -> Self {
        Self::Map(BTreeMap::new())
    }

    /// Wrap `self` in a `ReplaceMarker`.
    #[must_use]
    pub fn replace_marker(self) -> Self {
        Self::Replace(Box::new(self))
    }

    /// Unwrap one level of `ReplaceMarker`, if present.
    #[must_use]
    pub fn unwrap_marker(&self) -> &Value {
        match self {
            Self::Replace(inner) => inner.unwrap_marker(),
            other => other,
        }
    }

    /// View as a map, if this value is a map (after unwrapping markers).
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self.unwrap_marker() {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// View as a mutable map, if this value is a map. Does not unwrap
    /// markers — intended for front/delete layer writes, which never
    /// contain markers.
    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// View as a list, if this value is a list (after unwrapping markers).
    #[must_use]
    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self.unwrap_marker() {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Mutable list view, without unwrapping markers.
    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(a) => Value::List(a.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(o) => {
                Value::Map(o.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::Number(i.into()),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::List(l) => serde_json::Value::Array(l.into_iter().map(Into::into).collect()),
            Value::Map(m) => serde_json::Value::Object(
                m.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
            Value::Replace(inner) => (*inner).into(),
        }
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(v: serde_yaml::Value) -> Self {
        match v {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or_default())
                }
            }
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(s) => {
                Value::List(s.into_iter().map(Value::from).collect())
            }
            serde_yaml::Value::Mapping(m) => Value::Map(
                m.into_iter()
                    .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), Value::from(v))))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(t) => Value::from(t.value),
        }
    }
}
