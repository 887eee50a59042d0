//! Deep-merge algorithm shared by [`crate::DeepChainMap`]'s read path.
//!
//! Generalizes the teacher's two-argument `deep_merge(base, overlay)` to a
//! fold over an arbitrary number of layers, plus an optional provenance
//! pass that records which layer each leaf came from.

use std::collections::BTreeMap;

use crate::value::Value;

/// Merge `overlay` on top of `base`. `overlay` wins on any conflict;
/// recursion only happens when both sides are maps at the same key.
/// `Value::Replace` on the overlay side discards `base` entirely and
/// substitutes the marker's inner value.
#[must_use]
pub fn merge_pair(base: &Value, overlay: &Value) -> Value {
    match overlay {
        Value::Replace(inner) => (**inner).clone(),
        Value::Map(om) => match base {
            Value::Map(bm) => {
                let mut result = bm.clone();
                for (k, v) in om {
                    match result.get(k) {
                        Some(existing) if matches!(existing, Value::Map(_)) && matches!(v, Value::Map(_)) => {
                            result.insert(k.clone(), merge_pair(existing, v));
                        }
                        _ => {
                            result.insert(k.clone(), v.clone());
                        }
                    }
                }
                Value::Map(result)
            }
            _ => Value::Map(om.clone()),
        },
        other => other.clone(),
    }
}

/// Fold a list of candidate values for one top-level key into a single
/// merged value. `candidates` must be ordered **highest priority first**
/// (e.g. `front_layer[k]`, then `L0[k]`, `L1[k]`, …), containing only the
/// layers where the key is actually present.
#[must_use]
pub fn merge_candidates(candidates: &[&Value]) -> Value {
    let mut iter = candidates.iter().rev();
    let Some(first) = iter.next() else {
        return Value::Null;
    };
    let mut acc = (*first).clone();
    for next in iter {
        acc = merge_pair(&acc, next);
    }
    acc
}

/// A provenance tree: for a map, one entry per key; for a leaf, the layer
/// index that contributed the final value (`-1` = front layer, `n` = `Lₙ`).
#[derive(Debug, Clone, PartialEq)]
pub enum Provenance {
    /// A leaf value's origin layer.
    Leaf(i64),
    /// A map's per-key provenance.
    Map(BTreeMap<String, Provenance>),
}

/// Like [`merge_candidates`], but also returns a [`Provenance`] tree.
/// `candidates` is a parallel list of `(layer_index, value)` pairs ordered
/// highest priority first, where `layer_index` is `-1` for the front layer
/// and the source layer's position otherwise.
#[must_use]
pub fn merge_candidates_tracking(candidates: &[(i64, &Value)]) -> (Value, Provenance) {
    let mut iter = candidates.iter().rev();
    let Some((idx0, first)) = iter.next() else {
        return (Value::Null, Provenance::Leaf(-1));
    };
    let mut acc = (*first).clone();
    let mut prov = leaf_provenance(*idx0, &acc);
    for (idx, next) in iter {
        let (merged, merged_prov) = merge_pair_tracking(&acc, &prov, next, *idx);
        acc = merged;
        prov = merged_prov;
    }
    (acc, prov)
}

fn leaf_provenance(idx: i64, v: &Value) -> Provenance {
    match v {
        Value::Map(m) => Provenance::Map(m.keys().map(|k| (k.clone(), Provenance::Leaf(idx))).collect()),
        _ => Provenance::Leaf(idx),
    }
}

fn merge_pair_tracking(
    base: &Value,
    base_prov: &Provenance,
    overlay: &Value,
    overlay_idx: i64,
) -> (Value, Provenance) {
    match overlay {
        Value::Replace(inner) => ((**inner).clone(), leaf_provenance(overlay_idx, inner)),
        Value::Map(om) => match base {
            Value::Map(bm) => {
                let mut result = bm.clone();
                let empty = BTreeMap::new();
                let base_map_prov = match base_prov {
                    Provenance::Map(m) => m,
                    Provenance::Leaf(_) => &empty,
                };
                let mut prov_map = base_map_prov.clone();
                for (k, v) in om {
                    match result.get(k) {
                        Some(existing) if matches!(existing, Value::Map(_)) && matches!(v, Value::Map(_)) => {
                            let child_base_prov = base_map_prov
                                .get(k)
                                .cloned()
                                .unwrap_or_else(|| leaf_provenance(overlay_idx, existing));
                            let (merged, merged_prov) =
                                merge_pair_tracking(existing, &child_base_prov, v, overlay_idx);
                            result.insert(k.clone(), merged);
                            prov_map.insert(k.clone(), merged_prov);
                        }
                        _ => {
                            result.insert(k.clone(), v.clone());
                            prov_map.insert(k.clone(), leaf_provenance(overlay_idx, v));
                        }
                    }
                }
                (Value::Map(result), Provenance::Map(prov_map))
            }
            _ => (Value::Map(om.clone()), leaf_provenance(overlay_idx, overlay)),
        },
        other => (other.clone(), Provenance::Leaf(overlay_idx)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(pairs: &[(&str, Value)]) -> Value {
        Value::Map(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    #[test]
    fn non_mapping_overlay_wins_outright() {
        let base = m(&[("a", Value::Int(1)), ("b", Value::Int(2))]);
        let overlay = Value::String("replaced".into());
        assert_eq!(merge_pair(&base, &overlay), Value::String("replaced".into()));
    }

    #[test]
    fn maps_merge_recursively() {
        let base = m(&[("a", m(&[("x", Value::Int(1)), ("y", Value::Int(2))]))]);
        let overlay = m(&[("a", m(&[("y", Value::Int(20)), ("z", Value::Int(3))]))]);
        let merged = merge_pair(&base, &overlay);
        let expected = m(&[("a", m(&[("x", Value::Int(1)), ("y", Value::Int(20)), ("z", Value::Int(3))]))]);
        assert_eq!(merged, expected);
    }

    #[test]
    fn lists_replace_not_concatenate() {
        let base = m(&[("a", Value::List(vec![Value::Int(1), Value::Int(2)]))]);
        let overlay = m(&[("a", Value::List(vec![Value::Int(9)]))]);
        let merged = merge_pair(&base, &overlay);
        assert_eq!(merged, m(&[("a", Value::List(vec![Value::Int(9)]))]));
    }

    #[test]
    fn replace_marker_discards_lower_layers() {
        let base = m(&[("a", Value::Int(1))]);
        let overlay = m(&[("a", Value::Int(99).replace_marker())]);
        let merged = merge_pair(&base, &overlay);
        assert_eq!(merged, m(&[("a", Value::Int(99))]));
    }

    #[test]
    fn three_layer_fold_respects_priority() {
        // front (highest) > L0 > L1 (lowest)
        let front = m(&[("a", Value::Int(1))]);
        let l0 = m(&[("a", Value::Int(2)), ("b", Value::Int(20))]);
        let l1 = m(&[("a", Value::Int(3)), ("b", Value::Int(30)), ("c", Value::Int(300))]);
        let candidates: Vec<&Value> = vec![&front, &l0, &l1];
        let merged = merge_candidates(&candidates);
        assert_eq!(merged, m(&[("a", Value::Int(1)), ("b", Value::Int(20)), ("c", Value::Int(300))]));
    }

    #[test]
    fn provenance_tracks_winning_layer() {
        let front = m(&[("a", Value::Int(1))]);
        let l0 = m(&[("a", Value::Int(2)), ("b", Value::Int(20))]);
        let candidates: Vec<(i64, &Value)> = vec![(-1, &front), (0, &l0)];
        let (merged, prov) = merge_candidates_tracking(&candidates);
        assert_eq!(merged, m(&[("a", Value::Int(1)), ("b", Value::Int(20))]));
        match prov {
            Provenance::Map(map) => {
                assert_eq!(map.get("a"), Some(&Provenance::Leaf(-1)));
                assert_eq!(map.get("b"), Some(&Provenance::Leaf(0)));
            }
            Provenance::Leaf(_) => panic!("expected map provenance"),
        }
    }
}
