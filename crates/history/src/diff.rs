//! Structural JSON diff
//!
//! Produces a minimal list of pointer-addressed operations turning one JSON
//! value into another. Objects diff by key, arrays by index (with trailing
//! truncation/extension), everything else by replacement. The guarantee the
//! history stack depends on: `apply(a, &diff(a, b)) == b` for all values.

use serde_json::Value;

use crate::errors::HistoryError;

/// One step of a structural delta.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DiffOp {
    /// Write `value` at `pointer`, creating the object key or appending to
    /// the array when the final segment equals its length.
    Set { pointer: String, value: Value },

    /// Delete the object key or array element at `pointer`.
    Remove { pointer: String },
}

/// Compute the delta turning `a` into `b`.
pub fn diff(a: &Value, b: &Value) -> Vec<DiffOp> {
    let mut ops = Vec::new();
    diff_at(a, b, String::new(), &mut ops);
    ops
}

fn diff_at(a: &Value, b: &Value, path: String, ops: &mut Vec<DiffOp>) {
    match (a, b) {
        (Value::Object(ma), Value::Object(mb)) => {
            for key in ma.keys() {
                if !mb.contains_key(key) {
                    ops.push(DiffOp::Remove {
                        pointer: child(&path, key),
                    });
                }
            }
            for (key, vb) in mb {
                match ma.get(key) {
                    Some(va) => diff_at(va, vb, child(&path, key), ops),
                    None => ops.push(DiffOp::Set {
                        pointer: child(&path, key),
                        value: vb.clone(),
                    }),
                }
            }
        }
        (Value::Array(va), Value::Array(vb)) => {
            let shared = va.len().min(vb.len());
            for i in 0..shared {
                diff_at(&va[i], &vb[i], child(&path, &i.to_string()), ops);
            }
            // Appends in ascending order so each Set lands at the array tail.
            for (i, item) in vb.iter().enumerate().skip(shared) {
                ops.push(DiffOp::Set {
                    pointer: child(&path, &i.to_string()),
                    value: item.clone(),
                });
            }
            // Truncation removes from the back so indexes stay valid.
            for i in (shared..va.len()).rev() {
                ops.push(DiffOp::Remove {
                    pointer: child(&path, &i.to_string()),
                });
            }
        }
        _ => {
            if a != b {
                ops.push(DiffOp::Set {
                    pointer: path,
                    value: b.clone(),
                });
            }
        }
    }
}

/// Apply a delta produced by [`diff`] to `base`.
pub fn apply(base: &Value, ops: &[DiffOp]) -> Result<Value, HistoryError> {
    let mut doc = base.clone();
    for op in ops {
        match op {
            DiffOp::Set { pointer, value } => set_at(&mut doc, pointer, value.clone())?,
            DiffOp::Remove { pointer } => remove_at(&mut doc, pointer)?,
        }
    }
    Ok(doc)
}

fn child(path: &str, segment: &str) -> String {
    format!("{}/{}", path, escape(segment))
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Split a pointer into (parent segments, final segment).
fn split(pointer: &str) -> Result<(Vec<String>, String), HistoryError> {
    if !pointer.starts_with('/') {
        return Err(HistoryError::InvalidPointer(pointer.to_string()));
    }
    let mut segments: Vec<String> = pointer[1..].split('/').map(unescape).collect();
    let last = segments
        .pop()
        .ok_or_else(|| HistoryError::InvalidPointer(pointer.to_string()))?;
    Ok((segments, last))
}

fn descend<'a>(doc: &'a mut Value, segments: &[String], pointer: &str) -> Result<&'a mut Value, HistoryError> {
    let mut current = doc;
    for segment in segments {
        current = match current {
            Value::Object(map) => map
                .get_mut(segment)
                .ok_or_else(|| HistoryError::InvalidPointer(pointer.to_string()))?,
            Value::Array(items) => {
                let idx: usize = segment
                    .parse()
                    .map_err(|_| HistoryError::InvalidPointer(pointer.to_string()))?;
                items
                    .get_mut(idx)
                    .ok_or_else(|| HistoryError::OutOfBounds(pointer.to_string()))?
            }
            _ => return Err(HistoryError::InvalidPointer(pointer.to_string())),
        };
    }
    Ok(current)
}

fn set_at(doc: &mut Value, pointer: &str, value: Value) -> Result<(), HistoryError> {
    if pointer.is_empty() {
        *doc = value;
        return Ok(());
    }
    let (parents, last) = split(pointer)?;
    let target = descend(doc, &parents, pointer)?;
    match target {
        Value::Object(map) => {
            map.insert(last, value);
            Ok(())
        }
        Value::Array(items) => {
            let idx: usize = last
                .parse()
                .map_err(|_| HistoryError::InvalidPointer(pointer.to_string()))?;
            if idx < items.len() {
                items[idx] = value;
                Ok(())
            } else if idx == items.len() {
                items.push(value);
                Ok(())
            } else {
                Err(HistoryError::OutOfBounds(pointer.to_string()))
            }
        }
        _ => Err(HistoryError::InvalidPointer(pointer.to_string())),
    }
}

fn remove_at(doc: &mut Value, pointer: &str) -> Result<(), HistoryError> {
    if pointer.is_empty() {
        return Err(HistoryError::InvalidPointer("cannot remove root".into()));
    }
    let (parents, last) = split(pointer)?;
    let target = descend(doc, &parents, pointer)?;
    match target {
        Value::Object(map) => {
            map.remove(&last)
                .ok_or_else(|| HistoryError::InvalidPointer(pointer.to_string()))?;
            Ok(())
        }
        Value::Array(items) => {
            let idx: usize = last
                .parse()
                .map_err(|_| HistoryError::InvalidPointer(pointer.to_string()))?;
            if idx >= items.len() {
                return Err(HistoryError::OutOfBounds(pointer.to_string()));
            }
            items.remove(idx);
            Ok(())
        }
        _ => Err(HistoryError::InvalidPointer(pointer.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn round_trip(a: Value, b: Value) {
        let ops = diff(&a, &b);
        assert_eq!(apply(&a, &ops).unwrap(), b, "ops: {ops:?}");
    }

    #[test]
    fn identical_values_produce_no_ops() {
        let v = json!({"a": 1, "b": [1, 2, 3]});
        assert!(diff(&v, &v).is_empty());
    }

    #[test]
    fn scalar_replacement() {
        round_trip(json!(1), json!("two"));
    }

    #[test]
    fn object_key_add_remove_change() {
        round_trip(
            json!({"keep": 1, "drop": 2, "change": 3}),
            json!({"keep": 1, "change": 30, "add": {"nested": true}}),
        );
    }

    #[test]
    fn array_grow_and_shrink() {
        round_trip(json!([1, 2, 3]), json!([1, 9, 3, 4, 5]));
        round_trip(json!([1, 2, 3, 4, 5]), json!([1, 2]));
        round_trip(json!([]), json!([1, 2, 3]));
        round_trip(json!([1, 2, 3]), json!([]));
    }

    #[test]
    fn nested_mixed_structures() {
        round_trip(
            json!({"nodes": [{"id": "a", "x": 0}, {"id": "b", "x": 1}], "edges": []}),
            json!({"nodes": [{"id": "a", "x": 5}], "edges": [{"from": "a"}], "name": "flow"}),
        );
    }

    #[test]
    fn type_changes_replace_wholesale() {
        round_trip(json!({"v": [1, 2]}), json!({"v": {"0": 1}}));
        round_trip(json!({"v": null}), json!({"v": [null]}));
    }

    #[test]
    fn keys_needing_pointer_escapes() {
        round_trip(
            json!({"a/b": 1, "t~e": 2}),
            json!({"a/b": 9, "t~e": 2, "~/": 3}),
        );
    }

    #[test]
    fn diff_is_minimal_for_single_field_change() {
        let a = json!({"nodes": [{"id": "a", "x": 0}], "name": "n"});
        let b = json!({"nodes": [{"id": "a", "x": 7}], "name": "n"});
        let ops = diff(&a, &b);
        assert_eq!(
            ops,
            vec![DiffOp::Set {
                pointer: "/nodes/0/x".into(),
                value: json!(7),
            }]
        );
    }

    #[test]
    fn apply_rejects_dangling_pointer() {
        let base = json!({"a": 1});
        let ops = vec![DiffOp::Remove {
            pointer: "/missing".into(),
        }];
        assert!(apply(&base, &ops).is_err());
    }
}
