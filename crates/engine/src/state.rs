//! The State Manager (C3): a single mutable JSON object owned by the
//! engine for the lifetime of one execution. Single-writer (the engine),
//! single-reader at any instant (nodes read through [`nodes::StateReader`]
//! between their own turns — never concurrently).

use nodes::StateReader;
use serde_json::{Map, Value};

/// Split a dotted path into segments. `$.` prefixes are stripped by the
/// caller (the parser strips them at parse time; callers here always pass
/// the bare `a.b.c` form).
fn segments(path: &str) -> Vec<&str> {
    path.split('.').filter(|s| !s.is_empty()).collect()
}

/// Shared mutable state for one execution.
#[derive(Debug, Clone, Default)]
pub struct State {
    root: Value,
}

impl State {
    pub fn new() -> Self {
        Self { root: Value::Object(Map::new()) }
    }

    /// Seed state from a workflow's `initialState`, applied as the very
    /// first mutation before any node runs.
    pub fn with_initial(initial: Option<Map<String, Value>>) -> Self {
        Self { root: Value::Object(initial.unwrap_or_default()) }
    }

    /// Resolve a dotted path; numeric segments address array indices.
    /// Returns `None` for any missing intermediate segment.
    pub fn get(&self, path: &str) -> Option<Value> {
        let mut cursor = &self.root;
        for seg in segments(path) {
            cursor = match cursor {
                Value::Object(map) => map.get(seg)?,
                Value::Array(arr) => {
                    let idx: usize = seg.parse().ok()?;
                    arr.get(idx)?
                }
                _ => return None,
            };
        }
        Some(cursor.clone())
    }

    /// Write `value` at `path`, creating intermediate objects as needed.
    /// Numeric segments create/extend arrays; all other segments create
    /// objects. The final segment's container is created if it doesn't
    /// already exist.
    pub fn set(&mut self, path: &str, value: Value) {
        let segs = segments(path);
        if segs.is_empty() {
            self.root = value;
            return;
        }
        Self::set_recursive(&mut self.root, &segs, value);
    }

    fn set_recursive(cursor: &mut Value, segs: &[&str], value: Value) {
        let (head, rest) = (segs[0], &segs[1..]);

        if rest.is_empty() {
            Self::ensure_slot(cursor, head);
            Self::write_slot(cursor, head, value);
            return;
        }

        // The next segment tells us whether the slot we're about to
        // descend into should be an array or an object.
        let next_is_index = rest[0].parse::<usize>().is_ok();
        Self::ensure_container(cursor, head, next_is_index);

        match cursor {
            Value::Object(map) => {
                let entry = map.entry(head.to_string()).or_insert_with(|| {
                    if next_is_index { Value::Array(Vec::new()) } else { Value::Object(Map::new()) }
                });
                Self::set_recursive(entry, rest, value);
            }
            Value::Array(arr) => {
                if let Ok(idx) = head.parse::<usize>() {
                    while arr.len() <= idx {
                        arr.push(Value::Null);
                    }
                    if matches!(arr[idx], Value::Null) {
                        arr[idx] = if next_is_index { Value::Array(Vec::new()) } else { Value::Object(Map::new()) };
                    }
                    Self::set_recursive(&mut arr[idx], rest, value);
                }
            }
            _ => {}
        }
    }

    /// Ensure `cursor` itself is a container that can hold `key` (turns a
    /// non-container leaf, e.g. initial `Value::Null`, into an object).
    fn ensure_container(cursor: &mut Value, _key: &str, _next_is_index: bool) {
        if !matches!(cursor, Value::Object(_) | Value::Array(_)) {
            *cursor = Value::Object(Map::new());
        }
    }

    fn ensure_slot(cursor: &mut Value, key: &str) {
        if !matches!(cursor, Value::Object(_) | Value::Array(_)) {
            *cursor = Value::Object(Map::new());
        }
        if let Value::Object(map) = cursor {
            map.entry(key.to_string()).or_insert(Value::Null);
        }
    }

    fn write_slot(cursor: &mut Value, key: &str, value: Value) {
        match cursor {
            Value::Object(map) => {
                map.insert(key.to_string(), value);
            }
            Value::Array(arr) => {
                if let Ok(idx) = key.parse::<usize>() {
                    while arr.len() <= idx {
                        arr.push(Value::Null);
                    }
                    arr[idx] = value;
                }
            }
            _ => {}
        }
    }

    /// Shallow-merge an object's keys at the top level of state. Used by
    /// the executor to spread a node's edge payload into state alongside
    /// `_edgeContext`.
    pub fn merge_top_level(&mut self, obj: &Map<String, Value>) {
        if let Value::Object(root) = &mut self.root {
            for (k, v) in obj {
                root.insert(k.clone(), v.clone());
            }
        }
    }

    /// Deep copy for persistence.
    pub fn snapshot(&self) -> Value {
        self.root.clone()
    }
}

impl StateReader for State {
    fn get(&self, path: &str) -> Option<Value> {
        State::get(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_on_empty_state_creates_intermediate_objects() {
        let mut state = State::new();
        state.set("a.b.c", json!(42));
        assert_eq!(state.snapshot(), json!({ "a": { "b": { "c": 42 } } }));
    }

    #[test]
    fn get_resolves_nested_and_array_paths() {
        let mut state = State::new();
        state.set("items.0.name", json!("first"));
        state.set("items.1.name", json!("second"));
        assert_eq!(state.get("items.0.name"), Some(json!("first")));
        assert_eq!(state.get("items.1.name"), Some(json!("second")));
        assert_eq!(state.get("items.2.name"), None);
    }

    #[test]
    fn overwrite_preserves_sibling_keys() {
        let mut state = State::new();
        state.set("a.b", json!(1));
        state.set("a.c", json!(2));
        assert_eq!(state.snapshot(), json!({ "a": { "b": 1, "c": 2 } }));
    }

    #[test]
    fn missing_path_returns_none() {
        let state = State::new();
        assert_eq!(state.get("nope.nothing"), None);
    }
}
