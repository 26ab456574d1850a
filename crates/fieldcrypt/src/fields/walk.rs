//! Traversal of `serde_json::Value` documents along declared field paths.
//!
//! A missing key or a non-object intermediate means the field is absent on
//! this particular document instance — the traversal simply yields nothing.

use serde_json::Value;

use super::path::{FieldPath, Segment};

/// Collect shared references to every value reachable at `path`.
///
/// An `ArrayItem` segment fans out into each element, so a single path may
/// yield many values. An absent path yields an empty list.
pub fn collect<'a>(doc: &'a Value, path: &FieldPath) -> Vec<&'a Value> {
    let mut out = Vec::new();
    walk(doc, path.segments(), &mut out);
    out
}

/// Collect mutable references to every value reachable at `path`.
pub fn collect_mut<'a>(doc: &'a mut Value, path: &FieldPath) -> Vec<&'a mut Value> {
    let mut out = Vec::new();
    walk_mut(doc, path.segments(), &mut out);
    out
}

fn walk<'a>(value: &'a Value, segments: &[Segment], out: &mut Vec<&'a Value>) {
    match segments.split_first() {
        None => out.push(value),
        Some((Segment::Key(key), rest)) => {
            if let Value::Object(map) = value {
                if let Some(child) = map.get(key) {
                    walk(child, rest, out);
                }
            }
        }
        Some((Segment::ArrayItem, rest)) => {
            if let Value::Array(arr) = value {
                for item in arr {
                    walk(item, rest, out);
                }
            }
        }
    }
}

fn walk_mut<'a>(value: &'a mut Value, segments: &[Segment], out: &mut Vec<&'a mut Value>) {
    match segments.split_first() {
        None => out.push(value),
        Some((Segment::Key(key), rest)) => {
            if let Value::Object(map) = value {
                if let Some(child) = map.get_mut(key) {
                    walk_mut(child, rest, out);
                }
            }
        }
        Some((Segment::ArrayItem, rest)) => {
            if let Value::Array(arr) = value {
                for item in arr.iter_mut() {
                    walk_mut(item, rest, out);
                }
            }
        }
    }
}
