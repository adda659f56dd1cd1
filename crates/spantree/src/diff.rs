//! Structural comparison of two trees.
//!
//! Objects are compared by key set, arrays positionally (index by index,
//! not reordering-aware), scalars by value with Integer/Float compared
//! numerically. `Null` only equals `Null`; every other cross-kind pair
//! is a value change.

use alloc::{format, string::String, vec::Vec};
use core::fmt;

use crate::{error::AccessError, node::NodeHandle, store::ValueKind};

/// What changed at a path.
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    KeyAdded,
    KeyRemoved,
    ValueChanged,
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::KeyAdded => "added",
            Self::KeyRemoved => "removed",
            Self::ValueChanged => "changed",
        };
        f.write_str(name)
    }
}

/// One reported difference, located by the pointer-path from the roots
/// that were diffed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub path: String,
    pub kind: DiffKind,
    pub message: String,
}

/// Compares two trees and returns the ordered change list.
///
/// `diff(a, a)` is empty for any tree. Array extras on the left report
/// as [`DiffKind::KeyRemoved`], extras on the right as
/// [`DiffKind::KeyAdded`].
pub fn diff(left: NodeHandle<'_>, right: NodeHandle<'_>) -> Result<Vec<DiffEntry>, AccessError> {
    let mut entries = Vec::new();
    let mut path = Vec::new();
    diff_inner(left, right, &mut path, &mut entries)?;
    Ok(entries)
}

fn render_path(segments: &[String]) -> String {
    if segments.is_empty() {
        return "/".into();
    }
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        out.push_str(segment);
    }
    out
}

fn push(entries: &mut Vec<DiffEntry>, path: &[String], kind: DiffKind, message: String) {
    entries.push(DiffEntry {
        path: render_path(path),
        kind,
        message,
    });
}

fn is_numeric(kind: ValueKind) -> bool {
    matches!(kind, ValueKind::Integer | ValueKind::Float)
}

/// Short rendering of a scalar for diff messages.
fn describe(node: NodeHandle<'_>) -> String {
    match node.kind() {
        ValueKind::Null => "null".into(),
        ValueKind::Boolean => node
            .get_bool()
            .map_or_else(|_| "boolean".into(), |b| format!("{b}")),
        ValueKind::Integer => node
            .get_i64()
            .map_or_else(|_| "integer".into(), |v| format!("{v}")),
        ValueKind::Float => node
            .get_f64()
            .map_or_else(|_| "float".into(), |v| format!("{v}")),
        ValueKind::String => node
            .get_str()
            .map_or_else(|_| "string".into(), |s| format!("{s:?}")),
        kind => format!("{kind}"),
    }
}

fn scalars_equal(left: NodeHandle<'_>, right: NodeHandle<'_>) -> Result<bool, AccessError> {
    let (lk, rk) = (left.kind(), right.kind());
    if lk == ValueKind::Integer && rk == ValueKind::Integer {
        // Exact compare; widening to f64 would collapse distinct values
        // above 2^53. Literals outside i64 fall through below.
        if let (Ok(a), Ok(b)) = (left.get_i64(), right.get_i64()) {
            return Ok(a == b);
        }
    }
    if is_numeric(lk) && is_numeric(rk) {
        #[allow(clippy::float_cmp)]
        return Ok(left.get_f64()? == right.get_f64()?);
    }
    if lk != rk {
        return Ok(false);
    }
    match lk {
        ValueKind::Null => Ok(true),
        ValueKind::Boolean => Ok(left.get_bool()? == right.get_bool()?),
        ValueKind::String => Ok(left.get_str()? == right.get_str()?),
        ValueKind::Binary => Ok(left.get_bytes()? == right.get_bytes()?),
        _ => Ok(false),
    }
}

fn diff_inner(
    left: NodeHandle<'_>,
    right: NodeHandle<'_>,
    path: &mut Vec<String>,
    entries: &mut Vec<DiffEntry>,
) -> Result<(), AccessError> {
    let (lk, rk) = (left.kind(), right.kind());

    if lk.is_scalar() || rk.is_scalar() {
        if !scalars_equal(left, right)? {
            push(
                entries,
                path,
                DiffKind::ValueChanged,
                format!("{} -> {}", describe(left), describe(right)),
            );
        }
        return Ok(());
    }

    if lk != rk {
        // Container vs other container; stop descending.
        push(
            entries,
            path,
            DiffKind::ValueChanged,
            format!("{lk} -> {rk}"),
        );
        return Ok(());
    }

    match lk {
        ValueKind::Object => diff_objects(left, right, path, entries),
        ValueKind::Array => diff_arrays(left, right, path, entries),
        _ => Ok(()),
    }
}

fn diff_objects(
    left: NodeHandle<'_>,
    right: NodeHandle<'_>,
    path: &mut Vec<String>,
    entries: &mut Vec<DiffEntry>,
) -> Result<(), AccessError> {
    let left_pairs: Vec<(String, NodeHandle<'_>)> = collect_pairs(left)?;
    let right_pairs: Vec<(String, NodeHandle<'_>)> = collect_pairs(right)?;

    for (key, left_value) in &left_pairs {
        match right_pairs.iter().find(|(k, _)| k == key) {
            Some((_, right_value)) => {
                path.push(key.clone());
                diff_inner(*left_value, *right_value, path, entries)?;
                path.pop();
            }
            None => {
                path.push(key.clone());
                push(
                    entries,
                    path,
                    DiffKind::KeyRemoved,
                    format!("key {key:?} removed"),
                );
                path.pop();
            }
        }
    }
    for (key, _) in &right_pairs {
        if !left_pairs.iter().any(|(k, _)| k == key) {
            path.push(key.clone());
            push(
                entries,
                path,
                DiffKind::KeyAdded,
                format!("key {key:?} added"),
            );
            path.pop();
        }
    }
    Ok(())
}

fn collect_pairs(node: NodeHandle<'_>) -> Result<Vec<(String, NodeHandle<'_>)>, AccessError> {
    let mut pairs = Vec::new();
    for (key, value) in node.object_items()? {
        pairs.push((key.key_text()?.into_owned(), value));
    }
    Ok(pairs)
}

fn diff_arrays(
    left: NodeHandle<'_>,
    right: NodeHandle<'_>,
    path: &mut Vec<String>,
    entries: &mut Vec<DiffEntry>,
) -> Result<(), AccessError> {
    let left_items: Vec<NodeHandle<'_>> = left.children().collect();
    let right_items: Vec<NodeHandle<'_>> = right.children().collect();
    let shared = left_items.len().min(right_items.len());

    for i in 0..shared {
        path.push(format!("{i}"));
        diff_inner(left_items[i], right_items[i], path, entries)?;
        path.pop();
    }
    for (i, item) in left_items.iter().enumerate().skip(shared) {
        path.push(format!("{i}"));
        push(
            entries,
            path,
            DiffKind::KeyRemoved,
            format!("trailing element {} removed", describe(*item)),
        );
        path.pop();
    }
    for (i, item) in right_items.iter().enumerate().skip(shared) {
        path.push(format!("{i}"));
        push(
            entries,
            path,
            DiffKind::KeyAdded,
            format!("trailing element {} added", describe(*item)),
        );
        path.pop();
    }
    Ok(())
}
