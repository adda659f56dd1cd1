//! Pointer-path resolution and guarded in-place mutation.
//!
//! A path is a `/`-separated list of segments: a literal object key, a
//! decimal array index, or `*`, which fans out over every child at that
//! level. The empty path (`""` or `"/"`) denotes the node itself.
//!
//! Mutation goes through the store, never through handles: [`set`]
//! overwrites each resolved record with freshly decoded wire bytes and
//! [`remove`] tombstones resolved subtrees. Taking the store by `&mut`
//! means no iterator borrowed from it can be live across a mutation.

use alloc::{
    string::{String, ToString},
    vec,
    vec::Vec,
};

use crate::{
    error::{AccessError, PathError},
    json, msgpack,
    node::NodeHandle,
    span::ByteSpan,
    store::{ValueKind, ValueRecord, ValueStore, WireFormat},
    writer::{JsonWriter, MsgPackWriter, ValueWriter},
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Wildcard,
    Literal(String),
}

fn parse_path(path: &str) -> Result<Vec<Segment>, AccessError> {
    if path.is_empty() || path == "/" {
        return Ok(Vec::new());
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(AccessError::InvalidPath(path.to_string()));
    };
    Ok(rest
        .split('/')
        .map(|s| {
            if s == "*" {
                Segment::Wildcard
            } else {
                Segment::Literal(s.to_string())
            }
        })
        .collect())
}

/// Object values of `index`, in pair order.
fn object_values(store: &ValueStore, index: usize) -> Vec<usize> {
    let Some(node) = store.handle(index) else {
        return Vec::new();
    };
    node.children()
        .skip(1)
        .step_by(2)
        .map(NodeHandle::index)
        .collect()
}

fn lookup_key(store: &ValueStore, index: usize, key: &str) -> Option<usize> {
    let node = store.handle(index)?;
    let pairs = node.object_items().ok()?;
    for (k, v) in pairs {
        if k.key_text().as_deref() == Ok(key) {
            return Some(v.index());
        }
    }
    None
}

/// Steps one literal segment from `index`. `fanned` relaxes misses into
/// `None` so wildcard branches drop out individually instead of failing
/// the whole resolution.
fn step_literal(
    store: &ValueStore,
    index: usize,
    segment: &str,
    fanned: bool,
) -> Result<Option<usize>, AccessError> {
    let node = store
        .handle(index)
        .ok_or_else(|| AccessError::NotFound(segment.to_string()))?;
    match node.kind() {
        ValueKind::Array => {
            let i: usize = segment
                .parse()
                .map_err(|_| AccessError::InvalidPath(segment.to_string()))?;
            match node.get(i) {
                Ok(item) => Ok(Some(item.index())),
                Err(err) => {
                    if fanned {
                        Ok(None)
                    } else {
                        Err(err)
                    }
                }
            }
        }
        ValueKind::Object => match lookup_key(store, index, segment) {
            Some(value) => Ok(Some(value)),
            None if fanned => Ok(None),
            None => Err(AccessError::NotFound(segment.to_string())),
        },
        _ if fanned => Ok(None),
        found => Err(AccessError::TypeMismatch {
            expected: ValueKind::Object,
            found,
        }),
    }
}

fn resolve_indices(
    store: &ValueStore,
    start: usize,
    segments: &[Segment],
) -> Result<Vec<usize>, AccessError> {
    let mut frontier = vec![start];
    let mut fanned = false;
    for segment in segments {
        let mut next = Vec::new();
        match segment {
            Segment::Wildcard => {
                for &index in &frontier {
                    let Some(node) = store.handle(index) else {
                        continue;
                    };
                    match node.kind() {
                        ValueKind::Array => {
                            next.extend(node.children().map(NodeHandle::index));
                        }
                        ValueKind::Object => next.extend(object_values(store, index)),
                        _ if fanned => {}
                        found => {
                            return Err(AccessError::TypeMismatch {
                                expected: ValueKind::Array,
                                found,
                            });
                        }
                    }
                }
                fanned = true;
            }
            Segment::Literal(text) => {
                for &index in &frontier {
                    if let Some(hit) = step_literal(store, index, text, fanned)? {
                        next.push(hit);
                    }
                }
            }
        }
        frontier = next;
    }
    Ok(frontier)
}

/// Resolves `path` against `node`, fanning out over `*` segments.
///
/// More than one result is only possible through wildcards. A miss on an
/// exact path is an error; a miss on a branch created by a wildcard just
/// drops that branch.
pub fn resolve<'a>(node: NodeHandle<'a>, path: &str) -> Result<Vec<NodeHandle<'a>>, AccessError> {
    let segments = parse_path(path)?;
    let store = node.store();
    let indices = resolve_indices(store, node.index(), &segments)?;
    Ok(indices
        .into_iter()
        .filter_map(|index| store.handle(index))
        .collect())
}

/// Encoded bytes for a synthesized object key, in the store's format.
fn encode_key(format: WireFormat, key: &str) -> Vec<u8> {
    match format {
        WireFormat::Json => {
            let mut writer = JsonWriter::new();
            writer.string(key);
            writer.finish().into_bytes()
        }
        WireFormat::MsgPack => {
            let mut writer = MsgPackWriter::new();
            writer.string(key);
            writer.finish()
        }
    }
}

fn empty_object_bytes(format: WireFormat) -> &'static [u8] {
    match format {
        WireFormat::Json => b"{}",
        WireFormat::MsgPack => &[0x80],
    }
}

/// Appends `key` + an empty-object placeholder value to the object at
/// `index`, returning the placeholder's index.
fn vivify_key(store: &mut ValueStore, index: usize, key: &str) -> usize {
    let parent = isize::try_from(index).unwrap_or(isize::MAX);
    let format = store.format();
    let key_span = ByteSpan::from(encode_key(format, key));
    store.push(ValueRecord::new(key_span, ValueKind::String, parent));
    let value_span = ByteSpan::new(empty_object_bytes(format));
    store.push(ValueRecord::new(value_span, ValueKind::Object, parent))
}

/// Like [`resolve_indices`], but a missing key on an object appends the
/// key and an empty-object placeholder (auto-vivification). Missing
/// array indices are still errors.
fn resolve_or_vivify(
    store: &mut ValueStore,
    start: usize,
    segments: &[Segment],
) -> Result<Vec<usize>, AccessError> {
    let mut frontier = vec![start];
    let mut fanned = false;
    for segment in segments {
        let mut next = Vec::new();
        match segment {
            Segment::Wildcard => {
                for &index in &frontier {
                    let kind = store.handle(index).map(NodeHandle::kind);
                    match kind {
                        Some(ValueKind::Array) => {
                            let items: Vec<usize> = store
                                .handle(index)
                                .map(|n| n.children().map(NodeHandle::index).collect())
                                .unwrap_or_default();
                            next.extend(items);
                        }
                        Some(ValueKind::Object) => next.extend(object_values(store, index)),
                        Some(found) if !fanned => {
                            return Err(AccessError::TypeMismatch {
                                expected: ValueKind::Array,
                                found,
                            });
                        }
                        _ => {}
                    }
                }
                fanned = true;
            }
            Segment::Literal(text) => {
                for &index in &frontier {
                    let kind = store.handle(index).map(NodeHandle::kind);
                    if kind == Some(ValueKind::Object) && lookup_key(store, index, text).is_none()
                    {
                        next.push(vivify_key(store, index, text));
                        continue;
                    }
                    if let Some(hit) = step_literal(store, index, text, fanned)? {
                        next.push(hit);
                    }
                }
            }
        }
        frontier = next;
    }
    Ok(frontier)
}

/// Resolves `path` from the store's root and overwrites every resolved
/// record with `value`, wire-encoded bytes in the store's own format.
///
/// Object segments auto-vivify missing keys on the way down; array
/// indices never do. The replaced record keeps its parent index; the old
/// subtree under it is tombstoned before the new value's children are
/// appended. On any error the store is left exactly as it was.
pub fn set(store: &mut ValueStore, path: &str, value: &[u8]) -> Result<(), PathError> {
    let segments = parse_path(path)?;
    // Validate the replacement bytes against a scratch store before any
    // record is touched; a malformed value must not mutate the document.
    match store.format() {
        WireFormat::Json => json::JsonDecoder::parse(value)?,
        WireFormat::MsgPack => msgpack::MsgPackDecoder::parse(value)?,
    };
    let root = store
        .root()
        .ok_or_else(|| AccessError::NotFound("/".to_string()))?
        .index();
    // Vivification only appends, so a failure partway through resolution
    // unwinds by dropping the appended tail.
    let saved = store.len();
    let targets = match resolve_or_vivify(store, root, &segments) {
        Ok(targets) => targets,
        Err(err) => {
            store.truncate(saved);
            return Err(err.into());
        }
    };
    for index in targets {
        let parent = store.record(index).parent;
        store.tombstone_descendants(index);
        match store.format() {
            WireFormat::Json => json::decode_into(store, value, index, parent)?,
            WireFormat::MsgPack => msgpack::decode_into(store, value, index, parent)?,
        }
    }
    Ok(())
}

/// Resolves `path` from the store's root and tombstones every resolved
/// subtree. When a removed node sits in an object, the paired key record
/// is tombstoned with it so pairs stay aligned. Returns the number of
/// nodes removed.
pub fn remove(store: &mut ValueStore, path: &str) -> Result<usize, AccessError> {
    let segments = parse_path(path)?;
    let root = store
        .root()
        .ok_or_else(|| AccessError::NotFound("/".to_string()))?
        .index();
    let targets = resolve_indices(store, root, &segments)?;
    for &index in &targets {
        let key_slot = paired_key(store, index);
        store.tombstone_descendants(index);
        store.tombstone(index);
        if let Some(key) = key_slot {
            store.tombstone(key);
        }
    }
    Ok(targets.len())
}

/// The key record paired with value `index`, when its parent is an
/// object.
fn paired_key(store: &ValueStore, index: usize) -> Option<usize> {
    let node = store.handle(index)?;
    let parent = node.parent()?;
    if parent.kind() != ValueKind::Object {
        return None;
    }
    parent
        .object_items()
        .ok()?
        .find(|(_, v)| v.index() == index)
        .map(|(k, _)| k.index())
}
