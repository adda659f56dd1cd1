//! Cursor-style navigation over a [`ValueStore`].
//!
//! A [`NodeHandle`] is a `(store, index)` pair: cheap to copy, valid for
//! as long as the store is borrowed. Children are discovered by scanning
//! forward for records whose parent index matches; tombstoned records
//! have their parent reset to `-1` and fall out of every scan
//! automatically.

use alloc::{
    borrow::Cow,
    format,
    string::{String, ToString},
    vec::Vec,
};

use crate::{
    error::AccessError,
    msgpack,
    span::ByteSpan,
    store::{ValueKind, ValueStore, WireFormat},
};

/// A copyable cursor over one record of a [`ValueStore`].
#[derive(Debug, Clone, Copy)]
pub struct NodeHandle<'a> {
    store: &'a ValueStore,
    index: usize,
}

impl<'a> NodeHandle<'a> {
    pub(crate) fn new(store: &'a ValueStore, index: usize) -> Self {
        Self { store, index }
    }

    /// The arena index of this node. Stable across mutation of other
    /// parts of the store.
    #[must_use]
    pub fn index(self) -> usize {
        self.index
    }

    /// The store this handle points into.
    #[must_use]
    pub fn store(self) -> &'a ValueStore {
        self.store
    }

    /// The type tag of this record.
    #[must_use]
    pub fn kind(self) -> ValueKind {
        self.store.record(self.index).kind
    }

    /// The raw wire bytes backing this record (quotes and format tags
    /// included).
    #[must_use]
    pub fn span(self) -> &'a ByteSpan {
        &self.store.record(self.index).span
    }

    #[must_use]
    pub fn is_null(self) -> bool {
        self.kind() == ValueKind::Null
    }

    #[must_use]
    pub fn is_bool(self) -> bool {
        self.kind() == ValueKind::Boolean
    }

    #[must_use]
    pub fn is_integer(self) -> bool {
        self.kind() == ValueKind::Integer
    }

    #[must_use]
    pub fn is_float(self) -> bool {
        self.kind() == ValueKind::Float
    }

    #[must_use]
    pub fn is_number(self) -> bool {
        matches!(self.kind(), ValueKind::Integer | ValueKind::Float)
    }

    #[must_use]
    pub fn is_string(self) -> bool {
        self.kind() == ValueKind::String
    }

    #[must_use]
    pub fn is_binary(self) -> bool {
        self.kind() == ValueKind::Binary
    }

    #[must_use]
    pub fn is_array(self) -> bool {
        self.kind() == ValueKind::Array
    }

    #[must_use]
    pub fn is_map(self) -> bool {
        self.kind() == ValueKind::Object
    }

    /// `true` unless this node is the root (or a tombstone).
    #[must_use]
    pub fn has_parent(self) -> bool {
        self.store.record(self.index).parent >= 0
    }

    /// The parent node, if any.
    #[must_use]
    pub fn parent(self) -> Option<NodeHandle<'a>> {
        let parent = self.store.record(self.index).parent;
        usize::try_from(parent)
            .ok()
            .map(|index| NodeHandle::new(self.store, index))
    }

    /// All live children, in arena order. For objects this interleaves
    /// key and value records; prefer [`object_items`](Self::object_items)
    /// there.
    #[must_use]
    pub fn children(self) -> Children<'a> {
        Children {
            store: self.store,
            parent: self.index,
            next: self.index + 1,
        }
    }

    /// Number of items (array) or key/value pairs (object). Scalars
    /// report 0.
    #[must_use]
    pub fn len(self) -> usize {
        let n = self.children().count();
        if self.kind() == ValueKind::Object { n / 2 } else { n }
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// The items of an array node.
    pub fn array_items(self) -> Result<Children<'a>, AccessError> {
        self.expect_kind(ValueKind::Array)?;
        Ok(self.children())
    }

    /// The `(key, value)` pairs of an object node.
    pub fn object_items(self) -> Result<ObjectItems<'a>, AccessError> {
        self.expect_kind(ValueKind::Object)?;
        Ok(ObjectItems {
            inner: self.children(),
        })
    }

    /// The `index`-th item of an array node.
    pub fn get(self, index: usize) -> Result<NodeHandle<'a>, AccessError> {
        let mut items = self.array_items()?;
        items.nth(index).ok_or(AccessError::IndexOutOfRange {
            index,
            len: self.len(),
        })
    }

    /// The value stored under `key` in an object node.
    ///
    /// MessagePack maps may carry integer keys; those match against their
    /// decimal rendering.
    pub fn get_key(self, key: &str) -> Result<NodeHandle<'a>, AccessError> {
        for (k, v) in self.object_items()? {
            if k.key_text().as_deref() == Ok(key) {
                return Ok(v);
            }
        }
        Err(AccessError::NotFound(key.into()))
    }

    /// Position of `child` among the items of this array node.
    pub fn index_of(self, child: NodeHandle<'_>) -> Result<usize, AccessError> {
        for (i, item) in self.array_items()?.enumerate() {
            if item.index == child.index {
                return Ok(i);
            }
        }
        Err(AccessError::NotFound(format!("#{}", child.index)))
    }

    /// Key under which `child` is stored in this object node, found by
    /// scanning the pairs in order.
    pub fn key_of(self, child: NodeHandle<'_>) -> Result<String, AccessError> {
        for (k, v) in self.object_items()? {
            if v.index == child.index {
                return Ok(k.key_text()?.into_owned());
            }
        }
        Err(AccessError::NotFound(format!("#{}", child.index)))
    }

    /// Reads a boolean node.
    pub fn get_bool(self) -> Result<bool, AccessError> {
        self.expect_kind(ValueKind::Boolean)?;
        match self.store.format() {
            WireFormat::Json => Ok(self.span().starts_with(b"true")),
            WireFormat::MsgPack => Ok(self.span().byte_at(0) == Some(0xc3)),
        }
    }

    /// Reads an integer node.
    pub fn get_i64(self) -> Result<i64, AccessError> {
        self.expect_kind(ValueKind::Integer)?;
        match self.store.format() {
            WireFormat::Json => self.span().to_i64().ok_or(AccessError::NumberOutOfRange),
            WireFormat::MsgPack => msgpack::decode_i64(self.span().as_bytes()),
        }
    }

    /// Reads an integer node, narrowing to `i32`.
    pub fn get_i32(self) -> Result<i32, AccessError> {
        i32::try_from(self.get_i64()?).map_err(|_| AccessError::NumberOutOfRange)
    }

    /// Reads a float node. Integer nodes widen to `f64` in either wire
    /// format, including values outside `i64`; no other implicit
    /// conversion is performed.
    pub fn get_f64(self) -> Result<f64, AccessError> {
        match (self.kind(), self.store.format()) {
            // Text integers may exceed i64; widen straight from the
            // literal.
            (ValueKind::Integer | ValueKind::Float, WireFormat::Json) => {
                self.span().to_f64().ok_or(AccessError::NumberOutOfRange)
            }
            (ValueKind::Integer, WireFormat::MsgPack) => {
                msgpack::decode_integer_f64(self.span().as_bytes())
            }
            (ValueKind::Float, WireFormat::MsgPack) => {
                msgpack::decode_f64(self.span().as_bytes())
            }
            (found, _) => Err(AccessError::TypeMismatch {
                expected: ValueKind::Float,
                found,
            }),
        }
    }

    /// Reads a string node, unescaping (JSON) or stripping the format
    /// header (MessagePack) lazily. Borrows from the store whenever the
    /// payload needs no rewriting.
    pub fn get_str(self) -> Result<Cow<'a, str>, AccessError> {
        self.expect_kind(ValueKind::String)?;
        let raw = self.raw_bytes();
        match self.store.format() {
            WireFormat::Json => {
                // Span includes the surrounding quotes.
                let payload = &raw[1..raw.len() - 1];
                Ok(unescape_json(payload))
            }
            WireFormat::MsgPack => {
                let payload = msgpack::str_payload(raw).ok_or(AccessError::TypeMismatch {
                    expected: ValueKind::String,
                    found: self.kind(),
                })?;
                Ok(String::from_utf8_lossy(payload))
            }
        }
    }

    /// Reads the payload of a binary (or ext) node. MessagePack only.
    pub fn get_bytes(self) -> Result<&'a [u8], AccessError> {
        self.expect_kind(ValueKind::Binary)?;
        msgpack::bin_payload(self.raw_bytes()).ok_or(AccessError::TypeMismatch {
            expected: ValueKind::Binary,
            found: self.kind(),
        })
    }

    /// Renders this node as an object-key string: string nodes decode,
    /// integer nodes render as decimal.
    pub fn key_text(self) -> Result<Cow<'a, str>, AccessError> {
        match self.kind() {
            ValueKind::String => self.get_str(),
            ValueKind::Integer => Ok(Cow::Owned(self.get_i64()?.to_string())),
            found => Err(AccessError::TypeMismatch {
                expected: ValueKind::String,
                found,
            }),
        }
    }

    /// Pre-order traversal of this subtree: the node itself, then each
    /// array item or object value, recursively. Object keys are not
    /// visited. Each call restarts from the top.
    #[must_use]
    pub fn traverse(self) -> Traverse<'a> {
        Traverse {
            store: self.store,
            stack: alloc::vec![self.index],
        }
    }

    /// The pointer-path from the root to this node, rebuilt by walking
    /// `parent()` upward. The root renders as `/`.
    pub fn path(self) -> Result<String, AccessError> {
        let mut segments: Vec<String> = Vec::new();
        let mut node = self;
        while let Some(parent) = node.parent() {
            match parent.kind() {
                ValueKind::Array => segments.push(parent.index_of(node)?.to_string()),
                ValueKind::Object => segments.push(parent.key_of(node)?),
                found => {
                    return Err(AccessError::TypeMismatch {
                        expected: ValueKind::Object,
                        found,
                    });
                }
            }
            node = parent;
        }
        if segments.is_empty() {
            return Ok("/".into());
        }
        let mut out = String::new();
        for segment in segments.iter().rev() {
            out.push('/');
            out.push_str(segment);
        }
        Ok(out)
    }

    fn raw_bytes(self) -> &'a [u8] {
        self.store.record(self.index).span.as_bytes()
    }

    fn expect_kind(self, expected: ValueKind) -> Result<(), AccessError> {
        let found = self.kind();
        if found == expected {
            Ok(())
        } else {
            Err(AccessError::TypeMismatch { expected, found })
        }
    }
}

impl PartialEq for NodeHandle<'_> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.store, other.store) && self.index == other.index
    }
}

/// Forward scan over the live children of one node.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    store: &'a ValueStore,
    parent: usize,
    next: usize,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeHandle<'a>;

    fn next(&mut self) -> Option<NodeHandle<'a>> {
        let records = self.store.records();
        while self.next < records.len() {
            let i = self.next;
            self.next += 1;
            let record = &records[i];
            if record.parent == isize::try_from(self.parent).ok()? {
                return Some(NodeHandle::new(self.store, i));
            }
        }
        None
    }
}

/// Iterator over the `(key, value)` pairs of an object node.
#[derive(Debug, Clone)]
pub struct ObjectItems<'a> {
    inner: Children<'a>,
}

impl<'a> Iterator for ObjectItems<'a> {
    type Item = (NodeHandle<'a>, NodeHandle<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.inner.next()?;
        let value = self.inner.next()?;
        Some((key, value))
    }
}

/// Pre-order iterator produced by [`NodeHandle::traverse`].
#[derive(Debug, Clone)]
pub struct Traverse<'a> {
    store: &'a ValueStore,
    stack: Vec<usize>,
}

impl<'a> Iterator for Traverse<'a> {
    type Item = NodeHandle<'a>;

    fn next(&mut self) -> Option<NodeHandle<'a>> {
        let index = self.stack.pop()?;
        let node = NodeHandle::new(self.store, index);
        let mut child_indices: Vec<usize> = match node.kind() {
            ValueKind::Array => node.children().map(NodeHandle::index).collect(),
            ValueKind::Object => node
                .children()
                .skip(1)
                .step_by(2)
                .map(NodeHandle::index)
                .collect(),
            _ => Vec::new(),
        };
        child_indices.reverse();
        self.stack.extend(child_indices);
        Some(node)
    }
}

/// Decodes a JSON string payload (quotes already stripped), borrowing
/// when no escape sequence is present.
pub(crate) fn unescape_json(payload: &[u8]) -> Cow<'_, str> {
    if !payload.contains(&b'\\') {
        return String::from_utf8_lossy(payload);
    }
    let mut out: Vec<u8> = Vec::with_capacity(payload.len());
    let mut i = 0;
    while i < payload.len() {
        let b = payload[i];
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }
        // Escape syntax was validated at parse time.
        let esc = payload.get(i + 1).copied().unwrap_or(b'\\');
        i += 2;
        match esc {
            b'"' => out.push(b'"'),
            b'\\' => out.push(b'\\'),
            b'/' => out.push(b'/'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'u' => {
                let (ch, consumed) = decode_unicode_escape(&payload[i..]);
                i += consumed;
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
            other => out.push(other),
        }
    }
    Cow::Owned(String::from_utf8_lossy(&out).into_owned())
}

/// Decodes the `XXXX` (and a following low surrogate, if paired) of a
/// `\uXXXX` escape. `rest` starts at the first hex digit. Lone
/// surrogates decode to U+FFFD.
fn decode_unicode_escape(rest: &[u8]) -> (char, usize) {
    let Some(high) = hex4(rest) else {
        return (char::REPLACEMENT_CHARACTER, rest.len().min(4));
    };
    if (0xd800..=0xdbff).contains(&high) {
        // Expect `\uDC00..\uDFFF` immediately after.
        if rest.len() >= 10 && rest[4] == b'\\' && rest[5] == b'u' {
            if let Some(low) = hex4(&rest[6..]) {
                if (0xdc00..=0xdfff).contains(&low) {
                    let code = 0x10000 + ((high - 0xd800) << 10) + (low - 0xdc00);
                    let ch = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
                    return (ch, 10);
                }
            }
        }
        return (char::REPLACEMENT_CHARACTER, 4);
    }
    if (0xdc00..=0xdfff).contains(&high) {
        return (char::REPLACEMENT_CHARACTER, 4);
    }
    (char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER), 4)
}

fn hex4(bytes: &[u8]) -> Option<u32> {
    if bytes.len() < 4 {
        return None;
    }
    let mut value = 0u32;
    for &b in &bytes[..4] {
        let digit = (b as char).to_digit(16)?;
        value = value * 16 + digit;
    }
    Some(value)
}
