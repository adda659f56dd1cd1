//! The flat value arena.
//!
//! A parse produces one [`ValueStore`]: an append-only list of
//! `(span, kind, parent)` records in which parents always precede their
//! descendants. Children of a node are exactly the records whose parent
//! index equals the node's own index, so the tree shape is recoverable by
//! a single forward scan and no per-node pointer graph exists.
//!
//! The store never shrinks. Removal tombstones a record in place
//! (kind becomes [`ValueKind::Empty`], parent becomes `-1`), which keeps
//! every previously issued index valid for the lifetime of the store.

use alloc::vec::Vec;
use core::fmt;

use crate::{node::NodeHandle, span::ByteSpan};

/// The type tag of a record.
///
/// `Empty` is the tombstone sentinel and is never produced by a decoder;
/// `Binary` only occurs in MessagePack stores.
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Empty,
    Null,
    Boolean,
    Integer,
    Float,
    String,
    Binary,
    Array,
    Object,
}

impl ValueKind {
    /// `true` for the non-container kinds (tombstones excluded).
    #[must_use]
    pub fn is_scalar(self) -> bool {
        !matches!(self, Self::Array | Self::Object | Self::Empty)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Binary => "binary",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// Which decoder produced a store.
///
/// Scalar payloads are decoded lazily, so accessors need to know how the
/// recorded spans are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Json,
    MsgPack,
}

/// One arena slot: a byte span, its type tag and the index of its parent
/// record (`-1` for the root and for tombstones).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRecord {
    pub(crate) span: ByteSpan,
    pub(crate) kind: ValueKind,
    pub(crate) parent: isize,
}

impl ValueRecord {
    pub(crate) fn new(span: ByteSpan, kind: ValueKind, parent: isize) -> Self {
        Self { span, kind, parent }
    }

    pub(crate) fn tombstone() -> Self {
        Self {
            span: ByteSpan::empty(),
            kind: ValueKind::Empty,
            parent: -1,
        }
    }
}

/// The append-only arena backing one parsed (or built) document.
#[derive(Debug, Clone)]
pub struct ValueStore {
    records: Vec<ValueRecord>,
    format: WireFormat,
}

impl ValueStore {
    #[must_use]
    pub(crate) fn new(format: WireFormat) -> Self {
        Self {
            records: Vec::new(),
            format,
        }
    }

    /// The wire format this store was decoded from.
    #[must_use]
    pub fn format(&self) -> WireFormat {
        self.format
    }

    /// Total number of arena slots, tombstones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Handle on the root record, if the store holds one.
    ///
    /// The root is the single live record with `parent == -1`; by the
    /// parents-precede-descendants invariant it is found at the lowest
    /// live index.
    #[must_use]
    pub fn root(&self) -> Option<NodeHandle<'_>> {
        self.records
            .iter()
            .position(|r| r.parent == -1 && r.kind != ValueKind::Empty)
            .map(|index| NodeHandle::new(self, index))
    }

    /// Handle on an arbitrary slot. Tombstoned slots still yield a
    /// handle; their kind reports [`ValueKind::Empty`].
    #[must_use]
    pub fn handle(&self, index: usize) -> Option<NodeHandle<'_>> {
        (index < self.records.len()).then(|| NodeHandle::new(self, index))
    }

    pub(crate) fn record(&self, index: usize) -> &ValueRecord {
        &self.records[index]
    }

    pub(crate) fn records(&self) -> &[ValueRecord] {
        &self.records
    }

    pub(crate) fn push(&mut self, record: ValueRecord) -> usize {
        let index = self.records.len();
        self.records.push(record);
        index
    }

    pub(crate) fn replace(&mut self, index: usize, record: ValueRecord) {
        self.records[index] = record;
    }

    /// Tombstones a single slot. Indices never shift.
    pub(crate) fn tombstone(&mut self, index: usize) {
        self.records[index] = ValueRecord::tombstone();
    }

    /// Drops records appended after `len`, unwinding a failed mutation.
    /// Only valid while no handle to the tail exists.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    /// Tombstones every descendant of `index`, leaving the record at
    /// `index` itself untouched.
    ///
    /// Parents precede descendants, so one forward pass with a membership
    /// set over already-doomed indices suffices.
    pub(crate) fn tombstone_descendants(&mut self, index: usize) {
        let mut doomed: Vec<bool> = alloc::vec![false; self.records.len()];
        doomed[index] = true;
        #[allow(clippy::cast_sign_loss)]
        for i in index + 1..self.records.len() {
            let parent = self.records[i].parent;
            if parent >= 0 && doomed[parent as usize] {
                doomed[i] = true;
                self.records[i] = ValueRecord::tombstone();
            }
        }
    }
}
