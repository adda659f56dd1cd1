//! Non-owning views over shared byte buffers.
//!
//! Every parser and accessor in this crate works on [`ByteSpan`]s rather
//! than copied-out slices. A span is a `(buffer, offset, length)` triple
//! where the buffer is a reference-counted immutable byte block; taking a
//! sub-span is an offset adjustment, never a copy. The single copy in the
//! pipeline happens up front, when caller bytes are moved into the shared
//! buffer.

use alloc::{borrow::Cow, string::String, sync::Arc, vec::Vec};
use core::{cmp::Ordering, fmt, hash::Hash, hash::Hasher};

use bstr::ByteSlice;

/// An immutable view over a range of a shared byte buffer.
///
/// Cloning a span is cheap (one `Arc` bump); equality, ordering and
/// hashing are byte-wise over the viewed range.
#[derive(Clone)]
pub struct ByteSpan {
    buf: Arc<[u8]>,
    offset: usize,
    len: usize,
}

impl ByteSpan {
    /// Creates a span covering all of `bytes`.
    ///
    /// This is the one place bytes are copied; every derived span shares
    /// the same buffer.
    #[must_use]
    pub fn new(bytes: &[u8]) -> Self {
        let buf: Arc<[u8]> = Arc::from(bytes);
        let len = buf.len();
        Self { buf, offset: 0, len }
    }

    /// An empty span over an empty buffer.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(&[])
    }

    /// The viewed bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[self.offset..self.offset + self.len]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte at position `i`, if in range.
    #[must_use]
    pub fn byte_at(&self, i: usize) -> Option<u8> {
        self.as_bytes().get(i).copied()
    }

    /// Sub-span of `len` bytes starting at `offset`, clamped to this span.
    #[must_use]
    pub fn sub(&self, offset: usize, len: usize) -> Self {
        let offset = offset.min(self.len);
        let len = len.min(self.len - offset);
        Self {
            buf: Arc::clone(&self.buf),
            offset: self.offset + offset,
            len,
        }
    }

    /// Everything after the first `n` bytes.
    #[must_use]
    pub fn advance(&self, n: usize) -> Self {
        let n = n.min(self.len);
        self.sub(n, self.len - n)
    }

    /// The first `n` bytes (or fewer, if the span is shorter).
    #[must_use]
    pub fn take(&self, n: usize) -> Self {
        self.sub(0, n)
    }

    #[must_use]
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.as_bytes().starts_with(prefix)
    }

    #[must_use]
    pub fn ends_with(&self, suffix: &[u8]) -> bool {
        self.as_bytes().ends_with(suffix)
    }

    /// Position of the first occurrence of `byte`, if any.
    #[must_use]
    pub fn index_of(&self, byte: u8) -> Option<usize> {
        self.as_bytes().find_byte(byte)
    }

    /// Lazily splits the span on `byte`. Adjacent separators yield empty
    /// spans, matching `str::split` semantics.
    #[must_use]
    pub fn split(&self, byte: u8) -> Split {
        Split {
            rest: Some(self.clone()),
            byte,
        }
    }

    /// Drops leading ASCII whitespace (space, tab, CR, LF).
    #[must_use]
    pub fn trim_start(&self) -> Self {
        let bytes = self.as_bytes();
        let n = bytes
            .iter()
            .take_while(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
            .count();
        self.advance(n)
    }

    /// Parses the span as a decimal `i32`.
    #[must_use]
    pub fn to_i32(&self) -> Option<i32> {
        self.to_i64().and_then(|v| i32::try_from(v).ok())
    }

    /// Parses the span as a decimal `i64`.
    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        let s = core::str::from_utf8(self.as_bytes()).ok()?;
        s.parse().ok()
    }

    /// Parses the span as a JSON-style floating point literal.
    #[must_use]
    pub fn to_f64(&self) -> Option<f64> {
        let s = core::str::from_utf8(self.as_bytes()).ok()?;
        s.parse().ok()
    }

    /// Character-scan classification of a numeric literal.
    ///
    /// Returns `false` as soon as a `.` or exponent marker is seen. A `-`
    /// is only admitted at position 0. Any other non-digit stops the scan
    /// and yields the classification so far, so `12abc` still counts as
    /// integer-shaped.
    #[must_use]
    pub fn looks_like_integer(&self) -> bool {
        for (i, b) in self.as_bytes().iter().enumerate() {
            match b {
                b'.' | b'e' | b'E' => return false,
                b'-' if i == 0 => {}
                b'0'..=b'9' => {}
                _ => break,
            }
        }
        true
    }

    /// Materializes the span as UTF-8 text, replacing invalid sequences.
    #[must_use]
    pub fn to_str_lossy(&self) -> Cow<'_, str> {
        self.as_bytes().to_str_lossy()
    }

    /// Materializes the span as an owned `String` (lossy).
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        self.to_str_lossy().into_owned()
    }
}

impl From<&[u8]> for ByteSpan {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl From<&str> for ByteSpan {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl From<Vec<u8>> for ByteSpan {
    fn from(bytes: Vec<u8>) -> Self {
        let buf: Arc<[u8]> = Arc::from(bytes);
        let len = buf.len();
        Self { buf, offset: 0, len }
    }
}

impl PartialEq for ByteSpan {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for ByteSpan {}

impl PartialOrd for ByteSpan {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByteSpan {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl Hash for ByteSpan {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl fmt::Debug for ByteSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteSpan({:?})", self.as_bytes().as_bstr())
    }
}

/// Iterator returned by [`ByteSpan::split`].
#[derive(Debug, Clone)]
pub struct Split {
    rest: Option<ByteSpan>,
    byte: u8,
}

impl Iterator for Split {
    type Item = ByteSpan;

    fn next(&mut self) -> Option<ByteSpan> {
        let rest = self.rest.take()?;
        match rest.index_of(self.byte) {
            Some(i) => {
                self.rest = Some(rest.advance(i + 1));
                Some(rest.take(i))
            }
            None => Some(rest),
        }
    }
}
