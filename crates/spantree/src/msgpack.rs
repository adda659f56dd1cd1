//! MessagePack decoding into a [`ValueStore`].
//!
//! Dispatch is a single classification over the leading format byte
//! ([`classify`]); every record's span starts at that byte and its
//! payload length is derived from the format (plus 1/2/4 big-endian
//! length bytes for the variable-length families). Scalar payloads are
//! not decoded here; [`decode_i64`]/[`decode_f64`] and the payload
//! helpers re-read the span when a typed getter is invoked.

use crate::{
    error::{AccessError, ParseError, ParseErrorKind},
    span::ByteSpan,
    store::{ValueKind, ValueRecord, ValueStore, WireFormat},
};

const MAX_DEPTH: usize = 512;

/// Parser for binary MessagePack.
pub struct MsgPackDecoder;

impl MsgPackDecoder {
    /// Parses a complete MessagePack value.
    pub fn parse(bytes: &[u8]) -> Result<ValueStore, ParseError> {
        let mut store = ValueStore::new(WireFormat::MsgPack);
        let mut parser = Parser::new(&mut store, ByteSpan::new(bytes));
        parser.parse_value(-1, None)?;
        parser.expect_end()?;
        Ok(store)
    }
}

/// Parses `bytes` as one value directly into `slot` of an existing
/// store; the MessagePack counterpart of [`crate::json::decode_into`].
pub(crate) fn decode_into(
    store: &mut ValueStore,
    bytes: &[u8],
    slot: usize,
    parent: isize,
) -> Result<(), ParseError> {
    let mut parser = Parser::new(store, ByteSpan::new(bytes));
    parser.parse_value(parent, Some(slot))?;
    parser.expect_end()
}

/// Payload shape of one leading format byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Nil,
    False,
    True,
    /// Value encoded in the format byte itself.
    FixInt,
    /// `size` entries follow as key/value pairs.
    FixMap(usize),
    FixArray(usize),
    /// `len` payload bytes follow.
    FixStr(usize),
    /// `width` big-endian payload bytes follow.
    Uint(usize),
    Int(usize),
    Float32,
    Float64,
    /// `len_bytes` big-endian length bytes, then that many payload bytes.
    Str(usize),
    Bin(usize),
    /// `len_bytes` length bytes, then that many array elements.
    Array(usize),
    Map(usize),
    /// One type byte, then `len` payload bytes.
    FixExt(usize),
    /// `len_bytes` length bytes, one type byte, then the payload.
    Ext(usize),
    /// 0xc1, never used by the format.
    Reserved,
}

/// The format-byte table from the MessagePack specification.
fn classify(byte: u8) -> Format {
    match byte {
        0x00..=0x7f | 0xe0..=0xff => Format::FixInt,
        0x80..=0x8f => Format::FixMap((byte & 0x0f) as usize),
        0x90..=0x9f => Format::FixArray((byte & 0x0f) as usize),
        0xa0..=0xbf => Format::FixStr((byte & 0x1f) as usize),
        0xc0 => Format::Nil,
        0xc1 => Format::Reserved,
        0xc2 => Format::False,
        0xc3 => Format::True,
        0xc4 => Format::Bin(1),
        0xc5 => Format::Bin(2),
        0xc6 => Format::Bin(4),
        0xc7 => Format::Ext(1),
        0xc8 => Format::Ext(2),
        0xc9 => Format::Ext(4),
        0xca => Format::Float32,
        0xcb => Format::Float64,
        0xcc => Format::Uint(1),
        0xcd => Format::Uint(2),
        0xce => Format::Uint(4),
        0xcf => Format::Uint(8),
        0xd0 => Format::Int(1),
        0xd1 => Format::Int(2),
        0xd2 => Format::Int(4),
        0xd3 => Format::Int(8),
        0xd4 => Format::FixExt(1),
        0xd5 => Format::FixExt(2),
        0xd6 => Format::FixExt(4),
        0xd7 => Format::FixExt(8),
        0xd8 => Format::FixExt(16),
        0xd9 => Format::Str(1),
        0xda => Format::Str(2),
        0xdb => Format::Str(4),
        0xdc => Format::Array(2),
        0xdd => Format::Array(4),
        0xde => Format::Map(2),
        0xdf => Format::Map(4),
    }
}

struct Parser<'s> {
    store: &'s mut ValueStore,
    span: ByteSpan,
    pos: usize,
    depth: usize,
}

impl<'s> Parser<'s> {
    fn new(store: &'s mut ValueStore, span: ByteSpan) -> Self {
        Self {
            store,
            span,
            pos: 0,
            depth: 0,
        }
    }

    fn err(&self, reason: ParseErrorKind) -> ParseError {
        ParseError::new(self.pos, reason)
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        if self.pos < self.span.len() {
            return Err(self.err(ParseErrorKind::TrailingBytes));
        }
        Ok(())
    }

    /// Advances past `n` payload bytes, failing if the buffer is short.
    fn consume(&mut self, n: usize) -> Result<(), ParseError> {
        if self.pos + n > self.span.len() {
            return Err(self.err(ParseErrorKind::TruncatedPayload));
        }
        self.pos += n;
        Ok(())
    }

    /// Reads a big-endian length prefix of `width` bytes.
    fn read_len(&mut self, width: usize) -> Result<usize, ParseError> {
        if self.pos + width > self.span.len() {
            return Err(self.err(ParseErrorKind::TruncatedPayload));
        }
        let mut len = 0usize;
        for i in 0..width {
            len = (len << 8) | self.span.byte_at(self.pos + i).unwrap_or(0) as usize;
        }
        self.pos += width;
        Ok(len)
    }

    fn parse_value(&mut self, parent: isize, slot: Option<usize>) -> Result<usize, ParseError> {
        if self.depth == MAX_DEPTH {
            return Err(self.err(ParseErrorKind::DepthLimitExceeded(MAX_DEPTH)));
        }
        self.depth += 1;

        let index = match slot {
            Some(index) => index,
            None => self.store.push(ValueRecord::new(
                ByteSpan::empty(),
                ValueKind::Empty,
                parent,
            )),
        };

        let start = self.pos;
        let byte = self
            .span
            .byte_at(self.pos)
            .ok_or_else(|| self.err(ParseErrorKind::UnexpectedEndOfInput))?;
        self.pos += 1;

        let kind = match classify(byte) {
            Format::Nil => ValueKind::Null,
            Format::False | Format::True => ValueKind::Boolean,
            Format::FixInt => ValueKind::Integer,
            Format::Uint(width) | Format::Int(width) => {
                self.consume(width)?;
                ValueKind::Integer
            }
            Format::Float32 => {
                self.consume(4)?;
                ValueKind::Float
            }
            Format::Float64 => {
                self.consume(8)?;
                ValueKind::Float
            }
            Format::FixStr(len) => {
                self.consume(len)?;
                ValueKind::String
            }
            Format::Str(len_bytes) => {
                let len = self.read_len(len_bytes)?;
                self.consume(len)?;
                ValueKind::String
            }
            Format::Bin(len_bytes) => {
                let len = self.read_len(len_bytes)?;
                self.consume(len)?;
                ValueKind::Binary
            }
            Format::FixExt(len) => {
                self.consume(1 + len)?; // type byte + payload
                ValueKind::Binary
            }
            Format::Ext(len_bytes) => {
                let len = self.read_len(len_bytes)?;
                self.consume(1 + len)?;
                ValueKind::Binary
            }
            Format::FixArray(size) => {
                self.parse_children(index, size)?;
                ValueKind::Array
            }
            Format::Array(len_bytes) => {
                let size = self.read_len(len_bytes)?;
                self.parse_children(index, size)?;
                ValueKind::Array
            }
            Format::FixMap(size) => {
                self.parse_children(index, size * 2)?;
                ValueKind::Object
            }
            Format::Map(len_bytes) => {
                let size = self.read_len(len_bytes)?;
                self.parse_children(index, size * 2)?;
                ValueKind::Object
            }
            Format::Reserved => {
                return Err(ParseError::new(
                    start,
                    ParseErrorKind::UnknownFormatByte(byte),
                ));
            }
        };

        let span = self.span.sub(start, self.pos - start);
        self.store.replace(index, ValueRecord::new(span, kind, parent));
        self.depth -= 1;
        Ok(index)
    }

    fn parse_children(&mut self, index: usize, count: usize) -> Result<(), ParseError> {
        let parent = isize::try_from(index).unwrap_or(isize::MAX);
        for _ in 0..count {
            self.parse_value(parent, None)?;
        }
        Ok(())
    }
}

fn read_be(bytes: &[u8], width: usize) -> Option<u64> {
    if bytes.len() < 1 + width {
        return None;
    }
    let mut value = 0u64;
    for &b in &bytes[1..=width] {
        value = (value << 8) | u64::from(b);
    }
    Some(value)
}

/// Lazily decodes an integer record's span (network byte order).
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn decode_i64(bytes: &[u8]) -> Result<i64, AccessError> {
    let byte = *bytes.first().ok_or(AccessError::NumberOutOfRange)?;
    match classify(byte) {
        Format::FixInt => {
            if byte < 0x80 {
                Ok(i64::from(byte))
            } else {
                Ok(i64::from(byte as i8))
            }
        }
        Format::Uint(width) => {
            let raw = read_be(bytes, width).ok_or(AccessError::NumberOutOfRange)?;
            i64::try_from(raw).map_err(|_| AccessError::NumberOutOfRange)
        }
        Format::Int(width) => {
            let raw = read_be(bytes, width).ok_or(AccessError::NumberOutOfRange)?;
            // Sign-extend from the encoded width.
            let shift = 64 - width * 8;
            Ok(((raw << shift) as i64) >> shift)
        }
        _ => Err(AccessError::NumberOutOfRange),
    }
}

/// Widens an integer record's span to `f64`. Uint payloads above
/// `i64::MAX` keep their `u64` magnitude instead of failing.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn decode_integer_f64(bytes: &[u8]) -> Result<f64, AccessError> {
    let byte = *bytes.first().ok_or(AccessError::NumberOutOfRange)?;
    if let Format::Uint(width) = classify(byte) {
        let raw = read_be(bytes, width).ok_or(AccessError::NumberOutOfRange)?;
        return Ok(raw as f64);
    }
    decode_i64(bytes).map(|v| v as f64)
}

/// Lazily decodes a float record's span.
pub(crate) fn decode_f64(bytes: &[u8]) -> Result<f64, AccessError> {
    match bytes.first() {
        Some(0xca) => {
            let raw = read_be(bytes, 4).ok_or(AccessError::NumberOutOfRange)?;
            #[allow(clippy::cast_possible_truncation)]
            Ok(f64::from(f32::from_bits(raw as u32)))
        }
        Some(0xcb) => {
            let raw = read_be(bytes, 8).ok_or(AccessError::NumberOutOfRange)?;
            Ok(f64::from_bits(raw))
        }
        _ => Err(AccessError::NumberOutOfRange),
    }
}

/// The payload bytes of a string record, header stripped.
pub(crate) fn str_payload(bytes: &[u8]) -> Option<&[u8]> {
    let header = match bytes.first()? {
        0xa0..=0xbf => 1,
        0xd9 => 2,
        0xda => 3,
        0xdb => 5,
        _ => return None,
    };
    bytes.get(header..)
}

/// The payload bytes of a bin or ext record, header (and ext type byte)
/// stripped.
pub(crate) fn bin_payload(bytes: &[u8]) -> Option<&[u8]> {
    let header = match bytes.first()? {
        0xc4 => 2,
        0xc5 => 3,
        0xc6 => 5,
        0xd4..=0xd8 => 2,
        0xc7 => 3,
        0xc8 => 4,
        0xc9 => 6,
        _ => return None,
    };
    bytes.get(header..)
}
