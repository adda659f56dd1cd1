//! Re-serialization of trees and native values.
//!
//! [`ValueWriter`] is the stack-disciplined sink contract: primitives,
//! `begin_array`/`end_array` and `begin_object`/`key`/`end_object` in a
//! balanced call sequence. [`JsonWriter`] produces compact JSON text,
//! [`MsgPackWriter`] produces smallest-encoding MessagePack bytes, and
//! [`write_node`] walks any [`NodeHandle`] subtree into either.

use alloc::{string::String, vec::Vec};
use core::fmt::Write as _;

use crate::{error::AccessError, node::NodeHandle, store::ValueKind};

/// A sink for one value tree, driven in document order.
///
/// Container lengths are passed up front because length-prefixed formats
/// (MessagePack) need them before the first child.
pub trait ValueWriter {
    fn null(&mut self);
    fn boolean(&mut self, value: bool);
    fn integer(&mut self, value: i64);
    fn float(&mut self, value: f64);
    fn string(&mut self, value: &str);
    fn binary(&mut self, value: &[u8]);
    fn begin_array(&mut self, len: usize);
    fn end_array(&mut self);
    fn begin_object(&mut self, len: usize);
    fn key(&mut self, key: &str);
    fn end_object(&mut self);

    /// An integer object key. Text formats render it as a quoted
    /// decimal; binary formats may keep it numeric.
    fn integer_key(&mut self, key: i64) {
        let mut text = String::new();
        let _ = write!(text, "{key}");
        self.key(&text);
    }
}

/// Writes a node subtree into `writer`, skipping tombstoned children.
pub fn write_node<W: ValueWriter>(writer: &mut W, node: NodeHandle<'_>) -> Result<(), AccessError> {
    match node.kind() {
        ValueKind::Empty => {}
        ValueKind::Null => writer.null(),
        ValueKind::Boolean => writer.boolean(node.get_bool()?),
        ValueKind::Integer => writer.integer(node.get_i64()?),
        ValueKind::Float => writer.float(node.get_f64()?),
        ValueKind::String => writer.string(&node.get_str()?),
        ValueKind::Binary => writer.binary(node.get_bytes()?),
        ValueKind::Array => {
            let items: Vec<_> = node.children().collect();
            writer.begin_array(items.len());
            for item in items {
                write_node(writer, item)?;
            }
            writer.end_array();
        }
        ValueKind::Object => {
            let pairs: Vec<_> = node.object_items()?.collect();
            writer.begin_object(pairs.len());
            for (key, value) in pairs {
                if key.is_integer() {
                    writer.integer_key(key.get_i64()?);
                } else {
                    writer.key(&key.key_text()?);
                }
                write_node(writer, value)?;
            }
            writer.end_object();
        }
    }
    Ok(())
}

// ------------------------------------------------------------------------------------------------
// JSON text
// ------------------------------------------------------------------------------------------------

/// Produces compact JSON text.
#[derive(Debug, Default)]
pub struct JsonWriter {
    out: String,
    // Values written at each open container level, for comma placement.
    counts: Vec<usize>,
    after_key: bool,
}

impl JsonWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The accumulated JSON text.
    #[must_use]
    pub fn finish(self) -> String {
        self.out
    }

    fn pre_value(&mut self) {
        if self.after_key {
            self.after_key = false;
            return;
        }
        if let Some(count) = self.counts.last_mut() {
            if *count > 0 {
                self.out.push(',');
            }
            *count += 1;
        }
    }

    fn push_escaped(&mut self, value: &str) {
        self.out.push('"');
        for c in value.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                '\u{8}' => self.out.push_str("\\b"),
                '\u{c}' => self.out.push_str("\\f"),
                c if (c as u32) < 0x20 => {
                    let _ = write!(self.out, "\\u{:04x}", c as u32);
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }
}

impl ValueWriter for JsonWriter {
    fn null(&mut self) {
        self.pre_value();
        self.out.push_str("null");
    }

    fn boolean(&mut self, value: bool) {
        self.pre_value();
        self.out.push_str(if value { "true" } else { "false" });
    }

    fn integer(&mut self, value: i64) {
        self.pre_value();
        let _ = write!(self.out, "{value}");
    }

    fn float(&mut self, value: f64) {
        self.pre_value();
        if value.is_finite() {
            let _ = write!(self.out, "{value}");
        } else {
            // JSON has no literal for non-finite numbers.
            self.out.push_str("null");
        }
    }

    fn string(&mut self, value: &str) {
        self.pre_value();
        self.push_escaped(value);
    }

    fn binary(&mut self, value: &[u8]) {
        // JSON has no binary kind; render as an array of byte values.
        self.begin_array(value.len());
        for &b in value {
            self.integer(i64::from(b));
        }
        self.end_array();
    }

    fn begin_array(&mut self, _len: usize) {
        self.pre_value();
        self.out.push('[');
        self.counts.push(0);
    }

    fn end_array(&mut self) {
        self.counts.pop();
        self.out.push(']');
    }

    fn begin_object(&mut self, _len: usize) {
        self.pre_value();
        self.out.push('{');
        self.counts.push(0);
    }

    fn key(&mut self, key: &str) {
        self.pre_value();
        self.push_escaped(key);
        self.out.push(':');
        self.after_key = true;
    }

    fn end_object(&mut self) {
        self.counts.pop();
        self.out.push('}');
    }
}

// ------------------------------------------------------------------------------------------------
// MessagePack bytes
// ------------------------------------------------------------------------------------------------

/// Produces MessagePack bytes, always choosing the smallest encoding
/// that fits.
#[derive(Debug, Default)]
pub struct MsgPackWriter {
    out: Vec<u8>,
}

impl MsgPackWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The accumulated wire bytes.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.out
    }

    fn be16(&mut self, v: u16) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }

    fn be32(&mut self, v: u32) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }

    /// 16/32-bit length header for the container families, which have no
    /// 8-bit form.
    #[allow(clippy::cast_possible_truncation)]
    fn container_header(&mut self, len: usize, tag16: u8, tag32: u8) {
        if let Ok(len) = u16::try_from(len) {
            self.out.push(tag16);
            self.be16(len);
        } else {
            self.out.push(tag32);
            self.be32(len as u32);
        }
    }

    /// 8/16/32-bit length header for the str and bin families.
    #[allow(clippy::cast_possible_truncation)]
    fn sized_header(&mut self, len: usize, tag8: u8, tag16: u8, tag32: u8) {
        if let Ok(len) = u8::try_from(len) {
            self.out.push(tag8);
            self.out.push(len);
        } else if let Ok(len) = u16::try_from(len) {
            self.out.push(tag16);
            self.be16(len);
        } else {
            self.out.push(tag32);
            self.be32(len as u32);
        }
    }
}

impl ValueWriter for MsgPackWriter {
    fn null(&mut self) {
        self.out.push(0xc0);
    }

    fn boolean(&mut self, value: bool) {
        self.out.push(if value { 0xc3 } else { 0xc2 });
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn integer(&mut self, value: i64) {
        if (0..=0x7f).contains(&value) {
            self.out.push(value as u8);
        } else if (-32..0).contains(&value) {
            self.out.push(value as u8);
        } else if value >= 0 {
            if let Ok(v) = u8::try_from(value) {
                self.out.push(0xcc);
                self.out.push(v);
            } else if let Ok(v) = u16::try_from(value) {
                self.out.push(0xcd);
                self.be16(v);
            } else if let Ok(v) = u32::try_from(value) {
                self.out.push(0xce);
                self.be32(v);
            } else {
                self.out.push(0xcf);
                self.out.extend_from_slice(&(value as u64).to_be_bytes());
            }
        } else if let Ok(v) = i8::try_from(value) {
            self.out.push(0xd0);
            self.out.push(v as u8);
        } else if let Ok(v) = i16::try_from(value) {
            self.out.push(0xd1);
            self.be16(v as u16);
        } else if let Ok(v) = i32::try_from(value) {
            self.out.push(0xd2);
            self.be32(v as u32);
        } else {
            self.out.push(0xd3);
            self.out.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn float(&mut self, value: f64) {
        self.out.push(0xcb);
        self.out.extend_from_slice(&value.to_be_bytes());
    }

    #[allow(clippy::cast_possible_truncation)]
    fn string(&mut self, value: &str) {
        if value.len() < 32 {
            self.out.push(0xa0 | value.len() as u8);
        } else {
            self.sized_header(value.len(), 0xd9, 0xda, 0xdb);
        }
        self.out.extend_from_slice(value.as_bytes());
    }

    fn binary(&mut self, value: &[u8]) {
        self.sized_header(value.len(), 0xc4, 0xc5, 0xc6);
        self.out.extend_from_slice(value);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn begin_array(&mut self, len: usize) {
        if len < 16 {
            self.out.push(0x90 | len as u8);
        } else {
            self.container_header(len, 0xdc, 0xdd);
        }
    }

    fn end_array(&mut self) {}

    #[allow(clippy::cast_possible_truncation)]
    fn begin_object(&mut self, len: usize) {
        if len < 16 {
            self.out.push(0x80 | len as u8);
        } else {
            self.container_header(len, 0xde, 0xdf);
        }
    }

    fn key(&mut self, key: &str) {
        self.string(key);
    }

    fn integer_key(&mut self, key: i64) {
        self.integer(key);
    }

    fn end_object(&mut self) {}
}
