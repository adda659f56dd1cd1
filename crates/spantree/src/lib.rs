//! Zero-copy JSON and MessagePack trees.
//!
//! `spantree` parses textual JSON and binary MessagePack into a flat,
//! arena-backed value store. Records hold byte spans into the original
//! buffer plus a type tag and a parent index; no per-node heap graph is
//! built and scalar payloads are decoded lazily, on access.
//!
//! On top of the store the crate provides cursor-style navigation
//! ([`NodeHandle`]), pointer-path addressing with wildcard fan-out
//! ([`resolve`], [`set`], [`remove`]) and a structural diff ([`diff`]).
//!
//! ```rust
//! use spantree::{JsonDecoder, resolve};
//!
//! let store = JsonDecoder::parse(br#"{"a":[{"aa":1}]}"#).unwrap();
//! let root = store.root().unwrap();
//! let hits = resolve(root, "/a/0/aa").unwrap();
//! assert_eq!(hits[0].get_i64().unwrap(), 1);
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod span;
mod store;

mod convert;
mod diff;
mod error;
mod json;
mod msgpack;
mod node;
mod path;
mod writer;

#[cfg(test)]
mod tests;

pub use convert::{FromNode, ToWriter};
pub use diff::{DiffEntry, DiffKind, diff};
pub use error::{AccessError, ParseError, ParseErrorKind, PathError};
pub use json::JsonDecoder;
pub use msgpack::MsgPackDecoder;
pub use node::{Children, NodeHandle, ObjectItems, Traverse};
pub use path::{remove, resolve, set};
pub use span::ByteSpan;
pub use store::{ValueKind, ValueStore, WireFormat};
pub use writer::{JsonWriter, MsgPackWriter, ValueWriter, write_node};
