//! Typed conversion hooks between native values and trees.
//!
//! These are the compile-time, trait-dispatched seams for mapping an
//! open set of native types onto the tree: [`FromNode`] reads a typed
//! value out of a [`NodeHandle`], [`ToWriter`] drives any
//! [`ValueWriter`] from a native value. Composite types compose from
//! the primitive impls.

use alloc::{collections::BTreeMap, string::String, vec::Vec};

use crate::{error::AccessError, node::NodeHandle, writer::ValueWriter};

/// Builds `Self` from a tree node.
pub trait FromNode: Sized {
    fn from_node(node: NodeHandle<'_>) -> Result<Self, AccessError>;
}

impl FromNode for bool {
    fn from_node(node: NodeHandle<'_>) -> Result<Self, AccessError> {
        node.get_bool()
    }
}

impl FromNode for i32 {
    fn from_node(node: NodeHandle<'_>) -> Result<Self, AccessError> {
        node.get_i32()
    }
}

impl FromNode for i64 {
    fn from_node(node: NodeHandle<'_>) -> Result<Self, AccessError> {
        node.get_i64()
    }
}

impl FromNode for f64 {
    fn from_node(node: NodeHandle<'_>) -> Result<Self, AccessError> {
        node.get_f64()
    }
}

impl FromNode for String {
    fn from_node(node: NodeHandle<'_>) -> Result<Self, AccessError> {
        Ok(node.get_str()?.into_owned())
    }
}

impl<T: FromNode> FromNode for Option<T> {
    fn from_node(node: NodeHandle<'_>) -> Result<Self, AccessError> {
        if node.is_null() {
            return Ok(None);
        }
        T::from_node(node).map(Some)
    }
}

impl<T: FromNode> FromNode for Vec<T> {
    fn from_node(node: NodeHandle<'_>) -> Result<Self, AccessError> {
        node.array_items()?.map(T::from_node).collect()
    }
}

impl<T: FromNode> FromNode for BTreeMap<String, T> {
    fn from_node(node: NodeHandle<'_>) -> Result<Self, AccessError> {
        let mut map = BTreeMap::new();
        for (key, value) in node.object_items()? {
            map.insert(key.key_text()?.into_owned(), T::from_node(value)?);
        }
        Ok(map)
    }
}

/// Writes `self` into a [`ValueWriter`].
pub trait ToWriter {
    fn write_into<W: ValueWriter>(&self, writer: &mut W);
}

impl ToWriter for bool {
    fn write_into<W: ValueWriter>(&self, writer: &mut W) {
        writer.boolean(*self);
    }
}

impl ToWriter for i32 {
    fn write_into<W: ValueWriter>(&self, writer: &mut W) {
        writer.integer(i64::from(*self));
    }
}

impl ToWriter for i64 {
    fn write_into<W: ValueWriter>(&self, writer: &mut W) {
        writer.integer(*self);
    }
}

impl ToWriter for f64 {
    fn write_into<W: ValueWriter>(&self, writer: &mut W) {
        writer.float(*self);
    }
}

impl ToWriter for str {
    fn write_into<W: ValueWriter>(&self, writer: &mut W) {
        writer.string(self);
    }
}

impl ToWriter for String {
    fn write_into<W: ValueWriter>(&self, writer: &mut W) {
        writer.string(self);
    }
}

impl<T: ToWriter> ToWriter for Option<T> {
    fn write_into<W: ValueWriter>(&self, writer: &mut W) {
        match self {
            Some(value) => value.write_into(writer),
            None => writer.null(),
        }
    }
}

impl<T: ToWriter> ToWriter for [T] {
    fn write_into<W: ValueWriter>(&self, writer: &mut W) {
        writer.begin_array(self.len());
        for item in self {
            item.write_into(writer);
        }
        writer.end_array();
    }
}

impl<T: ToWriter> ToWriter for Vec<T> {
    fn write_into<W: ValueWriter>(&self, writer: &mut W) {
        self.as_slice().write_into(writer);
    }
}

impl<T: ToWriter> ToWriter for BTreeMap<String, T> {
    fn write_into<W: ValueWriter>(&self, writer: &mut W) {
        writer.begin_object(self.len());
        for (key, value) in self {
            writer.key(key);
            value.write_into(writer);
        }
        writer.end_object();
    }
}
