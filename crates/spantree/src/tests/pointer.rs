use alloc::{string::String, vec::Vec};

use crate::{
    AccessError, JsonDecoder, JsonWriter, MsgPackDecoder, remove, resolve, set, write_node,
};

fn to_json(store: &crate::ValueStore) -> String {
    let mut writer = JsonWriter::new();
    write_node(&mut writer, store.root().unwrap()).unwrap();
    writer.finish()
}

#[test]
fn empty_path_is_the_node_itself() {
    let store = JsonDecoder::parse(b"[1]").unwrap();
    let root = store.root().unwrap();
    let hits = resolve(root, "").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].index(), root.index());
    let hits = resolve(root, "/").unwrap();
    assert_eq!(hits[0].index(), root.index());
}

#[test]
fn literal_and_index_segments() {
    let store = JsonDecoder::parse(br#"{"a":[{"name":"x"},{"name":"y"}]}"#).unwrap();
    let root = store.root().unwrap();
    let hits = resolve(root, "/a/1/name").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].get_str().unwrap(), "y");
}

#[test]
fn numeric_segment_is_a_key_on_objects() {
    let store = JsonDecoder::parse(br#"{"0":"zero"}"#).unwrap();
    let hits = resolve(store.root().unwrap(), "/0").unwrap();
    assert_eq!(hits[0].get_str().unwrap(), "zero");
}

#[test]
fn missing_key_and_index_errors() {
    let store = JsonDecoder::parse(br#"{"a":[1]}"#).unwrap();
    let root = store.root().unwrap();
    assert_eq!(
        resolve(root, "/nope").unwrap_err(),
        AccessError::NotFound("nope".into())
    );
    assert_eq!(
        resolve(root, "/a/3").unwrap_err(),
        AccessError::IndexOutOfRange { index: 3, len: 1 }
    );
}

#[test]
fn wildcard_fans_out_over_arrays_and_objects() {
    let store =
        JsonDecoder::parse(br#"{"a":[{"x":1},{"y":2},{"x":3}],"b":{"p":4,"q":5}}"#).unwrap();
    let root = store.root().unwrap();

    // Every element that has the key matches; the rest drop out.
    let hits = resolve(root, "/a/*/x").unwrap();
    let values: Vec<i64> = hits.iter().map(|n| n.get_i64().unwrap()).collect();
    assert_eq!(values, [1, 3]);

    // Full cardinality when every element has the key.
    let hits = resolve(root, "/a/*").unwrap();
    assert_eq!(hits.len(), 3);

    // Object wildcard walks values, not keys.
    let hits = resolve(root, "/b/*").unwrap();
    let values: Vec<i64> = hits.iter().map(|n| n.get_i64().unwrap()).collect();
    assert_eq!(values, [4, 5]);
}

#[test]
fn set_replaces_scalars_in_place() {
    let mut store = JsonDecoder::parse(br#"{"a":1}"#).unwrap();
    set(&mut store, "/a", b"42").unwrap();
    assert_eq!(to_json(&store), r#"{"a":42}"#);
}

#[test]
fn set_auto_creates_missing_object_keys() {
    let mut store = JsonDecoder::parse(b"{}").unwrap();
    set(&mut store, "/new/key", b"1").unwrap();
    assert_eq!(to_json(&store), r#"{"new":{"key":1}}"#);
}

#[test]
fn set_never_creates_array_indices() {
    let mut store = JsonDecoder::parse(br#"{"a":[1]}"#).unwrap();
    let err = set(&mut store, "/a/5", b"2").unwrap_err();
    assert!(matches!(
        err,
        crate::PathError::Access(AccessError::IndexOutOfRange { index: 5, .. })
    ));
}

#[test]
fn set_replaces_whole_subtrees() {
    let mut store = JsonDecoder::parse(br#"{"a":[1,2,3]}"#).unwrap();
    set(&mut store, "/a", br#"{"inner":true}"#).unwrap();
    assert_eq!(to_json(&store), r#"{"a":{"inner":true}}"#);
}

#[test]
fn set_through_wildcard() {
    let mut store = JsonDecoder::parse(br#"{"a":[{"x":1},{"x":2}]}"#).unwrap();
    set(&mut store, "/a/*/x", b"0").unwrap();
    assert_eq!(to_json(&store), r#"{"a":[{"x":0},{"x":0}]}"#);
}

#[test]
fn set_with_malformed_bytes_leaves_the_store_untouched() {
    let mut store = JsonDecoder::parse(br#"{"a":[5,6]}"#).unwrap();
    let len = store.len();
    assert!(set(&mut store, "/a", b"[1, oops]").is_err());
    assert_eq!(store.len(), len);
    assert_eq!(to_json(&store), r#"{"a":[5,6]}"#);

    // A key vivified on one wildcard branch unwinds when a later branch
    // fails resolution.
    let mut store = JsonDecoder::parse(br#"{"a":{},"b":[1]}"#).unwrap();
    let len = store.len();
    assert!(set(&mut store, "/*/k", b"0").is_err());
    assert_eq!(store.len(), len);
    assert_eq!(to_json(&store), r#"{"a":{},"b":[1]}"#);
}

#[test]
fn set_on_msgpack_store_takes_msgpack_bytes() {
    let mut store = MsgPackDecoder::parse(&[0x81, 0xa1, b'a', 0x01]).unwrap();
    set(&mut store, "/a", &[0x2a]).unwrap();
    let root = store.root().unwrap();
    assert_eq!(root.get_key("a").unwrap().get_i64().unwrap(), 42);
}

#[test]
fn remove_tombstones_the_pair() {
    let mut store = JsonDecoder::parse(br#"{"a":1,"b":2}"#).unwrap();
    assert_eq!(remove(&mut store, "/a").unwrap(), 1);
    assert_eq!(to_json(&store), r#"{"b":2}"#);
    // The arena never shrinks.
    assert_eq!(store.len(), 5);
}

#[test]
fn remove_array_element() {
    let mut store = JsonDecoder::parse(br#"[10,20,30]"#).unwrap();
    remove(&mut store, "/1").unwrap();
    assert_eq!(to_json(&store), "[10,30]");
}

#[test]
fn indices_stay_valid_after_removal() {
    let mut store = JsonDecoder::parse(br#"{"a":[1,2],"b":2}"#).unwrap();
    let b_index = {
        let root = store.root().unwrap();
        root.get_key("b").unwrap().index()
    };
    remove(&mut store, "/a").unwrap();
    // A handle re-acquired at the saved index still reads the same value.
    let b = store.handle(b_index).unwrap();
    assert_eq!(b.get_i64().unwrap(), 2);
    assert_eq!(b.path().unwrap(), "/b");
}

#[test]
fn path_rendering_from_node() {
    let store = JsonDecoder::parse(br#"{"a":[{"aa":1}]}"#).unwrap();
    let root = store.root().unwrap();
    assert_eq!(root.path().unwrap(), "/");
    let hit = &resolve(root, "/a/0/aa").unwrap()[0];
    assert_eq!(hit.path().unwrap(), "/a/0/aa");
}
