use alloc::{string::ToString, vec::Vec};

use quickcheck::QuickCheck;

use super::arbitrary::Doc;
use crate::{
    JsonDecoder, JsonWriter, MsgPackDecoder, MsgPackWriter, diff, write_node,
};

fn test_count() -> u64 {
    if is_ci::cached() { 1_000 } else { 200 }
}

/// Property: writing a parsed tree back to JSON re-parses to a
/// structurally equal tree (empty diff).
#[test]
fn json_roundtrip_quickcheck() {
    fn prop(doc: Doc) -> bool {
        let text = doc.to_string();
        let store = JsonDecoder::parse(text.as_bytes()).unwrap();

        let mut writer = JsonWriter::new();
        write_node(&mut writer, store.root().unwrap()).unwrap();
        let rewritten = writer.finish();

        let reparsed = JsonDecoder::parse(rewritten.as_bytes()).unwrap();
        diff(store.root().unwrap(), reparsed.root().unwrap())
            .unwrap()
            .is_empty()
    }

    QuickCheck::new()
        .tests(test_count())
        .quickcheck(prop as fn(Doc) -> bool);
}

/// Property: re-encoding a JSON tree as MessagePack and decoding it
/// yields a structurally equal tree, across wire formats.
#[test]
fn cross_format_roundtrip_quickcheck() {
    fn prop(doc: Doc) -> bool {
        let text = doc.to_string();
        let store = JsonDecoder::parse(text.as_bytes()).unwrap();

        let mut writer = MsgPackWriter::new();
        write_node(&mut writer, store.root().unwrap()).unwrap();
        let bytes = writer.finish();

        let decoded = MsgPackDecoder::parse(&bytes).unwrap();
        diff(store.root().unwrap(), decoded.root().unwrap())
            .unwrap()
            .is_empty()
    }

    QuickCheck::new()
        .tests(test_count())
        .quickcheck(prop as fn(Doc) -> bool);
}

/// The JSON writer output is valid JSON by an independent parser.
#[test]
fn writer_output_is_valid_json() {
    let inputs: &[&[u8]] = &[
        br#"{"a":[1,2.5,null,true,"s\n\"q\""],"b":{},"c":[[]]}"#,
        r#""A😀""#.as_bytes(),
        b"[-9223372036854775808,9223372036854775807]",
    ];
    for input in inputs {
        let store = JsonDecoder::parse(input).unwrap();
        let mut writer = JsonWriter::new();
        write_node(&mut writer, store.root().unwrap()).unwrap();
        let text = writer.finish();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        // And it agrees with the independent parse of the input.
        let original: serde_json::Value =
            serde_json::from_slice(input).unwrap();
        assert_eq!(value, original, "{text}");
    }
}

#[test]
fn binary_nodes_render_as_byte_arrays_in_json() {
    let store = MsgPackDecoder::parse(&[0xc4, 3, 1, 2, 3]).unwrap();
    let mut writer = JsonWriter::new();
    write_node(&mut writer, store.root().unwrap()).unwrap();
    assert_eq!(writer.finish(), "[1,2,3]");
}

#[test]
fn from_node_and_to_writer_hooks() {
    use crate::{FromNode, ToWriter};

    let store = JsonDecoder::parse(br#"{"xs":[1,2,3],"name":"n","opt":null}"#).unwrap();
    let root = store.root().unwrap();

    let xs = Vec::<i64>::from_node(root.get_key("xs").unwrap()).unwrap();
    assert_eq!(xs, [1, 2, 3]);
    let name = alloc::string::String::from_node(root.get_key("name").unwrap()).unwrap();
    assert_eq!(name, "n");
    let opt = Option::<i64>::from_node(root.get_key("opt").unwrap()).unwrap();
    assert_eq!(opt, None);

    let mut writer = JsonWriter::new();
    xs.write_into(&mut writer);
    assert_eq!(writer.finish(), "[1,2,3]");
}
