use alloc::{vec, vec::Vec};

use rstest::rstest;

use crate::{
    MsgPackDecoder, MsgPackWriter, ParseErrorKind, ValueKind, ValueWriter, write_node,
};

#[rstest]
#[case(&[0xc0], ValueKind::Null)]
#[case(&[0xc2], ValueKind::Boolean)]
#[case(&[0xc3], ValueKind::Boolean)]
#[case(&[0x00], ValueKind::Integer)]
#[case(&[0x7f], ValueKind::Integer)]
#[case(&[0xff], ValueKind::Integer)]
#[case(&[0xcc, 0xff], ValueKind::Integer)]
#[case(&[0xd3, 0, 0, 0, 0, 0, 0, 0, 1], ValueKind::Integer)]
#[case(&[0xca, 0x3f, 0x80, 0x00, 0x00], ValueKind::Float)]
#[case(&[0xcb, 0, 0, 0, 0, 0, 0, 0, 0], ValueKind::Float)]
#[case(&[0xa2, b'h', b'i'], ValueKind::String)]
#[case(&[0xc4, 0x01, 0xaa], ValueKind::Binary)]
#[case(&[0x90], ValueKind::Array)]
#[case(&[0x80], ValueKind::Object)]
fn single_value_kinds(#[case] bytes: &[u8], #[case] kind: ValueKind) {
    let store = MsgPackDecoder::parse(bytes).unwrap();
    assert_eq!(store.root().unwrap().kind(), kind);
}

#[test]
fn fixint_values() {
    assert_eq!(
        MsgPackDecoder::parse(&[0x05]).unwrap().root().unwrap().get_i64().unwrap(),
        5
    );
    // Negative fixint: byte - 256.
    assert_eq!(
        MsgPackDecoder::parse(&[0xe0]).unwrap().root().unwrap().get_i64().unwrap(),
        -32
    );
    assert_eq!(
        MsgPackDecoder::parse(&[0xff]).unwrap().root().unwrap().get_i64().unwrap(),
        -1
    );
}

#[rstest]
#[case(&[0xcc, 200], 200)]
#[case(&[0xcd, 0x01, 0x00], 256)]
#[case(&[0xce, 0x00, 0x01, 0x00, 0x00], 65536)]
#[case(&[0xcf, 0, 0, 0, 1, 0, 0, 0, 0], 1 << 32)]
#[case(&[0xd0, 0x80], -128)]
#[case(&[0xd1, 0xff, 0x00], -256)]
#[case(&[0xd2, 0xff, 0xff, 0xff, 0xfe], -2)]
#[case(&[0xd3, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff], -1)]
fn sized_integers_big_endian(#[case] bytes: &[u8], #[case] expected: i64) {
    let store = MsgPackDecoder::parse(bytes).unwrap();
    assert_eq!(store.root().unwrap().get_i64().unwrap(), expected);
}

#[test]
fn u64_above_i64_is_out_of_range() {
    let bytes = [0xcf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
    let store = MsgPackDecoder::parse(&bytes).unwrap();
    assert_eq!(
        store.root().unwrap().get_i64().unwrap_err(),
        crate::AccessError::NumberOutOfRange
    );
    // The float getter still widens it, matching the text path.
    #[allow(clippy::cast_precision_loss)]
    let expected = u64::MAX as f64;
    assert_eq!(store.root().unwrap().get_f64().unwrap(), expected);
}

#[test]
fn floats_decode_lazily() {
    let store = MsgPackDecoder::parse(&[0xca, 0x3f, 0x80, 0x00, 0x00]).unwrap();
    assert_eq!(store.root().unwrap().get_f64().unwrap(), 1.0);

    let bytes: Vec<u8> = core::iter::once(0xcb)
        .chain(2.5f64.to_be_bytes())
        .collect();
    let store = MsgPackDecoder::parse(&bytes).unwrap();
    assert_eq!(store.root().unwrap().get_f64().unwrap(), 2.5);
}

#[test]
fn strings_and_bins() {
    let store = MsgPackDecoder::parse(&[0xa5, b'h', b'e', b'l', b'l', b'o']).unwrap();
    let root = store.root().unwrap();
    // Span starts at the format byte.
    assert_eq!(root.span().byte_at(0), Some(0xa5));
    assert_eq!(root.get_str().unwrap(), "hello");

    let mut bytes = vec![0xd9, 3];
    bytes.extend_from_slice(b"abc");
    let store = MsgPackDecoder::parse(&bytes).unwrap();
    assert_eq!(store.root().unwrap().get_str().unwrap(), "abc");

    let store = MsgPackDecoder::parse(&[0xc4, 2, 0xde, 0xad]).unwrap();
    assert_eq!(store.root().unwrap().get_bytes().unwrap(), &[0xde, 0xad]);
}

#[test]
fn ext_values_parse_as_binary() {
    // fixext4: tag, type, 4 payload bytes.
    let store = MsgPackDecoder::parse(&[0xd6, 0x01, 1, 2, 3, 4]).unwrap();
    let root = store.root().unwrap();
    assert_eq!(root.kind(), ValueKind::Binary);
    assert_eq!(root.get_bytes().unwrap(), &[1, 2, 3, 4]);

    // ext8: tag, len, type, payload.
    let store = MsgPackDecoder::parse(&[0xc7, 2, 0x05, 9, 8]).unwrap();
    assert_eq!(store.root().unwrap().get_bytes().unwrap(), &[9, 8]);
}

#[test]
fn fixmap_scenario() {
    // Encode {0: 1, 2: 3} with fixint keys.
    let mut writer = MsgPackWriter::new();
    writer.begin_object(2);
    writer.integer_key(0);
    writer.integer(1);
    writer.integer_key(2);
    writer.integer(3);
    writer.end_object();
    let bytes = writer.finish();
    assert_eq!(bytes, vec![0x82, 0x00, 0x01, 0x02, 0x03]);

    let store = MsgPackDecoder::parse(&bytes).unwrap();
    let root = store.root().unwrap();
    assert_eq!(root.len(), 2);
    assert_eq!(root.get_key("0").unwrap().get_i64().unwrap(), 1);
    assert_eq!(root.get_key("2").unwrap().get_i64().unwrap(), 3);
}

#[test]
fn nested_containers() {
    // [[1, "a"], {"k": nil}]
    let bytes = [
        0x92, 0x92, 0x01, 0xa1, b'a', 0x81, 0xa1, b'k', 0xc0,
    ];
    let store = MsgPackDecoder::parse(&bytes).unwrap();
    let root = store.root().unwrap();
    assert_eq!(root.len(), 2);
    let first = root.get(0).unwrap();
    assert_eq!(first.get(1).unwrap().get_str().unwrap(), "a");
    let second = root.get(1).unwrap();
    assert!(second.get_key("k").unwrap().is_null());
}

#[test]
fn array16_and_map16() {
    let mut bytes = vec![0xdc, 0x00, 0x11];
    bytes.extend_from_slice(&[0x01; 17]);
    let store = MsgPackDecoder::parse(&bytes).unwrap();
    assert_eq!(store.root().unwrap().len(), 17);

    let mut writer = MsgPackWriter::new();
    writer.begin_object(16);
    for i in 0..16 {
        writer.integer_key(i);
        writer.integer(i);
    }
    writer.end_object();
    let bytes = writer.finish();
    assert_eq!(&bytes[..3], &[0xde, 0x00, 0x10]);
    let store = MsgPackDecoder::parse(&bytes).unwrap();
    assert_eq!(store.root().unwrap().len(), 16);
}

#[test]
fn reserved_byte_is_rejected() {
    let err = MsgPackDecoder::parse(&[0xc1]).unwrap_err();
    assert_eq!(err.offset, 0);
    assert_eq!(err.reason, ParseErrorKind::UnknownFormatByte(0xc1));
}

#[test]
fn truncated_payloads() {
    let err = MsgPackDecoder::parse(&[0xa5, b'h']).unwrap_err();
    assert_eq!(err.reason, ParseErrorKind::TruncatedPayload);

    let err = MsgPackDecoder::parse(&[0xcd, 0x01]).unwrap_err();
    assert_eq!(err.reason, ParseErrorKind::TruncatedPayload);

    // Array announcing two elements but carrying one.
    let err = MsgPackDecoder::parse(&[0x92, 0x01]).unwrap_err();
    assert_eq!(err.reason, ParseErrorKind::UnexpectedEndOfInput);
}

#[test]
fn trailing_bytes_rejected() {
    let err = MsgPackDecoder::parse(&[0x01, 0x02]).unwrap_err();
    assert_eq!(err.offset, 1);
    assert_eq!(err.reason, ParseErrorKind::TrailingBytes);
}

#[test]
fn msgpack_tree_writes_back() {
    let bytes = [0x82, 0xa1, b'a', 0x01, 0xa1, b'b', 0x93, 0xc0, 0xc3, 0xa1, b'x'];
    let store = MsgPackDecoder::parse(&bytes).unwrap();
    let mut writer = MsgPackWriter::new();
    write_node(&mut writer, store.root().unwrap()).unwrap();
    assert_eq!(writer.finish(), bytes);
}
