//! Recursive-descent JSON decoding into a [`ValueStore`].
//!
//! Each value appends one placeholder record, parses its children (which
//! append records pointing back at the placeholder's index) and finally
//! overwrites the placeholder with a record whose span covers the whole
//! construct. That keeps the parents-precede-descendants invariant
//! without any post-pass.
//!
//! Strings are only scanned here, never unescaped; decoding happens
//! lazily in [`NodeHandle::get_str`](crate::NodeHandle::get_str).

use crate::{
    error::{ParseError, ParseErrorKind},
    span::ByteSpan,
    store::{ValueKind, ValueRecord, ValueStore, WireFormat},
};

/// Hard cap on container nesting; adversarial input must not be able to
/// exhaust the call stack.
const MAX_DEPTH: usize = 512;

/// Parser for textual JSON (RFC 8259).
pub struct JsonDecoder;

impl JsonDecoder {
    /// Parses a complete JSON document. The top-level value may be any
    /// JSON value, not only an array or object.
    pub fn parse(bytes: &[u8]) -> Result<ValueStore, ParseError> {
        let mut store = ValueStore::new(WireFormat::Json);
        let mut parser = Parser::new(&mut store, ByteSpan::new(bytes));
        parser.skip_ws();
        parser.parse_value(-1, None)?;
        parser.skip_ws();
        parser.expect_end()?;
        Ok(store)
    }
}

/// Parses `bytes` as one JSON value directly into `slot` of an existing
/// store, used by pointer-path mutation. Children (for container values)
/// are appended at the end of the arena with `slot` as their parent;
/// `parent` is retained on the slot record.
pub(crate) fn decode_into(
    store: &mut ValueStore,
    bytes: &[u8],
    slot: usize,
    parent: isize,
) -> Result<(), ParseError> {
    let mut parser = Parser::new(store, ByteSpan::new(bytes));
    parser.skip_ws();
    parser.parse_value(parent, Some(slot))?;
    parser.skip_ws();
    parser.expect_end()
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

    fn peek(&self) -> Option<u8> {
        self.span.byte_at(self.pos)
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn err(&self, reason: ParseErrorKind) -> ParseError {
        ParseError::new(self.pos, reason)
    }

    fn eof(&self) -> ParseError {
        self.err(ParseErrorKind::UnexpectedEndOfInput)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.bump();
        }
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        if self.pos < self.span.len() {
            return Err(self.err(ParseErrorKind::TrailingBytes));
        }
        Ok(())
    }

    /// Parses one value. `slot` is `Some` when an existing record is
    /// being overwritten in place, `None` to append.
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
        let kind = match self.peek() {
            None => return Err(self.eof()),
            Some(b'{') => {
                self.parse_object(index)?;
                ValueKind::Object
            }
            Some(b'[') => {
                self.parse_array(index)?;
                ValueKind::Array
            }
            Some(b'"') => {
                self.scan_string()?;
                ValueKind::String
            }
            Some(b't') => {
                self.expect_literal(b"true")?;
                ValueKind::Boolean
            }
            Some(b'f') => {
                self.expect_literal(b"false")?;
                ValueKind::Boolean
            }
            Some(b'n') => {
                self.expect_literal(b"null")?;
                ValueKind::Null
            }
            Some(b'-' | b'0'..=b'9') => self.scan_number()?,
            Some(b) => return Err(self.err(ParseErrorKind::UnexpectedByte(b))),
        };

        let span = self.span.sub(start, self.pos - start);
        self.store.replace(index, ValueRecord::new(span, kind, parent));
        self.depth -= 1;
        Ok(index)
    }

    fn parse_object(&mut self, index: usize) -> Result<(), ParseError> {
        self.bump(); // {
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.bump();
            return Ok(());
        }
        let parent = isize::try_from(index).unwrap_or(isize::MAX);
        loop {
            self.skip_ws();
            if self.peek() != Some(b'"') {
                return Err(self.err(ParseErrorKind::ExpectedObjectKey));
            }
            let key_start = self.pos;
            self.scan_string()?;
            let key_span = self.span.sub(key_start, self.pos - key_start);
            self.store
                .push(ValueRecord::new(key_span, ValueKind::String, parent));

            self.skip_ws();
            match self.peek() {
                Some(b':') => self.bump(),
                Some(b) => return Err(self.err(ParseErrorKind::UnexpectedByte(b))),
                None => return Err(self.eof()),
            }
            self.skip_ws();
            self.parse_value(parent, None)?;
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.bump(),
                Some(b'}') => {
                    self.bump();
                    return Ok(());
                }
                Some(b) => return Err(self.err(ParseErrorKind::UnexpectedByte(b))),
                None => return Err(self.eof()),
            }
        }
    }

    fn parse_array(&mut self, index: usize) -> Result<(), ParseError> {
        self.bump(); // [
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.bump();
            return Ok(());
        }
        let parent = isize::try_from(index).unwrap_or(isize::MAX);
        loop {
            self.skip_ws();
            self.parse_value(parent, None)?;
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.bump(),
                Some(b']') => {
                    self.bump();
                    return Ok(());
                }
                Some(b) => return Err(self.err(ParseErrorKind::UnexpectedByte(b))),
                None => return Err(self.eof()),
            }
        }
    }

    /// Scans a string literal to its closing quote, validating escape
    /// syntax without decoding it.
    fn scan_string(&mut self) -> Result<(), ParseError> {
        self.bump(); // opening quote
        loop {
            match self.peek() {
                None => return Err(self.eof()),
                Some(b'"') => {
                    self.bump();
                    return Ok(());
                }
                Some(b'\\') => {
                    self.bump();
                    match self.peek() {
                        None => return Err(self.eof()),
                        Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => {
                            self.bump();
                        }
                        Some(b'u') => {
                            self.bump();
                            for _ in 0..4 {
                                match self.peek() {
                                    Some(h) if h.is_ascii_hexdigit() => self.bump(),
                                    Some(_) => {
                                        return Err(
                                            self.err(ParseErrorKind::InvalidUnicodeEscape)
                                        );
                                    }
                                    None => return Err(self.eof()),
                                }
                            }
                        }
                        Some(b) => return Err(self.err(ParseErrorKind::InvalidEscape(b))),
                    }
                }
                // Raw control characters are not allowed inside strings.
                Some(b) if b < 0x20 => {
                    return Err(self.err(ParseErrorKind::UnexpectedByte(b)));
                }
                Some(_) => self.bump(),
            }
        }
    }

    /// Scans a number literal. Integer vs float is decided here, once,
    /// from the literal's characters.
    fn scan_number(&mut self) -> Result<ValueKind, ParseError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.bump();
        }
        if self.digit_run() == 0 {
            return Err(self.err(ParseErrorKind::InvalidNumber));
        }
        if self.peek() == Some(b'.') {
            self.bump();
            if self.digit_run() == 0 {
                return Err(self.err(ParseErrorKind::InvalidNumber));
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.bump();
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.bump();
            }
            if self.digit_run() == 0 {
                return Err(self.err(ParseErrorKind::InvalidNumber));
            }
        }
        let lexeme = self.span.sub(start, self.pos - start);
        Ok(if lexeme.looks_like_integer() {
            ValueKind::Integer
        } else {
            ValueKind::Float
        })
    }

    fn digit_run(&mut self) -> usize {
        let mut n = 0;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.bump();
            n += 1;
        }
        n
    }

    fn expect_literal(&mut self, literal: &[u8]) -> Result<(), ParseError> {
        let rest = self.span.advance(self.pos);
        if rest.starts_with(literal) {
            self.pos += literal.len();
            return Ok(());
        }
        if rest.len() < literal.len() {
            return Err(self.eof());
        }
        let mismatch = literal
            .iter()
            .enumerate()
            .find(|&(i, &b)| rest.byte_at(i) != Some(b))
            .map_or(0, |(i, _)| i);
        Err(ParseError::new(
            self.pos + mismatch,
            ParseErrorKind::UnexpectedByte(rest.byte_at(mismatch).unwrap_or(0)),
        ))
    }
}
