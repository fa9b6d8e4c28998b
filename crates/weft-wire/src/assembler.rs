//! The inverse of [`crate::Tokenizer`]: turns an [`Event`] stream back into
//! wire bytes (spec.md §4.C).

use bytes::{BufMut, Bytes, BytesMut};

use crate::event::{Event, Field};

/// Serializes a sequence of [`Event`]s into HTTP/1.x wire bytes.
///
/// Stateless aside from whatever chunked-framing bookkeeping a single
/// message needs: each [`Event::Chunk`] is rendered as its own
/// `<hex-size>CRLF` / data / CRLF triple (the 3-segment form spec.md §4.C
/// requires), and the empty chunk closes the body and opens trailers.
#[derive(Default)]
pub struct Assembler {
    in_chunked_body: bool,
}

impl Assembler {
    pub fn new() -> Self {
        Assembler::default()
    }

    /// Render one event, appending its wire bytes to `out`. Returns the
    /// number of bytes written.
    pub fn assemble(&mut self, event: &Event, out: &mut BytesMut) -> usize {
        let start = out.len();
        match event {
            Event::RLine(a, b, c) => {
                out.put_slice(a);
                out.put_u8(b' ');
                out.put_slice(b);
                out.put_u8(b' ');
                out.put_slice(c);
                out.put_slice(b"\r\n");
            }
            Event::Headers(fields) => write_fields(fields, out),
            Event::Content(bytes) => out.put_slice(bytes),
            Event::Chunk(bytes) => {
                self.in_chunked_body = true;
                out.put_slice(format!("{:x}", bytes.len()).as_bytes());
                out.put_slice(b"\r\n");
                out.put_slice(bytes);
                out.put_slice(b"\r\n");
            }
            Event::Trailers(fields) => {
                self.in_chunked_body = false;
                write_fields(fields, out)
            }
            Event::Message => {}
            Event::Violation(_, _) => {}
            Event::Bypass(bytes) => out.put_slice(bytes),
        }
        out.len() - start
    }

    /// Render a full slice of events into one buffer.
    pub fn assemble_all(&mut self, events: &[Event]) -> Bytes {
        let mut out = BytesMut::new();
        for event in events {
            self.assemble(event, &mut out);
        }
        out.freeze()
    }
}

/// A non-empty field set serializes to its `name: value` lines alone; the
/// empty set is the EOH/EOT marker itself and serializes to the closing
/// `CRLF` (spec.md §4.C). The two are distinct events on the wire and must
/// stay distinct here, or a populated set followed by its marker would
/// double up the blank line.
fn write_fields(fields: &[Field], out: &mut BytesMut) {
    if fields.is_empty() {
        out.put_slice(b"\r\n");
        return;
    }
    for (name, value) in fields {
        out.put_slice(name);
        out.put_slice(b": ");
        out.put_slice(value);
        out.put_slice(b"\r\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_simple_request() {
        let mut a = Assembler::new();
        let events = vec![
            Event::RLine(
                Bytes::from_static(b"GET"),
                Bytes::from_static(b"/test"),
                Bytes::from_static(b"HTTP/1.1"),
            ),
            Event::Headers(vec![(
                Bytes::from_static(b"Host"),
                Bytes::from_static(b"example.com"),
            )]),
            Event::Headers(vec![]),
            Event::Message,
        ];
        let out = a.assemble_all(&events);
        assert_eq!(out.as_ref(), b"GET /test HTTP/1.1\r\nHost: example.com\r\n\r\n".as_slice());
    }

    #[test]
    fn assembles_chunked_body() {
        let mut a = Assembler::new();
        let events = vec![
            Event::Chunk(Bytes::from_static(b"Wiki")),
            Event::Chunk(Bytes::new()),
            Event::Trailers(vec![]),
        ];
        let out = a.assemble_all(&events);
        assert_eq!(out.as_ref(), b"4\r\nWiki\r\n0\r\n\r\n\r\n".as_slice());
    }

    #[test]
    fn tokenize_then_assemble_roundtrips() {
        use crate::tokenizer::{Tokenizer, TokenizerConfig};

        let input = b"POST /x HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello".to_vec();
        let mut t = Tokenizer::new(TokenizerConfig::default());
        t.feed(&input);
        let mut events = Vec::new();
        while let Some(e) = t.next_event() {
            events.push(e);
        }

        let mut a = Assembler::new();
        let out = a.assemble_all(&events);
        assert_eq!(out.as_ref(), input.as_slice());
    }
}
