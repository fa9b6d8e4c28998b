//! The HTTP event stream tagged union (spec.md §3.2).

use bytes::Bytes;

/// A header or trailer field name/value pair, with whitespace already
/// stripped from both sides (spec.md §6.2: split on the first `:`, strip
/// surrounding whitespace from both name and value — the `http.py`
/// variant, stripping bytes rather than casefolding either field).
pub type Field = (Bytes, Bytes);

/// Why a [`Event::Violation`] was raised.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// A configured maximum was exceeded.
    Limit,
    /// The input did not conform to HTTP/1.x framing.
    Protocol,
}

/// One HTTP protocol event, emitted by the [`crate::Tokenizer`] and
/// consumed by the [`crate::Assembler`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The request or response line: `(method, uri, version)` or
    /// `(version, code, reason)`.
    RLine(Bytes, Bytes, Bytes),
    /// An ordered sequence of header fields; an empty sequence marks the
    /// end of headers.
    Headers(Vec<Field>),
    /// A chunk of body data framed by `Content-Length`.
    Content(Bytes),
    /// A chunk of body data framed by chunked transfer-encoding; an empty
    /// payload is the final chunk marker.
    Chunk(Bytes),
    /// Trailer fields following the final chunk; an empty sequence marks
    /// the end of trailers.
    Trailers(Vec<Field>),
    /// Sentinel marking the end of one complete message.
    Message,
    /// A protocol violation: the limit or framing rule that was broken,
    /// plus whatever detail strings describe it (name, observed value).
    Violation(ViolationKind, Vec<String>),
    /// Bytes to be forwarded opaquely once the tokenizer has entered the
    /// bypass state.
    Bypass(Bytes),
}

impl Event {
    pub fn is_message(&self) -> bool {
        matches!(self, Event::Message)
    }

    pub fn is_bypass(&self) -> bool {
        matches!(self, Event::Bypass(_))
    }
}
