//! The incremental HTTP/1.x tokenizer (spec.md §4.B).
//!
//! [`Tokenizer::feed`] accepts bytes as they arrive from the transport and
//! [`Tokenizer::next_event`] drains whatever [`Event`]s that made available.
//! The state machine never blocks and never requires a specific feed
//! partitioning: the same input split across any boundaries yields the same
//! event sequence (SPEC_FULL.md testable property #4).

use std::collections::VecDeque;

use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::event::{Event, Field, ViolationKind};

/// Tunable limits for the tokenizer, per spec.md §4.B step 1 table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenizerConfig {
    pub max_line_size: usize,
    pub max_headers: usize,
    pub max_trailers: usize,
    pub max_header_size: usize,
    pub max_header_set_size: usize,
    pub max_trailer_size: usize,
    pub max_chunk_line_size: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig {
            max_line_size: 4096,
            max_headers: 1024,
            max_trailers: 32,
            max_header_size: 131_070,
            max_header_set_size: 8192,
            max_trailer_size: 131_070,
            max_chunk_line_size: 1024,
        }
    }
}

#[derive(Clone, Debug)]
enum ChunkState {
    /// Waiting for the `<size>[;ext]CRLF` line.
    Size,
    /// Inside chunk data, `remaining` bytes left, then a CRLF to consume.
    Data(u64),
    /// Waiting for the CRLF that follows a chunk's data.
    DataCrlf,
}

#[derive(Clone, Debug)]
enum Framing {
    /// No body: the message ends right after headers.
    None,
    ContentLength(u64),
    Chunked(ChunkState),
    /// No declared length; body runs until the transport closes (only
    /// legal for responses, per spec.md §4.B step 5).
    ToClose,
}

#[derive(Clone, Debug)]
enum State {
    StripLeadingCrlf,
    RequestLine,
    Headers { fields: Vec<Field>, set_size: usize },
    Body(Framing),
    Trailers { fields: Vec<Field>, set_size: usize },
    Bypass,
}

/// Incremental HTTP/1.x message tokenizer.
pub struct Tokenizer {
    config: TokenizerConfig,
    buf: BytesMut,
    state: State,
    events: VecDeque<Event>,
    /// Status code of the response currently being parsed, set when the
    /// request/status line is tokenized and consulted once headers are
    /// complete (spec.md §4.B step 3: 204/1xx force a bodyless message).
    status: Option<Bytes>,
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        Tokenizer {
            config,
            buf: BytesMut::new(),
            state: State::StripLeadingCrlf,
            events: VecDeque::new(),
            status: None,
        }
    }

    /// Feed newly received bytes and drive the state machine as far as it
    /// can go with what's buffered.
    pub fn feed(&mut self, data: &[u8]) {
        if matches!(self.state, State::Bypass) {
            if !data.is_empty() {
                self.events.push_back(Event::Bypass(Bytes::copy_from_slice(data)));
            }
            return;
        }
        self.buf.extend_from_slice(data);
        self.advance();
    }

    /// Pop the next buffered event, if any.
    pub fn next_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    fn violate(&mut self, kind: ViolationKind, detail: Vec<String>) {
        warn!(?kind, ?detail, "HTTP tokenizer violation");
        self.events.push_back(Event::Violation(kind, detail));
        let remainder = self.buf.split().freeze();
        if !remainder.is_empty() {
            self.events.push_back(Event::Bypass(remainder));
        }
        self.state = State::Bypass;
    }

    fn find_crlf(&self) -> Option<usize> {
        find_subslice(&self.buf, b"\r\n")
    }

    /// Run the state machine until it can no longer make progress.
    fn advance(&mut self) {
        loop {
            match &mut self.state {
                State::Bypass => return,
                State::StripLeadingCrlf => {
                    let mut n = 0;
                    while self.buf.get(n..n + 2) == Some(b"\r\n") {
                        n += 2;
                    }
                    if n > 0 {
                        self.buf.advance(n);
                    }
                    self.state = State::RequestLine;
                }
                State::RequestLine => {
                    let Some(pos) = self.find_crlf() else {
                        if self.buf.len() > self.config.max_line_size {
                            self.violate(
                                ViolationKind::Limit,
                                vec!["max_line_size".into(), self.buf.len().to_string()],
                            );
                        }
                        return;
                    };
                    if pos > self.config.max_line_size {
                        self.violate(
                            ViolationKind::Limit,
                            vec!["max_line_size".into(), pos.to_string()],
                        );
                        continue;
                    }
                    let line = self.buf.split_to(pos).freeze();
                    self.buf.advance(2);

                    let mut parts = line.splitn(3, |&b| b == b' ');
                    let a = parts.next().unwrap_or(&[]);
                    let b = parts.next().unwrap_or(&[]);
                    let c = parts.next().unwrap_or(&[]);
                    if a.is_empty() || b.is_empty() || c.is_empty() {
                        self.violate(
                            ViolationKind::Protocol,
                            vec!["malformed request/status line".into()],
                        );
                        continue;
                    }
                    let a = slice_in(&line, a);
                    let b = slice_in(&line, b);
                    let c = slice_in(&line, c);
                    trace!(?a, ?b, ?c, "tokenized rline");
                    self.status = if a.starts_with(b"HTTP/") { Some(b.clone()) } else { None };
                    self.events.push_back(Event::RLine(a, b, c));
                    self.state = State::Headers {
                        fields: Vec::new(),
                        set_size: 0,
                    };
                }
                State::Headers { fields, set_size } => {
                    let Some(pos) = self.find_crlf() else {
                        if self.buf.len() > self.config.max_header_size {
                            self.violate(
                                ViolationKind::Limit,
                                vec!["max_header_size".into(), self.buf.len().to_string()],
                            );
                        }
                        return;
                    };
                    if pos > self.config.max_header_size {
                        self.violate(
                            ViolationKind::Limit,
                            vec!["max_header_size".into(), pos.to_string()],
                        );
                        continue;
                    }
                    let line = self.buf.split_to(pos).freeze();
                    self.buf.advance(2);

                    if line.is_empty() {
                        let done = std::mem::take(fields);
                        debug!(count = done.len(), "headers complete");
                        if !done.is_empty() {
                            self.events.push_back(Event::Headers(done.clone()));
                        }
                        // EOH marker (spec.md §3.2, §4.B step 4): a populated
                        // header set is always followed by an empty one; a
                        // message with no headers at all collapses straight
                        // to this single empty event.
                        self.events.push_back(Event::Headers(Vec::new()));
                        self.state = State::Body(determine_framing(&done, self.status.as_deref()));
                        continue;
                    }

                    if fields.len() >= self.config.max_headers {
                        self.violate(
                            ViolationKind::Limit,
                            vec!["max_headers".into(), fields.len().to_string()],
                        );
                        continue;
                    }
                    *set_size += line.len();
                    if *set_size > self.config.max_header_set_size {
                        self.violate(
                            ViolationKind::Limit,
                            vec!["max_header_set_size".into(), set_size.to_string()],
                        );
                        continue;
                    }

                    match split_header(&line) {
                        Some(field) => fields.push(field),
                        None => {
                            self.violate(
                                ViolationKind::Protocol,
                                vec!["malformed header field".into()],
                            );
                        }
                    }
                }
                State::Body(framing) => match framing {
                    Framing::None => {
                        self.events.push_back(Event::Message);
                        self.state = State::StripLeadingCrlf;
                    }
                    Framing::ContentLength(remaining) => {
                        if *remaining == 0 {
                            self.events.push_back(Event::Message);
                            self.state = State::StripLeadingCrlf;
                            continue;
                        }
                        if self.buf.is_empty() {
                            return;
                        }
                        let take = (*remaining as usize).min(self.buf.len());
                        let chunk = self.buf.split_to(take).freeze();
                        *remaining -= take as u64;
                        self.events.push_back(Event::Content(chunk));
                        if *remaining == 0 {
                            self.events.push_back(Event::Message);
                            self.state = State::StripLeadingCrlf;
                        }
                    }
                    Framing::ToClose => {
                        if self.buf.is_empty() {
                            return;
                        }
                        let chunk = self.buf.split().freeze();
                        self.events.push_back(Event::Content(chunk));
                    }
                    Framing::Chunked(chunk_state) => match chunk_state {
                        ChunkState::Size => {
                            let Some(pos) = self.find_crlf() else {
                                if self.buf.len() > self.config.max_chunk_line_size {
                                    self.violate(
                                        ViolationKind::Limit,
                                        vec!["max_chunk_line_size".into(), self.buf.len().to_string()],
                                    );
                                }
                                return;
                            };
                            if pos > self.config.max_chunk_line_size {
                                self.violate(
                                    ViolationKind::Limit,
                                    vec!["max_chunk_line_size".into(), pos.to_string()],
                                );
                                continue;
                            }
                            let line = self.buf.split_to(pos).freeze();
                            self.buf.advance(2);
                            let size_part = line
                                .split(|&b| b == b';')
                                .next()
                                .unwrap_or(&[]);
                            let Ok(size_str) = std::str::from_utf8(size_part) else {
                                self.violate(
                                    ViolationKind::Protocol,
                                    vec!["non-utf8 chunk size".into()],
                                );
                                continue;
                            };
                            let Ok(size) = u64::from_str_radix(size_str.trim(), 16) else {
                                self.violate(
                                    ViolationKind::Protocol,
                                    vec!["malformed chunk size".into(), size_str.to_string()],
                                );
                                continue;
                            };
                            if size == 0 {
                                self.events.push_back(Event::Chunk(Bytes::new()));
                                self.state = State::Trailers {
                                    fields: Vec::new(),
                                    set_size: 0,
                                };
                            } else {
                                *chunk_state = ChunkState::Data(size);
                            }
                        }
                        ChunkState::Data(remaining) => {
                            if self.buf.is_empty() {
                                return;
                            }
                            let take = (*remaining as usize).min(self.buf.len());
                            let chunk = self.buf.split_to(take).freeze();
                            *remaining -= take as u64;
                            self.events.push_back(Event::Chunk(chunk));
                            if *remaining == 0 {
                                *chunk_state = ChunkState::DataCrlf;
                            }
                        }
                        ChunkState::DataCrlf => {
                            if self.buf.len() < 2 {
                                return;
                            }
                            self.buf.advance(2);
                            *chunk_state = ChunkState::Size;
                        }
                    },
                },
                State::Trailers { fields, set_size } => {
                    let Some(pos) = self.find_crlf() else {
                        if self.buf.len() > self.config.max_trailer_size {
                            self.violate(
                                ViolationKind::Limit,
                                vec!["max_trailer_size".into(), self.buf.len().to_string()],
                            );
                        }
                        return;
                    };
                    if pos > self.config.max_trailer_size {
                        self.violate(
                            ViolationKind::Limit,
                            vec!["max_trailer_size".into(), pos.to_string()],
                        );
                        continue;
                    }
                    let line = self.buf.split_to(pos).freeze();
                    self.buf.advance(2);

                    if line.is_empty() {
                        let done = std::mem::take(fields);
                        if !done.is_empty() {
                            self.events.push_back(Event::Trailers(done));
                        }
                        // EOT marker, the trailer-side twin of the EOH one
                        // above (spec.md §4.B step 8, §4.C).
                        self.events.push_back(Event::Trailers(Vec::new()));
                        self.events.push_back(Event::Message);
                        self.state = State::StripLeadingCrlf;
                        continue;
                    }

                    if fields.len() >= self.config.max_trailers {
                        self.violate(
                            ViolationKind::Limit,
                            vec!["max_trailers".into(), fields.len().to_string()],
                        );
                        continue;
                    }
                    *set_size += line.len();

                    match split_header(&line) {
                        Some(field) => fields.push(field),
                        None => {
                            self.violate(
                                ViolationKind::Protocol,
                                vec!["malformed trailer field".into()],
                            );
                        }
                    }
                }
            }
        }
    }
}

/// Decide body framing from a completed header set, per spec.md §4.B step 5:
/// chunked transfer-encoding wins over content-length; in its absence a
/// valid `Content-Length` governs; with neither present the message has no
/// body. Per step 3, a response status of `204` or any `1xx` is always
/// bodyless regardless of what the headers claim.
fn determine_framing(headers: &[Field], status: Option<&[u8]>) -> Framing {
    if let Some(status) = status {
        if status == b"204" || status.first() == Some(&b'1') {
            return Framing::None;
        }
    }

    let mut content_length: Option<u64> = None;
    let mut chunked = false;

    for (name, value) in headers {
        if name.eq_ignore_ascii_case(b"transfer-encoding") {
            if value
                .rsplit(|&b| b == b',')
                .next()
                .map(|last| trim_ascii(last).eq_ignore_ascii_case(b"chunked"))
                .unwrap_or(false)
            {
                chunked = true;
            }
        } else if name.eq_ignore_ascii_case(b"content-length") {
            if let Ok(s) = std::str::from_utf8(value) {
                content_length = s.trim().parse().ok();
            }
        }
    }

    if chunked {
        Framing::Chunked(ChunkState::Size)
    } else if let Some(len) = content_length {
        Framing::ContentLength(len)
    } else {
        Framing::None
    }
}

/// Split one header/trailer line on its first `:`, trimming surrounding
/// whitespace from both name and value (the `http.py` variant: strip bytes,
/// do not casefold either field here — comparisons casefold at the point of
/// use instead).
fn split_header(line: &Bytes) -> Option<Field> {
    let colon = line.iter().position(|&b| b == b':')?;
    let name = trim_ascii(&line[..colon]);
    let value = trim_ascii(&line[colon + 1..]);
    if name.is_empty() {
        return None;
    }
    Some((slice_in(line, name), slice_in(line, value)))
}

fn trim_ascii(mut s: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = s {
        s = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = s {
        s = rest;
    }
    s
}

/// Recover a zero-copy `Bytes` sub-slice of `owner` given a `&[u8]` known to
/// point inside it (e.g. from `splitn`/`trim_ascii` on `owner`'s bytes).
fn slice_in(owner: &Bytes, part: &[u8]) -> Bytes {
    let start = part.as_ptr() as usize - owner.as_ptr() as usize;
    owner.slice(start..start + part.len())
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
