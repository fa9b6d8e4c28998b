//! End-to-end scenarios S1-S6 (spec.md §8), exercised at the facade level
//! rather than against any one crate's internals.

use std::cell::RefCell;
use std::rc::Rc;

use bytes::Bytes;
use weft::flow::{Channel, Link, ObstructToken, TaggedEvent, TransactionId, TransferContext};
use weft::wire::{Event, Tokenizer, TokenizerConfig};
use weft::{connection, realize};

fn drain(t: &mut Tokenizer) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(e) = t.next_event() {
        events.push(e);
    }
    events
}

#[test]
fn s1_get_request_yields_rline_headers_empty_headers_message() {
    let mut t = Tokenizer::new(TokenizerConfig::default());
    t.feed(b"GET / HTTP/1.0\r\nHost: host\r\n\r\n");
    let events = drain(&mut t);
    assert_eq!(
        events,
        vec![
            Event::RLine(
                Bytes::from_static(b"GET"),
                Bytes::from_static(b"/"),
                Bytes::from_static(b"HTTP/1.0"),
            ),
            Event::Headers(vec![(Bytes::from_static(b"Host"), Bytes::from_static(b"host"))]),
            Event::Headers(vec![]),
            Event::Message,
        ]
    );
}

#[test]
fn s2_response_rline_has_no_content_event_when_bodyless() {
    let mut t = Tokenizer::new(TokenizerConfig::default());
    t.feed(b"HTTP/1.0 204 OK\r\nHost: host\r\n\r\n");
    let events = drain(&mut t);
    assert_eq!(
        events[0],
        Event::RLine(
            Bytes::from_static(b"HTTP/1.0"),
            Bytes::from_static(b"204"),
            Bytes::from_static(b"OK"),
        )
    );
    assert!(!events.iter().any(|e| matches!(e, Event::Content(_))));
}

#[test]
fn s3_chunked_body_yields_chunk_events_then_trailers_then_message() {
    let mut t = Tokenizer::new(TokenizerConfig::default());
    t.feed(b"GET / HTTP/1.1\r\nTransfer-Encoding: chunked\r\nHost: host\r\n\r\n5\r\nfffff\r\n0\r\n\r\n");
    let events = drain(&mut t);
    assert_eq!(events[2], Event::Headers(vec![]));
    assert_eq!(events[3], Event::Chunk(Bytes::from_static(b"fffff")));
    assert_eq!(events[4], Event::Chunk(Bytes::new()));
    assert_eq!(events[5], Event::Trailers(vec![]));
    assert_eq!(events[6], Event::Message);
}

#[test]
fn s4_https_scheme_realizes_to_port_443() {
    let ri = weft::ri::parse("https://fault.io");
    assert_eq!(ri.host.as_deref(), Some("fault.io"));
    assert_eq!(ri.scheme.as_deref(), Some("https"));
    assert_eq!(ri.port, None);
    let realized = realize::realize(&ri).unwrap();
    assert_eq!(realized.port, 443);
}

#[test]
fn s5_two_pipelined_requests_yield_two_message_events_with_correct_bodies() {
    let mut t = Tokenizer::new(TokenizerConfig::default());
    let body_a = "A".repeat(20);
    let body_b = "B".repeat(30);
    let input = format!(
        "GET /a HTTP/1.1\r\nContent-Length: 20\r\n\r\n{body_a}GET /b HTTP/1.1\r\nContent-Length: 30\r\n\r\n{body_b}"
    );
    t.feed(input.as_bytes());
    let events = drain(&mut t);

    let message_count = events.iter().filter(|e| e.is_message()).count();
    assert_eq!(message_count, 2);

    let contents: Vec<&[u8]> = events
        .iter()
        .filter_map(|e| match e {
            Event::Content(b) => Some(b.as_ref()),
            _ => None,
        })
        .collect();
    assert_eq!(contents, vec![body_a.as_bytes(), body_b.as_bytes()]);
}

struct Collect<E>(Rc<RefCell<Vec<E>>>);
impl<E> Channel<E> for Collect<E> {
    fn transfer(&mut self, event: E) {
        self.0.borrow_mut().push(event);
    }
    fn terminate(&mut self, _: Option<&str>) {}
    fn interrupt(&mut self) {}
    fn obstruct(&mut self, _: ObstructToken, _: bool) {}
    fn clear(&mut self, _: ObstructToken) {}
    fn connect(&mut self, _: Link<E>) {}
    fn disconnect(&mut self) -> Option<Link<E>> {
        None
    }
}

#[test]
fn s6_client_request_then_response_round_trips_through_the_protocol_channels() {
    let written = Rc::new(RefCell::new(Vec::new()));
    let byte_sink: Link<Bytes> = Rc::new(RefCell::new(Collect(written.clone())));
    let mut tx = connection::client_tx_protocol("HTTP/1.1");
    tx.core.connect(byte_sink);

    tx.transfer(TaggedEvent::initiate(
        TransactionId(1),
        Event::RLine(Bytes::from_static(b"GET"), Bytes::from_static(b"/test"), Bytes::new()),
    ));
    tx.transfer(TaggedEvent::terminate(TransactionId(1), None));

    let sent: Vec<u8> = written.borrow().iter().flat_map(|b| b.to_vec()).collect();
    assert!(sent.starts_with(b"GET /test HTTP/1.1"));

    let received = Rc::new(RefCell::new(Vec::new()));
    let tagged_sink: Link<TaggedEvent<Event>> = Rc::new(RefCell::new(Collect(received.clone())));
    let mut rx = connection::server_rx_protocol("HTTP/1.1", TokenizerConfig::default());
    rx.core.connect(tagged_sink);

    rx.transfer(Bytes::from_static(
        b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi",
    ));

    let events = received.borrow();
    let body: Vec<u8> = events
        .iter()
        .filter_map(|e| match &e.payload {
            Some(Event::Content(b)) => Some(b.to_vec()),
            _ => None,
        })
        .flatten()
        .collect();
    assert_eq!(body, b"hi");
    assert!(matches!(events.last().unwrap().kind, weft::flow::EventKind::Terminate));

    let ctx_completed = Rc::new(std::cell::Cell::new(false));
    let ctx_completed2 = ctx_completed.clone();
    let guard: Link<i32> = Rc::new(RefCell::new(weft::flow::PassThrough::<i32>::default()));
    let mut ctx = TransferContext::new(vec![guard], move || ctx_completed2.set(true));
    ctx.terminate(Some("connection closed"));
    assert!(ctx_completed.get());
}
