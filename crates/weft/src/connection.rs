//! Cross-crate glue wiring `weft-wire`'s codec into `weft-flow`'s Protocol
//! Channels with a default request/response polarity (spec.md §8 scenarios
//! S1 and S6): the request/response line becomes the tagged event's
//! `INITIATE` payload verbatim, and `weft-ri` is left to the caller for
//! any further decoding of the request-target (see [`crate::realize`]).

use bytes::Bytes;
use tracing::trace;
use weft_flow::{RLineAndHeaders, RxProtocol, TxProtocol};
use weft_wire::{Event, TokenizerConfig};

/// Build the server-side `RxProtocol`: each inbound message's request
/// line and negotiated version become the `INITIATE` payload, unchanged,
/// so the application can run it through [`weft_ri::parse`] on the
/// request-target field if it needs structured path/query access.
pub fn server_rx_protocol(
    version: impl Into<String>,
    config: TokenizerConfig,
) -> RxProtocol<impl FnMut(&str, RLineAndHeaders) -> (Event, String)> {
    RxProtocol::new(version, config, |version, (rline, _headers)| {
        let (method, target, _client_version) = &rline;
        trace!(method = ?method, target = ?target, "inbound request line");
        (Event::RLine(rline.0, rline.1, rline.2), version.to_string())
    })
}

/// Build the client-side `TxProtocol`: the `INITIATE` payload is expected
/// to already be an `Event::RLine(method, target, _)` — as produced by
/// [`crate::realize`]'s caller or by `server_rx_protocol`'s mirror image
/// on the peer — and is re-rendered with this side's own negotiated
/// version, followed by an empty header block the caller fills in via a
/// subsequent `TRANSFER`.
pub fn client_tx_protocol(
    version: impl Into<String>,
) -> TxProtocol<impl FnMut(&str, &Event) -> (Event, Event)> {
    TxProtocol::new(version, |version, initiate| {
        let rline = match initiate {
            Event::RLine(method, target, _) => {
                Event::RLine(method.clone(), target.clone(), Bytes::copy_from_slice(version.as_bytes()))
            }
            other => other.clone(),
        };
        (rline, Event::Headers(vec![]))
    })
}
