//! Transport Stack (spec.md §4.I): an ordered list of codec layers between
//! the wire and the Invocations Router. Construction runs base → top:
//! [`TransportStack::from_endpoint`] seeds the raw endpoint pair,
//! [`TransportStack::append`] splices a byte-level layer (e.g. a secure
//! transport), and [`TransportStack::tp_connect`] adds the final protocol
//! layer, wiring a Catenation/Division pair and an Invocations Router
//! between them.

use std::cell::RefCell;
use std::rc::Rc;

use bytes::Bytes;

use crate::catenation::Catenation;
use crate::channel::{Channel, ChannelCore, Link, ObstructToken};
use crate::division::Division;
use crate::event::TaggedEvent;
use crate::invocations::Invocations;
use crate::protocol::{RLineAndHeaders, RxProtocol, TxProtocol};
use crate::scheduler::{Endpoint, Scheduler};
use crate::transfer_context::TransferContext;
use weft_wire::Event as WireEvent;

/// The base layer: a terminal sink that writes whatever bytes it receives
/// straight to the OS endpoint, closing it on termination.
struct EndpointSink<Io> {
    core: ChannelCore<Bytes>,
    io: Io,
}

impl<Io: Endpoint> Channel<Bytes> for EndpointSink<Io> {
    fn transfer(&mut self, event: Bytes) {
        self.io.write(&[event.to_vec()]);
    }

    fn terminate(&mut self, reason: Option<&str>) {
        self.core.terminate(reason);
        self.io.close();
    }

    fn interrupt(&mut self) {
        self.core.interrupt();
    }

    fn obstruct(&mut self, token: ObstructToken, signal: bool) {
        self.core.obstruct(token, signal);
    }

    fn clear(&mut self, token: ObstructToken) {
        self.core.clear(token);
    }

    fn connect(&mut self, downstream: Link<Bytes>) {
        self.core.connect(downstream);
    }

    fn disconnect(&mut self) -> Option<Link<Bytes>> {
        self.core.disconnect()
    }
}

/// Bridges `RxProtocol`'s tagged-event output into `Division::int_transfer`.
/// `transfer` never touches `core.emit` — Division fans out per transaction
/// rather than forwarding to a single downstream — but `core` still carries
/// real obstruction/termination bookkeeping so a [`TransferContext`] can be
/// spliced onto the end of the rx chain.
struct DivisionSink<P> {
    core: ChannelCore<TaggedEvent<P>>,
    division: Rc<RefCell<Division<P>>>,
}

impl<P> Channel<TaggedEvent<P>> for DivisionSink<P> {
    fn transfer(&mut self, event: TaggedEvent<P>) {
        self.division.borrow_mut().int_transfer(event);
    }

    fn terminate(&mut self, reason: Option<&str>) {
        self.division.borrow_mut().interrupt();
        self.core.terminate(reason);
    }

    fn interrupt(&mut self) {
        self.division.borrow_mut().interrupt();
        self.core.interrupt();
    }

    fn obstruct(&mut self, token: ObstructToken, signal: bool) {
        self.core.obstruct(token, signal);
    }

    fn clear(&mut self, token: ObstructToken) {
        self.core.clear(token);
    }

    fn connect(&mut self, downstream: Link<TaggedEvent<P>>) {
        self.core.connect(downstream);
    }

    fn disconnect(&mut self) -> Option<Link<TaggedEvent<P>>> {
        self.core.disconnect()
    }
}

/// The ordered base → top list of codec layers wired between an OS
/// endpoint and the application-facing Invocations Router.
pub struct TransportStack {
    rx_top: Link<Bytes>,
    tx_entry: Link<Bytes>,
    scheduler: Rc<RefCell<dyn Scheduler>>,
    layers: Vec<String>,
    catenation: Option<Rc<RefCell<Catenation<WireEvent>>>>,
    invocations: Option<Rc<RefCell<Invocations<WireEvent>>>>,
    rx_context: Option<TransferContext<TaggedEvent<WireEvent>>>,
}

impl TransportStack {
    /// Seed the stack with the raw endpoint codec pair. `rx_top` is the
    /// entry point bytes arriving from the OS are pushed into via
    /// [`TransportStack::tp_push`]; the endpoint's write side is the base
    /// of the tx chain every appended layer eventually writes through.
    pub fn from_endpoint(io: impl Endpoint + 'static, scheduler: Rc<RefCell<dyn Scheduler>>) -> Self {
        let rx_top: Link<Bytes> = Rc::new(RefCell::new(crate::channel::PassThrough::default()));
        let tx_entry: Link<Bytes> = Rc::new(RefCell::new(EndpointSink {
            core: ChannelCore::new(),
            io,
        }));
        TransportStack {
            rx_top,
            tx_entry,
            scheduler,
            layers: vec!["endpoint".to_string()],
            catenation: None,
            invocations: None,
            rx_context: None,
        }
    }

    /// Names of every layer present, base-first.
    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    /// Splice a byte-level codec layer (e.g. TLS) onto the stack: its rx
    /// half sits above the previous rx, its tx half sits below the
    /// previous tx.
    pub fn append(&mut self, key: impl Into<String>, rx_layer: Link<Bytes>, tx_layer: Link<Bytes>) {
        self.rx_top.borrow_mut().connect(rx_layer.clone());
        tx_layer.borrow_mut().connect(self.tx_entry.clone());
        self.rx_top = rx_layer;
        self.tx_entry = tx_layer;
        self.layers.push(key.into());
    }

    /// Feed bytes into the current rx entry point — either freshly read
    /// from the OS, or, during protocol substitution, a prior layer's
    /// `BYPASS` overflow replayed into the newly appended replacement
    /// layer.
    pub fn tp_push(&mut self, bytes: Bytes) {
        self.rx_top.borrow_mut().transfer(bytes);
    }

    /// Add the final (protocol) layer: allocates a Catenation on the tx
    /// side and a Division on the rx side, wires an Invocations Router
    /// between them bound to `router`, and spawns a Transfer Context over
    /// the rx chain so `on_rx_complete` fires once it fully terminates.
    /// Returns the Invocations instance the application drives.
    pub fn tp_connect<A, F>(
        &mut self,
        rx_protocol: Rc<RefCell<RxProtocol<A>>>,
        tx_protocol: Rc<RefCell<TxProtocol<F>>>,
        router: impl FnMut(&Rc<RefCell<Invocations<WireEvent>>>) + 'static,
        on_rx_complete: impl FnOnce() + 'static,
    ) -> Rc<RefCell<Invocations<WireEvent>>>
    where
        A: FnMut(&str, RLineAndHeaders) -> (WireEvent, String) + 'static,
        F: FnMut(&str, &WireEvent) -> (WireEvent, WireEvent) + 'static,
    {
        let rx_protocol_bytes: Link<Bytes> = rx_protocol.clone();
        self.rx_top.borrow_mut().connect(rx_protocol_bytes);
        tx_protocol.borrow_mut().core.connect(self.tx_entry.clone());

        let catenation: Rc<RefCell<Catenation<WireEvent>>> = Rc::new(RefCell::new(Catenation::new()));
        let tx_protocol_tagged: Link<TaggedEvent<WireEvent>> = tx_protocol;
        catenation.borrow_mut().core.connect(tx_protocol_tagged);

        let invocations = Invocations::new(catenation.clone(), router);

        let inv_for_division = invocations.clone();
        let scheduler_for_division = self.scheduler.clone();
        let division: Rc<RefCell<Division<WireEvent>>> = Rc::new(RefCell::new(Division::new(
            move |id, payload| {
                Invocations::dispatch(
                    &inv_for_division,
                    &mut *scheduler_for_division.borrow_mut(),
                    vec![(id, payload)],
                );
            },
        )));

        let division_adapter: Link<TaggedEvent<WireEvent>> = Rc::new(RefCell::new(DivisionSink {
            core: ChannelCore::new(),
            division,
        }));
        rx_protocol.borrow_mut().core.connect(division_adapter.clone());

        let rx_context = TransferContext::new(vec![division_adapter], on_rx_complete);

        self.layers.push("http".to_string());
        self.catenation = Some(catenation);
        self.invocations = Some(invocations.clone());
        self.rx_context = Some(rx_context);

        invocations
    }

    /// The Invocations instance returned by `tp_connect`, if the protocol
    /// layer has been wired yet.
    pub fn invocations(&self) -> Option<Rc<RefCell<Invocations<WireEvent>>>> {
        self.invocations.clone()
    }

    /// Cooperative shutdown of both directions: the tx side cascades from
    /// the Catenation (or, before `tp_connect`, from the raw tx chain)
    /// down to the endpoint; the rx side's Transfer Context fires its
    /// completion callback once the cascade reaches it.
    pub fn terminate(&mut self, reason: Option<&str>) {
        if let Some(cat) = &self.catenation {
            cat.borrow_mut().core.terminate(reason);
        } else {
            self.tx_entry.borrow_mut().terminate(reason);
        }
        if let Some(ctx) = &mut self.rx_context {
            ctx.terminate(reason);
        }
    }
}
