//! Invocations Router (spec.md §4.H): the bridge between a Division
//! consumer and application code. Buffers incoming `(id, payload)` pairs
//! until a single scheduled turn hands them to a router bound at
//! construction, and reserves matching ids in the paired Catenation so a
//! handler can attach a response producer without juggling id allocation
//! itself.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::catenation::Catenation;
use crate::channel::Link;
use crate::event::{TaggedEvent, TransactionId};
use crate::scheduler::Scheduler;

/// A one-shot handle letting a handler attach a response producer to the
/// id an `accept`/`allocate` call reserved in the paired Catenation.
pub struct ConnectCallback<P> {
    id: TransactionId,
    catenation: Rc<RefCell<Catenation<P>>>,
}

impl<P: 'static> ConnectCallback<P> {
    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn connect(self, initiate: P, upstream: Link<TaggedEvent<P>>) {
        // Catenation's own `Channel::transfer` already routes a tagged
        // event to `int_transfer`/`int_terminate` by kind, so the producer
        // can simply emit into it like any other downstream; `upstream` is
        // registered with Catenation separately, purely so it can signal
        // backpressure back via `obstruct`/`clear`.
        let catenation_link: Link<TaggedEvent<P>> = self.catenation.clone();
        upstream.borrow_mut().connect(catenation_link);
        self.catenation.borrow_mut().connect(self.id, initiate, upstream);
    }
}

/// Dispatch buffer for allocating transaction ids and routing inbound
/// transactions to endpoints. Transaction ids are monotonically
/// increasing positive integers, shared with the paired Catenation so a
/// request and its response carry the same id.
pub struct Invocations<P> {
    next_id: u64,
    catenation: Rc<RefCell<Catenation<P>>>,
    pending: VecDeque<(TransactionId, P)>,
    scheduled: bool,
    router: Box<dyn FnMut(&Rc<RefCell<Invocations<P>>>)>,
}

impl<P> Invocations<P> {
    /// `router` is bound once, for the life of this instance, and is
    /// invoked with a handle to `self` on every scheduled turn.
    pub fn new(
        catenation: Rc<RefCell<Catenation<P>>>,
        router: impl FnMut(&Rc<RefCell<Invocations<P>>>) + 'static,
    ) -> Rc<RefCell<Invocations<P>>> {
        Rc::new(RefCell::new(Invocations {
            next_id: 1,
            catenation,
            pending: VecDeque::new(),
            scheduled: false,
            router: Box::new(router),
        }))
    }

    fn next_transaction_id(&mut self) -> TransactionId {
        let id = TransactionId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Enqueue `events` locally and, unless a turn is already scheduled,
    /// ask `scheduler` to run the bound router exactly once on the next
    /// turn.
    pub fn dispatch(
        this: &Rc<RefCell<Invocations<P>>>,
        scheduler: &mut dyn Scheduler,
        events: Vec<(TransactionId, P)>,
    ) where
        P: 'static,
    {
        {
            let mut inv = this.borrow_mut();
            inv.pending.extend(events);
            if inv.scheduled {
                return;
            }
            inv.scheduled = true;
        }
        let handle = this.clone();
        scheduler.enqueue(Box::new(move || {
            // Swap the router out before calling it so the call itself
            // can re-borrow `handle` (e.g. via `accept`) without a
            // double-mutable-borrow panic, then put it back.
            let mut router = {
                let mut inv = handle.borrow_mut();
                inv.scheduled = false;
                std::mem::replace(&mut inv.router, Box::new(|_| {}))
            };
            router(&handle);
            handle.borrow_mut().router = router;
        }));
    }

    /// Server side: drain the buffered events, reserving a matching id in
    /// the paired Catenation for each, and return a connect callback
    /// alongside the initiate payload for each new transaction.
    pub fn accept(&mut self) -> Vec<(ConnectCallback<P>, TransactionId, P)> {
        self.pending
            .drain(..)
            .map(|(id, init)| {
                self.catenation.borrow_mut().reserve(id);
                (
                    ConnectCallback {
                        id,
                        catenation: self.catenation.clone(),
                    },
                    id,
                    init,
                )
            })
            .collect()
    }

    /// Client side: drain and return the buffered events so the caller can
    /// match them against requests it already allocated ids for.
    pub fn correlate(&mut self) -> Vec<(TransactionId, P)> {
        self.pending.drain(..).collect()
    }

    /// Client side: reserve `n` fresh ids in the paired Catenation for new
    /// outbound requests, yielding a connect callback for each.
    pub fn allocate(&mut self, n: usize) -> Vec<(TransactionId, ConnectCallback<P>)> {
        (0..n)
            .map(|_| {
                let id = self.next_transaction_id();
                self.catenation.borrow_mut().reserve(id);
                (
                    id,
                    ConnectCallback {
                        id,
                        catenation: self.catenation.clone(),
                    },
                )
            })
            .collect()
    }
}
