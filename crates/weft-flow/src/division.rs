//! Division: one-producer → many-consumer inbound demultiplexer
//! (spec.md §4.E). Tagged events arrive in source order; each transaction's
//! consumer may attach (`connect`) before or after its events start
//! arriving, so `INITIATE`/`TRANSFER`/`TERMINATE` that arrive first are
//! buffered until `connect` drains them.

use std::collections::{HashMap, VecDeque};

use crate::channel::{Channel, Link};
use crate::event::{EventKind, TaggedEvent, TransactionId};

struct PendingSlot<P> {
    consumer: Option<Link<P>>,
    buffer: VecDeque<P>,
    terminated: bool,
}

impl<P> Default for PendingSlot<P> {
    fn default() -> Self {
        PendingSlot {
            consumer: None,
            buffer: VecDeque::new(),
            terminated: false,
        }
    }
}

/// The one → many inbound demultiplexer.
pub struct Division<P> {
    pending: HashMap<TransactionId, PendingSlot<P>>,
    on_initiate: Box<dyn FnMut(TransactionId, P)>,
}

impl<P> Division<P> {
    /// `on_initiate(id, init)` is the injected dispatcher notification: it
    /// fires once per new transaction so the application can decide who
    /// should `connect` a consumer for it.
    pub fn new(on_initiate: impl FnMut(TransactionId, P) + 'static) -> Self {
        Division {
            pending: HashMap::new(),
            on_initiate: Box::new(on_initiate),
        }
    }

    /// Feed one tagged event from the wire-facing side (e.g. an
    /// `RxProtocol`).
    pub fn int_transfer(&mut self, event: TaggedEvent<P>) {
        match event.kind {
            EventKind::Initiate => {
                self.pending.entry(event.id).or_default();
                if let Some(init) = event.payload {
                    (self.on_initiate)(event.id, init);
                }
            }
            EventKind::Transfer => {
                if let Some(payload) = event.payload {
                    self.route_transfer(event.id, payload);
                }
            }
            EventKind::Terminate => {
                self.route_terminate(event.id);
            }
            EventKind::Obstruct | EventKind::Clear => {}
        }
    }

    fn route_transfer(&mut self, id: TransactionId, payload: P) {
        let slot = self.pending.entry(id).or_default();
        match &slot.consumer {
            Some(consumer) => consumer.borrow_mut().transfer(payload),
            None => slot.buffer.push_back(payload),
        }
    }

    fn route_terminate(&mut self, id: TransactionId) {
        let slot = self.pending.entry(id).or_default();
        match &slot.consumer {
            Some(consumer) => {
                consumer.borrow_mut().terminate(None);
                self.pending.remove(&id);
            }
            None => slot.terminated = true,
        }
    }

    /// Attach a consumer to `id`, draining whatever was buffered before
    /// this call (and synthesizing the deferred terminal, if one arrived
    /// before connect).
    pub fn connect(&mut self, id: TransactionId, consumer: Link<P>) {
        let slot = self.pending.entry(id).or_default();
        while let Some(payload) = slot.buffer.pop_front() {
            consumer.borrow_mut().transfer(payload);
        }
        if slot.terminated {
            consumer.borrow_mut().terminate(None);
            self.pending.remove(&id);
        } else {
            slot.consumer = Some(consumer);
        }
    }

    /// Force-terminate every attached consumer; pending, unconnected
    /// transactions are simply dropped.
    pub fn interrupt(&mut self) {
        for (_, slot) in self.pending.drain() {
            if let Some(consumer) = slot.consumer {
                consumer.borrow_mut().terminate(Some("interrupted"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Collect {
        items: Rc<RefCell<Vec<&'static str>>>,
        terminated: Rc<RefCell<bool>>,
    }
    impl Channel<&'static str> for Collect {
        fn transfer(&mut self, event: &'static str) {
            self.items.borrow_mut().push(event);
        }
        fn terminate(&mut self, _: Option<&str>) {
            *self.terminated.borrow_mut() = true;
        }
        fn interrupt(&mut self) {}
        fn obstruct(&mut self, _: crate::channel::ObstructToken, _: bool) {}
        fn clear(&mut self, _: crate::channel::ObstructToken) {}
        fn connect(&mut self, _: Link<&'static str>) {}
        fn disconnect(&mut self) -> Option<Link<&'static str>> {
            None
        }
    }

    #[test]
    fn transfers_before_connect_are_buffered_then_drained() {
        let initiated = Rc::new(RefCell::new(Vec::new()));
        let initiated2 = initiated.clone();
        let mut div: Division<&'static str> = Division::new(move |id, init| {
            initiated2.borrow_mut().push((id, init));
        });

        let id = TransactionId(1);
        div.int_transfer(TaggedEvent::initiate(id, "req"));
        div.int_transfer(TaggedEvent::transfer(id, "a"));
        div.int_transfer(TaggedEvent::transfer(id, "b"));

        assert_eq!(*initiated.borrow(), vec![(id, "req")]);

        let items = Rc::new(RefCell::new(Vec::new()));
        let terminated = Rc::new(RefCell::new(false));
        let consumer: Link<&'static str> = Rc::new(RefCell::new(Collect {
            items: items.clone(),
            terminated: terminated.clone(),
        }));
        div.connect(id, consumer);

        assert_eq!(*items.borrow(), vec!["a", "b"]);
        assert!(!*terminated.borrow());
    }

    #[test]
    fn terminate_before_connect_is_deferred_and_synthesized() {
        let mut div: Division<&'static str> = Division::new(|_, _| {});
        let id = TransactionId(1);
        div.int_transfer(TaggedEvent::initiate(id, "req"));
        div.int_transfer(TaggedEvent::terminate(id, None));

        let items = Rc::new(RefCell::new(Vec::new()));
        let terminated = Rc::new(RefCell::new(false));
        let consumer: Link<&'static str> = Rc::new(RefCell::new(Collect {
            items: items.clone(),
            terminated: terminated.clone(),
        }));
        div.connect(id, consumer);

        assert!(*terminated.borrow());
    }

    #[test]
    fn connected_transaction_forwards_directly() {
        let mut div: Division<&'static str> = Division::new(|_, _| {});
        let id = TransactionId(1);
        div.int_transfer(TaggedEvent::initiate(id, "req"));

        let items = Rc::new(RefCell::new(Vec::new()));
        let terminated = Rc::new(RefCell::new(false));
        let consumer: Link<&'static str> = Rc::new(RefCell::new(Collect {
            items: items.clone(),
            terminated: terminated.clone(),
        }));
        div.connect(id, consumer);

        div.int_transfer(TaggedEvent::transfer(id, "live"));
        assert_eq!(*items.borrow(), vec!["live"]);
    }

    #[test]
    fn interrupt_force_terminates_every_attached_consumer() {
        let mut div: Division<&'static str> = Division::new(|_, _| {});
        let id = TransactionId(1);
        div.int_transfer(TaggedEvent::initiate(id, "req"));

        let terminated = Rc::new(RefCell::new(false));
        let consumer: Link<&'static str> = Rc::new(RefCell::new(Collect {
            items: Rc::new(RefCell::new(Vec::new())),
            terminated: terminated.clone(),
        }));
        div.connect(id, consumer);
        div.interrupt();

        assert!(*terminated.borrow());
    }
}
