//! Catenation: many-producer → one-consumer outbound multiplexer
//! (spec.md §4.E). Only the head-of-line transaction forwards immediately;
//! every other transaction's events queue until it becomes head. A
//! transaction becomes head when every transaction reserved ahead of it has
//! terminated.

use std::collections::{HashMap, VecDeque};

use crate::channel::{Channel, ChannelCore, Link, ObstructToken};
use crate::event::{TaggedEvent, TransactionId};

/// Queue depth at which a non-head transaction's upstream is obstructed.
pub const BACKPRESSURE_THRESHOLD: usize = 8;

struct Slot<P> {
    upstream: Option<Link<TaggedEvent<P>>>,
    initiate: Option<P>,
    initiate_flushed: bool,
    queue: VecDeque<TaggedEvent<P>>,
    terminate_parameter: Option<Option<P>>,
    obstructed: bool,
}

impl<P> Default for Slot<P> {
    fn default() -> Self {
        Slot {
            upstream: None,
            initiate: None,
            initiate_flushed: false,
            queue: VecDeque::new(),
            terminate_parameter: None,
            obstructed: false,
        }
    }
}

/// The many → one outbound multiplexer.
pub struct Catenation<P> {
    pub core: ChannelCore<TaggedEvent<P>>,
    order: VecDeque<TransactionId>,
    slots: HashMap<TransactionId, Slot<P>>,
}

impl<P> Default for Catenation<P> {
    fn default() -> Self {
        Catenation {
            core: ChannelCore::new(),
            order: VecDeque::new(),
            slots: HashMap::new(),
        }
    }
}

impl<P> Catenation<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `id`'s position in head-of-line order. Must be called before
    /// `connect`/`int_transfer`/`int_terminate` for that id.
    pub fn reserve(&mut self, id: TransactionId) {
        self.order.push_back(id);
        self.slots.entry(id).or_default();
    }

    /// Attach a transaction's producer: `initiate` is the `INITIATE`
    /// payload, `upstream` is obstructed/cleared for backpressure.
    pub fn connect(&mut self, id: TransactionId, initiate: P, upstream: Link<TaggedEvent<P>>) {
        let slot = self.slots.entry(id).or_default();
        slot.upstream = Some(upstream);
        slot.initiate = Some(initiate);
        self.pump();
    }

    /// Buffer or forward a transaction's events, depending on whether it's
    /// currently head-of-line.
    pub fn int_transfer(&mut self, id: TransactionId, events: Vec<TaggedEvent<P>>) {
        if self.is_head(id) {
            for event in events {
                self.core.emit(event);
            }
        } else {
            if let Some(slot) = self.slots.get_mut(&id) {
                slot.queue.extend(events);
            }
            self.apply_backpressure(id);
        }
    }

    /// Complete a transaction. If it's head-of-line the terminal forwards
    /// immediately and the next transaction (if any) becomes head; if not,
    /// the terminal is deferred until this transaction's turn comes.
    pub fn int_terminate(&mut self, id: TransactionId, parameter: Option<P>) {
        if self.is_head(id) {
            self.core.emit(TaggedEvent::terminate(id, parameter));
            self.order.pop_front();
            self.slots.remove(&id);
            self.pump();
        } else if let Some(slot) = self.slots.get_mut(&id) {
            slot.terminate_parameter = Some(parameter);
        }
    }

    fn is_head(&self, id: TransactionId) -> bool {
        self.order.front() == Some(&id)
    }

    /// Flush whatever the current head-of-line transaction has ready, then
    /// advance to the next head if it terminated, repeating until the new
    /// head is unconnected or still producing.
    fn pump(&mut self) {
        loop {
            let Some(&head) = self.order.front() else {
                break;
            };
            let Some(slot) = self.slots.get_mut(&head) else {
                break;
            };
            if slot.upstream.is_none() {
                break;
            }
            if !slot.initiate_flushed {
                if let Some(init) = slot.initiate.take() {
                    self.core.emit(TaggedEvent::initiate(head, init));
                }
                slot.initiate_flushed = true;
            }
            while let Some(event) = slot.queue.pop_front() {
                self.core.emit(event);
            }
            self.clear_backpressure(head);
            let Some(slot) = self.slots.get_mut(&head) else {
                break;
            };
            match slot.terminate_parameter.take() {
                Some(parameter) => {
                    self.core.emit(TaggedEvent::terminate(head, parameter));
                    self.order.pop_front();
                    self.slots.remove(&head);
                }
                None => break,
            }
        }
    }

    fn apply_backpressure(&mut self, id: TransactionId) {
        let Some(slot) = self.slots.get_mut(&id) else {
            return;
        };
        let over = slot.queue.len() > BACKPRESSURE_THRESHOLD;
        if over && !slot.obstructed {
            slot.obstructed = true;
            if let Some(upstream) = &slot.upstream {
                upstream.borrow_mut().obstruct(id.0, true);
            }
        }
    }

    fn clear_backpressure(&mut self, id: TransactionId) {
        let Some(slot) = self.slots.get_mut(&id) else {
            return;
        };
        if slot.obstructed && slot.queue.len() <= BACKPRESSURE_THRESHOLD {
            slot.obstructed = false;
            if let Some(upstream) = &slot.upstream {
                upstream.borrow_mut().clear(id.0);
            }
        }
    }
}

impl<P> Channel<TaggedEvent<P>> for Catenation<P> {
    /// Catenation is addressed through `int_transfer`/`int_terminate`, not
    /// a single `transfer` verb; feeding it a bare tagged event routes by
    /// its kind for convenience in tests and simple embedders.
    fn transfer(&mut self, event: TaggedEvent<P>) {
        use crate::event::EventKind;
        match event.kind {
            EventKind::Initiate | EventKind::Transfer => {
                self.int_transfer(event.id, vec![event]);
            }
            EventKind::Terminate => {
                self.int_terminate(event.id, event.payload);
            }
            EventKind::Obstruct | EventKind::Clear => {}
        }
    }

    fn terminate(&mut self, reason: Option<&str>) {
        self.core.terminate(reason);
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

    fn connect(&mut self, downstream: Link<TaggedEvent<P>>) {
        self.core.connect(downstream);
    }

    fn disconnect(&mut self) -> Option<Link<TaggedEvent<P>>> {
        self.core.disconnect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Collect(Rc<RefCell<Vec<TaggedEvent<&'static str>>>>);
    impl Channel<TaggedEvent<&'static str>> for Collect {
        fn transfer(&mut self, event: TaggedEvent<&'static str>) {
            self.0.borrow_mut().push(event);
        }
        fn terminate(&mut self, _: Option<&str>) {}
        fn interrupt(&mut self) {}
        fn obstruct(&mut self, _: ObstructToken, _: bool) {}
        fn clear(&mut self, _: ObstructToken) {}
        fn connect(&mut self, _: Link<TaggedEvent<&'static str>>) {}
        fn disconnect(&mut self) -> Option<Link<TaggedEvent<&'static str>>> {
            None
        }
    }

    struct Producer {
        core: ChannelCore<TaggedEvent<&'static str>>,
        obstructed_log: Rc<RefCell<Vec<bool>>>,
    }
    impl Channel<TaggedEvent<&'static str>> for Producer {
        fn transfer(&mut self, _event: TaggedEvent<&'static str>) {}
        fn terminate(&mut self, reason: Option<&str>) {
            self.core.terminate(reason);
        }
        fn interrupt(&mut self) {
            self.core.interrupt();
        }
        fn obstruct(&mut self, token: ObstructToken, signal: bool) {
            self.obstructed_log.borrow_mut().push(signal);
            self.core.obstruct(token, signal);
        }
        fn clear(&mut self, token: ObstructToken) {
            self.obstructed_log.borrow_mut().push(false);
            self.core.clear(token);
        }
        fn connect(&mut self, downstream: Link<TaggedEvent<&'static str>>) {
            self.core.connect(downstream);
        }
        fn disconnect(&mut self) -> Option<Link<TaggedEvent<&'static str>>> {
            self.core.disconnect()
        }
    }

    fn sink() -> (crate::channel::Link<TaggedEvent<&'static str>>, Rc<RefCell<Vec<TaggedEvent<&'static str>>>>) {
        let out = Rc::new(RefCell::new(Vec::new()));
        let link: crate::channel::Link<TaggedEvent<&'static str>> =
            Rc::new(RefCell::new(Collect(out.clone())));
        (link, out)
    }

    #[test]
    fn head_of_line_forwards_immediately_others_queue() {
        let (downstream, out) = sink();
        let mut cat: Catenation<&'static str> = Catenation::new();
        cat.core.connect(downstream);

        let id1 = TransactionId(1);
        let id2 = TransactionId(2);
        cat.reserve(id1);
        cat.reserve(id2);

        let (up1, _) = sink();
        let (up2, _) = sink();
        cat.connect(id1, "init-1", up1);
        cat.connect(id2, "init-2", up2);

        // id1 is head: its initiate should have flushed already.
        assert_eq!(out.borrow().len(), 1);

        cat.int_transfer(id2, vec![TaggedEvent::transfer(id2, "from-2")]);
        assert_eq!(out.borrow().len(), 1, "id2 is not head, must queue");

        cat.int_transfer(id1, vec![TaggedEvent::transfer(id1, "from-1")]);
        assert_eq!(out.borrow().len(), 2);

        cat.int_terminate(id1, None);
        // id1's terminate flushes, id2 becomes head and its queued initiate
        // + transfer flush immediately.
        let events = out.borrow();
        assert_eq!(events.len(), 5, "{events:?}");
        assert!(matches!(events[2].kind, crate::event::EventKind::Terminate));
        assert_eq!(events[2].id, id1);
        assert!(matches!(events[3].kind, crate::event::EventKind::Initiate));
        assert_eq!(events[3].id, id2);
        assert_eq!(events[4].id, id2);
    }

    #[test]
    fn queue_over_threshold_obstructs_then_clears_upstream() {
        let (downstream, _out) = sink();
        let mut cat: Catenation<&'static str> = Catenation::new();
        cat.core.connect(downstream);

        let head = TransactionId(1);
        let waiting = TransactionId(2);
        cat.reserve(head);
        cat.reserve(waiting);

        let (up_head, _) = sink();
        let log = Rc::new(RefCell::new(Vec::new()));
        let up_waiting: crate::channel::Link<TaggedEvent<&'static str>> =
            Rc::new(RefCell::new(Producer {
                core: ChannelCore::new(),
                obstructed_log: log.clone(),
            }));

        cat.connect(head, "init-head", up_head);
        cat.connect(waiting, "init-waiting", up_waiting);

        for i in 0..BACKPRESSURE_THRESHOLD + 1 {
            cat.int_transfer(waiting, vec![TaggedEvent::transfer(waiting, "x")]);
            let _ = i;
        }
        assert_eq!(*log.borrow(), vec![true], "crossing the threshold obstructs once");

        cat.int_terminate(head, None);
        // waiting becomes head; its queue drains and should clear the
        // obstruction it raised.
        assert_eq!(*log.borrow(), vec![true, false]);
    }
}
