//! `Dispatch`: calls an embedder-provided endpoint function for each event,
//! then forwards it on (spec.md §4.D). Used to splice observers — logging,
//! metrics hooks — into a flow without altering it.

use crate::channel::{Channel, ChannelCore};

pub struct Dispatch<E, F>
where
    F: FnMut(&E),
{
    pub core: ChannelCore<E>,
    endpoint: F,
}

impl<E, F> Dispatch<E, F>
where
    F: FnMut(&E),
{
    pub fn new(endpoint: F) -> Self {
        Dispatch {
            core: ChannelCore::new(),
            endpoint,
        }
    }
}

impl<E, F> Channel<E> for Dispatch<E, F>
where
    F: FnMut(&E),
{
    fn transfer(&mut self, event: E) {
        (self.endpoint)(&event);
        self.core.emit(event);
    }

    fn terminate(&mut self, reason: Option<&str>) {
        self.core.terminate(reason);
    }

    fn interrupt(&mut self) {
        self.core.interrupt();
    }

    fn obstruct(&mut self, token: crate::channel::ObstructToken, signal: bool) {
        self.core.obstruct(token, signal);
    }

    fn clear(&mut self, token: crate::channel::ObstructToken) {
        self.core.clear(token);
    }

    fn connect(&mut self, downstream: crate::channel::Link<E>) {
        self.core.connect(downstream);
    }

    fn disconnect(&mut self) -> Option<crate::channel::Link<E>> {
        self.core.disconnect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Link, ObstructToken};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Collect(Rc<RefCell<Vec<i32>>>);
    impl Channel<i32> for Collect {
        fn transfer(&mut self, event: i32) {
            self.0.borrow_mut().push(event);
        }
        fn terminate(&mut self, _: Option<&str>) {}
        fn interrupt(&mut self) {}
        fn obstruct(&mut self, _: ObstructToken, _: bool) {}
        fn clear(&mut self, _: ObstructToken) {}
        fn connect(&mut self, _: Link<i32>) {}
        fn disconnect(&mut self) -> Option<Link<i32>> {
            None
        }
    }

    #[test]
    fn calls_endpoint_then_forwards() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen2 = seen.clone();
        let out = Rc::new(RefCell::new(Vec::new()));
        let sink: Link<i32> = Rc::new(RefCell::new(Collect(out.clone())));

        let mut d = Dispatch::new(move |e: &i32| seen2.borrow_mut().push(*e));
        d.core.connect(sink);
        d.transfer(7);

        assert_eq!(*seen.borrow(), vec![7]);
        assert_eq!(*out.borrow(), vec![7]);
    }
}
