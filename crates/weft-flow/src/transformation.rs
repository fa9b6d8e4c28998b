//! `Transformation`: applies a function to each event before emitting it
//! (spec.md §4.D).

use crate::channel::{Channel, ChannelCore};

pub struct Transformation<E, F>
where
    F: FnMut(E) -> E,
{
    pub core: ChannelCore<E>,
    transform: F,
}

impl<E, F> Transformation<E, F>
where
    F: FnMut(E) -> E,
{
    pub fn new(transform: F) -> Self {
        Transformation {
            core: ChannelCore::new(),
            transform,
        }
    }
}

impl<E, F> Channel<E> for Transformation<E, F>
where
    F: FnMut(E) -> E,
{
    fn transfer(&mut self, event: E) {
        let transformed = (self.transform)(event);
        self.core.emit(transformed);
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
    fn doubles_each_event() {
        let out = Rc::new(RefCell::new(Vec::new()));
        let sink: Link<i32> = Rc::new(RefCell::new(Collect(out.clone())));
        let mut t = Transformation::new(|e: i32| e * 2);
        t.core.connect(sink);
        t.transfer(21);
        assert_eq!(*out.borrow(), vec![42]);
    }
}
