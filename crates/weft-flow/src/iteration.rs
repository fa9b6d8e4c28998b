//! `Iteration(source)`: pumps items from a stored iterator into `emit`
//! until obstructed or exhausted (spec.md §4.D). It is a source — nothing
//! upstream feeds it through `transfer` — so it registers a watch on its
//! own obstruction table and resumes pumping whenever the last obstruction
//! clears.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::channel::{Channel, ChannelCore, Link};

pub struct Iteration<E, I>
where
    I: Iterator<Item = E>,
{
    pub core: ChannelCore<E>,
    source: I,
}

impl<E, I> Iteration<E, I>
where
    I: Iterator<Item = E>,
{
    /// Pump items downstream until obstructed or the source is exhausted.
    /// On exhaustion, terminates this channel.
    fn transition(&mut self) {
        while !self.core.is_obstructed() {
            match self.source.next() {
                Some(item) => self.core.emit(item),
                None => {
                    self.core.terminate(None);
                    return;
                }
            }
        }
    }
}

impl<E, I> Channel<E> for Iteration<E, I>
where
    I: Iterator<Item = E>,
{
    /// Iteration is a source; it is never fed events.
    fn transfer(&mut self, _event: E) {}

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

    fn connect(&mut self, downstream: Link<E>) {
        self.core.connect(downstream);
    }

    fn disconnect(&mut self) -> Option<Link<E>> {
        self.core.disconnect()
    }
}

/// Build an `Iteration` that pumps `source` whenever it is cleared, and
/// kick off the first pump immediately.
pub fn spawn<E, I>(source: I) -> Link<E>
where
    E: 'static,
    I: Iterator<Item = E> + 'static,
{
    let typed: Rc<RefCell<Iteration<E, I>>> = Rc::new(RefCell::new(Iteration {
        core: ChannelCore::new(),
        source,
    }));
    let weak: Weak<RefCell<Iteration<E, I>>> = Rc::downgrade(&typed);
    typed.borrow_mut().core.watch(
        || {},
        move || {
            if let Some(strong) = weak.upgrade() {
                strong.borrow_mut().transition();
            }
        },
    );
    typed.borrow_mut().transition();
    let link: Link<E> = typed;
    link
}
