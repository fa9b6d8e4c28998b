//! `Collection`: a terminal channel that accumulates events into a `Vec`
//! (spec.md §4.D). The reference design also allows dict/set/bytearray
//! accumulation; this crate only needed the list form, so that's all that's
//! implemented here.

use crate::channel::{Channel, ChannelCore};

pub struct Collection<E> {
    pub core: ChannelCore<E>,
    items: Vec<E>,
}

impl<E> Default for Collection<E> {
    fn default() -> Self {
        Collection {
            core: ChannelCore::new(),
            items: Vec::new(),
        }
    }
}

impl<E> Collection<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn into_items(self) -> Vec<E> {
        self.items
    }
}

impl<E> Channel<E> for Collection<E> {
    fn transfer(&mut self, event: E) {
        self.items.push(event);
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

    #[test]
    fn accumulates_every_event() {
        let mut c: Collection<i32> = Collection::new();
        c.transfer(1);
        c.transfer(2);
        c.transfer(3);
        assert_eq!(c.items(), &[1, 2, 3]);
    }
}
