//! Transfer Context (spec.md §4.G): a one-shot lifecycle scope wrapping an
//! ordered channel series — "one HTTP message exchange" or "one stream
//! copy" — with a single completion callback fired when the series has
//! fully drained.

use std::cell::RefCell;
use std::rc::Rc;

use crate::channel::{Channel, ChannelCore, Link, ObstructToken};

struct TerminalCallback<E> {
    core: ChannelCore<E>,
    on_complete: Rc<RefCell<Option<Box<dyn FnOnce()>>>>,
}

impl<E> Channel<E> for TerminalCallback<E> {
    fn transfer(&mut self, _event: E) {}

    fn terminate(&mut self, reason: Option<&str>) {
        self.core.terminate(reason);
        if let Some(cb) = self.on_complete.borrow_mut().take() {
            cb();
        }
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

    fn connect(&mut self, downstream: Link<E>) {
        self.core.connect(downstream);
    }

    fn disconnect(&mut self) -> Option<Link<E>> {
        self.core.disconnect()
    }
}

/// Owns one "series" of channels: a source, zero or more intermediate
/// stages, and an implicit terminal callback stage appended at
/// construction. `execute` kicks the source off; `terminate` cascades a
/// cooperative shutdown through the whole series.
pub struct TransferContext<E> {
    series: Vec<Link<E>>,
    on_complete: Rc<RefCell<Option<Box<dyn FnOnce()>>>>,
}

impl<E: 'static> TransferContext<E> {
    /// `series` runs source-first. `on_complete` fires exactly once, when
    /// termination has propagated all the way to the appended terminal
    /// callback stage.
    pub fn new(mut series: Vec<Link<E>>, on_complete: impl FnOnce() + 'static) -> Self {
        let on_complete = Rc::new(RefCell::new(Some(Box::new(on_complete) as Box<dyn FnOnce()>)));
        let terminal: Link<E> = Rc::new(RefCell::new(TerminalCallback {
            core: ChannelCore::new(),
            on_complete: on_complete.clone(),
        }));
        series.push(terminal);

        for i in (0..series.len().saturating_sub(1)).rev() {
            let downstream = series[i + 1].clone();
            series[i].borrow_mut().connect(downstream);
        }

        TransferContext { series, on_complete }
    }

    /// Start the source: an obstruct-then-clear on the head of the series,
    /// which is exactly what wakes an `Iteration` source (spec.md §4.D) out
    /// of its idle state.
    pub fn execute(&mut self) {
        if let Some(head) = self.series.first() {
            let mut head = head.borrow_mut();
            head.obstruct(START_TOKEN, true);
            head.clear(START_TOKEN);
        }
    }

    /// Cooperative shutdown: terminate the head, which cascades downstream
    /// through `ChannelCore::terminate`'s cascade to the whole series.
    pub fn terminate(&mut self, reason: Option<&str>) {
        if let Some(head) = self.series.first() {
            head.borrow_mut().terminate(reason);
        }
    }

    /// Whether the completion callback has already fired.
    pub fn is_complete(&self) -> bool {
        self.on_complete.borrow().is_none()
    }
}

const START_TOKEN: ObstructToken = u64::MAX;
