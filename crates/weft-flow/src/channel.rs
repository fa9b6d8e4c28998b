//! The Channel Kernel (spec.md §4.D): the single node type every flow-graph
//! component is built from.
//!
//! Channels never block. A channel that cannot make progress calls
//! `obstruct` on whatever is upstream of it and returns; it resumes only
//! when that upstream observes `clear`. This module provides [`ChannelCore`],
//! the shared bookkeeping (downstream link, obstruction table, monitor set,
//! lifecycle flags) that every concrete channel embeds, and the [`Channel`]
//! trait the flow graph is built from.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

/// A token identifying one obstruction source, chosen by whoever calls
/// `obstruct`/`clear` (e.g. a transaction id or a fixed reason string).
pub type ObstructToken = u64;

/// A handle returned by [`ChannelCore::watch`], passed back to `ignore`.
pub type MonitorId = u64;

/// Shared reference to a downstream channel. The upstream side never holds
/// anything but a weak sense of ownership in spirit — in practice `Rc`,
/// since this runtime is single-threaded and cooperative (spec.md §5).
pub type Link<E> = Rc<RefCell<dyn Channel<E>>>;

struct MonitorEntry {
    on_obstruct: Box<dyn FnMut()>,
    on_clear: Box<dyn FnMut()>,
}

/// Shared state embedded by every concrete channel type.
pub struct ChannelCore<E> {
    downstream: Option<Link<E>>,
    obstructions: HashMap<ObstructToken, bool>,
    monitors: HashMap<MonitorId, MonitorEntry>,
    next_monitor_id: MonitorId,
    terminating: bool,
    terminated: bool,
    interrupted: bool,
    _marker: std::marker::PhantomData<E>,
}

impl<E> Default for ChannelCore<E> {
    fn default() -> Self {
        ChannelCore {
            downstream: None,
            obstructions: HashMap::new(),
            monitors: HashMap::new(),
            next_monitor_id: 0,
            terminating: false,
            terminated: false,
            interrupted: false,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<E> ChannelCore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn is_terminating(&self) -> bool {
        self.terminating
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn is_obstructed(&self) -> bool {
        self.obstructions.values().any(|&signalled| signalled)
    }

    /// Forward `event` to the downstream channel, if any. Silently discards
    /// when unconnected (spec.md §4.D).
    pub fn emit(&mut self, event: E) {
        if self.interrupted || self.terminated {
            return;
        }
        if let Some(downstream) = &self.downstream {
            downstream.borrow_mut().transfer(event);
        }
    }

    /// Replace the downstream link. Any monitors already registered here
    /// continue to observe this channel's own obstruction table; downstream
    /// obstruction is observed independently by whoever connects to it.
    pub fn connect(&mut self, downstream: Link<E>) {
        self.downstream = Some(downstream);
    }

    pub fn disconnect(&mut self) -> Option<Link<E>> {
        self.downstream.take()
    }

    pub fn downstream(&self) -> Option<&Link<E>> {
        self.downstream.as_ref()
    }

    /// Raise (or update) an obstruction under `token`. The *first* active
    /// obstruction signals every monitor's `on_obstruct`.
    pub fn obstruct(&mut self, token: ObstructToken, signal: bool) {
        let was_obstructed = self.is_obstructed();
        self.obstructions.insert(token, signal);
        if signal && !was_obstructed {
            trace!(token, "channel obstructed");
            for m in self.monitors.values_mut() {
                (m.on_obstruct)();
            }
        }
    }

    /// Clear the obstruction under `token`. The clear that leaves *no*
    /// active obstruction signals every monitor's `on_clear`, in reverse
    /// registration order.
    pub fn clear(&mut self, token: ObstructToken) {
        self.obstructions.remove(&token);
        if !self.is_obstructed() {
            trace!(token, "channel cleared");
            let mut ids: Vec<_> = self.monitors.keys().copied().collect();
            ids.sort_unstable_by(|a, b| b.cmp(a));
            for id in ids {
                if let Some(m) = self.monitors.get_mut(&id) {
                    (m.on_clear)();
                }
            }
        }
    }

    pub fn watch(
        &mut self,
        on_obstruct: impl FnMut() + 'static,
        on_clear: impl FnMut() + 'static,
    ) -> MonitorId {
        let id = self.next_monitor_id;
        self.next_monitor_id += 1;
        self.monitors.insert(
            id,
            MonitorEntry {
                on_obstruct: Box::new(on_obstruct),
                on_clear: Box::new(on_clear),
            },
        );
        id
    }

    pub fn ignore(&mut self, id: MonitorId) {
        self.monitors.remove(&id);
    }

    /// Cooperative termination: downstream is told to terminate too, then
    /// this channel discards state and stops emitting.
    pub fn terminate(&mut self, reason: Option<&str>) {
        if self.terminated {
            return;
        }
        self.terminating = true;
        trace!(?reason, "channel terminating");
        if let Some(downstream) = self.downstream.take() {
            downstream.borrow_mut().terminate(reason);
        }
        self.terminated = true;
        self.monitors.clear();
    }

    /// Abrupt, synchronous: marks interrupted and stops forwarding
    /// immediately. Does not cascade to downstream — the enclosing
    /// [`crate::transfer_context::TransferContext`] is responsible for that.
    pub fn interrupt(&mut self) {
        self.interrupted = true;
    }
}

/// The common shape of every flow-graph node (spec.md §4.D).
///
/// `obstruct`/`clear` are part of this trait (not just `ChannelCore`)
/// because Catenation/Division need to signal backpressure through a type-
/// erased [`Link`] — they hold `dyn Channel<E>`, not the concrete producer
/// type. Most implementors simply delegate to their embedded
/// [`ChannelCore`]; translating channels (e.g. the Protocol Channels, whose
/// input and output event types differ) are free to no-op these when they
/// have no natural obstruction table of their own.
pub trait Channel<E> {
    /// The working verb. The default behavior for a plain pass-through
    /// channel is `self.emit(event)`; derived types override this to
    /// transform, accumulate, or dispatch.
    fn transfer(&mut self, event: E);

    fn terminate(&mut self, reason: Option<&str>);

    fn interrupt(&mut self);

    fn obstruct(&mut self, token: ObstructToken, signal: bool);

    fn clear(&mut self, token: ObstructToken);

    /// Replace this channel's downstream link. Exposed on the trait (and
    /// not just on `ChannelCore`) so that generic series-builders like
    /// [`crate::transfer_context::TransferContext`] can wire a chain of
    /// type-erased [`Link`]s without knowing their concrete types.
    fn connect(&mut self, downstream: Link<E>);

    fn disconnect(&mut self) -> Option<Link<E>>;
}

/// A channel with no behavior of its own beyond passing events straight
/// through; used to splice in a monitor pair or as a terminal no-op sink.
pub struct PassThrough<E> {
    pub core: ChannelCore<E>,
}

impl<E> Default for PassThrough<E> {
    fn default() -> Self {
        PassThrough {
            core: ChannelCore::new(),
        }
    }
}

impl<E> Channel<E> for PassThrough<E> {
    fn transfer(&mut self, event: E) {
        self.core.emit(event);
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

    fn connect(&mut self, downstream: Link<E>) {
        self.core.connect(downstream);
    }

    fn disconnect(&mut self) -> Option<Link<E>> {
        self.core.disconnect()
    }
}
