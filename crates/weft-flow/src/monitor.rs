//! `Monitor`: a terminal-ish channel that records byte counts and
//! timestamps so a transfer rate can be computed over a recent window
//! (spec.md §4.D). Forwards every event on unchanged.

use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crate::channel::{Channel, ChannelCore};
use crate::scheduler::Clock;

pub struct Monitor<E, F>
where
    F: Fn(&E) -> usize,
{
    pub core: ChannelCore<E>,
    clock: Rc<dyn Clock>,
    size_of: F,
    window: Duration,
    samples: VecDeque<(Duration, usize)>,
}

impl<E, F> Monitor<E, F>
where
    F: Fn(&E) -> usize,
{
    pub fn new(clock: Rc<dyn Clock>, window: Duration, size_of: F) -> Self {
        Monitor {
            core: ChannelCore::new(),
            clock,
            size_of,
            window,
            samples: VecDeque::new(),
        }
    }

    fn prune(&mut self, now: Duration) {
        while let Some(&(t, _)) = self.samples.front() {
            if now.saturating_sub(t) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Bytes observed per second over the retained window.
    pub fn rate(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: usize = self.samples.iter().map(|&(_, n)| n).sum();
        let span = self
            .samples
            .back()
            .unwrap()
            .0
            .saturating_sub(self.samples.front().unwrap().0);
        if span.is_zero() {
            total as f64
        } else {
            total as f64 / span.as_secs_f64()
        }
    }
}

impl<E, F> Channel<E> for Monitor<E, F>
where
    F: Fn(&E) -> usize,
{
    fn transfer(&mut self, event: E) {
        let now = self.clock.now();
        let size = (self.size_of)(&event);
        self.samples.push_back((now, size));
        self.prune(now);
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
