//! `Timeout(duration)`: arms a deferred fault against a controller channel
//! (spec.md §5). On expiry the controller is interrupted; propagating that
//! further upward, if at all, is left to whatever owns the controller.

use std::time::Duration;

use crate::channel::Link;
use crate::scheduler::{Scheduler, TaskId};

/// Defer an `interrupt()` against `controller` by `duration`. Returns the
/// scheduler task id so the caller can `cancel` it if the operation
/// completes first.
pub fn arm<E: 'static>(
    scheduler: &mut dyn Scheduler,
    duration: Duration,
    controller: Link<E>,
) -> TaskId {
    scheduler.defer(
        duration,
        Box::new(move || {
            controller.borrow_mut().interrupt();
        }),
    )
}
