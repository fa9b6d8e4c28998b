//! Flow-graph runtime: single-threaded, cooperative Channel Kernel the
//! wire codec plugs into (spec.md §4-§5). Every node is a [`Channel`],
//! connected into a graph of `Rc<RefCell<dyn Channel<E>>>` links rather
//! than driven by an async executor — the embedder owns the only
//! execution context and supplies a [`Scheduler`]/[`Clock`] pair.

mod catenation;
mod channel;
mod collection;
mod dispatch;
mod division;
mod event;
mod invocations;
mod iteration;
mod monitor;
mod protocol;
mod scheduler;
mod timeout;
mod transfer_context;
mod transformation;
mod transport_stack;

pub use catenation::{Catenation, BACKPRESSURE_THRESHOLD};
pub use channel::{Channel, ChannelCore, Link, MonitorId, ObstructToken, PassThrough};
pub use collection::Collection;
pub use dispatch::Dispatch;
pub use division::Division;
pub use event::{EventKind, TaggedEvent, TransactionId};
pub use invocations::{ConnectCallback, Invocations};
pub use iteration::{spawn as spawn_iteration, Iteration};
pub use monitor::Monitor;
pub use protocol::{RLineAndHeaders, RxProtocol, TxProtocol};
pub use scheduler::{Clock, Endpoint, ImmediateScheduler, Scheduler, SecureTransport, TaskId};
pub use timeout::arm as arm_timeout;
pub use transfer_context::TransferContext;
pub use transformation::Transformation;
pub use transport_stack::TransportStack;
