//! Facade crate: re-exports [`weft_ri`], [`weft_wire`] and [`weft_flow`],
//! and wires the cross-crate glue between them — HTTP/1.x `RxProtocol`/
//! `TxProtocol` construction and RI-based endpoint realization (spec.md
//! §8 scenario S4).

pub use weft_flow as flow;
pub use weft_ri as ri;
pub use weft_wire as wire;

pub mod connection;
pub mod realize;

/// Convenient imports for building a connection over the flow-graph
/// runtime.
pub mod prelude {
    pub use crate::connection::{client_tx_protocol, server_rx_protocol};
    pub use crate::realize::{realize, RealizedEndpoint};
    pub use weft_flow::{
        Catenation, Channel, ChannelCore, Dispatch, Division, Endpoint, ImmediateScheduler,
        Invocations, Link, ObstructToken, PassThrough, Scheduler, TaggedEvent, TransactionId,
        TransferContext, TransportStack,
    };
    pub use weft_ri::{parse, serialize, to_request_target, Ri};
    pub use weft_wire::{Event, Tokenizer, TokenizerConfig};
}
