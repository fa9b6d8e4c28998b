//! Incremental HTTP/1.x tokenizer and assembler.
//!
//! [`Tokenizer`] turns wire bytes into an [`Event`] stream regardless of how
//! the bytes were chunked on arrival; [`Assembler`] is its inverse. Neither
//! type owns a transport or a thread — both are driven by whoever owns the
//! I/O (see `weft-flow::ProtocolChannel`).

mod assembler;
mod event;
mod tokenizer;

pub use assembler::Assembler;
pub use event::{Event, Field, ViolationKind};
pub use tokenizer::{Tokenizer, TokenizerConfig};
