//! Resource Indicator (RI) parsing and serialization.
//!
//! A lenient superset of URI/IRI syntax: percent-encoding, host/authority
//! splitting, query tokenization, and round-trippable structuring. See
//! `split`/`join` for the five-tuple form with escapes left verbatim, and
//! `parse`/`serialize` for the fully decoded [`Ri`] record.
//!
//! Parsing never fails; malformed input is classified as
//! [`Kind::Amorphous`] with whatever fields could be recovered, per
//! SPEC_FULL.md §7.

mod netloc;
mod percent;
mod split;
mod structured;

pub use netloc::{join_netloc, split_netloc, NetlocForm};
pub use percent::Component as PercentComponent;
pub use split::{join, split, Kind, SplitForm};
pub use structured::{construct, parse, serialize, serialize_strict, structure, to_request_target, Ri};
