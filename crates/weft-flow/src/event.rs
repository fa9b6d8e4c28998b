//! The tagged-event shape Catenation/Division and the Invocations Router
//! exchange (spec.md §6.4): `(kind, channel_id, payload)`. The integer codes
//! backing [`EventKind`] are pinned by spec.md §6.4 — tests key off them, so
//! they must never be renumbered.

/// Discriminant for a tagged event. The explicit values are load-bearing:
/// recovered from the reference implementation's `flow_events` ordering and
/// required to stay stable across recompilations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i8)]
pub enum EventKind {
    Terminate = -2,
    Obstruct = -1,
    Transfer = 0,
    Clear = 1,
    Initiate = 2,
}

/// A per-transaction identifier. Monotonically increasing and never reused
/// within a single [`crate::invocations::InvocationsRouter`] or
/// [`crate::catenation::Catenation`] instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One event tagged with the transaction it belongs to, per spec.md §6.4.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedEvent<P> {
    pub kind: EventKind,
    pub id: TransactionId,
    pub payload: Option<P>,
}

impl<P> TaggedEvent<P> {
    pub fn initiate(id: TransactionId, init: P) -> Self {
        TaggedEvent {
            kind: EventKind::Initiate,
            id,
            payload: Some(init),
        }
    }

    pub fn transfer(id: TransactionId, payload: P) -> Self {
        TaggedEvent {
            kind: EventKind::Transfer,
            id,
            payload: Some(payload),
        }
    }

    pub fn terminate(id: TransactionId, parameter: Option<P>) -> Self {
        TaggedEvent {
            kind: EventKind::Terminate,
            id,
            payload: parameter,
        }
    }

    pub fn obstruct(id: TransactionId) -> Self {
        TaggedEvent {
            kind: EventKind::Obstruct,
            id,
            payload: None,
        }
    }

    pub fn clear(id: TransactionId) -> Self {
        TaggedEvent {
            kind: EventKind::Clear,
            id,
            payload: None,
        }
    }
}
